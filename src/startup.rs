use std::net::TcpListener;

use actix_web::{dev::Server, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::{mail_relay::ContactMailer, routes};

pub fn run(listener: TcpListener, mailer: web::Data<ContactMailer>) -> Result<Server, std::io::Error> {
    let json_config = web::JsonConfig::default().error_handler(routes::json_error_handler);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(mailer.clone())
            .app_data(json_config.clone())
            .route("/health_check", web::get().to(routes::health_check))
            .route("/api/contact", web::post().to(routes::contact))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
