use std::net::TcpListener;

use actix_web::web;
use anyhow::Context;
use portfolio::{mail_relay::ContactMailer, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 遥测初始化
    telemetry::init_subscriber("portfolio");

    let config = portfolio::config::config().context("failed to read config.yaml.")?;
    let listener = TcpListener::bind(config.web.server_address())
        .with_context(|| format!("failed to bind {}.", config.web.server_address()))?;

    // 中继凭据只在启动时读取一次
    let mailer = web::Data::new(ContactMailer::from_config(&config.relay));

    tracing::info!(address = %config.web.server_address(), "portfolio contact service started.");
    portfolio::run(listener, mailer)?.await?;

    Ok(())
}
