use std::fmt::Debug;

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use uuid::Uuid;

use crate::{
    domain::{ContactForm, ContactMessage},
    mail_relay::ContactMailer,
    util::error_chain_fmt,
};

#[derive(serde::Serialize)]
struct ContactSent {
    success: bool,
}

#[derive(serde::Serialize)]
struct ContactFailed {
    error: String,
}

#[tracing::instrument(
    name = "转发联系表单",
    skip(form, mailer),
    fields(
        submission_id = %Uuid::new_v4(),
        visitor_name = %form.name,
        visitor_email = %form.email,
    )
)]
pub async fn contact(
    form: web::Json<ContactForm>,
    mailer: web::Data<ContactMailer>,
) -> Result<HttpResponse, ContactError> {
    let Some(relay) = mailer.relay() else {
        tracing::error!("Missing EMAIL_USER or EMAIL_PASS environment variables");
        return Err(ContactError::ConfigurationError);
    };

    let message: ContactMessage = form.0.try_into().map_err(ContactError::ValidationError)?;
    let email = mailer.outbound_email(&message);

    if let Err(e) = relay
        .send(&email)
        .await
        .context("failed to dispatch contact message through the relay.")
    {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "邮件发送失败."
        );
        return Err(ContactError::DeliveryError(e));
    }
    tracing::info!("邮件发送成功.");

    Ok(HttpResponse::Ok().json(ContactSent { success: true }))
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("Missing fields")]
    ValidationError(String),
    #[error("Server configuration error")]
    ConfigurationError,
    #[error("Failed to send message")]
    DeliveryError(#[source] anyhow::Error),
}

impl Debug for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        if let ContactError::ValidationError(reason) = self {
            write!(f, " Caused by: {reason}")?;
        }
        Ok(())
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ContactError::ConfigurationError | ContactError::DeliveryError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 只返回固定文案，不向调用方暴露底层原因
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ContactFailed {
            error: self.to_string(),
        })
    }
}

/// Bodies that are not a JSON object of strings count as missing fields,
/// unless the relay is unconfigured.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    let configured = req
        .app_data::<web::Data<ContactMailer>>()
        .is_some_and(|mailer| mailer.relay().is_some());
    if !configured {
        tracing::error!("Missing EMAIL_USER or EMAIL_PASS environment variables");
        return ContactError::ConfigurationError.into();
    }

    tracing::warn!(error.message = %err, "rejecting malformed contact payload.");
    ContactError::ValidationError(err.to_string()).into()
}
