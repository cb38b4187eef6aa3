use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

use crate::{
    config::{MissingCredentials, RelayConfig, RelayCredentials},
    domain::ContactMessage,
};

/// 一封待发送的邮件，发件人由中继账户决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
}

#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("`{address}` is not a valid mailbox.")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("failed to build email message.")]
    Build(#[from] lettre::error::Error),
    #[error("smtp relay rejected or dropped the message.")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Opaque `send(message) -> success|failure` capability of the mail relay.
#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), RelayError>;
}

pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpRelay {
    pub fn new(config: &RelayConfig, credentials: &RelayCredentials) -> Result<Self, RelayError> {
        let sender = parse_mailbox(&credentials.user)?;
        let credentials = Credentials::new(
            credentials.user.clone(),
            credentials.password.expose_secret().to_owned(),
        );
        // 465端口，隐式TLS
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(config.timeout()))
            .build();

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    #[tracing::instrument(name = "sending email", skip_all, fields(to = %email.to))]
    async fn send(&self, email: &OutboundEmail) -> Result<(), RelayError> {
        let message = build_message(self.sender.clone(), email)?;
        self.transport.send(message).await?;

        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, RelayError> {
    address
        .parse()
        .map_err(|source| RelayError::InvalidAddress {
            address: address.into(),
            source,
        })
}

fn build_message(sender: Mailbox, email: &OutboundEmail) -> Result<Message, RelayError> {
    let message = Message::builder()
        .from(sender)
        .to(parse_mailbox(&email.to)?)
        .reply_to(parse_mailbox(&email.reply_to)?)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.text_body.clone())?;

    Ok(message)
}

/// Relay handle plus the fixed owner inbox, built once at startup.
/// `relay` is `None` when the credentials were missing.
#[derive(Clone)]
pub struct ContactMailer {
    relay: Option<Arc<dyn MailRelay>>,
    owner_address: String,
}

impl ContactMailer {
    pub fn new(relay: Option<Arc<dyn MailRelay>>, owner_address: impl Into<String>) -> Self {
        Self {
            relay,
            owner_address: owner_address.into(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::from_credentials(config, RelayCredentials::from_env())
    }

    /// 凭据缺失或无效时服务照常启动，联系请求统一返回配置错误
    pub fn from_credentials(
        config: &RelayConfig,
        credentials: Result<RelayCredentials, MissingCredentials>,
    ) -> Self {
        let relay = match credentials {
            Ok(credentials) => match SmtpRelay::new(config, &credentials) {
                Ok(relay) => {
                    tracing::info!(
                        smtp_host = %config.smtp_host,
                        smtp_port = config.smtp_port,
                        "mail relay configured."
                    );
                    Some(Arc::new(relay) as Arc<dyn MailRelay>)
                }
                Err(e) => {
                    tracing::error!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "mail relay credentials are unusable."
                    );
                    None
                }
            },
            Err(e) => {
                tracing::error!(error.message = %e, "mail relay is not configured.");
                None
            }
        };

        Self::new(relay, &config.owner_address)
    }

    pub fn relay(&self) -> Option<&Arc<dyn MailRelay>> {
        self.relay.as_ref()
    }

    pub fn outbound_email(&self, message: &ContactMessage) -> OutboundEmail {
        OutboundEmail {
            to: self.owner_address.clone(),
            reply_to: message.email.as_ref().into(),
            subject: message.subject(),
            text_body: message.text_body(),
        }
    }
}
