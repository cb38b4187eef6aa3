use std::time::Duration;

use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

pub const EMAIL_USER: &str = "EMAIL_USER";
pub const EMAIL_PASS: &str = "EMAIL_PASS";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Config {
    pub web: WebConfig,
    pub relay: RelayConfig,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct WebConfig {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl WebConfig {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct RelayConfig {
    pub smtp_host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub smtp_port: u16,
    /// 所有联系消息的收件地址
    pub owner_address: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Relay account credentials, taken from `EMAIL_USER` / `EMAIL_PASS` only.
#[derive(Clone, Debug)]
pub struct RelayCredentials {
    pub user: String,
    pub password: SecretString,
}

#[derive(thiserror::Error, Debug)]
#[error("Missing EMAIL_USER or EMAIL_PASS environment variables")]
pub struct MissingCredentials;

impl RelayCredentials {
    pub fn from_env() -> Result<Self, MissingCredentials> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 空字符串与缺失同等对待
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MissingCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.is_empty());
        match (present(EMAIL_USER), present(EMAIL_PASS)) {
            (Some(user), Some(password)) => Ok(Self {
                user,
                password: SecretString::new(password.into()),
            }),
            _ => Err(MissingCredentials),
        }
    }
}

pub fn config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::new("config.yaml", config::FileFormat::Yaml))
        // APP_WEB__PORT=8080 => web.port = 8080
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize::<Config>()
}
