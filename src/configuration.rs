use crate::domain::WaitlistEmail;
use config::{Config, Environment as EnvironmentSource, File, FileFormat};
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::time::Duration;

/// Retrive the configuration for the application.
///
/// `configuration/base.yaml` is loaded first, then the overlay for the
/// environment named by `APP_ENVIRONMENT`, and finally any `APP_`-prefixed
/// environment variables, e.g. `APP_EMAIL_CLIENT__AUTHORIZATION_TOKEN`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let configuration_directory = std::env::current_dir()
        .map_err(|e| config::ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    Config::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")).format(FileFormat::Yaml))
        .add_source(
            File::from(configuration_directory.join(environment.file_name()))
                .format(FileFormat::Yaml)
                .required(false),
        )
        .add_source(
            EnvironmentSource::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub waitlist: WaitlistSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub sender_name: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn base_url(&self) -> Result<reqwest::Url, url::ParseError> {
        reqwest::Url::parse(&self.base_url)
    }

    pub fn sender(&self) -> Result<WaitlistEmail, String> {
        WaitlistEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WaitlistSettings {
    /// Internal address that is notified about every signup.
    pub admin_email: String,
    pub testflight_url: String,
}

impl WaitlistSettings {
    pub fn admin_recipient(&self) -> Result<WaitlistEmail, String> {
        WaitlistEmail::parse(self.admin_email.clone())
    }
}

/// The runtime environment for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn file_name(&self) -> &'static str {
        match self {
            Environment::Local => "local.yaml",
            Environment::Production => "production.yaml",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
