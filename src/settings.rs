use clap::Parser;
use config::{Config, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::path::PathBuf;
use std::time::Duration;
use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;
use url::Url;

/// Which half of the pipeline a process runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Edge,
    Resolution,
}

impl Stage {
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Edge => 8080,
            Self::Resolution => 8081,
        }
    }

    pub fn service_name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Default, Parser)]
#[command(author, version, about = "postal code weather service", long_about = None)]
pub struct CliOptions {
    /// Optional settings file layered beneath environment variables.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the listening port.
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    /// Base url of the resolution stage, used by the edge.
    #[serde(rename = "service_b_url")]
    pub resolution_url: Url,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "forward_timeout_secs")]
    pub forward_timeout: Duration,

    pub viacep_base_url: Url,
    pub weather_api_base_url: Url,

    #[serde(default)]
    pub weather_api_key: Option<Secret<String>>,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "provider_timeout_secs")]
    pub provider_timeout: Duration,

    #[serde(rename = "otel_collector_url")]
    pub collector_url: String,
}

impl Settings {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_RESOLUTION_URL: &'static str = "http://service-b:8081";
    pub const DEFAULT_COLLECTOR_URL: &'static str = "otel-collector:4317";
    pub const DEFAULT_VIACEP_BASE_URL: &'static str = "https://viacep.com.br";
    pub const DEFAULT_WEATHER_API_BASE_URL: &'static str = "https://api.weatherapi.com";
    pub const DEFAULT_TIMEOUT_SECS: i64 = 10;

    #[tracing::instrument(level = "debug")]
    pub fn load(options: &CliOptions, stage: Stage) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("host", Self::DEFAULT_HOST)?
            .set_default("port", i64::from(stage.default_port()))?
            .set_default("service_b_url", Self::DEFAULT_RESOLUTION_URL)?
            .set_default("forward_timeout_secs", Self::DEFAULT_TIMEOUT_SECS)?
            .set_default("viacep_base_url", Self::DEFAULT_VIACEP_BASE_URL)?
            .set_default("weather_api_base_url", Self::DEFAULT_WEATHER_API_BASE_URL)?
            .set_default("provider_timeout_secs", Self::DEFAULT_TIMEOUT_SECS)?
            .set_default("otel_collector_url", Self::DEFAULT_COLLECTOR_URL)?;

        if let Some(ref path) = options.config {
            tracing::info!(config_file=?path, "loading settings file");
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let config = builder
            .add_source(Environment::default())
            .set_override_option("port", options.port.map(i64::from))?
            .build()?;

        let settings: Self = config.try_deserialize()?;
        if stage == Stage::Resolution && settings.weather_api_key().is_none() {
            tracing::warn!(
                "WEATHER_API_KEY is not set -- every temperature resolution will fail until it is supplied."
            );
        }

        Ok(settings)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The weather provider credential, treating an empty value as absent.
    pub fn weather_api_key(&self) -> Option<&Secret<String>> {
        self.weather_api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
    }
}
