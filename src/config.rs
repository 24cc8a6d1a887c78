use crate::cli::Cli;
use crate::prelude::{Error, Result};
use crate::prism::client::{ClusterEndpoint, DEFAULT_PORT};
use crate::prism::types::TransportOptions;
use config::builder::{ConfigBuilder, DefaultState};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// Loads `.env` from the working directory if there is one.
///
/// Has to run before the command line is parsed, since `clap` reads its
/// `env` fallbacks at parse time.
///
pub fn load_dotenv() -> Result<()> {
    match dotenv::dotenv() {
        Ok(path) => tracing::info!(target: "config", path = %path.display(), ".env loaded."),
        Err(error) if error.not_found() => tracing::debug!(target: "config", "No .env file."),
        Err(error) => return Err(error.into()),
    }
    Ok(())
}

/// Represents the build step's configuration.
///
/// Sources, lowest precedence first: built-in defaults, the optional YAML
/// file, `PRISM__*` environment variables, command-line flags.
///
#[derive(Debug, Deserialize)]
pub struct Config {
    pub cluster: ClusterEnv,
    pub transport: TransportEnv,
}

impl Config {
    /// Loads the configuration, applying overrides from the command line.
    ///
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with_environment(cli, None)
    }

    /// Same as [`Config::load`], reading `PRISM__*` variables from
    /// `environment` instead of the process environment when it is given.
    ///
    pub fn load_with_environment(
        cli: &Cli,
        environment: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Self::defaults()?;
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        let builder = builder
            .add_source(
                config::Environment::with_prefix("PRISM")
                    .separator("__")
                    .source(environment),
            )
            .set_override_option("cluster.host", cli.cluster_ip.clone())?
            .set_override_option("cluster.username", cli.username.clone())?
            .set_override_option(
                "cluster.password",
                cli.password
                    .as_ref()
                    .map(|password| password.expose_secret().to_owned()),
            )?
            .set_override_option("transport.insecure_skip_verify", cli.insecure.then_some(true))?;

        let config = Self::from_builder(builder)?;
        tracing::info!(target: "config", ?config, "Configuration loaded.");

        Ok(config)
    }

    /// Returns a builder holding the default value of every key.
    ///
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(config::Config::builder()
            .set_default("cluster.host", "")?
            .set_default("cluster.port", i64::from(DEFAULT_PORT))?
            .set_default("cluster.username", "")?
            .set_default("cluster.password", "")?
            .set_default("transport.insecure_skip_verify", false)?
            .set_default("transport.connect_timeout_secs", 10_i64)?
            .set_default("transport.timeout_secs", 60_i64)?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder.build()?.try_deserialize().map_err(Error::from)
    }
}

// -----------------------------------------------------------------------------

/// Address and credentials of the Prism cluster.
///
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterEnv {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl ClusterEnv {
    /// Fails with the first missing connection parameter.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::MissingParameter("cluster IP"));
        }
        if self.username.is_empty() {
            return Err(Error::MissingParameter("Prism username"));
        }
        if self.password.expose_secret().is_empty() {
            return Err(Error::MissingParameter("Prism password"));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> ClusterEndpoint {
        ClusterEndpoint::new(
            self.host.trim(),
            self.port,
            &self.username,
            self.password.clone(),
        )
    }
}

/// Connection behaviour of the Prism client.
///
#[derive(Debug, Clone, Deserialize)]
pub struct TransportEnv {
    pub insecure_skip_verify: bool,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl TransportEnv {
    pub fn options(&self) -> TransportOptions {
        TransportOptions {
            insecure_skip_verify: self.insecure_skip_verify,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
