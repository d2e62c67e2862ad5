//! Server configuration, read once at startup from command line arguments and
//! environment variables.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::Parser;

use crate::timezone::get_local_offset;

/// The secret used to sign cookies when none is configured for a local server.
const LOCAL_COOKIE_SECRET: &str = "budgetbook-local-development-secret";

/// The default port the server listens on.
const DEFAULT_PORT: u16 = 3000;

/// The personal budgeting web server.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH", default_value = "budgetbook.db")]
    pub db_path: PathBuf,

    /// The address to listen on. Defaults to 127.0.0.1 locally and 0.0.0.0 when hosted.
    #[arg(long, env = "HOST")]
    pub host: Option<IpAddr>,

    /// The port to serve the app from.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// The secret used to sign and encrypt auth cookies. Required when hosted.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    pub timezone: String,

    /// How long to wait for a locked database before giving up, in seconds.
    #[arg(long, env = "DB_BUSY_TIMEOUT", default_value_t = 10)]
    pub db_busy_timeout: u64,

    /// Set by the hosting platform, used to detect a hosted deployment.
    #[arg(long, env = "RAILWAY_ENVIRONMENT", hide = true)]
    pub railway_environment: Option<String>,
}

/// Where the server is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// A developer's machine.
    Local,
    /// A hosting platform that provides the port to bind to.
    Hosted,
}

impl Environment {
    /// Detect the environment from the hosting platform's variables.
    ///
    /// The server is considered hosted if either the platform's environment
    /// name or a port has been provided.
    pub fn detect(railway_environment: Option<&str>, port: Option<u16>) -> Self {
        if railway_environment.is_some() || port.is_some() {
            Environment::Hosted
        } else {
            Environment::Local
        }
    }

    /// The default filter directive for the log output.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Local => "budgetbook=debug,tower_http=debug,info",
            Environment::Hosted => "info",
        }
    }
}

/// Errors in the server configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A hosted server must not fall back to the well known local secret.
    #[error("a cookie secret must be set with --secret or SECRET when hosted")]
    MissingSecret,

    /// The timezone is not a canonical timezone name.
    #[error("\"{0}\" is not a valid, canonical timezone name")]
    InvalidTimezone(String),
}

/// The settings the server runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Where the server is running.
    pub environment: Environment,
    /// File path to the application SQLite database.
    pub db_path: PathBuf,
    /// The address to listen on.
    pub address: SocketAddr,
    /// The secret the cookie key is derived from.
    pub cookie_secret: String,
    /// The canonical name of the local timezone.
    pub local_timezone: String,
    /// How long to wait for a locked database.
    pub db_busy_timeout: Duration,
}

impl AppConfig {
    /// Build the config from the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is hosted without a cookie secret or if
    /// the timezone is not valid.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let environment = Environment::detect(args.railway_environment.as_deref(), args.port);

        let host = args.host.unwrap_or(match environment {
            Environment::Local => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Environment::Hosted => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        });
        let address = SocketAddr::new(host, args.port.unwrap_or(DEFAULT_PORT));

        let cookie_secret = match (args.secret, environment) {
            (Some(secret), _) if !secret.is_empty() => secret,
            (_, Environment::Local) => {
                tracing::warn!("No cookie secret set, using the local development secret.");
                LOCAL_COOKIE_SECRET.to_owned()
            }
            (_, Environment::Hosted) => return Err(ConfigError::MissingSecret),
        };

        if get_local_offset(&args.timezone).is_none() {
            return Err(ConfigError::InvalidTimezone(args.timezone));
        }

        Ok(Self {
            environment,
            db_path: args.db_path,
            address,
            cookie_secret,
            local_timezone: args.timezone,
            db_busy_timeout: Duration::from_secs(args.db_busy_timeout),
        })
    }
}

#[cfg(test)]
mod environment_tests {
    use super::Environment;

    #[test]
    fn local_without_platform_variables() {
        assert_eq!(Environment::detect(None, None), Environment::Local);
    }

    #[test]
    fn hosted_with_platform_name_or_port() {
        assert_eq!(
            Environment::detect(Some("production"), None),
            Environment::Hosted
        );
        assert_eq!(Environment::detect(None, Some(8080)), Environment::Hosted);
    }
}

#[cfg(test)]
mod app_config_tests {
    use std::{
        net::{IpAddr, Ipv4Addr},
        time::Duration,
    };

    use clap::Parser;

    use super::{AppConfig, Args, ConfigError, Environment, LOCAL_COOKIE_SECRET};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("server").chain(args.iter().copied()))
            .expect("could not parse test args")
    }

    #[test]
    fn local_defaults() {
        let config = AppConfig::from_args(Args {
            port: None,
            railway_environment: None,
            secret: None,
            host: None,
            ..parse(&[])
        })
        .unwrap();

        assert_eq!(config.environment, Environment::Local);
        assert_eq!(config.address.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.address.port(), 3000);
        assert_eq!(config.cookie_secret, LOCAL_COOKIE_SECRET);
        assert_eq!(config.db_busy_timeout, Duration::from_secs(10));
    }

    #[test]
    fn hosted_binds_all_interfaces() {
        let config = AppConfig::from_args(Args {
            port: Some(8080),
            railway_environment: None,
            secret: Some("hunter2".to_owned()),
            host: None,
            ..parse(&[])
        })
        .unwrap();

        assert_eq!(config.environment, Environment::Hosted);
        assert_eq!(config.address.ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.address.port(), 8080);
        assert_eq!(config.cookie_secret, "hunter2");
    }

    #[test]
    fn hosted_requires_secret() {
        let result = AppConfig::from_args(Args {
            port: None,
            railway_environment: Some("production".to_owned()),
            secret: None,
            host: None,
            ..parse(&[])
        });

        assert_eq!(result, Err(ConfigError::MissingSecret));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let result = AppConfig::from_args(Args {
            port: None,
            railway_environment: None,
            secret: None,
            host: None,
            timezone: "Middle/Earth".to_owned(),
            ..parse(&[])
        });

        assert_eq!(
            result,
            Err(ConfigError::InvalidTimezone("Middle/Earth".to_owned()))
        );
    }
}
