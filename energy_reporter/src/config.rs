//! Reporter configuration.
//!
//! Loaded once at startup, either from the process environment (the variable
//! names used by existing deployments: `SHELLY_URL`, `SHELLY_IDS`, ...) or from
//! a TOML file with the same keys in lowercase, then validated eagerly so a
//! broken deployment fails at boot rather than on the first scheduled run.

use std::{net::SocketAddr, path::Path, time::Duration};

use chrono::NaiveTime;
use chrono_tz::Tz;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use shared_utils::{
    config::{ConfigError, parse_flag},
    env::{get_var_with, split_list},
};
use url::Url;

use crate::{
    collect::{CollectOptions, FailurePolicy},
    errors::Error,
    models::endpoint::{DeviceEndpointConfig, map_endpoints},
};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REPORT_TIME: NaiveTime = NaiveTime::from_hms_opt(23, 55, 0).unwrap();
const REPORT_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    /// Metering statistics endpoint.
    pub shelly_url: String,
    pub shelly_auth_key: SecretString,
    /// Device ids, in the same order as `google_form_entries`.
    #[serde(deserialize_with = "list_or_csv")]
    pub shelly_ids: Vec<String>,
    pub google_form_url: String,
    #[serde(deserialize_with = "list_or_csv")]
    pub google_form_entries: Vec<String>,
    /// Serve the HTTP surface. When off every request gets a 404.
    #[serde(default)]
    pub enable_web: bool,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Local time of the daily scheduled report.
    #[serde(default = "default_report_time", deserialize_with = "report_time")]
    pub report_time: NaiveTime,
    /// Zone used for day boundaries and the schedule.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl ReporterConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup` (variable name -> value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| get_var_with(name, &lookup).map_err(ConfigError::from);
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = match optional("BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::invalid("BIND_ADDR", format!("{e}")))?,
            None => default_bind_addr(),
        };
        let request_timeout_secs = match optional("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid("REQUEST_TIMEOUT_SECS", format!("{e}")))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let failure_policy = match optional("FAILURE_POLICY") {
            Some(raw) => raw
                .parse::<FailurePolicy>()
                .map_err(|e| ConfigError::invalid("FAILURE_POLICY", e))?,
            None => FailurePolicy::default(),
        };
        let report_time = match optional("REPORT_TIME") {
            Some(raw) => parse_report_time(&raw)
                .map_err(|e| ConfigError::invalid("REPORT_TIME", e))?,
            None => default_report_time(),
        };
        let timezone = match optional("TIMEZONE") {
            Some(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|e| ConfigError::invalid("TIMEZONE", format!("{e}")))?,
            None => default_timezone(),
        };

        let config = Self {
            shelly_url: required("SHELLY_URL")?,
            shelly_auth_key: SecretString::new(required("SHELLY_AUTH_KEY")?.into()),
            shelly_ids: split_list(&required("SHELLY_IDS")?),
            google_form_url: required("GOOGLE_FORM_URL")?,
            google_form_entries: split_list(&required("GOOGLE_FORM_ENTRIES")?),
            enable_web: parse_flag("ENABLE_WEB", &optional("ENABLE_WEB").unwrap_or_default())?,
            bind_addr,
            request_timeout_secs,
            failure_policy,
            report_time,
            timezone,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(raw).map_err(|e| Error::Config(format!("invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML config file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Checks everything that can be checked without network access.
    ///
    /// Errors:
    /// - empty or mismatched device/field lists
    /// - URLs that do not parse or are not http(s)
    /// - a zero request timeout
    pub fn validate(&self) -> Result<(), Error> {
        self.endpoints()?;
        for (name, raw) in [
            ("shelly_url", &self.shelly_url),
            ("google_form_url", &self.google_form_url),
        ] {
            let url = Url::parse(raw).map_err(|e| Error::Config(format!("{name}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "{name}: expected an http(s) URL, got scheme '{}'",
                    url.scheme()
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Device/field pairs in configuration order.
    pub fn endpoints(&self) -> Result<Vec<DeviceEndpointConfig>, Error> {
        map_endpoints(&self.shelly_ids, &self.google_form_entries)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            request_timeout: self.request_timeout(),
            policy: self.failure_policy,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_report_time() -> NaiveTime {
    DEFAULT_REPORT_TIME
}

fn default_timezone() -> Tz {
    chrono_tz::UTC
}

fn parse_report_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), REPORT_TIME_FORMAT)
        .map_err(|e| format!("'{raw}' is not HH:MM: {e}"))
}

fn report_time<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(d)?;
    parse_report_time(&raw).map_err(serde::de::Error::custom)
}

/// Accepts `["a", "b"]` as well as the env-style `"a,b"`.
fn list_or_csv<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Raw::deserialize(d)? {
        Raw::List(items) => items.into_iter().map(|s| s.trim().to_string()).collect(),
        Raw::Csv(raw) => split_list(&raw),
    })
}
