//! Payment gateway configuration.
//!
//! Loaded from environment variables. Credentials have no defaults: a missing
//! or empty application id or private key is a startup error.

use crate::error::{ReservationError, Result};
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.bootpay.co.kr/";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

#[derive(Clone)]
pub struct GatewayConfig {
    /// Root URL of the gateway API, always ending in `/`.
    pub base_url: String,
    pub application_id: String,
    pub private_key: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl GatewayConfig {
    /// Reads `BOOTPAY_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ReservationError::Config(format!("{key} must be set")))
        };
        let millis = |key: &str, default: u64| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map(Duration::from_millis)
                    .map_err(|_| {
                        ReservationError::Config(format!("{key} must be a number of milliseconds"))
                    }),
                None => Ok(Duration::from_millis(default)),
            }
        };

        let mut base_url = lookup("BOOTPAY_BASE_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            base_url,
            application_id: required("BOOTPAY_APPLICATION_ID")?,
            private_key: required("BOOTPAY_PRIVATE_KEY")?,
            connect_timeout: millis("BOOTPAY_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?,
            read_timeout: millis("BOOTPAY_READ_TIMEOUT_MS", DEFAULT_READ_TIMEOUT_MS)?,
        })
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("application_id", &self.application_id)
            .field("private_key", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
