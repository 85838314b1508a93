//! Configuration management for AccessGate.
//!
//! All configuration is driven by environment variables.

use std::fmt;

/// Default bind address for the gate.
const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// A credential to install at startup, read from the environment.
#[derive(Clone)]
pub struct SeedCredential {
    /// Credential id (`ACCESS_KEY`).
    pub access_key: String,
    /// Shared secret (`SECRET_KEY`).
    pub secret_key: String,
    /// Owning subject (`ACCESS_KEY_SUBJECT`).
    pub subject_id: String,
    /// JSON permission document (`ACCESS_KEY_PERMISSIONS`).
    pub permissions: Option<String>,
}

impl fmt::Debug for SeedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedCredential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("subject_id", &self.subject_id)
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Global configuration for AccessGate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Bind address for the gate.
    pub gateway_listen: String,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Accepted distance between the signed timestamp and the server clock,
    /// in seconds. Zero disables the check.
    pub max_clock_skew_secs: u64,
    /// Optional credential installed at startup.
    pub seed: Option<SeedCredential>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            gateway_listen: DEFAULT_LISTEN.to_owned(),
            log_level: "info".to_owned(),
            max_clock_skew_secs: 0,
            seed: None,
        }
    }
}

impl GateConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("MAX_CLOCK_SKEW_SECS") {
            match v.trim().parse() {
                Ok(secs) => config.max_clock_skew_secs = secs,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid MAX_CLOCK_SKEW_SECS"),
            }
        }

        config.seed = match (lookup("ACCESS_KEY"), lookup("SECRET_KEY")) {
            (Some(access_key), Some(secret_key)) => Some(SeedCredential {
                access_key,
                secret_key,
                subject_id: lookup("ACCESS_KEY_SUBJECT").unwrap_or_else(|| "0".to_owned()),
                permissions: lookup("ACCESS_KEY_PERMISSIONS"),
            }),
            _ => None,
        };

        config
    }
}
