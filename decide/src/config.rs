use crate::*;
use std::env::var;
use std::time::Duration;

/// Runtime configuration for the voting core.
///
/// Passed explicitly to [`VotingService::new`] and [`Coordinator::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bit strength of the ElGamal group used for new votings.
    pub key_bits: usize,

    /// Base URL of this deployment. Authorities registered with this URL are local.
    pub base_url: String,

    /// Upper bound on any single round-trip to the authorities (key setup, shuffle, decrypt).
    pub authority_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key_bits: 256,
            base_url: "http://localhost:8000".to_owned(),
            authority_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Build a config from `DECIDE_*` environment variables, using defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(val) = var("DECIDE_KEY_BITS") {
            config.key_bits = val.parse().map_err(|_| ConfigError::BadValue {
                var: "DECIDE_KEY_BITS",
                expected: "an integer",
                value: val.clone(),
            })?;
            if !Group::supported_bits().contains(&config.key_bits) {
                return Err(ConfigError::BadValue {
                    var: "DECIDE_KEY_BITS",
                    expected: "one of 256, 512, 1536, 2048, 3072, 4096",
                    value: val,
                });
            }
        }

        if let Ok(val) = var("DECIDE_BASE_URL") {
            config.base_url = val;
        }

        if let Ok(val) = var("DECIDE_AUTHORITY_TIMEOUT_SECS") {
            let secs: u64 = val.parse().map_err(|_| ConfigError::BadValue {
                var: "DECIDE_AUTHORITY_TIMEOUT_SECS",
                expected: "a whole number of seconds",
                value: val.clone(),
            })?;
            if secs == 0 {
                return Err(ConfigError::BadValue {
                    var: "DECIDE_AUTHORITY_TIMEOUT_SECS",
                    expected: "greater than zero",
                    value: val,
                });
            }
            config.authority_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Whether an authority URL points at this deployment.
    pub fn is_local(&self, url: &str) -> bool {
        url.trim_end_matches('/') == self.base_url.trim_end_matches('/')
    }
}
