use std::env;
use std::time::Duration;

/// Environment-supplied provider configuration.
///
/// Credentials are never compiled into source; the tushare token comes from
/// `TUSHARE_TOKEN` and its absence degrades the chain (the tushare tier
/// reports itself unavailable) instead of aborting the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub tushare_token: Option<String>,
    pub chain_timeout: Duration,
}

impl ProviderConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Self {
        let tushare_token = env::var("TUSHARE_TOKEN")
            .ok()
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty());

        let chain_timeout = env::var("ASHARE_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(
                Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
                Duration::from_secs,
            );

        Self {
            tushare_token,
            chain_timeout,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            tushare_token: None,
            chain_timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_thirty_seconds() {
        let config = ProviderConfig::default();
        assert_eq!(config.chain_timeout, Duration::from_secs(30));
        assert!(config.tushare_token.is_none());
    }
}
