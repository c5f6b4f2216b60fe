//! Configuration for the resolver.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`Resolver`](super::Resolver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum refs handed to one loader call; larger groups are chunked
    pub max_batch_size: usize,
    /// Deadline applied by `get_hardpoint` (ms); `None` waits indefinitely
    pub default_timeout_ms: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            default_timeout_ms: None,
        }
    }
}

impl ResolverConfig {
    /// Set the batch size limit.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Set the default deadline.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = Some(duration_ms(timeout));
        self
    }

    /// Batch size actually used; zero means one ref per call.
    pub fn effective_batch_size(&self) -> usize {
        self.max_batch_size.max(1)
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Whole milliseconds in `duration`, rounded up so a non-zero deadline
/// never reads as zero. Saturates at `u64::MAX`.
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    let millis = duration.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let config = ResolverConfig::default()
            .with_max_batch_size(25)
            .with_default_timeout(Duration::from_secs(2));

        let yaml = config.to_yaml().unwrap();
        assert_eq!(ResolverConfig::from_yaml(&yaml).unwrap(), config);
        assert_eq!(config.default_timeout(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ResolverConfig::from_yaml("max_batch_size: 0\n").unwrap();
        assert_eq!(config.max_batch_size, 0);
        assert_eq!(config.effective_batch_size(), 1);
        assert_eq!(config.default_timeout(), None);
    }

    #[test]
    fn test_timeout_millis_round_up_and_saturate() {
        assert_eq!(duration_ms(Duration::ZERO), 0);
        assert_eq!(duration_ms(Duration::from_micros(250)), 1);
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);

        let config = ResolverConfig::default().with_default_timeout(Duration::from_micros(500));
        assert_eq!(config.default_timeout_ms, Some(1));
        let config = ResolverConfig::default().with_default_timeout(Duration::MAX);
        assert_eq!(config.default_timeout_ms, Some(u64::MAX));
    }
}
