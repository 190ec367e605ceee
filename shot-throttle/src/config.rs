use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Timing parameters for a [`Throttle`](crate::Throttle).
///
/// When deserialized, `delay` is an integer number of milliseconds and both
/// edges default to enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum spacing between two invocations of the wrapped handler.
    #[serde(with = "millis")]
    pub delay: Duration,
    /// Invoke immediately when a call opens a new window.
    #[serde(default = "enabled")]
    pub leading: bool,
    /// Invoke once at the end of a window with the latest arguments.
    #[serde(default = "enabled")]
    pub trailing: bool,
}

fn enabled() -> bool {
    true
}

impl ThrottleConfig {
    /// Create a config with both edges enabled.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            leading: true,
            trailing: true,
        }
    }

    pub fn from_millis(delay: u64) -> Self {
        Self::new(Duration::from_millis(delay))
    }

    /// Set whether a call opening a new window invokes the handler immediately.
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Set whether calls inside a window are coalesced into one deferred call.
    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// False when neither edge is enabled, in which case the handler never runs.
    pub fn fires(&self) -> bool {
        self.leading || self.trailing
    }
}

mod millis {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub(super) fn serialize<S>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(delay.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_both_edges_on() {
        let config: ThrottleConfig = serde_json::from_str(r#"{ "delay": 250 }"#).unwrap();

        assert_eq!(config, ThrottleConfig::from_millis(250));
        assert!(config.leading);
        assert!(config.trailing);
    }

    #[test]
    fn it_reads_explicit_edges() {
        let config: ThrottleConfig =
            serde_json::from_str(r#"{ "delay": 10, "leading": false }"#).unwrap();

        assert_eq!(
            config,
            ThrottleConfig::from_millis(10).with_leading(false)
        );
    }

    #[test]
    fn it_rejects_negative_delay() {
        assert!(serde_json::from_str::<ThrottleConfig>(r#"{ "delay": -5 }"#).is_err());
        assert!(serde_json::from_str::<ThrottleConfig>(r#"{ "delay": "fast" }"#).is_err());
    }

    #[test]
    fn test_serializes_delay_as_millis() {
        let config = ThrottleConfig::new(Duration::from_secs(2)).with_trailing(false);
        let json = serde_json::to_value(config).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "delay": 2000, "leading": true, "trailing": false })
        );
    }

    #[test]
    fn test_both_edges_off_never_fires() {
        let config = ThrottleConfig::from_millis(100)
            .with_leading(false)
            .with_trailing(false);
        assert!(!config.fires());
    }
}
