use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use shot_throttle::ThrottleConfig;

use crate::ConfigurationError;
use crate::ListenerOptions;

/// Throttled listener declarations keyed by event name.
pub type ListenerMap = BTreeMap<String, ListenerSpec>;

/// Listener options declared next to the throttle key in the pair form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PairOptions {
    #[serde(flatten)]
    pub listener: ListenerOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<ThrottleConfig>,
}

/// How a single event is bound to a controller method.
///
/// Deserializes from any of:
///
/// ```json
/// { "method": "onScroll", "throttle": { "delay": 100 }, "options": { "passive": true } }
/// ["onScroll", { "passive": true, "throttle": { "delay": 100 } }]
/// "onScroll"
/// ```
///
/// The last shape is accepted by the parser so that it can be reported, but
/// wiring always rejects it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListenerSpec {
    Descriptor {
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        throttle: Option<ThrottleConfig>,
        #[serde(default)]
        options: ListenerOptions,
    },
    Pair(String, PairOptions),
    Shorthand(String),
}

/// A declaration that passed shape validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ResolvedListener<'a> {
    pub(crate) method: &'a str,
    pub(crate) throttle: ThrottleConfig,
    pub(crate) options: ListenerOptions,
}

impl ListenerSpec {
    /// Bind `method` with `throttle` and default listener options.
    pub fn throttled(method: impl Into<String>, throttle: ThrottleConfig) -> Self {
        ListenerSpec::Descriptor {
            method: method.into(),
            throttle: Some(throttle),
            options: ListenerOptions::default(),
        }
    }

    /// Replace the listener options. Has no effect on a shorthand.
    pub fn with_options(mut self, listener_options: ListenerOptions) -> Self {
        match &mut self {
            ListenerSpec::Descriptor { options, .. } => *options = listener_options,
            ListenerSpec::Pair(_, pair) => pair.listener = listener_options,
            ListenerSpec::Shorthand(_) => {}
        }
        self
    }

    pub(crate) fn resolve(&self, event: &str) -> Result<ResolvedListener<'_>, ConfigurationError> {
        let (method, throttle, options) = match self {
            ListenerSpec::Shorthand(shorthand) => {
                return Err(ConfigurationError::ConfigurationObjectRequired {
                    event: event.to_string(),
                    shorthand: shorthand.clone(),
                });
            }
            ListenerSpec::Pair(method, pair) => (method, pair.throttle, pair.listener),
            ListenerSpec::Descriptor {
                method,
                throttle,
                options,
            } => (method, *throttle, *options),
        };

        let throttle = throttle.ok_or_else(|| ConfigurationError::ThrottleRequired {
            event: event.to_string(),
        })?;

        Ok(ResolvedListener {
            method,
            throttle,
            options,
        })
    }
}
