/// Mistakes in throttled listener setup, reported when listeners are wired.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A listener was declared with a bare method name.
    ///
    /// A string cannot carry a delay, so this shape is always rejected.
    #[error("Throttled listeners require a configuration object (got {shorthand:?} for {event})")]
    ConfigurationObjectRequired {
        /// The event the shorthand was declared for.
        event: String,
        /// The rejected shorthand value.
        shorthand: String,
    },

    /// A listener declaration has no `throttle` section.
    #[error("Throttle configuration required for {event}")]
    ThrottleRequired {
        /// The event missing its configuration.
        event: String,
    },

    /// The controller does not expose a method with this name.
    #[error("Method {method} not found on controller {controller}")]
    MethodNotFound {
        /// The method name that failed to resolve.
        method: String,
        /// Type name of the controller searched.
        controller: &'static str,
    },
}
