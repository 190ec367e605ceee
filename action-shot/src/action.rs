use std::sync::Arc;

use shot_throttle::ThrottleConfig;

use crate::ListenerOptions;
use crate::modifier::parse_throttle_modifier;

/// Auxiliary options attached to an action by parser extensions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionOptions {
    pub throttle: Option<ThrottleConfig>,
}

/// One `event->identifier#method` binding from a `data-action` attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionDescriptor {
    pub event_name: String,
    pub identifier: String,
    pub method_name: String,
    /// Host listener options (`:once`, `:passive`, `:capture`).
    pub listener: ListenerOptions,
    pub options: ActionOptions,
}

/// Turns a single action descriptor string into an [`ActionDescriptor`].
pub trait ActionDescriptorParser: Send + Sync {
    /// Returns `None` for strings that are not action descriptors.
    fn parse(&self, descriptor: &str) -> Option<ActionDescriptor>;

    /// Parse a whitespace separated attribute value, skipping entries that do
    /// not parse.
    fn parse_all(&self, attribute: &str) -> Vec<ActionDescriptor> {
        attribute
            .split_whitespace()
            .filter_map(|descriptor| self.parse(descriptor))
            .collect()
    }
}

impl<P> ActionDescriptorParser for Arc<P>
where
    P: ActionDescriptorParser + ?Sized,
{
    fn parse(&self, descriptor: &str) -> Option<ActionDescriptor> {
        (**self).parse(descriptor)
    }
}

/// The host's own grammar: `event->identifier#method[:option]*`.
///
/// Options other than `once`, `passive` and `capture` are left for
/// extensions to interpret.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostActionParser;

impl ActionDescriptorParser for HostActionParser {
    fn parse(&self, descriptor: &str) -> Option<ActionDescriptor> {
        let (event_name, target) = descriptor.split_once("->")?;
        let (identifier, method) = target.split_once('#')?;
        let mut tokens = method.split(':');
        let method_name = tokens.next()?;
        if event_name.is_empty() || identifier.is_empty() || method_name.is_empty() {
            return None;
        }

        let mut listener = ListenerOptions::default();
        for token in tokens {
            match token {
                "once" => listener.once = true,
                "passive" => listener.passive = true,
                "capture" => listener.capture = true,
                _ => {}
            }
        }

        Some(ActionDescriptor {
            event_name: event_name.to_string(),
            identifier: identifier.to_string(),
            method_name: method_name.to_string(),
            listener,
            options: ActionOptions::default(),
        })
    }
}

/// Wraps a host parser and adds the `:throttle:` modifier to its output.
///
/// The wrapped parser's fields are passed through untouched; only
/// `options.throttle` is filled in.
#[derive(Clone, Debug, Default)]
pub struct ThrottleModifierParser<P> {
    inner: P,
}

impl<P> ThrottleModifierParser<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: ActionDescriptorParser> ActionDescriptorParser for ThrottleModifierParser<P> {
    fn parse(&self, descriptor: &str) -> Option<ActionDescriptor> {
        let mut action = self.inner.parse(descriptor)?;
        if let Some(throttle) = parse_throttle_modifier(descriptor) {
            action.options.throttle = Some(throttle);
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_host_grammar() {
        let action = HostActionParser.parse("click->gallery#next:once").unwrap();

        assert_eq!(action.event_name, "click");
        assert_eq!(action.identifier, "gallery");
        assert_eq!(action.method_name, "next");
        assert!(action.listener.once);
        assert_eq!(action.options, ActionOptions::default());
    }

    #[test]
    fn it_rejects_incomplete_descriptors() {
        for descriptor in ["click", "click->gallery", "->gallery#next", "click->#next", "click->gallery#"] {
            assert!(HostActionParser.parse(descriptor).is_none(), "{descriptor}");
        }
    }

    #[test]
    fn test_host_parser_ignores_throttle() {
        let action = HostActionParser
            .parse("scroll->test#onScroll:throttle:200ms")
            .unwrap();

        assert_eq!(action.method_name, "onScroll");
        assert_eq!(action.options.throttle, None);
    }

    #[test]
    fn test_throttle_merges_into_host_output() {
        let host = HostActionParser
            .parse("scroll->test#onScroll:passive:throttle:200ms:notrailing")
            .unwrap();
        let extended = ThrottleModifierParser::new(HostActionParser)
            .parse("scroll->test#onScroll:passive:throttle:200ms:notrailing")
            .unwrap();

        assert_eq!(extended.event_name, host.event_name);
        assert_eq!(extended.identifier, host.identifier);
        assert_eq!(extended.method_name, host.method_name);
        assert_eq!(extended.listener, host.listener);
        assert!(extended.listener.passive);
        assert_eq!(
            extended.options.throttle,
            Some(ThrottleConfig::from_millis(200).with_trailing(false))
        );
    }

    #[test]
    fn test_extended_parser_keeps_host_rejections() {
        let parser = ThrottleModifierParser::new(HostActionParser);
        assert!(parser.parse("scroll:throttle:200ms").is_none());
    }

    #[test]
    fn test_parse_all_splits_on_whitespace() {
        let parser: Arc<dyn ActionDescriptorParser> =
            Arc::new(ThrottleModifierParser::new(HostActionParser));
        let actions = parser.parse_all("  click->a#b   bogus\nscroll->a#c:throttle:50 ");

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].options.throttle, None);
        assert_eq!(
            actions[1].options.throttle,
            Some(ThrottleConfig::from_millis(50))
        );
    }
}
