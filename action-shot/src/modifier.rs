use std::sync::OnceLock;

use regex::Regex;
use shot_throttle::ThrottleConfig;

const THROTTLE_MARKER: &str = ":throttle:";

static RE_THROTTLE_SUFFIX: OnceLock<Regex> = OnceLock::new();

/// Extract the throttle configuration from an action descriptor such as
/// `scroll->gallery#onScroll:throttle:200ms:notrailing`.
///
/// The suffix is `:throttle:<digits>` with an optional `m`/`ms` unit, followed
/// by any number of `:leading`, `:trailing`, `:noleading` or `:notrailing`
/// tokens applied left to right. Unrecognised tokens are ignored.
///
/// Returns `None` when there is no `:throttle:` segment, when it appears more
/// than once, or when the delay is not a number. Descriptors come from markup,
/// so a malformed suffix leaves the action unthrottled instead of failing.
pub fn parse_throttle_modifier(descriptor: &str) -> Option<ThrottleConfig> {
    let mut segments = descriptor.split(THROTTLE_MARKER);
    segments.next()?;
    let suffix = segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let captures = RE_THROTTLE_SUFFIX
        .get_or_init(|| Regex::new(r"^(\d+)(?:ms?)?((?::[^:\s]*)*)$").expect("invalid regex"))
        .captures(suffix)?;
    let delay = captures[1].parse::<u64>().ok()?;

    let mut config = ThrottleConfig::from_millis(delay);
    for token in captures[2].split(':').filter(|token| !token.is_empty()) {
        match token {
            "leading" => config.leading = true,
            "trailing" => config.trailing = true,
            "noleading" => config.leading = false,
            "notrailing" => config.trailing = false,
            other => tracing::debug!(modifier = other, "ignoring unknown throttle modifier"),
        }
    }
    Some(config)
}
