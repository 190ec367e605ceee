use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A callback registered on an [`Element`].
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// A discrete event delivered to an element's listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    kind: String,
    detail: Value,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            detail: Value::Null,
        }
    }

    pub fn with_detail(kind: impl Into<String>, detail: Value) -> Self {
        Self {
            kind: kind.into(),
            detail,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn detail(&self) -> &Value {
        &self.detail
    }
}

/// Options accepted when adding a listener to an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerOptions {
    pub capture: bool,
    /// Remove the listener after its first dispatch.
    pub once: bool,
    pub passive: bool,
}

struct Registration {
    event: String,
    listener: Listener,
    options: ListenerOptions,
}

#[derive(Default)]
struct ElementInner {
    attributes: RwLock<BTreeMap<String, String>>,
    listeners: Mutex<Vec<Registration>>,
}

/// An event target with string attributes.
///
/// Clones refer to the same element.
#[derive(Clone, Default)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field(
                "attributes",
                &*self
                    .inner
                    .attributes
                    .read()
                    .unwrap_or_else(PoisonError::into_inner),
            )
            .field("listeners", &self.listeners().len())
            .finish()
    }
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Register `listener` for `event`.
    ///
    /// Adding the same listener twice for the same event and capture phase is
    /// a no-op.
    pub fn add_event_listener(&self, event: &str, listener: Listener, options: ListenerOptions) {
        let mut listeners = self.listeners();
        if listeners.iter().any(|r| {
            r.event == event
                && r.options.capture == options.capture
                && Arc::ptr_eq(&r.listener, &listener)
        }) {
            return;
        }
        listeners.push(Registration {
            event: event.to_string(),
            listener,
            options,
        });
    }

    /// Remove `listener` from `event`. Returns false if it was not registered.
    pub fn remove_event_listener(&self, event: &str, listener: &Listener) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|r| !(r.event == event && Arc::ptr_eq(&r.listener, listener)));
        listeners.len() != before
    }

    /// Deliver `event` to every listener registered for its kind, in
    /// registration order. Returns the number of listeners run.
    pub fn dispatch_event(&self, event: &Event) -> usize {
        let targets: Vec<Listener> = {
            let mut listeners = self.listeners();
            let targets = listeners
                .iter()
                .filter(|r| r.event == event.kind)
                .map(|r| Arc::clone(&r.listener))
                .collect();
            listeners.retain(|r| !(r.event == event.kind && r.options.once));
            targets
        };

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners().iter().filter(|r| r.event == event).count()
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
