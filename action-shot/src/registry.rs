use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;

use shot_throttle::Throttle;

use crate::ConfigurationError;
use crate::Controller;
use crate::Element;
use crate::Event;
use crate::Listener;
use crate::ListenerMap;
use crate::controller::bind;
use crate::controller::resolve_method;

struct Wired {
    event: String,
    listener: Listener,
    throttle: Throttle<Event>,
}

impl Wired {
    fn unwire(self, element: &Element) {
        element.remove_event_listener(&self.event, &self.listener);
        self.throttle.cancel();
    }
}

struct Entry {
    owner: Weak<dyn Any + Send + Sync>,
    element: Element,
    wired: Vec<Wired>,
}

impl Entry {
    fn unwire(self) -> usize {
        let count = self.wired.len();
        for wired in self.wired {
            wired.unwire(&self.element);
        }
        count
    }
}

/// Tracks the throttled listeners wired for each connected controller.
///
/// Entries are keyed by controller identity and hold the controller weakly.
/// Each entry maps an event name to the single listener this registry added
/// for it, so that detaching removes exactly those listeners and nothing
/// registered by other code.
#[derive(Default)]
pub struct ThrottleRegistry {
    entries: Mutex<HashMap<usize, Entry>>,
}

impl fmt::Debug for ThrottleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottleRegistry")
            .field("controllers", &self.lock().len())
            .finish()
    }
}

fn key<C>(controller: &Arc<C>) -> usize {
    Arc::as_ptr(controller) as *const () as usize
}

impl ThrottleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wire the listeners declared by [`Controller::throttled_listeners`].
    ///
    /// Controllers without declarations are left untouched.
    pub fn use_throttle<C: Controller>(&self, controller: &Arc<C>) -> Result<(), ConfigurationError> {
        match C::throttled_listeners() {
            Some(listeners) => self.attach(controller, &listeners),
            None => Ok(()),
        }
    }

    /// Wrap each declared method in a throttle and listen for its event on the
    /// controller's element.
    ///
    /// Every declaration is validated before any listener is added, so an error
    /// leaves the element unchanged. Wiring an event that is already wired for
    /// this controller replaces the earlier listener and drops its pending call.
    pub fn attach<C: Controller>(
        &self,
        controller: &Arc<C>,
        listeners: &ListenerMap,
    ) -> Result<(), ConfigurationError> {
        let resolved = listeners
            .iter()
            .map(|(event, spec)| {
                let resolved = spec.resolve(event)?;
                let method = resolve_method::<C>(resolved.method)?;
                Ok((event, resolved, method))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        let mut entries = self.lock();
        prune(&mut entries);

        let element = controller.element().clone();
        let owner: Weak<C> = Arc::downgrade(controller);
        let entry = entries.entry(key(controller)).or_insert_with(|| Entry {
            owner: owner as Weak<dyn Any + Send + Sync>,
            element: element.clone(),
            wired: Vec::new(),
        });

        for (event, resolved, method) in resolved {
            if let Some(index) = entry.wired.iter().position(|w| &w.event == event) {
                tracing::debug!(event = %event, "replacing throttled listener");
                entry.wired.swap_remove(index).unwire(&element);
            }

            let handler = bind(controller, method);
            let throttle = Throttle::new(move |event: Event| handler(&event), resolved.throttle);
            let handle = throttle.clone();
            let listener: Listener = Arc::new(move |event: &Event| handle.call(event.clone()));

            element.add_event_listener(event, Arc::clone(&listener), resolved.options);
            entry.wired.push(Wired {
                event: event.clone(),
                listener,
                throttle,
            });
        }

        tracing::debug!(
            controller = std::any::type_name::<C>(),
            listeners = entry.wired.len(),
            "throttled listeners attached"
        );
        Ok(())
    }

    /// Remove every listener wired for `controller` and drop pending calls.
    ///
    /// Returns the number of listeners removed; detaching a controller that
    /// has nothing wired returns 0.
    pub fn detach<C>(&self, controller: &Arc<C>) -> usize {
        let entry = self.lock().remove(&key(controller));
        match entry {
            Some(entry) => {
                let removed = entry.unwire();
                tracing::debug!(
                    controller = std::any::type_name::<C>(),
                    removed,
                    "throttled listeners detached"
                );
                removed
            }
            None => 0,
        }
    }

    pub fn is_attached<C>(&self, controller: &Arc<C>) -> bool {
        self.lock().contains_key(&key(controller))
    }

    /// Events wired for `controller`, sorted by name.
    pub fn events<C>(&self, controller: &Arc<C>) -> Vec<String> {
        let mut events: Vec<String> = self
            .lock()
            .get(&key(controller))
            .map(|entry| entry.wired.iter().map(|w| w.event.clone()).collect())
            .unwrap_or_default();
        events.sort();
        events
    }
}

/// Unwire entries whose controller has been dropped without detaching.
fn prune(entries: &mut HashMap<usize, Entry>) {
    let dead: Vec<usize> = entries
        .iter()
        .filter(|(_, entry)| entry.owner.strong_count() == 0)
        .map(|(key, _)| *key)
        .collect();
    for key in dead {
        if let Some(entry) = entries.remove(&key) {
            let removed = entry.unwire();
            tracing::debug!(removed, "pruned dropped controller");
        }
    }
}
