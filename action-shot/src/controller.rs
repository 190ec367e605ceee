use std::sync::Arc;

use crate::ConfigurationError;
use crate::Element;
use crate::Event;
use crate::ListenerMap;
use crate::ThrottleRegistry;

/// An action method exposed by a controller.
pub type Method<C> = fn(&C, &Event);

/// An object bound to an element for as long as it is connected.
///
/// Hooks run in this order when an element connects: actions declared in the
/// element's `data-action` attribute are bound, then [`Controller::connect`]
/// runs, then (for applications extended with throttling) listeners declared
/// by [`Controller::throttled_listeners`] are wired. Disconnecting detaches
/// throttled listeners before [`Controller::disconnect`] runs.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Construct a controller for `element`.
    fn new(element: Element) -> Self;

    fn element(&self) -> &Element;

    /// Resolve an action method by name.
    fn method(name: &str) -> Option<Method<Self>>;

    /// Class-level throttled listener declarations.
    fn throttled_listeners() -> Option<ListenerMap> {
        None
    }

    fn connect(&self, _cx: &Context<'_, Self>) -> Result<(), ConfigurationError> {
        Ok(())
    }

    fn disconnect(&self) {}
}

/// Handle passed to [`Controller::connect`] for wiring throttled listeners by hand.
pub struct Context<'a, C> {
    identifier: &'a str,
    controller: &'a Arc<C>,
    registry: &'a ThrottleRegistry,
}

impl<'a, C: Controller> Context<'a, C> {
    pub fn new(identifier: &'a str, controller: &'a Arc<C>, registry: &'a ThrottleRegistry) -> Self {
        Self {
            identifier,
            controller,
            registry,
        }
    }

    pub fn identifier(&self) -> &str {
        self.identifier
    }

    pub fn controller(&self) -> &Arc<C> {
        self.controller
    }

    /// Wire the listeners declared by [`Controller::throttled_listeners`].
    pub fn use_throttle(&self) -> Result<(), ConfigurationError> {
        self.registry.use_throttle(self.controller)
    }

    /// Wire `listeners` for this controller.
    pub fn use_throttled_listeners(&self, listeners: &ListenerMap) -> Result<(), ConfigurationError> {
        self.registry.attach(self.controller, listeners)
    }
}

/// Look up `name` on `C`, reporting a missing method as a configuration error.
pub(crate) fn resolve_method<C: Controller>(name: &str) -> Result<Method<C>, ConfigurationError> {
    C::method(name).ok_or_else(|| ConfigurationError::MethodNotFound {
        method: name.to_string(),
        controller: std::any::type_name::<C>(),
    })
}

/// Bind `method` to `controller` without keeping the controller alive.
///
/// Calls made after the controller has been dropped do nothing.
pub(crate) fn bind<C: Controller>(
    controller: &Arc<C>,
    method: Method<C>,
) -> impl Fn(&Event) + Send + Sync + use<C> {
    let weak = Arc::downgrade(controller);
    move |event: &Event| {
        if let Some(controller) = weak.upgrade() {
            method(&controller, event);
        }
    }
}
