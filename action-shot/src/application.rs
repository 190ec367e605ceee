use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use shot_throttle::Throttle;

use crate::ActionDescriptorParser;
use crate::ConfigurationError;
use crate::Context;
use crate::Controller;
use crate::Element;
use crate::Event;
use crate::HostActionParser;
use crate::Listener;
use crate::ThrottleModifierParser;
use crate::ThrottleRegistry;
use crate::controller::bind;

/// Attribute listing the controller identifiers of an element.
pub const CONTROLLER_ATTRIBUTE: &str = "data-controller";
/// Attribute listing the action descriptors of an element.
pub const ACTION_ATTRIBUTE: &str = "data-action";

struct BoundAction {
    event: String,
    listener: Listener,
    throttle: Option<Throttle<Event>>,
}

trait Connection: Send + Sync {
    fn disconnect(&self, registry: &ThrottleRegistry);
    fn controller(&self) -> Arc<dyn Any + Send + Sync>;
}

struct ControllerConnection<C> {
    controller: Arc<C>,
    actions: Vec<BoundAction>,
}

impl<C: Controller> Connection for ControllerConnection<C> {
    fn disconnect(&self, registry: &ThrottleRegistry) {
        registry.detach(&self.controller);
        self.controller.disconnect();
        let element = self.controller.element();
        for action in &self.actions {
            element.remove_event_listener(&action.event, &action.listener);
            if let Some(throttle) = &action.throttle {
                throttle.cancel();
            }
        }
    }

    fn controller(&self) -> Arc<dyn Any + Send + Sync> {
        self.controller.clone()
    }
}

trait Definition: Send + Sync {
    fn connect(
        &self,
        identifier: &str,
        element: &Element,
        parser: &dyn ActionDescriptorParser,
        registry: &ThrottleRegistry,
    ) -> Result<Box<dyn Connection>, ConfigurationError>;
}

struct ControllerDefinition<C> {
    auto_throttle: bool,
    _phantom: PhantomData<fn() -> C>,
}

impl<C> ControllerDefinition<C> {
    fn new(auto_throttle: bool) -> Self {
        Self {
            auto_throttle,
            _phantom: PhantomData,
        }
    }
}

impl<C: Controller> ControllerDefinition<C> {
    fn bind_actions(
        controller: &Arc<C>,
        identifier: &str,
        element: &Element,
        parser: &dyn ActionDescriptorParser,
    ) -> Vec<BoundAction> {
        let Some(attribute) = element.attribute(ACTION_ATTRIBUTE) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        for action in parser.parse_all(&attribute) {
            if action.identifier != identifier {
                continue;
            }
            let Some(method) = C::method(&action.method_name) else {
                tracing::warn!(
                    identifier,
                    method = %action.method_name,
                    "action references undefined method"
                );
                continue;
            };

            let handler = bind(controller, method);
            let (listener, throttle) = match action.options.throttle {
                Some(config) => {
                    let throttle = Throttle::new(move |event: Event| handler(&event), config);
                    let handle = throttle.clone();
                    let listener: Listener = Arc::new(move |event: &Event| handle.call(event.clone()));
                    (listener, Some(throttle))
                }
                None => {
                    let listener: Listener = Arc::new(handler);
                    (listener, None)
                }
            };

            element.add_event_listener(&action.event_name, Arc::clone(&listener), action.listener);
            actions.push(BoundAction {
                event: action.event_name,
                listener,
                throttle,
            });
        }
        actions
    }
}

impl<C: Controller> Definition for ControllerDefinition<C> {
    fn connect(
        &self,
        identifier: &str,
        element: &Element,
        parser: &dyn ActionDescriptorParser,
        registry: &ThrottleRegistry,
    ) -> Result<Box<dyn Connection>, ConfigurationError> {
        let controller = Arc::new(C::new(element.clone()));
        let actions = Self::bind_actions(&controller, identifier, element, parser);
        let connection = ControllerConnection {
            controller: Arc::clone(&controller),
            actions,
        };

        let cx = Context::new(identifier, &controller, registry);
        let connected = controller.connect(&cx).and_then(|_| {
            if self.auto_throttle {
                cx.use_throttle()
            } else {
                Ok(())
            }
        });

        match connected {
            Ok(()) => {
                tracing::debug!(identifier, "controller connected");
                Ok(Box::new(connection))
            }
            Err(err) => {
                connection.disconnect(registry);
                Err(err)
            }
        }
    }
}

struct Binding {
    element: Element,
    identifier: String,
    connection: Box<dyn Connection>,
}

/// A minimal controller host.
///
/// Elements are mounted into the application; each identifier listed in an
/// element's `data-controller` attribute that has a registered controller gets
/// its own controller instance, connected when both the element is mounted and
/// the identifier is registered, and disconnected when the element is
/// unmounted or the application stops.
pub struct Application {
    definitions: RwLock<HashMap<String, Arc<dyn Definition>>>,
    elements: Mutex<Vec<Element>>,
    bindings: Mutex<Vec<Binding>>,
    parser: RwLock<Arc<dyn ActionDescriptorParser>>,
    registry: ThrottleRegistry,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("elements", &lock(&self.elements).len())
            .field("connected", &lock(&self.bindings).len())
            .field("registry", &self.registry)
            .finish()
    }
}

impl Default for Application {
    fn default() -> Self {
        Self {
            definitions: RwLock::default(),
            elements: Mutex::default(),
            bindings: Mutex::default(),
            parser: RwLock::new(Arc::new(HostActionParser)),
            registry: ThrottleRegistry::new(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn identifiers(element: &Element) -> Vec<String> {
    element
        .attribute(CONTROLLER_ATTRIBUTE)
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ThrottleRegistry {
        &self.registry
    }

    pub fn action_parser(&self) -> Arc<dyn ActionDescriptorParser> {
        Arc::clone(&self.parser.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the parser used for elements connected from now on.
    pub fn set_action_parser(&self, parser: Arc<dyn ActionDescriptorParser>) {
        *self.parser.write().unwrap_or_else(PoisonError::into_inner) = parser;
    }

    /// Register `C` under `identifier` and connect any mounted elements that
    /// name it.
    ///
    /// A controller that fails to connect does not stop the remaining
    /// elements from connecting; the first error is returned once all have
    /// been tried.
    pub fn register<C: Controller>(&self, identifier: &str) -> Result<(), ConfigurationError> {
        self.register_definition(identifier, Arc::new(ControllerDefinition::<C>::new(false)))
    }

    fn register_definition(
        &self,
        identifier: &str,
        definition: Arc<dyn Definition>,
    ) -> Result<(), ConfigurationError> {
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.to_string(), definition);

        let elements = lock(&self.elements).clone();
        let mut first_error = None;
        let named = elements
            .iter()
            .filter(|element| identifiers(element).iter().any(|id| id == identifier));
        for element in named {
            if let Err(err) = self.connect(identifier, element) {
                tracing::warn!(identifier, %err, "controller failed to connect");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Mount `element` and connect a controller for each registered
    /// identifier it names.
    ///
    /// Every identifier is tried; the first connect error is returned.
    pub fn mount(&self, element: &Element) -> Result<(), ConfigurationError> {
        {
            let mut elements = lock(&self.elements);
            if !elements.iter().any(|e| e.ptr_eq(element)) {
                elements.push(element.clone());
            }
        }
        let mut first_error = None;
        for identifier in identifiers(element) {
            if let Err(err) = self.connect(&identifier, element) {
                tracing::warn!(identifier = %identifier, %err, "controller failed to connect");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Disconnect every controller of `element` and forget it.
    pub fn unmount(&self, element: &Element) {
        lock(&self.elements).retain(|e| !e.ptr_eq(element));
        self.disconnect_where(|binding| binding.element.ptr_eq(element));
    }

    /// Disconnect all controllers and unmount all elements.
    pub fn stop(&self) {
        lock(&self.elements).clear();
        self.disconnect_where(|_| true);
    }

    /// The connected controller for `identifier` on `element`.
    pub fn controller_for<C: Controller>(&self, element: &Element, identifier: &str) -> Option<Arc<C>> {
        let controller = lock(&self.bindings)
            .iter()
            .find(|b| b.identifier == identifier && b.element.ptr_eq(element))
            .map(|b| b.connection.controller())?;
        controller.downcast::<C>().ok()
    }

    fn connect(&self, identifier: &str, element: &Element) -> Result<(), ConfigurationError> {
        let connected = lock(&self.bindings)
            .iter()
            .any(|b| b.identifier == identifier && b.element.ptr_eq(element));
        if connected {
            return Ok(());
        }

        let Some(definition) = self
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .cloned()
        else {
            return Ok(());
        };

        let parser = self.action_parser();
        let connection = definition.connect(identifier, element, &*parser, &self.registry)?;
        lock(&self.bindings).push(Binding {
            element: element.clone(),
            identifier: identifier.to_string(),
            connection,
        });
        Ok(())
    }

    fn disconnect_where(&self, predicate: impl Fn(&Binding) -> bool) {
        let removed: Vec<Binding> = {
            let mut bindings = lock(&self.bindings);
            let (removed, kept) = bindings.drain(..).partition(|b| predicate(b));
            *bindings = kept;
            removed
        };
        for binding in removed {
            binding.connection.disconnect(&self.registry);
            tracing::debug!(identifier = %binding.identifier, "controller disconnected");
        }
    }
}

/// An [`Application`] whose registrations and action descriptors understand
/// throttling.
///
/// Created by [`extend_application_with_throttle`]. Dereferences to the
/// wrapped application for everything else.
#[derive(Debug)]
pub struct ThrottleApplication {
    application: Application,
    modifiers_registered: AtomicBool,
}

impl Deref for ThrottleApplication {
    type Target = Application;

    fn deref(&self) -> &Self::Target {
        &self.application
    }
}

impl ThrottleApplication {
    /// Register `C`; if it declares [`Controller::throttled_listeners`], they
    /// are wired after its own `connect` hook every time it connects.
    pub fn register<C: Controller>(&self, identifier: &str) -> Result<(), ConfigurationError> {
        let auto_throttle = C::throttled_listeners().is_some();
        if auto_throttle {
            tracing::debug!(identifier, "registering controller with throttled listeners");
        }
        self.application
            .register_definition(identifier, Arc::new(ControllerDefinition::<C>::new(auto_throttle)))
    }

    /// Teach the action parser the `:throttle:` modifier. Calling this more
    /// than once has no further effect.
    pub fn register_throttle_modifiers(&self) {
        if self.modifiers_registered.swap(true, Ordering::AcqRel) {
            return;
        }
        let host = self.application.action_parser();
        self.application
            .set_action_parser(Arc::new(ThrottleModifierParser::new(host)));
    }

    pub fn into_inner(self) -> Application {
        self.application
    }
}

/// Extend `application` with throttle-aware registration and action parsing.
pub fn extend_application_with_throttle(application: Application) -> ThrottleApplication {
    ThrottleApplication {
        application,
        modifiers_registered: AtomicBool::new(false),
    }
}
