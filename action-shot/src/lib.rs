//! # Action Shot
//!
//! `action-shot` adds throttled event listeners to a controller host, built on
//! the [`shot_throttle::Throttle`] primitive.
//!
//! Throttling can be requested three ways:
//!
//! 1. **In markup**: an action descriptor with a `:throttle:` suffix, e.g.
//!    `scroll->gallery#onScroll:throttle:200ms:notrailing`, once
//!    [`ThrottleApplication::register_throttle_modifiers`] has been called.
//! 2. **Per controller type**: [`Controller::throttled_listeners`], wired
//!    automatically by [`ThrottleApplication::register`] or by hand with
//!    [`Context::use_throttle`].
//! 3. **At the call site**: [`Context::use_throttled_listeners`] from a
//!    controller's own `connect` hook.
//!
//! Listeners wired through the [`ThrottleRegistry`] are removed, and their
//! pending trailing calls dropped, when the controller disconnects.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use action_shot::{Application, Controller, Element, Event, Method, extend_application_with_throttle};
//!
//! struct Gallery {
//!     element: Element,
//!     scrolls: AtomicUsize,
//! }
//!
//! impl Gallery {
//!     fn on_scroll(&self, _event: &Event) {
//!         self.scrolls.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! impl Controller for Gallery {
//!     fn new(element: Element) -> Self {
//!         Self { element, scrolls: AtomicUsize::new(0) }
//!     }
//!
//!     fn element(&self) -> &Element {
//!         &self.element
//!     }
//!
//!     fn method(name: &str) -> Option<Method<Self>> {
//!         match name {
//!             "onScroll" => Some(Gallery::on_scroll),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), action_shot::ConfigurationError> {
//! let application = extend_application_with_throttle(Application::new());
//! application.register_throttle_modifiers();
//! application.register::<Gallery>("gallery")?;
//!
//! let element = Element::new();
//! element.set_attribute("data-controller", "gallery");
//! element.set_attribute("data-action", "scroll->gallery#onScroll:throttle:200ms");
//! application.mount(&element)?;
//!
//! for _ in 0..10 {
//!     element.dispatch_event(&Event::new("scroll"));
//! }
//!
//! let gallery = application.controller_for::<Gallery>(&element, "gallery").unwrap();
//! assert_eq!(gallery.scrolls.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! ```

mod action;
mod application;
mod controller;
mod dom;
mod error;
mod listener;
mod modifier;
mod registry;


pub use action::ActionDescriptor;
pub use action::ActionDescriptorParser;
pub use action::ActionOptions;
pub use action::HostActionParser;
pub use action::ThrottleModifierParser;
pub use application::ACTION_ATTRIBUTE;
pub use application::Application;
pub use application::CONTROLLER_ATTRIBUTE;
pub use application::ThrottleApplication;
pub use application::extend_application_with_throttle;
pub use controller::Context;
pub use controller::Controller;
pub use controller::Method;
pub use dom::Element;
pub use dom::Event;
pub use dom::Listener;
pub use dom::ListenerOptions;
pub use error::ConfigurationError;
pub use listener::ListenerMap;
pub use listener::ListenerSpec;
pub use listener::PairOptions;
pub use modifier::parse_throttle_modifier;
pub use registry::ThrottleRegistry;

pub use shot_throttle::ThrottleConfig;
