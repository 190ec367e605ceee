//! # shot-throttle
//!
//! `shot-throttle` bounds how often a handler runs when it is triggered by a
//! stream of discrete events (scrolls, clicks, resizes).
//!
//! ## Key Concepts
//!
//! * **Windows**: After the handler runs, further calls within `delay` fall into
//!   the same window and never run the handler synchronously.
//! * **Leading edge**: A call that opens a new window runs the handler at once.
//! * **Trailing edge**: Calls inside an open window are coalesced into a single
//!   deferred run at the end of the window, using the latest arguments.
//! * **Timers**: Deferred runs are fire-and-forget tokio tasks. The caller never
//!   waits for a throttled invocation.
//!
//! ## Example
//!
//! ```rust
//! use shot_throttle::Throttle;
//! use shot_throttle::ThrottleConfig;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let throttled = Throttle::new(
//!     |offset: u32| println!("scrolled to {offset}"),
//!     ThrottleConfig::from_millis(100).with_leading(false),
//! );
//!
//! throttled.call(10);
//! throttled.call(20);
//! assert!(throttled.is_pending());
//! # }
//! ```

mod config;
mod throttle;

pub use config::ThrottleConfig;
pub use throttle::Throttle;
pub use throttle::throttle;
pub use throttle::throttle_for;
