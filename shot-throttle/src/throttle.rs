use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio::time::sleep_until;

use crate::ThrottleConfig;

#[derive(Clone, Debug)]
struct ThrottleMetrics {
    invocations: Counter<u64>,
    suppressed: Counter<u64>,
}

impl ThrottleMetrics {
    fn new() -> Self {
        let meter = global::meter("shot_throttle");
        Self {
            invocations: meter.u64_counter("throttle_invocations").build(),
            suppressed: meter.u64_counter("throttle_suppressed").build(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Edge {
    Leading,
    Trailing,
}

impl Edge {
    fn as_str(self) -> &'static str {
        match self {
            Edge::Leading => "leading",
            Edge::Trailing => "trailing",
        }
    }
}

struct Pending {
    generation: u64,
    abort: AbortHandle,
}

struct State<A> {
    /// Start of the current window; `None` until the first window opens.
    last_invocation: Option<Instant>,
    pending: Option<Pending>,
    generation: u64,
    latest: Option<A>,
}

impl<A> State<A> {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort.abort();
        }
    }
}

struct Shared<A> {
    handler: Box<dyn Fn(A) + Send + Sync>,
    config: ThrottleConfig,
    state: Mutex<State<A>>,
    instruments: ThrottleMetrics,
}

impl<A> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, State<A>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invoke(&self, args: A, edge: Edge) {
        tracing::trace!(edge = edge.as_str(), "invoking throttled handler");
        self.instruments
            .invocations
            .add(1, &[KeyValue::new("edge", edge.as_str())]);
        (self.handler)(args);
    }

    fn suppress(&self) {
        self.instruments.suppressed.add(1, &[]);
    }
}

impl<A: Clone> Shared<A> {
    fn fire_trailing(&self, generation: u64) {
        let mut state = self.lock();
        if !state
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation)
        {
            // Cancelled or superseded after the timer woke.
            return;
        }
        state.pending = None;
        state.last_invocation = self.config.leading.then(Instant::now);
        let Some(args) = state.latest.clone() else {
            return;
        };
        drop(state);
        self.invoke(args, Edge::Trailing);
    }
}

impl<A> Drop for Shared<A> {
    fn drop(&mut self) {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel_pending();
    }
}

/// A handler wrapped so that it runs at most once per window.
///
/// Every call records its arguments. A call that opens a new window invokes the
/// handler immediately (the leading edge); calls landing inside an open window
/// are coalesced into a single deferred invocation at the end of the window
/// (the trailing edge) which receives the most recently recorded arguments.
///
/// Clones share the same window state. Deferred invocations are spawned on the
/// current tokio runtime and are cancelled when the last clone is dropped.
pub struct Throttle<A> {
    shared: Arc<Shared<A>>,
}

impl<A> Clone for Throttle<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A> fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("config", &self.shared.config)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl<A> Throttle<A> {
    pub fn config(&self) -> ThrottleConfig {
        self.shared.config
    }

    /// True while a trailing invocation is scheduled.
    pub fn is_pending(&self) -> bool {
        self.shared.lock().pending.is_some()
    }

    /// Drop any scheduled trailing invocation. The current window is kept.
    pub fn cancel(&self) {
        self.shared.lock().cancel_pending();
    }

    /// True when both handles wrap the same handler and window state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<A> Throttle<A>
where
    A: Clone + Send + 'static,
{
    pub fn new<F>(handler: F, config: ThrottleConfig) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                handler: Box::new(handler),
                config,
                state: Mutex::new(State {
                    last_invocation: None,
                    pending: None,
                    generation: 0,
                    latest: None,
                }),
                instruments: ThrottleMetrics::new(),
            }),
        }
    }

    /// Offer a call to the wrapped handler.
    ///
    /// Never blocks: the handler either runs synchronously on this call, is
    /// scheduled to run later, or the call is absorbed into an already
    /// scheduled invocation.
    ///
    /// # Runtime
    ///
    /// Trailing invocations are spawned on the current tokio runtime. Called
    /// outside a runtime, leading invocations still run but a trailing one is
    /// dropped with a warning instead of panicking.
    pub fn call(&self, args: A) {
        let now = Instant::now();
        let ThrottleConfig {
            delay,
            leading,
            trailing,
        } = self.shared.config;

        let mut state = self.shared.lock();
        state.latest = Some(args.clone());

        if !self.shared.config.fires() {
            drop(state);
            self.shared.suppress();
            return;
        }

        let Some(last) = state.last_invocation else {
            if leading {
                state.cancel_pending();
                state.last_invocation = Some(now);
                drop(state);
                self.shared.invoke(args, Edge::Leading);
            } else {
                tracing::trace!("first call without leading edge suppressed");
                state.last_invocation = Some(now);
                drop(state);
                self.shared.suppress();
            }
            return;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed >= delay {
            state.cancel_pending();
            state.last_invocation = Some(now);
            drop(state);
            self.shared.invoke(args, Edge::Leading);
            return;
        }

        if state.pending.is_none() && trailing {
            self.schedule(&mut state, now + (delay - elapsed));
        }
        drop(state);
        self.shared.suppress();
    }

    fn schedule(&self, state: &mut State<A>, deadline: Instant) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no tokio runtime available; trailing call dropped");
            return;
        };

        state.generation += 1;
        let generation = state.generation;
        let weak = Arc::downgrade(&self.shared);
        let task = runtime.spawn(async move {
            sleep_until(deadline).await;
            if let Some(shared) = weak.upgrade() {
                shared.fire_trailing(generation);
            }
        });
        tracing::trace!(
            wait = ?deadline.saturating_duration_since(Instant::now()),
            "trailing call scheduled"
        );
        state.pending = Some(Pending {
            generation,
            abort: task.abort_handle(),
        });
    }
}

/// Wrap `handler` in a [`Throttle`] using `config`.
pub fn throttle<A, F>(handler: F, config: ThrottleConfig) -> Throttle<A>
where
    A: Clone + Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Throttle::new(handler, config)
}

/// Convenience for the common case of a delay with both edges enabled.
pub fn throttle_for<A, F>(handler: F, delay: Duration) -> Throttle<A>
where
    A: Clone + Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Throttle::new(handler, ThrottleConfig::new(delay))
}
