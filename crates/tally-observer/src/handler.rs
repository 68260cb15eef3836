//! The [`EventHandler`] trait and `dyn EventHandler` downcast support.

use std::any::Any;
use std::io::{Read, Write};

use tally_checkpoint::CheckpointError;
use tally_core::{EventAction, EventContext, EventKind, HistoryId, ReportSink};

/// A unit of scoring or variance-reduction logic driven by transport
/// events.
///
/// # Contract
///
/// - `needs_call()` is a pure predicate, stable for the handler's
///   lifetime. The [`Dispatcher`](crate::Dispatcher) queries it once per
///   event kind at registration and caches the answer.
/// - `process_event()` is only invoked for kinds `needs_call()` accepted.
///   It must not panic on any context: a region that maps to no slot is
///   skipped, not an error.
/// - `set_current_history()` reaches the handler before any event of
///   that history.
///
/// Handlers without persistent state keep the default checkpoint
/// methods, which read and write nothing.
///
/// # Object safety
///
/// This trait is object-safe; the registry stores handlers as
/// `Box<dyn EventHandler>`.
///
/// # Examples
///
/// ```
/// use tally_core::{EventAction, EventContext, EventKind};
/// use tally_observer::EventHandler;
///
/// struct CountSteps(u64);
///
/// impl EventHandler for CountSteps {
///     fn name(&self) -> &str { "count_steps" }
///
///     fn needs_call(&self, kind: EventKind) -> bool {
///         kind == EventKind::BeforeTransport
///     }
///
///     fn process_event(&mut self, _kind: EventKind, _ctx: &EventContext) -> EventAction {
///         self.0 += 1;
///         EventAction::Continue
///     }
/// }
///
/// let mut h = CountSteps(0);
/// h.process_event(EventKind::BeforeTransport, &EventContext::default());
/// assert_eq!(h.0, 1);
/// ```
pub trait EventHandler: Any + Send + 'static {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// One-line description used in setup logs.
    fn description(&self) -> &str {
        ""
    }

    /// Whether this handler must be called for `kind`.
    fn needs_call(&self, kind: EventKind) -> bool;

    /// React to an event.
    fn process_event(&mut self, kind: EventKind, ctx: &EventContext) -> EventAction;

    /// A new history is starting.
    fn set_current_history(&mut self, _case: HistoryId) {}

    /// Write persistent state.
    fn store_state(&self, _w: &mut dyn Write) -> Result<(), CheckpointError> {
        Ok(())
    }

    /// Replace persistent state with a stored one.
    fn set_state(&mut self, _r: &mut dyn Read) -> Result<(), CheckpointError> {
        Ok(())
    }

    /// Fold a stored state from an independent job into this one.
    fn add_state(&mut self, _r: &mut dyn Read) -> Result<(), CheckpointError> {
        Ok(())
    }

    /// Return to the just-constructed state.
    fn reset_counter(&mut self) {}

    /// Report accumulated results.
    fn report_results(&self, _sink: &mut dyn ReportSink) {}
}

impl dyn EventHandler {
    /// Attempt to downcast a trait object to a concrete handler type.
    pub fn downcast_ref<T: EventHandler>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// Mutable variant of [`downcast_ref`](Self::downcast_ref).
    pub fn downcast_mut<T: EventHandler>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}
