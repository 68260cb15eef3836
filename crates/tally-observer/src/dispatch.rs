//! [`Dispatcher`]: the single call site between the transport loop and
//! the registered handlers.
//!
//! The dispatcher precomputes, for every event kind, the ordered list of
//! handler indices whose `needs_call` accepted it. Per-event routing is
//! then a slice walk with no predicate calls.

use smallvec::SmallVec;
use tally_core::{EventAction, EventContext, EventKind, HistoryId};

use crate::registry::Registry;

/// Handler indices interested in one event kind, in registration order.
type Route = SmallVec<[usize; 4]>;

/// Routes events from the transport loop to interested handlers.
///
/// A dispatcher is bound to the [`Registry`] it last synced against.
/// Handlers registered after the last call are picked up on the next
/// [`sync`](Dispatcher::sync), which every dispatching method performs
/// first. Passing a different registry rebuilds the table.
#[derive(Debug)]
pub struct Dispatcher {
    /// `routes[kind.index()]` lists interested handler indices.
    routes: Vec<Route>,
    /// Number of registry entries already folded into `routes`.
    synced: usize,
    /// [`Registry::id`] the routes were built from.
    bound: Option<u64>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// A dispatcher with an empty routing table.
    pub fn new() -> Self {
        Self {
            routes: vec![Route::new(); EventKind::COUNT],
            synced: 0,
            bound: None,
        }
    }

    /// Extend the routing table with handlers registered since the last
    /// sync.
    ///
    /// Each new handler's `needs_call` is queried once per event kind.
    /// A registry other than the bound one triggers a full rebuild.
    pub fn sync(&mut self, registry: &Registry) {
        if self.bound != Some(registry.id()) {
            for route in &mut self.routes {
                route.clear();
            }
            self.synced = 0;
            self.bound = Some(registry.id());
        }
        let count = registry.count();
        if count == self.synced {
            return;
        }
        for index in self.synced..count {
            let Some(handler) = registry.get(index) else {
                continue;
            };
            let mut kinds = 0usize;
            for kind in EventKind::ALL {
                if handler.needs_call(kind) {
                    self.routes[kind.index()].push(index);
                    kinds += 1;
                }
            }
            tracing::debug!(
                index,
                name = handler.name(),
                kinds,
                "extended dispatch routes"
            );
        }
        self.synced = count;
    }

    /// Notify every interested handler of `kind`, in registration order.
    ///
    /// Returns [`EventAction::Discard`] if any handler asked for it.
    /// Every interested handler sees the event regardless.
    pub fn dispatch(
        &mut self,
        registry: &mut Registry,
        kind: EventKind,
        ctx: &EventContext,
    ) -> EventAction {
        self.sync(registry);
        let mut action = EventAction::Continue;
        for &index in &self.routes[kind.index()] {
            if let Some(handler) = registry.get_mut(index) {
                action = action.merge(handler.process_event(kind, ctx));
            }
        }
        action
    }

    /// [`dispatch`](Self::dispatch) with the context's region replaced
    /// by `region`.
    pub fn dispatch_in_region(
        &mut self,
        registry: &mut Registry,
        kind: EventKind,
        ctx: &EventContext,
        region: i32,
    ) -> EventAction {
        let ctx = ctx.with_region(region);
        self.dispatch(registry, kind, &ctx)
    }

    /// Tell every handler that history `case` is starting.
    ///
    /// Must precede every dispatch belonging to that history.
    pub fn notify_new_history(&mut self, registry: &mut Registry, case: HistoryId) {
        self.sync(registry);
        for handler in registry.iter_mut() {
            handler.set_current_history(case);
        }
    }

    /// Handler indices routed for `kind`, as of the last sync.
    pub fn interested(&self, kind: EventKind) -> &[usize] {
        &self.routes[kind.index()]
    }

    /// Whether any handler is routed for `kind`, as of the last sync.
    ///
    /// Lets the transport loop skip building a context nobody reads.
    pub fn any_interest(&self, kind: EventKind) -> bool {
        !self.routes[kind.index()].is_empty()
    }
}
