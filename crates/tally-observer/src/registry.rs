//! [`Registry`]: the named, ordered set of live event handlers.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tally_core::RegistryError;

use crate::handler::EventHandler;

/// Handlers keyed by name, in registration order.
///
/// Registration order is dispatch order. Handlers are never removed, so
/// an index returned by [`register`](Registry::register) stays valid for
/// the registry's lifetime.
pub struct Registry {
    handlers: IndexMap<String, Box<dyn EventHandler>>,
    id: u64,
}

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

impl Default for Registry {
    fn default() -> Self {
        Self {
            handlers: IndexMap::new(),
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-unique identity of this registry.
    ///
    /// Lets a [`Dispatcher`](crate::Dispatcher) tell its own registry
    /// apart from another of the same size.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Register `handler` under its own name, returning its index.
    ///
    /// Fails with [`RegistryError::DuplicateName`] if the name is taken;
    /// the registry is unchanged in that case.
    pub fn register(&mut self, handler: Box<dyn EventHandler>) -> Result<usize, RegistryError> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        let (index, _) = self.handlers.insert_full(name, handler);
        tracing::info!(
            index,
            name = self.handlers[index].name(),
            description = self.handlers[index].description(),
            "registered event handler"
        );
        Ok(index)
    }

    /// Handler registered as `name`.
    pub fn lookup(&self, name: &str) -> Option<&(dyn EventHandler + 'static)> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    /// Mutable handler registered as `name`.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut (dyn EventHandler + 'static)> {
        match self.handlers.get_mut(name) {
            Some(h) => Some(h.as_mut()),
            None => None,
        }
    }

    /// Handler at registration index `index`.
    pub fn get(&self, index: usize) -> Option<&(dyn EventHandler + 'static)> {
        self.handlers.get_index(index).map(|(_, h)| h.as_ref())
    }

    /// Mutable handler at registration index `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn EventHandler + 'static)> {
        match self.handlers.get_index_mut(index) {
            Some((_, h)) => Some(h.as_mut()),
            None => None,
        }
    }

    /// Index of the handler registered as `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.handlers.get_index_of(name)
    }

    /// Number of registered handlers.
    pub fn count(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn EventHandler + 'static)> + '_ {
        self.handlers.values().map(|h| h.as_ref())
    }

    /// Mutable handlers in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn EventHandler + 'static)> + '_ {
        self.handlers.values_mut().map(|h| h.as_mut())
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{EventAction, EventContext, EventKind};

    struct Named(&'static str);

    impl EventHandler for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn needs_call(&self, _kind: EventKind) -> bool {
            false
        }
        fn process_event(&mut self, _kind: EventKind, _ctx: &EventContext) -> EventAction {
            EventAction::Continue
        }
    }

    #[test]
    fn indices_follow_registration_order() {
        let mut reg = Registry::new();
        assert_eq!(reg.register(Box::new(Named("a"))).unwrap(), 0);
        assert_eq!(reg.register(Box::new(Named("b"))).unwrap(), 1);
        assert_eq!(reg.count(), 2);
        assert_eq!(reg.get(1).unwrap().name(), "b");
        assert_eq!(reg.index_of("a"), Some(0));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = Registry::new();
        reg.register(Box::new(Named("dose"))).unwrap();
        let err = reg.register(Box::new(Named("dose"))).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                name: "dose".into()
            }
        );
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn lookup_and_downcast() {
        let mut reg = Registry::new();
        reg.register(Box::new(Named("x"))).unwrap();
        assert!(reg.lookup("missing").is_none());
        assert!(reg.get(3).is_none());
        let h = reg.lookup("x").unwrap();
        assert_eq!(h.downcast_ref::<Named>().unwrap().0, "x");
        let h = reg.lookup_mut("x").unwrap();
        assert!(h.downcast_mut::<Named>().is_some());
    }
}
