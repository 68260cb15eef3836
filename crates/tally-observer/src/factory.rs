//! [`ObserverFactory`]: observer kind name to constructor.

use indexmap::IndexMap;
use tally_core::RegistryError;

use crate::builtin::{DoseScoring, RangeRejection};
use crate::config::ObserverDecl;
use crate::handler::EventHandler;
use crate::registry::Registry;

/// Builds a boxed handler from its declaration.
pub type Constructor = fn(&ObserverDecl) -> Result<Box<dyn EventHandler>, RegistryError>;

/// Table of known observer kinds, resolved at configuration load.
#[derive(Clone, Debug, Default)]
pub struct ObserverFactory {
    kinds: IndexMap<String, Constructor>,
}

impl ObserverFactory {
    /// A factory that knows no kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory that knows the built-in kinds.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register_kind(DoseScoring::KIND, DoseScoring::build);
        factory.register_kind(RangeRejection::KIND, RangeRejection::build);
        factory
    }

    /// Add or replace the constructor for `kind`, returning the one it
    /// replaced.
    pub fn register_kind(
        &mut self,
        kind: impl Into<String>,
        constructor: Constructor,
    ) -> Option<Constructor> {
        self.kinds.insert(kind.into(), constructor)
    }

    /// Whether `kind` has a constructor.
    pub fn knows(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Known kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.kinds.keys().map(String::as_str)
    }

    /// Construct the handler `decl` describes.
    pub fn build(&self, decl: &ObserverDecl) -> Result<Box<dyn EventHandler>, RegistryError> {
        let Some(constructor) = self.kinds.get(decl.kind.as_str()) else {
            return Err(RegistryError::UnknownKind {
                kind: decl.kind.clone(),
            });
        };
        constructor(decl)
    }

    /// Construct and register every declaration, in order.
    ///
    /// Returns the registry indices. Stops at the first failure; handlers
    /// registered before it stay registered.
    pub fn build_into(
        &self,
        decls: &[ObserverDecl],
        registry: &mut Registry,
    ) -> Result<Vec<usize>, RegistryError> {
        let mut indices = Vec::with_capacity(decls.len());
        for decl in decls {
            let handler = self.build(decl)?;
            indices.push(registry.register(handler)?);
        }
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{EventAction, EventContext, EventKind};

    struct Silent(String);

    impl EventHandler for Silent {
        fn name(&self) -> &str {
            &self.0
        }
        fn needs_call(&self, _kind: EventKind) -> bool {
            false
        }
        fn process_event(&mut self, _kind: EventKind, _ctx: &EventContext) -> EventAction {
            EventAction::Continue
        }
    }

    fn silent(decl: &ObserverDecl) -> Result<Box<dyn EventHandler>, RegistryError> {
        Ok(Box::new(Silent(decl.name.clone())))
    }

    #[test]
    fn builtins_are_known() {
        let f = ObserverFactory::with_builtins();
        assert_eq!(
            f.kinds().collect::<Vec<_>>(),
            vec!["dose_scoring", "range_rejection"]
        );
    }

    #[test]
    fn unknown_kind_rejected() {
        let f = ObserverFactory::with_builtins();
        let err = f
            .build(&ObserverDecl::new("x", "phsp_writer"))
            .err()
            .unwrap();
        assert_eq!(
            err,
            RegistryError::UnknownKind {
                kind: "phsp_writer".into()
            }
        );
    }

    #[test]
    fn custom_kind_builds_in_declaration_order() {
        let mut f = ObserverFactory::with_builtins();
        assert!(f.register_kind("silent", silent).is_none());
        let decls = vec![
            ObserverDecl::new("quiet", "silent"),
            ObserverDecl::new("dose", DoseScoring::KIND).with("region_count", 4i64),
        ];
        let mut reg = Registry::new();
        let indices = f.build_into(&decls, &mut reg).unwrap();
        assert_eq!(indices, vec![0, 1]);
        let dose = reg.lookup("dose").unwrap();
        assert!(dose.downcast_ref::<DoseScoring>().is_some());
        let quiet = reg.lookup("quiet").unwrap();
        assert!(quiet.downcast_ref::<Silent>().is_some());
    }

    #[test]
    fn duplicate_declaration_fails_at_registration() {
        let f = ObserverFactory::with_builtins();
        let decl = ObserverDecl::new("dose", DoseScoring::KIND).with("region_count", 1i64);
        let mut reg = Registry::new();
        let err = f.build_into(&[decl.clone(), decl], &mut reg).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
        assert_eq!(reg.count(), 1);
    }
}
