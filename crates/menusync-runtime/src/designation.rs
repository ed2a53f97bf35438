//! Designation payloads and their reconstruction factories.
//!
//! A designation is the value a menu action operates with (which designator
//! to apply). It never crosses the wire as data: the envelope carries only
//! its kind tag, and the receiving side builds a fresh instance from the
//! factory registered under that tag.

use std::any::Any;
use std::collections::HashMap;

use menusync_protocol::DesignationKind;

/// One designation payload. `as_any` lets host handlers downcast to their
/// concrete type.
pub trait Designation {
    fn kind(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

type Factory = Box<dyn Fn() -> Box<dyn Designation>>;

/// Kind tag → fresh-instance factory.
#[derive(Default)]
pub struct DesignationKinds {
    factories: HashMap<DesignationKind, Factory>,
}

impl DesignationKinds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a kind tag. Registration order must match on
    /// every participant only in content, not sequence; lookup is by tag.
    pub fn register<F>(&mut self, kind: impl Into<DesignationKind>, factory: F)
    where
        F: Fn() -> Box<dyn Designation> + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn contains(&self, kind: &DesignationKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Fresh instance of the given kind, or `None` when the tag was never
    /// registered here.
    pub fn create(&self, kind: &DesignationKind) -> Option<Box<dyn Designation>> {
        self.factories.get(kind).map(|factory| factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CellDesignation;

    impl Designation for CellDesignation {
        fn kind(&self) -> &str {
            "cell"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn create_builds_fresh_instances() {
        use std::cell::Cell;
        use std::rc::Rc;

        let built = Rc::new(Cell::new(0_u32));
        let counter = built.clone();

        let mut kinds = DesignationKinds::new();
        kinds.register("cell", move || {
            counter.set(counter.get() + 1);
            Box::new(CellDesignation)
        });

        let one = kinds.create(&DesignationKind::from("cell")).unwrap();
        let two = kinds.create(&DesignationKind::from("cell")).unwrap();
        assert_eq!(one.kind(), "cell");
        assert_eq!(two.kind(), "cell");
        // The factory ran once per decode, not once total.
        assert_eq!(built.get(), 2);
    }

    #[test]
    fn unknown_kind_yields_none() {
        let kinds = DesignationKinds::new();
        assert!(kinds.create(&DesignationKind::from("area")).is_none());
    }
}
