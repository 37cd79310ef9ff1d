//! Service locator for constructor injection.
//!
//! Services are concrete instances registered once at startup and looked up
//! by type. A controller declares its constructor dependencies as
//! [`ServiceDep`] descriptors; the dispatch loop verifies each one exists
//! before the constructor runs, so a missing service fails with the type's
//! name instead of a downcast surprise inside user code.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;

/// A constructor-dependency descriptor: type identity plus a printable name.
#[derive(Clone, Copy, Debug)]
pub struct ServiceDep {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl ServiceDep {
    pub fn of<S: Any>() -> Self {
        Self { id: TypeId::of::<S>(), name: type_name::<S>() }
    }
}

/// The process-wide service registry. Populated at startup, read-only once
/// requests flow.
#[derive(Default)]
pub struct Services {
    inner: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service`, replacing any previous instance of the same type.
    pub fn register<S: Any + Send + Sync>(&mut self, service: S) {
        self.inner.insert(TypeId::of::<S>(), Arc::new(service));
    }

    /// Looks up a service by type. Shared ownership — every controller
    /// instance holding the service clones the same `Arc`.
    pub fn get<S: Any + Send + Sync>(&self) -> Result<Arc<S>, Error> {
        self.inner
            .get(&TypeId::of::<S>())
            .cloned()
            .and_then(|any| any.downcast::<S>().ok())
            .ok_or(Error::ServiceNotFound { name: type_name::<S>() })
    }

    pub(crate) fn contains(&self, dep: &ServiceDep) -> bool {
        self.inner.contains_key(&dep.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter(&'static str);

    #[test]
    fn registered_service_resolves_by_type() {
        let mut services = Services::new();
        services.register(Greeter("hello"));
        assert_eq!(services.get::<Greeter>().unwrap().0, "hello");
    }

    #[test]
    fn missing_service_errors_with_the_type_name() {
        let services = Services::new();
        let err = services.get::<Greeter>().unwrap_err();
        let Error::ServiceNotFound { name } = err else { panic!("wrong variant") };
        assert!(name.contains("Greeter"));
    }

    #[test]
    fn dep_descriptor_tracks_registration() {
        let mut services = Services::new();
        let dep = ServiceDep::of::<Greeter>();
        assert!(!services.contains(&dep));
        services.register(Greeter("hi"));
        assert!(services.contains(&dep));
    }
}
