use std::{collections::HashMap, rc::Rc};

use crate::interpreter::plugin::{ObjectModule, descriptor::ABI_VERSION};

/// A module that has been imported, together with the type id it was given.
#[derive(Clone)]
pub struct Loaded {
    /// The imported type id (the `minor` of the object type).
    pub type_id: u64,
    /// The type name, lower case.
    pub name:    String,
    /// The module itself.
    pub module:  Rc<dyn ObjectModule>,
}

/// Keeps the modules a host makes available and the ones scripts imported.
///
/// Lifecycle: empty at construction, `provide` offers modules, `import`
/// appends them to the loaded list (never removes), and `teardown` drops
/// everything once. Objects still alive keep their own module reference, so
/// their destroy callback runs even after teardown.
#[derive(Default)]
pub struct PluginRegistry {
    available: HashMap<String, Rc<dyn ObjectModule>>,
    loaded:    Vec<Loaded>,
    torn_down: bool,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a module importable under `name` (case-insensitive).
    pub fn provide(&mut self, name: &str, module: Rc<dyn ObjectModule>) {
        tracing::debug!(module = name, "module provided");
        self.available.insert(name.to_lowercase(), module);
    }

    /// Imports the module provided under `name`. Importing twice returns the
    /// first import's type id.
    ///
    /// # Errors
    /// Returns a message if the module is unknown, the registry was torn down,
    /// or the descriptor version does not match.
    pub fn import(&mut self, name: &str) -> Result<u64, String> {
        if self.torn_down {
            return Err("the module registry has been torn down".to_string());
        }

        let module = self.available
                         .get(&name.to_lowercase())
                         .cloned()
                         .ok_or_else(|| format!("no module named '{name}'"))?;

        let descriptor = module.descriptor();
        if descriptor.version != ABI_VERSION {
            return Err(format!("module '{name}' has version {}, expected {ABI_VERSION}",
                               descriptor.version));
        }

        let type_name = descriptor.type_name.to_lowercase();
        if let Some(existing) = self.loaded.iter().find(|l| l.name == type_name) {
            return Ok(existing.type_id);
        }

        let type_id = self.loaded.len() as u64 + 1;
        tracing::debug!(module = name, type_name = %type_name, type_id, "module imported");
        self.loaded.push(Loaded { type_id,
                                  name: type_name,
                                  module });
        Ok(type_id)
    }

    /// Finds an imported type by its name.
    #[must_use]
    pub fn by_name(&self, type_name: &str) -> Option<&Loaded> {
        self.loaded.iter().find(|l| l.name == type_name)
    }

    /// Finds an imported type by its id.
    #[must_use]
    pub fn by_id(&self, type_id: u64) -> Option<&Loaded> {
        self.loaded.iter().find(|l| l.type_id == type_id)
    }

    /// Drops every provided and imported module. Only the first call has an
    /// effect.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        tracing::debug!(loaded = self.loaded.len(), "tearing down module registry");
        self.loaded.clear();
        self.available.clear();
        self.torn_down = true;
    }

    /// `true` once [`PluginRegistry::teardown`] has run.
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{
        plugin::{
            ObjectHandle, Returned,
            descriptor::{ArgDecl, MethodDecl, ModuleDescriptor},
        },
        value::core::Value,
    };

    struct Dummy(ModuleDescriptor);

    impl ObjectModule for Dummy {
        fn descriptor(&self) -> &ModuleDescriptor {
            &self.0
        }

        fn create_object(&self, _ctor: u32, _args: &[Value]) -> Result<ObjectHandle, String> {
            Ok(1)
        }

        fn execute_method(&self,
                          _object: ObjectHandle,
                          _method: u32,
                          _args: &[Value])
                          -> Result<Returned, String> {
            Ok(Returned::Nothing)
        }

        fn destroy_object(&self, _object: ObjectHandle) {}
    }

    fn dummy(version: u32) -> Rc<dyn ObjectModule> {
        Rc::new(Dummy(ModuleDescriptor { version,
                                         type_name: "Dummy",
                                         ctors: vec![MethodDecl { id:   0,
                                                                  name: "dummy",
                                                                  args: vec![],
                                                                  ret:  None, }],
                                         methods: vec![MethodDecl { id:   0,
                                                                    name: "ping",
                                                                    args: vec![],
                                                                    ret:  Some(ArgDecl::scalar("I")), }] }))
    }

    #[test]
    fn import_is_idempotent() {
        let mut registry = PluginRegistry::new();
        registry.provide("DUMMY", dummy(ABI_VERSION));

        let first = registry.import("dummy").unwrap();
        let second = registry.import("Dummy").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.by_name("dummy").map(|l| l.type_id), Some(first));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut registry = PluginRegistry::new();
        registry.provide("dummy", dummy(ABI_VERSION + 1));
        assert!(registry.import("dummy").is_err());
    }

    #[test]
    fn teardown_happens_once() {
        let mut registry = PluginRegistry::new();
        registry.provide("dummy", dummy(ABI_VERSION));
        registry.import("dummy").unwrap();

        registry.teardown();
        registry.teardown();
        assert!(registry.is_torn_down());
        assert!(registry.by_id(1).is_none());
        assert!(registry.import("dummy").is_err());
    }
}
