/// Descriptors modules publish about their object type.
///
/// A descriptor names the type and lists its constructors and methods with
/// their argument declarations.
pub mod descriptor;
/// The registry of provided and imported modules.
pub mod registry;

use crate::interpreter::{plugin::descriptor::ModuleDescriptor, value::core::Value};

/// The opaque id a module uses for one of its objects.
pub type ObjectHandle = u64;

/// What a method invocation hands back to the interpreter.
#[derive(Debug)]
pub enum Returned {
    /// A freshly owned value.
    Value(Value),
    /// A new object of the module's own type, owned by the caller from now on.
    Object(ObjectHandle),
    /// The method has no result.
    Nothing,
}

/// The call contract of a native module.
///
/// A module provides exactly one object type. The interpreter never looks
/// inside an object; it holds the handle, invokes methods by declared id, and
/// calls `destroy_object` once the last script reference is gone.
///
/// Failures are reported as messages and surface in scripts as the
/// `plugin_error` exception.
pub trait ObjectModule {
    /// The module's descriptor. Must stay the same for the module's lifetime.
    fn descriptor(&self) -> &ModuleDescriptor;

    /// Creates an object with the constructor `ctor`.
    fn create_object(&self, ctor: u32, args: &[Value]) -> Result<ObjectHandle, String>;

    /// Invokes `method` on `object`.
    fn execute_method(&self,
                      object: ObjectHandle,
                      method: u32,
                      args: &[Value])
                      -> Result<Returned, String>;

    /// Releases `object`.
    fn destroy_object(&self, object: ObjectHandle);
}
