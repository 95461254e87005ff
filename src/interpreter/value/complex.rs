use std::{fmt::Display, rc::Rc};

use crate::interpreter::plugin::{ObjectHandle, ObjectModule};

/// A native object owned by a plugin module.
///
/// Dropping the last reference calls the module's `destroy_object` with the
/// object's handle.
pub struct NativeObject {
    module:  Rc<dyn ObjectModule>,
    type_id: u64,
    handle:  ObjectHandle,
}

impl Drop for NativeObject {
    fn drop(&mut self) {
        tracing::trace!(type_id = self.type_id, handle = self.handle, "destroying native object");
        self.module.destroy_object(self.handle);
    }
}

/// A reference-counted handle to a [`NativeObject`].
///
/// Cloning increments the count; dropping decrements it. Moving a `Complex`
/// out of a value (see `Value::take`) leaves a typed null behind and does not
/// touch the count.
#[derive(Clone)]
pub struct Complex(Rc<NativeObject>);

impl Complex {
    /// Wraps a freshly created object. The caller hands over its ownership.
    #[must_use]
    pub fn new(module: Rc<dyn ObjectModule>, type_id: u64, handle: ObjectHandle) -> Self {
        Self(Rc::new(NativeObject { module,
                                    type_id,
                                    handle }))
    }

    /// The handle the owning module knows this object by.
    #[must_use]
    pub fn handle(&self) -> ObjectHandle {
        self.0.handle
    }

    /// The imported type id, which is the `minor` of the object's type.
    #[must_use]
    pub fn type_id(&self) -> u64 {
        self.0.type_id
    }

    /// The module that owns this object.
    #[must_use]
    pub fn module(&self) -> Rc<dyn ObjectModule> {
        Rc::clone(&self.0.module)
    }

    /// The object type name declared by the module's descriptor.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.module.descriptor().type_name
    }

    /// The number of live handles to this object.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// `true` if both handles point at the same native object.
    #[must_use]
    pub fn same_object(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Complex")
         .field("type", &self.type_name())
         .field("handle", &self.handle())
         .field("refs", &self.ref_count())
         .finish()
    }
}

impl Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.type_name())
    }
}
