use crate::interpreter::value::types::{Major, Type};

/// The descriptor version this interpreter understands.
pub const ABI_VERSION: u32 = 1;

/// The declared type of one argument or result.
///
/// `decl` holds one letter per field: `B` boolean, `I` integer, `N` decimal,
/// `L` string, `C` an object of the declaring module, `X` bytes and `R` any
/// tuple. A single letter declares a scalar; several letters declare a row
/// with those fields. `level` adds array dimensions on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgDecl {
    /// Field letters.
    pub decl:  &'static str,
    /// Array dimensions.
    pub level: u32,
}

impl ArgDecl {
    /// A scalar declaration, `ArgDecl::scalar("I")` for an integer.
    #[must_use]
    pub const fn scalar(decl: &'static str) -> Self {
        Self { decl, level: 0 }
    }

    /// Resolves the declaration to a concrete type.
    ///
    /// `own` is the type of the declaring module's objects, used for `C`.
    /// Returns `None` for a malformed declaration. An `R` declaration yields
    /// `auto` (of the declared level) since any tuple is accepted.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::{
    ///     plugin::descriptor::ArgDecl,
    ///     value::types::Type,
    /// };
    ///
    /// let own = Type::object(1);
    /// assert_eq!(ArgDecl::scalar("N").resolve(own), Some(Type::NUMERIC));
    /// assert_eq!(ArgDecl::scalar("IL").resolve(own),
    ///            Some(Type::row(&[Type::INTEGER, Type::LITERAL])));
    /// assert_eq!(ArgDecl::scalar("Q").resolve(own), None);
    /// ```
    #[must_use]
    pub fn resolve(&self, own: Type) -> Option<Type> {
        let mut fields = Vec::with_capacity(self.decl.len());
        for letter in self.decl.chars() {
            fields.push(match letter {
                            'B' => Type::BOOLEAN,
                            'I' => Type::INTEGER,
                            'N' => Type::NUMERIC,
                            'L' => Type::LITERAL,
                            'X' => Type::TABCHAR,
                            'C' => own,
                            'R' => Type::AUTO,
                            _ => return None,
                        });
        }

        let base = match fields.as_slice() {
            [] => return None,
            [single] => *single,
            _ => Type::row(&fields),
        };
        Some(Type { level: base.level + self.level,
                    ..base })
    }

    /// Tests whether a value of static type `ty` may be passed for this
    /// declaration. `auto` is always admitted; the call is then checked when
    /// it runs.
    #[must_use]
    pub fn admits(&self, ty: Type, own: Type) -> bool {
        if ty.is_untyped() && ty.level == 0 {
            return true;
        }
        match self.resolve(own) {
            Some(expected) if self.decl == "R" => {
                ty.major == Major::RowType && ty.level == expected.level
            },
            Some(expected) => expected.accepts(ty),
            None => false,
        }
    }
}

/// A constructor or method exported by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    /// The id passed back to the module on invocation.
    pub id:   u32,
    /// The name scripts call the method by, lower case.
    pub name: &'static str,
    /// Positional argument declarations.
    pub args: Vec<ArgDecl>,
    /// The result declaration, or `None` for no result.
    pub ret:  Option<ArgDecl>,
}

/// Describes the single object type a module provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Must equal [`ABI_VERSION`].
    pub version:   u32,
    /// The type name used in declarations and as the constructor name.
    pub type_name: &'static str,
    /// Constructors, selected by argument count and types.
    pub ctors:     Vec<MethodDecl>,
    /// Methods callable on objects.
    pub methods:   Vec<MethodDecl>,
}

impl ModuleDescriptor {
    /// Finds a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Finds the constructor whose declarations admit the given argument
    /// types.
    #[must_use]
    pub fn constructor(&self, args: &[Type], own: Type) -> Option<&MethodDecl> {
        self.ctors.iter().find(|c| {
                             c.args.len() == args.len()
                             && c.args.iter().zip(args).all(|(decl, ty)| decl.admits(*ty, own))
                         })
    }
}
