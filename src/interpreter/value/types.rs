use std::fmt::Display;

/// The kind of a runtime type, independent of array nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Major {
    /// Untyped, written `auto`. Compatible with any concrete type once.
    NoType,
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `decimal`
    Numeric,
    /// `imaginary`
    Imaginary,
    /// `string`
    Literal,
    /// `bytes`
    Tabchar,
    /// A tuple; the minor id identifies the row shape.
    RowType,
    /// A native plugin object; the minor id identifies the object type.
    Complex,
}

/// An immutable `(major, minor, level)` type triple.
///
/// `minor` is zero except for row types (the FNV-1a hash of the ordered field
/// types, see [`Type::row`]) and native objects (the imported type id).
/// `level` is the array nesting depth: `integer[][]` has level 2.
///
/// Equality is exact on all three components. The only sanctioned exception,
/// integer into decimal widening, is handled by [`Type::accepts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
    /// The kind of the type.
    pub major: Major,
    /// Row shape hash or imported type id.
    pub minor: u64,
    /// Array nesting depth.
    pub level: u32,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl Type {
    /// `auto`
    pub const AUTO: Self = Self::scalar(Major::NoType);
    /// `boolean`
    pub const BOOLEAN: Self = Self::scalar(Major::Boolean);
    /// `integer`
    pub const INTEGER: Self = Self::scalar(Major::Integer);
    /// `decimal`
    pub const NUMERIC: Self = Self::scalar(Major::Numeric);
    /// `imaginary`
    pub const IMAGINARY: Self = Self::scalar(Major::Imaginary);
    /// `string`
    pub const LITERAL: Self = Self::scalar(Major::Literal);
    /// `bytes`
    pub const TABCHAR: Self = Self::scalar(Major::Tabchar);

    /// Builds a non-array type of the given kind.
    #[must_use]
    pub const fn scalar(major: Major) -> Self {
        Self { major,
               minor: 0,
               level: 0 }
    }

    /// Builds the type of a native object with the given imported type id.
    #[must_use]
    pub const fn object(type_id: u64) -> Self {
        Self { major: Major::Complex,
               minor: type_id,
               level: 0, }
    }

    /// Builds the structural row type of a tuple with the given ordered field
    /// types.
    ///
    /// Two rows with the same field sequence always hash to the same minor id,
    /// whatever expression built them.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::types::{Major, Type};
    ///
    /// let a = Type::row(&[Type::INTEGER, Type::LITERAL]);
    /// let b = Type::row(&[Type::INTEGER, Type::LITERAL]);
    /// let c = Type::row(&[Type::LITERAL, Type::INTEGER]);
    ///
    /// assert_eq!(a, b);
    /// assert_ne!(a, c);
    /// assert_eq!(a.major, Major::RowType);
    /// ```
    #[must_use]
    pub fn row(fields: &[Self]) -> Self {
        let mut hash = FNV_OFFSET;
        for field in fields {
            let bytes = [u64::from(field.major as u8), field.minor, u64::from(field.level)];
            for word in bytes {
                for byte in word.to_le_bytes() {
                    hash ^= u64::from(byte);
                    hash = hash.wrapping_mul(FNV_PRIME);
                }
            }
        }
        Self { major: Major::RowType,
               minor: hash,
               level: 0, }
    }

    /// Returns the type of an array whose elements have this type.
    #[must_use]
    pub const fn array_of(self) -> Self {
        Self { level: self.level + 1,
               ..self }
    }

    /// Returns the element type of an array type, or `None` for scalars.
    #[must_use]
    pub const fn element(self) -> Option<Self> {
        if self.level == 0 {
            None
        } else {
            Some(Self { level: self.level - 1,
                        ..self })
        }
    }

    /// `true` for array types.
    #[must_use]
    pub const fn is_collection(self) -> bool {
        self.level > 0
    }

    /// `true` for `auto` and arrays of `auto`.
    #[must_use]
    pub fn is_untyped(self) -> bool {
        self.major == Major::NoType
    }

    /// `true` for scalar `integer` and `decimal`.
    #[must_use]
    pub fn is_number(self) -> bool {
        self.level == 0 && matches!(self.major, Major::Integer | Major::Numeric)
    }

    /// `true` if the given scalar kind, or `auto`, is this type.
    #[must_use]
    pub fn is_scalar_or_auto(self, major: Major) -> bool {
        self.level == 0 && (self.major == major || self.major == Major::NoType)
    }

    /// Tests whether a value of type `incoming` may be written into a slot of
    /// this type without changing the slot's type.
    ///
    /// Exact matches are accepted, as is an integer written into a decimal
    /// slot (at any matching array level).
    #[must_use]
    pub fn accepts(self, incoming: Self) -> bool {
        self == incoming
        || (self.major == Major::Numeric
            && incoming.major == Major::Integer
            && self.level == incoming.level)
    }

    /// Tests whether this untyped type may be upgraded to `incoming`.
    ///
    /// `auto` takes any type; `auto[]` takes any array type of the same level.
    #[must_use]
    pub fn upgradable_to(self, incoming: Self) -> bool {
        self.is_untyped() && (self.level == 0 || self.level == incoming.level)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.major {
            Major::NoType => "auto",
            Major::Boolean => "boolean",
            Major::Integer => "integer",
            Major::Numeric => "decimal",
            Major::Imaginary => "imaginary",
            Major::Literal => "string",
            Major::Tabchar => "bytes",
            Major::RowType => "row",
            Major::Complex => "object",
        };
        write!(f, "{name}")?;
        for _ in 0..self.level {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_hash_depends_on_order_and_level() {
        let flat = Type::row(&[Type::INTEGER, Type::INTEGER]);
        let nested = Type::row(&[Type::INTEGER.array_of(), Type::INTEGER]);
        assert_ne!(flat, nested);
        assert_eq!(flat, Type::row(&[Type::INTEGER, Type::INTEGER]));
    }

    #[test]
    fn widening_only_goes_one_way() {
        assert!(Type::NUMERIC.accepts(Type::INTEGER));
        assert!(!Type::INTEGER.accepts(Type::NUMERIC));
        assert!(Type::NUMERIC.array_of().accepts(Type::INTEGER.array_of()));
        assert!(!Type::NUMERIC.array_of().accepts(Type::INTEGER));
    }

    #[test]
    fn untyped_arrays_only_upgrade_to_same_level() {
        let auto_array = Type::AUTO.array_of();
        assert!(auto_array.upgradable_to(Type::LITERAL.array_of()));
        assert!(!auto_array.upgradable_to(Type::LITERAL));
        assert!(Type::AUTO.upgradable_to(Type::BOOLEAN.array_of().array_of()));
    }

    #[test]
    fn display_appends_array_levels() {
        assert_eq!(Type::NUMERIC.array_of().array_of().to_string(), "decimal[][]");
        assert_eq!(Type::AUTO.to_string(), "auto");
    }
}
