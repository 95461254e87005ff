use std::fmt::Display;

use crate::{
    error::RuntimeError,
    interpreter::{
        context::storage::Place,
        evaluator::core::EvalResult,
        value::{
            collection::Collection,
            complex::Complex,
            imaginary::Imaginary,
            tuple::Tuple,
            types::{Major, Type},
        },
    },
    util::num::widen_integer,
};

/// The contents of a [`Value`].
///
/// Exactly one variant is valid for each type; `Null` is valid for all of
/// them and `Alias` stands in for the value stored at a [`Place`].
#[derive(Debug)]
pub enum Payload {
    /// No value. The owning `Value` still carries its declared type.
    Null,
    /// `boolean`
    Boolean(bool),
    /// `integer`
    Integer(i64),
    /// `decimal`
    Numeric(f64),
    /// `imaginary`
    Imaginary(Imaginary),
    /// `string`
    Literal(String),
    /// `bytes`
    Tabchar(Vec<u8>),
    /// A row value.
    Tuple(Tuple),
    /// An array.
    Collection(Collection),
    /// A native object handle.
    Complex(Complex),
    /// A reference to the value stored at another place.
    Alias(Place),
}

/// A runtime value: a type, a payload and the lvalue flag.
///
/// Cloning is a deep copy (native objects are shared, incrementing their
/// count) and always produces an rvalue. Values stored in variables are
/// lvalues.
#[derive(Debug)]
pub struct Value {
    ty:      Type,
    payload: Payload,
    lvalue:  bool,
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let payload = match &self.payload {
            Payload::Null => Payload::Null,
            Payload::Boolean(b) => Payload::Boolean(*b),
            Payload::Integer(i) => Payload::Integer(*i),
            Payload::Numeric(n) => Payload::Numeric(*n),
            Payload::Imaginary(z) => Payload::Imaginary(*z),
            Payload::Literal(s) => Payload::Literal(s.clone()),
            Payload::Tabchar(b) => Payload::Tabchar(b.clone()),
            Payload::Tuple(t) => Payload::Tuple(t.clone()),
            Payload::Collection(c) => Payload::Collection(c.clone()),
            Payload::Complex(c) => Payload::Complex(c.clone()),
            Payload::Alias(p) => Payload::Alias(p.clone()),
        };
        Self { ty: self.ty,
               payload,
               lvalue: false }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::new(Type::BOOLEAN, Payload::Boolean(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::new(Type::INTEGER, Payload::Integer(i))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::new(Type::NUMERIC, Payload::Numeric(n))
    }
}

impl From<Imaginary> for Value {
    fn from(z: Imaginary) -> Self {
        Self::new(Type::IMAGINARY, Payload::Imaginary(z))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::new(Type::LITERAL, Payload::Literal(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(Type::TABCHAR, Payload::Tabchar(bytes))
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Self::new(c.elem_type().array_of(), Payload::Collection(c))
    }
}

impl From<Tuple> for Value {
    fn from(t: Tuple) -> Self {
        Self::new(t.row_type(), Payload::Tuple(t))
    }
}

impl From<Complex> for Value {
    fn from(c: Complex) -> Self {
        Self::new(Type::object(c.type_id()), Payload::Complex(c))
    }
}

fn mismatch(expected: &str, found: Type, line: usize) -> RuntimeError {
    RuntimeError::TypeMismatch { expected: expected.to_string(),
                                 found: found.to_string(),
                                 line }
}

impl Value {
    const fn new(ty: Type, payload: Payload) -> Self {
        Self { ty,
               payload,
               lvalue: false }
    }

    /// A null value of the given type.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::{core::Value, types::Type};
    ///
    /// let v = Value::null(Type::INTEGER);
    /// assert!(v.is_null());
    /// assert_eq!(v.ty(), Type::INTEGER);
    /// assert_eq!(v.integer(1).unwrap(), None);
    /// ```
    #[must_use]
    pub const fn null(ty: Type) -> Self {
        Self::new(ty, Payload::Null)
    }

    /// An alias to the value stored at `place`, typed as that value.
    #[must_use]
    pub const fn alias(place: Place, ty: Type) -> Self {
        Self::new(ty, Payload::Alias(place))
    }

    /// The value's type. Null values report their declared type.
    #[must_use]
    pub const fn ty(&self) -> Type {
        self.ty
    }

    /// The value's payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// `true` if the payload is absent.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.payload, Payload::Null)
    }

    /// `true` for values living in variable storage.
    #[must_use]
    pub const fn is_lvalue(&self) -> bool {
        self.lvalue
    }

    /// Marks the value as living in (or not living in) variable storage.
    pub fn set_lvalue(&mut self, lvalue: bool) {
        self.lvalue = lvalue;
    }

    /// Replaces the declared type of a null value. Non-null values keep
    /// their type.
    pub fn retype_null(&mut self, ty: Type) {
        if self.is_null() {
            self.ty = ty;
        }
    }

    /// Exchanges type, payload and flags with `other` in constant time.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::core::Value;
    ///
    /// let mut a = Value::from(1);
    /// let mut b = Value::from("one");
    /// a.swap(&mut b);
    /// assert_eq!(a.to_string(), "one");
    /// assert_eq!(b.to_string(), "1");
    /// ```
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Moves the payload out, leaving a null of the same type behind.
    ///
    /// Unlike `clone`, moving a native object does not change its count.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let ty = self.ty;
        let mut taken = std::mem::replace(self, Self::null(ty));
        self.lvalue = taken.lvalue;
        taken.lvalue = false;
        taken
    }

    /// Reads a boolean.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a boolean.
    pub fn boolean(&self, line: usize) -> EvalResult<Option<bool>> {
        match self.payload {
            Payload::Boolean(b) => Ok(Some(b)),
            Payload::Null if self.ty.is_scalar_or_auto(Major::Boolean) => Ok(None),
            _ => Err(mismatch("boolean", self.ty, line)),
        }
    }

    /// Reads an integer.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not an integer.
    pub fn integer(&self, line: usize) -> EvalResult<Option<i64>> {
        match self.payload {
            Payload::Integer(i) => Ok(Some(i)),
            Payload::Null if self.ty.is_scalar_or_auto(Major::Integer) => Ok(None),
            _ => Err(mismatch("integer", self.ty, line)),
        }
    }

    /// Reads a decimal, widening an integer.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a number.
    pub fn numeric(&self, line: usize) -> EvalResult<Option<f64>> {
        match self.payload {
            Payload::Numeric(n) => Ok(Some(n)),
            Payload::Integer(i) => Ok(Some(widen_integer(i))),
            Payload::Null if self.ty.is_number() || self.ty == Type::AUTO => Ok(None),
            _ => Err(mismatch("decimal", self.ty, line)),
        }
    }

    /// Reads an imaginary number.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not imaginary.
    pub fn imaginary(&self, line: usize) -> EvalResult<Option<Imaginary>> {
        match self.payload {
            Payload::Imaginary(z) => Ok(Some(z)),
            Payload::Null if self.ty.is_scalar_or_auto(Major::Imaginary) => Ok(None),
            _ => Err(mismatch("imaginary", self.ty, line)),
        }
    }

    /// Reads a string.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a string.
    pub fn literal(&self, line: usize) -> EvalResult<Option<&str>> {
        match &self.payload {
            Payload::Literal(s) => Ok(Some(s)),
            Payload::Null if self.ty.is_scalar_or_auto(Major::Literal) => Ok(None),
            _ => Err(mismatch("string", self.ty, line)),
        }
    }

    /// Reads a byte array.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a byte array.
    pub fn tabchar(&self, line: usize) -> EvalResult<Option<&[u8]>> {
        match &self.payload {
            Payload::Tabchar(b) => Ok(Some(b)),
            Payload::Null if self.ty.is_scalar_or_auto(Major::Tabchar) => Ok(None),
            _ => Err(mismatch("bytes", self.ty, line)),
        }
    }

    /// Reads a collection.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a collection.
    pub fn collection(&self, line: usize) -> EvalResult<Option<&Collection>> {
        match &self.payload {
            Payload::Collection(c) => Ok(Some(c)),
            Payload::Null if self.ty.is_collection() || self.ty == Type::AUTO => Ok(None),
            _ => Err(mismatch("collection", self.ty, line)),
        }
    }

    /// Mutably borrows a collection. A null collection of a known array type
    /// is first replaced by an empty one, so mutators work on declared
    /// variables.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a collection, `NullValue` for an
    /// untyped null.
    pub fn collection_mut(&mut self, line: usize) -> EvalResult<&mut Collection> {
        if self.is_null() {
            let Some(elem) = self.ty.element() else {
                return Err(if self.ty == Type::AUTO {
                               RuntimeError::NullValue { line }
                           } else {
                               mismatch("collection", self.ty, line)
                           });
            };
            self.payload = Payload::Collection(Collection::new(elem));
        }
        match &mut self.payload {
            Payload::Collection(c) => Ok(c),
            _ => Err(mismatch("collection", self.ty, line)),
        }
    }

    /// Reads a tuple.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a tuple.
    pub fn tuple(&self, line: usize) -> EvalResult<Option<&Tuple>> {
        match &self.payload {
            Payload::Tuple(t) => Ok(Some(t)),
            Payload::Null if self.ty.is_scalar_or_auto(Major::RowType) => Ok(None),
            _ => Err(mismatch("row", self.ty, line)),
        }
    }

    /// Mutably borrows a tuple.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a tuple, `NullValue` if it is null.
    pub fn tuple_mut(&mut self, line: usize) -> EvalResult<&mut Tuple> {
        let ty = self.ty;
        match &mut self.payload {
            Payload::Tuple(t) => Ok(t),
            Payload::Null if ty.major == Major::RowType => Err(RuntimeError::NullValue { line }),
            _ => Err(mismatch("row", ty, line)),
        }
    }

    /// Reads a native object handle.
    ///
    /// # Errors
    /// `TypeMismatch` if the value is not a native object.
    pub fn complex(&self, line: usize) -> EvalResult<Option<&Complex>> {
        match &self.payload {
            Payload::Complex(c) => Ok(Some(c)),
            Payload::Null if self.ty.is_scalar_or_auto(Major::Complex) => Ok(None),
            _ => Err(mismatch("object", self.ty, line)),
        }
    }

    /// The aliased place, if this value is an alias.
    #[must_use]
    pub const fn as_alias(&self) -> Option<&Place> {
        match &self.payload {
            Payload::Alias(p) => Some(p),
            _ => None,
        }
    }

    /// Converts the value so that it fits a slot of type `target`.
    ///
    /// Integers become decimals (recursively inside collections) when
    /// `target` is a decimal type; nulls take the target type and an untyped
    /// collection without concrete elements adopts a concrete array type.
    /// Every other value is returned unchanged.
    ///
    /// # Errors
    /// `Overflow` if an integer cannot be represented exactly as a decimal.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::{core::Value, types::Type};
    ///
    /// let widened = Value::from(3).widen_to(Type::NUMERIC, 1).unwrap();
    /// assert_eq!(widened.ty(), Type::NUMERIC);
    /// assert_eq!(widened.to_string(), "3.0");
    /// ```
    pub fn widen_to(self, target: Type, line: usize) -> EvalResult<Self> {
        if self.is_null() {
            let mut null = self;
            if target.major != Major::NoType {
                null.ty = target;
            }
            return Ok(null);
        }
        if self.ty.is_untyped() && !target.is_untyped() && target.level == self.ty.level {
            let mut adopted = self;
            if let (Some(elem), Payload::Collection(c)) = (target.element(), &mut adopted.payload)
               && c.iter().all(Value::is_null)
            {
                c.adopt(elem);
                adopted.ty = target;
            }
            return Ok(adopted);
        }
        if target.major != Major::Numeric || self.ty.major != Major::Integer {
            return Ok(self);
        }

        let lvalue = self.lvalue;
        let mut widened = match self.payload {
            Payload::Integer(i) => Self::from(widen_integer(i)),
            Payload::Collection(c) => {
                let elem = target.element().unwrap_or(Type::NUMERIC);
                Self::from(c.widen_to(elem, line)?)
            },
            payload => Self { ty: self.ty,
                              payload,
                              lvalue },
        };
        widened.lvalue = lvalue;
        Ok(widened)
    }

    /// Formats the value as it appears inside a container: strings are
    /// quoted, everything else as for `Display`.
    #[must_use]
    pub fn to_nested_string(&self) -> String {
        match &self.payload {
            Payload::Literal(s) => quote_literal(s),
            _ => self.to_string(),
        }
    }
}

/// Formats a decimal so it always shows a fraction or an exponent, and reads
/// back as a decimal.
///
/// # Example
/// ```
/// use plume::interpreter::value::core::format_numeric;
///
/// assert_eq!(format_numeric(2.0), "2.0");
/// assert_eq!(format_numeric(0.25), "0.25");
/// assert_eq!(format_numeric(1e20), "1e20");
/// ```
#[must_use]
pub fn format_numeric(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-5) {
        format!("{n:e}")
    } else if n.fract() == 0.0 {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

/// Quotes a string so that it reads back as the same string literal.
///
/// # Example
/// ```
/// use plume::interpreter::value::core::quote_literal;
///
/// assert_eq!(quote_literal("say \"hi\"\n"), r#""say \"hi\"\n""#);
/// ```
#[must_use]
pub fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            Payload::Null => write!(f, "null"),
            Payload::Boolean(b) => write!(f, "{b}"),
            Payload::Integer(i) => write!(f, "{i}"),
            Payload::Numeric(n) => write!(f, "{}", format_numeric(*n)),
            Payload::Imaginary(z) => write!(f, "{z}"),
            Payload::Literal(s) => write!(f, "{s}"),
            Payload::Tabchar(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            },
            Payload::Tuple(t) => {
                write!(f, "(")?;
                for (i, item) in t.items().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.to_nested_string())?;
                }
                write!(f, ")")
            },
            Payload::Collection(c) => {
                write!(f, "[")?;
                for (i, item) in c.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.to_nested_string())?;
                }
                write!(f, "]")
            },
            Payload::Complex(c) => write!(f, "{c}"),
            Payload::Alias(p) => write!(f, "{p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_is_deep_and_rvalue() {
        let mut items = Collection::new(Type::INTEGER);
        items.push(Value::from(1), 1).unwrap();
        let mut original = Value::from(items);
        original.set_lvalue(true);

        let copy = original.clone();
        original.collection_mut(1).unwrap().push(Value::from(2), 1).unwrap();

        assert!(!copy.is_lvalue());
        assert_eq!(copy.to_string(), "[1]");
        assert_eq!(original.to_string(), "[1, 2]");
    }

    #[test]
    fn mutating_the_clone_leaves_the_original() {
        let original = Value::from(Tuple::new(vec![Value::from("a"), Value::from(1.5)]));
        let mut copy = original.clone();
        copy.tuple_mut(1).unwrap().put(2, Value::from(2.5), 1).unwrap();

        assert_eq!(original.to_string(), "(\"a\", 1.5)");
        assert_eq!(copy.to_string(), "(\"a\", 2.5)");
    }

    #[test]
    fn swap_twice_restores() {
        let mut a = Value::from(vec![1u8, 2]);
        let mut b = Value::null(Type::LITERAL);
        a.swap(&mut b);
        a.swap(&mut b);
        assert_eq!(a.to_string(), "0x0102");
        assert!(b.is_null());
        assert_eq!(b.ty(), Type::LITERAL);
    }

    #[test]
    fn take_leaves_typed_null() {
        let mut v = Value::from("text");
        v.set_lvalue(true);
        let taken = v.take();

        assert!(v.is_null());
        assert!(v.is_lvalue());
        assert_eq!(v.ty(), Type::LITERAL);
        assert!(!taken.is_lvalue());
        assert_eq!(taken.to_string(), "text");
    }

    #[test]
    fn accessors_check_kind() {
        let v = Value::from(true);
        assert_eq!(v.boolean(1).unwrap(), Some(true));
        assert!(matches!(v.integer(4), Err(RuntimeError::TypeMismatch { line: 4, .. })));
        assert_eq!(Value::from(2).numeric(1).unwrap(), Some(2.0));
    }

    #[test]
    fn null_collection_becomes_empty_on_mutation() {
        let mut v = Value::null(Type::LITERAL.array_of());
        v.collection_mut(1).unwrap().push(Value::from("x"), 1).unwrap();
        assert_eq!(v.to_string(), "[\"x\"]");
        assert!(Value::null(Type::AUTO).collection_mut(1).is_err());
    }

    #[test]
    fn integers_beyond_two_to_the_fifty_third_still_widen() {
        let big = 1_i64 << 60;
        let widened = Value::from(big).widen_to(Type::NUMERIC, 1).unwrap();
        assert_eq!(widened.numeric(1).unwrap(), Some(1_152_921_504_606_846_976.0));
        assert_eq!(Value::from(9_007_199_254_740_993_i64).numeric(1).unwrap(),
                   Some(9_007_199_254_740_992.0));
    }
}
