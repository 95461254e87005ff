use std::{fmt::Display, ops};

use crate::{
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::format_numeric},
};

/// `1.0+0.0i`
pub const ONE: Imaginary = Imaginary::new(1.0, 0.0);

/// An imaginary (complex) number made of a real and an imaginary part.
///
/// The language calls this type `imaginary` to keep the word "complex" free
/// for native plugin objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Imaginary {
    /// The real part.
    pub re: f64,
    /// The imaginary part.
    pub im: f64,
}

impl Display for Imaginary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.im.is_sign_negative() { "-" } else { "+" };
        write!(f,
               "{}{sign}{}i",
               format_numeric(self.re),
               format_numeric(self.im.abs()))
    }
}

impl Imaginary {
    /// Constructs a new number from its two parts.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::imaginary::Imaginary;
    ///
    /// let z = Imaginary::new(5.0, -1.0);
    /// assert_eq!(z.re, 5.0);
    /// assert_eq!(z.to_string(), "5.0-1.0i");
    /// ```
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Returns the modulus.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::imaginary::Imaginary;
    ///
    /// assert_eq!(Imaginary::new(3.0, 4.0).abs(), 5.0);
    /// ```
    #[must_use]
    pub fn abs(&self) -> f64 {
        self.re.hypot(self.im)
    }

    /// `true` if both parts are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }

    /// Returns `1/z`.
    #[must_use]
    pub const fn recip(&self) -> Self {
        let norm = self.re * self.re + self.im * self.im;

        Self { re: self.re / norm,
               im: -(self.im / norm), }
    }

    /// Divides, failing on a zero divisor.
    pub fn checked_div(self, rhs: Self, line: usize) -> EvalResult<Self> {
        if rhs.is_zero() {
            return Err(RuntimeError::DivisionByZero { line });
        }
        Ok(self / rhs)
    }

    /// Raises the number to an integer power by repeated squaring.
    ///
    /// # Errors
    /// `DivisionByZero` for a negative power of zero, `Overflow` when a part
    /// stops being finite.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::imaginary::{Imaginary, ONE};
    ///
    /// let i = Imaginary::new(0.0, 1.0);
    /// assert_eq!(i.checked_powi(0, 1).unwrap(), ONE);
    /// assert_eq!(i.checked_powi(2, 1).unwrap(), Imaginary::new(-1.0, 0.0));
    /// ```
    pub fn checked_powi(self, exp: i64, line: usize) -> EvalResult<Self> {
        if exp == 0 {
            return Ok(ONE);
        }
        if self.is_zero() && exp < 0 {
            return Err(RuntimeError::DivisionByZero { line });
        }

        let finite = |z: Self| {
            if z.re.is_finite() && z.im.is_finite() {
                Ok(z)
            } else {
                Err(RuntimeError::Overflow { line })
            }
        };

        let mut base = self;
        let mut result = ONE;
        let mut n = exp.unsigned_abs();

        while n > 0 {
            if n % 2 == 1 {
                result = finite(result * base)?;
            }
            n /= 2;
            if n > 0 {
                base = finite(base * base)?;
            }
        }

        if exp < 0 {
            result = finite(result.recip())?;
        }
        Ok(result)
    }
}

impl ops::Neg for Imaginary {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self { re: -self.re,
               im: -self.im, }
    }
}

impl ops::Add for Imaginary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self { re: self.re + rhs.re,
               im: self.im + rhs.im, }
    }
}

impl ops::Sub for Imaginary {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self { re: self.re - rhs.re,
               im: self.im - rhs.im, }
    }
}

impl ops::Mul for Imaginary {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self { re: self.re.mul_add(rhs.re, -(self.im * rhs.im)),
               im: self.re.mul_add(rhs.im, self.im * rhs.re), }
    }
}

impl ops::Div for Imaginary {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        let denom = rhs.re.mul_add(rhs.re, rhs.im * rhs.im);
        Self { re: self.re.mul_add(rhs.re, self.im * rhs.im) / denom,
               im: self.im.mul_add(rhs.re, -(self.re * rhs.im)) / denom, }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_reported() {
        let z = Imaginary::new(1.0, 1.0);
        assert!(matches!(z.checked_div(Imaginary::new(0.0, 0.0), 3),
                         Err(RuntimeError::DivisionByZero { line: 3 })));
    }

    #[test]
    fn negative_powers_invert() {
        let z = Imaginary::new(2.0, 0.0);
        let r = z.checked_powi(-2, 1).unwrap();
        assert!((r.re - 0.25).abs() < 1e-12);
        assert!(r.im.abs() < 1e-12);
    }

    #[test]
    fn display_shows_sign_of_imaginary_part() {
        assert_eq!(Imaginary::new(1.0, 2.0).to_string(), "1.0+2.0i");
        assert_eq!(Imaginary::new(-1.5, -2.0).to_string(), "-1.5-2.0i");
    }
}
