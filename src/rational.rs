//! Exact fractions of two 64-bit integers.
//!
//! Every [`Rational`] is kept in lowest terms with a positive denominator, so
//! structural equality is numeric equality and `Display` is canonical.

use std::{cmp::Ordering, fmt::Display};

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Division by zero")]
    #[diagnostic(
        code(fraction::division_by_zero),
        help("a fraction cannot have a zero denominator")
    )]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    #[diagnostic(
        code(fraction::overflow),
        help("the exact result does not fit in a 64-bit numerator and denominator")
    )]
    Overflow,
}

/// An exact fraction `numerator/denominator`.
///
/// Arithmetic is carried out on 128-bit intermediates, reduced, and then
/// narrowed back; a result that still does not fit fails with
/// [`ArithmeticError::Overflow`] instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    pub const ZERO: Rational = Rational {
        numerator: 0,
        denominator: 1,
    };

    pub const ONE: Rational = Rational {
        numerator: 1,
        denominator: 1,
    };

    /// Builds the reduced fraction `numerator/denominator`.
    ///
    /// ```
    /// use fraction_calc::Rational;
    ///
    /// let half = Rational::new(-3, -6).unwrap();
    /// assert_eq!(half.to_string(), "1/2");
    /// assert!(Rational::new(1, 0).is_err());
    /// ```
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, ArithmeticError> {
        Self::reduce(numerator.into(), denominator.into())
    }

    pub fn from_integer(n: i64) -> Self {
        Rational {
            numerator: n,
            denominator: 1,
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    pub fn add(self, other: Rational) -> Result<Self, ArithmeticError> {
        let (a, b, c, d) = self.wide_parts(other);
        let numerator = (a * d).checked_add(c * b).ok_or(ArithmeticError::Overflow)?;
        Self::reduce(numerator, b * d)
    }

    pub fn subtract(self, other: Rational) -> Result<Self, ArithmeticError> {
        let (a, b, c, d) = self.wide_parts(other);
        let numerator = (a * d).checked_sub(c * b).ok_or(ArithmeticError::Overflow)?;
        Self::reduce(numerator, b * d)
    }

    pub fn multiply(self, other: Rational) -> Result<Self, ArithmeticError> {
        let (a, b, c, d) = self.wide_parts(other);
        Self::reduce(a * c, b * d)
    }

    pub fn divide(self, other: Rational) -> Result<Self, ArithmeticError> {
        if other.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        let (a, b, c, d) = self.wide_parts(other);
        Self::reduce(a * d, b * c)
    }

    /// Raises `self` to an integer power.
    ///
    /// `x^0` is exactly one (including `0^0`). A negative exponent inverts the
    /// positive power, which fails with [`ArithmeticError::DivisionByZero`]
    /// when the base is zero.
    pub fn pow(self, exponent: i64) -> Result<Self, ArithmeticError> {
        if exponent == 0 {
            return Ok(Self::ONE);
        }
        // these bases never grow, whatever the size of the exponent
        match (self.numerator, self.denominator) {
            (0, 1) if exponent < 0 => return Err(ArithmeticError::DivisionByZero),
            (0, 1) | (1, 1) => return Ok(self),
            (-1, 1) if exponent % 2 == 0 => return Ok(Self::ONE),
            (-1, 1) => return Ok(self),
            _ => {}
        }
        let magnitude =
            u32::try_from(exponent.unsigned_abs()).map_err(|_| ArithmeticError::Overflow)?;

        // a reduced fraction stays reduced when both parts are raised to the same power
        let positive = Rational {
            numerator: self
                .numerator
                .checked_pow(magnitude)
                .ok_or(ArithmeticError::Overflow)?,
            denominator: self
                .denominator
                .checked_pow(magnitude)
                .ok_or(ArithmeticError::Overflow)?,
        };

        if exponent < 0 {
            Self::ONE.divide(positive)
        } else {
            Ok(positive)
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    fn wide_parts(self, other: Rational) -> (i128, i128, i128, i128) {
        (
            self.numerator.into(),
            self.denominator.into(),
            other.numerator.into(),
            other.denominator.into(),
        )
    }

    fn reduce(numerator: i128, denominator: i128) -> Result<Self, ArithmeticError> {
        if denominator == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }

        // denominator != 0, so the divisor is at least one
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs());
        let divisor = i128::try_from(divisor).map_err(|_| ArithmeticError::Overflow)?;
        let (mut numerator, mut denominator) = (numerator / divisor, denominator / divisor);

        if denominator < 0 {
            numerator = numerator.checked_neg().ok_or(ArithmeticError::Overflow)?;
            denominator = denominator.checked_neg().ok_or(ArithmeticError::Overflow)?;
        }

        Ok(Rational {
            numerator: i64::try_from(numerator).map_err(|_| ArithmeticError::Overflow)?,
            denominator: i64::try_from(denominator).map_err(|_| ArithmeticError::Overflow)?,
        })
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self::from_integer(n)
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, c, d) = self.wide_parts(*other);
        (a * d).cmp(&(c * b))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}
