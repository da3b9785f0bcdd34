//! Exact rational arithmetic for the solver.
//!
//! All values, coefficients, and bounds are arbitrary-precision rationals; the solver never
//! touches floating point.

use num::BigInt;
use num::BigRational;

/// The exact number type used for assignments, tableau cells, and bounds.
pub type Rational = BigRational;

/// Creates a [`Rational`] from an integer.
pub fn integer(value: i64) -> Rational {
    Rational::from_integer(BigInt::from(value))
}

/// Creates a [`Rational`] from a numerator and a (non-zero) denominator.
pub fn ratio(numerator: i64, denominator: i64) -> Rational {
    Rational::new(BigInt::from(numerator), BigInt::from(denominator))
}
