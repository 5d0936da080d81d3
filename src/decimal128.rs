//! [BSON Decimal128](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.md) data type representation

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// The bias of the decimal128 exponent.
const EXPONENT_BIAS: i32 = 6176;
/// Smallest and largest unbiased exponents.
const EXPONENT_MIN: i32 = -6176;
const EXPONENT_MAX: i32 = 6111;
/// The maximum number of significand digits.
const MAX_DIGITS: usize = 34;

/// A 128-bit decimal floating point value, stored as the two 64-bit halves
/// of its IEEE 754-2008 binary integer decimal (BID) encoding. On the wire
/// the low half is written first.
///
/// The textual form produced by [`fmt::Display`] is the canonical string
/// used by Extended JSON. Note that converting through the textual form does
/// not preserve non-canonical bit patterns: those decode as zero, as
/// required by the BSON decimal128 specification.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Decimal128 {
    high: u64,
    low: u64,
}

impl Decimal128 {
    /// Constructs a value from the high and low 64 bits of its BID encoding.
    pub const fn from_bits(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// The high 64 bits of the BID encoding.
    pub const fn high(&self) -> u64 {
        self.high
    }

    /// The low 64 bits of the BID encoding.
    pub const fn low(&self) -> u64 {
        self.low
    }

    /// Whether this value is any NaN bit pattern.
    pub fn is_nan(&self) -> bool {
        self.high >> 58 & 0x1F == 0x1F
    }

    /// Whether this value is positive or negative infinity.
    pub fn is_inf(&self) -> bool {
        self.high >> 58 & 0x1F == 0x1E
    }

    fn is_negative(&self) -> bool {
        self.high >> 63 == 1
    }

    /// Splits the encoding into (sign, unbiased exponent, significand).
    ///
    /// Non-canonical encodings (the "large" significand form) represent
    /// values outside the valid range and yield a zero significand.
    fn parts(&self) -> (bool, i32, u128) {
        let (exp, significand) = if self.high >> 61 & 0b11 == 0b11 {
            ((self.high >> 47 & 0x3FFF) as i32, 0u128)
        } else {
            (
                (self.high >> 49 & 0x3FFF) as i32,
                ((self.high & ((1 << 49) - 1)) as u128) << 64 | self.low as u128,
            )
        };

        // A canonical significand has at most 34 decimal digits.
        let significand = if significand >= 10u128.pow(MAX_DIGITS as u32) {
            0
        } else {
            significand
        };

        (self.is_negative(), exp - EXPONENT_BIAS, significand)
    }

    fn from_parts(negative: bool, exp: i32, significand: u128) -> Self {
        let biased = (exp + EXPONENT_BIAS) as u64;
        let mut high = (biased << 49) | (significand >> 64) as u64;
        if negative {
            high |= 1 << 63;
        }

        Self {
            high,
            low: significand as u64,
        }
    }
}

impl fmt::Display for Decimal128 {
    /// Formats the value in the canonical form defined by the BSON
    /// decimal128 specification.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            return f.write_str("NaN");
        }
        if self.is_inf() {
            return if self.is_negative() {
                f.write_str("-Infinity")
            } else {
                f.write_str("Infinity")
            };
        }

        let (negative, exp, significand) = self.parts();
        if negative {
            f.write_str("-")?;
        }

        let digits = significand.to_string();
        let adjusted = exp + digits.len() as i32 - 1;

        if exp > 0 || adjusted < -6 {
            // scientific notation
            f.write_str(&digits[..1])?;
            if digits.len() > 1 {
                write!(f, ".{}", &digits[1..])?;
            }
            return write!(f, "E{}{}", if adjusted >= 0 { "+" } else { "" }, adjusted);
        }

        if exp == 0 {
            return f.write_str(&digits);
        }

        let point = digits.len() as i32 + exp;
        if point > 0 {
            write!(f, "{}.{}", &digits[..point as usize], &digits[point as usize..])
        } else {
            write!(f, "0.{}{}", "0".repeat(-point as usize), digits)
        }
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal128({})", self)
    }
}

impl FromStr for Decimal128 {
    type Err = Error;

    /// Parses a decimal string (as produced by [`fmt::Display`]) back into
    /// a [`Decimal128`].
    fn from_str(s: &str) -> Result<Self> {
        fn invalid(s: &str) -> Error {
            Error::invalid_input(format!("invalid decimal128 string: {:?}", s))
        }

        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        if rest.eq_ignore_ascii_case("nan") {
            return Ok(Self::from_bits(0x7C00 << 48, 0));
        }
        if rest.eq_ignore_ascii_case("infinity") || rest.eq_ignore_ascii_case("inf") {
            let mut high = 0x7800u64 << 48;
            if negative {
                high |= 1 << 63;
            }
            return Ok(Self::from_bits(high, 0));
        }

        let (mantissa, exp_part) = match rest.find(|c| c == 'e' || c == 'E') {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };

        let mut exp: i32 = match exp_part {
            Some(e) => e.parse().map_err(|_| invalid(s))?,
            None => 0,
        };

        let (int_part, frac_part) = match mantissa.find('.') {
            Some(i) => (&mantissa[..i], &mantissa[i + 1..]),
            None => (mantissa, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid(s));
        }

        let digits: String = [int_part, frac_part].concat();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(s));
        }

        exp = exp
            .checked_sub(frac_part.len() as i32)
            .ok_or_else(|| invalid(s))?;

        // drop leading zeros so the digit-count check reflects the value
        let trimmed = digits.trim_start_matches('0');
        if trimmed.len() > MAX_DIGITS {
            return Err(invalid(s));
        }

        let mut significand: u128 = if trimmed.is_empty() {
            0
        } else {
            trimmed.parse().map_err(|_| invalid(s))?
        };

        // fold out-of-range exponents back into the significand when exact
        while exp > EXPONENT_MAX && significand < 10u128.pow(MAX_DIGITS as u32 - 1) {
            significand *= 10;
            exp -= 1;
        }
        while exp < EXPONENT_MIN && significand % 10 == 0 && significand != 0 {
            significand /= 10;
            exp += 1;
        }
        if significand == 0 {
            exp = exp.clamp(EXPONENT_MIN, EXPONENT_MAX);
        }
        if !(EXPONENT_MIN..=EXPONENT_MAX).contains(&exp) {
            return Err(invalid(s));
        }

        Ok(Self::from_parts(negative, exp, significand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(s: &str) {
        let d: Decimal128 = s.parse().expect(s);
        assert_eq!(d.to_string(), s);
    }

    #[test]
    fn canonical_strings_round_trip() {
        for s in [
            "0",
            "-0",
            "1",
            "-1",
            "12345",
            "0.001",
            "123.45",
            "1E+3",
            "1.2345E+6",
            "1E-6176",
            "9.999999999999999999999999999999999E+6144",
            "NaN",
            "Infinity",
            "-Infinity",
        ] {
            round_trip(s);
        }
    }

    #[test]
    fn tiny_fractions_use_scientific_form() {
        let d: Decimal128 = "0.00000001".parse().expect("parse");
        assert_eq!(d.to_string(), "1E-8");
    }

    #[test]
    fn zero_has_canonical_bits() {
        let d: Decimal128 = "0".parse().expect("parse");
        assert_eq!(d.low(), 0);
        assert_eq!(d.high() >> 49 & 0x3FFF, EXPONENT_BIAS as u64);
    }

    #[test]
    fn non_canonical_large_form_is_zero() {
        // top two significand-form bits set: value is out of range
        let d = Decimal128::from_bits(0b11 << 61, 42);
        let (_, _, significand) = d.parts();
        assert_eq!(significand, 0);
    }

    #[test]
    fn rejects_garbage() {
        for s in ["", "-", "1.2.3", "1e", "abc", "1E+9999"] {
            assert!(s.parse::<Decimal128>().is_err(), "{:?}", s);
        }
    }

    #[test]
    fn bits_accessors() {
        let d = Decimal128::from_bits(0x3040_0000_0000_0000, 0x2A);
        assert_eq!(d.high(), 0x3040_0000_0000_0000);
        assert_eq!(d.low(), 0x2A);
        assert_eq!(d.to_string(), "42");
    }
}
