//! 256-bit EVM word arithmetic over `num-bigint`.
//!
//! Every value is a `BigUint` already reduced mod 2^256; signed operations
//! go through two's-complement conversion.

use crate::errors::{Error, Result};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};
use once_cell::sync::Lazy;

/// 2^256.
pub static MODULUS: Lazy<BigUint> = Lazy::new(|| BigUint::one() << 256u32);

/// 2^256 - 1.
pub static MAX: Lazy<BigUint> = Lazy::new(|| &*MODULUS - BigUint::one());

/// 2^255, the smallest negative word.
pub static SIGN_BIT: Lazy<BigUint> = Lazy::new(|| BigUint::one() << 255u32);

pub fn wrap(x: BigUint) -> BigUint {
    x & &*MAX
}

pub fn is_zero(x: &BigUint) -> bool {
    x.is_zero()
}

fn bool_word(b: bool) -> BigUint {
    if b {
        BigUint::one()
    } else {
        BigUint::zero()
    }
}

/// Two's-complement view of a word.
pub fn to_signed(x: &BigUint) -> BigInt {
    if x >= &*SIGN_BIT {
        BigInt::from(x.clone()) - BigInt::from(MODULUS.clone())
    } else {
        BigInt::from(x.clone())
    }
}

/// Back from two's complement, reduced mod 2^256.
pub fn from_signed(x: BigInt) -> BigUint {
    let m = BigInt::from(MODULUS.clone());
    let r = ((x % &m) + &m) % &m;
    r.to_biguint().unwrap_or_default()
}

pub fn add(a: &BigUint, b: &BigUint) -> BigUint {
    wrap(a + b)
}

pub fn sub(a: &BigUint, b: &BigUint) -> BigUint {
    if a >= b {
        a - b
    } else {
        &*MODULUS - (b - a)
    }
}

pub fn mul(a: &BigUint, b: &BigUint) -> BigUint {
    wrap(a * b)
}

pub fn div(a: &BigUint, b: &BigUint) -> BigUint {
    if b.is_zero() {
        BigUint::zero()
    } else {
        a / b
    }
}

pub fn sdiv(a: &BigUint, b: &BigUint) -> BigUint {
    if b.is_zero() {
        return BigUint::zero();
    }
    let (sa, sb) = (to_signed(a), to_signed(b));
    // EVM sdiv truncates toward zero.
    let q = &sa / &sb;
    from_signed(q)
}

pub fn rem(a: &BigUint, b: &BigUint) -> BigUint {
    if b.is_zero() {
        BigUint::zero()
    } else {
        a % b
    }
}

pub fn srem(a: &BigUint, b: &BigUint) -> BigUint {
    if b.is_zero() {
        return BigUint::zero();
    }
    let (sa, sb) = (to_signed(a), to_signed(b));
    from_signed(&sa % &sb)
}

pub fn exp(a: &BigUint, b: &BigUint) -> BigUint {
    a.modpow(b, &MODULUS)
}

pub fn addmod(a: &BigUint, b: &BigUint, n: &BigUint) -> BigUint {
    if n.is_zero() {
        BigUint::zero()
    } else {
        (a + b) % n
    }
}

pub fn mulmod(a: &BigUint, b: &BigUint, n: &BigUint) -> BigUint {
    if n.is_zero() {
        BigUint::zero()
    } else {
        (a * b) % n
    }
}

pub fn not(a: &BigUint) -> BigUint {
    &*MAX - a
}

pub fn and(a: &BigUint, b: &BigUint) -> BigUint {
    a & b
}

pub fn or(a: &BigUint, b: &BigUint) -> BigUint {
    a | b
}

pub fn xor(a: &BigUint, b: &BigUint) -> BigUint {
    a ^ b
}

/// `shl(shift, value)` with the EVM argument order.
pub fn shl(shift: &BigUint, value: &BigUint) -> BigUint {
    match shift.to_u32() {
        Some(s) if s < 256 => wrap(value << s),
        _ => BigUint::zero(),
    }
}

pub fn shr(shift: &BigUint, value: &BigUint) -> BigUint {
    match shift.to_u32() {
        Some(s) if s < 256 => value >> s,
        _ => BigUint::zero(),
    }
}

pub fn sar(shift: &BigUint, value: &BigUint) -> BigUint {
    let negative = value >= &*SIGN_BIT;
    match shift.to_u32() {
        Some(s) if s < 256 => {
            let mut r = value >> s;
            if negative {
                // Fill the vacated high bits with ones.
                let fill = (&*MAX >> s) ^ &*MAX;
                r |= fill;
            }
            r
        }
        _ => {
            if negative {
                MAX.clone()
            } else {
                BigUint::zero()
            }
        }
    }
}

/// `signextend(b, x)`: extend from byte position `b` (0 = lowest byte).
pub fn signextend(b: &BigUint, x: &BigUint) -> BigUint {
    match b.to_u32() {
        Some(pos) if pos < 31 => {
            let bit = pos * 8 + 7;
            let mask = (BigUint::one() << (bit + 1)) - BigUint::one();
            let sign = (x >> bit) & BigUint::one();
            if sign.is_zero() {
                x & mask
            } else {
                (x & &mask) | (&*MAX ^ mask)
            }
        }
        _ => x.clone(),
    }
}

/// `byte(i, x)`: the i-th byte counting from the most significant.
pub fn byte(i: &BigUint, x: &BigUint) -> BigUint {
    match i.to_u32() {
        Some(n) if n < 32 => (x >> ((31 - n) * 8)) & BigUint::from(0xffu32),
        _ => BigUint::zero(),
    }
}

pub fn iszero(a: &BigUint) -> BigUint {
    bool_word(a.is_zero())
}

pub fn eq(a: &BigUint, b: &BigUint) -> BigUint {
    bool_word(a == b)
}

pub fn lt(a: &BigUint, b: &BigUint) -> BigUint {
    bool_word(a < b)
}

pub fn gt(a: &BigUint, b: &BigUint) -> BigUint {
    bool_word(a > b)
}

pub fn slt(a: &BigUint, b: &BigUint) -> BigUint {
    bool_word(to_signed(a) < to_signed(b))
}

pub fn sgt(a: &BigUint, b: &BigUint) -> BigUint {
    bool_word(to_signed(a) > to_signed(b))
}

/// Parse a decimal or hex numeric literal, honouring the sign and the
/// literal-width invariants.
pub fn parse_number(text: &str) -> Result<BigUint> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hexits) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hexits.is_empty() || hexits.len() > 64 {
            return Err(Error::Type(format!("hex literal out of range: {}", text)));
        }
        BigUint::parse_bytes(hexits.as_bytes(), 16)
            .ok_or_else(|| Error::Type(format!("malformed hex literal: {}", text)))?
    } else {
        if body.is_empty() || body.len() > 77 {
            return Err(Error::Type(format!("decimal literal out of range: {}", text)));
        }
        BigUint::parse_bytes(body.as_bytes(), 10)
            .ok_or_else(|| Error::Type(format!("malformed decimal literal: {}", text)))?
    };
    if negative {
        if magnitude > *SIGN_BIT {
            return Err(Error::Type(format!(
                "negative literal exceeds two's-complement range: {}",
                text
            )));
        }
        Ok(from_signed(BigInt::from_biguint(Sign::Minus, magnitude)))
    } else {
        if magnitude > *MAX {
            return Err(Error::Type(format!("literal exceeds 256 bits: {}", text)));
        }
        Ok(magnitude)
    }
}

/// A string or hex"" literal as a left-aligned word.
pub fn bytes_to_word(bytes: &[u8]) -> Result<BigUint> {
    if bytes.len() > 32 {
        return Err(Error::Type(format!(
            "literal of {} bytes does not fit one word",
            bytes.len()
        )));
    }
    let mut padded = [0u8; 32];
    padded[..bytes.len()].copy_from_slice(bytes);
    Ok(BigUint::from_bytes_be(&padded))
}

/// Canonical hex rendering, `0x0` for zero.
pub fn to_hex(x: &BigUint) -> String {
    format!("0x{:x}", x)
}

pub fn from_u64(x: u64) -> BigUint {
    BigUint::from(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: u64) -> BigUint {
        BigUint::from(x)
    }

    #[test]
    fn wrapping_sub_underflows_to_high_values() {
        assert_eq!(sub(&n(0), &n(1)), *MAX);
        assert_eq!(sub(&n(5), &n(3)), n(2));
    }

    #[test]
    fn sdiv_truncates_toward_zero() {
        let minus_seven = from_signed(BigInt::from(-7));
        assert_eq!(sdiv(&minus_seven, &n(2)), from_signed(BigInt::from(-3)));
        assert_eq!(sdiv(&n(7), &n(0)), n(0));
    }

    #[test]
    fn sar_fills_sign_bits() {
        let minus_one = MAX.clone();
        assert_eq!(sar(&n(4), &minus_one), minus_one);
        assert_eq!(sar(&n(1), &n(8)), n(4));
    }

    #[test]
    fn byte_counts_from_most_significant() {
        let x = parse_number("0xdeadbeef").unwrap();
        assert_eq!(byte(&n(31), &x), n(0xef));
        assert_eq!(byte(&n(28), &x), n(0xde));
    }

    #[test]
    fn signextend_propagates_the_byte_sign() {
        assert_eq!(signextend(&n(0), &n(0xff)), MAX.clone());
        assert_eq!(signextend(&n(0), &n(0x7f)), n(0x7f));
    }

    #[test]
    fn negative_literals_are_twos_complement() {
        assert_eq!(parse_number("-1").unwrap(), *MAX);
        assert_eq!(add(&parse_number("-1").unwrap(), &n(2)), n(1));
    }

    #[test]
    fn decimal_width_cap() {
        let seventy_eight = "1".repeat(78);
        assert!(parse_number(&seventy_eight).is_err());
    }

    #[test]
    fn string_words_left_align() {
        let w = bytes_to_word(b"overflow").unwrap();
        assert_eq!(shr(&n(192), &w), parse_number("0x6f766572666c6f77").unwrap());
    }
}
