//! Bit-level layout of structs packed into a single 256-bit word.
//!
//! Members occupy consecutive bit ranges starting at the most significant
//! bit; the first declared member sits in the top bytes.

use crate::errors::{Error, Result};
use crate::types::AbiType;
#[cfg(test)]
use crate::word;
use num_bigint::BigUint;
use num_traits::{One, Zero};

#[derive(Debug, Clone)]
pub struct StructLayout {
    pub name: String,
    pub members: Vec<LaidMember>,
    /// Total width including padding, in bits. Always in (0, 256].
    pub width_bits: u16,
    /// All members at their declared defaults, packed.
    pub default: BigUint,
}

#[derive(Debug, Clone)]
pub struct LaidMember {
    pub name: String,
    pub ty: AbiType,
    /// Bit offset from the most significant bit of the word.
    pub offset: u16,
    pub width: u16,
    pub default: BigUint,
    pub padding: bool,
}

impl LaidMember {
    /// Right-shift distance that brings this member to the low end.
    pub fn shift(&self) -> u16 {
        256 - self.offset - self.width
    }

    pub fn mask(&self) -> BigUint {
        (BigUint::one() << self.width) - BigUint::one()
    }

    /// Mask at the member's position within the word.
    pub fn placed_mask(&self) -> BigUint {
        self.mask() << self.shift()
    }

    pub fn place(&self, value: &BigUint) -> BigUint {
        (value & self.mask()) << self.shift()
    }

    /// `byte(i, x)` applies when the member is one byte wide on a byte
    /// boundary.
    pub fn byte_index(&self) -> Option<u16> {
        if self.width == 8 && self.offset % 8 == 0 {
            Some(self.offset / 8)
        } else {
            None
        }
    }
}

impl StructLayout {
    pub fn new(name: &str, members: Vec<(String, AbiType, Option<BigUint>)>) -> Result<Self> {
        let mut laid = Vec::with_capacity(members.len());
        let mut offset: u32 = 0;
        for (member_name, ty, default) in members {
            if ty.is_dynamic() {
                return Err(Error::Type(format!(
                    "struct {}: member {} has dynamic type {}",
                    name, member_name, ty
                )));
            }
            let width = ty.width_bits();
            let padding = member_name == "+";
            let default = default.unwrap_or_default();
            if default.bits() as u16 > width {
                return Err(Error::Type(format!(
                    "struct {}: default for {} does not fit {} bits",
                    name, member_name, width
                )));
            }
            laid.push(LaidMember {
                name: member_name,
                ty,
                offset: offset as u16,
                width,
                default,
                padding,
            });
            offset += width as u32;
            if offset > 256 {
                return Err(Error::Type(format!(
                    "struct {} exceeds 256 bits ({} so far)",
                    name, offset
                )));
            }
        }
        if offset == 0 {
            return Err(Error::Type(format!("struct {} has zero width", name)));
        }
        let mut default = BigUint::zero();
        for m in &laid {
            if !m.default.is_zero() {
                default |= m.place(&m.default.clone());
            }
        }
        Ok(Self {
            name: name.to_string(),
            members: laid,
            width_bits: offset as u16,
            default,
        })
    }

    pub fn member(&self, name: &str) -> Option<&LaidMember> {
        self.members.iter().find(|m| !m.padding && m.name == name)
    }

    /// Non-padding members in declaration order; initialiser arguments map
    /// onto these positionally.
    pub fn value_members(&self) -> impl Iterator<Item = &LaidMember> {
        self.members.iter().filter(|m| !m.padding)
    }

    pub fn width_bytes(&self) -> u16 {
        (self.width_bits + 7) / 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AbiType;

    fn btc_output() -> StructLayout {
        StructLayout::new(
            "btc_output",
            vec![
                ("value".into(), AbiType::parse("uint64").unwrap(), None),
                (
                    "prefix".into(),
                    AbiType::parse("uint24").unwrap(),
                    Some(word::parse_number("0x160014").unwrap()),
                ),
                ("hash".into(), AbiType::parse("bytes20").unwrap(), None),
            ],
        )
        .unwrap()
    }

    #[test]
    fn offsets_run_from_the_top() {
        let s = btc_output();
        assert_eq!(s.width_bits, 248);
        let value = s.member("value").unwrap();
        assert_eq!((value.offset, value.shift()), (0, 192));
        let prefix = s.member("prefix").unwrap();
        assert_eq!((prefix.offset, prefix.shift()), (64, 168));
        let hash = s.member("hash").unwrap();
        assert_eq!((hash.offset, hash.shift()), (88, 8));
    }

    #[test]
    fn packed_default_places_members() {
        let s = btc_output();
        let expected = word::shl(
            &word::from_u64(168),
            &word::parse_number("0x160014").unwrap(),
        );
        assert_eq!(s.default, expected);
    }

    #[test]
    fn rejects_overflow_and_zero_width() {
        let over = StructLayout::new(
            "wide",
            vec![
                ("a".into(), AbiType::parse("uint256").unwrap(), None),
                ("b".into(), AbiType::parse("uint8").unwrap(), None),
            ],
        );
        assert!(over.is_err());
        assert!(StructLayout::new("empty", vec![]).is_err());
    }

    #[test]
    fn rejects_oversized_default() {
        let bad = StructLayout::new(
            "s",
            vec![(
                "a".into(),
                AbiType::parse("uint8").unwrap(),
                Some(word::from_u64(256)),
            )],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn byte_aligned_single_byte_member() {
        let s = StructLayout::new(
            "flags",
            vec![
                ("hi".into(), AbiType::parse("uint16").unwrap(), None),
                ("mode".into(), AbiType::parse("uint8").unwrap(), None),
            ],
        )
        .unwrap();
        assert_eq!(s.member("mode").unwrap().byte_index(), Some(2));
        assert_eq!(s.member("hi").unwrap().byte_index(), None);
    }
}
