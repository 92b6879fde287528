use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Uint,
    Int,
    Address,
    Bool,
    Bytes,
    Function,
}

/// An ABI type as written in a method, event, error or struct declaration.
///
/// `bits` is the value width: 160 for `address`, 8 for `bool`, `n * 8` for
/// `bytes<n>`, 0 for dynamic `bytes`, 192 for external `function` values
/// (selector plus address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbiType {
    pub base: BaseType,
    pub bits: u16,
    pub array: bool,
}

impl AbiType {
    pub fn new(base: BaseType, bits: u16) -> Self {
        Self {
            base,
            bits,
            array: false,
        }
    }

    /// Parse the type grammar: `uint`, `uint32`, `int`, `address`, `bool`,
    /// `bytes`, `bytes20`, `function`, each with an optional `[]` suffix.
    pub fn parse(text: &str) -> Result<Self> {
        let (body, array) = match text.strip_suffix("[]") {
            Some(b) => (b, true),
            None => (text, false),
        };
        let mut ty = if let Some(width) = body.strip_prefix("uint") {
            AbiType::new(BaseType::Uint, parse_width(width, text, 256)?)
        } else if let Some(width) = body.strip_prefix("int") {
            AbiType::new(BaseType::Int, parse_width(width, text, 256)?)
        } else if body == "address" {
            AbiType::new(BaseType::Address, 160)
        } else if body == "bool" {
            AbiType::new(BaseType::Bool, 8)
        } else if let Some(width) = body.strip_prefix("bytes") {
            if width.is_empty() {
                AbiType::new(BaseType::Bytes, 0)
            } else {
                let n: u16 = width
                    .parse()
                    .map_err(|_| Error::Type(format!("malformed type: {}", text)))?;
                if n == 0 || n > 32 {
                    return Err(Error::Type(format!("bytes width out of range: {}", text)));
                }
                AbiType::new(BaseType::Bytes, n * 8)
            }
        } else if body == "function" {
            AbiType::new(BaseType::Function, 192)
        } else {
            return Err(Error::Type(format!("unknown ABI type: {}", text)));
        };
        ty.array = array;
        Ok(ty)
    }

    /// Canonical selector-preimage form: `uint` collapses to `uint256`,
    /// `int` to `int256`, and the same inside `[]`.
    pub fn canonical(&self) -> String {
        let body = match self.base {
            BaseType::Uint => format!("uint{}", self.bits),
            BaseType::Int => format!("int{}", self.bits),
            BaseType::Address => "address".to_string(),
            BaseType::Bool => "bool".to_string(),
            BaseType::Bytes => {
                if self.bits == 0 {
                    "bytes".to_string()
                } else {
                    format!("bytes{}", self.bits / 8)
                }
            }
            BaseType::Function => "function".to_string(),
        };
        if self.array {
            format!("{}[]", body)
        } else {
            body
        }
    }

    /// Bit width of a single element; 0 for dynamic `bytes`.
    pub fn width_bits(&self) -> u16 {
        self.bits
    }

    pub fn width_bytes(&self) -> u16 {
        self.bits / 8
    }

    /// Dynamic types occupy a head slot plus tail data on the wire.
    pub fn is_dynamic(&self) -> bool {
        self.array || (self.base == BaseType::Bytes && self.bits == 0)
    }

    pub fn is_signed(&self) -> bool {
        self.base == BaseType::Int
    }
}

fn parse_width(width: &str, text: &str, max: u16) -> Result<u16> {
    if width.is_empty() {
        return Ok(max);
    }
    let n: u16 = width
        .parse()
        .map_err(|_| Error::Type(format!("malformed type: {}", text)))?;
    if n == 0 || n > max || n % 8 != 0 {
        return Err(Error::Type(format!("type width out of range: {}", text)));
    }
    Ok(n)
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_widths_canonicalise() {
        assert_eq!(AbiType::parse("uint").unwrap().canonical(), "uint256");
        assert_eq!(AbiType::parse("int[]").unwrap().canonical(), "int256[]");
        assert_eq!(AbiType::parse("uint32").unwrap().canonical(), "uint32");
    }

    #[test]
    fn widths() {
        assert_eq!(AbiType::parse("address").unwrap().width_bits(), 160);
        assert_eq!(AbiType::parse("bytes20").unwrap().width_bits(), 160);
        assert_eq!(AbiType::parse("bool").unwrap().width_bits(), 8);
        assert!(AbiType::parse("bytes").unwrap().is_dynamic());
        assert!(AbiType::parse("uint64[]").unwrap().is_dynamic());
    }

    #[test]
    fn rejects_bad_widths() {
        assert!(AbiType::parse("uint7").is_err());
        assert!(AbiType::parse("uint264").is_err());
        assert!(AbiType::parse("bytes33").is_err());
        assert!(AbiType::parse("word").is_err());
    }
}
