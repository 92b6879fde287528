/*! Core data model for the YulX transpiler.
 *
 * Everything downstream stages share lives here: the tagged AST of the
 * extended dialect, ABI types and signatures, bit-level struct layout, the
 * lexical scope engine, 256-bit word arithmetic, and the ABI collector.
 */

pub mod abi;
pub mod ast;
pub mod errors;
pub mod hardfork;
pub mod layout;
pub mod mangle;
pub mod scope;
pub mod sig;
pub mod types;
pub mod version;
pub mod weight;
pub mod word;

pub use abi::{AbiCollector, AbiItem, AbiItemKind, ContractAbi};
pub use ast::{
    InterfaceCallKind, LiteralKind, Mutability, Node, Param, PragmaKind, StructMember, TypedIdent,
    Visibility,
};
pub use errors::{Error, Result};
pub use layout::{LaidMember, StructLayout};
pub use scope::{MacroEntry, Scope, ScopeKind, ScopeStack};
pub use sig::{keccak256, ErrorSig, EventSig, InterfaceSig, MethodSig};
pub use types::{AbiType, BaseType};

#[cfg(test)]
mod tests;
