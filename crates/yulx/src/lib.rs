/*! Unified entry point for the YulX transpiler.
 *
 * Single import for the whole pipeline: parsing the extended dialect,
 * lowering it to plain Yul, serializing the result, and reading the
 * collected ABI metadata.
 */

pub use yulx_core as core;
pub use yulx_emit as emit;
pub use yulx_parser as parser;
pub use yulx_transform as transform;

pub use yulx_core::{
    abi::{AbiCollector, ContractAbi},
    ast::Node,
    errors::{Error, Result},
};
pub use yulx_emit::serialize;
pub use yulx_parser::parse;
pub use yulx_transform::{transform as lower, BuiltinLevel, Options, Output};

use std::collections::BTreeMap;

/// Everything a driver needs from one compilation.
#[derive(Debug)]
pub struct Transpiled {
    /// Canonical plain-Yul source, ready for the backend.
    pub yul: String,
    pub abi: AbiCollector,
    pub docs: BTreeMap<usize, String>,
}

/// Parse, lower and serialize one source file.
pub fn transpile(source: &str, file: &str, options: Options) -> Result<Transpiled> {
    let output = yulx_transform::transform(source, file, options)?;
    Ok(Transpiled {
        yul: yulx_emit::serialize(&output.ast),
        abi: output.abi,
        docs: output.docs,
    })
}
