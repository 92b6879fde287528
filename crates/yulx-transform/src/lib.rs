/*! Lowers the YulX dialect to plain Yul.
 *
 * A single post-order pass over the parsed tree. The transformer keeps a
 * stack of scopes; declarations register symbols, uses resolve through the
 * chain, and helper dependencies flush into the enclosing code block when
 * its scope closes. What comes out the other side is plain Yul plus the
 * collected ABI metadata.
 */

mod builtins;
mod context;
mod events;
mod expressions;
mod fold;
mod interface;
mod intrinsics;
mod macros;
mod methods;
mod preprocessor;
mod statements;
mod throws;

pub use builtins::BuiltinLevel;
pub use context::Transformer;

use std::collections::BTreeMap;
use tracing::debug;
use yulx_core::abi::AbiCollector;
use yulx_core::ast::Node;
use yulx_core::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct Options {
    pub builtin: BuiltinLevel,
    pub debug: bool,
    /// Injected macro constants, the `-D NAME=expr` surface.
    pub macros: Vec<(String, String)>,
    /// Hard-fork name; defaults to the newest known fork.
    pub hardfork: Option<String>,
    pub solc_version: Option<String>,
    pub yulc_version: Option<String>,
    /// Extract a single object block by name after rewriting.
    pub pick: Option<String>,
    /// Fold (filename, contents) pairs into a `.metadata` blob.
    pub metadata: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            builtin: BuiltinLevel::Full,
            debug: false,
            macros: Vec::new(),
            hardfork: None,
            solc_version: None,
            yulc_version: None,
            pick: None,
            metadata: false,
        }
    }
}

#[derive(Debug)]
pub struct Output {
    /// Plain-Yul tree, ready for the serializer.
    pub ast: Node,
    pub abi: AbiCollector,
    /// Doc comments collected by the stripper, keyed by ending line.
    pub docs: BTreeMap<usize, String>,
}

/// Run the whole front/middle end over one source file.
pub fn transform(source: &str, file: &str, options: Options) -> Result<Output> {
    let stripped = yulx_parser::strip(source, file)?;
    let root = yulx_parser::Parser::new(&stripped.code, file).parse_root()?;
    debug!(file, "parsed dialect source");

    let mut tx = Transformer::new(options)?;
    tx.record_metadata(file, source);
    let ast = tx.run(root)?;
    let ast = tx.pick(ast)?;
    debug!(contracts = tx.abi.contracts.len(), "transform complete");

    Ok(Output {
        ast,
        abi: tx.abi,
        docs: stripped.docs,
    })
}

/// The `pick` option narrows the output to one object block.
impl Transformer {
    fn pick(&self, ast: Node) -> Result<Node> {
        let Some(wanted) = self.opts.pick.clone() else {
            return Ok(ast);
        };
        match ast {
            Node::Root { statements } => {
                let found = statements.into_iter().find(|s| {
                    matches!(s, Node::ObjectBlock { name, .. } if *name == wanted)
                });
                match found {
                    Some(object) => Ok(Node::Root {
                        statements: vec![object],
                    }),
                    None => Err(Error::Resolution(format!(
                        "no object named {:?} to pick",
                        wanted
                    ))),
                }
            }
            other => Ok(other),
        }
    }
}
