//! Per-contract ABI metadata: collection, collision checks and rendering.

use crate::ast::{EventParam, Mutability, Param};
use crate::errors::{Error, Result};
use crate::sig::{ErrorSig, EventSig, MethodSig};
use indexmap::IndexMap;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiItemKind {
    Function,
    Event,
    Error,
    Constructor,
    Receive,
    Fallback,
}

impl AbiItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiItemKind::Function => "function",
            AbiItemKind::Event => "event",
            AbiItemKind::Error => "error",
            AbiItemKind::Constructor => "constructor",
            AbiItemKind::Receive => "receive",
            AbiItemKind::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbiParam {
    pub name: String,
    pub ty: String,
    pub indexed: Option<bool>,
}

impl AbiParam {
    fn from_param(p: &Param) -> Self {
        Self {
            name: p.name.clone().unwrap_or_default(),
            ty: p.ty.canonical(),
            indexed: None,
        }
    }

    fn from_event_param(p: &EventParam) -> Self {
        Self {
            name: p.name.clone().unwrap_or_default(),
            ty: p.ty.canonical(),
            indexed: Some(p.indexed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbiItem {
    pub kind: AbiItemKind,
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
    pub mutability: Option<Mutability>,
    pub anonymous: bool,
    /// Four-byte selector for functions and errors.
    pub selector: Option<u32>,
    /// Full 32-byte topic for events, hex-rendered.
    pub topic: Option<String>,
}

impl AbiItem {
    pub fn function(sig: &MethodSig) -> Self {
        let kind = if sig.is_receive() {
            AbiItemKind::Receive
        } else if sig.is_fallback() {
            AbiItemKind::Fallback
        } else {
            AbiItemKind::Function
        };
        let selector = (kind == AbiItemKind::Function).then(|| sig.selector());
        Self {
            kind,
            name: sig.name.clone(),
            inputs: sig.params.iter().map(AbiParam::from_param).collect(),
            outputs: sig.returns.iter().map(AbiParam::from_param).collect(),
            mutability: Some(sig.mutability),
            anonymous: false,
            selector,
            topic: None,
        }
    }

    pub fn constructor(params: &[Param], payable: bool) -> Self {
        Self {
            kind: AbiItemKind::Constructor,
            name: String::new(),
            inputs: params.iter().map(AbiParam::from_param).collect(),
            outputs: Vec::new(),
            mutability: Some(if payable {
                Mutability::Payable
            } else {
                Mutability::NonPayable
            }),
            anonymous: false,
            selector: None,
            topic: None,
        }
    }

    pub fn event(sig: &EventSig) -> Self {
        Self {
            kind: AbiItemKind::Event,
            name: sig.name.clone(),
            inputs: sig.params.iter().map(AbiParam::from_event_param).collect(),
            outputs: Vec::new(),
            mutability: None,
            anonymous: sig.anonymous,
            selector: None,
            topic: Some(crate::word::to_hex(&sig.topic0())),
        }
    }

    pub fn error(sig: &ErrorSig) -> Self {
        Self {
            kind: AbiItemKind::Error,
            name: sig.name.clone(),
            inputs: sig.params.iter().map(AbiParam::from_param).collect(),
            outputs: Vec::new(),
            mutability: None,
            anonymous: false,
            selector: Some(sig.selector()),
            topic: None,
        }
    }

    fn input_types(&self) -> Vec<String> {
        self.inputs.iter().map(|p| p.ty.clone()).collect()
    }

    /// Human-readable signature string.
    pub fn signature(&self) -> String {
        match self.kind {
            AbiItemKind::Constructor => format!("constructor({})", self.input_types().join(",")),
            AbiItemKind::Receive => "receive()".to_string(),
            AbiItemKind::Fallback => "fallback()".to_string(),
            _ => format!("{}({})", self.name, self.input_types().join(",")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContractAbi {
    pub name: String,
    pub items: Vec<AbiItem>,
    pub license: Option<String>,
    pub compiler: Option<String>,
}

impl ContractAbi {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add an item, rejecting a duplicate (name, kind) and any
    /// (selector, kind) collision with prior entries.
    pub fn add(&mut self, item: AbiItem) -> Result<()> {
        for existing in &self.items {
            if existing.kind == item.kind && existing.name == item.name {
                return Err(Error::Resolution(format!(
                    "contract {}: duplicate {} {}",
                    self.name,
                    item.kind.as_str(),
                    item.signature()
                )));
            }
            if item.selector.is_some()
                && existing.kind == item.kind
                && existing.selector == item.selector
            {
                return Err(Error::Resolution(format!(
                    "contract {}: selector collision between {} and {}",
                    self.name,
                    existing.signature(),
                    item.signature()
                )));
            }
        }
        self.items.push(item);
        Ok(())
    }

    /// `selector signature` lines for functions, events and errors.
    pub fn hash_list(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| {
                if let Some(sel) = item.selector {
                    Some(format!("0x{:08x} {}", sel, item.signature()))
                } else {
                    item.topic
                        .as_ref()
                        .map(|t| format!("{} {}", t, item.signature()))
                }
            })
            .collect()
    }

    pub fn signatures(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| {
                let mut line = format!("{} {}", item.kind.as_str(), item.signature());
                if !item.outputs.is_empty() {
                    let outs: Vec<String> = item.outputs.iter().map(|p| p.ty.clone()).collect();
                    line.push_str(&format!(" returns ({})", outs.join(",")));
                }
                line
            })
            .collect()
    }

    /// Solidity-ABI JSON array.
    pub fn to_json(&self) -> Value {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| {
                let inputs: Vec<Value> = item.inputs.iter().map(param_json).collect();
                let outputs: Vec<Value> = item.outputs.iter().map(param_json).collect();
                let mut obj = json!({
                    "type": item.kind.as_str(),
                    "inputs": inputs,
                });
                let map = obj.as_object_mut().unwrap();
                if !item.name.is_empty() {
                    map.insert("name".into(), json!(item.name));
                }
                match item.kind {
                    AbiItemKind::Event => {
                        map.insert("anonymous".into(), json!(item.anonymous));
                    }
                    AbiItemKind::Error => {}
                    _ => {
                        map.insert("outputs".into(), json!(outputs));
                        if let Some(m) = item.mutability {
                            map.insert("stateMutability".into(), json!(m.as_abi_str()));
                        }
                    }
                }
                obj
            })
            .collect();
        Value::Array(items)
    }

    /// Solidity interface source stub.
    pub fn interface_source(&self) -> String {
        let mut out = String::new();
        if let Some(license) = &self.license {
            out.push_str(&format!("// SPDX-License-Identifier: {}\n", license));
        }
        if let Some(compiler) = &self.compiler {
            out.push_str(&format!("pragma solidity {};\n", compiler));
        }
        out.push_str(&format!("\ninterface I{} {{\n", self.name));
        for item in &self.items {
            let line = match item.kind {
                AbiItemKind::Event => {
                    let args = render_params(&item.inputs, true);
                    let tail = if item.anonymous { " anonymous;" } else { ";" };
                    wrap_line(&format!("event {}(", item.name), &args, &format!("){}", tail))
                }
                AbiItemKind::Error => {
                    let args = render_params(&item.inputs, false);
                    wrap_line(&format!("error {}(", item.name), &args, ");")
                }
                AbiItemKind::Constructor | AbiItemKind::Receive | AbiItemKind::Fallback => {
                    continue;
                }
                AbiItemKind::Function => {
                    let args = render_params(&item.inputs, false);
                    let mut tail = String::from(") external");
                    if let Some(m) = item.mutability {
                        match m {
                            Mutability::NonPayable => {}
                            other => {
                                tail.push(' ');
                                tail.push_str(other.as_abi_str());
                            }
                        }
                    }
                    if !item.outputs.is_empty() {
                        let outs = render_params(&item.outputs, false);
                        tail.push_str(&format!(" returns ({})", outs.join(", ")));
                    }
                    tail.push(';');
                    wrap_line(&format!("function {}(", item.name), &args, &tail)
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

fn param_json(p: &AbiParam) -> Value {
    let mut obj = json!({ "name": p.name, "type": p.ty });
    if let Some(indexed) = p.indexed {
        obj.as_object_mut().unwrap().insert("indexed".into(), json!(indexed));
    }
    obj
}

fn render_params(params: &[AbiParam], with_indexed: bool) -> Vec<String> {
    params
        .iter()
        .map(|p| {
            let mut s = p.ty.clone();
            if with_indexed && p.indexed == Some(true) {
                s.push_str(" indexed");
            }
            if !p.name.is_empty() {
                s.push(' ');
                s.push_str(&p.name);
            }
            s
        })
        .collect()
}

/// Render `prefix args tail` on one line, wrapping the argument list one per
/// line exactly when the single-line form exceeds 77 columns.
fn wrap_line(prefix: &str, args: &[String], tail: &str) -> String {
    let single = format!("    {}{}{}", prefix, args.join(", "), tail);
    if single.len() <= 77 {
        return single;
    }
    let mut out = format!("    {}\n", prefix);
    for (i, arg) in args.iter().enumerate() {
        let comma = if i + 1 < args.len() { "," } else { "" };
        out.push_str(&format!("        {}{}\n", arg, comma));
    }
    out.push_str(&format!("    {}", tail));
    out
}

/// All contracts of a compilation unit, keyed by contract name.
#[derive(Debug, Clone, Default)]
pub struct AbiCollector {
    pub contracts: IndexMap<String, ContractAbi>,
    pub license: Option<String>,
    pub compiler: Option<String>,
}

impl AbiCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contract_mut(&mut self, name: &str) -> &mut ContractAbi {
        if !self.contracts.contains_key(name) {
            let mut abi = ContractAbi::new(name);
            abi.license = self.license.clone();
            abi.compiler = self.compiler.clone();
            self.contracts.insert(name.to_string(), abi);
        }
        self.contracts.get_mut(name).unwrap()
    }

    pub fn set_license(&mut self, license: &str) {
        self.license = Some(license.to_string());
        for abi in self.contracts.values_mut() {
            abi.license = Some(license.to_string());
        }
    }

    pub fn set_compiler(&mut self, compiler: &str) {
        self.compiler = Some(compiler.to_string());
        for abi in self.contracts.values_mut() {
            abi.compiler = Some(compiler.to_string());
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (name, abi) in &self.contracts {
            obj.insert(name.clone(), abi.to_json());
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Visibility;
    use crate::types::AbiType;

    fn transfer() -> MethodSig {
        MethodSig {
            name: "transfer".into(),
            params: vec![
                Param {
                    ty: AbiType::parse("address").unwrap(),
                    name: Some("to".into()),
                },
                Param {
                    ty: AbiType::parse("uint").unwrap(),
                    name: Some("amount".into()),
                },
            ],
            returns: vec![Param {
                ty: AbiType::parse("bool").unwrap(),
                name: None,
            }],
            visibility: Visibility::External,
            mutability: Mutability::NonPayable,
            locked: false,
        }
    }

    #[test]
    fn duplicate_and_collision_checks() {
        let mut abi = ContractAbi::new("Token");
        abi.add(AbiItem::function(&transfer())).unwrap();
        assert!(abi.add(AbiItem::function(&transfer())).is_err());
    }

    #[test]
    fn hash_list_and_json_shapes() {
        let mut abi = ContractAbi::new("Token");
        abi.add(AbiItem::function(&transfer())).unwrap();
        let hashes = abi.hash_list();
        assert_eq!(hashes[0], "0xa9059cbb transfer(address,uint256)");
        let json = abi.to_json();
        assert_eq!(json[0]["type"], "function");
        assert_eq!(json[0]["name"], "transfer");
        assert_eq!(json[0]["stateMutability"], "nonpayable");
        assert_eq!(json[0]["inputs"][1]["type"], "uint256");
    }

    #[test]
    fn interface_stub_wraps_past_77_columns() {
        let mut abi = ContractAbi::new("Vault");
        let mut sig = transfer();
        sig.name = "settleWithExtremelyDescriptiveName".into();
        for i in 0..4 {
            sig.params.push(Param {
                ty: AbiType::parse("uint256").unwrap(),
                name: Some(format!("someRatherLongParameterName{}", i)),
            });
        }
        abi.add(AbiItem::function(&sig)).unwrap();
        let src = abi.interface_source();
        assert!(src.contains("interface IVault"));
        // Wrapped: one parameter per line.
        assert!(src.contains("someRatherLongParameterName0,\n"));

        let mut short = ContractAbi::new("Tiny");
        short.add(AbiItem::function(&transfer())).unwrap();
        let short_src = short.interface_source();
        assert!(short_src.contains("function transfer(address to, uint256 amount) external returns (bool);"));
    }
}
