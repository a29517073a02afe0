//! Conversion between circuit documents and live circuits.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use super::{ChipSource, CircuitDocument, NodeRecord, WireRecord};
use crate::circuit::{Circuit, Node, NodeId, PinRef};
use crate::components::{CustomGate, Gate};
use crate::error::{GatesimError, Result};

/// Something the loader skipped or degraded.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadIssue {
    /// Node type tag not recognised; node skipped
    UnknownNodeType { node: String, tag: String },
    /// Custom gate could not be built; node skipped
    MissingChip {
        node: String,
        chip: String,
        reason: String,
    },
    /// Same node id listed twice; later entry skipped
    DuplicateNode { node: String },
    /// Declared input count disagrees with the gate; gate arity used
    InputCountMismatch {
        node: String,
        declared: usize,
        actual: usize,
    },
    /// Wire names a node that was not loaded; wire skipped
    UnknownWireNode { wire: usize, node: String },
    /// Wire names a pin the node does not have; wire skipped
    PinOutOfRange {
        wire: usize,
        node: String,
        pin: usize,
    },
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadIssue::UnknownNodeType { node, tag } => {
                write!(f, "node {node}: unknown type '{tag}'")
            }
            LoadIssue::MissingChip { node, chip, reason } => {
                write!(f, "node {node}: chip '{chip}' unavailable ({reason})")
            }
            LoadIssue::DuplicateNode { node } => write!(f, "node {node}: duplicate id"),
            LoadIssue::InputCountMismatch {
                node,
                declared,
                actual,
            } => write!(
                f,
                "node {node}: declares {declared} inputs, gate has {actual}"
            ),
            LoadIssue::UnknownWireNode { wire, node } => {
                write!(f, "wire {wire}: unknown node {node}")
            }
            LoadIssue::PinOutOfRange { wire, node, pin } => {
                write!(f, "wire {wire}: node {node} has no pin {pin}")
            }
        }
    }
}

/// Everything skipped or degraded while loading a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    /// True when the document loaded without any issue.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, issue: LoadIssue) {
        warn!(%issue, "skipping document entry");
        self.issues.push(issue);
    }
}

/// Build a circuit from a document, resolving custom gates through `source`.
///
/// Loading never fails outright: bad nodes and wires are skipped and listed
/// in the returned report.
pub fn load_circuit(doc: &CircuitDocument, source: &dyn ChipSource) -> (Circuit, LoadReport) {
    Loader::new(source).load(doc)
}

/// Serialize a circuit.
///
/// Wires are found by walking input pins, so each output-to-input wire is
/// written exactly once.
pub fn save_circuit(circuit: &Circuit) -> CircuitDocument {
    let nodes = circuit
        .nodes()
        .map(|node| NodeRecord {
            id: node.id().to_string(),
            node_type: node.gate().type_tag().to_string(),
            x: node.position.0,
            y: node.position.1,
            name: Some(node.name().to_string()),
            inputs: Some(node.inputs().len()),
            source_chip_name: match node.gate() {
                Gate::Custom(c) => Some(c.chip_name().to_string()),
                _ => None,
            },
        })
        .collect();

    let mut wires = Vec::new();
    for node in circuit.nodes() {
        for pin in node.inputs() {
            for peer in pin.connections() {
                if peer.is_input() || !circuit.contains(peer.node) {
                    continue;
                }
                wires.push(WireRecord {
                    from_node: peer.node.to_string(),
                    from_pin: peer.index,
                    to_node: node.id().to_string(),
                    to_pin: pin.index(),
                });
            }
        }
    }

    CircuitDocument {
        nodes,
        wires,
        ..Default::default()
    }
}

/// Package a circuit as a chip definition.
///
/// The chip's external pins are its switches and bulbs, ordered by name.
pub fn export_chip(circuit: &Circuit, chip_name: &str) -> CircuitDocument {
    let names = |ids: Vec<NodeId>| -> Vec<String> {
        ids.into_iter()
            .filter_map(|id| circuit.node(id))
            .map(|n| n.name().to_string())
            .collect()
    };

    CircuitDocument {
        chip_name: Some(chip_name.to_string()),
        input_names: names(circuit.sorted_by_name(|n| n.gate().is_switch())),
        output_names: names(circuit.sorted_by_name(|n| n.gate().is_bulb())),
        ..save_circuit(circuit)
    }
}

/// Document loader that tracks which chips are being expanded, so a chip
/// that contains itself is rejected instead of recursing forever.
pub(crate) struct Loader<'a> {
    source: &'a dyn ChipSource,
    expanding: Vec<String>,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(source: &'a dyn ChipSource) -> Self {
        Self {
            source,
            expanding: Vec::new(),
        }
    }

    pub(crate) fn load(&mut self, doc: &CircuitDocument) -> (Circuit, LoadReport) {
        let mut circuit = Circuit::new();
        let mut report = LoadReport::default();
        let mut ids: HashMap<&str, NodeId> = HashMap::new();

        for record in &doc.nodes {
            if ids.contains_key(record.id.as_str()) {
                report.push(LoadIssue::DuplicateNode {
                    node: record.id.clone(),
                });
                continue;
            }

            let gate = match self.gate_for(record) {
                Ok(gate) => gate,
                Err(issue) => {
                    report.push(issue);
                    continue;
                }
            };

            if let Some(declared) = record.inputs {
                if declared != gate.input_count() {
                    report.push(LoadIssue::InputCountMismatch {
                        node: record.id.clone(),
                        declared,
                        actual: gate.input_count(),
                    });
                }
            }

            let id = NodeId::parse(&record.id)
                .filter(|id| !circuit.contains(*id))
                .unwrap_or_default();
            let mut node = Node::with_id(id, gate).at(record.x, record.y);
            if let Some(name) = &record.name {
                node.set_name(name.clone());
            }
            circuit.add_node(node);
            ids.insert(record.id.as_str(), id);
        }

        for (i, wire) in doc.wires.iter().enumerate() {
            let Some(&from) = ids.get(wire.from_node.as_str()) else {
                report.push(LoadIssue::UnknownWireNode {
                    wire: i,
                    node: wire.from_node.clone(),
                });
                continue;
            };
            let Some(&to) = ids.get(wire.to_node.as_str()) else {
                report.push(LoadIssue::UnknownWireNode {
                    wire: i,
                    node: wire.to_node.clone(),
                });
                continue;
            };

            let source = PinRef::output(from, wire.from_pin);
            let target = PinRef::input(to, wire.to_pin);
            if let Err(e) = circuit.connect(source, target) {
                let (node, pin) = match e {
                    GatesimError::PinNotFound { pin } if pin == source => {
                        (wire.from_node.clone(), wire.from_pin)
                    }
                    _ => (wire.to_node.clone(), wire.to_pin),
                };
                report.push(LoadIssue::PinOutOfRange { wire: i, node, pin });
            }
        }

        (circuit, report)
    }

    fn gate_for(&mut self, record: &NodeRecord) -> std::result::Result<Gate, LoadIssue> {
        if record.node_type != "CustomGate" {
            return Gate::from_type_tag(&record.node_type).map_err(|_| LoadIssue::UnknownNodeType {
                node: record.id.clone(),
                tag: record.node_type.clone(),
            });
        }

        let chip = record
            .source_chip_name
            .as_deref()
            .or(record.name.as_deref())
            .unwrap_or_default();

        self.custom_gate(chip)
            .map(|c| Gate::Custom(Box::new(c)))
            .map_err(|e| LoadIssue::MissingChip {
                node: record.id.clone(),
                chip: chip.to_string(),
                reason: e.to_string(),
            })
    }

    fn custom_gate(&mut self, name: &str) -> Result<CustomGate> {
        self.check_recursion(name)?;
        let doc = self.source.load_chip(name)?;
        self.build_chip(name, &doc)
    }

    /// Expand a chip definition into a custom gate.
    pub(crate) fn build_chip(&mut self, name: &str, doc: &CircuitDocument) -> Result<CustomGate> {
        self.check_recursion(name)?;

        self.expanding.push(name.to_string());
        let (circuit, report) = self.load(doc);
        self.expanding.pop();

        if !report.is_clean() {
            debug!(chip = name, issues = report.issues.len(), "chip loaded with issues");
        }

        Ok(CustomGate::from_circuit(
            name,
            circuit,
            doc.input_names.len(),
            doc.output_names.len(),
        ))
    }

    fn check_recursion(&self, name: &str) -> Result<()> {
        if self.expanding.iter().any(|n| n == name) {
            let mut chain = self.expanding.clone();
            chain.push(name.to_string());
            return Err(GatesimError::RecursiveChip {
                name: name.to_string(),
                chain: chain.join(" -> "),
            });
        }
        Ok(())
    }
}
