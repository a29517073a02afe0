//! Circuit documents: the JSON wire/node schema.
//!
//! A document lists nodes and wires. Nodes carry their type tag, canvas
//! position, display name and declared input count; custom gates also name
//! the chip they were built from. Wires join an output pin index on one node
//! to an input pin index on another.
//!
//! # Example
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": "a", "type": "InputSwitch", "x": 0, "y": 0, "name": "A", "inputs": 0 },
//!     { "id": "n", "type": "NotGate", "x": 80, "y": 0, "name": "NOT", "inputs": 1 },
//!     { "id": "q", "type": "OutputBulb", "x": 160, "y": 0, "name": "Q", "inputs": 1 }
//!   ],
//!   "wires": [
//!     { "from_node": "a", "from_pin": 0, "to_node": "n", "to_pin": 0 },
//!     { "from_node": "n", "from_pin": 0, "to_node": "q", "to_pin": 0 }
//!   ]
//! }
//! ```
//!
//! Chip documents (the definitions behind custom gates) add `chip_name`
//! and the sorted `input_names` / `output_names` of their switches and bulbs.

mod library;
mod loader;

pub use library::{read_document, write_document, ChipSource, DirectoryLibrary, MemoryLibrary, NoChips};
pub use loader::{export_chip, load_circuit, save_circuit, LoadIssue, LoadReport};

pub(crate) use loader::Loader;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A serialized circuit or chip definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,

    #[serde(default)]
    pub wires: Vec<WireRecord>,

    /// Chip name, present on chip documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chip_name: Option<String>,

    /// Sorted names of the chip's input switches
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_names: Vec<String>,

    /// Sorted names of the chip's output bulbs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_names: Vec<String>,
}

impl CircuitDocument {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render the document as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One node entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default)]
    pub x: f64,

    #[serde(default)]
    pub y: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Declared input pin count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<usize>,

    /// Chip a custom gate was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chip_name: Option<String>,
}

/// One wire entry: output pin `from_pin` of `from_node` drives input pin
/// `to_pin` of `to_node`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub from_node: String,
    pub from_pin: usize,
    pub to_node: String,
    pub to_pin: usize,
}
