//! # Gatesim Core
//!
//! A discrete-event simulator for digital logic circuits.
//!
//! This library provides:
//! - A three-valued logic model (LOW, HIGH, UNDEFINED) on node pins
//! - Combinational gates, switches, bulbs, tri-state buffers and
//!   seven-segment parts
//! - Custom gates: hierarchical components that simulate a nested circuit
//! - A background simulation engine with a time-ordered event queue
//! - JSON circuit documents and a chip library
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Pins, nodes and the circuit graph
//! - [`components`] - Gate variants and their evaluation rules
//! - [`document`] - Circuit documents, loading, saving and chip libraries
//! - [`engine`] - Event scheduling and the simulation loop
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! gatesim adder.json --library ./library --set A=1 --set B=1
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use std::path::Path;
//!
//! use gatesim_core::document::{load_circuit, read_document, DirectoryLibrary};
//! use gatesim_core::SimulationEngine;
//!
//! # fn main() -> gatesim_core::Result<()> {
//! let library = DirectoryLibrary::new("library");
//! let doc = read_document(Path::new("adder.json"))?;
//! let (circuit, _report) = load_circuit(&doc, &library);
//!
//! let mut engine = SimulationEngine::new(circuit);
//! engine.resync();
//! engine.run_until_idle(10_000)?;
//! # Ok(())
//! # }
//! ```

pub mod circuit;
pub mod components;
pub mod document;
pub mod engine;
pub mod error;

// Re-export main types for convenience
pub use circuit::{Circuit, LogicValue, Node, NodeId, PinRef};
pub use components::{CustomGate, Gate};
pub use engine::{EngineConfig, SimulationEngine};
pub use error::{GatesimError, Result};
