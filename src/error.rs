//! Error types for the Gatesim logic simulator.
//!
//! This module provides a unified error type [`GatesimError`] that covers
//! all error conditions that can occur while editing a circuit, loading
//! circuit documents and chip libraries, and running the simulation engine.
//!
//! Most structural problems in a document are not errors at all: the loader
//! skips the offending node or wire, logs a warning and records it in a
//! [`LoadReport`](crate::document::LoadReport).

use thiserror::Error;

use crate::circuit::{NodeId, PinRef};

/// Result type alias using [`GatesimError`].
pub type Result<T> = std::result::Result<T, GatesimError>;

/// Unified error type for all Gatesim operations.
#[derive(Error, Debug)]
pub enum GatesimError {
    // ============ Circuit Model Errors ============
    /// Node not found in circuit
    #[error("Node {node} not found in circuit")]
    NodeNotFound { node: NodeId },

    /// Pin reference does not resolve to a pin
    #[error("Pin {pin} not found in circuit")]
    PinNotFound { pin: PinRef },

    /// Connection rejected by the edit boundary
    #[error("Cannot connect {from} to {to}: {message}")]
    InvalidConnection {
        from: PinRef,
        to: PinRef,
        message: String,
    },

    /// No input switch carries the given display name
    #[error("No input switch named '{name}'")]
    SwitchNotFound { name: String },

    /// Switch command sent to a node that is not a switch
    #[error("Node {node} is not an input switch")]
    NotASwitch { node: NodeId },

    // ============ Evaluation Errors ============
    /// A gate could not evaluate its inputs
    #[error("Evaluation fault in node '{node}': {message}")]
    EvaluationFault { node: String, message: String },

    // ============ Document Errors ============
    /// Unknown node type tag in a circuit document
    #[error("Unknown node type '{tag}'")]
    UnknownNodeType { tag: String },

    /// Custom gate references a chip the library does not have
    #[error("Chip '{name}' not found in library")]
    ChipNotFound { name: String },

    /// Chip contains itself, directly or through other chips
    #[error("Chip '{name}' contains itself (via {chain})")]
    RecursiveChip { name: String, chain: String },

    /// Document is not valid JSON or does not match the schema
    #[error("Malformed circuit document: {source}")]
    MalformedDocument {
        #[from]
        source: serde_json::Error,
    },

    // ============ Engine Errors ============
    /// Synchronous stepping while the background loop owns the queue
    #[error("Simulation engine is running; stop it before stepping manually")]
    EngineRunning,

    /// Background loop could not be spawned or panicked
    #[error("Simulation thread error: {message}")]
    EngineThread { message: String },

    // ============ I/O Errors ============
    /// Error reading a circuit or chip file
    #[error("Failed to read '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a circuit or chip file
    #[error("Failed to write '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GatesimError {
    /// Create an evaluation fault
    pub fn evaluation(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EvaluationFault {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create an invalid connection error
    pub fn invalid_connection(from: PinRef, to: PinRef, message: impl Into<String>) -> Self {
        Self::InvalidConnection {
            from,
            to,
            message: message.into(),
        }
    }

    /// Create a chip-not-found error
    pub fn chip_not_found(name: impl Into<String>) -> Self {
        Self::ChipNotFound { name: name.into() }
    }
}
