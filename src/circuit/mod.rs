//! Circuit graph representation and validation.
//!
//! This module provides the logic-value model ([`LogicValue`], [`Pin`],
//! [`Node`]) and the [`Circuit`] container that owns nodes and mediates
//! pin-to-pin wiring, including cascading cleanup when a node is removed.

mod graph;
mod node;
mod types;
mod validate;

pub use graph::{Circuit, Propagation, Relaxation};
pub use node::{Node, Pin};
pub use types::*;
pub use validate::{orient, validate_connection};
