//! Discrete-event simulation engine.
//!
//! This module drives re-evaluation of circuit nodes in time order.
//!
//! ## Event model
//!
//! An event asks for one node to be recomputed at a given tick. Events are
//! ordered by `(time, sequence)`, so events for the same tick run in the
//! order they were scheduled. Processing an event:
//!
//! 1. moves the clock up to the event's tick
//! 2. recomputes the node
//! 3. pushes every changed output onto the connected pins
//! 4. schedules each driven node one gate delay later
//!
//! A toggle therefore ripples through a combinational network one hop per
//! tick. Feedback loops that never settle keep scheduling events forever;
//! that is a property of the circuit, not an error.
//!
//! ## Edits
//!
//! The engine owns its circuit. Edits arrive as [`Command`]s and are applied
//! between events, ahead of any pending event.

mod command;
mod scheduler;
mod simulator;

pub use command::Command;
pub use scheduler::{Event, EventQueue};
pub use simulator::{EngineConfig, EngineHandle, SimulationEngine};
