//! Edit commands.
//!
//! While an engine runs, every change to its circuit travels as a
//! [`Command`] and is applied by the engine between events. Each command
//! names the nodes whose inputs it disturbed, and the engine schedules them
//! immediately.

use tracing::debug;

use crate::circuit::{orient, validate_connection, Circuit, LogicValue, Node, NodeId, PinRef};
use crate::components::{Gate, InputSwitch};
use crate::error::{GatesimError, Result};

/// A change to the simulated circuit.
#[derive(Debug)]
pub enum Command {
    /// Insert a node (its id is already known to the sender)
    AddNode(Node),
    /// Remove a node and all its wires
    RemoveNode(NodeId),
    /// Wire an output pin to an input pin, in either order
    Connect(PinRef, PinRef),
    /// Remove a wire
    Disconnect(PinRef, PinRef),
    /// Flip an input switch
    Toggle(NodeId),
    /// Put an input switch in a given position
    SetSwitch(NodeId, bool),
    /// Push every driver's value onto its wires and re-evaluate every node
    Resync,
}

impl Command {
    /// Apply the command, returning the nodes to schedule.
    pub fn apply(self, circuit: &mut Circuit) -> Result<Vec<NodeId>> {
        match self {
            Command::AddNode(node) => Ok(vec![circuit.add_node(node)]),

            Command::RemoveNode(id) => {
                let node = circuit.node(id).ok_or(GatesimError::NodeNotFound { node: id })?;
                let receivers: Vec<PinRef> = node
                    .outputs()
                    .iter()
                    .flat_map(|p| p.connections().iter().copied())
                    .filter(|p| p.is_input() && p.node != id)
                    .collect();

                circuit.remove_node(id);
                Ok(release_inputs(circuit, &receivers))
            }

            Command::Connect(a, b) => {
                validate_connection(circuit, a, b)?;
                let (driver, receiver) = orient(a, b);
                if !circuit.connect(driver, receiver)? {
                    return Ok(Vec::new());
                }
                let value = circuit
                    .pin(driver)
                    .map_or(LogicValue::Undefined, |p| p.value());
                circuit.set_pin_value(receiver, value)?;
                Ok(vec![driver.node, receiver.node])
            }

            Command::Disconnect(a, b) => {
                if !circuit.disconnect(a, b)? {
                    return Ok(Vec::new());
                }
                let receivers: Vec<PinRef> = [a, b].into_iter().filter(PinRef::is_input).collect();
                Ok(release_inputs(circuit, &receivers))
            }

            Command::Toggle(id) => {
                switch_mut(circuit, id)?.toggle();
                Ok(vec![id])
            }

            Command::SetSwitch(id, high) => {
                switch_mut(circuit, id)?.set_state(high);
                Ok(vec![id])
            }

            Command::Resync => {
                let driven = circuit.sync_wires();
                debug!(driven = driven.len(), "resynced wires");
                Ok(circuit.node_ids().to_vec())
            }
        }
    }
}

/// Reset input pins that have lost their last driver and return their owners.
fn release_inputs(circuit: &mut Circuit, pins: &[PinRef]) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    for &pin in pins {
        let floating = circuit.pin(pin).map_or(false, |p| p.connections().is_empty());
        if floating {
            circuit.set_pin_value(pin, LogicValue::Undefined).ok();
        }
        if circuit.contains(pin.node) && !nodes.contains(&pin.node) {
            nodes.push(pin.node);
        }
    }
    nodes
}

fn switch_mut(circuit: &mut Circuit, id: NodeId) -> Result<&mut InputSwitch> {
    match circuit.node_mut(id).map(|n| n.gate_mut()) {
        Some(Gate::InputSwitch(switch)) => Ok(switch),
        Some(_) => Err(GatesimError::NotASwitch { node: id }),
        None => Err(GatesimError::NodeNotFound { node: id }),
    }
}
