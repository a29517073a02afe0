//! Connection validation for the editing boundary.

use crate::error::{GatesimError, Result};

use super::types::{PinDirection, PinRef};
use super::Circuit;

/// Validate a wire before it is added to a circuit.
///
/// Checks:
/// - Both pins exist
/// - The pins belong to different nodes
/// - One pin is an output and the other an input
///
/// [`Circuit::connect`] itself accepts any pair; this is the check an editor
/// runs first.
pub fn validate_connection(circuit: &Circuit, a: PinRef, b: PinRef) -> Result<()> {
    for pin in [a, b] {
        if circuit.pin(pin).is_none() {
            return Err(GatesimError::PinNotFound { pin });
        }
    }

    if a.node == b.node {
        return Err(GatesimError::invalid_connection(
            a,
            b,
            "pins belong to the same node",
        ));
    }

    if a.direction == b.direction {
        let kind = match a.direction {
            PinDirection::Input => "inputs",
            PinDirection::Output => "outputs",
        };
        return Err(GatesimError::invalid_connection(
            a,
            b,
            format!("both pins are {kind}"),
        ));
    }

    Ok(())
}

/// Order a validated pin pair as (driver, receiver).
pub fn orient(a: PinRef, b: PinRef) -> (PinRef, PinRef) {
    if a.is_input() {
        (b, a)
    } else {
        (a, b)
    }
}
