//! Gate models for logic simulation.
//!
//! This module provides every supported gate variant:
//! - Combinational: AND, OR, NOT, XOR, NAND, NOR
//! - Controls: Input Switch, Output Bulb
//! - Tri-state buffer
//! - Seven-segment decoder and display
//! - Hierarchical: custom gates built from a nested circuit
//!
//! The variant set is closed. Each variant maps the current input values of
//! its node to output values in [`Gate::evaluate`].

mod controls;
mod custom;
mod logic;
mod segment;
mod tristate;

pub use controls::{InputSwitch, OutputBulb};
pub use custom::{CustomGate, MAX_RELAXATION_ROUNDS};
pub use logic::{and, nand, nor, not, or, xor};
pub use segment::{decode_bcd, SEGMENT_TABLE};
pub use tristate::tri_state;

use crate::circuit::LogicValue;
use crate::error::{GatesimError, Result};

/// A gate variant together with any state it keeps between evaluations.
#[derive(Debug)]
pub enum Gate {
    And,
    Or,
    Not,
    Xor,
    Nand,
    Nor,
    InputSwitch(InputSwitch),
    OutputBulb(OutputBulb),
    TriStateBuffer,
    SevenSegmentDecoder,
    SevenSegmentDisplay,
    Custom(Box<CustomGate>),
}

impl Gate {
    /// Build a primitive gate from its document type tag.
    ///
    /// `CustomGate` is not buildable from a tag alone; it needs a chip
    /// definition, see [`CustomGate::new`].
    pub fn from_type_tag(tag: &str) -> Result<Self> {
        let gate = match tag {
            "AndGate" => Gate::And,
            "OrGate" => Gate::Or,
            "NotGate" => Gate::Not,
            "XorGate" => Gate::Xor,
            "NandGate" => Gate::Nand,
            "NorGate" => Gate::Nor,
            "InputSwitch" => Gate::InputSwitch(InputSwitch::new()),
            "OutputBulb" => Gate::OutputBulb(OutputBulb::new()),
            "TriStateBuffer" => Gate::TriStateBuffer,
            "SevenSegmentDecoder" => Gate::SevenSegmentDecoder,
            "SevenSegmentDisplay" => Gate::SevenSegmentDisplay,
            _ => {
                return Err(GatesimError::UnknownNodeType {
                    tag: tag.to_string(),
                })
            }
        };
        Ok(gate)
    }

    /// Document type tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Gate::And => "AndGate",
            Gate::Or => "OrGate",
            Gate::Not => "NotGate",
            Gate::Xor => "XorGate",
            Gate::Nand => "NandGate",
            Gate::Nor => "NorGate",
            Gate::InputSwitch(_) => "InputSwitch",
            Gate::OutputBulb(_) => "OutputBulb",
            Gate::TriStateBuffer => "TriStateBuffer",
            Gate::SevenSegmentDecoder => "SevenSegmentDecoder",
            Gate::SevenSegmentDisplay => "SevenSegmentDisplay",
            Gate::Custom(_) => "CustomGate",
        }
    }

    /// Display name given to fresh nodes of this variant.
    pub fn default_name(&self) -> &str {
        match self {
            Gate::And => "AND",
            Gate::Or => "OR",
            Gate::Not => "NOT",
            Gate::Xor => "XOR",
            Gate::Nand => "NAND",
            Gate::Nor => "NOR",
            Gate::InputSwitch(_) => "Input",
            Gate::OutputBulb(_) => "Output",
            Gate::TriStateBuffer => "BUF",
            Gate::SevenSegmentDecoder => "BCD",
            Gate::SevenSegmentDisplay => "7SEG",
            Gate::Custom(c) => c.chip_name(),
        }
    }

    /// Number of input pins.
    pub fn input_count(&self) -> usize {
        match self {
            Gate::And | Gate::Or | Gate::Xor | Gate::Nand | Gate::Nor => 2,
            Gate::Not | Gate::OutputBulb(_) => 1,
            Gate::InputSwitch(_) => 0,
            Gate::TriStateBuffer => 2,
            Gate::SevenSegmentDecoder => 4,
            Gate::SevenSegmentDisplay => 7,
            Gate::Custom(c) => c.input_count(),
        }
    }

    /// Number of output pins.
    pub fn output_count(&self) -> usize {
        match self {
            Gate::OutputBulb(_) => 0,
            Gate::SevenSegmentDecoder => 7,
            Gate::Custom(c) => c.output_count(),
            _ => 1,
        }
    }

    /// Map input values to output values, updating any kept state.
    ///
    /// Errors carry a message only; [`Node::compute`](crate::circuit::Node::compute)
    /// attaches the node name.
    pub fn evaluate(
        &mut self,
        inputs: &[LogicValue],
    ) -> std::result::Result<Vec<LogicValue>, String> {
        let arity = self.input_count();
        if inputs.len() < arity {
            return Err(format!(
                "{} expects {} inputs, got {}",
                self.type_tag(),
                arity,
                inputs.len()
            ));
        }

        let outputs = match self {
            Gate::And => vec![and(inputs[0], inputs[1])],
            Gate::Or => vec![or(inputs[0], inputs[1])],
            Gate::Not => vec![not(inputs[0])],
            Gate::Xor => vec![xor(inputs[0], inputs[1])],
            Gate::Nand => vec![nand(inputs[0], inputs[1])],
            Gate::Nor => vec![nor(inputs[0], inputs[1])],
            Gate::InputSwitch(s) => vec![s.state()],
            Gate::OutputBulb(b) => {
                b.sense(inputs[0]);
                Vec::new()
            }
            Gate::TriStateBuffer => vec![tri_state(inputs[0], inputs[1])],
            Gate::SevenSegmentDecoder => {
                decode_bcd([inputs[0], inputs[1], inputs[2], inputs[3]]).to_vec()
            }
            Gate::SevenSegmentDisplay => {
                vec![LogicValue::from_bool(inputs[..7].iter().any(|v| v.is_high()))]
            }
            Gate::Custom(c) => c.evaluate(inputs)?,
        };
        Ok(outputs)
    }

    /// Whether this is an input switch.
    pub fn is_switch(&self) -> bool {
        matches!(self, Gate::InputSwitch(_))
    }

    /// Whether this is an output bulb.
    pub fn is_bulb(&self) -> bool {
        matches!(self, Gate::OutputBulb(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogicValue::{High, Low, Undefined};

    #[test]
    fn test_type_tags_round_trip() {
        for tag in [
            "AndGate",
            "OrGate",
            "NotGate",
            "XorGate",
            "NandGate",
            "NorGate",
            "InputSwitch",
            "OutputBulb",
            "TriStateBuffer",
            "SevenSegmentDecoder",
            "SevenSegmentDisplay",
        ] {
            assert_eq!(Gate::from_type_tag(tag).unwrap().type_tag(), tag);
        }
        assert!(matches!(
            Gate::from_type_tag("CustomGate"),
            Err(GatesimError::UnknownNodeType { .. })
        ));
        assert!(Gate::from_type_tag("FluxCapacitor").is_err());
    }

    #[test]
    fn test_arity() {
        assert_eq!(Gate::Not.input_count(), 1);
        assert_eq!(Gate::SevenSegmentDecoder.output_count(), 7);
        assert_eq!(Gate::SevenSegmentDisplay.input_count(), 7);
        assert_eq!(Gate::OutputBulb(OutputBulb::new()).output_count(), 0);
        assert_eq!(Gate::InputSwitch(InputSwitch::new()).input_count(), 0);
    }

    #[test]
    fn test_evaluate_short_inputs_is_a_fault() {
        let err = Gate::And.evaluate(&[High]).unwrap_err();
        assert!(err.contains("expects 2 inputs"));
    }

    #[test]
    fn test_display_lit_when_any_segment_high() {
        let mut display = Gate::SevenSegmentDisplay;
        let mut segs = [Low; 7];
        assert_eq!(display.evaluate(&segs).unwrap(), vec![Low]);
        segs[4] = High;
        assert_eq!(display.evaluate(&segs).unwrap(), vec![High]);
        assert_eq!(display.evaluate(&[Undefined; 7]).unwrap(), vec![Low]);
    }

    #[test]
    fn test_bulb_has_no_outputs() {
        let mut gate = Gate::OutputBulb(OutputBulb::new());
        assert!(gate.evaluate(&[High]).unwrap().is_empty());
        match gate {
            Gate::OutputBulb(b) => assert!(b.is_active()),
            _ => unreachable!(),
        }
    }
}
