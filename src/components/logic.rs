//! Combinational gates: AND, OR, NOT, XOR, NAND, NOR.
//!
//! Every gate reads `Undefined` as a non-HIGH input. AND and OR therefore
//! never produce `Undefined`: an undefined input forces AND low, and forces
//! OR low unless the other input is high. NOT of `Undefined` is HIGH.
//! Saved circuits rely on this policy, so it must not drift toward
//! `Undefined` propagation.

use crate::circuit::LogicValue;

pub fn and(a: LogicValue, b: LogicValue) -> LogicValue {
    LogicValue::from_bool(a.is_high() && b.is_high())
}

pub fn or(a: LogicValue, b: LogicValue) -> LogicValue {
    LogicValue::from_bool(a.is_high() || b.is_high())
}

pub fn not(a: LogicValue) -> LogicValue {
    LogicValue::from_bool(!a.is_high())
}

pub fn xor(a: LogicValue, b: LogicValue) -> LogicValue {
    LogicValue::from_bool(a.is_high() != b.is_high())
}

pub fn nand(a: LogicValue, b: LogicValue) -> LogicValue {
    not(and(a, b))
}

pub fn nor(a: LogicValue, b: LogicValue) -> LogicValue {
    not(or(a, b))
}
