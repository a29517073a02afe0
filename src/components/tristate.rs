//! Tri-state buffer.

use crate::circuit::LogicValue;

/// Evaluate a tri-state buffer with data input `d` and enable `en`.
///
/// A disabled buffer is high-impedance, modelled as `Undefined`. Any
/// undefined input also yields `Undefined`.
pub fn tri_state(d: LogicValue, en: LogicValue) -> LogicValue {
    match (d, en) {
        (LogicValue::Undefined, _) | (_, LogicValue::Undefined) => LogicValue::Undefined,
        (d, LogicValue::High) => d,
        _ => LogicValue::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogicValue::{High, Low, Undefined};

    #[test]
    fn test_tri_state() {
        assert_eq!(tri_state(High, Low), Undefined);
        assert_eq!(tri_state(Low, Low), Undefined);
        assert_eq!(tri_state(High, High), High);
        assert_eq!(tri_state(Low, High), Low);
        assert_eq!(tri_state(Undefined, High), Undefined);
        assert_eq!(tri_state(High, Undefined), Undefined);
    }
}
