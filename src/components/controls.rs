//! Control components: Input Switch and Output Bulb.

use crate::circuit::LogicValue;

/// A user-operated switch.
///
/// Has no inputs and one output that mirrors the commanded state.
#[derive(Debug, Clone)]
pub struct InputSwitch {
    state: LogicValue,
}

impl InputSwitch {
    /// Create a new switch, initially LOW.
    pub fn new() -> Self {
        Self {
            state: LogicValue::Low,
        }
    }

    /// Create a switch in a given position.
    pub fn with_state(high: bool) -> Self {
        Self {
            state: LogicValue::from_bool(high),
        }
    }

    /// Get the commanded state.
    pub fn state(&self) -> LogicValue {
        self.state
    }

    /// Set the switch position.
    pub fn set_state(&mut self, high: bool) {
        self.state = LogicValue::from_bool(high);
    }

    /// Drive the switch with an arbitrary value.
    ///
    /// Custom gates feed their own input pins through here, so the value
    /// may be `Undefined`.
    pub fn drive(&mut self, value: LogicValue) {
        self.state = value;
    }

    /// Toggle the switch. Anything but LOW becomes LOW.
    pub fn toggle(&mut self) {
        self.state = if self.state == LogicValue::Low {
            LogicValue::High
        } else {
            LogicValue::Low
        };
    }
}

impl Default for InputSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// An indicator lamp with one input and no outputs.
#[derive(Debug, Clone, Default)]
pub struct OutputBulb {
    active: bool,
}

impl OutputBulb {
    /// Create a new bulb, initially dark.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the bulb saw HIGH on its last evaluation.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(super) fn sense(&mut self, input: LogicValue) {
        self.active = input.is_high();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_toggle() {
        let mut s = InputSwitch::new();
        assert_eq!(s.state(), LogicValue::Low);
        s.toggle();
        assert_eq!(s.state(), LogicValue::High);
        s.toggle();
        assert_eq!(s.state(), LogicValue::Low);

        s.drive(LogicValue::Undefined);
        s.toggle();
        assert_eq!(s.state(), LogicValue::Low);
    }

    #[test]
    fn test_bulb_only_lit_by_high() {
        let mut b = OutputBulb::new();
        b.sense(LogicValue::High);
        assert!(b.is_active());
        b.sense(LogicValue::Undefined);
        assert!(!b.is_active());
        b.sense(LogicValue::Low);
        assert!(!b.is_active());
    }
}
