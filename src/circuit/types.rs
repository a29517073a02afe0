//! Core types for circuit representation.

use std::fmt;

use uuid::Uuid;

/// A unique identifier for a node in a circuit.
///
/// Ids are generated when the node is constructed and are stable for the
/// node's lifetime, so they double as the node key in circuit documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }

    /// Parse an id from its document form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(NodeId)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tri-state logic signal.
///
/// `Undefined` is the reset value of every pin. There is no ordering
/// between values, only equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicValue {
    Low,
    High,
    #[default]
    Undefined,
}

impl LogicValue {
    /// `High` for true, `Low` for false.
    pub fn from_bool(b: bool) -> Self {
        if b {
            LogicValue::High
        } else {
            LogicValue::Low
        }
    }

    /// True only for a defined `High`. Gates treat `Undefined` as falsy.
    pub fn is_high(self) -> bool {
        self == LogicValue::High
    }

    /// True for `Low` and `High`.
    pub fn is_defined(self) -> bool {
        self != LogicValue::Undefined
    }
}

impl fmt::Display for LogicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicValue::Low => write!(f, "0"),
            LogicValue::High => write!(f, "1"),
            LogicValue::Undefined => write!(f, "X"),
        }
    }
}

/// Direction of a pin relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PinDirection {
    Input,
    Output,
}

/// Index-based handle to a pin: owning node, direction and position.
///
/// Connections between pins are stored as `PinRef`s rather than
/// references, so feedback wiring never creates ownership cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinRef {
    pub node: NodeId,
    pub direction: PinDirection,
    pub index: usize,
}

impl PinRef {
    /// Reference the `index`th input pin of `node`.
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PinDirection::Input,
            index,
        }
    }

    /// Reference the `index`th output pin of `node`.
    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PinDirection::Output,
            index,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
        };
        write!(f, "{}.{}{}", self.node, dir, self.index)
    }
}
