//! Gate opcodes and their static properties.
//!
//! Every gate in a [`Circuit`](crate::circuit::Circuit) carries an [`OpCode`]. The
//! opcode decides how the gate participates in the three edge classes of the
//! sea-of-nodes graph:
//!
//! - **State** edges order control flow (blocks, branches, merges, loops)
//! - **Depend** edges order side effects (the dependency chain)
//! - **Value** edges carry data
//!
//! The builder only ever asks a handful of questions about an opcode - is it a
//! loop header, a branch arm, a selector - and those answers are encoded once in
//! [`OpProperties`] rather than spread over `matches!` calls.

use bitflags::bitflags;
use strum::{Display, EnumCount, EnumIter};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Static classification flags of an opcode
    pub struct OpProperties: u16 {
        /// Fixed root gate created together with the circuit
        const ROOT = 0x0001;
        /// Gate produces a state (control) value
        const STATE = 0x0002;
        /// Gate selects between inputs according to its control (phi-like)
        const SELECTOR = 0x0004;
        /// Control arm produced by a conditional branch or a switch
        const CONTROL_CASE = 0x0008;
        /// Control gate heading a loop, back edge patched in later
        const LOOP_HEAD = 0x0010;
        /// Gate takes part in the dependency chain
        const EFFECT = 0x0020;
        /// Interned constant or argument gate
        const CONSTANT = 0x0040;
        /// Gate terminates a control path
        const TERMINATOR = 0x0080;
    }
}

/// Operation performed by a gate.
///
/// The numbering is not stable and carries no meaning; gates are compared by
/// opcode identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OpCode {
    /// Deleted gate, no longer reachable from live gates
    Nop,

    // Roots
    /// Root of every circuit
    CircuitRoot,
    /// Entry of the state chain
    StateEntry,
    /// Entry of the dependency chain
    DependEntry,
    /// Collects every return gate
    ReturnList,
    /// Collects every argument gate
    ArgList,

    // Control
    /// Unconditional transfer of control
    OrdinaryBlock,
    /// Two-way conditional branch
    IfBranch,
    /// Taken arm of an [`OpCode::IfBranch`]
    IfTrue,
    /// Not-taken arm of an [`OpCode::IfBranch`]
    IfFalse,
    /// Multi-way branch over integer keys
    SwitchBranch,
    /// Keyed arm of an [`OpCode::SwitchBranch`]
    SwitchCase,
    /// Fallback arm of an [`OpCode::SwitchBranch`]
    DefaultCase,
    /// Control merge of two or more paths
    Merge,
    /// Loop header: forward entry plus back edge
    LoopBegin,
    /// End of a loop body, feeding the back edge
    LoopBack,
    /// Return of a value
    Return,
    /// Return without a value
    ReturnVoid,

    // Selectors
    /// Data phi
    ValueSelector,
    /// Dependency phi
    DependSelector,

    // Dependency chain
    /// Pins the dependency chain below a control arm
    DependRelay,
    /// Joins several dependency chains
    DependAnd,

    // Values
    /// Function argument
    Arg,
    /// Interned constant
    Constant,
    /// Integer or float addition
    Add,
    /// Integer or float subtraction
    Sub,
    /// Integer or float multiplication
    Mul,
    /// Bitwise and
    And,
    /// Bitwise or
    Or,
    /// Comparison for equality
    Eq,
    /// Comparison for inequality
    Ne,
    /// Signed less-than comparison
    Slt,
    /// Signed greater-than comparison
    Sgt,
    /// Effectful call
    Call,
    /// Memory load
    Load,
    /// Memory store
    Store,
}

impl OpCode {
    /// Returns the static property set of this opcode.
    #[must_use]
    pub const fn properties(self) -> OpProperties {
        match self {
            OpCode::Nop => OpProperties::empty(),
            OpCode::CircuitRoot | OpCode::ReturnList | OpCode::ArgList => OpProperties::ROOT,
            OpCode::StateEntry => OpProperties::ROOT.union(OpProperties::STATE),
            OpCode::DependEntry => OpProperties::ROOT.union(OpProperties::EFFECT),
            OpCode::OrdinaryBlock
            | OpCode::IfBranch
            | OpCode::SwitchBranch
            | OpCode::Merge
            | OpCode::LoopBack => OpProperties::STATE,
            OpCode::IfTrue | OpCode::IfFalse | OpCode::SwitchCase | OpCode::DefaultCase => {
                OpProperties::STATE.union(OpProperties::CONTROL_CASE)
            }
            OpCode::LoopBegin => OpProperties::STATE.union(OpProperties::LOOP_HEAD),
            OpCode::Return | OpCode::ReturnVoid => OpProperties::STATE
                .union(OpProperties::EFFECT)
                .union(OpProperties::TERMINATOR),
            OpCode::ValueSelector => OpProperties::SELECTOR,
            OpCode::DependSelector => OpProperties::SELECTOR.union(OpProperties::EFFECT),
            OpCode::DependRelay | OpCode::DependAnd => OpProperties::EFFECT,
            OpCode::Arg | OpCode::Constant => OpProperties::CONSTANT,
            OpCode::Call | OpCode::Load | OpCode::Store => OpProperties::EFFECT,
            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::And
            | OpCode::Or
            | OpCode::Eq
            | OpCode::Ne
            | OpCode::Slt
            | OpCode::Sgt => OpProperties::empty(),
        }
    }

    /// Returns `true` for data and dependency phis.
    #[must_use]
    pub const fn is_selector(self) -> bool {
        self.properties().contains(OpProperties::SELECTOR)
    }

    /// Returns `true` for loop-header control gates.
    #[must_use]
    pub const fn is_loop_head(self) -> bool {
        self.properties().contains(OpProperties::LOOP_HEAD)
    }

    /// Returns `true` for control arms produced by a conditional branch or switch.
    #[must_use]
    pub const fn is_control_case(self) -> bool {
        self.properties().contains(OpProperties::CONTROL_CASE)
    }

    /// Returns `true` for gates that produce a state value.
    #[must_use]
    pub const fn is_state(self) -> bool {
        self.properties().contains(OpProperties::STATE)
    }

    /// Returns `true` for gates that participate in the dependency chain.
    #[must_use]
    pub const fn is_effect(self) -> bool {
        self.properties().contains(OpProperties::EFFECT)
    }

    /// Returns `true` for the fixed roots of a circuit.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.properties().contains(OpProperties::ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_control_case_arms() {
        let arms: Vec<OpCode> = OpCode::iter().filter(|op| op.is_control_case()).collect();
        assert_eq!(
            arms,
            vec![
                OpCode::IfTrue,
                OpCode::IfFalse,
                OpCode::SwitchCase,
                OpCode::DefaultCase
            ]
        );
    }

    #[test]
    fn test_only_loop_begin_is_loop_head() {
        assert_eq!(OpCode::iter().filter(|op| op.is_loop_head()).count(), 1);
        assert!(OpCode::LoopBegin.is_loop_head());
        assert!(!OpCode::LoopBack.is_loop_head());
    }

    #[test]
    fn test_selectors() {
        assert!(OpCode::ValueSelector.is_selector());
        assert!(OpCode::DependSelector.is_selector());
        assert!(OpCode::DependSelector.is_effect());
        assert!(!OpCode::ValueSelector.is_effect());
        assert!(!OpCode::Merge.is_selector());
    }

    #[test]
    fn test_nop_has_no_properties() {
        assert!(OpCode::Nop.properties().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(OpCode::ValueSelector.to_string(), "VALUE_SELECTOR");
        assert_eq!(OpCode::LoopBegin.to_string(), "LOOP_BEGIN");
        assert_eq!(OpCode::COUNT, OpCode::iter().count());
    }
}
