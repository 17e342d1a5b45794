use thiserror::Error;

use crate::{builder::Label, circuit::GateRef};

macro_rules! invariant_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Invariant {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Invariant {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every failure this library can report.
///
/// Circuit construction does not perform I/O and consumes only input produced by a
/// trusted translator. Every variant therefore describes a violated construction
/// invariant: a translator bug that must abort the current compilation unit rather
/// than produce a structurally invalid graph. No variant is meant to be retried.
///
/// # Error Categories
///
/// ## Label State Errors
/// - [`Error::NoPredecessors`] - A label was bound before any edge reached it
/// - [`Error::MalformedLoopHeader`] - A loop header does not have the two-predecessor shape
/// - [`Error::InvalidLabelState`] - A label transition was requested out of order
/// - [`Error::UnsealedNonLoopRead`] - A variable was read in an unsealed ordinary label
/// - [`Error::NoCurrentLabel`] - An operation needed a current label after control left it
/// - [`Error::NoOpenSubCfg`] - A sub-CFG was exited without a matching entry
///
/// ## Graph Store Errors
/// - [`Error::GateNotFound`] - A gate handle does not belong to the circuit
/// - [`Error::SlotOccupied`] - A delayed operand slot was patched twice
/// - [`Error::SlotOutOfRange`] - An operand slot index exceeds the gate's in-list
///
/// ## Resolution Errors
/// - [`Error::RecursionLimit`] - Variable resolution nested deeper than configured
/// - [`Error::Invariant`] - Any other internal invariant, with source location
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::{Circuit, CompilationConfig, Environment, Error};
///
/// let mut circuit = Circuit::new();
/// let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
/// let orphan = env.new_label();
///
/// match env.bind(orphan) {
///     Err(Error::NoPredecessors(label)) => assert_eq!(label, orphan),
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A label was bound while its predecessor list was still empty.
    ///
    /// Only the entry label may have zero predecessors, and it never goes
    /// through binding.
    #[error("Label {0} has no predecessors and cannot be bound")]
    NoPredecessors(Label),

    /// A loop header violated its fixed shape.
    ///
    /// Loop headers have exactly one forward predecessor and one back edge, and
    /// exactly one pending control besides the loop-begin gate itself.
    #[error("Loop header {label} is malformed - {predecessors} predecessors, {pending} pending controls")]
    MalformedLoopHeader {
        /// The offending loop header
        label: Label,
        /// Number of registered predecessors
        predecessors: usize,
        /// Number of pending controls besides the loop-begin gate
        pending: usize,
    },

    /// A label operation was issued in the wrong lifecycle state.
    #[error("Label {label} is {found}, operation `{operation}` requires {expected}")]
    InvalidLabelState {
        /// The label that rejected the transition
        label: Label,
        /// The operation that was attempted
        operation: &'static str,
        /// The state the operation requires
        expected: &'static str,
        /// The state the label was actually in
        found: &'static str,
    },

    /// A variable was read in an unsealed label that is not a loop header.
    ///
    /// Placeholder selectors are sized for exactly one pending predecessor, which
    /// only holds for loop headers awaiting their back edge.
    #[error("Variable read in unsealed label {0}, which is not a loop header")]
    UnsealedNonLoopRead(Label),

    /// Control left the current label (jump, branch, return) and no label has
    /// been bound since.
    #[error("No current label - bind a label before emitting into it")]
    NoCurrentLabel,

    /// `sub_cfg_exit` was called with no sub-CFG open.
    #[error("No open sub-CFG to exit")]
    NoOpenSubCfg,

    /// The gate handle does not refer to a gate of this circuit.
    #[error("Gate {0} does not exist in this circuit")]
    GateNotFound(GateRef),

    /// A delayed operand slot was filled twice.
    #[error("Operand slot {index} of gate {gate} is already occupied")]
    SlotOccupied {
        /// The gate being patched
        gate: GateRef,
        /// The absolute in-list index
        index: usize,
    },

    /// An operand slot index is past the end of the gate's in-list.
    #[error("Operand slot {index} is out of range for gate {gate} with {count} ins")]
    SlotOutOfRange {
        /// The gate being accessed
        gate: GateRef,
        /// The requested absolute in-list index
        index: usize,
        /// The gate's in-list length
        count: usize,
    },

    /// Recursion limit reached.
    ///
    /// Phi resolution keeps the merge selectors whose operands are still being
    /// resolved on an explicit stack. Its depth is bounded by
    /// [`crate::CompilationConfig::max_read_depth`].
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// An internal construction invariant does not hold.
    #[error("Invariant - {file}:{line}: {message}")]
    Invariant {
        /// The message describing the violated invariant
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
