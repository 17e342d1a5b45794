//! Gate handles and gate storage.
//!
//! A gate is a node of the sea-of-nodes circuit. Its in-list is laid out in three
//! consecutive classes:
//!
//! ```text
//! [ state ins ... | depend ins ... | value ins ... ]
//! ```
//!
//! Each slot is an `Option<GateRef>`: gates may be created with slots left empty
//! and have them filled later. Loop headers depend on this - their back-edge slot
//! is only known after the loop body has been translated.

use std::fmt;

use crate::circuit::{GateType, MachineType, OpCode};

/// A strongly-typed handle to a gate within a [`Circuit`](crate::circuit::Circuit).
///
/// `GateRef` wraps a `u32` index, preventing accidental mixing of gate handles
/// with other integer values. Handles are assigned sequentially as gates are
/// created and stay valid for the lifetime of the circuit; deleting a gate turns
/// it into an [`OpCode::Nop`] but never reuses its handle.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::GateRef;
///
/// let gate = GateRef::new(7);
/// assert_eq!(gate.index(), 7);
/// assert_eq!(gate.to_string(), "g7");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateRef(u32);

impl GateRef {
    /// Creates a gate handle from a raw index.
    ///
    /// Intended for tests and tooling; regular code obtains handles from the
    /// circuit.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        GateRef(index)
    }

    /// Returns the raw index of this handle.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for GateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GateRef({})", self.0)
    }
}

impl fmt::Display for GateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Edge class of an in-list slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Control ordering edge
    State,
    /// Side-effect ordering edge
    Depend,
    /// Data edge
    Value,
}

/// A single gate of the circuit.
#[derive(Debug, Clone)]
pub struct Gate {
    opcode: OpCode,
    machine_type: MachineType,
    gate_type: GateType,
    /// Opcode-specific payload: constant bits, argument index, switch key.
    payload: u64,
    state_count: usize,
    depend_count: usize,
    ins: Vec<Option<GateRef>>,
}

impl Gate {
    pub(crate) fn new(
        opcode: OpCode,
        machine_type: MachineType,
        gate_type: GateType,
        payload: u64,
        state_count: usize,
        depend_count: usize,
        value_count: usize,
    ) -> Self {
        Self {
            opcode,
            machine_type,
            gate_type,
            payload,
            state_count,
            depend_count,
            ins: vec![None; state_count + depend_count + value_count],
        }
    }

    /// Returns the gate's opcode.
    #[must_use]
    pub const fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Returns the gate's machine representation.
    #[must_use]
    pub const fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    /// Returns the gate's semantic type.
    #[must_use]
    pub const fn gate_type(&self) -> GateType {
        self.gate_type
    }

    /// Returns the opcode-specific payload.
    #[must_use]
    pub const fn payload(&self) -> u64 {
        self.payload
    }

    /// Returns the number of state ins.
    #[must_use]
    pub const fn state_count(&self) -> usize {
        self.state_count
    }

    /// Returns the number of depend ins.
    #[must_use]
    pub const fn depend_count(&self) -> usize {
        self.depend_count
    }

    /// Returns the number of value ins.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.ins.len() - self.state_count - self.depend_count
    }

    /// Returns the full in-list, empty slots included.
    #[must_use]
    pub fn ins(&self) -> &[Option<GateRef>] {
        &self.ins
    }

    /// Returns the number of in-list slots.
    #[must_use]
    pub fn num_ins(&self) -> usize {
        self.ins.len()
    }

    /// Returns the edge class of the absolute slot `index`.
    #[must_use]
    pub fn edge_kind(&self, index: usize) -> EdgeKind {
        if index < self.state_count {
            EdgeKind::State
        } else if index < self.state_count + self.depend_count {
            EdgeKind::Depend
        } else {
            EdgeKind::Value
        }
    }

    /// Returns `true` once the gate has been deleted.
    #[must_use]
    pub fn is_nop(&self) -> bool {
        self.opcode == OpCode::Nop
    }

    pub(crate) fn ins_mut(&mut self) -> &mut Vec<Option<GateRef>> {
        &mut self.ins
    }

    pub(crate) fn kill(&mut self) {
        self.opcode = OpCode::Nop;
        self.state_count = 0;
        self.depend_count = 0;
        self.ins.clear();
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        if self.machine_type.has_value() {
            write!(f, ".{}", self.machine_type)?;
        }
        write!(f, "(")?;
        for (i, slot) in self.ins.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match slot {
                Some(gate) => write!(f, "{gate}")?,
                None => write!(f, "_")?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_ref_display() {
        let gate = GateRef::new(12);
        assert_eq!(format!("{gate}"), "g12");
        assert_eq!(format!("{gate:?}"), "GateRef(12)");
    }

    #[test]
    fn test_gate_ref_ordering() {
        let mut gates = vec![GateRef::new(3), GateRef::new(1), GateRef::new(2)];
        gates.sort();
        assert_eq!(gates, vec![GateRef::new(1), GateRef::new(2), GateRef::new(3)]);
    }

    #[test]
    fn test_edge_kind_layout() {
        let gate = Gate::new(
            OpCode::DependSelector,
            MachineType::NoValue,
            GateType::Empty,
            0,
            1,
            2,
            0,
        );
        assert_eq!(gate.num_ins(), 3);
        assert_eq!(gate.edge_kind(0), EdgeKind::State);
        assert_eq!(gate.edge_kind(1), EdgeKind::Depend);
        assert_eq!(gate.edge_kind(2), EdgeKind::Depend);
        assert_eq!(gate.value_count(), 0);
    }

    #[test]
    fn test_gate_display() {
        let mut gate = Gate::new(
            OpCode::ValueSelector,
            MachineType::I32,
            GateType::NativeValue,
            0,
            1,
            0,
            2,
        );
        gate.ins_mut()[0] = Some(GateRef::new(4));
        gate.ins_mut()[1] = Some(GateRef::new(9));
        assert_eq!(gate.to_string(), "VALUE_SELECTOR.i32(g4, g9, _)");
    }

    #[test]
    fn test_kill() {
        let mut gate = Gate::new(OpCode::Merge, MachineType::NoValue, GateType::Empty, 0, 2, 0, 0);
        gate.kill();
        assert!(gate.is_nop());
        assert_eq!(gate.num_ins(), 0);
    }
}
