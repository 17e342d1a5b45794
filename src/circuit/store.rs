//! The circuit: gate storage with def-use bookkeeping.
//!
//! [`Circuit`] owns every gate of one compilation unit. Besides the gates'
//! in-lists it maintains the reverse direction - a use list per gate - so that a
//! gate can be replaced by another one in all of its users in time proportional
//! to its use count. Trivial-phi elimination relies on this.
//!
//! # Thread Safety
//!
//! A `Circuit` is `Send` and `Sync` but not internally synchronized. One circuit
//! is built by exactly one [`Environment`](crate::builder::Environment) at a
//! time, which holds the only mutable borrow.

use std::collections::HashMap;

use crate::{
    circuit::{Gate, GateRef, GateType, MachineType, OpCode},
    Error, Result,
};

/// Number of state, depend and value slots of a new gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateShape {
    /// Number of state ins
    pub state: usize,
    /// Number of depend ins
    pub depend: usize,
    /// Number of value ins
    pub value: usize,
}

impl GateShape {
    /// Gate without any ins.
    pub const LEAF: Self = Self::new(0, 0, 0);

    /// Creates a shape from its three slot counts.
    #[must_use]
    pub const fn new(state: usize, depend: usize, value: usize) -> Self {
        Self {
            state,
            depend,
            value,
        }
    }

    /// Returns the total number of slots.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.state + self.depend + self.value
    }
}

/// One entry of a use list: `user` reads this gate through in-slot `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Use {
    /// The gate reading the value
    pub user: GateRef,
    /// Absolute in-list index within `user`
    pub slot: usize,
}

/// Gate storage for one compilation unit.
///
/// A new circuit already contains its fixed roots: the circuit root, the state
/// entry, the depend entry, the return list and the argument list.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::{Circuit, GateShape, GateType, MachineType, OpCode};
///
/// let mut circuit = Circuit::new();
/// let one = circuit.constant(MachineType::I32, 1, GateType::NativeValue);
/// let two = circuit.constant(MachineType::I32, 2, GateType::NativeValue);
/// let sum = circuit.new_gate(
///     OpCode::Add,
///     MachineType::I32,
///     GateType::NativeValue,
///     0,
///     GateShape::new(0, 0, 2),
///     &[one, two],
/// )?;
///
/// assert_eq!(circuit.value_in(sum, 1)?, Some(two));
/// assert_eq!(circuit.uses(one)?.len(), 1);
/// # Ok::<(), circuit_ssa::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Circuit {
    gates: Vec<Gate>,
    uses: Vec<Vec<Use>>,
    constants: HashMap<(MachineType, u64, GateType), GateRef>,
    arguments: HashMap<u64, GateRef>,
    root: GateRef,
    state_root: GateRef,
    depend_root: GateRef,
    return_list: GateRef,
    arg_list: GateRef,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Creates an empty circuit holding only its fixed roots.
    #[must_use]
    pub fn new() -> Self {
        let mut circuit = Circuit {
            gates: Vec::new(),
            uses: Vec::new(),
            constants: HashMap::new(),
            arguments: HashMap::new(),
            root: GateRef::new(0),
            state_root: GateRef::new(0),
            depend_root: GateRef::new(0),
            return_list: GateRef::new(0),
            arg_list: GateRef::new(0),
        };
        circuit.root = circuit.push(Gate::new(
            OpCode::CircuitRoot,
            MachineType::NoValue,
            GateType::Empty,
            0,
            0,
            0,
            0,
        ));
        circuit.state_root = circuit.push(Gate::new(
            OpCode::StateEntry,
            MachineType::NoValue,
            GateType::Empty,
            0,
            0,
            0,
            0,
        ));
        circuit.depend_root = circuit.push(Gate::new(
            OpCode::DependEntry,
            MachineType::NoValue,
            GateType::Empty,
            0,
            0,
            0,
            0,
        ));
        circuit.return_list = circuit.push(Gate::new(
            OpCode::ReturnList,
            MachineType::NoValue,
            GateType::Empty,
            0,
            0,
            0,
            0,
        ));
        circuit.arg_list = circuit.push(Gate::new(
            OpCode::ArgList,
            MachineType::NoValue,
            GateType::Empty,
            0,
            0,
            0,
            0,
        ));
        circuit
    }

    fn push(&mut self, gate: Gate) -> GateRef {
        let index = u32::try_from(self.gates.len()).unwrap_or(u32::MAX);
        self.gates.push(gate);
        self.uses.push(Vec::new());
        GateRef::new(index)
    }

    /// Returns the circuit root.
    #[must_use]
    pub const fn root(&self) -> GateRef {
        self.root
    }

    /// Returns the entry of the state chain.
    #[must_use]
    pub const fn state_root(&self) -> GateRef {
        self.state_root
    }

    /// Returns the entry of the dependency chain.
    #[must_use]
    pub const fn depend_root(&self) -> GateRef {
        self.depend_root
    }

    /// Returns the root collecting return gates.
    #[must_use]
    pub const fn return_list(&self) -> GateRef {
        self.return_list
    }

    /// Returns the root collecting argument gates.
    #[must_use]
    pub const fn arg_list(&self) -> GateRef {
        self.arg_list
    }

    /// Returns the number of gates ever created, deleted gates included.
    #[must_use]
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Returns the number of gates that have not been deleted.
    #[must_use]
    pub fn live_gate_count(&self) -> usize {
        self.gates.iter().filter(|gate| !gate.is_nop()).count()
    }

    /// Iterates over all live gates in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (GateRef, &Gate)> + '_ {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, gate)| !gate.is_nop())
            .map(|(index, gate)| (GateRef::new(index as u32), gate))
    }

    /// Looks up a gate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn gate(&self, gate: GateRef) -> Result<&Gate> {
        self.gates
            .get(gate.index())
            .ok_or(Error::GateNotFound(gate))
    }

    fn gate_mut(&mut self, gate: GateRef) -> Result<&mut Gate> {
        self.gates
            .get_mut(gate.index())
            .ok_or(Error::GateNotFound(gate))
    }

    /// Returns the opcode of a gate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn opcode(&self, gate: GateRef) -> Result<OpCode> {
        Ok(self.gate(gate)?.opcode())
    }

    /// Creates a gate.
    ///
    /// `ins` fills the in-list from slot 0 onwards; slots past `ins.len()` stay
    /// empty until patched with [`Circuit::new_in`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotOutOfRange`] if more ins are supplied than `shape`
    /// provides, or [`Error::GateNotFound`] if an in does not exist.
    pub fn new_gate(
        &mut self,
        opcode: OpCode,
        machine_type: MachineType,
        gate_type: GateType,
        payload: u64,
        shape: GateShape,
        ins: &[GateRef],
    ) -> Result<GateRef> {
        for &input in ins {
            self.gate(input)?;
        }

        let next = GateRef::new(u32::try_from(self.gates.len()).unwrap_or(u32::MAX));
        if ins.len() > shape.total() {
            return Err(Error::SlotOutOfRange {
                gate: next,
                index: ins.len() - 1,
                count: shape.total(),
            });
        }

        let gate = self.push(Gate::new(
            opcode,
            machine_type,
            gate_type,
            payload,
            shape.state,
            shape.depend,
            shape.value,
        ));
        for (slot, &input) in ins.iter().enumerate() {
            self.link(gate, slot, input)?;
        }
        Ok(gate)
    }

    /// Returns the interned constant gate for `(machine_type, bits, gate_type)`.
    pub fn constant(&mut self, machine_type: MachineType, bits: u64, gate_type: GateType) -> GateRef {
        if let Some(&gate) = self.constants.get(&(machine_type, bits, gate_type)) {
            return gate;
        }
        let gate = self.push(Gate::new(
            OpCode::Constant,
            machine_type,
            gate_type,
            bits,
            0,
            0,
            0,
        ));
        self.constants.insert((machine_type, bits, gate_type), gate);
        gate
    }

    /// Returns the interned argument gate for position `index`.
    ///
    /// The first request for an index fixes the argument's types.
    pub fn argument(&mut self, index: usize, machine_type: MachineType, gate_type: GateType) -> GateRef {
        let key = index as u64;
        if let Some(&gate) = self.arguments.get(&key) {
            return gate;
        }
        let gate = self.push(Gate::new(OpCode::Arg, machine_type, gate_type, key, 0, 0, 1));
        let arg_list = self.arg_list;
        self.gates[gate.index()].ins_mut()[0] = Some(arg_list);
        self.uses[arg_list.index()].push(Use {
            user: gate,
            slot: 0,
        });
        self.arguments.insert(key, gate);
        gate
    }

    /// Returns the absolute in-slot `index` of `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] or [`Error::SlotOutOfRange`].
    pub fn in_at(&self, gate: GateRef, index: usize) -> Result<Option<GateRef>> {
        let data = self.gate(gate)?;
        data.ins()
            .get(index)
            .copied()
            .ok_or(Error::SlotOutOfRange {
                gate,
                index,
                count: data.num_ins(),
            })
    }

    /// Returns the `index`-th state in of `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotOutOfRange`] if `gate` has no such state in.
    pub fn state_in(&self, gate: GateRef, index: usize) -> Result<Option<GateRef>> {
        let data = self.gate(gate)?;
        if index >= data.state_count() {
            return Err(Error::SlotOutOfRange {
                gate,
                index,
                count: data.state_count(),
            });
        }
        self.in_at(gate, index)
    }

    /// Returns the `index`-th depend in of `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotOutOfRange`] if `gate` has no such depend in.
    pub fn depend_in(&self, gate: GateRef, index: usize) -> Result<Option<GateRef>> {
        let data = self.gate(gate)?;
        if index >= data.depend_count() {
            return Err(Error::SlotOutOfRange {
                gate,
                index,
                count: data.depend_count(),
            });
        }
        self.in_at(gate, data.state_count() + index)
    }

    /// Returns the `index`-th value in of `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotOutOfRange`] if `gate` has no such value in.
    pub fn value_in(&self, gate: GateRef, index: usize) -> Result<Option<GateRef>> {
        let data = self.gate(gate)?;
        if index >= data.value_count() {
            return Err(Error::SlotOutOfRange {
                gate,
                index,
                count: data.value_count(),
            });
        }
        self.in_at(gate, data.state_count() + data.depend_count() + index)
    }

    /// Returns the number of in-slots of `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn num_ins(&self, gate: GateRef) -> Result<usize> {
        Ok(self.gate(gate)?.num_ins())
    }

    /// Returns the use list of `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn uses(&self, gate: GateRef) -> Result<&[Use]> {
        self.gate(gate)?;
        Ok(&self.uses[gate.index()])
    }

    /// Fills the empty in-slot `index` of `gate` with `value`.
    ///
    /// This is the delayed-operand patch used for loop back edges and for phi
    /// operands filled after creation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotOccupied`] if the slot already holds a gate, or
    /// [`Error::SlotOutOfRange`] if the slot does not exist.
    pub fn new_in(&mut self, gate: GateRef, index: usize, value: GateRef) -> Result<()> {
        if self.in_at(gate, index)?.is_some() {
            return Err(Error::SlotOccupied { gate, index });
        }
        self.gate(value)?;
        self.link(gate, index, value)
    }

    /// Rewrites in-slot `index` of `gate` to `value`, whether empty or not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotOutOfRange`] if the slot does not exist.
    pub fn replace_in(&mut self, gate: GateRef, index: usize, value: GateRef) -> Result<()> {
        self.gate(value)?;
        if let Some(previous) = self.in_at(gate, index)? {
            self.unlink_use(previous, gate, index);
        }
        self.link(gate, index, value)
    }

    fn link(&mut self, gate: GateRef, index: usize, value: GateRef) -> Result<()> {
        let data = self.gate_mut(gate)?;
        let count = data.num_ins();
        let slot = data
            .ins_mut()
            .get_mut(index)
            .ok_or(Error::SlotOutOfRange { gate, index, count })?;
        *slot = Some(value);
        self.uses[value.index()].push(Use { user: gate, slot: index });
        Ok(())
    }

    fn unlink_use(&mut self, value: GateRef, user: GateRef, slot: usize) {
        let uses = &mut self.uses[value.index()];
        if let Some(position) = uses
            .iter()
            .position(|entry| entry.user == user && entry.slot == slot)
        {
            uses.swap_remove(position);
        }
    }

    /// Reroutes every use of `from` to `to`, except uses by `from` itself.
    ///
    /// Returns the distinct users that were rerouted, in use-list order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if either gate does not exist.
    pub fn replace_all_uses(&mut self, from: GateRef, to: GateRef) -> Result<Vec<GateRef>> {
        self.gate(from)?;
        self.gate(to)?;

        let rerouted: Vec<Use> = self.uses[from.index()]
            .iter()
            .copied()
            .filter(|entry| entry.user != from)
            .collect();
        self.uses[from.index()].retain(|entry| entry.user == from);

        let mut users = Vec::with_capacity(rerouted.len());
        for entry in rerouted {
            self.gates[entry.user.index()].ins_mut()[entry.slot] = Some(to);
            self.uses[to.index()].push(entry);
            if !users.contains(&entry.user) {
                users.push(entry.user);
            }
        }
        Ok(users)
    }

    /// Deletes `gate`: unlinks its ins and turns it into an [`OpCode::Nop`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] if another gate still uses `gate`.
    pub fn delete_gate(&mut self, gate: GateRef) -> Result<()> {
        self.gate(gate)?;
        if let Some(entry) = self.uses[gate.index()]
            .iter()
            .find(|entry| entry.user != gate)
        {
            return Err(invariant_error!(
                "Cannot delete {} - still used by {} through slot {}",
                gate,
                entry.user,
                entry.slot
            ));
        }

        let ins: Vec<(usize, GateRef)> = self.gates[gate.index()]
            .ins()
            .iter()
            .enumerate()
            .filter_map(|(slot, input)| input.map(|value| (slot, value)))
            .collect();
        for (slot, value) in ins {
            self.unlink_use(value, gate, slot);
        }
        self.uses[gate.index()].clear();
        self.gates[gate.index()].kill();
        Ok(())
    }

    /// Returns the number of predecessors a control gate expects.
    ///
    /// This is the gate's state-in count: a merge over three paths expects
    /// three, a loop header two, a branch arm one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn expected_in_degree(&self, control: GateRef) -> Result<usize> {
        Ok(self.gate(control)?.state_count())
    }

    /// Returns `true` if `gate` heads a loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn is_loop_head(&self, gate: GateRef) -> Result<bool> {
        Ok(self.opcode(gate)?.is_loop_head())
    }

    /// Returns `true` if `gate` is an arm of a conditional branch or switch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn is_control_case(&self, gate: GateRef) -> Result<bool> {
        Ok(self.opcode(gate)?.is_control_case())
    }

    /// Returns `true` if `gate` is a value or dependency selector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn is_selector(&self, gate: GateRef) -> Result<bool> {
        Ok(self.opcode(gate)?.is_selector())
    }

    /// Returns `true` if `gate` has been deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateNotFound`] if `gate` does not belong to this circuit.
    pub fn is_nop(&self, gate: GateRef) -> Result<bool> {
        Ok(self.gate(gate)?.is_nop())
    }
}
