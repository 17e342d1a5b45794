//! Node-construction helpers over a [`Circuit`].
//!
//! [`CircuitBuilder`] knows the shape of every gate kind the construction layer
//! emits - how many state, depend and value slots it has and in which order its
//! ins are laid out - so callers never assemble in-lists by hand. It also owns
//! the read-only [`CompilationConfig`] of the unit, which resolves
//! [`MachineType::ArchPointer`] to a concrete width.

use crate::{
    circuit::{Circuit, GateRef, GateShape, GateType, MachineType, OpCode, VariableType},
    CompilationConfig, Result,
};

/// Bit pattern of the tagged `undefined` value.
pub const TAGGED_UNDEFINED: u64 = 0x02;

/// Gate factory bound to one circuit.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::{Circuit, CircuitBuilder, CompilationConfig, OpCode};
///
/// let mut circuit = Circuit::new();
/// let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
///
/// let entry = builder.circuit().state_root();
/// let cond = builder.boolean(true);
/// let branch = builder.if_branch(entry, cond)?;
/// let taken = builder.if_true(branch)?;
/// let skipped = builder.if_false(branch)?;
/// let join = builder.merge(&[taken, skipped])?;
///
/// assert_eq!(builder.circuit().opcode(join)?, OpCode::Merge);
/// assert_eq!(builder.circuit().expected_in_degree(join)?, 2);
/// # Ok::<(), circuit_ssa::Error>(())
/// ```
#[derive(Debug)]
pub struct CircuitBuilder<'c> {
    circuit: &'c mut Circuit,
    config: CompilationConfig,
}

impl<'c> CircuitBuilder<'c> {
    /// Creates a builder emitting into `circuit`.
    pub fn new(circuit: &'c mut Circuit, config: CompilationConfig) -> Self {
        Self { circuit, config }
    }

    /// Returns the circuit being built.
    #[must_use]
    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }

    /// Returns the circuit being built, mutably.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        self.circuit
    }

    /// Returns the configuration of this compilation unit.
    #[must_use]
    pub fn config(&self) -> &CompilationConfig {
        &self.config
    }

    /// Resolves [`MachineType::ArchPointer`] against the target triple.
    #[must_use]
    pub fn resolve(&self, machine_type: MachineType) -> MachineType {
        match machine_type {
            MachineType::ArchPointer if self.config.is_64bit() => MachineType::I64,
            MachineType::ArchPointer => MachineType::I32,
            other => other,
        }
    }

    /// Returns the gate of argument `index`, typed as a tagged value.
    pub fn arguments(&mut self, index: usize) -> GateRef {
        self.typed_argument(index, VariableType::JS_ANY)
    }

    /// Returns the gate of argument `index` with an explicit type.
    pub fn typed_argument(&mut self, index: usize, var_type: VariableType) -> GateRef {
        let machine_type = self.resolve(var_type.machine_type());
        self.circuit
            .argument(index, machine_type, var_type.gate_type())
    }

    /// Creates a control merge over `ins`, one state slot per path.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn merge(&mut self, ins: &[GateRef]) -> Result<GateRef> {
        self.circuit.new_gate(
            OpCode::Merge,
            MachineType::NoValue,
            GateType::Empty,
            0,
            GateShape::new(ins.len(), 0, 0),
            ins,
        )
    }

    /// Creates a value or dependency selector controlled by `control`.
    ///
    /// The selector gets `count` operand slots, of which the first `ins.len()`
    /// are filled; the remainder are patched later. Value selectors take their
    /// operands as value ins, dependency selectors as depend ins.
    ///
    /// # Errors
    ///
    /// Returns an error if more than `count` ins are supplied, or if `opcode` is
    /// not a selector.
    pub fn selector(
        &mut self,
        opcode: OpCode,
        machine_type: MachineType,
        control: GateRef,
        ins: &[GateRef],
        count: usize,
        gate_type: GateType,
    ) -> Result<GateRef> {
        let shape = match opcode {
            OpCode::ValueSelector => GateShape::new(1, 0, count),
            OpCode::DependSelector => GateShape::new(1, count, 0),
            other => {
                return Err(invariant_error!("{} is not a selector opcode", other));
            }
        };
        let machine_type = self.resolve(machine_type);

        let mut all_ins = Vec::with_capacity(ins.len() + 1);
        all_ins.push(control);
        all_ins.extend_from_slice(ins);
        self.circuit
            .new_gate(opcode, machine_type, gate_type, 0, shape, &all_ins)
    }

    /// Creates a selector sized and flavoured for a variable of `var_type`.
    ///
    /// Ordering-only variables get a dependency selector, all others a value
    /// selector.
    ///
    /// # Errors
    ///
    /// Returns an error if `control` does not exist.
    pub fn variable_selector(
        &mut self,
        var_type: VariableType,
        control: GateRef,
        count: usize,
    ) -> Result<GateRef> {
        let opcode = if var_type.is_no_value() {
            OpCode::DependSelector
        } else {
            OpCode::ValueSelector
        };
        self.selector(
            opcode,
            var_type.machine_type(),
            control,
            &[],
            count,
            var_type.gate_type(),
        )
    }

    /// Pins `depend` below the control arm `control`.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn depend_relay(&mut self, control: GateRef, depend: GateRef) -> Result<GateRef> {
        self.circuit.new_gate(
            OpCode::DependRelay,
            MachineType::NoValue,
            GateType::Empty,
            0,
            GateShape::new(1, 1, 0),
            &[control, depend],
        )
    }

    /// Joins several dependency chains.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn depend_and(&mut self, ins: &[GateRef]) -> Result<GateRef> {
        self.circuit.new_gate(
            OpCode::DependAnd,
            MachineType::NoValue,
            GateType::Empty,
            0,
            GateShape::new(0, ins.len(), 0),
            ins,
        )
    }

    fn control(&mut self, opcode: OpCode, payload: u64, shape: GateShape, ins: &[GateRef]) -> Result<GateRef> {
        self.circuit
            .new_gate(opcode, MachineType::NoValue, GateType::Empty, payload, shape, ins)
    }

    /// Unconditional transfer out of `control`.
    ///
    /// # Errors
    ///
    /// Returns an error if `control` does not exist.
    pub fn goto(&mut self, control: GateRef) -> Result<GateRef> {
        self.control(OpCode::OrdinaryBlock, 0, GateShape::new(1, 0, 0), &[control])
    }

    /// Two-way branch on `condition`.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn if_branch(&mut self, control: GateRef, condition: GateRef) -> Result<GateRef> {
        self.control(
            OpCode::IfBranch,
            0,
            GateShape::new(1, 0, 1),
            &[control, condition],
        )
    }

    /// Taken arm of `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if `branch` does not exist.
    pub fn if_true(&mut self, branch: GateRef) -> Result<GateRef> {
        self.control(OpCode::IfTrue, 0, GateShape::new(1, 0, 0), &[branch])
    }

    /// Not-taken arm of `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if `branch` does not exist.
    pub fn if_false(&mut self, branch: GateRef) -> Result<GateRef> {
        self.control(OpCode::IfFalse, 0, GateShape::new(1, 0, 0), &[branch])
    }

    /// Multi-way branch on `index` with `case_count` keyed arms plus a default.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn switch_branch(&mut self, control: GateRef, index: GateRef, case_count: usize) -> Result<GateRef> {
        self.control(
            OpCode::SwitchBranch,
            case_count as u64,
            GateShape::new(1, 0, 1),
            &[control, index],
        )
    }

    /// Arm of `switch` taken when the index equals `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `switch` does not exist.
    pub fn switch_case(&mut self, switch: GateRef, key: i64) -> Result<GateRef> {
        self.control(
            OpCode::SwitchCase,
            key as u64,
            GateShape::new(1, 0, 0),
            &[switch],
        )
    }

    /// Fallback arm of `switch`.
    ///
    /// # Errors
    ///
    /// Returns an error if `switch` does not exist.
    pub fn default_case(&mut self, switch: GateRef) -> Result<GateRef> {
        self.control(OpCode::DefaultCase, 0, GateShape::new(1, 0, 0), &[switch])
    }

    /// Loop header entered from `control`; state slot 1 awaits the back edge.
    ///
    /// # Errors
    ///
    /// Returns an error if `control` does not exist.
    pub fn loop_begin(&mut self, control: GateRef) -> Result<GateRef> {
        self.control(OpCode::LoopBegin, 0, GateShape::new(2, 0, 0), &[control])
    }

    /// End of a loop body, feeding the back edge of its header.
    ///
    /// # Errors
    ///
    /// Returns an error if `control` does not exist.
    pub fn loop_end(&mut self, control: GateRef) -> Result<GateRef> {
        self.control(OpCode::LoopBack, 0, GateShape::new(1, 0, 0), &[control])
    }

    /// Returns `value` from the function.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn return_value(&mut self, control: GateRef, depend: GateRef, value: GateRef) -> Result<GateRef> {
        let return_list = self.circuit.return_list();
        self.circuit.new_gate(
            OpCode::Return,
            MachineType::NoValue,
            GateType::Empty,
            0,
            GateShape::new(1, 1, 2),
            &[control, depend, value, return_list],
        )
    }

    /// Returns from the function without a value.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn return_void(&mut self, control: GateRef, depend: GateRef) -> Result<GateRef> {
        let return_list = self.circuit.return_list();
        self.circuit.new_gate(
            OpCode::ReturnVoid,
            MachineType::NoValue,
            GateType::Empty,
            0,
            GateShape::new(1, 1, 1),
            &[control, depend, return_list],
        )
    }

    /// Pure two-operand operation.
    ///
    /// # Errors
    ///
    /// Returns an error if an operand does not exist.
    pub fn binary(&mut self, opcode: OpCode, machine_type: MachineType, lhs: GateRef, rhs: GateRef) -> Result<GateRef> {
        let machine_type = self.resolve(machine_type);
        self.circuit.new_gate(
            opcode,
            machine_type,
            GateType::NativeValue,
            0,
            GateShape::new(0, 0, 2),
            &[lhs, rhs],
        )
    }

    /// Comparison producing an `i1`.
    ///
    /// # Errors
    ///
    /// Returns an error if an operand does not exist.
    pub fn compare(&mut self, opcode: OpCode, lhs: GateRef, rhs: GateRef) -> Result<GateRef> {
        self.binary(opcode, MachineType::I1, lhs, rhs)
    }

    /// Effectful operation ordered after `depend`.
    ///
    /// The returned gate is the new head of the dependency chain.
    ///
    /// # Errors
    ///
    /// Returns an error if an in does not exist.
    pub fn effect(
        &mut self,
        opcode: OpCode,
        var_type: VariableType,
        depend: GateRef,
        values: &[GateRef],
    ) -> Result<GateRef> {
        let machine_type = self.resolve(var_type.machine_type());
        let mut ins = Vec::with_capacity(values.len() + 1);
        ins.push(depend);
        ins.extend_from_slice(values);
        self.circuit.new_gate(
            opcode,
            machine_type,
            var_type.gate_type(),
            0,
            GateShape::new(0, 1, values.len()),
            &ins,
        )
    }

    /// 32-bit integer constant.
    pub fn int32(&mut self, value: i32) -> GateRef {
        self.circuit
            .constant(MachineType::I32, u64::from(value as u32), GateType::NativeValue)
    }

    /// 64-bit integer constant.
    pub fn int64(&mut self, value: i64) -> GateRef {
        self.circuit
            .constant(MachineType::I64, value as u64, GateType::NativeValue)
    }

    /// Pointer-sized integer constant.
    pub fn int_ptr(&mut self, value: i64) -> GateRef {
        if self.config.is_64bit() {
            self.int64(value)
        } else {
            self.int32(value as i32)
        }
    }

    /// Double constant.
    pub fn double(&mut self, value: f64) -> GateRef {
        self.circuit
            .constant(MachineType::F64, value.to_bits(), GateType::NativeValue)
    }

    /// Boolean constant.
    pub fn boolean(&mut self, value: bool) -> GateRef {
        self.circuit
            .constant(MachineType::I1, u64::from(value), GateType::NativeValue)
    }

    /// The tagged `undefined` value, typed as `gate_type`.
    pub fn undefined_constant(&mut self, gate_type: GateType) -> GateRef {
        self.circuit
            .constant(MachineType::I64, TAGGED_UNDEFINED, gate_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Triple};

    #[test]
    fn test_value_selector_layout() {
        let mut circuit = Circuit::new();
        let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        let control = builder.circuit().state_root();
        let a = builder.int32(1);
        let phi = builder
            .selector(
                OpCode::ValueSelector,
                MachineType::I32,
                control,
                &[a],
                2,
                GateType::NativeValue,
            )
            .unwrap();

        let circuit = builder.circuit();
        assert_eq!(circuit.state_in(phi, 0), Ok(Some(control)));
        assert_eq!(circuit.value_in(phi, 0), Ok(Some(a)));
        assert_eq!(circuit.value_in(phi, 1), Ok(None));
    }

    #[test]
    fn test_depend_and_joins_chains() {
        let mut circuit = Circuit::new();
        let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        let depend = builder.circuit().depend_root();
        let value = builder.int32(3);
        let store = builder
            .effect(OpCode::Store, VariableType::VOID, depend, &[value])
            .unwrap();
        let joined = builder.depend_and(&[depend, store]).unwrap();

        let circuit = builder.circuit();
        assert_eq!(circuit.opcode(joined), Ok(OpCode::DependAnd));
        assert_eq!(circuit.depend_in(joined, 0), Ok(Some(depend)));
        assert_eq!(circuit.depend_in(joined, 1), Ok(Some(store)));
        assert_eq!(circuit.gate(joined).unwrap().state_count(), 0);
    }

    #[test]
    fn test_depend_selector_layout() {
        let mut circuit = Circuit::new();
        let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        let control = builder.circuit().state_root();
        let depend = builder.circuit().depend_root();
        let selector = builder
            .selector(
                OpCode::DependSelector,
                MachineType::NoValue,
                control,
                &[depend],
                2,
                GateType::Empty,
            )
            .unwrap();

        let circuit = builder.circuit();
        assert_eq!(circuit.depend_in(selector, 0), Ok(Some(depend)));
        assert_eq!(circuit.depend_in(selector, 1), Ok(None));
        assert_eq!(circuit.gate(selector).unwrap().value_count(), 0);
    }

    #[test]
    fn test_selector_rejects_non_selector_opcode() {
        let mut circuit = Circuit::new();
        let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        let control = builder.circuit().state_root();
        let result = builder.selector(
            OpCode::Merge,
            MachineType::NoValue,
            control,
            &[],
            2,
            GateType::Empty,
        );
        assert!(matches!(result, Err(Error::Invariant { .. })));
    }

    #[test]
    fn test_arch_pointer_resolution() {
        let mut circuit = Circuit::new();
        let builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        assert_eq!(builder.resolve(MachineType::ArchPointer), MachineType::I64);

        let mut circuit = Circuit::new();
        let mut builder =
            CircuitBuilder::new(&mut circuit, CompilationConfig::for_triple(Triple::Arm32));
        assert_eq!(builder.resolve(MachineType::ArchPointer), MachineType::I32);
        let ptr = builder.int_ptr(16);
        assert_eq!(
            builder.circuit().gate(ptr).unwrap().machine_type(),
            MachineType::I32
        );
    }

    #[test]
    fn test_constants() {
        let mut circuit = Circuit::new();
        let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        let minus_one = builder.int32(-1);
        assert_eq!(
            builder.circuit().gate(minus_one).unwrap().payload(),
            0xFFFF_FFFF
        );
        assert_eq!(builder.boolean(true), builder.boolean(true));
        assert_ne!(
            builder.undefined_constant(GateType::TaggedValue),
            builder.undefined_constant(GateType::TaggedPointer)
        );
        let half = builder.double(0.5);
        assert_eq!(builder.circuit().gate(half).unwrap().payload(), 0.5f64.to_bits());
    }

    #[test]
    fn test_return_links_return_list() {
        let mut circuit = Circuit::new();
        let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        let control = builder.circuit().state_root();
        let depend = builder.circuit().depend_root();
        let value = builder.int32(0);
        let ret = builder.return_value(control, depend, value).unwrap();
        let return_list = builder.circuit().return_list();
        assert_eq!(builder.circuit().value_in(ret, 1), Ok(Some(return_list)));
    }

    #[test]
    fn test_effect_threads_depend() {
        let mut circuit = Circuit::new();
        let mut builder = CircuitBuilder::new(&mut circuit, CompilationConfig::default());
        let depend = builder.circuit().depend_root();
        let address = builder.int_ptr(0x1000);
        let load = builder
            .effect(OpCode::Load, VariableType::INT32, depend, &[address])
            .unwrap();
        assert_eq!(builder.circuit().depend_in(load, 0), Ok(Some(depend)));
        assert_eq!(builder.circuit().value_in(load, 0), Ok(Some(address)));
    }
}
