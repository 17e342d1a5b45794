//! The construction environment of one compilation unit.
//!
//! An [`Environment`] owns everything needed to build one function into a
//! circuit: the [`CircuitBuilder`] (and with it the only mutable borrow of the
//! circuit), the label and variable arenas, the entry label and the cursor to
//! the label currently being emitted into.
//!
//! Besides the raw label operations it offers the control-flow helpers a
//! translator drives: jumps, branches, switches, loops and returns. Each helper
//! creates the control gate, records the edge on the target label and leaves
//! the current label, so that the next label has to be bound explicitly.

use std::{collections::HashMap, fmt};

use crate::{
    builder::{
        label::{LabelData, LabelState},
        variable::VariableData,
        Label, Variable,
    },
    circuit::{Circuit, CircuitBuilder, GateRef, OpCode, VariableType},
    CompilationConfig, Error, Result,
};

/// Summary of one finished construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstructionStats {
    /// Labels created, entry included
    pub labels: usize,
    /// Variables declared
    pub variables: usize,
    /// Selectors created for variables
    pub phis_created: usize,
    /// Selectors removed again as trivial
    pub phis_removed: usize,
}

impl ConstructionStats {
    /// Returns the number of variable selectors left in the circuit.
    #[must_use]
    pub const fn live_phis(&self) -> usize {
        self.phis_created - self.phis_removed
    }
}

impl fmt::Display for ConstructionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} labels, {} variables, {} phis ({} removed)",
            self.labels, self.variables, self.phis_created, self.phis_removed
        )
    }
}

/// SSA construction state for one function.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::{Circuit, CompilationConfig, Environment, OpCode, VariableType};
///
/// let mut circuit = Circuit::new();
/// let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 1);
///
/// // f(x) { if (cond) { x = 1 } else { x = 2 }; return x; }
/// let x = env.new_variable(VariableType::INT32, env.arguments()[0])?;
/// let then_label = env.new_label();
/// let else_label = env.new_label();
/// let join = env.new_label();
///
/// let cond = env.builder_mut().boolean(true);
/// env.branch(cond, then_label, else_label)?;
///
/// env.bind(then_label)?;
/// let one = env.builder_mut().int32(1);
/// env.write(x, one)?;
/// env.jump(join)?;
///
/// env.bind(else_label)?;
/// let two = env.builder_mut().int32(2);
/// env.write(x, two)?;
/// env.jump(join)?;
///
/// env.bind(join)?;
/// let phi = env.read(x)?;
/// assert_eq!(env.circuit().opcode(phi)?, OpCode::ValueSelector);
/// assert_eq!(env.circuit().value_in(phi, 0)?, Some(one));
/// assert_eq!(env.circuit().value_in(phi, 1)?, Some(two));
///
/// env.ret(phi)?;
/// let stats = env.finish();
/// assert_eq!(stats.live_phis(), 1);
/// # Ok::<(), circuit_ssa::Error>(())
/// ```
#[derive(Debug)]
pub struct Environment<'c> {
    pub(crate) builder: CircuitBuilder<'c>,
    pub(crate) labels: Vec<LabelData>,
    pub(crate) variables: Vec<VariableData>,
    /// Variable selectors still in the circuit, with the label and variable
    /// they were created for
    pub(crate) phi_owners: HashMap<GateRef, (Label, Variable)>,
    /// Label bindings that hold a variable selector
    pub(crate) phi_bindings: HashMap<GateRef, Vec<(Label, Variable)>>,
    /// Removed selectors and their replacement
    pub(crate) forwards: HashMap<GateRef, GateRef>,
    pub(crate) stats: ConstructionStats,
    entry: Label,
    pub(crate) current: Option<Label>,
    /// Callers of the open sub-CFGs, innermost last
    sub_cfgs: Vec<Label>,
    arguments: Vec<GateRef>,
    input_list: Vec<GateRef>,
}

impl<'c> Environment<'c> {
    /// Creates an environment for a function taking `argument_count` arguments.
    ///
    /// The entry label starts at the state root of `circuit`, depends on its
    /// depend root and is already sealed.
    pub fn new(circuit: &'c mut Circuit, config: CompilationConfig, argument_count: usize) -> Self {
        let state = circuit.state_root();
        let depend = circuit.depend_root();
        let mut builder = CircuitBuilder::new(circuit, config);
        let arguments = (0..argument_count)
            .map(|index| builder.arguments(index))
            .collect();

        log::debug!("environment for {} arguments", argument_count);
        Self::with_entry(builder, state, depend, arguments, Vec::new())
    }

    /// Creates an environment continuing from the high-level gate `hir`.
    ///
    /// The entry label starts at `hir`'s first in (its control), depends on its
    /// second in, and the remaining ins become the input list.
    ///
    /// # Errors
    ///
    /// Returns an error if `hir` does not exist or has an empty control, depend
    /// or input slot.
    pub fn from_hir(circuit: &'c mut Circuit, config: CompilationConfig, hir: GateRef) -> Result<Self> {
        let gate = circuit.gate(hir)?;
        if gate.num_ins() < 2 {
            return Err(invariant_error!(
                "Gate {} has {} ins, expected control and depend",
                hir,
                gate.num_ins()
            ));
        }

        let mut ins = Vec::with_capacity(gate.num_ins());
        for (slot, input) in gate.ins().iter().enumerate() {
            ins.push(input.ok_or_else(|| invariant_error!("Slot {} of {} is empty", slot, hir))?);
        }
        let inputs = ins.split_off(2);

        log::debug!("environment from {} with {} inputs", hir, inputs.len());
        let builder = CircuitBuilder::new(circuit, config);
        Ok(Self::with_entry(builder, ins[0], ins[1], Vec::new(), inputs))
    }

    /// Creates an environment with explicit roots and a fixed input list.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the gates does not exist.
    pub fn from_roots(
        circuit: &'c mut Circuit,
        config: CompilationConfig,
        state: GateRef,
        depend: GateRef,
        inputs: &[GateRef],
    ) -> Result<Self> {
        for &gate in [state, depend].iter().chain(inputs) {
            circuit.gate(gate)?;
        }

        log::debug!("environment from roots {}/{} with {} inputs", state, depend, inputs.len());
        let builder = CircuitBuilder::new(circuit, config);
        Ok(Self::with_entry(builder, state, depend, Vec::new(), inputs.to_vec()))
    }

    fn with_entry(
        builder: CircuitBuilder<'c>,
        state: GateRef,
        depend: GateRef,
        arguments: Vec<GateRef>,
        input_list: Vec<GateRef>,
    ) -> Self {
        let mut entry = LabelData::new(Some(state));
        entry.depend = Some(depend);
        entry.state = LabelState::Bound;
        entry.control_merged = true;

        Self {
            builder,
            labels: vec![entry],
            variables: Vec::new(),
            phi_owners: HashMap::new(),
            phi_bindings: HashMap::new(),
            forwards: HashMap::new(),
            stats: ConstructionStats::default(),
            entry: Label::new(0),
            current: Some(Label::new(0)),
            sub_cfgs: Vec::new(),
            arguments,
            input_list,
        }
    }

    /// Returns the gate factory.
    #[must_use]
    pub fn builder(&self) -> &CircuitBuilder<'c> {
        &self.builder
    }

    /// Returns the gate factory, mutably.
    pub fn builder_mut(&mut self) -> &mut CircuitBuilder<'c> {
        &mut self.builder
    }

    /// Returns the circuit under construction.
    #[must_use]
    pub fn circuit(&self) -> &Circuit {
        self.builder.circuit()
    }

    /// Returns the circuit under construction, mutably.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        self.builder.circuit_mut()
    }

    /// Returns the configuration of this compilation unit.
    #[must_use]
    pub fn config(&self) -> &CompilationConfig {
        self.builder.config()
    }

    /// Returns the entry label.
    #[must_use]
    pub const fn entry_label(&self) -> Label {
        self.entry
    }

    /// Returns the label currently emitted into.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn current_label(&self) -> Result<Label> {
        self.current.ok_or(Error::NoCurrentLabel)
    }

    /// Moves the cursor to `label` without binding it.
    pub fn set_current_label(&mut self, label: Option<Label>) {
        self.current = label;
    }

    /// Enters a nested sub-CFG at the fresh label `entry`.
    ///
    /// The current label is saved, and `entry` continues from its control and
    /// depend with the current label as its only predecessor, so variables of
    /// the caller stay readable. `entry` is bound and becomes current. Writes
    /// inside the sub-CFG are not seen by the caller after
    /// [`Environment::sub_cfg_exit`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] without a current label, or
    /// [`Error::InvalidLabelState`] if `entry` already has predecessors or is
    /// sealed.
    pub fn sub_cfg_entry(&mut self, entry: Label) -> Result<()> {
        let caller = self.current_label()?;
        let data = self.data(entry)?;
        if data.state != LabelState::Unsealed || !data.predecessors.is_empty() {
            return Err(Error::InvalidLabelState {
                label: entry,
                operation: "sub_cfg_entry",
                expected: "fresh",
                found: data.state.into(),
            });
        }

        let control = self.label_control(caller)?;
        let depend = self.current_depend()?;
        self.append_predecessor(entry, Some(caller))?;
        self.set_pre_control(entry, control)?;
        self.set_control(entry, control)?;
        self.set_depend(entry, depend)?;
        let data = self.data_mut(entry)?;
        data.state = LabelState::Bound;
        data.control_merged = true;

        self.sub_cfgs.push(caller);
        self.current = Some(entry);
        log::debug!("sub-cfg {} entered from {}", entry, caller);
        Ok(())
    }

    /// Leaves the innermost sub-CFG.
    ///
    /// The saved caller continues from the control and depend of the current
    /// label and becomes current again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] without a current label, or
    /// [`Error::NoOpenSubCfg`] if no sub-CFG is open.
    pub fn sub_cfg_exit(&mut self) -> Result<()> {
        let inner = self.current_label()?;
        let caller = self.sub_cfgs.pop().ok_or(Error::NoOpenSubCfg)?;
        let control = self.label_control(inner)?;
        let depend = self.current_depend()?;
        self.set_control(caller, control)?;
        self.set_depend(caller, depend)?;
        self.current = Some(caller);
        log::debug!("sub-cfg left from {} back to {}", inner, caller);
        Ok(())
    }

    /// Returns the argument gates, in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[GateRef] {
        &self.arguments
    }

    /// Returns the gate of argument `index`.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<GateRef> {
        self.arguments.get(index).copied()
    }

    /// Returns the inputs captured by [`Environment::from_hir`] or
    /// [`Environment::from_roots`].
    #[must_use]
    pub fn input_list(&self) -> &[GateRef] {
        &self.input_list
    }

    /// Returns the construction counters so far.
    #[must_use]
    pub fn stats(&self) -> ConstructionStats {
        ConstructionStats {
            labels: self.labels.len(),
            variables: self.variables.len(),
            ..self.stats
        }
    }

    /// Ends construction and releases the circuit.
    #[must_use]
    pub fn finish(self) -> ConstructionStats {
        let stats = self.stats();
        log::debug!("finished construction: {}", stats);
        stats
    }

    /// Reads `var` in the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label, or
    /// any error of [`Environment::read_variable`].
    pub fn read(&mut self, var: Variable) -> Result<GateRef> {
        let label = self.current_label()?;
        self.read_variable(label, var)
    }

    /// Writes `var` in the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn write(&mut self, var: Variable, value: GateRef) -> Result<()> {
        let label = self.current_label()?;
        self.write_variable(label, var, value)
    }

    /// Returns the control gate of the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn current_control(&self) -> Result<GateRef> {
        let label = self.current_label()?;
        self.control(label)?
            .ok_or_else(|| invariant_error!("Current label {} has no control", label))
    }

    /// Returns the head of the dependency chain of the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn current_depend(&self) -> Result<GateRef> {
        let label = self.current_label()?;
        self.depend(label)?
            .ok_or_else(|| invariant_error!("Current label {} has no depend", label))
    }

    fn label_control(&self, label: Label) -> Result<GateRef> {
        self.control(label)?
            .ok_or_else(|| invariant_error!("Label {} has no control", label))
    }

    /// Records the edge `from -> target` through the control gate `edge`.
    fn link(&mut self, from: Label, target: Label, edge: GateRef) -> Result<()> {
        self.set_control(from, edge)?;
        self.append_predecessor(target, Some(from))?;
        self.merge_control(target, edge)
    }

    /// Adds an unconditional edge from `from` to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` has no control.
    pub fn jump_from(&mut self, from: Label, target: Label) -> Result<()> {
        let control = self.label_control(from)?;
        let goto = self.builder.goto(control)?;
        self.link(from, target, goto)
    }

    /// Jumps from the current label to `target` and leaves the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn jump(&mut self, target: Label) -> Result<()> {
        let current = self.current_label()?;
        self.jump_from(current, target)?;
        self.current = None;
        Ok(())
    }

    /// Branches on `condition` to `true_label` or `false_label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn branch(&mut self, condition: GateRef, true_label: Label, false_label: Label) -> Result<()> {
        let current = self.current_label()?;
        let control = self.label_control(current)?;
        let branch = self.builder.if_branch(control, condition)?;

        let if_true = self.builder.if_true(branch)?;
        self.link(current, true_label, if_true)?;
        let if_false = self.builder.if_false(branch)?;
        self.link(current, false_label, if_false)?;

        self.current = None;
        Ok(())
    }

    /// Dispatches on `index` to the label of the matching key, or to
    /// `default_label` when no key matches.
    ///
    /// # Errors
    ///
    /// Returns an error if `keys` and `labels` differ in length, or
    /// [`Error::NoCurrentLabel`] after control left the last label.
    pub fn switch(&mut self, index: GateRef, default_label: Label, keys: &[i64], labels: &[Label]) -> Result<()> {
        if keys.len() != labels.len() {
            return Err(invariant_error!(
                "Switch with {} keys but {} labels",
                keys.len(),
                labels.len()
            ));
        }
        let current = self.current_label()?;
        let control = self.label_control(current)?;
        let switch = self.builder.switch_branch(control, index, keys.len())?;

        let default_case = self.builder.default_case(switch)?;
        self.link(current, default_label, default_case)?;
        for (&key, &label) in keys.iter().zip(labels) {
            let case = self.builder.switch_case(switch, key)?;
            self.link(current, label, case)?;
        }

        self.current = None;
        Ok(())
    }

    /// Enters the loop headed by `head` from the current label.
    ///
    /// Creates the loop-begin gate with its back-edge slot open, binds `head`
    /// with its single forward predecessor and makes it current. Reads in the
    /// loop body until [`Environment::loop_end`] get placeholder selectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn loop_begin(&mut self, head: Label) -> Result<()> {
        let current = self.current_label()?;
        let control = self.label_control(current)?;
        let loop_begin = self.builder.loop_begin(control)?;
        self.link(current, head, loop_begin)?;
        self.bind(head)
    }

    /// Closes the loop headed by `head` with a back edge from the current label.
    ///
    /// Seals `head`, which completes its placeholder selectors, patches the
    /// back edge into the loop-begin gate and the loop dependency selector, and
    /// leaves the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLoopHeader`] if `head` does not end up with
    /// exactly two predecessors, or [`Error::NoCurrentLabel`] after control left
    /// the last label.
    pub fn loop_end(&mut self, head: Label) -> Result<()> {
        let current = self.current_label()?;
        let control = self.label_control(current)?;
        let loop_back = self.builder.loop_end(control)?;
        self.link(current, head, loop_back)?;

        self.seal(head)?;
        self.merge_all_control(head)?;
        self.merge_all_depend(head)?;
        self.current = None;
        Ok(())
    }

    /// Returns `value` and leaves the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn ret(&mut self, value: GateRef) -> Result<GateRef> {
        let current = self.current_label()?;
        let control = self.current_control()?;
        let depend = self.current_depend()?;
        let ret = self.builder.return_value(control, depend, value)?;
        self.set_control(current, ret)?;
        self.current = None;
        Ok(ret)
    }

    /// Returns without a value and leaves the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn ret_void(&mut self) -> Result<GateRef> {
        let current = self.current_label()?;
        let control = self.current_control()?;
        let depend = self.current_depend()?;
        let ret = self.builder.return_void(control, depend)?;
        self.set_control(current, ret)?;
        self.current = None;
        Ok(ret)
    }

    /// Emits an effectful gate at the end of the current label's dependency
    /// chain and makes it the new chain head.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`] after control left the last label.
    pub fn append_effect(&mut self, opcode: OpCode, var_type: VariableType, values: &[GateRef]) -> Result<GateRef> {
        let current = self.current_label()?;
        let depend = self.current_depend()?;
        let effect = self.builder.effect(opcode, var_type, depend, values)?;
        self.set_depend(current, effect)?;
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{GateShape, GateType, MachineType};

    #[test]
    fn test_entry_is_sealed_and_current() {
        let mut circuit = Circuit::new();
        let state = circuit.state_root();
        let depend = circuit.depend_root();
        let env = Environment::new(&mut circuit, CompilationConfig::default(), 2);

        let entry = env.entry_label();
        assert_eq!(env.current_label(), Ok(entry));
        assert!(env.is_sealed(entry).unwrap());
        assert_eq!(env.control(entry), Ok(Some(state)));
        assert_eq!(env.depend(entry), Ok(Some(depend)));
        assert_eq!(env.arguments().len(), 2);
        assert_eq!(env.circuit().opcode(env.arguments()[1]), Ok(OpCode::Arg));
        assert!(env.input_list().is_empty());
    }

    #[test]
    fn test_argument_read_in_entry() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 1);
        let arg = env.argument(0).unwrap();
        let x = env.new_variable(VariableType::JS_ANY, arg).unwrap();
        let created = env.stats().phis_created;
        assert_eq!(env.read(x), Ok(arg));
        assert_eq!(env.stats().phis_created, created);
    }

    #[test]
    fn test_from_hir() {
        let mut circuit = Circuit::new();
        let state = circuit.state_root();
        let depend = circuit.depend_root();
        let a = circuit.constant(MachineType::I32, 1, GateType::NativeValue);
        let b = circuit.constant(MachineType::I32, 2, GateType::NativeValue);
        let call = circuit
            .new_gate(
                OpCode::Call,
                MachineType::I64,
                GateType::TaggedValue,
                0,
                GateShape::new(1, 1, 2),
                &[state, depend, a, b],
            )
            .unwrap();

        let env = Environment::from_hir(&mut circuit, CompilationConfig::default(), call).unwrap();
        let entry = env.entry_label();
        assert_eq!(env.control(entry), Ok(Some(state)));
        assert_eq!(env.depend(entry), Ok(Some(depend)));
        assert_eq!(env.input_list(), &[a, b]);
        assert!(env.is_sealed(entry).unwrap());
    }

    #[test]
    fn test_from_hir_rejects_leaf() {
        let mut circuit = Circuit::new();
        let leaf = circuit.constant(MachineType::I32, 1, GateType::NativeValue);
        assert!(matches!(
            Environment::from_hir(&mut circuit, CompilationConfig::default(), leaf),
            Err(Error::Invariant { .. })
        ));
    }

    #[test]
    fn test_from_roots() {
        let mut circuit = Circuit::new();
        let state = circuit.state_root();
        let depend = circuit.depend_root();
        let input = circuit.constant(MachineType::I64, 9, GateType::TaggedValue);
        let env =
            Environment::from_roots(&mut circuit, CompilationConfig::default(), state, depend, &[input])
                .unwrap();
        assert_eq!(env.input_list(), &[input]);
        assert_eq!(env.current_label(), Ok(env.entry_label()));
    }

    #[test]
    fn test_no_current_label_after_jump() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let target = env.new_label();
        env.jump(target).unwrap();
        assert_eq!(env.current_label(), Err(Error::NoCurrentLabel));
        assert_eq!(env.ret_void(), Err(Error::NoCurrentLabel));
        env.bind(target).unwrap();
        assert_eq!(env.current_label(), Ok(target));
    }

    #[test]
    fn test_switch_edges() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let index = env.builder_mut().int32(3);
        let default_label = env.new_label();
        let cases = [env.new_label(), env.new_label()];
        env.switch(index, default_label, &[1, 3], &cases).unwrap();

        let default_case = env.pre_control(default_label).unwrap().unwrap();
        assert_eq!(env.circuit().opcode(default_case), Ok(OpCode::DefaultCase));
        let second = env.pre_control(cases[1]).unwrap().unwrap();
        assert_eq!(env.circuit().opcode(second), Ok(OpCode::SwitchCase));
        assert_eq!(env.circuit().gate(second).unwrap().payload(), 3);

        env.bind(cases[1]).unwrap();
        assert!(env.is_control_case(cases[1]).unwrap());
        assert!(matches!(
            env.switch(index, default_label, &[1], &[]),
            Err(Error::Invariant { .. })
        ));
    }

    #[test]
    fn test_append_effect_threads_depend() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let address = env.builder_mut().int_ptr(0x40);
        let value = env.builder_mut().int32(5);
        let store = env
            .append_effect(OpCode::Store, VariableType::VOID, &[address, value])
            .unwrap();
        let load = env
            .append_effect(OpCode::Load, VariableType::INT32, &[address])
            .unwrap();

        assert_eq!(env.circuit().depend_in(load, 0), Ok(Some(store)));
        assert_eq!(env.current_depend(), Ok(load));
    }

    #[test]
    fn test_ret_uses_current_chain() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 1);
        let arg = env.argument(0).unwrap();
        let ret = env.ret(arg).unwrap();

        let circuit = env.circuit();
        assert_eq!(circuit.opcode(ret), Ok(OpCode::Return));
        assert_eq!(circuit.state_in(ret, 0), Ok(Some(circuit.state_root())));
        assert_eq!(circuit.value_in(ret, 0), Ok(Some(arg)));
    }

    #[test]
    fn test_finish_counts() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        env.new_label();
        env.declare(VariableType::BOOL);
        let stats = env.finish();
        assert_eq!(stats.labels, 2);
        assert_eq!(stats.variables, 1);
        assert_eq!(stats.live_phis(), 0);
        assert_eq!(stats.to_string(), "2 labels, 1 variables, 0 phis (0 removed)");
    }

    #[test]
    fn test_sub_cfg_entry_requires_fresh_label() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let entry = env.entry_label();
        let target = env.new_label();
        env.jump_from(entry, target).unwrap();

        assert!(matches!(
            env.sub_cfg_entry(target),
            Err(Error::InvalidLabelState {
                operation: "sub_cfg_entry",
                ..
            })
        ));
        assert_eq!(env.current_label(), Ok(entry));
    }

    #[test]
    fn test_sub_cfg_exit_without_entry() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        assert_eq!(env.sub_cfg_exit(), Err(Error::NoOpenSubCfg));

        env.ret_void().unwrap();
        let sub = env.new_label();
        assert_eq!(env.sub_cfg_entry(sub), Err(Error::NoCurrentLabel));
    }
}
