//! Labels: basic-block entry points and the SSA read/write/seal/merge core.
//!
//! A [`Label`] is a small handle into the label arena of an
//! [`Environment`]. The per-label state lives in `LabelData` and is only
//! touched through `Environment` methods, which take the handle explicitly.
//!
//! # Lifecycle
//!
//! ```text
//! Unsealed --seal--> Sealed --merge_all_depend--> Bound
//! ```
//!
//! A label is sealed once its predecessor count reaches the expected in-degree
//! of its pending control gate. Reads in an unsealed label create placeholder
//! selectors, which are completed when the label is sealed. Binding a sealed
//! label synthesizes its control merge and its dependency merge from the final
//! predecessor list.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use strum::{Display, IntoStaticStr};

use crate::{
    builder::{Environment, Variable},
    circuit::{GateRef, GateType, MachineType, OpCode},
    Error, Result,
};

/// Handle of a label within its [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(u32);

impl Label {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Returns the arena index of this label.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Lifecycle state of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum LabelState {
    /// More predecessors may still be appended
    Unsealed,
    /// The predecessor set is final and incomplete phis are filled
    Sealed,
    /// Control and dependency merges are synthesized
    Bound,
}

impl LabelState {
    /// Returns `true` once the predecessor set is final.
    #[must_use]
    pub const fn is_sealed(self) -> bool {
        matches!(self, LabelState::Sealed | LabelState::Bound)
    }

    fn name(self) -> &'static str {
        self.into()
    }
}

/// Value of a variable as currently known in one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// No value is known in this label yet; a read resolves it through the
    /// predecessors
    Unresolved,
    /// The variable holds this gate
    Resolved(GateRef),
}

impl Binding {
    /// Returns the bound gate, if any.
    #[must_use]
    pub const fn gate(self) -> Option<GateRef> {
        match self {
            Binding::Unresolved => None,
            Binding::Resolved(gate) => Some(gate),
        }
    }
}

/// Per-label construction state.
#[derive(Debug, Clone)]
pub(crate) struct LabelData {
    pub(crate) predecessors: Vec<Label>,
    pub(crate) values: HashMap<Variable, Binding>,
    pub(crate) incomplete_phis: BTreeMap<Variable, GateRef>,
    pub(crate) state: LabelState,
    pub(crate) control_merged: bool,
    pub(crate) pre_control: Option<GateRef>,
    pub(crate) control: Option<GateRef>,
    pub(crate) other_pre_controls: Vec<GateRef>,
    pub(crate) depend: Option<GateRef>,
    pub(crate) loop_depend: Option<GateRef>,
}

impl LabelData {
    pub(crate) fn new(control: Option<GateRef>) -> Self {
        Self {
            predecessors: Vec::new(),
            values: HashMap::new(),
            incomplete_phis: BTreeMap::new(),
            state: LabelState::Unsealed,
            control_merged: false,
            pre_control: control,
            control,
            other_pre_controls: Vec::new(),
            depend: None,
            loop_depend: None,
        }
    }
}

/// Result of walking a single-predecessor chain.
enum Lookup {
    /// The value was found; every label on `chain` adopts it
    Found { value: GateRef, chain: Vec<Label> },
    /// A sealed label with several predecessors needs a selector
    Merge { label: Label, chain: Vec<Label> },
}

/// A merge selector whose operands are still being resolved.
struct PendingPhi {
    phi: GateRef,
    first_slot: usize,
    filled: usize,
    predecessors: Vec<Label>,
    chain: Vec<Label>,
}

impl PendingPhi {
    fn next(&self) -> Option<Label> {
        self.predecessors.get(self.filled).copied()
    }
}

impl Environment<'_> {
    pub(crate) fn data(&self, label: Label) -> Result<&LabelData> {
        self.labels
            .get(label.index())
            .ok_or_else(|| invariant_error!("Label {} does not belong to this environment", label))
    }

    pub(crate) fn data_mut(&mut self, label: Label) -> Result<&mut LabelData> {
        self.labels
            .get_mut(label.index())
            .ok_or_else(|| invariant_error!("Label {} does not belong to this environment", label))
    }

    /// Creates a new unsealed label without a control gate.
    ///
    /// The label receives its control when the first edge reaches it, through
    /// [`Environment::merge_control`] or one of the control-flow helpers.
    pub fn new_label(&mut self) -> Label {
        self.push_label(LabelData::new(None))
    }

    /// Creates a new unsealed label whose pending control is `control`.
    pub fn new_label_with_control(&mut self, control: GateRef) -> Label {
        self.push_label(LabelData::new(Some(control)))
    }

    pub(crate) fn push_label(&mut self, data: LabelData) -> Label {
        let label = Label::new(self.labels.len());
        self.labels.push(data);
        label
    }

    /// Returns the lifecycle state of `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn state(&self, label: Label) -> Result<LabelState> {
        Ok(self.data(label)?.state)
    }

    /// Returns `true` once the predecessor set of `label` is final.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn is_sealed(&self, label: Label) -> Result<bool> {
        Ok(self.state(label)?.is_sealed())
    }

    /// Returns the predecessors of `label` in discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn predecessors(&self, label: Label) -> Result<&[Label]> {
        Ok(&self.data(label)?.predecessors)
    }

    /// Returns the current control gate of `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn control(&self, label: Label) -> Result<Option<GateRef>> {
        Ok(self.data(label)?.control)
    }

    /// Returns the pending control gate of `label`, the first control that
    /// reached it (or the merge replacing it).
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn pre_control(&self, label: Label) -> Result<Option<GateRef>> {
        Ok(self.data(label)?.pre_control)
    }

    /// Returns the head of the dependency chain of `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn depend(&self, label: Label) -> Result<Option<GateRef>> {
        Ok(self.data(label)?.depend)
    }

    /// Returns the loop dependency selector of a bound loop header.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn loop_depend(&self, label: Label) -> Result<Option<GateRef>> {
        Ok(self.data(label)?.loop_depend)
    }

    /// Sets the current control gate of `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn set_control(&mut self, label: Label, control: GateRef) -> Result<()> {
        self.data_mut(label)?.control = Some(control);
        Ok(())
    }

    /// Sets the pending control gate of `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn set_pre_control(&mut self, label: Label, control: GateRef) -> Result<()> {
        self.data_mut(label)?.pre_control = Some(control);
        Ok(())
    }

    /// Sets the head of the dependency chain of `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn set_depend(&mut self, label: Label, depend: GateRef) -> Result<()> {
        self.data_mut(label)?.depend = Some(depend);
        Ok(())
    }

    /// Returns the binding of `var` in `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn binding(&self, label: Label, var: Variable) -> Result<Binding> {
        Ok(self
            .data(label)?
            .values
            .get(&var)
            .copied()
            .unwrap_or(Binding::Unresolved))
    }

    /// Records `predecessor` as a new incoming edge of `label`.
    ///
    /// `None` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLabelState`] if `label` is already sealed.
    pub fn append_predecessor(&mut self, label: Label, predecessor: Option<Label>) -> Result<()> {
        let Some(predecessor) = predecessor else {
            return Ok(());
        };
        self.data(predecessor)?;
        let data = self.data_mut(label)?;
        if data.state.is_sealed() {
            return Err(Error::InvalidLabelState {
                label,
                operation: "append_predecessor",
                expected: LabelState::Unsealed.name(),
                found: data.state.name(),
            });
        }
        data.predecessors.push(predecessor);
        Ok(())
    }

    /// Registers `control` as the control gate of a new incoming edge.
    ///
    /// The first control becomes the pending control of the label; later ones
    /// are kept in discovery order for the control merge.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn merge_control(&mut self, label: Label, control: GateRef) -> Result<()> {
        let data = self.data_mut(label)?;
        if data.pre_control.is_none() {
            data.pre_control = Some(control);
            data.control = Some(control);
        } else {
            data.other_pre_controls.push(control);
        }
        Ok(())
    }

    /// Returns `true` if `label` has as many predecessors as its pending
    /// control gate expects.
    ///
    /// # Errors
    ///
    /// Returns an error if no control has reached `label` yet.
    pub fn is_need_seal(&self, label: Label) -> Result<bool> {
        let data = self.data(label)?;
        let control = data
            .pre_control
            .ok_or_else(|| invariant_error!("Label {} has no pending control", label))?;
        let expected = self.circuit().expected_in_degree(control)?;
        Ok(data.predecessors.len() >= expected)
    }

    /// Returns `true` if the pending control of `label` is a loop header.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn is_loop_head(&self, label: Label) -> Result<bool> {
        match self.data(label)?.pre_control {
            Some(control) => self.circuit().is_loop_head(control),
            None => Ok(false),
        }
    }

    /// Returns `true` if `label` is entered through an arm of a conditional
    /// branch or switch.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn is_control_case(&self, label: Label) -> Result<bool> {
        match self.data(label)?.pre_control {
            Some(control) => self.circuit().is_control_case(control),
            None => Ok(false),
        }
    }

    /// Binds `value` to `var` in `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if `label` belongs to another environment.
    pub fn write_variable(&mut self, label: Label, var: Variable, value: GateRef) -> Result<()> {
        self.variable_data(var)?;
        self.set_binding(label, var, value)
    }

    pub(crate) fn set_binding(&mut self, label: Label, var: Variable, value: GateRef) -> Result<()> {
        self.data_mut(label)?
            .values
            .insert(var, Binding::Resolved(value));
        if self.phi_owners.contains_key(&value) {
            self.phi_bindings.entry(value).or_default().push((label, var));
        }
        Ok(())
    }

    /// Returns the value of `var` at the current point of `label`.
    ///
    /// A resolved binding is returned as is; otherwise the value is looked up
    /// through the predecessors, creating selectors at merge points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsealedNonLoopRead`] if resolution reaches an unsealed
    /// label that is not a loop header, or [`Error::RecursionLimit`] if more
    /// merge points than configured are pending at once.
    pub fn read_variable(&mut self, label: Label, var: Variable) -> Result<GateRef> {
        if let Binding::Resolved(value) = self.binding(label, var)? {
            return Ok(value);
        }
        self.read_variable_recursive(label, var)
    }

    /// Resolves `var` in `label` through its predecessors, ignoring any
    /// binding `label` itself holds.
    ///
    /// Resolution does not recurse on the call stack. Single-predecessor chains
    /// are walked in place and every label on a chain adopts the result. A
    /// merge point pushes its new selector onto an explicit stack and resolves
    /// the operands one predecessor at a time; a selector is completed, and
    /// possibly removed as trivial, once its last operand is known.
    ///
    /// # Errors
    ///
    /// See [`Environment::read_variable`].
    pub fn read_variable_recursive(&mut self, label: Label, var: Variable) -> Result<GateRef> {
        self.variable_data(var)?;
        let limit = self.config().max_read_depth;
        let mut pending: Vec<PendingPhi> = Vec::new();
        let mut lookup = self.lookup(label, var, false)?;

        loop {
            let mut value = match lookup {
                Lookup::Found { value, chain } => {
                    self.adopt(&chain, var, value)?;
                    value
                }
                Lookup::Merge { label, chain } => {
                    if pending.len() >= limit {
                        return Err(Error::RecursionLimit(limit));
                    }
                    let merge = self.open_merge(label, var, chain)?;
                    let first = merge.next().ok_or(Error::NoPredecessors(label))?;
                    pending.push(merge);
                    lookup = self.lookup(first, var, true)?;
                    continue;
                }
            };

            loop {
                let Some(top) = pending.last_mut() else {
                    return Ok(value);
                };
                self.circuit_mut().new_in(top.phi, top.first_slot + top.filled, value)?;
                top.filled += 1;
                if let Some(next) = top.next() {
                    lookup = self.lookup(next, var, true)?;
                    break;
                }
                if let Some(done) = pending.pop() {
                    value = self.try_remove_trivial_phi(done.phi)?;
                    self.adopt(&done.chain, var, value)?;
                }
            }
        }
    }

    /// Walks the single-predecessor chain starting at `start` until a value or
    /// a merge point is found.
    fn lookup(&mut self, start: Label, var: Variable, check_start: bool) -> Result<Lookup> {
        let mut chain = Vec::new();
        let mut cursor = start;
        loop {
            if check_start || cursor != start {
                if let Binding::Resolved(value) = self.binding(cursor, var)? {
                    let value = self.forwarded(value);
                    return Ok(Lookup::Found { value, chain });
                }
            }

            let data = self.data(cursor)?;
            let sealed = data.state.is_sealed();
            let count = data.predecessors.len();
            let first = data.predecessors.first().copied();

            if !sealed {
                let value = self.new_placeholder(cursor, var)?;
                return Ok(Lookup::Found { value, chain });
            }
            match (count, first) {
                (0, _) => {
                    let value = self.undefined_value(var)?;
                    return Ok(Lookup::Found { value, chain });
                }
                (1, Some(single)) => {
                    if chain.len() > self.labels.len() {
                        return Err(invariant_error!(
                            "Single-predecessor cycle through {} while reading {}",
                            cursor,
                            var
                        ));
                    }
                    chain.push(cursor);
                    cursor = single;
                }
                _ => return Ok(Lookup::Merge { label: cursor, chain }),
            }
        }
    }

    fn adopt(&mut self, chain: &[Label], var: Variable, value: GateRef) -> Result<()> {
        for &label in chain {
            self.set_binding(label, var, value)?;
        }
        Ok(())
    }

    fn new_placeholder(&mut self, label: Label, var: Variable) -> Result<GateRef> {
        if !self.is_loop_head(label)? {
            return Err(Error::UnsealedNonLoopRead(label));
        }
        let data = self.data(label)?;
        let control = data
            .pre_control
            .ok_or_else(|| invariant_error!("Loop header {} has no pending control", label))?;
        let count = data.predecessors.len() + 1;

        let phi = self.new_phi(label, var, control, count)?;
        self.data_mut(label)?.incomplete_phis.insert(var, phi);
        if self.config().trace {
            log::trace!("placeholder {} for {} in unsealed {} ({} operands)", phi, var, label, count);
        }
        Ok(phi)
    }

    fn open_merge(&mut self, label: Label, var: Variable, chain: Vec<Label>) -> Result<PendingPhi> {
        let data = self.data(label)?;
        let control = data
            .pre_control
            .ok_or_else(|| invariant_error!("Merge label {} has no pending control", label))?;
        let predecessors = data.predecessors.clone();

        let phi = self.new_phi(label, var, control, predecessors.len())?;
        let first_slot = self.circuit().gate(phi)?.state_count();
        Ok(PendingPhi {
            phi,
            first_slot,
            filled: 0,
            predecessors,
            chain,
        })
    }

    fn new_phi(&mut self, label: Label, var: Variable, control: GateRef, count: usize) -> Result<GateRef> {
        let var_type = self.variable_type(var)?;
        let phi = self.builder.variable_selector(var_type, control, count)?;
        self.phi_owners.insert(phi, (label, var));
        self.stats.phis_created += 1;
        self.set_binding(label, var, phi)?;
        if self.config().trace {
            log::trace!("selector {} for {} in {}", phi, var, label);
        }
        Ok(phi)
    }

    /// Marks the predecessor set of `label` final and completes every
    /// placeholder selector created while it was open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLabelState`] if `label` is already sealed.
    pub fn seal(&mut self, label: Label) -> Result<()> {
        let data = self.data_mut(label)?;
        if data.state != LabelState::Unsealed {
            return Err(Error::InvalidLabelState {
                label,
                operation: "seal",
                expected: LabelState::Unsealed.name(),
                found: data.state.name(),
            });
        }
        data.state = LabelState::Sealed;
        let incomplete = std::mem::take(&mut data.incomplete_phis);

        log::debug!("seal {} ({} incomplete phis)", label, incomplete.len());
        for phi in incomplete.into_values() {
            self.add_phi_operand(phi)?;
        }
        Ok(())
    }

    /// Binds `label` and makes it the current label.
    ///
    /// A loop header gets its two-slot dependency selector, with the back-edge
    /// slot left open. A label with all expected predecessors is sealed and its
    /// control and dependency merges are synthesized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPredecessors`] if no edge reaches `label`, or
    /// [`Error::InvalidLabelState`] if it is already bound.
    pub fn bind(&mut self, label: Label) -> Result<()> {
        let data = self.data(label)?;
        if data.predecessors.is_empty() {
            return Err(Error::NoPredecessors(label));
        }
        if data.state == LabelState::Bound {
            return Err(Error::InvalidLabelState {
                label,
                operation: "bind",
                expected: "unbound",
                found: data.state.name(),
            });
        }

        if self.is_loop_head(label)? {
            self.bind_loop_depend(label)?;
        }

        if self.is_need_seal(label)? {
            if self.state(label)? == LabelState::Unsealed {
                self.seal(label)?;
            }
            self.merge_all_control(label)?;
            self.merge_all_depend(label)?;
        }
        self.current = Some(label);
        Ok(())
    }

    fn bind_loop_depend(&mut self, label: Label) -> Result<()> {
        let data = self.data(label)?;
        if data.loop_depend.is_some() {
            return Err(invariant_error!("Loop header {} is bound twice", label));
        }
        let control = data
            .pre_control
            .ok_or_else(|| invariant_error!("Loop header {} has no pending control", label))?;
        let forward = data
            .predecessors
            .first()
            .copied()
            .ok_or(Error::NoPredecessors(label))?;
        let forward_depend = self
            .data(forward)?
            .depend
            .ok_or_else(|| invariant_error!("Forward predecessor {} of {} has no depend", forward, label))?;

        let loop_depend = self.builder.selector(
            OpCode::DependSelector,
            MachineType::NoValue,
            control,
            &[forward_depend],
            2,
            GateType::Empty,
        )?;
        let data = self.data_mut(label)?;
        data.loop_depend = Some(loop_depend);
        data.depend = Some(loop_depend);
        log::debug!("loop header {} depends on {}", label, loop_depend);
        Ok(())
    }

    /// Synthesizes the control merge of a sealed label.
    ///
    /// A loop header receives its back edge in state slot 1 of the loop-begin
    /// gate; any other label with several predecessors gets a merge over its
    /// pending control followed by the other pending controls in discovery
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLabelState`] unless `label` is sealed and not yet
    /// bound, or [`Error::MalformedLoopHeader`] for a loop header with other than
    /// two predecessors and one pending control.
    pub fn merge_all_control(&mut self, label: Label) -> Result<()> {
        let data = self.data(label)?;
        if data.state != LabelState::Sealed {
            return Err(Error::InvalidLabelState {
                label,
                operation: "merge_all_control",
                expected: LabelState::Sealed.name(),
                found: data.state.name(),
            });
        }
        let predecessors = data.predecessors.len();
        if predecessors < 2 {
            self.data_mut(label)?.control_merged = true;
            return Ok(());
        }

        let pre_control = data
            .pre_control
            .ok_or_else(|| invariant_error!("Label {} has no pending control", label))?;
        let pending = data.other_pre_controls.len();

        if self.is_loop_head(label)? {
            if predecessors != 2 || pending != 1 {
                return Err(Error::MalformedLoopHeader {
                    label,
                    predecessors,
                    pending,
                });
            }
            let back_edge = data.other_pre_controls[0];
            self.circuit_mut().new_in(pre_control, 1, back_edge)?;
            log::debug!("loop header {} closed by {}", label, back_edge);
        } else {
            if pending + 1 != predecessors {
                return Err(invariant_error!(
                    "Label {} has {} predecessors but {} pending controls",
                    label,
                    predecessors,
                    pending + 1
                ));
            }
            let mut ins = Vec::with_capacity(predecessors);
            ins.push(pre_control);
            ins.extend_from_slice(&data.other_pre_controls);

            let merge = self.builder.merge(&ins)?;
            let data = self.data_mut(label)?;
            data.pre_control = Some(merge);
            data.control = Some(merge);
            log::debug!("merge {} for {} over {} paths", merge, label, predecessors);
        }

        self.data_mut(label)?.control_merged = true;
        Ok(())
    }

    /// Synthesizes the dependency merge of a sealed label and marks it bound.
    ///
    /// With a single predecessor the label adopts that predecessor's depend,
    /// relayed through the branch arm when entered conditionally. A loop header
    /// receives the back edge's depend in its loop dependency selector. Any
    /// other label gets a dependency selector over its predecessors' depends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLabelState`] unless `label` is sealed and, with
    /// several predecessors, its control has been merged.
    pub fn merge_all_depend(&mut self, label: Label) -> Result<()> {
        let data = self.data(label)?;
        if data.state != LabelState::Sealed {
            return Err(Error::InvalidLabelState {
                label,
                operation: "merge_all_depend",
                expected: LabelState::Sealed.name(),
                found: data.state.name(),
            });
        }
        let predecessors = data.predecessors.clone();
        if predecessors.len() >= 2 && !data.control_merged {
            return Err(Error::InvalidLabelState {
                label,
                operation: "merge_all_depend",
                expected: "control merged",
                found: "control pending",
            });
        }

        let depend = match predecessors.as_slice() {
            [] => return Err(Error::NoPredecessors(label)),
            [single] => {
                let depend = self.predecessor_depend(label, *single)?;
                if self.is_control_case(label)? {
                    let control = self
                        .data(label)?
                        .pre_control
                        .ok_or_else(|| invariant_error!("Label {} has no pending control", label))?;
                    self.builder.depend_relay(control, depend)?
                } else {
                    depend
                }
            }
            [_, back_edge] if self.is_loop_head(label)? => {
                let loop_depend = self
                    .data(label)?
                    .loop_depend
                    .ok_or_else(|| invariant_error!("Loop header {} was never bound", label))?;
                let back_depend = self.predecessor_depend(label, *back_edge)?;
                self.circuit_mut().new_in(loop_depend, 2, back_depend)?;
                loop_depend
            }
            _ => {
                let mut depends = Vec::with_capacity(predecessors.len());
                for &predecessor in &predecessors {
                    depends.push(self.predecessor_depend(label, predecessor)?);
                }
                let control = self
                    .data(label)?
                    .pre_control
                    .ok_or_else(|| invariant_error!("Label {} has no pending control", label))?;
                self.builder.selector(
                    OpCode::DependSelector,
                    MachineType::NoValue,
                    control,
                    &depends,
                    depends.len(),
                    GateType::Empty,
                )?
            }
        };

        let data = self.data_mut(label)?;
        data.depend = Some(depend);
        data.state = LabelState::Bound;
        log::debug!("bound {} with depend {}", label, depend);
        Ok(())
    }

    fn predecessor_depend(&self, label: Label, predecessor: Label) -> Result<GateRef> {
        self.data(predecessor)?
            .depend
            .ok_or_else(|| invariant_error!("Predecessor {} of {} has no depend", predecessor, label))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        builder::{Binding, Environment, LabelState},
        circuit::{Circuit, GateShape, GateType, MachineType, OpCode, VariableType},
        CompilationConfig, Error,
    };

    fn merge_gate(env: &mut Environment<'_>, paths: usize) -> crate::circuit::GateRef {
        let state = env.circuit().state_root();
        let ins = vec![state; paths];
        env.circuit_mut()
            .new_gate(
                OpCode::Merge,
                MachineType::NoValue,
                GateType::Empty,
                0,
                GateShape::new(paths, 0, 0),
                &ins,
            )
            .unwrap()
    }

    #[test]
    fn test_label_display() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let label = env.new_label();
        assert_eq!(label.to_string(), format!("L{}", label.index()));
        assert_eq!(LabelState::Unsealed.to_string(), "unsealed");
    }

    #[test]
    fn test_is_need_seal_transition() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let entry = env.entry_label();

        for degree in 1..=3 {
            let control = merge_gate(&mut env, degree);
            let label = env.new_label_with_control(control);
            for count in 0..degree {
                assert!(!env.is_need_seal(label).unwrap(), "degree {degree} count {count}");
                env.append_predecessor(label, Some(entry)).unwrap();
            }
            assert!(env.is_need_seal(label).unwrap());
        }
    }

    #[test]
    fn test_append_none_is_noop() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let label = env.new_label();
        env.append_predecessor(label, None).unwrap();
        assert!(env.predecessors(label).unwrap().is_empty());
    }

    #[test]
    fn test_append_to_sealed_rejected() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let entry = env.entry_label();
        let target = env.new_label();
        assert!(matches!(
            env.append_predecessor(entry, Some(target)),
            Err(Error::InvalidLabelState {
                operation: "append_predecessor",
                found: "bound",
                ..
            })
        ));
    }

    #[test]
    fn test_merge_control_order() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let first = merge_gate(&mut env, 1);
        let second = merge_gate(&mut env, 1);
        let label = env.new_label();

        env.merge_control(label, first).unwrap();
        env.merge_control(label, second).unwrap();
        assert_eq!(env.pre_control(label).unwrap(), Some(first));
        assert_eq!(env.control(label).unwrap(), Some(first));
    }

    #[test]
    fn test_double_seal_rejected() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let label = env.new_label();
        env.seal(label).unwrap();
        assert_eq!(
            env.seal(label),
            Err(Error::InvalidLabelState {
                label,
                operation: "seal",
                expected: "unsealed",
                found: "sealed",
            })
        );
    }

    #[test]
    fn test_merge_before_seal_rejected() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let label = env.new_label();
        assert!(matches!(
            env.merge_all_control(label),
            Err(Error::InvalidLabelState {
                operation: "merge_all_control",
                ..
            })
        ));
    }

    #[test]
    fn test_merge_depend_before_control_rejected() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let entry = env.entry_label();
        let left = env.new_label();
        let right = env.new_label();
        env.jump_from(entry, left).unwrap();
        env.jump_from(entry, right).unwrap();
        env.bind(left).unwrap();
        env.bind(right).unwrap();

        let join = env.new_label();
        env.jump_from(left, join).unwrap();
        env.jump_from(right, join).unwrap();
        env.seal(join).unwrap();

        assert!(matches!(
            env.merge_all_depend(join),
            Err(Error::InvalidLabelState {
                found: "control pending",
                ..
            })
        ));
        env.merge_all_control(join).unwrap();
        env.merge_all_depend(join).unwrap();
        assert_eq!(env.state(join).unwrap(), LabelState::Bound);
    }

    #[test]
    fn test_unsealed_non_loop_read() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let x = env.declare(VariableType::INT32);
        let label = env.new_label();
        assert_eq!(env.read_variable(label, x), Err(Error::UnsealedNonLoopRead(label)));
    }

    #[test]
    fn test_write_then_read_same_label() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let entry = env.entry_label();
        let x = env.declare(VariableType::INT32);
        let seven = env.builder_mut().int32(7);
        env.write_variable(entry, x, seven).unwrap();
        assert_eq!(env.read_variable(entry, x), Ok(seven));
        assert_eq!(env.binding(entry, x), Ok(Binding::Resolved(seven)));
    }

    #[test]
    fn test_relay_on_conditional_entry() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let taken = env.new_label();
        let skipped = env.new_label();
        let cond = env.builder_mut().boolean(true);
        env.branch(cond, taken, skipped).unwrap();
        env.bind(taken).unwrap();

        let depend = env.depend(taken).unwrap().unwrap();
        assert_eq!(env.circuit().opcode(depend), Ok(OpCode::DependRelay));
        assert_eq!(
            env.circuit().depend_in(depend, 0),
            Ok(Some(env.circuit().depend_root()))
        );
    }
}
