//! Variables and phi completion.
//!
//! A [`Variable`] is a source-level (or translator temporary) variable whose
//! value differs from label to label. Its [`VariableType`] is fixed when it is
//! declared and decides what kind of selector merges it: ordinary values go
//! through value selectors, ordering-only (`NoValue`) variables through
//! dependency selectors.
//!
//! Completing a selector fills one operand per predecessor and then tries to
//! remove it again: a selector whose operands are all the same value, apart
//! from references to itself, is replaced by that value everywhere. Removal can
//! make other selectors trivial in turn, so candidates are processed from a
//! worklist until none is left.

use std::fmt;

use crate::{
    builder::{Binding, Environment},
    circuit::{GateRef, MachineType, VariableType},
    Result,
};

/// Handle of a variable within its [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(u32);

impl Variable {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Returns the arena index of this variable.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VariableData {
    pub(crate) var_type: VariableType,
}

impl Environment<'_> {
    pub(crate) fn variable_data(&self, var: Variable) -> Result<&VariableData> {
        self.variables
            .get(var.index())
            .ok_or_else(|| invariant_error!("Variable {} does not belong to this environment", var))
    }

    /// Declares a variable without binding it anywhere.
    pub fn declare(&mut self, var_type: VariableType) -> Variable {
        let var = Variable::new(self.variables.len());
        self.variables.push(VariableData { var_type });
        var
    }

    /// Declares a variable and binds `value` to it in the current label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentLabel`](crate::Error::NoCurrentLabel) if control
    /// has left the current label.
    pub fn new_variable(&mut self, var_type: VariableType, value: GateRef) -> Result<Variable> {
        let label = self.current_label()?;
        let var = self.declare(var_type);
        self.write_variable(label, var, value)?;
        Ok(var)
    }

    /// Returns the type `var` was declared with.
    ///
    /// # Errors
    ///
    /// Returns an error if `var` belongs to another environment.
    pub fn variable_type(&self, var: Variable) -> Result<VariableType> {
        Ok(self.variable_data(var)?.var_type)
    }

    /// Fills every operand of the selector `phi` from the predecessors of the
    /// label that created it, then removes the selector if it turned out
    /// trivial.
    ///
    /// Operand *i* receives the variable's value at the end of predecessor *i*.
    /// Returns the selector itself, or the value that replaced it.
    ///
    /// # Errors
    ///
    /// Returns an error if `phi` was not created for a variable, if its operand
    /// count does not match the predecessor count, or if reading a predecessor
    /// fails.
    pub fn add_phi_operand(&mut self, phi: GateRef) -> Result<GateRef> {
        let (label, var) = *self
            .phi_owners
            .get(&phi)
            .ok_or_else(|| invariant_error!("{} is not a variable selector", phi))?;
        let predecessors = self.data(label)?.predecessors.clone();

        let gate = self.circuit().gate(phi)?;
        let first = gate.state_count();
        let operands = gate.num_ins() - first;
        if operands != predecessors.len() {
            return Err(invariant_error!(
                "Selector {} of {} has {} operands but {} has {} predecessors",
                phi,
                var,
                operands,
                label,
                predecessors.len()
            ));
        }

        for (index, predecessor) in predecessors.into_iter().enumerate() {
            let value = self.read_variable(predecessor, var)?;
            self.circuit_mut().new_in(phi, first + index, value)?;
        }
        self.try_remove_trivial_phi(phi)
    }

    /// Removes `phi` if all of its operands other than itself are one value.
    ///
    /// Every use of a removed selector is rerouted to the surviving value and
    /// selectors using it are re-examined. A selector without any operand other
    /// than itself is replaced by the undefined value of its variable. Selectors
    /// with open operand slots are left alone.
    ///
    /// Returns the value now standing for `phi`.
    ///
    /// # Errors
    ///
    /// Returns an error if the circuit rejects the rewrite.
    pub fn try_remove_trivial_phi(&mut self, phi: GateRef) -> Result<GateRef> {
        let mut worklist = vec![phi];

        while let Some(candidate) = worklist.pop() {
            let Some(&(_, var)) = self.phi_owners.get(&candidate) else {
                continue;
            };
            let Some(same) = self.trivial_operand(candidate, var)? else {
                continue;
            };

            let users = self.circuit_mut().replace_all_uses(candidate, same)?;
            self.circuit_mut().delete_gate(candidate)?;
            self.phi_owners.remove(&candidate);
            self.forwards.insert(candidate, same);
            self.stats.phis_removed += 1;
            self.rebind(candidate, same);
            log::debug!("trivial phi {} for {} replaced by {}", candidate, var, same);

            worklist.extend(
                users
                    .into_iter()
                    .filter(|user| self.phi_owners.contains_key(user)),
            );
        }

        Ok(self.forwarded(phi))
    }

    /// Returns the single operand `phi` stands for, or `None` if it is a real
    /// merge or still incomplete.
    fn trivial_operand(&mut self, phi: GateRef, var: Variable) -> Result<Option<GateRef>> {
        let gate = self.circuit().gate(phi)?;
        let mut same = None;
        for operand in &gate.ins()[gate.state_count()..] {
            let Some(operand) = *operand else {
                return Ok(None);
            };
            if operand == phi || Some(operand) == same {
                continue;
            }
            if same.is_some() {
                return Ok(None);
            }
            same = Some(operand);
        }

        match same {
            Some(value) => Ok(Some(value)),
            None => Ok(Some(self.undefined_value(var)?)),
        }
    }

    /// Moves every binding that still holds `phi` over to `same`.
    fn rebind(&mut self, phi: GateRef, same: GateRef) {
        let Some(bindings) = self.phi_bindings.remove(&phi) else {
            return;
        };
        let same_is_phi = self.phi_owners.contains_key(&same);
        for (label, var) in bindings {
            let Some(binding) = self
                .labels
                .get_mut(label.index())
                .and_then(|data| data.values.get_mut(&var))
            else {
                continue;
            };
            if *binding != Binding::Resolved(phi) {
                continue;
            }
            *binding = Binding::Resolved(same);
            if same_is_phi {
                self.phi_bindings.entry(same).or_default().push((label, var));
            }
        }
    }

    /// Follows removed selectors to the value that finally replaced them.
    pub(crate) fn forwarded(&self, mut gate: GateRef) -> GateRef {
        while let Some(&next) = self.forwards.get(&gate) {
            gate = next;
        }
        gate
    }

    /// Returns the value of a variable that was never written on some path.
    ///
    /// Ordering-only variables fall back to the depend root, all others to the
    /// tagged `undefined` constant typed like the variable.
    pub(crate) fn undefined_value(&mut self, var: Variable) -> Result<GateRef> {
        let var_type = self.variable_type(var)?;
        if var_type.is_no_value() {
            return Ok(self.circuit().depend_root());
        }
        let machine_type = self.builder.resolve(var_type.machine_type());
        if machine_type == MachineType::I64 {
            return Ok(self.builder.undefined_constant(var_type.gate_type()));
        }
        Ok(self.circuit_mut().constant(
            machine_type,
            crate::circuit::TAGGED_UNDEFINED,
            var_type.gate_type(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        builder::{Binding, Environment},
        circuit::{Circuit, GateType, MachineType, OpCode, VariableType, TAGGED_UNDEFINED},
        CompilationConfig, Error,
    };

    #[test]
    fn test_variable_type_is_fixed() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let x = env.declare(VariableType::FLOAT64);
        let y = env.declare(VariableType::VOID);
        assert_ne!(x, y);
        assert_eq!(env.variable_type(x), Ok(VariableType::FLOAT64));
        assert_eq!(env.variable_type(y), Ok(VariableType::VOID));
        assert_eq!(x.to_string(), "v0");
    }

    #[test]
    fn test_unwritten_read_in_entry_is_undefined() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let entry = env.entry_label();
        let x = env.declare(VariableType::INT32);
        let undefined = env.read_variable(entry, x).unwrap();

        let gate = env.circuit().gate(undefined).unwrap();
        assert_eq!(gate.opcode(), OpCode::Constant);
        assert_eq!(gate.machine_type(), MachineType::I32);
        assert_eq!(gate.payload(), TAGGED_UNDEFINED);
    }

    #[test]
    fn test_unwritten_no_value_is_depend_root() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let entry = env.entry_label();
        let token = env.declare(VariableType::VOID);
        assert_eq!(
            env.read_variable(entry, token),
            Ok(env.circuit().depend_root())
        );
    }

    #[test]
    fn test_add_phi_operand_rejects_foreign_gate() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let root = env.circuit().state_root();
        assert!(matches!(
            env.add_phi_operand(root),
            Err(Error::Invariant { .. })
        ));
    }

    #[test]
    fn test_trivial_phi_replaces_uses() {
        let mut circuit = Circuit::new();
        let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
        let undefined = env.builder_mut().undefined_constant(GateType::TaggedValue);
        let x = env.new_variable(VariableType::JS_ANY, undefined).unwrap();
        let entry_value = env.read(x).unwrap();
        assert_eq!(entry_value, undefined);

        let left = env.new_label();
        let right = env.new_label();
        let join = env.new_label();
        let cond = env.builder_mut().boolean(false);
        env.branch(cond, left, right).unwrap();
        env.bind(left).unwrap();
        env.jump(join).unwrap();
        env.bind(right).unwrap();
        env.jump(join).unwrap();
        env.bind(join).unwrap();

        let created = env.stats().phis_created;
        assert_eq!(env.read(x), Ok(entry_value));
        assert_eq!(env.stats().phis_created, created + 1);
        assert_eq!(env.stats().phis_removed, 1);
        assert_eq!(env.binding(join, x), Ok(Binding::Resolved(entry_value)));
    }
}
