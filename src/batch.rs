//! Parallel construction of independent compilation units.
//!
//! Construction of one function is strictly sequential, but different
//! functions share nothing. [`build_parallel`] gives every unit its own fresh
//! [`Circuit`] and runs the units on the rayon thread pool; no circuit is ever
//! visible to more than one worker.

use rayon::prelude::*;

use crate::{circuit::Circuit, CompilationConfig, Result};

/// Result of one unit built by [`build_parallel`].
#[derive(Debug, Clone)]
pub struct BuiltUnit<T> {
    /// The finished circuit of the unit
    pub circuit: Circuit,
    /// Whatever the build closure returned
    pub output: T,
}

/// Builds every unit into its own circuit, in parallel.
///
/// `build` receives the unit, a fresh circuit and the shared read-only
/// configuration. A failing unit does not stop the others; its error takes
/// its place in the result, which is in the order of `units`.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::{batch::build_parallel, CompilationConfig, Environment, VariableType};
///
/// let arities = [0usize, 1, 2];
/// let results = build_parallel(&CompilationConfig::default(), &arities, |&argc, circuit, config| {
///     let mut env = Environment::new(circuit, config.clone(), argc);
///     let value = match env.argument(0) {
///         Some(arg) => arg,
///         None => env.builder_mut().int32(0),
///     };
///     let var = env.new_variable(VariableType::JS_ANY, value)?;
///     let result = env.read(var)?;
///     env.ret(result)?;
///     Ok(env.finish())
/// });
///
/// assert_eq!(results.len(), 3);
/// assert!(results.iter().all(|unit| unit.is_ok()));
/// ```
pub fn build_parallel<U, T, F>(config: &CompilationConfig, units: &[U], build: F) -> Vec<Result<BuiltUnit<T>>>
where
    U: Sync,
    T: Send,
    F: Fn(&U, &mut Circuit, &CompilationConfig) -> Result<T> + Sync,
{
    log::debug!("building {} units in parallel", units.len());
    units
        .par_iter()
        .map(|unit| {
            let mut circuit = Circuit::new();
            let output = build(unit, &mut circuit, config)?;
            Ok(BuiltUnit { circuit, output })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::Environment, circuit::OpCode, Error};

    #[test]
    fn test_results_in_input_order() {
        let units: Vec<i32> = (0..64).collect();
        let results = build_parallel(&CompilationConfig::default(), &units, |&value, circuit, config| {
            let mut env = Environment::new(circuit, config.clone(), 0);
            let constant = env.builder_mut().int32(value);
            env.ret(constant)?;
            Ok(value)
        });

        for (index, result) in results.into_iter().enumerate() {
            let unit = result.unwrap();
            assert_eq!(unit.output, index as i32);
            let returns = unit
                .circuit
                .iter()
                .filter(|(_, gate)| gate.opcode() == OpCode::Return)
                .count();
            assert_eq!(returns, 1);
        }
    }

    #[test]
    fn test_failure_is_per_unit() {
        let units = [true, false, true];
        let results = build_parallel(&CompilationConfig::default(), &units, |&ok, circuit, config| {
            let mut env = Environment::new(circuit, config.clone(), 0);
            if ok {
                Ok(())
            } else {
                let orphan = env.new_label();
                env.bind(orphan)
            }
        });

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::NoPredecessors(_))));
        assert!(results[2].is_ok());
    }
}
