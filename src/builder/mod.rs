//! Incremental SSA construction over a circuit.
//!
//! This module turns a translator's stream of "new block", "write variable",
//! "read variable" and "edge" events into sea-of-nodes SSA form on the fly,
//! without a dominance pre-pass. It follows the construction of Braun et al.:
//! reads are resolved lazily through the predecessors of a label, labels whose
//! predecessor set is not yet final get placeholder selectors that are completed
//! when the label is sealed, and selectors that turn out to merge a single value
//! are removed again.
//!
//! # Architecture
//!
//! - `variable` - [`Variable`] handles, phi completion and trivial-phi removal
//! - `label` - [`Label`] handles, the label state machine and the
//!   read/write/seal/merge core
//! - `environment` - the [`Environment`] owning both arenas, its constructors
//!   and the control-flow helpers
//!
//! Labels and variables are small copyable handles into arenas owned by the
//! [`Environment`]; every operation goes through the environment and takes
//! the handle explicitly.
//!
//! # Loops
//!
//! A loop header is entered through [`Environment::loop_begin`], which creates
//! a loop-begin gate expecting two predecessors and binds the header with only
//! the forward one. Reads in the loop body reach the still unsealed header and
//! receive placeholder selectors with one slot per known predecessor plus one
//! for the back edge. [`Environment::loop_end`] adds the back edge, seals the
//! header (filling the placeholders) and patches the back edge into the
//! loop-begin gate and the loop dependency selector.
//!
//! # Usage
//!
//! ```rust
//! use circuit_ssa::{Circuit, CompilationConfig, Environment, OpCode, VariableType};
//!
//! let mut circuit = Circuit::new();
//! let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 1);
//! let i = env.new_variable(VariableType::INT32, env.arguments()[0])?;
//!
//! let head = env.new_label();
//! let body = env.new_label();
//! let exit = env.new_label();
//!
//! env.loop_begin(head)?;
//! let current = env.read(i)?;
//! let zero = env.builder_mut().int32(0);
//! let cond = env.builder_mut().compare(OpCode::Sgt, current, zero)?;
//! env.branch(cond, body, exit)?;
//!
//! env.bind(body)?;
//! let one = env.builder_mut().int32(1);
//! let next = env.builder_mut().binary(OpCode::Sub, circuit_ssa::MachineType::I32, current, one)?;
//! env.write(i, next)?;
//! env.loop_end(head)?;
//!
//! env.bind(exit)?;
//! let result = env.read(i)?;
//! assert_eq!(result, current);
//! assert_eq!(env.circuit().value_in(current, 1)?, Some(next));
//! # Ok::<(), circuit_ssa::Error>(())
//! ```
//!
//! # References
//!
//! - Braun et al., "Simple and Efficient Construction of Static Single
//!   Assignment Form", CC 2013

mod environment;
mod label;
mod variable;

pub use environment::{ConstructionStats, Environment};
pub use label::{Binding, Label, LabelState};
pub use variable::Variable;
