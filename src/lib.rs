// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::too_many_arguments)]

//! # circuit-ssa
//!
//! Incremental SSA construction for a sea-of-nodes circuit IR.
//!
//! A translator walking a function's bytecode creates labels for basic blocks,
//! writes and reads variables in them, and adds edges between them. `circuit-ssa`
//! turns that stream of events into SSA form while it happens: value and
//! dependency selectors (phis) are created only where paths actually merge
//! different values, loop headers are built in two phases because their back
//! edge is only known after the loop body, and selectors that end up merging a
//! single value are removed again.
//!
//! ## Features
//!
//! - **Circuit store** - gates with state, depend and value edges, use lists,
//!   delayed operand patching and Graphviz output
//! - **On-the-fly SSA** - no dominance pre-pass, placeholder selectors in
//!   unsealed loop headers, trivial-phi removal
//! - **Explicit lifecycle** - labels move through `Unsealed`, `Sealed` and
//!   `Bound`, and out-of-order transitions are rejected with an error
//! - **Parallel batches** - independent functions are built on rayon, one
//!   circuit per worker
//!
//! ## Quick Start
//!
//! ```rust
//! use circuit_ssa::prelude::*;
//!
//! let mut circuit = Circuit::new();
//! let mut env = Environment::new(&mut circuit, CompilationConfig::default(), 2);
//!
//! // f(a, b) { return a < b ? b : a; }
//! let max = env.new_variable(VariableType::JS_ANY, env.arguments()[0])?;
//! let swap = env.new_label();
//! let done = env.new_label();
//!
//! let (a, b) = (env.arguments()[0], env.arguments()[1]);
//! let less = env.builder_mut().compare(OpCode::Slt, a, b)?;
//! env.branch(less, swap, done)?;
//!
//! env.bind(swap)?;
//! env.write(max, b)?;
//! env.jump(done)?;
//!
//! env.bind(done)?;
//! let result = env.read(max)?;
//! env.ret(result)?;
//!
//! assert_eq!(env.circuit().opcode(result)?, OpCode::ValueSelector);
//! println!("{}", env.circuit().to_dot(Some("max")));
//! # Ok::<(), circuit_ssa::Error>(())
//! ```
//!
//! ## Logging
//!
//! Construction logs through the [`log`](https://docs.rs/log) facade: label
//! sealing, merges and trivial-phi removal at `debug` level, every selector
//! creation at `trace` level when [`CompilationConfig::trace`] is set.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use circuit_ssa::prelude::*;
///
/// let mut circuit = Circuit::new();
/// let env = Environment::new(&mut circuit, CompilationConfig::default(), 0);
/// assert!(env.is_sealed(env.entry_label())?);
/// # Ok::<(), circuit_ssa::Error>(())
/// ```
pub mod prelude;

/// The sea-of-nodes graph store and its node-construction helpers.
///
/// # Key Types
///
/// - [`circuit::Circuit`] - gate arena with use lists
/// - [`circuit::GateRef`] - handle of a gate
/// - [`circuit::OpCode`] - gate kinds
/// - [`circuit::CircuitBuilder`] - creates correctly shaped gates
pub mod circuit;

/// SSA construction: variables, labels and the environment driving them.
pub mod builder;

/// Parallel construction of independent compilation units.
pub mod batch;

/// Helpers shared across modules.
pub mod utils;

mod config;

/// `circuit-ssa` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `circuit-ssa` Error type
///
/// Every variant reports a violated construction invariant; see [`Error`] for
/// the categories.
pub use error::Error;

/// Configuration of one compilation unit.
pub use config::{CompilationConfig, Triple};

/// The SSA construction API.
pub use builder::{Binding, ConstructionStats, Environment, Label, LabelState, Variable};

/// Gate storage and gate typing.
pub use circuit::{
    Circuit, CircuitBuilder, Gate, GateRef, GateShape, GateType, MachineType, OpCode, VariableType,
};
