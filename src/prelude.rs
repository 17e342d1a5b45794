//! # circuit-ssa Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! of the library. Import it to get quick access to everything a translator
//! needs to build a function.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all circuit-ssa operations
pub use crate::Error;

/// The result type used throughout circuit-ssa
pub use crate::Result;

/// Configuration of one compilation unit
pub use crate::{CompilationConfig, Triple};

// ================================================================================================
// SSA Construction
// ================================================================================================

/// Construction state of one function
pub use crate::builder::{ConstructionStats, Environment};

/// Label and variable handles
pub use crate::builder::{Binding, Label, LabelState, Variable};

// ================================================================================================
// Circuit
// ================================================================================================

/// Gate storage and handles
pub use crate::circuit::{Circuit, Gate, GateRef, GateShape, Use};

/// Gate construction helpers
pub use crate::circuit::CircuitBuilder;

/// Gate kinds and typing
pub use crate::circuit::{GateType, MachineType, OpCode, OpProperties, VariableType};

// ================================================================================================
// Batches
// ================================================================================================

/// Parallel construction of independent units
pub use crate::batch::{build_parallel, BuiltUnit};
