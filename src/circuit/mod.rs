//! Sea-of-nodes graph store.
//!
//! A circuit is a flat arena of gates. Each gate has an in-list split into three
//! classes of edges:
//!
//! - **state** edges link control gates into the control-flow skeleton,
//! - **depend** edges order side-effecting gates along the dependency chain,
//! - **value** edges carry data.
//!
//! Slots of an in-list may be created empty and patched later, which is how loop
//! back edges and phi operands discovered after their gate was created get
//! wired in.
//!
//! # Architecture
//!
//! - `gate` - gate handles and gate payloads
//! - `opcode` - opcodes and their fixed property sets
//! - `types` - machine and gate types
//! - `store` - the [`Circuit`] arena with use lists
//! - `builder` - the [`CircuitBuilder`] node-construction helpers
//! - `dump` - Graphviz rendering via [`Circuit::to_dot`]

mod builder;
mod dump;
mod gate;
mod opcode;
mod store;
mod types;

pub use builder::{CircuitBuilder, TAGGED_UNDEFINED};
pub use gate::{EdgeKind, Gate, GateRef};
pub use opcode::{OpCode, OpProperties};
pub use store::{Circuit, GateShape, Use};
pub use types::{GateType, MachineType, VariableType};
