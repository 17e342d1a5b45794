//! Shared helpers that are not specific to circuit construction.

mod dot;

pub use dot::escape_dot;
