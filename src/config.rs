//! Read-only configuration of one compilation unit.
//!
//! A [`CompilationConfig`] is handed to the [`CircuitBuilder`](crate::circuit::CircuitBuilder)
//! when an [`Environment`](crate::builder::Environment) is created and never changes
//! afterwards. It carries the target triple, which decides the width of
//! pointer-sized values, the trace switch for construction logging, and the bound
//! on nested variable resolution.

use strum::{Display, EnumIter, EnumString};

/// Compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum Triple {
    /// 64-bit x86
    #[strum(serialize = "x86_64-unknown-linux-gnu")]
    Amd64,
    /// 64-bit ARM
    #[strum(serialize = "aarch64-unknown-linux-gnu")]
    Aarch64,
    /// 32-bit ARM
    #[strum(serialize = "arm-unknown-linux-gnu")]
    Arm32,
}

impl Triple {
    /// Returns `true` for targets with 64-bit pointers.
    #[must_use]
    pub const fn is_64bit(self) -> bool {
        matches!(self, Triple::Amd64 | Triple::Aarch64)
    }
}

/// Configuration for circuit construction.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::{CompilationConfig, Triple};
///
/// let config = CompilationConfig {
///     triple: "arm-unknown-linux-gnu".parse().unwrap(),
///     ..CompilationConfig::default()
/// };
/// assert_eq!(config.triple, Triple::Arm32);
/// assert!(!config.is_64bit());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationConfig {
    /// Target the circuit is built for
    pub triple: Triple,

    /// Emit `trace`-level logs for every variable read and selector creation
    pub trace: bool,

    /// Maximum number of merge selectors pending at once while resolving a
    /// read (default: 4096)
    ///
    /// Straight-line single-predecessor chains are walked iteratively and do not
    /// count against this limit.
    pub max_read_depth: usize,
}

impl Default for CompilationConfig {
    fn default() -> Self {
        Self {
            triple: Triple::Amd64,
            trace: false,
            max_read_depth: 4096,
        }
    }
}

impl CompilationConfig {
    /// Creates a configuration for `triple` with all other settings at default.
    #[must_use]
    pub fn for_triple(triple: Triple) -> Self {
        Self {
            triple,
            ..Self::default()
        }
    }

    /// Tight limits for constrained environments such as fuzzing.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            triple: Triple::Amd64,
            trace: false,
            max_read_depth: 256,
        }
    }

    /// Verbose configuration for debugging a translator.
    #[must_use]
    pub fn debugging() -> Self {
        Self {
            trace: true,
            ..Self::default()
        }
    }

    /// Returns `true` when pointers are 64 bits wide on the target.
    #[must_use]
    pub const fn is_64bit(&self) -> bool {
        self.triple.is_64bit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_default_config() {
        let config = CompilationConfig::default();
        assert_eq!(config.triple, Triple::Amd64);
        assert!(!config.trace);
        assert!(config.is_64bit());
    }

    #[test]
    fn test_presets() {
        assert!(CompilationConfig::debugging().trace);
        assert!(CompilationConfig::minimal().max_read_depth < CompilationConfig::default().max_read_depth);
        assert_eq!(CompilationConfig::for_triple(Triple::Arm32).triple, Triple::Arm32);
    }

    #[test]
    fn test_triple_round_trip_names() {
        for triple in Triple::iter() {
            let parsed: Triple = triple.to_string().parse().unwrap();
            assert_eq!(parsed, triple);
        }
        assert!("riscv64".parse::<Triple>().is_err());
    }
}
