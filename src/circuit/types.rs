//! Value typing for gates and builder variables.
//!
//! Two independent type axes are tracked per gate:
//!
//! - [`MachineType`] - the machine-level representation (bit width, float vs.
//!   integer, or no value at all for pure ordering gates)
//! - [`GateType`] - the semantic view of the bits (native value, tagged value,
//!   tagged heap pointer)
//!
//! A builder variable pairs both as a [`VariableType`]. The machine type decides
//! which selector flavour a merge needs: variables of [`MachineType::NoValue`]
//! carry ordering only and merge through dependency selectors, everything else
//! merges through value selectors.

use std::fmt;

use strum::{Display, EnumCount, EnumIter};

/// Machine-level representation of a gate's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum MachineType {
    /// No data output; state and dependency gates
    NoValue,
    /// Single bit (booleans, branch conditions)
    I1,
    /// 8-bit integer
    I8,
    /// 16-bit integer
    I16,
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Pointer-sized integer, resolved against the target triple
    ArchPointer,
}

impl MachineType {
    /// Returns the width in bits, or `None` for [`MachineType::NoValue`] and the
    /// unresolved [`MachineType::ArchPointer`].
    #[must_use]
    pub const fn bits(self) -> Option<u32> {
        match self {
            MachineType::NoValue | MachineType::ArchPointer => None,
            MachineType::I1 => Some(1),
            MachineType::I8 => Some(8),
            MachineType::I16 => Some(16),
            MachineType::I32 | MachineType::F32 => Some(32),
            MachineType::I64 | MachineType::F64 => Some(64),
        }
    }

    /// Returns `true` if gates of this type carry data.
    #[must_use]
    pub const fn has_value(self) -> bool {
        !matches!(self, MachineType::NoValue)
    }

    /// Returns `true` for floating point representations.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, MachineType::F32 | MachineType::F64)
    }
}

/// Semantic interpretation of a gate's bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter)]
pub enum GateType {
    /// No semantic type (control and dependency gates)
    Empty,
    /// Untagged native value
    NativeValue,
    /// Tagged language value of any kind
    TaggedValue,
    /// Tagged value known to be a heap pointer
    TaggedPointer,
    /// Tagged value known not to be a heap pointer
    TaggedNPointer,
}

/// Type of a builder variable: machine representation plus semantic type.
///
/// A [`Variable`](crate::builder::Variable)'s type is fixed at creation.
///
/// # Examples
///
/// ```rust
/// use circuit_ssa::{MachineType, VariableType};
///
/// assert_eq!(VariableType::INT32.machine_type(), MachineType::I32);
/// assert!(VariableType::VOID.is_no_value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableType {
    machine_type: MachineType,
    gate_type: GateType,
}

impl VariableType {
    /// Ordering-only variable; merges through dependency selectors
    pub const VOID: Self = Self::new(MachineType::NoValue, GateType::Empty);
    /// Native boolean
    pub const BOOL: Self = Self::new(MachineType::I1, GateType::NativeValue);
    /// Native 32-bit integer
    pub const INT32: Self = Self::new(MachineType::I32, GateType::NativeValue);
    /// Native 64-bit integer
    pub const INT64: Self = Self::new(MachineType::I64, GateType::NativeValue);
    /// Native double
    pub const FLOAT64: Self = Self::new(MachineType::F64, GateType::NativeValue);
    /// Native pointer-sized integer
    pub const NATIVE_POINTER: Self = Self::new(MachineType::ArchPointer, GateType::NativeValue);
    /// Tagged value of any kind
    pub const JS_ANY: Self = Self::new(MachineType::I64, GateType::TaggedValue);
    /// Tagged heap pointer
    pub const JS_POINTER: Self = Self::new(MachineType::I64, GateType::TaggedPointer);

    /// Creates a variable type from its two components.
    #[must_use]
    pub const fn new(machine_type: MachineType, gate_type: GateType) -> Self {
        Self {
            machine_type,
            gate_type,
        }
    }

    /// Returns the machine representation.
    #[must_use]
    pub const fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    /// Returns the semantic type.
    #[must_use]
    pub const fn gate_type(&self) -> GateType {
        self.gate_type
    }

    /// Returns `true` for ordering-only variables.
    #[must_use]
    pub const fn is_no_value(&self) -> bool {
        !self.machine_type.has_value()
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.machine_type, self.gate_type)
    }
}
