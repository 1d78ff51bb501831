//! Source-level types and declarations the hooks inspect.

use crate::abi::INTERRUPT_ATTRIBUTE;
use crate::mode::MachineMode;

/// Type of a value crossing a call boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Void,
    /// Integer of `bits` width (8, 16, 32 or 64).
    Int { bits: u32 },
    /// IEEE float of `bits` width (32 or 64).
    Float { bits: u32 },
    Pointer,
    /// Struct, union or array passed by value.
    Aggregate { size: u32, align: u32 },
}

impl Type {
    pub const I8: Self = Self::Int { bits: 8 };
    pub const I16: Self = Self::Int { bits: 16 };
    pub const I32: Self = Self::Int { bits: 32 };
    pub const I64: Self = Self::Int { bits: 64 };
    pub const F32: Self = Self::Float { bits: 32 };
    pub const F64: Self = Self::Float { bits: 64 };

    /// `TYPE_MODE`: the machine mode values of this type are held in.
    ///
    /// Aggregates whose size matches an integer mode use that mode; the rest are `Blk`.
    #[must_use]
    pub fn mode(&self) -> MachineMode {
        match *self {
            Self::Void => MachineMode::Void,
            Self::Int { bits } => MachineMode::int_for_size(bits / 8).unwrap_or(MachineMode::Blk),
            Self::Float { bits: 32 } => MachineMode::SF,
            Self::Float { bits: 64 } => MachineMode::DF,
            Self::Float { .. } => MachineMode::Blk,
            Self::Pointer => MachineMode::POINTER,
            Self::Aggregate { size, .. } => {
                MachineMode::int_for_size(size).unwrap_or(MachineMode::Blk)
            }
        }
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        match *self {
            Self::Void => 0,
            Self::Int { bits } | Self::Float { bits } => bits.div_ceil(8),
            Self::Pointer => MachineMode::POINTER.size(),
            Self::Aggregate { size, .. } => size,
        }
    }

    #[must_use]
    pub fn align(&self) -> u32 {
        match *self {
            Self::Aggregate { align, .. } => align.max(1),
            _ => self.size().max(1),
        }
    }

    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate { .. })
    }

    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Int { .. } | Self::Pointer)
    }
}

/// Signature of a callee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
    /// Arguments after the named `params` are unnamed (`...`).
    pub variadic: bool,
}

impl FunctionType {
    #[must_use]
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            variadic: false,
        }
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// An `__attribute__((name(args)))` attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<String>,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Attribute names compare equal with or without surrounding double underscores.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        let own = self
            .name
            .strip_prefix("__")
            .and_then(|n| n.strip_suffix("__"))
            .unwrap_or(&self.name);
        own == name
    }
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub ty: FunctionType,
    pub attributes: Vec<Attribute>,
}

impl FunctionDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FunctionType) -> Self {
        Self {
            name: name.into(),
            ty,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.is_named(name))
    }

    #[must_use]
    pub fn is_interrupt(&self) -> bool {
        self.has_attribute(INTERRUPT_ATTRIBUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_modes() {
        assert_eq!(Type::I8.mode(), MachineMode::QI);
        assert_eq!(Type::I64.mode(), MachineMode::DI);
        assert_eq!(Type::F32.mode(), MachineMode::SF);
        assert_eq!(Type::Pointer.mode(), MachineMode::SI);
        assert_eq!(Type::Void.mode(), MachineMode::Void);
        assert_eq!(
            Type::Aggregate { size: 8, align: 4 }.mode(),
            MachineMode::DI
        );
        assert_eq!(
            Type::Aggregate { size: 12, align: 4 }.mode(),
            MachineMode::Blk
        );
        assert_eq!(Type::Aggregate { size: 3, align: 1 }.mode(), MachineMode::Blk);
    }

    #[test]
    fn test_attribute_spelling() {
        assert!(Attribute::new("__interrupt__").is_named("interrupt"));
        assert!(Attribute::new("interrupt").is_named("interrupt"));
        assert!(!Attribute::new("naked").is_named("interrupt"));
    }
}
