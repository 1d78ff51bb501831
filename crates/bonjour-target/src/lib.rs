#![allow(
    clippy::cast_possible_truncation, // intentional: register counts and slot indices fit in u8/u32
    clippy::missing_errors_doc // errors are the `Error` variants documented in error.rs
)]

pub mod abi;
pub mod bonjour;
pub mod callconv;
pub mod config;
pub mod error;
pub mod frame;
pub mod mode;
pub mod regs;
pub mod rtx;
pub mod target;
pub mod tree;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use bonjour::BonjourTarget;
pub use callconv::{ArgInfo, ArgLocation, CallLayout, CumulativeArgs};
pub use config::TargetConfig;
pub use error::{Error, Result};
pub use frame::{FrameLayout, FunctionInfo};
pub use mode::MachineMode;
pub use regs::{RegNo, RegisterClass};
pub use rtx::Rtx;
pub use target::{TargetHooks, ValueLocation, target_by_name};
pub use tree::{Attribute, FunctionDecl, FunctionType, Type};
