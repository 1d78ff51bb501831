use crate::regs::RegNo;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("No elimination configured from {from} to {to}")]
    UnsupportedElimination { from: RegNo, to: RegNo },

    #[error("Invalid target configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Unknown register: {0}")]
    UnknownRegister(String),

    #[error("Unknown machine mode: {0}")]
    UnknownMode(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
