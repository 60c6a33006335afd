use thiserror::Error;

/// Errors produced by the compiler, the assembler, and the virtual machine.
///
/// Every error is fatal to the execution that raised it: there is no
/// guest-visible error handling in the language subset, so errors propagate
/// synchronously to the embedder and the current run is abandoned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported syntax: {0}")]
    Unsupported(String),

    #[error("Reference error: '{0}' is not defined")]
    UnresolvedReference(String),

    #[error("Unresolved label: '{0}'")]
    UnresolvedLabel(String),

    #[error("Duplicate label: '{0}'")]
    DuplicateLabel(String),

    #[error("Unknown opcode: 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("Malformed bytecode: {0}")]
    Bytecode(String),

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Instruction limit exceeded ({0} instructions)")]
    InstructionLimitExceeded(u64),

    #[error("Recursion limit exceeded (depth {0})")]
    RecursionLimitExceeded(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
