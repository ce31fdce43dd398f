use thiserror::Error;

use super::instruction::Instruction;
use super::result::InstructionResult;

/// Everything that can go wrong between script text and results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// The script text does not compile. Line and column are 1-based.
    #[error("compilation failed at line {line}, column {column}: {message}")]
    Compilation {
        line: usize,
        column: usize,
        message: String,
    },

    /// The script compiled but asks for something the engine configuration
    /// forbids. `cause` is the offending instruction in script syntax.
    #[error("instruction not permitted: {message}")]
    Impermissible { message: String, cause: String },

    /// A storage collaborator failed mid-evaluation.
    #[error("evaluation failed: {message}")]
    Unknown { message: String },
}

impl ScriptError {
    pub(crate) fn impermissible(message: impl Into<String>, cause: &Instruction) -> Self {
        ScriptError::Impermissible {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn unknown(message: impl Into<String>) -> Self {
        ScriptError::Unknown {
            message: message.into(),
        }
    }
}

/// Compiled instructions, or the error that stopped compilation.
pub type CompileResult = Result<Vec<Instruction>, ScriptError>;

/// Executed results in script order, or the first error. Nothing is
/// partially applied on error.
pub type ScriptResult = Result<Vec<InstructionResult>, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_message_carries_position() {
        let err = ScriptError::Compilation {
            line: 3,
            column: 14,
            message: "expected a string literal".into(),
        };
        assert_eq!(
            err.to_string(),
            "compilation failed at line 3, column 14: expected a string literal"
        );
    }

    #[test]
    fn unknown_wraps_message() {
        let err = ScriptError::unknown("backend gone");
        assert_eq!(err.to_string(), "evaluation failed: backend gone");
    }
}
