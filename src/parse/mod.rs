mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::{IndexClause, InstructionBlock, ParsedScript, QueryClause};

/// Parse script text into a [`ParsedScript`].
///
/// # Errors
///
/// Returns [`ParseError`] with a 1-based source position if the input is not
/// valid script syntax.
pub fn parse(input: &str) -> Result<ParsedScript, ParseError> {
    use winnow::Parser;
    grammar::parse_script
        .parse(input)
        .map_err(|e| ParseError::at_offset(input, e.offset(), e.inner().to_string()))
}
