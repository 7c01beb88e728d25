//! Interactive session input handling.

use crate::types::FinqError;

const EXIT_COMMANDS: &[&str] = &["quit", "exit"];

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Blank line, re-prompt
    Empty,
    /// `quit` or `exit`
    Exit,
    /// Anything else, trimmed
    Question(String),
}

impl SessionInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            Self::Empty
        } else if EXIT_COMMANDS.iter().any(|cmd| trimmed.eq_ignore_ascii_case(cmd)) {
            Self::Exit
        } else {
            Self::Question(trimmed.to_string())
        }
    }
}

/// Format a request-level failure for display, naming the stage.
pub fn describe_error(error: &FinqError) -> String {
    match error.stage() {
        Some(stage) => format!("[Error] ({}): {}", stage, error),
        None => format!("[Error]: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit_commands() {
        assert_eq!(SessionInput::parse("quit"), SessionInput::Exit);
        assert_eq!(SessionInput::parse("  EXIT \n"), SessionInput::Exit);
        assert_eq!(SessionInput::parse("Quit"), SessionInput::Exit);
    }

    #[test]
    fn test_parse_empty_and_questions() {
        assert_eq!(SessionInput::parse("   "), SessionInput::Empty);
        assert_eq!(
            SessionInput::parse(" What is Apple's revenue? "),
            SessionInput::Question("What is Apple's revenue?".to_string())
        );
        assert_eq!(
            SessionInput::parse("quit now"),
            SessionInput::Question("quit now".to_string())
        );
    }

    #[test]
    fn test_describe_error_names_stage() {
        let err = FinqError::UnsafeQuery("DROP TABLE Companies".to_string());
        assert!(describe_error(&err).starts_with("[Error] (gate): "));

        let err = FinqError::Config("OPENAI_API_KEY not set".to_string());
        assert!(describe_error(&err).starts_with("[Error]: "));
    }
}
