//! Topic acquisition: sanitize, validate, and prompt until valid.

use std::io::{BufRead, Write};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub const MIN_TOPIC_CHARS: usize = 10;
pub const MAX_TOPIC_CHARS: usize = 500;

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>{}\\]").expect("MARKUP_RE regex should compile"));

/// Why a topic was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("Topic cannot be empty or only whitespace.")]
    Empty,

    #[error("Topic too short. Minimum {} characters required.", MIN_TOPIC_CHARS)]
    TooShort,

    #[error("Topic too long. Maximum {} characters allowed.", MAX_TOPIC_CHARS)]
    TooLong,

    #[error("input closed before a valid topic was entered")]
    Closed,

    #[error("could not read topic: {0}")]
    Io(String),
}

/// Strip markup characters and collapse runs of whitespace.
pub fn sanitize(raw: &str) -> String {
    MARKUP_RE
        .replace_all(raw, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check length bounds on an already sanitized topic.
pub fn validate(topic: &str) -> Result<(), TopicError> {
    let trimmed = topic.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        Err(TopicError::Empty)
    } else if len < MIN_TOPIC_CHARS {
        Err(TopicError::TooShort)
    } else if len > MAX_TOPIC_CHARS {
        Err(TopicError::TooLong)
    } else {
        Ok(())
    }
}

/// Sanitize then validate a topic given up front.
pub fn accept(raw: &str) -> Result<String, TopicError> {
    let topic = sanitize(raw);
    validate(&topic)?;
    Ok(topic)
}

/// Prompt on `output` and read lines from `input` until one is a valid
/// topic.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String, TopicError> {
    let io = |e: std::io::Error| TopicError::Io(e.to_string());
    let rule = "=".repeat(60);
    loop {
        write!(
            output,
            "\n{rule}\nEnter topic for debate:\n(Between {MIN_TOPIC_CHARS}-{MAX_TOPIC_CHARS} characters)\n{rule}\n> "
        )
        .map_err(io)?;
        output.flush().map_err(io)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io)? == 0 {
            return Err(TopicError::Closed);
        }

        match accept(&line) {
            Ok(topic) => {
                writeln!(output, "\n✓ Topic accepted: '{topic}'").map_err(io)?;
                return Ok(topic);
            }
            Err(e) => {
                writeln!(output, "\n✗ Invalid topic: {e}\nPlease try again.").map_err(io)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sanitize_strips_markup_and_whitespace() {
        assert_eq!(
            sanitize("  <b>Should   {AI}\tbe \\regulated?</b>  "),
            "bShould AI be regulated?/b"
        );
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_validate_bounds() {
        assert_eq!(validate("   "), Err(TopicError::Empty));
        assert_eq!(validate("too short"), Err(TopicError::TooShort));
        assert!(validate("ten chars!").is_ok());
        assert!(validate(&"a".repeat(500)).is_ok());
        assert_eq!(validate(&"a".repeat(501)), Err(TopicError::TooLong));
    }

    #[test]
    fn test_validate_counts_chars_not_bytes() {
        assert!(validate("éééééééééé").is_ok());
    }

    #[test]
    fn test_accept_validates_after_sanitizing() {
        assert_eq!(accept("<<<<>>>>{}ab"), Err(TopicError::TooShort));
        assert_eq!(accept(" Is  math discovered? ").unwrap(), "Is math discovered?");
    }

    #[test]
    fn test_prompt_retries_until_valid() {
        let mut input = Cursor::new("short\n\nShould cities ban cars downtown?\nignored\n");
        let mut output = Vec::new();
        let topic = prompt(&mut input, &mut output).unwrap();
        assert_eq!(topic, "Should cities ban cars downtown?");

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Enter topic for debate:").count(), 3);
        assert!(shown.contains("Topic too short"));
        assert!(shown.contains("cannot be empty"));
        assert!(shown.contains("✓ Topic accepted: 'Should cities ban cars downtown?'"));
    }

    #[test]
    fn test_prompt_reports_closed_input() {
        let mut input = Cursor::new("nope\n");
        let mut output = Vec::new();
        assert_eq!(prompt(&mut input, &mut output), Err(TopicError::Closed));
    }
}
