// Error types and human-readable rendering for drinv

use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;

use colored::*;
use thiserror::Error;

use crate::inventory::Token;

/// Decide whether to color output from TTY detection and NO_COLOR
fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    std::io::stderr().is_terminal()
}

/// What went wrong at the offending token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}")]
    UnexpectedToken { expected: &'static str },

    #[error("only one group is allowed per file")]
    TooManyGroups,
}

/// Structural violation found while parsing an inventory.
///
/// `position` is the index of `token` in the token stream; the token's span
/// gives the line and column in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected {token} at line {}, column {}: {kind}", .token.span.line, .token.span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub token: Token,
    pub position: usize,
}

impl ParseError {
    pub fn unexpected(token: Token, position: usize, expected: &'static str) -> Self {
        ParseError {
            kind: ParseErrorKind::UnexpectedToken { expected },
            token,
            position,
        }
    }

    pub fn too_many_groups(token: Token, position: usize) -> Self {
        ParseError {
            kind: ParseErrorKind::TooManyGroups,
            token,
            position,
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        use crate::inventory::TokenKind;

        match (&self.kind, self.token.kind) {
            (ParseErrorKind::TooManyGroups, _) => {
                Some("Split the file or disable single_group in the configuration")
            }
            (_, TokenKind::Colon) => Some("Nested groups like [name:children] are not supported"),
            (_, TokenKind::Equal) => {
                Some("Inline variables are not supported; put one host name per line")
            }
            (_, TokenKind::String) => Some("Put exactly one host name on each line"),
            _ => None,
        }
    }
}

/// All error types in drinv
#[derive(Debug)]
pub enum DrinvError {
    /// Inventory text failed to parse
    Parse {
        error: Box<ParseError>,
        file: Option<PathBuf>,
        source: Option<String>,
    },

    /// I/O errors at the file boundary
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Inventory content or lookup errors
    Inventory {
        message: String,
        suggestion: Option<String>,
    },

    /// Configuration file errors
    Config {
        message: String,
        path: Option<PathBuf>,
    },
}

impl DrinvError {
    /// Attach the file the parse error came from
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        if let DrinvError::Parse { ref mut file, .. } = self {
            *file = Some(path.into());
        }
        self
    }

    /// Attach the source text so the error can show the offending line
    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        if let DrinvError::Parse { ref mut source, .. } = self {
            *source = Some(text.into());
        }
        self
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            DrinvError::Parse { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<ParseError> for DrinvError {
    fn from(error: ParseError) -> Self {
        DrinvError::Parse {
            error: Box::new(error),
            file: None,
            source: None,
        }
    }
}

impl std::error::Error for DrinvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrinvError::Parse { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for DrinvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !should_use_colors() {
            colored::control::set_override(false);
        }

        match self {
            DrinvError::Parse {
                error,
                file,
                source,
            } => {
                writeln!(f, "{}: {}", "PARSE ERROR".red().bold(), error)?;

                let span = error.token.span;
                if let Some(file) = file {
                    writeln!(
                        f,
                        "  {} {}:{}:{}",
                        "-->".blue(),
                        file.display().to_string().cyan(),
                        span.line,
                        span.column
                    )?;
                }

                if let Some(source) = source {
                    writeln!(f)?;
                    let message = error.kind.to_string();
                    write!(
                        f,
                        "{}",
                        format_source_error(source, span.line, span.column, &message)
                    )?;
                }

                if let Some(suggestion) = error.suggestion() {
                    writeln!(f)?;
                    writeln!(f, "{}: {}", "Hint".yellow().bold(), suggestion)?;
                }

                Ok(())
            }

            DrinvError::Io { message, path } => {
                writeln!(f, "{}: {}", "I/O ERROR".red().bold(), message)?;
                if let Some(path) = path {
                    writeln!(f, "  {} {}", "Path:".dimmed(), path.display())?;
                }
                Ok(())
            }

            DrinvError::Inventory {
                message,
                suggestion,
            } => {
                writeln!(f, "{}: {}", "INVENTORY ERROR".red().bold(), message)?;

                if let Some(suggestion) = suggestion {
                    writeln!(f)?;
                    writeln!(f, "{}: {}", "Hint".yellow().bold(), suggestion)?;
                }

                Ok(())
            }

            DrinvError::Config { message, path } => {
                writeln!(f, "{}: {}", "CONFIG ERROR".red().bold(), message)?;
                if let Some(path) = path {
                    writeln!(f, "  {} {}", "Path:".dimmed(), path.display())?;
                }
                Ok(())
            }
        }
    }
}

/// Render the offending source line with a caret under `column` (both 1-based).
/// One line of context is shown on either side.
pub fn format_source_error(source: &str, line: usize, column: usize, message: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let mut result = String::new();

    if line == 0 {
        return result;
    }

    // An end-of-file token sits one past the last line
    let anchor = line.min(lines.len().max(1));
    let start = anchor.saturating_sub(2);
    let end = (anchor + 1).min(lines.len());

    for (i, src_line) in lines.iter().enumerate().take(end).skip(start) {
        let line_num = i + 1;
        if line_num == line {
            result.push_str(&format!("{:>4} {} ", line_num, ">".red()));
        } else {
            result.push_str(&format!("{:>4} {} ", line_num, "|".blue()));
        }
        result.push_str(src_line);
        result.push('\n');

        if line_num == line {
            result.push_str(&" ".repeat(6 + column.saturating_sub(1)));
            result.push_str(&"^".red().to_string());
            if !message.is_empty() {
                result.push(' ');
                result.push_str(&message.red().to_string());
            }
            result.push('\n');
        }
    }

    result
}
