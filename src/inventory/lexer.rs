// Line lexer for bracketed inventory files

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Token kinds produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Opening bracket `[`
    OpenBracket,
    /// Closing bracket `]`
    CloseBracket,
    /// Colon `:`
    Colon,
    /// Equals sign `=`
    Equal,
    /// Any other run of non-whitespace characters
    String,
    /// End of a physical line
    EndOfLine,
    /// End of the whole input
    EndOfFile,
}

impl TokenKind {
    /// Human-readable description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::OpenBracket => "'['",
            TokenKind::CloseBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Equal => "'='",
            TokenKind::String => "name",
            TokenKind::EndOfLine => "end of line",
            TokenKind::EndOfFile => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Source location of a token. Both fields are 1-based; columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Span { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single token with its kind, text, and source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "'{}'", self.text),
            kind => f.write_str(kind.describe()),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '[' | ']' | ':' | '=')
}

/// Lazy tokenizer over a single line.
///
/// Yields tokens left to right and always finishes with exactly one
/// [`TokenKind::EndOfLine`], so an empty line produces just that marker.
pub struct Lexer<'a> {
    line: &'a str,
    line_no: usize,
    chars: Peekable<CharIndices<'a>>,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for `line`, reporting spans on line `line_no`
    pub fn new(line: &'a str, line_no: usize) -> Self {
        Lexer {
            line,
            line_no,
            chars: line.char_indices().peekable(),
            column: 1,
            finished: false,
        }
    }

    fn span(&self, column: usize) -> Span {
        Span::new(self.line_no, column)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.chars.next();
            self.column += 1;
        }
    }

    fn read_string(&mut self, start: usize) -> &'a str {
        let mut end = self.line.len();
        while let Some(&(idx, c)) = self.chars.peek() {
            if c.is_whitespace() || is_delimiter(c) {
                end = idx;
                break;
            }
            self.chars.next();
            self.column += 1;
        }
        &self.line[start..end]
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        self.skip_whitespace();

        let Some(&(idx, c)) = self.chars.peek() else {
            self.finished = true;
            return Some(Token::new(TokenKind::EndOfLine, "", self.span(self.column)));
        };

        let column = self.column;
        let kind = match c {
            '[' => Some(TokenKind::OpenBracket),
            ']' => Some(TokenKind::CloseBracket),
            ':' => Some(TokenKind::Colon),
            '=' => Some(TokenKind::Equal),
            _ => None,
        };

        if let Some(kind) = kind {
            self.chars.next();
            self.column += 1;
            return Some(Token::new(kind, c.to_string(), self.span(column)));
        }

        let text = self.read_string(idx);
        Some(Token::new(TokenKind::String, text, self.span(column)))
    }
}

/// Tokenize a single line (without its newline character). Never fails.
pub fn lex(line: &str) -> Vec<Token> {
    Lexer::new(line, 1).collect()
}

/// Tokenize a whole document: every line's tokens (each ending in an
/// end-of-line marker) followed by a single end-of-file marker.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line_count = 0;

    for (idx, line) in text.lines().enumerate() {
        line_count = idx + 1;
        tokens.extend(Lexer::new(line, line_count));
    }

    tokens.push(Token::new(
        TokenKind::EndOfFile,
        "",
        Span::new(line_count + 1, 1),
    ));

    tracing::debug!(lines = line_count, tokens = tokens.len(), "tokenized inventory");
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_line() {
        let tokens = lex("");
        assert_eq!(kinds(&tokens), vec![TokenKind::EndOfLine]);
    }

    #[test]
    fn test_whitespace_only_line() {
        let tokens = lex("   \t ");
        assert_eq!(kinds(&tokens), vec![TokenKind::EndOfLine]);
    }

    #[test]
    fn test_section_header() {
        let tokens = lex("[webservers]");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::OpenBracket,
                TokenKind::String,
                TokenKind::CloseBracket,
                TokenKind::EndOfLine,
            ]
        );
        assert_eq!(tokens[1].text, "webservers");
    }

    #[test]
    fn test_delimiters_split_strings() {
        let tokens = lex("web1 ansible_host=10.0.0.1:22");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["web1", "ansible_host", "=", "10.0.0.1", ":", "22", ""]
        );
        assert_eq!(tokens[2].kind, TokenKind::Equal);
        assert_eq!(tokens[4].kind, TokenKind::Colon);
    }

    #[test]
    fn test_strings_are_verbatim() {
        let tokens = lex("  db-01.example.com#x  ");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "db-01.example.com#x");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_spans_track_columns() {
        let tokens = lex("  [app]");
        assert_eq!(tokens[0].span, Span::new(1, 3));
        assert_eq!(tokens[1].span, Span::new(1, 4));
        assert_eq!(tokens[2].span, Span::new(1, 7));
        assert_eq!(tokens[3].span, Span::new(1, 8));
    }

    #[test]
    fn test_unicode_columns_count_characters() {
        let tokens = lex("hôst ]");
        assert_eq!(tokens[0].text, "hôst");
        assert_eq!(tokens[1].span.column, 6);
    }

    #[test]
    fn test_tokenize_appends_markers() {
        let tokens = tokenize("[web]\nhost1\r\n\nhost2");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::OpenBracket,
                TokenKind::String,
                TokenKind::CloseBracket,
                TokenKind::EndOfLine,
                TokenKind::String,
                TokenKind::EndOfLine,
                TokenKind::EndOfLine,
                TokenKind::String,
                TokenKind::EndOfLine,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[4].text, "host1");
        assert_eq!(tokens[7].span.line, 4);
    }

    #[test]
    fn test_tokenize_empty_input() {
        let tokens = tokenize("");
        assert_eq!(kinds(&tokens), vec![TokenKind::EndOfFile]);
    }

    #[test]
    fn test_long_line_is_iterative() {
        let line = "x ".repeat(100_000);
        let tokens = lex(&line);
        assert_eq!(tokens.len(), 100_001);
    }
}
