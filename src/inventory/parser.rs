// Recursive-descent parser for bracketed inventory files
//
// Grammar:
//
//   Inventory := HostLine* Section*
//   Section   := '[' String ']' EndOfLine HostLine*
//   HostLine  := String EndOfLine
//
// Blank lines between host lines are skipped. A section runs until the next
// '[' or the end of the file.

use super::lexer::{tokenize, Span, Token, TokenKind};
use super::{Host, HostGroup, Inventory};
use crate::output::errors::ParseError;

const EXPECT_HOST_LINE: &str = "host name, '[' or end of line";

/// Options controlling how strictly a file is parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject files with more than one `[group]` section
    pub single_group: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        ParseOptions::default()
    }

    pub fn single_group(mut self, single_group: bool) -> Self {
        self.single_group = single_group;
        self
    }
}

/// Parse inventory text with default options
pub fn parse(text: &str) -> Result<Inventory, ParseError> {
    parse_with(text, &ParseOptions::default())
}

/// Parse inventory text with explicit options
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Inventory, ParseError> {
    let tokens = tokenize(text);
    parse_tokens(&tokens, options)
}

/// Parse an already tokenized stream. A missing trailing end-of-file marker
/// is treated as if it were present.
pub fn parse_tokens(tokens: &[Token], options: &ParseOptions) -> Result<Inventory, ParseError> {
    let inventory = Parser::new(tokens, options).parse_inventory()?;

    tracing::debug!(
        groups = inventory.groups().len(),
        ungrouped = inventory.ungrouped_hosts().len(),
        "parsed inventory"
    );

    Ok(inventory)
}

/// Forward-only cursor over an immutable token slice
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    options: &'t ParseOptions,
    eof: Token,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], options: &'t ParseOptions) -> Self {
        let eof_span = tokens
            .last()
            .map(|t| Span::new(t.span.line + 1, 1))
            .unwrap_or_else(|| Span::new(1, 1));

        Parser {
            tokens,
            pos: 0,
            options,
            eof: Token::new(TokenKind::EndOfFile, "", eof_span),
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn error(&self, expected: &'static str) -> ParseError {
        ParseError::unexpected(self.peek().clone(), self.pos, expected)
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<&'t Token, ParseError> {
        let tokens = self.tokens;
        match tokens.get(self.pos) {
            Some(token) if token.is(kind) => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error(expected)),
        }
    }

    fn parse_inventory(&mut self) -> Result<Inventory, ParseError> {
        let mut inventory = Inventory::new();

        let mut ungrouped = HostGroup::new("ungrouped");
        self.parse_host_lines(&mut ungrouped)?;
        for host in ungrouped.into_hosts() {
            inventory.push_ungrouped(host);
        }

        loop {
            match self.peek().kind {
                TokenKind::EndOfFile => break,
                TokenKind::OpenBracket => {
                    if self.options.single_group && !inventory.groups().is_empty() {
                        return Err(ParseError::too_many_groups(self.peek().clone(), self.pos));
                    }
                    let group = self.parse_section()?;
                    inventory.push_group(group);
                }
                _ => return Err(self.error("'[' or end of file")),
            }
        }

        Ok(inventory)
    }

    fn parse_section(&mut self) -> Result<HostGroup, ParseError> {
        self.expect(TokenKind::OpenBracket, "'['")?;
        let name = self.expect(TokenKind::String, "group name")?;
        self.expect(TokenKind::CloseBracket, "']'")?;
        self.expect(TokenKind::EndOfLine, "end of line after group header")?;

        let mut group = HostGroup::new(name.text.as_str());
        self.parse_host_lines(&mut group)?;

        tracing::debug!(group = %group.name(), hosts = group.len(), "parsed section");
        Ok(group)
    }

    /// Collect host lines into `group` until the next section or end of file
    fn parse_host_lines(&mut self, group: &mut HostGroup) -> Result<(), ParseError> {
        loop {
            match self.peek().kind {
                TokenKind::EndOfLine => self.pos += 1,
                TokenKind::OpenBracket | TokenKind::EndOfFile => return Ok(()),
                TokenKind::String => {
                    let name = self.expect(TokenKind::String, EXPECT_HOST_LINE)?;
                    self.expect(TokenKind::EndOfLine, "end of line after host name")?;
                    if !group.push_unique(Host::new(name.text.as_str())) {
                        tracing::debug!(
                            host = %name.text,
                            group = %group.name(),
                            "ignoring duplicate host"
                        );
                    }
                }
                _ => return Err(self.error(EXPECT_HOST_LINE)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::errors::ParseErrorKind;

    fn host_names(group: &HostGroup) -> Vec<&str> {
        group.hosts().iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn test_parse_empty() {
        let inv = parse("").unwrap();
        assert!(inv.groups().is_empty());
        assert!(inv.ungrouped_hosts().is_empty());
    }

    #[test]
    fn test_parse_single_section() {
        let inv = parse("[web]\nhost1\nhost2\n\n").unwrap();
        assert_eq!(inv.groups().len(), 1);
        assert_eq!(inv.groups()[0].name(), "web");
        assert_eq!(host_names(&inv.groups()[0]), vec!["host1", "host2"]);
    }

    #[test]
    fn test_parse_ungrouped_hosts() {
        let inv = parse("orphan\n[app]\nhost1\n").unwrap();
        let ungrouped: Vec<&str> = inv
            .ungrouped_hosts()
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(ungrouped, vec!["orphan"]);
        assert_eq!(inv.groups().len(), 1);
        assert_eq!(inv.groups()[0].name(), "app");
        assert_eq!(host_names(&inv.groups()[0]), vec!["host1"]);
    }

    #[test]
    fn test_parse_multiple_sections() {
        let inv = parse("[a]\nh1\n\n[b]\nh2\n").unwrap();
        assert_eq!(inv.groups().len(), 2);
        assert_eq!(inv.groups()[0].name(), "a");
        assert_eq!(host_names(&inv.groups()[0]), vec!["h1"]);
        assert_eq!(inv.groups()[1].name(), "b");
        assert_eq!(host_names(&inv.groups()[1]), vec!["h2"]);
    }

    #[test]
    fn test_parse_many_sections() {
        let mut text = String::new();
        for g in 0..50 {
            text.push_str(&format!("[group{}]\n", g));
            for h in 0..20 {
                text.push_str(&format!("g{}-host{}\n", g, h));
            }
            text.push('\n');
        }

        let inv = parse(&text).unwrap();
        assert_eq!(inv.groups().len(), 50);
        assert!(inv.groups().iter().all(|g| g.len() == 20));
        assert_eq!(inv.groups()[49].hosts()[19].name, "g49-host19");
    }

    #[test]
    fn test_leading_close_bracket_fails_at_position_zero() {
        let err = parse("]web[\n").unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.token.kind, TokenKind::CloseBracket);
        assert_eq!(err.token.span, Span::new(1, 1));
    }

    #[test]
    fn test_trailing_garbage_on_host_line_fails() {
        let err = parse("[web]\nhost1 garbage\n").unwrap_err();
        assert_eq!(err.token.kind, TokenKind::String);
        assert_eq!(err.token.text, "garbage");
        assert_eq!(err.position, 5);
        assert_eq!(err.token.span, Span::new(2, 7));
    }

    #[test]
    fn test_inline_vars_are_rejected() {
        let err = parse("web1 ansible_host=10.0.0.1\n").unwrap_err();
        assert_eq!(err.token.text, "ansible_host");
    }

    #[test]
    fn test_nested_group_header_is_rejected() {
        let err = parse("[web:children]\nfrontend\n").unwrap_err();
        assert_eq!(err.token.kind, TokenKind::Colon);
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken { expected: "']'" }
        );
    }

    #[test]
    fn test_empty_group_name_is_rejected() {
        let err = parse("[]\n").unwrap_err();
        assert_eq!(err.token.kind, TokenKind::CloseBracket);
        assert_eq!(err.position, 1);
    }

    #[test]
    fn test_header_followed_by_text_is_rejected() {
        let err = parse("[web] extra\n").unwrap_err();
        assert_eq!(err.token.text, "extra");
    }

    #[test]
    fn test_unterminated_header_at_end_of_file() {
        let err = parse("[web").unwrap_err();
        assert_eq!(err.token.kind, TokenKind::EndOfLine);
    }

    #[test]
    fn test_duplicate_hosts_are_ignored() {
        let inv = parse("[web]\nhost1\nhost2\nhost1\n").unwrap();
        assert_eq!(host_names(&inv.groups()[0]), vec!["host1", "host2"]);
    }

    #[test]
    fn test_same_host_in_different_groups() {
        let inv = parse("[a]\nshared\n[b]\nshared\n").unwrap();
        assert_eq!(inv.groups()[0].len(), 1);
        assert_eq!(inv.groups()[1].len(), 1);
    }

    #[test]
    fn test_blank_lines_inside_section() {
        let inv = parse("\n\n[web]\n\nhost1\n\n\nhost2").unwrap();
        assert_eq!(host_names(&inv.groups()[0]), vec!["host1", "host2"]);
    }

    #[test]
    fn test_empty_section() {
        let inv = parse("[empty]\n[full]\nhost1\n").unwrap();
        assert!(inv.groups()[0].is_empty());
        assert_eq!(inv.groups()[1].len(), 1);
    }

    #[test]
    fn test_single_group_option() {
        let options = ParseOptions::new().single_group(true);

        let inv = parse_with("[web]\nhost1\n", &options).unwrap();
        assert_eq!(inv.groups().len(), 1);

        let err = parse_with("[a]\nh1\n\n[b]\nh2\n", &options).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooManyGroups);
        assert_eq!(err.token.kind, TokenKind::OpenBracket);
        assert_eq!(err.token.span.line, 4);
    }

    #[test]
    fn test_parse_tokens_without_eof_marker() {
        let mut tokens = tokenize("[web]\nhost1\n");
        tokens.pop();

        let inv = parse_tokens(&tokens, &ParseOptions::default()).unwrap();
        assert_eq!(host_names(&inv.groups()[0]), vec!["host1"]);
    }

    #[test]
    fn test_parse_does_not_consume_stream() {
        let tokens = tokenize("[a]\nh1\n[b]\nh2\n");
        let before = tokens.clone();

        let first = parse_tokens(&tokens, &ParseOptions::default()).unwrap();
        let second = parse_tokens(&tokens, &ParseOptions::default()).unwrap();

        assert_eq!(tokens, before);
        assert_eq!(first, second);
    }
}
