//! Recursive-descent parser from XML tokens to an element tree.

use semu_syntax::error::{error_at, Result};
use semu_syntax::token::{Token, TokenKind};

/// A parsed XML element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated character data directly inside this element.
    pub text: String,
    pub line: usize,
    pub col: usize,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text content.
    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn position(&self) -> (usize, usize) {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(t) => (t.line, t.col),
            None => (1, 1),
        }
    }

    fn bump(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn expect(&mut self, expected: TokenKind) -> Result<()> {
        let (line, col) = self.position();
        let found = self.bump();
        if found == expected {
            Ok(())
        } else {
            error_at(
                line,
                col,
                format!("Expected {}, found {}", expected.describe(), found.describe()),
            )
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        let (line, col) = self.position();
        match self.bump() {
            TokenKind::Name(n) => Ok(n),
            other => error_at(line, col, format!("Expected name, found {}", other.describe())),
        }
    }

    /// Parses a whole document: exactly one root element.
    pub fn parse_document(&mut self) -> Result<Element> {
        if let TokenKind::Text(_) = self.peek() {
            let (line, col) = self.position();
            return error_at(line, col, "Unexpected text before the root element");
        }
        let root = self.parse_element()?;
        let (line, col) = self.position();
        match self.peek() {
            TokenKind::Eof => Ok(root),
            other => error_at(
                line,
                col,
                format!("Unexpected {} after the root element", other.describe()),
            ),
        }
    }

    /// Parses one element starting at its `<`.
    pub fn parse_element(&mut self) -> Result<Element> {
        let (line, col) = self.position();
        self.expect(TokenKind::Open)?;
        let name = self.expect_name()?;
        let mut element = Element {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
            line,
            col,
        };

        loop {
            let (aline, acol) = self.position();
            match self.bump() {
                TokenKind::SlashClose => return Ok(element),
                TokenKind::Close => break,
                TokenKind::Name(attr) => {
                    self.expect(TokenKind::Equal)?;
                    let (vline, vcol) = self.position();
                    let value = match self.bump() {
                        TokenKind::Str(s) => s,
                        other => {
                            return error_at(
                                vline,
                                vcol,
                                format!("Expected attribute value, found {}", other.describe()),
                            )
                        }
                    };
                    if element.attribute(&attr).is_some() {
                        return error_at(aline, acol, format!("Duplicate attribute '{}'", attr));
                    }
                    element.attributes.push((attr, value));
                }
                other => {
                    return error_at(
                        aline,
                        acol,
                        format!("Unexpected {} in tag <{}>", other.describe(), element.name),
                    )
                }
            }
        }

        loop {
            let (cline, ccol) = self.position();
            match self.peek().clone() {
                TokenKind::Text(t) => {
                    self.bump();
                    element.text.push_str(&t);
                }
                TokenKind::Open => element.children.push(self.parse_element()?),
                TokenKind::OpenSlash => {
                    self.bump();
                    let closing = self.expect_name()?;
                    if closing != element.name {
                        return error_at(
                            cline,
                            ccol,
                            format!(
                                "Mismatched end tag: expected </{}>, found </{}>",
                                element.name, closing
                            ),
                        );
                    }
                    self.expect(TokenKind::Close)?;
                    return Ok(element);
                }
                TokenKind::Eof => {
                    return error_at(
                        line,
                        col,
                        format!("Element <{}> is never closed", element.name),
                    )
                }
                other => {
                    return error_at(cline, ccol, format!("Unexpected {}", other.describe()))
                }
            }
        }
    }
}
