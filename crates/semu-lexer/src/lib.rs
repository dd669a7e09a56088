//! S-Emulator lexer: converts an XML program description into tokens.
use semu_syntax::error::{error_at, Error, Result};
use semu_syntax::token::{Token, TokenKind};

/// Streaming character scanner that produces tokens with positions.
///
/// The scanner switches between two modes: inside a tag it produces names,
/// `=` and quoted strings; between tags it collects character data.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    in_tag: bool,
}

impl Lexer {
    /// Create a new lexer over the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            in_tag: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }
    fn peek_next(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }
    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.src.get(self.pos + i) == Some(&c))
    }
    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }
    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn make_token(&self, kind: TokenKind, line: usize, col: usize) -> Token {
        Token { kind, line, col }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skips everything up to and including `terminator`.
    fn skip_until(&mut self, terminator: &str, what: &str) -> Result<()> {
        let (line, col) = (self.line, self.col);
        while self.peek().is_some() {
            if self.starts_with(terminator) {
                self.advance_by(terminator.chars().count());
                return Ok(());
            }
            self.advance();
        }
        error_at(line, col, format!("Unterminated {}", what))
    }

    fn is_name_start(c: char) -> bool {
        c.is_alphabetic() || c == '_' || c == ':'
    }

    fn is_name_char(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
    }

    fn read_name(&mut self) -> Token {
        let (line, col) = (self.line, self.col);
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if Self::is_name_char(c) {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.make_token(TokenKind::Name(s), line, col)
    }

    fn read_string(&mut self, quote: char) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.advance();
        let mut raw = String::new();
        while let Some(c) = self.advance() {
            if c == quote {
                let value = decode_entities(&raw).map_err(|msg| Error::with_span(msg, line, col))?;
                return Ok(self.make_token(TokenKind::Str(value), line, col));
            }
            raw.push(c);
        }
        error_at(line, col, "Unterminated attribute value")
    }

    /// Reads character data up to the next `<`. Returns `None` for pure whitespace.
    fn read_text(&mut self) -> Result<Option<Token>> {
        let (line, col) = (self.line, self.col);
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c == '<' {
                break;
            }
            raw.push(c);
            self.advance();
        }
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let text = decode_entities(&raw).map_err(|msg| Error::with_span(msg, line, col))?;
        Ok(Some(self.make_token(TokenKind::Text(text), line, col)))
    }

    fn read_cdata(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.advance_by("<![CDATA[".len());
        let mut s = String::new();
        while self.peek().is_some() {
            if self.starts_with("]]>") {
                self.advance_by(3);
                return Ok(self.make_token(TokenKind::Text(s), line, col));
            }
            if let Some(c) = self.advance() {
                s.push(c);
            }
        }
        error_at(line, col, "Unterminated CDATA section")
    }

    fn next_in_tag(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        let (line, col) = (self.line, self.col);
        let tk = match self.peek() {
            None => return error_at(line, col, "Unexpected end of input inside a tag"),
            Some('>') => {
                self.advance();
                self.in_tag = false;
                self.make_token(TokenKind::Close, line, col)
            }
            Some('/') if self.peek_next() == Some('>') => {
                self.advance_by(2);
                self.in_tag = false;
                self.make_token(TokenKind::SlashClose, line, col)
            }
            Some('=') => {
                self.advance();
                self.make_token(TokenKind::Equal, line, col)
            }
            Some(q @ ('"' | '\'')) => self.read_string(q)?,
            Some(c) if Self::is_name_start(c) => self.read_name(),
            Some(other) => {
                return error_at(line, col, format!("Unexpected character '{}' inside a tag", other));
            }
        };
        Ok(Some(tk))
    }

    fn next_in_content(&mut self) -> Result<Option<Token>> {
        let (line, col) = (self.line, self.col);
        if self.peek().is_none() {
            return Ok(Some(self.make_token(TokenKind::Eof, line, col)));
        }
        if self.starts_with("<?") {
            self.skip_until("?>", "processing instruction")?;
            return Ok(None);
        }
        if self.starts_with("<!--") {
            self.skip_until("-->", "comment")?;
            return Ok(None);
        }
        if self.starts_with("<![CDATA[") {
            return self.read_cdata().map(Some);
        }
        if self.starts_with("<!") {
            self.skip_until(">", "declaration")?;
            return Ok(None);
        }
        if self.starts_with("</") {
            self.advance_by(2);
            self.in_tag = true;
            return Ok(Some(self.make_token(TokenKind::OpenSlash, line, col)));
        }
        if self.peek() == Some('<') {
            self.advance();
            self.in_tag = true;
            return Ok(Some(self.make_token(TokenKind::Open, line, col)));
        }
        self.read_text()
    }

    /// Tokenize the entire input into a vector of tokens ending with Eof.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let next = if self.in_tag { self.next_in_tag()? } else { self.next_in_content()? };
            if let Some(tk) = next {
                let done = tk.kind == TokenKind::Eof;
                tokens.push(tk);
                if done {
                    break;
                }
            }
        }
        Ok(tokens)
    }
}

/// Decodes the predefined XML entities and numeric character references.
pub fn decode_entities(raw: &str) -> std::result::Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| format!("Unterminated entity in '{}'", raw))?;
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| format!("Unknown entity '&{};'", entity))?
            }
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
