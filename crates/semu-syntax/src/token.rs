//! Token definitions for the XML surface format of S-programs.
//!
//! The lexer turns a program description into a flat stream of these tokens.
//! Markup is split into its punctuation (`<`, `</`, `>`, `/>`, `=`), names and
//! quoted attribute values; character data between tags becomes a single
//! [`TokenKind::Text`] token. Declarations (`<?xml ...?>`), comments and
//! doctype declarations never reach the token stream.
//!
//! # Examples
//!
//! ```rust
//! use semu_syntax::{Token, TokenKind};
//!
//! // `<S-Variable>` starts with an open angle followed by a name
//! let open = Token { kind: TokenKind::Open, line: 1, col: 1 };
//! let name = Token { kind: TokenKind::Name("S-Variable".to_string()), line: 1, col: 2 };
//! assert_eq!(name.kind.describe(), "name 'S-Variable'");
//! assert_eq!(open.kind, TokenKind::Open);
//! ```

/// Token types that can be produced by the XML lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Markup punctuation ===

    /// `<` opening a start tag
    Open,

    /// `</` opening an end tag
    OpenSlash,

    /// `>` closing a tag
    Close,

    /// `/>` closing an empty-element tag
    SlashClose,

    /// `=` between an attribute name and its value
    Equal,

    // === Content ===

    /// An element or attribute name
    ///
    /// Examples: `S-Program`, `name`, `S-Instruction-Argument`
    Name(String),

    /// A quoted attribute value with entities already decoded
    ///
    /// Examples: `"JNZLabel"`, `'L1'`
    Str(String),

    /// Character data between tags with entities decoded; never all-whitespace
    Text(String),

    /// End-of-input marker
    Eof,
}

impl TokenKind {
    /// Human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Open => "'<'".to_string(),
            TokenKind::OpenSlash => "'</'".to_string(),
            TokenKind::Close => "'>'".to_string(),
            TokenKind::SlashClose => "'/>'".to_string(),
            TokenKind::Equal => "'='".to_string(),
            TokenKind::Name(n) => format!("name '{}'", n),
            TokenKind::Str(s) => format!("string \"{}\"", s),
            TokenKind::Text(t) => format!("text '{}'", t.trim()),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// A token together with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The type and content of this token
    pub kind: TokenKind,

    /// Line number where this token starts (1-based)
    pub line: usize,

    /// Column number where this token starts (1-based)
    pub col: usize,
}
