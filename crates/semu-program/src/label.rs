//! Jump targets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A label: no label at all, the distinguished exit label, or `L{n}`.
///
/// Ordering puts `Empty` first and `Exit` last so sorted label lists read
/// `L1, L2, ..., EXIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Empty,
    Numeric(u32),
    Exit,
}

impl Label {
    /// Parses a label token.
    ///
    /// A token starting with `L`/`l` is numeric and must be followed by digits,
    /// one starting with `E`/`e` is the exit label, anything else is empty.
    pub fn parse(token: &str) -> Result<Label, String> {
        let t = token.trim();
        match t.chars().next() {
            Some('L') | Some('l') => t[1..]
                .parse::<u32>()
                .map(Label::Numeric)
                .map_err(|_| format!("Invalid label '{}'", t)),
            Some('E') | Some('e') => Ok(Label::Exit),
            _ => Ok(Label::Empty),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Label::Empty)
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Label::Exit)
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            Label::Numeric(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for Label {
    fn default() -> Self {
        Label::Empty
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Empty => Ok(()),
            Label::Numeric(n) => write!(f, "L{}", n),
            Label::Exit => write!(f, "EXIT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_tokens() {
        assert_eq!(Label::parse("L12"), Ok(Label::Numeric(12)));
        assert_eq!(Label::parse(" l3 "), Ok(Label::Numeric(3)));
        assert_eq!(Label::parse("EXIT"), Ok(Label::Exit));
        assert_eq!(Label::parse("e"), Ok(Label::Exit));
        assert_eq!(Label::parse(""), Ok(Label::Empty));
        assert_eq!(Label::parse("-"), Ok(Label::Empty));
        assert!(Label::parse("Lx").is_err());
    }

    #[test]
    fn displays_and_orders() {
        assert_eq!(Label::Numeric(4).to_string(), "L4");
        assert_eq!(Label::Exit.to_string(), "EXIT");
        assert_eq!(Label::Empty.to_string(), "");
        let mut v = vec![Label::Exit, Label::Numeric(2), Label::Numeric(1)];
        v.sort();
        assert_eq!(v, vec![Label::Numeric(1), Label::Numeric(2), Label::Exit]);
    }
}
