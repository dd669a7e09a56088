//! Storage cells.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a cell. The declaration order is the display order: `y`, inputs, temps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VarKind {
    Output,
    Input,
    Temp,
}

/// A variable is identified by its kind and index; the name is derived.
///
/// The output cell always has index 0, inputs and temps are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    pub kind: VarKind,
    pub index: u32,
}

impl Variable {
    pub const Y: Variable = Variable { kind: VarKind::Output, index: 0 };

    pub fn input(index: u32) -> Self {
        Variable { kind: VarKind::Input, index }
    }

    pub fn temp(index: u32) -> Self {
        Variable { kind: VarKind::Temp, index }
    }

    /// Parses `y`, `xN` or `zN` (case-insensitive, `N > 0`).
    ///
    /// Anything else returns `None`; callers decide how to intern such names.
    ///
    /// ```rust
    /// use semu_program::Variable;
    ///
    /// assert_eq!(Variable::parse("X2"), Some(Variable::input(2)));
    /// assert_eq!(Variable::parse("y"), Some(Variable::Y));
    /// assert_eq!(Variable::parse("z0"), None);
    /// ```
    pub fn parse(token: &str) -> Option<Variable> {
        let t = token.trim().to_ascii_lowercase();
        if t == "y" {
            return Some(Variable::Y);
        }
        let mut chars = t.chars();
        let kind = match chars.next() {
            Some('x') => VarKind::Input,
            Some('z') => VarKind::Temp,
            _ => return None,
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match digits.parse::<u32>() {
            Ok(0) | Err(_) => None,
            Ok(index) => Some(Variable { kind, index }),
        }
    }

    pub fn is_output(&self) -> bool {
        self.kind == VarKind::Output
    }

    pub fn is_input(&self) -> bool {
        self.kind == VarKind::Input
    }

    pub fn is_temp(&self) -> bool {
        self.kind == VarKind::Temp
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            VarKind::Output => write!(f, "y"),
            VarKind::Input => write!(f, "x{}", self.index),
            VarKind::Temp => write!(f, "z{}", self.index),
        }
    }
}
