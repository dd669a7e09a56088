//! Abstract program description: the content model every surface format maps to.
//!
//! A document names a root program, lists its instructions in program order,
//! and may carry auxiliary functions that QUOTE instructions call by name.
//! Instructions are kept close to the surface: their kind is the raw `name`
//! tag and operands are a bag of string arguments. Turning them into typed
//! instructions is the loader's job.

use serde::{Deserialize, Serialize};

/// Root of a program description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDoc {
    pub name: String,
    #[serde(default)]
    pub instructions: Vec<InstructionDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionDoc>,
}

/// An auxiliary program defined inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDoc {
    pub name: String,
    /// Display name shown to users; defaults to `name`.
    #[serde(default, rename = "userString", skip_serializing_if = "Option::is_none")]
    pub user_string: Option<String>,
    #[serde(default)]
    pub instructions: Vec<InstructionDoc>,
}

/// One instruction element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionDoc {
    /// Instruction tag, e.g. `INCREASE` or `JUMP_EQUAL_FUNCTION`.
    pub name: String,
    /// Declared `basic`/`synthetic` type; informational only.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentDoc>,
    /// Source position of the element, when parsed from text.
    #[serde(skip)]
    pub line: Option<usize>,
    #[serde(skip)]
    pub col: Option<usize>,
}

/// A named string argument of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDoc {
    pub name: String,
    pub value: String,
}

impl InstructionDoc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            variable: None,
            label: None,
            arguments: Vec::new(),
            line: None,
            col: None,
        }
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push(ArgumentDoc { name: name.into(), value: value.into() });
        self
    }

    /// Value of the named argument; the last occurrence wins.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .rev()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

impl FunctionDoc {
    pub fn display_name(&self) -> &str {
        self.user_string.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_argument_wins() {
        let doc = InstructionDoc::new("GOTO_LABEL")
            .with_argument("gotoLabel", "L1")
            .with_argument("gotoLabel", "L2");
        assert_eq!(doc.argument("gotoLabel"), Some("L2"));
        assert_eq!(doc.argument("JNZLabel"), None);
    }

    #[test]
    fn json_shape_uses_surface_names() {
        let doc = ProgramDoc {
            name: "Succ".to_string(),
            instructions: vec![InstructionDoc::new("ASSIGNMENT")
                .with_variable("y")
                .with_argument("assignedVariable", "x1")],
            functions: vec![],
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"assignedVariable\""));
        assert!(!json.contains("functions"));
        let back: ProgramDoc = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn function_display_name_falls_back_to_name() {
        let f = FunctionDoc { name: "Const3".into(), user_string: None, instructions: vec![] };
        assert_eq!(f.display_name(), "Const3");
    }
}
