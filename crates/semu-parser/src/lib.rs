//! Parser for S-Emulator program descriptions.
//!
//! XML text is tokenized by `semu-lexer`, parsed into an [`Element`] tree and
//! mapped onto the [`ProgramDoc`] content model. JSON documents with the same
//! content model are accepted as well.

pub mod document;
pub mod parser;
pub mod writer;

pub use parser::{Element, Parser};
pub use writer::to_xml;

use semu_lexer::Lexer;
use semu_syntax::ast::ProgramDoc;
use semu_syntax::error::{Error, Result};

/// Parses an XML program description.
pub fn parse_xml(src: &str) -> Result<ProgramDoc> {
    let mut lexer = Lexer::new(src);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens);
    let root = parser.parse_document()?;
    document::program_from_element(&root)
}

/// Parses a JSON program description.
pub fn parse_json(src: &str) -> Result<ProgramDoc> {
    serde_json::from_str(src).map_err(|e| Error::with_span(format!("Invalid JSON: {}", e), e.line(), e.column()))
}

/// Parses either surface format: text starting with `{` is JSON, anything else XML.
pub fn parse_program_str(src: &str) -> Result<ProgramDoc> {
    let trimmed = src.trim_start_matches('\u{feff}').trim_start();
    if trimmed.is_empty() {
        return Err(Error::new("Program description is empty"));
    }
    if trimmed.starts_with('{') {
        parse_json(trimmed)
    } else {
        parse_xml(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<S-Program name="Successor">
  <S-Instructions>
    <S-Instruction type="synthetic" name="ASSIGNMENT">
      <S-Variable>y</S-Variable>
      <S-Instruction-Arguments>
        <S-Instruction-Argument name="assignedVariable" value="x1"/>
      </S-Instruction-Arguments>
    </S-Instruction>
    <S-Instruction type="basic" name="INCREASE">
      <S-Variable>y</S-Variable>
      <S-Label>L1</S-Label>
    </S-Instruction>
  </S-Instructions>
  <S-Functions>
    <S-Function name="Const3" user-string="Three">
      <S-Instructions>
        <S-Instruction type="synthetic" name="CONSTANT_ASSIGNMENT">
          <S-Variable>y</S-Variable>
          <S-Instruction-Arguments>
            <S-Instruction-Argument name="constantValue" value="3"/>
          </S-Instruction-Arguments>
        </S-Instruction>
      </S-Instructions>
    </S-Function>
  </S-Functions>
</S-Program>
"#;

    fn parse_ok(src: &str) -> ProgramDoc {
        parse_program_str(src).expect("Parsing should succeed")
    }

    #[test]
    fn test_program_structure() {
        let doc = parse_ok(SUCC);
        assert_eq!(doc.name, "Successor");
        assert_eq!(doc.instructions.len(), 2);
        assert_eq!(doc.instructions[0].name, "ASSIGNMENT");
        assert_eq!(doc.instructions[0].kind.as_deref(), Some("synthetic"));
        assert_eq!(doc.instructions[0].variable.as_deref(), Some("y"));
        assert_eq!(doc.instructions[0].argument("assignedVariable"), Some("x1"));
        assert_eq!(doc.instructions[1].label.as_deref(), Some("L1"));
        assert_eq!(doc.instructions[1].line, Some(10));
    }

    #[test]
    fn test_functions() {
        let doc = parse_ok(SUCC);
        assert_eq!(doc.functions.len(), 1);
        let f = &doc.functions[0];
        assert_eq!(f.name, "Const3");
        assert_eq!(f.display_name(), "Three");
        assert_eq!(f.instructions[0].argument("constantValue"), Some("3"));
    }

    #[test]
    fn test_instructions_without_wrapper() {
        let doc = parse_ok(
            r#"<S-Program name="Bare"><S-Instruction name="NEUTRAL"><S-Variable>y</S-Variable></S-Instruction></S-Program>"#,
        );
        assert_eq!(doc.instructions.len(), 1);
        assert_eq!(doc.instructions[0].name, "NEUTRAL");
    }

    #[test]
    fn test_xml_round_trip_through_writer() {
        let doc = parse_ok(SUCC);
        let again = parse_ok(&to_xml(&doc));
        assert_eq!(again.name, doc.name);
        assert_eq!(again.instructions.len(), doc.instructions.len());
        assert_eq!(again.functions[0].user_string.as_deref(), Some("Three"));
        assert_eq!(to_xml(&again), to_xml(&doc));
    }

    #[test]
    fn test_json_documents() {
        let doc = parse_ok(
            r#"{"name":"Id","instructions":[{"name":"ASSIGNMENT","variable":"y","arguments":[{"name":"assignedVariable","value":"x1"}]}]}"#,
        );
        assert_eq!(doc.name, "Id");
        assert_eq!(doc.instructions[0].argument("assignedVariable"), Some("x1"));
        assert!(parse_program_str("{\"name\": 3}").is_err());
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_program_str("<S-Program name=\"P\"><S-Instructions></S-Program>").unwrap_err();
        assert!(err.msg.contains("Mismatched end tag"), "{}", err.msg);
        assert!(err.line.is_some());

        let err = parse_program_str("<S-Program><S-Instructions/></S-Program>").unwrap_err();
        assert!(err.msg.contains("missing the 'name' attribute"));

        let err = parse_program_str("<S-Program name=\"P\">").unwrap_err();
        assert!(err.msg.contains("never closed"));

        assert!(parse_program_str("   ").is_err());
        assert!(parse_program_str("<A/><B/>").is_err());
    }
}
