//! Mapping from the XML element tree to the abstract [`ProgramDoc`].

use semu_syntax::ast::{ArgumentDoc, FunctionDoc, InstructionDoc, ProgramDoc};
use semu_syntax::error::{error_at, Result};

use crate::parser::Element;

pub const TAG_INSTRUCTIONS: &str = "S-Instructions";
pub const TAG_INSTRUCTION: &str = "S-Instruction";
pub const TAG_VARIABLE: &str = "S-Variable";
pub const TAG_LABEL: &str = "S-Label";
pub const TAG_ARGUMENTS: &str = "S-Instruction-Arguments";
pub const TAG_ARGUMENT: &str = "S-Instruction-Argument";
pub const TAG_FUNCTIONS: &str = "S-Functions";
pub const TAG_FUNCTION: &str = "S-Function";

fn required_attribute<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    match element.attribute(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => error_at(
            element.line,
            element.col,
            format!("<{}> is missing the '{}' attribute", element.name, name),
        ),
    }
}

/// Builds the document model from a parsed root element.
pub fn program_from_element(root: &Element) -> Result<ProgramDoc> {
    let name = required_attribute(root, "name")?.to_string();
    let instructions = instructions_of(root)?;
    let mut functions = Vec::new();
    for list in root.children_named(TAG_FUNCTIONS) {
        for f in list.children_named(TAG_FUNCTION) {
            functions.push(function_from_element(f)?);
        }
    }
    Ok(ProgramDoc { name, instructions, functions })
}

fn function_from_element(element: &Element) -> Result<FunctionDoc> {
    let name = required_attribute(element, "name")?.to_string();
    let user_string = element
        .attribute("user-string")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(FunctionDoc {
        name,
        user_string,
        instructions: instructions_of(element)?,
    })
}

/// Instructions listed under `<S-Instructions>`, or directly under `parent`.
fn instructions_of(parent: &Element) -> Result<Vec<InstructionDoc>> {
    let holder = parent.child(TAG_INSTRUCTIONS).unwrap_or(parent);
    holder
        .children_named(TAG_INSTRUCTION)
        .map(instruction_from_element)
        .collect()
}

fn instruction_from_element(element: &Element) -> Result<InstructionDoc> {
    let name = required_attribute(element, "name")?.to_string();
    let mut doc = InstructionDoc::new(name);
    doc.kind = element.attribute("type").map(|t| t.trim().to_string());
    doc.variable = element
        .child(TAG_VARIABLE)
        .map(|v| v.text().to_string())
        .filter(|v| !v.is_empty());
    doc.label = element
        .child(TAG_LABEL)
        .map(|l| l.text().to_string())
        .filter(|l| !l.is_empty());
    if let Some(args) = element.child(TAG_ARGUMENTS) {
        for arg in args.children_named(TAG_ARGUMENT) {
            doc.arguments.push(ArgumentDoc {
                name: required_attribute(arg, "name")?.to_string(),
                value: arg.attribute("value").unwrap_or("").trim().to_string(),
            });
        }
    }
    doc.line = Some(element.line);
    doc.col = Some(element.col);
    Ok(doc)
}
