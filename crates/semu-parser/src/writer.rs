//! Canonical XML rendering of a [`ProgramDoc`].

use semu_syntax::ast::{InstructionDoc, ProgramDoc};

use crate::document::*;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn indent(out: &mut String, level: usize) {
    out.push_str(&"  ".repeat(level));
}

fn write_instructions(out: &mut String, instructions: &[InstructionDoc], level: usize) {
    indent(out, level);
    if instructions.is_empty() {
        out.push_str(&format!("<{}/>\n", TAG_INSTRUCTIONS));
        return;
    }
    out.push_str(&format!("<{}>\n", TAG_INSTRUCTIONS));
    for i in instructions {
        write_instruction(out, i, level + 1);
    }
    indent(out, level);
    out.push_str(&format!("</{}>\n", TAG_INSTRUCTIONS));
}

fn write_instruction(out: &mut String, i: &InstructionDoc, level: usize) {
    indent(out, level);
    out.push_str(&format!("<{}", TAG_INSTRUCTION));
    if let Some(kind) = &i.kind {
        out.push_str(&format!(" type=\"{}\"", escape(kind)));
    }
    out.push_str(&format!(" name=\"{}\">\n", escape(&i.name)));
    if let Some(v) = &i.variable {
        indent(out, level + 1);
        out.push_str(&format!("<{0}>{1}</{0}>\n", TAG_VARIABLE, escape(v)));
    }
    if let Some(l) = &i.label {
        indent(out, level + 1);
        out.push_str(&format!("<{0}>{1}</{0}>\n", TAG_LABEL, escape(l)));
    }
    if !i.arguments.is_empty() {
        indent(out, level + 1);
        out.push_str(&format!("<{}>\n", TAG_ARGUMENTS));
        for a in &i.arguments {
            indent(out, level + 2);
            out.push_str(&format!(
                "<{} name=\"{}\" value=\"{}\"/>\n",
                TAG_ARGUMENT,
                escape(&a.name),
                escape(&a.value)
            ));
        }
        indent(out, level + 1);
        out.push_str(&format!("</{}>\n", TAG_ARGUMENTS));
    }
    indent(out, level);
    out.push_str(&format!("</{}>\n", TAG_INSTRUCTION));
}

/// Renders `doc` as an indented S-Program XML document.
pub fn to_xml(doc: &ProgramDoc) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<S-Program name=\"{}\">\n", escape(&doc.name)));
    write_instructions(&mut out, &doc.instructions, 1);
    if !doc.functions.is_empty() {
        indent(&mut out, 1);
        out.push_str(&format!("<{}>\n", TAG_FUNCTIONS));
        for f in &doc.functions {
            indent(&mut out, 2);
            out.push_str(&format!("<{} name=\"{}\"", TAG_FUNCTION, escape(&f.name)));
            if let Some(u) = &f.user_string {
                out.push_str(&format!(" user-string=\"{}\"", escape(u)));
            }
            out.push_str(">\n");
            write_instructions(&mut out, &f.instructions, 3);
            indent(&mut out, 2);
            out.push_str(&format!("</{}>\n", TAG_FUNCTION));
        }
        indent(&mut out, 1);
        out.push_str(&format!("</{}>\n", TAG_FUNCTIONS));
    }
    out.push_str("</S-Program>\n");
    out
}
