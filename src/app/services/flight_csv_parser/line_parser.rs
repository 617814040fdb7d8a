//! Field splitting for a single line of comma-separated text
//!
//! Commas inside double quotes do not split. A doubled quote inside a quoted
//! field is a literal quote; any other quote toggles quote state. An
//! unterminated quote simply runs to the end of the line.

use crate::constants::{FIELD_DELIMITER, QUOTE_CHAR};

/// Split one line into trimmed field values
///
/// Never fails: malformed quoting degrades to best-effort extraction, and an
/// empty line yields a single empty field.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    parse_line_into(line, &mut fields);
    fields
}

/// Split one line into `fields`, reusing its allocation
pub fn parse_line_into(line: &str, fields: &mut Vec<String>) {
    fields.clear();

    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            QUOTE_CHAR if in_quotes && chars.peek() == Some(&QUOTE_CHAR) => {
                current.push(QUOTE_CHAR);
                chars.next();
            }
            QUOTE_CHAR => in_quotes = !in_quotes,
            FIELD_DELIMITER if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
}
