//! Position normalization helpers
//!
//! Tools report columns in bytes, UTF-16 code units or characters, and some
//! report no span at all. These helpers convert everything to the 1-based
//! character positions used by [`Diagnostic`](crate::Diagnostic).

/// Text of a 1-based line, without its line terminator
pub fn line_text(code: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    code.split('\n')
        .nth(line - 1)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// Convert a 1-based byte column to a 1-based character column
pub fn byte_to_char_column(line: &str, byte_column: usize) -> usize {
    let byte_offset = byte_column.saturating_sub(1);
    let chars = line
        .char_indices()
        .take_while(|(idx, _)| *idx < byte_offset)
        .count();
    // columns past the end of the line point just after it
    let overflow = byte_offset.saturating_sub(line.len());
    chars + overflow + 1
}

/// Convert a 1-based UTF-16 column to a 1-based character column
pub fn utf16_to_char_column(line: &str, utf16_column: usize) -> usize {
    let target = utf16_column.saturating_sub(1);
    let mut units = 0;
    let mut chars = 0;
    for ch in line.chars() {
        if units >= target {
            break;
        }
        units += ch.len_utf16();
        chars += 1;
    }
    chars + target.saturating_sub(units) + 1
}

/// Locate an absolute 0-based UTF-16 offset as a 1-based (line, column)
pub fn locate_utf16_offset(code: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    let mut units = 0;
    for ch in code.chars() {
        if units >= offset {
            break;
        }
        units += ch.len_utf16();
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Number of characters covered by a UTF-16 span starting at an absolute offset
pub fn utf16_span_chars(code: &str, start: usize, length: usize) -> usize {
    let end = start.saturating_add(length);
    let mut units = 0;
    let mut chars = 0;
    for ch in code.chars() {
        if units >= end {
            break;
        }
        if units >= start {
            chars += 1;
        }
        units += ch.len_utf16();
    }
    chars.max(1)
}

/// Length of the token starting at a 1-based character column.
///
/// Identifiers and numbers extend over word characters, quoted literals
/// extend to the closing quote. Anything else counts as one character.
pub fn token_length_at(line: &str, column: usize) -> usize {
    let rest: Vec<char> = line.chars().skip(column.saturating_sub(1)).collect();
    let Some(&first) = rest.first() else {
        return 1;
    };

    if first == '"' || first == '\'' || first == '`' {
        let mut escaped = false;
        for (idx, &ch) in rest.iter().enumerate().skip(1) {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == first {
                return idx + 1;
            }
        }
        return 1;
    }

    let word = rest
        .iter()
        .take_while(|ch| ch.is_alphanumeric() || **ch == '_')
        .count();
    word.max(1)
}

/// Length of the token at a 1-based (line, column) in `code`
pub fn token_length_in(code: &str, line: usize, column: usize) -> usize {
    line_text(code, line)
        .map(|text| token_length_at(text, column))
        .unwrap_or(1)
}
