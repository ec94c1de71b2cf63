//! Reader for the `.properties` key/value format.
//!
//! Supports `key=value`, `key: value` and `key value` separators, `#` and `!`
//! comment lines, trailing-backslash line continuation, and the `\t`, `\n`,
//! `\r`, `\f` and `\uXXXX` escapes.

use std::collections::BTreeMap;

use crate::error::{Result, SynonymError};

/// Parse properties text into an ordered key/value map.
///
/// Later duplicates overwrite earlier ones.
pub fn parse(input: &str) -> Result<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    let mut logical = String::new();
    let mut start_line = 0;

    for (index, raw) in input.lines().enumerate() {
        let line = if logical.is_empty() {
            start_line = index + 1;
            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            trimmed
        } else {
            raw.trim_start()
        };

        if ends_with_continuation(line) {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }

        logical.push_str(line);
        let (key, value) = split_entry(&logical, start_line)?;
        entries.insert(key, value);
        logical.clear();
    }

    if !logical.is_empty() {
        let (key, value) = split_entry(&logical, start_line)?;
        entries.insert(key, value);
    }

    Ok(entries)
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str, line_number: usize) -> Result<(String, String)> {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                break;
            }
            c if c.is_whitespace() => {
                key_end = i;
                // "key = value" and "key value" both end the key at the first blank.
                let rest = line[i..].trim_start();
                let offset = line.len() - rest.len();
                value_start = if rest.starts_with('=') || rest.starts_with(':') {
                    offset + 1
                } else {
                    offset
                };
                break;
            }
            _ => {}
        }
    }

    let key = unescape(&line[..key_end], line_number)?;
    let value = unescape(line[value_start.min(line.len())..].trim_start(), line_number)?;
    Ok((key, value))
}

fn unescape(text: &str, line_number: usize) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        SynonymError::config(format!(
                            "invalid \\u escape '\\u{hex}' on line {line_number}"
                        ))
                    })?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}
