//! Solr synonym line format.
//!
//! ```text
//! # comment
//! fast, quick, rapid          equivalence group
//! colour, color => color      explicit mapping
//! a\,b, ab                    backslash escapes a separator
//! ```

/// One parsed rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolrRule {
    Group(Vec<String>),
    Mapping { from: Vec<String>, to: Vec<String> },
}

/// Parse one line. Blank lines and comments yield `Ok(None)`; the error
/// side is a message without position, which the caller decorates.
pub fn parse_line(line: &str, ignore_case: bool) -> Result<Option<SolrRule>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let sides = split_unescaped(trimmed, "=>");
    match sides.as_slice() {
        [group] => {
            let terms = terms(group, ignore_case);
            if terms.is_empty() {
                return Err("rule has no terms".to_string());
            }
            Ok(Some(SolrRule::Group(terms)))
        }
        [from, to] => {
            let from = terms(from, ignore_case);
            let to = terms(to, ignore_case);
            if from.is_empty() {
                return Err("mapping has no source terms".to_string());
            }
            if to.is_empty() {
                return Err("mapping has no target terms".to_string());
            }
            Ok(Some(SolrRule::Mapping { from, to }))
        }
        _ => Err("more than one '=>' in rule".to_string()),
    }
}

fn terms(side: &str, ignore_case: bool) -> Vec<String> {
    split_unescaped(side, ",")
        .into_iter()
        .map(|raw| normalize(&unescape(raw), ignore_case))
        .filter(|term| !term.is_empty())
        .collect()
}

/// Collapse inner whitespace so "machine   learning" matches "machine learning".
fn normalize(term: &str, ignore_case: bool) -> String {
    let joined = term.split_whitespace().collect::<Vec<_>>().join(" ");
    if ignore_case {
        joined.to_lowercase()
    } else {
        joined
    }
}

fn split_unescaped<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut skip_until = 0;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if i < skip_until {
            continue;
        }
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if text[i..].starts_with(separator) {
            parts.push(&text[start..i]);
            start = i + separator.len();
            skip_until = start;
        }
    }
    parts.push(&text[start..]);
    parts
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_group() {
        assert_eq!(
            parse_line(" fast ,quick,  rapid ", false).unwrap(),
            Some(SolrRule::Group(strings(&["fast", "quick", "rapid"])))
        );
    }

    #[test]
    fn test_mapping() {
        assert_eq!(
            parse_line("i-pod, i pod => ipod", false).unwrap(),
            Some(SolrRule::Mapping {
                from: strings(&["i-pod", "i pod"]),
                to: strings(&["ipod"]),
            })
        );
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_line("", false).unwrap(), None);
        assert_eq!(parse_line("   \t ", false).unwrap(), None);
        assert_eq!(parse_line("# fast,quick", false).unwrap(), None);
    }

    #[test]
    fn test_escapes_and_whitespace() {
        assert_eq!(
            parse_line("a\\,b, machine   learning, x\\=>y", false).unwrap(),
            Some(SolrRule::Group(strings(&["a,b", "machine learning", "x=>y"])))
        );
    }

    #[test]
    fn test_ignore_case() {
        assert_eq!(
            parse_line("USA => United States", true).unwrap(),
            Some(SolrRule::Mapping {
                from: strings(&["usa"]),
                to: strings(&["united states"]),
            })
        );
    }

    #[test]
    fn test_malformed() {
        assert!(parse_line("a => ", false).is_err());
        assert!(parse_line(" => b", false).is_err());
        assert!(parse_line("a => b => c", false).is_err());
        assert!(parse_line(" , ,", false).is_err());
    }
}
