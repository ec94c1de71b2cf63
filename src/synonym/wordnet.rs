//! WordNet prolog synonym format (`wn_s.pl`).
//!
//! ```text
//! s(100002137,1,'abstraction',n,6,0).
//! s(100002137,2,'abstract entity',n,1,0).
//! ```
//!
//! Consecutive lines sharing a synset id form one equivalence group.

/// One `s(...)` fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordnetEntry {
    pub synset: String,
    pub word: String,
}

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<WordnetEntry>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let rest = trimmed
        .strip_prefix("s(")
        .ok_or_else(|| "expected a line starting with 's('".to_string())?;
    let synset_end = rest
        .find(',')
        .ok_or_else(|| "missing synset id".to_string())?;
    let synset = rest[..synset_end].trim();
    if synset.is_empty() {
        return Err("empty synset id".to_string());
    }

    let after = &rest[synset_end + 1..];
    let quote = after
        .find('\'')
        .ok_or_else(|| "missing quoted word".to_string())?;

    let mut word = String::new();
    let mut chars = after[quote + 1..].chars().peekable();
    let mut closed = false;
    while let Some(c) = chars.next() {
        if c == '\'' {
            // '' is an escaped apostrophe
            if chars.peek() == Some(&'\'') {
                chars.next();
                word.push('\'');
                continue;
            }
            closed = true;
            break;
        }
        word.push(c);
    }

    if !closed {
        return Err("unterminated quoted word".to_string());
    }
    if word.trim().is_empty() {
        return Err("empty word".to_string());
    }

    Ok(Some(WordnetEntry {
        synset: synset.to_string(),
        word,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fact() {
        assert_eq!(
            parse_line("s(100002137,2,'abstract entity',n,1,0).").unwrap(),
            Some(WordnetEntry {
                synset: "100002137".to_string(),
                word: "abstract entity".to_string(),
            })
        );
    }

    #[test]
    fn test_escaped_apostrophe() {
        let entry = parse_line("s(102084071,3,'dog''s body',n,1,0).")
            .unwrap()
            .unwrap();
        assert_eq!(entry.word, "dog's body");
    }

    #[test]
    fn test_malformed() {
        assert_eq!(parse_line("  ").unwrap(), None);
        assert!(parse_line("fast,quick").is_err());
        assert!(parse_line("s(1,1,'open,n,1,0).").is_err());
        assert!(parse_line("s(,1,'word',n,1,0).").is_err());
    }
}
