//! Placeholder extraction from patterns
//!
//! Only the `%...%` placeholders are read here; the rest of the pattern
//! grammar belongs to the external matcher.
use once_cell::sync::Lazy;
use quill_core::{QuillError, Result};
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([^%]+)%").unwrap());
static TIME_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(-?\d+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Type names, code name or plural
    pub names: Vec<String>,
    /// `-`: may match nothing
    pub optional: bool,
    /// `*`: literals only
    pub literal_only: bool,
    /// `~`: no literals
    pub no_literal: bool,
    /// `@-1` / `@1`: requested event time
    pub time: Option<i8>,
}

impl Placeholder {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut body = raw.trim();
        let mut time = None;
        if let Some(caps) = TIME_SUFFIX.captures(body) {
            let t: i8 = caps[1]
                .parse()
                .map_err(|_| QuillError::config(format!("bad time in placeholder %{}%", raw)))?;
            if !(-1..=1).contains(&t) {
                return Err(QuillError::config(format!("bad time in placeholder %{}%", raw)));
            }
            time = Some(t);
            body = &body[..body.len() - caps[0].len()];
        }

        let mut placeholder = Placeholder {
            names: Vec::new(),
            optional: false,
            literal_only: false,
            no_literal: false,
            time,
        };
        let names = body.trim_start_matches(|c: char| {
            let flag = match c {
                '-' => &mut placeholder.optional,
                '*' => &mut placeholder.literal_only,
                '~' => &mut placeholder.no_literal,
                _ => return false,
            };
            *flag = true;
            true
        });

        if placeholder.literal_only && placeholder.no_literal {
            return Err(QuillError::config(format!("placeholder %{}% is both * and ~", raw)));
        }
        placeholder.names = names.split('/').map(|n| n.trim().to_string()).collect();
        if placeholder.names.iter().any(String::is_empty) {
            return Err(QuillError::config(format!("empty type name in placeholder %{}%", raw)));
        }
        Ok(placeholder)
    }
}

/// All placeholders of `pattern`, in order.
pub fn placeholders(pattern: &str) -> Result<Vec<Placeholder>> {
    PLACEHOLDER
        .captures_iter(pattern)
        .map(|caps| Placeholder::parse(&caps[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_and_alternatives() {
        let found = placeholders("grow %-*structuretype% at %~locations/entities@-1%").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].names, vec!["structuretype"]);
        assert!(found[0].optional && found[0].literal_only);
        assert_eq!(found[1].names, vec!["locations", "entities"]);
        assert!(found[1].no_literal);
        assert_eq!(found[1].time, Some(-1));
    }

    #[test]
    fn test_no_placeholders() {
        assert!(placeholders("stop the server").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_placeholders() {
        assert!(placeholders("set %integer/% to 1").unwrap_err().is_configuration());
        assert!(placeholders("%*~text%").is_err());
        assert!(placeholders("%text@3%").is_err());
    }
}
