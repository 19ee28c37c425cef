use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize a company name for matching: strip diacritics, lowercase,
/// collapse every run of non-alphanumeric characters into a single space.
pub fn normalize_name(name: &str) -> String {
    // Decompose, then drop the combining marks ("Flídr" -> "Flidr")
    let folded: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let stripped: String = folded
        .chars()
        .flat_map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![' ']
            }
        })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Containment match: either normalized name is a substring of the other.
pub fn names_match(a: &str, b: &str) -> bool {
    match_ratio(a, b).is_some()
}

/// Length ratio (shorter / longer) of two names that satisfy the containment
/// test, `None` when they don't. An exact match scores 1.0.
pub fn match_ratio(a: &str, b: &str) -> Option<f64> {
    let a = normalize_name(a);
    let b = normalize_name(b);

    if a.is_empty() || b.is_empty() {
        return None;
    }

    if a.contains(&b) || b.contains(&a) {
        let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
        return Some(short.len() as f64 / long.len() as f64);
    }

    None
}

/// First normalized token of a label, used to pick name-hinted files
/// (`internal_<token>*.json`).
pub fn name_token(label: &str) -> Option<String> {
    normalize_name(label)
        .split_whitespace()
        .next()
        .map(|t| t.to_string())
}

/// Stable id derived from a name: "MB TOOL" -> "mb_tool_id".
pub fn derive_entity_id(name: &str) -> String {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return "unknown_id".to_string();
    }
    format!("{}_id", normalized.replace(' ', "_"))
}

/// Heuristic for inputs that are already store ids rather than names:
/// a single token carrying a digit or an id separator.
pub fn looks_like_id(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return false;
    }
    trimmed.chars().any(|c| c.is_ascii_digit() || c == '_' || c == '-' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_name("MB TOOL"), "mb tool");
        assert_eq!(normalize_name("  Flídr   plast, s.r.o. "), "flidr plast s r o");
        assert_eq!(normalize_name("ŠKODA-AUTO"), "skoda auto");
        assert_eq!(normalize_name("!!!"), "");
    }

    #[test]
    fn test_containment_either_direction() {
        assert!(names_match("Tell me about MB TOOL", "MB TOOL"));
        assert!(names_match("MB TOOL", "mb tool s.r.o."));
        assert!(names_match("flidr", "Flídr plast"));
        assert!(!names_match("BOS AUTOMOTIVE", "MB TOOL"));
        assert!(!names_match("", "MB TOOL"));
    }

    #[test]
    fn test_match_ratio_prefers_exact() {
        assert_eq!(match_ratio("MB TOOL", "mb-tool"), Some(1.0));
        let partial = match_ratio("MB", "MB TOOL").unwrap();
        assert!(partial < 1.0 && partial > 0.0);
    }

    #[test]
    fn test_derived_ids_and_tokens() {
        assert_eq!(derive_entity_id("MB TOOL"), "mb_tool_id");
        assert_eq!(derive_entity_id("???"), "unknown_id");
        assert_eq!(name_token("Flídr plast").as_deref(), Some("flidr"));
        assert!(looks_like_id("mb-tool-001"));
        assert!(!looks_like_id("MB TOOL"));
        assert!(!looks_like_id("tool"));
    }
}
