use once_cell::sync::Lazy;
use regex::Regex;

// An upper-case-led run of words; later words may start with a digit.
const NAME: &str = r"(\p{Lu}[\p{L}\p{N}&.\-]*(?:[ \t]+[\p{Lu}\p{N}][\p{L}\p{N}&.\-]*)*)";

static CUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i:\babout)\s+{NAME}"),
        format!(r"(?i:\bfor)\s+{NAME}"),
        format!(r"(?i:\bof)\s+{NAME}"),
        format!(r"(?i:\bpro)\s+{NAME}"),
        format!(r"(?i:\bspolečnost(?:i|í)?)\s+{NAME}"),
        format!(r"{NAME}[ \t]+(?i:a\.\s?s\.|s\.\s?r\.\s?o\.)"),
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static CAPITALIZED_RUN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(NAME).ok());

static NAME_LIKE_TOKEN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\p{Lu}[\p{L}\p{N}&\-]{2,}").ok());

/// Sentence openers that are capitalized but never part of a company name.
const LEADING_WORDS: &[&str] = &[
    "what", "tell", "show", "who", "how", "which", "analyze", "analyse", "give", "list", "is",
    "are", "find", "compare", "describe", "please", "can", "could", "get", "check", "jaká",
    "jaké", "jaký", "kdo", "řekni", "ukaž", "najdi",
];

/// Pull the most likely company name out of a free-text query.
pub fn extract_company_name(query: &str) -> Option<String> {
    for pattern in CUE_PATTERNS.iter() {
        if let Some(found) = pattern.captures(query).and_then(|c| c.get(1)) {
            if let Some(name) = clean(found.as_str()) {
                return Some(name);
            }
        }
    }

    let run_pattern = CAPITALIZED_RUN.as_ref()?;
    for found in run_pattern.find_iter(query) {
        let mut words: Vec<&str> = found.as_str().split_whitespace().collect();
        while let Some(first) = words.first() {
            if LEADING_WORDS.contains(&first.to_lowercase().as_str()) {
                words.remove(0);
            } else {
                break;
            }
        }
        if let Some(name) = clean(&words.join(" ")) {
            return Some(name);
        }
    }

    None
}

/// True when the query carries a capitalized token of three or more characters.
pub fn has_name_like_token(query: &str) -> bool {
    NAME_LIKE_TOKEN
        .as_ref()
        .map(|re| re.is_match(query))
        .unwrap_or(false)
}

fn clean(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == '-' || c == '&')
        .trim();
    if trimmed.chars().any(|c| c.is_alphanumeric()) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_words() {
        assert_eq!(extract_company_name("Tell me about MB TOOL").as_deref(), Some("MB TOOL"));
        assert_eq!(
            extract_company_name("What are the risks for MB TOOL?").as_deref(),
            Some("MB TOOL")
        );
        assert_eq!(
            extract_company_name("Show the suppliers of BOS Automotive").as_deref(),
            Some("BOS Automotive")
        );
        assert_eq!(
            extract_company_name("Jaká jsou rizika pro Flídr plast?").as_deref(),
            Some("Flídr")
        );
    }

    #[test]
    fn test_legal_form_suffix() {
        assert_eq!(
            extract_company_name("dodavatelé ADIS TACHOV s.r.o.").as_deref(),
            Some("ADIS TACHOV")
        );
    }

    #[test]
    fn test_leading_sentence_word_is_skipped() {
        assert_eq!(extract_company_name("Analyze ADIS TACHOV").as_deref(), Some("ADIS TACHOV"));
        assert_eq!(extract_company_name("MB TOOL risks").as_deref(), Some("MB TOOL"));
    }

    #[test]
    fn test_no_name() {
        assert_eq!(extract_company_name("who is the director here"), None);
        assert_eq!(extract_company_name(""), None);
        assert!(!has_name_like_token("who is the director"));
        assert!(has_name_like_token("Tell me about MB TOOL"));
    }
}
