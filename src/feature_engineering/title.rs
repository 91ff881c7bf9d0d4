//! Honorific extraction from passenger names

use regex::Regex;
use std::sync::OnceLock;

/// Title assigned to names without a recognizable honorific
pub const UNKNOWN_TITLE: &str = "Unknown";

const RARE_TITLES: &[&str] = &[
    "Lady", "Countess", "Capt", "Col", "Don", "Dr", "Major", "Rev", "Sir", "Jonkheer", "Dona",
];

static TITLE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn title_pattern() -> &'static Regex {
    TITLE_PATTERN.get_or_init(|| {
        // A letters-only word directly followed by a period, at the start or after whitespace
        Regex::new(r"(?:^|\s)([A-Za-z]+)\.").expect("title pattern is a valid regex")
    })
}

/// Extract the raw honorific from a name, e.g. "Mr" from "Braund, Mr. Owen Harris"
pub fn extract_title(name: &str) -> Option<&str> {
    title_pattern()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Fold rare and foreign honorifics into the common groups
pub fn consolidate_title(raw: &str) -> &str {
    match raw {
        "Mlle" | "Ms" => "Miss",
        "Mme" => "Mrs",
        t if RARE_TITLES.contains(&t) => "Rare",
        t => t,
    }
}

/// Consolidated title of a name, or [`UNKNOWN_TITLE`]
pub fn title_of(name: &str) -> String {
    extract_title(name)
        .map(consolidate_title)
        .unwrap_or(UNKNOWN_TITLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("Braund, Mr. Owen Harris"), Some("Mr"));
        assert_eq!(extract_title("Mrs. Baseline"), Some("Mrs"));
        assert_eq!(extract_title("Rothes, the Countess. of (Lucy)"), Some("Countess"));
        assert_eq!(extract_title("Owen Harris"), None);
    }

    #[test]
    fn test_period_must_follow_a_whole_word() {
        assert_eq!(extract_title("Smith,Mr.John"), None);
        assert_eq!(extract_title("Smith, J. Mr. John"), Some("J"));
    }

    #[test]
    fn test_consolidation() {
        assert_eq!(title_of("Sagesser, Mlle. Emma"), "Miss");
        assert_eq!(title_of("Reynaldo, Ms. Encarnacion"), "Miss");
        assert_eq!(title_of("Aubart, Mme. Leontine"), "Mrs");
        assert_eq!(title_of("Byles, Rev. Thomas"), "Rare");
        assert_eq!(title_of("Palsson, Master. Gosta"), "Master");
        assert_eq!(title_of("no honorific here"), UNKNOWN_TITLE);
    }
}
