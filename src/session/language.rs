//! Output language selection

use serde::{Deserialize, Serialize};

/// Language every generation call writes its output in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Arabic,
    French,
    Spanish,
    German,
    Chinese,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Arabic,
        Language::French,
        Language::Spanish,
        Language::German,
        Language::Chinese,
    ];

    /// English name of the language, as used in prompts
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Arabic => "Arabic",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Chinese => "Chinese",
        }
    }

    /// Whether rendered output should flow right-to-left
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Arabic)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown language: {}. Valid values: {}",
                    s,
                    "english, arabic, french, spanish, german, chinese"
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("french".parse::<Language>().unwrap(), Language::French);
        assert_eq!("Chinese".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!(" GERMAN ".parse::<Language>().unwrap(), Language::German);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_display_and_serde() {
        assert_eq!(Language::Arabic.to_string(), "Arabic");
        assert_eq!(
            serde_json::to_string(&Language::Spanish).unwrap(),
            "\"spanish\""
        );
        assert!(Language::Arabic.is_rtl());
        assert!(!Language::English.is_rtl());
        assert_eq!(Language::default(), Language::English);
    }
}
