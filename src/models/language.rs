use serde::{Deserialize, Serialize};
use std::fmt;

/// A language the analysis tool can extract and query.
///
/// Serialized in lowercase (`"javascript"`, `"cpp"`, ...), which is also the
/// spelling the tool uses when it groups resolved queries by language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Csharp,
    Cpp,
    Go,
    Java,
    Javascript,
    Python,
}

impl Language {
    /// Every supported language, in a stable order.
    pub const ALL: [Language; 6] = [
        Language::Csharp,
        Language::Cpp,
        Language::Go,
        Language::Java,
        Language::Javascript,
        Language::Python,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Csharp => "csharp",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Java => "java",
            Language::Javascript => "javascript",
            Language::Python => "python",
        }
    }

    /// Parse a language name as written by a user or reported by the
    /// source-hosting API.
    ///
    /// Matching is case-insensitive and understands the common aliases the
    /// hosting API reports (`C`, `C++`, `C#`, `TypeScript`).
    ///
    /// # Examples
    ///
    /// ```
    /// use codescan_action::Language;
    ///
    /// assert_eq!(Language::parse_language("C++"), Some(Language::Cpp));
    /// assert_eq!(Language::parse_language("TypeScript"), Some(Language::Javascript));
    /// assert_eq!(Language::parse_language("cobol"), None);
    /// ```
    pub fn parse_language(name: &str) -> Option<Language> {
        let name = name.trim().to_lowercase();

        if let Some(language) = Self::ALL.iter().find(|l| l.as_str() == name) {
            return Some(*language);
        }

        match name.as_str() {
            "c" | "c++" => Some(Language::Cpp),
            "c#" => Some(Language::Csharp),
            "typescript" => Some(Language::Javascript),
            _ => None,
        }
    }

    /// The query suite analysed for this language when defaults are enabled.
    pub fn default_suite(&self) -> String {
        format!("{}-code-scanning.qls", self.as_str())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
