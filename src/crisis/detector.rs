// Crisis phrase detector

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Detects acute self-harm risk in free text by case-insensitive substring
/// containment against a fixed phrase list.
///
/// Precision is an explicit non-goal: substring matching false-positives on
/// quoted or unrelated context and misses paraphrases, typos, and
/// non-English phrasings. Expanding the detection logic is an interface
/// change, not an internal optimization.
#[derive(Debug, Clone)]
pub struct CrisisDetector {
    /// Lowercased at construction; matching is pure and deterministic
    phrases: Vec<String>,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        Self::new(&[
            "wanna die",
            "I have suidical thoughts",
            "to suicide",
            "suicidal",
            "can't do this anymore",
            "kill myself",
            "want to die",
            "end it all",
            "no reason to live",
            "I'm done",
        ])
    }
}

impl CrisisDetector {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Load an overriding phrase list from a JSON array of strings
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read crisis phrase file: {}", path.display()))?;

        let phrases: Vec<String> =
            serde_json::from_str(&contents).context("Failed to parse crisis phrase file")?;

        Ok(Self::new(&phrases))
    }

    /// Returns true if any configured phrase occurs in the text
    pub fn is_crisis(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();

        for phrase in &self.phrases {
            if text_lower.contains(phrase) {
                tracing::warn!("Crisis detected: phrase '{}'", phrase);
                return true;
            }
        }

        false
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crisis_detection() {
        let detector = CrisisDetector::default();

        assert!(detector.is_crisis("I want to die"));
        assert!(detector.is_crisis("honestly I just can't do this anymore"));
        assert!(!detector.is_crisis("I want to dine"));
        assert!(!detector.is_crisis("What is the meaning of life?"));
    }

    #[test]
    fn test_case_insensitive() {
        let detector = CrisisDetector::default();

        assert!(detector.is_crisis("KILL MYSELF"));
        assert!(detector.is_crisis("SuIcIdAl"));
    }

    #[test]
    fn test_custom_phrase_list() {
        let detector = CrisisDetector::new(&["red flag"]);

        assert!(detector.is_crisis("this is a RED FLAG"));
        assert!(!detector.is_crisis("I want to die"));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["custom phrase", "another one"]"#).unwrap();

        let detector = CrisisDetector::load_from_file(file.path()).unwrap();
        assert!(detector.is_crisis("contains a Custom Phrase here"));
        assert!(!detector.is_crisis("nothing of note"));
    }
}
