use serde::{Deserialize, Serialize};

/// Best-effort structured fields extracted from an uploaded résumé.
///
/// Produced once per upload and never mutated afterwards. Every field other
/// than `raw_text` and `file_name` may be empty; absence is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    pub file_name: String,
    pub raw_text: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
}

impl CandidateDocument {
    pub fn has_text(&self) -> bool {
        !self.raw_text.trim().is_empty()
    }
}
