use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resume::models::CandidateDocument;

/// Number of questions in every interview.
pub const QUESTIONS_PER_SESSION: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub difficulty: Difficulty,
    /// Seconds allowed before auto-submit.
    pub time_limit: u32,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub text: String,
    /// Seconds between presentation and submission.
    pub time_spent: u32,
    pub submitted_at: DateTime<Utc>,
    /// 1-10 from the model; 0 only when the offline heuristic flags gibberish.
    pub score: Option<u8>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalEvaluation {
    /// 0-100.
    pub total_score: u32,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// True when produced by the offline fallback instead of the model.
    pub degraded: bool,
}

/// One complete attempt at answering a generated question set.
///
/// While active, `current_question_index == answers.len() <= questions.len()`.
/// `is_completed` implies `total_score` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub document: CandidateDocument,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub current_question_index: usize,
    pub is_completed: bool,
    pub total_score: Option<u32>,
    pub summary: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub weaknesses: Option<Vec<String>>,
    #[serde(default)]
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewSession {
    pub fn new(candidate_id: Uuid, document: CandidateDocument, questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate_id,
            document,
            questions,
            answers: Vec::new(),
            current_question_index: 0,
            is_completed: false,
            total_score: None,
            summary: None,
            strengths: None,
            weaknesses: None,
            degraded: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The question awaiting an answer, if any.
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_completed {
            return None;
        }
        self.questions.get(self.current_question_index)
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn all_answered(&self) -> bool {
        self.current_question_index >= self.questions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), "\"hard\"");
        let d: Difficulty = serde_json::from_str("\"easy\"").unwrap();
        assert_eq!(d, Difficulty::Easy);
    }

    #[test]
    fn test_difficulty_default_is_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_new_session_starts_at_first_question() {
        let question = Question {
            id: "q1".to_string(),
            text: "What is ownership?".to_string(),
            difficulty: Difficulty::Easy,
            time_limit: 30,
            category: "Rust".to_string(),
        };
        let session = InterviewSession::new(Uuid::new_v4(), CandidateDocument::default(), vec![question]);
        assert_eq!(session.current_question_index, 0);
        assert_eq!(session.current_question().map(|q| q.id.as_str()), Some("q1"));
        assert!(!session.all_answered());
        assert!(session.total_score.is_none());
    }
}
