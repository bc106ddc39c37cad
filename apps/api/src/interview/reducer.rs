//! Interview state and its pure reducer.
//!
//! All session mutation goes through `reduce`. An action that does not fit
//! the current state is ignored and `reduce` returns `false`; nothing here
//! panics or errors.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::interview::models::{Answer, AnswerEvaluation, FinalEvaluation, InterviewSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    NotStarted,
    Active,
    Completed,
}

/// Per-candidate interview state. Persisted as a whole after every transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    pub current_session: Option<InterviewSession>,
    /// False while paused or once completed.
    pub is_interview_active: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl InterviewState {
    pub fn phase(&self) -> InterviewPhase {
        match &self.current_session {
            None => InterviewPhase::NotStarted,
            Some(s) if s.is_completed => InterviewPhase::Completed,
            Some(_) => InterviewPhase::Active,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase() == InterviewPhase::Active && !self.is_interview_active
    }

    /// The session, if it is still accepting answers.
    fn accepting_session(&mut self) -> Option<&mut InterviewSession> {
        if !self.is_interview_active {
            return None;
        }
        self.current_session.as_mut().filter(|s| !s.is_completed)
    }
}

#[derive(Debug, Clone)]
pub enum InterviewAction {
    StartPending,
    StartFulfilled(InterviewSession),
    StartRejected(String),
    AnswerSubmitted(Answer),
    AnswerEvaluated {
        question_id: String,
        evaluation: AnswerEvaluation,
    },
    Completed(FinalEvaluation),
    SetCurrentSession(Option<InterviewSession>),
    Pause,
    Resume,
    ClearError,
    Reset,
}

/// Applies `action` to `state`. Returns whether anything changed.
pub fn reduce(state: &mut InterviewState, action: InterviewAction) -> bool {
    match action {
        InterviewAction::StartPending => {
            state.is_loading = true;
            state.error = None;
            true
        }
        InterviewAction::StartFulfilled(session) => {
            state.is_loading = false;
            state.is_interview_active = !session.is_completed;
            state.current_session = Some(session);
            state.error = None;
            true
        }
        InterviewAction::StartRejected(message) => {
            state.is_loading = false;
            state.error = Some(message);
            true
        }
        InterviewAction::AnswerSubmitted(answer) => {
            let Some(session) = state.accepting_session() else {
                return false;
            };
            let expected = session.current_question().map(|q| q.id.as_str());
            if expected != Some(answer.question_id.as_str()) {
                return false;
            }
            session.answers.push(answer);
            session.current_question_index += 1;
            true
        }
        InterviewAction::AnswerEvaluated {
            question_id,
            evaluation,
        } => {
            let Some(session) = state.current_session.as_mut().filter(|s| !s.is_completed) else {
                return false;
            };
            let Some(answer) = session
                .answers
                .iter_mut()
                .find(|a| a.question_id == question_id)
            else {
                return false;
            };
            answer.score = Some(evaluation.score);
            answer.feedback = Some(evaluation.feedback);
            true
        }
        InterviewAction::Completed(evaluation) => {
            let Some(session) = state
                .current_session
                .as_mut()
                .filter(|s| !s.is_completed && s.all_answered())
            else {
                return false;
            };
            session.is_completed = true;
            session.completed_at = Some(Utc::now());
            session.total_score = Some(evaluation.total_score.min(100));
            session.summary = Some(evaluation.summary);
            session.strengths = Some(evaluation.strengths);
            session.weaknesses = Some(evaluation.weaknesses);
            session.degraded = evaluation.degraded;
            state.is_interview_active = false;
            true
        }
        InterviewAction::SetCurrentSession(session) => {
            state.is_interview_active = session.as_ref().is_some_and(|s| !s.is_completed);
            state.current_session = session;
            true
        }
        InterviewAction::Pause => {
            if state.phase() != InterviewPhase::Active || !state.is_interview_active {
                return false;
            }
            state.is_interview_active = false;
            true
        }
        InterviewAction::Resume => {
            if !state.is_paused() {
                return false;
            }
            state.is_interview_active = true;
            true
        }
        InterviewAction::ClearError => {
            let changed = state.error.is_some();
            state.error = None;
            changed
        }
        InterviewAction::Reset => {
            *state = InterviewState::default();
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::interview::fallback::fallback_questions;
    use crate::resume::models::CandidateDocument;

    fn active_state() -> InterviewState {
        let mut state = InterviewState::default();
        let session =
            InterviewSession::new(Uuid::new_v4(), CandidateDocument::default(), fallback_questions());
        reduce(&mut state, InterviewAction::StartPending);
        reduce(&mut state, InterviewAction::StartFulfilled(session));
        state
    }

    fn answer(question_id: &str) -> Answer {
        Answer {
            question_id: question_id.to_string(),
            text: "An answer about state and props.".to_string(),
            time_spent: 12,
            submitted_at: Utc::now(),
            score: None,
            feedback: None,
        }
    }

    fn session(state: &InterviewState) -> &InterviewSession {
        state.current_session.as_ref().unwrap()
    }

    fn final_evaluation(total_score: u32) -> FinalEvaluation {
        FinalEvaluation {
            total_score,
            summary: "Solid.".to_string(),
            strengths: vec!["Clear".to_string()],
            weaknesses: vec!["Depth".to_string()],
            degraded: false,
        }
    }

    #[test]
    fn test_start_lifecycle() {
        let mut state = InterviewState::default();
        assert_eq!(state.phase(), InterviewPhase::NotStarted);

        reduce(&mut state, InterviewAction::StartPending);
        assert!(state.is_loading);

        reduce(&mut state, InterviewAction::StartRejected("boom".to_string()));
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert_eq!(state.phase(), InterviewPhase::NotStarted);

        let state = active_state();
        assert_eq!(state.phase(), InterviewPhase::Active);
        assert!(state.is_interview_active);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_answers_track_question_index() {
        let mut state = active_state();
        let ids: Vec<String> = session(&state).questions.iter().map(|q| q.id.clone()).collect();
        for (i, id) in ids.iter().enumerate() {
            assert!(reduce(&mut state, InterviewAction::AnswerSubmitted(answer(id))));
            let s = session(&state);
            assert_eq!(s.answers.len(), i + 1);
            assert_eq!(s.current_question_index, s.answers.len());
            assert!(s.answers.len() <= s.questions.len());
        }
        assert!(session(&state).all_answered());
    }

    #[test]
    fn test_out_of_order_answer_is_ignored() {
        let mut state = active_state();
        assert!(!reduce(&mut state, InterviewAction::AnswerSubmitted(answer("q3"))));
        assert!(session(&state).answers.is_empty());
    }

    #[test]
    fn test_answer_while_paused_is_ignored() {
        let mut state = active_state();
        assert!(reduce(&mut state, InterviewAction::Pause));
        assert!(state.is_paused());
        assert!(!reduce(&mut state, InterviewAction::AnswerSubmitted(answer("q1"))));
        assert!(reduce(&mut state, InterviewAction::Resume));
        assert!(reduce(&mut state, InterviewAction::AnswerSubmitted(answer("q1"))));
    }

    #[test]
    fn test_answer_without_session_is_ignored() {
        let mut state = InterviewState::default();
        assert!(!reduce(&mut state, InterviewAction::AnswerSubmitted(answer("q1"))));
        assert!(!reduce(&mut state, InterviewAction::Pause));
        assert!(!reduce(&mut state, InterviewAction::Resume));
    }

    #[test]
    fn test_evaluation_attaches_to_answer() {
        let mut state = active_state();
        reduce(&mut state, InterviewAction::AnswerSubmitted(answer("q1")));
        let applied = reduce(
            &mut state,
            InterviewAction::AnswerEvaluated {
                question_id: "q1".to_string(),
                evaluation: AnswerEvaluation {
                    score: 7,
                    feedback: "Good".to_string(),
                },
            },
        );
        assert!(applied);
        let a = &session(&state).answers[0];
        assert_eq!(a.score, Some(7));
        assert_eq!(a.feedback.as_deref(), Some("Good"));

        let unknown = reduce(
            &mut state,
            InterviewAction::AnswerEvaluated {
                question_id: "q9".to_string(),
                evaluation: AnswerEvaluation {
                    score: 1,
                    feedback: String::new(),
                },
            },
        );
        assert!(!unknown);
    }

    #[test]
    fn test_completion_requires_all_answers() {
        let mut state = active_state();
        assert!(!reduce(&mut state, InterviewAction::Completed(final_evaluation(70))));

        let ids: Vec<String> = session(&state).questions.iter().map(|q| q.id.clone()).collect();
        for id in &ids {
            reduce(&mut state, InterviewAction::AnswerSubmitted(answer(id)));
        }
        assert!(reduce(&mut state, InterviewAction::Completed(final_evaluation(150))));

        let s = session(&state);
        assert!(s.is_completed);
        assert!(s.completed_at.is_some());
        assert_eq!(s.total_score, Some(100));
        assert_eq!(state.phase(), InterviewPhase::Completed);
        assert!(!state.is_interview_active);

        // A completed session accepts nothing further.
        assert!(!reduce(&mut state, InterviewAction::Completed(final_evaluation(10))));
        assert!(!reduce(&mut state, InterviewAction::Resume));
        assert_eq!(session(&state).total_score, Some(100));
    }

    #[test]
    fn test_set_current_session_and_reset() {
        let mut state = InterviewState::default();
        let mut completed =
            InterviewSession::new(Uuid::new_v4(), CandidateDocument::default(), fallback_questions());
        completed.is_completed = true;
        completed.total_score = Some(40);

        reduce(&mut state, InterviewAction::SetCurrentSession(Some(completed)));
        assert!(!state.is_interview_active);
        assert_eq!(state.phase(), InterviewPhase::Completed);

        state.error = Some("stale".to_string());
        assert!(reduce(&mut state, InterviewAction::ClearError));
        assert!(!reduce(&mut state, InterviewAction::ClearError));

        reduce(&mut state, InterviewAction::Reset);
        assert_eq!(state, InterviewState::default());
    }
}
