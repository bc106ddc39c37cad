//! Deterministic offline replacements for every gateway call.
//!
//! Used whenever the generative API is unconfigured, unreachable, or returns
//! something unusable. Nothing here performs I/O.

use lazy_static::lazy_static;
use regex::Regex;

use crate::interview::models::{Difficulty, FinalEvaluation, InterviewSession, Question};

pub const DEFAULT_FEEDBACK: &str =
    "Evaluation completed. Consider reviewing the question and providing a more detailed answer.";

const FALLBACK_SUMMARY: &str = "Interview completed. A detailed AI evaluation was unavailable, \
    so the overall score is the average of the individual answer scores.";

const FALLBACK_STRENGTHS: [&str; 3] = [
    "Good communication",
    "Solid foundation",
    "Problem-solving approach",
];

const FALLBACK_WEAKNESSES: [&str; 3] = [
    "Could improve on advanced concepts",
    "More practice needed",
    "Time management",
];

lazy_static! {
    static ref SINGLE_WORD: Regex = Regex::new(r"^[a-zA-Z]{4,}$").unwrap();
    static ref WORD_RUN: Regex = Regex::new(r"^(?:[a-zA-Z]{3,}\s?){2,}$").unwrap();
    static ref PUNCTUATION: Regex = Regex::new(r"[.,;:!?]").unwrap();
    static ref TECHNICAL_TERM: Regex = Regex::new(
        r"(?i)\b(react|javascript|node|api|database|component|function|variable|async|await|promise|hook|state|props)\b"
    )
    .unwrap();
}

fn question(id: &str, text: &str, difficulty: Difficulty, time_limit: u32, category: &str) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        difficulty,
        time_limit,
        category: category.to_string(),
    }
}

/// The fixed question set: two easy, two medium, two hard.
pub fn fallback_questions() -> Vec<Question> {
    vec![
        question(
            "q1",
            "What is the difference between props and state in React?",
            Difficulty::Easy,
            30,
            "React",
        ),
        question(
            "q2",
            "Explain the concept of closures in JavaScript.",
            Difficulty::Easy,
            30,
            "JavaScript",
        ),
        question(
            "q3",
            "How would you optimize a React component that re-renders frequently?",
            Difficulty::Medium,
            90,
            "React",
        ),
        question(
            "q4",
            "What are the differences between callbacks, promises, and async/await?",
            Difficulty::Medium,
            90,
            "JavaScript",
        ),
        question(
            "q5",
            "Design a scalable architecture for a real-time chat application using Node.js and React.",
            Difficulty::Hard,
            180,
            "Architecture",
        ),
        question(
            "q6",
            "How would you implement server-side rendering (SSR) in a React application and what are the trade-offs?",
            Difficulty::Hard,
            180,
            "React",
        ),
    ]
}

/// True for keyboard-mash input that earns an automatic zero.
pub fn is_nonsense(answer: &str) -> bool {
    let text = answer.trim();
    let len = text.chars().count();
    let absurd = SINGLE_WORD.is_match(text) && !text.chars().any(char::is_whitespace) && len < 12;
    let gibberish = WORD_RUN.is_match(text) && !PUNCTUATION.is_match(text) && len < 20;
    absurd || gibberish
}

/// Length/keyword heuristic score in 0-10.
pub fn heuristic_score(answer: &str, difficulty: Difficulty) -> u8 {
    if is_nonsense(answer) {
        return 0;
    }

    let text = answer.trim();
    let len = text.chars().count();

    let mut score: i32 = match len {
        0..=9 => 2,
        10..=29 => 3,
        30..=99 => 4,
        100..=200 => 5,
        _ => 6,
    };

    if TECHNICAL_TERM.is_match(text) {
        score += 1;
    }

    match difficulty {
        Difficulty::Easy => score += 1,
        Difficulty::Medium => {}
        Difficulty::Hard => score -= 1,
    }

    score.clamp(1, 10) as u8
}

pub fn fallback_feedback(score: u8, difficulty: Difficulty) -> String {
    match score {
        0 => "Your answer was not relevant or was detected as random/absurd input. \
              Please provide a meaningful, technical response to the question. \
              Review the question carefully and avoid typing random letters or gibberish."
            .to_string(),
        8.. => format!(
            "Excellent answer! You demonstrated strong understanding of the {} level concept. \
             Keep up the great work! For further improvement, try to relate your answer to \
             real-world scenarios or recent technologies you have used.",
            difficulty.as_str()
        ),
        6..=7 => "Good answer with solid understanding. To improve, provide more specific \
                  examples from your experience and elaborate on best practices relevant to the question."
            .to_string(),
        4..=5 => "Your answer shows some understanding but could be improved. Focus on being \
                  more specific, use technical terminology, and provide concrete examples from \
                  your work or studies."
            .to_string(),
        _ => "Your answer needs improvement. Review the fundamentals for this topic and try to \
              structure your response more clearly. Consider breaking down your answer into \
              steps or key points for better clarity."
            .to_string(),
    }
}

/// Mean answer score scaled to 0-100. Unscored answers count as zero.
pub fn mean_total_score(session: &InterviewSession) -> u32 {
    if session.answers.is_empty() {
        return 0;
    }
    let sum: u32 = session
        .answers
        .iter()
        .map(|a| u32::from(a.score.unwrap_or(0)))
        .sum();
    let mean = f64::from(sum) / session.answers.len() as f64;
    ((mean * 10.0).round() as u32).min(100)
}

pub fn fallback_final_evaluation(session: &InterviewSession) -> FinalEvaluation {
    FinalEvaluation {
        total_score: mean_total_score(session),
        summary: FALLBACK_SUMMARY.to_string(),
        strengths: FALLBACK_STRENGTHS.iter().map(|s| s.to_string()).collect(),
        weaknesses: FALLBACK_WEAKNESSES.iter().map(|s| s.to_string()).collect(),
        degraded: true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::interview::models::Answer;
    use crate::resume::models::CandidateDocument;

    fn answered_session(scores: &[Option<u8>]) -> InterviewSession {
        let mut session =
            InterviewSession::new(Uuid::new_v4(), CandidateDocument::default(), fallback_questions());
        for (i, score) in scores.iter().enumerate() {
            session.answers.push(Answer {
                question_id: session.questions[i].id.clone(),
                text: "answer".to_string(),
                time_spent: 10,
                submitted_at: Utc::now(),
                score: *score,
                feedback: None,
            });
        }
        session.current_question_index = session.answers.len();
        session
    }

    #[test]
    fn test_fallback_questions_distribution() {
        let questions = fallback_questions();
        assert_eq!(questions.len(), 6);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(
                questions.iter().filter(|q| q.difficulty == difficulty).count(),
                2
            );
        }
        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["q1", "q2", "q3", "q4", "q5", "q6"]);
    }

    #[test]
    fn test_keyboard_mash_scores_zero() {
        assert_eq!(heuristic_score("asdkj", Difficulty::Medium), 0);
        assert_eq!(heuristic_score("asdf qwer zxcv", Difficulty::Easy), 0);
    }

    #[test]
    fn test_long_easy_answer_with_technical_term() {
        let mut answer = String::from("In react, props are passed down from the parent. ");
        while answer.chars().count() < 250 {
            answer.push_str("More detail here. ");
        }
        assert!(answer.chars().count() > 200);
        assert_eq!(heuristic_score(&answer, Difficulty::Easy), 8);
    }

    #[test]
    fn test_short_punctuated_answer_is_not_nonsense() {
        assert_eq!(heuristic_score("Use a map, then.", Difficulty::Medium), 3);
    }

    #[test]
    fn test_hard_penalty_clamps_to_one() {
        assert_eq!(heuristic_score("no", Difficulty::Hard), 1);
    }

    #[test]
    fn test_feedback_bands() {
        assert!(fallback_feedback(0, Difficulty::Easy).contains("random/absurd"));
        assert!(fallback_feedback(9, Difficulty::Hard).contains("hard level concept"));
        assert!(fallback_feedback(6, Difficulty::Easy).starts_with("Good answer"));
        assert!(fallback_feedback(4, Difficulty::Easy).contains("some understanding"));
        assert!(fallback_feedback(2, Difficulty::Easy).contains("needs improvement"));
    }

    #[test]
    fn test_fallback_final_evaluation_mean() {
        let session = answered_session(&[Some(8), Some(6), None, Some(7), Some(5), Some(4)]);
        let evaluation = fallback_final_evaluation(&session);
        // (8 + 6 + 0 + 7 + 5 + 4) / 6 * 10 = 50
        assert_eq!(evaluation.total_score, 50);
        assert!(evaluation.degraded);
        assert_eq!(evaluation.strengths.len(), 3);
        assert_eq!(evaluation.weaknesses.len(), 3);
    }

    #[test]
    fn test_fallback_final_evaluation_without_answers() {
        let session = answered_session(&[]);
        assert_eq!(fallback_final_evaluation(&session).total_score, 0);
    }
}
