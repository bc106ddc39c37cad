//! Question/Evaluation gateway.
//!
//! The only consumer of `LlmClient`. Every operation is infallible from the
//! caller's point of view: any transport, API or parse failure is logged and
//! replaced with the deterministic result from `interview::fallback`.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::interview::fallback::{
    fallback_feedback, fallback_final_evaluation, fallback_questions, heuristic_score,
    DEFAULT_FEEDBACK,
};
use crate::interview::models::{
    Answer, AnswerEvaluation, Difficulty, FinalEvaluation, InterviewSession, Question,
    QUESTIONS_PER_SESSION,
};
use crate::interview::prompts::{
    format_qa_pair, ANALYSIS_PROMPT_TEMPLATE, BASIC_ANALYSIS_TEMPLATE,
    EVALUATION_PROMPT_TEMPLATE, FINAL_EVALUATION_PROMPT_TEMPLATE, QUESTIONS_PROMPT_TEMPLATE,
};
use crate::llm_client::prompts::{render, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::resume::models::CandidateDocument;

const ANALYSIS_TEMPERATURE: f32 = 0.3;
const QUESTIONS_TEMPERATURE: f32 = 0.7;
const EVALUATION_TEMPERATURE: f32 = 0.2;
const FINAL_TEMPERATURE: f32 = 0.3;

const DEFAULT_TIME_LIMIT: u32 = 90;
const DEFAULT_CATEGORY: &str = "General";
const MAX_LIST_ITEMS: usize = 3;

#[async_trait]
pub trait InterviewGateway: Send + Sync {
    /// Exactly six questions tailored to the document, or the fixed set.
    async fn generate_questions(&self, document: &CandidateDocument) -> Vec<Question>;

    async fn evaluate_answer(&self, question: &Question, answer: &Answer) -> AnswerEvaluation;

    async fn final_evaluation(&self, session: &InterviewSession) -> FinalEvaluation;
}

/// Raw model output for one question. Every field is optional; defaults are
/// applied in `normalize_questions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestion {
    id: Option<String>,
    text: Option<String>,
    difficulty: Option<String>,
    time_limit: Option<f64>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    score: Option<serde_json::Value>,
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFinalEvaluation {
    total_score: Option<f64>,
    summary: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
}

pub struct LlmInterviewGateway {
    llm: LlmClient,
}

impl LlmInterviewGateway {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn analyze_document(&self, document: &CandidateDocument) -> String {
        let prompt = render(ANALYSIS_PROMPT_TEMPLATE, &[("raw_text", &document.raw_text)]);
        match self.llm.call_text(&prompt, ANALYSIS_TEMPERATURE).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Résumé analysis failed, using basic analysis: {e}");
                render(
                    BASIC_ANALYSIS_TEMPLATE,
                    &[("name", document.name.as_deref().unwrap_or("Unknown candidate"))],
                )
            }
        }
    }

    async fn try_generate_questions(
        &self,
        document: &CandidateDocument,
    ) -> Result<Vec<Question>, LlmError> {
        let analysis = self.analyze_document(document).await;
        let not_provided = "Not provided";
        let prompt = render(
            QUESTIONS_PROMPT_TEMPLATE,
            &[
                ("name", document.name.as_deref().unwrap_or(not_provided)),
                ("email", document.email.as_deref().unwrap_or(not_provided)),
                ("phone", document.phone.as_deref().unwrap_or(not_provided)),
                ("analysis", &analysis),
                ("json_only", JSON_ONLY_INSTRUCTION),
                ("raw_text", &document.raw_text),
            ],
        );

        let raw: Vec<GeneratedQuestion> = self.llm.call_json(&prompt, QUESTIONS_TEMPERATURE).await?;
        let count = raw.len();
        normalize_questions(raw).ok_or_else(|| {
            LlmError::Unusable(format!(
                "{count} question(s) returned, expected {QUESTIONS_PER_SESSION} with text"
            ))
        })
    }

    async fn try_evaluate_answer(
        &self,
        question: &Question,
        answer: &Answer,
    ) -> Result<AnswerEvaluation, LlmError> {
        let time_limit = question.time_limit.to_string();
        let time_spent = answer.time_spent.to_string();
        let prompt = render(
            EVALUATION_PROMPT_TEMPLATE,
            &[
                ("question", &question.text),
                ("difficulty", question.difficulty.as_str()),
                ("category", &question.category),
                ("time_limit", &time_limit),
                ("time_spent", &time_spent),
                ("json_only", JSON_ONLY_INSTRUCTION),
                ("answer_text", &answer.text),
            ],
        );

        let text = self.llm.call_text(&prompt, EVALUATION_TEMPERATURE).await?;
        parse_evaluation(&text)
    }

    async fn try_final_evaluation(
        &self,
        session: &InterviewSession,
    ) -> Result<FinalEvaluation, LlmError> {
        let qa_pairs = session
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let answer = session.answers.get(i);
                format_qa_pair(
                    i + 1,
                    q.difficulty.as_str(),
                    &q.text,
                    answer.map(|a| a.text.as_str()),
                    answer.and_then(|a| a.score),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = render(
            FINAL_EVALUATION_PROMPT_TEMPLATE,
            &[("json_only", JSON_ONLY_INSTRUCTION), ("qa_pairs", &qa_pairs)],
        );

        let text = self.llm.call_text(&prompt, FINAL_TEMPERATURE).await?;
        parse_final_evaluation(&text)
    }
}

#[async_trait]
impl InterviewGateway for LlmInterviewGateway {
    async fn generate_questions(&self, document: &CandidateDocument) -> Vec<Question> {
        match self.try_generate_questions(document).await {
            Ok(questions) => {
                info!("Generated {} personalised questions", questions.len());
                questions
            }
            Err(e) => {
                warn!("Question generation failed, using fallback questions: {e}");
                fallback_questions()
            }
        }
    }

    async fn evaluate_answer(&self, question: &Question, answer: &Answer) -> AnswerEvaluation {
        match self.try_evaluate_answer(question, answer).await {
            Ok(evaluation) => {
                debug!(question_id = %question.id, score = evaluation.score, "Answer evaluated");
                evaluation
            }
            Err(e) => {
                warn!(question_id = %question.id, "Answer evaluation failed, using heuristic: {e}");
                let score = heuristic_score(&answer.text, question.difficulty);
                AnswerEvaluation {
                    score,
                    feedback: fallback_feedback(score, question.difficulty),
                }
            }
        }
    }

    async fn final_evaluation(&self, session: &InterviewSession) -> FinalEvaluation {
        match self.try_final_evaluation(session).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(session_id = %session.id, "Final evaluation failed, using fallback: {e}");
                fallback_final_evaluation(session)
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_difficulty(value: Option<&str>) -> Difficulty {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("easy") => Difficulty::Easy,
        Some("hard") => Difficulty::Hard,
        _ => Difficulty::Medium,
    }
}

/// Applies per-item defaults. Returns `None` unless there are exactly six
/// questions that all carry text.
fn normalize_questions(raw: Vec<GeneratedQuestion>) -> Option<Vec<Question>> {
    if raw.len() != QUESTIONS_PER_SESSION {
        return None;
    }

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(raw.len());

    for (i, item) in raw.into_iter().enumerate() {
        let text = non_empty(item.text)?;

        let mut id = non_empty(item.id).unwrap_or_else(|| format!("q_{}", i + 1));
        if seen.contains(&id) {
            id = format!("q_{}", i + 1);
            let mut suffix = 2;
            while seen.contains(&id) {
                id = format!("q_{}_{suffix}", i + 1);
                suffix += 1;
            }
        }
        seen.insert(id.clone());

        let time_limit = item
            .time_limit
            .map(|t| t.round())
            .filter(|t| *t >= 1.0)
            .map_or(DEFAULT_TIME_LIMIT, |t| t.min(f64::from(u32::MAX)) as u32);

        questions.push(Question {
            id,
            text,
            difficulty: parse_difficulty(item.difficulty.as_deref()),
            time_limit,
            category: non_empty(item.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        });
    }

    Some(questions)
}

fn parse_evaluation(text: &str) -> Result<AnswerEvaluation, LlmError> {
    let raw: RawEvaluation = serde_json::from_str(strip_json_fences(text))?;
    let score = raw
        .score
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|s| s.is_finite())
        .ok_or_else(|| LlmError::Unusable("missing or non-numeric score".to_string()))?;

    Ok(AnswerEvaluation {
        score: score.round().clamp(1.0, 10.0) as u8,
        feedback: non_empty(raw.feedback).unwrap_or_else(|| DEFAULT_FEEDBACK.to_string()),
    })
}

fn parse_final_evaluation(text: &str) -> Result<FinalEvaluation, LlmError> {
    let raw: RawFinalEvaluation = serde_json::from_str(strip_json_fences(text))?;
    let total_score = raw
        .total_score
        .filter(|s| s.is_finite())
        .ok_or_else(|| LlmError::Unusable("missing totalScore".to_string()))?;
    let summary = non_empty(raw.summary)
        .ok_or_else(|| LlmError::Unusable("missing summary".to_string()))?;

    Ok(FinalEvaluation {
        total_score: total_score.round().clamp(0.0, 100.0) as u32,
        summary,
        strengths: raw.strengths.into_iter().take(MAX_LIST_ITEMS).collect(),
        weaknesses: raw.weaknesses.into_iter().take(MAX_LIST_ITEMS).collect(),
        degraded: false,
    })
}
