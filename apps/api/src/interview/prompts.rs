// All LLM prompt templates for the interview gateway.
// Slots are filled with `llm_client::prompts::render`; `{raw_text}` and
// `{answer_text}` are always rendered last so candidate-supplied text can
// never introduce a slot of its own.

/// Free-text résumé analysis. Slots: `{raw_text}`.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this resume and extract key information for generating personalized interview questions.

Resume Text: {raw_text}

Please provide a structured analysis including:
1. TECHNICAL SKILLS: List all programming languages, frameworks, tools mentioned
2. EXPERIENCE LEVEL: Estimate years of experience and seniority level
3. PROJECTS: Key projects or achievements mentioned
4. EDUCATION: Degree and relevant coursework
5. SPECIALIZATIONS: Areas of focus (frontend, backend, full-stack, etc.)
6. CERTIFICATIONS: Any certifications or training mentioned

Format as a concise summary for question generation."#;

/// Substituted for the analysis when the analysis call fails. Slots: `{name}`.
pub const BASIC_ANALYSIS_TEMPLATE: &str =
    "Basic resume analysis: {name} with experience in software development.";

/// Question generation. Slots: `{name}`, `{email}`, `{phone}`, `{analysis}`,
/// `{json_only}`, `{raw_text}`.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Based on the following detailed resume analysis, generate 6 personalized interview questions for a software developer position.

CANDIDATE PROFILE:
- Name: {name}
- Email: {email}
- Phone: {phone}

RESUME ANALYSIS:
{analysis}

INSTRUCTIONS:
1. Generate questions that are SPECIFIC to this candidate's experience and skills
2. Ask about technologies they've mentioned in their resume
3. Create questions that test both theoretical knowledge and practical experience
4. Ensure questions are relevant to their career level and background

Generate exactly 6 questions with this distribution:
- 2 Easy questions (30-60 seconds): Basic concepts related to their tech stack
- 2 Medium questions (90-120 seconds): Intermediate concepts and best practices
- 2 Hard questions (150-180 seconds): Advanced scenarios and problem-solving

Return a JSON array with this EXACT schema:
[
  {"id": "q1", "text": "Specific question based on their resume", "difficulty": "easy", "timeLimit": 45, "category": "Technology from their resume"},
  {"id": "q2", "text": "Another specific question", "difficulty": "easy", "timeLimit": 60, "category": "Another relevant technology"},
  {"id": "q3", "text": "Medium difficulty question", "difficulty": "medium", "timeLimit": 90, "category": "Best practices"},
  {"id": "q4", "text": "Another medium question", "difficulty": "medium", "timeLimit": 120, "category": "Architecture"},
  {"id": "q5", "text": "Hard scenario-based question", "difficulty": "hard", "timeLimit": 150, "category": "Advanced concepts"},
  {"id": "q6", "text": "Another hard question", "difficulty": "hard", "timeLimit": 180, "category": "Problem solving"}
]

{json_only}

FULL RESUME TEXT:
{raw_text}"#;

/// Single-answer scoring rubric. Slots: `{question}`, `{difficulty}`,
/// `{category}`, `{time_limit}`, `{time_spent}`, `{json_only}`, `{answer_text}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an expert technical interviewer evaluating a candidate's response. Provide a thorough and accurate assessment.

QUESTION DETAILS:
- Question: {question}
- Difficulty: {difficulty}
- Category: {category}
- Time Limit: {time_limit} seconds
- Time Taken: {time_spent} seconds

EVALUATION CRITERIA:
For {difficulty} difficulty questions, use these scoring standards:

EASY QUESTIONS (1-10 scale):
- 9-10: Excellent understanding, clear explanation, mentions best practices
- 7-8: Good understanding, mostly correct, some minor gaps
- 5-6: Basic understanding, partially correct, some confusion
- 3-4: Limited understanding, significant errors
- 1-2: Poor understanding, mostly incorrect

MEDIUM QUESTIONS (1-10 scale):
- 9-10: Advanced understanding, excellent explanation, considers edge cases
- 7-8: Good understanding, solid explanation, minor gaps
- 5-6: Adequate understanding, some good points, some errors
- 3-4: Basic understanding, significant gaps or errors
- 1-2: Poor understanding, major errors

HARD QUESTIONS (1-10 scale):
- 9-10: Expert level, comprehensive answer, shows deep knowledge
- 7-8: Advanced level, good understanding, minor gaps
- 5-6: Intermediate level, adequate but incomplete
- 3-4: Basic level, significant gaps for this difficulty
- 1-2: Inadequate for this difficulty level

SCORING FACTORS:
- Technical Accuracy (40%): Is the technical content correct?
- Completeness (25%): Does it address all parts of the question?
- Clarity (20%): Is the explanation clear and well-structured?
- Relevance (15%): Does it directly answer the question asked?

SPECIAL CONSIDERATIONS:
- If answer is too short (< 20 words), deduct 2-3 points
- If answer is completely off-topic, score 1-2
- If answer shows no understanding, score 1-3
- If answer is partially correct but incomplete, score 4-6
- If answer is correct but lacks depth for the difficulty, score 6-7

Provide detailed feedback explaining:
1. What the candidate got right
2. What they missed or got wrong
3. Specific suggestions for improvement
4. Overall assessment of their technical knowledge level

Return a JSON object with this EXACT schema:
{"score": 7, "feedback": "detailed feedback explaining the score and providing constructive criticism"}

{json_only}

CANDIDATE'S ANSWER:
"{answer_text}""#;

/// Whole-interview summary. Slots: `{json_only}`, `{qa_pairs}`.
pub const FINAL_EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an expert technical interviewer. Review the interview Q&A and scores below, and provide a tailored evaluation for the candidate.

Please provide:
1. Overall score (0-100)
2. Brief summary (2-3 sentences) that highlights specific strengths and weaknesses based on the answers
3. Top 3 strengths (tailored to what the candidate did well)
4. Top 3 areas for improvement (tailored to what the candidate struggled with or missed)
5. If any answer scored 0, mention that the candidate gave irrelevant or random input and recommend focusing on meaningful, technical responses in future interviews

Return a JSON object with this EXACT schema:
{"totalScore": 72, "summary": "string", "strengths": ["string", "string", "string"], "weaknesses": ["string", "string", "string"]}

{json_only}

INTERVIEW:
{qa_pairs}"#;

/// One Q&A block of the final evaluation prompt.
pub fn format_qa_pair(
    number: usize,
    difficulty: &str,
    question: &str,
    answer: Option<&str>,
    score: Option<u8>,
) -> String {
    let score = score.map_or_else(|| "N/A".to_string(), |s| s.to_string());
    format!(
        "Q{number} ({difficulty}): {question}\nA{number}: {}\nScore: {score}/10\n",
        answer.unwrap_or("No answer")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_qa_pair_with_score() {
        let block = format_qa_pair(2, "easy", "What is a closure?", Some("A function"), Some(0));
        assert_eq!(block, "Q2 (easy): What is a closure?\nA2: A function\nScore: 0/10\n");
    }

    #[test]
    fn test_format_qa_pair_unanswered() {
        let block = format_qa_pair(6, "hard", "Design a cache.", None, None);
        assert!(block.contains("A6: No answer"));
        assert!(block.contains("Score: N/A/10"));
    }

    #[test]
    fn test_candidate_text_slots_come_last() {
        assert!(QUESTIONS_PROMPT_TEMPLATE.trim_end().ends_with("{raw_text}"));
        assert!(EVALUATION_PROMPT_TEMPLATE.trim_end().ends_with("\"{answer_text}\""));
        assert!(FINAL_EVALUATION_PROMPT_TEMPLATE.trim_end().ends_with("{qa_pairs}"));
    }
}
