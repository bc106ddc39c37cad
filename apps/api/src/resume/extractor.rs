//! Résumé text extractor. Heuristic, regex-based field extraction.
//!
//! Pure function of the document text. False positives and negatives are
//! expected; the output only has to be good enough to seed interview questions.

use lazy_static::lazy_static;
use regex::Regex;

use crate::resume::models::CandidateDocument;

const MAX_SKILLS: usize = 20;
const MAX_EXPERIENCE: usize = 10;
const MAX_EDUCATION: usize = 5;

/// Display names of technologies detected anywhere in the text.
const TECH_KEYWORDS: &[&str] = &[
    "JavaScript", "TypeScript", "Python", "Java", "C++", "C#", "Go", "Rust", "PHP", "Ruby",
    "React", "Angular", "Vue", "Node.js", "Express", "Next.js", "Nuxt.js",
    "HTML", "CSS", "Sass", "Less", "Tailwind", "Bootstrap",
    "MongoDB", "PostgreSQL", "MySQL", "Redis", "Elasticsearch",
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "Jenkins", "Git",
    "REST", "GraphQL", "Microservices", "API", "JSON", "XML",
    "Agile", "Scrum", "DevOps", "CI/CD", "TDD", "BDD",
];

/// Keywords that are also ordinary English words; matched case-sensitively.
const CASE_SENSITIVE_KEYWORDS: &[&str] = &["Go", "Less", "REST", "Express"];

/// Lines equal to one of these (case-insensitive, trailing colon ignored) start a new section.
const SECTION_HEADINGS: &[&str] = &[
    "skills",
    "technical skills",
    "core skills",
    "technologies",
    "tech stack",
    "programming languages",
    "languages",
    "experience",
    "work experience",
    "professional experience",
    "work history",
    "employment",
    "employment history",
    "education",
    "academic background",
    "projects",
    "personal projects",
    "certifications",
    "certificates",
    "summary",
    "professional summary",
    "profile",
    "objective",
    "awards",
    "achievements",
    "interests",
    "publications",
    "references",
    "volunteering",
    "contact",
];

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex =
        Regex::new(r"(\+?1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})").unwrap();
    static ref LINKEDIN_REGEX: Regex =
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/in/[a-zA-Z0-9-]+/?").unwrap();
    static ref GITHUB_REGEX: Regex =
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[a-zA-Z0-9-]+/?").unwrap();
    static ref CAPITALIZED_WORD: Regex = Regex::new(r"^[A-Z][a-z]+$").unwrap();
    static ref NAME_CHARS: Regex = Regex::new(r"^[A-Za-z\s]+$").unwrap();
    static ref SKILLS_HEADER: Regex =
        Regex::new(r"(?i)\b(?:skills?|technologies|technology|tech stack|programming languages?)\b")
            .unwrap();
    static ref EXPERIENCE_HEADER: Regex =
        Regex::new(r"(?i)\b(?:experience|work history|employment)\b").unwrap();
    static ref EDUCATION_HEADER: Regex =
        Regex::new(r"(?i)\b(?:education|academic|degree|university|college|school)\b").unwrap();
    static ref JOB_TITLE: Regex = Regex::new(
        r"(?i)software engineer|developer|programmer|analyst|consultant|manager|lead|senior|junior|intern"
    )
    .unwrap();
    static ref DEGREE: Regex =
        Regex::new(r"(?i)bachelor|master|phd|associate|diploma|certificate|degree").unwrap();
    static ref YEARS_OF_EXPERIENCE: Regex =
        Regex::new(r"(?i)(\d+)[\s-]*(?:years?|yrs?)[\s-]*(?:of[\s-]*)?(?:experience|exp)").unwrap();
    static ref SKILL_SEPARATORS: Regex = Regex::new(r"[,;•|\n]").unwrap();
    static ref TECH_PATTERNS: Vec<(&'static str, Regex)> = TECH_KEYWORDS
        .iter()
        .map(|&name| {
            let flags = if CASE_SENSITIVE_KEYWORDS.contains(&name) { "" } else { "(?i)" };
            let pattern = format!(
                r"{flags}(?:^|[^A-Za-z0-9_]){}(?:$|[^A-Za-z0-9_])",
                regex::escape(name)
            );
            (name, Regex::new(&pattern).unwrap())
        })
        .collect();
}

/// Turns raw document text into a structured best-effort record.
pub fn extract_candidate_document(file_name: &str, raw_text: &str) -> CandidateDocument {
    let lines: Vec<&str> = raw_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    CandidateDocument {
        file_name: file_name.to_string(),
        raw_text: raw_text.to_string(),
        name: extract_name(&lines),
        email: first_match(&EMAIL_REGEX, raw_text),
        phone: first_match(&PHONE_REGEX, raw_text),
        linkedin: first_match(&LINKEDIN_REGEX, raw_text),
        github: first_match(&GITHUB_REGEX, raw_text),
        skills: extract_skills(raw_text, &lines),
        experience: extract_experience(raw_text, &lines),
        education: extract_education(&lines),
    }
}

fn first_match(regex: &Regex, text: &str) -> Option<String> {
    regex.find(text).map(|m| m.as_str().trim().to_string())
}

fn mentions_document_label(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("resume") || lower.contains("cv") || lower.contains("curriculum")
}

fn extract_name(lines: &[&str]) -> Option<String> {
    let looks_like_name = |line: &&&str| {
        let words: Vec<&str> = line.split(' ').collect();
        (2..=4).contains(&words.len())
            && words.iter().all(|w| CAPITALIZED_WORD.is_match(w))
            && line.len() < 50
            && !mentions_document_label(line)
    };

    if let Some(line) = lines.iter().find(looks_like_name) {
        return Some(line.to_string());
    }

    let first = lines.first()?;
    if first.len() < 50 && NAME_CHARS.is_match(first) && !mentions_document_label(first) {
        return Some(first.to_string());
    }
    None
}

fn is_heading(line: &str) -> bool {
    let normalized = line
        .trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches(':')
        .trim()
        .to_lowercase();
    SECTION_HEADINGS.contains(&normalized.as_str())
}

/// Lines from the first line matching `header` up to (not including) the next heading.
fn find_section<'l, 'a>(lines: &'l [&'a str], header: &Regex) -> Option<&'l [&'a str]> {
    let start = lines.iter().position(|line| header.is_match(line))?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| is_heading(line))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());
    Some(&lines[start..end])
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing.eq_ignore_ascii_case(item)) {
        list.push(item.to_string());
    }
}

fn extract_skills(text: &str, lines: &[&str]) -> Vec<String> {
    let mut skills = Vec::new();

    for (name, pattern) in TECH_PATTERNS.iter() {
        if pattern.is_match(text) {
            push_unique(&mut skills, name);
        }
    }

    if let Some(section) = find_section(lines, &SKILLS_HEADER) {
        let body = match section.split_first() {
            Some((header, rest)) if is_heading(header) => rest,
            _ => section,
        };
        let joined = body.join("\n");
        for token in SKILL_SEPARATORS.split(&joined) {
            // "Languages: Python" → "Python"
            let token = token.rsplit(':').next().unwrap_or(token);
            let token = token.trim().trim_start_matches(['-', '*', '·']).trim();
            let len = token.chars().count();
            if len > 1 && len < 50 && !token.to_lowercase().contains("skill") {
                push_unique(&mut skills, token);
            }
        }
    }

    skills.truncate(MAX_SKILLS);
    skills
}

fn extract_experience(text: &str, lines: &[&str]) -> Vec<String> {
    let mut experience = Vec::new();

    if let Some(section) = find_section(lines, &EXPERIENCE_HEADER) {
        for line in section.iter().flat_map(|l| l.split('•')).map(str::trim) {
            if line.len() > 10 && line.len() < 100 && JOB_TITLE.is_match(line) {
                experience.push(line.to_string());
            }
        }
    }

    if let Some(years) = YEARS_OF_EXPERIENCE.captures(text).and_then(|c| c.get(1)) {
        experience.push(format!("{} years of experience", years.as_str()));
    }

    experience.truncate(MAX_EXPERIENCE);
    experience
}

fn extract_education(lines: &[&str]) -> Vec<String> {
    let mut education = Vec::new();

    if let Some(section) = find_section(lines, &EDUCATION_HEADER) {
        for line in section.iter().flat_map(|l| l.split('•')).map(str::trim) {
            if line.len() > 5 && line.len() < 100 && DEGREE.is_match(line) {
                education.push(line.to_string());
            }
        }
    }

    education.truncate(MAX_EDUCATION);
    education
}
