//! Candidate profile aggregation.
//!
//! Pure functions over `CandidatesState`. Derived fields (`total_sessions`,
//! `average_score`, `last_interview_date`) are always recomputed from the
//! session list, never incremented.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interview::models::InterviewSession;
use crate::resume::models::CandidateDocument;

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub sessions: Vec<InterviewSession>,
    pub total_sessions: usize,
    pub average_score: Option<f64>,
    pub last_interview_date: Option<DateTime<Utc>>,
}

impl CandidateProfile {
    pub fn new(id: Uuid, contact: ContactDetails) -> Self {
        Self {
            id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            sessions: Vec::new(),
            total_sessions: 0,
            average_score: None,
            last_interview_date: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidatesState {
    pub profiles: Vec<CandidateProfile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl ContactDetails {
    /// Document fields win; the account's name and email fill the gaps.
    pub fn resolve(
        document: &CandidateDocument,
        account_name: Option<&str>,
        account_email: Option<&str>,
    ) -> Self {
        let name = document
            .name
            .as_deref()
            .or(account_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(ANONYMOUS);
        let email = document.email.as_deref().or(account_email).unwrap_or_default();
        Self {
            name: name.to_string(),
            email: email.to_string(),
            phone: document.phone.clone(),
        }
    }
}

/// Partial contact update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Refreshes `total_sessions`, `average_score` and `last_interview_date`.
pub fn recompute(profile: &mut CandidateProfile) {
    profile.total_sessions = profile.sessions.len();

    let scores: Vec<f64> = profile
        .sessions
        .iter()
        .filter_map(|s| s.total_score)
        .map(f64::from)
        .collect();
    profile.average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    profile.last_interview_date = profile
        .sessions
        .iter()
        .map(|s| s.completed_at.unwrap_or(s.created_at))
        .max();
}

fn position(state: &CandidatesState, id: Uuid) -> Option<usize> {
    state.profiles.iter().position(|p| p.id == id)
}

pub fn get_profile(state: &CandidatesState, id: Uuid) -> Option<&CandidateProfile> {
    state.profiles.iter().find(|p| p.id == id)
}

/// Creates the profile, or refreshes its contact fields if it already exists.
/// Existing sessions are kept.
pub fn ensure_profile(
    state: &mut CandidatesState,
    id: Uuid,
    contact: ContactDetails,
) -> &CandidateProfile {
    match position(state, id) {
        Some(i) => {
            let profile = &mut state.profiles[i];
            profile.name = contact.name;
            if !contact.email.is_empty() {
                profile.email = contact.email;
            }
            if contact.phone.is_some() {
                profile.phone = contact.phone;
            }
            &state.profiles[i]
        }
        None => {
            state.profiles.push(CandidateProfile::new(id, contact));
            &state.profiles[state.profiles.len() - 1]
        }
    }
}

/// Adds `session` to the candidate's profile, replacing an earlier copy with
/// the same session id. Recording the same session twice is a no-op.
pub fn record_session(
    state: &mut CandidatesState,
    candidate_id: Uuid,
    session: InterviewSession,
) -> &CandidateProfile {
    let i = match position(state, candidate_id) {
        Some(i) => i,
        None => {
            let contact = ContactDetails::resolve(&session.document, None, None);
            state
                .profiles
                .push(CandidateProfile::new(candidate_id, contact));
            state.profiles.len() - 1
        }
    };

    let profile = &mut state.profiles[i];
    match profile.sessions.iter().position(|s| s.id == session.id) {
        Some(existing) => profile.sessions[existing] = session,
        None => profile.sessions.push(session),
    }
    recompute(profile);
    &state.profiles[i]
}

/// Inserts or replaces a whole profile by id.
pub fn upsert_profile(state: &mut CandidatesState, mut profile: CandidateProfile) {
    recompute(&mut profile);
    match position(state, profile.id) {
        Some(i) => state.profiles[i] = profile,
        None => state.profiles.push(profile),
    }
}

pub fn update_profile(
    state: &mut CandidatesState,
    id: Uuid,
    update: ProfileUpdate,
) -> Option<&CandidateProfile> {
    let i = position(state, id)?;
    let profile = &mut state.profiles[i];
    if let Some(name) = update.name {
        profile.name = name;
    }
    if let Some(email) = update.email {
        profile.email = email;
    }
    if update.phone.is_some() {
        profile.phone = update.phone;
    }
    Some(&state.profiles[i])
}

pub fn remove_profile(state: &mut CandidatesState, id: Uuid) -> bool {
    let before = state.profiles.len();
    state.profiles.retain(|p| p.id != id);
    state.profiles.len() != before
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    TotalSessions,
    AverageScore,
    LastInterview,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Interviewer list row. Sessions are only returned by the detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub total_sessions: usize,
    pub average_score: Option<f64>,
    pub last_interview_date: Option<DateTime<Utc>>,
}

impl From<&CandidateProfile> for CandidateSummary {
    fn from(p: &CandidateProfile) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            total_sessions: p.total_sessions,
            average_score: p.average_score,
            last_interview_date: p.last_interview_date,
        }
    }
}

fn compare(a: &CandidateProfile, b: &CandidateProfile, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::TotalSessions => a.total_sessions.cmp(&b.total_sessions),
        SortKey::AverageScore => a
            .average_score
            .unwrap_or(0.0)
            .total_cmp(&b.average_score.unwrap_or(0.0)),
        SortKey::LastInterview => a.last_interview_date.cmp(&b.last_interview_date),
    }
}

/// Case-insensitive substring search over name and email, then a stable sort.
pub fn search_profiles(
    state: &CandidatesState,
    search: Option<&str>,
    key: SortKey,
    order: SortOrder,
) -> Vec<CandidateSummary> {
    let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    let mut matches: Vec<&CandidateProfile> = state
        .profiles
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.email.to_lowercase().contains(&needle)
        })
        .collect();

    matches.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    matches.into_iter().map(CandidateSummary::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_candidates: usize,
    pub total_interviews: usize,
    /// Mean of profile averages; profiles without a score count as 0.
    pub average_score: f64,
    pub completed_interviews: usize,
}

pub fn dashboard_stats(state: &CandidatesState) -> DashboardStats {
    let total_candidates = state.profiles.len();
    let average_score = if total_candidates == 0 {
        0.0
    } else {
        state
            .profiles
            .iter()
            .map(|p| p.average_score.unwrap_or(0.0))
            .sum::<f64>()
            / total_candidates as f64
    };

    DashboardStats {
        total_candidates,
        total_interviews: state.profiles.iter().map(|p| p.total_sessions).sum(),
        average_score,
        completed_interviews: state
            .profiles
            .iter()
            .flat_map(|p| &p.sessions)
            .filter(|s| s.is_completed)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::interview::fallback::fallback_questions;

    fn completed_session(candidate_id: Uuid, score: u32) -> InterviewSession {
        let mut session =
            InterviewSession::new(candidate_id, CandidateDocument::default(), fallback_questions());
        session.is_completed = true;
        session.total_score = Some(score);
        session.completed_at = Some(Utc::now());
        session
    }

    fn contact(name: &str, email: &str) -> ContactDetails {
        ContactDetails {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_average_of_two_sessions() {
        let mut state = CandidatesState::default();
        let id = Uuid::new_v4();
        record_session(&mut state, id, completed_session(id, 80));
        let profile = record_session(&mut state, id, completed_session(id, 60));
        assert_eq!(profile.total_sessions, 2);
        assert_eq!(profile.average_score, Some(70.0));
    }

    #[test]
    fn test_recording_same_session_twice_does_not_double_count() {
        let mut state = CandidatesState::default();
        let id = Uuid::new_v4();
        let session = completed_session(id, 90);
        record_session(&mut state, id, session.clone());
        let profile = record_session(&mut state, id, session);
        assert_eq!(profile.total_sessions, 1);
        assert_eq!(profile.average_score, Some(90.0));
    }

    #[test]
    fn test_unscored_sessions_do_not_count_towards_average() {
        let mut state = CandidatesState::default();
        let id = Uuid::new_v4();
        let open = InterviewSession::new(id, CandidateDocument::default(), fallback_questions());
        let profile = record_session(&mut state, id, open);
        assert_eq!(profile.total_sessions, 1);
        assert_eq!(profile.average_score, None);
        assert_eq!(profile.name, "Anonymous");
    }

    #[test]
    fn test_last_interview_date_uses_latest_session() {
        let mut state = CandidatesState::default();
        let id = Uuid::new_v4();
        let mut older = completed_session(id, 50);
        older.completed_at = Some(Utc::now() - Duration::days(3));
        let newer = completed_session(id, 70);
        let newest_date = newer.completed_at;

        record_session(&mut state, id, newer);
        let profile = record_session(&mut state, id, older);
        assert_eq!(profile.last_interview_date, newest_date);
    }

    #[test]
    fn test_ensure_profile_keeps_sessions() {
        let mut state = CandidatesState::default();
        let id = Uuid::new_v4();
        record_session(&mut state, id, completed_session(id, 75));

        let profile = ensure_profile(&mut state, id, contact("Jane Roe", "jane@example.com"));
        assert_eq!(profile.name, "Jane Roe");
        assert_eq!(profile.total_sessions, 1);
        assert_eq!(state.profiles.len(), 1);
    }

    #[test]
    fn test_contact_resolution_prefers_document() {
        let document = CandidateDocument {
            name: Some("John Doe".to_string()),
            ..Default::default()
        };
        let resolved = ContactDetails::resolve(&document, Some("jd"), Some("jd@example.com"));
        assert_eq!(resolved.name, "John Doe");
        assert_eq!(resolved.email, "jd@example.com");

        let resolved = ContactDetails::resolve(&CandidateDocument::default(), None, None);
        assert_eq!(resolved.name, "Anonymous");
        assert_eq!(resolved.email, "");
    }

    #[test]
    fn test_upsert_update_and_remove() {
        let mut state = CandidatesState::default();
        let id = Uuid::new_v4();
        let mut profile = CandidateProfile::new(id, contact("A", "a@example.com"));
        profile.sessions.push(completed_session(id, 40));
        upsert_profile(&mut state, profile);
        assert_eq!(get_profile(&state, id).map(|p| p.total_sessions), Some(1));

        upsert_profile(&mut state, CandidateProfile::new(id, contact("B", "b@example.com")));
        assert_eq!(state.profiles.len(), 1);
        assert_eq!(state.profiles[0].name, "B");

        let update = ProfileUpdate {
            phone: Some("555-123-4567".to_string()),
            ..Default::default()
        };
        let updated = update_profile(&mut state, id, update).unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-123-4567"));
        assert_eq!(updated.name, "B");

        assert!(update_profile(&mut state, Uuid::new_v4(), ProfileUpdate::default()).is_none());
        assert!(remove_profile(&mut state, id));
        assert!(!remove_profile(&mut state, id));
    }

    #[test]
    fn test_search_and_sort() {
        let mut state = CandidatesState::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        ensure_profile(&mut state, alice, contact("alice", "alice@acme.io"));
        ensure_profile(&mut state, bob, contact("Bob", "bob@example.com"));
        ensure_profile(&mut state, carol, contact("Carol", "carol@acme.io"));
        record_session(&mut state, bob, completed_session(bob, 90));
        record_session(&mut state, carol, completed_session(carol, 40));

        let names: Vec<String> = search_profiles(&state, None, SortKey::Name, SortOrder::Asc)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["alice", "Bob", "Carol"]);

        let by_score = search_profiles(&state, None, SortKey::AverageScore, SortOrder::Desc);
        assert_eq!(by_score[0].id, bob);
        assert_eq!(by_score[2].id, alice);

        let acme = search_profiles(&state, Some("ACME"), SortKey::Name, SortOrder::Asc);
        assert_eq!(acme.len(), 2);
    }

    #[test]
    fn test_dashboard_stats() {
        let mut state = CandidatesState::default();
        assert_eq!(dashboard_stats(&state).average_score, 0.0);

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        record_session(&mut state, a, completed_session(a, 80));
        record_session(&mut state, a, completed_session(a, 60));
        ensure_profile(&mut state, b, contact("New", "new@example.com"));

        let stats = dashboard_stats(&state);
        assert_eq!(stats.total_candidates, 2);
        assert_eq!(stats.total_interviews, 2);
        assert_eq!(stats.completed_interviews, 2);
        // (70 + 0) / 2
        assert_eq!(stats.average_score, 35.0);
    }
}
