//! Interview controller.
//!
//! Owns every candidate's interview slot and the candidates state behind one
//! async mutex. Gateway calls always run with the lock released; their results
//! are committed only if the slot's epoch and session id still match, so
//! anything that finishes after a reset or a new start is dropped.
//!
//! A slot exists only for candidates that started an interview or have one
//! persisted. Reset removes it.
//!
//! Methods that spawn follow-up work (`submit_locked`,
//! `present_current_question`) are synchronous and run under the caller's
//! lock guard.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::candidates::aggregator::{
    dashboard_stats, ensure_profile, get_profile, record_session, remove_profile,
    search_profiles, update_profile, upsert_profile, CandidateProfile, CandidateSummary,
    CandidatesState, ContactDetails, DashboardStats, ProfileUpdate, SortKey, SortOrder,
};
use crate::candidates::store::ProfileStore;
use crate::errors::AppError;
use crate::interview::gateway::InterviewGateway;
use crate::interview::models::{Answer, AnswerEvaluation, InterviewSession, Question};
use crate::interview::reducer::{reduce, InterviewAction, InterviewPhase, InterviewState};
use crate::interview::store::InterviewStateStore;
use crate::interview::timer::QuestionTimer;
use crate::resume::models::CandidateDocument;

const INTERRUPTED_START: &str = "Interview start was interrupted. Please start again.";

/// What a client sees for one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewView {
    pub phase: InterviewPhase,
    pub is_paused: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Set when an unfinished interview was restored and is waiting for resume.
    pub welcome_back: bool,
    pub session: Option<InterviewSession>,
    pub current_question: Option<Question>,
    pub time_remaining: Option<u32>,
    /// The countdown hit zero with nothing staged; manual submission still works.
    pub time_expired: bool,
    pub draft: String,
}

impl InterviewView {
    /// View of a candidate with no interview.
    fn idle() -> Self {
        InterviewSlot::default().view()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub accepted: bool,
    pub view: InterviewView,
}

#[derive(Default)]
struct InterviewSlot {
    state: InterviewState,
    draft: String,
    timer: Option<QuestionTimer>,
    /// Bumped every time a countdown starts; stale expiries are ignored.
    timer_seq: u64,
    question_started_at: Option<Instant>,
    /// Time spent on the current question before the last pause.
    time_carried: Duration,
    time_expired: bool,
    welcome_back: bool,
    /// Drawn from `AppStore::next_epoch` on start and restore.
    epoch: u64,
    evaluations: Vec<JoinHandle<()>>,
    completion: Option<JoinHandle<()>>,
}

impl InterviewSlot {
    fn session_id(&self) -> Option<Uuid> {
        self.state.current_session.as_ref().map(|s| s.id)
    }

    fn is_current(&self, epoch: u64, session_id: Uuid) -> bool {
        self.epoch == epoch && self.session_id() == Some(session_id)
    }

    fn cancel_tasks(&mut self) {
        self.timer = None;
        self.timer_seq += 1;
        for handle in self.evaluations.drain(..) {
            handle.abort();
        }
        if let Some(handle) = self.completion.take() {
            handle.abort();
        }
    }

    /// Seconds spent on the current question so far, pauses excluded.
    fn elapsed_secs(&self) -> u32 {
        let running = self
            .question_started_at
            .map_or(Duration::ZERO, |t| t.elapsed());
        u32::try_from((self.time_carried + running).as_secs()).unwrap_or(u32::MAX)
    }

    fn view(&self) -> InterviewView {
        let current_question = if self.state.phase() == InterviewPhase::Active {
            self.state
                .current_session
                .as_ref()
                .and_then(InterviewSession::current_question)
                .cloned()
        } else {
            None
        };

        InterviewView {
            phase: self.state.phase(),
            is_paused: self.state.is_paused(),
            is_loading: self.state.is_loading,
            error: self.state.error.clone(),
            welcome_back: self.welcome_back,
            session: self.state.current_session.clone(),
            current_question,
            time_remaining: self.timer.as_ref().map(QuestionTimer::remaining),
            time_expired: self.time_expired,
            draft: self.draft.clone(),
        }
    }
}

#[derive(Default)]
struct AppStore {
    slots: HashMap<Uuid, InterviewSlot>,
    candidates: CandidatesState,
    last_epoch: u64,
}

impl AppStore {
    /// Epochs are unique across slots, so a removed and recreated slot never
    /// reuses one.
    fn next_epoch(&mut self) -> u64 {
        self.last_epoch += 1;
        self.last_epoch
    }
}

pub struct InterviewController {
    gateway: Arc<dyn InterviewGateway>,
    state_store: Arc<dyn InterviewStateStore>,
    profile_store: Arc<dyn ProfileStore>,
    store: Mutex<AppStore>,
    /// Held across a profile write. Never acquired while `store` is held.
    profile_writes: Mutex<()>,
}

impl InterviewController {
    pub fn new(
        gateway: Arc<dyn InterviewGateway>,
        state_store: Arc<dyn InterviewStateStore>,
        profile_store: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            gateway,
            state_store,
            profile_store,
            store: Mutex::new(AppStore::default()),
            profile_writes: Mutex::new(()),
        }
    }

    /// Loads persisted candidate profiles into memory. Called once at startup.
    pub async fn load_profiles(&self) -> Result<usize, AppError> {
        let profiles = self.profile_store.load_all().await?;
        let count = profiles.len();
        let mut store = self.store.lock().await;
        for profile in profiles {
            upsert_profile(&mut store.candidates, profile);
        }
        Ok(count)
    }

    // ── Interview lifecycle ────────────────────────────────────────────────

    pub async fn start(
        self: &Arc<Self>,
        candidate_id: Uuid,
        document: Option<CandidateDocument>,
        account_name: Option<&str>,
        account_email: Option<&str>,
    ) -> Result<InterviewView, AppError> {
        let document = document.filter(CandidateDocument::has_text).ok_or_else(|| {
            AppError::Validation("A parsed résumé is required to start an interview".to_string())
        })?;

        let epoch = {
            let mut store = self.store.lock().await;
            self.restore(&mut store, candidate_id).await?;
            let epoch = store.next_epoch();
            let slot = store.slots.entry(candidate_id).or_default();
            if slot.state.is_loading || slot.state.phase() == InterviewPhase::Active {
                return Err(AppError::Conflict(
                    "An interview is already in progress for this candidate".to_string(),
                ));
            }
            slot.cancel_tasks();
            slot.epoch = epoch;
            slot.welcome_back = false;
            slot.time_expired = false;
            slot.time_carried = Duration::ZERO;
            slot.draft.clear();
            reduce(&mut slot.state, InterviewAction::StartPending);
            self.persist(candidate_id, &slot.state).await;
            epoch
        };

        info!(candidate_id = %candidate_id, "Generating interview questions");
        let questions = self.gateway.generate_questions(&document).await;

        let mut store = self.store.lock().await;
        let AppStore {
            slots, candidates, ..
        } = &mut *store;
        let Some(slot) = slots.get_mut(&candidate_id).filter(|s| s.epoch == epoch) else {
            return Err(AppError::Conflict(
                "The interview was reset while it was starting".to_string(),
            ));
        };

        if questions.is_empty() {
            reduce(
                &mut slot.state,
                InterviewAction::StartRejected("Failed to start interview".to_string()),
            );
            self.persist(candidate_id, &slot.state).await;
            return Ok(slot.view());
        }

        let contact = ContactDetails::resolve(&document, account_name, account_email);
        let session = InterviewSession::new(candidate_id, document, questions);
        let session_id = session.id;
        reduce(&mut slot.state, InterviewAction::StartFulfilled(session));
        self.present_current_question(candidate_id, slot);
        self.persist(candidate_id, &slot.state).await;
        let view = slot.view();

        ensure_profile(candidates, candidate_id, contact);
        drop(store);
        self.save_profile(candidate_id).await;

        info!(candidate_id = %candidate_id, session_id = %session_id, "Interview started");
        Ok(view)
    }

    /// Stores the text that auto-submit will use when the countdown ends.
    pub async fn stage_answer(
        &self,
        candidate_id: Uuid,
        text: String,
    ) -> Result<InterviewView, AppError> {
        let mut store = self.store.lock().await;
        self.restore(&mut store, candidate_id).await?;
        let Some(slot) = store.slots.get_mut(&candidate_id) else {
            return Ok(InterviewView::idle());
        };
        if slot.state.phase() == InterviewPhase::Active && slot.state.is_interview_active {
            slot.draft = text;
        }
        Ok(slot.view())
    }

    pub async fn submit_answer(
        self: &Arc<Self>,
        candidate_id: Uuid,
        text: String,
    ) -> Result<SubmitReceipt, AppError> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::Validation("Answer cannot be empty".to_string()));
        }

        let mut store = self.store.lock().await;
        self.restore(&mut store, candidate_id).await?;
        let Some(slot) = store.slots.get_mut(&candidate_id) else {
            debug!(candidate_id = %candidate_id, "Answer submitted without an interview");
            return Ok(SubmitReceipt {
                accepted: false,
                view: InterviewView::idle(),
            });
        };
        let accepted = self.submit_locked(candidate_id, slot, text, None);
        if accepted {
            self.persist(candidate_id, &slot.state).await;
        } else {
            debug!(candidate_id = %candidate_id, "Answer submission ignored in current state");
        }
        Ok(SubmitReceipt {
            accepted,
            view: slot.view(),
        })
    }

    pub async fn pause(&self, candidate_id: Uuid) -> Result<InterviewView, AppError> {
        let mut store = self.store.lock().await;
        self.restore(&mut store, candidate_id).await?;
        let Some(slot) = store.slots.get_mut(&candidate_id) else {
            return Ok(InterviewView::idle());
        };
        if reduce(&mut slot.state, InterviewAction::Pause) {
            slot.timer = None;
            slot.timer_seq += 1;
            if let Some(started) = slot.question_started_at.take() {
                slot.time_carried += started.elapsed();
            }
            self.persist(candidate_id, &slot.state).await;
            info!(candidate_id = %candidate_id, "Interview paused");
        }
        Ok(slot.view())
    }

    pub async fn resume(self: &Arc<Self>, candidate_id: Uuid) -> Result<InterviewView, AppError> {
        let mut store = self.store.lock().await;
        self.restore(&mut store, candidate_id).await?;
        let Some(slot) = store.slots.get_mut(&candidate_id) else {
            return Ok(InterviewView::idle());
        };
        if reduce(&mut slot.state, InterviewAction::Resume) {
            slot.welcome_back = false;
            let all_answered = slot
                .state
                .current_session
                .as_ref()
                .is_some_and(InterviewSession::all_answered);
            if all_answered && slot.completion.is_none() {
                // Restored after every answer was in but before completion ran.
                self.spawn_completion(candidate_id, slot);
            } else {
                self.present_current_question(candidate_id, slot);
            }
            self.persist(candidate_id, &slot.state).await;
            info!(candidate_id = %candidate_id, "Interview resumed");
        }
        Ok(slot.view())
    }

    /// Cancels everything in flight and forgets the candidate's interview.
    pub async fn reset(&self, candidate_id: Uuid) -> Result<InterviewView, AppError> {
        let mut store = self.store.lock().await;
        if let Some(mut slot) = store.slots.remove(&candidate_id) {
            slot.cancel_tasks();
        }

        if let Err(e) = self.state_store.delete(candidate_id).await {
            warn!(candidate_id = %candidate_id, "Failed to delete interview state: {e}");
        }
        drop(store);
        info!(candidate_id = %candidate_id, "Interview reset");
        Ok(InterviewView::idle())
    }

    pub async fn clear_error(&self, candidate_id: Uuid) -> Result<InterviewView, AppError> {
        let mut store = self.store.lock().await;
        self.restore(&mut store, candidate_id).await?;
        let Some(slot) = store.slots.get_mut(&candidate_id) else {
            return Ok(InterviewView::idle());
        };
        if reduce(&mut slot.state, InterviewAction::ClearError) {
            self.persist(candidate_id, &slot.state).await;
        }
        Ok(slot.view())
    }

    /// Current view, restoring persisted state on first access.
    pub async fn view(&self, candidate_id: Uuid) -> Result<InterviewView, AppError> {
        let mut store = self.store.lock().await;
        self.restore(&mut store, candidate_id).await?;
        Ok(store
            .slots
            .get(&candidate_id)
            .map_or_else(InterviewView::idle, InterviewSlot::view))
    }

    // ── Candidates ─────────────────────────────────────────────────────────

    pub async fn list_candidates(
        &self,
        search: Option<&str>,
        sort: SortKey,
        order: SortOrder,
    ) -> (Vec<CandidateSummary>, DashboardStats) {
        let store = self.store.lock().await;
        (
            search_profiles(&store.candidates, search, sort, order),
            dashboard_stats(&store.candidates),
        )
    }

    pub async fn candidate(&self, id: Uuid) -> Option<CandidateProfile> {
        let store = self.store.lock().await;
        get_profile(&store.candidates, id).cloned()
    }

    pub async fn update_candidate(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<CandidateProfile, AppError> {
        let not_found = || AppError::NotFound(format!("Candidate {id} not found"));
        {
            let mut store = self.store.lock().await;
            update_profile(&mut store.candidates, id, update).ok_or_else(not_found)?;
        }
        self.write_profile(id).await?.ok_or_else(not_found)
    }

    pub async fn remove_candidate(&self, id: Uuid) -> Result<(), AppError> {
        let _write = self.profile_writes.lock().await;
        let removed = {
            let mut store = self.store.lock().await;
            remove_profile(&mut store.candidates, id)
        };
        if !removed {
            return Err(AppError::NotFound(format!("Candidate {id} not found")));
        }
        self.profile_store.delete(id).await?;
        info!(candidate_id = %id, "Candidate profile removed");
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────────────

    /// Loads the candidate's persisted snapshot into `store` if there is no
    /// slot yet. An unfinished session comes back paused. Candidates with
    /// nothing persisted stay without a slot.
    async fn restore(&self, store: &mut AppStore, candidate_id: Uuid) -> Result<(), AppError> {
        if store.slots.contains_key(&candidate_id) {
            return Ok(());
        }
        let Some(saved) = self.state_store.load(candidate_id).await? else {
            return Ok(());
        };

        let mut slot = InterviewSlot {
            epoch: store.next_epoch(),
            ..Default::default()
        };
        let interrupted = saved.is_loading && saved.current_session.is_none();
        reduce(
            &mut slot.state,
            InterviewAction::SetCurrentSession(saved.current_session),
        );
        slot.state.error = if interrupted {
            Some(INTERRUPTED_START.to_string())
        } else {
            saved.error
        };
        if reduce(&mut slot.state, InterviewAction::Pause) {
            slot.welcome_back = true;
            info!(candidate_id = %candidate_id, "Restored unfinished interview");
        }
        store.slots.insert(candidate_id, slot);
        Ok(())
    }

    async fn persist(&self, candidate_id: Uuid, state: &InterviewState) {
        if let Err(e) = self.state_store.save(candidate_id, state).await {
            warn!(candidate_id = %candidate_id, "Failed to persist interview state: {e}");
        }
    }

    /// Writes the candidate's in-memory profile to the profile store.
    /// Writes are serialised and each one reads the profile after taking its
    /// turn, so the newest snapshot always lands last.
    async fn write_profile(&self, id: Uuid) -> Result<Option<CandidateProfile>, AppError> {
        let _write = self.profile_writes.lock().await;
        let profile = {
            let store = self.store.lock().await;
            get_profile(&store.candidates, id).cloned()
        };
        if let Some(profile) = &profile {
            self.profile_store.save(profile).await?;
        }
        Ok(profile)
    }

    async fn save_profile(&self, id: Uuid) {
        if let Err(e) = self.write_profile(id).await {
            warn!(candidate_id = %id, "Failed to persist candidate profile: {e}");
        }
    }

    /// Starts the countdown for the current question, if there is one. Time
    /// carried over from before a pause is taken off the countdown.
    fn present_current_question(self: &Arc<Self>, candidate_id: Uuid, slot: &mut InterviewSlot) {
        slot.timer = None;
        slot.timer_seq += 1;
        slot.time_expired = false;

        let Some(session) = slot.state.current_session.as_ref() else {
            return;
        };
        let Some(question) = session.current_question() else {
            return;
        };
        let carried = u32::try_from(slot.time_carried.as_secs()).unwrap_or(u32::MAX);
        let countdown = question.time_limit.saturating_sub(carried).max(1);
        let session_id = session.id;
        let epoch = slot.epoch;
        let seq = slot.timer_seq;

        let controller = Arc::downgrade(self);
        slot.question_started_at = Some(Instant::now());
        slot.timer = Some(QuestionTimer::start(countdown, move || async move {
            if let Some(controller) = controller.upgrade() {
                controller
                    .on_timer_expired(candidate_id, epoch, session_id, seq)
                    .await;
            }
        }));
    }

    async fn on_timer_expired(
        self: &Arc<Self>,
        candidate_id: Uuid,
        epoch: u64,
        session_id: Uuid,
        seq: u64,
    ) {
        let mut store = self.store.lock().await;
        let Some(slot) = store
            .slots
            .get_mut(&candidate_id)
            .filter(|s| s.is_current(epoch, session_id) && s.timer_seq == seq)
        else {
            return;
        };
        if !slot.state.is_interview_active {
            return;
        }
        let Some(time_limit) = slot
            .state
            .current_session
            .as_ref()
            .and_then(InterviewSession::current_question)
            .map(|q| q.time_limit)
        else {
            return;
        };

        slot.timer = None;
        let draft = slot.draft.trim().to_string();
        if draft.is_empty() {
            slot.time_expired = true;
            info!(candidate_id = %candidate_id, "Time expired with nothing staged");
            return;
        }

        info!(candidate_id = %candidate_id, "Time expired, auto-submitting staged answer");
        if self.submit_locked(candidate_id, slot, draft, Some(time_limit)) {
            self.persist(candidate_id, &slot.state).await;
        }
    }

    /// Records an answer for the current question and schedules what follows.
    /// `time_spent` of `None` means time on the question so far, pauses excluded.
    fn submit_locked(
        self: &Arc<Self>,
        candidate_id: Uuid,
        slot: &mut InterviewSlot,
        text: String,
        time_spent: Option<u32>,
    ) -> bool {
        if !slot.state.is_interview_active {
            return false;
        }
        let Some(session) = slot.state.current_session.as_ref() else {
            return false;
        };
        let Some(question) = session.current_question().cloned() else {
            return false;
        };
        let session_id = session.id;

        let time_spent = time_spent
            .unwrap_or_else(|| slot.elapsed_secs())
            .min(question.time_limit);

        let answer = Answer {
            question_id: question.id.clone(),
            text,
            time_spent,
            submitted_at: Utc::now(),
            score: None,
            feedback: None,
        };
        if !reduce(&mut slot.state, InterviewAction::AnswerSubmitted(answer.clone())) {
            return false;
        }

        slot.timer = None;
        slot.timer_seq += 1;
        slot.draft.clear();
        slot.time_expired = false;
        slot.question_started_at = None;
        slot.time_carried = Duration::ZERO;

        let epoch = slot.epoch;
        let controller = Arc::clone(self);
        slot.evaluations.push(tokio::spawn(async move {
            let evaluation = controller.gateway.evaluate_answer(&question, &answer).await;
            controller
                .commit_evaluation(candidate_id, epoch, session_id, question.id, evaluation)
                .await;
        }));

        let all_answered = slot
            .state
            .current_session
            .as_ref()
            .is_some_and(InterviewSession::all_answered);
        if all_answered {
            self.spawn_completion(candidate_id, slot);
        } else {
            self.present_current_question(candidate_id, slot);
        }
        true
    }

    fn spawn_completion(self: &Arc<Self>, candidate_id: Uuid, slot: &mut InterviewSlot) {
        let Some(session_id) = slot.session_id() else {
            return;
        };
        let epoch = slot.epoch;
        let controller = Arc::clone(self);
        slot.completion = Some(tokio::spawn(async move {
            controller.complete(candidate_id, epoch, session_id).await;
        }));
    }

    async fn commit_evaluation(
        &self,
        candidate_id: Uuid,
        epoch: u64,
        session_id: Uuid,
        question_id: String,
        evaluation: AnswerEvaluation,
    ) {
        let mut store = self.store.lock().await;
        let Some(slot) = store
            .slots
            .get_mut(&candidate_id)
            .filter(|s| s.is_current(epoch, session_id))
        else {
            debug!(candidate_id = %candidate_id, "Dropping stale answer evaluation");
            return;
        };
        if reduce(
            &mut slot.state,
            InterviewAction::AnswerEvaluated {
                question_id,
                evaluation,
            },
        ) {
            self.persist(candidate_id, &slot.state).await;
        }
    }

    /// Clones the session if the slot still belongs to (epoch, session_id).
    async fn current_session(
        &self,
        candidate_id: Uuid,
        epoch: u64,
        session_id: Uuid,
    ) -> Option<InterviewSession> {
        let store = self.store.lock().await;
        store
            .slots
            .get(&candidate_id)
            .filter(|s| s.is_current(epoch, session_id))
            .and_then(|s| s.state.current_session.clone())
    }

    /// Waits for answer evaluations, scores anything still unscored, runs the
    /// final evaluation and records the session into the candidate's profile.
    async fn complete(&self, candidate_id: Uuid, epoch: u64, session_id: Uuid) {
        let evaluations = {
            let mut store = self.store.lock().await;
            match store
                .slots
                .get_mut(&candidate_id)
                .filter(|s| s.is_current(epoch, session_id))
            {
                Some(slot) => std::mem::take(&mut slot.evaluations),
                None => return,
            }
        };
        for handle in evaluations {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(candidate_id = %candidate_id, "Answer evaluation task failed: {e}");
                }
            }
        }

        let Some(session) = self.current_session(candidate_id, epoch, session_id).await else {
            return;
        };
        // Answers restored from a snapshot may never have been scored.
        for answer in session.answers.iter().filter(|a| a.score.is_none()) {
            if let Some(question) = session.question(&answer.question_id) {
                let evaluation = self.gateway.evaluate_answer(question, answer).await;
                self.commit_evaluation(
                    candidate_id,
                    epoch,
                    session_id,
                    answer.question_id.clone(),
                    evaluation,
                )
                .await;
            }
        }

        let Some(session) = self.current_session(candidate_id, epoch, session_id).await else {
            return;
        };
        let evaluation = self.gateway.final_evaluation(&session).await;

        let mut store = self.store.lock().await;
        let AppStore {
            slots, candidates, ..
        } = &mut *store;
        let Some(slot) = slots
            .get_mut(&candidate_id)
            .filter(|s| s.is_current(epoch, session_id))
        else {
            debug!(candidate_id = %candidate_id, "Dropping stale final evaluation");
            return;
        };
        if !reduce(&mut slot.state, InterviewAction::Completed(evaluation)) {
            return;
        }
        slot.completion = None;
        self.persist(candidate_id, &slot.state).await;

        let Some(completed) = slot.state.current_session.clone() else {
            return;
        };
        let total_score = completed.total_score;
        record_session(candidates, candidate_id, completed);
        drop(store);
        self.save_profile(candidate_id).await;

        info!(
            candidate_id = %candidate_id,
            session_id = %session_id,
            total_score = ?total_score,
            "Interview completed"
        );
    }
}
