//! The triage dialogue state machine.
//!
//! A session moves `Intake -> Questioning -> Summary`. Nothing leaves
//! `Summary`; [`TriageSession::reset`] discards everything and starts over
//! at `Intake`.
//!
//! Calls are strictly sequential. Each operation awaits at most one model
//! call at a time and `busy` is set while it is outstanding; callers must
//! not issue another operation until the previous one returns.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use triage_bedrock::generator::TextGenerator;
use triage_bedrock::parse::{NoteContext, parse_decision, parse_note, parse_question};
use triage_bedrock::prompts::{build_continuation_prompt, build_note_prompt, build_question_prompt};
use triage_core::models::conversation::{ConversationEntry, answered_follow_ups};
use triage_core::models::note::CompiledNote;

use crate::error::DialogueError;
use crate::policy::SufficiencyPolicy;
use crate::submission::{NoteSubmitter, SubmissionReceipt, SubmissionRequest};

pub const EMPTY_COMPLAINT: &str = "Please describe your symptoms";
pub const EMPTY_ANSWER: &str = "Please provide an answer";
pub const FIRST_QUESTION_FAILED: &str = "Failed to generate first question";
pub const PROCESSING_FAILED: &str = "Failed to process response";

pub const COMPLETION_NOTICE: &str = "Sufficient information gathered for clinical assessment.";
pub const RESET_NOTICE: &str = "Ready for new assessment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Intake,
    Questioning,
    Summary,
}

/// Everything the presentation layer renders for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub screen: Screen,
    /// 1-based index of the latest issued (or about-to-be-issued) follow-up.
    pub turn_count: u32,
    pub max_turns: Option<u32>,
    pub complaint: String,
    pub transcript: Vec<ConversationEntry>,
    pub note: Option<CompiledNote>,
    pub busy: bool,
    pub last_error: Option<String>,
    pub notice: Option<String>,
}

impl SessionState {
    pub fn new(max_turns: Option<u32>) -> Self {
        Self {
            screen: Screen::Intake,
            turn_count: 1,
            max_turns,
            complaint: String::new(),
            transcript: Vec::new(),
            note: None,
            busy: false,
            last_error: None,
            notice: None,
        }
    }

    /// The question awaiting an answer, if any.
    pub fn pending_question(&self) -> Option<&str> {
        self.transcript
            .last()
            .filter(|entry| entry.is_pending())
            .map(|entry| entry.question.as_str())
    }

    fn pending_index(&self) -> Option<usize> {
        self.transcript
            .last()
            .filter(|entry| entry.is_pending())
            .map(|_| self.transcript.len() - 1)
    }
}

/// Questioning progress for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub question_number: u32,
    pub max_questions: u32,
    pub percent: u8,
}

pub struct TriageSession {
    id: Uuid,
    policy: SufficiencyPolicy,
    generator: Arc<dyn TextGenerator>,
    submitter: Option<NoteSubmitter>,
    state: SessionState,
    submission: Option<JoinHandle<SubmissionReceipt>>,
}

impl TriageSession {
    pub fn new(policy: SufficiencyPolicy, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy,
            generator,
            submitter: None,
            state: SessionState::new(policy.max_turns()),
            submission: None,
        }
    }

    /// Hand compiled notes to `submitter` once the session reaches `Summary`.
    pub fn with_submitter(mut self, submitter: NoteSubmitter) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn policy(&self) -> SufficiencyPolicy {
        self.policy
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn pending_question(&self) -> Option<&str> {
        self.state.pending_question()
    }

    /// Transcript entries that have an answer.
    pub fn answered_transcript(&self) -> Vec<&ConversationEntry> {
        self.state
            .transcript
            .iter()
            .filter(|entry| !entry.is_pending())
            .collect()
    }

    pub fn progress(&self) -> Progress {
        let max_questions = self.policy.nominal_turns();
        let question_number = self.state.turn_count;
        let percent = (u64::from(question_number) * 100 / u64::from(max_questions)).min(100) as u8;
        Progress {
            question_number,
            max_questions,
            percent,
        }
    }

    /// Take the in-flight note submission, if one was started.
    ///
    /// The dialogue never waits on it; callers that want the receipt await
    /// the handle themselves.
    pub fn take_submission(&mut self) -> Option<JoinHandle<SubmissionReceipt>> {
        self.submission.take()
    }

    /// Open the session with the patient's chief complaint and issue the
    /// first follow-up question.
    pub async fn start(&mut self, raw_complaint: &str) -> Result<(), DialogueError> {
        if self.state.screen != Screen::Intake {
            return Err(self.reject(DialogueError::InvalidState(
                "session has already started".to_string(),
            )));
        }

        let complaint = raw_complaint.trim();
        if complaint.is_empty() {
            return Err(self.reject(DialogueError::Validation(EMPTY_COMPLAINT.to_string())));
        }

        self.state.complaint = complaint.to_string();
        self.state.transcript = vec![ConversationEntry::opening(complaint)];
        self.state.screen = Screen::Questioning;
        self.state.turn_count = 1;
        self.state.busy = true;
        self.state.last_error = None;
        self.state.notice = None;

        info!(session_id = %self.id, "triage session started");

        match self.ask(1).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e, FIRST_QUESTION_FAILED)),
        }
    }

    /// Re-issue the current turn's question after a failed generation left
    /// the session without a pending question.
    pub async fn retry_question(&mut self) -> Result<(), DialogueError> {
        if self.state.screen != Screen::Questioning || self.state.pending_index().is_some() {
            return Err(self.reject(DialogueError::InvalidState(
                "no failed question to retry".to_string(),
            )));
        }

        self.state.busy = true;
        self.state.last_error = None;

        let turn = self.state.turn_count;
        match self.ask(turn).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e, PROCESSING_FAILED)),
        }
    }

    /// Record the answer to the pending question, then either ask the next
    /// question or compile the note, per the sufficiency policy.
    ///
    /// On a model failure the answer is withdrawn and the session returns to
    /// its pre-call screen, so the same answer can be submitted again.
    pub async fn submit_answer(&mut self, raw_answer: &str) -> Result<(), DialogueError> {
        if self.state.screen != Screen::Questioning {
            return Err(self.reject(DialogueError::InvalidState(
                "session is not asking questions".to_string(),
            )));
        }

        let answer = raw_answer.trim();
        if answer.is_empty() {
            return Err(self.reject(DialogueError::Validation(EMPTY_ANSWER.to_string())));
        }

        let Some(index) = self.state.pending_index() else {
            return Err(self.reject(DialogueError::InvalidState(
                "no pending question".to_string(),
            )));
        };

        self.state.transcript[index].answer = answer.to_string();
        self.state.busy = true;
        self.state.last_error = None;

        match self.advance().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state.transcript[index].answer.clear();
                self.state.screen = Screen::Questioning;
                self.state.note = None;
                Err(self.fail(e, PROCESSING_FAILED))
            }
        }
    }

    /// Discard the session and return to `Intake`. Returns the notice to
    /// show the user.
    ///
    /// An in-flight submission keeps running; only the handle is dropped.
    pub fn reset(&mut self) -> &'static str {
        self.submission = None;
        self.state = SessionState::new(self.policy.max_turns());
        info!(session_id = %self.id, "triage session reset");
        RESET_NOTICE
    }

    async fn advance(&mut self) -> Result<(), DialogueError> {
        let turn = self.state.turn_count;

        if self.needs_more_questions(turn).await? {
            self.ask(turn + 1).await
        } else {
            self.compile_note().await
        }
    }

    async fn needs_more_questions(&self, turn: u32) -> Result<bool, DialogueError> {
        if self.policy.cap_reached(turn) {
            info!(session_id = %self.id, turn, "turn cap reached");
            return Ok(false);
        }

        if !self.policy.consults_model() {
            return Ok(true);
        }

        let prompt = build_continuation_prompt(&self.state.complaint, &self.state.transcript);
        let raw = self.generate(&prompt).await?;
        let decision = parse_decision(&raw, answered_follow_ups(&self.state.transcript));

        info!(
            session_id = %self.id,
            turn,
            needs_more_info = decision.needs_more_info,
            suggested_focus = decision.suggested_focus.as_deref().unwrap_or(""),
            "continuation decided"
        );

        Ok(decision.needs_more_info)
    }

    async fn ask(&mut self, turn: u32) -> Result<(), DialogueError> {
        let prompt = build_question_prompt(&self.state.complaint, &self.state.transcript, turn);
        let question = parse_question(&self.generate(&prompt).await?);

        if question.is_empty() {
            return Err(DialogueError::Generation(
                "model returned an empty question".to_string(),
            ));
        }

        self.state.transcript.push(ConversationEntry::pending(question));
        self.state.turn_count = turn;
        self.state.busy = false;

        info!(session_id = %self.id, turn, "follow-up question issued");
        Ok(())
    }

    async fn compile_note(&mut self) -> Result<(), DialogueError> {
        self.state.screen = Screen::Summary;
        self.state.busy = true;

        let prompt = build_note_prompt(&self.state.complaint, &self.state.transcript);
        let raw = self.generate(&prompt).await?;
        let note = parse_note(
            &raw,
            Some(NoteContext {
                complaint: &self.state.complaint,
                transcript: &self.state.transcript,
            }),
        );

        self.state.note = Some(note.clone());
        self.state.busy = false;
        self.state.notice = Some(COMPLETION_NOTICE.to_string());

        info!(session_id = %self.id, turns = self.state.turn_count, "note compiled");

        if let Some(submitter) = self.submitter.clone() {
            let request = SubmissionRequest {
                session_id: self.id,
                complaint: self.state.complaint.clone(),
                transcript: self.state.transcript.clone(),
                note,
            };
            self.submission = Some(tokio::spawn(async move { submitter.submit(request).await }));
        }

        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, DialogueError> {
        self.generator
            .generate(prompt)
            .await
            .map_err(|e| DialogueError::Generation(e.to_string()))
    }

    /// Record a rejected call. State is untouched apart from the message.
    fn reject(&mut self, error: DialogueError) -> DialogueError {
        self.state.last_error = Some(error.to_string());
        error
    }

    /// Record a failed model call: clear `busy` and surface `message`.
    fn fail(&mut self, error: DialogueError, message: &str) -> DialogueError {
        warn!(session_id = %self.id, error = %error, "dialogue step failed");
        self.state.busy = false;
        self.state.last_error = Some(message.to_string());
        error
    }
}
