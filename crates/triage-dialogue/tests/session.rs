use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use triage_bedrock::error::BedrockError;
use triage_bedrock::generator::{BoxFuture, TextGenerator};
use triage_core::models::conversation::check_transcript;
use triage_core::models::note::OBJECTIVE_DISCLAIMER;
use triage_dialogue::error::DialogueError;
use triage_dialogue::policy::SufficiencyPolicy;
use triage_dialogue::session::{
    COMPLETION_NOTICE, EMPTY_ANSWER, EMPTY_COMPLAINT, FIRST_QUESTION_FAILED, PROCESSING_FAILED,
    RESET_NOTICE, Screen, SessionState, TriageSession,
};

/// Replays canned replies in order and records every prompt it was given.
#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<Result<String, BedrockError>>>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(replies: &[&str]) -> Arc<Self> {
        let scripted = Self::default();
        for reply in replies {
            scripted.push_ok(reply);
        }
        Arc::new(scripted)
    }

    fn push_ok(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    fn push_err(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(BedrockError::Invocation("throttled".to_string())));
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for Scripted {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BedrockError>> {
        Box::pin(async move {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BedrockError::Invocation("script exhausted".to_string())))
        })
    }
}

const NOTE_JSON: &str = r#"{"subjective":"Headache for two days.","objective":"ignored","assessment":"Likely tension headache.","plan":"See a physician."}"#;

fn session(policy: SufficiencyPolicy, generator: &Arc<Scripted>) -> TriageSession {
    TriageSession::new(policy, generator.clone())
}

fn assert_invariants(session: &TriageSession) {
    let state = session.state();
    if state.screen != Screen::Intake {
        check_transcript(&state.complaint, &state.transcript).unwrap();
    }
    let follow_ups = state.transcript.len().saturating_sub(1) as u32;
    if let Some(max) = state.max_turns {
        assert!(follow_ups <= max, "{follow_ups} follow-ups exceed cap {max}");
    }
    if state.screen == Screen::Summary {
        assert!(state.transcript.iter().all(|entry| !entry.is_pending()));
    }
}

#[tokio::test]
async fn fixed_policy_asks_exactly_max_turns() {
    let generator = Scripted::new(&["Where does it hurt?", "How long?", "Any fever?", NOTE_JSON]);
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 3 }, &generator);

    s.start("headache").await.unwrap();
    assert_invariants(&s);
    assert_eq!(s.pending_question(), Some("Where does it hurt?"));

    s.submit_answer("front of my head").await.unwrap();
    assert_invariants(&s);
    s.submit_answer("two days").await.unwrap();
    assert_invariants(&s);
    assert_eq!(s.state().screen, Screen::Questioning);
    assert_eq!(s.state().turn_count, 3);

    s.submit_answer("no").await.unwrap();
    assert_invariants(&s);

    let state = s.state();
    assert_eq!(state.screen, Screen::Summary);
    assert_eq!(state.transcript.len(), 4);
    assert!(!state.busy);
    assert_eq!(state.notice.as_deref(), Some(COMPLETION_NOTICE));

    let note = state.note.as_ref().unwrap();
    assert_eq!(note.assessment, "Likely tension headache.");

    // Fixed policy never asks for a continuation decision.
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts.iter().all(|p| !p.contains("needsMoreInfo")));
}

#[tokio::test]
async fn dynamic_policy_stops_when_model_says_enough() {
    let generator = Scripted::new(&[
        "Q1?",
        r#"{"needsMoreInfo": true, "reasoning": "onset unclear", "suggestedFocus": "onset"}"#,
        "Q2?",
        r#"{"needsMoreInfo": false, "reasoning": "enough"}"#,
        NOTE_JSON,
    ]);
    let mut s = session(SufficiencyPolicy::default(), &generator);

    s.start("headache").await.unwrap();
    s.submit_answer("a1").await.unwrap();
    assert_eq!(s.pending_question(), Some("Q2?"));
    assert_invariants(&s);

    s.submit_answer("a2").await.unwrap();
    assert_invariants(&s);

    let state = s.state();
    assert_eq!(state.screen, Screen::Summary);
    assert_eq!(state.transcript.len(), 3);
    assert!(state.note.is_some());

    let prompts = generator.prompts();
    assert!(prompts[1].contains("Question 1: Q1?\nPatient Response: a1"));
    assert!(prompts[2].contains("follow-up question number 2"));
}

#[tokio::test]
async fn hard_cap_wins_over_model_decision() {
    let generator = Scripted::new(&[
        "Q1?",
        r#"{"needsMoreInfo": true, "reasoning": "more"}"#,
        "Q2?",
        NOTE_JSON,
    ]);
    let mut s = session(SufficiencyPolicy::Dynamic { hard_cap: Some(2) }, &generator);

    s.start("cough").await.unwrap();
    s.submit_answer("a1").await.unwrap();
    s.submit_answer("a2").await.unwrap();
    assert_invariants(&s);

    assert_eq!(s.state().screen, Screen::Summary);
    assert_eq!(s.state().transcript.len(), 3);
    // The capped turn skipped the continuation call.
    assert_eq!(generator.prompts().len(), 4);
}

#[tokio::test]
async fn undecodable_decision_falls_back_on_answer_count() {
    let generator = Scripted::new(&[
        "Q1?", "not json", "Q2?", "???", "Q3?", "nope", "Q4?", "still not json", NOTE_JSON,
    ]);
    let mut s = session(SufficiencyPolicy::default(), &generator);

    s.start("rash").await.unwrap();
    for answer in ["a1", "a2", "a3"] {
        s.submit_answer(answer).await.unwrap();
        assert_eq!(s.state().screen, Screen::Questioning);
    }
    s.submit_answer("a4").await.unwrap();
    assert_eq!(s.state().screen, Screen::Summary);
    assert_eq!(s.state().transcript.len(), 5);
}

#[tokio::test]
async fn empty_inputs_are_rejected_without_state_change() {
    let generator = Scripted::new(&["Q1?"]);
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 3 }, &generator);

    let err = s.start("   ").await.unwrap_err();
    assert_eq!(err, DialogueError::Validation(EMPTY_COMPLAINT.to_string()));
    assert_eq!(s.state().screen, Screen::Intake);
    assert!(s.state().transcript.is_empty());
    assert_eq!(s.state().last_error.as_deref(), Some(EMPTY_COMPLAINT));

    s.start("sore throat").await.unwrap();
    let before = s.state().transcript.clone();

    let err = s.submit_answer("\n\t ").await.unwrap_err();
    assert_eq!(err, DialogueError::Validation(EMPTY_ANSWER.to_string()));
    assert_eq!(s.state().transcript, before);
    assert_eq!(s.state().turn_count, 1);
    assert_eq!(generator.prompts().len(), 1);
}

#[tokio::test]
async fn inputs_are_trimmed() {
    let generator = Scripted::new(&["  Q1?\n", NOTE_JSON]);
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 1 }, &generator);

    s.start("  chest tightness  ").await.unwrap();
    assert_eq!(s.state().complaint, "chest tightness");
    assert_eq!(s.pending_question(), Some("Q1?"));

    s.submit_answer("  since morning ").await.unwrap();
    assert_eq!(s.state().transcript[1].answer, "since morning");
}

#[tokio::test]
async fn first_question_failure_can_be_retried() {
    let generator = Scripted::new(&[]);
    generator.push_err();
    generator.push_ok("Q1?");
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 2 }, &generator);

    let err = s.start("dizzy").await.unwrap_err();
    assert!(matches!(err, DialogueError::Generation(_)));
    assert_eq!(s.state().screen, Screen::Questioning);
    assert_eq!(s.state().transcript.len(), 1);
    assert_eq!(s.pending_question(), None);
    assert!(!s.state().busy);
    assert_eq!(s.state().last_error.as_deref(), Some(FIRST_QUESTION_FAILED));
    assert_invariants(&s);

    // Nothing to answer yet.
    let err = s.submit_answer("hello").await.unwrap_err();
    assert!(matches!(err, DialogueError::InvalidState(_)));

    s.retry_question().await.unwrap();
    assert_eq!(s.pending_question(), Some("Q1?"));
    assert_eq!(s.state().last_error, None);
    assert_invariants(&s);
}

#[tokio::test]
async fn empty_question_is_a_generation_failure() {
    let generator = Scripted::new(&["   "]);
    let mut s = session(SufficiencyPolicy::default(), &generator);

    let err = s.start("nausea").await.unwrap_err();
    assert!(matches!(err, DialogueError::Generation(_)));
    assert_eq!(s.pending_question(), None);
}

#[tokio::test]
async fn answer_failure_restores_pending_question() {
    let generator = Scripted::new(&["Q1?"]);
    generator.push_err();
    generator.push_ok(r#"{"needsMoreInfo": true}"#);
    generator.push_ok("Q2?");
    let mut s = session(SufficiencyPolicy::default(), &generator);

    s.start("back pain").await.unwrap();
    let err = s.submit_answer("lower back").await.unwrap_err();
    assert!(matches!(err, DialogueError::Generation(_)));

    let state = s.state();
    assert_eq!(state.screen, Screen::Questioning);
    assert_eq!(s.pending_question(), Some("Q1?"));
    assert_eq!(state.turn_count, 1);
    assert!(!state.busy);
    assert_eq!(state.last_error.as_deref(), Some(PROCESSING_FAILED));
    assert_invariants(&s);

    s.submit_answer("lower back").await.unwrap();
    assert_eq!(s.pending_question(), Some("Q2?"));
    assert_eq!(s.state().turn_count, 2);
}

#[tokio::test]
async fn note_failure_returns_to_questioning() {
    let generator = Scripted::new(&["Q1?"]);
    generator.push_err();
    generator.push_ok(NOTE_JSON);
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 1 }, &generator);

    s.start("fatigue").await.unwrap();
    s.submit_answer("a week").await.unwrap_err();

    assert_eq!(s.state().screen, Screen::Questioning);
    assert_eq!(s.state().note, None);
    assert_eq!(s.pending_question(), Some("Q1?"));
    assert_invariants(&s);

    s.submit_answer("a week").await.unwrap();
    assert_eq!(s.state().screen, Screen::Summary);
}

#[tokio::test]
async fn prose_note_is_scanned_into_sections() {
    let generator = Scripted::new(&[
        "Q1?",
        "SUBJECTIVE: Cough for a week.\nASSESSMENT: Viral bronchitis likely.\nPLAN: Rest and fluids.",
    ]);
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 1 }, &generator);

    s.start("cough").await.unwrap();
    s.submit_answer("dry").await.unwrap();

    let note = s.state().note.clone().unwrap();
    assert_eq!(note.subjective, "Cough for a week.");
    assert_eq!(note.objective, OBJECTIVE_DISCLAIMER);
    assert_eq!(note.plan, "Rest and fluids.");
}

#[tokio::test]
async fn summary_is_terminal() {
    let generator = Scripted::new(&["Q1?", NOTE_JSON]);
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 1 }, &generator);

    s.start("earache").await.unwrap();
    s.submit_answer("left ear").await.unwrap();

    let err = s.submit_answer("more").await.unwrap_err();
    assert!(matches!(err, DialogueError::InvalidState(_)));
    let err = s.start("again").await.unwrap_err();
    assert!(matches!(err, DialogueError::InvalidState(_)));
    assert_eq!(s.state().screen, Screen::Summary);
}

#[tokio::test]
async fn reset_matches_a_fresh_session() {
    let policy = SufficiencyPolicy::Fixed { max_turns: 1 };
    let generator = Scripted::new(&["Q1?", NOTE_JSON]);
    let mut s = session(policy, &generator);

    s.start("toothache").await.unwrap();
    s.submit_answer("molar").await.unwrap();
    assert_eq!(s.state().screen, Screen::Summary);

    let id = s.id();
    assert_eq!(s.reset(), RESET_NOTICE);
    assert_eq!(s.state(), &SessionState::new(Some(1)));
    assert_eq!(s.id(), id);
    assert!(s.take_submission().is_none());
}

#[tokio::test]
async fn progress_and_answered_view() {
    let generator = Scripted::new(&["Q1?", "Q2?"]);
    let mut s = session(SufficiencyPolicy::Fixed { max_turns: 4 }, &generator);

    s.start("sprained ankle").await.unwrap();
    let progress = s.progress();
    assert_eq!((progress.question_number, progress.max_questions, progress.percent), (1, 4, 25));

    s.submit_answer("yesterday").await.unwrap();
    assert_eq!(s.progress().percent, 50);

    let answered = s.answered_transcript();
    assert_eq!(answered.len(), 2);
    assert_eq!(answered[1].answer, "yesterday");
}

#[tokio::test]
async fn uncapped_progress_uses_nominal_denominator_and_clamps() {
    let generator = Scripted::new(&[
        "Q1?",
        r#"{"needsMoreInfo": true}"#,
        "Q2?",
        r#"{"needsMoreInfo": true}"#,
        "Q3?",
        r#"{"needsMoreInfo": true}"#,
        "Q4?",
        r#"{"needsMoreInfo": true}"#,
        "Q5?",
    ]);
    let mut s = session(SufficiencyPolicy::default(), &generator);

    s.start("insomnia").await.unwrap();
    for answer in ["a1", "a2", "a3", "a4"] {
        s.submit_answer(answer).await.unwrap();
    }

    let progress = s.progress();
    assert_eq!(progress.question_number, 5);
    assert_eq!(progress.max_questions, 4);
    assert_eq!(progress.percent, 100);
}

#[test]
fn state_serializes_for_the_presentation_layer() {
    let value = serde_json::to_value(SessionState::new(Some(3))).unwrap();
    assert_eq!(value["screen"], "intake");
    assert_eq!(value["turn_count"], 1);
    assert_eq!(value["max_turns"], 3);
    assert_eq!(value["busy"], false);

    let policy = serde_json::to_value(SufficiencyPolicy::Fixed { max_turns: 3 }).unwrap();
    assert_eq!(policy, serde_json::json!({"type": "fixed", "max_turns": 3}));
}
