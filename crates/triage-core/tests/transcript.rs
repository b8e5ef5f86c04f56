use triage_core::models::conversation::{
    ConversationEntry, OPENING_QUESTION, answered_follow_ups, check_transcript,
};
use triage_core::models::note::{CompiledNote, NoteDraft};

fn note() -> CompiledNote {
    CompiledNote {
        subjective: "Headache for two days.".to_string(),
        objective: "n/a".to_string(),
        assessment: "Likely tension headache.".to_string(),
        plan: "Follow up with physician.".to_string(),
    }
}

#[test]
fn opening_entry_records_complaint_as_answer() {
    let entry = ConversationEntry::opening("headache");
    assert_eq!(entry.question, OPENING_QUESTION);
    assert_eq!(entry.answer, "headache");
    assert!(!entry.is_pending());
}

#[test]
fn pending_entry_has_empty_answer() {
    assert!(ConversationEntry::pending("How long?").is_pending());
}

#[test]
fn pending_entry_must_be_last() {
    let transcript = vec![
        ConversationEntry::opening("headache"),
        ConversationEntry::pending("How long?"),
        ConversationEntry {
            question: "Any nausea?".to_string(),
            answer: "No".to_string(),
        },
    ];
    assert!(check_transcript("headache", &transcript).is_err());
}

#[test]
fn trailing_pending_entry_is_valid() {
    let transcript = vec![
        ConversationEntry::opening("headache"),
        ConversationEntry::pending("How long?"),
    ];
    assert!(check_transcript("headache", &transcript).is_ok());
}

#[test]
fn opening_entry_must_match_complaint() {
    let transcript = vec![ConversationEntry::opening("headache")];
    assert!(check_transcript("back pain", &transcript).is_err());
    assert!(check_transcript("back pain", &[]).is_err());
}

#[test]
fn answered_follow_ups_skips_opening_and_pending() {
    let transcript = vec![
        ConversationEntry::opening("headache"),
        ConversationEntry {
            question: "How long?".to_string(),
            answer: "Two days".to_string(),
        },
        ConversationEntry::pending("Any nausea?"),
    ];
    assert_eq!(answered_follow_ups(&transcript), 1);
}

#[test]
fn draft_rejects_unanswered_entries() {
    let transcript = vec![
        ConversationEntry::opening("headache"),
        ConversationEntry::pending("How long?"),
    ];
    assert!(NoteDraft::new("user-1", "headache", transcript, note()).is_err());
    assert!(NoteDraft::new("user-1", "headache", Vec::new(), note()).is_err());
}

#[test]
fn draft_accepts_answered_transcript() {
    let transcript = vec![ConversationEntry::opening("headache")];
    let draft = NoteDraft::new("user-1", "headache", transcript, note()).unwrap();
    assert_eq!(draft.user_id, "user-1");
    assert_eq!(draft.initial_complaint, "headache");
}
