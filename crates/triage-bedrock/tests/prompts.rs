use std::collections::HashSet;

use triage_bedrock::prompts::{
    build_continuation_prompt, build_note_prompt, build_question_prompt, transcript_block,
};
use triage_core::models::conversation::ConversationEntry;
use triage_core::models::note::OBJECTIVE_DISCLAIMER;

fn answered(question: &str, answer: &str) -> ConversationEntry {
    ConversationEntry {
        question: question.to_string(),
        answer: answer.to_string(),
    }
}

fn transcript() -> Vec<ConversationEntry> {
    vec![
        ConversationEntry::opening("sore throat"),
        answered("How long has it hurt?", "Three days"),
        answered("Any fever?", "Low grade, 37.9"),
        ConversationEntry::pending("Any trouble swallowing?"),
    ]
}

#[test]
fn transcript_block_labels_complaint_and_questions() {
    let block = transcript_block(&transcript());
    assert!(block.starts_with("Chief Complaint: What brings you here today?\nPatient Response: sore throat"));
    assert!(block.contains("Question 1: How long has it hurt?\nPatient Response: Three days"));
    assert!(block.contains("Question 2: Any fever?\nPatient Response: Low grade, 37.9"));
}

#[test]
fn transcript_block_omits_pending_entry() {
    let block = transcript_block(&transcript());
    assert!(!block.contains("Any trouble swallowing?"));
    assert!(!block.contains("Question 3"));
}

#[test]
fn empty_transcript_renders_empty_block() {
    assert_eq!(transcript_block(&[]), "");
}

#[test]
fn question_prompt_carries_turn_number_and_history() {
    let prompt = build_question_prompt("sore throat", &transcript(), 3);
    assert!(prompt.contains("follow-up question number 3"));
    assert!(prompt.contains("sore throat"));
    assert!(prompt.contains("Question 2: Any fever?"));
}

#[test]
fn continuation_prompt_names_criteria_and_keys() {
    let prompt = build_continuation_prompt("sore throat", &transcript());
    for needle in ["onset", "duration", "severity", "quality", "red-flag", "history"] {
        assert!(prompt.contains(needle), "missing {needle}");
    }
    assert!(prompt.contains("\"needsMoreInfo\""));
    assert!(prompt.contains("\"suggestedFocus\""));
}

#[test]
fn note_prompt_spells_out_objective_text() {
    let prompt = build_note_prompt("sore throat", &transcript());
    assert!(prompt.contains(OBJECTIVE_DISCLAIMER));
    for key in ["\"subjective\"", "\"objective\"", "\"assessment\"", "\"plan\""] {
        assert!(prompt.contains(key), "missing {key}");
    }
}

#[test]
fn prompts_share_only_the_transcript_block() {
    let entries = transcript();
    let block = transcript_block(&entries);
    let block_lines: HashSet<&str> = block.lines().collect();

    let prompts = [
        build_question_prompt("sore throat", &entries, 3),
        build_continuation_prompt("sore throat", &entries),
        build_note_prompt("sore throat", &entries),
    ];

    let instruction_lines: Vec<HashSet<&str>> = prompts
        .iter()
        .map(|prompt| {
            prompt
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !block_lines.contains(line))
                .collect()
        })
        .collect();

    for (i, a) in instruction_lines.iter().enumerate() {
        for b in instruction_lines.iter().skip(i + 1) {
            let shared: Vec<_> = a.intersection(b).collect();
            assert!(shared.is_empty(), "instruction lines repeated: {shared:?}");
        }
    }
}
