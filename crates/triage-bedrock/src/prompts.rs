//! Prompt rendering for the three model calls the dialogue makes.
//!
//! All three prompts embed the same transcript block (see
//! [`transcript_block`]); the instruction text around it is specific to each
//! purpose and never repeated between them.

use triage_core::models::conversation::ConversationEntry;
use triage_core::models::note::OBJECTIVE_DISCLAIMER;

/// Render the answered part of a transcript as a labeled block.
///
/// Entry 0 is labeled as the chief complaint, entry `i` as `Question i`.
/// Entries without an answer are left out; labels keep the entry's
/// position so numbering never shifts.
pub fn transcript_block(transcript: &[ConversationEntry]) -> String {
    transcript
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.is_pending())
        .map(|(index, entry)| {
            let label = if index == 0 {
                "Chief Complaint".to_string()
            } else {
                format!("Question {index}")
            };
            format!(
                "{label}: {}\nPatient Response: {}",
                entry.question, entry.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Ask for exactly one follow-up question.
pub fn build_question_prompt(
    complaint: &str,
    transcript: &[ConversationEntry],
    turn_number: u32,
) -> String {
    format!(
        "You are a medical AI assistant interviewing a patient before they see a clinician.\n\
         The patient came in reporting: {complaint}\n\
         \n\
         Interview so far:\n\
         {transcript}\n\
         \n\
         Write follow-up question number {turn_number}. It must:\n\
         1. Target clinical details that matter for this complaint\n\
         2. Help gauge severity, timing, or accompanying symptoms\n\
         3. Be easy for a patient without medical training to answer\n\
         4. Not ask about anything the patient has already told you\n\
         \n\
         Reply with the single question only. No numbering, quotes, preamble, or markdown.",
        transcript = transcript_block(transcript),
    )
}

/// Ask whether the interview has gathered enough to write a note.
pub fn build_continuation_prompt(complaint: &str, transcript: &[ConversationEntry]) -> String {
    format!(
        "Act as a triage reviewer deciding whether an intake interview can stop.\n\
         Presenting concern under review: {complaint}\n\
         \n\
         Interview transcript:\n\
         {transcript}\n\
         \n\
         Judge the transcript against these criteria:\n\
         - Symptom characterization: onset, duration, severity, quality\n\
         - Associated symptoms and red-flag symptoms\n\
         - Relevant medical history\n\
         - Factors that make it better or worse\n\
         \n\
         If any criterion is still unclear, more information is needed.\n\
         Respond with one JSON object and nothing else, shaped as\n\
         {{\"needsMoreInfo\": true or false, \"reasoning\": \"short explanation\", \
         \"suggestedFocus\": \"what to ask about next\"}}\n\
         Do not put the object inside code fences.",
        transcript = transcript_block(transcript),
    )
}

/// Ask for the four-section note.
///
/// The Objective section is fixed text; the prompt spells it out so the
/// reply parser's default always agrees with what the model was told.
pub fn build_note_prompt(complaint: &str, transcript: &[ConversationEntry]) -> String {
    format!(
        "You are a medical AI assistant writing up a completed intake interview as a SOAP note.\n\
         Encounter reason: {complaint}\n\
         \n\
         Patient Interview:\n\
         {transcript}\n\
         \n\
         Sections to produce:\n\
         \n\
         SUBJECTIVE: The chief complaint and symptoms in the patient's own words, \
         covering onset, duration, severity, quality, and associated symptoms where reported.\n\
         \n\
         OBJECTIVE: Use exactly this sentence and nothing else: \"{OBJECTIVE_DISCLAIMER}\"\n\
         \n\
         ASSESSMENT: A preliminary impression with possible differential diagnoses, \
         stated plainly as a preliminary AI assessment and not a medical diagnosis.\n\
         \n\
         PLAN: Next steps, including physician evaluation and any urgent care considerations.\n\
         \n\
         Return raw JSON with the string keys \"subjective\", \"objective\", \"assessment\", \
         and \"plan\". No markdown wrapping.",
        transcript = transcript_block(transcript),
    )
}
