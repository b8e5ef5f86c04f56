//! Parsing of model replies into typed results.
//!
//! Model output is untrusted. Every function here is total: malformed input
//! resolves to a deterministic fallback value rather than an error, and the
//! fallback is logged so degraded results stay visible.

use serde_json::{Map, Value};
use tracing::warn;

use triage_core::models::conversation::ConversationEntry;
use triage_core::models::decision::ContinuationDecision;
use triage_core::models::note::{CompiledNote, OBJECTIVE_DISCLAIMER, PLAN_FALLBACK};

const FENCE: &str = "```";

/// Session data used to fill sections the model's reply left empty.
#[derive(Debug, Clone, Copy)]
pub struct NoteContext<'a> {
    pub complaint: &'a str,
    pub transcript: &'a [ConversationEntry],
}

/// The reply to a question prompt is the question itself.
pub fn parse_question(raw: &str) -> String {
    raw.trim().to_string()
}

/// Strip a surrounding markdown code fence, with or without a language tag.
///
/// Text without a fence is returned trimmed and otherwise unchanged.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(after) = body.strip_prefix(FENCE) {
        body = match after.find('\n') {
            Some(pos) => &after[pos + 1..],
            // Single-line fence: drop the language tag, if any.
            None => after.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    if let Some(before) = body.trim_end().strip_suffix(FENCE) {
        body = before;
    }

    body.trim()
}

/// Decode a continuation decision.
///
/// Falls back to [`ContinuationDecision::fallback`] when the reply is not a
/// decision object or lacks `needsMoreInfo`.
pub fn parse_decision(raw: &str, answered_follow_ups: usize) -> ContinuationDecision {
    let decoded = json_object(strip_code_fence(raw)).and_then(|map| {
        serde_json::from_value::<ContinuationDecision>(Value::Object(map)).map_err(|e| e.to_string())
    });

    match decoded {
        Ok(decision) => decision,
        Err(e) => {
            warn!(error = %e, answered_follow_ups, "continuation decision did not decode, using fallback");
            ContinuationDecision::fallback(answered_follow_ups)
        }
    }
}

/// Decode `body` as a JSON object. Arrays and scalars are rejected.
fn json_object(body: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Default)]
struct RawNote {
    subjective: Option<String>,
    objective: Option<String>,
    assessment: Option<String>,
    plan: Option<String>,
}

impl RawNote {
    /// Take each section independently; a section of the wrong type is
    /// treated as missing without affecting the others.
    fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            subjective: section_text(map, "subjective"),
            objective: section_text(map, "objective"),
            assessment: section_text(map, "assessment"),
            plan: section_text(map, "plan"),
        }
    }
}

/// A string section, or a list of strings joined one per line.
fn section_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => items
            .iter()
            .map(Value::as_str)
            .collect::<Option<Vec<_>>>()
            .map(|lines| lines.join("\n")),
        other => {
            warn!(section = key, kind = json_kind(other), "note section has an unusable type");
            None
        }
    }
}

/// Decode a compiled note.
///
/// Tries a JSON object first, taking each section on its own, then a
/// line-oriented section scan. Sections still empty afterwards get
/// defaults: Objective is always the fixed disclaimer; with `context`,
/// Subjective is rebuilt from the complaint and answers and Plan recommends
/// physician evaluation; otherwise they stay empty.
pub fn parse_note(raw: &str, context: Option<NoteContext<'_>>) -> CompiledNote {
    let body = strip_code_fence(raw);

    let sections = match json_object(body) {
        Ok(map) => RawNote::from_object(&map),
        Err(e) => {
            warn!(error = %e, "note did not decode as JSON, scanning sections");
            scan_sections(body)
        }
    };

    let subjective = non_empty(sections.subjective)
        .or_else(|| context.map(subjective_from_context))
        .unwrap_or_default();
    let objective =
        non_empty(sections.objective).unwrap_or_else(|| OBJECTIVE_DISCLAIMER.to_string());
    let assessment = non_empty(sections.assessment).unwrap_or_default();
    let plan = non_empty(sections.plan)
        .or_else(|| context.map(|_| PLAN_FALLBACK.to_string()))
        .unwrap_or_default();

    CompiledNote {
        subjective,
        objective,
        assessment,
        plan,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn subjective_from_context(context: NoteContext<'_>) -> String {
    std::iter::once(context.complaint)
        .chain(
            context
                .transcript
                .iter()
                .skip(1)
                .filter(|entry| !entry.is_pending())
                .map(|entry| entry.answer.as_str()),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Subjective,
    Objective,
    Assessment,
    Plan,
}

impl Section {
    const ALL: [(Section, &'static str); 4] = [
        (Section::Subjective, "subjective"),
        (Section::Objective, "objective"),
        (Section::Assessment, "assessment"),
        (Section::Plan, "plan"),
    ];

    /// Match a line that opens a section, returning the section and the
    /// text after its keyword and optional colon.
    fn opening(line: &str) -> Option<(Section, &str)> {
        Self::ALL.iter().find_map(|(section, keyword)| {
            let head = line.get(..keyword.len())?;
            if !head.eq_ignore_ascii_case(keyword) {
                return None;
            }
            let rest = &line[keyword.len()..];
            // "Planned ..." is prose, not a PLAN heading.
            if rest.starts_with(|c: char| c.is_alphanumeric()) {
                return None;
            }
            let rest = rest.trim_start();
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            Some((*section, rest.trim_start()))
        })
    }
}

fn scan_sections(body: &str) -> RawNote {
    let mut note = RawNote::default();
    let mut current: Option<(Section, Vec<&str>)> = None;

    for line in body.lines() {
        if let Some((section, rest)) = Section::opening(line.trim_start()) {
            if let Some((done, lines)) = current.take() {
                assign(&mut note, done, &lines);
            }
            current = Some((section, vec![rest]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((done, lines)) = current {
        assign(&mut note, done, &lines);
    }

    note
}

fn assign(note: &mut RawNote, section: Section, lines: &[&str]) {
    let text = lines.join("\n").trim().to_string();
    let slot = match section {
        Section::Subjective => &mut note.subjective,
        Section::Objective => &mut note.objective,
        Section::Assessment => &mut note.assessment,
        Section::Plan => &mut note.plan,
    };
    *slot = Some(text);
}
