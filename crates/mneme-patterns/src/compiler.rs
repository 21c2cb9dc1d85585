//! Template → regex compilation.
//!
//! Literal text matches case-insensitively with flexible whitespace. Each
//! `{slot}` becomes a named group using the capture rule for its type;
//! optional slots (and the whitespace before them) are wrapped in an
//! optional group. `{{` and `}}` are literal braces.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use regex::Regex;

use mneme_core::errors::{MnemeResult, PatternError};
use mneme_core::models::{MatchSpan, PatternTemplate, SlotDefinition, SlotType};

use crate::normalize;

const TEXT_RULE: &str = r"[\w'-]+(?:\s+[\w'-]+)*";
const ENTITY_RULE: &str = r"[A-Z][\w'-]*(?:\s+[A-Z][\w'-]*)*";
const NUMBER_RULE: &str = r"[-+]?\d+(?:\.\d+)?";
const ANY_RULE: &str = r".+";
const DATE_RULE: &str = concat!(
    r"(?i:\d{4}-\d{1,2}-\d{1,2}",
    r"|\d{1,2}/\d{1,2}/\d{4}",
    r"|(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?",
    r"|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}",
    r"|today|tomorrow|yesterday)"
);

/// Capture rule for a slot type.
pub fn capture_rule(slot_type: SlotType) -> &'static str {
    match slot_type {
        SlotType::Text => TEXT_RULE,
        SlotType::Entity => ENTITY_RULE,
        SlotType::Date => DATE_RULE,
        SlotType::Number => NUMBER_RULE,
        SlotType::Any => ANY_RULE,
    }
}

/// A piece of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Slot(String),
}

/// Split a pattern into literal and placeholder segments.
pub fn parse_segments(name: &str, pattern: &str) -> MnemeResult<Vec<Segment>> {
    let invalid = |reason: String| PatternError::InvalidTemplate {
        name: name.to_string(),
        reason,
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut slot = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(invalid("unclosed placeholder".to_string()).into())
                        }
                        Some(ch) => slot.push(ch),
                    }
                }
                let slot = slot.trim().to_string();
                if !is_valid_slot_name(&slot) {
                    return Err(invalid(format!("invalid slot name {slot:?}")).into());
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(slot));
            }
            '}' => return Err(invalid("unmatched '}'".to_string()).into()),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_valid_slot_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check that a template is well formed: non-empty name and pattern, every
/// placeholder declared exactly once, every declared slot used exactly once.
pub fn validate(template: &PatternTemplate) -> MnemeResult<Vec<Segment>> {
    let invalid = |reason: &str| -> mneme_core::errors::MnemeError {
        PatternError::InvalidTemplate {
            name: template.name.clone(),
            reason: reason.to_string(),
        }
        .into()
    };

    if template.name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if template.pattern.trim().is_empty() {
        return Err(invalid("pattern is empty"));
    }

    let segments = parse_segments(&template.name, &template.pattern)?;

    let mut declared = HashSet::new();
    for slot in &template.slots {
        if !declared.insert(slot.name.as_str()) {
            return Err(invalid(&format!("slot {} declared twice", slot.name)));
        }
    }

    let mut used = HashSet::new();
    for segment in &segments {
        if let Segment::Slot(name) = segment {
            if !declared.contains(name.as_str()) {
                return Err(invalid(&format!("placeholder {{{name}}} has no slot definition")));
            }
            if !used.insert(name.as_str()) {
                return Err(invalid(&format!("placeholder {{{name}}} appears twice")));
            }
        }
    }
    if let Some(unused) = template.slots.iter().find(|s| !used.contains(s.name.as_str())) {
        return Err(invalid(&format!("slot {} is not used in the pattern", unused.name)));
    }

    let has_anchor = segments.iter().any(|s| match s {
        Segment::Literal(text) => !text.trim().is_empty(),
        Segment::Slot(name) => template.slot(name).is_some_and(|d| d.required),
    });
    if !has_anchor {
        return Err(invalid("pattern needs literal text or a required slot"));
    }
    Ok(segments)
}

/// A template ready to run.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub template_id: String,
    pub template_name: String,
    pub priority: i64,
    slots: Vec<SlotDefinition>,
    regex: Regex,
}

/// Span and normalized bindings of one validated occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    pub span: MatchSpan,
    pub bindings: BTreeMap<String, String>,
}

impl CompiledTemplate {
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// First occurrence in `text` whose captures all normalize. Optional
    /// slots that fail normalization are left unbound.
    pub fn find(&self, text: &str, today: NaiveDate) -> Option<RawMatch> {
        self.regex.captures_iter(text).find_map(|caps| {
            let whole = caps.get(0)?;
            if whole.as_str().trim().is_empty() {
                return None;
            }
            let mut bindings = BTreeMap::new();
            for slot in &self.slots {
                let value = caps
                    .name(&slot.name)
                    .and_then(|m| normalize::normalize(slot.slot_type, m.as_str(), today));
                match value {
                    Some(v) => {
                        bindings.insert(slot.name.clone(), v);
                    }
                    None if slot.required => return None,
                    None => {}
                }
            }
            Some(RawMatch {
                span: MatchSpan {
                    start: whole.start(),
                    end: whole.end(),
                    text: whole.as_str().to_string(),
                },
                bindings,
            })
        })
    }
}

/// Validate and compile a template.
pub fn compile(template: &PatternTemplate) -> MnemeResult<CompiledTemplate> {
    let segments = validate(template)?;

    let mut source = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(text) => {
                // Whitespace leading into an optional slot belongs to its group.
                let next_is_optional = matches!(
                    segments.get(i + 1),
                    Some(Segment::Slot(name)) if template.slot(name).is_some_and(|d| !d.required)
                );
                let text = if next_is_optional { text.trim_end() } else { text.as_str() };
                source.push_str(&literal_rule(text));
            }
            Segment::Slot(name) => {
                let Some(def) = template.slot(name) else {
                    continue;
                };
                let rule = capture_rule(def.slot_type);
                if def.required {
                    source.push_str(&format!("(?P<{name}>{rule})"));
                } else {
                    let lead = match segments.get(i.wrapping_sub(1)) {
                        Some(Segment::Literal(prev)) if prev.ends_with(char::is_whitespace) => r"\s+",
                        Some(Segment::Slot(_)) => r"\s+",
                        _ => "",
                    };
                    source.push_str(&format!("(?:{lead}(?P<{name}>{rule}))?"));
                }
            }
        }
    }

    let regex = Regex::new(&source).map_err(|e| PatternError::CompileFailed {
        name: template.name.clone(),
        reason: e.to_string(),
    })?;

    Ok(CompiledTemplate {
        template_id: template.id.clone(),
        template_name: template.name.clone(),
        priority: template.priority,
        slots: template.slots.clone(),
        regex,
    })
}

/// Escaped, case-insensitive literal with runs of whitespace matching `\s+`.
fn literal_rule(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::from("(?i:");
    if text.starts_with(char::is_whitespace) {
        out.push_str(r"\s+");
    }
    let words: Vec<String> = text.split_whitespace().map(regex::escape).collect();
    out.push_str(&words.join(r"\s+"));
    if text.ends_with(char::is_whitespace) && !words.is_empty() {
        out.push_str(r"\s+");
    }
    out.push(')');
    out
}
