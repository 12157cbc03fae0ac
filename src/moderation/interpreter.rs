//! Turns free-text moderation responses into verdicts.
//!
//! The moderation service is asked for a JSON object but frequently wraps it
//! in commentary, truncates it, or answers in prose. Interpretation therefore
//! tries the structured form first and falls back to keyword scanning. The
//! result is always fail-closed: approval has to be stated, and anything that
//! cannot be read as approval is a rejection.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::verdict::{Verdict, DEFAULT_APPROVAL_REASON, DEFAULT_REJECTION_REASON};

/// Greedy: first `{` through last `}`, across lines
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON object pattern is valid"));

/// Lowercase approval tokens in the service's working languages
const APPROVAL_TOKENS: [&str; 2] = ["одобрен", "approved"];

const NEGATIONS: [&str; 6] = ["not", "never", "no", "не", "ни", "нет"];

/// Interpret a raw moderation response.
///
/// Pure and deterministic; never panics on any input.
pub fn interpret_response(text: &str) -> Verdict {
    structured_verdict(text).unwrap_or_else(|| keyword_verdict(text))
}

fn structured_verdict(text: &str) -> Option<Verdict> {
    let candidate = JSON_OBJECT.find(text)?;
    let parsed: Value = serde_json::from_str(candidate.as_str()).ok()?;
    let object = parsed.as_object()?;

    // Only the literal boolean counts; "true", 1 and friends are rejections.
    let approved = matches!(object.get("approved"), Some(Value::Bool(true)));
    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(Verdict::new(approved, reason))
}

fn keyword_verdict(text: &str) -> Verdict {
    let lowered = text.to_lowercase();
    let mut affirmed = false;

    for token in APPROVAL_TOKENS {
        for (start, _) in lowered.match_indices(token) {
            let before = &lowered[..start];

            // Tail of a longer word such as "unapproved" or "неодобренный".
            if before.chars().next_back().is_some_and(char::is_alphanumeric) {
                continue;
            }

            // A key of a cut-off JSON answer only counts with a literal `true`.
            if let Some(value) = key_value(&lowered[start + token.len()..]) {
                if !is_literal_true(value) {
                    return Verdict::reject(DEFAULT_REJECTION_REASON);
                }
                affirmed = true;
                continue;
            }

            if negated(before) {
                return Verdict::reject(DEFAULT_REJECTION_REASON);
            }
            affirmed = true;
        }
    }

    if affirmed {
        Verdict::approve(DEFAULT_APPROVAL_REASON)
    } else {
        Verdict::reject(DEFAULT_REJECTION_REASON)
    }
}

/// The value following a token written as a quoted JSON key (`"approved": ...`)
fn key_value(after: &str) -> Option<&str> {
    let rest = after.strip_prefix('"')?.trim_start();
    Some(rest.strip_prefix(':')?.trim_start())
}

fn is_literal_true(value: &str) -> bool {
    value
        .strip_prefix("true")
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

/// True when any word of the current clause before the token is a negation
fn negated(before: &str) -> bool {
    let clause = before
        .rsplit(|c: char| matches!(c, '.' | '!' | '?' | ';' | ',' | '\n'))
        .next()
        .unwrap_or_default();

    clause
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .filter(|word| !word.is_empty())
        .any(|word| NEGATIONS.contains(&word) || word.ends_with("n't") || word.ends_with("n’t"))
}
