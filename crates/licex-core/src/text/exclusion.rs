//! Exclusion-rule application.

use std::collections::HashMap;
use std::sync::RwLock;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{trace, warn};

use crate::models::document::DocumentLine;
use crate::models::label::RemoveRule;

/// Outcome of running a label's exclusion rules over a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    /// Remaining text; `None` when a whole-line rule fired.
    pub text: Option<String>,
    /// Rules that actually matched, in rule order.
    pub fired: Vec<RemoveRule>,
}

lazy_static! {
    /// Compiled rules keyed by their final pattern; rules are shared by every
    /// document of a run.
    static ref COMPILED: RwLock<HashMap<String, Regex>> = RwLock::new(HashMap::new());
}

fn rule_pattern(rule: &RemoveRule) -> String {
    let body = if rule.is_regex {
        format!("(?:{})", rule.pattern)
    } else {
        format!("(?i){}", regex::escape(&rule.pattern))
    };
    if rule.must_be_line_start {
        format!(r"^\s*{}", body)
    } else {
        body
    }
}

/// The regex a rule runs as, compiled once per distinct pattern.
pub fn compile_rule(rule: &RemoveRule) -> Result<Regex, regex::Error> {
    let pattern = rule_pattern(rule);
    if let Some(re) = COMPILED.read().ok().and_then(|cache| cache.get(&pattern).cloned()) {
        return Ok(re);
    }
    let re = Regex::new(&pattern)?;
    if let Ok(mut cache) = COMPILED.write() {
        cache.insert(pattern, re.clone());
    }
    Ok(re)
}

/// Apply rules in order, removing matched text or dropping the line.
pub fn apply_removals(text: &str, rules: &[RemoveRule]) -> Exclusion {
    let mut current = text.to_string();
    let mut fired = Vec::new();

    for rule in rules {
        if rule.pattern.is_empty() {
            continue;
        }
        let re = match compile_rule(rule) {
            Ok(re) => re,
            Err(e) => {
                // unreachable for specifications accepted by LabelSpec::validate
                warn!("exclusion '{}' does not compile: {}", rule.pattern, e);
                continue;
            }
        };
        if !re.is_match(&current) {
            continue;
        }

        trace!("exclusion '{}' fired on '{}'", rule.pattern, current);
        fired.push(rule.clone());
        if rule.whole_line {
            return Exclusion { text: None, fired };
        }
        let replaced = re.replace_all(&current, " ");
        current = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    Exclusion {
        text: Some(current.trim().to_string()),
        fired,
    }
}

/// Apply rules to a line, building a new line when text changes.
pub fn apply_removals_to_line(line: &DocumentLine, rules: &[RemoveRule]) -> (Option<DocumentLine>, Vec<RemoveRule>) {
    if rules.is_empty() {
        return (Some(line.clone()), Vec::new());
    }
    let exclusion = apply_removals(&line.text, rules);
    let line = exclusion.text.map(|text| {
        if text == line.text {
            line.clone()
        } else {
            line.with_text(text)
        }
    });
    (line, exclusion.fired)
}
