//! L7 policies: ordered match/action rules evaluated on HTTP traffic.

use serde::{Deserialize, Serialize};

use crate::model::common::Identified;

/// What part of the request a condition inspects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "operand", rename_all = "camelCase")]
pub enum L7Operand {
    HttpHost,
    HttpUri,
    HttpHeader { header: String },
    HttpCookie { cookie: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum L7Match {
    Equals,
    StartsWith,
    EndsWith,
    Contains,
}

// No deny_unknown_fields here: serde cannot combine it with flatten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L7Condition {
    #[serde(flatten)]
    pub operand: L7Operand,
    #[serde(rename = "match")]
    pub matcher: L7Match,
    /// Values are a set; any match fires the condition. Kept sorted.
    pub values: Vec<String>,
}

/// What a rule does when its conditions match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum L7Action {
    /// Send the request to a pool, full path.
    Forward { pool: String },
    /// Redirect to a location, e.g. `https://%{host}%{uri}`.
    Redirect { location: String },
    /// Reset the connection.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct L7Rule {
    pub name: String,
    /// Evaluation position; assigned from declaration order when omitted.
    #[serde(default)]
    pub ordinal: u32,
    #[serde(default)]
    pub conditions: Vec<L7Condition>,
    #[serde(default)]
    pub actions: Vec<L7Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct L7Policy {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Feature sets the policy needs, e.g. `forwarding`. Kept sorted.
    #[serde(default)]
    pub controls: Vec<String>,
    /// Profile requirements, e.g. `http`. Kept sorted.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Rules in evaluation order; order is meaning, never sorted.
    #[serde(default)]
    pub rules: Vec<L7Rule>,
}

fn default_strategy() -> String {
    "/Common/first-match".to_owned()
}

impl L7Policy {
    pub fn normalize(&mut self) {
        self.controls.sort_unstable();
        self.requires.sort_unstable();
        for (position, rule) in self.rules.iter_mut().enumerate() {
            if rule.ordinal == 0 {
                rule.ordinal = u32::try_from(position).unwrap_or(u32::MAX);
            }
            for condition in &mut rule.conditions {
                condition.values.sort_unstable();
            }
        }
    }
}

impl Identified for L7Policy {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}

// ── Tests ───────────────────────────────────────────────────────────
