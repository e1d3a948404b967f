//! Leaderboard records and submission validation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::{ANONYMOUS_NAME, MAX_COMPANY_NAME_CHARS, MAX_STORED_VALUE};
use crate::settings::Difficulty;

/// One stored leaderboard row; immutable once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub score: u64,
    pub difficulty: Difficulty,
    pub pixels_destroyed: u64,
    pub time_ms: u64,
    /// RFC 3339 timestamp of when the entry was written
    pub date: String,
    pub company_name: String,
}

/// A score the client wants recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub score: u64,
    pub difficulty: Difficulty,
    pub pixels_destroyed: u64,
    pub time_ms: u64,
    pub company_name: String,
}

/// The envelope returned by a rankings query: one list per tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rankings {
    pub easy: Vec<LeaderboardEntry>,
    pub medium: Vec<LeaderboardEntry>,
    pub hard: Vec<LeaderboardEntry>,
}

impl Rankings {
    pub fn tier(&self, tier: Difficulty) -> &[LeaderboardEntry] {
        match tier {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn tier_mut(&mut self, tier: Difficulty) -> &mut Vec<LeaderboardEntry> {
        match tier {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

/// Why a submission was rejected before reaching storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NotAnObject,
    Missing(&'static str),
    NotNumeric(&'static str),
    Negative(&'static str),
    OutOfRange(&'static str),
    UnknownDifficulty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NotAnObject => write!(f, "Request body must be a JSON object"),
            ValidationError::Missing(field) => write!(f, "Missing required field: {field}"),
            ValidationError::NotNumeric(field) => write!(f, "Field {field} must be numeric"),
            ValidationError::Negative(field) => write!(f, "Field {field} must not be negative"),
            ValidationError::OutOfRange(field) => {
                write!(f, "Field {field} exceeds {MAX_STORED_VALUE}")
            }
            ValidationError::UnknownDifficulty(d) => write!(
                f,
                "Invalid difficulty {d:?}: expected one of easy, medium, hard"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trimmed identity, `Anonymous` when empty, capped in length
pub fn normalize_company_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ANONYMOUS_NAME.to_string();
    }
    trimmed
        .chars()
        .take(MAX_COMPANY_NAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Coerce a JSON number or numeric string to a non-negative integer (floored)
fn coerce_count(value: &Value, field: &'static str) -> Result<u64, ValidationError> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or(ValidationError::NotNumeric(field))?;

    if n < 0.0 {
        return Err(ValidationError::Negative(field));
    }
    // 2^63: the first float past i64::MAX
    if n >= 9_223_372_036_854_775_808.0 {
        return Err(ValidationError::OutOfRange(field));
    }
    Ok(n.floor() as u64)
}

fn optional_count(body: &Value, field: &'static str) -> Result<u64, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => coerce_count(v, field),
    }
}

impl ScoreSubmission {
    /// Validate an untyped request body
    ///
    /// `score` and `difficulty` are required; counts default to zero and the
    /// identity defaults to `Anonymous`.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        if !body.is_object() {
            return Err(ValidationError::NotAnObject);
        }

        let score = match body.get("score") {
            None | Some(Value::Null) => return Err(ValidationError::Missing("score")),
            Some(v) => coerce_count(v, "score")?,
        };

        let difficulty = match body.get("difficulty") {
            None | Some(Value::Null) => return Err(ValidationError::Missing("difficulty")),
            Some(Value::String(s)) => Difficulty::from_str(s)
                .ok_or_else(|| ValidationError::UnknownDifficulty(s.clone()))?,
            Some(other) => return Err(ValidationError::UnknownDifficulty(other.to_string())),
        };

        let company_name = body
            .get("companyName")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(Self {
            score,
            difficulty,
            pixels_destroyed: optional_count(body, "pixelsDestroyed")?,
            time_ms: optional_count(body, "timeMs")?,
            company_name: normalize_company_name(company_name),
        })
    }

    /// Range check for submissions that did not come through `from_json`
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("score", self.score),
            ("pixelsDestroyed", self.pixels_destroyed),
            ("timeMs", self.time_ms),
        ];
        match fields.into_iter().find(|(_, v)| *v > MAX_STORED_VALUE) {
            Some((field, _)) => Err(ValidationError::OutOfRange(field)),
            None => Ok(()),
        }
    }

    /// Stamp the submission into a stored entry
    pub fn into_entry(self, date: String) -> LeaderboardEntry {
        LeaderboardEntry {
            score: self.score,
            difficulty: self.difficulty,
            pixels_destroyed: self.pixels_destroyed,
            time_ms: self.time_ms,
            date,
            company_name: normalize_company_name(&self.company_name),
        }
    }
}
