//! Per-user daily state document.
//!
//! # Responsibility
//! - Define the persisted `UserState` shape and its checklist records.
//! - Define `UserStatePatch`, the partial-update payload accepted from callers.
//!
//! # Invariants
//! - `user_id` identifies exactly one document.
//! - Checklist `id`/`label` are never rewritten by core; only `completed` is.
//! - Pass-through fields are opaque JSON owned by the client.
//! - Decoding a patch never fails on a well-typed JSON object: mismatched
//!   scalars are coerced and anything uncoercible leaves the field unset.
//!
//! # See also
//! - crate::reconcile

use log::debug;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier used when a caller does not name a user.
pub const DEFAULT_USER_ID: &str = "demo";

/// One row of a flat checklist (`bodyTasks`, `skinTasks`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Stable identity. Numeric ids from clients are stored as strings.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Display text.
    #[serde(default)]
    pub label: String,
    /// Completion flag cleared by the daily reset.
    #[serde(default, deserialize_with = "bool_like")]
    pub completed: bool,
    /// Client-owned keys kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChecklistItem {
    /// Creates an unchecked item.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            completed: false,
            extra: Map::new(),
        }
    }
}

/// Leaf of the study hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindUnit {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "bool_like")]
    pub completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MindUnit {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            completed: false,
            extra: Map::new(),
        }
    }
}

/// Study subject grouping units and reference links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindSubject {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub units: Vec<MindUnit>,
    /// Opaque link list, never interpreted by core.
    #[serde(default = "empty_array")]
    pub links: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MindSubject {
    pub fn new(id: impl Into<String>, label: impl Into<String>, units: Vec<MindUnit>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            units,
            links: empty_array(),
            extra: Map::new(),
        }
    }
}

/// Complete persisted document for one user.
///
/// Every field besides `user_id` has a default, so a sparse stored document
/// always decodes into a complete record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserState {
    pub user_id: String,
    /// Opaque; a list unless the client stored something else.
    pub planner_tasks: Value,
    pub body_tasks: Vec<ChecklistItem>,
    pub skin_tasks: Vec<ChecklistItem>,
    /// Lifetime counter. The daily reset never touches it.
    pub skin_sessions: i64,
    pub mind_subjects: Vec<MindSubject>,
    pub reminder_settings: Value,
    pub mind_reminder_times: Value,
    pub mind_reminder_enabled: Value,
    pub mind_last_reminder_day: Value,
    pub weight_input: Value,
    pub muscle_progress: Value,
    /// Day on which the last reset was applied; empty when never reset.
    pub day_key: String,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            planner_tasks: empty_array(),
            body_tasks: Vec::new(),
            skin_tasks: Vec::new(),
            skin_sessions: 0,
            mind_subjects: Vec::new(),
            reminder_settings: empty_object(),
            mind_reminder_times: empty_object(),
            mind_reminder_enabled: empty_object(),
            mind_last_reminder_day: empty_object(),
            weight_input: Value::String(String::new()),
            muscle_progress: empty_object(),
            day_key: String::new(),
        }
    }
}

impl UserState {
    /// Creates an empty, never-reset record for `user_id`.
    ///
    /// Checklists are left empty; the reconciler seeds them from templates.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

/// Partial update accepted from callers.
///
/// A field that is omitted or `null` keeps its reconciled value. `userId` and
/// `dayKey` are not part of the patch: identity and watermark stay server-owned.
///
/// Typed fields are decoded leniently. `skinSessions` accepts numeric strings
/// and floats (truncated toward zero); checklist `completed` accepts
/// `"true"`/`"false"` and `0`/`1`. A value that still does not fit is dropped
/// and the stored field is kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStatePatch {
    pub planner_tasks: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub body_tasks: Option<Vec<ChecklistItem>>,
    #[serde(deserialize_with = "lenient")]
    pub skin_tasks: Option<Vec<ChecklistItem>>,
    #[serde(deserialize_with = "lenient_count")]
    pub skin_sessions: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub mind_subjects: Option<Vec<MindSubject>>,
    pub reminder_settings: Option<Value>,
    pub mind_reminder_times: Option<Value>,
    pub mind_reminder_enabled: Option<Value>,
    pub mind_last_reminder_day: Option<Value>,
    pub weight_input: Option<Value>,
    pub muscle_progress: Option<Value>,
}

impl UserStatePatch {
    /// Decodes a parsed request body.
    ///
    /// Anything other than a JSON object is an empty patch.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            other => {
                debug!(
                    "event=patch_decode module=model status=ignored kind={}",
                    json_kind(&other)
                );
                Self::default()
            }
        }
    }

    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlays every provided field onto `state`.
    pub fn apply_to(self, state: &mut UserState) {
        if let Some(value) = self.planner_tasks {
            state.planner_tasks = value;
        }
        if let Some(value) = self.body_tasks {
            state.body_tasks = value;
        }
        if let Some(value) = self.skin_tasks {
            state.skin_tasks = value;
        }
        if let Some(value) = self.skin_sessions {
            state.skin_sessions = value;
        }
        if let Some(value) = self.mind_subjects {
            state.mind_subjects = value;
        }
        if let Some(value) = self.reminder_settings {
            state.reminder_settings = value;
        }
        if let Some(value) = self.mind_reminder_times {
            state.mind_reminder_times = value;
        }
        if let Some(value) = self.mind_reminder_enabled {
            state.mind_reminder_enabled = value;
        }
        if let Some(value) = self.mind_last_reminder_day {
            state.mind_last_reminder_day = value;
        }
        if let Some(value) = self.weight_input {
            state.weight_input = value;
        }
        if let Some(value) = self.muscle_progress {
            state.muscle_progress = value;
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let kind = json_kind(&value);
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(err) => {
            debug!("event=patch_decode module=model status=dropped kind={kind} error={err}");
            Ok(None)
        }
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match &value {
        Value::Number(number) => number_to_count(number),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(float_to_count))
        }
        _ => None,
    };
    if count.is_none() && !value.is_null() {
        debug!(
            "event=patch_decode module=model status=dropped kind={} field=skinSessions",
            json_kind(&value)
        );
    }
    Ok(count)
}

fn number_to_count(number: &serde_json::Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().and_then(float_to_count))
}

fn float_to_count(value: f64) -> Option<i64> {
    // `as` saturates; reject what would saturate instead.
    let truncated = value.trunc();
    (truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64)
        .then_some(truncated as i64)
}

fn bool_like<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        _ => false,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected string or number id, got `{other}`"
        ))),
    }
}
