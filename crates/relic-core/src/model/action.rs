use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::clock::from_unix;
use crate::credentials::Caller;
use crate::error::{RelicError, Result};
use crate::model::legacy::LegacyError;

/// Legacy analytics actions that are accepted on the wire but no longer served.
pub const RETIRED_ACTIONS: &[&str] = &[
    "opened_app",
    "closed_app",
    "pv",
    "pv_wt",
    "opened_article",
    "opened_web",
    "left_article",
    "leave_article",
    "left_item",
    "scrolled",
    "shared_to",
    "sharedto",
    "itemrec",
    "item_impression",
];

/// One write action from a `send` batch (or the single action behind `add`).
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub item_id: Option<String>,
    pub url: Option<String>,
    /// Explicit `time` from the request, or the processing time.
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Add {
        title: Option<String>,
        tags: Vec<String>,
    },
    ReAdd,
    Archive,
    Favorite,
    Unfavorite,
    Delete,
    TagsAdd(Vec<String>),
    TagsRemove(Vec<String>),
    TagsReplace(Vec<String>),
    TagsClear,
    TagRename {
        old_tag: String,
        new_tag: String,
    },
    TagDelete {
        tag: String,
    },
    RecentSearch {
        term: String,
    },
    Unsupported {
        name: String,
    },
}

impl ActionKind {
    /// The legacy action name.
    pub fn name(&self) -> &str {
        match self {
            Self::Add { .. } => "add",
            Self::ReAdd => "readd",
            Self::Archive => "archive",
            Self::Favorite => "favorite",
            Self::Unfavorite => "unfavorite",
            Self::Delete => "delete",
            Self::TagsAdd(_) => "tags_add",
            Self::TagsRemove(_) => "tags_remove",
            Self::TagsReplace(_) => "tags_replace",
            Self::TagsClear => "tags_clear",
            Self::TagRename { .. } => "tag_rename",
            Self::TagDelete { .. } => "tag_delete",
            Self::RecentSearch { .. } => "recent_search",
            Self::Unsupported { name } => name,
        }
    }

    /// Whether an upstream `NOT_FOUND` means "already done" for this action.
    pub fn not_found_is_success(&self) -> bool {
        matches!(
            self,
            Self::Archive
                | Self::Favorite
                | Self::Unfavorite
                | Self::Delete
                | Self::TagsAdd(_)
                | Self::TagsRemove(_)
                | Self::TagsReplace(_)
                | Self::TagsClear
                | Self::TagRename { .. }
                | Self::TagDelete { .. }
        )
    }
}

/// How a write action addresses its saved item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<'a> {
    Id(&'a str),
    Url(&'a str),
}

impl Action {
    /// Item id wins over URL whenever both are present.
    pub fn target(&self) -> Option<Target<'_>> {
        match (self.item_id.as_deref(), self.url.as_deref()) {
            (Some(id), _) => Some(Target::Id(id)),
            (None, Some(url)) => Some(Target::Url(url)),
            (None, None) => None,
        }
    }

    /// Build an action from one legacy JSON object, validating it.
    ///
    /// Unknown or retired action names are not errors: they become
    /// [`ActionKind::Unsupported`] and are answered per-index.
    pub fn from_value(raw: &Value, now: DateTime<Utc>) -> Result<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| RelicError::invalid("each action must be an object"))?;

        let name = obj
            .get("action")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelicError::invalid("action name is required"))?;

        let item_id = scalar_string(obj.get("item_id"));
        let url = scalar_string(obj.get("url"));
        let time = parse_time(obj.get("time"))?.unwrap_or(now);

        let required = |key: &str| -> Result<String> {
            scalar_string(obj.get(key))
                .ok_or_else(|| RelicError::invalid(format!("{name}: {key} is required")))
        };
        let tags = || -> Result<Vec<String>> {
            match obj.get("tags").filter(|v| !v.is_null()) {
                Some(v) => parse_tags(v),
                None => Err(RelicError::invalid(format!("{name}: tags is required"))),
            }
        };

        let kind = match name {
            "add" if url.is_none() && item_id.is_some() => ActionKind::ReAdd,
            "add" => {
                if url.is_none() {
                    return Err(RelicError::invalid("add: url is required"));
                }
                let tags = match obj.get("tags").filter(|v| !v.is_null()) {
                    Some(v) => parse_tags(v)?,
                    None => Vec::new(),
                };
                ActionKind::Add {
                    title: scalar_string(obj.get("title")),
                    tags,
                }
            }
            "readd" => {
                if item_id.is_none() {
                    return Err(RelicError::invalid("readd: item_id is required"));
                }
                ActionKind::ReAdd
            }
            "archive" => ActionKind::Archive,
            "favorite" => ActionKind::Favorite,
            "unfavorite" => ActionKind::Unfavorite,
            "delete" => ActionKind::Delete,
            "tags_add" => ActionKind::TagsAdd(tags()?),
            "tags_remove" => ActionKind::TagsRemove(tags()?),
            "tags_replace" => ActionKind::TagsReplace(tags()?),
            "tags_clear" => ActionKind::TagsClear,
            "tag_rename" => ActionKind::TagRename {
                old_tag: required("old_tag")?,
                new_tag: required("new_tag")?,
            },
            "tag_delete" => ActionKind::TagDelete {
                tag: required("tag")?,
            },
            "recent_search" => ActionKind::RecentSearch {
                term: required("term")?,
            },
            other => ActionKind::Unsupported {
                name: other.to_string(),
            },
        };

        let needs_target = !matches!(
            kind,
            ActionKind::TagRename { .. }
                | ActionKind::TagDelete { .. }
                | ActionKind::RecentSearch { .. }
                | ActionKind::Unsupported { .. }
        );
        if needs_target && item_id.is_none() && url.is_none() {
            return Err(RelicError::invalid(format!(
                "{name}: item_id or url is required"
            )));
        }

        Ok(Self {
            kind,
            item_id,
            url,
            time,
        })
    }
}

/// Parse the `actions` parameter: a JSON array, or a string holding a JSON
/// array either verbatim or percent-encoded.
pub fn parse_actions(raw: &Value, now: DateTime<Utc>) -> Result<Vec<Action>> {
    let decoded;
    let list = match raw {
        Value::Array(items) => items,
        Value::String(s) => {
            decoded = decode_action_blob(s)?;
            decoded
                .as_array()
                .ok_or_else(|| RelicError::invalid("actions must be a JSON array"))?
        }
        _ => return Err(RelicError::invalid("actions must be a JSON array")),
    };

    list.iter()
        .map(|item| Action::from_value(item, now))
        .collect()
}

fn decode_action_blob(s: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(s) {
        return Ok(value);
    }
    let spaced = s.replace('+', " ");
    let unescaped = urlencoding::decode(&spaced)
        .map_err(|_| RelicError::invalid("actions is not valid percent-encoding"))?;
    serde_json::from_str(&unescaped)
        .map_err(|e| RelicError::invalid(format!("actions is not valid JSON: {e}")))
}

/// Split legacy tags into an ordered list of non-empty names.
///
/// Accepts a comma-separated string or an array of strings. An empty input
/// or any empty element is rejected.
pub fn parse_tags(raw: &Value) -> Result<Vec<String>> {
    let tags: Vec<String> = match raw {
        Value::String(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|t| t.trim().to_string())
                    .ok_or_else(|| RelicError::invalid("tags must be strings"))
            })
            .collect::<Result<_>>()?,
        _ => return Err(RelicError::invalid("tags must be a string or array")),
    };

    if tags.is_empty() || tags.iter().any(|t| t.is_empty()) {
        return Err(RelicError::invalid("tags must not contain empty names"));
    }
    Ok(tags)
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_time(value: Option<&Value>) -> Result<Option<DateTime<Utc>>> {
    let secs = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    secs.filter(|s| *s >= 0)
        .and_then(from_unix)
        .map(Some)
        .ok_or_else(|| RelicError::invalid("time must be unix seconds"))
}

/// A validated batch together with the caller it runs as.
#[derive(Debug, Clone)]
pub struct ActionBatch {
    pub actions: Vec<Action>,
    pub caller: Caller,
}

/// Per-action outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// `true`, or a legacy item for `add`/`readd`.
    Success(Value),
    Failure(LegacyError),
}

/// The parallel `action_results` / `action_errors` arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub action_results: Vec<Value>,
    pub action_errors: Vec<Option<LegacyError>>,
}

impl BatchResult {
    pub fn push(&mut self, result: ActionResult) {
        match result {
            ActionResult::Success(value) => {
                self.action_results.push(value);
                self.action_errors.push(None);
            }
            ActionResult::Failure(error) => {
                self.action_results.push(Value::Bool(false));
                self.action_errors.push(Some(error));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.action_results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.action_results.is_empty()
    }
}

impl FromIterator<ActionResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ActionResult>>(iter: I) -> Self {
        let mut batch = Self::default();
        for result in iter {
            batch.push(result);
        }
        batch
    }
}
