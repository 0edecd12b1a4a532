//! The legacy v3 JSON shapes. Field names and string-typed values here are a
//! wire contract with old clients and must not change.

use std::collections::BTreeMap;

use serde::Serialize;

/// Legacy `"0"`/`"1"` boolean.
pub fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// One entry of the `list` map in a get response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyItem {
    pub item_id: String,
    pub resolved_id: String,
    pub given_url: String,
    pub given_title: String,
    pub favorite: String,
    pub status: String,
    pub time_added: String,
    pub time_updated: String,
    pub time_read: String,
    pub time_favorited: String,
    pub sort_id: usize,
    pub resolved_title: String,
    pub resolved_url: String,
    pub excerpt: String,
    pub is_article: String,
    pub is_index: String,
    pub has_video: String,
    pub has_image: String,
    pub word_count: String,
    pub lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_read: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_duration_estimate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_metadata: Option<LegacyDomainMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, LegacyTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<BTreeMap<String, LegacyAuthor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<BTreeMap<String, LegacyImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<BTreeMap<String, LegacyVideo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<LegacyAnnotation>>,
}

/// The item shape returned by `add` and by `add`/`readd` actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyAddItem {
    pub item_id: String,
    pub normal_url: String,
    pub resolved_id: String,
    pub resolved_url: String,
    pub given_url: String,
    pub title: String,
    pub excerpt: String,
    pub word_count: String,
    pub has_image: String,
    pub has_video: String,
    pub is_index: String,
    pub is_article: String,
    pub lang: String,
    pub date_resolved: String,
    pub time_first_parsed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_metadata: Option<LegacyDomainMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<BTreeMap<String, LegacyAuthor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<BTreeMap<String, LegacyImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<BTreeMap<String, LegacyVideo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, LegacyTag>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyTag {
    pub item_id: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyAuthor {
    pub item_id: String,
    pub author_id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyImage {
    pub item_id: String,
    pub image_id: String,
    pub src: String,
    pub width: String,
    pub height: String,
    pub credit: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyVideo {
    pub item_id: String,
    pub video_id: String,
    pub src: String,
    pub width: String,
    pub height: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub vid: String,
    pub length: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyDomainMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greyscale_logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyAnnotation {
    pub annotation_id: String,
    pub item_id: String,
    pub quote: String,
    pub patch: String,
    pub version: i64,
    pub created_at: String,
}

/// `{message, type, code}` as written into `action_errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: u32,
}

pub const CODE_INVALID_ACTION: u32 = 130;
pub const CODE_FORBIDDEN: u32 = 5200;
pub const CODE_INTERNAL: u32 = 199;

pub const SOMETHING_WENT_WRONG: &str = "Something Went Wrong";

impl LegacyError {
    pub fn invalid_action(name: &str) -> Self {
        Self {
            message: format!("Invalid Action: '{name}'"),
            kind: "Bad request".to_string(),
            code: CODE_INVALID_ACTION,
        }
    }

    pub fn forbidden() -> Self {
        Self {
            message: SOMETHING_WENT_WRONG.to_string(),
            kind: "Forbidden".to_string(),
            code: CODE_FORBIDDEN,
        }
    }

    /// A structured upstream error below 500, surfaced with its first message.
    pub fn client(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: reason_phrase(status).to_string(),
            code: CODE_INTERNAL,
        }
    }

    pub fn internal() -> Self {
        Self {
            message: SOMETHING_WENT_WRONG.to_string(),
            kind: "Internal Server Error".to_string(),
            code: CODE_INTERNAL,
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        _ if status < 500 => "Bad Request",
        _ => "Internal Server Error",
    }
}
