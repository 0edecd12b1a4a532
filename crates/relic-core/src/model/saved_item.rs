//! Typed upstream results.
//!
//! Field names follow the upstream graph schema (camelCase). Anything the
//! upstream may omit or null out is an `Option`, so the transformer can stay
//! a total function over these structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: String,
    pub url: String,
    /// User-assigned title.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<SavedItemStatus>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub is_archived: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub favorited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
    #[serde(default)]
    pub annotations: Option<Annotations>,
    #[serde(default)]
    pub item: Option<ItemResult>,
}

impl SavedItem {
    /// A bare saved item, mostly for tests and fixtures.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: None,
            status: None,
            is_favorite: None,
            is_archived: None,
            created_at: None,
            updated_at: None,
            archived_at: None,
            favorited_at: None,
            tags: None,
            annotations: None,
            item: None,
        }
    }

    pub fn parsed_item(&self) -> Option<&Item> {
        match self.item {
            Some(ItemResult::Item(ref item)) => Some(item),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SavedItemStatus {
    Unread,
    Archived,
    Deleted,
    Hidden,
}

impl SavedItemStatus {
    /// Legacy numeric status: "0" unread, "1" archived, "2" deleted.
    pub fn legacy_code(self) -> &'static str {
        match self {
            Self::Unread => "0",
            Self::Archived => "1",
            Self::Deleted | Self::Hidden => "2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub highlights: Option<Vec<Highlight>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub quote: String,
    #[serde(default)]
    pub patch: String,
    #[serde(default)]
    pub version: i64,
    /// Creation time, unix seconds.
    #[serde(rename = "_createdAt", default)]
    pub created_at: i64,
}

/// The parsed content behind a saved item. Items whose parse has not
/// finished come back as `PendingItem`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum ItemResult {
    Item(Box<Item>),
    PendingItem(PendingItem),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: String,
    #[serde(default)]
    pub resolved_id: Option<String>,
    pub given_url: String,
    #[serde(default)]
    pub resolved_url: Option<String>,
    /// Title resolved by the parser.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub is_article: Option<bool>,
    #[serde(default)]
    pub is_index: Option<bool>,
    #[serde(default)]
    pub has_image: Option<bool>,
    #[serde(default)]
    pub has_video: Option<bool>,
    #[serde(default)]
    pub word_count: Option<i64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub time_to_read: Option<i64>,
    #[serde(default)]
    pub listen_duration_estimate: Option<i64>,
    #[serde(default)]
    pub top_image_url: Option<String>,
    #[serde(default)]
    pub date_resolved: Option<DateTime<Utc>>,
    #[serde(default)]
    pub domain_metadata: Option<DomainMetadata>,
    #[serde(default)]
    pub authors: Option<Vec<Author>>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    #[serde(default)]
    pub videos: Option<Vec<Video>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingItem {
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub logo_greyscale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub src: String,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<VideoKind>,
    #[serde(default)]
    pub vid: Option<String>,
    #[serde(default)]
    pub length: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoKind {
    Youtube,
    VimeoLink,
    VimeoMoogaloop,
    VimeoIframe,
    Html5,
    Flash,
    Iframe,
    Brightcove,
    Dailymotion,
}

impl VideoKind {
    pub fn legacy_code(self) -> &'static str {
        match self {
            Self::Youtube => "1",
            Self::VimeoLink => "2",
            Self::VimeoMoogaloop => "3",
            Self::VimeoIframe => "4",
            Self::Html5 => "5",
            Self::Flash => "6",
            Self::Iframe => "7",
            Self::Brightcove => "8",
            Self::Dailymotion => "9",
        }
    }
}

// -- Read responses --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItemConnection {
    #[serde(default)]
    pub total_count: Option<i64>,
    #[serde(default)]
    pub edges: Vec<SavedItemEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedItemEdge {
    #[serde(default)]
    pub cursor: Option<String>,
    pub node: SavedItem,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    #[serde(default)]
    pub total_count: Option<i64>,
    #[serde(default)]
    pub edges: Vec<SearchEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEdge {
    pub node: SearchNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNode {
    pub saved_item: SavedItem,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUser {
    pub saved_items: SavedItemConnection,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    pub user: ListUser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUser {
    pub search_saved_items: SearchConnection,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub user: SearchUser,
}

/// A page of saved items, whichever read operation produced it.
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub total_count: Option<i64>,
    pub items: Vec<SavedItem>,
    pub tag_names: Option<Vec<String>>,
}

impl From<ListResponse> for ItemPage {
    fn from(resp: ListResponse) -> Self {
        Self {
            total_count: resp.user.saved_items.total_count,
            items: resp
                .user
                .saved_items
                .edges
                .into_iter()
                .map(|e| e.node)
                .collect(),
            tag_names: resp
                .user
                .tags
                .map(|tags| tags.into_iter().map(|t| t.name).collect()),
        }
    }
}

impl From<SearchResponse> for ItemPage {
    fn from(resp: SearchResponse) -> Self {
        Self {
            total_count: resp.user.search_saved_items.total_count,
            items: resp
                .user
                .search_saved_items
                .edges
                .into_iter()
                .map(|e| e.node.saved_item)
                .collect(),
            tag_names: resp
                .user
                .tags
                .map(|tags| tags.into_iter().map(|t| t.name).collect()),
        }
    }
}

// -- Write responses --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    pub upsert_saved_item: SavedItem,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReAddResponse {
    pub re_add_saved_item: SavedItem,
}
