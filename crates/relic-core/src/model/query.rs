use serde::Serialize;

/// Parameters of a legacy `get`/`fetch` request after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct GetQuery {
    pub offset: u64,
    pub count: u64,
    pub state: ItemState,
    pub favorite: Option<bool>,
    pub tag: Option<String>,
    pub content_type: Option<ContentType>,
    /// Unix seconds; only items updated since then.
    pub since: Option<i64>,
    pub sort: SortKey,
    pub search: Option<String>,
    pub detail: DetailType,
    pub total: bool,
    pub tag_list: bool,
    pub annotations: bool,
}

impl GetQuery {
    pub fn is_search(&self) -> bool {
        self.search.is_some()
    }
}

impl Default for GetQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            count: 30,
            state: ItemState::All,
            favorite: None,
            tag: None,
            content_type: None,
            since: None,
            sort: SortKey::Newest,
            search: None,
            detail: DetailType::Simple,
            total: false,
            tag_list: false,
            annotations: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Unread,
    Archive,
    All,
}

impl std::str::FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unread" | "queue" => Ok(Self::Unread),
            "read" | "archive" => Ok(Self::Archive),
            "all" => Ok(Self::All),
            _ => Err(format!("unsupported state: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentType {
    #[serde(rename = "IS_ARTICLE")]
    Article,
    #[serde(rename = "IS_VIDEO")]
    Video,
    #[serde(rename = "IS_IMAGE")]
    Image,
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            _ => Err(format!("unsupported contentType: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Newest,
    Oldest,
    Relevance,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "relevance" => Ok(Self::Relevance),
            _ => Err(format!("unsupported sort: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailType {
    #[default]
    Simple,
    Complete,
}

impl std::str::FromStr for DetailType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "complete" => Ok(Self::Complete),
            _ => Err(format!("unsupported detailType: {s}")),
        }
    }
}
