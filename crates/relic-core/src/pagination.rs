//! Legacy `get`/`fetch` parameters in, upstream read variables out, and the
//! upstream page back into the legacy offset-indexed envelope.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::ApiConfig;
use crate::credentials::Caller;
use crate::error::{RelicError, Result};
use crate::graph::{execute_as, GraphBackend, Operation};
use crate::model::{
    ContentType, DetailType, GetQuery, ItemPage, ItemState, LegacyItem, ListResponse,
    SearchResponse, SortKey,
};
use crate::params::LegacyParams;
use crate::transform::{transform_item, TransformContext};

/// Validate raw legacy parameters into a [`GetQuery`].
///
/// `default_detail` differs between `get` (simple) and `fetch` (complete).
pub fn parse_get_query(
    params: &LegacyParams,
    api: &ApiConfig,
    default_detail: DetailType,
) -> Result<GetQuery> {
    let offset = params.u64("offset")?.unwrap_or(0);

    let max_count = u64::from(api.max_count.max(1));
    let count = params
        .u64("count")?
        .unwrap_or_else(|| u64::from(api.default_count));
    if count == 0 || count > max_count {
        return Err(RelicError::invalid(format!(
            "count must be between 1 and {max_count}"
        )));
    }

    let state = match params.non_empty_str("state") {
        Some(s) => s.parse::<ItemState>().map_err(RelicError::InvalidInput)?,
        None => ItemState::All,
    };

    let favorite = match params.non_empty_str("favorite").as_deref() {
        None => None,
        Some("1") | Some("true") => Some(true),
        Some("0") | Some("false") => Some(false),
        Some(other) => {
            return Err(RelicError::invalid(format!(
                "favorite must be 0 or 1, got {other}"
            )))
        }
    };

    let content_type = params
        .non_empty_str("contentType")
        .map(|s| s.parse::<ContentType>())
        .transpose()
        .map_err(RelicError::InvalidInput)?;

    let detail = params
        .non_empty_str("detailType")
        .map(|s| s.parse::<DetailType>())
        .transpose()
        .map_err(RelicError::InvalidInput)?
        .unwrap_or(default_detail);

    let since = params
        .u64("since")?
        .map(|s| i64::try_from(s).map_err(|_| RelicError::invalid("since is out of range")))
        .transpose()?;

    let search = params.non_empty_str("search");
    let requested_sort = params
        .non_empty_str("sort")
        .map(|s| s.parse::<SortKey>())
        .transpose()
        .map_err(RelicError::InvalidInput)?;
    let sort = match (requested_sort, search.is_some()) {
        (Some(SortKey::Relevance), false) => {
            return Err(RelicError::invalid(
                "sort=relevance requires a search term",
            ))
        }
        (Some(sort), _) => sort,
        (None, true) => SortKey::Relevance,
        (None, false) => SortKey::Newest,
    };

    Ok(GetQuery {
        offset,
        count,
        state,
        favorite,
        tag: params.non_empty_str("tag"),
        content_type,
        since,
        sort,
        search,
        detail,
        total: params.flag("total"),
        tag_list: params.flag("taglist"),
        annotations: params.flag("annotations"),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_since: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadSort {
    pub sort_by: &'static str,
    pub sort_order: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetPagination {
    pub offset: u64,
    pub limit: u64,
}

/// Variables for one of the four read operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadVariables {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    pub filter: ReadFilter,
    pub sort: ReadSort,
    pub pagination: OffsetPagination,
    pub with_annotations: bool,
    pub with_tag_list: bool,
}

pub fn sort_variables(sort: SortKey) -> ReadSort {
    let (sort_by, sort_order) = match sort {
        SortKey::Newest => ("CREATED_AT", "DESC"),
        SortKey::Oldest => ("CREATED_AT", "ASC"),
        SortKey::Relevance => ("RELEVANCE", "DESC"),
    };
    ReadSort {
        sort_by,
        sort_order,
    }
}

/// Pick the read operation and build its variables.
pub fn read_request(query: &GetQuery) -> (Operation, ReadVariables) {
    let operation = match (query.is_search(), query.detail) {
        (false, DetailType::Simple) => Operation::GetSavedItemsSimple,
        (false, DetailType::Complete) => Operation::GetSavedItemsComplete,
        (true, DetailType::Simple) => Operation::SearchSavedItemsSimple,
        (true, DetailType::Complete) => Operation::SearchSavedItemsComplete,
    };

    let statuses = match query.state {
        ItemState::Unread => Some(vec!["UNREAD"]),
        ItemState::Archive => Some(vec!["ARCHIVED"]),
        ItemState::All => None,
    };

    let variables = ReadVariables {
        term: query.search.clone(),
        filter: ReadFilter {
            statuses,
            is_favorite: query.favorite,
            tag_names: query.tag.clone().map(|t| vec![t]),
            content_type: query.content_type,
            updated_since: query.since,
        },
        sort: sort_variables(query.sort),
        pagination: OffsetPagination {
            offset: query.offset,
            limit: query.count,
        },
        with_annotations: query.annotations,
        with_tag_list: query.tag_list,
    };

    (operation, variables)
}

/// Run the read for `query` and normalise either response into an [`ItemPage`].
pub async fn read_page<B>(backend: &B, query: &GetQuery, caller: &Caller) -> Result<ItemPage>
where
    B: GraphBackend + ?Sized,
{
    let (operation, variables) = read_request(query);
    if query.is_search() {
        let resp: SearchResponse = execute_as(backend, operation, variables, caller).await?;
        Ok(resp.into())
    } else {
        let resp: ListResponse = execute_as(backend, operation, variables, caller).await?;
        Ok(resp.into())
    }
}

/// `total` as the legacy string field, only when the caller asked for it.
pub fn total_field(query: &GetQuery, total_count: Option<i64>) -> Option<String> {
    query.total.then(|| total_count.unwrap_or(0).to_string())
}

/// Items keyed by id, in upstream order. An empty list serializes as `[]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyList(pub Vec<(String, LegacyItem)>);

impl LegacyList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&LegacyItem> {
        self.0.iter().find(|(k, _)| k == item_id).map(|(_, v)| v)
    }
}

impl Serialize for LegacyList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            return serializer.collect_seq(std::iter::empty::<()>());
        }
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, item) in &self.0 {
            map.serialize_entry(key, item)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMeta {
    pub search_type: &'static str,
}

/// The legacy `get`/`fetch` response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetEnvelope {
    pub status: u8,
    pub complete: u8,
    pub error: Option<String>,
    pub since: i64,
    #[serde(rename = "maxActions")]
    pub max_actions: u32,
    pub cachetype: &'static str,
    pub list: LegacyList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_meta: Option<SearchMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
}

/// Assemble the legacy envelope around one upstream page.
pub fn build_envelope(
    query: &GetQuery,
    page: ItemPage,
    now: DateTime<Utc>,
    api: &ApiConfig,
) -> GetEnvelope {
    let start = usize::try_from(query.offset).unwrap_or(usize::MAX);
    let list: Vec<(String, LegacyItem)> = page
        .items
        .iter()
        .enumerate()
        .map(|(i, saved)| {
            let ctx = TransformContext {
                complete: query.detail == DetailType::Complete,
                annotations: query.annotations,
                sort_id: start.saturating_add(i),
            };
            transform_item(saved, &ctx)
        })
        .collect();

    GetEnvelope {
        status: if list.is_empty() { 2 } else { 1 },
        complete: if query.since.is_some() { 0 } else { 1 },
        error: None,
        since: now.timestamp(),
        max_actions: api.max_actions,
        cachetype: "db",
        list: LegacyList(list),
        search_meta: query.is_search().then_some(SearchMeta {
            search_type: "normal",
        }),
        tags: if query.tag_list {
            Some(page.tag_names.unwrap_or_default())
        } else {
            None
        },
        total: total_field(query, page.total_count),
    }
}
