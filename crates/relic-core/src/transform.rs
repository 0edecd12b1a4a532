//! Upstream saved items to legacy item records.
//!
//! Everything here is a pure function of the typed upstream value and the
//! request context. Nothing can fail: missing data degrades to the legacy
//! defaults (`""`, `"0"`, or an omitted facet).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::clock::{from_unix, iso8601};
use crate::model::{
    flag, Author, Highlight, Image, Item, ItemResult, LegacyAddItem, LegacyAnnotation,
    LegacyAuthor, LegacyDomainMetadata, LegacyImage, LegacyItem, LegacyTag, LegacyVideo,
    DomainMetadata, SavedItem, Tag, Video,
};

/// Request-level inputs to [`transform_item`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformContext {
    /// `detailType=complete` was requested.
    pub complete: bool,
    /// The caller asked for annotations.
    pub annotations: bool,
    /// Position of the item in the overall listing.
    pub sort_id: usize,
}

/// Transform one saved item into its legacy record and the key it is listed under.
pub fn transform_item(saved: &SavedItem, ctx: &TransformContext) -> (String, LegacyItem) {
    let item_id = saved.id.clone();
    let user_title = non_empty(saved.title.as_deref());

    let mut legacy = match saved.item {
        Some(ItemResult::Item(ref item)) => {
            let resolved_title = non_empty(item.title.as_deref());
            let title = user_title.or(resolved_title).unwrap_or_default();
            LegacyItem {
                item_id: item_id.clone(),
                resolved_id: item.resolved_id.clone().unwrap_or_else(|| item.item_id.clone()),
                given_url: item.given_url.clone(),
                given_title: title.to_string(),
                favorite: String::new(),
                status: String::new(),
                time_added: String::new(),
                time_updated: String::new(),
                time_read: String::new(),
                time_favorited: String::new(),
                sort_id: ctx.sort_id,
                resolved_title: resolved_title.unwrap_or(title).to_string(),
                resolved_url: item
                    .resolved_url
                    .clone()
                    .unwrap_or_else(|| item.given_url.clone()),
                excerpt: item.excerpt.clone().unwrap_or_default(),
                is_article: flag(item.is_article.unwrap_or(false)),
                is_index: flag(item.is_index.unwrap_or(false)),
                has_video: flag(item.has_video.unwrap_or(false)),
                has_image: flag(item.has_image.unwrap_or(false)),
                word_count: item.word_count.unwrap_or(0).to_string(),
                lang: item.language.clone().unwrap_or_default(),
                time_to_read: item.time_to_read,
                listen_duration_estimate: item.listen_duration_estimate,
                top_image_url: item.top_image_url.clone(),
                domain_metadata: None,
                tags: None,
                authors: None,
                images: None,
                videos: None,
                annotations: None,
            }
        }
        Some(ItemResult::PendingItem(ref pending)) => {
            minimal_item(&item_id, &pending.url, user_title, ctx.sort_id)
        }
        None => minimal_item(&item_id, &saved.url, user_title, ctx.sort_id),
    };

    legacy.favorite = flag(saved.is_favorite.unwrap_or(false));
    legacy.status = match saved.status {
        Some(status) => status.legacy_code().to_string(),
        None => flag(saved.is_archived.unwrap_or(false)),
    };
    legacy.time_added = unix_string(saved.created_at);
    legacy.time_updated = unix_string(saved.updated_at);
    legacy.time_read = unix_string(saved.archived_at);
    legacy.time_favorited = unix_string(saved.favorited_at);

    if ctx.complete {
        legacy.tags = Some(tag_map(&item_id, saved.tags.as_deref(), true).unwrap_or_default());
        if let Some(item) = saved.parsed_item() {
            legacy.domain_metadata = item.domain_metadata.as_ref().and_then(domain_metadata);
            legacy.authors = author_map(&item_id, item.authors.as_deref());
            legacy.images = image_map(&item_id, item.images.as_deref());
            legacy.videos = video_map(&item_id, item.videos.as_deref());
        }
    }

    if ctx.annotations {
        legacy.annotations = saved
            .annotations
            .as_ref()
            .and_then(|a| a.highlights.as_deref())
            .filter(|h| !h.is_empty())
            .map(|highlights| {
                highlights
                    .iter()
                    .map(|h| annotation(&item_id, h))
                    .collect()
            });
    }

    (item_id, legacy)
}

/// Placeholder record for an item whose content has not been parsed yet.
fn minimal_item(item_id: &str, url: &str, title: Option<&str>, sort_id: usize) -> LegacyItem {
    let zero = || flag(false);
    let title = title.unwrap_or_default();
    LegacyItem {
        item_id: item_id.to_string(),
        resolved_id: item_id.to_string(),
        given_url: url.to_string(),
        given_title: title.to_string(),
        favorite: zero(),
        status: zero(),
        time_added: zero(),
        time_updated: zero(),
        time_read: zero(),
        time_favorited: zero(),
        sort_id,
        resolved_title: title.to_string(),
        resolved_url: url.to_string(),
        excerpt: String::new(),
        is_article: zero(),
        is_index: zero(),
        has_video: zero(),
        has_image: zero(),
        word_count: zero(),
        lang: String::new(),
        time_to_read: None,
        listen_duration_estimate: None,
        top_image_url: None,
        domain_metadata: None,
        tags: None,
        authors: None,
        images: None,
        videos: None,
        annotations: None,
    }
}

/// Transform the result of an add/re-add into the legacy add item.
///
/// `include_tags` is set for browser-extension callers only.
pub fn transform_add_item(saved: &SavedItem, include_tags: bool) -> LegacyAddItem {
    let tags = if include_tags {
        tag_map(&saved.id, saved.tags.as_deref(), false)
    } else {
        None
    };

    let Some(item) = saved.parsed_item() else {
        let url = match saved.item {
            Some(ItemResult::PendingItem(ref pending)) => pending.url.as_str(),
            _ => saved.url.as_str(),
        };
        return pending_add_item(&saved.id, url, non_empty(saved.title.as_deref()), tags);
    };

    let item_id = if item.item_id.is_empty() {
        saved.id.clone()
    } else {
        item.item_id.clone()
    };
    let title = non_empty(saved.title.as_deref())
        .or(non_empty(item.title.as_deref()))
        .unwrap_or_default();

    LegacyAddItem {
        normal_url: item.given_url.clone(),
        resolved_id: item.resolved_id.clone().unwrap_or_else(|| item_id.clone()),
        resolved_url: item
            .resolved_url
            .clone()
            .unwrap_or_else(|| item.given_url.clone()),
        given_url: item.given_url.clone(),
        title: title.to_string(),
        excerpt: item.excerpt.clone().unwrap_or_default(),
        word_count: item.word_count.unwrap_or(0).to_string(),
        has_image: flag(item.has_image.unwrap_or(false)),
        has_video: flag(item.has_video.unwrap_or(false)),
        is_index: flag(item.is_index.unwrap_or(false)),
        is_article: flag(item.is_article.unwrap_or(false)),
        lang: item.language.clone().unwrap_or_default(),
        date_resolved: date_resolved(item),
        time_first_parsed: "0".to_string(),
        domain_metadata: item.domain_metadata.as_ref().and_then(domain_metadata),
        authors: author_map(&item_id, item.authors.as_deref()),
        images: image_map(&item_id, item.images.as_deref()),
        videos: video_map(&item_id, item.videos.as_deref()),
        tags,
        item_id,
    }
}

fn pending_add_item(
    item_id: &str,
    url: &str,
    title: Option<&str>,
    tags: Option<BTreeMap<String, LegacyTag>>,
) -> LegacyAddItem {
    LegacyAddItem {
        item_id: item_id.to_string(),
        normal_url: url.to_string(),
        resolved_id: item_id.to_string(),
        resolved_url: url.to_string(),
        given_url: url.to_string(),
        title: title.unwrap_or_default().to_string(),
        excerpt: String::new(),
        word_count: "0".to_string(),
        has_image: flag(false),
        has_video: flag(false),
        is_index: flag(false),
        is_article: flag(false),
        lang: String::new(),
        date_resolved: NEVER_RESOLVED.to_string(),
        time_first_parsed: "0".to_string(),
        domain_metadata: None,
        authors: None,
        images: None,
        videos: None,
        tags,
    }
}

const NEVER_RESOLVED: &str = "0000-00-00 00:00:00";

fn date_resolved(item: &Item) -> String {
    item.date_resolved
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| NEVER_RESOLVED.to_string())
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Unix seconds as a string; `"0"` when absent or not after the epoch.
pub fn unix_string(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.timestamp())
        .filter(|secs| *secs > 0)
        .unwrap_or(0)
        .to_string()
}

fn dimension(value: Option<i64>) -> String {
    value.unwrap_or(0).to_string()
}

/// Tags keyed by name. With `placeholder`, zero tags yields one entry keyed `""`.
fn tag_map(
    item_id: &str,
    tags: Option<&[Tag]>,
    placeholder: bool,
) -> Option<BTreeMap<String, LegacyTag>> {
    let tags = tags.unwrap_or_default();
    if tags.is_empty() {
        return placeholder.then(|| {
            BTreeMap::from([(
                String::new(),
                LegacyTag {
                    item_id: item_id.to_string(),
                    tag: String::new(),
                },
            )])
        });
    }
    Some(
        tags.iter()
            .map(|t| {
                (
                    t.name.clone(),
                    LegacyTag {
                        item_id: item_id.to_string(),
                        tag: t.name.clone(),
                    },
                )
            })
            .collect(),
    )
}

/// Facet entries keyed by 1-based position; `None` for a missing or empty list.
fn numbered<T, L>(list: Option<&[T]>, f: impl Fn(usize, &T) -> L) -> Option<BTreeMap<String, L>> {
    let list = list.filter(|l| !l.is_empty())?;
    Some(
        list.iter()
            .enumerate()
            .map(|(i, entry)| ((i + 1).to_string(), f(i + 1, entry)))
            .collect(),
    )
}

fn author_map(item_id: &str, authors: Option<&[Author]>) -> Option<BTreeMap<String, LegacyAuthor>> {
    numbered(authors, |n, a| LegacyAuthor {
        item_id: item_id.to_string(),
        author_id: a.id.clone().unwrap_or_else(|| n.to_string()),
        name: a.name.clone().unwrap_or_default(),
        url: a.url.clone().unwrap_or_default(),
    })
}

fn image_map(item_id: &str, images: Option<&[Image]>) -> Option<BTreeMap<String, LegacyImage>> {
    numbered(images, |n, img| LegacyImage {
        item_id: item_id.to_string(),
        image_id: n.to_string(),
        src: img.src.clone(),
        width: dimension(img.width),
        height: dimension(img.height),
        credit: img.credit.clone().unwrap_or_default(),
        caption: img.caption.clone().unwrap_or_default(),
    })
}

fn video_map(item_id: &str, videos: Option<&[Video]>) -> Option<BTreeMap<String, LegacyVideo>> {
    numbered(videos, |n, v| LegacyVideo {
        item_id: item_id.to_string(),
        video_id: n.to_string(),
        src: v.src.clone(),
        width: dimension(v.width),
        height: dimension(v.height),
        kind: v.kind.map(|k| k.legacy_code()).unwrap_or("0").to_string(),
        vid: v.vid.clone().unwrap_or_default(),
        length: dimension(v.length),
    })
}

fn domain_metadata(meta: &DomainMetadata) -> Option<LegacyDomainMetadata> {
    if meta.name.is_none() && meta.logo.is_none() && meta.logo_greyscale.is_none() {
        return None;
    }
    Some(LegacyDomainMetadata {
        name: meta.name.clone(),
        logo: meta.logo.clone(),
        greyscale_logo: meta.logo_greyscale.clone(),
    })
}

fn annotation(item_id: &str, h: &Highlight) -> LegacyAnnotation {
    LegacyAnnotation {
        annotation_id: h.id.clone(),
        item_id: item_id.to_string(),
        quote: h.quote.clone(),
        patch: h.patch.clone(),
        version: h.version,
        created_at: from_unix(h.created_at).map(iso8601).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotations, PendingItem, SavedItemStatus, VideoKind};
    use serde_json::json;

    fn complete() -> TransformContext {
        TransformContext {
            complete: true,
            ..Default::default()
        }
    }

    fn parsed(item: Item) -> SavedItem {
        let mut saved = SavedItem::new(item.item_id.clone(), item.given_url.clone());
        saved.item = Some(ItemResult::Item(Box::new(item)));
        saved
    }

    fn article() -> Item {
        Item {
            item_id: "100".into(),
            given_url: "https://example.com/a".into(),
            title: Some("Resolved Title".into()),
            is_article: Some(true),
            word_count: Some(812),
            language: Some("en".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_title_fallback() {
        let mut saved = parsed(article());
        let (_, legacy) = transform_item(&saved, &complete());
        assert_eq!(legacy.given_title, "Resolved Title");
        assert_eq!(legacy.resolved_title, "Resolved Title");

        saved.title = Some("Mine".into());
        let (_, legacy) = transform_item(&saved, &complete());
        assert_eq!(legacy.given_title, "Mine");
        assert_eq!(legacy.resolved_title, "Resolved Title");

        saved.title = Some("".into());
        let (_, legacy) = transform_item(&saved, &complete());
        assert_eq!(legacy.given_title, "Resolved Title");
    }

    #[test]
    fn test_flags_are_strings() {
        let mut saved = parsed(article());
        saved.is_favorite = Some(true);
        let (key, legacy) = transform_item(&saved, &complete());
        assert_eq!(key, "100");
        let json = serde_json::to_value(&legacy).unwrap();
        assert_eq!(json["favorite"], "1");
        assert_eq!(json["is_article"], "1");
        assert_eq!(json["is_index"], "0");
        assert_eq!(json["has_video"], "0");
        assert_eq!(json["has_image"], "0");
        assert_eq!(json["word_count"], "812");
    }

    #[test]
    fn test_timestamps() {
        let mut saved = parsed(article());
        saved.created_at = from_unix(1_600_000_000);
        saved.archived_at = from_unix(0);
        saved.status = Some(SavedItemStatus::Archived);
        let (_, legacy) = transform_item(&saved, &complete());
        assert_eq!(legacy.time_added, "1600000000");
        assert_eq!(legacy.time_read, "0");
        assert_eq!(legacy.time_updated, "0");
        assert_eq!(legacy.time_favorited, "0");
        assert_eq!(legacy.status, "1");
    }

    #[test]
    fn test_zero_tags_placeholder() {
        let saved = parsed(article());
        let (_, legacy) = transform_item(&saved, &complete());
        let tags = legacy.tags.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[""].tag, "");
        assert_eq!(tags[""].item_id, "100");
    }

    #[test]
    fn test_tags_keyed_by_name() {
        let mut saved = parsed(article());
        saved.tags = Some(vec![Tag { name: "rust".into() }, Tag { name: "web".into() }]);
        let (_, legacy) = transform_item(&saved, &complete());
        let json = serde_json::to_value(&legacy).unwrap();
        assert_eq!(
            json["tags"],
            json!({
                "rust": {"item_id": "100", "tag": "rust"},
                "web": {"item_id": "100", "tag": "web"}
            })
        );
    }

    #[test]
    fn test_null_facets_omitted() {
        let mut item = article();
        item.images = Some(vec![]);
        let saved = parsed(item);
        let json = serde_json::to_value(transform_item(&saved, &complete()).1).unwrap();
        assert!(json.get("images").is_none());
        assert!(json.get("videos").is_none());
        assert!(json.get("authors").is_none());
        assert!(json.get("domain_metadata").is_none());
        assert!(json.get("annotations").is_none());
    }

    #[test]
    fn test_facets_numbered_from_one() {
        let mut item = article();
        item.authors = Some(vec![
            Author {
                id: Some("a9".into()),
                name: Some("Ada".into()),
                url: None,
            },
            Author {
                id: None,
                name: Some("Grace".into()),
                url: Some("https://g".into()),
            },
        ]);
        item.videos = Some(vec![Video {
            src: "https://v".into(),
            width: Some(640),
            height: None,
            kind: Some(VideoKind::Youtube),
            vid: Some("abc".into()),
            length: Some(90),
        }]);
        let saved = parsed(item);
        let json = serde_json::to_value(transform_item(&saved, &complete()).1).unwrap();
        assert_eq!(json["authors"]["1"]["author_id"], "a9");
        assert_eq!(json["authors"]["2"]["author_id"], "2");
        assert_eq!(json["authors"]["2"]["url"], "https://g");
        assert_eq!(
            json["videos"]["1"],
            json!({
                "item_id": "100", "video_id": "1", "src": "https://v", "width": "640",
                "height": "0", "type": "1", "vid": "abc", "length": "90"
            })
        );
    }

    #[test]
    fn test_domain_metadata_name_only() {
        let mut item = article();
        item.domain_metadata = Some(DomainMetadata {
            name: Some("Example".into()),
            ..Default::default()
        });
        let json = serde_json::to_value(transform_item(&parsed(item), &complete()).1).unwrap();
        assert_eq!(json["domain_metadata"], json!({"name": "Example"}));
    }

    #[test]
    fn test_simple_detail_has_no_facets() {
        let mut item = article();
        item.domain_metadata = Some(DomainMetadata {
            name: Some("Example".into()),
            ..Default::default()
        });
        let saved = parsed(item);
        let json = serde_json::to_value(
            transform_item(&saved, &TransformContext::default()).1,
        )
        .unwrap();
        assert!(json.get("tags").is_none());
        assert!(json.get("domain_metadata").is_none());
    }

    #[test]
    fn test_annotations_only_when_requested() {
        let mut saved = parsed(article());
        saved.annotations = Some(Annotations {
            highlights: Some(vec![Highlight {
                id: "h1".into(),
                quote: "a quote".into(),
                patch: "@@ -1 +1 @@".into(),
                version: 2,
                created_at: 1_709_294_400,
            }]),
        });

        let (_, without) = transform_item(&saved, &complete());
        assert!(without.annotations.is_none());

        let ctx = TransformContext {
            annotations: true,
            ..complete()
        };
        let (_, with) = transform_item(&saved, &ctx);
        let json = serde_json::to_value(with).unwrap();
        assert_eq!(
            json["annotations"],
            json!([{
                "annotation_id": "h1", "item_id": "100", "quote": "a quote",
                "patch": "@@ -1 +1 @@", "version": 2, "created_at": "2024-03-01T12:00:00.000Z"
            }])
        );
    }

    #[test]
    fn test_pending_item_minimal_record() {
        let mut saved = SavedItem::new("55", "https://slow.example");
        saved.item = Some(ItemResult::PendingItem(PendingItem {
            url: "https://slow.example/x".into(),
            status: None,
        }));
        saved.title = Some("Reading list".into());
        let (key, legacy) = transform_item(&saved, &TransformContext::default());
        assert_eq!(key, "55");
        assert_eq!(legacy.given_url, "https://slow.example/x");
        assert_eq!(legacy.resolved_url, "https://slow.example/x");
        assert_eq!(legacy.given_title, "Reading list");
        assert_eq!(legacy.resolved_title, "Reading list");
        assert_eq!(legacy.excerpt, "");
        assert_eq!(legacy.is_article, "0");
        assert_eq!(legacy.word_count, "0");
    }

    #[test]
    fn test_add_item_tags_for_extensions_only() {
        let mut saved = parsed(article());
        saved.tags = Some(vec![Tag { name: "later".into() }]);

        let plain = transform_add_item(&saved, false);
        assert!(plain.tags.is_none());
        assert_eq!(plain.title, "Resolved Title");
        assert_eq!(plain.time_first_parsed, "0");
        assert_eq!(plain.date_resolved, NEVER_RESOLVED);

        let ext = transform_add_item(&saved, true);
        assert_eq!(ext.tags.unwrap()["later"].tag, "later");
    }

    #[test]
    fn test_add_item_pending() {
        let mut saved = SavedItem::new("56", "https://slow.example");
        saved.item = Some(ItemResult::PendingItem(PendingItem {
            url: "https://slow.example".into(),
            status: Some("UNRESOLVED".into()),
        }));
        let add = transform_add_item(&saved, false);
        assert_eq!(add.item_id, "56");
        assert_eq!(add.normal_url, "https://slow.example");
        assert_eq!(add.has_image, "0");
        assert_eq!(add.title, "");
    }

    #[test]
    fn test_add_item_pending_keeps_user_title() {
        let mut saved = SavedItem::new("57", "https://slow.example");
        saved.title = Some("My Title".into());
        saved.item = Some(ItemResult::PendingItem(PendingItem {
            url: "https://slow.example".into(),
            status: None,
        }));
        let add = transform_add_item(&saved, false);
        assert_eq!(add.title, "My Title");

        saved.title = Some(String::new());
        assert_eq!(transform_add_item(&saved, false).title, "");
    }

    #[test]
    fn test_unresolved_item_keeps_user_title() {
        let mut saved = SavedItem::new("58", "https://never.example");
        saved.title = Some("Saved for later".into());
        let (_, legacy) = transform_item(&saved, &TransformContext::default());
        assert_eq!(legacy.given_title, "Saved for later");
        assert_eq!(legacy.given_url, "https://never.example");
    }
}
