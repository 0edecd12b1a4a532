//! Runs validated write actions against the upstream, one at a time and in
//! order, collecting the parallel result/error arrays.

use serde::Serialize;
use serde_json::{json, Value};

use crate::clock::iso8601;
use crate::credentials::Caller;
use crate::error::{RelicError, Result};
use crate::graph::{execute_as, GraphBackend, Operation};
use crate::legacy_error::{action_outcome, report_batch, ErrorClass};
use crate::model::{
    Action, ActionBatch, ActionKind, ActionResult, BatchResult, LegacyError, ReAddResponse,
    SavedItem, Tag, Target, UpsertResponse,
};
use crate::transform::transform_add_item;

pub struct Dispatcher<'a, B: ?Sized> {
    backend: &'a B,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertInput<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    /// Unix seconds; the only write that takes a raw integer timestamp.
    timestamp: i64,
}

impl<'a, B> Dispatcher<'a, B>
where
    B: GraphBackend + ?Sized,
{
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Run every action of the batch. A failing action never stops the ones after it.
    ///
    /// Reportable failures are collected and reported once for the whole batch.
    pub async fn dispatch(&self, batch: &ActionBatch) -> BatchResult {
        let mut results = BatchResult::default();
        let mut failures = Vec::new();
        for action in &batch.actions {
            if let ActionKind::Unsupported { ref name } = action.kind {
                tracing::debug!(action = %name, "unsupported action");
                results.push(ActionResult::Failure(LegacyError::invalid_action(name)));
                continue;
            }

            match self.perform(action, &batch.caller).await {
                Ok(value) => results.push(ActionResult::Success(value)),
                Err(e) => {
                    let class = ErrorClass::of(&e);
                    results.push(action_outcome(&action.kind, &class));
                    failures.push((action.kind.name(), class));
                }
            }
        }
        report_batch(&failures);
        results
    }

    /// Run one action and return its raw outcome, untranslated and unreported.
    ///
    /// Unsupported actions are rejected as invalid input without an upstream call.
    pub async fn perform(&self, action: &Action, caller: &Caller) -> Result<Value> {
        let timestamp = iso8601(action.time);
        tracing::debug!(action = action.kind.name(), "dispatching action");

        match action.kind {
            ActionKind::Add {
                ref title,
                ref tags,
            } => return self.add(action, title.as_deref(), tags, caller).await,
            ActionKind::ReAdd => return self.readd(action, &timestamp, caller).await,
            ActionKind::Archive => {
                self.by_target(
                    action,
                    Operation::ArchiveById,
                    Operation::ArchiveByUrl,
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::Favorite => {
                self.by_target(
                    action,
                    Operation::FavoriteById,
                    Operation::FavoriteByUrl,
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::Unfavorite => {
                self.by_target(
                    action,
                    Operation::UnfavoriteById,
                    Operation::UnfavoriteByUrl,
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::Delete => {
                self.by_target(
                    action,
                    Operation::DeleteById,
                    Operation::DeleteByUrl,
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::TagsAdd(ref tags) => {
                self.tags(
                    action,
                    Operation::TagsAddById,
                    Operation::TagsAddByUrl,
                    Some(tags.as_slice()),
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::TagsRemove(ref tags) => {
                self.tags(
                    action,
                    Operation::TagsRemoveById,
                    Operation::TagsRemoveByUrl,
                    Some(tags.as_slice()),
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::TagsReplace(ref tags) => {
                self.tags(
                    action,
                    Operation::TagsReplaceById,
                    Operation::TagsReplaceByUrl,
                    Some(tags.as_slice()),
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::TagsClear => {
                self.tags(
                    action,
                    Operation::TagsClearById,
                    Operation::TagsClearByUrl,
                    None,
                    &timestamp,
                    caller,
                )
                .await?;
            }
            ActionKind::TagRename {
                ref old_tag,
                ref new_tag,
            } => {
                let vars = json!({"oldName": old_tag, "newName": new_tag, "timestamp": timestamp});
                self.backend.execute(Operation::RenameTag, vars, caller).await?;
            }
            ActionKind::TagDelete { ref tag } => {
                let vars = json!({"tagName": tag, "timestamp": timestamp});
                self.backend.execute(Operation::DeleteTag, vars, caller).await?;
            }
            ActionKind::RecentSearch { ref term } => {
                let vars = json!({"search": {"term": term, "timestamp": timestamp}});
                self.backend
                    .execute(Operation::SaveRecentSearch, vars, caller)
                    .await?;
            }
            ActionKind::Unsupported { ref name } => {
                return Err(RelicError::invalid(format!("unsupported action: {name}")))
            }
        }

        Ok(Value::Bool(true))
    }

    /// Upsert by URL, then attach tags to the id the upsert returned.
    async fn add(
        &self,
        action: &Action,
        title: Option<&str>,
        tags: &[String],
        caller: &Caller,
    ) -> Result<Value> {
        let url = action
            .url
            .as_deref()
            .ok_or_else(|| RelicError::invalid("add: url is required"))?;

        let input = UpsertInput {
            url,
            title,
            timestamp: action.time.timestamp(),
        };
        let resp: UpsertResponse = execute_as(
            self.backend,
            Operation::UpsertSavedItem,
            json!({ "input": input }),
            caller,
        )
        .await?;
        let mut saved = resp.upsert_saved_item;

        if !tags.is_empty() {
            let vars = json!({
                "savedItem": {"id": saved.id},
                "tagNames": tags,
                "timestamp": iso8601(action.time),
            });
            self.backend
                .execute(Operation::TagsAddById, vars, caller)
                .await?;
            merge_tags(&mut saved, tags);
        }

        add_item_value(&saved, caller)
    }

    async fn readd(&self, action: &Action, timestamp: &str, caller: &Caller) -> Result<Value> {
        let id = action
            .item_id
            .as_deref()
            .ok_or_else(|| RelicError::invalid("readd: item_id is required"))?;
        let resp: ReAddResponse = execute_as(
            self.backend,
            Operation::ReAddSavedItemById,
            json!({"id": id, "timestamp": timestamp}),
            caller,
        )
        .await?;
        add_item_value(&resp.re_add_saved_item, caller)
    }

    async fn by_target(
        &self,
        action: &Action,
        by_id: Operation,
        by_url: Operation,
        timestamp: &str,
        caller: &Caller,
    ) -> Result<Value> {
        let (operation, vars) = match target(action)? {
            Target::Id(id) => (by_id, json!({"id": id, "timestamp": timestamp})),
            Target::Url(url) => (by_url, json!({"givenUrl": url, "timestamp": timestamp})),
        };
        self.backend.execute(operation, vars, caller).await
    }

    async fn tags(
        &self,
        action: &Action,
        by_id: Operation,
        by_url: Operation,
        tags: Option<&[String]>,
        timestamp: &str,
        caller: &Caller,
    ) -> Result<Value> {
        let (operation, saved_item) = match target(action)? {
            Target::Id(id) => (by_id, json!({ "id": id })),
            Target::Url(url) => (by_url, json!({ "url": url })),
        };
        let mut vars = json!({"savedItem": saved_item, "timestamp": timestamp});
        if let Some(tags) = tags {
            vars["tagNames"] = json!(tags);
        }
        self.backend.execute(operation, vars, caller).await
    }
}

fn target(action: &Action) -> Result<Target<'_>> {
    action.target().ok_or_else(|| {
        RelicError::invalid(format!("{}: item_id or url is required", action.kind.name()))
    })
}

fn merge_tags(saved: &mut SavedItem, tags: &[String]) {
    let existing = saved.tags.get_or_insert_with(Vec::new);
    for name in tags {
        if !existing.iter().any(|t| &t.name == name) {
            existing.push(Tag { name: name.clone() });
        }
    }
}

fn add_item_value(saved: &SavedItem, caller: &Caller) -> Result<Value> {
    Ok(serde_json::to_value(transform_add_item(saved, caller.is_extension))?)
}
