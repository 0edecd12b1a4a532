//! The closed set of upstream operations the proxy issues.

const SAVED_ITEM_SIMPLE: &str = r#"
fragment SavedItemSimple on SavedItem {
  id
  url
  title
  status
  isFavorite
  isArchived
  createdAt
  updatedAt
  archivedAt
  favoritedAt
  annotations @include(if: $withAnnotations) {
    highlights { id quote patch version _createdAt }
  }
  item {
    __typename
    ... on Item {
      itemId
      resolvedId
      givenUrl
      resolvedUrl
      title
      excerpt
      isArticle
      isIndex
      hasImage
      hasVideo
      wordCount
      language
      timeToRead
      listenDurationEstimate
      topImageUrl
    }
    ... on PendingItem { url status }
  }
}
"#;

const SAVED_ITEM_COMPLETE: &str = r#"
fragment SavedItemComplete on SavedItem {
  ...SavedItemSimple
  tags { name }
  item {
    __typename
    ... on Item {
      domainMetadata { name logo logoGreyscale }
      authors { id name url }
      images { src width height credit caption }
      videos { src width height type vid length }
    }
  }
}
"#;

const SAVED_ITEM_ADDED: &str = r#"
fragment SavedItemAdded on SavedItem {
  id
  url
  title
  tags { name }
  item {
    __typename
    ... on Item {
      itemId
      resolvedId
      givenUrl
      resolvedUrl
      title
      excerpt
      isArticle
      isIndex
      hasImage
      hasVideo
      wordCount
      language
      dateResolved
      domainMetadata { name logo logoGreyscale }
      authors { id name url }
      images { src width height credit caption }
      videos { src width height type vid length }
    }
    ... on PendingItem { url status }
  }
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSavedItemsSimple,
    GetSavedItemsComplete,
    SearchSavedItemsSimple,
    SearchSavedItemsComplete,
    UpsertSavedItem,
    ReAddSavedItemById,
    ArchiveById,
    ArchiveByUrl,
    FavoriteById,
    FavoriteByUrl,
    UnfavoriteById,
    UnfavoriteByUrl,
    DeleteById,
    DeleteByUrl,
    TagsAddById,
    TagsAddByUrl,
    TagsRemoveById,
    TagsRemoveByUrl,
    TagsReplaceById,
    TagsReplaceByUrl,
    TagsClearById,
    TagsClearByUrl,
    RenameTag,
    DeleteTag,
    SaveRecentSearch,
}

impl Operation {
    /// The `operationName` sent upstream.
    pub fn name(self) -> &'static str {
        match self {
            Self::GetSavedItemsSimple => "GetSavedItemsSimple",
            Self::GetSavedItemsComplete => "GetSavedItemsComplete",
            Self::SearchSavedItemsSimple => "SearchSavedItemsSimple",
            Self::SearchSavedItemsComplete => "SearchSavedItemsComplete",
            Self::UpsertSavedItem => "UpsertSavedItem",
            Self::ReAddSavedItemById => "ReAddSavedItemById",
            Self::ArchiveById => "ArchiveById",
            Self::ArchiveByUrl => "ArchiveByUrl",
            Self::FavoriteById => "FavoriteById",
            Self::FavoriteByUrl => "FavoriteByUrl",
            Self::UnfavoriteById => "UnfavoriteById",
            Self::UnfavoriteByUrl => "UnfavoriteByUrl",
            Self::DeleteById => "DeleteById",
            Self::DeleteByUrl => "DeleteByUrl",
            Self::TagsAddById => "TagsAddById",
            Self::TagsAddByUrl => "TagsAddByUrl",
            Self::TagsRemoveById => "TagsRemoveById",
            Self::TagsRemoveByUrl => "TagsRemoveByUrl",
            Self::TagsReplaceById => "TagsReplaceById",
            Self::TagsReplaceByUrl => "TagsReplaceByUrl",
            Self::TagsClearById => "TagsClearById",
            Self::TagsClearByUrl => "TagsClearByUrl",
            Self::RenameTag => "RenameTag",
            Self::DeleteTag => "DeleteTag",
            Self::SaveRecentSearch => "SaveRecentSearch",
        }
    }

    /// The full operation document, fragments included.
    pub fn document(self) -> String {
        let name = self.name();
        match self {
            Self::GetSavedItemsSimple | Self::GetSavedItemsComplete => {
                let (spread, fragments) = self.item_fragments();
                format!(
                    "query {name}($filter: SavedItemsFilter, $sort: SavedItemsSort, \
                     $pagination: OffsetPaginationInput, $withAnnotations: Boolean!, \
                     $withTagList: Boolean!) {{\n\
                     \x20 user {{\n\
                     \x20   savedItems(filter: $filter, sort: $sort, pagination: $pagination) {{\n\
                     \x20     totalCount\n\
                     \x20     edges {{ cursor node {{ ...{spread} }} }}\n\
                     \x20   }}\n\
                     \x20   tags @include(if: $withTagList) {{ name }}\n\
                     \x20 }}\n\
                     }}\n{fragments}"
                )
            }
            Self::SearchSavedItemsSimple | Self::SearchSavedItemsComplete => {
                let (spread, fragments) = self.item_fragments();
                format!(
                    "query {name}($term: String!, $filter: SearchFilterInput, \
                     $sort: SearchSortInput, $pagination: OffsetPaginationInput, \
                     $withAnnotations: Boolean!, $withTagList: Boolean!) {{\n\
                     \x20 user {{\n\
                     \x20   searchSavedItems(term: $term, filter: $filter, sort: $sort, pagination: $pagination) {{\n\
                     \x20     totalCount\n\
                     \x20     edges {{ node {{ savedItem {{ ...{spread} }} }} }}\n\
                     \x20   }}\n\
                     \x20   tags @include(if: $withTagList) {{ name }}\n\
                     \x20 }}\n\
                     }}\n{fragments}"
                )
            }
            Self::UpsertSavedItem => format!(
                "mutation {name}($input: SavedItemUpsertInput!) {{\n\
                 \x20 upsertSavedItem(input: $input) {{ ...SavedItemAdded }}\n\
                 }}\n{added}",
                added = SAVED_ITEM_ADDED
            ),
            Self::ReAddSavedItemById => format!(
                "mutation {name}($id: ID!, $timestamp: ISOString!) {{\n\
                 \x20 reAddSavedItem(id: $id, timestamp: $timestamp) {{ ...SavedItemAdded }}\n\
                 }}\n{added}",
                added = SAVED_ITEM_ADDED
            ),
            Self::ArchiveById => by_id(name, "updateSavedItemArchive"),
            Self::FavoriteById => by_id(name, "updateSavedItemFavorite"),
            Self::UnfavoriteById => by_id(name, "updateSavedItemUnFavorite"),
            Self::DeleteById => by_id(name, "deleteSavedItem"),
            Self::ArchiveByUrl => by_url(name, "savedItemArchive"),
            Self::FavoriteByUrl => by_url(name, "savedItemFavorite"),
            Self::UnfavoriteByUrl => by_url(name, "savedItemUnFavorite"),
            Self::DeleteByUrl => by_url(name, "savedItemDelete"),
            Self::TagsAddById | Self::TagsAddByUrl => with_tags(name, "savedItemTagsAdd"),
            Self::TagsRemoveById | Self::TagsRemoveByUrl => {
                with_tags(name, "savedItemTagsRemove")
            }
            Self::TagsReplaceById | Self::TagsReplaceByUrl => {
                with_tags(name, "savedItemTagsReplace")
            }
            Self::TagsClearById | Self::TagsClearByUrl => format!(
                "mutation {name}($savedItem: SavedItemRef!, $timestamp: ISOString!) {{\n\
                 \x20 savedItemTagsClear(savedItem: $savedItem, timestamp: $timestamp) {{ id }}\n\
                 }}\n"
            ),
            Self::RenameTag => format!(
                "mutation {name}($oldName: String!, $newName: String!, $timestamp: ISOString!) {{\n\
                 \x20 renameTagByName(oldName: $oldName, newName: $newName, timestamp: $timestamp) {{ name }}\n\
                 }}\n"
            ),
            Self::DeleteTag => format!(
                "mutation {name}($tagName: String!, $timestamp: ISOString!) {{\n\
                 \x20 deleteTagByName(tagName: $tagName, timestamp: $timestamp)\n\
                 }}\n"
            ),
            Self::SaveRecentSearch => format!(
                "mutation {name}($search: RecentSearchInput!) {{\n\
                 \x20 saveSearch(search: $search) {{ term }}\n\
                 }}\n"
            ),
        }
    }

    fn item_fragments(self) -> (&'static str, String) {
        match self {
            Self::GetSavedItemsComplete | Self::SearchSavedItemsComplete => (
                "SavedItemComplete",
                [SAVED_ITEM_SIMPLE, SAVED_ITEM_COMPLETE].concat(),
            ),
            _ => ("SavedItemSimple", SAVED_ITEM_SIMPLE.to_string()),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn by_id(name: &str, field: &str) -> String {
    format!(
        "mutation {name}($id: ID!, $timestamp: ISOString!) {{\n\
         \x20 {field}(id: $id, timestamp: $timestamp) {{ id }}\n\
         }}\n"
    )
}

fn by_url(name: &str, field: &str) -> String {
    format!(
        "mutation {name}($givenUrl: Url!, $timestamp: ISOString!) {{\n\
         \x20 {field}(givenUrl: $givenUrl, timestamp: $timestamp) {{ url }}\n\
         }}\n"
    )
}

fn with_tags(name: &str, field: &str) -> String {
    format!(
        "mutation {name}($savedItem: SavedItemRef!, $tagNames: [String!]!, $timestamp: ISOString!) {{\n\
         \x20 {field}(savedItem: $savedItem, tagNames: $tagNames, timestamp: $timestamp) {{ id }}\n\
         }}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_declares_its_name() {
        for op in [
            Operation::GetSavedItemsComplete,
            Operation::TagsReplaceById,
            Operation::DeleteByUrl,
            Operation::SaveRecentSearch,
        ] {
            let doc = op.document();
            assert!(doc.contains(op.name()), "{op} missing its name");
        }
    }

    #[test]
    fn test_complete_queries_include_both_fragments() {
        let doc = Operation::SearchSavedItemsComplete.document();
        assert!(doc.contains("fragment SavedItemSimple"));
        assert!(doc.contains("fragment SavedItemComplete"));
        assert!(doc.contains("...SavedItemComplete"));
        assert!(doc.contains("searchSavedItems("));
    }

    #[test]
    fn test_simple_query_omits_facets() {
        let doc = Operation::GetSavedItemsSimple.document();
        assert!(!doc.contains("authors"));
        assert!(!doc.contains("fragment SavedItemComplete"));
        assert!(doc.contains("@include(if: $withAnnotations)"));
    }

    #[test]
    fn test_by_id_and_by_url_documents_differ() {
        let by_id = Operation::ArchiveById.document();
        let by_url = Operation::ArchiveByUrl.document();
        assert!(by_id.contains("$id: ID!"));
        assert!(by_url.contains("$givenUrl: Url!"));
    }
}
