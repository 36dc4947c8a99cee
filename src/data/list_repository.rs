use crate::domain::list::{ContentType, ItemOrder, ListItem, ListKind, NewListItem, UserList};
use crate::domain::repository::ListRepository;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

#[derive(Default)]
struct ListStorage {
    lists: HashMap<(Uuid, ListKind), UserList>,
    /// Items per list in insertion order.
    items: HashMap<Uuid, Vec<ListItem>>,
    next_item_id: i64,
}

/// List store kept in process memory. Every mutation runs under a single
/// write lock, so membership checks and inserts cannot interleave.
#[derive(Clone)]
pub struct InMemoryListRepository {
    storage: Arc<RwLock<ListStorage>>,
}

impl InMemoryListRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(ListStorage::default())),
        }
    }
}

impl Default for InMemoryListRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListRepository for InMemoryListRepository {
    #[instrument(skip(self), fields(user_id = %user_id, kind = %kind))]
    async fn ensure_list(&self, user_id: Uuid, kind: ListKind) -> Result<UserList> {
        let mut storage = self.storage.write().await;
        let list = storage
            .lists
            .entry((user_id, kind))
            .or_insert_with(|| {
                debug!("Creating list");
                UserList {
                    id: Uuid::new_v4(),
                    user_id,
                    kind,
                    created_at: Utc::now(),
                }
            })
            .clone();
        Ok(list)
    }

    async fn find_list(&self, user_id: Uuid, kind: ListKind) -> Result<Option<UserList>> {
        let storage = self.storage.read().await;
        Ok(storage.lists.get(&(user_id, kind)).cloned())
    }

    async fn lists_for_user(&self, user_id: Uuid) -> Result<Vec<UserList>> {
        let storage = self.storage.read().await;
        let mut lists: Vec<UserList> = storage
            .lists
            .values()
            .filter(|list| list.user_id == user_id)
            .cloned()
            .collect();
        lists.sort_by_key(|list| list.kind.name());
        Ok(lists)
    }

    #[instrument(skip(self, item), fields(list_id = %list_id, content_id = item.content_id, content_type = %item.content_type))]
    async fn insert_item_if_absent(
        &self,
        list_id: Uuid,
        item: NewListItem,
    ) -> Result<Option<ListItem>> {
        trace!("Acquiring write lock for list storage");
        let mut storage = self.storage.write().await;
        let exists = storage.items.get(&list_id).is_some_and(|items| {
            items.iter().any(|existing| {
                existing.content_id == item.content_id && existing.content_type == item.content_type
            })
        });
        if exists {
            debug!("Item already present in list");
            return Ok(None);
        }

        storage.next_item_id += 1;
        let stored = ListItem {
            id: storage.next_item_id,
            list_id,
            content_id: item.content_id,
            content_type: item.content_type,
            title: item.title,
            poster_path: item.poster_path,
            added_at: Utc::now(),
        };
        storage
            .items
            .entry(list_id)
            .or_default()
            .push(stored.clone());
        debug!(item_id = stored.id, "Item stored");
        Ok(Some(stored))
    }

    #[instrument(skip(self), fields(list_id = %list_id, content_id = content_id))]
    async fn delete_items(
        &self,
        list_id: Uuid,
        content_id: i64,
        content_type: Option<ContentType>,
    ) -> Result<u64> {
        let mut storage = self.storage.write().await;
        let Some(items) = storage.items.get_mut(&list_id) else {
            return Ok(0);
        };
        let before = items.len();
        items.retain(|item| {
            !(item.content_id == content_id
                && content_type.is_none_or(|kind| kind == item.content_type))
        });
        let removed = (before - items.len()) as u64;
        debug!(removed = removed, "Items removed");
        Ok(removed)
    }

    async fn items(&self, list_id: Uuid, order: ItemOrder) -> Result<Vec<ListItem>> {
        let storage = self.storage.read().await;
        let mut items = storage.items.get(&list_id).cloned().unwrap_or_default();
        if order == ItemOrder::NewestFirst {
            items.reverse();
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(content_id: i64) -> NewListItem {
        NewListItem {
            content_id,
            content_type: ContentType::Movie,
            title: format!("Movie {}", content_id),
            poster_path: Some(format!("/poster{}.jpg", content_id)),
        }
    }

    #[tokio::test]
    async fn test_ensure_list_is_idempotent() {
        let repo = InMemoryListRepository::new();
        let user_id = Uuid::new_v4();

        let first = repo.ensure_list(user_id, ListKind::Watchlist).await.unwrap();
        let second = repo.ensure_list(user_id, ListKind::Watchlist).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.lists_for_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lists_are_scoped_to_owner() {
        let repo = InMemoryListRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let alice_list = repo.ensure_list(alice, ListKind::Favourites).await.unwrap();
        let bob_list = repo.ensure_list(bob, ListKind::Favourites).await.unwrap();

        assert_ne!(alice_list.id, bob_list.id);
        assert!(repo.find_list(alice, ListKind::Watchlist).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_item_if_absent_skips_duplicates_in_same_list() {
        let repo = InMemoryListRepository::new();
        let list_id = Uuid::new_v4();

        assert!(repo.insert_item_if_absent(list_id, movie(42)).await.unwrap().is_some());
        assert!(repo.insert_item_if_absent(list_id, movie(42)).await.unwrap().is_none());

        let tv = NewListItem {
            content_type: ContentType::Tv,
            ..movie(42)
        };
        assert!(repo.insert_item_if_absent(list_id, tv).await.unwrap().is_some());

        let other_list = Uuid::new_v4();
        assert!(repo.insert_item_if_absent(other_list, movie(42)).await.unwrap().is_some());

        assert_eq!(repo.items(list_id, ItemOrder::NewestFirst).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_items_ordering() {
        let repo = InMemoryListRepository::new();
        let list_id = Uuid::new_v4();
        for id in 1..=3 {
            repo.insert_item_if_absent(list_id, movie(id)).await.unwrap();
        }

        let newest: Vec<i64> = repo
            .items(list_id, ItemOrder::NewestFirst)
            .await
            .unwrap()
            .iter()
            .map(|item| item.content_id)
            .collect();
        let oldest: Vec<i64> = repo
            .items(list_id, ItemOrder::OldestFirst)
            .await
            .unwrap()
            .iter()
            .map(|item| item.content_id)
            .collect();

        assert_eq!(newest, vec![3, 2, 1]);
        assert_eq!(oldest, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_items_respects_list_and_type() {
        let repo = InMemoryListRepository::new();
        let list_id = Uuid::new_v4();
        let other_list = Uuid::new_v4();
        repo.insert_item_if_absent(list_id, movie(7)).await.unwrap();
        repo.insert_item_if_absent(other_list, movie(7)).await.unwrap();

        assert_eq!(
            repo.delete_items(list_id, 7, Some(ContentType::Tv)).await.unwrap(),
            0
        );
        assert_eq!(repo.delete_items(list_id, 7, None).await.unwrap(), 1);
        assert_eq!(repo.delete_items(list_id, 7, None).await.unwrap(), 0);
        assert_eq!(
            repo.items(other_list, ItemOrder::NewestFirst).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_inserts_store_single_item() {
        let repo = InMemoryListRepository::new();
        let list_id = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo_clone = repo.clone();
                tokio::spawn(async move { repo_clone.insert_item_if_absent(list_id, movie(99)).await })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(repo.items(list_id, ItemOrder::NewestFirst).await.unwrap().len(), 1);
    }
}
