use crate::domain::error::{DomainError, check_length};
use crate::domain::list::{ContentType, ItemOrder, ListItem, ListKind, NewListItem, UserList};
use crate::domain::repository::ListRepository;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub struct ListService {
    list_repository: Arc<dyn ListRepository>,
}

impl ListService {
    pub fn new(list_repository: Arc<dyn ListRepository>) -> Self {
        Self { list_repository }
    }

    /// Creates the Watchlist and Favourites of a user if they are missing.
    #[instrument(skip(self))]
    pub async fn ensure_default_lists(&self, user_id: Uuid) -> Result<(UserList, UserList)> {
        let watchlist = self
            .list_repository
            .ensure_list(user_id, ListKind::Watchlist)
            .await?;
        let favourites = self
            .list_repository
            .ensure_list(user_id, ListKind::Favourites)
            .await?;
        debug!(watchlist_id = %watchlist.id, favourites_id = %favourites.id, "Default lists ready");
        Ok((watchlist, favourites))
    }

    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn get_list(&self, user_id: Uuid, kind: ListKind) -> Result<UserList> {
        self.list_repository
            .find_list(user_id, kind)
            .await?
            .ok_or_else(|| {
                warn!("List missing for user");
                DomainError::NotFound(format!("{} not found.", kind)).into()
            })
    }

    pub async fn lists_for_user(&self, user_id: Uuid) -> Result<Vec<UserList>> {
        self.list_repository.lists_for_user(user_id).await
    }

    /// Adds content to a list. Membership is checked per list and
    /// (content_id, content_type), atomically with the insert.
    #[instrument(skip(self, list, item), fields(list_id = %list.id, content_id = item.content_id, content_type = %item.content_type))]
    pub async fn add_item(&self, list: &UserList, item: NewListItem) -> Result<ListItem> {
        let title = item.title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation("A title is required.".to_string()).into());
        }
        check_length("Title", title)?;
        let item = NewListItem {
            title: title.to_string(),
            poster_path: item
                .poster_path
                .map(|path| path.trim().to_string())
                .filter(|path| !path.is_empty()),
            ..item
        };
        if let Some(path) = &item.poster_path {
            check_length("Poster path", path)?;
        }

        match self
            .list_repository
            .insert_item_if_absent(list.id, item)
            .await?
        {
            Some(stored) => {
                info!(item_id = stored.id, "Item added to {}", list.kind);
                Ok(stored)
            }
            None => {
                warn!("Item already in {}", list.kind);
                Err(DomainError::AlreadyExists(format!(
                    "Item already exists in {}.",
                    list.kind.name().to_lowercase()
                ))
                .into())
            }
        }
    }

    #[instrument(skip(self, list), fields(list_id = %list.id))]
    pub async fn remove_item(
        &self,
        list: &UserList,
        content_id: i64,
        content_type: Option<ContentType>,
    ) -> Result<()> {
        let removed = self
            .list_repository
            .delete_items(list.id, content_id, content_type)
            .await?;
        if removed == 0 {
            warn!("Nothing to remove");
            return Err(DomainError::NotFound(format!(
                "Item is not in your {}.",
                list.kind.name().to_lowercase()
            ))
            .into());
        }
        info!(removed = removed, "Item removed from {}", list.kind);
        Ok(())
    }

    pub async fn list_items(&self, list: &UserList, order: ItemOrder) -> Result<Vec<ListItem>> {
        self.list_repository.items(list.id, order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::list_repository::InMemoryListRepository;
    use crate::domain::error::MAX_TEXT_LEN;

    fn service() -> ListService {
        ListService::new(Arc::new(InMemoryListRepository::new()))
    }

    fn item(content_id: i64, title: &str, poster_path: Option<&str>) -> NewListItem {
        NewListItem {
            content_id,
            content_type: ContentType::Movie,
            title: title.to_string(),
            poster_path: poster_path.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_get_list_missing_is_not_found() {
        let err = service()
            .get_list(Uuid::new_v4(), ListKind::Watchlist)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_add_item_normalizes_blank_poster_and_requires_title() {
        let service = service();
        let (watchlist, _) = service.ensure_default_lists(Uuid::new_v4()).await.unwrap();

        let stored = service
            .add_item(&watchlist, item(1, "  Heat ", Some("  ")))
            .await
            .unwrap();
        assert_eq!(stored.title, "Heat");
        assert_eq!(stored.poster_path, None);

        let err = service
            .add_item(&watchlist, item(2, " ", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_add_item_rejects_oversized_text() {
        let service = service();
        let (watchlist, _) = service.ensure_default_lists(Uuid::new_v4()).await.unwrap();
        let long = "x".repeat(MAX_TEXT_LEN + 1);

        for new_item in [item(1, &long, None), item(2, "Heat", Some(long.as_str()))] {
            let err = service.add_item(&watchlist, new_item).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DomainError>(),
                Some(DomainError::Validation(_))
            ));
        }
        assert!(
            service
                .list_items(&watchlist, ItemOrder::NewestFirst)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_duplicate_message_names_the_list() {
        let service = service();
        let (_, favourites) = service.ensure_default_lists(Uuid::new_v4()).await.unwrap();
        service
            .add_item(&favourites, item(5, "Alien", None))
            .await
            .unwrap();

        let err = service
            .add_item(&favourites, item(5, "Alien", None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Item already exists in favourites.");
    }
}
