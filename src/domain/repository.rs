use crate::domain::list::{ContentType, ItemOrder, ListItem, ListKind, NewListItem, UserList};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. Fails with `DomainError::DuplicateEmail` when the
    /// email is taken; the check and the insert are one atomic step.
    /// A backend that also stores lists may create the default lists in
    /// the same transaction.
    async fn insert_user(&self, user: User) -> Result<()>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;
}

#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Returns the user's list of this kind, creating it if missing.
    async fn ensure_list(&self, user_id: Uuid, kind: ListKind) -> Result<UserList>;
    async fn find_list(&self, user_id: Uuid, kind: ListKind) -> Result<Option<UserList>>;
    async fn lists_for_user(&self, user_id: Uuid) -> Result<Vec<UserList>>;

    /// Inserts the item unless the list already holds the same
    /// (content_id, content_type). Returns `None` in that case.
    async fn insert_item_if_absent(
        &self,
        list_id: Uuid,
        item: NewListItem,
    ) -> Result<Option<ListItem>>;

    /// Deletes matching items of one list and returns how many were removed.
    async fn delete_items(
        &self,
        list_id: Uuid,
        content_id: i64,
        content_type: Option<ContentType>,
    ) -> Result<u64>;

    async fn items(&self, list_id: Uuid, order: ItemOrder) -> Result<Vec<ListItem>>;
}
