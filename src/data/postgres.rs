use crate::domain::error::DomainError;
use crate::domain::list::{ContentType, ItemOrder, ListItem, ListKind, NewListItem, UserList};
use crate::domain::repository::{ListRepository, UserRepository};
use crate::domain::user::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const USERS_EMAIL_KEY: &str = "users_email_key";

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!(max_connections, "Database pool ready");

    Ok(pool)
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ListRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ListRow> for UserList {
    type Error = anyhow::Error;

    fn try_from(row: ListRow) -> Result<Self> {
        Ok(UserList {
            id: row.id,
            user_id: row.user_id,
            kind: row.name.parse::<ListKind>()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ListItemRow {
    id: i64,
    list_id: Uuid,
    content_id: i64,
    content_title: String,
    content_poster_path: Option<String>,
    content_type: String,
    added_at: DateTime<Utc>,
}

impl TryFrom<ListItemRow> for ListItem {
    type Error = anyhow::Error;

    fn try_from(row: ListItemRow) -> Result<Self> {
        Ok(ListItem {
            id: row.id,
            list_id: row.list_id,
            content_id: row.content_id,
            content_type: row.content_type.parse::<ContentType>()?,
            title: row.content_title,
            poster_path: row.content_poster_path,
            added_at: row.added_at,
        })
    }
}

/// PostgreSQL-backed implementation of the `UserRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    /// Inserts the user and their default lists in one transaction.
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn insert_user(&self, user: User) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.constraint() == Some(USERS_EMAIL_KEY) {
                    warn!("Email already registered");
                    return anyhow::Error::from(DomainError::DuplicateEmail);
                }
            }
            anyhow::Error::new(e).context("Failed to insert user")
        })?;

        for kind in ListKind::ALL {
            sqlx::query(
                r#"
                INSERT INTO lists (id, user_id, name)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, name) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(kind.name())
            .execute(&mut *tx)
            .await
            .context("Failed to create default list")?;
        }

        tx.commit().await.context("Failed to commit user insert")?;
        debug!("User inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by email")?;

        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by id")?;

        Ok(row.map(User::from))
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .context("Failed to update password hash")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("User not found: {}", id)).into());
        }
        Ok(())
    }
}

/// PostgreSQL-backed implementation of the `ListRepository` port.
///
/// Uniqueness of lists per (user, name) and of items per
/// (list, content_id, content_type) is enforced by table constraints; the
/// inserts use `ON CONFLICT DO NOTHING` so concurrent requests cannot create
/// duplicates.
#[derive(Clone, Debug)]
pub struct PostgresListRepository {
    pool: PgPool,
}

impl PostgresListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListRepository for PostgresListRepository {
    #[instrument(skip(self), fields(kind = %kind))]
    async fn ensure_list(&self, user_id: Uuid, kind: ListKind) -> Result<UserList> {
        sqlx::query(
            r#"
            INSERT INTO lists (id, user_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.name())
        .execute(&self.pool)
        .await
        .context("Failed to create list")?;

        self.find_list(user_id, kind)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("{} vanished after insert", kind)).into())
    }

    #[instrument(skip(self), fields(kind = %kind))]
    async fn find_list(&self, user_id: Uuid, kind: ListKind) -> Result<Option<UserList>> {
        let row = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT id, user_id, name, created_at
            FROM lists
            WHERE user_id = $1 AND name = $2
            "#,
        )
        .bind(user_id)
        .bind(kind.name())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get list")?;

        row.map(UserList::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn lists_for_user(&self, user_id: Uuid) -> Result<Vec<UserList>> {
        let rows = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT id, user_id, name, created_at
            FROM lists
            WHERE user_id = $1
            ORDER BY name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get lists for user")?;

        rows.into_iter().map(UserList::try_from).collect()
    }

    #[instrument(skip(self, item), fields(content_id = item.content_id, content_type = %item.content_type))]
    async fn insert_item_if_absent(
        &self,
        list_id: Uuid,
        item: NewListItem,
    ) -> Result<Option<ListItem>> {
        let row = sqlx::query_as::<_, ListItemRow>(
            r#"
            INSERT INTO list_items
                (list_id, content_id, content_title, content_poster_path, content_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (list_id, content_id, content_type) DO NOTHING
            RETURNING id, list_id, content_id, content_title, content_poster_path,
                      content_type, added_at
            "#,
        )
        .bind(list_id)
        .bind(item.content_id)
        .bind(&item.title)
        .bind(item.poster_path.as_deref())
        .bind(item.content_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to insert list item")?;

        row.map(ListItem::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_items(
        &self,
        list_id: Uuid,
        content_id: i64,
        content_type: Option<ContentType>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM list_items
            WHERE list_id = $1
              AND content_id = $2
              AND ($3::TEXT IS NULL OR content_type = $3)
            "#,
        )
        .bind(list_id)
        .bind(content_id)
        .bind(content_type.map(|kind| kind.as_str()))
        .execute(&self.pool)
        .await
        .context("Failed to delete list items")?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn items(&self, list_id: Uuid, order: ItemOrder) -> Result<Vec<ListItem>> {
        let sql = match order {
            ItemOrder::NewestFirst => {
                r#"
                SELECT id, list_id, content_id, content_title, content_poster_path,
                       content_type, added_at
                FROM list_items
                WHERE list_id = $1
                ORDER BY added_at DESC, id DESC
                "#
            }
            ItemOrder::OldestFirst => {
                r#"
                SELECT id, list_id, content_id, content_title, content_poster_path,
                       content_type, added_at
                FROM list_items
                WHERE list_id = $1
                ORDER BY added_at ASC, id ASC
                "#
            }
        };

        let rows = sqlx::query_as::<_, ListItemRow>(sql)
            .bind(list_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to get list items")?;

        rows.into_iter().map(ListItem::try_from).collect()
    }
}
