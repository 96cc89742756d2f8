use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::auth::repo_types::{PublicUser, User};
use crate::config::DatabaseConfig;
use crate::flashcards::repo_types::{Flashcard, FlashcardChanges, NewFlashcard};
use crate::groups::repo_types::{GroupChanges, NewGroup, StudyGroup, StudyGroupRow};

const GROUP_COLUMNS: &str = r#"
    SELECT g.id, g.name, g.description, g.creator_id,
           u.username AS creator_username, u.email AS creator_email,
           g.created_at
      FROM study_groups g
      JOIN users u ON u.id = g.creator_id
"#;

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(&cfg.url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    /// Members of each group in `ids`, keyed by group, in join order.
    async fn members_of(&self, ids: &[Uuid]) -> StoreResult<Vec<(Uuid, PublicUser)>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String)>(
            r#"
            SELECT m.group_id, u.id, u.username, u.email
              FROM group_members m
              JOIN users u ON u.id = m.user_id
             WHERE m.group_id = ANY($1)
             ORDER BY m.seq ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(group_id, id, username, email)| {
                (group_id, PublicUser { id, username, email })
            })
            .collect())
    }

    async fn assemble(&self, rows: Vec<StudyGroupRow>) -> StoreResult<Vec<StudyGroup>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let members = self.members_of(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let of_group = members
                    .iter()
                    .filter(|(gid, _)| *gid == row.id)
                    .map(|(_, m)| m.clone())
                    .collect();
                row.into_group(of_group)
            })
            .collect())
    }
}

fn unique_violation(err: sqlx::Error, field: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation { field }
        }
        _ => StoreError::Database(err),
    }
}

fn missing_reference(err: sqlx::Error, entity: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::MissingReference { entity }
        }
        _ => StoreError::Database(err),
    }
}

async fn insert_member_tx(
    tx: &mut Transaction<'_, Postgres>,
    group_id: Uuid,
    user_id: Uuid,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO group_members (group_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (group_id, user_id) DO NOTHING
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .map_err(|e| missing_reference(e, "user"))?;
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_violation(e, "username"))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
              FROM users
             WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_or_create_token(&self, user_id: Uuid, candidate: &str) -> StoreResult<String> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(candidate)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(|e| missing_reference(e, "user"))?;

        let (key,) = sqlx::query_as::<_, (String,)>(
            r#"SELECT key FROM auth_tokens WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(key)
    }

    async fn resolve_token(&self, key: &str) -> StoreResult<Option<Uuid>> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"SELECT user_id FROM auth_tokens WHERE key = $1"#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn count_groups(&self) -> StoreResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM study_groups")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn list_groups(&self, limit: i64, offset: i64) -> StoreResult<Vec<StudyGroup>> {
        let rows = sqlx::query_as::<_, StudyGroupRow>(&format!(
            "{GROUP_COLUMNS} ORDER BY g.seq ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        self.assemble(rows).await
    }

    #[instrument(skip(self, group))]
    async fn create_group(&self, creator_id: Uuid, group: NewGroup) -> StoreResult<StudyGroup> {
        let id = Uuid::new_v4();
        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO study_groups (id, name, description, creator_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(creator_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| missing_reference(e, "user"))?;
        insert_member_tx(&mut tx, id, creator_id).await?;
        tx.commit().await?;
        debug!(group_id = %id, "group row and creator membership committed");

        self.find_group(id)
            .await?
            .ok_or(StoreError::MissingReference { entity: "group" })
    }

    async fn find_group(&self, id: Uuid) -> StoreResult<Option<StudyGroup>> {
        let row = sqlx::query_as::<_, StudyGroupRow>(&format!("{GROUP_COLUMNS} WHERE g.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update_group(
        &self,
        id: Uuid,
        changes: GroupChanges,
    ) -> StoreResult<Option<StudyGroup>> {
        let updated = sqlx::query(
            r#"
            UPDATE study_groups
               SET name = COALESCE($2, name),
                   description = COALESCE($3, description)
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .execute(&self.db)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.find_group(id).await
    }

    async fn delete_group(&self, id: Uuid) -> StoreResult<bool> {
        // group_members rows go with it (ON DELETE CASCADE)
        let deleted = sqlx::query("DELETE FROM study_groups WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.db.begin().await?;
        let exists = sqlx::query_as::<_, (Uuid,)>(
            r#"SELECT id FROM study_groups WHERE id = $1 FOR SHARE"#,
        )
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Ok(false);
        }
        insert_member_tx(&mut tx, group_id, user_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn count_flashcards(&self, owner: Uuid) -> StoreResult<i64> {
        let (count,) =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM flashcards WHERE user_id = $1")
                .bind(owner)
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    async fn list_flashcards(
        &self,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Flashcard>> {
        let rows = sqlx::query_as::<_, Flashcard>(
            r#"
            SELECT id, user_id, front, back, category, created_at
              FROM flashcards
             WHERE user_id = $1
             ORDER BY seq ASC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create_flashcard(&self, owner: Uuid, card: NewFlashcard) -> StoreResult<Flashcard> {
        let card = sqlx::query_as::<_, Flashcard>(
            r#"
            INSERT INTO flashcards (id, user_id, front, back, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, front, back, category, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(card.front)
        .bind(card.back)
        .bind(card.category)
        .fetch_one(&self.db)
        .await
        .map_err(|e| missing_reference(e, "user"))?;
        Ok(card)
    }

    async fn find_flashcard(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(
            r#"
            SELECT id, user_id, front, back, category, created_at
              FROM flashcards
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(card)
    }

    async fn update_flashcard(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: FlashcardChanges,
    ) -> StoreResult<Option<Flashcard>> {
        let (set_category, category) = match changes.category {
            Some(category) => (true, category),
            None => (false, None),
        };
        let card = sqlx::query_as::<_, Flashcard>(
            r#"
            UPDATE flashcards
               SET front = COALESCE($3, front),
                   back = COALESCE($4, back),
                   category = CASE WHEN $5 THEN $6 ELSE category END
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, front, back, category, created_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(changes.front)
        .bind(changes.back)
        .bind(set_category)
        .bind(category)
        .fetch_optional(&self.db)
        .await?;
        Ok(card)
    }

    async fn delete_flashcard(&self, id: Uuid, owner: Uuid) -> StoreResult<bool> {
        let deleted = sqlx::query("DELETE FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
