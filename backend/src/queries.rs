use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use shared::error::{Error, ErrorCode, Result};
use shared::models::{Choice, DesignOptions, Permission, SavedPoll, Workspace};

use crate::repo::{PollRepository, WorkspaceRepository};

fn storage_error(e: sqlx::Error) -> Error {
    Error::with_details(ErrorCode::Transient, "Document store unavailable", e.to_string())
}

fn poll_from_row(row: &PgRow, choices: Vec<Choice>) -> Result<SavedPoll> {
    let Json(design): Json<DesignOptions> = row.try_get("design").map_err(storage_error)?;
    let Json(permissions): Json<HashMap<String, Permission>> =
        row.try_get("permissions").map_err(storage_error)?;

    let mut poll = SavedPoll {
        id: row.try_get("id").map_err(storage_error)?,
        title: row.try_get("title").map_err(storage_error)?,
        description: row.try_get("description").map_err(storage_error)?,
        question: row.try_get("question").map_err(storage_error)?,
        choices,
        created_at: row.try_get("created_at").map_err(storage_error)?,
        last_modified: row.try_get("last_modified").map_err(storage_error)?,
        total_votes: 0,
        design,
        user_id: row.try_get("owner_id").map_err(storage_error)?,
        workspace_id: row.try_get("workspace_id").map_err(storage_error)?,
        shared_with: row.try_get("shared_with").map_err(storage_error)?,
        permissions,
    };
    // the stored counter is a cache; derive from the choice rows on read
    poll.recompute_total();
    Ok(poll)
}

fn workspace_from_row(row: &PgRow) -> Result<Workspace> {
    Ok(Workspace {
        id: row.try_get("id").map_err(storage_error)?,
        name: row.try_get("name").map_err(storage_error)?,
        description: row.try_get("description").map_err(storage_error)?,
        color: row.try_get("color").map_err(storage_error)?,
        icon: row.try_get("icon").map_err(storage_error)?,
        owner_id: row.try_get("owner_id").map_err(storage_error)?,
        members: row.try_get("members").map_err(storage_error)?,
        poll_count: row.try_get::<i32, _>("poll_count").map_err(storage_error)? as u32,
        created_at: row.try_get("created_at").map_err(storage_error)?,
        last_modified: row.try_get("last_modified").map_err(storage_error)?,
    })
}

#[derive(Debug, Clone)]
pub struct PgPolls {
    pool: PgPool,
}

impl PgPolls {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn choices_for(&self, poll_id: Uuid) -> Result<Vec<Choice>> {
        let rows = sqlx::query(
            "SELECT choice_id, text, votes FROM poll_choices
             WHERE poll_id = $1 ORDER BY position",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter()
            .map(|row| {
                Ok(Choice {
                    id: row.try_get("choice_id").map_err(storage_error)?,
                    text: row.try_get("text").map_err(storage_error)?,
                    votes: row.try_get::<i32, _>("votes").map_err(storage_error)? as u32,
                })
            })
            .collect()
    }

    async fn assemble(&self, rows: Vec<PgRow>) -> Result<Vec<SavedPoll>> {
        let mut polls = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id").map_err(storage_error)?;
            let choices = self.choices_for(id).await?;
            polls.push(poll_from_row(&row, choices)?);
        }
        Ok(polls)
    }
}

#[rocket::async_trait]
impl PollRepository for PgPolls {
    async fn get(&self, id: Uuid) -> Result<Option<SavedPoll>> {
        let row = sqlx::query(
            "SELECT id, owner_id, workspace_id, title, description, question, design,
                    shared_with, permissions, created_at, last_modified
             FROM polls WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        let Some(row) = row else { return Ok(None) };
        let choices = self.choices_for(id).await?;
        Ok(Some(poll_from_row(&row, choices)?))
    }

    async fn put(&self, poll: SavedPoll) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query(
            "INSERT INTO polls
                 (id, owner_id, workspace_id, title, description, question, design,
                  shared_with, permissions, total_votes, created_at, last_modified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (id) DO UPDATE SET
                 owner_id = EXCLUDED.owner_id,
                 workspace_id = EXCLUDED.workspace_id,
                 title = EXCLUDED.title,
                 description = EXCLUDED.description,
                 question = EXCLUDED.question,
                 design = EXCLUDED.design,
                 shared_with = EXCLUDED.shared_with,
                 permissions = EXCLUDED.permissions,
                 total_votes = EXCLUDED.total_votes,
                 last_modified = EXCLUDED.last_modified",
        )
        .bind(poll.id)
        .bind(&poll.user_id)
        .bind(poll.workspace_id)
        .bind(&poll.title)
        .bind(&poll.description)
        .bind(&poll.question)
        .bind(Json(&poll.design))
        .bind(&poll.shared_with)
        .bind(Json(&poll.permissions))
        .bind(poll.total_votes as i32)
        .bind(poll.created_at)
        .bind(poll.last_modified)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query("DELETE FROM poll_choices WHERE poll_id = $1")
            .bind(poll.id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        for (position, choice) in poll.choices.iter().enumerate() {
            sqlx::query(
                "INSERT INTO poll_choices (poll_id, choice_id, text, votes, position)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(poll.id)
            .bind(&choice.id)
            .bind(&choice.text)
            .bind(choice.votes as i32)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn list_by_owner(&self, uid: &str, workspace: Option<Uuid>) -> Result<Vec<SavedPoll>> {
        let rows = match workspace {
            Some(workspace) => {
                sqlx::query(
                    "SELECT id, owner_id, workspace_id, title, description, question, design,
                            shared_with, permissions, created_at, last_modified
                     FROM polls WHERE owner_id = $1 AND workspace_id = $2",
                )
                .bind(uid)
                .bind(workspace)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, owner_id, workspace_id, title, description, question, design,
                            shared_with, permissions, created_at, last_modified
                     FROM polls WHERE owner_id = $1",
                )
                .bind(uid)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(storage_error)?;

        self.assemble(rows).await
    }

    async fn list_shared_with(&self, email: &str) -> Result<Vec<SavedPoll>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, workspace_id, title, description, question, design,
                    shared_with, permissions, created_at, last_modified
             FROM polls WHERE $1 = ANY(shared_with)",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        self.assemble(rows).await
    }

    async fn increment_vote(&self, poll_id: Uuid, choice_id: &str) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE poll_choices SET votes = votes + 1
             WHERE poll_id = $1 AND choice_id = $2",
        )
        .bind(poll_id)
        .bind(choice_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if updated.rows_affected() == 0 {
            return Err(Error::new(ErrorCode::NotFound, "Poll or choice not found"));
        }

        // keep the denormalized counter in step with the choice rows
        sqlx::query(
            "UPDATE polls SET
                 total_votes = (SELECT COALESCE(SUM(votes), 0) FROM poll_choices WHERE poll_id = $1),
                 last_modified = NOW()
             WHERE id = $1",
        )
        .bind(poll_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgWorkspaces {
    pool: PgPool,
}

impl PgWorkspaces {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl WorkspaceRepository for PgWorkspaces {
    async fn get(&self, id: Uuid) -> Result<Option<Workspace>> {
        let row = sqlx::query(
            "SELECT id, name, description, color, icon, owner_id, members, poll_count,
                    created_at, last_modified
             FROM workspaces WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(workspace_from_row).transpose()
    }

    async fn put(&self, workspace: Workspace) -> Result<()> {
        sqlx::query(
            "INSERT INTO workspaces
                 (id, name, description, color, icon, owner_id, members, poll_count,
                  created_at, last_modified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 color = EXCLUDED.color,
                 icon = EXCLUDED.icon,
                 members = EXCLUDED.members,
                 poll_count = EXCLUDED.poll_count,
                 last_modified = EXCLUDED.last_modified",
        )
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(&workspace.description)
        .bind(&workspace.color)
        .bind(&workspace.icon)
        .bind(&workspace.owner_id)
        .bind(&workspace.members)
        .bind(workspace.poll_count as i32)
        .bind(workspace.created_at)
        .bind(workspace.last_modified)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM workspaces WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn list_by_owner(&self, uid: &str) -> Result<Vec<Workspace>> {
        let rows = sqlx::query(
            "SELECT id, name, description, color, icon, owner_id, members, poll_count,
                    created_at, last_modified
             FROM workspaces WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(workspace_from_row).collect()
    }
}
