use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use shared::error::{Error, ErrorCode, Result};
use shared::models::{Poll, SavedPoll};
use shared::session::Identity;

use crate::repo::PollRepository;

/// The workspace store: durable poll operations with identity and
/// ownership checks layered over a [`PollRepository`].
pub struct PollStore<R> {
    repo: R,
}

impl<R: PollRepository> PollStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Upsert keyed by `poll.id`; a second save with the same id
    /// overwrites. `total_votes` is recomputed from the choices.
    pub async fn save_poll(
        &self,
        identity: Option<&Identity>,
        poll: &Poll,
        title: Option<String>,
        description: Option<String>,
        workspace_id: Option<Uuid>,
    ) -> Result<SavedPoll> {
        let identity = identity.ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "You must be signed in to save polls")
        })?;

        let mut saved =
            SavedPoll::from_poll(poll, title, description, workspace_id, OffsetDateTime::now_utc());
        saved.user_id = Some(identity.uid.clone());
        self.repo.put(saved.clone()).await?;
        Ok(saved)
    }

    pub async fn update_poll(
        &self,
        identity: Option<&Identity>,
        poll: &Poll,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<SavedPoll> {
        let identity = identity.ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "You must be signed in to update polls")
        })?;

        let stored = self
            .repo
            .get(poll.id)
            .await?
            .ok_or_else(|| Error::new(ErrorCode::NotFound, "Poll not found"))?;
        if stored.user_id.as_deref() != Some(identity.uid.as_str()) {
            return Err(Error::new(
                ErrorCode::PermissionDenied,
                "You do not have permission to update this poll",
            ));
        }

        let mut saved = stored;
        saved.title = title.unwrap_or_else(|| SavedPoll::default_title(&poll.question));
        saved.description = description;
        saved.question = poll.question.clone();
        saved.choices = poll.choices.clone();
        saved.design = poll.design.clone();
        saved.shared_with = poll.shared_with.clone();
        saved.permissions = poll.permissions.clone();
        saved.last_modified = OffsetDateTime::now_utc();
        saved.recompute_total();

        self.repo.put(saved.clone()).await?;
        Ok(saved)
    }

    pub async fn delete_poll(&self, identity: Option<&Identity>, poll_id: Uuid) -> Result<()> {
        let identity = identity.ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "You must be signed in to delete polls")
        })?;

        let stored = self
            .repo
            .get(poll_id)
            .await?
            .ok_or_else(|| Error::new(ErrorCode::NotFound, "Poll not found"))?;
        if stored.user_id.as_deref() != Some(identity.uid.as_str()) {
            return Err(Error::new(
                ErrorCode::PermissionDenied,
                "You do not have permission to delete this poll",
            ));
        }

        self.repo.delete(poll_id).await
    }

    /// No ordering guarantee; callers sort for presentation. Failures
    /// degrade to an empty list.
    pub async fn load_polls(&self, uid: &str, workspace: Option<Uuid>) -> Vec<SavedPoll> {
        match self.repo.list_by_owner(uid, workspace).await {
            Ok(polls) => polls,
            Err(e) => {
                warn!("Failed to load polls for {uid}: {e}");
                Vec::new()
            }
        }
    }

    /// Secondary access grant: polls whose `shared_with` names the caller,
    /// independent of ownership.
    pub async fn load_shared_polls(&self, email: &str) -> Vec<SavedPoll> {
        match self.repo.list_shared_with(email).await {
            Ok(polls) => polls,
            Err(e) => {
                warn!("Failed to load shared polls for {email}: {e}");
                Vec::new()
            }
        }
    }

    /// Unauthenticated lookup for share links. Poll ids act as capability
    /// tokens; any narrowing happens in the reading view. Lookup failures
    /// degrade to `None`.
    pub async fn load_poll_by_id(&self, poll_id: Uuid) -> Option<SavedPoll> {
        match self.repo.get(poll_id).await {
            Ok(poll) => poll,
            Err(e) => {
                warn!("Failed to load poll {poll_id}: {e}");
                None
            }
        }
    }

    /// The public-write path: an unauthenticated counter increment, and
    /// nothing else.
    pub async fn record_public_vote(&self, poll_id: Uuid, choice_id: &str) -> Result<()> {
        self.repo.increment_vote(poll_id, choice_id).await
    }
}
