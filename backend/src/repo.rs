use std::collections::HashMap;
use std::sync::Mutex;

use time::OffsetDateTime;
use uuid::Uuid;

use shared::error::{Error, ErrorCode, Result};
use shared::models::{SavedPoll, Workspace};

/// Key/filter access to the durable poll collection. Permission checks
/// live above this seam, in [`crate::store::PollStore`].
#[rocket::async_trait]
pub trait PollRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<SavedPoll>>;
    async fn put(&self, poll: SavedPoll) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn list_by_owner(&self, uid: &str, workspace: Option<Uuid>) -> Result<Vec<SavedPoll>>;
    async fn list_shared_with(&self, email: &str) -> Result<Vec<SavedPoll>>;
    /// Atomic single-counter increment; never a read-modify-write of the
    /// whole choice list.
    async fn increment_vote(&self, poll_id: Uuid, choice_id: &str) -> Result<()>;
}

#[rocket::async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Workspace>>;
    async fn put(&self, workspace: Workspace) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn list_by_owner(&self, uid: &str) -> Result<Vec<Workspace>>;
}

fn lock_poisoned() -> Error {
    Error::new(ErrorCode::Transient, "Store lock poisoned")
}

#[derive(Debug, Default)]
pub struct MemoryPolls {
    polls: Mutex<HashMap<Uuid, SavedPoll>>,
}

#[rocket::async_trait]
impl PollRepository for MemoryPolls {
    async fn get(&self, id: Uuid) -> Result<Option<SavedPoll>> {
        let polls = self.polls.lock().map_err(|_| lock_poisoned())?;
        Ok(polls.get(&id).cloned())
    }

    async fn put(&self, poll: SavedPoll) -> Result<()> {
        let mut polls = self.polls.lock().map_err(|_| lock_poisoned())?;
        polls.insert(poll.id, poll);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut polls = self.polls.lock().map_err(|_| lock_poisoned())?;
        polls.remove(&id);
        Ok(())
    }

    async fn list_by_owner(&self, uid: &str, workspace: Option<Uuid>) -> Result<Vec<SavedPoll>> {
        let polls = self.polls.lock().map_err(|_| lock_poisoned())?;
        Ok(polls
            .values()
            .filter(|p| p.user_id.as_deref() == Some(uid))
            .filter(|p| workspace.map_or(true, |w| p.workspace_id == Some(w)))
            .cloned()
            .collect())
    }

    async fn list_shared_with(&self, email: &str) -> Result<Vec<SavedPoll>> {
        let polls = self.polls.lock().map_err(|_| lock_poisoned())?;
        Ok(polls
            .values()
            .filter(|p| p.shared_with.iter().any(|e| e == email))
            .cloned()
            .collect())
    }

    async fn increment_vote(&self, poll_id: Uuid, choice_id: &str) -> Result<()> {
        let mut polls = self.polls.lock().map_err(|_| lock_poisoned())?;
        let poll = polls
            .get_mut(&poll_id)
            .ok_or_else(|| Error::new(ErrorCode::NotFound, "Poll not found"))?;
        let choice = poll
            .choices
            .iter_mut()
            .find(|c| c.id == choice_id)
            .ok_or_else(|| Error::new(ErrorCode::NotFound, "Choice not found"))?;
        choice.votes += 1;
        poll.recompute_total();
        poll.last_modified = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryWorkspaces {
    workspaces: Mutex<HashMap<Uuid, Workspace>>,
}

#[rocket::async_trait]
impl WorkspaceRepository for MemoryWorkspaces {
    async fn get(&self, id: Uuid) -> Result<Option<Workspace>> {
        let workspaces = self.workspaces.lock().map_err(|_| lock_poisoned())?;
        Ok(workspaces.get(&id).cloned())
    }

    async fn put(&self, workspace: Workspace) -> Result<()> {
        let mut workspaces = self.workspaces.lock().map_err(|_| lock_poisoned())?;
        workspaces.insert(workspace.id, workspace);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut workspaces = self.workspaces.lock().map_err(|_| lock_poisoned())?;
        workspaces.remove(&id);
        Ok(())
    }

    async fn list_by_owner(&self, uid: &str) -> Result<Vec<Workspace>> {
        let workspaces = self.workspaces.lock().map_err(|_| lock_poisoned())?;
        Ok(workspaces
            .values()
            .filter(|w| w.owner_id == uid)
            .cloned()
            .collect())
    }
}
