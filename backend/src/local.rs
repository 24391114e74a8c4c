use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use shared::error::{Error, ErrorCode, Result};
use shared::models::{Poll, SavedPoll};

pub const WORKSPACE_FILE: &str = "poll-workspace.json";

/// Loading must clear even if the underlying read never completes.
const LOAD_TIMEOUT: Duration = Duration::from_secs(3);

pub(crate) fn io_error(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::StorageFull {
        Error::new(
            ErrorCode::StorageFull,
            "Unable to save poll. Storage is full. Please delete some polls and try again.",
        )
    } else {
        Error::with_details(ErrorCode::Transient, "Workspace file unavailable", e.to_string())
    }
}

/// The local-only persistence path: a single-user workspace kept in a JSON
/// file. No identity checks apply here.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    path: PathBuf,
}

impl LocalWorkspace {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(WORKSPACE_FILE),
        }
    }

    fn read_all(&self) -> Result<Vec<SavedPoll>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };
        serde_json::from_str(&data).map_err(|e| {
            Error::with_details(ErrorCode::Transient, "Workspace file is corrupt", e.to_string())
        })
    }

    fn write_all(&self, polls: &[SavedPoll]) -> Result<()> {
        let data = serde_json::to_string(polls).map_err(|e| {
            Error::with_details(ErrorCode::Transient, "Failed to encode workspace", e.to_string())
        })?;
        std::fs::write(&self.path, data).map_err(io_error)
    }

    /// Degrades to the empty list on failure, and after the hard
    /// three-second timeout.
    pub async fn load_polls(&self) -> Vec<SavedPoll> {
        let store = self.clone();
        let read = tokio::task::spawn_blocking(move || store.read_all());
        match timeout(LOAD_TIMEOUT, read).await {
            Ok(Ok(Ok(polls))) => polls,
            Ok(Ok(Err(e))) => {
                warn!("Failed to load local polls: {e}");
                Vec::new()
            }
            Ok(Err(e)) => {
                warn!("Local poll load aborted: {e}");
                Vec::new()
            }
            Err(_) => {
                warn!("Local poll load timed out");
                Vec::new()
            }
        }
    }

    pub async fn save_poll(
        &self,
        poll: &Poll,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<SavedPoll> {
        let mut polls = self.read_all()?;
        let saved = SavedPoll::from_poll(poll, title, description, None, OffsetDateTime::now_utc());
        match polls.iter_mut().find(|p| p.id == poll.id) {
            Some(slot) => *slot = saved.clone(),
            None => polls.push(saved.clone()),
        }
        self.write_all(&polls)?;
        Ok(saved)
    }

    pub async fn delete_poll(&self, id: Uuid) -> Result<()> {
        let mut polls = self.read_all()?;
        polls.retain(|p| p.id != id);
        self.write_all(&polls)
    }

    pub async fn load_poll(&self, id: Uuid) -> Option<Poll> {
        self.read_all()
            .ok()?
            .iter()
            .find(|p| p.id == id)
            .map(SavedPoll::to_poll)
    }

    /// Persist a vote against the saved copy, if one exists. Absent polls
    /// are quietly skipped; the in-memory tally has already advanced.
    pub async fn record_vote(&self, poll_id: Uuid, choice_id: &str) -> Result<()> {
        let mut polls = self.read_all()?;
        if let Some(saved) = polls.iter_mut().find(|p| p.id == poll_id) {
            if let Some(choice) = saved.choices.iter_mut().find(|c| c.id == choice_id) {
                choice.votes += 1;
            }
            saved.recompute_total();
            saved.last_modified = OffsetDateTime::now_utc();
            self.write_all(&polls)?;
        }
        Ok(())
    }
}
