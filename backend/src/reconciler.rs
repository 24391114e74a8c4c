use std::sync::Mutex;

use tracing::{debug, warn};
use uuid::Uuid;

use shared::error::Error;
use shared::poll_state::{PollAction, ViewMode};
use shared::session::ViewerSession;

use crate::local::LocalWorkspace;
use crate::repo::PollRepository;
use crate::store::PollStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVote {
    pub poll_id: Uuid,
    pub choice_id: String,
}

/// Public votes whose durable write failed. Queued instead of dropped, so
/// lost increments can be reconciled later.
#[derive(Debug, Default)]
pub struct VoteOutbox {
    pending: Mutex<Vec<PendingVote>>,
}

impl VoteOutbox {
    pub fn push(&self, vote: PendingVote) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(vote);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending(&self) -> Vec<PendingVote> {
        self.pending.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Retries every queued vote; the ones that still fail stay queued.
    /// Returns the number delivered.
    pub async fn flush<R: PollRepository>(&self, repo: &R) -> usize {
        let pending = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return 0,
        };
        if pending.is_empty() {
            return 0;
        }

        let outcomes = futures::future::join_all(
            pending
                .iter()
                .map(|vote| repo.increment_vote(vote.poll_id, &vote.choice_id)),
        )
        .await;

        let mut delivered = 0;
        let mut kept = Vec::new();
        for (vote, outcome) in pending.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Retry failed for vote on poll {}: {e}", vote.poll_id);
                    kept.push(vote);
                }
            }
        }

        if let Ok(mut pending) = self.pending.lock() {
            // keep anything queued while we were flushing
            kept.append(&mut pending);
            *pending = kept;
        }
        delivered
    }
}

/// Outcome of the durable half of a vote; the local tally always advances.
#[derive(Debug)]
pub enum WritePath {
    /// Anonymous share-link path. `deferred` marks a failed write parked in
    /// the outbox.
    Public { deferred: bool },
    Owner { error: Option<Error> },
    Local { error: Option<Error> },
    /// No current poll; nothing happened.
    Skipped,
}

/// Routes a vote to the durable write path matching the viewer's
/// relationship to the poll, then commits it locally no matter what.
pub struct VoteReconciler<'a, R> {
    store: &'a PollStore<R>,
    local: Option<&'a LocalWorkspace>,
    outbox: &'a VoteOutbox,
}

impl<'a, R: PollRepository> VoteReconciler<'a, R> {
    pub fn new(
        store: &'a PollStore<R>,
        local: Option<&'a LocalWorkspace>,
        outbox: &'a VoteOutbox,
    ) -> Self {
        Self { store, local, outbox }
    }

    pub async fn cast_vote(&self, session: &mut ViewerSession, choice_id: &str) -> WritePath {
        let Some(poll) = session.poll.current_poll.clone() else {
            return WritePath::Skipped;
        };

        let path = if session.poll.view_mode == ViewMode::SharedPoll {
            // Anonymous visitors may increment counters on a poll they do
            // not own; no ownership check on this path.
            match self.store.record_public_vote(poll.id, choice_id).await {
                Ok(()) => {
                    debug!("Recorded public vote on poll {}", poll.id);
                    WritePath::Public { deferred: false }
                }
                Err(e) => {
                    warn!("Public vote write failed for poll {}: {e}", poll.id);
                    self.outbox.push(PendingVote {
                        poll_id: poll.id,
                        choice_id: choice_id.to_string(),
                    });
                    WritePath::Public { deferred: true }
                }
            }
        } else if session.identity.is_some() {
            let mut mutated = poll.clone();
            if let Some(choice) = mutated.choices.iter_mut().find(|c| c.id == choice_id) {
                choice.votes += 1;
            }
            let outcome = self
                .store
                .update_poll(
                    session.identity.as_ref(),
                    &mutated,
                    mutated.title.clone(),
                    mutated.description.clone(),
                )
                .await;
            if let Err(e) = &outcome {
                warn!("Owner vote write failed for poll {}: {e}", poll.id);
            }
            WritePath::Owner { error: outcome.err() }
        } else {
            // local-only poll: persist the tally next to the saved copy
            let error = match self.local {
                Some(local) => local.record_vote(poll.id, choice_id).await.err(),
                None => None,
            };
            if let Some(e) = &error {
                warn!("Local vote write failed for poll {}: {e}", poll.id);
            }
            WritePath::Local { error }
        };

        // fire-and-local-commit: the aggregate advances regardless of the
        // durable outcome
        session.poll.apply(PollAction::Vote {
            choice_id: choice_id.to_string(),
        });
        path
    }
}
