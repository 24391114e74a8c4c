use tracing::debug;
use uuid::Uuid;

use shared::error::{Error, ErrorCode, Result};
use shared::poll_state::{PollAction, ViewMode};
use shared::session::ViewerSession;

use crate::repo::PollRepository;
use crate::store::PollStore;

/// A poll reference extracted from a share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    /// Public voting view.
    Vote(Uuid),
    /// Owner-only live-results view.
    Host(Uuid),
}

impl ShareTarget {
    pub fn poll_id(self) -> Uuid {
        match self {
            ShareTarget::Vote(id) | ShareTarget::Host(id) => id,
        }
    }

    /// Accepts `?poll=<id>`, `/poll/<id>` and `/poll/<id>/host` links.
    pub fn parse(url: &str) -> Option<Self> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };

        if let Some(query) = query {
            for pair in query.split('&') {
                if let Some(value) = pair.strip_prefix("poll=") {
                    return Uuid::parse_str(value).ok().map(ShareTarget::Vote);
                }
            }
        }

        let (_, rest) = path.split_once("/poll/")?;
        let mut segments = rest.trim_end_matches('/').split('/');
        let id = Uuid::parse_str(segments.next()?).ok()?;
        match segments.next() {
            None => Some(ShareTarget::Vote(id)),
            Some("host") => Some(ShareTarget::Host(id)),
            Some(_) => None,
        }
    }
}

/// Resolves a share-link target into the session's poll aggregate.
///
/// A miss is terminal: no retry, and the error is distinct from a loading
/// state. The host variant additionally requires the caller to own the
/// poll.
pub async fn resolve<R: PollRepository>(
    store: &PollStore<R>,
    session: &mut ViewerSession,
    target: ShareTarget,
) -> Result<()> {
    let saved = store.load_poll_by_id(target.poll_id()).await.ok_or_else(|| {
        Error::new(
            ErrorCode::NotFound,
            "Poll not found. The link may be invalid or the poll may have been deleted.",
        )
    })?;

    if let ShareTarget::Host(_) = target {
        let identity = session.identity.as_ref().ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "Please sign in as the poll owner to view host results")
        })?;
        if saved.user_id.is_some() && saved.user_id.as_deref() != Some(identity.uid.as_str()) {
            return Err(Error::new(
                ErrorCode::PermissionDenied,
                "You do not have permission to view this host dashboard",
            ));
        }
    }

    debug!("Resolved share link for poll {}", saved.id);
    let poll = saved.to_poll();
    match target {
        ShareTarget::Vote(_) => {
            session.poll.apply(PollAction::SetViewMode(ViewMode::SharedPoll));
            session.poll.apply(PollAction::CreatePoll(poll));
        }
        ShareTarget::Host(_) => {
            session.poll.apply(PollAction::CreatePoll(poll));
            session.poll.apply(PollAction::SetViewMode(ViewMode::Results));
        }
    }
    Ok(())
}
