use serde::{Serialize, Deserialize};
use time::OffsetDateTime;

use crate::models::Poll;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    Landing,
    Create,
    Vote,
    Results,
    Workspace,
    Login,
    Register,
    Settings,
    Admin,
    SharedPoll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollAction {
    CreatePoll(Poll),
    Vote { choice_id: String },
    SetViewMode(ViewMode),
    ResetPoll,
    /// Clears the ballot flag for "vote again" flows while keeping tallies
    /// already cast by others.
    ResetVotingState,
    SetHasVoted(bool),
}

/// The poll aggregate. All transitions are pure and synchronous; durable
/// writes happen elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub current_poll: Option<Poll>,
    pub view_mode: ViewMode,
    pub has_voted: bool,
    pub last_updated_at: Option<OffsetDateTime>,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            current_poll: None,
            view_mode: ViewMode::Landing,
            has_voted: false,
            last_updated_at: None,
        }
    }
}

impl PollState {
    pub fn apply(&mut self, action: PollAction) {
        match action {
            PollAction::CreatePoll(poll) => {
                // A live refresh of a shared poll keeps the visitor's mode
                // and ballot flag intact.
                if self.view_mode != ViewMode::SharedPoll {
                    self.view_mode = ViewMode::Vote;
                    self.has_voted = false;
                }
                self.current_poll = Some(poll);
                self.touch();
            }
            PollAction::Vote { choice_id } => {
                let Some(poll) = self.current_poll.as_mut() else {
                    return;
                };
                if let Some(choice) = poll.choices.iter_mut().find(|c| c.id == choice_id) {
                    choice.votes += 1;
                }
                // Repeat votes are not rejected here; callers gate on
                // `has_voted`.
                self.has_voted = true;
                self.view_mode = ViewMode::Results;
                self.touch();
            }
            PollAction::SetViewMode(mode) => {
                self.view_mode = mode;
            }
            PollAction::ResetPoll => {
                let Some(poll) = self.current_poll.as_mut() else {
                    return;
                };
                for choice in &mut poll.choices {
                    choice.votes = 0;
                }
                self.has_voted = false;
                self.view_mode = ViewMode::Vote;
                self.touch();
            }
            PollAction::ResetVotingState => {
                self.has_voted = false;
                self.view_mode = ViewMode::Vote;
            }
            PollAction::SetHasVoted(has_voted) => {
                self.has_voted = has_voted;
            }
        }
    }

    fn touch(&mut self) {
        self.last_updated_at = Some(OffsetDateTime::now_utc());
    }
}
