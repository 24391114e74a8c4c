use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub votes: u32,
}

impl Choice {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            votes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Colorful,
    Designer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Sans,
    Serif,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Card,
    List,
    Compact,
}

/// Presentation snapshot stored alongside a poll. Has no bearing on vote
/// semantics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignOptions {
    pub theme: Theme,
    pub primary_color: String,
    pub font_style: FontStyle,
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl Default for DesignOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Designer,
            primary_color: "#16a34a".into(),
            font_style: FontStyle::Sans,
            layout: Layout::Card,
            background_image: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Edit,
    Delete,
}

/// The in-memory poll aggregate: the single poll currently being viewed,
/// voted on, or edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub question: String,
    pub choices: Vec<Choice>,
    pub created_at: OffsetDateTime,
    pub design: DesignOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub permissions: HashMap<String, Permission>,
}

impl Poll {
    pub fn new(question: impl Into<String>, choices: Vec<Choice>, design: DesignOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            choices,
            created_at: OffsetDateTime::now_utc(),
            design,
            title: None,
            description: None,
            user_id: None,
            shared_with: Vec::new(),
            permissions: HashMap::new(),
        }
    }

    pub fn total_votes(&self) -> u32 {
        self.choices.iter().map(|c| c.votes).sum()
    }
}

/// Durable superset of [`Poll`] with workspace, ownership and sharing
/// metadata. `total_votes` is a denormalized cache and is recomputed from
/// `choices` on every write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedPoll {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub question: String,
    pub choices: Vec<Choice>,
    pub created_at: OffsetDateTime,
    pub last_modified: OffsetDateTime,
    pub total_votes: u32,
    pub design: DesignOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub permissions: HashMap<String, Permission>,
}

impl SavedPoll {
    /// Fallback title used when none is supplied: the question, truncated
    /// to 30 characters.
    pub fn default_title(question: &str) -> String {
        let short: String = question.chars().take(30).collect();
        if question.chars().count() > 30 {
            format!("Poll: {short}...")
        } else {
            format!("Poll: {short}")
        }
    }

    pub fn from_poll(
        poll: &Poll,
        title: Option<String>,
        description: Option<String>,
        workspace_id: Option<Uuid>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: poll.id,
            title: title.unwrap_or_else(|| Self::default_title(&poll.question)),
            description,
            question: poll.question.clone(),
            choices: poll.choices.clone(),
            created_at: poll.created_at,
            last_modified: now,
            total_votes: poll.total_votes(),
            design: poll.design.clone(),
            user_id: poll.user_id.clone(),
            workspace_id,
            shared_with: poll.shared_with.clone(),
            permissions: poll.permissions.clone(),
        }
    }

    /// Rebuild the in-memory aggregate, carrying ownership and sharing
    /// metadata so share-link viewers see the same record owners do.
    pub fn to_poll(&self) -> Poll {
        Poll {
            id: self.id,
            question: self.question.clone(),
            choices: self.choices.clone(),
            created_at: self.created_at,
            design: self.design.clone(),
            title: Some(self.title.clone()),
            description: self.description.clone(),
            user_id: self.user_id.clone(),
            shared_with: self.shared_with.clone(),
            permissions: self.permissions.clone(),
        }
    }

    pub fn recompute_total(&mut self) {
        self.total_votes = self.choices.iter().map(|c| c.votes).sum();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    pub poll_count: u32,
    pub created_at: OffsetDateTime,
    pub last_modified: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResult {
    pub choice: String,
    pub votes: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub question: String,
    pub total_votes: u32,
    pub results: Vec<ChoiceResult>,
    pub exported_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    pub choices: Vec<String>,
    #[serde(default)]
    pub design: Option<DesignOptions>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub choice_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}
