use time::OffsetDateTime;
use uuid::Uuid;

use shared::error::{Error, ErrorCode, Result};
use shared::models::Workspace;
use shared::session::Identity;

use crate::repo::WorkspaceRepository;

pub const DEFAULT_WORKSPACE_NAME: &str = "My Polls";
pub const DEFAULT_WORKSPACE_DESCRIPTION: &str = "Default workspace for your polls";
pub const DEFAULT_WORKSPACE_COLOR: &str = "#16a34a";
pub const DEFAULT_WORKSPACE_ICON: &str = "\u{1F4CA}";

pub struct WorkspaceStore<R> {
    repo: R,
}

impl<R: WorkspaceRepository> WorkspaceStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn create_workspace(
        &self,
        identity: Option<&Identity>,
        name: impl Into<String>,
        description: Option<String>,
        color: Option<String>,
        icon: Option<String>,
    ) -> Result<Workspace> {
        let identity = identity.ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "You must be logged in to create workspaces")
        })?;

        let now = OffsetDateTime::now_utc();
        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            color: color.unwrap_or_else(|| DEFAULT_WORKSPACE_COLOR.into()),
            icon: icon.unwrap_or_else(|| DEFAULT_WORKSPACE_ICON.into()),
            owner_id: identity.uid.clone(),
            members: Vec::new(),
            poll_count: 0,
            created_at: now,
            last_modified: now,
        };

        self.repo.put(workspace.clone()).await?;
        Ok(workspace)
    }

    /// Owner or member may update; ownership itself never transfers.
    pub async fn update_workspace(
        &self,
        identity: Option<&Identity>,
        workspace: Workspace,
    ) -> Result<Workspace> {
        let identity = identity.ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "You must be logged in to update workspaces")
        })?;

        let stored = self
            .repo
            .get(workspace.id)
            .await?
            .ok_or_else(|| Error::new(ErrorCode::NotFound, "Workspace not found"))?;
        if stored.owner_id != identity.uid && !stored.members.iter().any(|m| m == &identity.email) {
            return Err(Error::new(
                ErrorCode::PermissionDenied,
                "You do not have permission to update this workspace",
            ));
        }

        let mut updated = workspace;
        updated.owner_id = stored.owner_id;
        updated.created_at = stored.created_at;
        updated.last_modified = OffsetDateTime::now_utc();

        self.repo.put(updated.clone()).await?;
        Ok(updated)
    }

    pub async fn delete_workspace(&self, identity: Option<&Identity>, id: Uuid) -> Result<()> {
        let identity = identity.ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "You must be logged in to delete workspaces")
        })?;

        let stored = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| Error::new(ErrorCode::NotFound, "Workspace not found"))?;
        if stored.owner_id != identity.uid {
            return Err(Error::new(
                ErrorCode::PermissionDenied,
                "You do not have permission to delete this workspace",
            ));
        }

        self.repo.delete(id).await
    }

    /// A user is never left without a workspace: the first load for a user
    /// with none synthesizes and persists the default one.
    pub async fn load_workspaces(&self, identity: Option<&Identity>) -> Result<Vec<Workspace>> {
        let identity = identity.ok_or_else(|| {
            Error::new(ErrorCode::IdentityRequired, "You must be logged in to load workspaces")
        })?;

        let workspaces = self.repo.list_by_owner(&identity.uid).await?;
        if workspaces.is_empty() {
            let default = self
                .create_workspace(
                    Some(identity),
                    DEFAULT_WORKSPACE_NAME,
                    Some(DEFAULT_WORKSPACE_DESCRIPTION.into()),
                    None,
                    None,
                )
                .await?;
            return Ok(vec![default]);
        }
        Ok(workspaces)
    }
}

/// Session-scoped selection on top of the store: which workspace the
/// viewer currently has open.
pub struct WorkspaceManager<R> {
    store: WorkspaceStore<R>,
    workspaces: Vec<Workspace>,
    current_workspace_id: Option<Uuid>,
}

impl<R: WorkspaceRepository> WorkspaceManager<R> {
    pub fn new(store: WorkspaceStore<R>) -> Self {
        Self {
            store,
            workspaces: Vec::new(),
            current_workspace_id: None,
        }
    }

    pub fn store(&self) -> &WorkspaceStore<R> {
        &self.store
    }

    /// Loads (bootstrapping if needed) and auto-selects the first
    /// workspace when none is selected. On failure the list clears and the
    /// error surfaces.
    pub async fn load(&mut self, identity: Option<&Identity>) -> Result<&[Workspace]> {
        match self.store.load_workspaces(identity).await {
            Ok(workspaces) => {
                self.workspaces = workspaces;
                if self.current_workspace_id.is_none() {
                    self.current_workspace_id = self.workspaces.first().map(|w| w.id);
                }
                Ok(&self.workspaces)
            }
            Err(e) => {
                self.workspaces.clear();
                Err(e)
            }
        }
    }

    pub async fn create(
        &mut self,
        identity: Option<&Identity>,
        name: impl Into<String>,
        description: Option<String>,
        color: Option<String>,
        icon: Option<String>,
    ) -> Result<Workspace> {
        let workspace = self
            .store
            .create_workspace(identity, name, description, color, icon)
            .await?;
        self.current_workspace_id = Some(workspace.id);
        self.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    pub async fn update(
        &mut self,
        identity: Option<&Identity>,
        workspace: Workspace,
    ) -> Result<()> {
        let updated = self.store.update_workspace(identity, workspace).await?;
        if let Some(slot) = self.workspaces.iter_mut().find(|w| w.id == updated.id) {
            *slot = updated;
        }
        Ok(())
    }

    /// Deleting the selected workspace resets the selection; the caller
    /// re-loads or re-selects.
    pub async fn delete(&mut self, identity: Option<&Identity>, id: Uuid) -> Result<()> {
        self.store.delete_workspace(identity, id).await?;
        self.workspaces.retain(|w| w.id != id);
        if self.current_workspace_id == Some(id) {
            self.current_workspace_id = None;
        }
        Ok(())
    }

    pub fn set_current_workspace(&mut self, id: Uuid) {
        self.current_workspace_id = Some(id);
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|w| Some(w.id) == self.current_workspace_id)
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }
}
