//! Typed persistence of boards and the project index on top of a [`Storage`].

use super::{Storage, StorageError, StorageResult};
use crate::board::BoardDocument;
use crate::frameworks::Framework;
use crate::instantiate::{INITIAL_FRAMEWORK_POSITION, framework_node_at};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Key of the project index.
pub const PROJECTS_KEY: &str = "stratboard-projects";
/// Prefix of per-project board keys.
pub const BOARD_KEY_PREFIX: &str = "stratboard-project-";

/// Storage key of a project's board.
pub fn board_key(project_id: &str) -> String {
    format!("{}{}", BOARD_KEY_PREFIX, project_id)
}

/// Default name of a project started from a framework.
fn project_name_for(framework: &Framework) -> String {
    if framework.name.ends_with("Analysis") {
        framework.name.clone()
    } else {
        format!("{} Analysis", framework.name)
    }
}

/// Where boards are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StorageMode {
    /// On-device storage, no account.
    #[default]
    Guest,
    /// Remote document store scoped to a user.
    Cloud { user_id: String },
}

impl StorageMode {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            StorageMode::Guest => None,
            StorageMode::Cloud { user_id } => Some(user_id),
        }
    }
}

/// A named board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Framework the project was started from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reads and writes boards and the project index as JSON documents.
pub struct Persistence<S: Storage> {
    storage: Arc<S>,
    mode: StorageMode,
}

impl<S: Storage> Clone for Persistence<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            mode: self.mode.clone(),
        }
    }
}

impl<S: Storage> Persistence<S> {
    pub fn new(storage: Arc<S>, mode: StorageMode) -> Self {
        Self { storage, mode }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn mode(&self) -> &StorageMode {
        &self.mode
    }

    /// Load a project's board. A missing board is `None`; callers start
    /// from an empty board.
    pub async fn load_board(&self, project_id: &str) -> StorageResult<Option<BoardDocument>> {
        let key = board_key(project_id);
        let json = match self.storage.load(&key).await {
            Ok(json) => json,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let doc = BoardDocument::from_json(&json)
            .map_err(|e| StorageError::Serialization(format!("Board {}: {}", key, e)))?;
        log::debug!(
            "Loaded board {} ({} nodes, {} edges)",
            project_id,
            doc.nodes.len(),
            doc.edges.len()
        );
        Ok(Some(doc))
    }

    /// Write a project's board and bump the project's `updated_at`.
    pub async fn save_board(&self, project_id: &str, doc: &BoardDocument) -> StorageResult<()> {
        let json = doc.to_json()?;
        self.storage.save(&board_key(project_id), &json).await?;
        self.touch_project(project_id).await?;
        Ok(())
    }

    pub async fn remove_board(&self, project_id: &str) -> StorageResult<()> {
        self.storage.delete(&board_key(project_id)).await
    }

    async fn load_index(&self) -> StorageResult<Vec<Project>> {
        match self.storage.load(PROJECTS_KEY).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(StorageError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn save_index(&self, projects: &[Project]) -> StorageResult<()> {
        let json = serde_json::to_string(projects)?;
        self.storage.save(PROJECTS_KEY, &json).await
    }

    /// All projects, most recently updated first.
    pub async fn list_projects(&self) -> StorageResult<Vec<Project>> {
        let mut projects = self.load_index().await?;
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    pub async fn project(&self, id: &str) -> StorageResult<Option<Project>> {
        Ok(self.load_index().await?.into_iter().find(|p| p.id == id))
    }

    fn new_project_id(&self, now: DateTime<Utc>, existing: &[Project]) -> String {
        match self.mode {
            StorageMode::Guest => {
                let mut millis = now.timestamp_millis();
                loop {
                    let id = format!("local-{}", millis);
                    if !existing.iter().any(|p| p.id == id) {
                        return id;
                    }
                    millis += 1;
                }
            }
            StorageMode::Cloud { .. } => Uuid::new_v4().to_string(),
        }
    }

    async fn insert_project(
        &self,
        name: &str,
        framework_id: Option<String>,
        board: &BoardDocument,
    ) -> StorageResult<Project> {
        let mut projects = self.load_index().await?;
        let now = Utc::now();
        let project = Project {
            id: self.new_project_id(now, &projects),
            name: name.to_string(),
            framework_id,
            user_id: self.mode.user_id().map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.storage
            .save(&board_key(&project.id), &board.to_json()?)
            .await?;
        projects.push(project.clone());
        self.save_index(&projects).await?;
        log::info!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    /// Create a project with an empty board.
    pub async fn create_project(&self, name: &str) -> StorageResult<Project> {
        self.insert_project(name, None, &BoardDocument::new()).await
    }

    /// Create a project named after a framework, whose board starts with one
    /// framework node.
    pub async fn create_project_from_framework(
        &self,
        framework: &Framework,
    ) -> StorageResult<(Project, BoardDocument)> {
        let mut board = BoardDocument::new();
        board
            .add_node(framework_node_at(framework, INITIAL_FRAMEWORK_POSITION))
            .map_err(|e| StorageError::Other(e.to_string()))?;
        let name = project_name_for(framework);
        let project = self
            .insert_project(&name, Some(framework.id.clone()), &board)
            .await?;
        Ok((project, board))
    }

    /// Remove a project and its board. Returns false if it did not exist.
    pub async fn delete_project(&self, id: &str) -> StorageResult<bool> {
        let mut projects = self.load_index().await?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        let existed = projects.len() != before;
        if existed {
            self.save_index(&projects).await?;
        }
        self.remove_board(id).await?;
        Ok(existed)
    }

    pub async fn rename_project(&self, id: &str, name: &str) -> StorageResult<Project> {
        let mut projects = self.load_index().await?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        project.name = name.to_string();
        project.updated_at = Utc::now();
        let renamed = project.clone();
        self.save_index(&projects).await?;
        Ok(renamed)
    }

    /// Bump a project's `updated_at`. Returns false for unknown projects.
    pub async fn touch_project(&self, id: &str) -> StorageResult<bool> {
        let mut projects = self.load_index().await?;
        match projects.iter_mut().find(|p| p.id == id) {
            Some(project) => {
                project.updated_at = Utc::now();
                self.save_index(&projects).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
