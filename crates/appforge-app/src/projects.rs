//! Project directory: saved project metadata and plan quotas
//!
//! Metadata for every project lives in `saved_projects`. File sets, console
//! history and uploads live under per-project keys, which are copied on
//! duplicate and removed on delete.

use appforge_core::prelude::*;
use appforge_core::{Plan, ProjectRecord};
use appforge_store::{keys, JsonStoreExt, SharedStore};
use chrono::Utc;

use crate::ids::generate_id;

/// Name used when a project is created from an empty prompt
pub const UNTITLED_PROJECT: &str = "Untitled Project";

/// Longest derived project name before truncation
pub const MAX_NAME_CHARS: usize = 40;

/// Derive a display name from the prompt that created a project
pub fn project_name_from_prompt(prompt: &str) -> String {
    let collapsed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return UNTITLED_PROJECT.to_string();
    }
    if collapsed.chars().count() > MAX_NAME_CHARS {
        let truncated: String = collapsed.chars().take(MAX_NAME_CHARS).collect();
        return format!("{}...", truncated);
    }
    collapsed
}

#[derive(Debug)]
pub struct ProjectDirectory {
    store: SharedStore,
    projects: Vec<ProjectRecord>,
}

impl ProjectDirectory {
    /// Load the directory, normalizing older records
    pub fn open(store: SharedStore) -> Self {
        let mut directory = Self {
            store,
            projects: Vec::new(),
        };
        directory.rehydrate();
        directory
    }

    /// Reload from the store
    ///
    /// Records saved before the featured flag existed get `isFeatured: false`
    /// and are written back; unreadable records are dropped. Returns the
    /// number of records normalized.
    pub fn rehydrate(&mut self) -> usize {
        let raw: Vec<serde_json::Value> = self.store.load_or_default(keys::SAVED_PROJECTS);
        let mut normalized = 0;
        let mut dropped = 0;

        let projects: Vec<ProjectRecord> = raw
            .into_iter()
            .filter_map(|value| {
                let missing_flag = value.get("isFeatured").is_none();
                match serde_json::from_value::<ProjectRecord>(value) {
                    Ok(project) => {
                        if missing_flag {
                            normalized += 1;
                        }
                        Some(project)
                    }
                    Err(e) => {
                        warn!("Dropping unreadable project record: {}", e);
                        dropped += 1;
                        None
                    }
                }
            })
            .collect();

        if normalized + dropped > 0 {
            if let Err(e) = self.store.write_json(keys::SAVED_PROJECTS, &projects) {
                warn!("Failed to save normalized projects: {}", e);
            }
        }
        debug!(
            "Loaded {} projects ({} normalized, {} dropped)",
            projects.len(),
            normalized,
            dropped
        );
        self.projects = projects;
        normalized
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Projects for display: featured first, then most recently modified
    pub fn list(&self) -> Vec<&ProjectRecord> {
        let mut projects: Vec<&ProjectRecord> = self.projects.iter().collect();
        projects.sort_by(|a, b| {
            b.is_featured
                .cmp(&a.is_featured)
                .then_with(|| b.last_modified.cmp(&a.last_modified))
        });
        projects
    }

    pub fn get(&self, id: &str) -> Result<&ProjectRecord> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::project_not_found(id))
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::project_not_found(id))
    }

    fn check_quota(&self, plan: Plan) -> Result<()> {
        match plan.project_limit() {
            Some(limit) if self.projects.len() >= limit => {
                warn!("Project limit reached for plan {}", plan);
                Err(Error::QuotaExceeded {
                    plan: plan.as_str().to_string(),
                    limit,
                })
            }
            _ => Ok(()),
        }
    }

    /// Persist a staged list, then swap it in
    fn commit(&mut self, staged: Vec<ProjectRecord>) -> Result<()> {
        self.store.write_json(keys::SAVED_PROJECTS, &staged)?;
        self.projects = staged;
        Ok(())
    }

    /// Create an empty project named after `prompt`
    pub fn create(&mut self, prompt: &str, plan: Plan) -> Result<ProjectRecord> {
        self.check_quota(plan)?;

        let project = ProjectRecord::new(generate_id("project"), project_name_from_prompt(prompt));
        let mut staged = self.projects.clone();
        staged.insert(0, project.clone());
        self.commit(staged)?;

        info!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    /// Copy a project with its files and auxiliary keys
    pub fn duplicate(&mut self, id: &str, plan: Plan) -> Result<ProjectRecord> {
        let source = self.get(id)?.clone();
        self.check_quota(plan)?;

        let copy = ProjectRecord::new(
            generate_id("project"),
            format!("{} (Copy)", source.name),
        );

        let copied = self.copy_project_keys(&source.id, &copy.id)?;
        let mut staged = self.projects.clone();
        staged.insert(0, copy.clone());
        if let Err(e) = self.commit(staged) {
            self.remove_keys(&copied);
            return Err(e);
        }

        info!("Duplicated project {} -> {}", source.id, copy.id);
        Ok(copy)
    }

    /// Copy every per-project key that exists; undo on failure
    fn copy_project_keys(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let mut copied = Vec::new();
        for (src, dst) in keys::project_scoped(from)
            .into_iter()
            .zip(keys::project_scoped(to))
        {
            let result = self
                .store
                .get(&src)
                .and_then(|value| match value {
                    Some(bytes) => self.store.set(&dst, &bytes).map(|_| true),
                    None => Ok(false),
                });
            match result {
                Ok(true) => copied.push(dst),
                Ok(false) => {}
                Err(e) => {
                    self.remove_keys(&copied);
                    return Err(e);
                }
            }
        }
        Ok(copied)
    }

    fn remove_keys(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove {}: {}", key, e);
            }
        }
    }

    /// Delete a project and every key it owns
    pub fn delete(&mut self, id: &str) -> Result<ProjectRecord> {
        let idx = self.index_of(id)?;
        let mut staged = self.projects.clone();
        let removed = staged.remove(idx);
        self.commit(staged)?;

        self.remove_keys(&keys::project_scoped(id));
        if self.current_project_id().as_deref() == Some(id) {
            self.set_current_project(None)?;
        }

        info!("Deleted project {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// Flip the featured flag; returns the new value
    pub fn toggle_featured(&mut self, id: &str) -> Result<bool> {
        let idx = self.index_of(id)?;
        let mut staged = self.projects.clone();
        staged[idx].is_featured = !staged[idx].is_featured;
        let featured = staged[idx].is_featured;
        self.commit(staged)?;
        Ok(featured)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Project name cannot be empty"));
        }
        let idx = self.index_of(id)?;
        let mut staged = self.projects.clone();
        staged[idx].name = name.to_string();
        staged[idx].last_modified = Utc::now();
        self.commit(staged)
    }

    /// Record that a project's files changed
    pub fn touch(&mut self, id: &str) -> Result<()> {
        let idx = self.index_of(id)?;
        let mut staged = self.projects.clone();
        staged[idx].last_modified = Utc::now();
        self.commit(staged)
    }

    /// The project last opened, if it still exists
    pub fn current_project_id(&self) -> Option<String> {
        self.store
            .read_string(keys::CURRENT_PROJECT_ID)
            .filter(|id| !id.is_empty())
    }

    pub fn set_current_project(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => {
                self.get(id)?;
                self.store.write_string(keys::CURRENT_PROJECT_ID, id)
            }
            None => self.store.remove(keys::CURRENT_PROJECT_ID),
        }
    }
}
