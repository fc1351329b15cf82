//! Workspace facade
//!
//! One [`Workspace`] per session. It owns the store handle and every service
//! built on it, keeps the open project's file store and console, and drives
//! the generation and auth flows. Errors never escape: each operation
//! returns `Option`/`bool` and queues a [`Notification`] describing what went
//! wrong.

use appforge_core::prelude::*;
use appforge_core::{highlight, ConsoleEntry, FileRecord, Plan, ProjectRecord, PublicUser, UserRecord};
use appforge_store::SharedStore;

use crate::auth::AuthService;
use crate::config::Settings;
use crate::console::ConsoleLog;
use crate::flow::{FlowMachine, FlowStage, FlowState, FlowTimings};
use crate::generator::{generate_site, GeneratedSite, INDEX_FILE};
use crate::preferences::Preferences;
use crate::projects::ProjectDirectory;
use crate::vfs::{FileTree, VirtualFileStore};

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-visible message queued by a workspace operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// Storage failures are errors; bad input and missing entries are warnings
    pub fn from_error(err: &Error) -> Self {
        let level = match err.category() {
            ErrorCategory::Storage => NotificationLevel::Error,
            ErrorCategory::Validation | ErrorCategory::NotFound => NotificationLevel::Warning,
        };
        Self::new(level, err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace
// ─────────────────────────────────────────────────────────────────────────────

/// Account change carried through the auth flow
#[derive(Debug, Clone)]
pub enum AuthRequest {
    Login(UserRecord),
    Register(UserRecord),
}

#[derive(Debug)]
struct ActiveProject {
    files: VirtualFileStore,
    console: ConsoleLog,
}

/// Generation run waiting to be written into its project
#[derive(Debug)]
struct PendingGeneration {
    run: u64,
    project_id: String,
}

#[derive(Debug)]
pub struct Workspace {
    store: SharedStore,
    settings: Settings,
    projects: ProjectDirectory,
    preferences: Preferences,
    auth: AuthService,
    active: Option<ActiveProject>,
    generation: FlowMachine<GeneratedSite>,
    auth_flow: FlowMachine<AuthRequest>,
    pending_generation: Option<PendingGeneration>,
    pending_auth: Option<u64>,
    notifications: Vec<Notification>,
}

fn no_project_open() -> Error {
    Error::validation("No project is open")
}

impl Workspace {
    /// Build every service over `store` and reopen the last active project
    pub fn open(store: SharedStore, settings: Settings) -> Self {
        let projects = ProjectDirectory::open(store.clone());
        let preferences = Preferences::new(store.clone(), settings.generation.default_model.clone());
        let auth = AuthService::new(store.clone(), settings.generation.starting_credits);
        let generation = FlowMachine::new("generation", FlowTimings::generation(&settings.flow));
        let auth_flow = FlowMachine::new("auth", FlowTimings::auth(&settings.flow));

        let mut workspace = Self {
            store,
            settings,
            projects,
            preferences,
            auth,
            active: None,
            generation,
            auth_flow,
            pending_generation: None,
            pending_auth: None,
            notifications: Vec::new(),
        };

        if let Some(id) = workspace.projects.current_project_id() {
            if workspace.projects.get(&id).is_ok() {
                workspace.activate(&id);
            } else {
                warn!("Current project {} no longer exists, clearing pointer", id);
                let cleared = workspace.projects.set_current_project(None);
                workspace.report(cleared);
            }
        }

        workspace
    }

    fn activate(&mut self, id: &str) {
        let files = VirtualFileStore::open(self.store.clone(), id);
        let console = ConsoleLog::open(self.store.clone(), id, &self.settings.console);
        self.active = Some(ActiveProject { files, console });
        debug!("Activated project {}", id);
    }

    fn notify(&mut self, notification: Notification) {
        debug!("{:?}: {}", notification.level, notification.message);
        self.notifications.push(notification);
    }

    /// Turn an error into a notification
    fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Operation failed: {}", err);
                self.notify(Notification::from_error(&err));
                None
            }
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    // ─────────────────────────────────────────────────────────
    // Account & Plan
    // ─────────────────────────────────────────────────────────

    pub fn current_user(&self) -> Option<PublicUser> {
        self.auth.current_user()
    }

    /// The logged-in user's plan, or the claimed plan when logged out
    pub fn plan(&self) -> Plan {
        self.auth
            .current_user()
            .map(|user| user.plan)
            .unwrap_or_else(|| self.preferences.claimed_plan())
    }

    pub fn set_plan(&mut self, plan: Plan) -> bool {
        let result = match self.auth.current_user() {
            Some(_) => self.auth.set_plan(plan).map(|_| ()),
            None => self.preferences.set_claimed_plan(plan),
        };
        if self.report(result).is_none() {
            return false;
        }
        self.notify(Notification::success(format!("Switched to the {} plan", plan)));
        true
    }

    pub fn set_api_key(&mut self, key: Option<&str>) -> bool {
        let result = self.preferences.set_api_key(key);
        self.report(result).is_some()
    }

    pub fn set_model(&mut self, model: &str) -> bool {
        let result = self.preferences.set_selected_model(model);
        self.report(result).is_some()
    }

    pub fn auth_stage(&self) -> FlowStage {
        self.auth_flow.stage()
    }

    /// Check credentials and start the login flow
    pub fn start_login(&mut self, email: &str, password: &str) -> bool {
        let checked = self.auth.check_login(email, password).map(AuthRequest::Login);
        self.start_auth(checked)
    }

    /// Validate a new account and start the registration flow
    pub fn start_register(&mut self, username: &str, email: &str, password: &str) -> bool {
        let checked = self
            .auth
            .check_registration(username, email, password)
            .map(AuthRequest::Register);
        self.start_auth(checked)
    }

    fn start_auth(&mut self, checked: Result<AuthRequest>) -> bool {
        if self.auth_flow.is_busy() {
            self.notify(Notification::warning("Sign-in already in progress"));
            return false;
        }
        let run = self.auth_flow.start(checked.map_err(|err| err.to_string()));
        self.pending_auth = Some(run);
        true
    }

    /// Apply the auth flow's outcome once it has been published
    pub fn poll_auth(&mut self) -> Option<PublicUser> {
        let run = self.pending_auth?;
        let state = self.auth_flow.state();
        if state.run != run {
            self.pending_auth = None;
            return None;
        }
        let outcome = state.outcome?;
        self.pending_auth = None;

        match outcome {
            Ok(AuthRequest::Login(user)) => {
                let result = self.auth.complete_login(&user);
                let user = self.report(result)?;
                self.notify(Notification::success(format!("Welcome back, {}", user.username)));
                Some(user)
            }
            Ok(AuthRequest::Register(user)) => {
                let result = self.auth.complete_registration(user);
                let user = self.report(result)?;
                self.notify(Notification::success(format!("Welcome, {}", user.username)));
                Some(user)
            }
            Err(message) => {
                self.notify(Notification::warning(message));
                None
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Option<PublicUser> {
        if !self.start_login(email, password) {
            return None;
        }
        self.auth_flow.settled().await;
        self.poll_auth()
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Option<PublicUser> {
        if !self.start_register(username, email, password) {
            return None;
        }
        self.auth_flow.settled().await;
        self.poll_auth()
    }

    pub fn logout(&mut self) -> bool {
        let result = self.auth.logout();
        self.report(result).is_some()
    }

    // ─────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────

    /// Saved projects, featured first
    pub fn projects(&self) -> Vec<ProjectRecord> {
        self.projects.list().into_iter().cloned().collect()
    }

    pub fn active_project_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.files.project_id())
    }

    pub fn active_project(&self) -> Option<&ProjectRecord> {
        let id = self.active_project_id()?;
        self.projects.get(id).ok()
    }

    /// Create a project named after `prompt` and open it
    pub fn create_project(&mut self, prompt: &str) -> Option<ProjectRecord> {
        let plan = self.plan();
        let result = self.projects.create(prompt, plan);
        let project = self.report(result)?;
        self.open_project(&project.id);
        self.notify(Notification::success(format!("Created project '{}'", project.name)));
        Some(project)
    }

    pub fn duplicate_project(&mut self, id: &str) -> Option<ProjectRecord> {
        let plan = self.plan();
        let result = self.projects.duplicate(id, plan);
        let copy = self.report(result)?;
        self.notify(Notification::success(format!("Created '{}'", copy.name)));
        Some(copy)
    }

    pub fn delete_project(&mut self, id: &str) -> bool {
        let result = self.projects.delete(id);
        let Some(removed) = self.report(result) else {
            return false;
        };

        if self.active_project_id() == Some(id) {
            self.active = None;
        }
        if self
            .pending_generation
            .as_ref()
            .is_some_and(|pending| pending.project_id == id)
        {
            self.cancel_generation();
        }
        self.notify(Notification::info(format!("Deleted project '{}'", removed.name)));
        true
    }

    pub fn toggle_featured(&mut self, id: &str) -> Option<bool> {
        let result = self.projects.toggle_featured(id);
        self.report(result)
    }

    pub fn rename_project(&mut self, id: &str, name: &str) -> bool {
        let result = self.projects.rename(id, name);
        self.report(result).is_some()
    }

    /// Make `id` the active project and remember it
    pub fn open_project(&mut self, id: &str) -> bool {
        if self.active_project_id() == Some(id) {
            return true;
        }
        let exists = self.projects.get(id).map(|_| ());
        if self.report(exists).is_none() {
            return false;
        }
        let saved = self.projects.set_current_project(Some(id));
        if self.report(saved).is_none() {
            return false;
        }
        self.activate(id);
        true
    }

    pub fn close_project(&mut self) -> bool {
        let cleared = self.projects.set_current_project(None);
        if self.report(cleared).is_none() {
            return false;
        }
        self.active = None;
        true
    }

    // ─────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────

    pub fn files(&self) -> Option<&VirtualFileStore> {
        self.active.as_ref().map(|active| &active.files)
    }

    /// Whether a project is open, queueing a warning when none is
    pub fn require_project(&mut self) -> bool {
        let result = match self.active {
            Some(_) => Ok(()),
            None => Err(no_project_open()),
        };
        self.report(result).is_some()
    }

    /// Run `op` against the open project's files, then bump its modified time
    fn with_files<T>(&mut self, op: impl FnOnce(&mut VirtualFileStore) -> Result<T>) -> Option<T> {
        let result = match self.active.as_mut() {
            Some(active) => op(&mut active.files),
            None => Err(no_project_open()),
        };
        let value = self.report(result)?;
        self.flush_dirty();
        Some(value)
    }

    fn flush_dirty(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.files.take_dirty() {
            let id = active.files.project_id().to_string();
            let touched = self.projects.touch(&id);
            self.report(touched);
        }
    }

    pub fn tree(&self) -> Option<FileTree> {
        self.files().map(VirtualFileStore::tree)
    }

    pub fn list_files(&self, filter: Option<&str>) -> Vec<FileRecord> {
        self.files()
            .map(|files| files.list_files(filter).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn list_folders(&self) -> Vec<String> {
        self.files().map(VirtualFileStore::list_folders).unwrap_or_default()
    }

    pub fn read_file(&mut self, path: &str) -> Option<FileRecord> {
        let result = match self.files() {
            Some(files) => files.read_file(path).cloned(),
            None => Err(no_project_open()),
        };
        self.report(result)
    }

    /// Highlighted markup for a text file
    pub fn highlighted(&mut self, path: &str) -> Option<String> {
        let record = self.read_file(path)?;
        if record.kind.is_binary() {
            self.notify(Notification::info(format!("'{}' is not a text file", record.path)));
            return None;
        }
        Some(highlight(&record.content, record.kind.as_str()))
    }

    pub fn create_file(&mut self, path: &str, content: &str) -> Option<String> {
        self.with_files(|files| files.create_file(path, content, None))
    }

    pub fn write_file(&mut self, path: &str, content: &str) -> bool {
        self.with_files(|files| files.write_content(path, content))
            .is_some()
    }

    pub fn rename_file(&mut self, old_path: &str, new_path: &str) -> Option<String> {
        self.with_files(|files| files.rename_file(old_path, new_path))
    }

    pub fn delete_file(&mut self, path: &str) -> bool {
        self.with_files(|files| files.delete_file(path)).is_some()
    }

    pub fn duplicate_file(&mut self, path: &str) -> Option<String> {
        self.with_files(|files| files.duplicate_file(path))
    }

    pub fn move_file(&mut self, path: &str, target_folder: &str) -> Option<String> {
        self.with_files(|files| files.move_file(path, target_folder))
    }

    pub fn create_folder(&mut self, path: &str) -> Option<String> {
        self.with_files(|files| files.create_folder(path))
    }

    pub fn rename_folder(&mut self, old_path: &str, new_path: &str) -> Option<String> {
        self.with_files(|files| files.rename_folder(old_path, new_path))
    }

    /// Remove a folder and everything under it; returns the number of records removed
    pub fn delete_folder(&mut self, path: &str) -> Option<usize> {
        self.with_files(|files| files.delete_folder(path))
    }

    pub fn duplicate_folder(&mut self, path: &str) -> Option<String> {
        self.with_files(|files| files.duplicate_folder(path))
    }

    pub fn move_folder(&mut self, path: &str, target_folder: &str) -> Option<String> {
        self.with_files(|files| files.move_folder(path, target_folder))
    }

    pub fn select_file(&mut self, path: Option<&str>) -> bool {
        self.with_files(|files| files.set_current_file(path))
            .is_some()
    }

    pub fn set_main_preview(&mut self, path: Option<&str>) -> bool {
        self.with_files(|files| files.set_main_preview_file(path))
            .is_some()
    }

    // ─────────────────────────────────────────────────────────
    // Console
    // ─────────────────────────────────────────────────────────

    pub fn console_entries(&self) -> &[ConsoleEntry] {
        self.active
            .as_ref()
            .map(|active| active.console.entries())
            .unwrap_or_default()
    }

    pub fn command_history(&self) -> &[String] {
        self.active
            .as_ref()
            .map(|active| active.console.command_history())
            .unwrap_or_default()
    }

    /// Run one console line against the open project
    pub fn run_console(&mut self, line: &str) -> bool {
        let result = match self.active.as_mut() {
            Some(ActiveProject { files, console }) => console.run(line, files),
            None => Err(no_project_open()),
        };
        self.report(result).is_some()
    }

    pub fn clear_console(&mut self) -> bool {
        let result = match self.active.as_mut() {
            Some(active) => active.console.clear(),
            None => Err(no_project_open()),
        };
        self.report(result).is_some()
    }

    fn log_to_console(&mut self, entry: ConsoleEntry) {
        if let Some(active) = self.active.as_mut() {
            let result = active.console.append(entry);
            self.report(result);
        }
    }

    // ─────────────────────────────────────────────────────────
    // Generation
    // ─────────────────────────────────────────────────────────

    pub fn generation_state(&self) -> FlowState<GeneratedSite> {
        self.generation.state()
    }

    pub fn generation_flow(&self) -> &FlowMachine<GeneratedSite> {
        &self.generation
    }

    /// Charge a credit and start the generation flow
    ///
    /// Creates a project from the prompt when none is open. Credits are
    /// checked first, so a rejected generation creates nothing.
    pub fn start_generation(&mut self, prompt: &str) -> bool {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.report::<()>(Err(Error::validation("Prompt cannot be empty")));
            return false;
        }
        if self.generation.is_busy() {
            self.notify(Notification::warning("A generation is already running"));
            return false;
        }
        let cost = self.settings.generation.credit_cost;
        let logged_in = self.auth.current_user().is_some();
        if logged_in && self.report(self.auth.check_credits(cost)).is_none() {
            return false;
        }
        if self.active.is_none() && self.create_project(prompt).is_none() {
            return false;
        }
        let Some(project_id) = self.active_project_id().map(str::to_string) else {
            return false;
        };

        if logged_in && self.report(self.auth.spend_credits(cost)).is_none() {
            return false;
        }

        let model = self.preferences.selected_model();
        self.log_to_console(ConsoleEntry::system(format!(
            "Generating with {}: {}",
            model, prompt
        )));
        let site = generate_site(prompt, &model);
        let run = self.generation.start(Ok(site));
        self.pending_generation = Some(PendingGeneration { run, project_id });
        info!("Generation run {} started", run);
        true
    }

    /// Write a completed generation into its project
    ///
    /// Returns the written paths once the flow has published its outcome.
    pub fn poll_generation(&mut self) -> Option<Vec<String>> {
        let pending_run = self.pending_generation.as_ref()?.run;
        let state = self.generation.state();
        if state.run != pending_run {
            self.pending_generation = None;
            return None;
        }
        let outcome = state.outcome?;
        let pending = self.pending_generation.take()?;

        match outcome {
            Ok(site) => self.apply_site(&pending.project_id, site),
            Err(message) => {
                self.notify(Notification::error(message));
                None
            }
        }
    }

    fn apply_site(&mut self, project_id: &str, site: GeneratedSite) -> Option<Vec<String>> {
        if self.active_project_id() != Some(project_id) {
            self.notify(Notification::warning(
                "Generated files discarded: the project is no longer open",
            ));
            return None;
        }

        let paths: Vec<String> = site.files.iter().map(|file| file.path.clone()).collect();
        self.with_files(|files| files.replace_all(site.files, Some(INDEX_FILE)))?;

        self.log_to_console(ConsoleEntry::output(site.message));
        self.notify(Notification::success(format!(
            "Generated {} files",
            paths.len()
        )));
        Some(paths)
    }

    /// Run a whole generation, waiting for the flow to settle
    pub async fn generate(&mut self, prompt: &str) -> Option<Vec<String>> {
        if !self.start_generation(prompt) {
            return None;
        }
        self.generation.settled().await;
        self.poll_generation()
    }

    pub fn cancel_generation(&mut self) {
        self.generation.reset();
        self.pending_generation = None;
    }
}
