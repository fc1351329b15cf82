//! Persisted key layout
//!
//! Global keys are constants; per-project keys are built from the project id.
//! The unscoped `project_files`, `current_file` and `main_preview_file` keys
//! predate multi-project support and are only read as a fallback.

pub const SAVED_PROJECTS: &str = "saved_projects";
pub const CURRENT_PROJECT_ID: &str = "current_project_id";
pub const API_KEY: &str = "api_key";
pub const GEMINI_API_KEY: &str = "gemini_api_key";
pub const CLAIMED_PLAN: &str = "claimed_plan";
pub const SELECTED_MODEL: &str = "selected_model";
pub const USERS: &str = "users";
pub const CURRENT_USER: &str = "currentUser";

pub const LEGACY_PROJECT_FILES: &str = "project_files";
pub const LEGACY_CURRENT_FILE: &str = "current_file";
pub const LEGACY_MAIN_PREVIEW_FILE: &str = "main_preview_file";

pub fn project_files(project_id: &str) -> String {
    format!("{}_{}", project_id, LEGACY_PROJECT_FILES)
}

pub fn current_file(project_id: &str) -> String {
    format!("{}_{}", project_id, LEGACY_CURRENT_FILE)
}

pub fn main_preview_file(project_id: &str) -> String {
    format!("{}_{}", project_id, LEGACY_MAIN_PREVIEW_FILE)
}

pub fn console_history(project_id: &str) -> String {
    format!("console_history_{}", project_id)
}

pub fn console_cmd_history(project_id: &str) -> String {
    format!("console_cmd_history_{}", project_id)
}

pub fn attached_image(project_id: &str) -> String {
    format!("{}_attached_image", project_id)
}

pub fn image_filename(project_id: &str) -> String {
    format!("{}_image_filename", project_id)
}

/// Every key owned by one project, removed on delete and copied on duplicate
pub fn project_scoped(project_id: &str) -> [String; 7] {
    [
        project_files(project_id),
        current_file(project_id),
        main_preview_file(project_id),
        console_history(project_id),
        console_cmd_history(project_id),
        attached_image(project_id),
        image_filename(project_id),
    ]
}
