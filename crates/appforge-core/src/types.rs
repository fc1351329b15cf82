//! Core domain types for AppForge

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::paths;

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// Kind tag for a file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Html,
    Css,
    Js,
    Ts,
    Json,
    Markdown,
    Image,
    Binary,
    #[default]
    Text,
}

impl FileKind {
    /// Derive the kind from a path's extension
    pub fn from_path(path: &str) -> Self {
        match paths::extension(path).as_deref() {
            Some("html" | "htm") => FileKind::Html,
            Some("css") => FileKind::Css,
            Some("js" | "mjs" | "cjs" | "jsx") => FileKind::Js,
            Some("ts" | "tsx") => FileKind::Ts,
            Some("json") => FileKind::Json,
            Some("md" | "markdown") => FileKind::Markdown,
            Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "bmp") => {
                FileKind::Image
            }
            Some(
                "pdf" | "zip" | "woff" | "woff2" | "ttf" | "otf" | "mp3" | "mp4" | "wasm",
            ) => FileKind::Binary,
            _ => FileKind::Text,
        }
    }

    /// Whether content is a `data:` URI rather than editable text
    pub fn is_binary(&self) -> bool {
        matches!(self, FileKind::Image | FileKind::Binary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Html => "html",
            FileKind::Css => "css",
            FileKind::Js => "js",
            FileKind::Ts => "ts",
            FileKind::Json => "json",
            FileKind::Markdown => "markdown",
            FileKind::Image => "image",
            FileKind::Binary => "binary",
            FileKind::Text => "text",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file in a project's virtual file store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Slash-separated path, unique within the project
    pub path: String,

    /// Text content, or a `data:` URI for image/binary uploads
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub kind: FileKind,
}

impl FileRecord {
    /// Create a record, deriving its kind from the path
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let kind = FileKind::from_path(&path);
        Self {
            path,
            content: content.into(),
            kind,
        }
    }

    /// Create a record with an explicit kind
    pub fn with_kind(path: impl Into<String>, content: impl Into<String>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind,
        }
    }

    /// Empty placeholder record that keeps `folder` alive
    pub fn placeholder(folder: &str) -> Self {
        Self::with_kind(paths::placeholder_for(folder), "", FileKind::Text)
    }

    pub fn is_placeholder(&self) -> bool {
        paths::is_placeholder(&self.path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────────────────────────

/// Subscription tier bounding the number of projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    #[serde(rename = "FREE")]
    Free,
    #[serde(rename = "PRO")]
    Pro,
    #[serde(rename = "TEAMS")]
    Teams,
    #[serde(rename = "BIG TEAMS")]
    BigTeams,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Free, Plan::Pro, Plan::Teams, Plan::BigTeams];

    /// Maximum number of projects, `None` when unbounded
    pub fn project_limit(&self) -> Option<usize> {
        match self {
            Plan::Free => Some(5),
            Plan::Pro => Some(12),
            Plan::Teams => Some(20),
            Plan::BigTeams => None,
        }
    }

    /// Persisted name of the plan
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Pro => "PRO",
            Plan::Teams => "TEAMS",
            Plan::BigTeams => "BIG TEAMS",
        }
    }

    /// Parse a plan name, accepting `BIG_TEAMS` / `bigteams` spellings
    pub fn parse(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_uppercase();
        match folded.as_str() {
            "FREE" => Some(Plan::Free),
            "PRO" => Some(Plan::Pro),
            "TEAMS" => Some(Plan::Teams),
            "BIGTEAMS" => Some(Plan::BigTeams),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Projects
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata for one saved project; files are stored under a separate key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,

    /// Older saved data has no flag; treated as not featured
    #[serde(default)]
    pub is_featured: bool,
}

impl ProjectRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            created_at: now,
            last_modified: now,
            is_featured: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Console
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of console line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleEntryType {
    Command,
    Output,
    Error,
    System,
}

/// Sequence number making console ids unique within a process
static CONSOLE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One line in a project's console history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub id: String,

    /// Human-readable local time, e.g. `14:03:22`
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub output: String,

    #[serde(rename = "type")]
    pub entry_type: ConsoleEntryType,
}

impl ConsoleEntry {
    pub fn new(entry_type: ConsoleEntryType, output: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            id: format!(
                "{}-{}",
                now.timestamp_millis(),
                CONSOLE_SEQ.fetch_add(1, Ordering::Relaxed)
            ),
            timestamp: now.format("%H:%M:%S").to_string(),
            command: None,
            output: output.into(),
            entry_type,
        }
    }

    pub fn command(command: impl Into<String>) -> Self {
        let command = command.into();
        let mut entry = Self::new(ConsoleEntryType::Command, format!("> {}", command));
        entry.command = Some(command);
        entry
    }

    pub fn output(output: impl Into<String>) -> Self {
        Self::new(ConsoleEntryType::Output, output)
    }

    pub fn error(output: impl Into<String>) -> Self {
        Self::new(ConsoleEntryType::Error, output)
    }

    pub fn system(output: impl Into<String>) -> Self {
        Self::new(ConsoleEntryType::System, output)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Stored account record for the mock login flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    #[serde(default)]
    pub plan: Plan,

    #[serde(default)]
    pub credits: u32,
}

impl UserRecord {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            plan: self.plan,
            credits: self.credits,
        }
    }
}

/// The logged-in user as exposed to callers (no credentials)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,

    #[serde(default)]
    pub plan: Plan,

    #[serde(default)]
    pub credits: u32,
}
