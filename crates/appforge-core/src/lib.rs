//! # appforge-core - Core Domain Types
//!
//! Foundation crate for AppForge. Provides domain types, error handling,
//! virtual path helpers, and the editor's syntax highlighter.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`FileRecord`] / [`FileKind`] - One file in a project's virtual file store
//! - [`ProjectRecord`] - Saved project metadata
//! - [`ConsoleEntry`] / [`ConsoleEntryType`] - Per-project console history
//! - [`Plan`] - Subscription tier and its project limit
//! - [`UserRecord`] / [`PublicUser`] - Mock account records
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum classified into validation / not-found / storage
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ### Paths (`paths`)
//! - Normalization, parent/name splitting and prefix rebasing for virtual paths
//!
//! ### Highlighting (`highlight`)
//! - [`highlight()`] - Render source as escaped, span-annotated markup
//! - [`tokenize()`] - Single-pass lexers for HTML, CSS, JS, TS and JSON
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use appforge_core::prelude::*;
//! ```

pub mod error;
pub mod highlight;
pub mod logging;
pub mod paths;
pub mod prelude;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, ErrorCategory, Result, ResultExt};
pub use highlight::{highlight, tokenize, Language, Token, TokenKind};
pub use types::{
    ConsoleEntry, ConsoleEntryType, FileKind, FileRecord, Plan, ProjectRecord, PublicUser,
    UserRecord,
};
