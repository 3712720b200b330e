//! pan_share - Save and inspect Baidu Netdisk share links.
//!
//! This library provides functionality to:
//! - Save everything in a share link into a directory of my netdisk
//! - List every path in a share link
//! - Create, list and cancel my own shares
//!
//! # Example
//!
//! ```no_run
//! use pan_share::{save_shared, PanClient, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = Session::new("<BDUSS>", None)?;
//!     let client = PanClient::new(session);
//!
//!     let report = save_shared(
//!         &client,
//!         "https://pan.baidu.com/s/1abc",
//!         "/saved",
//!         Some("pwd1"),
//!         false,
//!     )
//!     .await?;
//!     for event in &report.events {
//!         println!("{}", event);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod dir_cache;
pub mod error;
pub mod models;
pub mod share;
pub mod url_parser;

// Re-exports for convenience
pub use api::PanApi;
pub use auth::Session;
pub use client::{PanClient, VcodePrompt};
pub use dir_cache::DirCache;
pub use error::{PanError, Result};
pub use models::{PcsFile, SharedLink, SharedPath};
pub use share::{
    cancel_shared, list_all_sub_paths, list_shared, list_shared_paths, save_shared, share_files,
    SaveEvent, SaveReport,
};
pub use url_parser::unify_shared_url;
