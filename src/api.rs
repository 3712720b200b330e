//! The netdisk operations the share commands are built on.

use crate::error::Result;
use crate::models::{PcsFile, SharedLink, SharedPath};

/// Netdisk API used by the share commands.
///
/// [`crate::PanClient`] talks to the real service; tests provide in-memory
/// implementations.
#[allow(async_fn_in_trait)]
pub trait PanApi {
    /// Share `paths` with an extraction `password`, valid for `period` days (0 = forever).
    async fn share(&self, paths: &[String], password: &str, period: u32) -> Result<SharedLink>;

    /// One page (1-indexed) of my shares. An empty page means there are no more.
    async fn list_shared(&self, page: u32) -> Result<Vec<SharedLink>>;

    /// Extraction password of one of my shares.
    async fn shared_password(&self, share_id: u64) -> Result<Option<String>>;

    async fn cancel_shared(&self, share_ids: &[u64]) -> Result<()>;

    /// Verify `password` for a share link so later calls may read it.
    async fn access_shared(&self, shared_url: &str, password: &str, show_vcode: bool)
        -> Result<()>;

    /// Top-level entries of a share link.
    async fn shared_paths(&self, shared_url: &str) -> Result<Vec<SharedPath>>;

    /// One page of the direct children of `dir` inside a share.
    async fn list_shared_paths(
        &self,
        dir: &str,
        uk: u64,
        share_id: u64,
        bdstoken: &str,
        page: u32,
        size: u32,
    ) -> Result<Vec<SharedPath>>;

    /// Copy shared items into `remotedir` of my netdisk.
    async fn transfer_shared_paths(
        &self,
        remotedir: &str,
        fs_ids: &[u64],
        uk: u64,
        share_id: u64,
        bdstoken: &str,
        shared_url: &str,
    ) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;

    async fn makedir(&self, path: &str) -> Result<()>;

    /// All direct children of a directory of my netdisk.
    async fn list(&self, path: &str) -> Result<Vec<PcsFile>>;
}
