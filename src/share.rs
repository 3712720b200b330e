//! Share commands: create, list and cancel my shares, and save or list the
//! content of someone else's share.
//!
//! Saving walks the share tree with a work queue. Every item is first
//! transferred as a whole; only when the provider refuses (too many items, or
//! the folder already exists) is a folder opened and its children queued in
//! front of the remaining items, so one folder is finished before its
//! siblings are visited.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use tracing::{debug, info, warn};

use crate::api::PanApi;
use crate::dir_cache::DirCache;
use crate::error::{PanError, Result, ERRNO_FILE_EXISTS, ERRNO_TOO_MANY_ITEMS};
use crate::models::{basename, join_remote, SharedLink, SharedPath};
use crate::url_parser::unify_shared_url;

/// Entries requested per page when listing a shared directory.
pub const SHARED_PAGE_SIZE: u32 = 100;

/// What happened to one item while saving a share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    /// Transferred, with everything below it.
    Saved { path: String, dir: String },
    /// Not transferred: a file with the same name was already in `dir`.
    Skipped { path: String, dir: String },
    /// The provider reported that the item already exists in `dir`.
    AlreadyExists { path: String, dir: String },
    /// Too many items for one transfer; the folder is saved item by item.
    Expanding { path: String, dir: String },
}

impl fmt::Display for SaveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveEvent::Saved { path, dir } => write!(f, "save: {} to {}", path, dir),
            SaveEvent::Skipped { path, dir } => {
                write!(f, "{} is already in {}", path, dir)
            }
            SaveEvent::AlreadyExists { path, dir } => write!(
                f,
                "error_code: {}, {} is already in {}",
                ERRNO_FILE_EXISTS, path, dir
            ),
            SaveEvent::Expanding { path, .. } => write!(
                f,
                "error_code: {}, {} has too many items and is transferred one by one",
                ERRNO_TOO_MANY_ITEMS, path
            ),
        }
    }
}

/// Outcome of [`save_shared`], one event per processed item in processing order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub events: Vec<SaveEvent>,
}

impl SaveReport {
    fn push(&mut self, event: SaveEvent) {
        match &event {
            SaveEvent::Saved { .. } => info!("{}", event),
            _ => warn!("{}", event),
        }
        self.events.push(event);
    }

    pub fn saved(&self) -> usize {
        self.count(|e| matches!(e, SaveEvent::Saved { .. }))
    }

    /// Items left alone because they were already present.
    pub fn skipped(&self) -> usize {
        self.count(|e| {
            matches!(
                e,
                SaveEvent::Skipped { .. } | SaveEvent::AlreadyExists { .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&SaveEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(*e)).count()
    }
}

/// Share `paths` of my netdisk.
pub async fn share_files<A: PanApi>(
    api: &A,
    paths: &[String],
    password: &str,
    period: u32,
) -> Result<SharedLink> {
    let link = api.share(paths, password, period).await?;
    info!(share_id = link.share_id, url = %link.url, "created share");
    Ok(link)
}

/// All my shares, with the password of protected ones filled in.
///
/// Unless `show_all` is set, cancelled and expired shares are left out.
pub async fn list_shared<A: PanApi>(api: &A, show_all: bool) -> Result<Vec<SharedLink>> {
    let mut links = Vec::new();
    let mut page = 1;

    loop {
        let shared_links = api.list_shared(page).await?;
        if shared_links.is_empty() {
            break;
        }
        page += 1;

        for mut link in shared_links {
            if link.has_password() {
                link.password = api.shared_password(link.share_id).await?;
            }
            if show_all || link.available() {
                links.push(link);
            }
        }
    }

    Ok(links)
}

pub async fn cancel_shared<A: PanApi>(api: &A, share_ids: &[u64]) -> Result<()> {
    api.cancel_shared(share_ids).await?;
    info!(?share_ids, "cancelled shares");
    Ok(())
}

/// Save everything in a share link into `remotedir` of my netdisk.
///
/// Files whose name already exists in their destination directory are
/// skipped. The first error that is not "already exists" (12) or "too many
/// items" (-33) aborts the whole run and is returned unchanged.
pub async fn save_shared<A: PanApi>(
    api: &A,
    shared_url: &str,
    remotedir: &str,
    password: Option<&str>,
    show_vcode: bool,
) -> Result<SaveReport> {
    if !remotedir.starts_with('/') {
        return Err(PanError::InvalidRemoteDir(remotedir.to_string()));
    }

    let shared_url = unify_shared_url(shared_url)?;

    if let Some(password) = password {
        api.access_shared(&shared_url, password, show_vcode).await?;
    }

    // Every queued item carries the directory it has to land in.
    let mut queue: VecDeque<(SharedPath, String)> = api
        .shared_paths(&shared_url)
        .await?
        .into_iter()
        .map(|sp| (sp, remotedir.to_string()))
        .collect();

    let mut dir_exists: HashSet<String> = HashSet::new();
    let mut dir_cache = DirCache::new();
    let mut report = SaveReport::default();

    while let Some((shared_path, dir)) = queue.pop_front() {
        if !dir_exists.contains(&dir) {
            if !api.exists(&dir).await? {
                debug!(dir = %dir, "creating destination directory");
                api.makedir(&dir).await?;
            }
            dir_exists.insert(dir.clone());
        }

        if shared_path.is_file() && dir_cache.contains(api, &dir, shared_path.name()).await? {
            report.push(SaveEvent::Skipped {
                path: shared_path.path,
                dir,
            });
            continue;
        }

        let (uk, share_id, bdstoken) = shared_path.credentials();

        let transferred = api
            .transfer_shared_paths(&dir, &[shared_path.fs_id], uk, share_id, bdstoken, &shared_url)
            .await;

        match transferred {
            Ok(()) => {
                report.push(SaveEvent::Saved {
                    path: shared_path.path,
                    dir,
                });
                continue;
            }
            Err(PanError::Provider {
                code: ERRNO_FILE_EXISTS,
                ..
            }) => report.push(SaveEvent::AlreadyExists {
                path: shared_path.path.clone(),
                dir: dir.clone(),
            }),
            Err(PanError::Provider {
                code: ERRNO_TOO_MANY_ITEMS,
                ..
            }) => report.push(SaveEvent::Expanding {
                path: shared_path.path.clone(),
                dir: dir.clone(),
            }),
            // No space left (-32) and every other error end the run.
            Err(err) => return Err(err),
        }

        if shared_path.is_dir {
            let sub_paths =
                list_all_sub_paths(api, &shared_path.path, uk, share_id, bdstoken).await?;
            let sub_dir = join_remote(&dir, basename(&shared_path.path));
            debug!(path = %shared_path.path, children = sub_paths.len(), "expanding");

            for sub_path in sub_paths.into_iter().rev() {
                queue.push_front((sub_path, sub_dir.clone()));
            }
        }
    }

    Ok(report)
}

/// Every path of a share link, folders before the content of their
/// subfolders.
pub async fn list_shared_paths<A: PanApi>(
    api: &A,
    shared_url: &str,
    password: Option<&str>,
    show_vcode: bool,
) -> Result<Vec<SharedPath>> {
    let shared_url = unify_shared_url(shared_url)?;

    if let Some(password) = password {
        api.access_shared(&shared_url, password, show_vcode).await?;
    }

    let mut queue: VecDeque<SharedPath> = api.shared_paths(&shared_url).await?.into();
    let mut all_shared_paths: Vec<SharedPath> = queue.iter().cloned().collect();

    while let Some(shared_path) = queue.pop_front() {
        let (uk, share_id, bdstoken) = shared_path.credentials();

        if shared_path.is_dir {
            let sub_paths =
                list_all_sub_paths(api, &shared_path.path, uk, share_id, bdstoken).await?;
            all_shared_paths.extend(sub_paths.iter().cloned());

            for sub_path in sub_paths.into_iter().rev() {
                queue.push_front(sub_path);
            }
        }
    }

    Ok(all_shared_paths)
}

/// All direct children of a shared directory.
///
/// Pages are fetched until one comes back with fewer than
/// [`SHARED_PAGE_SIZE`] entries. A directory holding an exact multiple of the
/// page size costs one extra, empty request.
pub async fn list_all_sub_paths<A: PanApi>(
    api: &A,
    shared_dir: &str,
    uk: u64,
    share_id: u64,
    bdstoken: &str,
) -> Result<Vec<SharedPath>> {
    let mut sub_paths = Vec::new();
    let mut page = 1;

    loop {
        let batch = api
            .list_shared_paths(shared_dir, uk, share_id, bdstoken, page, SHARED_PAGE_SIZE)
            .await?;
        let count = batch.len();
        sub_paths.extend(batch);

        if count < SHARED_PAGE_SIZE as usize {
            break;
        }
        page += 1;
    }

    debug!(shared_dir, pages = page, entries = sub_paths.len(), "listed shared directory");
    Ok(sub_paths)
}
