//! Data models for shares, shared paths and netdisk listings.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// One entry of a shared tree.
///
/// `uk`, `share_id` and `bdstoken` are filled in by every listing call; the
/// traversal relies on that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedPath {
    pub path: String,
    pub is_dir: bool,
    pub fs_id: u64,
    pub uk: Option<u64>,
    pub share_id: Option<u64>,
    pub bdstoken: Option<String>,
    pub password: Option<String>,
}

impl SharedPath {
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// Last component of `path`.
    pub fn name(&self) -> &str {
        basename(&self.path)
    }

    /// The `(uk, share_id, bdstoken)` triple needed by listing and transfer.
    ///
    /// # Panics
    ///
    /// Panics if the entry was built without them, which means the listing that
    /// produced it is broken.
    pub fn credentials(&self) -> (u64, u64, &str) {
        let uk = self.uk.expect("shared path is missing `uk`");
        let share_id = self.share_id.expect("shared path is missing `share_id`");
        let bdstoken = self
            .bdstoken
            .as_deref()
            .expect("shared path is missing `bdstoken`");
        (uk, share_id, bdstoken)
    }
}

impl fmt::Display for SharedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dir { "d" } else { "-" };
        write!(f, "{}\t{}\t{}", kind, self.fs_id, self.path)
    }
}

/// A share created by me.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLink {
    pub share_id: u64,
    pub url: String,
    pub paths: Vec<String>,
    pub password: Option<String>,
    pub public: bool,
    pub status: i64,
    pub expired_type: i64,
}

impl SharedLink {
    pub fn has_password(&self) -> bool {
        !self.public
    }

    /// Not cancelled, not blocked and not expired.
    pub fn available(&self) -> bool {
        self.status == 0 && self.expired_type != -1
    }
}

impl fmt::Display for SharedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = self.password.as_deref().unwrap_or("-");
        let state = if self.available() { "ok" } else { "unavailable" };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.share_id,
            self.url,
            password,
            state,
            self.paths.join(", ")
        )
    }
}

/// An entry of my own netdisk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PcsFile {
    pub path: String,
    #[serde(deserialize_with = "deserialize_u64")]
    pub fs_id: u64,
    #[serde(rename = "isdir", deserialize_with = "deserialize_flag")]
    pub is_dir: bool,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    pub size: Option<u64>,
}

impl PcsFile {
    pub fn name(&self) -> &str {
        basename(&self.path)
    }
}

/// Last component of a posix path.
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Join a posix directory and a name.
pub fn join_remote(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// The provider sends numbers either as JSON numbers or as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

pub(crate) fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = NumberOrString::deserialize(deserializer)?.into_i64()?;
    u64::try_from(n).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => {
            let n = value.into_i64()?;
            u64::try_from(n).map(Some).map_err(serde::de::Error::custom)
        }
        None => Ok(None),
    }
}

pub(crate) fn deserialize_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_i64()
}

pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_i64(deserializer)? != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(path: &str, is_dir: bool) -> SharedPath {
        SharedPath {
            path: path.to_string(),
            is_dir,
            fs_id: 42,
            uk: Some(1),
            share_id: Some(2),
            bdstoken: Some("token".to_string()),
            password: None,
        }
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/a/b/c.txt"), "c.txt");
        assert_eq!(basename("/a/b/"), "b");
        assert_eq!(basename("c.txt"), "c.txt");
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("/save", "dir"), "/save/dir");
        assert_eq!(join_remote("/save/", "dir"), "/save/dir");
        assert_eq!(join_remote("/", "dir"), "/dir");
    }

    #[test]
    fn test_shared_path_credentials() {
        let sp = shared("/share/a.txt", false);
        assert_eq!(sp.credentials(), (1, 2, "token"));
        assert!(sp.is_file());
        assert_eq!(sp.name(), "a.txt");
    }

    #[test]
    #[should_panic(expected = "missing `bdstoken`")]
    fn test_shared_path_credentials_panics_without_token() {
        let mut sp = shared("/share/a.txt", false);
        sp.bdstoken = None;
        sp.credentials();
    }

    #[test]
    fn test_shared_path_display() {
        let display = format!("{}", shared("/share/dir", true));
        assert_eq!(display, "d\t42\t/share/dir");
    }

    #[test]
    fn test_shared_link_flags() {
        let mut link = SharedLink {
            share_id: 7,
            url: "https://pan.baidu.com/s/1abc".to_string(),
            paths: vec!["/a".to_string()],
            password: None,
            public: false,
            status: 0,
            expired_type: 0,
        };
        assert!(link.has_password());
        assert!(link.available());

        link.expired_type = -1;
        assert!(!link.available());

        link.public = true;
        assert!(!link.has_password());
    }

    #[test]
    fn test_pcs_file_deserialize_lenient_numbers() {
        let json = r#"{
            "path": "/save/a.txt",
            "fs_id": "123",
            "isdir": "0",
            "size": 1024
        }"#;

        let file: PcsFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.fs_id, 123);
        assert!(!file.is_dir);
        assert_eq!(file.size, Some(1024));
        assert_eq!(file.name(), "a.txt");
    }

    #[test]
    fn test_pcs_file_without_size() {
        let json = r#"{"path": "/save/dir", "fs_id": 9, "isdir": 1}"#;

        let file: PcsFile = serde_json::from_str(json).unwrap();
        assert!(file.is_dir);
        assert_eq!(file.size, None);
    }
}
