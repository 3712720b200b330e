//! Baidu Netdisk web API client.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use reqwest::header::{COOKIE, REFERER, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::PanApi;
use crate::auth::{Session, BDCLND};
use crate::error::{PanError, Result, ERRNO_NOT_FOUND, ERRNO_VCODE_INVALID, ERRNO_VCODE_REQUIRED};
use crate::models::{
    deserialize_flag, deserialize_i64, deserialize_opt_u64, deserialize_u64, PcsFile,
    SharedLink, SharedPath,
};
use crate::url_parser::{share_token, surl};

/// Base URL of the netdisk web API.
const PAN_API_BASE: &str = "https://pan.baidu.com";

const PAN_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Query parameters every web API call carries.
const WEB_PARAMS: [(&str, &str); 3] = [("channel", "chunlei"), ("clienttype", "0"), ("web", "1")];

/// Page size used when listing my own directories.
const LIST_PAGE_SIZE: usize = 1000;

/// How many verification codes are asked for before giving up.
const VCODE_ATTEMPTS: usize = 3;

/// Share metadata embedded in the share page.
static PAGE_DATA_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:locals\.mset|yunData\.setData)\((\{.+?\})\);")
        .expect("Invalid share page regex")
});

/// Asks the user to solve the captcha at the given image URL.
pub type VcodePrompt = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Client for the Baidu Netdisk web API.
pub struct PanClient {
    base_url: String,
    session: Session,
    http: Client,
    vcode_prompt: Option<VcodePrompt>,
}

impl PanClient {
    /// Create a new PanClient for the logged-in `session`.
    pub fn new(session: Session) -> Self {
        Self::with_base_url(PAN_API_BASE, session)
    }

    /// Create a client talking to another host (used by tests).
    pub fn with_base_url(base_url: &str, session: Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            http: Client::new(),
            vcode_prompt: None,
        }
    }

    /// Install the callback used to solve share verification captchas.
    pub fn with_vcode_prompt(mut self, prompt: VcodePrompt) -> Self {
        self.vcode_prompt = Some(prompt);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn get(&self, path: &str) -> RequestBuilder {
        debug!(path, "GET");
        self.http
            .get(format!("{}{}", self.base_url, path))
            .header(COOKIE, self.session.cookie_header().await)
            .header(USER_AGENT, PAN_USER_AGENT)
    }

    async fn post(&self, path: &str) -> RequestBuilder {
        debug!(path, "POST");
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header(COOKIE, self.session.cookie_header().await)
            .header(USER_AGENT, PAN_USER_AGENT)
    }

    /// The anti-forgery token of the logged-in user, fetched once per session.
    pub async fn bdstoken(&self) -> Result<String> {
        if let Some(token) = self.session.cached_bdstoken().await {
            return Ok(token);
        }

        let response = self
            .get("/api/gettemplatevariable")
            .await
            .query(&WEB_PARAMS)
            .query(&[("fields", r#"["bdstoken"]"#)])
            .send()
            .await?;

        let body: TemplateVariables = read_json(response).await?;
        self.session.store_bdstoken(&body.result.bdstoken).await;
        Ok(body.result.bdstoken)
    }

    async fn captcha(&self) -> Result<Captcha> {
        let response = self
            .get("/api/getcaptcha")
            .await
            .query(&WEB_PARAMS)
            .query(&[("prod", "shareverify")])
            .send()
            .await?;
        read_json(response).await
    }
}

impl PanApi for PanClient {
    async fn share(&self, paths: &[String], password: &str, period: u32) -> Result<SharedLink> {
        let bdstoken = self.bdstoken().await?;
        let path_list = serde_json::to_string(paths)?;

        let response = self
            .post("/share/set")
            .await
            .query(&WEB_PARAMS)
            .query(&[("bdstoken", bdstoken.as_str())])
            .form(&[
                ("path_list", path_list),
                ("schannel", "4".to_string()),
                ("channel_list", "[]".to_string()),
                ("period", period.to_string()),
                ("pwd", password.to_string()),
            ])
            .send()
            .await?;

        let body: ShareSetResponse = read_json(response).await?;
        Ok(SharedLink {
            share_id: body.shareid,
            url: body.link.or(body.shorturl).unwrap_or_default(),
            paths: paths.to_vec(),
            password: (!password.is_empty()).then(|| password.to_string()),
            public: password.is_empty(),
            status: 0,
            expired_type: 0,
        })
    }

    async fn list_shared(&self, page: u32) -> Result<Vec<SharedLink>> {
        let response = self
            .get("/share/record")
            .await
            .query(&WEB_PARAMS)
            .query(&[("page", page.to_string())])
            .query(&[("desc", "1"), ("order", "time")])
            .send()
            .await?;

        let body: RecordResponse = read_json(response).await?;
        Ok(body.list.into_iter().map(ShareRecord::into_link).collect())
    }

    async fn shared_password(&self, share_id: u64) -> Result<Option<String>> {
        let bdstoken = self.bdstoken().await?;
        let response = self
            .get("/share/surlinfoinrecord")
            .await
            .query(&WEB_PARAMS)
            .query(&[("shareid", share_id.to_string()), ("bdstoken", bdstoken)])
            .send()
            .await?;

        let body: SurlInfo = read_json(response).await?;
        // "0" marks a public share
        Ok(body.pwd.filter(|p| !p.is_empty() && p != "0"))
    }

    async fn cancel_shared(&self, share_ids: &[u64]) -> Result<()> {
        let bdstoken = self.bdstoken().await?;
        let shareid_list = serde_json::to_string(share_ids)?;

        let response = self
            .post("/share/cancel")
            .await
            .query(&WEB_PARAMS)
            .query(&[("bdstoken", bdstoken.as_str())])
            .form(&[("shareid_list", shareid_list)])
            .send()
            .await?;

        read_json::<Value>(response).await?;
        Ok(())
    }

    async fn access_shared(
        &self,
        shared_url: &str,
        password: &str,
        show_vcode: bool,
    ) -> Result<()> {
        let token = share_token(shared_url)?;
        let mut vcode = String::new();
        let mut vcode_str = String::new();
        let mut attempts = 0;

        loop {
            let response = self
                .post("/share/verify")
                .await
                .query(&WEB_PARAMS)
                .query(&[
                    ("surl", surl(token).to_string()),
                    ("t", timestamp_millis().to_string()),
                    ("bdstoken", "null".to_string()),
                ])
                .header(REFERER, shared_url)
                .form(&[
                    ("pwd", password),
                    ("vcode", vcode.as_str()),
                    ("vcode_str", vcode_str.as_str()),
                ])
                .send()
                .await?;

            match read_json::<VerifyResponse>(response).await {
                Ok(body) => {
                    self.session.set_cookie(BDCLND, &body.randsk).await;
                    debug!(shared_url, "share password accepted");
                    return Ok(());
                }
                Err(err)
                    if show_vcode
                        && attempts < VCODE_ATTEMPTS
                        && matches!(
                            err.code(),
                            Some(ERRNO_VCODE_REQUIRED | ERRNO_VCODE_INVALID)
                        ) =>
                {
                    let Some(prompt) = self.vcode_prompt.as_ref() else {
                        return Err(err);
                    };
                    let captcha = self.captcha().await?;
                    let Some(answer) = prompt(&captcha.vcode_img) else {
                        return Err(err);
                    };
                    vcode = answer;
                    vcode_str = captcha.vcode_str;
                    attempts += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn shared_paths(&self, shared_url: &str) -> Result<Vec<SharedPath>> {
        let token = share_token(shared_url)?;
        let response = self.get(&format!("/s/{}", token)).await.send().await?;

        let status = response.status();
        let html = response.text().await?;
        if !status.is_success() {
            return Err(PanError::StatusError {
                status: status.as_u16(),
                message: html,
            });
        }

        let data = parse_share_page(&html)?;
        let uk = data
            .share_uk
            .or(data.uk)
            .ok_or_else(|| PanError::MalformedResponse("share page has no uk".to_string()))?;
        let bdstoken = match data.bdstoken.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => self.bdstoken().await?,
        };

        Ok(data
            .file_list
            .into_entries()
            .into_iter()
            .map(|entry| entry.into_shared_path(uk, data.shareid, &bdstoken))
            .collect())
    }

    async fn list_shared_paths(
        &self,
        dir: &str,
        uk: u64,
        share_id: u64,
        bdstoken: &str,
        page: u32,
        size: u32,
    ) -> Result<Vec<SharedPath>> {
        let response = self
            .get("/share/list")
            .await
            .query(&WEB_PARAMS)
            .query(&[
                ("uk", uk.to_string()),
                ("shareid", share_id.to_string()),
                ("dir", dir.to_string()),
                ("page", page.to_string()),
                ("num", size.to_string()),
                ("bdstoken", bdstoken.to_string()),
            ])
            .query(&[("order", "other"), ("desc", "1"), ("showempty", "0")])
            .send()
            .await?;

        let body: SharedListResponse = read_json(response).await?;
        Ok(body
            .list
            .into_iter()
            .map(|entry| entry.into_shared_path(uk, share_id, bdstoken))
            .collect())
    }

    async fn transfer_shared_paths(
        &self,
        remotedir: &str,
        fs_ids: &[u64],
        uk: u64,
        share_id: u64,
        bdstoken: &str,
        shared_url: &str,
    ) -> Result<()> {
        let fsidlist = serde_json::to_string(fs_ids)?;

        let response = self
            .post("/share/transfer")
            .await
            .query(&WEB_PARAMS)
            .query(&[
                ("shareid", share_id.to_string()),
                ("from", uk.to_string()),
                ("bdstoken", bdstoken.to_string()),
            ])
            .header(REFERER, shared_url)
            .form(&[("fsidlist", fsidlist), ("path", remotedir.to_string())])
            .send()
            .await?;

        read_json::<Value>(response).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = serde_json::to_string(&[path])?;
        let response = self
            .get("/api/filemetas")
            .await
            .query(&WEB_PARAMS)
            .query(&[("target", target)])
            .send()
            .await?;

        match read_json::<FileMetas>(response).await {
            Ok(metas) => Ok(!metas.info.is_empty()),
            // filemetas reports a missing target as 12 or -9
            Err(err) if matches!(err.code(), Some(12 | ERRNO_NOT_FOUND)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn makedir(&self, path: &str) -> Result<()> {
        let bdstoken = self.bdstoken().await?;
        let response = self
            .post("/api/create")
            .await
            .query(&WEB_PARAMS)
            .query(&[("a", "commit"), ("bdstoken", bdstoken.as_str())])
            .form(&[("path", path), ("isdir", "1"), ("block_list", "[]")])
            .send()
            .await?;

        read_json::<Value>(response).await?;
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<PcsFile>> {
        let mut files = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .get("/api/list")
                .await
                .query(&WEB_PARAMS)
                .query(&[
                    ("dir", path.to_string()),
                    ("page", page.to_string()),
                    ("num", LIST_PAGE_SIZE.to_string()),
                ])
                .query(&[("order", "name"), ("desc", "0"), ("showempty", "0")])
                .send()
                .await?;

            let body: ListResponse = read_json(response).await?;
            let count = body.list.len();
            files.extend(body.list);

            if count < LIST_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(files)
    }
}

/// Read a JSON body, turning a non-zero `errno` into [`PanError::Provider`].
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(PanError::StatusError {
            status: status.as_u16(),
            message: body,
        });
    }

    let value: Value = serde_json::from_str(&body)?;
    check_errno(&value)?;
    Ok(serde_json::from_value(value)?)
}

fn check_errno(value: &Value) -> Result<()> {
    let errno = value
        .get("errno")
        .or_else(|| value.get("error_code"))
        .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
        .unwrap_or(0);

    if errno == 0 {
        return Ok(());
    }

    let message = ["show_msg", "errmsg", "error_msg"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str));
    Err(PanError::provider(errno, message))
}

/// Extract the share metadata embedded in a share page.
pub(crate) fn parse_share_page(html: &str) -> Result<SharePageData> {
    let json = PAGE_DATA_REGEX
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| PanError::MalformedResponse("share page has no share data".to_string()))?;

    let value: Value = serde_json::from_str(json.as_str())?;
    check_errno(&value)?;
    Ok(serde_json::from_value(value)?)
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct TemplateVariables {
    result: TemplateResult,
}

#[derive(Debug, Deserialize)]
struct TemplateResult {
    bdstoken: String,
}

#[derive(Debug, Deserialize)]
struct Captcha {
    vcode_str: String,
    vcode_img: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    randsk: String,
}

/// An entry of a share as sent by the share page and `share/list`.
#[derive(Debug, Deserialize)]
struct RawSharedEntry {
    #[serde(deserialize_with = "deserialize_u64")]
    fs_id: u64,
    path: String,
    #[serde(deserialize_with = "deserialize_flag")]
    isdir: bool,
}

impl RawSharedEntry {
    fn into_shared_path(self, uk: u64, share_id: u64, bdstoken: &str) -> SharedPath {
        SharedPath {
            path: self.path,
            is_dir: self.isdir,
            fs_id: self.fs_id,
            uk: Some(uk),
            share_id: Some(share_id),
            bdstoken: Some(bdstoken.to_string()),
            password: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SharePageData {
    #[serde(deserialize_with = "deserialize_u64")]
    shareid: u64,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    share_uk: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    uk: Option<u64>,
    #[serde(default)]
    bdstoken: Option<String>,
    #[serde(default)]
    file_list: FileList,
}

/// Newer pages embed a plain list, older ones wrap it in `{"list": [..]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileList {
    Entries(Vec<RawSharedEntry>),
    Wrapped { list: Vec<RawSharedEntry> },
}

impl Default for FileList {
    fn default() -> Self {
        FileList::Entries(Vec::new())
    }
}

impl FileList {
    fn into_entries(self) -> Vec<RawSharedEntry> {
        match self {
            FileList::Entries(entries) | FileList::Wrapped { list: entries } => entries,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SharedListResponse {
    #[serde(default)]
    list: Vec<RawSharedEntry>,
}

#[derive(Debug, Deserialize)]
struct ShareSetResponse {
    #[serde(deserialize_with = "deserialize_u64")]
    shareid: u64,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    shorturl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    #[serde(default)]
    list: Vec<ShareRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareRecord {
    #[serde(deserialize_with = "deserialize_u64")]
    share_id: u64,
    #[serde(default)]
    shortlink: String,
    #[serde(default)]
    typical_path: String,
    #[serde(default, deserialize_with = "deserialize_i64")]
    status: i64,
    #[serde(default, deserialize_with = "deserialize_flag")]
    public: bool,
    #[serde(default, deserialize_with = "deserialize_i64")]
    expired_type: i64,
}

impl ShareRecord {
    fn into_link(self) -> SharedLink {
        SharedLink {
            share_id: self.share_id,
            url: self.shortlink,
            paths: vec![self.typical_path],
            password: None,
            public: self.public,
            status: self.status,
            expired_type: self.expired_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SurlInfo {
    #[serde(default)]
    pwd: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileMetas {
    #[serde(default)]
    info: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    list: Vec<PcsFile>,
}
