//! Weasyl destination
//!
//! Talks to the Weasyl JSON API with an API key header. Login checks hit
//! `/api/whoami`; a successful check also refreshes the account's folder
//! listing on a best-effort basis. Submissions go up as multipart form posts.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use tracing::debug;

use crate::destinations::{mb_to_bytes, supports_file_type, Destination};
use crate::error::{DestinationError, Result};
use crate::types::{
    FileKind, FilePostData, Folder, LoginStatus, PostResponse, Rating, Submission, SubmissionPart,
    TagData, UserAccount,
};

const BASE_URL: &str = "https://www.weasyl.com";
const API_KEY_HEADER: &str = "X-Weasyl-API-Key";
const ACCEPTED_FILES: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "md", "txt", "pdf", "swf", "mp3",
];

pub struct Weasyl {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Folder listings captured by the last refresh, per account.
    folders: Mutex<HashMap<String, Vec<Folder>>>,
}

#[derive(Debug, Deserialize)]
struct WhoamiResponse {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    folders: Option<Vec<ApiFolder>>,
}

#[derive(Debug, Deserialize)]
struct ApiFolder {
    folder_id: u64,
    title: String,
    subfolders: Option<Vec<ApiSubfolder>>,
}

#[derive(Debug, Deserialize)]
struct ApiSubfolder {
    folder_id: u64,
    title: String,
}

impl Weasyl {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            DestinationError::Network(format!("Failed to create Weasyl client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            folders: Mutex::new(HashMap::new()),
        })
    }

    /// Folder listing captured by the most recent refresh for the account.
    pub fn folders_for(&self, account_id: &str) -> Vec<Folder> {
        self.folders
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Ask the API who the key belongs to. Transport failures surface as
    /// errors; an unparseable body reads as not logged in.
    async fn whoami(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/api/whoami", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| DestinationError::Network(format!("Weasyl whoami failed: {}", e)))?;

        match response.json::<WhoamiResponse>().await {
            Ok(body) => Ok(body.login.filter(|login| !login.is_empty())),
            Err(e) => {
                debug!("unparseable whoami response: {}", e);
                Ok(None)
            }
        }
    }

    async fn refresh_folders(&self, account_id: &str, login_name: &str) -> Result<Vec<Folder>> {
        let response = self
            .client
            .get(format!("{}/api/users/{}/view", self.base_url, login_name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| DestinationError::Network(format!("Weasyl user view failed: {}", e)))?;

        let body: ViewResponse = response.json().await.map_err(|e| {
            DestinationError::Network(format!("unparseable user view response: {}", e))
        })?;

        let converted = flatten_folders(body.folders.unwrap_or_default());
        self.folders
            .lock()
            .unwrap()
            .insert(account_id.to_string(), converted.clone());

        Ok(converted)
    }

    fn max_megabytes(kind: FileKind, filename: &str) -> u64 {
        match kind {
            FileKind::Video | FileKind::Audio => 15,
            FileKind::Text => {
                let lower = filename.to_lowercase();
                if lower.ends_with(".md") || lower.ends_with(".txt") {
                    2
                } else {
                    10
                }
            }
            FileKind::Image | FileKind::Unknown => 10,
        }
    }

    fn rating_code(rating: Rating) -> u8 {
        match rating {
            Rating::General => 10,
            Rating::Mature => 30,
            Rating::Adult | Rating::Extreme => 40,
        }
    }
}

/// Flatten the API's folder tree into a single list, subfolders titled
/// `parent / child`.
fn flatten_folders(folders: Vec<ApiFolder>) -> Vec<Folder> {
    let mut converted = Vec::new();

    for folder in folders {
        let parent = Folder {
            id: folder.folder_id.to_string(),
            title: folder.title,
        };
        let parent_title = parent.title.clone();
        converted.push(parent);

        for subfolder in folder.subfolders.unwrap_or_default() {
            converted.push(Folder {
                id: subfolder.folder_id.to_string(),
                title: format!("{} / {}", parent_title, subfolder.title),
            });
        }
    }

    converted
}

/// Convert the portable dialect into Weasyl-flavored markdown.
fn to_markdown(text: &str) -> String {
    static BREAKS: OnceLock<Regex> = OnceLock::new();
    static PARAGRAPH_OPEN: OnceLock<Regex> = OnceLock::new();
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static ITALIC: OnceLock<Regex> = OnceLock::new();
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    static LEFTOVER_TAGS: OnceLock<Regex> = OnceLock::new();
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

    let breaks = BREAKS.get_or_init(|| Regex::new(r"<br\s*/?>").unwrap());
    let paragraph_open = PARAGRAPH_OPEN.get_or_init(|| Regex::new(r"<p[^>]*>").unwrap());
    let bold = BOLD.get_or_init(|| Regex::new(r"</?(?:b|strong)>").unwrap());
    let italic = ITALIC.get_or_init(|| Regex::new(r"</?(?:i|em)>").unwrap());
    let anchor =
        ANCHOR.get_or_init(|| Regex::new(r#"<a\s+href="([^"]+)"[^>]*>([^<]*)</a>"#).unwrap());
    let leftover_tags = LEFTOVER_TAGS.get_or_init(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").unwrap());

    let mut out = text.replace("\r\n", "\n");
    out = breaks.replace_all(&out, "\n").into_owned();
    out = out.replace("</p>", "\n\n");
    out = paragraph_open.replace_all(&out, "").into_owned();
    out = bold.replace_all(&out, "**").into_owned();
    out = italic.replace_all(&out, "*").into_owned();
    out = anchor.replace_all(&out, "[$2]($1)").into_owned();
    out = leftover_tags.replace_all(&out, "").into_owned();
    out = blank_runs.replace_all(&out, "\n\n").into_owned();
    out.trim().to_string()
}

#[async_trait]
impl Destination for Weasyl {
    fn name(&self) -> &str {
        "weasyl"
    }

    fn accepted_files(&self) -> &[&str] {
        ACCEPTED_FILES
    }

    async fn check_login_status(&self, account: &UserAccount) -> Result<LoginStatus> {
        let mut status = LoginStatus::not_logged_in();

        if let Some(login) = self.whoami().await? {
            status.logged_in = true;
            status.username = Some(login.clone());

            // Best-effort data refresh; never fails the login check
            if let Err(e) = self.refresh_folders(&account.id, &login).await {
                debug!(account = %account.id, "weasyl folder refresh failed: {}", e);
            }
        }

        Ok(status)
    }

    async fn retrieve_folders(&self, account: &UserAccount) -> Result<Vec<Folder>> {
        let login = self.whoami().await?.ok_or_else(|| {
            DestinationError::Authentication(format!(
                "account {} is not logged in to Weasyl",
                account.id
            ))
        })?;

        self.refresh_folders(&account.id, &login).await
    }

    fn parse_description(&self, text: &str) -> String {
        to_markdown(text)
    }

    fn validate_file_submission(
        &self,
        submission: &Submission,
        part: &SubmissionPart,
        default_part: &SubmissionPart,
    ) -> Vec<String> {
        let mut problems = Vec::new();

        let Some(primary) = &submission.primary else {
            problems.push("Weasyl requires a file to submit.".to_string());
            return problems;
        };

        if !supports_file_type(primary, ACCEPTED_FILES) {
            problems.push(format!(
                "Weasyl does not support file format: {}.",
                primary.content_type
            ));
        }

        if TagData::merged(&default_part.data.tags, &part.data.tags).len() < 2 {
            problems.push("Weasyl requires at least 2 tags.".to_string());
        }

        let kind = primary.kind();
        let max_mb = Self::max_megabytes(kind, &primary.name);
        if mb_to_bytes(max_mb) < primary.size {
            problems.push(format!("Weasyl limits {} submissions to {}MB", kind, max_mb));
        }

        problems
    }

    async fn post_file_submission(&self, data: &FilePostData) -> Result<PostResponse> {
        let mut form = reqwest::multipart::Form::new()
            .text("title", data.post.title.clone())
            .text("content", data.post.description.clone())
            .text("tags", data.post.tags.join(" "))
            .text("rating", Self::rating_code(data.post.rating).to_string());

        if let Some(folder) = data.post.options.get("folder").and_then(|v| v.as_str()) {
            form = form.text("folderid", folder.to_string());
        }
        if data
            .post
            .options
            .get("critique")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            form = form.text("critique", "1");
        }
        if !data
            .post
            .options
            .get("notify")
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
        {
            form = form.text("nonotification", "1");
        }

        let primary = reqwest::multipart::Part::bytes(data.primary.buffer.clone())
            .file_name(data.primary.filename.clone())
            .mime_str(&data.primary.content_type)
            .map_err(|e| {
                DestinationError::Posting(format!("invalid primary content type: {}", e))
            })?;
        form = form.part("submitfile", primary);

        if let Some(thumbnail) = &data.thumbnail {
            let part = reqwest::multipart::Part::bytes(thumbnail.buffer.clone())
                .file_name(thumbnail.filename.clone())
                .mime_str(&thumbnail.content_type)
                .map_err(|e| {
                    DestinationError::Posting(format!("invalid thumbnail content type: {}", e))
                })?;
            form = form.part("thumbfile", part);
        }

        let response = self
            .client
            .post(format!("{}/submit/visual", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DestinationError::Network(format!("Weasyl submit failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DestinationError::Posting(format!(
                "Weasyl rejected the submission: HTTP {}",
                response.status()
            ))
            .into());
        }

        Ok(PostResponse {
            source_url: Some(response.url().to_string()),
            destination_post_id: None,
        })
    }
}
