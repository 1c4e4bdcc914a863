//! Core submission types for Crosspost

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Content rating attached to a submission or part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    General,
    Mature,
    Adult,
    Extreme,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Mature => write!(f, "mature"),
            Self::Adult => write!(f, "adult"),
            Self::Extreme => write!(f, "extreme"),
        }
    }
}

/// Coarse content category detected from a declared content type.
///
/// Destinations key their size ceilings on this, not on the exact format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Text,
    Unknown,
}

impl FileKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let lower = content_type.to_lowercase();
        if lower.starts_with("image/") {
            Self::Image
        } else if lower.starts_with("video/") || lower == "application/x-shockwave-flash" {
            Self::Video
        } else if lower.starts_with("audio/") {
            Self::Audio
        } else if lower.starts_with("text/") || lower == "application/pdf" {
            Self::Text
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Text => write!(f, "text"),
            Self::Unknown => write!(f, "file"),
        }
    }
}

/// A file-backed asset referenced by a submission.
///
/// The bytes stay on disk until the payload assembler reads them for a single
/// posting attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub location: PathBuf,
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

impl FileRecord {
    pub fn kind(&self) -> FileKind {
        FileKind::from_content_type(&self.content_type)
    }
}

/// An additional attachment with a per-account exclusion list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalFileRecord {
    pub record: FileRecord,
    /// Destination account ids this attachment must not be sent to.
    /// A missing list excludes nothing.
    pub ignored_accounts: Option<Vec<String>>,
}

impl AdditionalFileRecord {
    pub fn is_ignored_for(&self, account_id: &str) -> bool {
        self.ignored_accounts
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|id| id == account_id)
    }
}

/// A caller-owned submission: the content plus its defaults.
///
/// Posting tasks hold this behind an `Arc` and never mutate it; the one piece
/// of per-task mutable state derived from it is the sources copy, which grows
/// as mirror links from earlier posts come in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub sources: Vec<String>,
    pub rating: Rating,
    pub tags: Vec<String>,
    pub description: String,
    pub primary: Option<FileRecord>,
    pub thumbnail: Option<FileRecord>,
    pub additional: Vec<AdditionalFileRecord>,
}

impl Submission {
    pub fn is_file_submission(&self) -> bool {
        self.primary.is_some()
    }
}

/// Tag override bundle: either extends the default tag set or replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagData {
    pub extend_default: bool,
    pub value: Vec<String>,
}

impl Default for TagData {
    fn default() -> Self {
        Self {
            extend_default: true,
            value: Vec::new(),
        }
    }
}

impl TagData {
    /// Merge default and override tags per the override's policy, preserving
    /// order and dropping duplicates.
    pub fn merged(default: &TagData, part: &TagData) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        if part.extend_default {
            for tag in default.value.iter().chain(part.value.iter()) {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        } else {
            for tag in &part.value {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }
}

/// Description override bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptionData {
    pub overwrite_default: bool,
    pub value: String,
}

impl DescriptionData {
    /// Select the override text when it is in force and non-blank, else the
    /// default text.
    pub fn select<'a>(default: &'a DescriptionData, part: &'a DescriptionData) -> &'a str {
        if part.overwrite_default && !part.value.trim().is_empty() {
            &part.value
        } else {
            &default.value
        }
    }
}

/// Per-destination (or default) overrides of the submission metadata, plus a
/// destination-specific option bag (folder ids, notify flags, and the like).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartData {
    pub title: Option<String>,
    pub rating: Option<Rating>,
    pub tags: TagData,
    pub description: DescriptionData,
    pub use_thumbnail: bool,
    pub options: serde_json::Value,
}

impl Default for PartData {
    fn default() -> Self {
        Self {
            title: None,
            rating: None,
            tags: TagData::default(),
            description: DescriptionData::default(),
            use_thumbnail: true,
            options: serde_json::Value::Null,
        }
    }
}

impl PartData {
    /// Title fallback chain: override, else default, else the submission's own
    /// title.
    pub fn effective_title(&self, default: &PartData, submission: &Submission) -> String {
        self.title
            .clone()
            .or_else(|| default.title.clone())
            .unwrap_or_else(|| submission.title.clone())
    }

    /// Rating fallback chain: override, else default, else the submission's
    /// own rating.
    pub fn effective_rating(&self, default: &PartData, submission: &Submission) -> Rating {
        self.rating.or(default.rating).unwrap_or(submission.rating)
    }
}

/// One part per destination-account pairing; exactly one default part exists
/// per submission as the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPart {
    pub account_id: String,
    pub destination: String,
    pub data: PartData,
}

/// Result of a fresh login check. Never reused across posting attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStatus {
    pub logged_in: bool,
    pub username: Option<String>,
}

impl LoginStatus {
    pub fn not_logged_in() -> Self {
        Self {
            logged_in: false,
            username: None,
        }
    }
}

/// A destination-side folder a submission can be filed under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub title: String,
}

/// An account at a destination, as known to the login service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub alias: String,
    pub destination: String,
}

/// In-memory file content ready for network transfer. Produced fresh per
/// posting attempt, owned by that attempt, never cached.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub buffer: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// The destination-agnostic record a posting attempt assembles before handing
/// off to the adapter.
#[derive(Debug, Clone)]
pub struct PostData {
    pub submission: Arc<Submission>,
    pub part: SubmissionPart,
    pub title: String,
    pub description: String,
    pub rating: Rating,
    pub tags: Vec<String>,
    pub sources: Vec<String>,
    pub options: serde_json::Value,
}

/// `PostData` plus the binary payloads for file-bearing submissions.
#[derive(Debug, Clone)]
pub struct FilePostData {
    pub post: PostData,
    pub primary: FilePayload,
    pub thumbnail: Option<FilePayload>,
    pub additional: Vec<FilePayload>,
}

/// What a destination reports back for a created post.
#[derive(Debug, Clone, Default)]
pub struct PostResponse {
    /// Public URL of the created post, fed back into the task's sources so
    /// later posts of the same submission can link to it.
    pub source_url: Option<String>,
    pub destination_post_id: Option<String>,
}
