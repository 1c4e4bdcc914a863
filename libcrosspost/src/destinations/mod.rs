//! Destination abstraction and implementations
//!
//! Each supported hosting destination implements the [`Destination`] trait:
//! the capability set a posting task drives, plus declarative data (accepted
//! file extensions, size ceilings, advertisement enablement). One long-lived
//! instance exists per destination and is shared read-only across posting
//! tasks through a [`DestinationRegistry`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DestinationError, Result};
use crate::types::{
    FilePostData, FileRecord, Folder, LoginStatus, PostData, PostResponse, Submission,
    SubmissionPart, UserAccount,
};

pub mod mock;
pub mod weasyl;

/// Capability contract every destination must satisfy to be driven by a
/// posting task.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Lowercase destination identifier, unique within a registry.
    fn name(&self) -> &str;

    /// File extensions the destination accepts for primary assets.
    fn accepted_files(&self) -> &[&str];

    /// Whether advertisement insertion applies to this destination.
    fn advertisement_enabled(&self) -> bool {
        true
    }

    /// Fetch a fresh login status for the account.
    ///
    /// A best-effort secondary refresh (folder listing and the like) failing
    /// must never fail the check itself; only transport failures on the check
    /// call surface as errors.
    async fn check_login_status(&self, account: &UserAccount) -> Result<LoginStatus>;

    /// Flattened folder listing for the account.
    async fn retrieve_folders(&self, _account: &UserAccount) -> Result<Vec<Folder>> {
        Ok(Vec::new())
    }

    /// Escape destination-specific markup before generic substitution runs.
    fn preparse_description(&self, text: &str) -> String {
        text.to_string()
    }

    /// Convert the portable markup dialect into the destination's native
    /// markup.
    fn parse_description(&self, text: &str) -> String;

    /// Formatting rule for inserted text (advertisements). Defaults to the
    /// main parse.
    fn default_description_parser(&self, text: &str) -> String {
        self.parse_description(text)
    }

    /// Human-readable problems with a file submission; empty means valid.
    fn validate_file_submission(
        &self,
        submission: &Submission,
        part: &SubmissionPart,
        default_part: &SubmissionPart,
    ) -> Vec<String>;

    /// Human-readable problems with a status submission; empty means valid.
    fn validate_status_submission(
        &self,
        _submission: &Submission,
        _part: &SubmissionPart,
    ) -> Vec<String> {
        Vec::new()
    }

    /// Submit an assembled file post.
    async fn post_file_submission(&self, data: &FilePostData) -> Result<PostResponse>;

    /// Submit an assembled status post.
    async fn post_status_submission(&self, _data: &PostData) -> Result<PostResponse> {
        Err(DestinationError::NotImplemented(format!(
            "{} does not support status submissions",
            self.name()
        ))
        .into())
    }
}

/// Registry of destination adapters, keyed by destination name.
#[derive(Default)]
pub struct DestinationRegistry {
    destinations: HashMap<String, Arc<dyn Destination>>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, destination: Arc<dyn Destination>) {
        self.destinations
            .insert(destination.name().to_string(), destination);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Destination>> {
        self.destinations.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.destinations.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

/// True when the record's extension is on the destination's allow-list.
pub fn supports_file_type(record: &FileRecord, accepted: &[&str]) -> bool {
    let extension = record
        .name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase());

    match extension {
        Some(ext) => accepted.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

pub fn mb_to_bytes(mb: u64) -> u64 {
    mb * 1024 * 1024
}

/// Create destination clients for all enabled destinations in the
/// configuration.
///
/// # Errors
///
/// Returns an error if a required API-key file is missing or unreadable.
pub fn create_destinations(config: &Config) -> Result<DestinationRegistry> {
    let mut registry = DestinationRegistry::new();

    if let Some(weasyl_config) = &config.weasyl {
        if weasyl_config.enabled {
            info!("Creating Weasyl destination client");

            let key_path = shellexpand::tilde(&weasyl_config.api_key_file).to_string();
            let key_path = std::path::Path::new(&key_path);

            if !key_path.exists() {
                return Err(DestinationError::Authentication(format!(
                    "Weasyl API key file not found: {}. Create this file with your API key from your Weasyl account settings.",
                    key_path.display()
                ))
                .into());
            }

            let api_key = std::fs::read_to_string(key_path)
                .map_err(|e| {
                    DestinationError::Authentication(format!(
                        "Failed to read Weasyl API key file {}: {}",
                        key_path.display(),
                        e
                    ))
                })?
                .trim()
                .to_string();

            let weasyl = match &weasyl_config.base_url {
                Some(base_url) => weasyl::Weasyl::with_base_url(api_key, base_url.clone())?,
                None => weasyl::Weasyl::new(api_key)?,
            };

            registry.register(Arc::new(weasyl));
        }
    }

    if registry.is_empty() {
        warn!("No destinations are enabled in configuration");
    } else {
        info!("Registered {} destination(s)", registry.len());
    }

    Ok(registry)
}
