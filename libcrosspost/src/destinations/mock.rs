//! Mock destination for testing
//!
//! A configurable destination that can simulate login states, posting
//! failures, validation problems, and network latency. Available in all
//! builds so integration tests can drive the posting task without
//! credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::destinations::Destination;
use crate::error::{DestinationError, Result};
use crate::types::{
    FilePostData, LoginStatus, PostData, PostResponse, Submission, SubmissionPart, UserAccount,
};

/// Configuration for mock destination behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: String,

    /// Login status the check reports
    pub logged_in: bool,
    pub username: Option<String>,

    /// If set, the login check itself fails with this network error
    pub login_error: Option<String>,

    /// Whether posting succeeds
    pub post_succeeds: bool,

    /// Error to return on posting failure
    pub post_error: Option<String>,

    /// Validation problems to report
    pub problems: Vec<String>,

    /// Whether advertisement insertion applies
    pub advertisement: bool,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    pub login_call_count: Arc<Mutex<usize>>,
    pub post_call_count: Arc<Mutex<usize>>,

    /// Post data handed to the submit operations, for verification
    pub posted: Arc<Mutex<Vec<PostData>>>,

    /// Shape of the file payload sets handed to `post_file_submission`
    pub posted_files: Arc<Mutex<Vec<PostedFiles>>>,
}

/// What a file submission carried when it reached the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedFiles {
    pub primary_filename: String,
    pub thumbnail: bool,
    pub additional: Vec<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            logged_in: true,
            username: Some("mock-user".to_string()),
            login_error: None,
            post_succeeds: true,
            post_error: None,
            problems: Vec::new(),
            advertisement: false,
            delay: Duration::from_millis(0),
            login_call_count: Arc::new(Mutex::new(0)),
            post_call_count: Arc::new(Mutex::new(0)),
            posted: Arc::new(Mutex::new(Vec::new())),
            posted_files: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock destination for testing
pub struct MockDestination {
    config: MockConfig,
}

impl MockDestination {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// A destination where the account is logged in and posting succeeds.
    pub fn logged_in(name: &str, username: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            username: Some(username.to_string()),
            ..Default::default()
        })
    }

    /// A destination where the login check reports not logged in.
    pub fn logged_out(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            logged_in: false,
            username: None,
            ..Default::default()
        })
    }

    /// A destination where the login check itself fails.
    pub fn login_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            login_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// A destination where posting fails.
    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// A destination whose operations take `delay` to complete.
    pub fn with_delay(name: &str, delay: Duration) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            delay,
            ..Default::default()
        })
    }

    /// A destination that reports the given validation problems.
    pub fn failing_validation(name: &str, problems: Vec<String>) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            problems,
            ..Default::default()
        })
    }

    pub fn login_call_count(&self) -> usize {
        *self.config.login_call_count.lock().unwrap()
    }

    pub fn post_call_count(&self) -> usize {
        *self.config.post_call_count.lock().unwrap()
    }

    pub fn posted(&self) -> Vec<PostData> {
        self.config.posted.lock().unwrap().clone()
    }

    pub fn posted_files(&self) -> Vec<PostedFiles> {
        self.config.posted_files.lock().unwrap().clone()
    }

    async fn complete_post(&self, data: &PostData) -> Result<PostResponse> {
        *self.config.post_call_count.lock().unwrap() += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.post_succeeds {
            self.config.posted.lock().unwrap().push(data.clone());
            Ok(PostResponse {
                source_url: Some(format!(
                    "https://{}.example/view/{}",
                    self.config.name, data.submission.id
                )),
                destination_post_id: Some(format!("{}-1", self.config.name)),
            })
        } else {
            let message = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| "Mock posting failed".to_string());
            Err(DestinationError::Posting(message).into())
        }
    }
}

#[async_trait]
impl Destination for MockDestination {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn accepted_files(&self) -> &[&str] {
        &["jpg", "jpeg", "png", "gif"]
    }

    fn advertisement_enabled(&self) -> bool {
        self.config.advertisement
    }

    async fn check_login_status(&self, _account: &UserAccount) -> Result<LoginStatus> {
        *self.config.login_call_count.lock().unwrap() += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if let Some(message) = &self.config.login_error {
            return Err(DestinationError::Network(message.clone()).into());
        }

        Ok(LoginStatus {
            logged_in: self.config.logged_in,
            username: self.config.username.clone(),
        })
    }

    fn parse_description(&self, text: &str) -> String {
        text.to_string()
    }

    fn validate_file_submission(
        &self,
        _submission: &Submission,
        _part: &SubmissionPart,
        _default_part: &SubmissionPart,
    ) -> Vec<String> {
        self.config.problems.clone()
    }

    fn validate_status_submission(
        &self,
        _submission: &Submission,
        _part: &SubmissionPart,
    ) -> Vec<String> {
        self.config.problems.clone()
    }

    async fn post_file_submission(&self, data: &FilePostData) -> Result<PostResponse> {
        self.config.posted_files.lock().unwrap().push(PostedFiles {
            primary_filename: data.primary.filename.clone(),
            thumbnail: data.thumbnail.is_some(),
            additional: data
                .additional
                .iter()
                .map(|p| p.filename.clone())
                .collect(),
        });

        self.complete_post(&data.post).await
    }

    async fn post_status_submission(&self, data: &PostData) -> Result<PostResponse> {
        self.complete_post(data).await
    }
}
