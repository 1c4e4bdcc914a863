//! The posting task
//!
//! A `Poster` owns one submission-to-destination posting attempt: the
//! scheduling delay, readiness signaling, the cancellation gate, the login
//! gate, description parsing, payload assembly, adapter dispatch, and outcome
//! reporting over the event bus.
//!
//! Cancellation is cooperative. A `cancel()` call only takes effect at the
//! next checkpoint, and is ignored entirely once the attempt has transitioned
//! to posting: payload dispatch is the point of no return. Each task runs its
//! lifecycle exactly once and is never reused for a second attempt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accounts::LoginService;
use crate::config::PostingConfig;
use crate::description::DescriptionPipeline;
use crate::destinations::Destination;
use crate::error::{DestinationError, Result};
use crate::events::{EventBus, EventReceiver, PosterEvent};
use crate::payload;
use crate::shortcuts::ShortcutRegistry;
use crate::types::{FilePostData, PostData, PostResponse, Submission, SubmissionPart, TagData};

enum AttemptOutcome {
    Posted(PostResponse),
    Cancelled,
}

pub struct Poster {
    destination: Arc<dyn Destination>,
    login: Arc<dyn LoginService>,
    shortcuts: Arc<ShortcutRegistry>,
    settings: PostingConfig,
    submission: Arc<Submission>,
    part: SubmissionPart,
    default_part: SubmissionPart,
    delay: Duration,
    wait_for_external_start: AtomicBool,
    cancelled: AtomicBool,
    posting: AtomicBool,
    ready: AtomicBool,
    /// Single-attempt latch; makes the external begin signal idempotent.
    attempted: AtomicBool,
    /// Task-owned copy of the submission's sources, appendable while the task
    /// is alive (mirror links from earlier posts of the same submission).
    sources: Mutex<Vec<String>>,
    events: EventBus,
    timer: CancellationToken,
}

impl Poster {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        destination: Arc<dyn Destination>,
        login: Arc<dyn LoginService>,
        shortcuts: Arc<ShortcutRegistry>,
        settings: PostingConfig,
        submission: Arc<Submission>,
        part: SubmissionPart,
        default_part: SubmissionPart,
        wait_for_external_start: bool,
        delay: Duration,
        events: EventBus,
    ) -> Arc<Self> {
        let sources = submission.sources.clone();

        Arc::new(Self {
            destination,
            login,
            shortcuts,
            settings,
            submission,
            part,
            default_part,
            delay,
            wait_for_external_start: AtomicBool::new(wait_for_external_start),
            cancelled: AtomicBool::new(false),
            posting: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            attempted: AtomicBool::new(false),
            sources: Mutex::new(sources),
            events,
            timer: CancellationToken::new(),
        })
    }

    /// Arm the scheduling timer. The returned handle resolves once the task
    /// has either run its attempt, parked for an external start, or been
    /// cancelled while scheduled.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = self.timer.cancelled() => {
                    debug!(
                        submission = %self.submission.id,
                        account = %self.part.account_id,
                        "posting task cancelled while scheduled"
                    );
                    self.emit_cancelled();
                }
                _ = tokio::time::sleep(self.delay) => {
                    self.fire().await;
                }
            }
        })
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn is_posting(&self) -> bool {
        self.posting.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }

    /// Append a source URL unless it is already present.
    pub fn add_source(&self, source: &str) {
        let mut sources = self.sources.lock().unwrap();
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }

    /// Request cancellation. Takes effect at the next checkpoint; a no-op once
    /// the attempt has begun posting.
    pub fn cancel(&self) {
        if self.posting.load(Ordering::SeqCst) {
            return;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        self.timer.cancel();
    }

    /// External begin signal: clears the external-start requirement and, if
    /// the task has already readied, runs the attempt. Safe to call when the
    /// attempt already ran or is running.
    pub async fn begin_externally(&self) {
        self.wait_for_external_start.store(false, Ordering::SeqCst);
        if self.ready.load(Ordering::SeqCst) {
            self.perform().await;
        }
    }

    async fn fire(&self) {
        // Cancellation may have landed between the timer completing and this
        // running; readiness must not be announced for a dead task.
        if self.cancelled.load(Ordering::SeqCst) {
            self.emit_cancelled();
            return;
        }

        self.ready.store(true, Ordering::SeqCst);
        let waits = self.wait_for_external_start.load(Ordering::SeqCst);
        self.events.emit(PosterEvent::Ready {
            submission_id: self.submission.id.clone(),
            account_id: self.part.account_id.clone(),
            waits_for_external_start: waits,
        });

        if !waits {
            self.perform().await;
        }
    }

    async fn perform(&self) {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return;
        }

        // Checkpoint: cancellation requested before the attempt entered
        if self.cancelled.load(Ordering::SeqCst) {
            self.emit_cancelled();
            return;
        }

        match self.attempt().await {
            Ok(AttemptOutcome::Cancelled) => self.emit_cancelled(),
            Ok(AttemptOutcome::Posted(response)) => {
                if let Some(url) = &response.source_url {
                    self.add_source(url);
                }
                info!(
                    submission = %self.submission.id,
                    destination = %self.destination.name(),
                    "submission posted"
                );
                self.emit_done(true);
            }
            Err(e) => {
                warn!(
                    submission = %self.submission.id,
                    destination = %self.destination.name(),
                    error = %e,
                    "posting attempt failed"
                );
                self.events.emit(PosterEvent::Error {
                    submission_id: self.submission.id.clone(),
                    account_id: self.part.account_id.clone(),
                    message: e.to_string(),
                });
                self.emit_done(false);
            }
        }
    }

    async fn attempt(&self) -> Result<AttemptOutcome> {
        let status = self.login.check_login(&self.part.account_id).await?;

        // Checkpoint: cancellation requested while the login check was in flight
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(AttemptOutcome::Cancelled);
        }

        if !status.logged_in {
            return Err(DestinationError::Authentication(format!(
                "account {} is not logged in to {}",
                self.part.account_id,
                self.destination.name()
            ))
            .into());
        }

        let description =
            DescriptionPipeline::new(self.destination.as_ref(), &self.shortcuts, &self.settings)
                .run(&self.default_part.data.description, &self.part.data.description);

        let data = PostData {
            submission: Arc::clone(&self.submission),
            part: self.part.clone(),
            title: self
                .part
                .data
                .effective_title(&self.default_part.data, &self.submission),
            description,
            rating: self
                .part
                .data
                .effective_rating(&self.default_part.data, &self.submission),
            tags: TagData::merged(&self.default_part.data.tags, &self.part.data.tags),
            sources: self.sources(),
            options: self.part.data.options.clone(),
        };

        if self.submission.is_file_submission() {
            let files =
                payload::assemble(&self.submission, &self.part.data, &self.part.account_id).await?;

            // Checkpoint: last chance to abort before the point of no return
            if self.cancelled.load(Ordering::SeqCst) {
                return Ok(AttemptOutcome::Cancelled);
            }

            self.transition_to_posting();
            let response = self
                .destination
                .post_file_submission(&FilePostData {
                    post: data,
                    primary: files.primary,
                    thumbnail: files.thumbnail,
                    additional: files.additional,
                })
                .await?;
            Ok(AttemptOutcome::Posted(response))
        } else {
            self.transition_to_posting();
            let response = self.destination.post_status_submission(&data).await?;
            Ok(AttemptOutcome::Posted(response))
        }
    }

    fn transition_to_posting(&self) {
        self.posting.store(true, Ordering::SeqCst);
        info!(
            submission = %self.submission.id,
            destination = %self.destination.name(),
            account = %self.part.account_id,
            "dispatching submission"
        );
        self.events.emit(PosterEvent::Posting {
            submission_id: self.submission.id.clone(),
            account_id: self.part.account_id.clone(),
        });
    }

    fn emit_cancelled(&self) {
        self.events.emit(PosterEvent::Cancelled {
            submission_id: self.submission.id.clone(),
            account_id: self.part.account_id.clone(),
            cancelled: true,
        });
    }

    fn emit_done(&self, success: bool) {
        self.events.emit(PosterEvent::Done {
            submission_id: self.submission.id.clone(),
            account_id: self.part.account_id.clone(),
            success,
            sources: self.sources(),
            cancelled: self.cancelled.load(Ordering::SeqCst),
        });
    }
}
