//! End-to-end posting task lifecycle tests
//!
//! Drives a `Poster` against the mock destination and asserts on the exact
//! event sequences the task emits for each lifecycle path.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

use libcrosspost::accounts::{LoginService, RegistryLoginService, StaticLoginService};
use libcrosspost::destinations::mock::MockDestination;
use libcrosspost::destinations::{Destination, DestinationRegistry};
use libcrosspost::events::{EventBus, EventReceiver, PosterEvent};
use libcrosspost::poster::Poster;
use libcrosspost::types::{
    AdditionalFileRecord, FileRecord, PartData, Rating, Submission, SubmissionPart, UserAccount,
};
use libcrosspost::{PostingConfig, ShortcutRegistry};

const ACCOUNT: &str = "acct-1";

async fn next_event(receiver: &mut EventReceiver) -> PosterEvent {
    timeout(Duration::from_secs(2), receiver.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn assert_no_event(receiver: &mut EventReceiver) {
    let result = timeout(Duration::from_millis(200), receiver.recv()).await;
    assert!(result.is_err(), "unexpected event: {:?}", result);
}

fn status_submission() -> Submission {
    Submission {
        id: "sub-1".to_string(),
        title: "Evening Sketch".to_string(),
        sources: vec![],
        rating: Rating::General,
        tags: vec![],
        description: "An evening sketch.".to_string(),
        primary: None,
        thumbnail: None,
        additional: vec![],
    }
}

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> FileRecord {
    let location = dir.path().join(name);
    let mut file = std::fs::File::create(&location).unwrap();
    file.write_all(contents).unwrap();

    FileRecord {
        location,
        name: name.to_string(),
        content_type: "image/png".to_string(),
        size: contents.len() as u64,
    }
}

fn file_submission(dir: &TempDir) -> Submission {
    Submission {
        primary: Some(write_file(dir, "primary.png", b"primary")),
        thumbnail: Some(write_file(dir, "thumb.png", b"thumb")),
        additional: vec![
            AdditionalFileRecord {
                record: write_file(dir, "extra.png", b"extra"),
                ignored_accounts: None,
            },
            AdditionalFileRecord {
                record: write_file(dir, "excluded.png", b"excluded"),
                ignored_accounts: Some(vec![ACCOUNT.to_string()]),
            },
        ],
        ..status_submission()
    }
}

fn part(destination: &str) -> SubmissionPart {
    SubmissionPart {
        account_id: ACCOUNT.to_string(),
        destination: destination.to_string(),
        data: PartData::default(),
    }
}

fn build_poster(
    destination: Arc<MockDestination>,
    login: Arc<dyn LoginService>,
    submission: Submission,
    wait_for_external_start: bool,
    delay: Duration,
) -> Arc<Poster> {
    let name = destination.name().to_string();
    Poster::new(
        destination,
        login,
        Arc::new(ShortcutRegistry::new()),
        PostingConfig {
            advertise: false,
            ..Default::default()
        },
        Arc::new(submission),
        part(&name),
        part(&name),
        wait_for_external_start,
        delay,
        EventBus::new(100),
    )
}

#[tokio::test]
async fn auto_start_success_emits_ready_posting_done() {
    let mock = Arc::new(MockDestination::logged_in("mock", "foxpaint"));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));
    let poster = build_poster(
        mock.clone(),
        login,
        status_submission(),
        false,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();

    match next_event(&mut events).await {
        PosterEvent::Ready {
            submission_id,
            account_id,
            waits_for_external_start,
        } => {
            assert_eq!(submission_id, "sub-1");
            assert_eq!(account_id, ACCOUNT);
            assert!(!waits_for_external_start);
        }
        other => panic!("expected ready, got {:?}", other),
    }
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Posting { .. }
    ));
    match next_event(&mut events).await {
        PosterEvent::Done {
            success,
            sources,
            cancelled,
            ..
        } => {
            assert!(success);
            assert!(!cancelled);
            assert_eq!(sources, vec!["https://mock.example/view/sub-1"]);
        }
        other => panic!("expected done, got {:?}", other),
    }
    assert_no_event(&mut events).await;

    assert_eq!(mock.login_call_count(), 1);
    assert_eq!(mock.post_call_count(), 1);
}

#[tokio::test]
async fn file_submission_assembles_payloads_and_honors_exclusions() {
    let dir = TempDir::new().unwrap();
    let mock = Arc::new(MockDestination::logged_in("mock", "foxpaint"));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));
    let poster = build_poster(
        mock.clone(),
        login,
        file_submission(&dir),
        false,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Ready { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Posting { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Done { success: true, .. }
    ));

    let files = mock.posted_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].primary_filename, "primary.png");
    assert!(files[0].thumbnail);
    assert_eq!(files[0].additional, vec!["extra.png"]);
}

#[tokio::test]
async fn external_start_waits_for_begin_signal() {
    let mock = Arc::new(MockDestination::logged_in("mock", "foxpaint"));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));
    let poster = build_poster(
        mock.clone(),
        login,
        status_submission(),
        true,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();

    match next_event(&mut events).await {
        PosterEvent::Ready {
            waits_for_external_start,
            ..
        } => assert!(waits_for_external_start),
        other => panic!("expected ready, got {:?}", other),
    }

    // Nothing further happens until the external begin signal
    assert_no_event(&mut events).await;
    assert_eq!(mock.login_call_count(), 0);

    poster.begin_externally().await;
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Posting { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Done { success: true, .. }
    ));

    // The begin signal is idempotent
    poster.begin_externally().await;
    assert_no_event(&mut events).await;
    assert_eq!(mock.post_call_count(), 1);
}

#[tokio::test]
async fn cancel_while_scheduled_emits_only_cancelled() {
    let mock = Arc::new(MockDestination::logged_in("mock", "foxpaint"));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));
    let poster = build_poster(
        mock.clone(),
        login,
        status_submission(),
        false,
        Duration::from_secs(30),
    );

    let mut events = poster.subscribe();
    let handle = poster.clone().spawn();

    poster.cancel();
    handle.await.unwrap();

    match next_event(&mut events).await {
        PosterEvent::Cancelled {
            submission_id,
            cancelled,
            ..
        } => {
            assert_eq!(submission_id, "sub-1");
            assert!(cancelled);
        }
        other => panic!("expected cancelled, got {:?}", other),
    }
    assert_no_event(&mut events).await;

    // The attempt never started
    assert_eq!(mock.login_call_count(), 0);
    assert_eq!(mock.post_call_count(), 0);
}

#[tokio::test]
async fn cancel_while_waiting_for_external_start() {
    let mock = Arc::new(MockDestination::logged_in("mock", "foxpaint"));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));
    let poster = build_poster(
        mock.clone(),
        login,
        status_submission(),
        true,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Ready { .. }
    ));

    poster.cancel();
    poster.begin_externally().await;

    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Cancelled { .. }
    ));
    assert_no_event(&mut events).await;
    assert_eq!(mock.post_call_count(), 0);
}

#[tokio::test]
async fn cancel_after_posting_began_has_no_effect() {
    let mock = Arc::new(MockDestination::with_delay(
        "mock",
        Duration::from_millis(100),
    ));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));
    let poster = build_poster(
        mock.clone(),
        login,
        status_submission(),
        false,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    let handle = poster.clone().spawn();

    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Ready { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Posting { .. }
    ));

    // Posting is underway; the request must be silently ignored
    poster.cancel();
    assert!(!poster.is_cancelled());

    match next_event(&mut events).await {
        PosterEvent::Done {
            success, cancelled, ..
        } => {
            assert!(success);
            assert!(!cancelled);
        }
        other => panic!("expected done, got {:?}", other),
    }
    handle.await.unwrap();
}

#[tokio::test]
async fn adapter_failure_emits_error_then_done() {
    let mock = Arc::new(MockDestination::post_failure("mock", "upload rejected"));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));
    let poster = build_poster(
        mock.clone(),
        login,
        status_submission(),
        false,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Ready { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Posting { .. }
    ));
    match next_event(&mut events).await {
        PosterEvent::Error { message, .. } => assert!(message.contains("upload rejected")),
        other => panic!("expected error, got {:?}", other),
    }
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Done { success: false, .. }
    ));
    assert_no_event(&mut events).await;
}

#[tokio::test]
async fn not_logged_in_fails_before_posting() {
    let mock = Arc::new(MockDestination::logged_in("mock", "foxpaint"));
    let login = Arc::new(StaticLoginService::logged_out());
    let poster = build_poster(
        mock.clone(),
        login,
        status_submission(),
        false,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Ready { .. }
    ));
    match next_event(&mut events).await {
        PosterEvent::Error { message, .. } => {
            assert!(message.contains("not logged in"));
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Done { success: false, .. }
    ));

    // The adapter was never dispatched
    assert_eq!(mock.post_call_count(), 0);
}

#[tokio::test]
async fn login_check_failure_is_reported_as_error() {
    let mock = Arc::new(MockDestination::login_failure("mock", "connection reset"));

    let mut registry = DestinationRegistry::new();
    registry.register(mock.clone());
    let mut login = RegistryLoginService::new(Arc::new(registry));
    login.add_account(UserAccount {
        id: ACCOUNT.to_string(),
        alias: "main".to_string(),
        destination: "mock".to_string(),
    });

    let poster = build_poster(
        mock.clone(),
        Arc::new(login),
        status_submission(),
        false,
        Duration::ZERO,
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Ready { .. }
    ));
    match next_event(&mut events).await {
        PosterEvent::Error { message, .. } => assert!(message.contains("connection reset")),
        other => panic!("expected error, got {:?}", other),
    }
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Done { success: false, .. }
    ));
    assert_eq!(mock.post_call_count(), 0);
}

#[tokio::test]
async fn sources_accumulate_and_deduplicate() {
    let mock = Arc::new(MockDestination::logged_in("mock", "foxpaint"));
    let login = Arc::new(StaticLoginService::logged_in("foxpaint"));

    let mut submission = status_submission();
    submission.sources = vec!["https://origin.example/1".to_string()];

    let poster = build_poster(mock.clone(), login, submission, true, Duration::ZERO);

    poster.add_source("https://mirror.example/2");
    poster.add_source("https://mirror.example/2");
    poster.add_source("https://origin.example/1");
    assert_eq!(
        poster.sources(),
        vec!["https://origin.example/1", "https://mirror.example/2"]
    );

    let mut events = poster.subscribe();
    poster.clone().spawn().await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Ready { .. }
    ));

    poster.begin_externally().await;
    assert!(matches!(
        next_event(&mut events).await,
        PosterEvent::Posting { .. }
    ));
    match next_event(&mut events).await {
        PosterEvent::Done { sources, .. } => {
            assert_eq!(
                sources,
                vec![
                    "https://origin.example/1",
                    "https://mirror.example/2",
                    "https://mock.example/view/sub-1"
                ]
            );
        }
        other => panic!("expected done, got {:?}", other),
    }

    // The adapter saw the sources known at assembly time
    assert_eq!(mock.posted()[0].sources.len(), 2);
}

#[tokio::test]
async fn validation_rejects_before_any_task_exists() {
    // The task layer never re-validates; a submission the destination rejects
    // is stopped by the caller consulting the adapter first.
    let dir = TempDir::new().unwrap();
    let mock = MockDestination::failing_validation(
        "mock",
        vec!["mock requires at least 2 tags".to_string()],
    );

    let submission = file_submission(&dir);
    let problems = mock.validate_file_submission(&submission, &part("mock"), &part("mock"));

    assert_eq!(problems, vec!["mock requires at least 2 tags"]);
    assert_eq!(mock.post_call_count(), 0);
    assert_eq!(mock.login_call_count(), 0);
}
