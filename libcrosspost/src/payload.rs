//! Payload assembly
//!
//! Reads a file submission's assets into in-memory payloads for one posting
//! attempt. Reads run concurrently but the assembler returns only a complete
//! set: one failed read fails the whole attempt, and no partial set ever
//! reaches a destination adapter.

use futures::future::try_join_all;
use tracing::debug;

use crate::error::{CrosspostError, Result};
use crate::types::{FilePayload, FileRecord, PartData, Submission};

/// The complete payload set for one file submission attempt.
#[derive(Debug)]
pub struct AssembledFiles {
    pub primary: FilePayload,
    pub thumbnail: Option<FilePayload>,
    pub additional: Vec<FilePayload>,
}

/// Read the primary asset, the thumbnail when present and wanted, and every
/// additional attachment not excluded for `account_id`.
pub async fn assemble(
    submission: &Submission,
    part: &PartData,
    account_id: &str,
) -> Result<AssembledFiles> {
    let primary = submission.primary.as_ref().ok_or_else(|| {
        CrosspostError::InvalidInput(format!("submission {} has no primary file", submission.id))
    })?;

    let thumbnail = submission
        .thumbnail
        .as_ref()
        .filter(|_| part.use_thumbnail);

    let additional: Vec<&FileRecord> = submission
        .additional
        .iter()
        .filter(|record| !record.is_ignored_for(account_id))
        .map(|record| &record.record)
        .collect();

    debug!(
        submission = %submission.id,
        additional = additional.len(),
        thumbnail = thumbnail.is_some(),
        "assembling file payloads"
    );

    let (primary, thumbnail, additional) = tokio::try_join!(
        read_payload(primary),
        async {
            match thumbnail {
                Some(record) => read_payload(record).await.map(Some),
                None => Ok(None),
            }
        },
        try_join_all(additional.into_iter().map(read_payload)),
    )?;

    Ok(AssembledFiles {
        primary,
        thumbnail,
        additional,
    })
}

async fn read_payload(record: &FileRecord) -> Result<FilePayload> {
    let buffer = tokio::fs::read(&record.location).await.map_err(|e| {
        CrosspostError::File(std::io::Error::new(
            e.kind(),
            format!("{}: {}", record.location.display(), e),
        ))
    })?;

    Ok(FilePayload {
        buffer,
        content_type: record.content_type.clone(),
        filename: record.name.clone(),
    })
}
