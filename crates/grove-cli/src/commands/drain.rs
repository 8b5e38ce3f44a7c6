use std::path::Path;

use grove_core::platform::FsContentSink;
use grove_core::queue::{DrainOutcome, QueueConfig};
use serde::Serialize;

use crate::commands::common::open_queue;
use crate::error::CliError;

#[derive(Serialize)]
struct DrainSummary {
    uploaded: Vec<UploadedItem>,
    failed: Option<String>,
    dead_lettered: usize,
}

#[derive(Serialize)]
struct UploadedItem {
    entry: String,
    content_id: String,
}

pub async fn run_drain(
    store: &Path,
    max_attempts: Option<u32>,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let queue = open_queue(db_path, QueueConfig { max_attempts })?;
    let sink = FsContentSink::new(store)?;

    let outcome = queue.drain(&sink).await?;
    let DrainOutcome::Drained(report) = outcome else {
        println!("A drain is already running.");
        return Ok(());
    };

    let summary = DrainSummary {
        uploaded: report
            .uploaded
            .iter()
            .map(|(id, content_id)| UploadedItem {
                entry: id.to_string(),
                content_id: content_id.to_string(),
            })
            .collect(),
        failed: report.failed.map(|(id, error)| format!("{id}: {error}")),
        dead_lettered: report.dead_lettered.len(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for item in &summary.uploaded {
        println!("Uploaded {} -> {}", item.entry, item.content_id);
    }
    match &summary.failed {
        Some(failure) => println!("Stopped on failure: {failure}"),
        None => println!("Queue drained: {} uploaded.", summary.uploaded.len()),
    }
    if summary.dead_lettered > 0 {
        println!("Dead-lettered {} entries.", summary.dead_lettered);
    }
    Ok(())
}
