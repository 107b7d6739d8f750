//! JSON file persistence for checkpoint and final snapshots.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colocate_core::ResolutionResult;
use colocate_resolver::{ResultSink, SinkError, CHECKPOINT_LABEL, FINAL_LABEL};

/// Writes `<label>.json` into a directory, atomically via a temp-file rename.
/// The final snapshot is also kept as a timestamped, never-overwritten copy,
/// and replaces any checkpoint left by the same run.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.json"))
    }

    /// Results of the previous run, for resuming.
    ///
    /// A checkpoint left on disk means the previous run never finished, so it
    /// is preferred over the final snapshot. No file means a fresh start. An
    /// unreadable or corrupt file is logged and skipped.
    pub async fn load_previous(&self) -> Vec<ResolutionResult> {
        for label in [CHECKPOINT_LABEL, FINAL_LABEL] {
            if let Some(results) = self.read_snapshot(label).await {
                return results;
            }
        }
        Vec::new()
    }

    async fn read_snapshot(&self, label: &str) -> Option<Vec<ResolutionResult>> {
        let path = self.path_for(label);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read previous results"
                );
                return None;
            }
        };
        match serde_json::from_slice::<Vec<ResolutionResult>>(&bytes) {
            Ok(results) => {
                tracing::info!(
                    path = %path.display(),
                    count = results.len(),
                    "loaded previous results"
                );
                Some(results)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring corrupt previous results"
                );
                None
            }
        }
    }

    /// Drop the intermediate snapshot once a final one supersedes it.
    async fn clear_checkpoint(&self) {
        let path = self.path_for(CHECKPOINT_LABEL);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "checkpoint cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "cannot remove stale checkpoint"
            ),
        }
    }

    async fn write_atomic(&self, path: &Path, body: &[u8]) -> Result<(), SinkError> {
        let io_err = |source: std::io::Error| SinkError::Io {
            path: path.display().to_string(),
            source,
        };
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn persist(&self, results: &[ResolutionResult], label: &str) -> Result<(), SinkError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SinkError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;

        let body = serde_json::to_vec_pretty(results).map_err(|e| SinkError::Serialize {
            label: label.to_string(),
            reason: e.to_string(),
        })?;

        self.write_atomic(&self.path_for(label), &body).await?;

        if label == FINAL_LABEL {
            let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
            let versioned = self.path_for(&format!("resolution_{stamp}"));
            self.write_atomic(&versioned, &body).await?;
            tracing::info!(path = %versioned.display(), "versioned results written");
            self.clear_checkpoint().await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn result(id: &str, failure: Option<&str>) -> ResolutionResult {
        ResolutionResult {
            run_id: Uuid::new_v4(),
            anchor_id: id.to_string(),
            raw_address: "100 Main St, Springfield, IL 62701".to_string(),
            formatted_address: None,
            resolved_city: "Springfield".to_string(),
            resolved_zip: "62701".to_string(),
            coordinate: None,
            review_count: 11_958,
            meets_review_threshold: true,
            has_category_match_nearby: false,
            matched_candidates: Vec::new(),
            qualifies: failure.is_none(),
            address_mismatch: false,
            search_skipped: false,
            attempts: 1,
            queries_run: vec!["Walmart Store #1 100 Main St".to_string()],
            failure_reason: failure.map(str::to_string),
            resolved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn checkpoint_is_written_as_camel_case_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("out"));

        sink.persist(&[result("1", None)], CHECKPOINT_LABEL)
            .await
            .unwrap();

        let text = std::fs::read_to_string(sink.path_for(CHECKPOINT_LABEL)).unwrap();
        assert!(text.contains("\"anchorId\": \"1\""));
        assert!(text.contains("\"hasCategoryMatchNearby\": false"));
        assert!(!dir.path().join("out/checkpoint.json.tmp").exists());
    }

    #[tokio::test]
    async fn final_snapshot_also_writes_versioned_copy() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());

        sink.persist(&[result("1", None)], FINAL_LABEL).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.contains(&"final.json".to_string()));
        assert!(names
            .iter()
            .any(|n| n.starts_with("resolution_") && n.ends_with(".json")));
    }

    #[tokio::test]
    async fn previous_final_round_trips_for_resume() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        let written = vec![result("1", None), result("2", Some("session invalidated"))];

        sink.persist(&written, FINAL_LABEL).await.unwrap();
        let loaded = sink.load_previous().await;

        assert_eq!(loaded, written);
    }

    #[tokio::test]
    async fn crashed_run_resumes_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        let done = vec![result("1", None), result("2", None)];

        sink.persist(&done, CHECKPOINT_LABEL).await.unwrap();

        assert!(!sink.path_for(FINAL_LABEL).exists());
        assert_eq!(sink.load_previous().await, done);
    }

    #[tokio::test]
    async fn checkpoint_wins_over_older_final() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        sink.persist(&[result("1", None)], FINAL_LABEL).await.unwrap();

        let progressed = vec![result("1", None), result("2", None)];
        sink.persist(&progressed, CHECKPOINT_LABEL).await.unwrap();

        assert_eq!(sink.load_previous().await, progressed);
    }

    #[tokio::test]
    async fn final_snapshot_clears_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        sink.persist(&[result("1", None)], CHECKPOINT_LABEL)
            .await
            .unwrap();

        let all = vec![result("1", None), result("2", None), result("3", None)];
        sink.persist(&all, FINAL_LABEL).await.unwrap();

        assert!(!sink.path_for(CHECKPOINT_LABEL).exists());
        assert_eq!(sink.load_previous().await, all);
    }

    #[tokio::test]
    async fn corrupt_checkpoint_falls_back_to_final() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        let finished = vec![result("1", None)];
        sink.persist(&finished, FINAL_LABEL).await.unwrap();
        std::fs::write(sink.path_for(CHECKPOINT_LABEL), b"[{").unwrap();

        assert_eq!(sink.load_previous().await, finished);
    }

    #[tokio::test]
    async fn missing_or_corrupt_previous_is_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        assert!(sink.load_previous().await.is_empty());

        std::fs::write(sink.path_for(FINAL_LABEL), b"{ not json").unwrap();
        assert!(sink.load_previous().await.is_empty());
    }
}
