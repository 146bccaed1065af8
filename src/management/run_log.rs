use std::{io::ErrorKind, path::PathBuf};

use futures::AsyncWriteExt;

use crate::{
    error::{Error, Result},
    types::RunRecord,
};

/// Append-only log of invocations, one JSON record per line.
///
/// Records are never rewritten, so appends need no locking.
#[derive(Debug, Clone)]
pub struct RunLog {
    root: PathBuf,
}

impl RunLog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn append(&self, record: &RunRecord) -> Result<()> {
        let path = self.log_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = async_fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn records(&self) -> Result<Vec<RunRecord>> {
        let content = match async_fs::read_to_string(self.log_path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| Error::Store(format!("corrupt run record: {}", e)))
            })
            .collect()
    }

    /// Scheduled runs of `module_id` that did not fail.
    pub async fn count_completed(&self, module_id: &str) -> Result<u32> {
        let count = self
            .records()
            .await?
            .iter()
            .filter(|r| r.module_id == module_id && r.was_scheduled && !r.failed)
            .count();
        Ok(count as u32)
    }

    fn log_path(&self) -> PathBuf {
        let mut path = self.root.clone();
        path.push("runs/records.jsonl");
        path
    }
}
