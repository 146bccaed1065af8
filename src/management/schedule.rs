use std::path::PathBuf;

use crate::{
    error::{Error, Result},
    management::{checked_id, read_json, write_json},
    types::Schedule,
};

/// Persisted schedules. Rows are soft-deleted through `deleted_at`, never removed.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    root: PathBuf,
}

impl ScheduleStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn load(&self, schedule_id: &str) -> Result<Schedule> {
        let schedule: Schedule = read_json(&self.schedule_path(schedule_id)?)
            .await?
            .ok_or_else(|| Error::NotFound(format!("schedule {}", schedule_id)))?;
        if let Some(rule) = &schedule.repetition_rule {
            rule.validate()?;
        }
        Ok(schedule)
    }

    pub async fn persist(&self, schedule: &Schedule) -> Result<()> {
        write_json(&self.schedule_path(&schedule.id)?, schedule).await
    }

    fn schedule_path(&self, schedule_id: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        path.push(format!("schedules/{}.json", checked_id(schedule_id)?));
        Ok(path)
    }
}
