use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, header::AUTHORIZATION},
};
use chrono::Utc;

use crate::{
    error::{Error, Result},
    info,
    schedule::{ReconcileMode, ScheduleLifecycle},
    server::AppState,
    success,
    types::{InvokeRequest, RunRecord, Track},
    warning,
};

/// Runs the requested module and answers with the final track list.
///
/// Authorization and payload are checked before anything else happens. A run record
/// is appended whether the pipeline succeeded or not, and a scheduled invocation is
/// reconciled with the timer facility even after a failed run so the schedule keeps
/// firing. When several steps fail the pipeline error wins over the log error, which
/// wins over the scheduling error.
pub async fn invoke(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<Vec<Track>>> {
    authorize(&headers, &state.invoke_secret)?;
    let Json(request) = payload.map_err(|e| Error::Validation(e.body_text()))?;
    validate(&request)?;

    let module = state.modules.load(&request.module_id).await?;
    let lifecycle = ScheduleLifecycle::new(state.timer.as_ref(), &state.schedules, &state.runs);

    let mut schedule = match &request.schedule_id {
        Some(schedule_id) => {
            let mut schedule = state.schedules.load(schedule_id).await?;
            if schedule.module_id != module.id {
                return Err(Error::Validation(format!(
                    "schedule {} does not belong to module {}",
                    schedule_id, module.id
                )));
            }
            if schedule.is_deleted() {
                lifecycle.retire(&mut schedule, Utc::now()).await?;
                return Err(Error::NotFound(format!(
                    "schedule {} has been removed",
                    schedule_id
                )));
            }
            Some(schedule)
        }
        None => None,
    };

    info!("Invoking module {}", module.id);
    let outcome = state.runner.run(&module).await;

    let record = RunRecord {
        module_id: module.id.clone(),
        timestamp: Utc::now(),
        was_scheduled: schedule.is_some(),
        failed: outcome.is_err(),
    };
    let appended = state.runs.append(&record).await;

    let reconciled = match schedule.as_mut() {
        Some(schedule) => lifecycle
            .reconcile(schedule, ReconcileMode::AfterRun, Utc::now())
            .await
            .map(Some),
        None => Ok(None),
    };

    let outcome = outcome?;
    appended?;
    if let Err(e) = &reconciled {
        warning!("Module {} ran but its schedule was not re-armed: {}", module.id, e);
    }
    reconciled?;

    success!(
        "Module {} wrote {} tracks to {}",
        module.id,
        outcome.tracks.len(),
        module.destination.playlist_id
    );
    Ok(Json(outcome.tracks))
}

fn authorize(headers: &HeaderMap, secret: &str) -> Result<()> {
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Auth("missing bearer token".to_string()))?;

    if provided != secret {
        return Err(Error::Auth("invalid bearer token".to_string()));
    }
    Ok(())
}

fn validate(request: &InvokeRequest) -> Result<()> {
    if request.module_id.trim().is_empty() {
        return Err(Error::Validation("moduleId must not be empty".to_string()));
    }
    if request
        .schedule_id
        .as_deref()
        .is_some_and(|id| id.trim().is_empty())
    {
        return Err(Error::Validation(
            "scheduleId must not be empty when present".to_string(),
        ));
    }
    Ok(())
}
