//! HTTP endpoint handlers. These are thin wrappers that forward to `AppState`.
//! Each handler is instrumented; failures come back as `ApiError` replies.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::server::error::ApiError;
use crate::server::logic::DEFAULT_LEVEL;
use crate::server::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

// --- Auth ---

#[instrument(level = "info", skip(state, body), fields(username = %body.username))]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RegisterIn>,
) -> Result<(StatusCode, Json<StudentOut>), ApiError> {
  let student = state.register(body).await?;
  Ok((StatusCode::CREATED, Json(student)))
}

#[instrument(level = "info", skip(state, body), fields(username = %body.username))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> Result<Json<StudentOut>, ApiError> {
  Ok(Json(state.login(body).await?))
}

/// Stateless: the client drops its own session; we only acknowledge.
#[instrument(level = "info")]
pub async fn http_logout() -> impl IntoResponse {
  Json(OkOut { ok: true })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_create_student(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LegacyStudentIn>,
) -> Result<Json<StudentOut>, ApiError> {
  Ok(Json(state.create_or_get_legacy(body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_student_stats(
  State(state): State<Arc<AppState>>,
  Path(student_id): Path<String>,
) -> Result<Json<StatsOut>, ApiError> {
  Ok(Json(state.stats(&student_id).await?))
}

// --- Videos ---

#[instrument(level = "info", skip(state))]
pub async fn http_subjects(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.subjects().await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_videos(
  State(state): State<Arc<AppState>>,
  Query(q): Query<VideosQuery>,
) -> impl IntoResponse {
  let videos = state.videos(q.materia.as_deref(), q.student_id.as_deref()).await;
  info!(target: "edusmart", count = videos.len(), "HTTP videos served");
  Json(videos)
}

#[instrument(level = "info", skip(state, body), fields(student_id = %body.student_id, video_id = %body.video_id))]
pub async fn http_video_complete(
  State(state): State<Arc<AppState>>,
  Json(body): Json<VideoCompleteIn>,
) -> Result<Json<VideoCompleteOut>, ApiError> {
  Ok(Json(state.complete_video(body).await?))
}

// --- Questions & adaptive test ---

#[instrument(level = "info", skip(state))]
pub async fn http_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> Result<Json<crate::domain::Question>, ApiError> {
  Ok(Json(state.random_question(q.nivel.unwrap_or(DEFAULT_LEVEL)).await?))
}

#[instrument(level = "info", skip(state, body), fields(student_id = %body.student_id))]
pub async fn http_run_start(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartRunIn>,
) -> Result<Json<RunOut>, ApiError> {
  Ok(Json(state.start_run(body).await?))
}

#[instrument(level = "info", skip(state, body), fields(run_id = %body.run_id, index = body.index))]
pub async fn http_run_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let out = state.answer(body).await?;
  info!(target: "progress", run_id = %out.run_id, status = ?out.status, next = out.index, "HTTP answer accepted");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(student_id = %body.student_id))]
pub async fn http_test_result(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TestResultIn>,
) -> Result<Json<TestResultOut>, ApiError> {
  Ok(Json(state.submit_test_result(body).await?))
}

// --- Rewards & results ---

#[instrument(level = "info", skip(state))]
pub async fn http_rewards(
  State(state): State<Arc<AppState>>,
  Query(q): Query<StudentQuery>,
) -> Result<Json<RewardsOut>, ApiError> {
  Ok(Json(state.rewards(q.student_id.as_deref()).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_results(
  State(state): State<Arc<AppState>>,
  Query(q): Query<StudentQuery>,
) -> impl IntoResponse {
  Json(state.results(q.student_id.as_deref()).await)
}

// --- Development ---

#[instrument(level = "warn", skip(state))]
pub async fn http_dev_reset(State(state): State<Arc<AppState>>) -> Result<Json<OkOut>, ApiError> {
  if !state.config.enable_dev_reset {
    return Err(ApiError::NotFound("not found".into()));
  }
  state.reset().await;
  Ok(Json(OkOut { ok: true }))
}
