//! Public protocol structs for the JSON/HTTP endpoints (serde ready).
//! Shared by the server handlers and the student client so both ends agree on shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Question, RewardEntry, RewardKind, TestResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkOut {
    pub ok: bool,
}

/// Body of every non-2xx reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
}

//
// Auth
//

/// Missing fields deserialize as empty strings and are rejected by validation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegisterIn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoginIn {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LegacyStudentIn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub course: String,
}

/// Student as returned by the server: identity plus derived counters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentOut {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub name: String,
    pub course: String,
    pub created_at: DateTime<Utc>,
    pub total_points: u64,
    pub level: u8,
    pub tests_completed: usize,
    pub videos_watched: usize,
}

//
// Videos
//

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VideosQuery {
    pub materia: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoOut {
    pub id: String,
    pub subject: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration: String,
    pub url: String,
    pub completed: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VideoCompleteIn {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub video_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoCompleteOut {
    pub ok: bool,
    pub awarded: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

//
// Questions and adaptive test runs
//

#[derive(Debug, Default, Deserialize)]
pub struct QuestionQuery {
    pub nivel: Option<u8>,
}

/// Question without its answer, as shown during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOut {
    pub id: String,
    pub level: u8,
    pub text: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionOut {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            level: q.level,
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartRunIn {
    #[serde(default)]
    pub student_id: String,
    /// Requested run length; the server default applies when absent.
    #[serde(default)]
    pub length: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunOut {
    pub run_id: Uuid,
    pub length: usize,
    pub index: usize,
    pub level: u8,
    pub status: RunStatus,
    pub question: QuestionOut,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerIn {
    pub student_id: String,
    pub run_id: Uuid,
    pub index: usize,
    pub option: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub base: u32,
    pub accuracy: u32,
    pub speed: u32,
    pub level: u32,
}

impl Breakdown {
    pub fn total(&self) -> u32 {
        self.base
            .saturating_add(self.accuracy)
            .saturating_add(self.speed)
            .saturating_add(self.level)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResultOut {
    pub correct: u32,
    pub final_level: u8,
    pub duration_seconds: u64,
    pub awarded: u32,
    pub breakdown: Breakdown,
}

/// Reply to one answer. `index` is the next index to answer (== length once completed).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerOut {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub index: usize,
    pub correct: bool,
    pub level: u8,
    #[serde(default)]
    pub question: Option<QuestionOut>,
    #[serde(default)]
    pub result: Option<RunResultOut>,
    /// True when this repeats the final answer of an already completed run.
    #[serde(default)]
    pub duplicate: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestResultIn {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub correct: u32,
    #[serde(default = "default_level")]
    pub final_level: u8,
    #[serde(default)]
    pub duration_seconds: u64,
}

fn default_level() -> u8 {
    2
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResultOut {
    pub ok: bool,
    pub awarded: u32,
    pub breakdown: Breakdown,
}

//
// Rewards, results, stats
//

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StudentQuery {
    pub student_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSummary {
    pub count: usize,
    pub points: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardsOut {
    pub total: u64,
    pub items: Vec<RewardEntry>,
    /// Keyed by reward kind ("video", "test").
    pub summary: BTreeMap<String, KindSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_tests: usize,
    pub avg_score: f64,
    pub best_score: u32,
    pub avg_level: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultsOut {
    pub results: Vec<TestResult>,
    pub analytics: Analytics,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stats {
    pub total_points: u64,
    pub tests_completed: usize,
    pub videos_watched: usize,
    pub suggested_level: u8,
    pub avg_score: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: RewardKind,
    pub description: String,
    pub date: DateTime<Utc>,
    pub points: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsOut {
    pub student: StudentOut,
    pub stats: Stats,
    pub recent_activity: Vec<Activity>,
}
