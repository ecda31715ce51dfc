//! Domain models shared by the Progress Engine and the student client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of an authenticated student, as cached by the client.
/// Extra fields in server replies (points, counters, timestamps) are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub id: String,
  pub name: String,
  pub course: String,
  /// Legacy students created through `/api/students` have no username.
  #[serde(default)]
  pub username: Option<String>,
}

/// Server-side student row. Never serialized to clients as-is.
#[derive(Clone, Debug)]
pub struct StudentRecord {
  pub id: String,
  pub username: Option<String>,
  pub password_hash: Option<String>,
  pub name: String,
  pub course: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
  pub id: String,
  pub subject: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  /// "mm:ss"
  pub duration: String,
  pub url: String,
}

/// A bank question. `answer_index` never leaves the server during an adaptive run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub level: u8,
  pub text: String,
  pub options: Vec<String>,
  pub answer_index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
  Video,
  Test,
}

impl RewardKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      RewardKind::Video => "video",
      RewardKind::Test => "test",
    }
  }
}

/// One line of the rewards ledger. The ledger is append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
  pub student_id: String,
  #[serde(rename = "type")]
  pub kind: RewardKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub video_id: Option<String>,
  pub points: u32,
  pub reason: String,
  pub created_at: DateTime<Utc>,
}

/// A finished adaptive test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
  pub student_id: String,
  pub correct: u32,
  pub final_level: u8,
  pub duration_seconds: u64,
  pub created_at: DateTime<Utc>,
}
