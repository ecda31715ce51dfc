//! Pure rules of the Progress Engine: points, adaptive levels, question choice,
//! analytics and password digests. No locks or I/O in here.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{Question, RewardEntry, TestResult};
use crate::protocol::{Analytics, Breakdown, KindSummary};
use crate::util::{parse_mm_ss, round1};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 3;
pub const DEFAULT_LEVEL: u8 = 2;

/// Videos of ten minutes or more are worth 20 points, the rest 10.
pub fn video_points(duration: &str) -> u32 {
  match parse_mm_ss(duration) {
    Some(secs) if secs >= 600 => 20,
    _ => 10,
  }
}

/// Points for a finished test: base + 8 per correct answer + speed bonus + 5 per final level.
pub fn test_breakdown(correct: u32, final_level: u8, duration_seconds: u64) -> Breakdown {
  let minutes = duration_seconds / 60;
  Breakdown {
    base: 10,
    accuracy: correct.saturating_mul(8),
    speed: 10u64.saturating_sub(minutes) as u32,
    level: u32::from(final_level).saturating_mul(5),
  }
}

/// Level suggested from the average score of the three most recent results.
pub fn suggested_level(results: &[&TestResult]) -> u8 {
  if results.is_empty() {
    return DEFAULT_LEVEL;
  }
  let mut recent: Vec<&TestResult> = results.to_vec();
  recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  recent.truncate(3);
  let avg = recent.iter().map(|r| r.correct as f64).sum::<f64>() / recent.len() as f64;
  if avg >= 4.0 {
    3
  } else if avg >= 2.5 {
    2
  } else {
    1
  }
}

/// One step up on a correct answer, one down on a wrong one.
pub fn next_level(level: u8, correct: bool) -> u8 {
  if correct {
    (level + 1).min(MAX_LEVEL)
  } else {
    level.saturating_sub(1).max(MIN_LEVEL)
  }
}

/// Random question at `level`, falling back to the closest level that has questions.
/// `exclude` avoids repeating the previous question when the level has alternatives.
pub fn pick_question(bank: &[Question], level: u8, exclude: Option<&str>) -> Option<Question> {
  let mut subset: Vec<&Question> = bank.iter().filter(|q| q.level == level).collect();
  if subset.is_empty() {
    let closest = bank
      .iter()
      .map(|q| q.level)
      .min_by_key(|l| (*l as i16 - level as i16).abs())?;
    subset = bank.iter().filter(|q| q.level == closest).collect();
  }
  if let Some(ex) = exclude {
    if subset.len() > 1 {
      subset.retain(|q| q.id != ex);
    }
  }
  subset.choose(&mut rand::thread_rng()).map(|q| (*q).clone())
}

/// Ledger total and per-kind summary. Totals are always recomputed from entries.
pub fn summarize_rewards<'a>(
  items: impl IntoIterator<Item = &'a RewardEntry>,
) -> (u64, BTreeMap<String, KindSummary>) {
  let mut total = 0u64;
  let mut summary: BTreeMap<String, KindSummary> = BTreeMap::new();
  for r in items {
    total += r.points as u64;
    let entry = summary.entry(r.kind.as_str().to_string()).or_default();
    entry.count += 1;
    entry.points += r.points as u64;
  }
  (total, summary)
}

pub fn analytics(results: &[&TestResult]) -> Analytics {
  if results.is_empty() {
    return Analytics { total_tests: 0, avg_score: 0.0, best_score: 0, avg_level: 0.0 };
  }
  let n = results.len() as f64;
  Analytics {
    total_tests: results.len(),
    avg_score: round1(results.iter().map(|r| r.correct as f64).sum::<f64>() / n),
    best_score: results.iter().map(|r| r.correct).max().unwrap_or(0),
    avg_level: round1(results.iter().map(|r| r.final_level as f64).sum::<f64>() / n),
  }
}

/// Salted SHA-256 digest, stored as `sha256$<salt>$<hex>`.
pub fn hash_password(password: &str) -> String {
  let salt = Uuid::new_v4().simple().to_string();
  format!("sha256${}${}", salt, digest(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
  let mut parts = stored.splitn(3, '$');
  match (parts.next(), parts.next(), parts.next()) {
    (Some("sha256"), Some(salt), Some(hex_digest)) => digest(salt, password) == hex_digest,
    _ => false,
  }
}

fn digest(salt: &str, password: &str) -> String {
  let mut h = Sha256::new();
  h.update(salt.as_bytes());
  h.update(b"$");
  h.update(password.as_bytes());
  hex::encode(h.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::RewardKind;
  use chrono::{Duration, Utc};

  fn result(correct: u32, minutes_ago: i64) -> TestResult {
    TestResult {
      student_id: "s".into(),
      correct,
      final_level: 2,
      duration_seconds: 60,
      created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
  }

  #[test]
  fn long_videos_are_worth_more() {
    assert_eq!(video_points("05:00"), 10);
    assert_eq!(video_points("10:00"), 20);
    assert_eq!(video_points("10:30"), 20);
    assert_eq!(video_points("garbage"), 10);
  }

  #[test]
  fn test_points_match_breakdown() {
    let b = test_breakdown(4, 3, 180);
    assert_eq!(b, Breakdown { base: 10, accuracy: 32, speed: 7, level: 15 });
    assert_eq!(b.total(), 64);
    // Speed bonus never goes negative.
    assert_eq!(test_breakdown(0, 1, 3600).speed, 0);
    let huge = test_breakdown(u32::MAX, u8::MAX, 0);
    assert_eq!(huge.accuracy, u32::MAX);
    assert_eq!(huge.total(), u32::MAX);
  }

  #[test]
  fn suggested_level_uses_three_most_recent() {
    assert_eq!(suggested_level(&[]), DEFAULT_LEVEL);
    let old_bad = result(0, 100);
    let r1 = result(5, 3);
    let r2 = result(4, 2);
    let r3 = result(4, 1);
    assert_eq!(suggested_level(&[&old_bad, &r1, &r2, &r3]), 3);
    let low = result(1, 0);
    assert_eq!(suggested_level(&[&low]), 1);
    let mid = result(3, 0);
    assert_eq!(suggested_level(&[&mid]), 2);
  }

  #[test]
  fn level_is_clamped() {
    assert_eq!(next_level(3, true), 3);
    assert_eq!(next_level(1, false), 1);
    assert_eq!(next_level(2, true), 3);
    assert_eq!(next_level(2, false), 1);
  }

  #[test]
  fn question_choice_falls_back_to_closest_level() {
    let bank = crate::server::seeds::seed_questions();
    let q = pick_question(&bank, 9, None).expect("fallback");
    assert_eq!(q.level, 3);
    let q = pick_question(&bank, 0, None).expect("fallback");
    assert_eq!(q.level, 1);
    assert!(pick_question(&[], 2, None).is_none());
  }

  #[test]
  fn question_choice_avoids_repeat_when_possible() {
    let bank = crate::server::seeds::seed_questions();
    for _ in 0..20 {
      let q = pick_question(&bank, 2, Some("q2_fraccion")).expect("question");
      assert_ne!(q.id, "q2_fraccion");
    }
  }

  #[test]
  fn rewards_summary_groups_by_kind() {
    let mk = |kind, points| RewardEntry {
      student_id: "s".into(),
      kind,
      video_id: None,
      points,
      reason: String::new(),
      created_at: Utc::now(),
    };
    let items = vec![mk(RewardKind::Video, 10), mk(RewardKind::Video, 20), mk(RewardKind::Test, 47)];
    let (total, summary) = summarize_rewards(&items);
    assert_eq!(total, 77);
    assert_eq!(summary["video"], KindSummary { count: 2, points: 30 });
    assert_eq!(summary["test"], KindSummary { count: 1, points: 47 });
  }

  #[test]
  fn analytics_round_to_one_decimal() {
    let a = result(2, 3);
    let b = result(3, 2);
    let c = result(4, 1);
    let out = analytics(&[&a, &b, &c]);
    assert_eq!(out.total_tests, 3);
    assert_eq!(out.best_score, 4);
    assert_eq!(out.avg_score, 3.0);
    assert_eq!(out.avg_level, 2.0);
    assert_eq!(analytics(&[]).total_tests, 0);
  }

  #[test]
  fn password_digest_round_trip() {
    let stored = hash_password("1234");
    assert!(stored.starts_with("sha256$"));
    assert!(verify_password(&stored, "1234"));
    assert!(!verify_password(&stored, "12345"));
    assert!(!verify_password("plain", "plain"));
    // Same password, different salt.
    assert_ne!(stored, hash_password("1234"));
  }
}
