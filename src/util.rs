//! Small utility helpers used across modules.

use chrono::{DateTime, Utc};

/// Current instant, used for every `created_at` the server records.
pub fn now() -> DateTime<Utc> {
  Utc::now()
}

/// Case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Lowercase + spaces to underscores. Used to build stable legacy student ids.
pub fn slug(s: &str) -> String {
  s.trim().to_lowercase().replace(' ', "_")
}

/// Parse a "mm:ss" duration into seconds. Returns None on anything else.
pub fn parse_mm_ss(s: &str) -> Option<u32> {
  let (m, sec) = s.trim().split_once(':')?;
  let m: u32 = m.parse().ok()?;
  let sec: u32 = sec.parse().ok()?;
  Some(m * 60 + sec)
}

/// Round to one decimal, the precision analytics are reported with.
pub fn round1(v: f64) -> f64 {
  (v * 10.0).round() / 10.0
}

/// Log-safe truncation for large strings (response bodies in error logs).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
