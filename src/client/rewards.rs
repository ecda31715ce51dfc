//! Rewards Aggregation: read-only views of the server's points ledger.
//! Totals are shown exactly as the server computes them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use tracing::{instrument, warn};

use crate::client::error::ClientError;
use crate::client::gateway::ApiClient;
use crate::domain::RewardEntry;
use crate::protocol::{KindSummary, ResultsOut, RewardsOut, StatsOut};

/// Heading the rewards page shows above the total.
pub const POINTS_LABEL: &str = "Puntos Totales";

#[derive(Clone, Debug)]
pub struct Totals {
    pub points: u64,
    pub items: Vec<RewardEntry>,
    pub summary: BTreeMap<String, KindSummary>,
}

impl Totals {
    pub fn label(&self) -> &'static str {
        POINTS_LABEL
    }
}

impl From<RewardsOut> for Totals {
    fn from(r: RewardsOut) -> Self {
        Self { points: r.total, items: r.items, summary: r.summary }
    }
}

pub struct RewardsView {
    api: ApiClient,
    /// Last total seen per student, only used to flag a shrinking ledger.
    last_seen: Mutex<HashMap<String, u64>>,
}

impl RewardsView {
    pub fn new(api: ApiClient) -> Self {
        Self { api, last_seen: Mutex::new(HashMap::new()) }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_totals(&self, student_id: &str) -> Result<Totals, ClientError> {
        let out: RewardsOut = self.api.get_json("/api/rewards", &[("student_id", student_id)]).await?;
        let previous = self
            .last_seen
            .lock()
            .ok()
            .and_then(|mut seen| seen.insert(student_id.to_string(), out.total))
            .unwrap_or(0);
        if out.total < previous {
            warn!(target: "progress", %student_id, previous, reported = out.total, "Server reported fewer points than before");
        }
        Ok(out.into())
    }

    /// Totals for the logged-in student.
    pub async fn current_totals(&self) -> Result<Totals, ClientError> {
        let student = self.api.session().require_session_or_redirect()?;
        self.get_totals(&student.id).await
    }

    pub async fn stats(&self, student_id: &str) -> Result<StatsOut, ClientError> {
        self.api.get_json(&format!("/api/student-stats/{}", student_id), &[]).await
    }

    pub async fn results(&self, student_id: &str) -> Result<ResultsOut, ClientError> {
        self.api.get_json("/api/results", &[("student_id", student_id)]).await
    }
}
