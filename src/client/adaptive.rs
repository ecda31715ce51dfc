//! Adaptive Test Runner: `NotStarted → InProgress{index} → Completed`.
//!
//! The server judges answers and owns the run; the runner only submits the
//! answer for its current index and follows what the server reports.

use std::time::Duration;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::client::gateway::ApiClient;
use crate::config::ClientConfig;
use crate::protocol::{AnswerIn, AnswerOut, QuestionOut, RunOut, RunResultOut, RunStatus, StartRunIn};

/// Marker the UI shows once a run is terminal.
pub const COMPLETED_MARKER: &str = "Test Completado";

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub length: usize,
    /// Pause between consecutive automated submissions. Zero disables pacing.
    pub inter_question_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { length: 5, inter_question_delay: Duration::from_millis(1600) }
    }
}

impl From<&ClientConfig> for RunnerConfig {
    fn from(c: &ClientConfig) -> Self {
        Self { length: c.test_length, inter_question_delay: c.inter_question_delay() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub answered: usize,
    pub result: Option<RunResultOut>,
}

impl RunSummary {
    pub fn marker(&self) -> &'static str {
        COMPLETED_MARKER
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    InProgress { index: usize },
    Completed(RunSummary),
}

/// What one submission led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Next { index: usize, correct: bool },
    Completed(RunSummary),
}

pub struct TestRunner {
    api: ApiClient,
    config: RunnerConfig,
    state: RunState,
    run_id: Option<Uuid>,
    length: usize,
    question: Option<QuestionOut>,
}

impl TestRunner {
    pub fn new(api: ApiClient, config: RunnerConfig) -> Self {
        let length = config.length;
        Self { api, config, state: RunState::NotStarted, run_id: None, length, question: None }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Run length reported by the server for the current run.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn current_question(&self) -> Option<&QuestionOut> {
        match self.state {
            RunState::InProgress { .. } => self.question.as_ref(),
            _ => None,
        }
    }

    /// Begin a new run. This is the only way out of `Completed`.
    #[instrument(level = "info", skip(self), fields(length = self.config.length))]
    pub async fn start(&mut self) -> Result<&QuestionOut, ClientError> {
        let student = self.api.session().require_session_or_redirect()?;
        let body = StartRunIn { student_id: student.id.clone(), length: Some(self.config.length) };
        let run: RunOut = self.api.post_json("/api/adaptive-test/start", &body).await?;

        if run.length != self.config.length {
            warn!(target: "progress", requested = self.config.length, granted = run.length, "Server chose a different run length");
        }
        info!(target: "progress", run_id = %run.run_id, length = run.length, level = run.level, "Adaptive run started");
        self.run_id = Some(run.run_id);
        self.length = run.length;
        self.state = RunState::InProgress { index: run.index };
        Ok(self.question.insert(run.question))
    }

    /// Submit `option` for the current question. Nothing is sent unless a run is in progress.
    #[instrument(level = "info", skip(self))]
    pub async fn answer(&mut self, option: usize) -> Result<Step, ClientError> {
        let index = match &self.state {
            RunState::NotStarted => return Err(ClientError::RunNotStarted),
            RunState::Completed(_) => return Err(ClientError::RunCompleted),
            RunState::InProgress { index } => *index,
        };
        let run_id = self.run_id.ok_or(ClientError::RunNotStarted)?;
        let student = self.api.session().require_session_or_redirect()?;

        let body = AnswerIn { student_id: student.id, run_id, index, option };
        let out: AnswerOut = self.api.post_json("/api/adaptive-test/answer", &body).await?;
        Ok(self.apply(out))
    }

    fn apply(&mut self, out: AnswerOut) -> Step {
        if let RunState::Completed(summary) = &self.state {
            // Completion already seen; a second one changes nothing.
            return Step::Completed(summary.clone());
        }
        match out.status {
            RunStatus::InProgress => {
                self.state = RunState::InProgress { index: out.index };
                self.question = out.question;
                Step::Next { index: out.index, correct: out.correct }
            }
            RunStatus::Completed => {
                let summary = RunSummary { run_id: out.run_id, answered: out.index, result: out.result };
                info!(target: "progress", run_id = %summary.run_id, answered = summary.answered, duplicate = out.duplicate, "{}", COMPLETED_MARKER);
                self.state = RunState::Completed(summary.clone());
                self.question = None;
                Step::Completed(summary)
            }
        }
    }

    /// Answer every question with `pick(question, index)`, pacing submissions by the configured delay.
    pub async fn run_to_completion<F>(&mut self, mut pick: F) -> Result<RunSummary, ClientError>
    where
        F: FnMut(&QuestionOut, usize) -> usize,
    {
        if !matches!(self.state, RunState::InProgress { .. }) {
            self.start().await?;
        }
        let mut first = true;
        loop {
            let (question, index) = match (&self.state, &self.question) {
                (RunState::InProgress { index }, Some(q)) => (q.clone(), *index),
                (RunState::Completed(summary), _) => return Ok(summary.clone()),
                _ => return Err(ClientError::RunNotStarted),
            };
            if !first && !self.config.inter_question_delay.is_zero() {
                tokio::time::sleep(self.config.inter_question_delay).await;
            }
            first = false;
            if let Step::Completed(summary) = self.answer(pick(&question, index)).await? {
                return Ok(summary);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testkit::TestEnv;
    use std::time::Instant;

    fn fast(length: usize) -> RunnerConfig {
        RunnerConfig { length, inter_question_delay: Duration::ZERO }
    }

    #[tokio::test]
    async fn answers_advance_in_order_until_completed() {
        let env = TestEnv::start().await;
        env.register("qa").await;
        let mut runner = TestRunner::new(env.api.clone(), fast(5));
        assert_eq!(runner.state(), &RunState::NotStarted);

        runner.start().await.expect("start");
        for k in 0..4 {
            assert_eq!(runner.state(), &RunState::InProgress { index: k });
            let step = runner.answer(1).await.expect("answer");
            assert!(matches!(step, Step::Next { index, .. } if index == k + 1));
        }
        let step = runner.answer(1).await.expect("last answer");
        let Step::Completed(summary) = step else { panic!("expected completion") };
        assert_eq!(summary.answered, 5);
        assert_eq!(summary.marker(), "Test Completado");
        assert!(summary.result.as_ref().is_some_and(|r| r.awarded > 0));
        assert!(runner.current_question().is_none());
    }

    #[tokio::test]
    async fn completed_run_refuses_more_answers_without_request() {
        let env = TestEnv::start().await;
        let student = env.register("qa").await;
        let mut runner = TestRunner::new(env.api.clone(), fast(2));
        let summary = runner.run_to_completion(|_, _| 1).await.expect("run");

        let before = env.state.rewards(Some(&student.id)).await.expect("rewards").total;
        let err = runner.answer(0).await.unwrap_err();
        assert!(matches!(err, ClientError::RunCompleted));
        assert_eq!(runner.state(), &RunState::Completed(summary));
        let after = env.state.rewards(Some(&student.id)).await.expect("rewards").total;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn answer_before_start_is_rejected() {
        let env = TestEnv::start().await;
        env.register("qa").await;
        let mut runner = TestRunner::new(env.api.clone(), fast(5));
        assert!(matches!(runner.answer(0).await, Err(ClientError::RunNotStarted)));
    }

    #[tokio::test]
    async fn duplicate_completion_is_a_noop() {
        let env = TestEnv::start().await;
        let student = env.register("qa").await;
        let mut runner = TestRunner::new(env.api.clone(), fast(1));
        runner.start().await.expect("start");
        let run_id = runner.run_id.expect("run id");
        let Step::Completed(first) = runner.answer(1).await.expect("answer") else { panic!("expected completion") };

        // Same final answer again, straight through the gateway (as a second tab would).
        let body = AnswerIn { student_id: student.id.clone(), run_id, index: 0, option: 1 };
        let replay: AnswerOut = env.api.post_json("/api/adaptive-test/answer", &body).await.expect("replay");
        assert!(replay.duplicate);
        assert_eq!(runner.apply(replay), Step::Completed(first.clone()));
        assert_eq!(runner.state(), &RunState::Completed(first.clone()));

        let rewards = env.state.rewards(Some(&student.id)).await.expect("rewards");
        assert_eq!(rewards.summary["test"].count, 1);
    }

    #[tokio::test]
    async fn skipping_ahead_does_not_advance_the_run() {
        let env = TestEnv::start().await;
        let student = env.register("qa").await;
        let mut runner = TestRunner::new(env.api.clone(), fast(5));
        runner.start().await.expect("start");
        runner.answer(1).await.expect("answer 0");
        let run_id = runner.run_id.expect("run id");

        // Index 2 before index 1.
        let body = AnswerIn { student_id: student.id, run_id, index: 2, option: 1 };
        let err = env
            .api
            .post_json::<_, AnswerOut>("/api/adaptive-test/answer", &body)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));

        assert_eq!(runner.state(), &RunState::InProgress { index: 1 });
        let step = runner.answer(1).await.expect("answer 1");
        assert!(matches!(step, Step::Next { index: 2, .. }));
    }

    #[tokio::test]
    async fn new_run_after_completion_starts_fresh() {
        let env = TestEnv::start().await;
        env.register("qa").await;
        let mut runner = TestRunner::new(env.api.clone(), fast(2));
        let first = runner.run_to_completion(|_, _| 0).await.expect("first run");
        runner.start().await.expect("restart");
        assert_eq!(runner.state(), &RunState::InProgress { index: 0 });
        let second = runner.run_to_completion(|_, _| 0).await.expect("second run");
        assert_ne!(first.run_id, second.run_id);
    }

    #[tokio::test]
    async fn submissions_are_paced() {
        let env = TestEnv::start().await;
        env.register("qa").await;
        let delay = Duration::from_millis(30);
        let mut runner = TestRunner::new(env.api.clone(), RunnerConfig { length: 3, inter_question_delay: delay });
        let started = Instant::now();
        runner.run_to_completion(|_, _| 1).await.expect("run");
        assert!(started.elapsed() >= delay * 2, "two pauses between three answers");
    }

    #[tokio::test]
    async fn stale_session_mid_run_purges_session() {
        let env = TestEnv::start().await;
        env.register("qa").await;
        let mut runner = TestRunner::new(env.api.clone(), fast(3));
        runner.start().await.expect("start");

        env.state.students.write().await.clear();
        let err = runner.answer(1).await.unwrap_err();
        assert!(matches!(err, ClientError::SessionInvalidated));
        assert!(env.ctx().try_get().is_none());
        assert_eq!(env.nav.current(), Some(crate::client::navigation::Page::Login));
        assert_eq!(runner.state(), &RunState::InProgress { index: 0 });
    }
}
