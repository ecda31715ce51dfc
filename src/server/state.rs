//! Application state of the Progress Engine: in-memory stores and every mutation.
//!
//! This module owns:
//!   - students (by id), the video catalogue and the question bank
//!   - the append-only rewards ledger and test results
//!   - adaptive test runs (by run id)
//!
//! Points are never stored on a student; every total is recomputed from the ledger.
//! Lock order when more than one store is needed: students, videos, questions,
//! runs, rewards, results.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::domain::{Question, RewardEntry, RewardKind, StudentRecord, TestResult, Video};
use crate::protocol::*;
use crate::server::error::ApiError;
use crate::server::logic;
use crate::server::seeds::{seed_questions, seed_videos};
use crate::util::{now, slug};

/// Upper bound for a client-requested run length.
pub const MAX_RUN_LENGTH: usize = 20;

/// One adaptive test attempt.
#[derive(Clone, Debug)]
pub struct TestRun {
    pub id: Uuid,
    pub student_id: String,
    pub length: usize,
    pub next_index: usize,
    pub level: u8,
    pub correct: u32,
    pub last_correct: bool,
    pub question: Question,
    pub started_at: DateTime<Utc>,
    pub result: Option<RunResultOut>,
}

pub struct AppState {
    pub students: RwLock<HashMap<String, StudentRecord>>,
    pub videos: RwLock<Vec<Video>>,
    pub questions: RwLock<Vec<Question>>,
    pub runs: RwLock<HashMap<Uuid, TestRun>>,
    pub rewards: RwLock<Vec<RewardEntry>>,
    pub results: RwLock<Vec<TestResult>>,
    pub config: ServerConfig,
}

impl AppState {
    /// Build state with the built-in video catalogue and question bank.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_content(config, seed_videos(), seed_questions())
    }

    pub fn with_content(config: ServerConfig, videos: Vec<Video>, questions: Vec<Question>) -> Self {
        info!(
            target: "edusmart",
            videos = videos.len(),
            questions = questions.len(),
            test_length = config.test_length,
            dev_reset = config.enable_dev_reset,
            "Progress engine state ready"
        );
        Self {
            students: RwLock::new(HashMap::new()),
            videos: RwLock::new(videos),
            questions: RwLock::new(questions),
            runs: RwLock::new(HashMap::new()),
            rewards: RwLock::new(Vec::new()),
            results: RwLock::new(Vec::new()),
            config,
        }
    }

    //
    // Students & auth
    //

    #[instrument(level = "info", skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterIn) -> Result<StudentOut, ApiError> {
        let username = input.username.trim().to_lowercase();
        let password = input.password.trim();
        let name = input.name.trim();
        let course = input.course.trim();
        if username.is_empty() || password.is_empty() || name.is_empty() || course.is_empty() {
            return Err(ApiError::BadRequest("username, password, name y course son requeridos".into()));
        }

        let record = {
            let mut students = self.students.write().await;
            let taken = students
                .values()
                .any(|s| s.username.as_deref().map(str::to_lowercase).as_deref() == Some(username.as_str()));
            if taken {
                return Err(ApiError::Conflict("username ya existe".into()));
            }
            let record = StudentRecord {
                id: format!("user_{}", username),
                username: Some(username.clone()),
                password_hash: Some(logic::hash_password(password)),
                name: name.to_string(),
                course: course.to_string(),
                created_at: now(),
            };
            students.insert(record.id.clone(), record.clone());
            record
        };

        info!(target: "progress", student_id = %record.id, "Student registered");
        Ok(self.student_out(&record).await)
    }

    #[instrument(level = "info", skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginIn) -> Result<StudentOut, ApiError> {
        let username = input.username.trim().to_lowercase();
        let password = input.password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::BadRequest("username y password son requeridos".into()));
        }

        let record = {
            let students = self.students.read().await;
            students
                .values()
                .find(|s| s.username.as_deref().map(str::to_lowercase).as_deref() == Some(username.as_str()))
                .cloned()
        };
        let record = match record {
            Some(r) if r.password_hash.as_deref().is_some_and(|h| logic::verify_password(h, password)) => r,
            _ => {
                warn!(target: "progress", %username, "Login rejected");
                return Err(ApiError::Unauthorized("credenciales inválidas".into()));
            }
        };

        info!(target: "progress", student_id = %record.id, "Student logged in");
        Ok(self.student_out(&record).await)
    }

    /// Create-or-get by name + course. Kept for clients that predate usernames.
    #[instrument(level = "info", skip(self, input))]
    pub async fn create_or_get_legacy(&self, input: LegacyStudentIn) -> Result<StudentOut, ApiError> {
        let name = input.name.trim();
        let course = input.course.trim();
        if name.is_empty() || course.is_empty() {
            return Err(ApiError::BadRequest("name and course are required".into()));
        }
        let id = format!("{}__{}", slug(name), slug(course));
        let record = {
            let mut students = self.students.write().await;
            students
                .entry(id.clone())
                .or_insert_with(|| StudentRecord {
                    id,
                    username: None,
                    password_hash: None,
                    name: name.to_string(),
                    course: course.to_string(),
                    created_at: now(),
                })
                .clone()
        };
        Ok(self.student_out(&record).await)
    }

    async fn require_student(&self, id: &str) -> Result<StudentRecord, ApiError> {
        self.students
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(ApiError::student_not_found)
    }

    async fn student_out(&self, record: &StudentRecord) -> StudentOut {
        let (total_points, videos_watched) = {
            let rewards = self.rewards.read().await;
            let mine: Vec<&RewardEntry> = rewards.iter().filter(|r| r.student_id == record.id).collect();
            let (total, _) = logic::summarize_rewards(mine.iter().copied());
            (total, mine.iter().filter(|r| r.kind == RewardKind::Video).count())
        };
        let (level, tests_completed) = {
            let results = self.results.read().await;
            let mine: Vec<&TestResult> = results.iter().filter(|r| r.student_id == record.id).collect();
            (logic::suggested_level(&mine), mine.len())
        };
        StudentOut {
            id: record.id.clone(),
            username: record.username.clone(),
            name: record.name.clone(),
            course: record.course.clone(),
            created_at: record.created_at,
            total_points,
            level,
            tests_completed,
            videos_watched,
        }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn stats(&self, student_id: &str) -> Result<StatsOut, ApiError> {
        let record = self.require_student(student_id).await?;
        let student = self.student_out(&record).await;

        let (tests_completed, avg_score) = {
            let results = self.results.read().await;
            let mine: Vec<&TestResult> = results.iter().filter(|r| r.student_id == student_id).collect();
            let a = logic::analytics(&mine);
            (a.total_tests, a.avg_score)
        };

        let mut recent_activity: Vec<Activity> = {
            let rewards = self.rewards.read().await;
            rewards
                .iter()
                .filter(|r| r.student_id == student_id)
                .map(|r| Activity {
                    kind: r.kind,
                    description: r.reason.clone(),
                    date: r.created_at,
                    points: r.points,
                })
                .collect()
        };
        recent_activity.sort_by(|a, b| b.date.cmp(&a.date));
        recent_activity.truncate(5);

        Ok(StatsOut {
            stats: Stats {
                total_points: student.total_points,
                tests_completed,
                videos_watched: student.videos_watched,
                suggested_level: student.level,
                avg_score,
            },
            student,
            recent_activity,
        })
    }

    //
    // Videos
    //

    pub async fn subjects(&self) -> Vec<String> {
        let videos = self.videos.read().await;
        let mut out: Vec<String> = videos
            .iter()
            .map(|v| v.subject.clone())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        out.sort();
        out
    }

    /// Videos, optionally filtered by subject. `completed` is only ever true for a given student.
    #[instrument(level = "debug", skip(self))]
    pub async fn videos(&self, subject: Option<&str>, student_id: Option<&str>) -> Vec<VideoOut> {
        let completed: HashSet<String> = match student_id {
            Some(sid) => self
                .rewards
                .read()
                .await
                .iter()
                .filter(|r| r.student_id == sid && r.kind == RewardKind::Video)
                .filter_map(|r| r.video_id.clone())
                .collect(),
            None => HashSet::new(),
        };
        let videos = self.videos.read().await;
        videos
            .iter()
            .filter(|v| subject.map_or(true, |s| v.subject == s))
            .map(|v| VideoOut {
                id: v.id.clone(),
                subject: v.subject.clone(),
                title: v.title.clone(),
                description: v.description.clone(),
                duration: v.duration.clone(),
                url: v.url.clone(),
                completed: completed.contains(&v.id),
            })
            .collect()
    }

    /// Award points for the first completion of a video; repeats award nothing.
    #[instrument(level = "info", skip(self, input), fields(student_id = %input.student_id, video_id = %input.video_id))]
    pub async fn complete_video(&self, input: VideoCompleteIn) -> Result<VideoCompleteOut, ApiError> {
        if input.student_id.is_empty() || input.video_id.is_empty() {
            return Err(ApiError::BadRequest("student_id y video_id son requeridos".into()));
        }
        let student = self.students.read().await.get(&input.student_id).cloned();
        let video = self.videos.read().await.iter().find(|v| v.id == input.video_id).cloned();
        let (Some(_student), Some(video)) = (student, video) else {
            return Err(ApiError::NotFound("Student or video not found".into()));
        };

        // Check and insert under one write lock so concurrent repeats cannot both award.
        let mut rewards = self.rewards.write().await;
        let already = rewards.iter().any(|r| {
            r.student_id == input.student_id
                && r.kind == RewardKind::Video
                && r.video_id.as_deref() == Some(input.video_id.as_str())
        });
        if already {
            info!(target: "progress", student_id = %input.student_id, video_id = %input.video_id, "Video already completed");
            return Ok(VideoCompleteOut {
                ok: true,
                awarded: 0,
                message: Some("Video ya completado".into()),
            });
        }

        let points = logic::video_points(&video.duration);
        rewards.push(RewardEntry {
            student_id: input.student_id.clone(),
            kind: RewardKind::Video,
            video_id: Some(video.id.clone()),
            points,
            reason: format!("Video completado: {}", video.title),
            created_at: now(),
        });
        info!(target: "progress", student_id = %input.student_id, video_id = %video.id, points, "Video completed");
        Ok(VideoCompleteOut { ok: true, awarded: points, message: None })
    }

    //
    // Questions & adaptive runs
    //

    pub async fn random_question(&self, level: u8) -> Result<Question, ApiError> {
        let bank = self.questions.read().await;
        logic::pick_question(&bank, level, None).ok_or_else(|| ApiError::NotFound("no questions found".into()))
    }

    #[instrument(level = "info", skip(self, input), fields(student_id = %input.student_id, length = ?input.length))]
    pub async fn start_run(&self, input: StartRunIn) -> Result<RunOut, ApiError> {
        if input.student_id.is_empty() {
            return Err(ApiError::BadRequest("student_id required".into()));
        }
        self.require_student(&input.student_id).await?;

        let length = match input.length {
            None => self.config.test_length,
            Some(n) if (1..=MAX_RUN_LENGTH).contains(&n) => n,
            Some(n) => {
                return Err(ApiError::BadRequest(format!("length must be between 1 and {MAX_RUN_LENGTH}, got {n}")));
            }
        };

        let level = {
            let results = self.results.read().await;
            let mine: Vec<&TestResult> = results.iter().filter(|r| r.student_id == input.student_id).collect();
            logic::suggested_level(&mine)
        };
        let question = {
            let bank = self.questions.read().await;
            logic::pick_question(&bank, level, None).ok_or_else(|| ApiError::NotFound("no questions found".into()))?
        };

        let run = TestRun {
            id: Uuid::new_v4(),
            student_id: input.student_id.clone(),
            length,
            next_index: 0,
            level,
            correct: 0,
            last_correct: false,
            question,
            started_at: now(),
            result: None,
        };
        let out = RunOut {
            run_id: run.id,
            length,
            index: 0,
            level,
            status: RunStatus::InProgress,
            question: QuestionOut::from(&run.question),
        };
        self.runs.write().await.insert(run.id, run);
        info!(target: "progress", run_id = %out.run_id, student_id = %input.student_id, length, level, "Adaptive run started");
        Ok(out)
    }

    /// Accept the answer for the run's next index. Anything else is a conflict,
    /// except repeating the final answer of a completed run, which replays the result.
    #[instrument(level = "info", skip(self, input), fields(run_id = %input.run_id, index = input.index))]
    pub async fn answer(&self, input: AnswerIn) -> Result<AnswerOut, ApiError> {
        self.require_student(&input.student_id).await?;
        let bank = self.questions.read().await.clone();

        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(&input.run_id)
            .filter(|r| r.student_id == input.student_id)
            .ok_or_else(|| ApiError::NotFound("run not found".into()))?;

        if let Some(result) = &run.result {
            if input.index + 1 == run.length {
                info!(target: "progress", run_id = %run.id, "Duplicate final answer ignored");
                return Ok(AnswerOut {
                    run_id: run.id,
                    status: RunStatus::Completed,
                    index: run.length,
                    correct: run.last_correct,
                    level: run.level,
                    question: None,
                    result: Some(result.clone()),
                    duplicate: true,
                });
            }
            return Err(ApiError::Conflict("run already completed".into()));
        }
        if input.index != run.next_index {
            warn!(target: "progress", run_id = %run.id, expected = run.next_index, got = input.index, "Out-of-order answer");
            return Err(ApiError::Conflict(format!(
                "out-of-order answer: expected index {}, got {}",
                run.next_index, input.index
            )));
        }
        if input.option >= run.question.options.len() {
            return Err(ApiError::BadRequest(format!("option {} out of range", input.option)));
        }

        let correct = input.option == run.question.answer_index;
        if correct {
            run.correct += 1;
        }
        run.last_correct = correct;
        run.level = logic::next_level(run.level, correct);
        run.next_index += 1;

        if run.next_index < run.length {
            let next = logic::pick_question(&bank, run.level, Some(&run.question.id))
                .ok_or_else(|| ApiError::NotFound("no questions found".into()))?;
            run.question = next;
            return Ok(AnswerOut {
                run_id: run.id,
                status: RunStatus::InProgress,
                index: run.next_index,
                correct,
                level: run.level,
                question: Some(QuestionOut::from(&run.question)),
                result: None,
                duplicate: false,
            });
        }

        let duration_seconds = (now() - run.started_at).num_seconds().max(0) as u64;
        let breakdown = logic::test_breakdown(run.correct, run.level, duration_seconds);
        let result = RunResultOut {
            correct: run.correct,
            final_level: run.level,
            duration_seconds,
            awarded: breakdown.total(),
            breakdown,
        };
        run.result = Some(result.clone());
        let out = AnswerOut {
            run_id: run.id,
            status: RunStatus::Completed,
            index: run.length,
            correct,
            level: run.level,
            question: None,
            result: Some(result.clone()),
            duplicate: false,
        };
        let student_id = run.student_id.clone();
        let length = run.length;

        // Still holding `runs`, so a concurrent duplicate cannot record twice.
        self.record_result(&student_id, result.correct, length, result.final_level, duration_seconds, breakdown)
            .await;
        drop(runs);

        info!(target: "progress", run_id = %out.run_id, %student_id, correct = result.correct, awarded = result.awarded, "Adaptive run completed");
        Ok(out)
    }

    /// Record a finished test reported directly by a client.
    #[instrument(level = "info", skip(self, input), fields(student_id = %input.student_id))]
    pub async fn submit_test_result(&self, input: TestResultIn) -> Result<TestResultOut, ApiError> {
        if input.student_id.is_empty() {
            return Err(ApiError::BadRequest("student_id required".into()));
        }
        let length = self.config.test_length;
        if input.correct as usize > length {
            return Err(ApiError::BadRequest(format!("correct must be at most {length}, got {}", input.correct)));
        }
        if !(logic::MIN_LEVEL..=logic::MAX_LEVEL).contains(&input.final_level) {
            return Err(ApiError::BadRequest(format!(
                "final_level must be between {} and {}, got {}",
                logic::MIN_LEVEL,
                logic::MAX_LEVEL,
                input.final_level
            )));
        }
        let breakdown = logic::test_breakdown(input.correct, input.final_level, input.duration_seconds);
        self.record_result(
            &input.student_id,
            input.correct,
            length,
            input.final_level,
            input.duration_seconds,
            breakdown,
        )
        .await;
        Ok(TestResultOut { ok: true, awarded: breakdown.total(), breakdown })
    }

    async fn record_result(
        &self,
        student_id: &str,
        correct: u32,
        length: usize,
        final_level: u8,
        duration_seconds: u64,
        breakdown: crate::protocol::Breakdown,
    ) {
        let created_at = now();
        self.rewards.write().await.push(RewardEntry {
            student_id: student_id.to_string(),
            kind: RewardKind::Test,
            video_id: None,
            points: breakdown.total(),
            reason: format!(
                "Test completado ({}/{}) nivel final {} en {}m {}s",
                correct,
                length,
                final_level,
                duration_seconds / 60,
                duration_seconds % 60
            ),
            created_at,
        });
        self.results.write().await.push(TestResult {
            student_id: student_id.to_string(),
            correct,
            final_level,
            duration_seconds,
            created_at,
        });
    }

    //
    // Rewards & results
    //

    /// Ledger for one student (404 when unknown) or for everyone. Newest first.
    #[instrument(level = "debug", skip(self))]
    pub async fn rewards(&self, student_id: Option<&str>) -> Result<RewardsOut, ApiError> {
        if let Some(sid) = student_id {
            self.require_student(sid).await?;
        }
        let mut items: Vec<RewardEntry> = self
            .rewards
            .read()
            .await
            .iter()
            .filter(|r| student_id.map_or(true, |sid| r.student_id == sid))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let (total, summary) = logic::summarize_rewards(&items);
        Ok(RewardsOut { total, items, summary })
    }

    pub async fn results(&self, student_id: Option<&str>) -> ResultsOut {
        let mut results: Vec<TestResult> = self
            .results
            .read()
            .await
            .iter()
            .filter(|r| student_id.map_or(true, |sid| r.student_id == sid))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let refs: Vec<&TestResult> = results.iter().collect();
        let analytics = logic::analytics(&refs);
        ResultsOut { results, analytics }
    }

    /// Wipe every student, run, reward and result; restore the built-in content.
    #[instrument(level = "warn", skip(self))]
    pub async fn reset(&self) {
        let mut students = self.students.write().await;
        let mut videos = self.videos.write().await;
        let mut questions = self.questions.write().await;
        let mut runs = self.runs.write().await;
        let mut rewards = self.rewards.write().await;
        let mut results = self.results.write().await;
        students.clear();
        *videos = seed_videos();
        *questions = seed_questions();
        runs.clear();
        rewards.clear();
        results.clear();
        warn!(target: "edusmart", "Development reset: all student data removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(ServerConfig::default())
    }

    fn reg(username: &str) -> RegisterIn {
        RegisterIn {
            name: "Ana García".into(),
            course: "1ro".into(),
            username: username.into(),
            password: "1234".into(),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicates_case_insensitively() {
        let st = state();
        let s = st.register(reg("Ana")).await.expect("register");
        assert_eq!(s.id, "user_ana");
        assert_eq!(s.total_points, 0);
        assert_eq!(s.level, logic::DEFAULT_LEVEL);
        let err = st.register(reg("ANA")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_requires_every_field() {
        let st = state();
        let mut input = reg("ana");
        input.course = "  ".into();
        assert!(matches!(st.register(input).await, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let st = state();
        st.register(reg("ana")).await.expect("register");
        let ok = st
            .login(LoginIn { username: " ANA ".into(), password: "1234".into() })
            .await
            .expect("login");
        assert_eq!(ok.id, "user_ana");
        let bad = st.login(LoginIn { username: "ana".into(), password: "nope".into() }).await;
        assert!(matches!(bad, Err(ApiError::Unauthorized(_))));
        let unknown = st.login(LoginIn { username: "zoe".into(), password: "1234".into() }).await;
        assert!(matches!(unknown, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn legacy_students_are_create_or_get() {
        let st = state();
        let input = LegacyStudentIn { name: "Ana García".into(), course: "1ro".into() };
        let a = st.create_or_get_legacy(input.clone()).await.expect("create");
        let b = st.create_or_get_legacy(input).await.expect("get");
        assert_eq!(a.id, "ana_garcía__1ro");
        assert_eq!(a.id, b.id);
        assert!(a.username.is_none());
    }

    #[tokio::test]
    async fn video_completion_awards_once() {
        let st = state();
        let s = st.register(reg("ana")).await.expect("register");
        let input = VideoCompleteIn { student_id: s.id.clone(), video_id: "mat_ecuaciones".into() };
        let first = st.complete_video(input.clone()).await.expect("first");
        assert_eq!(first.awarded, 20);
        let second = st.complete_video(input).await.expect("second");
        assert_eq!(second.awarded, 0);
        assert!(second.ok);

        let totals = st.rewards(Some(&s.id)).await.expect("rewards");
        assert_eq!(totals.total, 20);
        assert_eq!(totals.items.len(), 1);

        let listed = st.videos(Some("Matemáticas"), Some(&s.id)).await;
        assert!(listed.iter().any(|v| v.id == "mat_ecuaciones" && v.completed));
        let anonymous = st.videos(Some("Matemáticas"), None).await;
        assert!(anonymous.iter().all(|v| !v.completed));
    }

    #[tokio::test]
    async fn video_completion_needs_known_student_and_video() {
        let st = state();
        let err = st
            .complete_video(VideoCompleteIn { student_id: "ghost".into(), video_id: "cie_agua".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Student or video not found"));
    }

    #[tokio::test]
    async fn run_enforces_order_and_completes_once() {
        let st = state();
        let s = st.register(reg("ana")).await.expect("register");
        let run = st
            .start_run(StartRunIn { student_id: s.id.clone(), length: Some(3) })
            .await
            .expect("start");
        assert_eq!(run.length, 3);
        assert_eq!(run.index, 0);

        let answer = |index| AnswerIn { student_id: s.id.clone(), run_id: run.run_id, index, option: 1 };

        let skip = st.answer(answer(1)).await.unwrap_err();
        assert!(matches!(skip, ApiError::Conflict(_)));

        let a0 = st.answer(answer(0)).await.expect("a0");
        assert_eq!(a0.status, RunStatus::InProgress);
        assert_eq!(a0.index, 1);
        assert!(a0.question.is_some());

        let replay = st.answer(answer(0)).await.unwrap_err();
        assert!(matches!(replay, ApiError::Conflict(_)));

        st.answer(answer(1)).await.expect("a1");
        let done = st.answer(answer(2)).await.expect("a2");
        assert_eq!(done.status, RunStatus::Completed);
        let result = done.result.expect("result");

        let dup = st.answer(answer(2)).await.expect("dup");
        assert!(dup.duplicate);
        assert_eq!(dup.result, Some(result.clone()));

        let after = st.answer(answer(0)).await.unwrap_err();
        assert!(matches!(after, ApiError::Conflict(_)));

        let totals = st.rewards(Some(&s.id)).await.expect("rewards");
        assert_eq!(totals.total, result.awarded as u64);
        assert_eq!(st.results(Some(&s.id)).await.analytics.total_tests, 1);
    }

    #[tokio::test]
    async fn run_rejects_bad_length_and_unknown_student() {
        let st = state();
        let err = st
            .start_run(StartRunIn { student_id: "ghost".into(), length: None })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Student not found"));

        let s = st.register(reg("ana")).await.expect("register");
        let err = st
            .start_run(StartRunIn { student_id: s.id, length: Some(0) })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_student_rewards_is_not_found() {
        let st = state();
        let err = st.rewards(Some("ghost")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Student not found"));
        assert_eq!(st.rewards(None).await.expect("all").total, 0);
    }

    #[tokio::test]
    async fn stats_reflect_ledger() {
        let st = state();
        let s = st.register(reg("ana")).await.expect("register");
        st.complete_video(VideoCompleteIn { student_id: s.id.clone(), video_id: "cie_agua".into() })
            .await
            .expect("video");
        for correct in [2, 3, 4] {
            st.submit_test_result(TestResultIn {
                student_id: s.id.clone(),
                correct,
                final_level: 2,
                duration_seconds: 180,
            })
            .await
            .expect("result");
        }
        let stats = st.stats(&s.id).await.expect("stats");
        assert_eq!(stats.stats.videos_watched, 1);
        assert_eq!(stats.stats.tests_completed, 3);
        assert_eq!(stats.stats.avg_score, 3.0);
        assert_eq!(stats.stats.suggested_level, 2);
        assert!(stats.stats.total_points > 0);
        assert_eq!(stats.recent_activity.len(), 4);
    }

    #[tokio::test]
    async fn reset_wipes_students() {
        let st = state();
        st.register(reg("ana")).await.expect("register");
        st.reset().await;
        assert!(st.students.read().await.is_empty());
        assert_eq!(st.subjects().await, vec!["Ciencias", "Lengua", "Matemáticas"]);
    }
}
