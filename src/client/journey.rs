//! Scripted student journey: register, watch a lesson, take the adaptive test,
//! read the rewards page. Drives the same components a real UI would.

use chrono::Utc;
use tracing::{info, instrument};

use crate::client::adaptive::{RunSummary, RunnerConfig, TestRunner};
use crate::client::auth::{AuthFlow, RegisterForm};
use crate::client::error::ClientError;
use crate::client::gateway::ApiClient;
use crate::client::navigation::Page;
use crate::client::rewards::RewardsView;
use crate::client::videos::{CompletionOutcome, VideoTracker};
use crate::domain::Student;

#[derive(Clone, Debug)]
pub struct JourneyPlan {
    pub register: RegisterForm,
    pub runner: RunnerConfig,
    /// Option picked for every question (1 = "B").
    pub option: usize,
}

impl JourneyPlan {
    /// The QA bot account: name "QA Bot <suffix>", course "2do", username "qa_<suffix>".
    pub fn qa_bot(suffix: &str, runner: RunnerConfig) -> Self {
        Self {
            register: RegisterForm {
                name: format!("QA Bot {suffix}"),
                course: "2do".into(),
                username: format!("qa_{suffix}"),
                password: "1234".into(),
            },
            runner,
            option: 1,
        }
    }

    /// Suffix from the last six digits of the current time in milliseconds.
    pub fn timestamp_suffix() -> String {
        let ms = Utc::now().timestamp_millis().to_string();
        ms[ms.len().saturating_sub(6)..].to_string()
    }
}

#[derive(Clone, Debug)]
pub struct JourneyReport {
    pub student: Student,
    pub greeting: String,
    pub video: Option<CompletionOutcome>,
    pub video_label: Option<&'static str>,
    pub run: RunSummary,
    pub points: u64,
    pub points_label: &'static str,
    /// Page the journey left the student on.
    pub final_page: Page,
}

#[instrument(level = "info", skip(api, plan), fields(username = %plan.register.username))]
pub async fn run_journey(api: &ApiClient, plan: &JourneyPlan) -> Result<JourneyReport, ClientError> {
    let session = api.session();

    let student = AuthFlow::new(api.clone()).register(&plan.register).await?;
    let greeting = format!("Hola, {}", student.name);
    info!(target: "progress", student_id = %student.id, "{greeting}");

    session.navigate(Page::Videos);
    let mut tracker = VideoTracker::new(api.clone());
    let cards = tracker.load(None).await?;
    let (video, video_label) = match cards.first() {
        Some(card) => {
            let id = card.video.id.clone();
            let outcome = tracker.mark_complete(&id).await?;
            let label = tracker.card(&id).map(|c| c.affordance().label());
            (Some(outcome), label)
        }
        None => (None, None),
    };

    session.navigate(Page::Menu);
    session.navigate(Page::AdaptiveTest);
    let mut runner = TestRunner::new(api.clone(), plan.runner.clone());
    let option = plan.option;
    let run = runner.run_to_completion(|_, _| option).await?;

    session.navigate(Page::Menu);
    let final_page = Page::Rewards;
    session.navigate(final_page);
    let totals = RewardsView::new(api.clone()).current_totals().await?;

    Ok(JourneyReport {
        student,
        greeting,
        video,
        video_label,
        run,
        points: totals.points,
        points_label: totals.label(),
        final_page,
    })
}
