//! Video Completion Tracking: the lesson list and the "mark as watched" action.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::client::error::ClientError;
use crate::client::gateway::ApiClient;
use crate::protocol::{VideoCompleteIn, VideoCompleteOut, VideoOut};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affordance {
    MarkAsWatched,
    Completed,
}

impl Affordance {
    pub fn label(&self) -> &'static str {
        match self {
            Affordance::MarkAsWatched => "Marcar como visto",
            Affordance::Completed => "Completado",
        }
    }
}

#[derive(Clone, Debug)]
pub struct VideoCard {
    pub video: VideoOut,
    completed: bool,
}

impl VideoCard {
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn affordance(&self) -> Affordance {
        if self.completed {
            Affordance::Completed
        } else {
            Affordance::MarkAsWatched
        }
    }
}

/// Result of one "mark as watched" click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub video_id: String,
    pub awarded: u32,
    /// The server had already recorded this completion.
    pub already_completed: bool,
}

pub struct VideoTracker {
    api: ApiClient,
    cards: BTreeMap<String, VideoCard>,
    order: Vec<String>,
}

impl VideoTracker {
    pub fn new(api: ApiClient) -> Self {
        Self { api, cards: BTreeMap::new(), order: Vec::new() }
    }

    pub async fn subjects(&self) -> Result<Vec<String>, ClientError> {
        self.api.get_json("/api/materias", &[]).await
    }

    /// Refresh the card list. A card completed here stays completed whatever the listing says.
    #[instrument(level = "info", skip(self))]
    pub async fn load(&mut self, subject: Option<&str>) -> Result<Vec<VideoCard>, ClientError> {
        let student = self.api.session().require_session_or_redirect()?;
        let mut query: Vec<(&str, &str)> = vec![("student_id", student.id.as_str())];
        if let Some(s) = subject {
            query.push(("materia", s));
        }
        let videos: Vec<VideoOut> = self.api.get_json("/api/videos", &query).await?;

        self.order = videos.iter().map(|v| v.id.clone()).collect();
        for v in videos {
            let was_completed = self.cards.get(&v.id).is_some_and(|c| c.completed);
            let completed = was_completed || v.completed;
            self.cards.insert(v.id.clone(), VideoCard { video: v, completed });
        }
        Ok(self.cards())
    }

    /// Cards of the last listing, in server order.
    pub fn cards(&self) -> Vec<VideoCard> {
        self.order.iter().filter_map(|id| self.cards.get(id).cloned()).collect()
    }

    pub fn card(&self, video_id: &str) -> Option<&VideoCard> {
        self.cards.get(video_id)
    }

    /// One POST per call. A repeat is a harmless success with nothing awarded.
    #[instrument(level = "info", skip(self))]
    pub async fn mark_complete(&mut self, video_id: &str) -> Result<CompletionOutcome, ClientError> {
        let student = self.api.session().require_session_or_redirect()?;
        let body = VideoCompleteIn { student_id: student.id.clone(), video_id: video_id.to_string() };
        let out: VideoCompleteOut = self.api.post_json("/api/video-completo", &body).await?;

        if let Some(card) = self.cards.get_mut(video_id) {
            card.completed = true;
        }
        let outcome = CompletionOutcome {
            video_id: video_id.to_string(),
            awarded: out.awarded,
            already_completed: out.awarded == 0,
        };
        info!(target: "progress", student_id = %student.id, %video_id, awarded = outcome.awarded, repeat = outcome.already_completed, "Video marked as watched");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::navigation::Page;
    use crate::client::testkit::TestEnv;

    #[tokio::test]
    async fn marking_twice_matches_marking_once() {
        let env = TestEnv::start().await;
        let student = env.register("qa").await;
        let mut tracker = VideoTracker::new(env.api.clone());

        let cards = tracker.load(Some("Matemáticas")).await.expect("load");
        assert_eq!(cards.len(), 2);
        let first = cards[0].video.id.clone();
        assert_eq!(cards[0].affordance(), Affordance::MarkAsWatched);

        let once = tracker.mark_complete(&first).await.expect("first click");
        assert!(once.awarded >= 10);
        assert!(!once.already_completed);
        assert_eq!(tracker.card(&first).map(|c| c.affordance()), Some(Affordance::Completed));
        let after_once = env.state.rewards(Some(&student.id)).await.expect("rewards").total;

        let twice = tracker.mark_complete(&first).await.expect("repeat click");
        assert_eq!(twice.awarded, 0);
        assert!(twice.already_completed);
        assert_eq!(tracker.card(&first).map(|c| c.affordance()), Some(Affordance::Completed));
        let after_twice = env.state.rewards(Some(&student.id)).await.expect("rewards").total;
        assert_eq!(after_once, after_twice);

        let reloaded = tracker.load(Some("Matemáticas")).await.expect("reload");
        assert!(reloaded.iter().find(|c| c.video.id == first).is_some_and(|c| c.is_completed()));
    }

    #[tokio::test]
    async fn completed_card_never_flips_back() {
        let env = TestEnv::start().await;
        env.register("qa").await;
        let mut tracker = VideoTracker::new(env.api.clone());
        tracker.load(None).await.expect("load");
        tracker.mark_complete("cie_agua").await.expect("mark");

        // Server forgets everything; the listing now says "not completed".
        env.state.rewards.write().await.clear();
        let cards = tracker.load(None).await.expect("reload");
        let card = cards.iter().find(|c| c.video.id == "cie_agua").expect("card");
        assert_eq!(card.affordance(), Affordance::Completed);
    }

    #[tokio::test]
    async fn unknown_video_is_a_plain_http_error() {
        let env = TestEnv::start().await;
        env.register("qa").await;
        let mut tracker = VideoTracker::new(env.api.clone());
        let err = tracker.mark_complete("nope").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(env.ctx().try_get().is_some(), "not a stale-session reply");
    }

    #[tokio::test]
    async fn no_session_redirects_without_request() {
        let env = TestEnv::start().await;
        let mut tracker = VideoTracker::new(env.api.clone());
        let err = tracker.mark_complete("cie_agua").await.unwrap_err();
        assert!(matches!(err, ClientError::NoSession));
        assert_eq!(env.nav.current(), Some(Page::Login));
        assert!(env.state.rewards.read().await.is_empty());
    }

    #[tokio::test]
    async fn subjects_are_listed() {
        let env = TestEnv::start().await;
        let tracker = VideoTracker::new(env.api.clone());
        let subjects = tracker.subjects().await.expect("subjects");
        assert_eq!(subjects, vec!["Ciencias", "Lengua", "Matemáticas"]);
    }
}
