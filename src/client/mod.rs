//! Student client: session handling, the API gateway, and the progress features
//! built on top of it. Every feature receives the same `ApiClient`, which
//! carries the explicit `SessionContext`.

pub mod adaptive;
pub mod auth;
pub mod error;
pub mod gateway;
pub mod journey;
pub mod navigation;
pub mod rewards;
pub mod session;
pub mod videos;

pub use adaptive::{RunState, RunnerConfig, TestRunner, COMPLETED_MARKER};
pub use auth::{AuthFlow, LoginForm, RegisterForm};
pub use error::ClientError;
pub use gateway::{ApiBody, ApiClient};
pub use navigation::{Navigator, Page, RecordingNavigator, TracingNavigator};
pub use rewards::{RewardsView, Totals, POINTS_LABEL};
pub use session::{FileSessionStore, MemorySessionStore, SessionContext, SessionStore};
pub use videos::{Affordance, VideoTracker};
