//! Auth Flow: register / login establish the session; logout and hard reset tear it down.

use reqwest::Method;
use tracing::{debug, info, instrument};

use crate::client::error::ClientError;
use crate::client::gateway::ApiClient;
use crate::client::navigation::Page;
use crate::domain::Student;
use crate::protocol::{LoginIn, RegisterIn};

pub type RegisterForm = RegisterIn;
pub type LoginForm = LoginIn;

#[derive(Clone)]
pub struct AuthFlow {
    api: ApiClient,
}

impl AuthFlow {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[instrument(level = "info", skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterForm) -> Result<Student, ClientError> {
        let student: Student = self.api.post_json("/api/auth/register", form).await?;
        self.establish(student)
    }

    #[instrument(level = "info", skip(self, form), fields(username = %form.username))]
    pub async fn login(&self, form: &LoginForm) -> Result<Student, ClientError> {
        let student: Student = self.api.post_json("/api/auth/login", form).await?;
        self.establish(student)
    }

    /// Only reached with a fully decoded student, so the session is all or nothing.
    fn establish(&self, student: Student) -> Result<Student, ClientError> {
        let session = self.api.session();
        session.set(&student)?;
        info!(target: "progress", student_id = %student.id, "Session established");
        session.navigate(Page::Menu);
        Ok(student)
    }

    /// Local session goes first; the server notification is best-effort.
    #[instrument(level = "info", skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let session = self.api.session();
        session.clear()?;
        if let Err(e) = self.api.call("/api/auth/logout", Method::POST, None).await {
            debug!(target: "edusmart", error = %e, "logout notification failed (ignored)");
        }
        session.navigate(Page::Login);
        Ok(())
    }

    /// Clear all local state and ask the server to wipe its data, ignoring the outcome.
    #[instrument(level = "warn", skip(self))]
    pub async fn hard_reset(&self) -> Result<(), ClientError> {
        let session = self.api.session();
        session.clear()?;
        if let Err(e) = self.api.call("/api/dev/reset", Method::POST, None).await {
            debug!(target: "edusmart", error = %e, "dev reset failed (ignored)");
        }
        session.navigate(Page::Login);
        Ok(())
    }
}
