//! Host site collaborator.
//!
//! The engine needs three things from the site it is embedded in: who the
//! local user is, read/write access to that user's profile form, and the
//! editorial links on the current page.

mod atcoder;
mod html;

use async_trait::async_trait;

use crate::error::HostError;

pub use atcoder::{AtCoderHost, SESSION_COOKIE_NAME};

/// Ambient identifiers of the page the engine runs against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Signed-in user name; `None` when browsing anonymously.
    pub user: Option<String>,
    pub contest: String,
    /// Restrict the page to one task's editorials.
    pub task: Option<String>,
}

impl PageContext {
    pub fn new(contest: impl Into<String>) -> Self {
        Self {
            contest: contest.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Path of the editorial listing this context points at.
    pub fn editorial_path(&self) -> String {
        match &self.task {
            Some(task) => format!("contests/{}/tasks/{}/editorial", self.contest, task),
            None => format!("contests/{}/editorial", self.contest),
        }
    }
}

/// All fields of the profile settings form, in document order.
///
/// Field values are round-tripped verbatim on submit; only the caller's
/// explicit [`ProfileForm::set`] changes anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileForm {
    fields: Vec<(String, String)>,
}

impl ProfileForm {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace the first field named `name`, appending it when absent.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

#[async_trait]
pub trait HostSite: Send + Sync {
    fn context(&self) -> &PageContext;

    async fn fetch_profile(&self) -> Result<ProfileForm, HostError>;

    async fn submit_profile(&self, form: &ProfileForm) -> Result<(), HostError>;

    /// Absolute URLs of the editorial links on the current page, in page order.
    async fn editorial_links(&self) -> Result<Vec<String>, HostError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// In-memory host whose profile submissions are recorded.
    pub(crate) struct FakeHost {
        pub(crate) context: PageContext,
        pub(crate) profile: Mutex<ProfileForm>,
        pub(crate) submissions: Mutex<Vec<ProfileForm>>,
        /// Scripted outcomes for successive submits; `Some` fails that submit.
        pub(crate) submit_failures: Mutex<VecDeque<Option<HostError>>>,
        pub(crate) links: Vec<String>,
    }

    impl FakeHost {
        pub(crate) fn new(user: &str, affiliation: &str) -> Self {
            Self {
                context: PageContext::new("abc300").with_user(user),
                profile: Mutex::new(ProfileForm::new(vec![
                    ("csrf_token".into(), "csrf".into()),
                    ("ui.Affiliation".into(), affiliation.into()),
                    ("ui.Country".into(), "JP".into()),
                ])),
                submissions: Mutex::new(Vec::new()),
                submit_failures: Mutex::new(VecDeque::new()),
                links: Vec::new(),
            }
        }

        pub(crate) fn affiliation(&self) -> String {
            self.profile
                .lock()
                .unwrap()
                .get("ui.Affiliation")
                .unwrap_or_default()
                .to_string()
        }
    }

    #[async_trait]
    impl HostSite for FakeHost {
        fn context(&self) -> &PageContext {
            &self.context
        }

        async fn fetch_profile(&self) -> Result<ProfileForm, HostError> {
            // Let concurrent callers interleave with an in-flight handshake.
            tokio::task::yield_now().await;
            Ok(self.profile.lock().unwrap().clone())
        }

        async fn submit_profile(&self, form: &ProfileForm) -> Result<(), HostError> {
            self.submissions.lock().unwrap().push(form.clone());
            if let Some(Some(err)) = self.submit_failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            *self.profile.lock().unwrap() = form.clone();
            Ok(())
        }

        async fn editorial_links(&self) -> Result<Vec<String>, HostError> {
            Ok(self.links.clone())
        }
    }
}
