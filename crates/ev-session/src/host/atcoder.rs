use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use super::html::{editorial_hrefs, parse_profile_form};
use super::{HostSite, PageContext, ProfileForm};
use crate::config::{SessionConfig, parse_base_url};
use crate::error::{HostError, SessionError, SessionResult};

/// Cookie carrying the signed-in host session.
pub const SESSION_COOKIE_NAME: &str = "REVEL_SESSION";

/// [`HostSite`] backed by the live host site over HTTP.
///
/// Requests carry the user's session cookie so the settings page resolves to
/// the signed-in user's profile.
#[derive(Clone)]
pub struct AtCoderHost {
    client: reqwest::Client,
    origin: Url,
    context: PageContext,
}

impl std::fmt::Debug for AtCoderHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtCoderHost")
            .field("origin", &self.origin.as_str())
            .field("context", &self.context)
            .finish()
    }
}

impl AtCoderHost {
    pub fn new(
        config: &SessionConfig,
        context: PageContext,
        session_cookie: Option<&str>,
    ) -> SessionResult<Self> {
        let origin = parse_base_url(&config.host_origin)?;
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}={cookie}"))
                .map_err(|e| SessionError::Config(format!("invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SessionError::Config(format!("build host client: {e}")))?;
        Ok(Self {
            client,
            origin,
            context,
        })
    }

    fn url(&self, path: &str) -> Result<Url, HostError> {
        self.origin.join(path).map_err(|e| HostError::Request {
            url: format!("{}{path}", self.origin),
            message: e.to_string(),
        })
    }

    fn settings_url(&self) -> Result<Url, HostError> {
        self.url("settings")
    }

    async fn get_text(&self, url: &Url) -> Result<String, HostError> {
        debug!(%url, "fetching host page");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        check_status(url, response.status())?;
        response.text().await.map_err(|e| request_error(url, e))
    }
}

fn request_error(url: &Url, err: reqwest::Error) -> HostError {
    HostError::Request {
        url: url.to_string(),
        message: err.to_string(),
    }
}

fn check_status(url: &Url, status: reqwest::StatusCode) -> Result<(), HostError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(HostError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl HostSite for AtCoderHost {
    fn context(&self) -> &PageContext {
        &self.context
    }

    async fn fetch_profile(&self) -> Result<ProfileForm, HostError> {
        let url = self.settings_url()?;
        let page = self.get_text(&url).await?;
        parse_profile_form(&page).ok_or_else(|| HostError::Parse {
            url: url.to_string(),
            what: "profile settings form",
        })
    }

    async fn submit_profile(&self, form: &ProfileForm) -> Result<(), HostError> {
        let url = self.settings_url()?;
        debug!(%url, fields = form.fields().len(), "submitting profile form");
        let response = self
            .client
            .post(url.clone())
            .form(form.fields())
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;
        check_status(&url, response.status())
    }

    async fn editorial_links(&self) -> Result<Vec<String>, HostError> {
        let page_url = self.url(&self.context.editorial_path())?;
        let page = self.get_text(&page_url).await?;
        let links = editorial_hrefs(&page)
            .into_iter()
            .filter_map(|href| match page_url.join(&href) {
                Ok(resolved) => Some(resolved.to_string()),
                Err(err) => {
                    debug!(%href, %err, "skipping unresolvable editorial link");
                    None
                }
            })
            .collect();
        Ok(links)
    }
}
