use crate::error::FlvError;
use crate::session::PageFetcher;
use crate::types::Credentials;

const SIGN_IN_PATH: &str = "/auth/sign_in";
const SIGN_OUT_PATH: &str = "/auth/sign_out";

/// Text preceding the profile slug in the post-login page (`/perfil/{slug}"`).
const PROFILE_MARKER: &str = "perfil";

/// Where a session stands in the sign-in lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    LoggingIn,
    Authenticated,
    LoggingOut,
}

/// Signs a session in and out of AnimeFLV and remembers the profile slug.
#[derive(Debug)]
pub struct Authenticator {
    base: String,
    state: AuthState,
    profile: Option<String>,
}

impl Authenticator {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            state: AuthState::Anonymous,
            profile: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Post the sign-in form and recover the profile slug from the response.
    ///
    /// Bad credentials and a missing profile marker both come back as
    /// [`FlvError::Authentication`].
    pub async fn login<F: PageFetcher>(
        &mut self,
        fetcher: &F,
        credentials: &Credentials,
    ) -> Result<String, FlvError> {
        self.state = AuthState::LoggingIn;
        let result = self.try_login(fetcher, credentials).await;
        match &result {
            Ok(profile) => {
                tracing::info!(profile = %profile, "Signed in to AnimeFLV");
                self.profile = Some(profile.clone());
                self.state = AuthState::Authenticated;
            }
            Err(e) => {
                tracing::warn!(error = %e, "AnimeFLV sign-in failed");
                self.state = AuthState::Anonymous;
            }
        }
        result
    }

    async fn try_login<F: PageFetcher>(
        &self,
        fetcher: &F,
        credentials: &Credentials,
    ) -> Result<String, FlvError> {
        let url = format!("{}{SIGN_IN_PATH}", self.base);
        let page = fetcher
            .post_form(
                &url,
                &[
                    ("email", credentials.username.as_str()),
                    ("password", credentials.password.as_str()),
                    ("remember_me", "1"),
                ],
            )
            .await?;

        if !page.is_ok() {
            return Err(FlvError::Authentication(format!(
                "sign-in returned HTTP {}",
                page.status
            )));
        }

        extract_profile(&page.body)
            .ok_or_else(|| FlvError::Authentication("invalid credentials".into()))
    }

    /// Best-effort sign-out. The response is not inspected and failures are
    /// only logged.
    pub async fn logout<F: PageFetcher>(&mut self, fetcher: &F) {
        self.state = AuthState::LoggingOut;
        let url = format!("{}{SIGN_OUT_PATH}", self.base);
        match fetcher.get(&url).await {
            Ok(page) => tracing::debug!(status = page.status, "Signed out of AnimeFLV"),
            Err(e) => tracing::warn!(error = %e, "AnimeFLV sign-out failed"),
        }
        self.profile = None;
        self.state = AuthState::Anonymous;
    }
}

/// Scan raw HTML for the profile slug.
///
/// Looks for `perfil`, skips the single separator character after it and
/// reads up to the next `"`. A marker at offset 0, a quote as separator or
/// an empty slug all count as not found.
pub fn extract_profile(html: &str) -> Option<String> {
    let start = html.find(PROFILE_MARKER).filter(|&i| i > 0)?;
    let mut rest = html[start + PROFILE_MARKER.len()..].chars();
    match rest.next() {
        None | Some('"') => return None,
        Some(_) => {}
    }
    let tail = rest.as_str();
    let end = tail.find('"')?;
    let slug = tail[..end].trim();
    (!slug.is_empty()).then(|| slug.to_string())
}
