use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, AuthHooks};
use crate::config::ClientConfig;
use crate::models::{Credentials, User};

use super::TokenStore;

/// Where protected views send anonymous users
pub const LOGIN_PATH: &str = "/admin/login";

/// Shown when a login fails without a server-provided reason
const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Buffer size for the redirect channel.
/// Redirects are rare; 16 covers a burst of guarded views.
const REDIRECT_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// A stored token is being checked against `/auth/me`
    Validating,
    Anonymous,
    Authenticated(User),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// The backend rejected the session's token
    SessionExpired,
    /// A protected view was opened without a session
    LoginRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub path: &'static str,
    pub reason: RedirectReason,
}

impl Redirect {
    fn to_login(reason: RedirectReason) -> Self {
        Self {
            path: LOGIN_PATH,
            reason,
        }
    }
}

/// Answer to "may this protected view render?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Still validating; render a loading state, do not redirect yet
    Pending,
    Granted(User),
    Denied(Redirect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(User),
    Failure { message: String },
}

/// State shared with the transport through [`AuthHooks`].
struct SessionShared {
    tokens: TokenStore,
    phase: watch::Sender<SessionPhase>,
    redirects: broadcast::Sender<Redirect>,
}

impl SessionShared {
    fn publish_redirect(&self, reason: RedirectReason) -> Redirect {
        let redirect = Redirect::to_login(reason);
        // No subscribers is fine; nobody is navigating
        let _ = self.redirects.send(redirect);
        redirect
    }
}

impl AuthHooks for SessionShared {
    fn bearer_token(&self) -> Option<String> {
        self.tokens.get_token()
    }

    fn unauthorized(&self, rejected_token: Option<&str>) {
        let Some(rejected) = rejected_token else {
            debug!("401 for a request sent without a token");
            return;
        };

        match self.tokens.remove_if_current(rejected) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Rejected token was already cleared");
                return;
            }
            Err(e) => {
                // The in-memory token is gone even if the backend failed
                warn!(error = %e, "Failed to clear persisted token");
            }
        }

        let mut redirect = false;
        self.phase.send_if_modified(|phase| match phase {
            // Startup validation settles the phase itself
            SessionPhase::Validating => false,
            SessionPhase::Anonymous => {
                redirect = true;
                false
            }
            SessionPhase::Authenticated(_) => {
                *phase = SessionPhase::Anonymous;
                redirect = true;
                true
            }
        });

        if redirect {
            info!("Session expired, redirecting to login");
            self.publish_redirect(RedirectReason::SessionExpired);
        }
    }
}

/// Session-wide authentication state.
///
/// Owns the token store and the API client; every request made through
/// [`api`](SessionContext::api) carries the session's token, and a 401 from
/// any of them logs the session out once. Clone is cheap and shares state.
#[derive(Clone)]
pub struct SessionContext {
    shared: Arc<SessionShared>,
    api: ApiClient,
}

impl SessionContext {
    /// Build the session. With a stored token it starts `Validating` and
    /// stays there until [`restore`](SessionContext::restore) checks the
    /// token; without one it starts `Anonymous`.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let initial = if tokens.is_authenticated() {
            SessionPhase::Validating
        } else {
            SessionPhase::Anonymous
        };
        let (phase, _) = watch::channel(initial);
        let (redirects, _) = broadcast::channel(REDIRECT_BUFFER_SIZE);
        let shared = Arc::new(SessionShared {
            tokens,
            phase,
            redirects,
        });
        let hooks: Arc<dyn AuthHooks> = shared.clone();
        let api = ApiClient::new(config, hooks)?;
        Ok(Self { shared, api })
    }

    /// Client whose requests carry this session's token
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.shared.tokens
    }

    /// Silent validation of a stored token.
    ///
    /// With a token, asks `/auth/me`: success authenticates, failure removes
    /// the token. Without one the session is anonymous. The result is only
    /// applied if nothing else (login, logout) settled the session meanwhile.
    pub async fn restore(&self) -> SessionPhase {
        self.shared.phase.send_replace(SessionPhase::Validating);

        let next = match self.shared.tokens.get_token() {
            None => {
                debug!("No stored token, starting anonymous");
                SessionPhase::Anonymous
            }
            Some(token) => match self.api.current_user().await {
                Ok(user) => {
                    info!(username = %user.username, "Session restored");
                    SessionPhase::Authenticated(user)
                }
                Err(e) => {
                    warn!(error = %e, "Stored token failed validation");
                    if let Err(e) = self.shared.tokens.remove_if_current(&token) {
                        warn!(error = %e, "Failed to clear persisted token");
                    }
                    SessionPhase::Anonymous
                }
            },
        };

        self.shared.phase.send_if_modified(|phase| {
            if *phase == SessionPhase::Validating {
                *phase = next;
                true
            } else {
                false
            }
        });
        self.phase()
    }

    /// Log in with username and password.
    pub async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return LoginOutcome::Failure {
                message: "Username and password required".to_string(),
            };
        }

        match self.api.login(credentials).await {
            Ok(response) => {
                if let Err(e) = self.shared.tokens.set_token(&response.access_token) {
                    warn!(error = %e, "Failed to persist token, keeping it for this session");
                }
                info!(username = %response.user.username, "Login successful");
                self.shared
                    .phase
                    .send_replace(SessionPhase::Authenticated(response.user.clone()));
                LoginOutcome::Success(response.user)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let message = match &e {
                    _ if e.detail().is_some() => e.user_message(),
                    ApiError::NetworkError(_) => e.user_message(),
                    _ => LOGIN_FAILED_MESSAGE.to_string(),
                };
                LoginOutcome::Failure { message }
            }
        }
    }

    /// Drop the token and the user. Does not contact the backend.
    pub fn logout(&self) {
        if let Err(e) = self.shared.tokens.remove_token() {
            warn!(error = %e, "Failed to clear persisted token");
        }
        self.shared.phase.send_replace(SessionPhase::Anonymous);
        info!("Logged out");
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.phase.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        match &*self.shared.phase.borrow() {
            SessionPhase::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.shared.phase.borrow(), SessionPhase::Authenticated(_))
    }

    /// True while the startup validation is still running
    pub fn is_loading(&self) -> bool {
        matches!(*self.shared.phase.borrow(), SessionPhase::Validating)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.shared.phase.subscribe()
    }

    /// Navigation requests published by the session
    pub fn redirects(&self) -> broadcast::Receiver<Redirect> {
        self.shared.redirects.subscribe()
    }

    /// Gate for a protected view. Anonymous sessions are denied and a login
    /// redirect is published; nothing is published while validating.
    pub fn guard(&self) -> Access {
        match self.phase() {
            SessionPhase::Validating => Access::Pending,
            SessionPhase::Authenticated(user) => Access::Granted(user),
            SessionPhase::Anonymous => {
                debug!("Protected view requested without a session");
                Access::Denied(self.shared.publish_redirect(RedirectReason::LoginRequired))
            }
        }
    }

    /// Wait for validation to finish, then apply [`guard`](SessionContext::guard).
    ///
    /// A session holding a stored token only leaves `Validating` through
    /// [`restore`](SessionContext::restore), so call that first.
    pub async fn guard_settled(&self) -> Access {
        let mut rx = self.subscribe();
        let _ = rx
            .wait_for(|phase| *phase != SessionPhase::Validating)
            .await;
        self.guard()
    }
}
