//! Authentication controller: owns the session and its persisted mirror.

use crate::client::{ApiClient, Endpoint};
use crate::session::{Session, SessionStore};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// How the admin flag of a fresh session is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AdminPolicy {
    /// Admin iff the submitted username is "admin" (any case). Ignores the server.
    #[default]
    #[serde(rename = "username")]
    #[value(name = "username")]
    UsernameClaim,
    /// Admin iff the login response says `is_admin: true`.
    #[serde(rename = "server")]
    #[value(name = "server")]
    ServerClaim,
}

impl AdminPolicy {
    pub fn is_admin(self, username: &str, server_claim: bool) -> bool {
        match self {
            AdminPolicy::UsernameClaim => username.eq_ignore_ascii_case("admin"),
            AdminPolicy::ServerClaim => server_claim,
        }
    }
}

/// Result of the network half of a login.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Granted {
        token: String,
        account_number: String,
        server_admin: bool,
    },
    Rejected {
        status: u16,
        message: Option<String>,
    },
    NetworkError(String),
}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub success: bool,
    pub message: String,
}

/// Call the login endpoint. Never touches controller state.
pub async fn request_login(client: &ApiClient, username: &str, password: &str) -> LoginOutcome {
    let body = serde_json::json!({ "username": username, "password": password });
    let resp = match client.post(&Endpoint::Login, &body, None).await {
        Ok(resp) => resp,
        Err(e) => {
            error!(error = %e, "Login request failed");
            return LoginOutcome::NetworkError(e.to_string());
        }
    };

    let token = resp.string_field("token").filter(|t| !t.is_empty());
    match token {
        Some(token) if resp.ok => LoginOutcome::Granted {
            token,
            account_number: resp
                .string_field("accountNumber")
                .or_else(|| resp.string_field("account_number"))
                .unwrap_or_default(),
            server_admin: resp.field::<bool>("is_admin").unwrap_or(false),
        },
        _ => LoginOutcome::Rejected {
            status: resp.status,
            message: resp.message().map(str::to_string),
        },
    }
}

/// Call the register endpoint.
pub async fn request_register(client: &ApiClient, username: &str, password: &str) -> RegisterOutcome {
    let body = serde_json::json!({ "username": username, "password": password });
    match client.post(&Endpoint::Register, &body, None).await {
        Ok(resp) => RegisterOutcome {
            success: resp.ok,
            message: resp.message_or("Registration failed"),
        },
        Err(e) => {
            error!(error = %e, "Registration request failed");
            RegisterOutcome {
                success: false,
                message: "Network error. Please try again.".to_string(),
            }
        }
    }
}

/// Two-state controller: Unauthenticated (no session) or Authenticated.
pub struct AuthController {
    client: ApiClient,
    store: SessionStore,
    policy: AdminPolicy,
    session: Option<Session>,
    loading: bool,
}

impl AuthController {
    /// Starts in the loading state until [`AuthController::load`] runs.
    pub fn new(client: ApiClient, store: SessionStore, policy: AdminPolicy) -> Self {
        Self {
            client,
            store,
            policy,
            session: None,
            loading: true,
        }
    }

    /// Restore a persisted session, if a complete one exists.
    pub fn load(&mut self) {
        match self.store.load() {
            Ok(session) => {
                if let Some(s) = &session {
                    info!(username = %s.username, "Restored session");
                }
                self.session = session;
            }
            Err(e) => {
                error!(error = %e, "Failed to load session from storage");
                self.session = None;
            }
        }
        self.loading = false;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_admin)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Mark a login as in flight.
    pub fn begin_login(&mut self) {
        self.loading = true;
    }

    /// Apply the outcome of [`request_login`]. Returns whether the user is
    /// now authenticated.
    pub fn apply_login(&mut self, username: &str, outcome: LoginOutcome) -> bool {
        self.loading = false;
        match outcome {
            LoginOutcome::Granted {
                token,
                account_number,
                server_admin,
            } => {
                let session = Session {
                    username: username.to_string(),
                    account_number,
                    is_admin: self.policy.is_admin(username, server_admin),
                    token,
                };
                if let Err(e) = self.store.save(&session) {
                    warn!(error = %e, "Failed to persist session; keeping it in memory");
                }
                info!(username, is_admin = session.is_admin, "Logged in");
                self.session = Some(session);
                true
            }
            LoginOutcome::Rejected { status, message } => {
                warn!(username, status, message = message.as_deref().unwrap_or(""), "Login rejected");
                false
            }
            LoginOutcome::NetworkError(e) => {
                warn!(username, error = %e, "Login failed");
                false
            }
        }
    }

    /// Full login: request, then apply.
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        self.begin_login();
        let outcome = request_login(&self.client, username, password).await;
        self.apply_login(username, outcome)
    }

    /// Mark a registration as in flight.
    pub fn begin_register(&mut self) {
        self.loading = true;
    }

    /// Settle a registration started with [`AuthController::begin_register`].
    pub fn finish_register(&mut self, outcome: RegisterOutcome) -> RegisterOutcome {
        self.loading = false;
        if outcome.success {
            info!("Account registered");
        } else {
            warn!(message = %outcome.message, "Registration failed");
        }
        outcome
    }

    /// Register a new account. Does not log in.
    pub async fn register(&mut self, username: &str, password: &str) -> RegisterOutcome {
        self.begin_register();
        let outcome = request_register(&self.client, username, password).await;
        self.finish_register(outcome)
    }

    /// Drop the session locally. No server call is made.
    pub fn logout(&mut self) {
        if let Some(s) = self.session.take() {
            info!(username = %s.username, "Logged out");
        }
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Logout error while clearing storage");
        }
    }
}
