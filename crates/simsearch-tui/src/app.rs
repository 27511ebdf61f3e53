//! Application state management for simsearch.
//!
//! This module contains the `App` struct: login form state, the session
//! holder (the authenticated `ApiClient`), the search form, the result
//! set, and the channel that background search tasks report through.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use simsearch_core::config::ENV_AUTH_KEY;
use simsearch_core::{
    ApiClient, ApiError, Config, Coverage, Credentials, Sim, SimFilter, SimQuery,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for auth key id input.
/// Soracom auth key ids are "keyId-" followed by 32 characters.
const MAX_AUTH_KEY_ID_LENGTH: usize = 64;

/// Maximum length for auth key (secret) input.
const MAX_AUTH_KEY_LENGTH: usize = 128;

/// Maximum length for the search value.
const MAX_SEARCH_VALUE_LENGTH: usize = 128;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

pub const LOGIN_FAILED_MESSAGE: &str = "Authentication failed. Please check your credentials.";
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to fetch SIMs";
const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    LoggingIn,
    Normal,
    EditingSearch,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    AuthKeyId,
    AuthKey,
    Coverage,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::AuthKeyId => LoginFocus::AuthKey,
            LoginFocus::AuthKey => LoginFocus::Coverage,
            LoginFocus::Coverage => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::AuthKeyId,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::AuthKeyId => LoginFocus::Button,
            LoginFocus::AuthKey => LoginFocus::AuthKeyId,
            LoginFocus::Coverage => LoginFocus::AuthKey,
            LoginFocus::Button => LoginFocus::Coverage,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned API tasks.
enum TaskResult {
    /// A search finished (query, all pages or the first error)
    Search(SimQuery, Result<Vec<Sim>>),
    /// A single SIM re-fetched for the detail panel
    SimDetail(String, Result<Sim>),
}

/// A task result tagged with the session that started the task.
struct TaskMessage {
    session: u64,
    result: TaskResult,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    /// Unauthenticated client; owns the connection pool and endpoints
    base_client: ApiClient,
    /// The session holder. `None` routes back to the login form.
    pub api: Option<ApiClient>,

    pub state: AppState,

    // Login form state
    pub login_auth_key_id: String,
    pub login_auth_key: String,
    pub login_coverage: Coverage,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Search form state
    pub search_filter: SimFilter,
    pub search_value: String,
    pub search_error: Option<String>,
    pub last_query: Option<SimQuery>,
    pub searching: bool,

    // Results
    pub sims: Vec<Sim>,
    pub selection: usize,
    pub detail_loading: bool,

    pub status_message: Option<String>,

    /// Bumped on every login and logout; results from older sessions are dropped
    session_generation: u64,
    task_rx: mpsc::Receiver<TaskMessage>,
    task_tx: mpsc::Sender<TaskMessage>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: &Config) -> Result<Self> {
        let base_client = ApiClient::with_options(config.client_options())?;
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Prefill from env vars or config
        let login_auth_key_id = config.auth_key_id.clone().unwrap_or_default();
        let login_auth_key = std::env::var(ENV_AUTH_KEY).unwrap_or_default();
        let login_coverage = config.default_coverage();
        debug!(coverage = %login_coverage, "App created");

        Ok(Self {
            base_client,
            api: None,

            state: AppState::LoggingIn,

            login_auth_key_id,
            login_auth_key,
            login_coverage,
            login_focus: LoginFocus::AuthKeyId,
            login_error: None,

            search_filter: SimFilter::default(),
            search_value: String::new(),
            search_error: None,
            last_query: None,
            searching: false,

            sims: Vec::new(),
            selection: 0,
            detail_loading: false,

            status_message: None,

            session_generation: 0,
            task_rx,
            task_tx,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.api.as_ref().map(|api| api.is_authenticated()).unwrap_or(false)
    }

    /// Show the login form, focusing the first empty field
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_auth_key_id.is_empty() {
            LoginFocus::AuthKeyId
        } else if self.login_auth_key.is_empty() {
            LoginFocus::AuthKey
        } else {
            LoginFocus::Button
        };
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let auth_key_id = self.login_auth_key_id.trim().to_string();
        let auth_key = self.login_auth_key.clone();

        if auth_key_id.is_empty() || auth_key.is_empty() {
            self.login_error = Some("Auth key ID and auth key required".to_string());
            return Err(ApiError::UserError("Auth key ID and auth key required".to_string()).into());
        }

        self.login_error = None;

        match self
            .base_client
            .authenticate(&auth_key_id, &auth_key, self.login_coverage.selector())
            .await
        {
            Ok(credentials) => {
                let coverage = credentials.coverage();
                self.install_session(credentials);
                self.login_auth_key.clear();
                self.state = AppState::Normal;
                self.status_message = Some(format!("Signed in ({})", coverage));
                info!(coverage = %coverage, "Login successful");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(login_error_message(&e));
                Err(e)
            }
        }
    }

    /// Attach a fresh session. Tasks started under earlier sessions no longer report.
    fn install_session(&mut self, credentials: Credentials) {
        self.session_generation += 1;
        self.api = Some(self.base_client.with_credentials(credentials));
        self.searching = false;
        self.detail_loading = false;
    }

    /// Drop the session and go back to the login form.
    pub fn logout(&mut self, message: Option<String>) {
        info!("Session closed");
        self.session_generation += 1;
        self.api = None;
        self.sims.clear();
        self.selection = 0;
        self.last_query = None;
        self.searching = false;
        self.detail_loading = false;
        self.search_error = None;
        self.status_message = None;
        self.login_error = message;
        self.start_login();
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Validate the search form and run the search on a background task.
    pub fn submit_search(&mut self) {
        if self.searching {
            self.status_message = Some("A search is already running".to_string());
            return;
        }

        let query = match SimQuery::try_new(self.search_filter, &self.search_value) {
            Ok(query) => query,
            Err(e) => {
                self.search_error = Some(user_message(&e));
                return;
            }
        };

        let api = match self.api {
            Some(ref api) => api.clone(),
            None => {
                warn!("Search submitted without a session");
                self.start_login();
                return;
            }
        };

        self.search_error = None;
        self.searching = true;
        self.status_message = Some("Loading SIMs...".to_string());
        info!(query = %query, "Starting search");

        let tx = self.task_tx.clone();
        let session = self.session_generation;
        tokio::spawn(async move {
            let result = api.search_sims(&query).await;
            Self::send_result(&tx, session, TaskResult::Search(query, result)).await;
        });
    }

    /// Run the last completed query again with its filter and value.
    pub fn rerun_last_search(&mut self) {
        if let Some(query) = self.last_query.clone() {
            self.search_filter = query.filter();
            self.search_value = query.value().to_string();
            self.submit_search();
        }
    }

    /// Re-fetch the selected SIM for the detail panel.
    pub fn refresh_selected(&mut self) {
        if self.detail_loading {
            return;
        }
        let (api, sim_id) = match (self.api.as_ref(), self.selected_sim()) {
            (Some(api), Some(sim)) => (api.clone(), sim.sim_id.clone()),
            _ => return,
        };

        self.detail_loading = true;
        self.status_message = Some(format!("Loading SIM {}...", sim_id));

        let tx = self.task_tx.clone();
        let session = self.session_generation;
        tokio::spawn(async move {
            let result = api.get_sim(&sim_id).await;
            Self::send_result(&tx, session, TaskResult::SimDetail(sim_id, result)).await;
        });
    }

    async fn send_result(tx: &mpsc::Sender<TaskMessage>, session: u64, result: TaskResult) {
        if tx.send(TaskMessage { session, result }).await.is_err() {
            error!("Failed to send task result - channel closed");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(message) = self.task_rx.try_recv() {
            self.process_task_result(message.session, message.result);
        }
    }

    fn process_task_result(&mut self, session: u64, result: TaskResult) {
        if session != self.session_generation {
            debug!(
                task_session = session,
                current_session = self.session_generation,
                "Dropping task result from an earlier session"
            );
            return;
        }

        match result {
            TaskResult::Search(query, Ok(sims)) => {
                self.searching = false;
                self.status_message = Some(format!("{} SIMs for {}", sims.len(), query));
                self.sims = sims;
                self.selection = 0;
                self.last_query = Some(query);
            }
            TaskResult::Search(query, Err(e)) => {
                self.searching = false;
                error!(query = %query, error = %e, "Search failed");
                if is_unauthenticated(&e) {
                    self.logout(Some(SESSION_EXPIRED_MESSAGE.to_string()));
                    return;
                }
                self.search_error = Some(SEARCH_FAILED_MESSAGE.to_string());
                self.status_message = None;
            }
            TaskResult::SimDetail(sim_id, Ok(sim)) => {
                self.detail_loading = false;
                self.status_message = Some(format!("Refreshed SIM {}", sim_id));
                if let Some(existing) = self.sims.iter_mut().find(|s| s.sim_id == sim_id) {
                    *existing = sim;
                }
            }
            TaskResult::SimDetail(sim_id, Err(e)) => {
                self.detail_loading = false;
                warn!(sim_id = %sim_id, error = %e, "SIM refresh failed");
                if is_unauthenticated(&e) {
                    self.logout(Some(SESSION_EXPIRED_MESSAGE.to_string()));
                    return;
                }
                self.status_message = Some(format!("Failed to fetch SIM {}", sim_id));
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected_sim(&self) -> Option<&Sim> {
        self.sims.get(self.selection)
    }

    pub fn select_next(&mut self, step: usize) {
        let max_index = self.sims.len().saturating_sub(1);
        self.selection = (self.selection + step).min(max_index);
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selection = self.selection.saturating_sub(step);
    }

    pub fn cycle_filter(&mut self, forward: bool) {
        self.search_filter = if forward {
            self.search_filter.next()
        } else {
            self.search_filter.prev()
        };
        self.search_error = None;
    }
}

// ============================================================================
// Error messages
// ============================================================================

fn is_unauthenticated(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ApiError>()
        .map(|api_error| api_error.is_unauthenticated())
        .unwrap_or(false)
}

/// Map a login failure to the message shown on the login form
pub fn login_error_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<ApiError>() {
        Some(ApiError::Network(err)) if err.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        Some(ApiError::Network(_)) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        _ => LOGIN_FAILED_MESSAGE.to_string(),
    }
}

fn user_message(e: &ApiError) -> String {
    match e {
        ApiError::UserError(msg) => msg.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_auth_key_id_char(current_len: usize, c: char) -> bool {
    current_len < MAX_AUTH_KEY_ID_LENGTH && is_valid_input_char(c)
}

pub fn can_add_auth_key_char(current_len: usize, c: char) -> bool {
    current_len < MAX_AUTH_KEY_LENGTH && is_valid_input_char(c)
}

pub fn can_add_search_char(current_len: usize, c: char) -> bool {
    current_len < MAX_SEARCH_VALUE_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App::new(&Config::default()).expect("app")
    }

    /// App with a session attached, as after a successful login
    fn signed_in_app() -> App {
        let mut app = test_app();
        let credentials = Credentials::new("api-key", "token", Coverage::Global, None);
        app.install_session(credentials);
        app.state = AppState::Normal;
        app
    }

    /// Deliver a result as if it came from a task started in the current session
    fn deliver(app: &mut App, result: TaskResult) {
        let session = app.session_generation;
        app.process_task_result(session, result);
    }

    fn sim(id: &str) -> Sim {
        serde_json::from_value(serde_json::json!({"simId": id, "tags": {"name": id}}))
            .expect("sim")
    }

    #[test]
    fn test_login_focus_cycle() {
        assert_eq!(LoginFocus::AuthKeyId.next(), LoginFocus::AuthKey);
        assert_eq!(LoginFocus::AuthKey.next(), LoginFocus::Coverage);
        assert_eq!(LoginFocus::Coverage.next(), LoginFocus::Button);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::AuthKeyId); // Wraps around
        assert_eq!(LoginFocus::AuthKeyId.prev(), LoginFocus::Button); // Wraps around
        assert_eq!(LoginFocus::Coverage.prev(), LoginFocus::AuthKey);
    }

    #[test]
    fn test_new_app_starts_at_login() {
        let app = test_app();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.is_authenticated());
        assert!(app.sims.is_empty());
    }

    #[tokio::test]
    async fn test_search_without_session_routes_to_login() {
        let mut app = test_app();
        app.state = AppState::Normal;
        app.search_value = "alice".to_string();
        app.submit_search();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.searching);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let mut app = test_app();
        app.login_auth_key_id = "keyId-1".to_string();
        app.login_auth_key.clear();
        assert!(app.attempt_login().await.is_err());
        assert_eq!(
            app.login_error.as_deref(),
            Some("Auth key ID and auth key required")
        );
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_search_result_replaces_table() {
        let mut app = signed_in_app();
        app.searching = true;
        app.selection = 3;
        let query = SimQuery::new(SimFilter::Name, "gw");
        deliver(&mut app, TaskResult::Search(query.clone(), Ok(vec![sim("a"), sim("b")])));

        assert!(!app.searching);
        assert_eq!(app.sims.len(), 2);
        assert_eq!(app.selection, 0);
        assert_eq!(app.last_query, Some(query));
    }

    #[test]
    fn test_search_failure_keeps_session() {
        let mut app = signed_in_app();
        app.searching = true;
        let query = SimQuery::new(SimFilter::Tag, "site");
        let err = anyhow::Error::from(ApiError::ServerError("boom".to_string()));
        deliver(&mut app, TaskResult::Search(query, Err(err)));

        assert_eq!(app.search_error.as_deref(), Some(SEARCH_FAILED_MESSAGE));
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_unauthenticated_search_logs_out() {
        let mut app = signed_in_app();
        app.sims = vec![sim("a")];
        let query = SimQuery::new(SimFilter::Tag, "site");
        let err = anyhow::Error::from(ApiError::Unauthenticated("Not authenticated".to_string()));
        deliver(&mut app, TaskResult::Search(query, Err(err)));

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.api.is_none());
        assert!(app.sims.is_empty());
        assert_eq!(app.login_error.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    }

    #[test]
    fn test_detail_result_replaces_row() {
        let mut app = signed_in_app();
        app.sims = vec![sim("a"), sim("b")];
        app.detail_loading = true;
        let mut updated = sim("b");
        updated.status = "suspended".to_string();
        deliver(&mut app, TaskResult::SimDetail("b".to_string(), Ok(updated)));

        assert!(!app.detail_loading);
        assert_eq!(app.sims[1].status, "suspended");
    }

    #[test]
    fn test_result_after_logout_is_dropped() {
        let mut app = signed_in_app();
        let stale_session = app.session_generation;
        app.logout(None);
        let query = SimQuery::new(SimFilter::Name, "gw");
        app.process_task_result(stale_session, TaskResult::Search(query, Ok(vec![sim("a")])));

        assert!(app.sims.is_empty());
        assert!(app.last_query.is_none());
    }

    #[test]
    fn test_result_from_previous_session_dropped_after_relogin() {
        let mut app = test_app();
        app.install_session(Credentials::new("jp-key", "jp-token", Coverage::Japan, None));
        app.state = AppState::Normal;
        app.searching = true;
        let first_session = app.session_generation;

        app.logout(None);
        app.install_session(Credentials::new("g-key", "g-token", Coverage::Global, None));
        app.state = AppState::Normal;
        // The new session has its own search running
        app.searching = true;

        let query = SimQuery::new(SimFilter::Name, "gw");
        app.process_task_result(
            first_session,
            TaskResult::Search(query.clone(), Ok(vec![sim("from-session-1")])),
        );
        assert!(app.sims.is_empty());
        assert!(app.last_query.is_none());
        assert!(app.searching);

        // Failures from the old session do not log the new one out either
        let err = anyhow::Error::from(ApiError::Unauthenticated("Not authenticated".to_string()));
        app.process_task_result(first_session, TaskResult::Search(query, Err(err)));
        assert!(app.is_authenticated());
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_one_search_in_flight() {
        let mut app = signed_in_app();
        app.searching = true;
        app.search_value = "gw".to_string();
        app.submit_search();

        assert_eq!(app.status_message.as_deref(), Some("A search is already running"));
        assert!(app.last_query.is_none());
    }

    #[test]
    fn test_selection_bounds() {
        let mut app = test_app();
        app.sims = vec![sim("a"), sim("b"), sim("c")];
        app.select_next(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 2);
        app.select_prev(1);
        assert_eq!(app.selection, 1);
        app.select_prev(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 0);
    }

    #[test]
    fn test_login_error_message() {
        let err = anyhow::Error::from(ApiError::Unauthenticated("Failed to authenticate".to_string()));
        assert_eq!(login_error_message(&err), LOGIN_FAILED_MESSAGE);
    }

    #[test]
    fn test_input_char_limits() {
        assert!(can_add_auth_key_id_char(0, 'k'));
        assert!(!can_add_auth_key_id_char(64, 'k'));
        assert!(can_add_auth_key_char(127, '!'));
        assert!(!can_add_auth_key_char(128, 'a'));
        assert!(can_add_search_char(0, ' '));
        // Control characters rejected
        assert!(!can_add_search_char(0, '\n'));
        assert!(!can_add_auth_key_char(0, '\x00'));
    }
}
