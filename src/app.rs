use crate::auth::{IdentityService, NavKind, Navigator, Route, SignupForm};
use crate::catalog::{CategoryDescriptor, CategoryFetcher, CategoryRow, ListItem, RowPhase};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// How long a status bar message stays visible.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Redirect policy shared by the catalog and identity clients: at most 3
/// hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        // Query strings carry API keys, so only the host and path are logged
        tracing::debug!(
            host = url.host_str().unwrap_or(""),
            path = url.path(),
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

/// Builds the HTTP client used for every outbound request.
pub fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .tcp_keepalive(std::time::Duration::from_secs(60))
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    Ok(client)
}

// ============================================================================
// Views
// ============================================================================

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Shown until the first auth-state notification routes somewhere.
    Splash,
    Login,
    Signup,
    /// Tabbed area behind the `/` route.
    Main,
}

impl View {
    pub fn route(self) -> Option<Route> {
        match self {
            View::Splash => None,
            View::Login => Some(Route::Login),
            View::Signup => Some(Route::Signup),
            View::Main => Some(Route::Home),
        }
    }
}

impl From<Route> for View {
    fn from(route: Route) -> Self {
        match route {
            Route::Home => View::Main,
            Route::Login => View::Login,
            Route::Signup => View::Signup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Groups,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Home, Tab::Groups, Tab::Profile];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Groups => "Groups",
            Tab::Profile => "Profile",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Home => Tab::Groups,
            Tab::Groups => Tab::Profile,
            Tab::Profile => Tab::Home,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Groups => 1,
            Tab::Profile => 2,
        }
    }
}

// ============================================================================
// Forms
// ============================================================================

pub const LOGIN_EMAIL: usize = 0;
pub const LOGIN_PASSWORD: usize = 1;

pub const SIGNUP_EMAIL: usize = 0;
pub const SIGNUP_USERNAME: usize = 1;
pub const SIGNUP_PASSWORD: usize = 2;
pub const SIGNUP_CONFIRM: usize = 3;

/// Cap on any single text field.
pub const MAX_FIELD_LENGTH: usize = 256;

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    /// Rendered as bullets.
    pub masked: bool,
}

impl FormField {
    fn new(label: &'static str, masked: bool) -> Self {
        Self {
            label,
            value: String::new(),
            masked,
        }
    }
}

/// Editable state of the login or signup screen.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focused: usize,
    /// A submission is in flight; further submits are ignored.
    pub submitting: bool,
    pub error: Option<String>,
}

impl Form {
    pub fn login() -> Self {
        Self::with_fields(vec![
            FormField::new("Email", false),
            FormField::new("Password", true),
        ])
    }

    pub fn signup() -> Self {
        Self::with_fields(vec![
            FormField::new("Email", false),
            FormField::new("Username", false),
            FormField::new("Password", true),
            FormField::new("Confirm Password", true),
        ])
    }

    fn with_fields(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            focused: 0,
            submitting: false,
            error: None,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn next_field(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len().max(1);
    }

    pub fn prev_field(&mut self) {
        let len = self.fields.len().max(1);
        self.focused = (self.focused + len - 1) % len;
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            if field.value.chars().count() < MAX_FIELD_LENGTH && !c.is_control() {
                field.value.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.value.pop();
        }
    }

    /// Wipes masked fields, keeping what the user would not need to retype.
    pub fn clear_secrets(&mut self) {
        for field in self.fields.iter_mut().filter(|f| f.masked) {
            field.value.clear();
        }
    }

    pub fn to_signup(&self) -> SignupForm {
        SignupForm {
            email: self.value(SIGNUP_EMAIL).to_string(),
            username: self.value(SIGNUP_USERNAME).to_string(),
            password: self.value(SIGNUP_PASSWORD).to_string(),
            confirm_password: self.value(SIGNUP_CONFIRM).to_string(),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Results delivered from background tasks to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Route change requested outside the input handler, e.g. by the
    /// session gate.
    Navigate { kind: NavKind, route: Route },
    /// Login attempt finished. `Err` carries display text.
    LoginFinished(Result<(), String>),
    /// Signup attempt finished. `Ok(false)` means the account exists but
    /// the username was not saved.
    SignupFinished(Result<bool, String>),
    SignOutFinished,
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "login", "signup")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

/// Forwards navigation into the app's event channel.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::Sender<AppEvent>,
}

impl ChannelNavigator {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx }
    }

    async fn send(&self, kind: NavKind, route: Route) {
        if let Err(e) = self.tx.send(AppEvent::Navigate { kind, route }).await {
            tracing::warn!(error = %e, route = %route, "Navigation dropped (receiver closed)");
        }
    }
}

#[async_trait]
impl Navigator for ChannelNavigator {
    async fn replace(&self, route: Route) {
        self.send(NavKind::Replace, route).await;
    }

    async fn push(&self, route: Route) {
        self.send(NavKind::Push, route).await;
    }
}

// ============================================================================
// App State
// ============================================================================

pub struct App {
    pub identity: Arc<dyn IdentityService>,
    pub fetcher: CategoryFetcher,
    pub row_descriptors: Vec<CategoryDescriptor>,
    pub image_base_url: String,

    pub view: View,
    pub tab: Tab,
    /// Routes to return to on back; cleared by replace navigation.
    pub history: Vec<Route>,

    /// Home rows, mounted while `view == Main`.
    pub rows: Vec<CategoryRow>,
    pub selected_row: usize,
    /// Highlighted item per row.
    pub selected_items: Vec<usize>,

    pub login_form: Form,
    pub signup_form: Form,
    pub sign_out_pending: bool,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub spinner_frame: usize,
    /// Only render when state has changed.
    pub needs_redraw: bool,
}

impl App {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        fetcher: CategoryFetcher,
        row_descriptors: Vec<CategoryDescriptor>,
        image_base_url: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            fetcher,
            row_descriptors,
            image_base_url: image_base_url.into(),
            view: View::Splash,
            tab: Tab::Home,
            history: Vec::new(),
            rows: Vec::new(),
            selected_row: 0,
            selected_items: Vec::new(),
            login_form: Form::login(),
            signup_form: Form::signup(),
            sign_out_pending: false,
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
        }
    }

    /// Applies a route change.
    ///
    /// `Replace` drops history; `Push` records the current route so
    /// [`App::go_back`] can return to it.
    pub fn navigate(&mut self, kind: NavKind, route: Route) {
        tracing::debug!(?kind, route = %route, from = ?self.view, "Navigating");
        match kind {
            NavKind::Replace => self.history.clear(),
            NavKind::Push => {
                if let Some(current) = self.view.route() {
                    self.history.push(current);
                }
            }
        }
        self.enter_view(View::from(route));
    }

    /// Pops one history entry. Returns false when there is nothing to go
    /// back to.
    pub fn go_back(&mut self) -> bool {
        match self.history.pop() {
            Some(route) => {
                self.enter_view(View::from(route));
                true
            }
            None => false,
        }
    }

    fn enter_view(&mut self, view: View) {
        if view == self.view {
            return;
        }
        if self.view == View::Main {
            self.unmount_rows();
        }
        match view {
            View::Main => {
                self.tab = Tab::Home;
                self.login_form = Form::login();
                self.signup_form = Form::signup();
                self.mount_rows();
            }
            View::Login => self.login_form.error = None,
            View::Signup => self.signup_form.error = None,
            View::Splash => {}
        }
        self.view = view;
        self.needs_redraw = true;
    }

    /// Mounts one row per descriptor, each starting its own fetch.
    pub fn mount_rows(&mut self) {
        self.unmount_rows();
        self.rows = self
            .row_descriptors
            .iter()
            .cloned()
            .map(|d| CategoryRow::mount(self.fetcher.clone(), d))
            .collect();
        self.selected_items = vec![0; self.rows.len()];
        self.selected_row = 0;
        tracing::debug!(rows = self.rows.len(), "Home rows mounted");
    }

    pub fn unmount_rows(&mut self) {
        for row in self.rows.drain(..) {
            row.teardown();
        }
        self.selected_items.clear();
        self.selected_row = 0;
    }

    /// Form backing the current view, if any.
    pub fn active_form(&mut self) -> Option<&mut Form> {
        match self.view {
            View::Login => Some(&mut self.login_form),
            View::Signup => Some(&mut self.signup_form),
            _ => None,
        }
    }

    pub fn any_row_loading(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.state().phase() == RowPhase::Loading)
    }

    /// Polls every row for state changes. Returns true if any changed.
    pub fn poll_rows(&mut self) -> bool {
        let mut changed = false;
        for (i, row) in self.rows.iter_mut().enumerate() {
            if row.take_changed() {
                changed = true;
                let len = row.state().items().len();
                if let Some(sel) = self.selected_items.get_mut(i) {
                    *sel = (*sel).min(len.saturating_sub(1));
                }
            }
        }
        changed
    }

    pub fn row_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn row_down(&mut self) {
        if self.selected_row + 1 < self.rows.len() {
            self.selected_row += 1;
        }
    }

    pub fn item_left(&mut self) {
        if let Some(sel) = self.selected_items.get_mut(self.selected_row) {
            *sel = sel.saturating_sub(1);
        }
    }

    pub fn item_right(&mut self) {
        let len = self
            .rows
            .get(self.selected_row)
            .map(|row| row.state().items().len())
            .unwrap_or(0);
        if let Some(sel) = self.selected_items.get_mut(self.selected_row) {
            if *sel + 1 < len {
                *sel += 1;
            }
        }
    }

    /// The highlighted item on the selected row.
    pub fn selected_item(&self) -> Option<ListItem> {
        let row = self.rows.get(self.selected_row)?;
        let index = *self.selected_items.get(self.selected_row)?;
        let state = row.state();
        state.items().get(index).cloned()
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.unmount_rows();
    }
}
