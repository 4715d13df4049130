//! Navigation controller: current screen, params, menu overlay and the
//! lifetime scope of the mounted screen.

use crate::session::Session;
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;
use tracing::debug;

/// Every navigable screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    Welcome,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    Dashboard,
    Balance,
    Transfer,
    Profile,
    Transactions,
    Loans,
    Cards,
    Bills,
    Admin,
    CardDetails,
    CardTransactions,
    CreateCard,
    SelectBillCategory,
    SelectBiller,
    PaymentMethod,
}

impl ScreenKind {
    /// Screens reachable without a session.
    pub const PUBLIC: [ScreenKind; 5] = [
        ScreenKind::Welcome,
        ScreenKind::Login,
        ScreenKind::Register,
        ScreenKind::ForgotPassword,
        ScreenKind::ResetPassword,
    ];

    pub fn is_public(self) -> bool {
        Self::PUBLIC.contains(&self)
    }

    pub fn title(self) -> &'static str {
        match self {
            ScreenKind::Welcome => "Welcome",
            ScreenKind::Login => "Login",
            ScreenKind::Register => "Register",
            ScreenKind::ForgotPassword => "Forgot Password",
            ScreenKind::ResetPassword => "Reset Password",
            ScreenKind::Dashboard => "Dashboard",
            ScreenKind::Balance => "Check Balance",
            ScreenKind::Transfer => "Money Transfer",
            ScreenKind::Profile => "Profile",
            ScreenKind::Transactions => "Transaction History",
            ScreenKind::Loans => "Loans",
            ScreenKind::Cards => "Virtual Cards",
            ScreenKind::Bills => "Bill Payments",
            ScreenKind::Admin => "Admin Panel",
            ScreenKind::CardDetails => "Card Details",
            ScreenKind::CardTransactions => "Card Transactions",
            ScreenKind::CreateCard => "Create Card",
            ScreenKind::SelectBillCategory => "Select Category",
            ScreenKind::SelectBiller => "Select Biller",
            ScreenKind::PaymentMethod => "Payment",
        }
    }
}

/// Direction filter for the transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxFilter {
    Sent,
    Received,
}

/// Parameters handed to a screen when it is mounted.
///
/// Replaced as a whole on every navigation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScreenParams {
    #[default]
    None,
    Transfer {
        prefill_recipient: Option<String>,
        prefill_amount: Option<f64>,
    },
    Transactions {
        filter: Option<TxFilter>,
    },
    CardDetails {
        card_id: u64,
    },
    CardTransactions {
        card_id: u64,
    },
    SelectBiller {
        category_id: u64,
    },
    PaymentMethod {
        category_id: u64,
        biller_id: u64,
        amount: f64,
    },
}

/// Lifetime of one mounted screen.
///
/// Tasks spawned by the screen register here and are aborted when the
/// scope closes. Results carry the scope id so stale ones can be dropped.
#[derive(Debug, Clone)]
pub struct ScreenScope {
    id: u64,
    handles: Arc<Mutex<Vec<AbortHandle>>>,
}

impl ScreenScope {
    fn new(id: u64) -> Self {
        Self {
            id,
            handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn track(&self, handle: AbortHandle) {
        if let Ok(mut handles) = self.handles.lock() {
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }
    }

    /// Number of tracked tasks still running.
    pub fn in_flight(&self) -> usize {
        self.handles
            .lock()
            .map(|h| h.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    fn close(&self) {
        if let Ok(mut handles) = self.handles.lock() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }
    }
}

/// Target of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    Screen(ScreenKind),
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub target: MenuTarget,
}

const MENU: [MenuItem; 7] = [
    MenuItem { label: "Profile", target: MenuTarget::Screen(ScreenKind::Profile) },
    MenuItem { label: "Money Transfer", target: MenuTarget::Screen(ScreenKind::Transfer) },
    MenuItem { label: "Loans", target: MenuTarget::Screen(ScreenKind::Loans) },
    MenuItem { label: "Transaction History", target: MenuTarget::Screen(ScreenKind::Transactions) },
    MenuItem { label: "Virtual Cards", target: MenuTarget::Screen(ScreenKind::Cards) },
    MenuItem { label: "Bill Payments", target: MenuTarget::Screen(ScreenKind::Bills) },
    MenuItem { label: "Check Balance", target: MenuTarget::Screen(ScreenKind::Balance) },
];

/// Owns the screen state. Gating is applied on read, see [`Navigator::resolve`].
pub struct Navigator {
    current: ScreenKind,
    params: ScreenParams,
    menu_open: bool,
    menu_cursor: usize,
    scope: ScreenScope,
    next_scope_id: u64,
}

impl Navigator {
    /// Start on the dashboard when a session was restored, else on Welcome.
    pub fn new(authenticated: bool) -> Self {
        let current = if authenticated {
            ScreenKind::Dashboard
        } else {
            ScreenKind::Welcome
        };
        Self {
            current,
            params: ScreenParams::None,
            menu_open: false,
            menu_cursor: 0,
            scope: ScreenScope::new(1),
            next_scope_id: 2,
        }
    }

    pub fn current(&self) -> ScreenKind {
        self.current
    }

    pub fn params(&self) -> &ScreenParams {
        &self.params
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    /// Switch screens. Closes the menu and the previous screen's scope.
    pub fn navigate(&mut self, screen: ScreenKind, params: ScreenParams) {
        debug!(from = ?self.current, to = ?screen, "Navigate");
        self.current = screen;
        self.params = params;
        self.menu_open = false;
        self.reopen_scope();
    }

    /// Abort everything in flight for the mounted screen and start a fresh scope.
    pub fn reopen_scope(&mut self) {
        self.scope.close();
        self.scope = ScreenScope::new(self.next_scope_id);
        self.next_scope_id += 1;
    }

    /// Fixed jump: private screens go to the dashboard, public ones to Welcome.
    pub fn go_back(&mut self) {
        let target = if self.current.is_public() {
            ScreenKind::Welcome
        } else {
            ScreenKind::Dashboard
        };
        if target != self.current {
            self.navigate(target, ScreenParams::None);
        }
    }

    /// The screen to actually show for the stored one and the live session.
    pub fn resolve(&self, session: Option<&Session>) -> ScreenKind {
        resolve(self.current, session)
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn open_menu(&mut self) {
        self.menu_open = true;
        self.menu_cursor = 0;
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }

    pub fn toggle_menu(&mut self) {
        if self.menu_open {
            self.close_menu();
        } else {
            self.open_menu();
        }
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    pub fn menu_up(&mut self) {
        self.menu_cursor = self.menu_cursor.saturating_sub(1);
    }

    pub fn menu_down(&mut self, len: usize) {
        if self.menu_cursor + 1 < len {
            self.menu_cursor += 1;
        }
    }
}

/// Gating projection. Never mutates navigation state.
pub fn resolve(current: ScreenKind, session: Option<&Session>) -> ScreenKind {
    match session {
        None if !current.is_public() => ScreenKind::Welcome,
        Some(s) if current == ScreenKind::Admin && !s.is_admin => ScreenKind::Dashboard,
        _ => current,
    }
}

/// Menu entries for the current user.
pub fn menu_items(is_admin: bool) -> Vec<MenuItem> {
    let mut items = MENU.to_vec();
    if is_admin {
        items.push(MenuItem {
            label: "Admin Panel",
            target: MenuTarget::Screen(ScreenKind::Admin),
        });
    }
    items.push(MenuItem {
        label: "Logout",
        target: MenuTarget::Logout,
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(is_admin: bool) -> Session {
        Session {
            username: if is_admin { "admin" } else { "alice" }.into(),
            account_number: "1001".into(),
            is_admin,
            token: "t".into(),
        }
    }

    #[test]
    fn test_initial_screen() {
        assert_eq!(Navigator::new(true).current(), ScreenKind::Dashboard);
        assert_eq!(Navigator::new(false).current(), ScreenKind::Welcome);
    }

    #[test]
    fn test_admin_gated_on_live_session() {
        let mut nav = Navigator::new(true);
        nav.navigate(ScreenKind::Admin, ScreenParams::None);

        assert_eq!(nav.resolve(Some(&session(false))), ScreenKind::Dashboard);
        assert_eq!(nav.resolve(Some(&session(true))), ScreenKind::Admin);
        // projection leaves the stored screen alone
        assert_eq!(nav.current(), ScreenKind::Admin);
    }

    #[test]
    fn test_private_screens_need_session() {
        let mut nav = Navigator::new(false);
        nav.navigate(ScreenKind::Transfer, ScreenParams::None);
        assert_eq!(nav.resolve(None), ScreenKind::Welcome);

        for kind in ScreenKind::PUBLIC {
            assert_eq!(resolve(kind, None), kind);
        }
        assert_eq!(resolve(ScreenKind::Admin, None), ScreenKind::Welcome);
    }

    #[test]
    fn test_navigate_closes_menu_and_replaces_params() {
        let mut nav = Navigator::new(true);
        nav.navigate(
            ScreenKind::Transfer,
            ScreenParams::Transfer {
                prefill_recipient: Some("2002".into()),
                prefill_amount: Some(5.0),
            },
        );
        nav.open_menu();
        assert!(nav.menu_open());

        nav.navigate(ScreenKind::Transfer, ScreenParams::None);
        assert!(!nav.menu_open());
        assert_eq!(nav.params(), &ScreenParams::None);
    }

    #[test]
    fn test_go_back_jumps_to_dashboard() {
        let mut nav = Navigator::new(true);
        nav.navigate(ScreenKind::CardDetails, ScreenParams::CardDetails { card_id: 4 });
        nav.go_back();
        assert_eq!(nav.current(), ScreenKind::Dashboard);
        assert_eq!(nav.params(), &ScreenParams::None);

        let mut nav = Navigator::new(false);
        nav.navigate(ScreenKind::ForgotPassword, ScreenParams::None);
        nav.go_back();
        assert_eq!(nav.current(), ScreenKind::Welcome);
    }

    #[test]
    fn test_scope_ids_advance() {
        let mut nav = Navigator::new(true);
        let first = nav.scope().id();
        nav.navigate(ScreenKind::Balance, ScreenParams::None);
        let second = nav.scope().id();
        nav.go_back();
        assert!(second > first);
        assert!(nav.scope().id() > second);
    }

    #[tokio::test]
    async fn test_navigate_aborts_in_flight_tasks() {
        let mut nav = Navigator::new(true);
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });
        nav.scope().track(task.abort_handle());
        assert_eq!(nav.scope().in_flight(), 1);

        nav.navigate(ScreenKind::Cards, ScreenParams::None);
        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_menu_items() {
        let labels = |items: Vec<MenuItem>| items.iter().map(|i| i.label).collect::<Vec<_>>();
        let user = labels(menu_items(false));
        assert_eq!(user.len(), 8);
        assert!(!user.contains(&"Admin Panel"));
        assert_eq!(user.last(), Some(&"Logout"));

        let admin = labels(menu_items(true));
        assert!(admin.contains(&"Admin Panel"));
        assert_eq!(admin.last(), Some(&"Logout"));
    }

    #[test]
    fn test_menu_cursor_bounds() {
        let mut nav = Navigator::new(true);
        nav.open_menu();
        nav.menu_up();
        assert_eq!(nav.menu_cursor(), 0);
        for _ in 0..20 {
            nav.menu_down(8);
        }
        assert_eq!(nav.menu_cursor(), 7);
    }
}
