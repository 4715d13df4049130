//! Screen modules for the TUI.

pub mod admin;
pub mod auth;
pub mod balance;
pub mod bills;
pub mod cards;
pub mod dashboard;
pub mod loans;
pub mod payment;
pub mod profile;
pub mod transactions;
pub mod transfer;
pub mod widgets;

use crate::{
    app::AppMessage,
    client::{ApiClient, ApiResponse, CallError, Endpoint},
    dialog::Dialog,
    models::{
        AdminUser, BillCategory, BillPayment, Biller, CardTransaction, PendingLoan, Transaction,
        VirtualCard,
    },
    navigation::{ScreenKind, ScreenParams, ScreenScope},
    session::Session,
};
use crossterm::event::KeyCode;
use ratatui::{layout::Rect, Frame};
use serde::de::DeserializeOwned;
use std::future::Future;
use tokio::sync::mpsc;

/// Trait for TUI screens.
pub trait Screen {
    fn kind(&self) -> ScreenKind;

    /// Called once after the screen is mounted. Data screens start their fetches here.
    fn mount(&mut self, _ctx: &ScreenContext) {}

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction;

    /// A result from a task this screen spawned.
    fn handle_event(&mut self, _event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        ScreenAction::None
    }

    /// A confirmed dialog asked this screen to act.
    fn handle_command(&mut self, _command: Command, _ctx: &ScreenContext) -> ScreenAction {
        ScreenAction::None
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &ScreenContext);

    /// True while printable keys go into a text field.
    fn captures_text(&self) -> bool {
        false
    }
}

/// Action returned from screen handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    None,
    Navigate(ScreenKind, ScreenParams),
    Back,
    Login { username: String, password: String },
    Register { username: String, password: String },
    Logout,
    Dialog(Dialog),
    Command(Command),
}

/// Deferred screen operations, run after a confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    DeleteAccount(u64),
    ApproveLoan(u64),
}

/// Which mutation a submit result belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    RequestReset,
    ConfirmReset,
    Transfer,
    RequestLoan { amount: f64 },
    CreateCard,
    ToggleFreeze { card_id: u64 },
    PayBill,
    DeleteAccount { user_id: u64 },
    ApproveLoan { loan_id: u64 },
    CreateAdmin,
}

/// Results delivered back to the screen that asked for them.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    Balance(Result<f64, CallError>),
    Transactions(Result<Vec<Transaction>, CallError>),
    Cards(Result<Vec<VirtualCard>, CallError>),
    CardTransactions(Result<Vec<CardTransaction>, CallError>),
    BillCategories(Result<Vec<BillCategory>, CallError>),
    Billers(Result<Vec<Biller>, CallError>),
    BillHistory(Result<Vec<BillPayment>, CallError>),
    AdminUsers(Result<Vec<AdminUser>, CallError>),
    PendingLoans(Result<Vec<PendingLoan>, CallError>),
    Submitted(Submission, Result<ApiResponse, CallError>),
}

/// What a screen gets to see of the app: owned snapshots plus a way to
/// spawn work inside its own scope.
#[derive(Clone)]
pub struct ScreenContext {
    pub client: ApiClient,
    pub session: Option<Session>,
    pub auth_loading: bool,
    scope: ScreenScope,
    tx: mpsc::Sender<AppMessage>,
}

impl ScreenContext {
    pub fn new(
        client: ApiClient,
        session: Option<Session>,
        auth_loading: bool,
        scope: ScreenScope,
        tx: mpsc::Sender<AppMessage>,
    ) -> Self {
        Self {
            client,
            session,
            auth_loading,
            scope,
            tx,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn account_number(&self) -> &str {
        self.session
            .as_ref()
            .map(|s| s.account_number.as_str())
            .unwrap_or("")
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_admin)
    }

    /// Run `task` in the background. Its result is routed back to this
    /// screen unless the screen has been left by then.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ScreenEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        let scope = self.scope.id();
        let handle = tokio::spawn(async move {
            let event = task.await;
            let _ = tx.send(AppMessage::Screen { scope, event }).await;
        });
        self.scope.track(handle.abort_handle());
    }

    /// GET `endpoint` and hand `field` of the body to `wrap`.
    pub fn fetch<T, W>(
        &self,
        endpoint: Endpoint,
        authorized: bool,
        field: &'static str,
        fallback: &'static str,
        wrap: W,
    ) where
        T: DeserializeOwned + Send + 'static,
        W: FnOnce(Result<T, CallError>) -> ScreenEvent + Send + 'static,
    {
        let client = self.client.clone();
        let token = if authorized {
            self.token().map(str::to_string)
        } else {
            None
        };
        self.spawn(async move {
            wrap(
                client
                    .fetch_field(&endpoint, token.as_deref(), field, fallback)
                    .await,
            )
        });
    }

    /// POST `body` to `endpoint` with the session token, if any.
    pub fn submit(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
        submission: Submission,
        fallback: &'static str,
    ) {
        let client = self.client.clone();
        let token = self.token().map(str::to_string);
        self.spawn(async move {
            let result = client
                .submit(&endpoint, &body, token.as_deref(), fallback)
                .await;
            ScreenEvent::Submitted(submission, result)
        });
    }
}

/// Build the screen for `kind`. Params that don't belong to the screen are ignored.
pub fn build(kind: ScreenKind, params: &ScreenParams) -> Box<dyn Screen> {
    match kind {
        ScreenKind::Welcome => Box::new(auth::WelcomeScreen::new()),
        ScreenKind::Login => Box::new(auth::LoginScreen::new()),
        ScreenKind::Register => Box::new(auth::RegisterScreen::new()),
        ScreenKind::ForgotPassword => Box::new(auth::ForgotPasswordScreen::new()),
        ScreenKind::ResetPassword => Box::new(auth::ResetPasswordScreen::new()),
        ScreenKind::Dashboard => Box::new(dashboard::DashboardScreen::new()),
        ScreenKind::Balance => Box::new(balance::BalanceScreen::new()),
        ScreenKind::Transfer => {
            let (recipient, amount) = match params {
                ScreenParams::Transfer {
                    prefill_recipient,
                    prefill_amount,
                } => (prefill_recipient.clone(), *prefill_amount),
                _ => (None, None),
            };
            Box::new(transfer::TransferScreen::new(recipient, amount))
        }
        ScreenKind::Profile => Box::new(profile::ProfileScreen::new()),
        ScreenKind::Transactions => {
            let filter = match params {
                ScreenParams::Transactions { filter } => *filter,
                _ => None,
            };
            Box::new(transactions::TransactionsScreen::new(filter))
        }
        ScreenKind::Loans => Box::new(loans::LoansScreen::new()),
        ScreenKind::Cards => Box::new(cards::CardsScreen::new()),
        ScreenKind::CardDetails => {
            let card_id = match params {
                ScreenParams::CardDetails { card_id } => Some(*card_id),
                _ => None,
            };
            Box::new(cards::CardDetailsScreen::new(card_id))
        }
        ScreenKind::CardTransactions => {
            let card_id = match params {
                ScreenParams::CardTransactions { card_id } => Some(*card_id),
                _ => None,
            };
            Box::new(cards::CardTransactionsScreen::new(card_id))
        }
        ScreenKind::CreateCard => Box::new(cards::CreateCardScreen::new()),
        ScreenKind::Bills => Box::new(bills::BillsScreen::new()),
        ScreenKind::SelectBillCategory => Box::new(bills::SelectCategoryScreen::new()),
        ScreenKind::SelectBiller => {
            let category_id = match params {
                ScreenParams::SelectBiller { category_id } => Some(*category_id),
                _ => None,
            };
            Box::new(bills::SelectBillerScreen::new(category_id))
        }
        ScreenKind::PaymentMethod => {
            let target = match params {
                ScreenParams::PaymentMethod {
                    category_id,
                    biller_id,
                    amount,
                } => Some((*category_id, *biller_id, *amount)),
                _ => None,
            };
            Box::new(payment::PaymentScreen::new(target))
        }
        ScreenKind::Admin => Box::new(admin::AdminScreen::new()),
    }
}

#[cfg(test)]
pub(crate) mod test_context {
    use super::*;
    use crate::navigation::Navigator;

    /// A context with a live channel, for driving screens directly.
    pub fn context(
        url: &str,
        session: Option<Session>,
    ) -> (ScreenContext, mpsc::Receiver<AppMessage>, Navigator) {
        let (tx, rx) = mpsc::channel(16);
        let nav = Navigator::new(session.is_some());
        let ctx = ScreenContext::new(
            ApiClient::new(url),
            session,
            false,
            nav.scope().clone(),
            tx,
        );
        (ctx, rx, nav)
    }

    pub fn user(is_admin: bool) -> Session {
        Session {
            username: if is_admin { "admin" } else { "alice" }.into(),
            account_number: "1001".into(),
            is_admin,
            token: "tok".into(),
        }
    }

    /// Wait for the next screen event.
    pub async fn next_event(rx: &mut mpsc::Receiver<AppMessage>) -> ScreenEvent {
        loop {
            match rx.recv().await {
                Some(AppMessage::Screen { event, .. }) => return event,
                Some(_) => continue,
                None => panic!("channel closed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_context::{context, next_event, user};
    use super::*;
    use crate::test_support::{MockResponse, MockServer};
    use serde_json::json;

    #[test]
    fn test_build_matches_kind() {
        let kinds = [
            ScreenKind::Welcome,
            ScreenKind::Login,
            ScreenKind::Register,
            ScreenKind::ForgotPassword,
            ScreenKind::ResetPassword,
            ScreenKind::Dashboard,
            ScreenKind::Balance,
            ScreenKind::Transfer,
            ScreenKind::Profile,
            ScreenKind::Transactions,
            ScreenKind::Loans,
            ScreenKind::Cards,
            ScreenKind::Bills,
            ScreenKind::Admin,
            ScreenKind::CardDetails,
            ScreenKind::CardTransactions,
            ScreenKind::CreateCard,
            ScreenKind::SelectBillCategory,
            ScreenKind::SelectBiller,
            ScreenKind::PaymentMethod,
        ];
        for kind in kinds {
            assert_eq!(build(kind, &ScreenParams::None).kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_spawned_results_carry_scope() {
        let server = MockServer::start(vec![MockResponse::json(
            "GET",
            "/check_balance/1001",
            200,
            json!({"balance": 12.5}),
        )])
        .await;
        let (ctx, mut rx, nav) = context(&server.url(), Some(user(false)));

        ctx.fetch(
            Endpoint::CheckBalance("1001".into()),
            true,
            "balance",
            "Failed to fetch balance",
            ScreenEvent::Balance,
        );
        match rx.recv().await {
            Some(AppMessage::Screen { scope, event }) => {
                assert_eq!(scope, nav.scope().id());
                assert_eq!(event, ScreenEvent::Balance(Ok(12.5)));
            }
            other => panic!("unexpected message: {other:?}"),
        }
        let req = &server.requests_to("/check_balance/1001")[0];
        assert_eq!(req.header("authorization").as_deref(), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn test_unauthorized_fetch_sends_no_token() {
        let server = MockServer::start(vec![MockResponse::json(
            "GET",
            "/api/bill-categories",
            200,
            json!({"categories": []}),
        )])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        ctx.fetch(
            Endpoint::BillCategories,
            false,
            "categories",
            "Failed to load categories",
            ScreenEvent::BillCategories,
        );
        assert_eq!(next_event(&mut rx).await, ScreenEvent::BillCategories(Ok(vec![])));
        assert_eq!(server.requests()[0].header("authorization"), None);
    }
}
