//! Admin panel: user management, pending loans and admin creation.

use crate::{
    client::{CallError, Endpoint},
    dialog::Dialog,
    models::{format_money, AdminUser, PendingLoan},
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{boxed, empty, footer, marker, move_cursor, placeholder, title_bar, Form, FormInput, Remote, TextInput},
        Command, Screen, ScreenAction, ScreenContext, ScreenEvent, Submission,
    },
    validate,
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Users,
    Loans,
    CreateAdmin,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Users => Pane::Loans,
            Pane::Loans => Pane::CreateAdmin,
            Pane::CreateAdmin => Pane::Users,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Users => Pane::CreateAdmin,
            Pane::Loans => Pane::Users,
            Pane::CreateAdmin => Pane::Loans,
        }
    }
}

pub struct AdminScreen {
    pane: Pane,
    users: Remote<Vec<AdminUser>>,
    loans: Remote<Vec<PendingLoan>>,
    user_cursor: usize,
    loan_cursor: usize,
    form: Form,
    creating: bool,
    authorized: bool,
}

impl AdminScreen {
    pub fn new() -> Self {
        Self {
            pane: Pane::Users,
            users: Remote::Loading,
            loans: Remote::Loading,
            user_cursor: 0,
            loan_cursor: 0,
            form: Form::new(vec![TextInput::new("Username"), TextInput::masked("Password")]),
            creating: false,
            authorized: true,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        self.users = Remote::Loading;
        self.loans = Remote::Loading;
        ctx.fetch(
            Endpoint::AdminUsers,
            true,
            "users",
            "Failed to fetch users",
            ScreenEvent::AdminUsers,
        );
        ctx.fetch(
            Endpoint::AdminPendingLoans,
            true,
            "loans",
            "Failed to fetch pending loans",
            ScreenEvent::PendingLoans,
        );
    }

    fn confirm_delete(&self) -> ScreenAction {
        match self.users.ready().and_then(|u| u.get(self.user_cursor)) {
            Some(user) => ScreenAction::Dialog(Dialog::confirm(
                "Confirm Deletion",
                "Are you sure you want to delete this account? This action cannot be undone.",
                "Delete",
                ScreenAction::Command(Command::DeleteAccount(user.id)),
            )),
            None => ScreenAction::None,
        }
    }

    fn confirm_approve(&self) -> ScreenAction {
        match self.loans.ready().and_then(|l| l.get(self.loan_cursor)) {
            Some(loan) => ScreenAction::Dialog(Dialog::confirm(
                "Confirm Approval",
                "Are you sure you want to approve this loan request?",
                "Approve",
                ScreenAction::Command(Command::ApproveLoan(loan.id)),
            )),
            None => ScreenAction::None,
        }
    }

    fn create_admin(&mut self, ctx: &ScreenContext) -> ScreenAction {
        let username = self.form.value(0).trim().to_string();
        let password = self.form.value(1).to_string();
        if let Err(e) = validate::require_all(&[&username, &password], "Please fill in all fields") {
            return ScreenAction::Dialog(Dialog::error("Error", e.to_string()));
        }
        self.creating = true;
        ctx.submit(
            Endpoint::AdminCreateAdmin,
            json!({ "username": username, "password": password }),
            Submission::CreateAdmin,
            "Failed to create admin account",
        );
        ScreenAction::None
    }
}

impl Screen for AdminScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Admin
    }

    fn mount(&mut self, ctx: &ScreenContext) {
        self.authorized = ctx.is_admin();
        if self.authorized {
            self.fetch(ctx);
        }
    }

    fn captures_text(&self) -> bool {
        self.pane == Pane::CreateAdmin
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if !self.authorized {
            return match key {
                KeyCode::Enter => ScreenAction::Navigate(ScreenKind::Dashboard, ScreenParams::None),
                _ => ScreenAction::None,
            };
        }
        match key {
            KeyCode::Right => {
                self.pane = self.pane.next();
                return ScreenAction::None;
            }
            KeyCode::Left => {
                self.pane = self.pane.prev();
                return ScreenAction::None;
            }
            _ => {}
        }
        match self.pane {
            Pane::CreateAdmin => {
                if self.creating {
                    return ScreenAction::None;
                }
                match self.form.handle_key(key) {
                    FormInput::Submit => self.create_admin(ctx),
                    _ => ScreenAction::None,
                }
            }
            Pane::Users => match key {
                KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => self.confirm_delete(),
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    self.fetch(ctx);
                    ScreenAction::None
                }
                _ => {
                    let len = self.users.ready().map(Vec::len).unwrap_or(0);
                    self.user_cursor = move_cursor(self.user_cursor, len, key);
                    ScreenAction::None
                }
            },
            Pane::Loans => match key {
                KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Enter => self.confirm_approve(),
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    self.fetch(ctx);
                    ScreenAction::None
                }
                _ => {
                    let len = self.loans.ready().map(Vec::len).unwrap_or(0);
                    self.loan_cursor = move_cursor(self.loan_cursor, len, key);
                    ScreenAction::None
                }
            },
        }
    }

    fn handle_command(&mut self, command: Command, ctx: &ScreenContext) -> ScreenAction {
        match command {
            Command::DeleteAccount(user_id) => ctx.submit(
                Endpoint::AdminDeleteAccount(user_id),
                json!({}),
                Submission::DeleteAccount { user_id },
                "Failed to delete account",
            ),
            Command::ApproveLoan(loan_id) => ctx.submit(
                Endpoint::AdminApproveLoan(loan_id),
                json!({}),
                Submission::ApproveLoan { loan_id },
                "Failed to approve loan",
            ),
        }
        ScreenAction::None
    }

    fn handle_event(&mut self, event: ScreenEvent, ctx: &ScreenContext) -> ScreenAction {
        let failed = |e: CallError| ScreenAction::Dialog(Dialog::error("Error", e.to_string()));
        match event {
            ScreenEvent::AdminUsers(result) => {
                self.users = Remote::from_result(result);
                self.user_cursor = 0;
                ScreenAction::None
            }
            ScreenEvent::PendingLoans(result) => {
                self.loans = Remote::from_result(result);
                self.loan_cursor = 0;
                ScreenAction::None
            }
            ScreenEvent::Submitted(Submission::DeleteAccount { user_id }, result) => match result {
                Ok(_) => {
                    info!(user_id, "Account deleted");
                    if let Some(users) = self.users.ready_mut() {
                        users.retain(|u| u.id != user_id);
                        self.user_cursor = self.user_cursor.min(users.len().saturating_sub(1));
                    }
                    ScreenAction::Dialog(Dialog::info("Success", "Account deleted successfully"))
                }
                Err(e) => failed(e),
            },
            ScreenEvent::Submitted(Submission::ApproveLoan { loan_id }, result) => match result {
                Ok(_) => {
                    info!(loan_id, "Loan approved");
                    if let Some(loans) = self.loans.ready_mut() {
                        loans.retain(|l| l.id != loan_id);
                        self.loan_cursor = self.loan_cursor.min(loans.len().saturating_sub(1));
                    }
                    ScreenAction::Dialog(Dialog::info("Success", "Loan approved successfully"))
                }
                Err(e) => failed(e),
            },
            ScreenEvent::Submitted(Submission::CreateAdmin, result) => {
                self.creating = false;
                match result {
                    Ok(_) => {
                        self.form.clear();
                        self.fetch(ctx);
                        ScreenAction::Dialog(Dialog::info("Success", "Admin account created successfully"))
                    }
                    Err(e) => failed(e),
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),                  // Title bar
                Constraint::Min(6),                     // Users
                Constraint::Length(8),                  // Pending loans
                Constraint::Length(self.form.height()), // Create admin
                Constraint::Length(2),                  // Footer
            ])
            .split(area);

        let loading = self.users.is_loading() || self.loans.is_loading() || self.creating;
        let status = (self.authorized && loading).then_some(("Loading...", Color::Yellow));
        title_bar(frame, chunks[0], "Admin Panel", status);

        if !self.authorized {
            let message = Paragraph::new(vec![
                Line::from(Span::styled(
                    "You do not have administrative privileges",
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from(Span::styled("[Enter] Go to Dashboard", Style::default().fg(Color::DarkGray))),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(message, chunks[1]);
            return;
        }

        let pane_title = |title: &str, pane: Pane| {
            if self.pane == pane {
                format!("▶ {}", title)
            } else {
                title.to_string()
            }
        };

        let users_title = pane_title("User Management", Pane::Users);
        match &self.users {
            Remote::Ready(users) if users.is_empty() => empty(frame, chunks[1], &users_title, "No users found"),
            Remote::Ready(users) => {
                let items: Vec<ListItem> = users
                    .iter()
                    .enumerate()
                    .map(|(i, u)| {
                        let mut spans = vec![
                            marker(self.pane == Pane::Users && i == self.user_cursor),
                            Span::styled(
                                format!("{:<16}", u.username),
                                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!("Account: {:<12} Balance: {}", u.account_number, format_money(u.balance)),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ];
                        if u.is_admin {
                            spans.push(Span::styled("  (Admin)", Style::default().fg(Color::Yellow)));
                        }
                        ListItem::new(Line::from(spans))
                    })
                    .collect();
                frame.render_widget(List::new(items).block(boxed(&users_title)), chunks[1]);
            }
            other => placeholder(frame, chunks[1], &users_title, other),
        }

        let loans_title = pane_title("Pending Loans", Pane::Loans);
        match &self.loans {
            Remote::Ready(loans) if loans.is_empty() => empty(frame, chunks[2], &loans_title, "No pending loans"),
            Remote::Ready(loans) => {
                let items: Vec<ListItem> = loans
                    .iter()
                    .enumerate()
                    .map(|(i, l)| {
                        ListItem::new(Line::from(vec![
                            marker(self.pane == Pane::Loans && i == self.loan_cursor),
                            Span::styled(format!("Loan #{:<6}", l.id), Style::default().fg(Color::White)),
                            Span::styled(format!("User ID: {:<6}", l.user_id), Style::default().fg(Color::DarkGray)),
                            Span::styled(
                                format!("Amount: {}", format_money(l.amount)),
                                Style::default().fg(Color::Green),
                            ),
                        ]))
                    })
                    .collect();
                frame.render_widget(List::new(items).block(boxed(&loans_title)), chunks[2]);
            }
            other => placeholder(frame, chunks[2], &loans_title, other),
        }

        self.form.render(frame, chunks[3], self.pane == Pane::CreateAdmin && !self.creating);

        let keys: &[(&str, &str)] = match self.pane {
            Pane::Users => &[("←→", "Section"), ("D", "Delete"), ("R", "Refresh"), ("Esc", "Back")],
            Pane::Loans => &[("←→", "Section"), ("A", "Approve"), ("R", "Refresh"), ("Esc", "Back")],
            Pane::CreateAdmin => &[("←→", "Section"), ("Tab", "Next field"), ("Enter", "Create Admin")],
        };
        let error = match (&self.users, &self.loans) {
            (Remote::Failed(e), _) | (_, Remote::Failed(e)) => Some(e.as_str()),
            _ => None,
        };
        footer(frame, chunks[4], keys, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogInput;
    use crate::screens::test_context::{context, next_event, user};
    use crate::test_support::{MockResponse, MockServer};
    use pretty_assertions::assert_eq;

    fn admin_routes() -> Vec<MockResponse> {
        vec![
            MockResponse::json(
                "GET",
                "/admin/users",
                200,
                json!({"users": [
                    {"id": 1, "username": "alice", "account_number": 1001, "balance": "250.00", "is_admin": false},
                    {"id": 2, "username": "bob", "account_number": "1002", "balance": 10, "is_admin": false}
                ]}),
            ),
            MockResponse::json(
                "GET",
                "/admin/pending_loans",
                200,
                json!({"loans": [{"id": 7, "user_id": 1, "amount": 500, "status": "pending"}]}),
            ),
            MockResponse::json("POST", "/admin/delete_account/2", 200, json!({"message": "deleted"})),
            MockResponse::json("POST", "/admin/approve_loan/7", 200, json!({"message": "approved"})),
        ]
    }

    async fn loaded(server: &MockServer) -> (AdminScreen, ScreenContext, tokio::sync::mpsc::Receiver<crate::app::AppMessage>) {
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(true)));
        let mut screen = AdminScreen::new();
        screen.mount(&ctx);
        for _ in 0..2 {
            let event = next_event(&mut rx).await;
            screen.handle_event(event, &ctx);
        }
        (screen, ctx, rx)
    }

    #[tokio::test]
    async fn test_delete_after_confirmation_removes_user() {
        let server = MockServer::start(admin_routes()).await;
        let (mut screen, ctx, mut rx) = loaded(&server).await;
        assert_eq!(screen.users.ready().map(Vec::len), Some(2));

        screen.handle_key(KeyCode::Down, &ctx);
        let ScreenAction::Dialog(mut dialog) = screen.handle_key(KeyCode::Char('d'), &ctx) else {
            panic!("expected confirmation");
        };
        assert_eq!(dialog.title, "Confirm Deletion");
        let DialogInput::Closed(ScreenAction::Command(command)) = dialog.handle_key(KeyCode::Enter) else {
            panic!("expected command");
        };
        assert_eq!(command, Command::DeleteAccount(2));
        assert!(server.requests_to("/admin/delete_account/2").is_empty());

        screen.handle_command(command, &ctx);
        let event = next_event(&mut rx).await;
        let action = screen.handle_event(event, &ctx);
        assert!(matches!(action, ScreenAction::Dialog(d) if d.message == "Account deleted successfully"));
        let names: Vec<_> = screen.users.ready().unwrap().iter().map(|u| u.username.clone()).collect();
        assert_eq!(names, vec!["alice".to_string()]);
        assert_eq!(
            server.requests_to("/admin/delete_account/2")[0].body_json(),
            Some(json!({}))
        );
    }

    #[tokio::test]
    async fn test_approve_waits_for_confirmation() {
        let server = MockServer::start(admin_routes()).await;
        let (mut screen, ctx, mut rx) = loaded(&server).await;
        screen.handle_key(KeyCode::Right, &ctx);
        let ScreenAction::Dialog(mut dialog) = screen.handle_key(KeyCode::Char('a'), &ctx) else {
            panic!("expected confirmation");
        };
        assert_eq!(dialog.handle_key(KeyCode::Esc), DialogInput::Closed(ScreenAction::None));
        assert!(server.requests_to("/admin/approve_loan/7").is_empty());

        screen.handle_command(Command::ApproveLoan(7), &ctx);
        let event = next_event(&mut rx).await;
        screen.handle_event(event, &ctx);
        assert_eq!(screen.loans.ready().map(Vec::len), Some(0));
        assert_eq!(server.requests_to("/admin/approve_loan/7").len(), 1);
    }

    #[tokio::test]
    async fn test_create_admin_refetches() {
        let mut routes = admin_routes();
        routes.push(MockResponse::json("POST", "/admin/create_admin", 200, json!({"message": "created"})));
        let server = MockServer::start(routes).await;
        let (mut screen, ctx, mut rx) = loaded(&server).await;

        screen.handle_key(KeyCode::Left, &ctx);
        assert!(screen.captures_text());
        let action = screen.handle_key(KeyCode::Enter, &ctx);
        assert!(matches!(action, ScreenAction::Dialog(d) if d.message == "Please fill in all fields"));

        for c in "root".chars() {
            screen.handle_key(KeyCode::Char(c), &ctx);
        }
        screen.handle_key(KeyCode::Tab, &ctx);
        for c in "pw".chars() {
            screen.handle_key(KeyCode::Char(c), &ctx);
        }
        screen.handle_key(KeyCode::Enter, &ctx);
        let event = next_event(&mut rx).await;
        screen.handle_event(event, &ctx);
        assert_eq!(screen.form.value(0), "");
        assert!(screen.users.is_loading());
        assert_eq!(
            server.requests_to("/admin/create_admin")[0].body_json(),
            Some(json!({"username": "root", "password": "pw"}))
        );
    }

    #[test]
    fn test_non_admin_does_not_fetch() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = AdminScreen::new();
        screen.mount(&ctx);
        assert!(!screen.authorized);
        assert_eq!(
            screen.handle_key(KeyCode::Enter, &ctx),
            ScreenAction::Navigate(ScreenKind::Dashboard, ScreenParams::None)
        );
    }
}
