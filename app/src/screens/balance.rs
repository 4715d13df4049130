//! Account balance.

use crate::{
    client::Endpoint,
    models::format_money,
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{boxed, detail, footer, frame_layout, placeholder, title_bar, Remote},
        Screen, ScreenAction, ScreenContext, ScreenEvent,
    },
};
use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub struct BalanceScreen {
    balance: Remote<f64>,
    last_updated: Option<DateTime<Local>>,
}

impl BalanceScreen {
    pub fn new() -> Self {
        Self {
            balance: Remote::Loading,
            last_updated: None,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        self.balance = Remote::Loading;
        ctx.fetch(
            Endpoint::CheckBalance(ctx.account_number().to_string()),
            true,
            "balance",
            "Failed to fetch balance",
            ScreenEvent::Balance,
        );
    }
}

impl Screen for BalanceScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Balance
    }

    fn mount(&mut self, ctx: &ScreenContext) {
        self.fetch(ctx);
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        let go = |kind| ScreenAction::Navigate(kind, ScreenParams::None);
        match key {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if !self.balance.is_loading() {
                    self.fetch(ctx);
                }
                ScreenAction::None
            }
            KeyCode::Char('1') => go(ScreenKind::Transfer),
            KeyCode::Char('2') => go(ScreenKind::Transactions),
            KeyCode::Char('3') => go(ScreenKind::Loans),
            KeyCode::Char('4') => go(ScreenKind::Bills),
            _ => ScreenAction::None,
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        if let ScreenEvent::Balance(result) = event {
            if result.is_ok() {
                self.last_updated = Some(Local::now());
            }
            self.balance = Remote::from_result(result);
        }
        ScreenAction::None
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = self.balance.is_loading().then_some(("Loading...", Color::Yellow));
        title_bar(frame, title, "Check Balance", status);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6), // Balance card
                Constraint::Length(4), // Quick actions
                Constraint::Min(5),    // Account details
            ])
            .split(body);

        match &self.balance {
            Remote::Ready(balance) => {
                let updated = self
                    .last_updated
                    .map(|t| format!("Last updated: {}", t.format("%H:%M:%S")))
                    .unwrap_or_default();
                let card = Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        format_money(*balance),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(updated, Style::default().fg(Color::DarkGray))),
                ])
                .alignment(Alignment::Center)
                .block(boxed("Available Balance"));
                frame.render_widget(card, chunks[0]);
            }
            other => placeholder(frame, chunks[0], "Available Balance", other),
        }

        let actions = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("[1] ", Style::default().fg(Color::Cyan)),
                Span::styled("Transfer Money   ", Style::default().fg(Color::White)),
                Span::styled("[2] ", Style::default().fg(Color::Cyan)),
                Span::styled("Transaction History", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("[3] ", Style::default().fg(Color::Cyan)),
                Span::styled("Request Loan     ", Style::default().fg(Color::White)),
                Span::styled("[4] ", Style::default().fg(Color::Cyan)),
                Span::styled("Pay Bills          ", Style::default().fg(Color::White)),
            ]),
        ])
        .alignment(Alignment::Center)
        .block(boxed("Quick Actions"));
        frame.render_widget(actions, chunks[1]);

        let details = Paragraph::new(vec![
            detail("Account Number", ctx.account_number(), Color::White),
            detail("Account Type", "Checking", Color::White),
            detail("Account Status", "Active", Color::Green),
        ])
        .block(boxed("Account Details"));
        frame.render_widget(details, chunks[2]);

        let error = match &self.balance {
            Remote::Failed(e) => Some(e.as_str()),
            _ => None,
        };
        footer(frame, foot, &[("R", "Refresh"), ("Esc", "Back")], error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CallError;
    use crate::screens::test_context::{context, next_event, user};
    use crate::test_support::{MockResponse, MockServer};
    use serde_json::json;

    #[tokio::test]
    async fn test_mount_fetches_balance_for_session_account() {
        let server = MockServer::start(vec![MockResponse::json(
            "GET",
            "/check_balance/1001",
            200,
            json!({"balance": 2500.75, "username": "alice"}),
        )])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        let mut screen = BalanceScreen::new();
        screen.mount(&ctx);
        assert!(screen.balance.is_loading());

        let event = next_event(&mut rx).await;
        screen.handle_event(event, &ctx);
        assert_eq!(screen.balance, Remote::Ready(2500.75));
        assert!(screen.last_updated.is_some());
    }

    #[test]
    fn test_failure_keeps_error_for_retry() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = BalanceScreen::new();
        screen.handle_event(
            ScreenEvent::Balance(Err(CallError::Server("Account not found".into()))),
            &ctx,
        );
        assert_eq!(screen.balance, Remote::Failed("Account not found".into()));
        assert!(screen.last_updated.is_none());
    }
}
