//! Loan requests.
//!
//! There is no loan listing endpoint for regular users, so the list is
//! built from loan credits in the transaction history plus the requests
//! made from this screen.

use crate::{
    client::{CallError, Endpoint},
    dialog::Dialog,
    models::{display_timestamp, format_money, Loan, LoanStatus, Transaction},
    navigation::ScreenKind,
    screens::{
        widgets::{boxed, empty, footer, placeholder, title_bar, Form, FormInput, Remote, TextInput},
        Screen, ScreenAction, ScreenContext, ScreenEvent, Submission,
    },
    validate,
};
use chrono::Utc;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Loans the server has paid out, newest first.
pub fn loans_from_transactions(transactions: &[Transaction]) -> Vec<Loan> {
    let mut loans: Vec<Loan> = transactions
        .iter()
        .filter(|t| {
            t.description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains("loan"))
        })
        .map(|t| Loan {
            id: t.id,
            amount: t.amount.abs(),
            status: LoanStatus::Approved,
            created_at: t.timestamp.clone(),
        })
        .collect();
    loans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    loans
}

pub struct LoansScreen {
    form: Form,
    submitting: bool,
    history: Remote<Vec<Loan>>,
    /// Requests made while mounted, newest first.
    requested: Vec<Loan>,
}

impl LoansScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![TextInput::new("Loan Amount ($)")]),
            submitting: false,
            history: Remote::Loading,
            requested: Vec::new(),
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        self.history = Remote::Loading;
        ctx.fetch(
            Endpoint::Transactions(ctx.account_number().to_string()),
            true,
            "transactions",
            "Failed to fetch loans",
            ScreenEvent::Transactions,
        );
    }

    /// Everything shown in the list.
    pub fn loans(&self) -> Vec<Loan> {
        let mut all = self.requested.clone();
        if let Some(history) = self.history.ready() {
            all.extend(history.iter().cloned());
        }
        all
    }

    fn request(&mut self, ctx: &ScreenContext) -> ScreenAction {
        let amount = match validate::positive_amount(self.form.value(0), "Please enter a valid loan amount") {
            Ok(amount) => amount,
            Err(e) => return ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
        };
        self.submitting = true;
        ctx.submit(
            Endpoint::RequestLoan,
            serde_json::json!({ "amount": amount }),
            Submission::RequestLoan { amount },
            "Failed to request loan",
        );
        ScreenAction::None
    }
}

impl Screen for LoansScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Loans
    }

    fn mount(&mut self, ctx: &ScreenContext) {
        self.fetch(ctx);
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if key == KeyCode::F(5) {
            self.fetch(ctx);
            return ScreenAction::None;
        }
        if self.submitting {
            return ScreenAction::None;
        }
        match self.form.handle_key(key) {
            FormInput::Submit => self.request(ctx),
            _ => ScreenAction::None,
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        match event {
            ScreenEvent::Transactions(result) => {
                self.history = Remote::from_result(result.map(|txs| loans_from_transactions(&txs)));
                ScreenAction::None
            }
            ScreenEvent::Submitted(Submission::RequestLoan { amount }, result) => {
                self.submitting = false;
                match result {
                    Ok(resp) => {
                        self.form.clear();
                        let now = Utc::now();
                        let id = resp
                            .field::<u64>("loan_id")
                            .unwrap_or(now.timestamp_millis().unsigned_abs());
                        self.requested.insert(
                            0,
                            Loan {
                                id,
                                amount,
                                status: LoanStatus::Pending,
                                created_at: now.to_rfc3339(),
                            },
                        );
                        ScreenAction::Dialog(Dialog::info(
                            "Success",
                            "Loan request submitted successfully. Our staff will review your application.",
                        ))
                    }
                    Err(CallError::Network) => {
                        ScreenAction::Dialog(Dialog::error("Error", CallError::Network.to_string()))
                    }
                    Err(CallError::Server(message)) => {
                        ScreenAction::Dialog(Dialog::error("Error", message))
                    }
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
                Constraint::Length(3), // Title bar
                Constraint::Length(3), // Blurb
                Constraint::Length(3), // Amount
                Constraint::Min(5),    // Loans
                Constraint::Length(2), // Footer
            ])
            .split(area);

        let status = self.submitting.then_some(("Submitting...", Color::Yellow));
        title_bar(frame, chunks[0], "Loans", status);

        let blurb = Paragraph::new(
            "Request a loan for your personal or business needs. Competitive interest rates starting at just 5.9% APR.",
        )
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
        frame.render_widget(blurb, chunks[1]);

        self.form.render(frame, chunks[2], !self.submitting);

        let loans = self.loans();
        match &self.history {
            Remote::Loading | Remote::Failed(_) if loans.is_empty() => {
                placeholder(frame, chunks[3], "Your Loans", &self.history)
            }
            _ if loans.is_empty() => empty(frame, chunks[3], "Your Loans", "You have no loans yet"),
            _ => {
                let items: Vec<ListItem> = loans
                    .iter()
                    .map(|loan| {
                        let color = match loan.status {
                            LoanStatus::Approved => Color::Green,
                            LoanStatus::Pending => Color::Yellow,
                        };
                        ListItem::new(vec![
                            Line::from(vec![
                                Span::styled(
                                    format!("  {:<14}", format_money(loan.amount)),
                                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                                ),
                                Span::styled(
                                    loan.status.label().to_uppercase(),
                                    Style::default().fg(color),
                                ),
                            ]),
                            Line::from(Span::styled(
                                format!("  Requested on {}", display_timestamp(&loan.created_at)),
                                Style::default().fg(Color::DarkGray),
                            )),
                        ])
                    })
                    .collect();
                frame.render_widget(List::new(items).block(boxed("Your Loans")), chunks[3]);
            }
        }

        let error = match &self.history {
            Remote::Failed(e) => Some(e.as_str()),
            _ => None,
        };
        footer(
            frame,
            chunks[4],
            &[("Enter", "Request Loan"), ("F5", "Refresh"), ("Esc", "Back")],
            error,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::test_context::{context, next_event, user};
    use crate::test_support::{MockResponse, MockServer};
    use serde_json::json;

    fn tx(id: u64, description: Option<&str>, timestamp: &str) -> Transaction {
        Transaction {
            id,
            from_account: "BANK".into(),
            to_account: "1001".into(),
            amount: 500.0,
            timestamp: timestamp.into(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_loans_from_transactions() {
        let loans = loans_from_transactions(&[
            tx(1, Some("Loan approved"), "2024-01-01"),
            tx(2, Some("Rent"), "2024-01-02"),
            tx(3, None, "2024-01-03"),
            tx(4, Some("LOAN disbursement"), "2024-02-01"),
        ]);
        assert_eq!(loans.iter().map(|l| l.id).collect::<Vec<_>>(), vec![4, 1]);
        assert!(loans.iter().all(|l| l.status == LoanStatus::Approved));
    }

    #[test]
    fn test_invalid_amount_blocks_request() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = LoansScreen::new();
        for key in [KeyCode::Char('0'), KeyCode::Enter] {
            let action = screen.handle_key(key, &ctx);
            if key == KeyCode::Enter {
                let ScreenAction::Dialog(d) = action else { panic!("expected dialog") };
                assert_eq!(d.message, "Please enter a valid loan amount");
            }
        }
        assert!(!screen.submitting);
    }

    #[tokio::test]
    async fn test_request_prepends_pending_loan() {
        let server = MockServer::start(vec![MockResponse::json(
            "POST",
            "/request_loan",
            200,
            json!({"message": "Loan requested successfully"}),
        )])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        let mut screen = LoansScreen::new();
        screen.history = Remote::Ready(vec![Loan {
            id: 9,
            amount: 100.0,
            status: LoanStatus::Approved,
            created_at: "2024-01-01".into(),
        }]);

        for c in "2500".chars() {
            screen.handle_key(KeyCode::Char(c), &ctx);
        }
        screen.handle_key(KeyCode::Enter, &ctx);
        let event = next_event(&mut rx).await;
        assert!(matches!(screen.handle_event(event, &ctx), ScreenAction::Dialog(_)));

        let loans = screen.loans();
        assert_eq!(loans.len(), 2);
        assert_eq!(loans[0].amount, 2500.0);
        assert_eq!(loans[0].status, LoanStatus::Pending);
        assert_eq!(screen.form.value(0), "");

        let body = server.requests_to("/request_loan")[0].body_json();
        assert_eq!(body, Some(json!({"amount": 2500.0})));
    }
}
