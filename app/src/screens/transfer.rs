//! Money transfer form.

use crate::{
    client::{CallError, Endpoint},
    dialog::Dialog,
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{boxed, detail, footer, title_bar, Form, FormInput, TextInput},
        Screen, ScreenAction, ScreenContext, ScreenEvent, Submission,
    },
    validate,
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub const DEFAULT_DESCRIPTION: &str = "Transfer from mobile app";

const TO_ACCOUNT: usize = 0;
const AMOUNT: usize = 1;
const DESCRIPTION: usize = 2;

pub struct TransferScreen {
    form: Form,
    submitting: bool,
    /// Recipient and amount as submitted, for the success message.
    pending: Option<(String, String)>,
}

impl TransferScreen {
    pub fn new(prefill_recipient: Option<String>, prefill_amount: Option<f64>) -> Self {
        Self {
            form: Form::new(vec![
                TextInput::new("To Account").with_value(prefill_recipient.unwrap_or_default()),
                TextInput::new("Amount ($)")
                    .with_value(prefill_amount.map(|a| a.to_string()).unwrap_or_default()),
                TextInput::new("Description (Optional)"),
            ]),
            submitting: false,
            pending: None,
        }
    }

    fn submit(&mut self, ctx: &ScreenContext) -> ScreenAction {
        let to_account = self.form.value(TO_ACCOUNT).trim().to_string();
        let raw_amount = self.form.value(AMOUNT).trim().to_string();
        if let Err(e) = validate::require_all(
            &[&to_account, &raw_amount],
            "Please enter recipient account and amount",
        ) {
            return ScreenAction::Dialog(Dialog::error("Error", e.to_string()));
        }
        let amount = match validate::parse_amount(&raw_amount, "Amount must be a valid number") {
            Ok(amount) => amount,
            Err(e) => return ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
        };
        let description = match self.form.value(DESCRIPTION).trim() {
            "" => DEFAULT_DESCRIPTION.to_string(),
            d => d.to_string(),
        };

        let body = serde_json::json!({
            "from_account": ctx.account_number(),
            "to_account": to_account,
            "amount": amount,
            "description": description,
        });
        self.submitting = true;
        self.pending = Some((to_account, raw_amount));
        ctx.submit(
            Endpoint::Transfer,
            body,
            Submission::Transfer,
            "Transfer could not be completed",
        );
        ScreenAction::None
    }
}

impl Screen for TransferScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Transfer
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if self.submitting {
            return ScreenAction::None;
        }
        match self.form.handle_key(key) {
            FormInput::Submit => self.submit(ctx),
            _ => ScreenAction::None,
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        let ScreenEvent::Submitted(Submission::Transfer, result) = event else {
            return ScreenAction::None;
        };
        self.submitting = false;
        let (to_account, amount) = self.pending.take().unwrap_or_default();
        match result {
            Ok(_) => ScreenAction::Dialog(
                Dialog::info(
                    "Success",
                    format!(
                        "Transfer of ${} to account {} was successful!",
                        amount, to_account
                    ),
                )
                .then(ScreenAction::Navigate(ScreenKind::Dashboard, ScreenParams::None)),
            ),
            Err(CallError::Network) => {
                ScreenAction::Dialog(Dialog::error("Error", CallError::Network.to_string()))
            }
            Err(CallError::Server(message)) => {
                ScreenAction::Dialog(Dialog::error("Transfer Failed", message))
            }
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &ScreenContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),                  // Title bar
                Constraint::Length(3),                  // From account
                Constraint::Length(self.form.height()), // Form
                Constraint::Min(6),                     // Info
                Constraint::Length(2),                  // Footer
            ])
            .split(area);

        let status = self.submitting.then_some(("Processing...", Color::Yellow));
        title_bar(frame, chunks[0], "Money Transfer", status);

        let from = Paragraph::new(detail("From Account", ctx.account_number(), Color::White))
            .block(boxed("From"));
        frame.render_widget(from, chunks[1]);

        self.form.render(frame, chunks[2], !self.submitting);

        let info: Vec<Line> = [
            "• Transfers are processed immediately",
            "• Daily transfer limit: $10,000",
            "• Must have sufficient funds in your account",
            "• Double-check recipient account number",
        ]
        .into_iter()
        .map(|t| Line::from(Span::styled(format!("  {}", t), Style::default().fg(Color::DarkGray))))
        .collect();
        frame.render_widget(Paragraph::new(info).block(boxed("Transfer Information")), chunks[3]);

        footer(
            frame,
            chunks[4],
            &[("Enter", "Send Money"), ("Tab", "Next field"), ("Esc", "Back")],
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::test_context::{context, next_event, user};
    use crate::test_support::{MockResponse, MockServer};
    use serde_json::json;

    fn dialog_message(action: ScreenAction) -> String {
        match action {
            ScreenAction::Dialog(d) => d.message,
            other => panic!("expected dialog, got {other:?}"),
        }
    }

    #[test]
    fn test_prefill_from_params() {
        let screen = TransferScreen::new(Some("2002".into()), Some(25.5));
        assert_eq!(screen.form.value(TO_ACCOUNT), "2002");
        assert_eq!(screen.form.value(AMOUNT), "25.5");
    }

    #[test]
    fn test_validation_blocks_request() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = TransferScreen::new(Some("2002".into()), None);
        assert_eq!(
            dialog_message(screen.handle_key(KeyCode::Enter, &ctx)),
            "Please enter recipient account and amount"
        );

        let mut screen = TransferScreen::new(Some("2002".into()), None);
        screen.form.inputs[AMOUNT].value = "ten".into();
        assert_eq!(
            dialog_message(screen.handle_key(KeyCode::Enter, &ctx)),
            "Amount must be a valid number"
        );
        assert!(!screen.submitting);
    }

    #[tokio::test]
    async fn test_transfer_body_and_success() {
        let server = MockServer::start(vec![MockResponse::json(
            "POST",
            "/transfer",
            200,
            json!({"message": "Transfer Completed", "new_balance": 90}),
        )])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        let mut screen = TransferScreen::new(Some("2002".into()), Some(10.0));
        assert_eq!(screen.handle_key(KeyCode::Enter, &ctx), ScreenAction::None);

        let event = next_event(&mut rx).await;
        let action = screen.handle_event(event, &ctx);
        assert_eq!(
            dialog_message(action),
            "Transfer of $10 to account 2002 was successful!"
        );

        let request = &server.requests_to("/transfer")[0];
        assert_eq!(request.header("authorization").as_deref(), Some("Bearer tok"));
        assert_eq!(
            request.body_json(),
            Some(json!({
                "from_account": "1001",
                "to_account": "2002",
                "amount": 10.0,
                "description": "Transfer from mobile app",
            }))
        );
    }

    #[test]
    fn test_server_rejection_title() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = TransferScreen::new(None, None);
        let action = screen.handle_event(
            ScreenEvent::Submitted(
                Submission::Transfer,
                Err(CallError::Server("Insufficient funds".into())),
            ),
            &ctx,
        );
        match action {
            ScreenAction::Dialog(d) => {
                assert_eq!(d.title, "Transfer Failed");
                assert_eq!(d.message, "Insufficient funds");
            }
            other => panic!("expected dialog, got {other:?}"),
        }
    }
}
