//! Bill payment form for one biller.

use crate::{
    client::Endpoint,
    dialog::Dialog,
    models::{format_money, Biller, VirtualCard},
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{boxed, detail, footer, marker, placeholder, title_bar, Form, FormInput, Remote, TextInput},
        Screen, ScreenAction, ScreenContext, ScreenEvent, Submission,
    },
    validate,
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use serde_json::json;

const AMOUNT: usize = 0;
const DESCRIPTION: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Balance,
    VirtualCard,
}

impl PaymentMethod {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Balance => "balance",
            PaymentMethod::VirtualCard => "virtual_card",
        }
    }
}

pub struct PaymentScreen {
    /// Category and biller ids from the selection screens.
    target: Option<(u64, u64)>,
    biller: Remote<Biller>,
    /// Spendable cards only.
    cards: Vec<VirtualCard>,
    form: Form,
    method: PaymentMethod,
    selected_card: Option<u64>,
    submitting: bool,
}

impl PaymentScreen {
    pub fn new(target: Option<(u64, u64, f64)>) -> Self {
        let amount = target.map(|(_, _, amount)| amount.to_string()).unwrap_or_default();
        Self {
            target: target.map(|(category_id, biller_id, _)| (category_id, biller_id)),
            biller: Remote::Loading,
            cards: Vec::new(),
            form: Form::new(vec![
                TextInput::new("Amount ($)").with_value(amount),
                TextInput::new("Description (Optional)"),
            ]),
            method: PaymentMethod::Balance,
            selected_card: None,
            submitting: false,
        }
    }

    fn switch_method(&mut self, method: PaymentMethod) -> ScreenAction {
        match method {
            PaymentMethod::Balance => {
                self.method = method;
                self.selected_card = None;
                ScreenAction::None
            }
            PaymentMethod::VirtualCard if self.cards.is_empty() => ScreenAction::Dialog(Dialog::info(
                "No Cards Available",
                "You don't have any active virtual cards. Create a card first or use your account balance.",
            )),
            PaymentMethod::VirtualCard => {
                self.method = method;
                if self.cards.len() == 1 {
                    self.selected_card = Some(self.cards[0].id);
                }
                ScreenAction::None
            }
        }
    }

    fn next_card(&mut self) {
        if self.method != PaymentMethod::VirtualCard || self.cards.is_empty() {
            return;
        }
        let next = match self.selected_card.and_then(|id| self.cards.iter().position(|c| c.id == id)) {
            Some(i) => (i + 1) % self.cards.len(),
            None => 0,
        };
        self.selected_card = Some(self.cards[next].id);
    }

    fn submit(&mut self, ctx: &ScreenContext) -> ScreenAction {
        let error = |message: String| ScreenAction::Dialog(Dialog::error("Error", message));

        let Some(biller) = self.biller.ready() else {
            return error("Please select a biller".into());
        };
        let amount = match validate::positive_amount(self.form.value(AMOUNT), "Please enter a valid amount") {
            Ok(amount) => amount,
            Err(e) => return error(e.to_string()),
        };
        if let Err(e) = validate::within_bounds(amount, biller.minimum_amount, biller.maximum()) {
            return error(e.to_string());
        }
        if self.method == PaymentMethod::VirtualCard && self.selected_card.is_none() {
            return error("Please select a card".into());
        }

        let description = match self.form.value(DESCRIPTION).trim() {
            "" => format!("Payment to {}", biller.name),
            d => d.to_string(),
        };
        let mut body = json!({
            "biller_id": biller.id,
            "amount": amount,
            "payment_method": self.method.as_str(),
            "description": description,
        });
        if let (PaymentMethod::VirtualCard, Some(card_id)) = (self.method, self.selected_card) {
            body["card_id"] = json!(card_id);
        }

        self.submitting = true;
        ctx.submit(
            Endpoint::CreateBillPayment,
            body,
            Submission::PayBill,
            "Failed to process payment",
        );
        ScreenAction::None
    }
}

impl Screen for PaymentScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::PaymentMethod
    }

    fn mount(&mut self, ctx: &ScreenContext) {
        let Some((category_id, _)) = self.target else {
            self.biller = Remote::Failed("Please select a biller".into());
            return;
        };
        ctx.fetch(
            Endpoint::BillersByCategory(category_id),
            false,
            "billers",
            "Failed to fetch billers",
            ScreenEvent::Billers,
        );
        ctx.fetch(
            Endpoint::VirtualCards,
            true,
            "cards",
            "Failed to fetch cards",
            ScreenEvent::Cards,
        );
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if self.submitting {
            return ScreenAction::None;
        }
        match key {
            KeyCode::Left => self.switch_method(PaymentMethod::Balance),
            KeyCode::Right => self.switch_method(PaymentMethod::VirtualCard),
            KeyCode::F(4) => {
                self.next_card();
                ScreenAction::None
            }
            _ => match self.form.handle_key(key) {
                FormInput::Submit => self.submit(ctx),
                _ => ScreenAction::None,
            },
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        match event {
            ScreenEvent::Billers(result) => {
                let biller_id = self.target.map(|(_, id)| id);
                self.biller = match result {
                    Ok(billers) => billers
                        .into_iter()
                        .find(|b| Some(b.id) == biller_id)
                        .map(Remote::Ready)
                        .unwrap_or_else(|| Remote::Failed("Biller not found".into())),
                    Err(e) => Remote::Failed(e.to_string()),
                };
                ScreenAction::None
            }
            // Without cards the form still works with the account balance.
            ScreenEvent::Cards(result) => {
                self.cards = result
                    .map(|cards| cards.into_iter().filter(VirtualCard::is_spendable).collect())
                    .unwrap_or_default();
                ScreenAction::None
            }
            ScreenEvent::Submitted(Submission::PayBill, result) => {
                self.submitting = false;
                match result {
                    Ok(_) => ScreenAction::Dialog(
                        Dialog::info("Success", "Payment processed successfully!")
                            .then(ScreenAction::Navigate(ScreenKind::Bills, ScreenParams::None)),
                    ),
                    Err(e) => ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let card_rows = if self.method == PaymentMethod::VirtualCard {
            self.cards.len() as u16 + 2
        } else {
            0
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),                  // Title bar
                Constraint::Length(5),                  // Biller
                Constraint::Length(self.form.height()), // Amount, description
                Constraint::Length(3),                  // Method
                Constraint::Length(card_rows),          // Cards
                Constraint::Min(0),
                Constraint::Length(2), // Footer
            ])
            .split(area);

        let status = self.submitting.then_some(("Processing...", Color::Yellow));
        title_bar(frame, chunks[0], "Pay Bill", status);

        match &self.biller {
            Remote::Ready(biller) => {
                let mut lines = vec![detail("Biller", biller.name.clone(), Color::White)];
                if biller.minimum_amount > 0.0 {
                    lines.push(detail("Minimum amount", format_money(biller.minimum_amount), Color::DarkGray));
                }
                if let Some(max) = biller.maximum() {
                    lines.push(detail("Maximum amount", format_money(max), Color::DarkGray));
                }
                frame.render_widget(Paragraph::new(lines).block(boxed("Biller")), chunks[1]);
            }
            other => placeholder(frame, chunks[1], "Biller", other),
        }

        self.form.render(frame, chunks[2], !self.submitting);

        let option = |label: &'static str, method: PaymentMethod| {
            if self.method == method {
                Span::styled(
                    format!(" {} ", label),
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {} ", label), Style::default().fg(Color::DarkGray))
            }
        };
        let methods = Paragraph::new(Line::from(vec![
            option("Account Balance", PaymentMethod::Balance),
            Span::raw("  "),
            option("Virtual Card", PaymentMethod::VirtualCard),
        ]))
        .block(boxed("Payment Method"));
        frame.render_widget(methods, chunks[3]);

        if card_rows > 0 {
            let lines: Vec<Line> = self
                .cards
                .iter()
                .map(|card| {
                    Line::from(vec![
                        marker(self.selected_card == Some(card.id)),
                        Span::styled(format!("{}  ", card.masked_number()), Style::default().fg(Color::White)),
                        Span::styled(
                            format!("Balance: {}", format_money(card.balance)),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ])
                })
                .collect();
            frame.render_widget(Paragraph::new(lines).block(boxed("Select Card")), chunks[4]);
        }

        let error = match &self.biller {
            Remote::Failed(e) => Some(e.as_str()),
            _ => None,
        };
        footer(
            frame,
            chunks[6],
            &[("Enter", "Pay Now"), ("←→", "Method"), ("F4", "Next card"), ("Esc", "Back")],
            error,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogInput;
    use crate::screens::test_context::{context, next_event, user};
    use crate::test_support::{MockResponse, MockServer};
    use pretty_assertions::assert_eq;

    fn biller(min: f64, max: Option<f64>) -> Biller {
        Biller {
            id: 5,
            name: "City Water".into(),
            category_id: 2,
            minimum_amount: min,
            maximum_amount: max,
        }
    }

    fn card(id: u64, frozen: bool, balance: f64) -> VirtualCard {
        serde_json::from_value(json!({
            "id": id,
            "card_number": format!("411111111111{:04}", id),
            "cvv": "123",
            "expiry_date": "12/27",
            "limit": 1000,
            "balance": balance,
            "is_frozen": frozen,
        }))
        .unwrap()
    }

    fn message(action: ScreenAction) -> String {
        match action {
            ScreenAction::Dialog(d) => d.message,
            other => panic!("expected dialog, got {other:?}"),
        }
    }

    fn ready_screen(ctx: &ScreenContext, amount: &str, max: Option<f64>) -> PaymentScreen {
        let mut screen = PaymentScreen::new(Some((2, 5, 10.0)));
        screen.handle_event(ScreenEvent::Billers(Ok(vec![biller(10.0, max)])), ctx);
        screen.form.inputs[AMOUNT].value = amount.into();
        screen
    }

    #[test]
    fn test_amount_bounds() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = ready_screen(&ctx, "5", Some(100.0));
        assert_eq!(message(screen.handle_key(KeyCode::Enter, &ctx)), "Minimum amount is $10.00");

        let mut screen = ready_screen(&ctx, "150", Some(100.0));
        assert_eq!(message(screen.handle_key(KeyCode::Enter, &ctx)), "Maximum amount is $100.00");

        let mut screen = ready_screen(&ctx, "abc", None);
        assert_eq!(message(screen.handle_key(KeyCode::Enter, &ctx)), "Please enter a valid amount");
        assert!(!screen.submitting);
    }

    #[tokio::test]
    async fn test_zero_maximum_is_uncapped() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = ready_screen(&ctx, "25", Some(0.0));
        assert!(!matches!(screen.handle_key(KeyCode::Enter, &ctx), ScreenAction::Dialog(_)));
        assert!(screen.submitting);
    }

    #[test]
    fn test_missing_biller() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = PaymentScreen::new(None);
        screen.mount(&ctx);
        assert_eq!(message(screen.handle_key(KeyCode::Enter, &ctx)), "Please select a biller");
    }

    #[test]
    fn test_card_method_rules() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = ready_screen(&ctx, "20", None);

        let action = screen.handle_key(KeyCode::Right, &ctx);
        assert!(matches!(action, ScreenAction::Dialog(d) if d.title == "No Cards Available"));
        assert_eq!(screen.method, PaymentMethod::Balance);

        screen.handle_event(
            ScreenEvent::Cards(Ok(vec![card(1, true, 50.0), card(2, false, 0.0), card(3, false, 40.0)])),
            &ctx,
        );
        assert_eq!(screen.cards.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3]);
        screen.handle_key(KeyCode::Right, &ctx);
        assert_eq!(screen.method, PaymentMethod::VirtualCard);
        assert_eq!(screen.selected_card, Some(3));

        screen.handle_key(KeyCode::Left, &ctx);
        assert_eq!(screen.selected_card, None);
    }

    #[test]
    fn test_card_required_when_paying_by_card() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = ready_screen(&ctx, "20", None);
        screen.cards = vec![card(3, false, 40.0), card(4, false, 40.0)];
        screen.handle_key(KeyCode::Right, &ctx);
        assert_eq!(message(screen.handle_key(KeyCode::Enter, &ctx)), "Please select a card");
    }

    #[tokio::test]
    async fn test_pay_by_card() {
        let server = MockServer::start(vec![MockResponse::json(
            "POST",
            "/api/bill-payments/create",
            200,
            json!({"message": "ok"}),
        )])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        let mut screen = ready_screen(&ctx, "20", None);
        screen.cards = vec![card(3, false, 40.0), card(4, false, 40.0)];
        screen.handle_key(KeyCode::Right, &ctx);
        screen.handle_key(KeyCode::F(4), &ctx);
        screen.handle_key(KeyCode::F(4), &ctx);
        assert_eq!(screen.selected_card, Some(4));
        screen.handle_key(KeyCode::Enter, &ctx);

        let event = next_event(&mut rx).await;
        let ScreenAction::Dialog(mut dialog) = screen.handle_event(event, &ctx) else {
            panic!("expected dialog");
        };
        assert_eq!(dialog.message, "Payment processed successfully!");
        assert_eq!(
            dialog.handle_key(KeyCode::Enter),
            DialogInput::Closed(ScreenAction::Navigate(ScreenKind::Bills, ScreenParams::None))
        );
        assert_eq!(
            server.requests_to("/api/bill-payments/create")[0].body_json(),
            Some(json!({
                "biller_id": 5,
                "amount": 20.0,
                "payment_method": "virtual_card",
                "description": "Payment to City Water",
                "card_id": 4,
            }))
        );
    }
}
