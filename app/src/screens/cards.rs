//! Virtual cards: list, details, per-card transactions and creation.

use crate::{
    client::Endpoint,
    dialog::Dialog,
    models::{display_timestamp, format_money, CardTransaction, VirtualCard},
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{
            boxed, detail, empty, footer, frame_layout, marker, move_cursor, placeholder, title_bar,
            Form, FormInput, Remote, TextInput,
        },
        Screen, ScreenAction, ScreenContext, ScreenEvent, Submission,
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

pub const CARD_TYPES: [&str; 3] = ["standard", "premium", "business"];

fn fetch_cards(ctx: &ScreenContext) {
    ctx.fetch(
        Endpoint::VirtualCards,
        true,
        "cards",
        "Failed to fetch cards",
        ScreenEvent::Cards,
    );
}

fn request_toggle(ctx: &ScreenContext, card_id: u64) {
    ctx.submit(
        Endpoint::ToggleCardFreeze(card_id),
        serde_json::json!({}),
        Submission::ToggleFreeze { card_id },
        "Failed to toggle card status",
    );
}

/// Flip the frozen flag of `card_id` locally. Returns the new state.
pub fn flip_frozen(cards: &mut [VirtualCard], card_id: u64) -> Option<bool> {
    let card = cards.iter_mut().find(|c| c.id == card_id)?;
    card.is_frozen = !card.is_frozen;
    Some(card.is_frozen)
}

fn toggle_dialog(frozen: bool) -> ScreenAction {
    let verb = if frozen { "frozen" } else { "unfrozen" };
    ScreenAction::Dialog(Dialog::info(
        "Success",
        format!("Card has been {} successfully", verb),
    ))
}

fn status_span(frozen: bool) -> Span<'static> {
    if frozen {
        Span::styled("Frozen", Style::default().fg(Color::Red))
    } else {
        Span::styled("Active", Style::default().fg(Color::Green))
    }
}

fn nav(kind: ScreenKind, params: ScreenParams) -> ScreenAction {
    ScreenAction::Navigate(kind, params)
}

pub struct CardsScreen {
    cards: Remote<Vec<VirtualCard>>,
    cursor: usize,
    toggling: bool,
}

impl CardsScreen {
    pub fn new() -> Self {
        Self {
            cards: Remote::Loading,
            cursor: 0,
            toggling: false,
        }
    }

    fn selected(&self) -> Option<&VirtualCard> {
        self.cards.ready().and_then(|cards| cards.get(self.cursor))
    }
}

impl Screen for CardsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Cards
    }

    fn mount(&mut self, ctx: &ScreenContext) {
        fetch_cards(ctx);
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        let selected = self.selected().map(|c| c.id);
        match key {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.cards = Remote::Loading;
                fetch_cards(ctx);
                ScreenAction::None
            }
            KeyCode::Char('n') | KeyCode::Char('N') => nav(ScreenKind::CreateCard, ScreenParams::None),
            KeyCode::Enter | KeyCode::Char('d') | KeyCode::Char('D') => match selected {
                Some(card_id) => nav(ScreenKind::CardDetails, ScreenParams::CardDetails { card_id }),
                None => ScreenAction::None,
            },
            KeyCode::Char('t') | KeyCode::Char('T') => match selected {
                Some(card_id) => nav(
                    ScreenKind::CardTransactions,
                    ScreenParams::CardTransactions { card_id },
                ),
                None => ScreenAction::None,
            },
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if let (Some(card_id), false) = (selected, self.toggling) {
                    self.toggling = true;
                    request_toggle(ctx, card_id);
                }
                ScreenAction::None
            }
            _ => {
                let len = self.cards.ready().map(Vec::len).unwrap_or(0);
                self.cursor = move_cursor(self.cursor, len, key);
                ScreenAction::None
            }
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        match event {
            ScreenEvent::Cards(result) => {
                self.cards = Remote::from_result(result);
                self.cursor = 0;
                ScreenAction::None
            }
            ScreenEvent::Submitted(Submission::ToggleFreeze { card_id }, result) => {
                self.toggling = false;
                match result {
                    Ok(_) => {
                        let frozen = self
                            .cards
                            .ready_mut()
                            .and_then(|cards| flip_frozen(cards, card_id));
                        match frozen {
                            Some(frozen) => toggle_dialog(frozen),
                            None => ScreenAction::None,
                        }
                    }
                    Err(e) => ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = if self.toggling {
            Some(("Updating...", Color::Yellow))
        } else {
            self.cards.is_loading().then_some(("Loading...", Color::Yellow))
        };
        title_bar(frame, title, "Virtual Cards", status);

        match &self.cards {
            Remote::Ready(cards) if cards.is_empty() => empty(
                frame,
                body,
                "Your Cards",
                "You don't have any virtual cards yet. Press [N] to create one.",
            ),
            Remote::Ready(cards) => {
                let items: Vec<ListItem> = cards
                    .iter()
                    .enumerate()
                    .map(|(i, card)| {
                        ListItem::new(vec![
                            Line::from(vec![
                                marker(i == self.cursor),
                                Span::styled(
                                    format!("{:<10}", card.card_type.to_uppercase()),
                                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                                ),
                                Span::styled(
                                    format!("{}  ", card.masked_number()),
                                    Style::default().fg(Color::White),
                                ),
                                status_span(card.is_frozen),
                            ]),
                            Line::from(Span::styled(
                                format!(
                                    "    Balance {}  Limit {}  Expires {}",
                                    format_money(card.balance),
                                    format_money(card.limit),
                                    card.expiry_date
                                ),
                                Style::default().fg(Color::DarkGray),
                            )),
                        ])
                    })
                    .collect();
                let list = List::new(items).block(boxed(&format!("Your Cards ({})", cards.len())));
                frame.render_widget(list, body);
            }
            other => placeholder(frame, body, "Your Cards", other),
        }

        let error = match &self.cards {
            Remote::Failed(e) => Some(e.as_str()),
            _ => None,
        };
        footer(
            frame,
            foot,
            &[
                ("Enter", "Details"),
                ("T", "Transactions"),
                ("F", "Freeze/Unfreeze"),
                ("N", "New card"),
                ("R", "Refresh"),
            ],
            error,
        );
    }
}

pub struct CardDetailsScreen {
    card_id: Option<u64>,
    card: Remote<VirtualCard>,
    toggling: bool,
}

impl CardDetailsScreen {
    pub fn new(card_id: Option<u64>) -> Self {
        Self {
            card_id,
            card: Remote::Loading,
            toggling: false,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        if self.card_id.is_none() {
            self.card = Remote::Failed("Invalid card ID or user session".into());
            return;
        }
        self.card = Remote::Loading;
        ctx.fetch(
            Endpoint::VirtualCards,
            true,
            "cards",
            "Failed to fetch card details",
            ScreenEvent::Cards,
        );
    }
}

impl Screen for CardDetailsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::CardDetails
    }

    fn mount(&mut self, ctx: &ScreenContext) {
        self.fetch(ctx);
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        match key {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.fetch(ctx);
                ScreenAction::None
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if let (Some(card), false) = (self.card.ready(), self.toggling) {
                    self.toggling = true;
                    request_toggle(ctx, card.id);
                }
                ScreenAction::None
            }
            KeyCode::Char('t') | KeyCode::Char('T') => match self.card_id {
                Some(card_id) => nav(
                    ScreenKind::CardTransactions,
                    ScreenParams::CardTransactions { card_id },
                ),
                None => ScreenAction::None,
            },
            KeyCode::Char('c') | KeyCode::Char('C') => nav(ScreenKind::Cards, ScreenParams::None),
            _ => ScreenAction::None,
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        match event {
            ScreenEvent::Cards(result) => {
                let card_id = self.card_id;
                self.card = match result {
                    Ok(cards) => cards
                        .into_iter()
                        .find(|c| Some(c.id) == card_id)
                        .map(Remote::Ready)
                        .unwrap_or_else(|| Remote::Failed("Card not found".into())),
                    Err(e) => Remote::Failed(e.to_string()),
                };
                ScreenAction::None
            }
            ScreenEvent::Submitted(Submission::ToggleFreeze { .. }, result) => {
                self.toggling = false;
                match (result, self.card.ready_mut()) {
                    (Ok(_), Some(card)) => {
                        card.is_frozen = !card.is_frozen;
                        toggle_dialog(card.is_frozen)
                    }
                    (Ok(_), None) => ScreenAction::None,
                    (Err(e), _) => ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = self.card.is_loading().then_some(("Loading...", Color::Yellow));
        title_bar(frame, title, "Card Details", status);

        match &self.card {
            Remote::Ready(card) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(6), Constraint::Min(6)])
                    .split(body);

                let face = Paragraph::new(vec![
                    Line::from(Span::styled(
                        card.card_type.to_uppercase(),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        card.formatted_number(),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(vec![
                        Span::styled(format!("EXP {}   CVV {}   ", card.expiry_date, card.cvv), Style::default().fg(Color::DarkGray)),
                        status_span(card.is_frozen),
                    ]),
                ])
                .alignment(Alignment::Center)
                .block(boxed("Card"));
                frame.render_widget(face, chunks[0]);

                let status = if card.is_frozen { "Frozen" } else { "Active" };
                let details = Paragraph::new(vec![
                    detail("Card Limit", format_money(card.limit), Color::White),
                    detail("Current Balance", format_money(card.balance), Color::Green),
                    detail("Card Type", card.card_type.clone(), Color::White),
                    detail("Status", status, if card.is_frozen { Color::Red } else { Color::Green }),
                    detail("Created", display_timestamp(&card.created_at), Color::White),
                ])
                .block(boxed("Card Information"));
                frame.render_widget(details, chunks[1]);
            }
            other => placeholder(frame, body, "Card", other),
        }

        let freeze = match self.card.ready() {
            Some(card) if card.is_frozen => "Unfreeze",
            _ => "Freeze",
        };
        footer(
            frame,
            foot,
            &[("F", freeze), ("T", "Transactions"), ("C", "All cards"), ("R", "Refresh")],
            None,
        );
    }
}

pub struct CardTransactionsScreen {
    card_id: Option<u64>,
    transactions: Remote<Vec<CardTransaction>>,
    card: Option<VirtualCard>,
    cursor: usize,
}

impl CardTransactionsScreen {
    pub fn new(card_id: Option<u64>) -> Self {
        Self {
            card_id,
            transactions: Remote::Loading,
            card: None,
            cursor: 0,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        let Some(card_id) = self.card_id else {
            self.transactions = Remote::Failed("Invalid card ID or user session".into());
            return;
        };
        self.transactions = Remote::Loading;
        ctx.fetch(
            Endpoint::CardTransactions(card_id),
            true,
            "transactions",
            "Failed to fetch transactions",
            ScreenEvent::CardTransactions,
        );
        fetch_cards(ctx);
    }
}

fn txn_status_color(status: &str) -> Color {
    match status.to_lowercase().as_str() {
        "completed" | "successful" => Color::Green,
        "pending" => Color::Yellow,
        "declined" | "failed" => Color::Red,
        _ => Color::DarkGray,
    }
}

impl Screen for CardTransactionsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::CardTransactions
    }

    fn mount(&mut self, ctx: &ScreenContext) {
        self.fetch(ctx);
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        match key {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.fetch(ctx);
                ScreenAction::None
            }
            KeyCode::Char('d') | KeyCode::Char('D') => match self.card_id {
                Some(card_id) => nav(ScreenKind::CardDetails, ScreenParams::CardDetails { card_id }),
                None => ScreenAction::None,
            },
            _ => {
                let len = self.transactions.ready().map(Vec::len).unwrap_or(0);
                self.cursor = move_cursor(self.cursor, len, key);
                ScreenAction::None
            }
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        match event {
            ScreenEvent::CardTransactions(result) => {
                self.transactions = Remote::from_result(result);
            }
            // Summary only; a failure here leaves the header generic.
            ScreenEvent::Cards(Ok(cards)) => {
                self.card = cards.into_iter().find(|c| Some(c.id) == self.card_id);
            }
            _ => {}
        }
        ScreenAction::None
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = self.transactions.is_loading().then_some(("Loading...", Color::Yellow));
        title_bar(frame, title, "Card Transactions", status);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(body);

        let summary = match &self.card {
            Some(card) => {
                let tail: String = card
                    .card_number
                    .chars()
                    .rev()
                    .take(4)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                Line::from(vec![
                    Span::styled(
                        format!("  {} Card *{}  ", card.card_type.to_uppercase(), tail),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("Balance {}  ", format_money(card.balance)),
                        Style::default().fg(Color::Green),
                    ),
                    status_span(card.is_frozen),
                ])
            }
            None => Line::from(Span::styled("  Card", Style::default().fg(Color::White))),
        };
        frame.render_widget(Paragraph::new(summary).block(boxed("Card")), chunks[0]);

        match &self.transactions {
            Remote::Ready(txns) if txns.is_empty() => {
                empty(frame, chunks[1], "Transactions", "No transactions for this card yet")
            }
            Remote::Ready(txns) => {
                let items: Vec<ListItem> = txns
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let color = txn_status_color(&t.status);
                        ListItem::new(vec![
                            Line::from(vec![
                                marker(i == self.cursor),
                                Span::styled(
                                    format!("{:<24}", if t.merchant.is_empty() { "Unknown merchant" } else { t.merchant.as_str() }),
                                    Style::default().fg(Color::White),
                                ),
                                Span::styled(
                                    format!("{:>12}", format_money(t.amount)),
                                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                                ),
                            ]),
                            Line::from(vec![
                                Span::styled(
                                    format!("    {}  {}  ", display_timestamp(&t.timestamp), t.r#type),
                                    Style::default().fg(Color::DarkGray),
                                ),
                                Span::styled(t.status.clone(), Style::default().fg(color)),
                            ]),
                        ])
                    })
                    .collect();
                frame.render_widget(List::new(items).block(boxed("Transactions")), chunks[1]);
            }
            other => placeholder(frame, chunks[1], "Transactions", other),
        }

        let error = match &self.transactions {
            Remote::Failed(e) => Some(e.as_str()),
            _ => None,
        };
        footer(frame, foot, &[("D", "Card details"), ("R", "Refresh"), ("Esc", "Back")], error);
    }
}

pub struct CreateCardScreen {
    form: Form,
    card_type: usize,
    submitting: bool,
}

impl CreateCardScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![TextInput::new("Card Limit ($)")]),
            card_type: 0,
            submitting: false,
        }
    }

    pub fn card_type(&self) -> &'static str {
        CARD_TYPES[self.card_type % CARD_TYPES.len()]
    }

    fn submit(&mut self, ctx: &ScreenContext) -> ScreenAction {
        let limit = match validate::positive_amount(self.form.value(0), "Please enter a valid card limit") {
            Ok(limit) => limit,
            Err(e) => return ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
        };
        self.submitting = true;
        ctx.submit(
            Endpoint::CreateVirtualCard,
            serde_json::json!({ "card_limit": limit, "card_type": self.card_type() }),
            Submission::CreateCard,
            "Failed to create card",
        );
        ScreenAction::None
    }
}

impl Screen for CreateCardScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::CreateCard
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if self.submitting {
            return ScreenAction::None;
        }
        match key {
            KeyCode::Left => {
                self.card_type = (self.card_type + CARD_TYPES.len() - 1) % CARD_TYPES.len();
                ScreenAction::None
            }
            KeyCode::Right => {
                self.card_type = (self.card_type + 1) % CARD_TYPES.len();
                ScreenAction::None
            }
            _ => match self.form.handle_key(key) {
                FormInput::Submit => self.submit(ctx),
                _ => ScreenAction::None,
            },
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        let ScreenEvent::Submitted(Submission::CreateCard, result) = event else {
            return ScreenAction::None;
        };
        self.submitting = false;
        match result {
            Ok(_) => ScreenAction::Dialog(
                Dialog::info("Success", "Virtual card created successfully")
                    .then(nav(ScreenKind::Cards, ScreenParams::None)),
            ),
            Err(e) => ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(2), // Subtitle
                Constraint::Length(5), // Card type
                Constraint::Length(3), // Limit
                Constraint::Min(0),
                Constraint::Length(2), // Footer
            ])
            .split(area);

        let status = self.submitting.then_some(("Creating...", Color::Yellow));
        title_bar(frame, chunks[0], "Create Virtual Card", status);

        frame.render_widget(
            Paragraph::new("Create a new virtual card for online payments and transactions")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[1],
        );

        let lines: Vec<Line> = CARD_TYPES
            .iter()
            .map(|t| {
                let selected = *t == self.card_type();
                let description = match *t {
                    "standard" => "Basic features with standard limits and regular protection.",
                    _ => "Premium features with higher limits and advanced protection.",
                };
                let style = if selected {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(vec![
                    marker(selected),
                    Span::styled(format!("{:<10}", t.to_uppercase()), style),
                    Span::styled(description, Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(boxed("Card Type")), chunks[2]);

        self.form.render(frame, chunks[3], !self.submitting);

        footer(
            frame,
            chunks[5],
            &[("←→", "Card type"), ("Enter", "Create Card"), ("Esc", "Back")],
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CallError;
    use crate::dialog::DialogInput;
    use crate::screens::test_context::{context, next_event, user};
    use crate::test_support::{MockResponse, MockServer};
    use serde_json::{json, Value};

    fn card(id: u64, frozen: bool, balance: f64) -> Value {
        json!({
            "id": id,
            "card_number": format!("400000000000000{}", id),
            "cvv": "123",
            "expiry_date": "12/27",
            "card_type": "standard",
            "card_limit": 1000,
            "current_balance": balance,
            "is_frozen": frozen,
            "created_at": "2024-01-01 10:00:00"
        })
    }

    fn cards_route(cards: Vec<Value>) -> MockResponse {
        MockResponse::json("GET", "/api/virtual-cards", 200, json!({"cards": cards}))
    }

    #[tokio::test]
    async fn test_toggle_freeze_flips_locally() {
        let server = MockServer::start(vec![
            cards_route(vec![card(1, false, 50.0), card(2, true, 0.0)]),
            MockResponse::json("POST", "/api/virtual-cards/1/toggle-freeze", 200, json!({"message": "ok"})),
        ])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        let mut screen = CardsScreen::new();
        screen.mount(&ctx);
        let event = next_event(&mut rx).await;
        screen.handle_event(event, &ctx);

        screen.handle_key(KeyCode::Char('f'), &ctx);
        assert!(screen.toggling);
        // a second press while in flight is ignored
        screen.handle_key(KeyCode::Char('f'), &ctx);

        let event = next_event(&mut rx).await;
        let ScreenAction::Dialog(dialog) = screen.handle_event(event, &ctx) else {
            panic!("expected dialog");
        };
        assert_eq!(dialog.message, "Card has been frozen successfully");
        assert!(screen.cards.ready().unwrap()[0].is_frozen);
        assert!(!screen.toggling);

        let toggles = server.requests_to("/api/virtual-cards/1/toggle-freeze");
        assert_eq!(toggles.len(), 1);
        assert_eq!(toggles[0].body_json(), Some(json!({})));
    }

    #[test]
    fn test_cards_keys_navigate_with_selected_id() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let mut screen = CardsScreen::new();
        assert_eq!(screen.handle_key(KeyCode::Enter, &ctx), ScreenAction::None);

        let cards: Vec<VirtualCard> =
            serde_json::from_value(json!([card(4, false, 1.0), card(7, false, 1.0)])).unwrap();
        screen.handle_event(ScreenEvent::Cards(Ok(cards)), &ctx);
        screen.handle_key(KeyCode::Down, &ctx);
        assert_eq!(
            screen.handle_key(KeyCode::Enter, &ctx),
            ScreenAction::Navigate(ScreenKind::CardDetails, ScreenParams::CardDetails { card_id: 7 })
        );
        assert_eq!(
            screen.handle_key(KeyCode::Char('t'), &ctx),
            ScreenAction::Navigate(
                ScreenKind::CardTransactions,
                ScreenParams::CardTransactions { card_id: 7 }
            )
        );
    }

    #[test]
    fn test_card_details_lookup() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let cards: Vec<VirtualCard> =
            serde_json::from_value(json!([card(1, false, 1.0), card(2, false, 1.0)])).unwrap();

        let mut screen = CardDetailsScreen::new(Some(2));
        screen.handle_event(ScreenEvent::Cards(Ok(cards.clone())), &ctx);
        assert_eq!(screen.card.ready().map(|c| c.id), Some(2));

        let mut screen = CardDetailsScreen::new(Some(9));
        screen.handle_event(ScreenEvent::Cards(Ok(cards)), &ctx);
        assert_eq!(screen.card, Remote::Failed("Card not found".into()));

        let mut screen = CardDetailsScreen::new(None);
        screen.mount(&ctx);
        assert_eq!(screen.card, Remote::Failed("Invalid card ID or user session".into()));
    }

    #[test]
    fn test_details_toggle_failure_keeps_state() {
        let (ctx, _rx, _nav) = context("http://127.0.0.1:9", Some(user(false)));
        let cards: Vec<VirtualCard> = serde_json::from_value(json!([card(1, false, 1.0)])).unwrap();
        let mut screen = CardDetailsScreen::new(Some(1));
        screen.handle_event(ScreenEvent::Cards(Ok(cards)), &ctx);
        let action = screen.handle_event(
            ScreenEvent::Submitted(
                Submission::ToggleFreeze { card_id: 1 },
                Err(CallError::Server("Card locked".into())),
            ),
            &ctx,
        );
        assert!(matches!(action, ScreenAction::Dialog(d) if d.message == "Card locked"));
        assert!(!screen.card.ready().unwrap().is_frozen);
    }

    #[tokio::test]
    async fn test_card_transactions_fetches_both() {
        let server = MockServer::start(vec![
            cards_route(vec![card(3, false, 20.0)]),
            MockResponse::json(
                "GET",
                "/api/virtual-cards/3/transactions",
                200,
                json!({"transactions": [
                    {"id": 1, "amount": 9.99, "merchant": "Coffee", "timestamp": "2024-03-01T09:00:00Z", "status": "completed", "type": "payment"}
                ]}),
            ),
        ])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        let mut screen = CardTransactionsScreen::new(Some(3));
        screen.mount(&ctx);
        for _ in 0..2 {
            let event = next_event(&mut rx).await;
            screen.handle_event(event, &ctx);
        }
        assert_eq!(screen.transactions.ready().map(Vec::len), Some(1));
        assert_eq!(screen.card.as_ref().map(|c| c.id), Some(3));
    }

    #[tokio::test]
    async fn test_create_card_flow() {
        let server = MockServer::start(vec![MockResponse::json(
            "POST",
            "/api/virtual-cards/create",
            200,
            json!({"message": "Card created"}),
        )])
        .await;
        let (ctx, mut rx, _nav) = context(&server.url(), Some(user(false)));
        let mut screen = CreateCardScreen::new();

        let ScreenAction::Dialog(d) = screen.handle_key(KeyCode::Enter, &ctx) else {
            panic!("expected dialog");
        };
        assert_eq!(d.message, "Please enter a valid card limit");

        screen.handle_key(KeyCode::Right, &ctx);
        for c in "500".chars() {
            screen.handle_key(KeyCode::Char(c), &ctx);
        }
        screen.handle_key(KeyCode::Enter, &ctx);
        let event = next_event(&mut rx).await;
        let ScreenAction::Dialog(mut dialog) = screen.handle_event(event, &ctx) else {
            panic!("expected dialog");
        };
        assert_eq!(
            dialog.handle_key(KeyCode::Enter),
            DialogInput::Closed(ScreenAction::Navigate(ScreenKind::Cards, ScreenParams::None))
        );
        let body = server.requests_to("/api/virtual-cards/create")[0].body_json();
        assert_eq!(body, Some(json!({"card_limit": 500.0, "card_type": "premium"})));
    }
}
