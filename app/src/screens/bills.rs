//! Bill payments: history, then category and biller selection.

use crate::{
    client::Endpoint,
    models::{display_timestamp, format_money, BillCategory, BillPayment, Biller},
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{boxed, empty, footer, frame_layout, marker, move_cursor, placeholder, title_bar, Remote},
        Screen, ScreenAction, ScreenContext, ScreenEvent,
    },
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

fn status_color(status: &str) -> Color {
    match status.to_lowercase().as_str() {
        "completed" | "successful" => Color::Green,
        "pending" => Color::Yellow,
        "failed" => Color::Red,
        _ => Color::DarkGray,
    }
}

/// How a past payment was funded.
pub fn funding_label(payment: &BillPayment) -> String {
    match (payment.payment_method.as_str(), payment.card_number.as_deref()) {
        ("virtual_card", Some(number)) => {
            let start = number.len().saturating_sub(4);
            format!("Card ending in {}", number.get(start..).unwrap_or(number))
        }
        ("virtual_card", None) => "Virtual Card".to_string(),
        _ => "Account Balance".to_string(),
    }
}

fn failed_message<T>(remote: &Remote<T>) -> Option<&str> {
    match remote {
        Remote::Failed(e) => Some(e.as_str()),
        _ => None,
    }
}

pub struct BillsScreen {
    history: Remote<Vec<BillPayment>>,
    cursor: usize,
}

impl BillsScreen {
    pub fn new() -> Self {
        Self {
            history: Remote::Loading,
            cursor: 0,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        self.history = Remote::Loading;
        ctx.fetch(
            Endpoint::BillPaymentHistory,
            true,
            "payments",
            "Failed to fetch payment history",
            ScreenEvent::BillHistory,
        );
    }
}

impl Screen for BillsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Bills
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
            KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char('n') | KeyCode::Char('N') => {
                ScreenAction::Navigate(ScreenKind::SelectBillCategory, ScreenParams::None)
            }
            _ => {
                let len = self.history.ready().map(Vec::len).unwrap_or(0);
                self.cursor = move_cursor(self.cursor, len, key);
                ScreenAction::None
            }
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        if let ScreenEvent::BillHistory(result) = event {
            self.history = Remote::from_result(result);
            self.cursor = 0;
        }
        ScreenAction::None
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = self.history.is_loading().then_some(("Loading...", Color::Yellow));
        title_bar(frame, title, "Bill Payments", status);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(body);
        frame.render_widget(
            Paragraph::new("Pay all your bills in one place").style(Style::default().fg(Color::DarkGray)),
            chunks[0],
        );

        match &self.history {
            Remote::Ready(payments) if payments.is_empty() => {
                empty(frame, chunks[1], "Payment History", "No bill payment history found")
            }
            Remote::Ready(payments) => {
                let items: Vec<ListItem> = payments
                    .iter()
                    .enumerate()
                    .skip(self.cursor.saturating_sub(6))
                    .map(|(i, p)| {
                        let mut lines = vec![
                            Line::from(vec![
                                marker(i == self.cursor),
                                Span::styled(
                                    format!("{:<12}", format_money(p.amount)),
                                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                                ),
                                Span::styled(
                                    format!("{:<24}", p.biller_name),
                                    Style::default().fg(Color::White),
                                ),
                                Span::styled(p.status.clone(), Style::default().fg(status_color(&p.status))),
                            ]),
                            Line::from(Span::styled(
                                format!(
                                    "    {} · {} · {}",
                                    p.category_name,
                                    funding_label(p),
                                    display_timestamp(&p.created_at)
                                ),
                                Style::default().fg(Color::DarkGray),
                            )),
                        ];
                        if let Some(desc) = p.description.as_deref().filter(|d| !d.is_empty()) {
                            lines.push(Line::from(Span::styled(
                                format!("    {}", desc),
                                Style::default().fg(Color::DarkGray),
                            )));
                        }
                        ListItem::new(lines)
                    })
                    .collect();
                frame.render_widget(List::new(items).block(boxed("Payment History")), chunks[1]);
            }
            other => placeholder(frame, chunks[1], "Payment History", other),
        }

        footer(
            frame,
            foot,
            &[("P", "Pay a Bill"), ("R", "Refresh"), ("Esc", "Back")],
            failed_message(&self.history),
        );
    }
}

pub struct SelectCategoryScreen {
    categories: Remote<Vec<BillCategory>>,
    cursor: usize,
}

impl SelectCategoryScreen {
    pub fn new() -> Self {
        Self {
            categories: Remote::Loading,
            cursor: 0,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        self.categories = Remote::Loading;
        ctx.fetch(
            Endpoint::BillCategories,
            false,
            "categories",
            "Failed to fetch bill categories",
            ScreenEvent::BillCategories,
        );
    }
}

impl Screen for SelectCategoryScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::SelectBillCategory
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
            KeyCode::Enter => match self.categories.ready().and_then(|c| c.get(self.cursor)) {
                Some(category) => ScreenAction::Navigate(
                    ScreenKind::SelectBiller,
                    ScreenParams::SelectBiller {
                        category_id: category.id,
                    },
                ),
                None => ScreenAction::None,
            },
            _ => {
                let len = self.categories.ready().map(Vec::len).unwrap_or(0);
                self.cursor = move_cursor(self.cursor, len, key);
                ScreenAction::None
            }
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        if let ScreenEvent::BillCategories(result) = event {
            self.categories = Remote::from_result(result);
            self.cursor = 0;
        }
        ScreenAction::None
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = self.categories.is_loading().then_some(("Loading...", Color::Yellow));
        title_bar(frame, title, "Pay Bill · Bill Category", status);

        match &self.categories {
            Remote::Ready(categories) if categories.is_empty() => {
                empty(frame, body, "Bill Category", "No bill categories available")
            }
            Remote::Ready(categories) => {
                let items: Vec<ListItem> = categories
                    .iter()
                    .enumerate()
                    .map(|(i, c)| {
                        ListItem::new(Line::from(vec![
                            marker(i == self.cursor),
                            Span::styled(
                                format!("{:<20}", c.name),
                                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(c.description.clone(), Style::default().fg(Color::DarkGray)),
                        ]))
                    })
                    .collect();
                frame.render_widget(List::new(items).block(boxed("Bill Category")), body);
            }
            other => placeholder(frame, body, "Bill Category", other),
        }

        footer(
            frame,
            foot,
            &[("↑↓", "Select"), ("Enter", "Choose"), ("Esc", "Back")],
            failed_message(&self.categories),
        );
    }
}

pub struct SelectBillerScreen {
    category_id: Option<u64>,
    billers: Remote<Vec<Biller>>,
    cursor: usize,
}

impl SelectBillerScreen {
    pub fn new(category_id: Option<u64>) -> Self {
        Self {
            category_id,
            billers: Remote::Loading,
            cursor: 0,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        let Some(category_id) = self.category_id else {
            self.billers = Remote::Failed("No bill category selected".into());
            return;
        };
        self.billers = Remote::Loading;
        ctx.fetch(
            Endpoint::BillersByCategory(category_id),
            false,
            "billers",
            "Failed to fetch billers",
            ScreenEvent::Billers,
        );
    }
}

impl Screen for SelectBillerScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::SelectBiller
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
            KeyCode::Enter => {
                let selected = self.billers.ready().and_then(|b| b.get(self.cursor));
                match (self.category_id, selected) {
                    (Some(category_id), Some(biller)) => ScreenAction::Navigate(
                        ScreenKind::PaymentMethod,
                        ScreenParams::PaymentMethod {
                            category_id,
                            biller_id: biller.id,
                            amount: biller.minimum_amount,
                        },
                    ),
                    _ => ScreenAction::None,
                }
            }
            _ => {
                let len = self.billers.ready().map(Vec::len).unwrap_or(0);
                self.cursor = move_cursor(self.cursor, len, key);
                ScreenAction::None
            }
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        if let ScreenEvent::Billers(result) = event {
            self.billers = Remote::from_result(result);
            self.cursor = 0;
        }
        ScreenAction::None
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = self.billers.is_loading().then_some(("Loading...", Color::Yellow));
        title_bar(frame, title, "Pay Bill · Select Biller", status);

        match &self.billers {
            Remote::Ready(billers) if billers.is_empty() => {
                empty(frame, body, "Select Biller", "No billers found for this category")
            }
            Remote::Ready(billers) => {
                let items: Vec<ListItem> = billers
                    .iter()
                    .enumerate()
                    .map(|(i, b)| {
                        let mut limits = format!("Min: {}", format_money(b.minimum_amount));
                        if let Some(max) = b.maximum() {
                            limits.push_str(&format!("  Max: {}", format_money(max)));
                        }
                        ListItem::new(Line::from(vec![
                            marker(i == self.cursor),
                            Span::styled(format!("{:<28}", b.name), Style::default().fg(Color::White)),
                            Span::styled(limits, Style::default().fg(Color::DarkGray)),
                        ]))
                    })
                    .collect();
                frame.render_widget(List::new(items).block(boxed("Select Biller")), body);
            }
            other => placeholder(frame, body, "Select Biller", other),
        }

        footer(
            frame,
            foot,
            &[("↑↓", "Select"), ("Enter", "Choose"), ("Esc", "Back")],
            failed_message(&self.billers),
        );
    }
}
