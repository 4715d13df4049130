//! Transaction history with a sent/received filter.

use crate::{
    client::Endpoint,
    models::{display_timestamp, Transaction},
    navigation::{ScreenKind, ScreenParams, TxFilter},
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

/// Keep the transactions matching `filter` as seen from `account`.
pub fn apply_filter(
    transactions: Vec<Transaction>,
    account: &str,
    filter: Option<TxFilter>,
) -> Vec<Transaction> {
    match filter {
        None => transactions,
        Some(TxFilter::Sent) => transactions
            .into_iter()
            .filter(|t| t.from_account == account)
            .collect(),
        Some(TxFilter::Received) => transactions
            .into_iter()
            .filter(|t| t.to_account == account)
            .collect(),
    }
}

fn next_filter(filter: Option<TxFilter>) -> Option<TxFilter> {
    match filter {
        None => Some(TxFilter::Sent),
        Some(TxFilter::Sent) => Some(TxFilter::Received),
        Some(TxFilter::Received) => None,
    }
}

pub struct TransactionsScreen {
    filter: Option<TxFilter>,
    transactions: Remote<Vec<Transaction>>,
    cursor: usize,
}

impl TransactionsScreen {
    pub fn new(filter: Option<TxFilter>) -> Self {
        Self {
            filter,
            transactions: Remote::Loading,
            cursor: 0,
        }
    }

    fn fetch(&mut self, ctx: &ScreenContext) {
        if ctx.account_number().is_empty() {
            return;
        }
        self.transactions = Remote::Loading;
        ctx.fetch(
            Endpoint::Transactions(ctx.account_number().to_string()),
            true,
            "transactions",
            "Failed to fetch transactions",
            ScreenEvent::Transactions,
        );
    }

    fn refilter(filter: Option<TxFilter>) -> ScreenAction {
        ScreenAction::Navigate(ScreenKind::Transactions, ScreenParams::Transactions { filter })
    }
}

impl Screen for TransactionsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Transactions
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
            KeyCode::Char('a') | KeyCode::Char('A') => Self::refilter(None),
            KeyCode::Char('s') | KeyCode::Char('S') => Self::refilter(Some(TxFilter::Sent)),
            KeyCode::Char('v') | KeyCode::Char('V') => Self::refilter(Some(TxFilter::Received)),
            KeyCode::Tab => Self::refilter(next_filter(self.filter)),
            _ => {
                let len = self.transactions.ready().map(Vec::len).unwrap_or(0);
                self.cursor = move_cursor(self.cursor, len, key);
                ScreenAction::None
            }
        }
    }

    fn handle_event(&mut self, event: ScreenEvent, ctx: &ScreenContext) -> ScreenAction {
        if let ScreenEvent::Transactions(result) = event {
            let filter = self.filter;
            let account = ctx.account_number();
            self.transactions =
                Remote::from_result(result.map(|txs| apply_filter(txs, account, filter)));
            self.cursor = 0;
        }
        ScreenAction::None
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &ScreenContext) {
        let (title, body, foot) = frame_layout(area);
        let status = self.transactions.is_loading().then_some(("Loading...", Color::Yellow));
        title_bar(frame, title, "Transaction History", status);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(body);

        let tab = |label: &'static str, active: bool| {
            if active {
                Span::styled(
                    format!(" {} ", label),
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {} ", label), Style::default().fg(Color::DarkGray))
            }
        };
        let tabs = Paragraph::new(Line::from(vec![
            tab("All", self.filter.is_none()),
            Span::raw(" "),
            tab("Sent", self.filter == Some(TxFilter::Sent)),
            Span::raw(" "),
            tab("Received", self.filter == Some(TxFilter::Received)),
        ]));
        frame.render_widget(tabs, chunks[0]);

        let account = ctx.account_number();
        match &self.transactions {
            Remote::Ready(txs) if txs.is_empty() => {
                empty(frame, chunks[1], "Transactions", "No transactions found")
            }
            Remote::Ready(txs) => {
                let items: Vec<ListItem> = txs
                    .iter()
                    .enumerate()
                    .skip(self.cursor.saturating_sub(8))
                    .map(|(i, t)| {
                        let sent = t.is_sent_by(account);
                        let (label, other, sign, color) = if sent {
                            ("Sent to", &t.to_account, "-", Color::Red)
                        } else {
                            ("Received from", &t.from_account, "+", Color::Green)
                        };
                        let mut lines = vec![
                            Line::from(vec![
                                marker(i == self.cursor),
                                Span::styled(format!("{}: {}", label, other), Style::default().fg(Color::White)),
                                Span::styled(
                                    format!("  {}${:.2}", sign, t.amount.abs()),
                                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                                ),
                            ]),
                            Line::from(Span::styled(
                                format!("    {}", display_timestamp(&t.timestamp)),
                                Style::default().fg(Color::DarkGray),
                            )),
                        ];
                        if let Some(desc) = t.description.as_deref().filter(|d| !d.is_empty()) {
                            lines.push(Line::from(Span::styled(
                                format!("    {}", desc),
                                Style::default().fg(Color::DarkGray),
                            )));
                        }
                        ListItem::new(lines)
                    })
                    .collect();
                let list = List::new(items).block(boxed(&format!("Transactions ({})", txs.len())));
                frame.render_widget(list, chunks[1]);
            }
            other => placeholder(frame, chunks[1], "Transactions", other),
        }

        let error = match &self.transactions {
            Remote::Failed(e) => Some(e.as_str()),
            _ => None,
        };
        footer(
            frame,
            foot,
            &[("A", "All"), ("S", "Sent"), ("V", "Received"), ("R", "Refresh"), ("Esc", "Back")],
            error,
        );
    }
}
