//! Dashboard with quick actions.

use crate::{
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{boxed, footer, marker, move_cursor, title_bar},
        Screen, ScreenAction, ScreenContext,
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

struct QuickAction {
    title: &'static str,
    description: &'static str,
    screen: ScreenKind,
}

const QUICK_ACTIONS: [QuickAction; 6] = [
    QuickAction {
        title: "Check Balance",
        description: "View your current account balance",
        screen: ScreenKind::Balance,
    },
    QuickAction {
        title: "Money Transfer",
        description: "Send money to other accounts",
        screen: ScreenKind::Transfer,
    },
    QuickAction {
        title: "Transaction History",
        description: "View your recent transactions",
        screen: ScreenKind::Transactions,
    },
    QuickAction {
        title: "Loans",
        description: "Apply for a new loan",
        screen: ScreenKind::Loans,
    },
    QuickAction {
        title: "Virtual Cards",
        description: "Manage your virtual payment cards",
        screen: ScreenKind::Cards,
    },
    QuickAction {
        title: "Bill Payments",
        description: "Pay your bills online",
        screen: ScreenKind::Bills,
    },
];

const ADMIN_ACTION: QuickAction = QuickAction {
    title: "Admin Panel",
    description: "Access administrative functions",
    screen: ScreenKind::Admin,
};

fn actions(is_admin: bool) -> Vec<&'static QuickAction> {
    let mut items: Vec<&'static QuickAction> = QUICK_ACTIONS.iter().collect();
    if is_admin {
        items.push(&ADMIN_ACTION);
    }
    items
}

pub struct DashboardScreen {
    cursor: usize,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }
}

impl Screen for DashboardScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Dashboard
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        let items = actions(ctx.is_admin());
        match key {
            KeyCode::Enter => items
                .get(self.cursor)
                .map(|a| ScreenAction::Navigate(a.screen, ScreenParams::None))
                .unwrap_or(ScreenAction::None),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                items
                    .get(index)
                    .map(|a| ScreenAction::Navigate(a.screen, ScreenParams::None))
                    .unwrap_or(ScreenAction::None)
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                ScreenAction::Navigate(ScreenKind::Profile, ScreenParams::None)
            }
            _ => {
                self.cursor = move_cursor(self.cursor, items.len(), key);
                ScreenAction::None
            }
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &ScreenContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(4), // Welcome card
                Constraint::Min(8),    // Quick actions
                Constraint::Length(2), // Footer
            ])
            .split(area);

        title_bar(frame, chunks[0], "Dashboard", None);

        let (username, account) = match &ctx.session {
            Some(s) => (s.username.as_str(), s.account_number.as_str()),
            None => ("User", ""),
        };
        let account = if account.is_empty() { "Not available" } else { account };
        let welcome = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("  Welcome back, {}", username),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("  Account: {}", account),
                Style::default().fg(Color::Cyan),
            )),
        ])
        .block(boxed("Account"));
        frame.render_widget(welcome, chunks[1]);

        let items: Vec<ListItem> = actions(ctx.is_admin())
            .into_iter()
            .enumerate()
            .map(|(i, action)| {
                let selected = i == self.cursor;
                let title_style = if selected {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(vec![
                    Line::from(vec![
                        marker(selected),
                        Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                        Span::styled(action.title, title_style),
                    ]),
                    Line::from(Span::styled(
                        format!("     {}", action.description),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();
        frame.render_widget(List::new(items).block(boxed("Quick Actions")), chunks[2]);

        footer(
            frame,
            chunks[3],
            &[("↑↓", "Select"), ("Enter", "Open"), ("P", "Profile"), ("M", "Menu"), ("q", "Quit")],
            None,
        );
    }
}
