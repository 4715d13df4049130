//! Profile: account details and local preferences.

use crate::{
    dialog::Dialog,
    navigation::ScreenKind,
    screens::{
        widgets::{boxed, detail, footer, marker, move_cursor, title_bar},
        Screen, ScreenAction, ScreenContext,
    },
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Preference toggles. Kept only while the screen is mounted.
#[derive(Debug, Clone, PartialEq)]
struct Setting {
    title: &'static str,
    description: &'static str,
    enabled: bool,
}

pub struct ProfileScreen {
    settings: Vec<Setting>,
    cursor: usize,
}

impl ProfileScreen {
    pub fn new() -> Self {
        let setting = |title, description, enabled| Setting {
            title,
            description,
            enabled,
        };
        Self {
            settings: vec![
                setting("Push Notifications", "Receive account notifications", true),
                setting("Biometric Login", "Login with face or fingerprint", false),
                setting("Dark Mode", "Toggle dark mode appearance", true),
                setting("Transaction Alerts", "Get alerted for all transactions", true),
            ],
            cursor: 0,
        }
    }
}

impl Screen for ProfileScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Profile
    }

    fn handle_key(&mut self, key: KeyCode, _ctx: &ScreenContext) -> ScreenAction {
        match key {
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(setting) = self.settings.get_mut(self.cursor) {
                    setting.enabled = !setting.enabled;
                }
                ScreenAction::None
            }
            KeyCode::Char('l') | KeyCode::Char('L') => ScreenAction::Dialog(Dialog::confirm(
                "Logout Confirmation",
                "Are you sure you want to logout?",
                "Logout",
                ScreenAction::Logout,
            )),
            _ => {
                self.cursor = move_cursor(self.cursor, self.settings.len(), key);
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
                Constraint::Length(4), // Avatar
                Constraint::Length(6), // Account details
                Constraint::Min(6),    // Settings
                Constraint::Length(2), // Footer
            ])
            .split(area);

        title_bar(frame, chunks[0], "Profile", None);

        let session = ctx.session.as_ref();
        let username = session.map(|s| s.username.as_str()).unwrap_or("User");
        let account = session
            .map(|s| s.account_number.as_str())
            .filter(|a| !a.is_empty())
            .unwrap_or("N/A");
        let initial = session.map(|s| s.initial()).unwrap_or('U');

        let avatar = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    format!(" {} ", initial),
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", username), Style::default().fg(Color::White)),
            ]),
            Line::from(Span::styled(
                format!("Account: {}", account),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(avatar, chunks[1]);

        let account_type = if ctx.is_admin() { "Administrator" } else { "Regular User" };
        let details = Paragraph::new(vec![
            detail("Username", username, Color::White),
            detail("Account Number", account, Color::White),
            detail("Account Status", "Active", Color::Green),
            detail("Account Type", account_type, Color::White),
        ])
        .block(boxed("Account Details"));
        frame.render_widget(details, chunks[2]);

        let lines: Vec<Line> = self
            .settings
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let (state, color) = if s.enabled { ("[on] ", Color::Green) } else { ("[off]", Color::DarkGray) };
                Line::from(vec![
                    marker(i == self.cursor),
                    Span::styled(format!("{} ", state), Style::default().fg(color)),
                    Span::styled(format!("{:<20}", s.title), Style::default().fg(Color::White)),
                    Span::styled(s.description, Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(boxed("Settings")), chunks[3]);

        footer(
            frame,
            chunks[4],
            &[("↑↓", "Select"), ("Space", "Toggle"), ("L", "Logout"), ("Esc", "Back")],
            None,
        );
    }
}
