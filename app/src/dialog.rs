//! Modal alerts and confirmations drawn over the current screen.

use crate::screens::ScreenAction;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Error,
    Confirm { accept: &'static str },
}

/// An alert. `then` runs when it is acknowledged (or, for a confirmation,
/// accepted).
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub kind: DialogKind,
    then: Option<Box<ScreenAction>>,
}

/// Result of feeding a key to an open dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogInput {
    Open,
    Closed(ScreenAction),
}

impl Dialog {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: DialogKind::Info,
            then: None,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Error,
            ..Self::info(title, message)
        }
    }

    pub fn confirm(
        title: impl Into<String>,
        message: impl Into<String>,
        accept: &'static str,
        on_accept: ScreenAction,
    ) -> Self {
        Self {
            kind: DialogKind::Confirm { accept },
            then: Some(Box::new(on_accept)),
            ..Self::info(title, message)
        }
    }

    pub fn then(mut self, action: ScreenAction) -> Self {
        self.then = Some(Box::new(action));
        self
    }

    fn follow_up(&mut self) -> ScreenAction {
        self.then
            .take()
            .map(|a| *a)
            .unwrap_or(ScreenAction::None)
    }

    pub fn handle_key(&mut self, key: KeyCode) -> DialogInput {
        match self.kind {
            DialogKind::Confirm { .. } => match key {
                KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                    DialogInput::Closed(self.follow_up())
                }
                KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                    DialogInput::Closed(ScreenAction::None)
                }
                _ => DialogInput::Open,
            },
            DialogKind::Info | DialogKind::Error => match key {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                    DialogInput::Closed(self.follow_up())
                }
                _ => DialogInput::Open,
            },
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup = centered(area, 50, 9);
        frame.render_widget(Clear, popup);

        let accent = match self.kind {
            DialogKind::Info => Color::Green,
            DialogKind::Error => Color::Red,
            DialogKind::Confirm { .. } => Color::Yellow,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let message = Paragraph::new(self.message.as_str())
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[0]);

        let buttons = match self.kind {
            DialogKind::Confirm { accept } => Line::from(vec![
                Span::styled("[Enter] ", Style::default().fg(Color::DarkGray)),
                Span::styled(accept, Style::default().fg(accent)),
                Span::styled("  [Esc] ", Style::default().fg(Color::DarkGray)),
                Span::styled("Cancel", Style::default().fg(Color::DarkGray)),
            ]),
            _ => Line::from(vec![
                Span::styled("[Enter] ", Style::default().fg(Color::DarkGray)),
                Span::styled("OK", Style::default().fg(accent)),
            ]),
        };
        frame.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[1]);
    }
}

/// A `width`% wide, `height` rows tall rect in the middle of `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width) / 2),
            Constraint::Percentage(width),
            Constraint::Percentage((100 - width) / 2),
        ])
        .split(vertical[1])[1]
}
