//! Building blocks shared by the screens.

use crate::client::CallError;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// State of data fetched from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Remote<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Remote<T> {
    pub fn from_result(result: Result<T, CallError>) -> Self {
        match result {
            Ok(value) => Remote::Ready(value),
            Err(e) => Remote::Failed(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// One labelled single-line input.
#[derive(Debug, Clone)]
pub struct TextInput {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

impl TextInput {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
        }
    }

    pub fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(label)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// What a form did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormInput {
    Edited,
    Moved,
    Submit,
    Ignored,
}

/// A vertical stack of inputs with one focused field.
#[derive(Debug, Clone)]
pub struct Form {
    pub inputs: Vec<TextInput>,
    pub focus: usize,
}

impl Form {
    pub fn new(inputs: Vec<TextInput>) -> Self {
        Self { inputs, focus: 0 }
    }

    pub fn value(&self, index: usize) -> &str {
        self.inputs.get(index).map(|i| i.value.as_str()).unwrap_or("")
    }

    pub fn clear(&mut self) {
        for input in &mut self.inputs {
            input.value.clear();
        }
        self.focus = 0;
    }

    pub fn handle_key(&mut self, key: KeyCode) -> FormInput {
        let count = self.inputs.len();
        match key {
            KeyCode::Char(c) => match self.inputs.get_mut(self.focus) {
                Some(input) => {
                    input.value.push(c);
                    FormInput::Edited
                }
                None => FormInput::Ignored,
            },
            KeyCode::Backspace => match self.inputs.get_mut(self.focus) {
                Some(input) => {
                    input.value.pop();
                    FormInput::Edited
                }
                None => FormInput::Ignored,
            },
            KeyCode::Tab | KeyCode::Down if count > 0 => {
                self.focus = (self.focus + 1) % count;
                FormInput::Moved
            }
            KeyCode::BackTab | KeyCode::Up if count > 0 => {
                self.focus = (self.focus + count - 1) % count;
                FormInput::Moved
            }
            KeyCode::Enter => FormInput::Submit,
            _ => FormInput::Ignored,
        }
    }

    /// Rows needed to draw the form.
    pub fn height(&self) -> u16 {
        self.inputs.len() as u16 * 3
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, active: bool) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.inputs
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .chain(std::iter::once(Constraint::Min(0)))
                    .collect::<Vec<_>>(),
            )
            .split(area);

        for (i, input) in self.inputs.iter().enumerate() {
            let focused = active && i == self.focus;
            let border = if focused { Color::Cyan } else { Color::DarkGray };
            let cursor = if focused { "│" } else { "" };
            let shown = if input.masked {
                "•".repeat(input.value.chars().count())
            } else {
                input.value.clone()
            };
            let widget = Paragraph::new(format!("{}{}", shown, cursor))
                .style(Style::default().fg(Color::Cyan))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border))
                        .title(Span::styled(
                            format!(" {} ", input.label),
                            Style::default().fg(Color::White),
                        )),
                );
            frame.render_widget(widget, rows[i]);
        }
    }
}

/// Cursor over a list of `len` rows.
pub fn move_cursor(cursor: usize, len: usize, key: KeyCode) -> usize {
    match key {
        KeyCode::Up | KeyCode::Char('k') => cursor.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') if cursor + 1 < len => cursor + 1,
        _ => cursor,
    }
}

pub fn title_bar(frame: &mut Frame, area: Rect, title: &str, status: Option<(&str, Color)>) {
    let mut spans = vec![Span::styled(
        format!(" {} ", title.to_uppercase()),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if let Some((text, color)) = status {
        spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(text.to_string(), Style::default().fg(color)));
    }
    let title = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(title, area);
}

/// Key hints, or the error in their place.
pub fn footer(frame: &mut Frame, area: Rect, keys: &[(&str, &str)], error: Option<&str>) {
    let line = match error {
        Some(err) => Line::from(vec![
            Span::styled(" ✗ ", Style::default().fg(Color::Red)),
            Span::styled(err.to_string(), Style::default().fg(Color::Red)),
        ]),
        None => {
            let mut spans = Vec::new();
            for (i, (key, label)) in keys.iter().enumerate() {
                let sep = if i == 0 { "" } else { "  " };
                spans.push(Span::styled(
                    format!("{}[{}] ", sep, key),
                    Style::default().fg(Color::DarkGray),
                ));
                spans.push(Span::styled(label.to_string(), Style::default().fg(Color::DarkGray)));
            }
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

/// Loading or error placeholder for a boxed section.
pub fn placeholder<T>(frame: &mut Frame, area: Rect, title: &str, remote: &Remote<T>) {
    let lines = match remote {
        Remote::Loading => vec![
            Line::from(""),
            Line::from(Span::styled("⏳ Loading...", Style::default().fg(Color::Yellow))),
        ],
        Remote::Failed(err) => vec![
            Line::from(""),
            Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::DarkGray)),
                Span::styled("[R]", Style::default().fg(Color::White)),
                Span::styled(" to retry", Style::default().fg(Color::DarkGray)),
            ]),
        ],
        Remote::Ready(_) => Vec::new(),
    };
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(boxed(title)),
        area,
    );
}

/// Empty-list message in a boxed section.
pub fn empty(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(boxed(title)),
        area,
    );
}

pub fn boxed(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(format!(" {} ", title), Style::default().fg(Color::White)))
}

/// `label  value` row.
pub fn detail(label: &str, value: impl Into<String>, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<16}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value.into(), Style::default().fg(color)),
    ])
}

/// Prefix for the highlighted row of a list.
pub fn marker(selected: bool) -> Span<'static> {
    if selected {
        Span::styled("▸ ", Style::default().fg(Color::Cyan))
    } else {
        Span::raw("  ")
    }
}

/// Standard vertical split: title, body, footer.
pub fn frame_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(4),    // Body
            Constraint::Length(2), // Footer
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_editing_and_focus() {
        let mut form = Form::new(vec![TextInput::new("Username"), TextInput::masked("Password")]);
        for c in "bob".chars() {
            assert_eq!(form.handle_key(KeyCode::Char(c)), FormInput::Edited);
        }
        assert_eq!(form.handle_key(KeyCode::Tab), FormInput::Moved);
        form.handle_key(KeyCode::Char('x'));
        form.handle_key(KeyCode::Backspace);
        form.handle_key(KeyCode::Char('p'));
        assert_eq!(form.value(0), "bob");
        assert_eq!(form.value(1), "p");

        form.handle_key(KeyCode::Tab);
        assert_eq!(form.focus, 0);
        form.handle_key(KeyCode::BackTab);
        assert_eq!(form.focus, 1);
        assert_eq!(form.handle_key(KeyCode::Enter), FormInput::Submit);
    }

    #[test]
    fn test_move_cursor() {
        assert_eq!(move_cursor(0, 3, KeyCode::Up), 0);
        assert_eq!(move_cursor(0, 3, KeyCode::Down), 1);
        assert_eq!(move_cursor(2, 3, KeyCode::Down), 2);
        assert_eq!(move_cursor(0, 0, KeyCode::Down), 0);
    }

    #[test]
    fn test_remote_from_result() {
        let r: Remote<u8> = Remote::from_result(Err(CallError::Network));
        assert_eq!(r, Remote::Failed("Network error or server unavailable".into()));
        let r: Remote<u8> = Remote::from_result(Ok(3));
        assert_eq!(r.ready(), Some(&3));
    }
}
