//! Application state machine.

use crate::{
    auth::{self, AdminPolicy, AuthController, LoginOutcome, RegisterOutcome},
    client::ApiClient,
    dialog::{centered, Dialog, DialogInput},
    navigation::{menu_items, MenuTarget, Navigator, ScreenKind, ScreenParams},
    screens::{self, Screen, ScreenAction, ScreenContext, ScreenEvent},
    session::SessionStore,
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Messages for async operations.
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// Result of a task spawned by the screen mounted in `scope`
    Screen { scope: u64, event: ScreenEvent },
    /// Login request finished
    LoginFinished { username: String, outcome: LoginOutcome },
    /// Registration request finished
    RegisterFinished(RegisterOutcome),
}

/// Main application state.
pub struct App {
    auth: AuthController,
    navigator: Navigator,
    screen: Box<dyn Screen>,
    /// Screen kind and scope id the mounted screen was built for.
    mounted: (ScreenKind, u64),
    dialog: Option<Dialog>,
    quit: bool,
    tx: mpsc::Sender<AppMessage>,
}

impl App {
    /// Restore any persisted session and mount the first screen.
    ///
    /// Must run inside a tokio runtime: mounting may start fetches.
    pub fn new(
        client: ApiClient,
        store: SessionStore,
        policy: AdminPolicy,
        tx: mpsc::Sender<AppMessage>,
    ) -> Self {
        let mut auth = AuthController::new(client, store, policy);
        auth.load();
        let navigator = Navigator::new(auth.is_authenticated());
        let kind = navigator.resolve(auth.session());
        let mut app = Self {
            screen: screens::build(kind, navigator.params()),
            mounted: (kind, navigator.scope().id()),
            auth,
            navigator,
            dialog: None,
            quit: false,
            tx,
        };
        let ctx = app.context();
        app.screen.mount(&ctx);
        info!(screen = ?kind, "App started");
        app
    }

    fn context(&self) -> ScreenContext {
        ScreenContext::new(
            self.auth.client().clone(),
            self.auth.session().cloned(),
            self.auth.loading(),
            self.navigator.scope().clone(),
            self.tx.clone(),
        )
    }

    /// Rebuild the mounted screen if the visible screen or its scope changed.
    fn sync(&mut self) {
        let target = self.navigator.resolve(self.auth.session());
        if (target, self.navigator.scope().id()) == self.mounted {
            return;
        }
        // Gating changed the visible screen without a navigation.
        if self.navigator.scope().id() == self.mounted.1 {
            self.navigator.reopen_scope();
        }
        let params = if target == self.navigator.current() {
            self.navigator.params().clone()
        } else {
            ScreenParams::None
        };
        debug!(screen = ?target, stored = ?self.navigator.current(), "Mounting screen");
        self.screen = screens::build(target, &params);
        self.mounted = (target, self.navigator.scope().id());
        let ctx = self.context();
        self.screen.mount(&ctx);
    }

    fn apply(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::None => {}
            ScreenAction::Navigate(kind, params) => self.navigator.navigate(kind, params),
            ScreenAction::Back => self.navigator.go_back(),
            ScreenAction::Login { username, password } => {
                self.auth.begin_login();
                let client = self.auth.client().clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = auth::request_login(&client, &username, &password).await;
                    let _ = tx.send(AppMessage::LoginFinished { username, outcome }).await;
                });
            }
            ScreenAction::Register { username, password } => {
                if self.auth.loading() {
                    return;
                }
                self.auth.begin_register();
                let client = self.auth.client().clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = auth::request_register(&client, &username, &password).await;
                    let _ = tx.send(AppMessage::RegisterFinished(outcome)).await;
                });
            }
            ScreenAction::Logout => self.logout(),
            ScreenAction::Dialog(dialog) => self.dialog = Some(dialog),
            ScreenAction::Command(command) => {
                let ctx = self.context();
                let next = self.screen.handle_command(command, &ctx);
                self.apply(next);
            }
        }
    }

    fn logout(&mut self) {
        self.auth.logout();
        self.navigator.navigate(ScreenKind::Login, ScreenParams::None);
    }

    fn select_menu_item(&mut self) {
        let items = menu_items(self.auth.is_admin());
        let Some(item) = items.get(self.navigator.menu_cursor()) else {
            return;
        };
        match item.target {
            MenuTarget::Screen(kind) => self.navigator.navigate(kind, ScreenParams::None),
            MenuTarget::Logout => self.logout(),
        }
    }

    fn handle_menu_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.navigator.menu_up(),
            KeyCode::Down | KeyCode::Char('j') => {
                let len = menu_items(self.auth.is_admin()).len();
                self.navigator.menu_down(len);
            }
            KeyCode::Enter => self.select_menu_item(),
            KeyCode::Esc | KeyCode::Char('m') | KeyCode::F(2) => self.navigator.close_menu(),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        if let Some(dialog) = self.dialog.as_mut() {
            if let DialogInput::Closed(action) = dialog.handle_key(key) {
                self.dialog = None;
                self.apply(action);
            }
        } else if self.navigator.menu_open() {
            self.handle_menu_key(key);
        } else {
            let authenticated = self.auth.is_authenticated();
            match key {
                KeyCode::Esc => self.navigator.go_back(),
                KeyCode::F(2) if authenticated => self.navigator.toggle_menu(),
                KeyCode::Char('m') if authenticated && !self.screen.captures_text() => {
                    self.navigator.open_menu()
                }
                _ => {
                    let ctx = self.context();
                    let action = self.screen.handle_key(key, &ctx);
                    self.apply(action);
                }
            }
        }
        self.sync();
    }

    pub fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Screen { scope, event } => {
                if scope != self.mounted.1 {
                    debug!(scope, current = self.mounted.1, "Dropping result for a closed screen");
                    return;
                }
                let ctx = self.context();
                let action = self.screen.handle_event(event, &ctx);
                self.apply(action);
            }
            AppMessage::LoginFinished { username, outcome } => {
                if self.auth.apply_login(&username, outcome) {
                    self.navigator.navigate(ScreenKind::Dashboard, ScreenParams::None);
                } else {
                    self.dialog = Some(Dialog::error("Login Failed", "Invalid username or password"));
                }
            }
            AppMessage::RegisterFinished(outcome) => {
                let outcome = self.auth.finish_register(outcome);
                self.dialog = Some(if outcome.success {
                    Dialog::info("Success", outcome.message)
                        .then(ScreenAction::Navigate(ScreenKind::Login, ScreenParams::None))
                } else {
                    Dialog::error("Registration Failed", outcome.message)
                });
            }
        }
        self.sync();
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let mut header = vec![Span::styled(
            " Vulnerable Bank ",
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        header.push(Span::styled(format!(" {}", self.mounted.0.title()), Style::default().fg(Color::Cyan)));
        if let Some(session) = self.auth.session() {
            header.push(Span::styled(format!("  {}", session.username), Style::default().fg(Color::White)));
            if session.is_admin {
                header.push(Span::styled(" (admin)", Style::default().fg(Color::Yellow)));
            }
            header.push(Span::styled("   [M] Menu", Style::default().fg(Color::DarkGray)));
        }
        frame.render_widget(Paragraph::new(Line::from(header)), chunks[0]);

        let ctx = self.context();
        self.screen.render(frame, chunks[1], &ctx);

        if self.navigator.menu_open() {
            self.render_menu(frame);
        }
        if let Some(dialog) = &self.dialog {
            dialog.render(frame, area);
        }
    }

    fn render_menu(&self, frame: &mut Frame) {
        let items = menu_items(self.auth.is_admin());
        let popup = centered(frame.area(), 40, items.len() as u16 + 2);
        frame.render_widget(Clear, popup);

        let list: Vec<ListItem> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let selected = i == self.navigator.menu_cursor();
                let style = match (selected, item.target) {
                    (true, _) => Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                    (false, MenuTarget::Logout) => Style::default().fg(Color::Red),
                    (false, _) => Style::default().fg(Color::White),
                };
                ListItem::new(Line::from(Span::styled(format!(" {} ", item.label), style)))
            })
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Menu ");
        frame.render_widget(List::new(list).block(block), popup);
    }

    pub fn can_quit(&self) -> bool {
        self.dialog.is_none()
            && !self.navigator.menu_open()
            && matches!(self.mounted.0, ScreenKind::Welcome | ScreenKind::Dashboard)
            && !self.screen.captures_text()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn quit(&mut self) {
        self.quit = true;
    }

    /// The screen actually shown.
    pub fn visible_screen(&self) -> ScreenKind {
        self.mounted.0
    }
}
