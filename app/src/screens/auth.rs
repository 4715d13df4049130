//! Public screens: welcome, login, registration and password reset.

use crate::{
    client::Endpoint,
    dialog::Dialog,
    navigation::{ScreenKind, ScreenParams},
    screens::{
        widgets::{footer, title_bar, Form, FormInput, TextInput},
        Screen, ScreenAction, ScreenContext, ScreenEvent, Submission,
    },
    validate,
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const BANK_ASCII: &str = r#"
        ___________________
       /  VULNERABLE BANK  \
      /_____________________\
       |  _   _   _   _   |
       | | | | | | | | | ||
       | |_| |_| |_| |_| ||
      _|___________________|_
     |_______________________|
"#;

fn goto(kind: ScreenKind) -> ScreenAction {
    ScreenAction::Navigate(kind, ScreenParams::None)
}

/// Title, subtitle, form, footer.
fn form_layout(area: Rect, form: &Form) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(form.height()),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[4]]
}

fn subtitle(frame: &mut Frame, area: Rect, text: &str) {
    frame.render_widget(
        Paragraph::new(text.to_string())
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center),
        area,
    );
}

pub struct WelcomeScreen;

impl WelcomeScreen {
    pub fn new() -> Self {
        Self
    }
}

impl Screen for WelcomeScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Welcome
    }

    fn handle_key(&mut self, key: KeyCode, _ctx: &ScreenContext) -> ScreenAction {
        match key {
            KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::Enter => goto(ScreenKind::Login),
            KeyCode::Char('r') | KeyCode::Char('R') => goto(ScreenKind::Register),
            _ => ScreenAction::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(10), // Banner
                Constraint::Length(5),  // Tagline
                Constraint::Min(3),     // Actions
                Constraint::Length(2),  // Footer
            ])
            .split(area);

        let banner = Paragraph::new(BANK_ASCII)
            .style(Style::default().fg(Color::LightBlue))
            .alignment(Alignment::Center);
        frame.render_widget(banner, chunks[0]);

        let tagline = Paragraph::new(vec![
            Line::from(Span::styled(
                "Banking Made Simple & InSecure",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "This is an intentionally vulnerable application, designed for everyone to practice application security.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
        frame.render_widget(tagline, chunks[1]);

        let actions = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("[L] ", Style::default().fg(Color::Cyan)),
                Span::styled("Login", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("[R] ", Style::default().fg(Color::Cyan)),
                Span::styled("Register", Style::default().fg(Color::White)),
            ]),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(actions, chunks[2]);

        footer(frame, chunks[3], &[("q", "Quit")], None);
    }
}

pub struct LoginScreen {
    form: Form,
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![TextInput::new("Username"), TextInput::masked("Password")]),
        }
    }
}

impl Screen for LoginScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Login
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        match key {
            KeyCode::F(3) => return goto(ScreenKind::Register),
            KeyCode::F(4) => return goto(ScreenKind::ForgotPassword),
            _ => {}
        }
        if ctx.auth_loading {
            return ScreenAction::None;
        }
        match self.form.handle_key(key) {
            FormInput::Submit => {
                let username = self.form.value(0);
                let password = self.form.value(1);
                if let Err(e) = validate::require_all(&[username, password], "Please fill in all fields") {
                    return ScreenAction::Dialog(Dialog::error("Error", e.to_string()));
                }
                ScreenAction::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &ScreenContext) {
        let [title, sub, form, foot] = form_layout(area, &self.form);
        let status = ctx.auth_loading.then_some(("Signing in...", Color::Yellow));
        title_bar(frame, title, "Welcome Back", status);
        subtitle(frame, sub, "Sign in to your account");
        self.form.render(frame, form, !ctx.auth_loading);
        footer(
            frame,
            foot,
            &[("Enter", "Login"), ("Tab", "Next field"), ("F3", "Register"), ("F4", "Forgot password")],
            None,
        );
    }
}

pub struct RegisterScreen {
    form: Form,
}

impl RegisterScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![TextInput::new("Username"), TextInput::masked("Password")]),
        }
    }
}

impl Screen for RegisterScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Register
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if key == KeyCode::F(3) {
            return goto(ScreenKind::Login);
        }
        if ctx.auth_loading {
            return ScreenAction::None;
        }
        match self.form.handle_key(key) {
            FormInput::Submit => {
                let username = self.form.value(0);
                let password = self.form.value(1);
                if let Err(e) = validate::require_all(&[username, password], "Please fill in all fields") {
                    return ScreenAction::Dialog(Dialog::error("Error", e.to_string()));
                }
                ScreenAction::Register {
                    username: username.to_string(),
                    password: password.to_string(),
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &ScreenContext) {
        let [title, sub, form, foot] = form_layout(area, &self.form);
        let status = ctx.auth_loading.then_some(("Creating account...", Color::Yellow));
        title_bar(frame, title, "Create Account", status);
        subtitle(frame, sub, "Sign up to get started with Vulnerable Bank");
        self.form.render(frame, form, !ctx.auth_loading);
        footer(
            frame,
            foot,
            &[("Enter", "Create account"), ("Tab", "Next field"), ("F3", "Login")],
            None,
        );
    }
}

pub struct ForgotPasswordScreen {
    form: Form,
    submitting: bool,
}

impl ForgotPasswordScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![TextInput::new("Username")]),
            submitting: false,
        }
    }
}

impl Screen for ForgotPasswordScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::ForgotPassword
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if key == KeyCode::F(3) {
            return goto(ScreenKind::Login);
        }
        if self.submitting {
            return ScreenAction::None;
        }
        if self.form.handle_key(key) != FormInput::Submit {
            return ScreenAction::None;
        }
        let username = self.form.value(0).trim().to_string();
        if let Err(e) = validate::require_all(&[&username], "Please enter your username") {
            return ScreenAction::Dialog(Dialog::error("Error", e.to_string()));
        }
        self.submitting = true;
        ctx.submit(
            Endpoint::RequestPasswordReset,
            serde_json::json!({ "username": username }),
            Submission::RequestReset,
            "Failed to process request",
        );
        ScreenAction::None
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        let ScreenEvent::Submitted(Submission::RequestReset, result) = event else {
            return ScreenAction::None;
        };
        self.submitting = false;
        match result {
            Ok(_) => ScreenAction::Dialog(
                Dialog::info(
                    "Success",
                    "Reset PIN has been sent to your registered email address.",
                )
                .then(goto(ScreenKind::ResetPassword)),
            ),
            Err(e) => ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let [title, sub, form, foot] = form_layout(area, &self.form);
        let status = self.submitting.then_some(("Sending...", Color::Yellow));
        title_bar(frame, title, "Forgot Password", status);
        subtitle(frame, sub, "Enter your username to receive a reset PIN");
        self.form.render(frame, form, !self.submitting);
        footer(
            frame,
            foot,
            &[("Enter", "Request reset PIN"), ("F3", "Back to login")],
            None,
        );
    }
}

pub struct ResetPasswordScreen {
    form: Form,
    submitting: bool,
}

impl ResetPasswordScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                TextInput::new("Username"),
                TextInput::new("Reset PIN"),
                TextInput::masked("New Password"),
            ]),
            submitting: false,
        }
    }
}

impl Screen for ResetPasswordScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::ResetPassword
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyCode, ctx: &ScreenContext) -> ScreenAction {
        if key == KeyCode::F(3) {
            return goto(ScreenKind::Login);
        }
        if self.submitting || self.form.handle_key(key) != FormInput::Submit {
            return ScreenAction::None;
        }
        let (username, pin, password) = (self.form.value(0), self.form.value(1), self.form.value(2));
        if let Err(e) = validate::require_all(&[username, pin, password], "Please fill in all fields") {
            return ScreenAction::Dialog(Dialog::error("Error", e.to_string()));
        }
        let body = serde_json::json!({
            "username": username.trim(),
            "reset_pin": pin.trim(),
            "new_password": password,
        });
        self.submitting = true;
        ctx.submit(
            Endpoint::ConfirmPasswordReset,
            body,
            Submission::ConfirmReset,
            "Failed to reset password",
        );
        ScreenAction::None
    }

    fn handle_event(&mut self, event: ScreenEvent, _ctx: &ScreenContext) -> ScreenAction {
        let ScreenEvent::Submitted(Submission::ConfirmReset, result) = event else {
            return ScreenAction::None;
        };
        self.submitting = false;
        match result {
            Ok(_) => ScreenAction::Dialog(
                Dialog::info("Success", "Your password has been reset successfully!")
                    .then(goto(ScreenKind::Login)),
            ),
            Err(e) => ScreenAction::Dialog(Dialog::error("Error", e.to_string())),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &ScreenContext) {
        let [title, sub, form, foot] = form_layout(area, &self.form);
        let status = self.submitting.then_some(("Resetting...", Color::Yellow));
        title_bar(frame, title, "Reset Password", status);
        subtitle(
            frame,
            sub,
            "Enter the PIN received in your email to reset your password",
        );
        self.form.render(frame, form, !self.submitting);
        footer(
            frame,
            foot,
            &[("Enter", "Reset password"), ("Tab", "Next field"), ("F3", "Back to login")],
            None,
        );
    }
}
