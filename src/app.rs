use std::collections::{HashMap, VecDeque};

use ratatui::text::Line;
use tracing::{info, warn};

use crate::api::{ApiError, ChatClient};
use crate::auth::CredentialStore;
use crate::commands::{self, CommandResult};
use crate::config::Config;
use crate::message::Message;
use crate::scroll::ScrollCalculator;

pub const THINKING_PLACEHOLDER: &str = "Bot is thinking...";
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password";
pub const REGISTERED_NOTICE: &str = "Registration successful. Please log in.";

const WELCOME_LINES: [&str; 2] = [
    "Welcome to the chatbot! Type your questions below.",
    "Type 'exit' to quit.",
];

/// The named views. Exactly one is visible; there is no history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Register,
    Login,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Username,
    Password,
}

/// Input state shared by the register and login views.
pub struct AuthForm {
    pub username: String,
    pub password: String,
    pub focus: FormField,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl AuthForm {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            focus: FormField::Username,
            error: None,
            notice: None,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            FormField::Username => FormField::Password,
            FormField::Password => FormField::Username,
        };
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            FormField::Username => self.username.push(c),
            FormField::Password => self.password.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Username => self.username.pop(),
            FormField::Password => self.password.pop(),
        };
    }
}

impl Default for AuthForm {
    fn default() -> Self {
        Self::new()
    }
}

/// A chat submission accepted by the state machine; the caller runs the
/// network send on a background task and reports back via `complete_turn`.
#[derive(Debug)]
pub struct ChatDispatch {
    pub turn_id: u64,
    pub prompt: String,
}

pub struct App {
    pub view: View,
    pub form: AuthForm,
    pub messages: VecDeque<Message>,
    pub input: String,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub should_quit: bool,
    pub chat: ChatClient,
    store: CredentialStore,
    next_turn_id: u64,
    pending_turns: HashMap<u64, usize>,
}

impl App {
    pub fn new(config: &Config, model: String) -> Self {
        Self::with_store(ChatClient::new(config, model), CredentialStore::new())
    }

    pub fn with_store(chat: ChatClient, store: CredentialStore) -> Self {
        let view = if store.exists() {
            View::Login
        } else {
            View::Register
        };
        info!(?view, "starting view selected");

        App {
            view,
            form: AuthForm::new(),
            messages: VecDeque::new(),
            input: String::new(),
            scroll_offset: 0,
            auto_scroll: true,
            should_quit: false,
            chat,
            store,
            next_turn_id: 0,
            pending_turns: HashMap::new(),
        }
    }

    pub fn submit_register(&mut self) {
        match self.store.register(&self.form.username, &self.form.password) {
            Ok(()) => {
                info!("registration succeeded");
                self.form = AuthForm::new();
                self.form.notice = Some(REGISTERED_NOTICE.to_string());
                self.view = View::Login;
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.form.error = Some(err.to_string());
            }
        }
    }

    /// A missing record, a mismatch, and an unreadable record all surface
    /// as the same generic message.
    pub fn submit_login(&mut self) {
        let matched = match self.store.verify(&self.form.username, &self.form.password) {
            Ok(matched) => matched,
            Err(err) => {
                warn!(error = %err, "credential record unreadable");
                false
            }
        };

        if matched {
            info!("login succeeded");
            self.enter_chat();
        } else {
            warn!("login rejected");
            self.form.error = Some(LOGIN_FAILED_MESSAGE.to_string());
        }
    }

    fn enter_chat(&mut self) {
        self.view = View::Chat;
        for line in WELCOME_LINES {
            self.messages.push_back(Message::app(line));
        }
    }

    /// Interpret the chat input line. Returns a dispatch for the caller to
    /// run when the line is an actual message: the user's line and an
    /// assistant placeholder are appended here, and the placeholder index
    /// is recorded under a fresh turn id so the completion can patch it.
    pub fn submit_chat_input(&mut self) -> Option<ChatDispatch> {
        let input = std::mem::take(&mut self.input);

        match commands::process_input(&input) {
            CommandResult::Continue => None,
            CommandResult::Exit => {
                info!("exit requested from chat view");
                self.should_quit = true;
                None
            }
            CommandResult::ProcessAsMessage(prompt) => {
                self.messages.push_back(Message::user(prompt.clone()));
                self.messages.push_back(Message::assistant(THINKING_PLACEHOLDER));

                let turn_id = self.next_turn_id;
                self.next_turn_id += 1;
                self.pending_turns.insert(turn_id, self.messages.len() - 1);
                self.auto_scroll = true;

                info!(turn = turn_id, "chat turn dispatched");
                Some(ChatDispatch { turn_id, prompt })
            }
        }
    }

    /// Replace the turn's placeholder with the reply, or with the error
    /// rendered as the bot's line. Completions may arrive in any order;
    /// each patches only its own placeholder.
    pub fn complete_turn(&mut self, turn_id: u64, result: Result<String, ApiError>) {
        let index = match self.pending_turns.remove(&turn_id) {
            Some(index) => index,
            None => {
                warn!(turn = turn_id, "completion for unknown turn");
                return;
            }
        };

        let content = match result {
            Ok(reply) => {
                info!(turn = turn_id, "chat turn completed");
                reply
            }
            Err(err) => {
                warn!(turn = turn_id, error = %err, "chat turn failed");
                format!("Error: {err}")
            }
        };

        if let Some(message) = self.messages.get_mut(index) {
            message.content = content;
        }
    }

    pub fn build_display_lines(&self) -> Vec<Line<'static>> {
        ScrollCalculator::build_display_lines(&self.messages)
    }

    pub fn max_scroll_offset(&self, terminal_width: u16, available_height: u16) -> u16 {
        ScrollCalculator::calculate_max_scroll_offset(
            &self.messages,
            terminal_width,
            available_height,
        )
    }

    pub fn scroll_up(&mut self, lines: u16, terminal_width: u16, available_height: u16) {
        let max = self.max_scroll_offset(terminal_width, available_height);
        let base = if self.auto_scroll {
            max
        } else {
            self.scroll_offset.min(max)
        };
        self.auto_scroll = false;
        self.scroll_offset = base.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16, terminal_width: u16, available_height: u16) {
        let max = self.max_scroll_offset(terminal_width, available_height);
        let base = if self.auto_scroll {
            max
        } else {
            self.scroll_offset.min(max)
        };
        self.scroll_offset = base.saturating_add(lines).min(max);
        if self.scroll_offset >= max {
            self.auto_scroll = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use tempfile::TempDir;

    fn test_app(temp_dir: &TempDir) -> App {
        let config = Config {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
        };
        let chat = ChatClient::new(&config, "test-model".to_string());
        let store = CredentialStore::at_path(temp_dir.path().join("user.data"));
        App::with_store(chat, store)
    }

    #[test]
    fn starts_on_register_without_a_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let app = test_app(&temp_dir);
        assert_eq!(app.view, View::Register);
    }

    #[test]
    fn starts_on_login_with_a_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        CredentialStore::at_path(temp_dir.path().join("user.data"))
            .register("alice", "secret")
            .expect("register failed");

        let app = test_app(&temp_dir);
        assert_eq!(app.view, View::Login);
    }

    #[test]
    fn successful_registration_switches_to_login() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.form.username = "alice".to_string();
        app.form.password = "secret".to_string();

        app.submit_register();

        assert_eq!(app.view, View::Login);
        assert_eq!(app.form.notice.as_deref(), Some(REGISTERED_NOTICE));
        assert!(app.form.username.is_empty());
    }

    #[test]
    fn invalid_registration_stays_with_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.form.password = "secret".to_string();

        app.submit_register();

        assert_eq!(app.view, View::Register);
        assert!(app.form.error.is_some());
    }

    #[test]
    fn failed_login_shows_the_generic_message() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.form.username = "alice".to_string();
        app.form.password = "wrong".to_string();

        app.submit_login();

        assert_eq!(app.view, View::Register);
        assert_eq!(app.form.error.as_deref(), Some(LOGIN_FAILED_MESSAGE));
    }

    #[test]
    fn successful_login_enters_chat_with_the_welcome_notice() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.form.username = "alice".to_string();
        app.form.password = "secret".to_string();
        app.submit_register();

        app.form.username = "alice".to_string();
        app.form.password = "secret".to_string();
        app.submit_login();

        assert_eq!(app.view, View::Chat);
        assert_eq!(app.messages.len(), 2);
        assert!(app.messages.iter().all(|m| m.role == Role::App));
    }

    #[test]
    fn exit_terminates_without_dispatching() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.enter_chat();
        let transcript_len = app.messages.len();

        app.input = "EXIT".to_string();
        let dispatch = app.submit_chat_input();

        assert!(dispatch.is_none());
        assert!(app.should_quit);
        assert_eq!(app.messages.len(), transcript_len);
    }

    #[test]
    fn blank_input_is_ignored() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.enter_chat();
        let transcript_len = app.messages.len();

        app.input = "   ".to_string();
        assert!(app.submit_chat_input().is_none());
        assert!(!app.should_quit);
        assert_eq!(app.messages.len(), transcript_len);
    }

    #[test]
    fn submission_appends_the_user_line_and_a_placeholder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.enter_chat();

        app.input = "hello".to_string();
        let dispatch = app.submit_chat_input().expect("dispatch expected");

        assert_eq!(dispatch.prompt, "hello");
        let user = &app.messages[app.messages.len() - 2];
        let placeholder = &app.messages[app.messages.len() - 1];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");
        assert_eq!(placeholder.role, Role::Assistant);
        assert_eq!(placeholder.content, THINKING_PLACEHOLDER);
        assert!(app.input.is_empty());
    }

    #[test]
    fn completions_patch_their_own_turns_out_of_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.enter_chat();
        let base = app.messages.len();

        app.input = "first question".to_string();
        let first = app.submit_chat_input().expect("dispatch expected");
        app.input = "second question".to_string();
        let second = app.submit_chat_input().expect("dispatch expected");

        // The second turn's reply lands before the first one's.
        app.complete_turn(second.turn_id, Ok("second reply".to_string()));
        app.complete_turn(first.turn_id, Ok("first reply".to_string()));

        assert_eq!(app.messages[base].content, "first question");
        assert_eq!(app.messages[base + 1].content, "first reply");
        assert_eq!(app.messages[base + 2].content, "second question");
        assert_eq!(app.messages[base + 3].content, "second reply");
    }

    #[test]
    fn failed_turns_render_inline_as_the_bot_line() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.enter_chat();

        app.input = "hello".to_string();
        let dispatch = app.submit_chat_input().expect("dispatch expected");
        app.complete_turn(
            dispatch.turn_id,
            Err(ApiError::MalformedResponse {
                detail: "no reply in response choices".to_string(),
            }),
        );

        let last = app.messages.back().expect("transcript not empty");
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.starts_with("Error:"));
    }

    #[test]
    fn unknown_turn_completions_are_dropped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.enter_chat();
        let transcript_len = app.messages.len();

        app.complete_turn(99, Ok("stray".to_string()));
        assert_eq!(app.messages.len(), transcript_len);
    }

    #[test]
    fn scrolling_up_disables_auto_scroll_and_bottom_restores_it() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(&temp_dir);
        app.enter_chat();
        for i in 0..20 {
            app.messages.push_back(Message::user(format!("Message {}", i)));
            app.messages.push_back(Message::assistant(format!("Reply {}", i)));
        }

        app.scroll_up(3, 80, 5);
        assert!(!app.auto_scroll);

        let max = app.max_scroll_offset(80, 5);
        app.scroll_down(max, 80, 5);
        assert!(app.auto_scroll);
    }
}
