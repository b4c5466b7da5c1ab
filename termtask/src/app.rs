//! Application state and event handling.
//!
//! `App` owns everything the renderer reads: the latest session status and
//! task snapshot from the background stack, the view query, and the form
//! state. Key handling returns an optional [`NetCommand`] for the main
//! loop to dispatch; the app itself never touches the network.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use termtask_api::Task;

use crate::auth::SessionStatus;
use crate::config::ClientConfig;
use crate::net::{NetCommand, NetEvent};
use crate::tasks::manager::TaskSnapshot;
use crate::tasks::view::TaskQuery;

/// Which top-level screen is showing, derived from the session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Session status still being resolved; show neither board nor login.
    Splash,
    /// No session; show the login/register form.
    Auth,
    /// Authenticated; show the task board.
    Board,
}

/// Login form mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Exchange existing credentials.
    #[default]
    Login,
    /// Create a new account.
    Register,
}

/// Which login form field has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    /// Display name (register mode only).
    Name,
    /// Email address.
    #[default]
    Email,
    /// Password.
    Password,
}

/// State of the login/register form.
#[derive(Debug, Default)]
pub struct AuthForm {
    /// Login or register.
    pub mode: AuthMode,
    /// Display name (register mode only).
    pub name: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Focused field.
    pub field: AuthField,
    /// True while a submission is in flight.
    pub submitting: bool,
}

impl AuthForm {
    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        // The name field only exists in register mode.
        if self.mode == AuthMode::Login && self.field == AuthField::Name {
            self.field = AuthField::Email;
        }
    }

    fn next_field(&mut self) {
        self.field = match (self.mode, self.field) {
            (AuthMode::Register, AuthField::Name) => AuthField::Email,
            (_, AuthField::Email) => AuthField::Password,
            (AuthMode::Register, AuthField::Password) => AuthField::Name,
            (AuthMode::Login, _) => AuthField::Email,
        };
    }

    fn prev_field(&mut self) {
        self.field = match (self.mode, self.field) {
            (AuthMode::Register, AuthField::Name) => AuthField::Password,
            (AuthMode::Register, AuthField::Email) => AuthField::Name,
            (_, AuthField::Password) => AuthField::Email,
            (AuthMode::Login, _) => AuthField::Password,
        };
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    fn submit(&mut self) -> NetCommand {
        self.submitting = true;
        match self.mode {
            AuthMode::Login => NetCommand::Login {
                email: self.email.clone(),
                password: self.password.clone(),
            },
            AuthMode::Register => NetCommand::Register {
                name: self.name.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
            },
        }
    }
}

/// Which task form field has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskField {
    /// Task title.
    #[default]
    Title,
    /// Task description.
    Description,
}

/// State of the create/edit task overlay.
#[derive(Debug, Default)]
pub struct TaskForm {
    /// Id of the task being edited, `None` when creating.
    pub editing: Option<i64>,
    /// Title input.
    pub title: String,
    /// Description input.
    pub description: String,
    /// Focused field.
    pub field: TaskField,
}

impl TaskForm {
    fn for_edit(task: &Task) -> Self {
        Self {
            editing: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            field: TaskField::Title,
        }
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.field {
            TaskField::Title => &mut self.title,
            TaskField::Description => &mut self.description,
        }
    }

    fn switch_field(&mut self) {
        self.field = match self.field {
            TaskField::Title => TaskField::Description,
            TaskField::Description => TaskField::Title,
        };
    }
}

/// Board focus: the list itself or the search input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardFocus {
    /// Task list has the cursor.
    #[default]
    List,
    /// Search input has the cursor.
    Search,
}

/// Main application state.
pub struct App {
    /// Latest session status from the background stack.
    pub session_status: SessionStatus,
    /// Latest task store snapshot.
    pub snapshot: TaskSnapshot,
    /// Current filter/search/sort configuration.
    pub query: TaskQuery,
    /// Selected index into the visible (projected) list.
    pub selected: usize,
    /// Board focus.
    pub focus: BoardFocus,
    /// Login/register form state.
    pub auth_form: AuthForm,
    /// Create/edit overlay, when open.
    pub task_form: Option<TaskForm>,
    /// Inline error for the active form.
    pub form_error: Option<String>,
    /// Date display format for task creation dates.
    pub date_format: String,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Creates the app in its startup state.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            session_status: SessionStatus::Unchecked,
            snapshot: TaskSnapshot::default(),
            query: TaskQuery::default(),
            selected: 0,
            focus: BoardFocus::default(),
            auth_form: AuthForm::default(),
            task_form: None,
            form_error: None,
            date_format: config.date_format.clone(),
            should_quit: false,
        }
    }

    /// The screen to render, derived from the session status.
    ///
    /// While the stored token is still being checked, neither the board
    /// nor the login form shows (no flash of protected content, no
    /// premature login redirect).
    #[must_use]
    pub const fn screen(&self) -> Screen {
        match self.session_status {
            SessionStatus::Unchecked | SessionStatus::Checking => Screen::Splash,
            SessionStatus::Anonymous => Screen::Auth,
            SessionStatus::Authenticated => Screen::Board,
        }
    }

    /// The visible task list under the current query.
    #[must_use]
    pub fn visible(&self) -> Vec<&Task> {
        self.query.apply(&self.snapshot.tasks)
    }

    /// Id of the currently selected visible task, if any.
    #[must_use]
    pub fn selected_task_id(&self) -> Option<i64> {
        self.visible().get(self.selected).map(|t| t.id)
    }

    /// Applies an event from the background stack.
    pub fn apply_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Session(status) => {
                self.session_status = status;
                match status {
                    SessionStatus::Authenticated => {
                        self.form_error = None;
                        self.auth_form.submitting = false;
                        self.auth_form.password.clear();
                    }
                    SessionStatus::Anonymous => {
                        self.auth_form.submitting = false;
                        self.task_form = None;
                        self.focus = BoardFocus::List;
                        self.query = TaskQuery::default();
                        self.selected = 0;
                    }
                    SessionStatus::Unchecked | SessionStatus::Checking => {}
                }
            }
            NetEvent::Tasks(snapshot) => {
                self.snapshot = snapshot;
                self.clamp_selection();
            }
            NetEvent::FormError(message) => {
                self.form_error = Some(message);
                self.auth_form.submitting = false;
            }
        }
    }

    /// Handles a key event, returning a command to dispatch, if any.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<NetCommand> {
        // Ctrl-C quits from anywhere.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match self.screen() {
            Screen::Splash => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.should_quit = true;
                }
                None
            }
            Screen::Auth => self.handle_auth_key(key),
            Screen::Board => self.handle_board_key(key),
        }
    }

    // -----------------------------------------------------------------
    // Login / register form
    // -----------------------------------------------------------------

    fn handle_auth_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
                self.auth_form.toggle_mode();
                self.form_error = None;
                None
            }
            (KeyCode::Tab | KeyCode::Down, _) => {
                self.auth_form.next_field();
                None
            }
            (KeyCode::BackTab | KeyCode::Up, _) => {
                self.auth_form.prev_field();
                None
            }
            (KeyCode::Enter, _) => {
                if self.auth_form.submitting {
                    return None;
                }
                self.form_error = None;
                Some(self.auth_form.submit())
            }
            (KeyCode::Backspace, _) => {
                self.auth_form.active_value_mut().pop();
                None
            }
            (KeyCode::Char(c), _) => {
                self.auth_form.active_value_mut().push(c);
                None
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------
    // Task board
    // -----------------------------------------------------------------

    fn handle_board_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        if self.task_form.is_some() {
            return self.handle_task_form_key(key);
        }
        if self.focus == BoardFocus::Search {
            return self.handle_search_key(key);
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('l'), KeyModifiers::CONTROL) => Some(NetCommand::Logout),
            (KeyCode::Esc | KeyCode::Char('q'), _) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Up | KeyCode::Char('k'), _) => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            (KeyCode::Down | KeyCode::Char('j'), _) => {
                let last = self.visible().len().saturating_sub(1);
                if self.selected < last {
                    self.selected += 1;
                }
                None
            }
            (KeyCode::Enter | KeyCode::Char(' '), _) => self
                .selected_task_id()
                .map(|id| NetCommand::ToggleTask { id }),
            (KeyCode::Char('n'), _) => {
                self.form_error = None;
                self.task_form = Some(TaskForm::default());
                None
            }
            (KeyCode::Char('e'), _) => {
                self.form_error = None;
                self.task_form = self
                    .visible()
                    .get(self.selected)
                    .copied()
                    .map(TaskForm::for_edit);
                None
            }
            (KeyCode::Char('d'), _) => self
                .selected_task_id()
                .map(|id| NetCommand::DeleteTask { id }),
            (KeyCode::Char('f'), _) => {
                self.query.filter = self.query.filter.cycled();
                self.clamp_selection();
                None
            }
            (KeyCode::Char('s'), _) => {
                self.query.sort = self.query.sort.cycled();
                None
            }
            (KeyCode::Char('/'), _) => {
                self.focus = BoardFocus::Search;
                None
            }
            (KeyCode::Char('r'), _) => Some(NetCommand::FetchTasks),
            _ => None,
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.focus = BoardFocus::List;
            }
            KeyCode::Backspace => {
                self.query.search.pop();
                self.clamp_selection();
            }
            KeyCode::Char(c) => {
                self.query.search.push(c);
                self.clamp_selection();
            }
            _ => {}
        }
        None
    }

    fn handle_task_form_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        let form = self.task_form.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.task_form = None;
                self.form_error = None;
                None
            }
            KeyCode::Tab | KeyCode::BackTab => {
                form.switch_field();
                None
            }
            KeyCode::Enter => {
                if form.title.trim().is_empty() {
                    // Same check the store repeats before the network call.
                    self.form_error = Some("task title cannot be empty".to_string());
                    return None;
                }
                let command = match form.editing {
                    Some(id) => NetCommand::UpdateTask {
                        id,
                        title: Some(form.title.trim().to_string()),
                        description: Some(form.description.trim().to_string()),
                    },
                    None => NetCommand::CreateTask {
                        title: form.title.trim().to_string(),
                        description: form.description.trim().to_string(),
                    },
                };
                self.task_form = None;
                self.form_error = None;
                Some(command)
            }
            KeyCode::Backspace => {
                form.active_value_mut().pop();
                None
            }
            KeyCode::Char(c) => {
                form.active_value_mut().push(c);
                None
            }
            _ => None,
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}
