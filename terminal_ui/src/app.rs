use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use taskflow_client::{ClientError, TaskSession};
use taskflow_shared::{Category, CategoryId, Filter, FilterCounts, Priority, Task, TaskDraft, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Tasks,
    Completed,
    Categories,
}

impl View {
    pub const ALL: [View; 3] = [View::Tasks, View::Completed, View::Categories];

    pub fn title(&self) -> &'static str {
        match self {
            View::Tasks => "Tasks",
            View::Completed => "Completed",
            View::Categories => "Categories",
        }
    }

    fn next(self) -> Self {
        match self {
            View::Tasks => View::Completed,
            View::Completed => View::Categories,
            View::Categories => View::Tasks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Search,
    Add,
}

/// Work the event loop hands to a background task.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Reload,
    Create(TaskDraft),
    Toggle(TaskId),
    Delete(TaskId),
    DeleteCategory(CategoryId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// What the session held at the last redraw.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub visible: Vec<Task>,
    pub counts: FilterCounts,
    pub completed: Vec<Task>,
    pub categories: Vec<Category>,
    pub pending: Vec<TaskId>,
    pub tasks_loaded: bool,
    pub categories_loaded: bool,
}

impl Snapshot {
    pub fn capture(session: &TaskSession, filter: Filter, query: &str) -> Self {
        let view = session.view(filter, query);
        Self {
            visible: view.visible,
            counts: view.counts,
            completed: session.completed_tasks(),
            categories: session.categories(),
            pending: session
                .pending_mutations()
                .into_iter()
                .filter(|mutation| mutation.collection == "tasks")
                .filter_map(|mutation| mutation.record_id)
                .collect(),
            tasks_loaded: session.tasks().is_loaded(),
            categories_loaded: session.category_repository().is_loaded(),
        }
    }

    pub fn category(&self, id: Option<CategoryId>) -> Option<&Category> {
        id.and_then(|id| self.categories.iter().find(|category| category.id == id))
    }
}

#[derive(Debug, Default)]
pub struct App {
    pub view: View,
    pub filter: Filter,
    pub query: String,
    pub mode: Mode,
    pub input: String,
    pub selected: usize,
    pub status: Option<Status>,
    pub snapshot: Snapshot,
}

impl App {
    pub fn refresh(&mut self, session: &TaskSession) {
        self.snapshot = Snapshot::capture(session, self.filter, &self.query);
        self.clamp_selection();
    }

    pub fn rows(&self) -> usize {
        match self.view {
            View::Tasks => self.snapshot.visible.len(),
            View::Completed => self.snapshot.completed.len(),
            View::Categories => self.snapshot.categories.len(),
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        match self.view {
            View::Tasks => self.snapshot.visible.get(self.selected),
            View::Completed => self.snapshot.completed.get(self.selected),
            View::Categories => None,
        }
    }

    pub fn selected_category(&self) -> Option<&Category> {
        match self.view {
            View::Categories => self.snapshot.categories.get(self.selected),
            _ => None,
        }
    }

    /// Text shown instead of the current list: loading, a failed first load,
    /// or `empty` when there is nothing to list.
    pub fn placeholder(&self, empty: &'static str) -> Option<&'static str> {
        let loaded = match self.view {
            View::Categories => self.snapshot.categories_loaded,
            _ => self.snapshot.tasks_loaded,
        };
        if !loaded {
            return Some(match self.status {
                Some(Status::Error(_)) => "Could not load, press r to retry",
                _ => "Loading...",
            });
        }
        (self.rows() == 0).then_some(empty)
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.rows().saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }
        match self.mode {
            Mode::Normal => self.normal_key(key.code),
            Mode::Search => {
                self.search_key(key.code);
                None
            }
            Mode::Add => self.add_key(key.code),
        }
    }

    /// Shows the outcome of a background command on the status line.
    pub fn apply(&mut self, outcome: Result<String, ClientError>) {
        self.status = match outcome {
            Ok(message) => Some(Status::Info(message)),
            Err(ClientError::Detached) => return,
            Err(err) => Some(Status::Error(err.user_message())),
        };
    }

    fn select_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.view = View::Tasks;
        self.selected = 0;
    }

    fn step_filter(&mut self, forward: bool) {
        let count = Filter::EVERY.len();
        let current = Filter::EVERY
            .iter()
            .position(|filter| *filter == self.filter)
            .unwrap_or(0);
        let next = (if forward { current + 1 } else { current + count - 1 }) % count;
        self.select_filter(Filter::EVERY[next]);
    }

    fn normal_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('q') => return Some(Command::Quit),
            KeyCode::Char('r') => return Some(Command::Reload),
            KeyCode::Char(digit @ '1'..='5') => {
                let index = digit as usize - '1' as usize;
                self.select_filter(Filter::EVERY[index]);
            }
            KeyCode::Tab => self.step_filter(true),
            KeyCode::BackTab => self.step_filter(false),
            KeyCode::Char('/') => {
                self.view = View::Tasks;
                self.mode = Mode::Search;
            }
            KeyCode::Char('a') => {
                self.input.clear();
                self.mode = Mode::Add;
            }
            KeyCode::Char('v') => {
                self.view = self.view.next();
                self.selected = 0;
            }
            KeyCode::Char(' ') => return self.selected_task().map(|task| Command::Toggle(task.id)),
            KeyCode::Char('d') => {
                return match self.view {
                    View::Categories => self.selected_category().map(|category| Command::DeleteCategory(category.id)),
                    _ => self.selected_task().map(|task| Command::Delete(task.id)),
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected += 1;
                self.clamp_selection();
            }
            _ => {}
        }
        None
    }

    fn search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.mode = Mode::Normal,
            KeyCode::Esc => {
                self.query.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.query.pop();
            }
            KeyCode::Char(c) => self.query.push(c),
            _ => {}
        }
        self.selected = 0;
    }

    fn add_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Enter => match parse_quick_add(&self.input, &self.snapshot.categories, Local::now().date_naive()) {
                Ok(draft) => {
                    self.input.clear();
                    self.mode = Mode::Normal;
                    return Some(Command::Create(draft));
                }
                Err(message) => self.status = Some(Status::Error(message)),
            },
            KeyCode::Esc => {
                self.input.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
        None
    }
}

/// Parses the quick-add line: free title words plus optional `!priority`,
/// `#category` and `@due` tokens (`@today`, `@tomorrow` or `@YYYY-MM-DD`).
pub fn parse_quick_add(input: &str, categories: &[Category], today: NaiveDate) -> Result<TaskDraft, String> {
    let mut title = Vec::new();
    let mut priority = None;
    let mut category = None;
    let mut due = None;

    for word in input.split_whitespace() {
        let mut chars = word.chars();
        let marker = chars.next();
        let rest = chars.as_str();
        if rest.is_empty() {
            title.push(word);
            continue;
        }
        match marker {
            Some('!') => priority = Some(rest.parse::<Priority>()?),
            Some('#') => {
                let found = categories
                    .iter()
                    .find(|candidate| candidate.name.eq_ignore_ascii_case(rest))
                    .ok_or_else(|| format!("no category named {rest}"))?;
                category = Some(found.id);
            }
            Some('@') => due = Some(due_date(rest, today)?),
            _ => title.push(word),
        }
    }

    let mut draft = TaskDraft::new(title.join(" "));
    if draft.title.is_empty() {
        return Err("Title is required".to_string());
    }
    if let Some(priority) = priority {
        draft = draft.with_priority(priority);
    }
    if let Some(category) = category {
        draft = draft.with_category(category);
    }
    if let Some(due) = due {
        draft = draft.with_due_date(due);
    }
    Ok(draft)
}

fn due_date(token: &str, today: NaiveDate) -> Result<DateTime<Utc>, String> {
    let date = match token.to_ascii_lowercase().as_str() {
        "today" => today,
        "tomorrow" => today + Duration::days(1),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| format!("bad due date @{token}, use YYYY-MM-DD"))?,
    };
    // noon keeps the local calendar day intact after conversion to UTC
    date.and_hms_opt(12, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| format!("bad due date @{token}"))
}

/// "Today" for tasks due today, otherwise a short local date.
pub fn due_label<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let due = task.due_date?;
    if task.is_due_today(now) {
        return Some("Today".to_string());
    }
    Some(due.with_timezone(&now.timezone()).format("%b %d").to_string())
}
