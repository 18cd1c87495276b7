//! UI-agnostic navigation and feedback state
//!
//! Front ends own the clock: every time-dependent method takes `now` so the
//! same state machine drives an egui frame loop or a test.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// The sections of the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    Generator,
    History,
    Templates,
    Analytics,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Generator,
        Section::History,
        Section::Templates,
        Section::Analytics,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Section::Generator => "generator",
            Section::History => "history",
            Section::Templates => "templates",
            Section::Analytics => "analytics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Generator => "إنشاء إنذار",
            Section::History => "السجل",
            Section::Templates => "القوالب",
            Section::Analytics => "الإحصائيات",
        }
    }

    /// Whether entering the section should refresh its data
    pub fn reloads_on_enter(&self) -> bool {
        !matches!(self, Section::Generator)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches('#');
        Section::ALL
            .iter()
            .find(|section| section.id() == s)
            .copied()
            .ok_or_else(|| format!("Unknown section: {}", s))
    }
}

/// Tracks which section is visible
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Section,
}

impl Navigator {
    pub fn current(&self) -> Section {
        self.current
    }

    /// Switches to `section`. Returns the section whose data must be reloaded, if any.
    pub fn show(&mut self, section: Section) -> Option<Section> {
        self.current = section;
        section.reloads_on_enter().then_some(section)
    }
}

/// Toast classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Success => "✅",
            ToastKind::Error => "❌",
            ToastKind::Warning => "⚠️",
            ToastKind::Info => "ℹ️",
        }
    }
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created: Instant,
}

/// Default toast lifetime
pub const TOAST_LIFETIME: Duration = Duration::from_secs(5);

/// Visible toasts, oldest first
#[derive(Debug, Clone)]
pub struct Toasts {
    items: Vec<Toast>,
    lifetime: Duration,
    next_id: u64,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(TOAST_LIFETIME)
    }
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            items: Vec::new(),
            lifetime,
            next_id: 1,
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        match kind {
            ToastKind::Error => log::warn!("{}", message),
            _ => log::debug!("{}", message),
        }
        self.items.push(Toast {
            id,
            kind,
            message,
            created: now,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.push(ToastKind::Success, message, now)
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.push(ToastKind::Error, message, now)
    }

    pub fn warning(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.push(ToastKind::Warning, message, now)
    }

    pub fn info(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.push(ToastKind::Info, message, now)
    }

    /// Closes a toast early; unknown ids are ignored
    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|t| t.id != id);
    }

    /// Drops expired toasts
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.items
            .retain(|t| now.saturating_duration_since(t.created) < lifetime);
    }

    pub fn visible(&self) -> &[Toast] {
        &self.items
    }

    /// When the oldest visible toast expires, so a UI can schedule a repaint
    pub fn next_expiry(&self) -> Option<Instant> {
        self.items.iter().map(|t| t.created + self.lifetime).min()
    }
}

/// Operations that show the blocking loading indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Generate,
    ExportHtml,
}

/// Blocking loading indicator around a simulated long operation
#[derive(Debug, Clone, Default)]
pub struct LoadingState {
    pending: Option<(TaskKind, Instant)>,
}

impl LoadingState {
    /// Shows the indicator; the task completes `delay` after `now`.
    /// Starting while another task is pending replaces it.
    pub fn start(&mut self, kind: TaskKind, now: Instant, delay: Duration) {
        self.pending = Some((kind, now + delay));
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, due)| due)
    }

    /// Returns the finished task once its delay has passed, hiding the indicator
    pub fn poll(&mut self, now: Instant) -> Option<TaskKind> {
        match self.pending {
            Some((kind, due)) if now >= due => {
                self.pending = None;
                Some(kind)
            }
            _ => None,
        }
    }
}

/// Trailing-edge debounce: only the last trigger inside the window fires
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Records a trigger, replacing any pending deadline
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once, when the deadline of the last trigger has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Fixed-interval ticker, used for draft autosave
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    next_due: Instant,
}

impl IntervalTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// True once per elapsed interval; missed ticks collapse into one
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }
}

/// The "save as template" dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateModal {
    pub is_open: bool,
    pub name: String,
    pub description: String,
}

impl TemplateModal {
    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Closes the dialog and clears its inputs
    pub fn close(&mut self) {
        *self = Self::default();
    }
}
