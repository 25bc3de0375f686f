use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Error type for task construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("description cannot be empty")]
    EmptyDescription,
    #[error("description cannot span more than one line")]
    MultilineDescription,
    #[error("due date must be in the future (got {0})")]
    DueNotInFuture(NaiveDateTime),
}

/// Task priority, persisted as 1 (high) through 3 (low)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// The number stored in the data file
    pub fn number(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Priority> {
        match n {
            1 => Some(Priority::High),
            2 => Some(Priority::Medium),
            3 => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "h" | "high" => Ok(Priority::High),
            "2" | "m" | "medium" => Ok(Priority::Medium),
            "3" | "l" | "low" => Ok(Priority::Low),
            other => Err(format!("invalid priority '{}' (expected high, medium, low or 1-3)", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Task category. Only affects which reminder template is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
}

impl Category {
    /// The tag written in the last field of a persisted line
    pub fn tag(self) -> &'static str {
        match self {
            Category::Work => "WorkTask",
            Category::Personal => "PersonalTask",
        }
    }

    /// Parse a persisted tag back into a category
    pub fn from_tag(tag: &str) -> Option<Category> {
        match tag {
            "WorkTask" => Some(Category::Work),
            "PersonalTask" => Some(Category::Personal),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "work" => Ok(Category::Work),
            "p" | "personal" => Ok(Category::Personal),
            other => Err(format!("invalid category '{}' (expected work or personal)", other)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single task. Fields are fixed once the task is created; the only
/// change a task ever sees is the store assigning its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: Option<u64>,
    description: String,
    due_at: NaiveDateTime,
    priority: Priority,
    category: Category,
}

impl Task {
    /// Create a new task, validated against the current local time.
    pub fn new(
        description: &str,
        due_at: NaiveDateTime,
        priority: Priority,
        category: Category,
    ) -> Result<Self, TaskError> {
        Self::new_at(description, due_at, priority, category, local_now())
    }

    /// Create a new task, validated against `now`.
    pub fn new_at(
        description: &str,
        due_at: NaiveDateTime,
        priority: Priority,
        category: Category,
        now: NaiveDateTime,
    ) -> Result<Self, TaskError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TaskError::EmptyDescription);
        }
        // One task is one line in the data file
        if description.contains(['\n', '\r']) {
            return Err(TaskError::MultilineDescription);
        }
        if due_at <= now {
            return Err(TaskError::DueNotInFuture(due_at));
        }
        Ok(Task {
            id: None,
            description: description.to_string(),
            due_at,
            priority,
            category,
        })
    }

    /// Rebuild a persisted task. Skips the due-in-future check: a reloaded
    /// task may have expired while the process was not running.
    pub(crate) fn restore(
        id: u64,
        description: String,
        due_at: NaiveDateTime,
        priority: Priority,
        category: Category,
    ) -> Self {
        Task {
            id: Some(id),
            description,
            due_at,
            priority,
            category,
        }
    }

    pub(crate) fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// The store-assigned id, `None` until the task has been added.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_at(&self) -> NaiveDateTime {
        self.due_at
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now > self.due_at
    }
}

/// Current local wall-clock time
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
