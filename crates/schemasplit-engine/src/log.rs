//! Reassignment log
//!
//! Append-only record of everything that changed where a table ended up,
//! rebuilt from scratch on every run.

use std::fmt;
use std::path::Path;

/// One log event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// A table did not fit and moved to the next group
    Moved {
        table: String,
        from: String,
        to: String,
    },

    /// The resolver found a foreign-key cycle
    Cycle(Vec<String>),

    /// No group could hold the table
    Exhausted { table: String },
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moved { table, from, to } => {
                write!(f, "Table {} moved from {} to {}", table, from, to)
            }
            Self::Cycle(path) => write!(f, "Cycle detected: {}", path.join(" -> ")),
            Self::Exhausted { table } => {
                write!(f, "Line limit reached for all groups while placing {}", table)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassignmentLog {
    events: Vec<LogEvent>,
}

impl ReassignmentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a log with the cycles reported by the resolver
    pub fn from_cycles(cycles: &[Vec<String>]) -> Self {
        Self {
            events: cycles.iter().cloned().map(LogEvent::Cycle).collect(),
        }
    }

    pub fn push(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, other: ReassignmentLog) {
        self.events.extend(other.events);
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Cascade events only, as (table, from, to)
    pub fn moves(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.events.iter().filter_map(|event| match event {
            LogEvent::Moved { table, from, to } => Some((table.as_str(), from.as_str(), to.as_str())),
            _ => None,
        })
    }

    /// One line per event
    pub fn render(&self) -> String {
        self.events.iter().map(|event| format!("{}\n", event)).collect()
    }

    /// Overwrite the log file with this log
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())
    }
}
