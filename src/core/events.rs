// Event Handling
// Log event types, the level mask, and the subscriber registry

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use super::error::ConfigurationError;

/// Category of an emitted log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Failure while processing one entry
    Error,

    /// A source directory was entered
    DirectoryVisited,

    /// A source file was examined
    FileVisited,

    /// The run ended
    Finished,

    /// A destination-only file was removed
    FileDeleted,

    /// A destination-only directory tree was removed
    DirectoryDeleted,
}

impl LogCategory {
    pub const ALL: [LogCategory; 6] = [
        LogCategory::Error,
        LogCategory::DirectoryVisited,
        LogCategory::FileVisited,
        LogCategory::Finished,
        LogCategory::FileDeleted,
        LogCategory::DirectoryDeleted,
    ];

    /// Bit of this category in a [`LogLevelMask`]
    pub const fn bit(self) -> u8 {
        match self {
            LogCategory::Error => 1 << 0,
            LogCategory::DirectoryVisited => 1 << 1,
            LogCategory::FileVisited => 1 << 2,
            LogCategory::Finished => 1 << 3,
            LogCategory::FileDeleted => 1 << 4,
            LogCategory::DirectoryDeleted => 1 << 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::Error => "error",
            LogCategory::DirectoryVisited => "directory",
            LogCategory::FileVisited => "file",
            LogCategory::Finished => "finished",
            LogCategory::FileDeleted => "file_deleted",
            LogCategory::DirectoryDeleted => "directory_deleted",
        }
    }

    /// Parse a category name as used in configuration files
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.trim().to_lowercase().as_str() {
            "error" => Ok(LogCategory::Error),
            "directory" | "directory_visited" => Ok(LogCategory::DirectoryVisited),
            "file" | "file_visited" => Ok(LogCategory::FileVisited),
            "finished" => Ok(LogCategory::Finished),
            "file_deleted" => Ok(LogCategory::FileDeleted),
            "directory_deleted" => Ok(LogCategory::DirectoryDeleted),
            other => Err(ConfigurationError::UnknownCategory(other.to_string())),
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bit field selecting which categories are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogLevelMask(u8);

impl LogLevelMask {
    pub const NONE: LogLevelMask = LogLevelMask(0);
    pub const ALL: LogLevelMask = LogLevelMask(0b11_1111);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build a mask enabling exactly the given categories
    pub fn of(categories: &[LogCategory]) -> Self {
        categories.iter().fold(Self::NONE, |mask, c| mask | *c)
    }

    /// Parse a list of category names
    pub fn from_names<I, S>(names: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = Self::NONE;
        for name in names {
            mask |= LogCategory::from_name(name.as_ref())?;
        }
        Ok(mask)
    }

    pub const fn is_enabled(self, category: LogCategory) -> bool {
        self.0 & category.bit() != 0
    }

    /// Category names enabled in this mask
    pub fn names(self) -> Vec<&'static str> {
        LogCategory::ALL
            .iter()
            .filter(|c| self.is_enabled(**c))
            .map(|c| c.as_str())
            .collect()
    }
}

impl Default for LogLevelMask {
    fn default() -> Self {
        Self(LogCategory::Error.bit() | LogCategory::Finished.bit())
    }
}

impl BitOr<LogCategory> for LogLevelMask {
    type Output = LogLevelMask;

    fn bitor(self, rhs: LogCategory) -> Self::Output {
        LogLevelMask(self.0 | rhs.bit())
    }
}

impl BitOr for LogLevelMask {
    type Output = LogLevelMask;

    fn bitor(self, rhs: LogLevelMask) -> Self::Output {
        LogLevelMask(self.0 | rhs.0)
    }
}

impl BitOrAssign<LogCategory> for LogLevelMask {
    fn bitor_assign(&mut self, rhs: LogCategory) {
        self.0 |= rhs.bit();
    }
}

/// A single emitted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Name of the job that produced the event
    pub job: String,
    pub category: LogCategory,
    /// A path, or an error description
    pub message: String,
    pub time: DateTime<Utc>,
}

impl LogEvent {
    pub fn new(job: impl Into<String>, category: LogCategory, message: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            category,
            message: message.into(),
            time: Utc::now(),
        }
    }
}

/// Subscriber callback
pub type EventHandler = Arc<dyn Fn(&LogEvent) + Send + Sync>;

/// Identifies a subscription so it can be removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry of subscribers, keyed by category
///
/// Handlers of one category run synchronously in registration order.
#[derive(Default, Clone)]
pub struct EventBus {
    handlers: HashMap<LogCategory, Vec<(SubscriptionId, EventHandler)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one category
    pub fn subscribe<F>(&mut self, category: LogCategory, handler: F) -> SubscriptionId
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        self.handlers
            .entry(category)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Register one handler for every category
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        let handler: EventHandler = Arc::new(handler);
        for category in LogCategory::ALL {
            self.handlers
                .entry(category)
                .or_default()
                .push((id, Arc::clone(&handler)));
        }
        id
    }

    /// Remove a subscription from every category it was registered under
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for list in self.handlers.values_mut() {
            let before = list.len();
            list.retain(|(sub, _)| *sub != id);
            removed |= list.len() != before;
        }
        removed
    }

    /// Number of handlers registered for a category
    pub fn handler_count(&self, category: LogCategory) -> usize {
        self.handlers.get(&category).map_or(0, Vec::len)
    }

    /// Deliver an event to the handlers of its category
    pub fn publish(&self, event: &LogEvent) {
        if let Some(list) = self.handlers.get(&event.category) {
            for (_, handler) in list {
                handler(event);
            }
        }
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<LogCategory, usize> = self
            .handlers
            .iter()
            .map(|(category, list)| (*category, list.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_default_mask() {
        let mask = LogLevelMask::default();
        assert_eq!(mask.bits(), 0b1001);
        assert!(mask.is_enabled(LogCategory::Error));
        assert!(mask.is_enabled(LogCategory::Finished));
        assert!(!mask.is_enabled(LogCategory::FileVisited));
        assert!(!mask.is_enabled(LogCategory::DirectoryDeleted));
    }

    #[test]
    fn test_mask_bits_follow_category_order() {
        for (index, category) in LogCategory::ALL.iter().enumerate() {
            let mask = LogLevelMask::from_bits(1 << index);
            assert!(mask.is_enabled(*category));
            assert_eq!(mask.names(), vec![category.as_str()]);
        }
    }

    #[test]
    fn test_mask_from_names() {
        let mask = LogLevelMask::from_names(["error", " File ", "file_deleted"]).unwrap();
        assert_eq!(
            mask,
            LogLevelMask::of(&[LogCategory::Error, LogCategory::FileVisited, LogCategory::FileDeleted])
        );
        assert!(LogLevelMask::from_names(["verbose"]).is_err());
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Arc::clone(&seen);
        bus.subscribe(LogCategory::FileVisited, move |e| {
            first.lock().unwrap().push(format!("first:{}", e.message))
        });
        let second = Arc::clone(&seen);
        bus.subscribe_all(move |e| second.lock().unwrap().push(format!("all:{}", e.message)));

        bus.publish(&LogEvent::new("job", LogCategory::FileVisited, "a.txt"));
        bus.publish(&LogEvent::new("job", LogCategory::Finished, "done"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:a.txt", "all:a.txt", "all:done"]
        );
    }

    #[test]
    fn test_unsubscribe_all_categories() {
        let mut bus = EventBus::new();
        let id = bus.subscribe_all(|_| {});
        assert_eq!(bus.handler_count(LogCategory::Error), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        for category in LogCategory::ALL {
            assert_eq!(bus.handler_count(category), 0);
        }
    }
}
