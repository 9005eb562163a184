// Spotlight Core Library
// Notification-highlight correlation engine for the coaching dashboard

pub mod highlight;
pub mod matcher;
pub mod notify;
pub mod params;
pub mod reference;

// Export core types
pub use highlight::{Highlighter, NavigationSink};
pub use matcher::{CandidateItem, MatchPolicy};
pub use notify::{NotificationBus, NotificationBusStats, NotificationEvent};
pub use params::NavParams;
pub use reference::{EntityKind, HighlightReference};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpotlightError {
    #[error("Navigation error: {0}")]
    NavigationError(String),

    #[error("Notification bus error: {0}")]
    NotifyError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, SpotlightError>;
