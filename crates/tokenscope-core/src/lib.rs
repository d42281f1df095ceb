pub mod error;
pub mod api;
pub mod config;
pub mod debounce;
pub mod document;
pub mod event;
pub mod predict;
pub mod rank;
pub mod request;
pub mod selection;
pub mod session;
pub mod tokenize;

// Re-export key types
pub use error::{Result, TokenscopeError};
pub use api::{Distribution, HttpBackend, ModelBackend, TokenInfo};
pub use config::Settings;
pub use event::{ModelInfo, Notice, NoticeKind, SessionEvent, SessionUpdate};
pub use rank::{rank, rank_with, RankOptions, RankedDistribution, RankedEntry};
pub use session::{ClickIgnored, ClickOutcome, Session, SessionConfig};
