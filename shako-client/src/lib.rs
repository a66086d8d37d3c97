pub mod api;
pub mod config;
pub mod feed;
pub mod reactions;
pub mod session;
pub mod thread;

pub use api::{ApiClient, ApiError, ApiResult};
pub use config::ClientConfig;
pub use feed::{FeedPage, FeedQuery};
pub use reactions::{ReactionPanel, ToggleOutcome};
pub use session::{Session, SessionStore};
pub use thread::{build_threads, CommentNode, CommentThread};
