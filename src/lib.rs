pub mod content;
pub mod db;
pub mod error;
pub mod graph;
pub mod schema;
pub mod settings;
pub mod users;
pub mod utils;
pub mod validation;

pub use content::{Comment, Media, MediaType, Post};
pub use error::{SchemaError, SchemaResult};
pub use graph::{FollowCounts, Follower};
pub use settings::{settings, DeletePolicy, Settings};
pub use users::{User, UserForm, UserUpdateForm};
