mod comment;
mod media;
mod post;

pub use comment::Comment;
pub use media::{Media, MediaType};
pub use post::{Post, PostDependents};
