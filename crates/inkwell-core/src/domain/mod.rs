//! Domain entities - the core business objects.

mod engagement;
mod post;

pub use engagement::{LikePolicy, PostLike, PostView};
pub use post::{PageRequest, Post, PostDraft, PostFilter, PostPage, generate_slug};
