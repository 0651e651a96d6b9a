//! Domain entities - the core business objects.

mod interaction;

mod post;

mod user;

pub use interaction::{InteractionKind, RecentRead};
pub use post::{Post, PostStatus};
pub use user::User;
