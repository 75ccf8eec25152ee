pub mod post;
pub mod user;

pub use post::{Post, mask_profanity};
pub use user::{User, UserRecord};
