pub mod batch;
pub mod markup;
pub mod normalize;
pub mod plain_text;
pub mod policy;
pub mod post;
pub mod sanitizer;

pub use plain_text::to_plain_text;
pub use sanitizer::{sanitize, SanitizeError, Sanitizer};
