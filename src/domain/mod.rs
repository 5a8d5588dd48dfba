pub mod item;
pub mod page;
pub mod wiki;

pub use item::FeedItem;
pub use page::{PageKey, PostMeta, RevisionRecord, NEW_REVISION};
pub use wiki::{Encoding, WikiConfig};
