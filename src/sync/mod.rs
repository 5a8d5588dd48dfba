//! Edit sessions and the engine that keeps them in step with the server.
//!
//! ```text
//! Unloaded --load--> Loaded --edit--> Modified --post--> Loaded
//!                      \                 /
//!                       +--preview------+   (state unchanged)
//! ```

pub mod engine;
pub mod listing;
pub mod session;

pub use engine::{LoadedPage, PostReceipt, SyncEngine};
pub use listing::{ListingKind, RemoteListing};
pub use session::{EditSession, SessionState};
