//! # chat-cache
//!
//! Live in-memory mirror of servers, channels, users, roles, members, emoji, stickers,
//! messages and voice states, fed by the gateway dispatcher and REST responses.
//!
//! ## Features
//!
//! - **Per-class stores**: one `DashMap` per entity class, no global lock
//! - **At-most-once construction**: `compute_if_absent` builds a missing entity once
//!   even under concurrent misses
//! - **Copy-on-write updates**: `replace_with` hands back the old and new value together
//!
//! ## Example
//!
//! ```ignore
//! use chat_cache::EntityCache;
//!
//! let cache = EntityCache::new_shared();
//! let user = cache.users().compute_if_absent(user_id, || decode_user(&payload));
//!
//! if let Some((old, new)) = cache.channels().replace_with(&channel_id, |c| rename(c)) {
//!     publish_change(old.name.clone(), new.name.clone());
//! }
//! ```

pub mod cache;
pub mod store;

pub use cache::EntityCache;
pub use store::EntityStore;
