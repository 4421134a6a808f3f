//! # chat-rest
//!
//! REST side of the client: requests go through per-route rate limit buckets and a
//! global lock-out, and entity mutations update the cache before they resolve.
//!
//! ## Example
//!
//! ```ignore
//! use chat_rest::{HttpRestGateway, RestActions};
//!
//! let rest = Arc::new(HttpRestGateway::from_config(&config.token, &config.rest)?);
//! let actions = RestActions::new(rest, cache.clone());
//!
//! let channel = actions.update_channel_name(channel_id, "announcements").await?;
//! assert_eq!(cache.channels().get(&channel_id).unwrap().name, channel.name);
//! ```

pub mod actions;
pub mod error;
pub mod gateway;
pub mod ratelimit;
pub mod route;

pub use actions::{RestActions, RoleUpdate};
pub use error::{RestError, RestResult};
pub use gateway::{
    get_gateway_url, HttpRestGateway, RateLimitedGateway, ReqwestTransport, RestGateway,
    Transport, TransportResponse,
};
pub use ratelimit::{RateLimitBucket, RateLimitHeaders, RateLimiter};
pub use route::{BucketKey, Endpoint, Method, RestRequest, RestResponse, Route};
