//! Rate limit buckets

mod headers;
mod limiter;

pub use headers::{
    RateLimitHeaders, HEADER_GLOBAL, HEADER_REMAINING, HEADER_RESET_AFTER, HEADER_RETRY_AFTER,
};
pub use limiter::{RateLimitBucket, RateLimiter};
