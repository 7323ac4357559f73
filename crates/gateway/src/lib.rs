//! lilit-gateway: access control for the LILIT astrological API.
//!
//! Every protected request passes through [`AccessGateway::check`], which
//! composes three in-memory services:
//!
//! - [`KeyRegistry`] -- the static set of valid API keys, loaded at startup
//! - [`RateLimiter`] -- per-identity request budget over a resetting window
//! - [`AbuseTracker`] -- consecutive authentication failures and timed blocks
//!
//! The crate is transport-independent: callers extract the path, peer
//! identity and credentials from their HTTP framework of choice and map a
//! [`Rejection`] back to a status code.

pub mod abuse;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod keys;
pub mod limiter;

pub use abuse::{AbuseConfig, AbuseTracker, BlockStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GatewayConfig;
pub use error::Rejection;
pub use gateway::{
    client_identity, AccessGateway, AccessRequest, Admission, RouteClass, SweepStats,
    DUAL_INPUT_PATHS, PUBLIC_PATHS, UNKNOWN_IDENTITY,
};
pub use keys::KeyRegistry;
pub use limiter::{RateLimitConfig, RateLimiter};
