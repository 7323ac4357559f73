//! The access gateway: route classification, credential extraction and the
//! admit/reject decision for every inbound request.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::abuse::AbuseTracker;
use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::error::Rejection;
use crate::keys::KeyRegistry;
use crate::limiter::RateLimiter;

/// Paths reachable without any check: service root, docs page, schema.
pub const PUBLIC_PATHS: &[&str] = &["/", "/docs", "/openapi.json"];

/// Paths that accept the credential from the query string as well as the
/// header. The query string wins when both are present.
pub const DUAL_INPUT_PATHS: &[&str] = &["/planets"];

/// Identity used when the peer address is unavailable.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// How a path is treated by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    DualInput,
    HeaderOnly,
}

impl RouteClass {
    pub fn of(path: &str) -> Self {
        if PUBLIC_PATHS.iter().any(|p| *p == path) {
            RouteClass::Public
        } else if DUAL_INPUT_PATHS.iter().any(|p| *p == path) {
            RouteClass::DualInput
        } else {
            RouteClass::HeaderOnly
        }
    }
}

/// Client identity for a peer address: its IP, or [`UNKNOWN_IDENTITY`].
pub fn client_identity(peer: Option<SocketAddr>) -> String {
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_IDENTITY.to_string(),
    }
}

/// The parts of an inbound request the gateway looks at.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub path: &'a str,
    pub identity: &'a str,
    /// Value of the key-name query parameter, if any.
    pub query_credential: Option<&'a str>,
    /// Value of the key-name header, if any.
    pub header_credential: Option<&'a str>,
}

impl<'a> AccessRequest<'a> {
    /// Credential for this request under the rules of its route class.
    /// Empty values count as absent.
    pub fn credential(&self, class: RouteClass) -> Option<&'a str> {
        let present = |v: &&str| !v.is_empty();
        match class {
            RouteClass::Public => None,
            RouteClass::DualInput => self
                .query_credential
                .filter(present)
                .or_else(|| self.header_credential.filter(present)),
            RouteClass::HeaderOnly => self.header_credential.filter(present),
        }
    }
}

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Public path; no checks were made.
    Public,
    /// Within budget and carrying a registered key.
    Authenticated,
}

/// Records removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub windows: usize,
    pub failures: usize,
}

impl SweepStats {
    pub fn total(&self) -> usize {
        self.windows + self.failures
    }
}

/// Composes the key registry, rate limiter and abuse tracker into one
/// decision per request.
pub struct AccessGateway {
    keys: KeyRegistry,
    limiter: RateLimiter,
    abuse: Arc<AbuseTracker>,
    key_name: String,
}

impl AccessGateway {
    pub fn new(config: &GatewayConfig, keys: KeyRegistry, clock: Arc<dyn Clock>) -> Self {
        let abuse = Arc::new(AbuseTracker::new(config.abuse.clone(), clock.clone()));
        let limiter = RateLimiter::new(config.rate_limit.clone(), clock, abuse.clone());
        Self {
            keys,
            limiter,
            abuse,
            key_name: config.key_name.clone(),
        }
    }

    /// Name of the credential header and query parameter.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn abuse_tracker(&self) -> &AbuseTracker {
        &self.abuse
    }

    /// Decide whether `request` may reach its handler.
    ///
    /// Order matters: the rate limiter is consulted before any credential is
    /// looked at, so a blocked or over-budget client receives 429 and its
    /// failure count is left alone.
    pub fn check(&self, request: &AccessRequest<'_>) -> Result<Admission, Rejection> {
        let class = RouteClass::of(request.path);
        if class == RouteClass::Public {
            return Ok(Admission::Public);
        }

        let outcome = self.check_protected(request, class);
        if let Err(rejection) = outcome {
            if rejection.is_auth_failure() {
                self.abuse.record_failed_attempt(request.identity);
            }
            tracing::warn!(
                identity = request.identity,
                path = request.path,
                rejection = rejection.kind(),
                "request rejected"
            );
        }
        outcome
    }

    fn check_protected(
        &self,
        request: &AccessRequest<'_>,
        class: RouteClass,
    ) -> Result<Admission, Rejection> {
        if self.limiter.is_rate_limited(request.identity) {
            return Err(Rejection::RateLimited);
        }
        let credential = request
            .credential(class)
            .ok_or(Rejection::CredentialMissing)?;
        if !self.keys.contains(credential) {
            return Err(Rejection::CredentialInvalid);
        }
        Ok(Admission::Authenticated)
    }

    /// Drop per-identity records that no longer affect any decision.
    pub fn sweep(&self) -> SweepStats {
        SweepStats {
            windows: self.limiter.sweep(),
            failures: self.abuse.sweep(),
        }
    }
}
