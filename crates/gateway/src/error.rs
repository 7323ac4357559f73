/// Terminal per-request outcomes of the access gateway.
///
/// None of these are retried by the server; the caller decides whether to
/// try again after backing off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Request budget exhausted, or the identity is serving an abuse block.
    #[error("too many requests")]
    RateLimited,

    /// Protected path reached without any credential.
    #[error("credential required")]
    CredentialMissing,

    /// A credential was presented but is not in the key registry.
    #[error("invalid credential")]
    CredentialInvalid,
}

impl Rejection {
    /// HTTP status code the rejection is surfaced as.
    pub fn status_code(self) -> u16 {
        match self {
            Rejection::RateLimited => 429,
            Rejection::CredentialMissing | Rejection::CredentialInvalid => 403,
        }
    }

    /// Short machine-readable label, used in logs.
    pub fn kind(self) -> &'static str {
        match self {
            Rejection::RateLimited => "rate_limited",
            Rejection::CredentialMissing => "credential_missing",
            Rejection::CredentialInvalid => "credential_invalid",
        }
    }

    /// Whether this rejection counts as a failed authentication attempt.
    pub fn is_auth_failure(self) -> bool {
        !matches!(self, Rejection::RateLimited)
    }
}
