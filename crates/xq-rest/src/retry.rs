//! Re-authentication retry policy.

use xenqu_auth::StrategyKind;

/// Most re-authentications a single logical request may trigger.
pub const MAX_REAUTH_ATTEMPTS: u32 = 1;

/// Decides whether a rejected resource request gets one more attempt.
///
/// A 401 on the first attempt triggers one re-authentication when the
/// strategy can refresh without user interaction. Everything else is
/// final.
#[derive(Debug, Clone)]
pub struct AuthRetryPolicy {
    enabled: bool,
    attempt: u32,
}

impl AuthRetryPolicy {
    /// Policy for requests signed with credentials from `strategy`.
    ///
    /// Web-flow credentials need a user to log in again, so they are never
    /// refreshed automatically.
    pub fn for_strategy(strategy: StrategyKind) -> Self {
        Self {
            enabled: strategy == StrategyKind::JwtBearer,
            attempt: 0,
        }
    }

    /// Re-authentications performed so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns true once a re-authentication has happened.
    pub fn has_retried(&self) -> bool {
        self.attempt > 0
    }

    /// Returns true if a response with `status` should trigger a
    /// re-authentication and replay.
    pub fn should_retry(&self, status: u16) -> bool {
        self.enabled && status == 401 && self.attempt < MAX_REAUTH_ATTEMPTS
    }

    /// Record a response. Returns true if the caller should re-authenticate
    /// and send the request again.
    pub fn next_attempt(&mut self, status: u16) -> bool {
        if !self.should_retry(status) {
            return false;
        }
        self.attempt += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_retries_once_on_401() {
        let mut policy = AuthRetryPolicy::for_strategy(StrategyKind::JwtBearer);
        assert!(!policy.has_retried());
        assert!(policy.next_attempt(401));
        assert_eq!(policy.attempt(), 1);
        assert!(policy.has_retried());
        assert!(!policy.next_attempt(401));
        assert_eq!(policy.attempt(), 1);
    }

    #[test]
    fn test_other_statuses_are_final() {
        let mut policy = AuthRetryPolicy::for_strategy(StrategyKind::JwtBearer);
        for status in [400, 403, 404, 500, 503] {
            assert!(!policy.next_attempt(status));
        }
        assert_eq!(policy.attempt(), 0);
    }

    #[test]
    fn test_web_flow_is_exempt() {
        let mut policy = AuthRetryPolicy::for_strategy(StrategyKind::WebFlow);
        assert!(!policy.next_attempt(401));
    }
}
