//! Reward eligibility gate
//!
//! Decides whether an order may claim a loyalty discount or redeem a gift.
//! The check runs on the session state after the tracker has resolved the
//! current observation but before the incoming order is counted.

use crate::errors::{LoyaltyError, Result};
use crate::loyalty::session::SessionSnapshot;
use crate::storage::RestaurantSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    /// No rewards until at least one visit has been banked
    pub require_banked_visit: bool,
    /// After the first bank, only the first order of a session may claim
    pub welcome_once_per_session: bool,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            require_banked_visit: true,
            welcome_once_per_session: true,
        }
    }
}

impl From<&RestaurantSettings> for EligibilityPolicy {
    fn from(settings: &RestaurantSettings) -> Self {
        Self {
            require_banked_visit: settings.require_banked_visit,
            welcome_once_per_session: settings.welcome_once_per_session,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    FirstSession,
    WelcomeAlreadyClaimed,
}

impl RejectReason {
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::FirstSession => "not eligible in first session",
            RejectReason::WelcomeAlreadyClaimed => {
                "welcome reward is limited to the first order of the visit"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

/// What the incoming order asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardClaim {
    pub loyalty_discount_applied: bool,
    pub gift_id: Option<i64>,
}

impl RewardClaim {
    pub fn is_claim(&self) -> bool {
        self.loyalty_discount_applied || self.gift_id.is_some()
    }
}

pub fn evaluate(
    policy: &EligibilityPolicy,
    visit_count: u32,
    orders_in_current_session: u32,
) -> Decision {
    if policy.require_banked_visit && visit_count == 0 {
        return Decision::Reject(RejectReason::FirstSession);
    }
    if policy.welcome_once_per_session && visit_count == 1 && orders_in_current_session > 0 {
        return Decision::Reject(RejectReason::WelcomeAlreadyClaimed);
    }
    Decision::Accept
}

/// Gate an order's claim against the resolved session state
///
/// Orders without a claim always pass.
pub fn check_claim(
    policy: &EligibilityPolicy,
    resolved: &SessionSnapshot,
    claim: &RewardClaim,
) -> Result<()> {
    if !claim.is_claim() {
        return Ok(());
    }
    match evaluate(
        policy,
        resolved.visit_count,
        resolved.orders_in_current_session,
    ) {
        Decision::Accept => Ok(()),
        Decision::Reject(reason) => Err(LoyaltyError::not_eligible(reason.message())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn resolved(visits: u32, orders: u32) -> SessionSnapshot {
        SessionSnapshot {
            visit_count: visits,
            orders_in_current_session: orders,
            ..SessionSnapshot::fresh(Utc::now())
        }
    }

    #[test]
    fn test_boundaries() {
        let p = EligibilityPolicy::default();
        assert_eq!(
            evaluate(&p, 0, 0),
            Decision::Reject(RejectReason::FirstSession)
        );
        assert_eq!(evaluate(&p, 1, 0), Decision::Accept);
        assert_eq!(
            evaluate(&p, 1, 1),
            Decision::Reject(RejectReason::WelcomeAlreadyClaimed)
        );
        assert_eq!(evaluate(&p, 2, 0), Decision::Accept);
        assert_eq!(evaluate(&p, 2, 5), Decision::Accept);
    }

    #[test]
    fn test_relaxed_policy() {
        let p = EligibilityPolicy {
            require_banked_visit: false,
            welcome_once_per_session: false,
        };
        assert_eq!(evaluate(&p, 0, 3), Decision::Accept);
        assert_eq!(evaluate(&p, 1, 3), Decision::Accept);
    }

    #[test]
    fn test_unclaimed_order_always_passes() {
        let p = EligibilityPolicy::default();
        assert!(check_claim(&p, &resolved(0, 0), &RewardClaim::default()).is_ok());
    }

    #[test]
    fn test_gift_counts_as_claim() {
        let p = EligibilityPolicy::default();
        let claim = RewardClaim {
            loyalty_discount_applied: false,
            gift_id: Some(3),
        };
        let err = check_claim(&p, &resolved(0, 0), &claim).unwrap_err();
        assert!(matches!(err, LoyaltyError::NotEligible(_)));
        assert!(err.message().contains("first session"));
    }
}
