//! Loyalty rules: session clustering, eligibility, gift lifecycle, rewards
//!
//! Pure logic only; persistence lives in `storage` and orchestration in
//! `services::LoyaltyService`.

pub mod eligibility;
pub mod gift_lifecycle;
pub mod rewards;
pub mod session;

pub use eligibility::{Decision, EligibilityPolicy, RejectReason, RewardClaim};
pub use gift_lifecycle::CONVERTED_GIFT_STATUS;
pub use rewards::{RewardRule, WelcomeGiftRule};
pub use session::{
    Observation, SessionEffects, SessionPolicy, SessionSnapshot, SessionState, Transition,
};
