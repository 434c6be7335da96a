//! Gift state rules
//!
//! ```text
//! unused --consume--> consumed
//! unused --convert--> converted --revert--> unused
//! ```
//!
//! Conversion turns a gift's euro value into points. Converting leaves the
//! gift in [`CONVERTED_GIFT_STATUS`] and reverting requires exactly that
//! status, so the two operations are symmetric.

use crate::errors::{LoyaltyError, Result};
use crate::storage::{Gift, GiftStatus};

/// Status a converted gift is left in
pub const CONVERTED_GIFT_STATUS: GiftStatus = GiftStatus::Converted;

/// Points for a euro value in cents, rounded down
pub fn conversion_points(euro_value_cents: i64, points_per_euro: i32) -> i64 {
    euro_value_cents.saturating_mul(i64::from(points_per_euro)) / 100
}

pub fn ensure_convertible(gift: &Gift) -> Result<()> {
    if gift.status != GiftStatus::Unused {
        return Err(LoyaltyError::invalid_state(format!(
            "gift {} is {}, only unused gifts can be converted",
            gift.id,
            gift.status.as_ref()
        )));
    }
    if gift.euro_value_cents <= 0 {
        return Err(LoyaltyError::invalid_state(format!(
            "gift {} has no euro value to convert",
            gift.id
        )));
    }
    Ok(())
}

pub fn ensure_revertible(gift: &Gift) -> Result<()> {
    if gift.status != CONVERTED_GIFT_STATUS {
        return Err(LoyaltyError::invalid_state(format!(
            "gift {} is {}, only converted gifts can be reverted",
            gift.id,
            gift.status.as_ref()
        )));
    }
    Ok(())
}

pub fn ensure_consumable(gift: &Gift) -> Result<()> {
    if gift.status != GiftStatus::Unused {
        return Err(LoyaltyError::invalid_state(format!(
            "gift {} is {} and cannot be redeemed",
            gift.id,
            gift.status.as_ref()
        )));
    }
    Ok(())
}
