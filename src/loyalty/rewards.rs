//! Reward rules run when a visit is banked
//!
//! A rule only proposes a gift. The service skips the proposal while the
//! visitor still holds an unused gift, so at most one minted gift is open
//! at a time.

use crate::storage::{GiftType, NewGift, RestaurantSettings};

pub const WELCOME_GIFT_SOURCE: &str = "welcome";

#[derive(Debug, Clone, Copy)]
pub struct BankedVisit<'a> {
    pub restaurant_id: &'a str,
    pub device_id: &'a str,
    /// Visit count after banking
    pub visit_count: u32,
}

pub trait RewardRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_visit_banked(
        &self,
        visit: &BankedVisit<'_>,
        settings: &RestaurantSettings,
    ) -> Option<NewGift>;
}

/// Percentage gift for the first banked visit
#[derive(Debug, Clone, Copy, Default)]
pub struct WelcomeGiftRule;

impl RewardRule for WelcomeGiftRule {
    fn name(&self) -> &'static str {
        WELCOME_GIFT_SOURCE
    }

    fn on_visit_banked(
        &self,
        visit: &BankedVisit<'_>,
        settings: &RestaurantSettings,
    ) -> Option<NewGift> {
        if visit.visit_count != 1 || settings.welcome_gift_percentage <= 0 {
            return None;
        }
        Some(NewGift {
            restaurant_id: visit.restaurant_id.to_string(),
            device_id: visit.device_id.to_string(),
            gift_type: GiftType::Percentage,
            euro_value_cents: 0,
            percentage_value: settings.welcome_gift_percentage,
            gift_name: Some(format!(
                "Welcome back: {}% off",
                settings.welcome_gift_percentage
            )),
            source: WELCOME_GIFT_SOURCE.to_string(),
        })
    }
}

pub fn default_rules() -> Vec<Box<dyn RewardRule>> {
    vec![Box::new(WelcomeGiftRule)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoyaltyConfig;

    fn visit(count: u32) -> BankedVisit<'static> {
        BankedVisit {
            restaurant_id: "r1",
            device_id: "dev",
            visit_count: count,
        }
    }

    #[test]
    fn test_welcome_gift_on_first_bank_only() {
        let settings = RestaurantSettings::from_defaults("r1", &LoyaltyConfig::default());
        let gift = WelcomeGiftRule
            .on_visit_banked(&visit(1), &settings)
            .unwrap();
        assert_eq!(gift.gift_type, GiftType::Percentage);
        assert_eq!(gift.percentage_value, 10);
        assert_eq!(gift.euro_value_cents, 0);
        assert_eq!(gift.source, WELCOME_GIFT_SOURCE);

        assert!(WelcomeGiftRule.on_visit_banked(&visit(2), &settings).is_none());
    }

    #[test]
    fn test_zero_percentage_disables_welcome_gift() {
        let mut settings = RestaurantSettings::from_defaults("r1", &LoyaltyConfig::default());
        settings.welcome_gift_percentage = 0;
        assert!(WelcomeGiftRule.on_visit_banked(&visit(1), &settings).is_none());
    }
}
