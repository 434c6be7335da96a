//! Loyalty service
//!
//! Orchestrates the session tracker, eligibility gate, gift lifecycle and
//! points ledger. Every operation that writes runs in a single database
//! transaction: the visitor row is locked first, then any gift row, and an
//! error anywhere drops the transaction uncommitted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseTransaction;
use tracing::{debug, info};

use crate::config::get_config;
use crate::errors::{LoyaltyError, Result};
use crate::loyalty::eligibility::{self, Decision, EligibilityPolicy, RewardClaim};
use crate::loyalty::gift_lifecycle::{self, CONVERTED_GIFT_STATUS};
use crate::loyalty::rewards::{self, BankedVisit, RewardRule};
use crate::loyalty::session::{
    self, Observation, SessionPolicy, SessionSnapshot, SessionState, Transition,
};
use crate::storage::backend::{
    gifts, ledger, locks, model_to_gift, model_to_visitor, orders, settings, visitors,
};
use crate::storage::{
    Gift, GiftStatus, LedgerAudit, NewOrder, NewPointsEntry, OrderRecord, PointsEntry,
    RestaurantSettings, SeaOrmStorage, TransactionType, Visitor,
};

const MAX_DEVICE_ID_LEN: usize = 128;
const MAX_POINTS_PER_EURO: i32 = 10_000;

// ============ Request/Response DTOs ============

/// Loyalty snapshot returned to the ordering UI after a status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyStatus {
    pub total_visits: u32,
    pub orders_in_current_visit: u32,
    pub total_points: i64,
    /// Whether an order placed now may claim a loyalty reward
    pub discount_eligible: bool,
    pub has_unused_gift: bool,
    pub gift_conversion_enabled: bool,
    pub session_state: SessionState,
}

/// Order submitted by the ordering UI
#[derive(Debug, Clone, Default)]
pub struct SubmitOrderRequest {
    /// Loyalty identity; anonymous orders skip the loyalty flow
    pub device_id: Option<String>,
    pub total_cents: i64,
    pub loyalty_discount_applied: bool,
    pub loyalty_discount_amount_cents: i64,
    /// Gift redeemed with this order
    pub gift_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct OrderSubmission {
    pub order: OrderRecord,
    /// None for anonymous orders
    pub session_state: Option<SessionState>,
    pub visit_banked: bool,
    pub total_visits: u32,
    pub orders_in_current_visit: u32,
    pub minted_gifts: Vec<Gift>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiftConversion {
    pub gift_id: i64,
    pub points: i64,
    pub total_points: i64,
    pub status: GiftStatus,
}

#[derive(Debug, Clone)]
pub struct LedgerView {
    pub entries: Vec<PointsEntry>,
    pub audit: LedgerAudit,
}

/// Partial update of a restaurant's loyalty settings
#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsRequest {
    pub points_per_euro: Option<i32>,
    pub gift_conversion_enabled: Option<bool>,
    pub require_banked_visit: Option<bool>,
    pub welcome_once_per_session: Option<bool>,
    pub welcome_gift_percentage: Option<i32>,
}

/// Result of running the session tracker for one observation
struct Observed {
    /// Row with the observation resolved but the incoming order not counted
    visitor: Visitor,
    state: SessionState,
    transition: Transition,
    resolved: SessionSnapshot,
    minted: Vec<Gift>,
}

// ============ LoyaltyService Implementation ============

pub struct LoyaltyService {
    storage: Arc<SeaOrmStorage>,
    policy: SessionPolicy,
    rules: Vec<Box<dyn RewardRule>>,
}

impl LoyaltyService {
    pub fn new(storage: Arc<SeaOrmStorage>, policy: SessionPolicy) -> Self {
        Self {
            storage,
            policy,
            rules: rewards::default_rules(),
        }
    }

    /// Session timeout from `loyalty.session_timeout_secs`
    pub fn from_config(storage: Arc<SeaOrmStorage>) -> Self {
        let timeout = get_config().loyalty.session_timeout_secs;
        Self::new(storage, SessionPolicy::from_secs(timeout))
    }

    pub fn with_rules(mut self, rules: Vec<Box<dyn RewardRule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    async fn begin(&self) -> Result<DatabaseTransaction> {
        self.storage.begin().await
    }

    async fn commit(txn: DatabaseTransaction) -> Result<()> {
        txn.commit().await.map_err(|e| {
            LoyaltyError::database_operation(format!("Failed to commit transaction: {}", e))
        })
    }

    // ============ Session Tracker ============

    /// Lazily create and lock the visitor, then resolve the observation
    async fn observe(
        &self,
        txn: &DatabaseTransaction,
        restaurant_id: &str,
        device_id: &str,
        observation: Observation,
        settings: &RestaurantSettings,
        now: DateTime<Utc>,
    ) -> Result<Observed> {
        let created = visitors::ensure_visitor(txn, restaurant_id, device_id, now).await?;
        let model = locks::lock_visitor(txn, restaurant_id, device_id)
            .await?
            .ok_or_else(|| {
                LoyaltyError::database_operation(format!(
                    "visitor {}/{} missing after insert",
                    restaurant_id, device_id
                ))
            })?;
        let mut visitor = model_to_visitor(model);
        let before = SessionSnapshot::from(&visitor);

        let state = if created {
            SessionState::NoVisit
        } else {
            SessionState::classify(Some(&before), now, &self.policy)
        };

        let has_completed_order = if state.needs_completed_order_check(observation) {
            orders::has_completed_order_since(
                txn,
                restaurant_id,
                device_id,
                before.last_counted_at,
            )
            .await?
        } else {
            false
        };

        let transition = session::transition(state, observation, has_completed_order);
        let resolved = transition.effects.resolve(&before, now);
        resolved.apply_to(&mut visitor);

        let minted = if transition.effects.bank_visit {
            info!(
                "Visit banked: {}/{} now at {} visits",
                restaurant_id, device_id, visitor.visit_count
            );
            self.run_reward_rules(txn, &visitor, settings, now).await?
        } else {
            Vec::new()
        };

        debug!(
            "Observed {:?} for {}/{}: {:?} -> {:?}",
            observation, restaurant_id, device_id, state, transition.next
        );

        Ok(Observed {
            visitor,
            state,
            transition,
            resolved,
            minted,
        })
    }

    async fn run_reward_rules(
        &self,
        txn: &DatabaseTransaction,
        visitor: &Visitor,
        settings: &RestaurantSettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<Gift>> {
        let banked = BankedVisit {
            restaurant_id: &visitor.restaurant_id,
            device_id: &visitor.device_id,
            visit_count: visitor.visit_count,
        };

        let mut minted = Vec::new();
        for rule in &self.rules {
            let Some(new_gift) = rule.on_visit_banked(&banked, settings) else {
                continue;
            };
            if gifts::has_unused_gift(txn, &visitor.restaurant_id, &visitor.device_id).await? {
                debug!(
                    "Rule '{}' skipped for {}/{}: unused gift already open",
                    rule.name(),
                    visitor.restaurant_id,
                    visitor.device_id
                );
                continue;
            }
            minted.push(gifts::insert_gift(txn, new_gift, now).await?);
        }
        Ok(minted)
    }

    /// Status poll: records activity and reports the loyalty snapshot
    pub async fn status(&self, restaurant_id: &str, device_id: &str) -> Result<LoyaltyStatus> {
        self.status_at(restaurant_id, device_id, Utc::now()).await
    }

    pub async fn status_at(
        &self,
        restaurant_id: &str,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LoyaltyStatus> {
        validate_restaurant_id(restaurant_id)?;
        validate_device_id(device_id)?;
        let settings = self.storage.get_settings(restaurant_id).await?;

        let txn = self.begin().await?;
        let observed = self
            .observe(
                &txn,
                restaurant_id,
                device_id,
                Observation::Poll,
                &settings,
                now,
            )
            .await?;
        let after = observed.transition.effects.finish(observed.resolved);
        let mut visitor = observed.visitor;
        after.apply_to(&mut visitor);
        visitors::save_session(&txn, &visitor).await?;
        let has_unused_gift = gifts::has_unused_gift(&txn, restaurant_id, device_id).await?;
        Self::commit(txn).await?;

        let policy = EligibilityPolicy::from(&settings);
        Ok(LoyaltyStatus {
            total_visits: visitor.visit_count,
            orders_in_current_visit: visitor.orders_in_current_session,
            total_points: visitor.total_points,
            discount_eligible: eligibility::evaluate(
                &policy,
                visitor.visit_count,
                visitor.orders_in_current_session,
            ) == Decision::Accept,
            has_unused_gift,
            gift_conversion_enabled: settings.gift_conversion_enabled,
            session_state: observed.transition.next,
        })
    }

    // ============ Order Submission ============

    pub async fn submit_order(
        &self,
        restaurant_id: &str,
        req: SubmitOrderRequest,
    ) -> Result<OrderSubmission> {
        self.submit_order_at(restaurant_id, req, Utc::now()).await
    }

    pub async fn submit_order_at(
        &self,
        restaurant_id: &str,
        req: SubmitOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<OrderSubmission> {
        validate_restaurant_id(restaurant_id)?;
        if req.total_cents < 0 || req.loyalty_discount_amount_cents < 0 {
            return Err(LoyaltyError::validation("order amounts must not be negative"));
        }
        // 折扣金额必须与折扣标记一致
        if req.loyalty_discount_amount_cents > 0 && !req.loyalty_discount_applied {
            return Err(LoyaltyError::validation(
                "loyalty_discount_amount_cents requires loyalty_discount_applied",
            ));
        }
        if req.loyalty_discount_amount_cents > req.total_cents {
            return Err(LoyaltyError::validation(
                "loyalty discount exceeds the order total",
            ));
        }
        let claim = RewardClaim {
            loyalty_discount_applied: req.loyalty_discount_applied,
            gift_id: req.gift_id,
        };

        let Some(device_id) = req.device_id.clone() else {
            if claim.is_claim() {
                return Err(LoyaltyError::validation(
                    "device_id is required to claim a loyalty reward",
                ));
            }
            return self.submit_anonymous_order(restaurant_id, req, now).await;
        };
        validate_device_id(&device_id)?;
        let settings = self.storage.get_settings(restaurant_id).await?;

        let txn = self.begin().await?;
        let observed = self
            .observe(
                &txn,
                restaurant_id,
                &device_id,
                Observation::Order,
                &settings,
                now,
            )
            .await?;

        let policy = EligibilityPolicy::from(&settings);
        if let Err(e) = eligibility::check_claim(&policy, &observed.resolved, &claim) {
            info!(
                "Reward claim rejected for {}/{} (visits={}, orders={}): {}",
                restaurant_id,
                device_id,
                observed.resolved.visit_count,
                observed.resolved.orders_in_current_session,
                e.message()
            );
            return Err(e);
        }

        if let Some(gift_id) = req.gift_id {
            self.consume_gift(&txn, restaurant_id, &device_id, gift_id, now)
                .await?;
        }

        let order = orders::insert_order(
            &txn,
            NewOrder {
                restaurant_id: restaurant_id.to_string(),
                loyalty_id: Some(device_id.clone()),
                total_cents: req.total_cents,
                loyalty_discount_applied: req.loyalty_discount_applied,
                loyalty_discount_amount_cents: req.loyalty_discount_amount_cents,
                gift_id: req.gift_id,
            },
            now,
        )
        .await?;

        let after = observed.transition.effects.finish(observed.resolved);
        let mut visitor = observed.visitor;
        after.apply_to(&mut visitor);
        visitors::save_session(&txn, &visitor).await?;
        Self::commit(txn).await?;

        info!(
            "Order {} submitted for {}/{}: state {:?} -> {:?}, visits={}, orders={}",
            order.id,
            restaurant_id,
            device_id,
            observed.state,
            observed.transition.next,
            visitor.visit_count,
            visitor.orders_in_current_session
        );

        Ok(OrderSubmission {
            order,
            session_state: Some(observed.transition.next),
            visit_banked: observed.transition.effects.bank_visit,
            total_visits: visitor.visit_count,
            orders_in_current_visit: visitor.orders_in_current_session,
            minted_gifts: observed.minted,
        })
    }

    async fn submit_anonymous_order(
        &self,
        restaurant_id: &str,
        req: SubmitOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<OrderSubmission> {
        let txn = self.begin().await?;
        let order = orders::insert_order(
            &txn,
            NewOrder {
                restaurant_id: restaurant_id.to_string(),
                loyalty_id: None,
                total_cents: req.total_cents,
                loyalty_discount_applied: false,
                loyalty_discount_amount_cents: 0,
                gift_id: None,
            },
            now,
        )
        .await?;
        Self::commit(txn).await?;

        debug!("Anonymous order {} submitted for {}", order.id, restaurant_id);
        Ok(OrderSubmission {
            order,
            session_state: None,
            visit_banked: false,
            total_visits: 0,
            orders_in_current_visit: 0,
            minted_gifts: Vec::new(),
        })
    }

    /// Redeem a gift with an order; the visitor row is already locked
    async fn consume_gift(
        &self,
        txn: &DatabaseTransaction,
        restaurant_id: &str,
        device_id: &str,
        gift_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Gift> {
        let gift = self
            .locked_gift(txn, restaurant_id, device_id, gift_id)
            .await?;
        gift_lifecycle::ensure_consumable(&gift)?;
        gifts::set_gift_status(txn, gift.id, GiftStatus::Consumed, now).await?;

        info!(
            "Gift {} consumed by {}/{}",
            gift.id, restaurant_id, device_id
        );
        Ok(Gift {
            status: GiftStatus::Consumed,
            updated_at: now,
            ..gift
        })
    }

    // ============ Gift Lifecycle ============

    async fn locked_visitor(
        &self,
        txn: &DatabaseTransaction,
        restaurant_id: &str,
        device_id: &str,
    ) -> Result<Visitor> {
        locks::lock_visitor(txn, restaurant_id, device_id)
            .await?
            .map(model_to_visitor)
            .ok_or_else(|| {
                LoyaltyError::not_found(format!(
                    "visitor {} not found in restaurant {}",
                    device_id, restaurant_id
                ))
            })
    }

    async fn locked_gift(
        &self,
        txn: &DatabaseTransaction,
        restaurant_id: &str,
        device_id: &str,
        gift_id: i64,
    ) -> Result<Gift> {
        let model = locks::lock_gift(txn, restaurant_id, device_id, gift_id)
            .await?
            .ok_or_else(|| LoyaltyError::not_found(format!("gift {} not found", gift_id)))?;
        model_to_gift(model)
    }

    /// Turn an unused gift's euro value into points
    pub async fn convert_gift(
        &self,
        restaurant_id: &str,
        device_id: &str,
        gift_id: i64,
    ) -> Result<GiftConversion> {
        validate_restaurant_id(restaurant_id)?;
        validate_device_id(device_id)?;
        let cached = self.storage.get_settings(restaurant_id).await?;
        ensure_conversion_enabled(&cached)?;

        let now = Utc::now();
        let txn = self.begin().await?;
        self.locked_visitor(&txn, restaurant_id, device_id).await?;
        // 锁定后重新读取，缓存可能落后于刚提交的配置修改
        let settings =
            settings::load_settings(&txn, restaurant_id, self.storage.loyalty_defaults()).await?;
        ensure_conversion_enabled(&settings)?;
        let gift = self
            .locked_gift(&txn, restaurant_id, device_id, gift_id)
            .await?;
        gift_lifecycle::ensure_convertible(&gift)?;

        let points =
            gift_lifecycle::conversion_points(gift.euro_value_cents, settings.points_per_euro);
        gifts::set_gift_status(&txn, gift.id, CONVERTED_GIFT_STATUS, now).await?;
        let total_points = ledger::append_entry(
            &txn,
            NewPointsEntry {
                restaurant_id: restaurant_id.to_string(),
                device_id: device_id.to_string(),
                order_id: None,
                gift_id: Some(gift.id),
                tx_type: TransactionType::ConvertGift,
                amount: points,
            },
            now,
        )
        .await?;
        Self::commit(txn).await?;

        info!(
            "Gift {} converted to {} points for {}/{} (balance {})",
            gift.id, points, restaurant_id, device_id, total_points
        );
        Ok(GiftConversion {
            gift_id: gift.id,
            points,
            total_points,
            status: CONVERTED_GIFT_STATUS,
        })
    }

    /// Undo a conversion: drop its ledger row and make the gift usable again
    pub async fn revert_gift_conversion(
        &self,
        restaurant_id: &str,
        device_id: &str,
        gift_id: i64,
    ) -> Result<GiftConversion> {
        validate_restaurant_id(restaurant_id)?;
        validate_device_id(device_id)?;

        let now = Utc::now();
        let txn = self.begin().await?;
        self.locked_visitor(&txn, restaurant_id, device_id).await?;
        let gift = self
            .locked_gift(&txn, restaurant_id, device_id, gift_id)
            .await?;
        gift_lifecycle::ensure_revertible(&gift)?;

        let entry = ledger::find_conversion_entry(&txn, gift.id)
            .await?
            .filter(|e| e.restaurant_id == restaurant_id && e.device_id == device_id)
            .ok_or_else(|| {
                LoyaltyError::not_found(format!("no conversion record for gift {}", gift.id))
            })?;

        let total_points = ledger::remove_entry(&txn, &entry).await?;
        gifts::set_gift_status(&txn, gift.id, GiftStatus::Unused, now).await?;
        Self::commit(txn).await?;

        info!(
            "Gift {} conversion reverted: -{} points for {}/{} (balance {})",
            gift.id, entry.amount, restaurant_id, device_id, total_points
        );
        Ok(GiftConversion {
            gift_id: gift.id,
            points: entry.amount,
            total_points,
            status: GiftStatus::Unused,
        })
    }

    // ============ Read Side ============

    pub async fn list_gifts(&self, restaurant_id: &str, device_id: &str) -> Result<Vec<Gift>> {
        validate_restaurant_id(restaurant_id)?;
        validate_device_id(device_id)?;
        self.storage.list_gifts(restaurant_id, device_id).await
    }

    pub async fn ledger(&self, restaurant_id: &str, device_id: &str) -> Result<LedgerView> {
        validate_restaurant_id(restaurant_id)?;
        validate_device_id(device_id)?;
        let entries = self.storage.ledger_history(restaurant_id, device_id).await?;
        let audit = self.storage.audit_ledger(restaurant_id, device_id).await?;
        Ok(LedgerView { entries, audit })
    }

    // ============ Settings ============

    pub async fn get_settings(&self, restaurant_id: &str) -> Result<RestaurantSettings> {
        validate_restaurant_id(restaurant_id)?;
        self.storage.get_settings(restaurant_id).await
    }

    pub async fn update_settings(
        &self,
        restaurant_id: &str,
        req: UpdateSettingsRequest,
    ) -> Result<RestaurantSettings> {
        validate_restaurant_id(restaurant_id)?;
        let mut settings = self.storage.get_settings(restaurant_id).await?;

        if let Some(rate) = req.points_per_euro {
            if !(0..=MAX_POINTS_PER_EURO).contains(&rate) {
                return Err(LoyaltyError::validation(format!(
                    "points_per_euro must be between 0 and {}",
                    MAX_POINTS_PER_EURO
                )));
            }
            settings.points_per_euro = rate;
        }
        if let Some(pct) = req.welcome_gift_percentage {
            if !(0..=100).contains(&pct) {
                return Err(LoyaltyError::validation(
                    "welcome_gift_percentage must be between 0 and 100",
                ));
            }
            settings.welcome_gift_percentage = pct;
        }
        if let Some(enabled) = req.gift_conversion_enabled {
            settings.gift_conversion_enabled = enabled;
        }
        if let Some(required) = req.require_banked_visit {
            settings.require_banked_visit = required;
        }
        if let Some(once) = req.welcome_once_per_session {
            settings.welcome_once_per_session = once;
        }

        self.storage.upsert_settings(&settings).await
    }
}

fn ensure_conversion_enabled(settings: &RestaurantSettings) -> Result<()> {
    if settings.gift_conversion_enabled {
        Ok(())
    } else {
        Err(LoyaltyError::forbidden(format!(
            "gift conversion is disabled for restaurant {}",
            settings.restaurant_id
        )))
    }
}

fn validate_restaurant_id(restaurant_id: &str) -> Result<()> {
    if restaurant_id.trim().is_empty() {
        return Err(LoyaltyError::validation("restaurant_id is required"));
    }
    Ok(())
}

fn validate_device_id(device_id: &str) -> Result<()> {
    if device_id.trim().is_empty() {
        return Err(LoyaltyError::validation("device_id is required"));
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(LoyaltyError::validation(format!(
            "device_id must be at most {} bytes",
            MAX_DEVICE_ID_LEN
        )));
    }
    if device_id.chars().any(char::is_control) {
        return Err(LoyaltyError::validation(
            "device_id must not contain control characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_device_id() {
        assert!(validate_device_id("a1b2-c3").is_ok());
        assert!(validate_device_id("  ").is_err());
        assert!(validate_device_id(&"x".repeat(129)).is_err());
        assert!(validate_device_id("bad\nid").is_err());
    }

    #[test]
    fn test_validate_restaurant_id() {
        assert!(validate_restaurant_id("r1").is_ok());
        assert!(matches!(
            validate_restaurant_id(""),
            Err(LoyaltyError::Validation(_))
        ));
    }
}
