//! Visit clustering
//!
//! A visitor's activity (status polls and order submissions) is grouped into
//! sessions separated by more than [`SessionPolicy::timeout`] of silence. A
//! session becomes a banked visit once an order arrives in a new window and
//! the visitor has a completed order since the previous bank.
//!
//! Everything here is pure: the service loads the locked visitor row, asks
//! [`transition`] what to do and writes the result back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::storage::Visitor;
use crate::storage::models::TS_EXPORT_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub timeout: Duration,
}

impl SessionPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Strictly more than `timeout` since `last_activity`
    ///
    /// A clock that went backwards counts as no time elapsed.
    pub fn is_expired(&self, last_activity: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - last_activity).to_std() {
            Ok(elapsed) => elapsed > self.timeout,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// No visitor row yet
    NoVisit,
    /// Live window that already holds at least one order
    OpenSession,
    /// Fresh window with no order yet: the next order may bank a visit
    ClosedAwaitingBank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Poll,
    Order,
}

/// Session columns of a visitor row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub visit_count: u32,
    pub orders_in_current_session: u32,
    pub last_session_at: DateTime<Utc>,
    pub last_visit_at: Option<DateTime<Utc>>,
    pub last_counted_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Counters of a row created at `now`
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            visit_count: 0,
            orders_in_current_session: 0,
            last_session_at: now,
            last_visit_at: None,
            last_counted_at: None,
        }
    }

    pub fn with_order_counted(self) -> Self {
        Self {
            orders_in_current_session: self.orders_in_current_session.saturating_add(1),
            ..self
        }
    }

    pub fn apply_to(&self, visitor: &mut Visitor) {
        visitor.visit_count = self.visit_count;
        visitor.orders_in_current_session = self.orders_in_current_session;
        visitor.last_session_at = self.last_session_at;
        visitor.last_visit_at = self.last_visit_at;
        visitor.last_counted_at = self.last_counted_at;
    }
}

impl From<&Visitor> for SessionSnapshot {
    fn from(visitor: &Visitor) -> Self {
        Self {
            visit_count: visitor.visit_count,
            orders_in_current_session: visitor.orders_in_current_session,
            last_session_at: visitor.last_session_at,
            last_visit_at: visitor.last_visit_at,
            last_counted_at: visitor.last_counted_at,
        }
    }
}

impl SessionState {
    /// Derive the state from the stored row as of `now`
    pub fn classify(
        snapshot: Option<&SessionSnapshot>,
        now: DateTime<Utc>,
        policy: &SessionPolicy,
    ) -> Self {
        match snapshot {
            None => SessionState::NoVisit,
            Some(s) if policy.is_expired(s.last_session_at, now) => {
                SessionState::ClosedAwaitingBank
            }
            Some(s) if s.orders_in_current_session == 0 => SessionState::ClosedAwaitingBank,
            Some(_) => SessionState::OpenSession,
        }
    }

    /// Whether [`transition`] needs the completed-order lookup
    pub fn needs_completed_order_check(self, observation: Observation) -> bool {
        self == SessionState::ClosedAwaitingBank && observation == Observation::Order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionEffects {
    pub create_visitor: bool,
    pub reset_session_orders: bool,
    pub stamp_session: bool,
    pub bank_visit: bool,
    pub increment_session_orders: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionState,
    pub effects: SessionEffects,
}

/// The session state machine
///
/// `has_completed_order` only matters for an order in `ClosedAwaitingBank`.
pub fn transition(
    state: SessionState,
    observation: Observation,
    has_completed_order: bool,
) -> Transition {
    let order = observation == Observation::Order;
    let (next, effects) = match state {
        SessionState::NoVisit => (
            if order {
                SessionState::OpenSession
            } else {
                SessionState::ClosedAwaitingBank
            },
            SessionEffects {
                create_visitor: true,
                stamp_session: true,
                ..Default::default()
            },
        ),
        SessionState::ClosedAwaitingBank if order => (
            SessionState::OpenSession,
            SessionEffects {
                reset_session_orders: true,
                stamp_session: true,
                bank_visit: has_completed_order,
                ..Default::default()
            },
        ),
        SessionState::ClosedAwaitingBank => (
            SessionState::ClosedAwaitingBank,
            SessionEffects {
                reset_session_orders: true,
                stamp_session: true,
                ..Default::default()
            },
        ),
        SessionState::OpenSession => (
            SessionState::OpenSession,
            SessionEffects {
                stamp_session: true,
                ..Default::default()
            },
        ),
    };

    Transition {
        next,
        effects: SessionEffects {
            increment_session_orders: order,
            ..effects
        },
    }
}

impl SessionEffects {
    /// Apply everything except the order increment
    ///
    /// The result is the state the eligibility gate looks at: the visit is
    /// already banked but the incoming order is not counted yet.
    pub fn resolve(&self, before: &SessionSnapshot, now: DateTime<Utc>) -> SessionSnapshot {
        let mut after = *before;
        if self.reset_session_orders {
            after.orders_in_current_session = 0;
        }
        if self.stamp_session {
            after.last_session_at = now;
        }
        if self.bank_visit {
            after.visit_count = after.visit_count.saturating_add(1);
            after.last_visit_at = Some(now);
            after.last_counted_at = Some(now);
        }
        after
    }

    pub fn finish(&self, resolved: SessionSnapshot) -> SessionSnapshot {
        if self.increment_session_orders {
            resolved.with_order_counted()
        } else {
            resolved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn policy() -> SessionPolicy {
        SessionPolicy::from_secs(180)
    }

    fn snapshot(visits: u32, orders: u32, last: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            visit_count: visits,
            orders_in_current_session: orders,
            last_session_at: last,
            last_visit_at: None,
            last_counted_at: None,
        }
    }

    #[test]
    fn test_expiry_is_strict() {
        let now = Utc::now();
        let p = policy();
        assert!(!p.is_expired(now - ChronoDuration::seconds(180), now));
        assert!(p.is_expired(now - ChronoDuration::seconds(181), now));
        // clock skew
        assert!(!p.is_expired(now + ChronoDuration::seconds(30), now));
    }

    #[test]
    fn test_classify() {
        let now = Utc::now();
        let p = policy();
        assert_eq!(SessionState::classify(None, now, &p), SessionState::NoVisit);

        let live_empty = snapshot(0, 0, now - ChronoDuration::seconds(10));
        assert_eq!(
            SessionState::classify(Some(&live_empty), now, &p),
            SessionState::ClosedAwaitingBank
        );

        let live_busy = snapshot(2, 3, now - ChronoDuration::seconds(10));
        assert_eq!(
            SessionState::classify(Some(&live_busy), now, &p),
            SessionState::OpenSession
        );

        let expired = snapshot(2, 3, now - ChronoDuration::minutes(10));
        assert_eq!(
            SessionState::classify(Some(&expired), now, &p),
            SessionState::ClosedAwaitingBank
        );
    }

    #[test]
    fn test_first_observation_creates_visitor() {
        let poll = transition(SessionState::NoVisit, Observation::Poll, false);
        assert_eq!(poll.next, SessionState::ClosedAwaitingBank);
        assert!(poll.effects.create_visitor);
        assert!(!poll.effects.increment_session_orders);

        let order = transition(SessionState::NoVisit, Observation::Order, true);
        assert_eq!(order.next, SessionState::OpenSession);
        assert!(order.effects.increment_session_orders);
        assert!(!order.effects.bank_visit);
    }

    #[test]
    fn test_poll_never_banks() {
        for completed in [false, true] {
            for state in [
                SessionState::NoVisit,
                SessionState::OpenSession,
                SessionState::ClosedAwaitingBank,
            ] {
                let t = transition(state, Observation::Poll, completed);
                assert!(!t.effects.bank_visit, "{:?} banked on poll", state);
            }
        }
    }

    #[test]
    fn test_order_after_gap_banks_only_with_completed_order() {
        let banked = transition(SessionState::ClosedAwaitingBank, Observation::Order, true);
        assert!(banked.effects.bank_visit);
        assert!(banked.effects.reset_session_orders);
        assert_eq!(banked.next, SessionState::OpenSession);

        let unbanked = transition(SessionState::ClosedAwaitingBank, Observation::Order, false);
        assert!(!unbanked.effects.bank_visit);
        assert!(unbanked.effects.reset_session_orders);
    }

    #[test]
    fn test_live_window_is_heartbeat_only() {
        let t = transition(SessionState::OpenSession, Observation::Order, true);
        assert_eq!(
            t.effects,
            SessionEffects {
                stamp_session: true,
                increment_session_orders: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_resolve_then_finish() {
        let now = Utc::now();
        let before = snapshot(1, 4, now - ChronoDuration::minutes(30));
        let t = transition(SessionState::ClosedAwaitingBank, Observation::Order, true);

        let resolved = t.effects.resolve(&before, now);
        assert_eq!(resolved.visit_count, 2);
        assert_eq!(resolved.orders_in_current_session, 0);
        assert_eq!(resolved.last_counted_at, Some(now));
        assert_eq!(resolved.last_session_at, now);

        let finished = t.effects.finish(resolved);
        assert_eq!(finished.orders_in_current_session, 1);
        assert_eq!(finished.visit_count, 2);
    }

    #[test]
    fn test_expired_poll_resets_counter_without_banking() {
        let now = Utc::now();
        let before = snapshot(3, 2, now - ChronoDuration::minutes(30));
        let state = SessionState::classify(Some(&before), now, &policy());
        let t = transition(state, Observation::Poll, true);
        let after = t.effects.finish(t.effects.resolve(&before, now));
        assert_eq!(after.visit_count, 3);
        assert_eq!(after.orders_in_current_session, 0);
        assert_eq!(after.last_session_at, now);
    }
}
