//! 会话状态机与资格判定基准测试

use chrono::{Duration, Utc};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tabletrail::loyalty::eligibility::{self, EligibilityPolicy};
use tabletrail::loyalty::session::{self, Observation, SessionPolicy, SessionSnapshot, SessionState};

fn snapshot(orders: u32, idle_secs: i64) -> SessionSnapshot {
    let now = Utc::now();
    SessionSnapshot {
        visit_count: 3,
        orders_in_current_session: orders,
        last_session_at: now - Duration::seconds(idle_secs),
        last_visit_at: Some(now - Duration::days(2)),
        last_counted_at: Some(now - Duration::days(2)),
    }
}

/// classify + transition + resolve + finish：一次完整观测
fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("session/observe");
    group.throughput(Throughput::Elements(1));
    let policy = SessionPolicy::from_secs(180);

    let cases = [
        ("heartbeat", snapshot(2, 30), Observation::Poll),
        ("expired_poll", snapshot(2, 900), Observation::Poll),
        ("banking_order", snapshot(0, 900), Observation::Order),
    ];

    for (name, before, observation) in cases {
        group.bench_function(name, |b| {
            let now = Utc::now();
            b.iter(|| {
                let state = SessionState::classify(Some(black_box(&before)), now, &policy);
                let t = session::transition(state, observation, true);
                let resolved = t.effects.resolve(&before, now);
                black_box(t.effects.finish(resolved))
            });
        });
    }

    group.finish();
}

fn bench_eligibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("session/eligibility");
    group.throughput(Throughput::Elements(1));
    let policy = EligibilityPolicy::default();

    group.bench_function("evaluate", |b| {
        b.iter(|| eligibility::evaluate(&policy, black_box(1), black_box(1)));
    });

    group.finish();
}

criterion_group!(benches, bench_observe, bench_eligibility);
criterion_main!(benches);
