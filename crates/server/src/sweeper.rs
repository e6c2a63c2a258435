use std::sync::Arc;
use std::time::Duration;

use eatba_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use eatba_core::session::SessionStore;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Purges expired sessions on a fixed interval until the task is aborted.
pub fn spawn<S>(sessions: Arc<S>, every: Duration, audit_sink: Arc<dyn AuditSink>) -> JoinHandle<()>
where
    S: SessionStore + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_once(sessions.as_ref(), audit_sink.as_ref());
        }
    })
}

pub fn sweep_once<S>(sessions: &S, audit_sink: &dyn AuditSink) -> usize
where
    S: SessionStore + ?Sized,
{
    let purged = sessions.purge_expired();
    if purged == 0 {
        debug!(
            event_name = "session.sweep.completed",
            correlation_id = "sweeper",
            purged,
            "nothing to purge"
        );
        return 0;
    }

    let remaining = sessions.len();
    info!(
        event_name = "session.sweep.completed",
        correlation_id = "sweeper",
        purged,
        remaining,
        "expired sessions purged"
    );
    audit_sink.emit(
        AuditEvent::new(
            &AuditContext::new(None, "sweeper", "session-sweeper"),
            "session.expired_purged",
            AuditCategory::Session,
            AuditOutcome::Success,
        )
        .with_metadata("purged", purged.to_string())
        .with_metadata("remaining", remaining.to_string()),
    );
    purged
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use eatba_core::audit::{AuditCategory, InMemoryAuditSink};
    use eatba_core::domain::item::MealTime;
    use eatba_core::session::{InMemorySessionStore, ManualClock, SessionSettings, SessionStore};

    use super::sweep_once;

    #[test]
    fn sweep_purges_only_expired_sessions() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("time");
        let clock = ManualClock::new(start);
        let sessions = InMemorySessionStore::with_clock(
            SessionSettings { ttl: Duration::from_secs(60), max_entries: 100 },
            clock.clone(),
        );
        let sink = InMemoryAuditSink::default();
        sessions.set("U1", MealTime::Breakfast);
        clock.advance(Duration::from_secs(45));
        sessions.set("U2", MealTime::Dinner);
        clock.advance(Duration::from_secs(30));

        assert_eq!(sweep_once(&sessions, &sink), 1);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sweep_once(&sessions, &sink), 0);

        let events = sink.events();
        assert_eq!(events.len(), 1, "empty sweeps are not audited");
        assert_eq!(events[0].category, AuditCategory::Session);
        assert_eq!(events[0].event_type, "session.expired_purged");
        assert_eq!(events[0].metadata.get("purged").map(String::as_str), Some("1"));
        assert_eq!(events[0].metadata.get("remaining").map(String::as_str), Some("1"));
    }
}
