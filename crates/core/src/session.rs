use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::item::MealTime;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock that only moves when told to.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        match self.now.lock() {
            Ok(mut now) => *now += by,
            Err(poisoned) => *poisoned.into_inner() += by,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(30 * 60), max_entries: 10_000 }
    }
}

/// Per-user memory of the meal time picked last. Every call is atomic.
pub trait SessionStore: Send + Sync {
    /// Replaces any previous selection for `user_id`.
    fn set(&self, user_id: &str, category: MealTime);
    /// Reads the selection and extends its lifetime.
    fn get(&self, user_id: &str) -> Option<MealTime>;
    /// Reads the selection without extending its lifetime.
    fn peek(&self, user_id: &str) -> Option<MealTime>;
    fn clear(&self, user_id: &str) -> bool;
    fn purge_expired(&self) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug)]
struct SessionEntry {
    category: MealTime,
    touched_at: DateTime<Utc>,
}

pub struct InMemorySessionStore<C = SystemClock> {
    entries: Mutex<HashMap<String, SessionEntry>>,
    settings: SessionSettings,
    clock: C,
}

impl InMemorySessionStore<SystemClock> {
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl Default for InMemorySessionStore<SystemClock> {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl<C> InMemorySessionStore<C>
where
    C: Clock,
{
    pub fn with_clock(settings: SessionSettings, clock: C) -> Self {
        Self { entries: Mutex::new(HashMap::new()), settings, clock }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(entry.touched_at).to_std() {
            Ok(elapsed) => elapsed >= self.settings.ttl,
            Err(_) => false,
        }
    }

    fn make_room(&self, entries: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) {
        entries.retain(|_, entry| !self.is_expired(entry, now));
        while entries.len() >= self.settings.max_entries.max(1) {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.touched_at)
                .map(|(user_id, _)| user_id.clone())
            else {
                break;
            };
            entries.remove(&oldest);
            debug!(
                event_name = "session.evicted",
                user_id = %oldest,
                max_entries = self.settings.max_entries,
                "session store full; evicted least recently used session"
            );
        }
    }

    fn read(&self, user_id: &str, refresh: bool) -> Option<MealTime> {
        let now = self.clock.now();
        let mut entries = self.entries();
        if self.is_expired(entries.get(user_id)?, now) {
            entries.remove(user_id);
            return None;
        }
        let entry = entries.get_mut(user_id)?;
        if refresh {
            entry.touched_at = now;
        }
        Some(entry.category)
    }
}

impl<C> SessionStore for InMemorySessionStore<C>
where
    C: Clock,
{
    fn set(&self, user_id: &str, category: MealTime) {
        let now = self.clock.now();
        let mut entries = self.entries();
        if !entries.contains_key(user_id) && entries.len() >= self.settings.max_entries.max(1) {
            self.make_room(&mut entries, now);
        }
        entries.insert(user_id.to_owned(), SessionEntry { category, touched_at: now });
    }

    fn get(&self, user_id: &str) -> Option<MealTime> {
        self.read(user_id, true)
    }

    fn peek(&self, user_id: &str) -> Option<MealTime> {
        self.read(user_id, false)
    }

    fn clear(&self, user_id: &str) -> bool {
        self.entries().remove(user_id).is_some()
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}
