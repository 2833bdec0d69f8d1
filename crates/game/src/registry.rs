//! Live missions and the background ticker that drives their countdowns

use chrono::{DateTime, Utc};
use common::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::identity::SessionEvent;
use crate::mission::MissionRunner;

/// A mission being played and its last touch
pub struct LiveMission {
    pub runner: MissionRunner,
    pub last_activity: DateTime<Utc>,
}

impl LiveMission {
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

pub type MissionHandle = Arc<tokio::sync::Mutex<LiveMission>>;

struct Entry {
    owner: Uuid,
    handle: MissionHandle,
    /// Ticks that found the mission busy; paid back on the next free tick
    owed_ticks: AtomicU32,
}

/// Counts from one pass of the ticker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub ticked: usize,
    pub deferred: usize,
    pub timed_out: usize,
}

/// In-memory table of live missions keyed by mission id. A player has at
/// most one live mission.
#[derive(Default)]
pub struct MissionRegistry {
    missions: Mutex<HashMap<Uuid, Arc<Entry>>>,
}

impl MissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Arc<Entry>>> {
        self.missions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track a runner, replacing any mission its player already has.
    /// Returns the new mission id and how many missions were replaced.
    pub fn insert(&self, runner: MissionRunner) -> (Uuid, usize) {
        let id = Uuid::new_v4();
        let owner = runner.player().user_id;
        let entry = Entry {
            owner,
            handle: Arc::new(tokio::sync::Mutex::new(LiveMission {
                runner,
                last_activity: Utc::now(),
            })),
            owed_ticks: AtomicU32::new(0),
        };

        let mut missions = self.lock();
        let before = missions.len();
        missions.retain(|_, e| e.owner != owner);
        let replaced = before - missions.len();
        missions.insert(id, Arc::new(entry));
        (id, replaced)
    }

    /// Look up a mission owned by `owner`
    pub fn get(&self, id: Uuid, owner: Uuid) -> Result<MissionHandle> {
        self.lock()
            .get(&id)
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| Error::NotFound(format!("Mission session {} not found", id)))
    }

    /// Abandon a mission; nothing is persisted
    pub fn remove(&self, id: Uuid, owner: Uuid) -> Result<()> {
        let mut missions = self.lock();
        match missions.get(&id) {
            Some(entry) if entry.owner == owner => {
                missions.remove(&id);
                debug!("Mission session {} abandoned", id);
                Ok(())
            }
            _ => Err(Error::NotFound(format!("Mission session {} not found", id))),
        }
    }

    /// Drop a mission that has ended. Safe to call while holding its lock.
    pub fn finish(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Drop every mission of a player; returns how many went away
    pub fn remove_owner(&self, owner: Uuid) -> usize {
        let mut missions = self.lock();
        let before = missions.len();
        missions.retain(|_, entry| entry.owner != owner);
        before - missions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// One second for every live mission. A mission busy with a request
    /// owes the tick and catches up on the next pass.
    pub async fn tick_all(&self) -> TickSummary {
        let entries: Vec<Arc<Entry>> = self.lock().values().cloned().collect();

        let mut summary = TickSummary::default();
        for entry in entries {
            let Ok(mut live) = entry.handle.try_lock() else {
                entry.owed_ticks.fetch_add(1, Ordering::Relaxed);
                summary.deferred += 1;
                continue;
            };
            summary.ticked += 1;

            let due = 1 + entry.owed_ticks.swap(0, Ordering::Relaxed);
            for _ in 0..due {
                if let Some(feedback) = live.runner.tick() {
                    summary.timed_out += 1;
                    debug!(
                        "Question {} timed out for {}",
                        feedback.question_id,
                        live.runner.player().username
                    );
                }
            }
        }
        summary
    }

    /// Drop missions idle for longer than `max_idle`
    pub async fn reap_idle(&self, max_idle: chrono::Duration) -> usize {
        let entries: Vec<(Uuid, Arc<Entry>)> = self
            .lock()
            .iter()
            .map(|(id, e)| (*id, e.clone()))
            .collect();

        let cutoff = Utc::now() - max_idle;
        let mut stale = Vec::new();
        for (id, entry) in entries {
            if let Ok(live) = entry.handle.try_lock() {
                if live.last_activity < cutoff {
                    stale.push(id);
                }
            }
        }

        let mut missions = self.lock();
        for id in &stale {
            missions.remove(id);
        }
        stale.len()
    }
}

/// Configuration for the ticker service
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Countdown resolution
    pub tick: Duration,
    /// Missions untouched for this long are dropped
    pub max_idle: chrono::Duration,
    /// Ticks between idle sweeps
    pub reap_every: u32,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            max_idle: chrono::Duration::minutes(30),
            reap_every: 60,
        }
    }
}

/// Background service ticking every live mission and tearing down missions
/// of players who log out
pub struct MissionTicker {
    registry: Arc<MissionRegistry>,
    config: TickerConfig,
    sessions: Option<Receiver<SessionEvent>>,
}

impl MissionTicker {
    pub fn new(
        registry: Arc<MissionRegistry>,
        config: TickerConfig,
        sessions: Receiver<SessionEvent>,
    ) -> Self {
        Self {
            registry,
            config,
            sessions: Some(sessions),
        }
    }

    /// Start the ticker loop
    pub async fn run(mut self) {
        info!("Starting mission ticker (tick: {:?})", self.config.tick);

        let mut ticker = interval(self.config.tick);
        let mut ticks: u32 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.registry.tick_all().await;
                    if summary.timed_out > 0 {
                        debug!("{} question(s) timed out", summary.timed_out);
                    }

                    ticks = ticks.wrapping_add(1);
                    if self.config.reap_every > 0 && ticks % self.config.reap_every == 0 {
                        let reaped = self.registry.reap_idle(self.config.max_idle).await;
                        if reaped > 0 {
                            info!("Dropped {} idle mission session(s)", reaped);
                        }
                    }
                }
                event = recv_session(&mut self.sessions) => {
                    match event {
                        Ok(SessionEvent::SignedOut(user_id)) => {
                            let dropped = self.registry.remove_owner(user_id);
                            if dropped > 0 {
                                info!("Abandoned {} mission(s) after logout of {}", dropped, user_id);
                            }
                        }
                        Ok(SessionEvent::SignedIn(_)) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Mission ticker missed {} session events", skipped);
                        }
                        Err(RecvError::Closed) => {
                            self.sessions = None;
                        }
                    }
                }
            }
        }
    }
}

async fn recv_session(
    sessions: &mut Option<Receiver<SessionEvent>>,
) -> std::result::Result<SessionEvent, RecvError> {
    match sessions {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{MissionState, Player};
    use crate::store::MemoryProgressStore;

    async fn started(player: &Player) -> MissionRunner {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player.clone()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();
        runner
    }

    fn player(name: &str) -> Player {
        Player {
            user_id: Uuid::new_v4(),
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missions_are_scoped_to_owner() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let (id, _) = registry.insert(started(&alice).await);

        assert!(registry.get(id, alice.user_id).is_ok());
        assert!(matches!(
            registry.get(id, Uuid::new_v4()),
            Err(Error::NotFound(_))
        ));
        assert!(registry.remove(id, Uuid::new_v4()).is_err());
        assert_eq!(registry.len(), 1);

        registry.remove(id, alice.user_id).unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_new_mission_replaces_previous_one() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let bob = player("bob");

        let (first, replaced) = registry.insert(started(&alice).await);
        assert_eq!(replaced, 0);
        let (bob_mission, _) = registry.insert(started(&bob).await);
        let (second, replaced) = registry.insert(started(&alice).await);

        assert_eq!(replaced, 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(first, alice.user_id).is_err());
        assert!(registry.get(second, alice.user_id).is_ok());
        assert!(registry.get(bob_mission, bob.user_id).is_ok());
    }

    #[tokio::test]
    async fn test_finish_while_locked() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let (id, _) = registry.insert(started(&alice).await);

        let handle = registry.get(id, alice.user_id).unwrap();
        let _live = handle.lock().await;
        assert!(registry.finish(id));
        assert!(!registry.finish(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_tick_all_counts_down() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let (id, _) = registry.insert(started(&alice).await);

        for _ in 0..3 {
            let summary = registry.tick_all().await;
            assert_eq!(summary.ticked, 1);
            assert_eq!(summary.timed_out, 0);
        }

        let handle = registry.get(id, alice.user_id).unwrap();
        assert_eq!(handle.lock().await.runner.remaining(), 147);
    }

    #[tokio::test]
    async fn test_tick_all_reports_timeouts() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let (id, _) = registry.insert(started(&alice).await);

        let mut timed_out = 0;
        for _ in 0..150 {
            timed_out += registry.tick_all().await.timed_out;
        }
        assert_eq!(timed_out, 1);

        let handle = registry.get(id, alice.user_id).unwrap();
        let live = handle.lock().await;
        assert_eq!(
            live.runner.state(),
            MissionState::InProgress { question_index: 0 }
        );
        assert_eq!(live.runner.answers().len(), 1);
    }

    #[tokio::test]
    async fn test_busy_mission_catches_up() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let (id, _) = registry.insert(started(&alice).await);
        let handle = registry.get(id, alice.user_id).unwrap();

        {
            let _busy = handle.lock().await;
            let summary = registry.tick_all().await;
            assert_eq!(summary.ticked, 0);
            assert_eq!(summary.deferred, 1);
            let summary = registry.tick_all().await;
            assert_eq!(summary.deferred, 1);
        }

        let summary = registry.tick_all().await;
        assert_eq!(summary.ticked, 1);
        assert_eq!(handle.lock().await.runner.remaining(), 147);

        registry.tick_all().await;
        assert_eq!(handle.lock().await.runner.remaining(), 146);
    }

    #[tokio::test]
    async fn test_remove_owner_drops_only_their_missions() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let bob = player("bob");
        registry.insert(started(&alice).await);
        let (bob_mission, _) = registry.insert(started(&bob).await);

        assert_eq!(registry.remove_owner(alice.user_id), 1);
        assert_eq!(registry.remove_owner(alice.user_id), 0);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(bob_mission, bob.user_id).is_ok());
    }

    #[tokio::test]
    async fn test_reap_idle() {
        let registry = MissionRegistry::new();
        let alice = player("alice");
        let bob = player("bob");
        let (stale, _) = registry.insert(started(&alice).await);
        let (fresh, _) = registry.insert(started(&bob).await);

        {
            let handle = registry.get(stale, alice.user_id).unwrap();
            handle.lock().await.last_activity = Utc::now() - chrono::Duration::hours(2);
        }

        assert_eq!(registry.reap_idle(chrono::Duration::minutes(30)).await, 1);
        assert!(registry.get(fresh, bob.user_id).is_ok());
        assert!(registry.get(stale, alice.user_id).is_err());
    }
}
