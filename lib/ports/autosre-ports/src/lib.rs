//! Boundaries between the engine and its collaborators.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use autosre_domain::Snapshot;

/// Persistence collaborator. The engine only needs whole-snapshot load/save.
pub trait SnapshotPort: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet; `Err` when the stored data
    /// is unreadable.
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub trait ClockPort: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Clone)]
pub struct PortSet {
    pub store: Arc<dyn SnapshotPort>,
    pub clock: Arc<dyn ClockPort>,
}

impl PortSet {
    pub fn empty() -> Self {
        Self {
            store: Arc::new(NullSnapshotPort),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_store(store: Arc<dyn SnapshotPort>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn ClockPort>) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_millis)),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl ClockPort for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
struct NullSnapshotPort;

impl SnapshotPort for NullSnapshotPort {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(None)
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// Keeps the serialized form so a load exercises the same parse path as a
/// file-backed store.
#[derive(Clone, Default)]
pub struct InMemorySnapshotPort {
    raw: Arc<Mutex<Option<String>>>,
    saves: Arc<AtomicI64>,
}

impl InMemorySnapshotPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with arbitrary (possibly malformed) content.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let port = Self::default();
        if let Ok(mut guard) = port.raw.lock() {
            *guard = Some(raw.into());
        }
        port
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn save_count(&self) -> i64 {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotPort for InMemorySnapshotPort {
    fn load(&self) -> Result<Option<Snapshot>> {
        let raw = self
            .raw
            .lock()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?
            .clone();
        raw.map(|raw| Snapshot::from_json(&raw)).transpose()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let raw = snapshot.to_json()?;
        let mut guard = self
            .raw
            .lock()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        *guard = Some(raw);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .raw
            .lock()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
