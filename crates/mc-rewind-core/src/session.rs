//! Per-connection state and the registry of open connections.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use std::time::Instant;

use mc_rewind_proto::Packet;
use tracing::{debug, warn};

use crate::config::RewindConfig;
use crate::error::RewindError;
use crate::protocol::ProtocolPair;

/// Identifies an open session in a [`SessionRegistry`].
pub type SessionId = u64;

/// What a stored object may know about its connection when it is built.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub username: String,
    pub pair: ProtocolPair,
    pub config: Arc<RewindConfig>,
}

pub trait AsAny: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A connection-scoped singleton kept in a [`Session`].
pub trait StoredObject: AsAny + Send {
    fn create(info: &SessionInfo) -> Self
    where
        Self: Sized;

    /// Called once per scheduler tick. Packets pushed to `out` go to the client.
    fn tick(&mut self, _now: Instant, _out: &mut Vec<Packet>) -> Result<(), RewindError> {
        Ok(())
    }
}

/// State of one connection, bound to a single protocol pair.
pub struct Session {
    info: SessionInfo,
    objects: HashMap<TypeId, Box<dyn StoredObject>>,
}

impl Session {
    pub fn new(pair: ProtocolPair, username: impl Into<String>, config: Arc<RewindConfig>) -> Self {
        Self {
            info: SessionInfo {
                username: username.into(),
                pair,
                config,
            },
            objects: HashMap::new(),
        }
    }

    pub fn pair(&self) -> ProtocolPair {
        self.info.pair
    }

    pub fn username(&self) -> &str {
        &self.info.username
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// The session's instance of `T`, built on first access.
    pub fn get<T: StoredObject>(&mut self) -> &mut T {
        let info = &self.info;
        let object = self
            .objects
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::create(info)));
        match (**object).as_any_mut().downcast_mut::<T>() {
            Some(object) => object,
            None => unreachable!("stored object is keyed by its own type id"),
        }
    }

    /// Whether `T` has been built yet.
    pub fn contains<T: StoredObject>(&self) -> bool {
        self.objects.contains_key(&TypeId::of::<T>())
    }

    /// Tick every stored object, collecting what they send. A failing
    /// object is logged and the others still tick.
    pub fn tick(&mut self, now: Instant) -> Vec<Packet> {
        let mut out = Vec::new();
        for object in self.objects.values_mut() {
            if let Err(e) = object.tick(now, &mut out) {
                warn!("Tick failed for a stored object of {}: {e}", self.info.username);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// All open sessions. Shared between connection tasks and the ticker.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<Session>>>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, session: Session) -> (SessionId, Arc<Mutex<Session>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Mutex::new(session));
        self.lock().insert(id, session.clone());
        debug!("Session {id} opened");
        (id, session)
    }

    /// Drop a session and everything it stores. Returns whether it was open.
    pub fn close(&self, id: SessionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!("Session {id} closed");
        }
        removed
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Mutex<Session>>> {
        self.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tick every open session. Sessions busy transforming a packet are
    /// skipped this round. A poisoned session is still ticked.
    pub fn tick(&self, now: Instant) -> Vec<(SessionId, Vec<Packet>)> {
        let snapshot: Vec<(SessionId, Arc<Mutex<Session>>)> = self
            .lock()
            .iter()
            .map(|(id, session)| (*id, session.clone()))
            .collect();

        let mut output = Vec::new();
        for (id, session) in snapshot {
            let mut session = match session.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            };
            let packets = session.tick(now);
            if !packets.is_empty() {
                output.push((id, packets));
            }
        }
        output
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, Arc<Mutex<Session>>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_rewind_proto::{FieldValue, Revision};

    struct Counter {
        ticks: u32,
        owner: String,
    }

    impl StoredObject for Counter {
        fn create(info: &SessionInfo) -> Self {
            Self {
                ticks: 0,
                owner: info.username.clone(),
            }
        }

        fn tick(&mut self, _now: Instant, out: &mut Vec<Packet>) -> Result<(), RewindError> {
            self.ticks += 1;
            out.push(Packet::clientbound(
                0x02,
                Revision::V1_8,
                vec![FieldValue::Int(self.ticks as i32)],
            ));
            Ok(())
        }
    }

    struct Failing;

    impl StoredObject for Failing {
        fn create(_info: &SessionInfo) -> Self {
            Failing
        }

        fn tick(&mut self, _now: Instant, _out: &mut Vec<Packet>) -> Result<(), RewindError> {
            Err(RewindError::ChunkCompression("boom".into()))
        }
    }

    struct Quiet(u8);

    impl StoredObject for Quiet {
        fn create(_info: &SessionInfo) -> Self {
            Quiet(0)
        }
    }

    fn session(name: &str) -> Session {
        Session::new(
            ProtocolPair::V1_9To1_8,
            name,
            Arc::new(RewindConfig::default()),
        )
    }

    #[test]
    fn get_is_lazy_and_singleton() {
        let mut s = session("Steve");
        assert!(!s.contains::<Quiet>());
        s.get::<Quiet>().0 = 7;
        assert!(s.contains::<Quiet>());
        assert_eq!(s.get::<Quiet>().0, 7);
        assert_eq!(s.get::<Counter>().owner, "Steve");
    }

    #[test]
    fn session_tick_reaches_tickable_objects() {
        let mut s = session("Alex");
        s.get::<Counter>();
        s.get::<Quiet>();
        let out = s.tick(Instant::now());
        assert_eq!(out.len(), 1);
        assert_eq!(s.get::<Counter>().ticks, 1);
    }

    #[test]
    fn failing_object_does_not_stop_the_others() {
        let mut s = session("Alex");
        s.get::<Failing>();
        s.get::<Counter>();
        s.get::<Failing>();
        for _ in 0..3 {
            assert_eq!(s.tick(Instant::now()).len(), 1);
        }
        assert_eq!(s.get::<Counter>().ticks, 3);
    }

    #[test]
    fn registry_open_close() {
        let registry = SessionRegistry::new();
        let (a, _) = registry.open(session("a"));
        let (b, _) = registry.open(session("b"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.close(a));
        assert!(!registry.close(a));
        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_some());
    }

    #[test]
    fn failing_session_does_not_stop_sweep() {
        let registry = SessionRegistry::new();
        let (bad, bad_session) = registry.open(session("bad"));
        bad_session.lock().unwrap().get::<Failing>();
        let (good, good_session) = registry.open(session("good"));
        good_session.lock().unwrap().get::<Counter>();

        let out = registry.tick(Instant::now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, good);
        assert!(out.iter().all(|(id, _)| *id != bad));
    }

    #[test]
    fn busy_session_is_skipped() {
        let registry = SessionRegistry::new();
        let (_, handle) = registry.open(session("busy"));
        handle.lock().unwrap().get::<Counter>();

        let guard = handle.lock().unwrap();
        assert!(registry.tick(Instant::now()).is_empty());
        drop(guard);

        assert_eq!(registry.tick(Instant::now()).len(), 1);
    }

    #[test]
    fn sessions_without_output_are_omitted() {
        let registry = SessionRegistry::new();
        let (_, handle) = registry.open(session("idle"));
        handle.lock().unwrap().get::<Quiet>();
        assert!(registry.tick(Instant::now()).is_empty());
        assert!(!registry.is_empty());
    }
}
