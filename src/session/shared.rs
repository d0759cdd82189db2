//! Sharing sessions between threads.
//!
//! Each session has a single writer at a time: `SharedSession` puts it
//! behind a mutex, so requests against one session are serialized while
//! different sessions proceed in parallel. The `SessionRegistry` hands out
//! session ids and owns the deck library every session reads from.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::game::GameSession;
use crate::cards::DeckLibrary;
use crate::core::{GameRng, PlayerId, Result, SessionConfig, SessionId};

/// A session that can be handed to several request handlers.
#[derive(Clone, Debug)]
pub struct SharedSession(Arc<Mutex<GameSession>>);

impl SharedSession {
    pub fn new(session: GameSession) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    /// Take the session lock, recovering it if a previous holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut GameSession) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

/// All live sessions of a process.
#[derive(Debug)]
pub struct SessionRegistry {
    library: Arc<DeckLibrary>,
    seeds: GameRng,
    sessions: Mutex<FxHashMap<SessionId, SharedSession>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    /// Create a registry over a fixed deck library.
    ///
    /// Each session's RNG is derived from `seed` and its id, so a registry
    /// replays the same games when given the same seed and requests.
    pub fn new(library: Arc<DeckLibrary>, seed: u64) -> Self {
        Self {
            library,
            seeds: GameRng::new(seed),
            sessions: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn library(&self) -> &DeckLibrary {
        &self.library
    }

    fn sessions(&self) -> MutexGuard<'_, FxHashMap<SessionId, SharedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a session from named decks of the library.
    ///
    /// The seed in `config` is replaced by one derived from the registry.
    pub fn create(
        &self,
        host: PlayerId,
        deck_names: &[&str],
        config: SessionConfig,
    ) -> Result<(SessionId, SharedSession)> {
        let decks = self.library.select(deck_names)?;

        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let seed = self.seeds.for_context(&id.to_string()).seed();
        let session = GameSession::new(id, host, decks, config.with_seed(seed))?;

        let shared = SharedSession::new(session);
        self.sessions().insert(id, shared.clone());
        info!(session = %id, decks = ?deck_names, "Session registered");
        Ok((id, shared))
    }

    pub fn get(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions().get(&id).cloned()
    }

    /// Drop a session from the registry. Handles already given out stay
    /// usable.
    pub fn remove(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Remove every finished session and return their ids, lowest first.
    pub fn reap_finished(&self) -> Vec<SessionId> {
        let mut sessions = self.sessions();
        let mut finished: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, s)| s.lock().result().is_some())
            .map(|(id, _)| *id)
            .collect();
        finished.sort();

        for id in &finished {
            sessions.remove(id);
        }
        if !finished.is_empty() {
            debug!(count = finished.len(), "Reaped finished sessions");
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, Deck, PromptCard, ResponseCard};
    use crate::core::{EngineError, WinCondition};
    use crate::rules::Phase;
    use std::thread;

    fn p(id: u64) -> PlayerId {
        PlayerId::new(id)
    }

    fn library() -> Arc<DeckLibrary> {
        let mut deck = Deck::new("base");
        for i in 0..8 {
            deck.prompts.push(PromptCard::new(CardId::new(i), "_."));
        }
        for i in 0..60 {
            deck.responses.push(ResponseCard::new(CardId::new(i), format!("R{}", i)));
        }
        let mut library = DeckLibrary::new();
        library.register(deck).unwrap();
        Arc::new(library)
    }

    fn config() -> SessionConfig {
        SessionConfig::default()
            .with_hand_size(5)
            .with_win_condition(WinCondition::Wins(1))
    }

    #[test]
    fn test_create_and_get() {
        let registry = SessionRegistry::new(library(), 7);
        let (id, shared) = registry.create(p(1), &["base"], config()).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(shared.lock().id(), id);
        assert_eq!(registry.get(id).unwrap().lock().host(), p(1));
        assert!(registry.get(SessionId::new(999)).is_none());
    }

    #[test]
    fn test_unknown_deck() {
        let registry = SessionRegistry::new(library(), 7);
        let result = registry.create(p(1), &["missing"], config());
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_combined_decks_keep_every_card() {
        let mut expansion = Deck::new("expansion");
        for i in 0..5 {
            expansion.prompts.push(PromptCard::new(CardId::new(i), "More _."));
        }
        for i in 0..30 {
            expansion.responses.push(ResponseCard::new(CardId::new(i), format!("E{}", i)));
        }
        let mut library = (*library()).clone();
        library.register(expansion).unwrap();

        let registry = SessionRegistry::new(Arc::new(library), 7);
        let (_, shared) = registry.create(p(1), &["base", "expansion"], config()).unwrap();

        let session = shared.lock();
        assert_eq!(session.table().prompts.total(), 13);
        assert_eq!(session.table().responses.total(), 90);
    }

    #[test]
    fn test_lock_survives_panicking_holder() {
        let registry = SessionRegistry::new(library(), 7);
        let (_, shared) = registry.create(p(1), &["base"], config()).unwrap();

        let poisoner = shared.clone();
        let outcome = thread::spawn(move || poisoner.with(|_| panic!("handler crashed"))).join();
        assert!(outcome.is_err());

        assert_eq!(shared.lock().host(), p(1));
        shared.with(|s| s.join(p(2))).unwrap();
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SessionRegistry::new(library(), 7);
        let (a, _) = registry.create(p(1), &["base"], config()).unwrap();
        let (b, _) = registry.create(p(1), &["base"], config()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_seed_same_deals() {
        let deal = |seed| {
            let registry = SessionRegistry::new(library(), seed);
            let (_, shared) = registry.create(p(1), &["base"], config()).unwrap();
            shared.with(|s| {
                s.join(p(2)).unwrap();
                s.join(p(3)).unwrap();
                s.start(p(1)).unwrap();
                s.hand(p(2)).unwrap().to_vec()
            })
        };
        assert_eq!(deal(5), deal(5));
    }

    #[test]
    fn test_sessions_run_in_parallel() {
        let registry = Arc::new(SessionRegistry::new(library(), 3));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let (id, shared) = registry.create(p(1), &["base"], config()).unwrap();
                    shared.with(|s| {
                        s.join(p(2)).unwrap();
                        s.join(p(3)).unwrap();
                        s.start(p(1)).unwrap();
                        s.submit_cards(p(2), &[0]).unwrap();
                        s.submit_cards(p(3), &[0]).unwrap();
                        s.close_submissions().unwrap();
                        s.pick_winner(p(1), p(2)).unwrap();
                    });
                    id
                })
            })
            .collect();

        let ids: Vec<SessionId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for id in &ids {
            assert_eq!(registry.get(*id).unwrap().lock().phase(), Phase::GameOver);
        }

        let mut reaped = registry.reap_finished();
        reaped.sort();
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(reaped, expected);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_submissions_to_one_session() {
        let registry = SessionRegistry::new(library(), 3);
        let (_, shared) = registry.create(p(1), &["base"], config()).unwrap();
        shared.with(|s| {
            for i in 2..=6 {
                s.join(p(i)).unwrap();
            }
            s.start(p(1)).unwrap();
        });

        let handles: Vec<_> = (2..=6)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || shared.with(|s| s.submit_cards(p(i), &[1]).map(|_| ())))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert!(shared.lock().all_submitted());
    }

    #[test]
    fn test_reap_keeps_running_sessions() {
        let registry = SessionRegistry::new(library(), 3);
        let (running, _) = registry.create(p(1), &["base"], config()).unwrap();
        let (done, shared) = registry.create(p(1), &["base"], config()).unwrap();
        shared.with(|s| s.cancel()).unwrap();

        assert_eq!(registry.reap_finished(), vec![done]);
        assert!(registry.get(running).is_some());
    }
}
