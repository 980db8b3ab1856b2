//! Client-side key/value state: one session id per game family plus the
//! logged-in player.

use anyhow::Context;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::GameFamily;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub user_id: i64,
    pub name: String,
    pub roll_number: String,
    pub school_name: String,
}

pub trait SessionRepository: Send + Sync {
    fn session_id(&self, family: GameFamily) -> anyhow::Result<Option<String>>;

    fn set_session_id(&self, family: GameFamily, id: &str) -> anyhow::Result<()>;

    fn clear_session_id(&self, family: GameFamily) -> anyhow::Result<()>;

    fn current_user(&self) -> anyhow::Result<Option<PlayerIdentity>>;

    fn set_current_user(&self, user: &PlayerIdentity) -> anyhow::Result<()>;

    fn clear_current_user(&self) -> anyhow::Result<()>;
}

/// `<prefix>_<unix millis>_<6 base36 chars>`, e.g. `g1_1718000000000_k3x9qa`
pub fn new_session_id<R: Rng + ?Sized>(family: GameFamily, rng: &mut R) -> String {
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!(
        "{}_{}_{}",
        family.id_prefix(),
        Utc::now().timestamp_millis(),
        suffix
    )
}

/// Stored id for the family, generating and persisting one on first use.
pub fn ensure_session_id(repo: &dyn SessionRepository, family: GameFamily) -> anyhow::Result<String> {
    if let Some(id) = repo.session_id(family)? {
        return Ok(id);
    }
    let id = new_session_id(family, &mut rand::rng());
    repo.set_session_id(family, &id)?;
    tracing::info!(family = family.as_str(), session_id = %id, "new session id");
    Ok(id)
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoredState {
    #[serde(default)]
    sessions: HashMap<String, String>,
    #[serde(default)]
    user: Option<PlayerIdentity>,
}

impl StoredState {
    fn session_key(family: GameFamily) -> String {
        family.storage_key().to_string()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("session state lock poisoned")
}

/// Process-lifetime repository
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    state: Mutex<StoredState>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for MemorySessionRepository {
    fn session_id(&self, family: GameFamily) -> anyhow::Result<Option<String>> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.sessions.get(&StoredState::session_key(family)).cloned())
    }

    fn set_session_id(&self, family: GameFamily, id: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state
            .sessions
            .insert(StoredState::session_key(family), id.to_string());
        Ok(())
    }

    fn clear_session_id(&self, family: GameFamily) -> anyhow::Result<()> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.sessions.remove(&StoredState::session_key(family));
        Ok(())
    }

    fn current_user(&self) -> anyhow::Result<Option<PlayerIdentity>> {
        Ok(self.state.lock().map_err(poisoned)?.user.clone())
    }

    fn set_current_user(&self, user: &PlayerIdentity) -> anyhow::Result<()> {
        self.state.lock().map_err(poisoned)?.user = Some(user.clone());
        Ok(())
    }

    fn clear_current_user(&self) -> anyhow::Result<()> {
        self.state.lock().map_err(poisoned)?.user = None;
        Ok(())
    }
}

/// Repository backed by a JSON file, surviving restarts
#[derive(Debug)]
pub struct FileSessionRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> anyhow::Result<StoredState> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("corrupt session file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredState::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    fn save(&self, state: &StoredState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    fn update(&self, f: impl FnOnce(&mut StoredState)) -> anyhow::Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)
    }
}

impl SessionRepository for FileSessionRepository {
    fn session_id(&self, family: GameFamily) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self
            .load()?
            .sessions
            .remove(&StoredState::session_key(family)))
    }

    fn set_session_id(&self, family: GameFamily, id: &str) -> anyhow::Result<()> {
        self.update(|s| {
            s.sessions
                .insert(StoredState::session_key(family), id.to_string());
        })
    }

    fn clear_session_id(&self, family: GameFamily) -> anyhow::Result<()> {
        self.update(|s| {
            s.sessions.remove(&StoredState::session_key(family));
        })
    }

    fn current_user(&self) -> anyhow::Result<Option<PlayerIdentity>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.load()?.user)
    }

    fn set_current_user(&self, user: &PlayerIdentity) -> anyhow::Result<()> {
        self.update(|s| s.user = Some(user.clone()))
    }

    fn clear_current_user(&self) -> anyhow::Result<()> {
        self.update(|s| s.user = None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn player() -> PlayerIdentity {
        PlayerIdentity {
            user_id: 3,
            name: "Asha".into(),
            roll_number: "R-17".into(),
            school_name: "Hillview".into(),
        }
    }

    #[test]
    fn session_id_format() {
        let mut rng = StdRng::seed_from_u64(9);
        let id = new_session_id(GameFamily::Game2, &mut rng);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "g2");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn ensure_reuses_the_stored_id() {
        let repo = MemorySessionRepository::new();
        let first = ensure_session_id(&repo, GameFamily::Game1).unwrap();
        let again = ensure_session_id(&repo, GameFamily::Game1).unwrap();
        assert_eq!(first, again);
        assert!(first.starts_with("g1_"));

        let other = ensure_session_id(&repo, GameFamily::Game2).unwrap();
        assert_ne!(first, other);

        repo.clear_session_id(GameFamily::Game1).unwrap();
        assert_eq!(repo.session_id(GameFamily::Game1).unwrap(), None);
    }

    #[test]
    fn memory_repository_holds_the_player() {
        let repo = MemorySessionRepository::new();
        assert_eq!(repo.current_user().unwrap(), None);
        repo.set_current_user(&player()).unwrap();
        assert_eq!(repo.current_user().unwrap(), Some(player()));
        repo.clear_current_user().unwrap();
        assert_eq!(repo.current_user().unwrap(), None);
    }

    #[test]
    fn file_repository_survives_reopen() {
        let path = std::env::temp_dir().join(format!("mindtrack-{}.json", uuid::Uuid::new_v4()));

        let repo = FileSessionRepository::new(&path);
        assert_eq!(repo.session_id(GameFamily::Game1).unwrap(), None);
        repo.set_session_id(GameFamily::Game1, "g1_1_abcdef").unwrap();
        repo.set_current_user(&player()).unwrap();
        drop(repo);

        let reopened = FileSessionRepository::new(&path);
        assert_eq!(
            reopened.session_id(GameFamily::Game1).unwrap().as_deref(),
            Some("g1_1_abcdef")
        );
        assert_eq!(reopened.current_user().unwrap(), Some(player()));

        reopened.clear_current_user().unwrap();
        assert_eq!(reopened.current_user().unwrap(), None);

        let _ = std::fs::remove_file(&path);
    }
}
