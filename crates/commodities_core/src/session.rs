//! crates/commodities_core/src/session.rs
//!
//! Reads and writes the persisted session and theme through a `KeyValueStorage`.
//! Pure data access: deciding what to do with a missing or broken session is
//! left to the auth gate.

use crate::domain::{Session, Theme, User};
use crate::ports::{KeyValueStorage, PortError, PortResult};
use tracing::warn;

pub const TOKEN_KEY: &str = "accessToken";
pub const USER_KEY: &str = "user";
pub const THEME_KEY: &str = "theme";

/// Persists a `Session` as two keys: the raw token and the user as JSON.
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the stored session, or `None` when either half is missing,
    /// the user record does not parse, or storage cannot be read.
    pub fn load(&self) -> Option<Session> {
        match self.try_load() {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding stored session: {}", e);
                None
            }
        }
    }

    fn try_load(&self) -> PortResult<Option<Session>> {
        let token = self.storage.get_item(TOKEN_KEY)?;
        let user_json = self.storage.get_item(USER_KEY)?;
        let (Some(access_token), Some(user_json)) = (token, user_json) else {
            return Ok(None);
        };
        let user: User = serde_json::from_str(&user_json)
            .map_err(|e| PortError::Corrupt(format!("user record: {e}")))?;
        Ok(Some(Session { access_token, user }))
    }

    /// Writes both halves of the session. If the token cannot be written the
    /// user key is removed again so the pair is never half-persisted.
    pub fn save(&self, session: &Session) -> PortResult<()> {
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| PortError::Unexpected(format!("serializing user: {e}")))?;
        self.storage.set_item(USER_KEY, &user_json)?;
        if let Err(e) = self.storage.set_item(TOKEN_KEY, &session.access_token) {
            if let Err(rollback) = self.storage.remove_item(USER_KEY) {
                warn!("Failed to roll back user record: {}", rollback);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes both keys. Both removals are attempted; the first failure is returned.
    pub fn clear(&self) -> PortResult<()> {
        let token = self.storage.remove_item(TOKEN_KEY);
        let user = self.storage.remove_item(USER_KEY);
        token.and(user)
    }

    /// The stored theme, falling back to light on anything unreadable.
    pub fn load_theme(&self) -> Theme {
        match self.storage.get_item(THEME_KEY) {
            Ok(Some(raw)) => Theme::parse(&raw).unwrap_or_else(|| {
                warn!("Ignoring unknown theme value '{}'", raw);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Could not read theme preference: {}", e);
                Theme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> PortResult<()> {
        self.storage.set_item(THEME_KEY, theme.as_str())
    }

    /// Flips the stored theme and returns the new value. A failed write still
    /// returns the flipped value so the caller can apply it for this run.
    pub fn toggle_theme(&self) -> Theme {
        let next = self.load_theme().toggled();
        if let Err(e) = self.save_theme(next) {
            warn!("Could not persist theme preference: {}", e);
        }
        next
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::memory::MemoryStorage;
    use std::cell::Cell;

    /// Storage that refuses selected operations.
    #[derive(Default)]
    pub(crate) struct FlakyStorage {
        pub inner: MemoryStorage,
        pub fail_reads: Cell<bool>,
        pub fail_token_write: Cell<bool>,
        pub fail_token_remove: Cell<bool>,
        pub fail_all_writes: Cell<bool>,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get_item(&self, key: &str) -> PortResult<Option<String>> {
            if self.fail_reads.get() {
                return Err(PortError::Unavailable("reads disabled".into()));
            }
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
            if self.fail_all_writes.get() || (self.fail_token_write.get() && key == TOKEN_KEY) {
                return Err(PortError::Unavailable("writes disabled".into()));
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> PortResult<()> {
            if self.fail_all_writes.get() || (self.fail_token_remove.get() && key == TOKEN_KEY) {
                return Err(PortError::Unavailable("writes disabled".into()));
            }
            self.inner.remove_item(key)
        }
    }

    pub(crate) fn sample_session() -> Session {
        Session {
            access_token: "mock-jwt-abc".to_string(),
            user: User {
                id: "mock-user-1".to_string(),
                email: "store1@x.com".to_string(),
                role: Role::StoreKeeper,
            },
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = SessionStore::new(MemoryStorage::new());
        store.save(&sample_session()).unwrap();
        assert_eq!(store.load(), Some(sample_session()));
    }

    #[test]
    fn token_without_user_is_absent() {
        let storage = MemoryStorage::new();
        storage.set_item(TOKEN_KEY, "t").unwrap();
        assert_eq!(SessionStore::new(storage).load(), None);
    }

    #[test]
    fn corrupt_user_json_is_absent() {
        let storage = MemoryStorage::new();
        storage.set_item(TOKEN_KEY, "t").unwrap();
        storage.set_item(USER_KEY, "{not json").unwrap();
        assert_eq!(SessionStore::new(storage).load(), None);
    }

    #[test]
    fn unreadable_storage_is_absent() {
        let flaky = FlakyStorage::default();
        SessionStore::new(&flaky).save(&sample_session()).unwrap();
        flaky.fail_reads.set(true);
        assert_eq!(SessionStore::new(&flaky).load(), None);
    }

    #[test]
    fn failed_token_write_rolls_back_user() {
        let flaky = FlakyStorage::default();
        flaky.fail_token_write.set(true);
        let store = SessionStore::new(&flaky);
        assert!(store.save(&sample_session()).is_err());
        assert_eq!(flaky.inner.get_item(USER_KEY).unwrap(), None);
        assert_eq!(flaky.inner.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn clear_removes_both_keys() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&sample_session()).unwrap();
        store.clear().unwrap();
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
    }

    #[test]
    fn clear_removes_user_even_when_token_removal_fails() {
        let flaky = FlakyStorage::default();
        let store = SessionStore::new(&flaky);
        store.save(&sample_session()).unwrap();
        flaky.fail_token_remove.set(true);
        assert!(store.clear().is_err());
        assert_eq!(flaky.inner.get_item(USER_KEY).unwrap(), None);
        assert_eq!(flaky.inner.get_item(TOKEN_KEY).unwrap().as_deref(), Some("mock-jwt-abc"));
    }

    #[test]
    fn toggle_theme_returns_flipped_value_when_write_fails() {
        let flaky = FlakyStorage::default();
        flaky.fail_all_writes.set(true);
        assert_eq!(SessionStore::new(&flaky).toggle_theme(), Theme::Dark);
        assert_eq!(flaky.inner.get_item(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn theme_defaults_to_light_and_toggles() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        assert_eq!(store.load_theme(), Theme::Light);
        assert_eq!(store.toggle_theme(), Theme::Dark);
        assert_eq!(storage.get_item(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(store.toggle_theme(), Theme::Light);
    }

    #[test]
    fn unknown_theme_value_falls_back_to_light() {
        let storage = MemoryStorage::new();
        storage.set_item(THEME_KEY, "sepia").unwrap();
        assert_eq!(SessionStore::new(storage).load_theme(), Theme::Light);
    }
}
