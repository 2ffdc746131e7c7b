// ── Authentication context ──
//
// Holds the bearer token shared by polling and commands. Once the remote
// rejects the token, every caller short-circuits with an auth error until
// a replacement is supplied; nothing retries a known-bad token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;

use crate::error::CoreError;

struct TokenState {
    token: Arc<SecretString>,
    invalid: bool,
}

pub struct AuthContext {
    state: Mutex<TokenState>,
}

impl AuthContext {
    pub fn new(token: SecretString) -> Self {
        Self {
            state: Mutex::new(TokenState {
                token: Arc::new(token),
                invalid: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The token to use for the next remote call.
    pub fn current_token(&self) -> Result<Arc<SecretString>, CoreError> {
        let state = self.lock();
        if state.invalid {
            return Err(CoreError::Auth {
                message: "token was rejected; a new token is required".into(),
            });
        }
        Ok(Arc::clone(&state.token))
    }

    /// Flag the current token as rejected. Returns `true` on the first
    /// transition so the caller can report it once.
    pub fn mark_invalid(&self) -> bool {
        let mut state = self.lock();
        let first = !state.invalid;
        state.invalid = true;
        first
    }

    /// Flag `token` as rejected, unless it has been replaced in the
    /// meantime. A late 401 for an old token must not poison a new one.
    pub fn reject(&self, token: &Arc<SecretString>) -> bool {
        let mut state = self.lock();
        if !Arc::ptr_eq(&state.token, token) {
            return false;
        }
        let first = !state.invalid;
        state.invalid = true;
        first
    }

    pub fn is_invalid(&self) -> bool {
        self.lock().invalid
    }

    /// Install a new token and clear the invalid flag.
    pub fn replace_token(&self, token: SecretString) {
        let mut state = self.lock();
        state.token = Arc::new(token);
        state.invalid = false;
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &"[REDACTED]")
            .field("invalid", &self.is_invalid())
            .finish()
    }
}
