use super::clock::{Clock, SystemClock};
use super::token::{TokenManager, TokenState};
use crate::error::{AppError, AuthError};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Unauthenticated,
    Valid,
    Expired,
}

/// Single owner of the token state for one credential.
///
/// Every exchange runs under the state lock, so concurrent callers never
/// refresh the same token twice or lose an updated refresh token.
pub struct Session<T, C = SystemClock> {
    manager: TokenManager<T, C>,
    state: Mutex<Option<TokenState>>,
}

impl<T: HttpTransport, C: Clock> Session<T, C> {
    pub fn new(manager: TokenManager<T, C>) -> Self {
        Self {
            manager,
            state: Mutex::new(None),
        }
    }

    pub fn status(&self) -> TokenStatus {
        match self.lock().as_ref() {
            None => TokenStatus::Unauthenticated,
            Some(state) if state.is_valid_at(self.manager.now()) => TokenStatus::Valid,
            Some(_) => TokenStatus::Expired,
        }
    }

    /// Run the client-credentials grant. On failure any earlier state is kept.
    pub fn authenticate(&self) -> Result<(), AuthError> {
        let mut guard = self.lock();
        let state = self.manager.authenticate()?;
        *guard = Some(state);
        Ok(())
    }

    pub fn access_token(&self) -> Result<String, AuthError> {
        let mut guard = self.lock();
        let state = guard.as_mut().ok_or(AuthError::NotAuthenticated)?;
        self.manager.get_valid_token(state)
    }

    pub fn authorized_request(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let mut guard = self.lock();
        let state = guard.as_mut().ok_or(AuthError::NotAuthenticated)?;
        self.manager.authorized_request(state, request)
    }

    /// Copy of the current token state, if any.
    pub fn token_state(&self) -> Option<TokenState> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<TokenState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
