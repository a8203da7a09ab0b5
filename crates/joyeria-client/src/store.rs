//! Observable client state.
//!
//! A [`Store`] owns one value and broadcasts every change to its
//! subscribers. Components receive a clone of the store handle instead of
//! reaching for globals.

use std::sync::Arc;

use tokio::sync::watch;

use joyeria_shared::protocol::AuthResponse;
use joyeria_shared::PublicUser;

#[derive(Debug)]
pub struct Store<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> Store<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Mutate in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Mutate in place; subscribers are notified only when `f` succeeds.
    /// On failure `f` must leave the value untouched.
    pub fn try_update<E>(&self, f: impl FnOnce(&mut T) -> Result<(), E>) -> Result<(), E> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|value| match f(value) {
            Ok(()) => true,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The signed-in user and their bearer token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<PublicUser>,
}

impl Session {
    pub fn sign_in(&mut self, auth: AuthResponse) {
        self.token = Some(auth.token);
        self.user = Some(auth.user);
    }

    pub fn sign_out(&mut self) {
        self.token = None;
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the seller panel should be offered.
    pub fn can_sell(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.can_sell())
    }
}

#[cfg(test)]
mod tests {
    use joyeria_shared::Role;
    use uuid::Uuid;

    use super::*;

    fn auth(role: Role) -> AuthResponse {
        AuthResponse {
            message: "Login success".into(),
            token: "tok".into(),
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "ana@example.com".into(),
                first_name: "Ana".into(),
                last_name: "Mora".into(),
                role,
            },
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = Store::new(0u32);
        let mut rx = store.subscribe();

        store.update(|n| *n += 5);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 5);
        assert_eq!(store.get(), 5);
    }

    #[test]
    fn test_clones_share_the_value() {
        let a = Store::new(String::from("x"));
        let b = a.clone();
        b.update(|s| s.push('y'));
        assert_eq!(a.get(), "xy");
    }

    #[test]
    fn test_failed_update_does_not_notify() {
        let store = Store::new(1i32);
        let rx = store.subscribe();

        let result: Result<(), &str> = store.try_update(|_| Err("no"));
        assert_eq!(result, Err("no"));
        assert!(!rx.has_changed().unwrap());

        store.try_update::<()>(|n| {
            *n = 2;
            Ok(())
        })
        .unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_session_sign_in_and_out() {
        let session = Store::new(Session::default());
        assert!(!session.get().is_authenticated());

        session.update(|s| s.sign_in(auth(Role::Seller)));
        let current = session.get();
        assert!(current.is_authenticated());
        assert!(current.can_sell());

        session.update(|s| s.sign_in(auth(Role::User)));
        assert!(!session.get().can_sell());

        session.update(Session::sign_out);
        assert_eq!(session.get(), Session::default());
    }
}
