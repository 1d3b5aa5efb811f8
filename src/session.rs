//! Viewer Session
//!
//! The current viewer is a process-wide value pushed by the auth gateway.
//! It lives in an injected observable store rather than a global: the auth
//! implementation publishes into a [`SessionStore`], views hold a
//! [`SessionSubscription`] for as long as they are alive.

use std::sync::Arc;
use tokio::sync::watch;

use crate::gateway::AuthGateway;
use crate::model::Viewer;

/// Observable single-value store for the current viewer
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Viewer>>,
}

impl SessionStore {
    /// Create a store holding an anonymous viewer
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Viewer::Anonymous);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current viewer
    pub fn current(&self) -> Viewer {
        self.tx.borrow().clone()
    }

    /// Replace the current viewer and notify subscribers
    pub fn publish(&self, viewer: Viewer) {
        tracing::debug!(viewer = %viewer.label(), "Session changed");
        self.tx.send_replace(viewer);
    }

    /// Start observing session changes
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Seed the store from the gateway's current session.
    ///
    /// A failed lookup resolves to an anonymous viewer.
    pub async fn resolve_initial(&self, auth: &dyn AuthGateway) -> Viewer {
        let viewer = match auth.current_user().await {
            Ok(Some(user)) => Viewer::from(user),
            Ok(None) => Viewer::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "Could not resolve session, continuing anonymously");
                Viewer::Anonymous
            }
        };

        self.publish(viewer.clone());
        viewer
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A live view of the [`SessionStore`].
///
/// Dropping the subscription unsubscribes it.
pub struct SessionSubscription {
    rx: Option<watch::Receiver<Viewer>>,
}

impl SessionSubscription {
    /// The viewer as last published; anonymous once unsubscribed
    pub fn viewer(&self) -> Viewer {
        self.rx
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Wait for the next login/logout.
    ///
    /// Returns `None` once unsubscribed or when the store is gone.
    pub async fn changed(&mut self) -> Option<Viewer> {
        let rx = self.rx.as_mut()?;
        rx.changed().await.ok()?;
        let viewer = rx.borrow_and_update().clone();
        Some(viewer)
    }

    /// Stop observing the store
    pub fn unsubscribe(&mut self) {
        if self.rx.take().is_some() {
            tracing::debug!("Session subscription cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, GatewayResult};
    use crate::model::AuthUser;
    use async_trait::async_trait;

    struct BrokenAuth;

    #[async_trait]
    impl AuthGateway for BrokenAuth {
        async fn current_user(&self) -> GatewayResult<Option<AuthUser>> {
            Err(GatewayError::Unavailable)
        }

        async fn sign_in_with_password(&self, _: &str, _: &str) -> GatewayResult<AuthUser> {
            Err(GatewayError::Unavailable)
        }

        async fn sign_out(&self) -> GatewayResult<()> {
            Err(GatewayError::Unavailable)
        }
    }

    fn reader() -> Viewer {
        Viewer::Authenticated {
            user_id: "u1".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_starts_anonymous() {
        let store = SessionStore::new();
        assert_eq!(store.current(), Viewer::Anonymous);
        assert_eq!(store.subscribe().viewer(), Viewer::Anonymous);
    }

    #[tokio::test]
    async fn test_subscription_observes_login_and_logout() {
        let store = SessionStore::new();
        let mut sub = store.subscribe();

        store.publish(reader());
        assert_eq!(sub.changed().await, Some(reader()));
        assert_eq!(sub.viewer(), reader());

        store.publish(Viewer::Anonymous);
        assert_eq!(sub.changed().await, Some(Viewer::Anonymous));
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_receiver() {
        let store = SessionStore::new();
        let mut sub = store.subscribe();
        let other = store.subscribe();
        assert_eq!(store.subscriber_count(), 2);

        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(sub.changed().await, None);

        drop(other);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_lookup_resolves_anonymous() {
        let store = SessionStore::new();
        store.publish(reader());

        let viewer = store.resolve_initial(&BrokenAuth).await;
        assert_eq!(viewer, Viewer::Anonymous);
        assert_eq!(store.current(), Viewer::Anonymous);
    }
}
