use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::actor::model::{InternalMessage, Notification, Reply};
use crate::blueprint::BuildingKind;
use crate::city::{
    BuildingDetails, City, CityError, CitySnapshot, Commit, Completion, Filter, ResourceKind,
    Resources, Role,
};
use crate::persistence::BuildingStore;
use crate::session::auth::{Authenticator, confirm_password};
use crate::session::{Identity, SessionToken};

const MAILBOX_SIZE: usize = 100;

/// Cloneable front door to a running city actor.
#[derive(Debug, Clone)]
pub struct CityHandle {
    sender: mpsc::Sender<InternalMessage>,
}

impl CityHandle {
    /// Starts a city actor. The actor stops when every handle is dropped or
    /// [`CityHandle::stop`] is called.
    pub fn spawn<S, A>(
        store: Arc<S>,
        auth: Arc<A>,
        starting: Resources,
        notify: Option<mpsc::Sender<Notification>>,
    ) -> (CityHandle, JoinHandle<()>)
    where
        S: BuildingStore,
        A: Authenticator,
    {
        let (sender, receiver) = mpsc::channel(MAILBOX_SIZE);
        let actor = CityActor {
            city: City::new(starting),
            store,
            auth,
            mailbox: sender.downgrade(),
            notify,
        };
        let task = tokio::spawn(actor.run(receiver));
        (CityHandle { sender }, task)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> InternalMessage,
    ) -> Result<T, CityError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CityError::ActorUnavailable)?;
        response.await.map_err(|_| CityError::ActorUnavailable)?
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<CitySnapshot, CityError> {
        let (email, password) = (email.to_string(), password.to_string());
        self.request(|respond_to| InternalMessage::Login {
            email,
            password,
            respond_to,
        })
        .await
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
        role: Role,
    ) -> Result<CitySnapshot, CityError> {
        let (email, password, confirm) =
            (email.to_string(), password.to_string(), confirm.to_string());
        self.request(|respond_to| InternalMessage::Signup {
            email,
            password,
            confirm,
            role,
            respond_to,
        })
        .await
    }

    pub async fn logout(&self) -> Result<CitySnapshot, CityError> {
        self.request(|respond_to| InternalMessage::Logout { respond_to })
            .await
    }

    pub async fn select(&self, row: usize, col: usize) -> Result<CitySnapshot, CityError> {
        self.request(|respond_to| InternalMessage::Select {
            row,
            col,
            respond_to,
        })
        .await
    }

    pub async fn clear_selection(&self) -> Result<CitySnapshot, CityError> {
        self.request(|respond_to| InternalMessage::ClearSelection { respond_to })
            .await
    }

    pub async fn choose(&self, kind: BuildingKind) -> Result<CitySnapshot, CityError> {
        self.request(|respond_to| InternalMessage::Choose { kind, respond_to })
            .await
    }

    pub async fn set_filter(&self, filter: Filter) -> Result<CitySnapshot, CityError> {
        self.request(|respond_to| InternalMessage::SetFilter { filter, respond_to })
            .await
    }

    pub async fn top_up(
        &self,
        amounts: Vec<(ResourceKind, Option<i64>)>,
    ) -> Result<CitySnapshot, CityError> {
        self.request(|respond_to| InternalMessage::TopUp {
            amounts,
            respond_to,
        })
        .await
    }

    pub async fn build_or_upgrade(&self) -> Result<(Commit, CitySnapshot), CityError> {
        self.request(|respond_to| InternalMessage::BuildOrUpgrade { respond_to })
            .await
    }

    pub async fn details(&self, row: usize, col: usize) -> Result<Option<BuildingDetails>, CityError> {
        self.request(|respond_to| InternalMessage::Details {
            row,
            col,
            respond_to,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<CitySnapshot, CityError> {
        self.request(|respond_to| InternalMessage::Snapshot { respond_to })
            .await
    }

    pub async fn stop(&self) {
        if let Err(e) = self.sender.send(InternalMessage::Stop).await {
            tracing::debug!("city already stopped: {}", e);
        }
    }
}

struct CityActor<S, A> {
    city: City,
    store: Arc<S>,
    auth: Arc<A>,
    mailbox: mpsc::WeakSender<InternalMessage>,
    notify: Option<mpsc::Sender<Notification>>,
}

impl<S, A> CityActor<S, A>
where
    S: BuildingStore,
    A: Authenticator,
{
    async fn run(mut self, mut receiver: mpsc::Receiver<InternalMessage>) {
        tracing::debug!("city actor started");
        while let Some(message) = receiver.recv().await {
            if let InternalMessage::Stop = message {
                tracing::debug!("city actor received stop signal");
                break;
            }
            self.handle(message).await;
        }

        if let Some(session) = self.city.end_session() {
            self.auth.logout(&session.user_id).await;
        }
        tracing::debug!("city actor stopped");
    }

    async fn handle(&mut self, message: InternalMessage) {
        match message {
            InternalMessage::Login {
                email,
                password,
                respond_to,
            } => {
                let result = match self.auth.login(&email, &password).await {
                    Ok(identity) => Ok(self.open_session(identity)),
                    Err(e) => Err(e.into()),
                };
                let _ = respond_to.send(result);
            }
            InternalMessage::Signup {
                email,
                password,
                confirm,
                role,
                respond_to,
            } => {
                let result = match confirm_password(&password, &confirm) {
                    Ok(()) => self.auth.signup(&email, &password, role).await,
                    Err(e) => Err(e),
                };
                let result = match result {
                    Ok(identity) => Ok(self.open_session(identity)),
                    Err(e) => Err(e.into()),
                };
                let _ = respond_to.send(result);
            }
            InternalMessage::Logout { respond_to } => {
                if let Some(session) = self.city.end_session() {
                    self.auth.logout(&session.user_id).await;
                }
                let _ = respond_to.send(Ok(self.city.snapshot()));
            }
            InternalMessage::Select {
                row,
                col,
                respond_to,
            } => {
                let result = self.city.select(row, col).map(|_| self.city.snapshot());
                let _ = respond_to.send(result);
            }
            InternalMessage::ClearSelection { respond_to } => {
                self.city.clear_selection();
                let _ = respond_to.send(Ok(self.city.snapshot()));
            }
            InternalMessage::Choose { kind, respond_to } => {
                let result = self.city.choose(kind).map(|_| self.city.snapshot());
                let _ = respond_to.send(result);
            }
            InternalMessage::SetFilter { filter, respond_to } => {
                self.city.set_filter(filter);
                let _ = respond_to.send(Ok(self.city.snapshot()));
            }
            InternalMessage::TopUp {
                amounts,
                respond_to,
            } => {
                let result = self.city.top_up(&amounts).map(|_| self.city.snapshot());
                let _ = respond_to.send(result);
            }
            InternalMessage::BuildOrUpgrade { respond_to } => {
                let result = self
                    .city
                    .build_or_upgrade(self.store.as_ref())
                    .await
                    .map(|commit| (commit, self.city.snapshot()));
                let _ = respond_to.send(result);
            }
            InternalMessage::Details {
                row,
                col,
                respond_to,
            } => {
                let result = crate::city::Position::new(row, col)
                    .map(|position| self.city.details(position));
                let _ = respond_to.send(result);
            }
            InternalMessage::Snapshot { respond_to } => {
                let _ = respond_to.send(Ok(self.city.snapshot()));
            }
            InternalMessage::RoleResolved { token, result } => {
                if self.city.resolve_role(token, result) == Completion::Applied {
                    self.publish(Notification::SessionUpdated(self.city.snapshot()));
                }
            }
            InternalMessage::BuildingsLoaded { token, result } => {
                match self.city.apply_buildings(token, result) {
                    Ok(Completion::Applied) => {
                        self.publish(Notification::SessionUpdated(self.city.snapshot()));
                    }
                    Ok(Completion::Stale) => {}
                    Err(e) => self.publish(Notification::LoadFailed(e)),
                }
            }
            InternalMessage::Stop => {}
        }
    }

    fn open_session(&mut self, identity: Identity) -> CitySnapshot {
        let user_id = identity.user_id.clone();
        let token = self.city.begin_session(identity);
        self.load_session(token, user_id);
        self.city.snapshot()
    }

    /// Fetches the role and the building list in the background. Results come
    /// back through the mailbox tagged with `token`.
    fn load_session(&self, token: SessionToken, user_id: String) {
        let auth = self.auth.clone();
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = auth.fetch_role(&user_id).await;
            if let Some(sender) = mailbox.upgrade() {
                let _ = sender
                    .send(InternalMessage::RoleResolved { token, result })
                    .await;
            }
        });

        let store = self.store.clone();
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = store.list().await;
            if let Some(sender) = mailbox.upgrade() {
                let _ = sender
                    .send(InternalMessage::BuildingsLoaded { token, result })
                    .await;
            }
        });
    }

    fn publish(&self, notification: Notification) {
        if let Some(notify) = &self.notify {
            if let Err(e) = notify.try_send(notification) {
                tracing::debug!("notification dropped: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::city::ledger::STARTING_RESOURCES;
    use crate::city::{Action, Position, SessionView};
    use crate::persistence::{
        BuildingRecord, MemoryBuildingStore, PersistenceError, SaveBuildingPayload,
    };
    use crate::session::RoleState;
    use crate::session::auth::{AuthError, MemoryAuthenticator};

    /// Hands out the records as they were when `list` was called, but late.
    struct SlowListStore {
        inner: MemoryBuildingStore,
        delay: Duration,
    }

    impl BuildingStore for SlowListStore {
        async fn list(&self) -> Result<Vec<BuildingRecord>, PersistenceError> {
            let records = self.inner.list().await;
            tokio::time::sleep(self.delay).await;
            records
        }

        async fn insert(&self, payload: SaveBuildingPayload) -> Result<(), PersistenceError> {
            self.inner.insert(payload).await
        }
    }

    async fn wait_for(
        notifications: &mut mpsc::Receiver<Notification>,
        ready: impl Fn(&SessionView) -> bool,
    ) -> CitySnapshot {
        loop {
            let notification = tokio::time::timeout(Duration::from_secs(2), notifications.recv())
                .await
                .expect("timed out waiting for notification")
                .expect("notification channel closed");
            if let Notification::SessionUpdated(snapshot) = notification {
                if snapshot.session.as_ref().is_some_and(&ready) {
                    return snapshot;
                }
            }
        }
    }

    async fn wait_for_role(
        notifications: &mut mpsc::Receiver<Notification>,
        role: Role,
    ) -> CitySnapshot {
        wait_for(notifications, |s| s.role == RoleState::Resolved(role)).await
    }

    #[tokio::test]
    async fn test_signup_build_and_reload() {
        let store = Arc::new(MemoryBuildingStore::new());
        let auth = Arc::new(MemoryAuthenticator::new());
        let (notify_tx, mut notify_rx) = mpsc::channel(16);
        let (city, _task) =
            CityHandle::spawn(store.clone(), auth.clone(), STARTING_RESOURCES, Some(notify_tx));

        city.signup("mayor@city.test", "secret1", "secret1", Role::Admin)
            .await
            .unwrap();
        wait_for(&mut notify_rx, |s| {
            s.role == RoleState::Resolved(Role::Admin) && s.buildings_loaded
        })
        .await;

        city.select(0, 0).await.unwrap();
        let (commit, snapshot) = city.build_or_upgrade().await.unwrap();
        assert_eq!(commit.result, BuildingKind::House);
        assert_eq!(snapshot.grid[0][0], Some("🏠"));
        assert_eq!(snapshot.resources.budget, 9000);
        assert_eq!(store.records().len(), 1);

        city.logout().await.unwrap();
        let snapshot = city.login("mayor@city.test", "secret1").await.unwrap();
        assert_eq!(snapshot.buildings, 0);
        let mut snapshot = city.snapshot().await.unwrap();
        for _ in 0..50 {
            if snapshot.buildings == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            snapshot = city.snapshot().await.unwrap();
        }
        assert_eq!(snapshot.grid[0][0], Some("🏠"));
        drop(notify_rx);

        city.stop().await;
    }

    #[tokio::test]
    async fn test_build_waits_for_building_list() {
        let store = Arc::new(SlowListStore {
            inner: MemoryBuildingStore::new(),
            delay: Duration::from_millis(300),
        });
        let auth = Arc::new(MemoryAuthenticator::new());
        let (notify_tx, mut notify_rx) = mpsc::channel(16);
        let (city, _task) =
            CityHandle::spawn(store.clone(), auth, STARTING_RESOURCES, Some(notify_tx));

        city.signup("mayor@city.test", "secret1", "secret1", Role::Admin)
            .await
            .unwrap();
        let snapshot = wait_for_role(&mut notify_rx, Role::Admin).await;
        assert!(!snapshot.session.unwrap().buildings_loaded);

        city.select(0, 0).await.unwrap();
        assert_eq!(
            city.build_or_upgrade().await,
            Err(CityError::BuildingsLoading)
        );
        assert!(store.inner.records().is_empty());

        let snapshot = wait_for(&mut notify_rx, |s| s.buildings_loaded).await;
        assert_eq!(snapshot.selection, Position::new(0, 0).ok());
        assert_eq!(snapshot.resources, STARTING_RESOURCES);

        let (commit, _) = city.build_or_upgrade().await.unwrap();
        assert_eq!(commit.action, Action::Build);

        city.select(0, 0).await.unwrap();
        let (commit, snapshot) = city.build_or_upgrade().await.unwrap();
        assert_eq!(commit.action, Action::Upgrade);
        assert_eq!(snapshot.grid[0][0], Some(BuildingKind::Neighborhood.icon()));
        assert_eq!(store.inner.records().len(), 2);
    }

    #[tokio::test]
    async fn test_build_refused_while_role_pending() {
        let store = Arc::new(MemoryBuildingStore::new());
        let auth = Arc::new(MemoryAuthenticator::new().with_role_delay(Duration::from_millis(300)));
        auth.signup("a@city.test", "secret1", Role::Admin).await.unwrap();
        let (city, _task) = CityHandle::spawn(store.clone(), auth, STARTING_RESOURCES, None);

        city.login("a@city.test", "secret1").await.unwrap();
        city.select(1, 1).await.unwrap();

        assert_eq!(
            city.build_or_upgrade().await,
            Err(CityError::RoleUndetermined)
        );
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_stale_role_is_discarded_after_relogin() {
        let store = Arc::new(MemoryBuildingStore::new());
        let auth = Arc::new(MemoryAuthenticator::new().with_role_delay(Duration::from_millis(100)));
        auth.signup("admin@city.test", "secret1", Role::Admin).await.unwrap();
        auth.signup("builder@city.test", "secret1", Role::Builder).await.unwrap();
        let (notify_tx, mut notify_rx) = mpsc::channel(16);
        let (city, _task) = CityHandle::spawn(store, auth, STARTING_RESOURCES, Some(notify_tx));

        city.login("admin@city.test", "secret1").await.unwrap();
        city.logout().await.unwrap();
        city.login("builder@city.test", "secret1").await.unwrap();

        let snapshot = wait_for_role(&mut notify_rx, Role::Builder).await;
        assert_eq!(snapshot.session.unwrap().email, "builder@city.test");

        tokio::time::sleep(Duration::from_millis(200)).await;
        let snapshot = city.snapshot().await.unwrap();
        assert_eq!(
            snapshot.session.unwrap().role,
            RoleState::Resolved(Role::Builder)
        );
    }

    #[tokio::test]
    async fn test_auth_errors_are_reported() {
        let store = Arc::new(MemoryBuildingStore::new());
        let auth = Arc::new(MemoryAuthenticator::new());
        let (city, _task) = CityHandle::spawn(store, auth, STARTING_RESOURCES, None);

        assert_eq!(
            city.signup("x@city.test", "secret1", "secret2", Role::Admin).await,
            Err(CityError::Auth(AuthError::PasswordMismatch))
        );
        assert_eq!(
            city.login("x@city.test", "secret1").await,
            Err(CityError::Auth(AuthError::InvalidCredentials))
        );
        assert_eq!(
            city.top_up(vec![(ResourceKind::Budget, Some(10))]).await,
            Err(CityError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn test_stopped_actor_is_unavailable() {
        let store = Arc::new(MemoryBuildingStore::new());
        let auth = Arc::new(MemoryAuthenticator::new());
        let (city, task) = CityHandle::spawn(store, auth, STARTING_RESOURCES, None);

        city.stop().await;
        task.await.unwrap();

        assert_eq!(city.snapshot().await, Err(CityError::ActorUnavailable));
    }
}
