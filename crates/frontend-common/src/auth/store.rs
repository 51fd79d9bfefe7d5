//! Persisted auth token store
//!
//! A reactive cell holding the current bearer token. An empty string means
//! logged out. Every write is mirrored to persisted storage when the store
//! runs in a browsing context, and subscribers are notified synchronously in
//! the order they subscribed.

use super::host::HostContext;
use super::navigation::{BrowserNavigator, Navigator};
use super::storage::{BrowserStorage, TokenStorage};
use crate::config::{AuthConfig, FrontendConfig};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// Identifier of a registered subscriber
pub type SubscriberId = u64;

type Callback = Rc<dyn Fn(&str)>;

/// Logical authentication state derived from the token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthStatus {
    LoggedOut,
    LoggedIn,
}

impl AuthStatus {
    fn of(token: &str) -> Self {
        if token.is_empty() {
            Self::LoggedOut
        } else {
            Self::LoggedIn
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => f.write_str("logged out"),
            Self::LoggedIn => f.write_str("logged in"),
        }
    }
}

/// Storage key and login path used by a store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    pub storage_key: String,
    pub login_path: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: AuthConfig::TOKEN_STORAGE_KEY.to_string(),
            login_path: AuthConfig::LOGIN_PATH.to_string(),
        }
    }
}

impl From<&FrontendConfig> for StoreOptions {
    fn from(config: &FrontendConfig) -> Self {
        Self {
            storage_key: config.token_storage_key.clone(),
            login_path: config.login_path.clone(),
        }
    }
}

struct Inner {
    value: RefCell<String>,
    subscribers: RefCell<Vec<(SubscriberId, Callback)>>,
    next_id: Cell<SubscriberId>,
    // Writes not yet delivered, each with the subscribers registered when
    // it was made
    pending: RefCell<VecDeque<(String, Vec<SubscriberId>)>>,
    notifying: Cell<bool>,
    host: HostContext,
    storage: Box<dyn TokenStorage>,
    navigator: Box<dyn Navigator>,
    options: StoreOptions,
}

impl Inner {
    fn remove_subscriber(&self, id: SubscriberId) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.subscribers.borrow().iter().map(|(id, _)| *id).collect()
    }

    fn callback(&self, id: SubscriberId) -> Option<Callback> {
        self.subscribers
            .borrow()
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, callback)| Rc::clone(callback))
    }
}

/// Ends a notification round, even when a callback unwinds
struct NotifyGuard<'a> {
    inner: &'a Inner,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending.borrow_mut().clear();
        self.inner.notifying.set(false);
    }
}

/// Handle to the auth token store.
///
/// Cloning is cheap and every clone refers to the same cell; equality is
/// handle identity.
#[derive(Clone)]
pub struct AuthTokenStore {
    inner: Rc<Inner>,
}

impl AuthTokenStore {
    /// Create the store and seed it.
    ///
    /// In a browsing context the token is read from `storage`; a missing key
    /// or a failed read starts the store logged out. Without a browsing
    /// context storage is never touched.
    pub fn initialize(
        host: HostContext,
        storage: impl TokenStorage + 'static,
        navigator: impl Navigator + 'static,
        options: StoreOptions,
    ) -> Self {
        let initial = if host.is_browser() {
            match storage.get(&options.storage_key) {
                Ok(stored) => stored.unwrap_or_default(),
                Err(e) => {
                    warn!(key = %options.storage_key, error = %e, "failed to read stored auth token");
                    String::new()
                }
            }
        } else {
            debug!("no browsing context, auth token starts empty");
            String::new()
        };

        debug!(status = %AuthStatus::of(&initial), ?host, "auth token store initialized");

        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
                notifying: Cell::new(false),
                host,
                storage: Box::new(storage),
                navigator: Box::new(navigator),
                options,
            }),
        }
    }

    /// Store backed by `localStorage` and `window.location`, for page startup
    pub fn browser() -> Self {
        Self::browser_with(StoreOptions::default())
    }

    /// Browser-backed store using the keys from `config`
    pub fn from_config(config: &FrontendConfig) -> Self {
        Self::browser_with(StoreOptions::from(config))
    }

    fn browser_with(options: StoreOptions) -> Self {
        Self::initialize(
            HostContext::detect(),
            BrowserStorage::new(),
            BrowserNavigator::new(),
            options,
        )
    }

    /// Current token, `""` when logged out
    pub fn get(&self) -> String {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current token without cloning it
    pub fn with_value<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn status(&self) -> AuthStatus {
        self.with_value(AuthStatus::of)
    }

    pub fn is_logged_in(&self) -> bool {
        self.status() == AuthStatus::LoggedIn
    }

    /// `Authorization` header value for the current token
    pub fn bearer_header(&self) -> Option<String> {
        self.with_value(|token| (!token.is_empty()).then(|| format!("Bearer {token}")))
    }

    pub fn host_context(&self) -> HostContext {
        self.inner.host
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Replace the token, persist it and notify subscribers.
    ///
    /// Subscribers have all seen the new value when this returns, unless the
    /// call comes from inside a subscriber: the value is then stored at once
    /// and delivered after the running notification round finishes.
    pub fn set(&self, new_value: impl Into<String>) {
        let value = new_value.into();
        *self.inner.value.borrow_mut() = value.clone();
        self.persist(&value);

        let recipients = self.inner.subscriber_ids();
        self.inner
            .pending
            .borrow_mut()
            .push_back((value, recipients));
        if self.inner.notifying.replace(true) {
            return;
        }

        let _guard = NotifyGuard { inner: &self.inner };
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some((value, recipients)) = next else { break };
            self.notify(&value, &recipients);
        }
    }

    /// Register `callback`.
    ///
    /// It is called right away with the current token, then on every `set`
    /// until the returned [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let callback: Callback = Rc::new(callback);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::clone(&callback)));

        let current = self.get();
        callback(&current);

        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
            active: true,
        }
    }

    /// Clear the token and send the browser to the login page.
    ///
    /// Without a browsing context only the token is cleared.
    pub fn force_logout(&self) {
        self.set(String::new());

        let path = &self.inner.options.login_path;
        if !self.inner.host.is_browser() {
            debug!(%path, "no browsing context, skipping login redirect");
            return;
        }

        match self.inner.navigator.navigate(path) {
            Ok(()) => info!(%path, "forced logout, redirecting to login"),
            Err(e) => warn!(%path, error = %e, "login redirect failed"),
        }
    }

    fn persist(&self, value: &str) {
        if !self.inner.host.is_browser() {
            return;
        }

        let key = &self.inner.options.storage_key;
        let result = if value.is_empty() {
            self.inner.storage.remove(key)
        } else {
            self.inner.storage.set(key, value)
        };

        if let Err(e) = result {
            warn!(%key, error = %e, "failed to persist auth token, keeping it in memory only");
        }
    }

    /// Deliver `value` to `recipients` that are still subscribed.
    ///
    /// Callbacks registered after the write already saw it on subscribe.
    fn notify(&self, value: &str, recipients: &[SubscriberId]) {
        debug!(subscribers = recipients.len(), status = %AuthStatus::of(value), "auth token changed");

        for &id in recipients {
            // Looked up per call: an earlier callback may have unsubscribed it
            if let Some(callback) = self.inner.callback(id) {
                callback(value);
            }
        }
    }
}

impl PartialEq for AuthTokenStore {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AuthTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        f.debug_struct("AuthTokenStore")
            .field("status", &self.status())
            .field("host", &self.inner.host)
            .field("subscribers", &self.subscriber_count())
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Registration returned by [`AuthTokenStore::subscribe`].
///
/// Dropping it unsubscribes; call [`Subscription::detach`] to keep the
/// callback for the lifetime of the store.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    store: Weak<Inner>,
    id: SubscriberId,
    active: bool,
}

impl Subscription {
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Deregister the callback; it is never called again
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keep the callback registered for as long as the store lives
    pub fn detach(mut self) {
        self.active = false;
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.store.upgrade() {
            inner.remove_subscriber(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::navigation::RecordingNavigator;
    use crate::auth::navigation::mock::MockNavigator;
    use crate::auth::storage::MemoryStorage;
    use crate::auth::storage::mock::MockTokenStorage;
    use crate::error::{NavigationError, StorageError};

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |value: &str| sink.borrow_mut().push(value.to_string()))
    }

    fn browser_store(storage: MemoryStorage) -> AuthTokenStore {
        AuthTokenStore::initialize(
            HostContext::Browser,
            storage,
            RecordingNavigator::new(),
            StoreOptions::default(),
        )
    }

    #[test]
    fn test_server_host_never_touches_storage() {
        // No expectations: any call on the mock fails the test
        let storage = MockTokenStorage::new();
        let navigator = MockNavigator::new();
        let store = AuthTokenStore::initialize(
            HostContext::Server,
            storage,
            navigator,
            StoreOptions::default(),
        );

        assert_eq!(store.get(), "");
        store.set("abc");
        assert_eq!(store.get(), "abc");
        store.force_logout();
        assert_eq!(store.status(), AuthStatus::LoggedOut);
    }

    #[test]
    fn test_failed_read_starts_logged_out() {
        let mut storage = MockTokenStorage::new();
        storage
            .expect_get()
            .times(1)
            .returning(|_| Err(StorageError::Unavailable));

        let store = AuthTokenStore::initialize(
            HostContext::Browser,
            storage,
            RecordingNavigator::new(),
            StoreOptions::default(),
        );
        assert_eq!(store.get(), "");
    }

    #[test]
    fn test_storage_failure_keeps_value_in_memory() {
        let mut storage = MockTokenStorage::new();
        storage.expect_get().returning(|_| Ok(None));
        storage
            .expect_set()
            .times(1)
            .returning(|key, _| Err(StorageError::operation(key, "QuotaExceededError")));
        storage
            .expect_remove()
            .times(1)
            .returning(|_| Err(StorageError::Unavailable));

        let store = AuthTokenStore::initialize(
            HostContext::Browser,
            storage,
            RecordingNavigator::new(),
            StoreOptions::default(),
        );
        let (seen, callback) = recorder();
        let _subscription = store.subscribe(callback);

        store.set("tok");
        assert_eq!(store.get(), "tok");
        store.set("");
        assert_eq!(store.get(), "");
        assert_eq!(*seen.borrow(), vec!["", "tok", ""]);
    }

    #[test]
    fn test_set_persists_under_configured_key() {
        let mut storage = MockTokenStorage::new();
        storage.expect_get().returning(|_| Ok(None));
        storage
            .expect_set()
            .withf(|key, value| key == "session" && value == "abc")
            .times(1)
            .returning(|_, _| Ok(()));
        storage
            .expect_remove()
            .withf(|key| key == "session")
            .times(1)
            .returning(|_| Ok(()));

        let options = StoreOptions {
            storage_key: "session".to_string(),
            login_path: "/signin".to_string(),
        };
        let store = AuthTokenStore::initialize(
            HostContext::Browser,
            storage,
            RecordingNavigator::new(),
            options,
        );
        store.set("abc");
        store.set("");
    }

    #[test]
    fn test_navigation_failure_is_swallowed() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|path| path == "/login")
            .times(1)
            .returning(|path| Err(NavigationError::rejected(path, "SecurityError")));

        let storage = MemoryStorage::with_entry("token", "tok123");
        let store = AuthTokenStore::initialize(
            HostContext::Browser,
            storage.clone(),
            navigator,
            StoreOptions::default(),
        );

        store.force_logout();
        assert_eq!(store.get(), "");
        assert!(!storage.contains_key("token"));
    }

    #[test]
    fn test_subscribe_calls_immediately() {
        let store = browser_store(MemoryStorage::with_entry("token", "abc"));
        let (seen, callback) = recorder();

        let subscription = store.subscribe(callback);
        assert_eq!(*seen.borrow(), vec!["abc"]);
        assert_eq!(store.subscriber_count(), 1);

        subscription.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_rotation_and_repeated_values_notify() {
        let store = browser_store(MemoryStorage::new());
        let (seen, callback) = recorder();
        let _subscription = store.subscribe(callback);

        store.set("a");
        store.set("b");
        store.set("b");
        assert_eq!(*seen.borrow(), vec!["", "a", "b", "b"]);
        assert!(store.is_logged_in());
    }

    #[test]
    fn test_drop_unsubscribes_and_detach_keeps() {
        let store = browser_store(MemoryStorage::new());
        let (dropped_seen, dropped) = recorder();
        let (detached_seen, detached) = recorder();

        drop(store.subscribe(dropped));
        store.subscribe(detached).detach();

        store.set("x");
        assert_eq!(*dropped_seen.borrow(), vec![""]);
        assert_eq!(*detached_seen.borrow(), vec!["", "x"]);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe_during_notification_round() {
        let store = browser_store(MemoryStorage::new());
        let later: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        // The first subscriber drops the second one when a token arrives
        let slot = Rc::clone(&later);
        let _first = store.subscribe(move |value: &str| {
            if !value.is_empty() {
                slot.borrow_mut().take();
            }
        });
        let (seen, callback) = recorder();
        *later.borrow_mut() = Some(store.subscribe(callback));

        store.set("x");
        store.set("y");
        assert_eq!(*seen.borrow(), vec![""]);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_nested_set_is_delivered_in_order() {
        let storage = MemoryStorage::new();
        let store = browser_store(storage.clone());

        // Reject any token equal to "bad" by clearing it from inside a callback
        let inner_store = store.clone();
        let _guard = store.subscribe(move |value: &str| {
            if value == "bad" {
                inner_store.set("");
            }
        });
        let (seen, callback) = recorder();
        let _observer = store.subscribe(callback);

        store.set("bad");
        assert_eq!(*seen.borrow(), vec!["", "bad", ""]);
        assert_eq!(store.get(), "");
        assert!(!storage.contains_key("token"));
    }

    #[test]
    fn test_subscribe_from_callback_receives_current_value() {
        let store = browser_store(MemoryStorage::new());
        let (seen, callback) = recorder();
        let callback = Rc::new(callback);
        let late: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let inner_store = store.clone();
        let holder = Rc::clone(&late);
        let _first = store.subscribe(move |value: &str| {
            if value == "x" {
                let callback = Rc::clone(&callback);
                let subscription = inner_store.subscribe(move |v: &str| callback(v));
                holder.borrow_mut().push(subscription);
            }
        });

        store.set("x");
        // Called once on subscribe, not a second time in the same round
        assert_eq!(*seen.borrow(), vec!["x"]);
        store.set("y");
        assert_eq!(*seen.borrow(), vec!["x", "y"]);
    }

    #[test]
    fn test_late_subscriber_skips_earlier_nested_write() {
        let store = browser_store(MemoryStorage::new());
        let (seen, callback) = recorder();
        let callback = Rc::new(callback);
        let late: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        // On "x", write "y" and only then subscribe
        let inner_store = store.clone();
        let holder = Rc::clone(&late);
        let _first = store.subscribe(move |value: &str| {
            if value == "x" {
                inner_store.set("y");
                let callback = Rc::clone(&callback);
                let subscription = inner_store.subscribe(move |v: &str| callback(v));
                holder.borrow_mut().push(subscription);
            }
        });

        store.set("x");
        // "y" was written before the subscription, so only the immediate call
        assert_eq!(*seen.borrow(), vec!["y"]);
        assert_eq!(store.get(), "y");

        store.set("z");
        assert_eq!(*seen.borrow(), vec!["y", "z"]);
    }

    #[test]
    fn test_panicking_subscriber_does_not_stall_notifications() {
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let store = browser_store(MemoryStorage::new());
        let armed = Rc::new(Cell::new(true));

        let trigger = Rc::clone(&armed);
        let _faulty = store.subscribe(move |value: &str| {
            if trigger.get() && !value.is_empty() {
                panic!("subscriber failure");
            }
        });
        let (seen, callback) = recorder();
        let _observer = store.subscribe(callback);

        let result = catch_unwind(AssertUnwindSafe(|| store.set("a")));
        assert!(result.is_err());
        // The write itself went through before the callback failed
        assert_eq!(store.get(), "a");

        armed.set(false);
        store.set("b");
        assert_eq!(*seen.borrow(), vec!["", "b"]);
    }

    #[test]
    fn test_subscription_outlives_store() {
        let store = browser_store(MemoryStorage::new());
        let subscription = store.subscribe(|_: &str| {});
        drop(store);
        // The store is gone; unsubscribing is a no-op
        subscription.unsubscribe();
    }

    #[test]
    fn test_bearer_header_and_debug() {
        let store = browser_store(MemoryStorage::with_entry("token", "secret-token"));
        assert_eq!(store.bearer_header().as_deref(), Some("Bearer secret-token"));

        let debug = format!("{store:?}");
        assert!(debug.contains("LoggedIn"));
        assert!(!debug.contains("secret-token"));

        store.set("");
        assert_eq!(store.bearer_header(), None);
        assert_eq!(store.status().to_string(), "logged out");
    }

    #[test]
    fn test_clones_share_state() {
        let store = browser_store(MemoryStorage::new());
        let other = store.clone();
        assert_eq!(store, other);

        other.set("abc");
        assert_eq!(store.get(), "abc");

        let unrelated = browser_store(MemoryStorage::new());
        assert_ne!(store, unrelated);
    }

    #[test]
    fn test_options_from_config() {
        let config = FrontendConfig {
            token_storage_key: "jwt".to_string(),
            login_path: "/auth/login".to_string(),
            ..FrontendConfig::default()
        };
        let options = StoreOptions::from(&config);
        assert_eq!(options.storage_key, "jwt");
        assert_eq!(options.login_path, "/auth/login");
    }
}
