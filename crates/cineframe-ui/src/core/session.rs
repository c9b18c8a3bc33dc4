//! Authentication session shared by every API client.
//!
//! # Design
//! - One [`Session`] per app instance, passed explicitly to each client.
//! - The token is persisted through a [`TokenStore`]; changes written by another
//!   context (another browser tab) arrive through [`TokenStore::watch`] and overwrite the
//!   local value, last writer wins.
//! - `is_logged_in` is derived from the token and cannot be set on its own.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::observe::{Listeners, Subscription};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Callback receiving the new persisted token after another context changed it.
pub type TokenChange = Box<dyn Fn(Option<String>)>;

/// Persistent token storage shared between execution contexts.
pub trait TokenStore {
    /// Read the persisted token.
    fn load(&self) -> Option<String>;
    /// Persist `token`.
    fn save(&self, token: &str);
    /// Remove the persisted token.
    fn clear(&self);
    /// Observe writes made by *other* contexts until the returned guard is dropped.
    fn watch(&self, on_change: TokenChange) -> StoreWatch;
}

/// Keeps a [`TokenStore::watch`] registration alive.
pub struct StoreWatch {
    _guard: Option<Box<dyn Any>>,
}

impl StoreWatch {
    /// Wrap a guard whose `Drop` unregisters the observer.
    pub fn new(guard: impl Any) -> Self {
        Self {
            _guard: Some(Box::new(guard)),
        }
    }

    /// A registration with nothing to release.
    #[must_use]
    pub const fn detached() -> Self {
        Self { _guard: None }
    }
}

impl fmt::Debug for StoreWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoreWatch")
    }
}

type Watcher = Rc<dyn Fn(Option<String>)>;

#[derive(Default)]
struct SharedStorage {
    value: Option<String>,
    next_context: u64,
    next_watch: u64,
    watchers: Vec<(u64, u64, Watcher)>,
}

/// In-process [`TokenStore`]. Handles from [`MemoryTokenStore::open_context`] share the
/// stored value but act as separate contexts: each is notified only of the others' writes.
#[derive(Clone)]
pub struct MemoryTokenStore {
    shared: Rc<RefCell<SharedStorage>>,
    context: u64,
}

impl MemoryTokenStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        let shared = Rc::new(RefCell::new(SharedStorage {
            next_context: 1,
            ..SharedStorage::default()
        }));
        Self { shared, context: 0 }
    }

    /// Store already holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.shared.borrow_mut().value = Some(token.into());
        store
    }

    /// Another handle onto the same storage, acting as a separate context.
    #[must_use]
    pub fn open_context(&self) -> Self {
        let mut shared = self.shared.borrow_mut();
        let context = shared.next_context;
        shared.next_context += 1;
        Self {
            shared: Rc::clone(&self.shared),
            context,
        }
    }

    fn write(&self, value: Option<String>) {
        let watchers: Vec<Watcher> = {
            let mut shared = self.shared.borrow_mut();
            if shared.value == value {
                return;
            }
            shared.value.clone_from(&value);
            shared
                .watchers
                .iter()
                .filter(|(context, _, _)| *context != self.context)
                .map(|(_, _, watcher)| Rc::clone(watcher))
                .collect()
        };
        for watcher in watchers {
            watcher(value.clone());
        }
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTokenStore")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

struct MemoryWatchGuard {
    shared: Weak<RefCell<SharedStorage>>,
    id: u64,
}

impl Drop for MemoryWatchGuard {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared
                .borrow_mut()
                .watchers
                .retain(|(_, id, _)| *id != self.id);
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.shared.borrow().value.clone()
    }

    fn save(&self, token: &str) {
        self.write(Some(token.to_string()));
    }

    fn clear(&self) {
        self.write(None);
    }

    fn watch(&self, on_change: TokenChange) -> StoreWatch {
        let mut shared = self.shared.borrow_mut();
        let id = shared.next_watch;
        shared.next_watch += 1;
        shared
            .watchers
            .push((self.context, id, Rc::from(on_change)));
        StoreWatch::new(MemoryWatchGuard {
            shared: Rc::downgrade(&self.shared),
            id,
        })
    }
}

struct SessionInner {
    token: RefCell<Option<String>>,
    store: Rc<dyn TokenStore>,
    listeners: Listeners,
    watch: RefCell<Option<StoreWatch>>,
}

/// Cloneable handle to the current authentication state.
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

impl Session {
    /// Restore the session from `store` and start following other contexts' writes.
    pub fn restore(store: Rc<dyn TokenStore>) -> Self {
        let token = normalize(store.load());
        let inner = Rc::new(SessionInner {
            token: RefCell::new(token),
            store: Rc::clone(&store),
            listeners: Listeners::default(),
            watch: RefCell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        let watch = store.watch(Box::new(move |value| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.reconcile(value);
            }
        }));
        *inner.watch.borrow_mut() = Some(watch);
        Self { inner }
    }

    /// Logged-out session backed by a private in-memory store.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::restore(Rc::new(MemoryTokenStore::new()))
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.token.borrow().clone()
    }

    /// Whether a token is present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner.token.borrow().is_some()
    }

    /// Persist `token` and mark the session logged in. A blank token logs out.
    pub fn login(&self, token: impl Into<String>) {
        let Some(token) = normalize(Some(token.into())) else {
            tracing::warn!("ignoring blank token on login");
            self.logout();
            return;
        };
        self.inner.store.save(&token);
        *self.inner.token.borrow_mut() = Some(token);
        tracing::info!("session logged in");
        self.inner.listeners.notify();
    }

    /// Remove the persisted token and mark the session logged out.
    pub fn logout(&self) {
        self.inner.store.clear();
        *self.inner.token.borrow_mut() = None;
        tracing::info!("session logged out");
        self.inner.listeners.notify();
    }

    /// Register a callback fired after every session change.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.listeners.subscribe(callback)
    }

    fn reconcile(&self, value: Option<String>) {
        let value = normalize(value);
        if *self.inner.token.borrow() == value {
            return;
        }
        tracing::info!(logged_in = value.is_some(), "session changed in another context");
        *self.inner.token.borrow_mut() = value;
        self.inner.listeners.notify();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}

fn normalize(token: Option<String>) -> Option<String> {
    token.filter(|value| !value.trim().is_empty())
}
