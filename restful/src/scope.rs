//! Hierarchical configuration scopes.
//!
//! Every endpoint owns one [`Scope`]. A scope stores only its own overlay
//! (headers, interceptors, named settings, listeners) plus a reference to its
//! parent. Inherited values are computed at read time, so a parent changed
//! after a child was forked is still seen by the child.
//!
//! How a key combines with its ancestors depends on the key:
//!
//! | Key | Strategy |
//! |-----|----------|
//! | headers | [`MergeStrategy::MergeMap`]: union root to leaf, nearer wins |
//! | interceptors | [`MergeStrategy::OverrideOrInherit`]: nearest non-empty list |
//! | config | [`MergeStrategy::OverrideOrInherit`]: nearest non-empty map |
//!
//! Paths are not inherited lazily: a child captures its parent's path when it
//! is forked.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use strum::{Display, EnumIter};
use tracing::debug;

use crate::config::{insert_header, merge_headers, Headers, Settings};
use crate::error::ListenerError;
use crate::event::{Event, Listener, ListenerId, ERROR_EVENT};
use crate::interceptor::{ErrorInterceptor, RequestInterceptor, ResponseInterceptor};
use crate::path::{ForkPath, PathSegment};

/// How a key's local value combines with its ancestors' values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Union of every level, root first, nearer levels winning on collisions.
    MergeMap,
    /// The local value if non-empty, else the nearest non-empty ancestor value.
    OverrideOrInherit,
}

/// The inheritable keys of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum ScopeKey {
    Headers,
    RequestInterceptors,
    ResponseInterceptors,
    ErrorInterceptors,
    Config,
}

impl ScopeKey {
    /// Returns the merge strategy for this key.
    pub const fn strategy(self) -> MergeStrategy {
        match self {
            Self::Headers => MergeStrategy::MergeMap,
            Self::RequestInterceptors
            | Self::ResponseInterceptors
            | Self::ErrorInterceptors
            | Self::Config => MergeStrategy::OverrideOrInherit,
        }
    }
}

/// A value stored per scope level.
trait Overlay: Clone + Default {
    fn is_empty(&self) -> bool;

    /// Layers a nearer level's value over this one.
    fn overlay(&mut self, nearer: &Self);
}

impl Overlay for Headers {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }

    fn overlay(&mut self, nearer: &Self) {
        merge_headers(self, nearer.clone());
    }
}

impl Overlay for Settings {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }

    fn overlay(&mut self, nearer: &Self) {
        self.extend(nearer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl<T: Clone> Overlay for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }

    fn overlay(&mut self, nearer: &Self) {
        if !nearer.is_empty() {
            self.clone_from(nearer);
        }
    }
}

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    once: bool,
    callback: Listener,
}

#[derive(Default)]
struct Layer {
    path: Vec<PathSegment>,
    headers: Headers,
    request_interceptors: Vec<RequestInterceptor>,
    response_interceptors: Vec<ResponseInterceptor>,
    error_interceptors: Vec<ErrorInterceptor>,
    config: Settings,
    listeners: HashMap<String, Vec<ListenerEntry>>,
}

struct ScopeInner {
    parent: Option<Scope>,
    layer: RwLock<Layer>,
}

/// One node of the configuration tree.
///
/// Cloning a `Scope` yields another handle to the same node.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Creates a root scope.
    ///
    /// The root carries a default `"error"` listener that only logs, so an
    /// error event with no other observer is still consumed.
    pub fn root() -> Self {
        let scope = Self::with_layer(None, Layer::default());
        scope.on(ERROR_EVENT, |event| {
            if let Event::Error { error, config } = event {
                debug!(
                    error = %error,
                    method = %config.method,
                    "unhandled request error reached the root scope"
                );
            }
            Ok(())
        });
        scope
    }

    fn with_layer(parent: Option<Scope>, layer: Layer) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent,
                layer: RwLock::new(layer),
            }),
        }
    }

    /// Creates a child scope.
    ///
    /// With `relative` the child's path is this scope's path followed by
    /// `segments`; otherwise it is `segments` alone. An empty non-relative
    /// fork keeps this scope's path. The parent is never modified.
    pub fn fork(&self, segments: impl Into<ForkPath>, relative: bool) -> Self {
        let segments = segments.into().into_segments();
        let path = if relative || segments.is_empty() {
            let mut path = self.path();
            path.extend(segments);
            path
        } else {
            segments
        };

        debug!(relative, depth = path.len(), "forked scope");
        Self::with_layer(
            Some(self.clone()),
            Layer {
                path,
                ..Layer::default()
            },
        )
    }

    /// Returns the parent scope, if any.
    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    /// Iterates from this scope up to the root.
    fn lineage(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |scope| scope.parent())
    }

    fn lookup<T, F>(&self, key: ScopeKey, read: F) -> T
    where
        T: Overlay,
        F: Fn(&Layer) -> &T,
    {
        match key.strategy() {
            MergeStrategy::MergeMap => {
                let lineage: Vec<&Scope> = self.lineage().collect();
                lineage.into_iter().rev().fold(T::default(), |mut acc, scope| {
                    acc.overlay(read(&*scope.inner.layer.read()));
                    acc
                })
            }
            MergeStrategy::OverrideOrInherit => self
                .lineage()
                .find_map(|scope| {
                    let layer = scope.inner.layer.read();
                    let value = read(&*layer);
                    (!value.is_empty()).then(|| value.clone())
                })
                .unwrap_or_default(),
        }
    }

    /// Returns this scope's path segments.
    pub fn path(&self) -> Vec<PathSegment> {
        self.inner.layer.read().path.clone()
    }

    /// Returns the merged headers.
    pub fn headers(&self) -> Headers {
        self.lookup(ScopeKey::Headers, |layer| &layer.headers)
    }

    pub fn request_interceptors(&self) -> Vec<RequestInterceptor> {
        self.lookup(ScopeKey::RequestInterceptors, |layer| {
            &layer.request_interceptors
        })
    }

    pub fn response_interceptors(&self) -> Vec<ResponseInterceptor> {
        self.lookup(ScopeKey::ResponseInterceptors, |layer| {
            &layer.response_interceptors
        })
    }

    pub fn error_interceptors(&self) -> Vec<ErrorInterceptor> {
        self.lookup(ScopeKey::ErrorInterceptors, |layer| &layer.error_interceptors)
    }

    /// Returns the nearest non-empty settings map.
    pub fn config(&self) -> Settings {
        self.lookup(ScopeKey::Config, |layer| &layer.config)
    }

    /// Returns one named setting from [`Scope::config`].
    pub fn config_value(&self, name: &str) -> Option<Value> {
        self.config().remove(name)
    }

    /// Replaces this scope's path.
    pub fn set_path(&self, path: Vec<PathSegment>) {
        self.inner.layer.write().path = path;
    }

    /// Appends one segment to this scope's path.
    pub fn push_segment(&self, segment: impl Into<PathSegment>) {
        self.inner.layer.write().path.push(segment.into());
    }

    /// Sets a header on this scope only, replacing a local header of the same
    /// name in any letter case.
    pub fn assign_header(&self, name: impl Into<String>, value: impl Into<String>) {
        insert_header(
            &mut self.inner.layer.write().headers,
            name.into(),
            value.into(),
        );
    }

    /// Replaces this scope's local headers.
    pub fn set_headers(&self, headers: Headers) {
        self.inner.layer.write().headers = headers;
    }

    pub fn push_request_interceptor(&self, interceptor: RequestInterceptor) {
        self.inner
            .layer
            .write()
            .request_interceptors
            .push(interceptor);
    }

    pub fn push_response_interceptor(&self, interceptor: ResponseInterceptor) {
        self.inner
            .layer
            .write()
            .response_interceptors
            .push(interceptor);
    }

    pub fn push_error_interceptor(&self, interceptor: ErrorInterceptor) {
        self.inner.layer.write().error_interceptors.push(interceptor);
    }

    /// Sets a named setting on this scope only.
    ///
    /// Because settings use override-or-inherit on the whole map, the first
    /// local assignment hides every inherited setting from this scope and
    /// its descendants.
    pub fn assign_config(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .layer
            .write()
            .config
            .insert(name.into(), value.into());
    }

    /// Registers a listener for `name`.
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event<'_>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.register(name.into(), Arc::new(listener), false)
    }

    /// Registers a listener that is removed the first time it fires.
    pub fn once<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event<'_>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.register(name.into(), Arc::new(listener), true)
    }

    fn register(&self, name: String, callback: Listener, once: bool) -> ListenerId {
        let id = ListenerId::next();
        self.inner
            .layer
            .write()
            .listeners
            .entry(name)
            .or_default()
            .push(ListenerEntry { id, once, callback });
        id
    }

    /// Removes a listener registered on this scope. Returns `false` if it was
    /// not found here.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut layer = self.inner.layer.write();
        for entries in layer.listeners.values_mut() {
            if let Some(pos) = entries.iter().position(|entry| entry.id == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    /// Returns the number of listeners registered locally for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .layer
            .read()
            .listeners
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Delivers `event` to this scope's listeners, then to every ancestor.
    ///
    /// Listeners run in registration order, child before parent. A
    /// once-listener is removed right before it runs. The first listener
    /// error stops propagation and is returned; listeners that did not run
    /// stay registered.
    pub fn emit(&self, event: &Event<'_>) -> Result<(), ListenerError> {
        for scope in self.lineage() {
            let listeners = scope.listeners_for(event.name());
            if !listeners.is_empty() {
                debug!(event = event.name(), count = listeners.len(), "emitting event");
            }
            for entry in listeners {
                if entry.once && !scope.off(entry.id) {
                    continue;
                }
                (entry.callback)(event)?;
            }
        }
        Ok(())
    }

    fn listeners_for(&self, name: &str) -> Vec<ListenerEntry> {
        self.inner
            .layer
            .read()
            .listeners
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layer = self.inner.layer.read();
        f.debug_struct("Scope")
            .field("path", &layer.path)
            .field("headers", &layer.headers)
            .field("config", &layer.config)
            .field("has_parent", &self.inner.parent.is_some())
            .finish_non_exhaustive()
    }
}
