//! Identity cache deduplicating views and base resources by string key.
//!
//! The cache is a shared mutable singleton by design: one process-wide
//! instance lives behind [`global`], and every mapping is directly
//! inspectable. Collisions are resolved last-writer-wins with a logged
//! warning, never an error; callers that need strict uniqueness pre-check
//! with [`Registry::lookup`]. [`Registry`] itself is an explicit handle
//! type, so tests and embedders can substitute isolated instances.

pub mod locator;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::foundation::error::{TexviewError, TexviewResult};
use crate::resource::BaseResource;
use crate::source::{BufferSource, DeferredSource, MediaSource, PixelSource};
use crate::view::{View, ViewOpts};

/// Options for [`Registry::fetch_or_create`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchOpts {
    /// Fail with a Lookup error on a locator miss instead of synthesizing a
    /// new resource.
    pub strict: bool,
    /// Pixel density for a synthesized resource; defaults to the density
    /// encoded in the locator's `@…x` suffix, then `1.0`.
    pub resolution: Option<f64>,
}

/// Source argument accepted by [`Registry::fetch_or_create`].
pub enum FetchSource {
    /// Textual locator doubling as the cache key.
    Locator(String),
    /// Raw resource descriptor; keyed by its own locator when it has one,
    /// otherwise by a freshly generated internal key.
    Descriptor(Box<dyn PixelSource>),
}

impl From<&str> for FetchSource {
    fn from(locator: &str) -> Self {
        Self::Locator(locator.to_owned())
    }
}

impl From<String> for FetchSource {
    fn from(locator: String) -> Self {
        Self::Locator(locator)
    }
}

impl From<Box<dyn PixelSource>> for FetchSource {
    fn from(descriptor: Box<dyn PixelSource>) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl fmt::Debug for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locator(key) => f.debug_tuple("Locator").field(key).finish(),
            Self::Descriptor(src) => f.debug_tuple("Descriptor").field(src).finish(),
        }
    }
}

struct RegistryInner {
    views: RefCell<HashMap<String, View>>,
    resources: RefCell<HashMap<String, BaseResource>>,
    next_key: Cell<u64>,
}

/// String-keyed identity cache for [`View`] and [`BaseResource`] singletons.
///
/// Cheap-clone handle; all clones share one mapping. Mutations are single
/// synchronous map operations with no transactional semantics.
#[derive(Clone)]
pub struct Registry {
    inner: Rc<RegistryInner>,
}

pub(crate) struct WeakRegistry(Weak<RegistryInner>);

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Option<Registry> {
        self.0.upgrade().map(|inner| Registry { inner })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an isolated registry.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                views: RefCell::new(HashMap::new()),
                resources: RefCell::new(HashMap::new()),
                next_key: Cell::new(1),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Rc::downgrade(&self.inner))
    }

    /// Register `view` under `key`.
    ///
    /// Idempotent for a key already on the view. Registering a key that maps
    /// to a different live instance logs a warning and overwrites; the old
    /// instance keeps its stale key until
    /// [`unregister_view`](Registry::unregister_view) strips it.
    pub fn register(&self, view: &View, key: &str) {
        if let Some(existing) = self.inner.views.borrow().get(key)
            && !existing.same(view)
        {
            tracing::warn!(key, "identity cache key already taken; overwriting");
        }
        view.attach_registry(self.downgrade());
        view.push_cache_key(key);
        self.inner.views.borrow_mut().insert(key.to_owned(), view.clone());
    }

    /// Register an additional alias for an already-cached view.
    pub fn register_alias(&self, view: &View, alias: &str) {
        self.register(view, alias);
    }

    /// Remove the mapping for `key`, returning the view it pointed at and
    /// stripping the key from that view's key list.
    pub fn unregister_key(&self, key: &str) -> Option<View> {
        let view = self.inner.views.borrow_mut().remove(key)?;
        view.remove_cache_key(key);
        Some(view)
    }

    /// Delete every mapping still pointing at `view` — including stale
    /// duplicates left behind by overwrites — and clear its key list.
    /// Returns the number of removed entries.
    pub fn unregister_view(&self, view: &View) -> usize {
        let removed = {
            let mut views = self.inner.views.borrow_mut();
            let before = views.len();
            views.retain(|_, v| !v.same(view));
            before - views.len()
        };
        view.clear_cache_keys();
        removed
    }

    /// Register a base resource under its locator key.
    pub fn register_resource(&self, resource: &BaseResource, key: &str) {
        if let Some(existing) = self.inner.resources.borrow().get(key)
            && !existing.same(resource)
        {
            tracing::warn!(key, "resource cache key already taken; overwriting");
        }
        self.inner
            .resources
            .borrow_mut()
            .insert(key.to_owned(), resource.clone());
    }

    /// Remove a resource entry.
    pub fn unregister_resource(&self, key: &str) -> Option<BaseResource> {
        self.inner.resources.borrow_mut().remove(key)
    }

    /// Inspect the view mapping for `key`.
    pub fn lookup(&self, key: &str) -> Option<View> {
        self.inner.views.borrow().get(key).cloned()
    }

    /// Inspect the resource mapping for `key`.
    pub fn lookup_resource(&self, key: &str) -> Option<BaseResource> {
        self.inner.resources.borrow().get(key).cloned()
    }

    /// Snapshot of all registered view keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.views.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of view entries.
    pub fn len(&self) -> usize {
        self.inner.views.borrow().len()
    }

    /// True when no views are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.views.borrow().is_empty()
    }

    fn fresh_key(&self) -> String {
        let n = self.inner.next_key.get();
        self.inner.next_key.set(n + 1);
        format!("texview-anon-{n}")
    }

    /// Fetch the singleton view for `source`, creating and registering it
    /// when absent.
    ///
    /// Textual locators are idempotent: repeated calls with the same key
    /// return the identical instance. A miss fails with a Lookup error in
    /// strict mode; otherwise a deferred base resource is synthesized from
    /// the locator (resolution parsed from its `@…x` suffix unless supplied)
    /// and both the view and the resource are registered under the key. Raw
    /// descriptors skip the strict check: they are keyed by their own
    /// locator or a freshly generated internal key, then follow the same
    /// create path.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn fetch_or_create(
        &self,
        source: impl Into<FetchSource>,
        opts: FetchOpts,
    ) -> TexviewResult<View> {
        match source.into() {
            FetchSource::Locator(key) => {
                if let Some(hit) = self.lookup(&key) {
                    return Ok(hit);
                }
                if opts.strict {
                    return Err(TexviewError::lookup(format!(
                        "no cached view for locator '{key}'"
                    )));
                }
                let resolution = opts
                    .resolution
                    .or_else(|| locator::resolution_of_locator(&key))
                    .unwrap_or(1.0);
                let base =
                    BaseResource::new(DeferredSource::new(&key)).with_resolution(resolution);
                self.install(base, &key, None)
            }
            FetchSource::Descriptor(descriptor) => {
                let key = descriptor
                    .locator()
                    .map(str::to_owned)
                    .unwrap_or_else(|| self.fresh_key());
                if let Some(hit) = self.lookup(&key) {
                    return Ok(hit);
                }
                let resolution = opts
                    .resolution
                    .or_else(|| locator::resolution_of_locator(&key))
                    .unwrap_or(1.0);
                let base = BaseResource::from_boxed(descriptor).with_resolution(resolution);
                self.install(base, &key, None)
            }
        }
    }

    /// Build and register a view over a raw RGBA8 buffer.
    pub fn create_from_buffer(
        &self,
        bytes: Vec<u8>,
        width: u32,
        height: u32,
        name: &str,
    ) -> TexviewResult<View> {
        let base = BaseResource::new(BufferSource::new(bytes, width, height)?);
        self.install(base, name, None)
    }

    /// Build and register a view over an already-decoded media element.
    ///
    /// Registered under `name` and, when the element carries a distinct
    /// locator, under that locator as well.
    pub fn create_from_media(&self, media: MediaSource, name: &str) -> TexviewResult<View> {
        let secondary = media.locator().map(str::to_owned);
        let base = BaseResource::new(media);
        self.install(base, name, secondary.as_deref())
    }

    fn install(&self, base: BaseResource, key: &str, secondary: Option<&str>) -> TexviewResult<View> {
        let view = View::new(&base, ViewOpts::default())?;
        self.register(&view, key);
        self.register_resource(&base, key);
        if let Some(alias) = secondary
            && alias != key
        {
            self.register(&view, alias);
            self.register_resource(&base, alias);
        }
        Ok(view)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("views", &self.len())
            .field("resources", &self.inner.resources.borrow().len())
            .finish_non_exhaustive()
    }
}

thread_local! {
    static GLOBAL: Registry = Registry::new();
}

/// Handle to the process-wide registry.
///
/// The core is single-threaded; each thread owns an independent instance
/// with process lifetime, and tests that need isolation construct their own
/// [`Registry`] instead.
pub fn global() -> Registry {
    GLOBAL.with(Registry::clone)
}

#[cfg(test)]
#[path = "../../tests/unit/cache/registry.rs"]
mod tests;
