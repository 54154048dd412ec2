use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::event::{Notifier, Subscription};
use crate::source::PixelSource;

/// Shared pixel-data resource backing one or more [`View`](crate::View)s.
///
/// Cloning is cheap and reference-semantic: every clone observes the same
/// readiness, dimensions, and notification state. The resource itself never
/// loads anything; an external loader resolves the backing [`PixelSource`]
/// out of band and reports completion through [`mark_loaded`].
///
/// Two notification channels exist: `ready` fires exactly once when loading
/// completes, `changed` fires on every subsequent resize or content change.
/// Dispatch is synchronous and in registration order.
///
/// [`mark_loaded`]: BaseResource::mark_loaded
#[derive(Clone)]
pub struct BaseResource {
    inner: Rc<ResourceInner>,
}

struct ResourceInner {
    source: RefCell<Option<Box<dyn PixelSource>>>,
    ready: Cell<bool>,
    width: Cell<u32>,
    height: Cell<u32>,
    resolution: Cell<f64>,
    ready_event: Notifier<BaseResource>,
    changed_event: Notifier<BaseResource>,
}

impl BaseResource {
    /// Wrap a pixel source.
    ///
    /// Sources that already know their dimensions make the resource ready
    /// immediately; deferred sources leave it waiting for [`mark_loaded`].
    ///
    /// [`mark_loaded`]: BaseResource::mark_loaded
    pub fn new(source: impl PixelSource) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub(crate) fn from_boxed(source: Box<dyn PixelSource>) -> Self {
        let dims = source.dimensions();
        let resource = Self {
            inner: Rc::new(ResourceInner {
                source: RefCell::new(Some(source)),
                ready: Cell::new(false),
                width: Cell::new(0),
                height: Cell::new(0),
                resolution: Cell::new(1.0),
                ready_event: Notifier::new(),
                changed_event: Notifier::new(),
            }),
        };
        if let Some((w, h)) = dims {
            resource.inner.width.set(w);
            resource.inner.height.set(h);
            resource.inner.ready.set(true);
        }
        resource
    }

    /// Set the pixel density and return the handle.
    #[must_use]
    pub fn with_resolution(self, resolution: f64) -> Self {
        self.inner.resolution.set(resolution);
        self
    }

    /// True once the out-of-band load has completed.
    pub fn ready(&self) -> bool {
        self.inner.ready.get()
    }

    /// Pixel width; zero until ready.
    pub fn width(&self) -> u32 {
        self.inner.width.get()
    }

    /// Pixel height; zero until ready.
    pub fn height(&self) -> u32 {
        self.inner.height.get()
    }

    /// Pixel density of the backing store.
    pub fn resolution(&self) -> f64 {
        self.inner.resolution.get()
    }

    /// Change the pixel density.
    pub fn set_resolution(&self, resolution: f64) {
        self.inner.resolution.set(resolution);
    }

    /// Stable textual locator of the backing source, when one exists.
    pub fn locator(&self) -> Option<String> {
        self.inner
            .source
            .borrow()
            .as_ref()
            .and_then(|s| s.locator().map(str::to_owned))
    }

    /// True once [`destroy`](BaseResource::destroy) has run.
    pub fn destroyed(&self) -> bool {
        self.inner.source.borrow().is_none()
    }

    /// Report completion of the out-of-band load.
    ///
    /// Fires `ready` exactly once; calling again behaves as a
    /// [`resize`](BaseResource::resize).
    pub fn mark_loaded(&self, width: u32, height: u32) {
        if self.destroyed() {
            return;
        }
        if self.inner.ready.get() {
            self.resize(width, height);
            return;
        }
        self.inner.width.set(width);
        self.inner.height.set(height);
        self.inner.ready.set(true);
        tracing::debug!(width, height, "base resource ready");
        self.inner.ready_event.emit(&self.clone());
    }

    /// Change the pixel extent of an already-loaded resource. Fires `changed`.
    pub fn resize(&self, width: u32, height: u32) {
        if self.destroyed() {
            return;
        }
        self.inner.width.set(width);
        self.inner.height.set(height);
        self.inner.changed_event.emit(&self.clone());
    }

    /// Ask the backing source to re-capture its contents, then fire
    /// `changed` so dependents re-derive their sampling state.
    pub fn refresh(&self) {
        {
            let mut source = self.inner.source.borrow_mut();
            let Some(source) = source.as_mut() else {
                return;
            };
            source.refresh();
        }
        self.inner.changed_event.emit(&self.clone());
    }

    /// Drop the backing source and all subscriptions. Idempotent.
    pub fn destroy(&self) {
        if self.inner.source.borrow_mut().take().is_none() {
            return;
        }
        self.inner.ready.set(false);
        self.inner.ready_event.clear();
        self.inner.changed_event.clear();
        tracing::debug!("base resource destroyed");
    }

    /// Subscribe to the one-shot readiness notification.
    ///
    /// The callback runs at most once; it is unhooked automatically after
    /// the `ready` event fires, or when removed via
    /// [`unsubscribe`](BaseResource::unsubscribe).
    pub fn on_ready(&self, cb: impl FnMut(&BaseResource) + 'static) -> Subscription {
        self.inner.ready_event.subscribe_once(cb)
    }

    /// Subscribe to resize/content-change notifications. These may fire any
    /// number of times after readiness.
    pub fn on_changed(&self, cb: impl FnMut(&BaseResource) + 'static) -> Subscription {
        self.inner.changed_event.subscribe(cb)
    }

    /// Remove a subscription obtained from [`on_ready`](BaseResource::on_ready)
    /// or [`on_changed`](BaseResource::on_changed).
    pub fn unsubscribe(&self, sub: Subscription) {
        self.inner.ready_event.unsubscribe(sub);
        self.inner.changed_event.unsubscribe(sub);
    }

    /// Identity comparison: do two handles refer to the same resource.
    pub fn same(&self, other: &BaseResource) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for BaseResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseResource")
            .field("ready", &self.ready())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("resolution", &self.resolution())
            .field("locator", &self.locator())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/resource.rs"]
mod tests;
