//! The view entity: an oriented rectangular window into a shared base
//! resource, plus its cached sampling coordinates.

pub mod rotate;
mod uvs;

pub use uvs::UvQuad;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::cache::{self, FetchOpts, FetchSource, WeakRegistry};
use crate::event::{Notifier, Subscription};
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{TexviewError, TexviewResult};
use crate::resource::BaseResource;
use crate::source::{BufferSource, MediaSource};

/// Frame-tracking mode of a [`View`].
///
/// Every view starts in [`Auto`] unless constructed with an explicit frame,
/// and permanently transitions to [`Fixed`] on the first successful frame
/// assignment. The transition is one-way and observable as
/// [`ViewEvent::FramePinned`].
///
/// [`Auto`]: FrameMode::Auto
/// [`Fixed`]: FrameMode::Fixed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// No fixed frame; the view tracks the base resource's full extent.
    Auto,
    /// The frame was pinned explicitly.
    Fixed,
}

/// Payload of a view's lifecycle notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// Validity, geometry, or base-resource state changed.
    Changed,
    /// The first successful frame assignment pinned the view out of
    /// auto-frame mode. Fired at most once per view.
    FramePinned,
}

/// Construction options for [`View`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewOpts {
    /// Sub-image rectangle in base pixel space; `None` selects auto-frame
    /// mode.
    pub frame: Option<Rect>,
    /// Pre-trim logical rectangle; defaults to `frame`.
    pub orig: Option<Rect>,
    /// Offset of the visible region inside the original untrimmed image.
    pub trim: Option<Rect>,
    /// Dihedral-8 rotation tag; must be axis-aligned (even).
    pub rotation: u8,
    /// Default pivot handed to consumers created from this view.
    pub anchor: Point,
}

impl ViewOpts {
    /// Options with a fixed frame.
    pub fn framed(frame: Rect) -> Self {
        Self {
            frame: Some(frame),
            ..Self::default()
        }
    }

    /// Legacy packer flag: `true` maps to the quarter-turn tag.
    #[must_use]
    pub fn rotated(mut self, rotated: bool) -> Self {
        self.rotation = if rotated {
            rotate::QUARTER
        } else {
            rotate::UPRIGHT
        };
        self
    }
}

/// Options for [`View::destroy`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DestroyOpts {
    /// Also remove the base resource's locator entry from the registry that
    /// holds this view, then destroy the base resource itself.
    pub base: bool,
}

struct ViewInner {
    base: RefCell<Option<BaseResource>>,
    frame: Cell<Option<Rect>>,
    orig: Cell<Option<Rect>>,
    trim: Cell<Option<Rect>>,
    rotation: Cell<u8>,
    anchor: Cell<Point>,
    mode: Cell<FrameMode>,
    valid: Cell<bool>,
    uvs: Cell<Option<UvQuad>>,
    version: Cell<u64>,
    cache_keys: RefCell<Vec<String>>,
    registry: RefCell<Option<WeakRegistry>>,
    sealed: bool,
    changed: Notifier<ViewEvent>,
    ready_sub: Cell<Option<Subscription>>,
    changed_sub: Cell<Option<Subscription>>,
}

/// A named rectangular, oriented window into a shared base resource.
///
/// `View` is a cheap-clone handle; clones observe the same geometry,
/// validity, and version. Use [`duplicate`](View::duplicate) for a value
/// copy onto a fresh view and [`same`](View::same) for identity comparison.
#[derive(Clone)]
pub struct View {
    inner: Rc<ViewInner>,
}

impl View {
    /// Create a view over `base`.
    ///
    /// Without a frame the view enters auto-frame mode and sizes itself from
    /// the resource, immediately when the resource is ready or once its
    /// readiness notification arrives. With a frame, the rectangle goes
    /// through the same validation as [`set_frame`](View::set_frame).
    pub fn new(base: &BaseResource, opts: ViewOpts) -> TexviewResult<View> {
        Self::build(base, opts, false)
    }

    fn build(base: &BaseResource, opts: ViewOpts, sealed: bool) -> TexviewResult<View> {
        ensure_axis_aligned(opts.rotation)?;

        let mode = if opts.frame.is_some() {
            FrameMode::Fixed
        } else {
            FrameMode::Auto
        };
        let frame = opts.frame.unwrap_or(Rect::ZERO);
        let orig = opts.orig.or(opts.frame).unwrap_or(Rect::ZERO);

        let view = View {
            inner: Rc::new(ViewInner {
                base: RefCell::new(Some(base.clone())),
                frame: Cell::new(Some(frame)),
                orig: Cell::new(Some(orig)),
                trim: Cell::new(opts.trim),
                rotation: Cell::new(opts.rotation),
                anchor: Cell::new(opts.anchor),
                mode: Cell::new(mode),
                valid: Cell::new(false),
                uvs: Cell::new(None),
                version: Cell::new(0),
                cache_keys: RefCell::new(Vec::new()),
                registry: RefCell::new(None),
                sealed,
                changed: Notifier::new(),
                ready_sub: Cell::new(None),
                changed_sub: Cell::new(None),
            }),
        };

        if base.ready() {
            match mode {
                FrameMode::Auto => view.adopt_full_frame(base),
                FrameMode::Fixed => view.apply_frame(frame)?,
            }
        } else {
            let weak = Rc::downgrade(&view.inner);
            let sub = base.on_ready(move |res| {
                if let Some(inner) = weak.upgrade() {
                    View { inner }.on_base_updated(res);
                }
            });
            view.inner.ready_sub.set(Some(sub));
        }

        if mode == FrameMode::Auto {
            let weak = Rc::downgrade(&view.inner);
            let sub = base.on_changed(move |res| {
                if let Some(inner) = weak.upgrade() {
                    View { inner }.on_base_updated(res);
                }
            });
            view.inner.changed_sub.set(Some(sub));
        }

        Ok(view)
    }

    /// Create a view that transitively reuses this view's base resource.
    pub fn derive(&self, opts: ViewOpts) -> TexviewResult<View> {
        let base = self
            .base()
            .ok_or_else(|| TexviewError::configuration("cannot derive from a destroyed view"))?;
        View::new(&base, opts)
    }

    /// Value-copy of the current geometry onto a new view sharing the same
    /// base resource. Auto-frame views duplicate as auto-frame.
    pub fn duplicate(&self) -> TexviewResult<View> {
        let base = self
            .base()
            .ok_or_else(|| TexviewError::configuration("cannot duplicate a destroyed view"))?;
        let frame = (self.mode() == FrameMode::Fixed).then(|| self.frame());
        View::new(
            &base,
            ViewOpts {
                frame,
                orig: Some(self.orig()),
                trim: self.trim(),
                rotation: self.rotation(),
                anchor: self.default_anchor(),
            },
        )
    }

    /// Shared base resource, or `None` once destroyed.
    pub fn base(&self) -> Option<BaseResource> {
        self.inner.base.borrow().clone()
    }

    /// Sub-image rectangle currently sampled. Zero after destroy.
    pub fn frame(&self) -> Rect {
        self.inner.frame.get().unwrap_or(Rect::ZERO)
    }

    /// Pre-trim logical rectangle. Zero after destroy.
    pub fn orig(&self) -> Rect {
        self.inner.orig.get().unwrap_or(Rect::ZERO)
    }

    /// Offset of the visible region inside the original untrimmed image.
    pub fn trim(&self) -> Option<Rect> {
        self.inner.trim.get()
    }

    /// Dihedral-8 rotation tag.
    pub fn rotation(&self) -> u8 {
        self.inner.rotation.get()
    }

    /// Default pivot assigned to consumers created from this view. Fixed at
    /// construction.
    pub fn default_anchor(&self) -> Point {
        self.inner.anchor.get()
    }

    /// Current frame-tracking mode.
    pub fn mode(&self) -> FrameMode {
        self.inner.mode.get()
    }

    /// True when the view can be sampled: positive-area frame and a ready
    /// base resource.
    pub fn valid(&self) -> bool {
        self.inner.valid.get()
    }

    /// Cached sampling quad; `None` until first computed or after destroy.
    pub fn uvs(&self) -> Option<UvQuad> {
        self.inner.uvs.get()
    }

    /// Monotonic counter bumped once per UV recomputation. Never resets.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Keys under which this view is registered in the identity cache, in
    /// registration order.
    pub fn cache_keys(&self) -> Vec<String> {
        self.inner.cache_keys.borrow().clone()
    }

    /// True for the process-wide placeholder singletons.
    pub fn sealed(&self) -> bool {
        self.inner.sealed
    }

    /// True once [`destroy`](View::destroy) has run.
    pub fn destroyed(&self) -> bool {
        self.inner.base.borrow().is_none()
    }

    /// Pre-trim logical width used by layout code, independent of the
    /// physically sampled frame.
    pub fn width(&self) -> f64 {
        self.orig().width()
    }

    /// Pre-trim logical height used by layout code.
    pub fn height(&self) -> f64 {
        self.orig().height()
    }

    /// Pixel density passthrough from the base resource.
    pub fn resolution(&self) -> f64 {
        self.base().map_or(1.0, |b| b.resolution())
    }

    /// Identity comparison: do two handles refer to the same view.
    pub fn same(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Pin the sampled sub-image rectangle.
    ///
    /// The rectangle is validated against the current base dimensions before
    /// any state changes; a rejected mutation leaves the view untouched. On
    /// success the view leaves auto-frame mode permanently, `orig` tracks
    /// the frame while the view is untrimmed and unrotated, and the UV cache
    /// and version are refreshed when the view is valid.
    pub fn set_frame(&self, frame: Rect) -> TexviewResult<()> {
        if self.destroyed() {
            return Err(TexviewError::configuration(
                "frame assigned to a destroyed view",
            ));
        }
        self.apply_frame(frame)
    }

    fn apply_frame(&self, frame: Rect) -> TexviewResult<()> {
        let Some(base) = self.base() else {
            return Err(TexviewError::configuration(
                "frame assigned to a destroyed view",
            ));
        };
        check_frame_bounds(frame, &base)?;

        let was_auto = self.inner.mode.get() == FrameMode::Auto;
        self.inner.mode.set(FrameMode::Fixed);
        self.inner.frame.set(Some(frame));
        if self.inner.trim.get().is_none() && self.inner.rotation.get() == rotate::UPRIGHT {
            self.inner.orig.set(Some(frame));
        }
        self.inner.valid.set(positive_area(frame) && base.ready());
        if self.inner.valid.get() {
            self.recompute_uvs(&base);
        }
        if was_auto {
            self.inner.changed.emit(&ViewEvent::FramePinned);
        }
        Ok(())
    }

    /// Store a new packer rotation tag.
    ///
    /// Odd (diamond) tags are rejected. The frame is unchanged; the quad
    /// orientation is re-derived and the version bumped when the view is
    /// valid.
    pub fn set_rotation(&self, tag: u8) -> TexviewResult<()> {
        ensure_axis_aligned(tag)?;
        if self.destroyed() {
            return Err(TexviewError::configuration(
                "rotation assigned to a destroyed view",
            ));
        }
        self.inner.rotation.set(tag);
        if self.inner.valid.get()
            && let Some(base) = self.base()
        {
            self.recompute_uvs(&base);
        }
        Ok(())
    }

    /// Recompute the UV quad from the current frame, base dimensions, and
    /// rotation tag.
    ///
    /// Every recomputation bumps [`version`](View::version), even when the
    /// resulting coordinates are numerically unchanged; dependents compare
    /// versions instead of deep-comparing coordinates, so callers must not
    /// skip the call based on memoized equality.
    pub fn update_uvs(&self) {
        if let Some(base) = self.base() {
            self.recompute_uvs(&base);
        }
    }

    fn recompute_uvs(&self, base: &BaseResource) {
        let quad = UvQuad::compute(
            self.frame(),
            base.width(),
            base.height(),
            self.inner.rotation.get(),
        );
        self.inner.uvs.set(Some(quad));
        self.inner.version.set(self.inner.version.get() + 1);
    }

    fn adopt_full_frame(&self, base: &BaseResource) {
        let full = Rect::new(0.0, 0.0, f64::from(base.width()), f64::from(base.height()));
        self.inner.frame.set(Some(full));
        if self.inner.trim.get().is_none() && self.inner.rotation.get() == rotate::UPRIGHT {
            self.inner.orig.set(Some(full));
        }
        self.inner.valid.set(positive_area(full) && base.ready());
        if self.inner.valid.get() {
            self.recompute_uvs(base);
        }
    }

    fn on_base_updated(&self, base: &BaseResource) {
        match self.inner.mode.get() {
            FrameMode::Auto => {
                if !base.ready() {
                    return;
                }
                self.adopt_full_frame(base);
                self.inner.changed.emit(&ViewEvent::Changed);
            }
            FrameMode::Fixed => {
                // Mutator errors cannot propagate out of a notification
                // callback; the view keeps its previous geometry.
                if let Err(err) = self.apply_frame(self.frame()) {
                    tracing::error!(%err, "frame re-validation failed after base resource update");
                }
                self.inner.changed.emit(&ViewEvent::Changed);
            }
        }
    }

    /// Forward a content-refresh request to the base resource.
    ///
    /// Geometry and the UV cache are untouched here; any follow-up arrives
    /// through the base resource's `changed` channel.
    pub fn refresh(&self) {
        if let Some(base) = self.base() {
            base.refresh();
        }
    }

    /// Tear the view down.
    ///
    /// Unsubscribes from the base resource, nulls geometry and the UV cache,
    /// invalidates, and removes the view from every identity-cache entry
    /// still naming it. With [`DestroyOpts::base`] the base resource's
    /// locator entry is dropped from the registry first and the resource
    /// itself destroyed. Sealed placeholder singletons ignore the call, and
    /// destroying twice is a no-op.
    pub fn destroy(&self, opts: DestroyOpts) {
        if self.inner.sealed {
            tracing::debug!("destroy ignored on sealed placeholder view");
            return;
        }
        if let Some(base) = self.inner.base.borrow_mut().take() {
            if let Some(sub) = self.inner.ready_sub.take() {
                base.unsubscribe(sub);
            }
            if let Some(sub) = self.inner.changed_sub.take() {
                base.unsubscribe(sub);
            }
            if opts.base {
                if let Some(registry) = self.registry()
                    && let Some(locator) = base.locator()
                {
                    registry.unregister_resource(&locator);
                }
                base.destroy();
            }
        }
        self.inner.frame.set(None);
        self.inner.orig.set(None);
        self.inner.trim.set(None);
        self.inner.uvs.set(None);
        self.inner.valid.set(false);
        if let Some(registry) = self.registry() {
            registry.unregister_view(self);
        } else {
            self.inner.cache_keys.borrow_mut().clear();
        }
        self.inner.changed.clear();
    }

    /// Subscribe to this view's lifecycle notifications.
    ///
    /// Dispatch is synchronous and in registration order. Sealed placeholder
    /// singletons return an inert token instead of subscribing.
    pub fn on_changed(&self, cb: impl FnMut(&ViewEvent) + 'static) -> Subscription {
        if self.inner.sealed {
            return Subscription::INERT;
        }
        self.inner.changed.subscribe(cb)
    }

    /// Remove a subscription obtained from [`on_changed`](View::on_changed).
    pub fn unsubscribe(&self, sub: Subscription) {
        self.inner.changed.unsubscribe(sub);
    }

    fn registry(&self) -> Option<cache::Registry> {
        self.inner.registry.borrow().as_ref().and_then(WeakRegistry::upgrade)
    }

    pub(crate) fn attach_registry(&self, registry: WeakRegistry) {
        *self.inner.registry.borrow_mut() = Some(registry);
    }

    pub(crate) fn push_cache_key(&self, key: &str) {
        let mut keys = self.inner.cache_keys.borrow_mut();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_owned());
        }
    }

    pub(crate) fn remove_cache_key(&self, key: &str) {
        self.inner.cache_keys.borrow_mut().retain(|k| k != key);
    }

    pub(crate) fn clear_cache_keys(&self) {
        self.inner.cache_keys.borrow_mut().clear();
    }
}

// Static factory surface over the process-wide registry.
impl View {
    /// Fetch or create through the process-wide registry; see
    /// [`Registry::fetch_or_create`](crate::cache::Registry::fetch_or_create).
    pub fn fetch_or_create(
        source: impl Into<FetchSource>,
        opts: FetchOpts,
    ) -> TexviewResult<View> {
        cache::global().fetch_or_create(source, opts)
    }

    /// Build and register a view over a raw RGBA8 buffer in the process-wide
    /// registry.
    pub fn create_from_buffer(
        bytes: Vec<u8>,
        width: u32,
        height: u32,
        name: &str,
    ) -> TexviewResult<View> {
        cache::global().create_from_buffer(bytes, width, height, name)
    }

    /// Build and register a view over an already-decoded media element in
    /// the process-wide registry.
    pub fn create_from_media(media: MediaSource, name: &str) -> TexviewResult<View> {
        cache::global().create_from_media(media, name)
    }

    /// Register `view` under `key` in the process-wide registry.
    pub fn register(view: &View, key: &str) {
        cache::global().register(view, key);
    }

    /// Register an additional alias in the process-wide registry.
    pub fn register_alias(view: &View, alias: &str) {
        cache::global().register_alias(view, alias);
    }

    /// Remove `key` from the process-wide registry, returning the view it
    /// pointed at.
    pub fn unregister(key: &str) -> Option<View> {
        cache::global().unregister_key(key)
    }
}

thread_local! {
    static EMPTY: View = sealed_placeholder(BufferSource::solid(0, 0, [0, 0, 0, 0]));
    static OPAQUE: View = sealed_placeholder(BufferSource::solid(16, 16, [255, 255, 255, 255]));
}

fn sealed_placeholder(source: BufferSource) -> View {
    let base = BaseResource::new(source);
    match View::build(&base, ViewOpts::default(), true) {
        Ok(view) => view,
        Err(_) => unreachable!("auto-frame construction over a ready buffer is infallible"),
    }
}

impl View {
    /// Process-wide zero-area placeholder. Sealed: destruction and
    /// subscription are no-ops. Never valid.
    pub fn empty() -> View {
        EMPTY.with(View::clone)
    }

    /// Process-wide fully-opaque 16x16 placeholder. Sealed: destruction and
    /// subscription are no-ops.
    pub fn opaque() -> View {
        OPAQUE.with(View::clone)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("frame", &self.frame())
            .field("orig", &self.orig())
            .field("trim", &self.trim())
            .field("rotation", &self.rotation())
            .field("mode", &self.mode())
            .field("valid", &self.valid())
            .field("version", &self.version())
            .field("cache_keys", &self.cache_keys())
            .finish_non_exhaustive()
    }
}

fn positive_area(rect: Rect) -> bool {
    rect.width() > 0.0 && rect.height() > 0.0
}

fn ensure_axis_aligned(tag: u8) -> TexviewResult<()> {
    if rotate::axis_aligned(tag) {
        return Ok(());
    }
    Err(TexviewError::configuration(format!(
        "rotation tag {tag} is diamond-shaped; non-axis-aligned rotation requires explicit \
         acknowledgement by the renderer"
    )))
}

fn check_frame_bounds(frame: Rect, base: &BaseResource) -> TexviewResult<()> {
    let bw = f64::from(base.width());
    let bh = f64::from(base.height());
    let x_over = (frame.x1 - bw).max(0.0) + (-frame.x0).max(0.0);
    let y_over = (frame.y1 - bh).max(0.0) + (-frame.y0).max(0.0);
    if x_over > 0.0 || y_over > 0.0 {
        let mut axes = Vec::new();
        if x_over > 0.0 {
            axes.push(format!("x axis by {x_over}px"));
        }
        if y_over > 0.0 {
            axes.push(format!("y axis by {y_over}px"));
        }
        return Err(TexviewError::bounds(format!(
            "frame ({}, {}, {}x{}) exceeds the {bw}x{bh} base resource on the {}",
            frame.x0,
            frame.y0,
            frame.width(),
            frame.height(),
            axes.join(" and the ")
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/view/view.rs"]
mod tests;
