//! Texview is the resource-view layer of a 2D rendering engine.
//!
//! A [`View`] is a rectangular, possibly-trimmed, possibly-rotated window
//! into a shared [`BaseResource`]. Views derive normalized [`UvQuad`]
//! sampling coordinates for the orientation the sprite packer declared and
//! bump a monotonic version counter on every recomputation, so dependents
//! compare versions instead of coordinates. A keyed identity cache
//! ([`cache::Registry`]) lets many logical views share one underlying
//! resource (texture atlasing / sprite sheets):
//!
//! - Wrap pixel data in a [`BaseResource`], or let the cache synthesize one
//!   from a locator and complete it when the out-of-band load finishes
//! - Describe sub-images with [`ViewOpts`]: frame, trim, packer rotation
//! - Deduplicate by key through [`cache::global`] or an isolated
//!   [`cache::Registry`]
//! - Ingest whole sprite-sheet manifests with [`sheet::SheetManifest`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cache;
mod event;
mod foundation;
mod resource;
pub mod sheet;
pub mod source;
mod view;

pub use crate::cache::{FetchOpts, FetchSource, Registry};
pub use crate::event::Subscription;
pub use crate::foundation::core::{Point, Rect, Size, Vec2, rect_xywh};
pub use crate::foundation::error::{TexviewError, TexviewResult};
pub use crate::resource::BaseResource;
pub use crate::view::rotate;
pub use crate::view::{DestroyOpts, FrameMode, UvQuad, View, ViewEvent, ViewOpts};
