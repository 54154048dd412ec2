use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::foundation::core::rect_xywh;
use crate::source::DeferredSource;

fn ready_base(w: u32, h: u32) -> BaseResource {
    BaseResource::new(BufferSource::solid(w, h, [255, 255, 255, 255]))
}

#[test]
fn fixed_frame_on_ready_base_is_valid() {
    let base = ready_base(100, 50);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(10.0, 5.0, 30.0, 20.0))).unwrap();
    assert!(view.valid());
    assert_eq!(view.mode(), FrameMode::Fixed);
    assert_eq!(view.width(), 30.0);
    assert_eq!(view.height(), 20.0);
    assert_eq!(view.version(), 1);
    assert!(view.uvs().is_some());
}

#[test]
fn full_extent_frame_is_legal() {
    let base = ready_base(120, 80);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 120.0, 80.0))).unwrap();
    assert!(view.valid());
}

#[test]
fn auto_frame_defers_until_ready() {
    let base = BaseResource::new(DeferredSource::new("hero.png"));
    let view = View::new(&base, ViewOpts::default()).unwrap();
    assert_eq!(view.mode(), FrameMode::Auto);
    assert!(!view.valid());
    assert_eq!(view.version(), 0);

    base.mark_loaded(120, 80);
    assert!(view.valid());
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 120.0, 80.0));
    assert_eq!(view.orig(), view.frame());
    assert_eq!(view.version(), 1);
}

#[test]
fn deferred_fixed_frames_validate_on_ready() {
    let base = BaseResource::new(DeferredSource::new("sheet.png"));
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 16.0, 16.0))).unwrap();
    assert_eq!(view.mode(), FrameMode::Fixed);
    assert!(!view.valid());
    assert_eq!(view.version(), 0);

    base.mark_loaded(32, 32);
    assert!(view.valid());
    assert_eq!(view.version(), 1);
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 16.0, 16.0));
}

#[test]
fn deferred_fixed_frames_that_never_fit_stay_invalid() {
    let base = BaseResource::new(DeferredSource::new("small.png"));
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 64.0, 64.0))).unwrap();
    base.mark_loaded(32, 32);
    // Re-validation fails inside the callback; the frame is kept and the
    // view simply never becomes valid.
    assert!(!view.valid());
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 64.0, 64.0));
}

#[test]
fn auto_frame_tracks_resizes() {
    let base = ready_base(32, 32);
    let view = View::new(&base, ViewOpts::default()).unwrap();
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 32.0, 32.0));

    let events = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&events);
    view.on_changed(move |e| log.borrow_mut().push(*e));

    base.resize(64, 16);
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 64.0, 16.0));
    assert_eq!(view.version(), 2);
    assert_eq!(*events.borrow(), vec![ViewEvent::Changed]);
}

#[test]
fn odd_rotation_is_rejected() {
    let base = ready_base(10, 10);
    let err = View::new(
        &base,
        ViewOpts {
            rotation: 3,
            ..ViewOpts::default()
        },
    )
    .unwrap_err();
    assert!(matches!(&err, TexviewError::Configuration(_)));
    assert!(err.to_string().contains("explicit acknowledgement"));

    let view = View::new(&base, ViewOpts::default().rotated(true)).unwrap();
    assert_eq!(view.rotation(), rotate::QUARTER);
}

#[test]
fn bounds_violation_names_the_overflowing_axes() {
    let base = ready_base(100, 100);
    let err = View::new(&base, ViewOpts::framed(rect_xywh(10.0, 10.0, 200.0, 200.0))).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(&err, TexviewError::Bounds(_)));
    assert!(msg.contains("x axis by 110px"));
    assert!(msg.contains("y axis by 110px"));
}

#[test]
fn negative_origins_violate_bounds_too() {
    let base = ready_base(100, 100);
    let err = View::new(&base, ViewOpts::framed(rect_xywh(-5.0, 0.0, 10.0, 10.0))).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("x axis by 5px"));
    assert!(!msg.contains("y axis"));
}

#[test]
fn rejected_mutation_leaves_state_untouched() {
    let base = ready_base(100, 100);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 10.0, 10.0))).unwrap();
    let version = view.version();

    let err = view.set_frame(rect_xywh(90.0, 0.0, 20.0, 10.0)).unwrap_err();
    assert!(matches!(&err, TexviewError::Bounds(_)));
    assert!(err.to_string().contains("x axis"));
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 10.0, 10.0));
    assert_eq!(view.version(), version);
    assert!(view.valid());
}

#[test]
fn pinning_an_auto_frame_is_observable_and_one_way() {
    let base = ready_base(64, 64);
    let view = View::new(&base, ViewOpts::default()).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&events);
    view.on_changed(move |e| log.borrow_mut().push(*e));

    view.set_frame(rect_xywh(0.0, 0.0, 8.0, 8.0)).unwrap();
    assert_eq!(view.mode(), FrameMode::Fixed);
    assert_eq!(*events.borrow(), vec![ViewEvent::FramePinned]);

    // Pinned views no longer auto-track the extent, but their lifetime
    // subscription still re-validates on resize.
    base.resize(32, 32);
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 8.0, 8.0));
    assert_eq!(
        *events.borrow(),
        vec![ViewEvent::FramePinned, ViewEvent::Changed]
    );

    view.set_frame(rect_xywh(1.0, 1.0, 4.0, 4.0)).unwrap();
    assert_eq!(
        *events.borrow(),
        vec![ViewEvent::FramePinned, ViewEvent::Changed]
    );
}

#[test]
fn orig_tracks_frame_only_while_untrimmed_and_unrotated() {
    let base = ready_base(100, 100);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 10.0, 10.0))).unwrap();
    view.set_frame(rect_xywh(5.0, 5.0, 20.0, 10.0)).unwrap();
    assert_eq!(view.orig(), rect_xywh(5.0, 5.0, 20.0, 10.0));

    let trimmed = View::new(
        &base,
        ViewOpts {
            frame: Some(rect_xywh(0.0, 0.0, 10.0, 10.0)),
            orig: Some(rect_xywh(0.0, 0.0, 24.0, 24.0)),
            trim: Some(rect_xywh(2.0, 2.0, 10.0, 10.0)),
            ..ViewOpts::default()
        },
    )
    .unwrap();
    trimmed.set_frame(rect_xywh(50.0, 50.0, 10.0, 10.0)).unwrap();
    assert_eq!(trimmed.orig(), rect_xywh(0.0, 0.0, 24.0, 24.0));
    assert_eq!(trimmed.width(), 24.0);
    assert_eq!(trimmed.height(), 24.0);
}

#[test]
fn rotation_mutation_re_derives_the_quad() {
    let base = ready_base(100, 100);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 50.0, 25.0))).unwrap();
    let before = view.uvs().unwrap();
    let version = view.version();

    view.set_rotation(rotate::QUARTER).unwrap();
    assert_eq!(view.version(), version + 1);
    assert_ne!(view.uvs().unwrap(), before);

    assert!(view.set_rotation(5).is_err());
    assert_eq!(view.rotation(), rotate::QUARTER);
}

#[test]
fn update_uvs_always_bumps_the_version() {
    let base = ready_base(10, 10);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 10.0, 10.0))).unwrap();
    let v = view.version();
    let quad = view.uvs();
    view.update_uvs();
    view.update_uvs();
    assert_eq!(view.version(), v + 2);
    assert_eq!(view.uvs(), quad);
}

#[test]
fn shrinking_base_keeps_state_and_still_notifies() {
    let base = ready_base(64, 64);
    let view = View::new(&base, ViewOpts::default()).unwrap();
    view.set_frame(rect_xywh(0.0, 0.0, 48.0, 48.0)).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&events);
    view.on_changed(move |e| log.borrow_mut().push(*e));

    // 48x48 no longer fits; re-validation fails, the previous geometry is
    // kept, and the change notification still goes out.
    base.resize(32, 32);
    assert_eq!(view.frame(), rect_xywh(0.0, 0.0, 48.0, 48.0));
    assert_eq!(*events.borrow(), vec![ViewEvent::Changed]);
}

#[test]
fn destroy_nulls_geometry_and_is_idempotent() {
    let base = ready_base(16, 16);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 8.0, 8.0))).unwrap();
    let version = view.version();

    view.destroy(DestroyOpts::default());
    assert!(view.destroyed());
    assert!(!view.valid());
    assert_eq!(view.frame(), Rect::ZERO);
    assert_eq!(view.orig(), Rect::ZERO);
    assert!(view.trim().is_none());
    assert!(view.uvs().is_none());
    assert!(view.base().is_none());
    assert_eq!(view.version(), version);
    assert!(!base.destroyed());

    view.destroy(DestroyOpts::default());
    assert!(view.set_frame(rect_xywh(0.0, 0.0, 1.0, 1.0)).is_err());
}

#[test]
fn destroy_can_cascade_to_the_base() {
    let base = ready_base(16, 16);
    let view = View::new(&base, ViewOpts::default()).unwrap();
    view.destroy(DestroyOpts { base: true });
    assert!(base.destroyed());
}

#[test]
fn destroyed_while_awaiting_ready_never_hears_the_callback() {
    let base = BaseResource::new(DeferredSource::new("late.png"));
    let view = View::new(&base, ViewOpts::default()).unwrap();
    view.destroy(DestroyOpts::default());
    base.mark_loaded(10, 10);
    assert!(!view.valid());
    assert_eq!(view.frame(), Rect::ZERO);
}

#[test]
fn duplicate_copies_geometry_and_shares_the_base() {
    let base = ready_base(100, 100);
    let view = View::new(
        &base,
        ViewOpts {
            frame: Some(rect_xywh(10.0, 10.0, 20.0, 20.0)),
            anchor: Point::new(0.5, 0.5),
            ..ViewOpts::default()
        },
    )
    .unwrap();

    let copy = view.duplicate().unwrap();
    assert!(!copy.same(&view));
    assert!(copy.base().unwrap().same(&base));
    assert_eq!(copy.frame(), view.frame());
    assert_eq!(copy.default_anchor(), Point::new(0.5, 0.5));

    // Value copy: mutating the duplicate leaves the original alone.
    copy.set_frame(rect_xywh(0.0, 0.0, 5.0, 5.0)).unwrap();
    assert_eq!(view.frame(), rect_xywh(10.0, 10.0, 20.0, 20.0));
}

#[test]
fn auto_frame_views_duplicate_as_auto_frame() {
    let base = BaseResource::new(DeferredSource::new("later.png"));
    let view = View::new(&base, ViewOpts::default()).unwrap();
    let copy = view.duplicate().unwrap();
    assert_eq!(copy.mode(), FrameMode::Auto);

    base.mark_loaded(6, 4);
    assert_eq!(copy.frame(), rect_xywh(0.0, 0.0, 6.0, 4.0));
}

#[test]
fn handle_clones_share_state() {
    let base = ready_base(100, 100);
    let view = View::new(&base, ViewOpts::framed(rect_xywh(0.0, 0.0, 10.0, 10.0))).unwrap();
    let alias = view.clone();
    alias.set_frame(rect_xywh(2.0, 2.0, 4.0, 4.0)).unwrap();
    assert_eq!(view.frame(), rect_xywh(2.0, 2.0, 4.0, 4.0));
    assert!(alias.same(&view));
}

#[test]
fn placeholders_are_sealed_singletons() {
    let empty = View::empty();
    assert!(empty.same(&View::empty()));
    assert!(!empty.valid());
    assert!(empty.sealed());

    let opaque = View::opaque();
    assert!(opaque.valid());
    assert_eq!(opaque.width(), 16.0);

    empty.destroy(DestroyOpts { base: true });
    opaque.destroy(DestroyOpts::default());
    assert!(!empty.destroyed());
    assert!(opaque.valid());

    let sub = opaque.on_changed(|_| panic!("sealed views never notify"));
    opaque.unsubscribe(sub);
}

#[test]
fn derive_reuses_the_base_transitively() {
    let base = ready_base(64, 64);
    let parent = View::new(&base, ViewOpts::default()).unwrap();
    let child = parent
        .derive(ViewOpts::framed(rect_xywh(0.0, 0.0, 8.0, 8.0)))
        .unwrap();
    assert!(child.base().unwrap().same(&base));
}

#[test]
fn refresh_round_trips_through_the_base() {
    let base = ready_base(8, 8);
    let view = View::new(&base, ViewOpts::default()).unwrap();
    let version = view.version();
    view.refresh();
    // The auto-frame view hears the base's changed signal and re-derives.
    assert_eq!(view.version(), version + 1);
}
