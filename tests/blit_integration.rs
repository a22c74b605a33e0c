//! End-to-end blits through the public surface API.

use std::sync::Arc;

use rstest::rstest;
use sdlite::video::{blit_surface, AlphaKernel, Kernel, LockHandler, PixelFormat, Rect, Surface, SurfaceId};
use sdlite::{get_error, BlitError, SurfaceRole};
use serial_test::serial;

fn solid(w: u32, h: u32, format: PixelFormat, value: u32) -> Surface {
    let mut s = Surface::new(w, h, format).unwrap();
    s.fill_rect(None, value).unwrap();
    s
}

fn rgb(s: &Surface, x: u32, y: u32) -> (u8, u8, u8) {
    let c = s.format().get_rgb(s.get_pixel(x, y).unwrap());
    (c.r, c.g, c.b)
}

#[rstest]
#[case::packed_24(PixelFormat::rgb888())]
#[case::xrgb(PixelFormat::xrgb8888())]
fn half_alpha_over_black(#[case] format: PixelFormat) {
    let mut src = solid(3, 2, format.clone(), format.map_rgb(200, 100, 50));
    src.set_alpha(Some(128));
    let mut dst = Surface::new(3, 2, format).unwrap();

    let drawn = blit_surface(&mut src, None, &mut dst, None).unwrap();
    assert_eq!(drawn, Rect::new(0, 0, 3, 2));
    for y in 0..2 {
        for x in 0..3 {
            assert_eq!(rgb(&dst, x, y), (100, 50, 25));
        }
    }
}

#[rstest]
#[case::rgb565(PixelFormat::rgb565())]
#[case::rgb555(PixelFormat::rgb555())]
#[case::xrgb(PixelFormat::xrgb8888())]
#[case::packed_24(PixelFormat::rgb888())]
fn zero_alpha_leaves_destination(#[case] format: PixelFormat) {
    let mut src = solid(4, 1, format.clone(), format.map_rgb(255, 255, 255));
    src.set_alpha(Some(0));
    let before = format.map_rgb(16, 96, 200);
    let mut dst = solid(4, 1, format, before);
    let expected = rgb(&dst, 0, 0);

    blit_surface(&mut src, None, &mut dst, None).unwrap();
    for x in 0..4 {
        assert_eq!(rgb(&dst, x, 0), expected);
    }
}

#[rstest]
#[case::rgb565(PixelFormat::rgb565())]
#[case::xrgb(PixelFormat::xrgb8888())]
#[case::packed_24(PixelFormat::rgb888())]
fn opaque_surface_alpha_copies_source(#[case] format: PixelFormat) {
    let value = format.map_rgb(123, 45, 67);
    let mut src = solid(2, 2, format.clone(), value);
    src.set_alpha(Some(255));
    let mut dst = solid(2, 2, format, 0);

    blit_surface(&mut src, None, &mut dst, None).unwrap();
    assert_eq!(dst.get_pixel(1, 1), Some(value));
}

#[test]
fn per_pixel_alpha_boundaries() {
    let argb = PixelFormat::argb8888();
    let mut src = Surface::new(2, 1, argb.clone()).unwrap();
    src.put_pixel(0, 0, argb.map_rgba(10, 20, 30, 0));
    src.put_pixel(1, 0, argb.map_rgba(10, 20, 30, 255));
    let mut dst = solid(2, 1, PixelFormat::xrgb8888(), 0x00f0e0d0);

    blit_surface(&mut src, None, &mut dst, None).unwrap();
    assert_eq!(dst.get_pixel(0, 0), Some(0x00f0e0d0));
    assert_eq!(rgb(&dst, 1, 0), (10, 20, 30));
}

#[test]
fn per_pixel_alpha_to_565() {
    let argb = PixelFormat::argb8888();
    let mut src = solid(1, 1, argb.clone(), argb.map_rgba(255, 255, 255, 128));
    let mut dst = Surface::new(1, 1, PixelFormat::rgb565()).unwrap();

    blit_surface(&mut src, None, &mut dst, None).unwrap();
    // 5-bit alpha 16: 31 * 16 >> 5 = 15 on red/blue, 63 * 16 >> 5 = 31 on green
    assert_eq!(dst.get_pixel(0, 0), Some((15 << 11) | (31 << 5) | 15));
}

#[rstest]
#[case::copy(None)]
#[case::blend(Some(128))]
fn colorkey_pixels_are_untouched(#[case] alpha: Option<u8>) {
    let format = PixelFormat::rgb565();
    let key = format.map_rgb(255, 0, 255);
    let mut src = Surface::new(3, 1, format.clone()).unwrap();
    src.put_pixel(0, 0, key);
    src.put_pixel(1, 0, format.map_rgb(0, 255, 0));
    src.put_pixel(2, 0, key);
    src.set_color_key(Some(key));
    if alpha.is_some() {
        src.set_alpha(alpha);
    }

    let before = format.map_rgb(0, 0, 255);
    let mut dst = solid(3, 1, format, before);
    blit_surface(&mut src, None, &mut dst, None).unwrap();

    assert_eq!(dst.get_pixel(0, 0), Some(before));
    assert_ne!(dst.get_pixel(1, 0), Some(before));
    assert_eq!(dst.get_pixel(2, 0), Some(before));
}

#[test]
fn colorkey_on_indexed_destination() {
    let mut src = Surface::new(2, 1, PixelFormat::xrgb8888()).unwrap();
    src.put_pixel(0, 0, 0x00ff00ff);
    src.put_pixel(1, 0, 0x00ffffff);
    src.set_color_key(Some(0x00ff00ff));
    src.set_alpha(Some(128));

    let mut dst = solid(2, 1, PixelFormat::indexed8(), 0x03);
    blit_surface(&mut src, None, &mut dst, None).unwrap();
    assert_eq!(dst.get_pixel(0, 0), Some(0x03));
    assert_ne!(dst.get_pixel(1, 0), Some(0x03));
}

#[test]
fn clipping_to_destination() {
    let mut src = solid(4, 4, PixelFormat::xrgb8888(), 0x00ffffff);
    let mut dst = Surface::new(4, 4, PixelFormat::xrgb8888()).unwrap();
    assert!(dst.set_clip_rect(Some(Rect::new(1, 1, 2, 2))));

    let drawn = blit_surface(&mut src, None, &mut dst, Some(Rect::new(-1, 0, 0, 0))).unwrap();
    assert_eq!(drawn, Rect::new(1, 1, 2, 2));
    for y in 0..4 {
        for x in 0..4 {
            let inside = (1..3).contains(&x) && (1..3).contains(&y);
            let expected = if inside { 0x00ffffff } else { 0 };
            assert_eq!(dst.get_pixel(x, y), Some(expected), "({}, {})", x, y);
        }
    }
}

#[test]
fn fully_clipped_blit_draws_nothing() {
    let mut src = solid(2, 2, PixelFormat::rgb565(), 0xffff);
    let mut dst = Surface::new(2, 2, PixelFormat::rgb565()).unwrap();
    let drawn = blit_surface(&mut src, None, &mut dst, Some(Rect::new(5, 5, 0, 0))).unwrap();
    assert!(drawn.is_empty());
    assert!(dst.pixels().iter().all(|&b| b == 0));
}

#[test]
fn changing_alpha_reselects_kernel() {
    let format = PixelFormat::rgb565();
    let mut src = solid(1, 1, format.clone(), 0xffff);
    let mut dst = Surface::new(1, 1, format).unwrap();

    blit_surface(&mut src, None, &mut dst, None).unwrap();
    assert_eq!(dst.get_pixel(0, 0), Some(0xffff));

    src.set_alpha(Some(128));
    dst.fill_rect(None, 0).unwrap();
    blit_surface(&mut src, None, &mut dst, None).unwrap();
    assert_eq!(dst.get_pixel(0, 0), Some((15 << 11) | (31 << 5) | 15));

    let kernel = sdlite::video::blit::map_surface(&mut src, &dst);
    assert_eq!(kernel, Kernel::Alpha(AlphaKernel::Rgb565SurfaceAlpha));
}

struct Refuse;

impl LockHandler for Refuse {
    fn lock(&self, _surface: SurfaceId) -> bool {
        false
    }

    fn unlock(&self, _surface: SurfaceId) {}
}

#[test]
#[serial]
fn destination_lock_failure_is_reported() {
    let mut src = solid(1, 1, PixelFormat::xrgb8888(), 0x00ffffff);
    let mut dst = Surface::new(1, 1, PixelFormat::xrgb8888()).unwrap();
    dst.set_lock_handler(Some(Arc::new(Refuse)));

    let err = blit_surface(&mut src, None, &mut dst, None).unwrap_err();
    assert!(matches!(
        err,
        BlitError::LockFailure {
            role: SurfaceRole::Destination,
            ..
        }
    ));
    assert_eq!(get_error(), "Unable to lock destination surface");
    assert_eq!(dst.get_pixel(0, 0), Some(0));
    assert!(!dst.is_locked());
    assert!(!src.is_locked());
}

#[test]
#[serial]
fn lower_blit_rejects_out_of_bounds() {
    let mut src = Surface::new(2, 2, PixelFormat::rgb565()).unwrap();
    let mut dst = Surface::new(2, 2, PixelFormat::rgb565()).unwrap();
    let err = sdlite::video::lower_blit(
        &mut src,
        Rect::new(0, 0, 2, 2),
        &mut dst,
        Rect::new(1, 0, 2, 2),
    )
    .unwrap_err();
    assert_eq!(err, BlitError::InvalidRectangle(SurfaceRole::Destination));
    assert_eq!(get_error(), "Invalid destination blit rectangle");
}

#[test]
fn convert_then_blit_preserves_colour() {
    let mut src = solid(2, 2, PixelFormat::rgb565(), 0xf800);
    let mut converted = src.convert(&PixelFormat::xrgb8888()).unwrap();
    assert_eq!(converted.get_pixel(0, 0), Some(0x00f80000));

    let mut back = Surface::new(2, 2, PixelFormat::rgb565()).unwrap();
    blit_surface(&mut converted, None, &mut back, None).unwrap();
    assert_eq!(back.get_pixel(1, 1), Some(0xf800));
}
