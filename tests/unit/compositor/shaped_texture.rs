use std::{cell::Cell, rc::Rc};

use super::*;
use crate::{
    color::color_state::{Colorspace, TransferFunction},
    format::pixel_format::PixelFormat,
    gpu::headless::{DrawCommand, HeadlessBackend},
};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn upload(b: &mut HeadlessBackend, w: u32, h: u32, pixels: &[[u8; 4]]) -> MultiTexture {
    let data: Vec<u8> = pixels.iter().flatten().copied().collect();
    MultiTexture::new_simple(
        b.texture_new_from_data(w, h, PixelFormat::Rgba8888Pre, w as usize * 4, &data)
            .unwrap(),
    )
}

fn solid(b: &mut HeadlessBackend, w: u32, h: u32) -> MultiTexture {
    upload(b, w, h, &vec![RED; (w * h) as usize])
}

fn pixel(b: &mut HeadlessBackend, fb: &Framebuffer, x: i32, y: i32) -> [u8; 4] {
    let mut out = [0u8; 4];
    b.read_pixels(fb, IntRect::new(x, y, 1, 1), PixelFormat::Rgba8888Pre, 4, &mut out)
        .unwrap();
    out
}

fn draw_pipelines(b: &HeadlessBackend) -> Vec<&'static str> {
    b.commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Draw { pipeline_name, .. } => Some(*pipeline_name),
            DrawCommand::Clear { .. } => None,
        })
        .collect()
}

fn surface(b: &mut HeadlessBackend, w: u32, h: u32) -> ShapedTexture {
    let mut st = ShapedTexture::new();
    st.set_texture(Some(solid(b, w, h)));
    st
}

#[test]
fn size_follows_texture_transform_scale_and_viewport() {
    let mut b = HeadlessBackend::new();
    let mut st = ShapedTexture::new();
    st.set_fallback_size(30, 20);
    assert_eq!(st.dst_size(), (30, 20));

    st.set_texture(Some(solid(&mut b, 64, 32)));
    assert_eq!(st.dst_size(), (64, 32));

    st.set_transform(MonitorTransform::Rotate90);
    assert_eq!(st.dst_size(), (32, 64));

    st.set_buffer_scale(2);
    assert_eq!(st.dst_size(), (16, 32));

    st.set_viewport_src_rect(Rect::new(0.0, 0.0, 10.5, 7.2)).unwrap();
    assert_eq!(st.dst_size(), (11, 8));

    st.set_viewport_dst_size(5, 6).unwrap();
    assert_eq!((st.width(), st.height()), (5, 6));

    st.reset_viewport_dst_size();
    st.reset_viewport_src_rect();
    assert_eq!(st.dst_size(), (16, 32));
}

#[test]
fn odd_sizes_round_up_under_buffer_scale() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 5, 3);
    st.set_buffer_scale(2);
    assert_eq!(st.dst_size(), (3, 2));
}

#[test]
#[should_panic(expected = "buffer scale must be at least 1")]
fn zero_buffer_scale_panics() {
    ShapedTexture::new().set_buffer_scale(0);
}

#[test]
fn invalid_viewport_is_rejected() {
    let mut st = ShapedTexture::new();
    assert!(st.set_viewport_src_rect(Rect::new(0.0, 0.0, 0.0, 4.0)).is_err());
    assert!(st.set_viewport_dst_size(0, 4).is_err());
    assert!(!st.has_viewport());
}

#[test]
fn size_change_notifies_once_and_drops_mask() {
    let mut b = HeadlessBackend::new();
    let seen = Rc::new(Cell::new(0));
    let last = Rc::new(Cell::new((0, 0)));
    let mut st = ShapedTexture::new();
    {
        let seen = Rc::clone(&seen);
        let last = Rc::clone(&last);
        st.connect_size_changed(move |w, h| {
            seen.set(seen.get() + 1);
            last.set((w, h));
        });
    }

    st.set_texture(Some(solid(&mut b, 8, 4)));
    assert_eq!(st.dst_size(), (8, 4));
    assert_eq!(seen.get(), 1);
    assert_eq!(last.get(), (8, 4));
    assert!(st.take_layout_invalidation());
    assert!(!st.take_layout_invalidation());

    st.set_mask_texture(Some(Texture::new(8, 4, PixelFormat::A8)));
    st.set_texture(Some(solid(&mut b, 8, 4)));
    assert_eq!(st.dst_size(), (8, 4));
    assert_eq!(seen.get(), 1);
    assert!(st.mask_texture().is_some());

    st.set_texture(Some(solid(&mut b, 16, 4)));
    assert_eq!(st.dst_size(), (16, 4));
    assert_eq!(seen.get(), 2);
    assert!(st.mask_texture().is_none());
}

#[test]
fn update_area_without_texture_is_none() {
    let mut st = ShapedTexture::new();
    assert_eq!(st.update_area(IntRect::new(0, 0, 4, 4)), None);
}

#[test]
fn update_area_pads_and_clamps() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 100, 100);
    assert_eq!(
        st.update_area(IntRect::new(10, 10, 5, 5)),
        Some(IntRect::new(9, 9, 7, 7))
    );
    assert_eq!(
        st.update_area(IntRect::new(0, 0, 5, 5)),
        Some(IntRect::new(0, 0, 6, 6))
    );
    assert_eq!(st.update_area(IntRect::new(200, 200, 5, 5)), None);
    assert!(st.mipmap().is_invalid());
}

#[test]
fn damage_outside_the_buffer_still_invalidates_the_mipmap() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(16, 16).unwrap();
    let mut st = surface(&mut b, 64, 64);
    let report = st.paint(
        &mut PaintContext::new(&mut b, &fb).with_allocation(Rect::new(0.0, 0.0, 16.0, 16.0)),
    );
    assert!(report.used_mipmap);
    assert!(!st.mipmap().is_invalid());

    assert_eq!(st.update_area(IntRect::new(200, 200, 5, 5)), None);
    assert!(st.mipmap().is_invalid());
}

#[test]
fn update_area_divides_by_buffer_scale() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 100, 100);
    st.set_buffer_scale(2);
    assert_eq!(
        st.update_area(IntRect::new(10, 10, 4, 4)),
        Some(IntRect::new(4, 4, 4, 4))
    );
}

#[test]
fn update_area_follows_rotation() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 100, 50);
    st.set_transform(MonitorTransform::Rotate90);
    assert_eq!(st.dst_size(), (50, 100));
    // The buffer origin shows up in the top-right corner of the rotated surface.
    assert_eq!(
        st.update_area(IntRect::new(0, 0, 10, 10)),
        Some(IntRect::new(39, 0, 11, 11))
    );
}

#[test]
fn update_area_maps_through_viewport() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 100, 100);
    st.set_viewport_src_rect(Rect::new(50.0, 50.0, 100.0, 100.0))
        .unwrap();
    st.set_viewport_dst_size(100, 100).unwrap();
    assert_eq!(
        st.update_area(IntRect::new(60, 60, 10, 10)),
        Some(IntRect::new(18, 18, 24, 24))
    );
}

#[test]
fn update_area_respects_unobscured_region() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 100, 100);

    st.set_unobscured_region(Some(Region::new()));
    assert!(st.is_obscured());
    assert_eq!(st.update_area(IntRect::new(10, 10, 5, 5)), None);

    st.set_unobscured_region(Some(Region::from_rect(IntRect::new(0, 0, 20, 20))));
    assert!(!st.is_obscured());
    assert_eq!(st.update_area(IntRect::new(50, 50, 5, 5)), None);
    assert_eq!(
        st.update_area(IntRect::new(15, 15, 10, 10)),
        Some(IntRect::new(14, 14, 6, 6))
    );
}

#[test]
fn cull_out_records_regions_and_subtracts_opaque_area() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 20, 20);
    st.set_opaque_region(Some(Region::from_rect(IntRect::new(0, 0, 10, 10))));

    let mut unobscured = Region::from_rect(IntRect::new(0, 0, 100, 100));
    let mut clip = Region::from_rect(IntRect::new(0, 0, 100, 100));
    st.cull_out(Some(&mut unobscured), Some(&mut clip), 255);

    assert_eq!(
        st.unobscured_region().map(Region::extents),
        Some(IntRect::new(0, 0, 20, 20))
    );
    assert_eq!(st.clip_region().map(Region::area), Some(10_000));
    assert_eq!(unobscured.area(), 10_000 - 100);
    assert_eq!(clip.area(), 10_000 - 100);
    assert!(!unobscured.contains_point(5, 5));

    let mut translucent = Region::from_rect(IntRect::new(0, 0, 100, 100));
    st.cull_out(Some(&mut translucent), None, 128);
    assert_eq!(translucent.area(), 10_000);
    assert!(st.clip_region().is_none());

    st.set_clip_region(Some(Region::from_rect(IntRect::new(0, 0, 1, 1))));
    st.reset_culling();
    assert!(st.clip_region().is_none());
}

#[test]
fn texture_matrix_crops_to_viewport() {
    let mut b = HeadlessBackend::new();
    let mut st = surface(&mut b, 100, 50);
    assert_eq!(st.texture_matrix(), Affine::IDENTITY);

    st.set_viewport_src_rect(Rect::new(10.0, 5.0, 30.0, 15.0))
        .unwrap();
    let m = st.texture_matrix();
    let origin = m * kurbo::Point::new(0.0, 0.0);
    let corner = m * kurbo::Point::new(1.0, 1.0);
    assert!((origin.x - 0.1).abs() < 1e-9 && (origin.y - 0.1).abs() < 1e-9);
    assert!((corner.x - 0.3).abs() < 1e-9 && (corner.y - 0.3).abs() < 1e-9);

    st.reset_viewport_src_rect();
    st.set_is_y_inverted(false);
    let flipped = st.texture_matrix() * kurbo::Point::new(0.25, 0.0);
    assert!((flipped.x - 0.25).abs() < 1e-9 && (flipped.y - 1.0).abs() < 1e-9);
}

#[test]
fn paint_without_texture_or_with_empty_clip_does_nothing() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(8, 8).unwrap();

    let mut st = ShapedTexture::new();
    st.set_fallback_size(8, 8);
    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert!(!report.painted);

    let mut st = surface(&mut b, 8, 8);
    st.set_clip_region(Some(Region::new()));
    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert!(!report.painted);
    assert_eq!(b.stats().draws, 0);
}

#[test]
fn unscaled_paint_samples_nearest_and_copies_texels() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(2, 2).unwrap();
    let texture = upload(&mut b, 2, 2, &[RED, GREEN, BLUE, WHITE]);
    let mut st = ShapedTexture::new();
    st.set_texture(Some(texture));

    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert!(report.painted);
    assert!(report.full_paint);
    assert_eq!(report.filter, Some(Filter::Nearest));
    assert_eq!(pixel(&mut b, &fb, 0, 0), RED);
    assert_eq!(pixel(&mut b, &fb, 1, 0), GREEN);
    assert_eq!(pixel(&mut b, &fb, 0, 1), BLUE);
    assert_eq!(pixel(&mut b, &fb, 1, 1), WHITE);
}

#[test]
fn rotated_paint_turns_the_content_clockwise() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(2, 2).unwrap();
    let texture = upload(&mut b, 2, 2, &[RED, GREEN, BLUE, WHITE]);
    let mut st = ShapedTexture::new();
    st.set_texture(Some(texture));
    st.set_transform(MonitorTransform::Rotate90);

    st.paint(&mut PaintContext::new(&mut b, &fb));
    assert_eq!(pixel(&mut b, &fb, 0, 0), BLUE);
    assert_eq!(pixel(&mut b, &fb, 1, 0), RED);
    assert_eq!(pixel(&mut b, &fb, 0, 1), WHITE);
    assert_eq!(pixel(&mut b, &fb, 1, 1), GREEN);
}

#[test]
fn scaled_or_fractional_paints_use_linear_filtering() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(32, 32).unwrap();
    let mut st = surface(&mut b, 8, 8);

    let report = st.paint(
        &mut PaintContext::new(&mut b, &fb).with_allocation(Rect::new(0.0, 0.0, 16.0, 16.0)),
    );
    assert_eq!(report.filter, Some(Filter::Linear));
    assert!(!report.used_mipmap);

    let report = st.paint(
        &mut PaintContext::new(&mut b, &fb).with_transform(Affine::translate((0.5, 0.0))),
    );
    assert_eq!(report.filter, Some(Filter::Linear));

    let report = st.paint(
        &mut PaintContext::new(&mut b, &fb).with_transform(Affine::translate((3.0, 4.0))),
    );
    assert_eq!(report.filter, Some(Filter::Nearest));
}

#[test]
fn opaque_region_splits_the_paint() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(10, 10).unwrap();
    let mut st = surface(&mut b, 10, 10);
    st.set_opaque_region(Some(Region::from_rect(IntRect::new(0, 0, 10, 5))));

    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert_eq!(report.opaque_rects, 1);
    assert_eq!(report.blended_rects, 1);
    assert!(!report.full_paint);
    assert_eq!(report.pipelines_built, 2);
    assert_eq!(
        draw_pipelines(&b),
        ["shaped-texture-unblended", "shaped-texture-unmasked"]
    );

    let Some(DrawCommand::Draw { rect, color, .. }) = b.commands().last() else {
        panic!("expected a draw");
    };
    assert_eq!(rect.rect, Rect::new(0.0, 5.0, 10.0, 10.0));
    assert_eq!(rect.tex_coords, Rect::new(0.0, 0.5, 1.0, 1.0));
    assert_eq!(*color, [1.0; 4]);
}

#[test]
fn oversized_opaque_region_stays_inside_the_surface() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(64, 64).unwrap();
    let mut st = surface(&mut b, 16, 16);
    st.set_opaque_region(Some(Region::from_rect(IntRect::new(0, 0, 32, 32))));

    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert_eq!(report.opaque_rects, 1);
    assert_eq!(report.blended_rects, 0);
    let Some(DrawCommand::Draw { rect, .. }) = b.commands().last() else {
        panic!("expected a draw");
    };
    assert_eq!(rect.rect, Rect::new(0.0, 0.0, 16.0, 16.0));
    assert_eq!(rect.tex_coords, Rect::new(0.0, 0.0, 1.0, 1.0));
    assert_eq!(pixel(&mut b, &fb, 8, 8), RED);
    assert_eq!(pixel(&mut b, &fb, 20, 20), [0; 4]);
}

#[test]
fn oversized_clip_keeps_opaque_pass_inside_the_surface() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(64, 64).unwrap();
    let mut st = surface(&mut b, 16, 16);
    st.set_opaque_region(Some(Region::from_rect(IntRect::new(0, 0, 40, 40))));
    st.set_clip_region(Some(Region::from_rect(IntRect::new(8, 8, 40, 40))));

    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert_eq!(report.opaque_rects, 1);
    assert_eq!(pixel(&mut b, &fb, 12, 12), RED);
    assert_eq!(pixel(&mut b, &fb, 30, 30), [0; 4]);
}

#[test]
fn translucent_paint_ignores_opaque_region() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(10, 10).unwrap();
    let mut st = surface(&mut b, 10, 10);
    st.set_opaque_region(Some(Region::from_rect(IntRect::new(0, 0, 10, 5))));

    let report = st.paint(&mut PaintContext::new(&mut b, &fb).with_opacity(51));
    assert_eq!(report.opaque_rects, 0);
    assert!(report.full_paint);
    let Some(DrawCommand::Draw { color, .. }) = b.commands().last() else {
        panic!("expected a draw");
    };
    assert!((color[0] - 0.2).abs() < 1e-6 && (color[3] - 0.2).abs() < 1e-6);
}

#[test]
fn fragmented_blend_region_falls_back_to_one_paint() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(10, 10).unwrap();
    let settings = CompositorSettings {
        max_blend_rects: 1,
        ..CompositorSettings::default()
    };
    let mut st = ShapedTexture::with_settings(settings);
    st.set_texture(Some(solid(&mut b, 10, 10)));
    st.set_opaque_region(Some(Region::from_rect(IntRect::new(3, 3, 4, 4))));

    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert!(report.split_fallback);
    assert!(report.full_paint);
    assert_eq!(report.opaque_rects, 0);
    assert_eq!(b.stats().draws, 1);
}

#[test]
fn clip_region_limits_blended_rectangles() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(10, 10).unwrap();
    let mut st = surface(&mut b, 10, 10);
    st.set_clip_region(Some(Region::from_rect(IntRect::new(0, 0, 5, 5))));

    let report = st.paint(&mut PaintContext::new(&mut b, &fb));
    assert_eq!(report.blended_rects, 1);
    assert!(!report.full_paint);
    let Some(DrawCommand::Draw { rect, .. }) = b.commands().last() else {
        panic!("expected a draw");
    };
    assert_eq!(rect.rect, Rect::new(0.0, 0.0, 5.0, 5.0));
    assert_eq!(rect.tex_coords, Rect::new(0.0, 0.0, 0.5, 0.5));
    assert_eq!(pixel(&mut b, &fb, 2, 2), RED);
    assert_eq!(pixel(&mut b, &fb, 7, 7), [0; 4]);
}

#[test]
fn clipped_rectangles_scale_into_the_allocation() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(40, 40).unwrap();
    let mut st = surface(&mut b, 10, 10);
    st.set_clip_region(Some(Region::from_rect(IntRect::new(5, 0, 5, 10))));

    st.paint(
        &mut PaintContext::new(&mut b, &fb).with_allocation(Rect::new(10.0, 10.0, 30.0, 30.0)),
    );
    let Some(DrawCommand::Draw { rect, .. }) = b.commands().last() else {
        panic!("expected a draw");
    };
    assert_eq!(rect.rect, Rect::new(20.0, 10.0, 30.0, 30.0));
    assert_eq!(rect.tex_coords, Rect::new(0.5, 0.0, 1.0, 1.0));
}

#[test]
fn pipelines_are_reused_until_state_changes() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(10, 10).unwrap();
    let mut st = surface(&mut b, 10, 10);

    assert_eq!(st.paint(&mut PaintContext::new(&mut b, &fb)).pipelines_built, 1);
    assert_eq!(st.paint(&mut PaintContext::new(&mut b, &fb)).pipelines_built, 0);

    st.set_texture(Some(solid(&mut b, 10, 10)));
    assert_eq!(st.paint(&mut PaintContext::new(&mut b, &fb)).pipelines_built, 0);

    st.set_transform(MonitorTransform::Flipped);
    assert_eq!(st.paint(&mut PaintContext::new(&mut b, &fb)).pipelines_built, 1);
    assert_eq!(st.pipeline_cache().stats().resets, 1);

    st.set_snippet(Some(Snippet::new(
        crate::color::snippet::SnippetHook::LayerFragment,
        "",
        "cogl_layer.rgb = 1.0 - cogl_layer.rgb;",
    )));
    assert_eq!(st.paint(&mut PaintContext::new(&mut b, &fb)).pipelines_built, 1);
    assert_eq!(b.stats().pipelines_created, 3);
}

#[test]
fn mask_texture_selects_masked_pipeline() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(4, 4).unwrap();
    let mut st = surface(&mut b, 4, 4);
    // Resolve the size first; a size change drops the mask.
    assert_eq!(st.dst_size(), (4, 4));
    let mask = b.texture_new_with_size(4, 4, PixelFormat::A8).unwrap();
    st.set_mask_texture(Some(mask.clone()));

    st.paint(&mut PaintContext::new(&mut b, &fb));
    let Some(DrawCommand::Draw {
        pipeline_name,
        textures,
        ..
    }) = b.commands().last()
    else {
        panic!("expected a draw");
    };
    assert_eq!(*pipeline_name, "shaped-texture-masked");
    assert_eq!(textures.len(), 2);
    assert_eq!(textures[1], mask.id());
    // A zeroed mask hides everything.
    assert_eq!(pixel(&mut b, &fb, 1, 1), [0; 4]);
}

#[test]
fn color_state_mismatch_adds_transform_snippet() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(4, 4).unwrap();
    let mut st = surface(&mut b, 4, 4);
    st.set_color_state(ColorState::new(Colorspace::Bt2020, TransferFunction::Pq));

    st.paint(&mut PaintContext::new(&mut b, &fb));
    assert_eq!(st.pipeline_cache().len(), 1);
    st.paint(&mut PaintContext::new(&mut b, &fb).with_target_color_state(
        ColorState::new(Colorspace::Bt2020, TransferFunction::Pq),
    ));
    assert_eq!(st.pipeline_cache().len(), 2);

    let srgb_key = PipelineKey::new(
        PipelineSlot::Unmasked,
        st.color_state(),
        ColorState::SRGB,
    );
    let converting = st.pipeline_cache().get(&srgb_key).cloned().unwrap();
    assert_eq!(converting.desc().fragment_snippets.len(), 1);
}

#[test]
fn downscaled_paint_uses_the_mipmap() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(16, 16).unwrap();
    let mut st = surface(&mut b, 64, 64);

    let report = st.paint(
        &mut PaintContext::new(&mut b, &fb).with_allocation(Rect::new(0.0, 0.0, 16.0, 16.0)),
    );
    assert!(report.used_mipmap);
    assert_eq!(report.filter, Some(Filter::LinearMipmapNearest));
    assert_eq!(draw_pipelines(&b).last(), Some(&"shaped-texture-unmasked-tower"));
    assert_eq!(st.mipmap().stats().renders, 1);
    assert_eq!(pixel(&mut b, &fb, 8, 8), RED);

    st.set_create_mipmaps(false);
    let report = st.paint(
        &mut PaintContext::new(&mut b, &fb).with_allocation(Rect::new(0.0, 0.0, 16.0, 16.0)),
    );
    assert!(!report.used_mipmap);
}

#[test]
fn small_textures_are_not_mipmapped() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(8, 8).unwrap();
    let mut st = surface(&mut b, 6, 6);
    let report = st.paint(
        &mut PaintContext::new(&mut b, &fb).with_allocation(Rect::new(0.0, 0.0, 2.0, 2.0)),
    );
    assert!(!report.used_mipmap);
}

#[test]
fn rapid_updates_pause_mipmapping() {
    let mut b = HeadlessBackend::new();
    let fb = b.onscreen_new(16, 16).unwrap();
    let settings = CompositorSettings {
        min_fast_updates_before_unmipmap: 2,
        ..CompositorSettings::default()
    };
    let start = Instant::now();
    let now = Rc::new(Cell::new(start));
    let mut st = ShapedTexture::with_settings(settings);
    {
        let now = Rc::clone(&now);
        st.set_clock(move || now.get());
    }
    st.set_texture(Some(solid(&mut b, 64, 64)));
    let small = Rect::new(0.0, 0.0, 16.0, 16.0);

    for ms in [0, 10, 20, 30] {
        now.set(start + Duration::from_millis(ms));
        st.update_area(IntRect::new(0, 0, 4, 4));
    }
    let report = st.paint(&mut PaintContext::new(&mut b, &fb).with_allocation(small));
    assert!(!report.used_mipmap);
    assert_eq!(report.filter, Some(Filter::Linear));
    assert_eq!(
        st.remipmap_deadline(),
        Some(start + Duration::from_millis(30 + 199))
    );

    now.set(start + Duration::from_millis(300));
    let report = st.paint(&mut PaintContext::new(&mut b, &fb).with_allocation(small));
    assert!(report.used_mipmap);
    assert_eq!(st.remipmap_deadline(), None);

    // A slow update resets the streak.
    now.set(start + Duration::from_millis(600));
    st.update_area(IntRect::new(0, 0, 4, 4));
    let report = st.paint(&mut PaintContext::new(&mut b, &fb).with_allocation(small));
    assert!(report.used_mipmap);
}
