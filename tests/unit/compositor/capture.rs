use super::*;
use crate::gpu::headless::HeadlessBackend;
use crate::texture::multi_texture::MultiTexture;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn quad(b: &mut HeadlessBackend) -> ShapedTexture {
    let data: Vec<u8> = [RED, GREEN, BLUE, WHITE].concat();
    let texture = b
        .texture_new_from_data(2, 2, PixelFormat::Rgba8888Pre, 8, &data)
        .unwrap();
    let mut st = ShapedTexture::new();
    st.set_texture(Some(MultiTexture::new_simple(texture)));
    st
}

#[test]
fn nothing_to_capture_without_texture() {
    let mut b = HeadlessBackend::new();
    let mut st = ShapedTexture::new();
    assert_eq!(st.get_image(&mut b, None).unwrap(), None);
}

#[test]
fn plain_surface_reads_the_texture_directly() {
    let mut b = HeadlessBackend::new();
    let mut st = quad(&mut b);

    let image = st.get_image(&mut b, None).unwrap().unwrap();
    assert_eq!((image.width, image.height, image.stride), (2, 2, 8));
    assert_eq!(image.format, CAPTURE_FORMAT);
    assert_eq!(image.rgba_at(0, 0), Some(RED));
    assert_eq!(image.rgba_at(1, 0), Some(GREEN));
    assert_eq!(image.rgba_at(0, 1), Some(BLUE));
    assert_eq!(image.rgba_at(2, 0), None);
    assert_eq!(b.stats().offscreens_allocated, 0);

    let corner = st
        .get_image(&mut b, Some(IntRect::new(1, 1, 5, 5)))
        .unwrap()
        .unwrap();
    assert_eq!((corner.width, corner.height), (1, 1));
    assert_eq!(corner.rgba_at(0, 0), Some(WHITE));

    assert_eq!(
        st.get_image(&mut b, Some(IntRect::new(4, 4, 2, 2))).unwrap(),
        None
    );
}

#[cfg(target_endian = "little")]
#[test]
fn capture_bytes_are_native_argb32() {
    let mut b = HeadlessBackend::new();
    let mut st = quad(&mut b);
    let image = st.get_image(&mut b, None).unwrap().unwrap();
    assert_eq!(&image.data[0..4], &[0, 0, 255, 255]);
}

#[test]
fn mask_scales_captured_pixels() {
    let mut b = HeadlessBackend::new();
    let mut st = quad(&mut b);
    assert_eq!(st.dst_size(), (2, 2));
    let mask = b
        .texture_new_from_data(2, 2, PixelFormat::A8, 2, &[255, 0, 255, 128])
        .unwrap();
    st.set_mask_texture(Some(mask));

    let image = st.get_image(&mut b, None).unwrap().unwrap();
    assert_eq!(image.rgba_at(0, 0), Some(RED));
    assert_eq!(image.rgba_at(1, 0), Some([0; 4]));
    assert_eq!(image.rgba_at(1, 1), Some([128; 4]));
}

#[test]
fn transformed_surface_is_painted_offscreen() {
    let mut b = HeadlessBackend::new();
    let mut st = quad(&mut b);
    st.set_transform(MonitorTransform::Rotate90);
    let clip = crate::foundation::region::Region::from_rect(IntRect::new(0, 0, 1, 1));
    st.set_clip_region(Some(clip.clone()));

    let image = st.get_image(&mut b, None).unwrap().unwrap();
    assert_eq!(b.stats().offscreens_allocated, 1);
    assert_eq!(image.rgba_at(0, 0), Some(BLUE));
    assert_eq!(image.rgba_at(1, 0), Some(RED));
    assert_eq!(image.rgba_at(1, 1), Some(GREEN));
    assert_eq!(st.clip_region(), Some(&clip));
}

#[test]
fn viewport_crop_is_captured() {
    let mut b = HeadlessBackend::new();
    let pixels: Vec<u8> = (0..16u8).flat_map(|i| [i * 16, 0, 0, 255]).collect();
    let texture = b
        .texture_new_from_data(4, 4, PixelFormat::Rgba8888Pre, 16, &pixels)
        .unwrap();
    let mut st = ShapedTexture::new();
    st.set_texture(Some(MultiTexture::new_simple(texture)));
    st.set_viewport_src_rect(kurbo::Rect::new(2.0, 2.0, 4.0, 4.0))
        .unwrap();

    let image = st.get_image(&mut b, None).unwrap().unwrap();
    assert_eq!((image.width, image.height), (2, 2));
    // Texel (2, 2) is index 10.
    assert_eq!(image.rgba_at(0, 0), Some([160, 0, 0, 255]));
    assert_eq!(image.rgba_at(1, 1), Some([240, 0, 0, 255]));
}

#[test]
fn allocation_failure_is_reported() {
    let mut b = HeadlessBackend::new();
    let mut st = quad(&mut b);
    st.set_transform(MonitorTransform::Flipped);
    b.set_fail_allocations(true);
    let err = st.get_image(&mut b, None).unwrap_err();
    assert!(err.is_allocation());
}
