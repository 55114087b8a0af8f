use super::*;

#[test]
fn fourcc_is_little_endian_ascii() {
    assert_eq!(fourcc(b"NV12"), 0x3231_564e);
    assert_eq!(fourcc(b"AR24"), 0x3432_5241);
}

#[test]
fn table_entries_are_unique_and_consistent() {
    let mut seen = std::collections::HashSet::new();
    for info in DrmFormatInfo::all() {
        assert!(seen.insert(info.drm_format), "duplicate {}", info.name);
        match info.multi_texture_format {
            MultiTextureFormat::Simple => {
                assert_eq!(info.pixel_format.n_planes(), 1, "{}", info.name);
            }
            mt => assert_eq!(mt.pixel_format(), Some(info.pixel_format), "{}", info.name),
        }
        if let Some(sub) = info.opaque_substitute {
            let opaque = DrmFormatInfo::lookup(sub).unwrap();
            assert!(opaque.opaque);
            assert_eq!(opaque.pixel_format, info.pixel_format);
        }
    }
}

#[test]
fn shm_legacy_codes_map_to_fourcc_entries() {
    let argb = DrmFormatInfo::from_shm_format(0).unwrap();
    assert_eq!(argb.name, "ARGB8888");
    assert_eq!(argb.texture_format(0), PixelFormat::Bgra8888Pre);
    let xrgb = DrmFormatInfo::from_shm_format(1).unwrap();
    assert!(xrgb.opaque);
    let nv12 = DrmFormatInfo::from_shm_format(fourcc(b"NV12")).unwrap();
    assert_eq!(nv12.texture_format(1), PixelFormat::Rg88);
    assert!(DrmFormatInfo::from_shm_format(fourcc(b"ZZZZ")).is_err());
}

#[test]
fn lookup_by_name() {
    assert_eq!(
        DrmFormatInfo::lookup_name("yuv420").unwrap().multi_texture_format,
        MultiTextureFormat::Yuv420
    );
    assert!(DrmFormatInfo::lookup_name("nope").is_none());
}
