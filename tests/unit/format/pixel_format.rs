use super::*;

#[test]
fn every_format_answers_every_query() {
    for f in PixelFormat::ALL {
        let n = f.n_planes();
        assert!((1..=MAX_PLANES).contains(&n), "{f}");
        for plane in 0..n {
            let _ = f.bytes_per_pixel(plane);
        }
        let (hsub, vsub) = f.subsampling_factors();
        assert_eq!(hsub.len(), n, "{f}");
        assert_eq!(vsub.len(), n, "{f}");
        assert_eq!(f.subformats().len(), n, "{f}");

        let info = f.info();
        assert_eq!(info.format, f);
        assert_eq!(info.hsub.iter().filter(|s| **s != 0).count(), n, "{f}");
        assert_eq!(info.vsub.iter().filter(|s| **s != 0).count(), n, "{f}");
        let _ = f.is_endian_dependent();
    }
}

#[test]
fn discriminants_are_unique_and_round_trip() {
    let mut seen = std::collections::HashSet::new();
    for f in PixelFormat::ALL {
        assert!(seen.insert(f.as_u32()), "duplicate value for {f}");
        assert_eq!(PixelFormat::from_u32(f.as_u32()), Some(f));
    }
    assert_eq!(PixelFormat::from_u32(0xdead), None);
}

#[test]
fn literal_values_are_stable() {
    assert_eq!(PixelFormat::Any as u32, 0);
    assert_eq!(PixelFormat::A8 as u32, 17);
    assert_eq!(PixelFormat::Rgb565 as u32, 4);
    assert_eq!(PixelFormat::Rgba8888 as u32, 19);
    assert_eq!(PixelFormat::Bgra8888Pre as u32, 179);
    assert_eq!(PixelFormat::Abgr2101010Pre as u32, 253);
    assert_eq!(PixelFormat::Depth24Stencil8 as u32, 771);
    assert_eq!(PixelFormat::Yuyv as u32, 1 << 24);
    assert_eq!(PixelFormat::Nv12 as u32, 14 << 24);
    assert_eq!(PixelFormat::Yvu444 as u32, 29 << 24);
}

#[test]
fn low_nibble_table_matches_single_plane_entries() {
    for f in PixelFormat::ALL {
        if let BppClass::Bytes { bpp, aligned } = f.bpp_class() {
            assert_eq!(f.bytes_per_pixel_plane0(), usize::from(bpp), "{f}");
            let expected = if aligned {
                Alignment::Aligned
            } else {
                Alignment::NotAligned
            };
            assert_eq!(f.alignment(), expected, "{f}");
        }
    }
    assert_eq!(BppClass::from_nibble(7), BppClass::Yuv);
    assert_eq!(BppClass::from_nibble(11), BppClass::Undefined);
    assert_eq!(BppClass::from_nibble(14), BppClass::Undefined);
    assert_eq!(PixelFormat::Depth16.bpp_class(), BppClass::Depth);
    assert_eq!(PixelFormat::Nv12.bpp_class(), BppClass::Undefined);
}

#[test]
fn endianness_follows_alignment() {
    assert!(PixelFormat::Rgba8888.is_endian_dependent());
    assert!(PixelFormat::G8.is_endian_dependent());
    assert!(!PixelFormat::Rgb565.is_endian_dependent());
    assert!(!PixelFormat::Rgba1010102.is_endian_dependent());
    assert!(!PixelFormat::Nv12.is_endian_dependent());
}

#[test]
fn premultiplication_helpers() {
    assert!(PixelFormat::Rgba8888.can_have_premult());
    assert!(!PixelFormat::A8.can_have_premult());
    assert!(!PixelFormat::Rgb888.can_have_premult());
    assert_eq!(
        PixelFormat::Argb8888.to_premultiplied(),
        PixelFormat::Argb8888Pre
    );
    assert_eq!(
        PixelFormat::Rgba5551.to_premultiplied(),
        PixelFormat::Rgba5551Pre
    );
    assert_eq!(PixelFormat::Bgra8888Pre.to_straight(), PixelFormat::Bgra8888);
    assert_eq!(PixelFormat::A8.to_premultiplied(), PixelFormat::A8);
    assert!(PixelFormat::Abgr8888Pre.is_premultiplied());
    assert!(PixelFormat::Rgb565A8.has_alpha());
    assert!(!PixelFormat::Nv12.has_alpha());
}

#[test]
fn flags_are_empty_for_tagged_formats() {
    assert!(PixelFormat::Nv12.flags().is_empty());
    assert_eq!(
        PixelFormat::Abgr8888Pre.flags(),
        PixelFormatFlags::ALPHA
            | PixelFormatFlags::BGR
            | PixelFormatFlags::ALPHA_FIRST
            | PixelFormatFlags::PREMULT
    );
}

#[test]
fn nv12_layout_matches_known_sizes() {
    let layout = PixelFormat::Nv12.plane_layout(64, 64);
    assert_eq!(layout.planes.len(), 2);
    assert_eq!(layout.planes[0].byte_len, 64 * 64);
    assert_eq!(layout.planes[1].width, 32);
    assert_eq!(layout.planes[1].height, 32);
    assert_eq!(layout.planes[1].stride, 64);
    assert_eq!(layout.planes[1].offset, 4096);
    assert_eq!(layout.total_bytes, 6144);
}

#[test]
fn layout_total_is_sum_over_planes() {
    for f in PixelFormat::ALL {
        let (w, h) = (64, 32);
        let info = f.info();
        let expected: usize = (0..f.n_planes())
            .map(|i| {
                (w / usize::from(info.hsub[i]))
                    * (h / usize::from(info.vsub[i]))
                    * usize::from(info.bpp[i])
            })
            .sum();
        assert_eq!(f.plane_layout(w as u32, h as u32).total_bytes, expected, "{f}");
    }
    assert_eq!(PixelFormat::Yuyv.plane_layout(64, 32).total_bytes, 64 * 32 * 2);
    assert_eq!(
        PixelFormat::Yuv420.plane_layout(64, 32).total_bytes,
        64 * 32 * 3 / 2
    );
}

#[test]
#[should_panic(expected = "out of range")]
fn bytes_per_pixel_rejects_missing_plane() {
    let _ = PixelFormat::Rgba8888.bytes_per_pixel(1);
}

#[test]
fn names_parse_and_serialize() {
    assert_eq!("nv12".parse::<PixelFormat>().unwrap(), PixelFormat::Nv12);
    assert_eq!(
        "RGBA_8888_PRE".parse::<PixelFormat>().unwrap(),
        PixelFormat::Rgba8888Pre
    );
    assert!("RGBA_9999".parse::<PixelFormat>().is_err());
    let json = serde_json::to_string(&PixelFormat::Xrgb88888A8).unwrap();
    assert_eq!(json, "\"XRGB88888_A8\"");
    let back: PixelFormat = serde_json::from_str(&json).unwrap();
    assert_eq!(back, PixelFormat::Xrgb88888A8);
}
