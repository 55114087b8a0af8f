use super::*;

fn close(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 0.01)
}

#[test]
fn simple_format_with_identity_stages_has_no_snippet() {
    assert!(snippet(M::Simple, Coefficients::None, AlphaMode::None).is_none());
    assert!(snippet(M::Simple, Coefficients::Bt709Full, AlphaMode::PremultElectrical).is_none());
    let s = snippet(M::Simple, Coefficients::None, AlphaMode::Straight).unwrap();
    assert!(s.post().contains("color = premultiply (color);"));
    assert!(!s.declarations().contains("to_rgb"));
}

#[test]
fn nv12_chains_sampling_then_coefficients_then_alpha() {
    let s = snippet(M::Nv12, Coefficients::Bt709Limited, AlphaMode::Straight).unwrap();
    assert_eq!(s.hook(), SnippetHook::LayerFragment);
    let post = s.post();
    let sample = post.find("nv12_to_yuva (color)").unwrap();
    let coeffs = post.find("bt709_limited_to_rgb (color)").unwrap();
    let alpha = post.find("premultiply (color)").unwrap();
    assert!(sample < coeffs && coeffs < alpha);
    assert!(post.starts_with("  vec4 color = cogl_layer;"));
    assert!(post.ends_with("  cogl_layer = color;\n"));
    assert!(s.declarations().contains("1.79274"));
}

#[test]
fn yuv_without_coefficients_defaults_to_bt601_limited() {
    let s = snippet(M::Yuv420, Coefficients::None, AlphaMode::None).unwrap();
    assert!(s.post().contains("bt601_limited_to_rgb"));
    assert!(s.declarations().contains("cogl_sampler2"));
}

#[test]
fn every_format_info_is_consistent() {
    for m in MultiTextureFormat::ALL {
        let info = m.info();
        let n = m.n_planes();
        assert!((1..=MAX_TEXTURE_PLANES).contains(&n), "{m}");
        assert_eq!(info.format, m);
        for i in 0..n {
            assert!(info.hsub[i] >= 1 && info.vsub[i] >= 1, "{m} plane {i}");
        }
        if let Some(p) = m.pixel_format() {
            assert_eq!(MultiTextureFormat::from_pixel_format(p), m);
            for i in 0..n {
                assert!(usize::from(info.plane_indices[i]) < p.n_planes(), "{m} plane {i}");
            }
        }
        let _ = snippet(m, Coefficients::None, AlphaMode::None);
    }
    assert_eq!(
        MultiTextureFormat::from_pixel_format(PixelFormat::Rgba8888Pre),
        M::Simple
    );
}

#[test]
fn planar_subsampling_matches_pixel_format_table() {
    for m in MultiTextureFormat::ALL {
        let info = m.info();
        let Some(p) = m.pixel_format() else { continue };
        if p.n_planes() != m.n_planes() {
            continue;
        }
        let pinfo = p.info();
        for i in 0..m.n_planes() {
            let mem = usize::from(info.plane_indices[i]);
            assert_eq!(info.hsub[i], pinfo.hsub[mem], "{m} plane {i}");
            assert_eq!(info.vsub[i], pinfo.vsub[mem], "{m} plane {i}");
        }
    }
}

#[test]
fn yuyv_samples_one_memory_plane_twice() {
    let info = M::Yuyv.info();
    assert_eq!(info.n_planes, 2);
    assert_eq!(info.plane_indices[..2], [0, 0]);
    assert_eq!(info.subformats[..2], [PixelFormat::Rg88, PixelFormat::Bgra8888Pre]);
    assert_eq!(info.hsub[..2], [1, 2]);
}

#[test]
fn yvu_formats_swap_chroma_planes() {
    assert_eq!(M::Yvu420.info().plane_indices, [0, 2, 1]);
    assert_eq!(M::Yuv420.info().plane_indices, [0, 1, 2]);
}

#[test]
fn coefficient_matrices_map_reference_colors() {
    let white_limited = [235.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0];
    let black_limited = [16.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0];
    for c in [
        Coefficients::Bt601Limited,
        Coefficients::Bt709Limited,
        Coefficients::Bt2020Limited,
    ] {
        assert!(close(c.apply(white_limited), [1.0, 1.0, 1.0]), "{c:?}");
        assert!(close(c.apply(black_limited), [0.0, 0.0, 0.0]), "{c:?}");
    }
    for c in [
        Coefficients::Bt601Full,
        Coefficients::Bt709Full,
        Coefficients::Bt2020Full,
    ] {
        assert!(close(c.apply([1.0, 0.5, 0.5]), [1.0, 1.0, 1.0]), "{c:?}");
    }
    // Pure red in BT.709 full range.
    let red = Coefficients::Bt709Full.apply([0.2126, 0.5 - 0.114_572, 1.0]);
    assert!(close(red, [1.0, 0.0, 0.0]), "{red:?}");
}

#[test]
fn identity_coefficients_reorder_gbr() {
    assert_eq!(
        Coefficients::IdentityFull.apply([0.1, 0.2, 0.3]),
        [0.3, 0.1, 0.2]
    );
    let limited = Coefficients::IdentityLimited.apply([16.0 / 255.0, 235.0 / 255.0, 16.0 / 255.0]);
    assert!(close(limited, [0.0, 0.0, 1.0]), "{limited:?}");
    assert!(
        Coefficients::IdentityFull
            .op()
            .source
            .contains("vec4 (yuva.z, yuva.x, yuva.y, yuva.w)")
    );
}

#[test]
fn separate_alpha_planes_resolve_to_straight() {
    assert_eq!(AlphaMode::None.resolve(M::Xrgb8888A8), AlphaMode::Straight);
    assert_eq!(AlphaMode::None.resolve(M::Nv12), AlphaMode::PremultElectrical);
    assert_eq!(
        AlphaMode::PremultElectrical.resolve(M::Rgb565A8),
        AlphaMode::PremultElectrical
    );
    let s = snippet(M::Bgr565A8, Coefficients::None, AlphaMode::None).unwrap();
    assert!(s.post().contains("bgr_a8_to_rgba (color)"));
    assert!(s.post().contains("premultiply (color)"));
    assert!(!s.post().contains("to_rgb (color)"));
}

#[test]
fn names_parse() {
    assert_eq!("nv12".parse::<MultiTextureFormat>().unwrap(), M::Nv12);
    assert_eq!(
        "bt2020-limited".parse::<Coefficients>().unwrap(),
        Coefficients::Bt2020Limited
    );
    assert_eq!("straight".parse::<AlphaMode>().unwrap(), AlphaMode::Straight);
    assert!("bt999".parse::<Coefficients>().is_err());
    assert_eq!(M::Yvu410.plane_format(2, PixelFormat::Any), PixelFormat::G8);
    assert_eq!(
        M::Simple.plane_format(0, PixelFormat::Bgra8888Pre),
        PixelFormat::Bgra8888Pre
    );
}
