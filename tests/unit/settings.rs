use super::*;

#[test]
fn defaults_are_valid() {
    let s = CompositorSettings::default();
    s.validate().unwrap();
    assert_eq!(s.max_blend_rects, 16);
    assert_eq!(s.min_update_interval(), std::time::Duration::from_millis(200));
}

#[test]
fn partial_json_fills_defaults() {
    let s = CompositorSettings::from_json_str(r#"{"create_mipmaps": false}"#).unwrap();
    assert!(!s.create_mipmaps);
    assert_eq!(s.min_mipmap_size, 8);
}

#[test]
fn invalid_values_are_rejected() {
    let err = CompositorSettings::from_json_str(r#"{"max_blend_rects": 0}"#).unwrap_err();
    assert!(err.to_string().contains("max_blend_rects"));
    let err = CompositorSettings::from_json_str(r#"{"mipmap_downscale_threshold": 0.5}"#)
        .unwrap_err();
    assert!(err.to_string().contains("validation error"));
    let err = CompositorSettings::from_json_str(r#"{"bogus": 1}"#).unwrap_err();
    assert!(err.to_string().contains("serialization error"));
}

#[test]
fn missing_file_reports_path() {
    let err = CompositorSettings::from_path(Path::new("/nonexistent/texcomp.json")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/texcomp.json"));
}
