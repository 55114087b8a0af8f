use super::*;
use crate::{
    color::color_state::{Colorspace, TransferFunction},
    gpu::backend::PipelineDesc,
};

fn build(name: &'static str) -> Pipeline {
    Pipeline::new(PipelineDesc {
        name,
        ..PipelineDesc::default()
    })
}

#[test]
fn hit_returns_the_same_pipeline() {
    let mut cache = PipelineCache::new();
    let key = PipelineKey::new(PipelineSlot::Unmasked, ColorState::SRGB, ColorState::SRGB);
    let a = cache.get_or_build(key, || build("a"));
    let b = cache.get_or_build(key, || panic!("must not rebuild"));
    assert!(a.ptr_eq(&b));
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().builds, 1);
}

#[test]
fn color_states_separate_entries() {
    let mut cache = PipelineCache::new();
    let hdr = ColorState::new(Colorspace::Bt2020, TransferFunction::Pq);
    let sdr = PipelineKey::new(PipelineSlot::Masked, ColorState::SRGB, ColorState::SRGB);
    let to_hdr = PipelineKey::new(PipelineSlot::Masked, ColorState::SRGB, hdr);
    let a = cache.get_or_build(sdr, || build("sdr"));
    let b = cache.get_or_build(to_hdr, || build("hdr"));
    assert!(!a.ptr_eq(&b));
    assert_eq!(cache.len(), 2);
}

#[test]
fn reset_drops_everything() {
    let mut cache = PipelineCache::new();
    for slot in PipelineSlot::ALL {
        cache.get_or_build(
            PipelineKey::new(slot, ColorState::SRGB, ColorState::SRGB),
            || build(slot.name()),
        );
    }
    assert_eq!(cache.len(), 6);
    cache.reset();
    cache.reset();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().resets, 1);
}

#[test]
fn slot_selection() {
    assert_eq!(PipelineSlot::blended(true, true), PipelineSlot::MaskedTower);
    assert_eq!(PipelineSlot::blended(false, false), PipelineSlot::Unmasked);
    assert_eq!(PipelineSlot::unblended(true), PipelineSlot::UnblendedTower);
    assert!(PipelineSlot::UnblendedTower.is_tower());
    assert!(PipelineSlot::UnblendedTower.is_unblended());
    assert!(!PipelineSlot::Unmasked.is_masked());
}
