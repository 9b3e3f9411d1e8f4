use super::*;
use crate::dtype::DType;
use crate::nn::{Linear, Module, ModuleDict, ReLU, Sequential};
use crate::tensor::Tensor;

fn config(p: f64) -> InjectorConfig {
    InjectorConfig::new()
        .with_probability(p)
        .with_device(Device::Cpu)
        .with_param_names(["weight"])
        .with_seed(42)
}

/// Single layer with 100 weights and 10 biases.
fn layer() -> Linear {
    Linear::with_seed(10, 10, Some(0))
}

fn flipped_bits(before: &Tensor, after: &Tensor) -> u32 {
    before
        .to_bits()
        .iter()
        .zip(after.to_bits())
        .map(|(a, b)| (a ^ b).count_ones())
        .sum()
}

// ==========================================================================
// Construction
// ==========================================================================

#[test]
fn test_new_rejects_invalid_config() {
    for p in [0.0, 1.0, -0.5, 2.0, f64::NAN] {
        let err = Injector::new(config(p)).expect_err("p outside (0, 1)");
        assert!(matches!(err, InjectError::InvalidProbability { .. }));
    }

    let err = Injector::new(config(0.1).with_dtype(DType::F16)).expect_err("f16");
    assert!(matches!(err, InjectError::UnsupportedDType { .. }));

    let mut no_device = config(0.1);
    no_device.device = None;
    assert!(matches!(
        Injector::new(no_device),
        Err(InjectError::DeviceUnspecified)
    ));

    let random = config(0.1).with_error_model(ErrorModel::RandomValue);
    assert!(matches!(
        Injector::new(random),
        Err(InjectError::NotImplemented { .. })
    ));
}

#[test]
fn test_new_initial_state() {
    let injector = Injector::new(config(0.1)).expect("injector");
    assert_eq!(injector.bit_width(), 32);
    assert_eq!(injector.device(), Device::Cpu);
    assert_eq!(injector.maxsize(), 0);
    assert!(injector.error_map().is_none());
    assert!(injector.validate().is_ok());
}

// ==========================================================================
// Size detection
// ==========================================================================

#[test]
fn test_size_detect_uses_largest_target() {
    let mut injector = Injector::new(config(0.1)).expect("injector");
    assert_eq!(injector.errormap_size_detect(&layer()), 100 * 32);
}

#[test]
fn test_size_detect_across_layers() {
    let model = Sequential::new()
        .add(Linear::with_seed(4, 3, Some(0)))
        .add(ReLU::new())
        .add(Linear::with_seed(3, 20, Some(1)));
    let mut injector =
        Injector::new(config(0.1).with_param_names(["weight", "bias"])).expect("injector");
    assert_eq!(injector.errormap_size_detect(&model), 60 * 32);
}

#[test]
fn test_size_detect_no_match() {
    let mut injector =
        Injector::new(config(0.1).with_param_names(["running_mean"])).expect("injector");
    assert_eq!(injector.errormap_size_detect(&layer()), 0);
}

// ==========================================================================
// Injection
// ==========================================================================

#[test]
fn test_inject_leaves_untargeted_params() {
    let mut model = layer();
    let bias_before = model.bias().cloned();
    let mut injector = Injector::new(config(0.5)).expect("injector");

    let report = injector.inject(&mut model).expect("inject");

    assert_eq!(report.params.len(), 1);
    assert_eq!(report.params[0].name, "weight");
    assert_eq!(report.map_len, 3200);
    assert_eq!(model.bias().cloned(), bias_before);
}

#[test]
fn test_inject_tiny_probability_is_a_no_op() {
    let mut model = layer();
    let before = model.weight().clone();
    let mut injector = Injector::new(config(1e-12)).expect("injector");

    let report = injector.inject(&mut model).expect("inject");

    assert_eq!(report.total_flipped_bits(), 0);
    assert_eq!(model.weight().to_bits(), before.to_bits());
}

#[test]
fn test_inject_near_one_flips_almost_everything() {
    let mut model = layer();
    let before = model.weight().clone();
    let mut injector = Injector::new(config(0.999_999)).expect("injector");

    let report = injector.inject(&mut model).expect("inject");
    let flipped = flipped_bits(&before, model.weight());

    assert_eq!(u64::from(flipped), report.total_flipped_bits());
    assert!(flipped >= 3190, "only {flipped} of 3200 bits flipped");
}

#[test]
fn test_report_matches_observed_flips() {
    let mut model = layer();
    let before = model.weight().clone();
    let mut injector = Injector::new(config(0.05)).expect("injector");

    let report = injector.inject(&mut model).expect("inject");

    let weight = report.get("weight").expect("weight report");
    assert_eq!(weight.numel, 100);
    assert_eq!(
        weight.flipped_bits,
        u64::from(flipped_bits(&before, model.weight()))
    );
    assert!(report.observed_bit_error_rate() < 0.2);
}

#[test]
fn test_successive_injections_differ() {
    let mut injector = Injector::new(config(0.1)).expect("injector");

    let mut a = layer();
    let mut b = layer();
    injector.inject(&mut a).expect("first");
    let first_map = injector.error_map().cloned();
    injector.inject(&mut b).expect("second");

    assert_ne!(a.weight().to_bits(), b.weight().to_bits());
    assert_ne!(injector.error_map().cloned(), first_map);
}

#[test]
fn test_seeded_injection_reproducible() {
    let mut a = layer();
    let mut b = layer();
    Injector::new(config(0.1))
        .expect("injector")
        .inject(&mut a)
        .expect("inject");
    Injector::new(config(0.1))
        .expect("injector")
        .inject(&mut b)
        .expect("inject");
    assert_eq!(a.weight().to_bits(), b.weight().to_bits());
}

#[test]
fn test_inject_preserves_shape_and_grad_flag() {
    let mut model = layer();
    let mut injector =
        Injector::new(config(0.3).with_param_names(["weight", "bias"])).expect("injector");

    injector.inject(&mut model).expect("inject");

    assert_eq!(model.weight().shape(), &[10, 10]);
    assert!(model.weight().requires_grad_enabled());
    let bias = model.bias().expect("bias");
    assert_eq!(bias.shape(), &[10]);
    assert!(bias.requires_grad_enabled());
}

#[test]
fn test_inject_refreshes_forward_cache() {
    let mut model = Linear::without_bias(2, 1, Some(0));
    model.set_weight(Tensor::new(&[1.0, 1.0], &[1, 2]));
    let mut injector = Injector::new(config(0.999_999)).expect("injector");

    injector.inject(&mut model).expect("inject");

    let mut expected = Linear::without_bias(2, 1, Some(0));
    expected.set_weight(model.weight().clone());
    let x = Tensor::new(&[0.5, 0.25], &[1, 2]);
    assert_eq!(
        model.forward(&x).to_bits(),
        expected.forward(&x).to_bits()
    );
}

#[test]
fn test_inject_nested_names() {
    let mut model = ModuleDict::new()
        .insert("encoder", Linear::with_seed(8, 4, Some(0)))
        .insert("decoder", Linear::with_seed(4, 8, Some(1)));
    let mut injector = Injector::new(config(0.1)).expect("injector");

    let report = injector.inject(&mut model).expect("inject");

    let names: Vec<&str> = report.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["encoder.weight", "decoder.weight"]);
    assert_eq!(report.map_len, 32 * 32);
}

#[test]
fn test_inject_without_targets() {
    let mut model = layer();
    let before = model.weight().clone();
    let mut injector =
        Injector::new(config(0.5).with_param_names(["gamma"])).expect("injector");

    let report = injector.inject(&mut model).expect("inject");

    assert!(report.params.is_empty());
    assert_eq!(report.map_len, 0);
    assert_eq!(model.weight(), &before);
}

#[test]
fn test_cuda_device_passes_validation_but_fails_inject() {
    let cfg = config(0.1).with_device(Device::Cuda(0));
    let mut injector = Injector::new(cfg).expect("validation only checks presence");
    let err = injector.inject(&mut layer()).expect_err("no cuda backend");
    assert!(matches!(err, InjectError::BackendUnavailable { .. }));
}

// ==========================================================================
// Replay and persistence
// ==========================================================================

#[test]
fn test_apply_without_map() {
    let mut injector = Injector::new(config(0.1)).expect("injector");
    assert!(matches!(
        injector.apply_error_map(&mut layer()),
        Err(InjectError::NoErrorMap)
    ));
}

#[test]
fn test_apply_rejects_small_map() {
    let mut injector = Injector::new(config(0.1)).expect("injector");
    injector.errormap_size_detect(&Linear::with_seed(2, 2, Some(0)));
    injector.generate_error_map().expect("generate");

    let err = injector.apply_error_map(&mut layer()).expect_err("too small");
    assert!(matches!(err, InjectError::ShapeMismatch { .. }));
}

#[test]
fn test_save_before_inject_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let injector = Injector::new(config(0.1)).expect("injector");
    let err = injector
        .save_error_map(dir.path().join("map.safetensors"), false)
        .expect_err("nothing to save");
    assert!(matches!(err, InjectError::NoErrorMap));
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");

    for sparse in [false, true] {
        let path = dir.path().join(format!("map_{sparse}.safetensors"));
        let mut injector = Injector::new(config(0.01)).expect("injector");
        injector.inject(&mut layer()).expect("inject");
        injector.save_error_map(&path, sparse).expect("save");
        let saved = injector.error_map().cloned().expect("map");

        let mut restored = Injector::new(config(0.01).with_seed(7)).expect("injector");
        restored.load_error_map(&path, sparse).expect("load");
        assert_eq!(restored.error_map(), Some(&saved));
    }
}

#[test]
fn test_load_with_wrong_encoding_keeps_current_map() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dense.safetensors");

    let mut injector = Injector::new(config(0.01)).expect("injector");
    injector.inject(&mut layer()).expect("inject");
    injector.save_error_map(&path, false).expect("save");
    let current = injector.error_map().cloned();

    assert!(injector.load_error_map(&path, true).is_err());
    assert_eq!(injector.error_map().cloned(), current);
}

#[test]
fn test_loaded_map_replays_on_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("replay.safetensors");

    let mut source = Injector::new(config(0.2)).expect("injector");
    source.inject(&mut layer()).expect("inject");
    source.save_error_map(&path, true).expect("save");
    let expected_bits = source.error_map().map(ErrorMap::count_ones);

    let mut replay = Injector::new(config(0.2).with_seed(1)).expect("injector");
    replay.load_error_map(&path, true).expect("load");

    // A full-length permutation flips every bit set in the map.
    let mut target = Linear::without_bias(32, 100, Some(3));
    let before = target.weight().clone();
    let report = replay.apply_error_map(&mut target).expect("apply");

    assert_eq!(Some(report.total_flipped_bits()), expected_bits);
    assert_eq!(
        Some(u64::from(flipped_bits(&before, target.weight()))),
        expected_bits
    );
}
