use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> HandlerConfig {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    HandlerConfig::from_lookup(|k| vars.get(k).cloned())
}

#[test]
fn defaults_are_valid() {
    let cfg = HandlerConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.frame_count, 48);
    assert_eq!(cfg.ai_frame_count, 24);
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.resolution(), Resolution::square(512));
    assert_eq!(cfg.model_name, "Wan2.1-I2V-14B-720P");
    assert_eq!(cfg.lora_name.as_deref(), Some("kissing-lora"));
    assert_eq!(cfg.fallback_attempts, 2);
}

#[test]
fn environment_overrides_defaults() {
    let cfg = lookup(&[
        ("MODEL_CACHE_DIR", "/mnt/models"),
        ("INFERENCE_URL", "http://gpu:8080/generate"),
        ("UPLOAD_TTL", "1 day"),
        ("FRAME_COUNT", "12"),
        ("FPS", " 30 "),
        ("TARGET_SIZE", "256"),
    ]);
    assert_eq!(cfg.cache_dir, PathBuf::from("/mnt/models"));
    assert_eq!(cfg.inference_url.as_deref(), Some("http://gpu:8080/generate"));
    assert_eq!(cfg.upload_ttl, "1 day");
    assert_eq!(cfg.frame_count, 12);
    assert_eq!(cfg.fps, 30);
    assert_eq!(cfg.target_size, 256);
    assert_eq!(cfg.upload_url, None);
}

#[test]
fn empty_lora_name_disables_lora() {
    assert_eq!(lookup(&[("LORA_NAME", "")]).lora_name, None);
    assert_eq!(
        lookup(&[("LORA_NAME", "other")]).lora_name.as_deref(),
        Some("other")
    );
}

#[test]
fn garbage_numbers_keep_defaults() {
    let cfg = lookup(&[("FRAME_COUNT", "many"), ("FPS", "-1")]);
    assert_eq!(cfg.frame_count, 48);
    assert_eq!(cfg.fps, 24);
}

#[test]
fn validate_rejects_unusable_settings() {
    let bad = [
        lookup(&[("FRAME_COUNT", "1")]),
        lookup(&[("FPS", "0")]),
        lookup(&[("TARGET_SIZE", "511")]),
        lookup(&[("TARGET_SIZE", "0")]),
        lookup(&[("MAX_FRAMES", "1")]),
        lookup(&[("MAX_FRAMES", "100000")]),
        lookup(&[("MAX_FRAMES", "30")]),
    ];
    for cfg in bad {
        assert!(matches!(cfg.validate(), Err(KissError::InvalidInput(_))));
    }
}

#[test]
fn max_frames_reads_environment() {
    assert_eq!(HandlerConfig::default().max_frames, 240);
    let cfg = lookup(&[("MAX_FRAMES", "120"), ("FRAME_COUNT", "96")]);
    assert_eq!(cfg.max_frames, 120);
    cfg.validate().unwrap();
}
