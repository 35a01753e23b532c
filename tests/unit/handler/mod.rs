use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::json;

use super::*;
use crate::model::pipeline::{GenerationRequest, VideoModel};

struct NoModel;

impl ModelLoader for NoModel {
    fn load(&self) -> KissResult<Arc<dyn VideoModel>> {
        Err(KissError::model_unavailable("no weights mounted"))
    }
}

fn handler(name: &str) -> Handler {
    let config = HandlerConfig {
        cache_dir: PathBuf::from("target/unit_handler/models"),
        temp_dir: PathBuf::from("target/unit_handler").join(name),
        ..HandlerConfig::default()
    };
    Handler::with_parts(
        config,
        Arc::new(ModelCache::new()),
        Box::new(NoModel),
        Packager::inline_only(),
    )
    .unwrap()
}

fn png_b64(color: [u8; 3]) -> String {
    let img = RgbImage::from_pixel(64, 64, image::Rgb(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    STANDARD.encode(out.into_inner())
}

#[test]
fn request_defaults() {
    let job: JobRequest = serde_json::from_value(json!({ "input": {} })).unwrap();
    assert!(job.input.use_ai);
    assert!(!job.input.health_check);
    assert_eq!(job.input.frame_count_or(48, 240).unwrap(), 48);
    assert_eq!(job.input.fps_or(24).unwrap(), 24);
    assert!(matches!(
        job.input.image_refs(),
        Err(KissError::InvalidInput(_))
    ));
}

#[test]
fn inline_field_wins_over_url_field() {
    let input: JobInput = serde_json::from_value(json!({
        "source_image": "AAAA",
        "source_image_url": "https://example.com/a.png",
        "target_image_url": "https://example.com/b.png",
    }))
    .unwrap();
    let (s, t) = input.image_refs().unwrap();
    assert_eq!(s.raw, "AAAA");
    assert!(s.allow_raw_base64);
    assert_eq!(t.raw, "https://example.com/b.png");
    assert!(!t.allow_raw_base64);
}

#[test]
fn bad_frame_parameters_are_invalid_input() {
    let input: JobInput = serde_json::from_value(json!({ "num_frames": 1, "fps": 0 })).unwrap();
    assert!(matches!(input.frame_count_or(48, 240), Err(KissError::InvalidInput(_))));
    assert!(matches!(input.fps_or(24), Err(KissError::InvalidInput(_))));
}

#[test]
fn frame_count_is_capped() {
    let input: JobInput = serde_json::from_value(json!({ "num_frames": 241 })).unwrap();
    assert!(matches!(input.frame_count_or(48, 240), Err(KissError::InvalidInput(_))));
    let input: JobInput = serde_json::from_value(json!({ "num_frames": 240 })).unwrap();
    assert_eq!(input.frame_count_or(48, 240).unwrap(), 240);
}

struct Echo;

impl VideoModel for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn has_lora(&self) -> bool {
        false
    }

    fn generate(&self, req: &GenerationRequest) -> KissResult<RgbImage> {
        Ok(req.control_image.clone())
    }
}

struct EchoLoader;

impl ModelLoader for EchoLoader {
    fn load(&self) -> KissResult<Arc<dyn VideoModel>> {
        Ok(Arc::new(Echo))
    }
}

#[test]
fn huge_num_frames_is_an_error_response() {
    let config = HandlerConfig {
        cache_dir: PathBuf::from("target/unit_handler/models"),
        temp_dir: PathBuf::from("target/unit_handler/huge_frames"),
        target_size: 64,
        ..HandlerConfig::default()
    };
    let loaders: [Box<dyn ModelLoader>; 2] = [Box::new(EchoLoader), Box::new(NoModel)];
    for loader in loaders {
        let h = Handler::with_parts(
            config.clone(),
            Arc::new(ModelCache::new()),
            loader,
            Packager::inline_only(),
        )
        .unwrap();
        let out = h.handle_value(json!({
            "input": {
                "source_image": png_b64([255, 0, 0]),
                "target_image": png_b64([0, 0, 255]),
                "num_frames": 4294967295u32,
            }
        }));
        assert_eq!(out["status"], "error");
        assert!(out["error"].as_str().unwrap().contains("num_frames"));
        assert!(out.get("video").is_none());
    }
}

#[test]
fn malformed_payload_yields_error_object() {
    let h = handler("malformed");
    for payload in [json!("just a string"), json!({ "input": { "num_frames": "many" } })] {
        let out = h.handle_value(payload);
        assert_eq!(out["status"], "error");
        assert!(out["error"].as_str().unwrap().contains("invalid job payload"));
        assert!(out.get("video").is_none());
    }
}

#[test]
fn malformed_base64_source_fails_without_video() {
    let h = handler("bad_b64");
    let out = h.handle_value(json!({
        "id": "job-1",
        "input": { "source_image": "%%% not base64 %%%", "target_image": png_b64([0, 0, 255]) }
    }));
    assert_eq!(out["status"], "error");
    assert_eq!(out["id"], "job-1");
    assert!(out["error"].as_str().unwrap().contains("invalid input"));
    assert!(out.get("video").is_none());
    assert!(out.get("fallback_error").is_none());
    assert!(out["processing_time"].as_str().unwrap().ends_with('s'));
}

#[test]
fn raw_base64_in_url_field_is_rejected() {
    let h = handler("url_field");
    let out = h.handle_value(json!({
        "input": { "source_image_url": png_b64([255, 0, 0]), "target_image": png_b64([0, 0, 255]) }
    }));
    assert_eq!(out["status"], "error");
}

#[test]
fn tiny_images_are_rejected() {
    let h = handler("tiny");
    let img = RgbImage::new(8, 8);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    let tiny = STANDARD.encode(out.into_inner());

    let reply = h.handle_value(json!({
        "input": { "source_image": tiny, "target_image": png_b64([0, 0, 255]) }
    }));
    assert_eq!(reply["status"], "error");
}

#[test]
fn health_check_reports_models_and_environment() {
    let h = handler("health");
    let out = h.handle_value(json!({ "input": { "health_check": true } }));
    let status = out["status"].as_str().unwrap();
    assert!(status == "healthy" || status == "unhealthy");
    assert_eq!(out["models_loaded"], false);
    assert_eq!(out["model_validation"]["models_found"], false);
    assert!(out["environment"]["version"].is_string());
    assert!(out["environment"]["ffmpeg_available"].is_boolean());
}

#[test]
fn stages_have_snake_case_names() {
    assert_eq!(Stage::ImagesDecoded.to_string(), "images_decoded");
    assert_eq!(Stage::Packaged.to_string(), "packaged");
}

#[test]
fn processing_time_has_one_decimal() {
    assert_eq!(response::format_elapsed(Duration::from_millis(1234)), "1.2s");
    assert_eq!(response::format_elapsed(Duration::ZERO), "0.0s");
}

#[test]
fn invalid_config_is_rejected() {
    let config = HandlerConfig {
        target_size: 511,
        ..HandlerConfig::default()
    };
    assert!(
        Handler::with_parts(
            config,
            Arc::new(ModelCache::new()),
            Box::new(NoModel),
            Packager::inline_only(),
        )
        .is_err()
    );
}
