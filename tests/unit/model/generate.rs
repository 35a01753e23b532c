use std::sync::Mutex;

use super::*;

struct Recording {
    lora: bool,
    fail_at: Option<u64>,
    out_size: (u32, u32),
    seen: Mutex<Vec<(String, u64, f32)>>,
}

impl Recording {
    fn new(lora: bool) -> Self {
        Self {
            lora,
            fail_at: None,
            out_size: (32, 32),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl VideoModel for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn has_lora(&self) -> bool {
        self.lora
    }

    fn generate(&self, req: &GenerationRequest) -> KissResult<RgbImage> {
        self.seen
            .lock()
            .unwrap()
            .push((req.prompt.clone(), req.params.seed, req.params.guidance_scale));
        if self.fail_at == Some(req.params.seed) {
            return Err(KissError::generation("out of memory"));
        }
        Ok(RgbImage::from_pixel(
            self.out_size.0,
            self.out_size.1,
            image::Rgb([9, 9, 9]),
        ))
    }
}

fn faces() -> (RgbImage, RgbImage) {
    (
        RgbImage::from_pixel(64, 64, image::Rgb([255, 0, 0])),
        RgbImage::from_pixel(64, 64, image::Rgb([0, 0, 255])),
    )
}

#[test]
fn prompt_ladder_covers_all_stages() {
    assert_eq!(prompt_for(0.0, false), KISS_PROMPTS[0]);
    assert_eq!(prompt_for(0.5, false), KISS_PROMPTS[2]);
    assert_eq!(prompt_for(1.0, false), KISS_PROMPTS[4]);
    assert!(prompt_for(0.0, true).starts_with("k144ing kissing, "));
}

#[test]
fn lora_switches_sampler_settings() {
    let res = Resolution::square(512);
    let base = inference_params(3, res, false);
    assert_eq!(base.seed, 45);
    assert_eq!(base.num_inference_steps, 12);
    assert_eq!(base.guidance_scale, 6.5);
    assert_eq!(base.lora_strength, None);

    let lora = inference_params(0, res, true);
    assert_eq!(lora.guidance_scale, 6.0);
    assert_eq!(lora.flow_shift, Some(5.0));
    assert_eq!(lora.lora_strength, Some(1.0));
}

#[test]
fn control_image_follows_progress() {
    let (a, b) = faces();
    assert_eq!(control_image(&a, &b, 0.1), a);
    assert_eq!(control_image(&a, &b, 0.9), b);
    let mid = control_image(&a, &b, 0.5);
    assert_eq!(mid.get_pixel(0, 0).0, [128, 0, 128]);
}

#[test]
fn frames_are_letterboxed_to_resolution() {
    let (a, b) = faces();
    let model = Recording::new(true);
    let frames = generate_ai_frames(&model, &a, &b, 4, Resolution::square(64)).unwrap();
    assert_eq!(frames.len(), 4);
    assert!(frames.iter().all(|f| f.width == 64 && f.height == 64));

    let seen = model.seen.lock().unwrap();
    let seeds: Vec<u64> = seen.iter().map(|(_, s, _)| *s).collect();
    assert_eq!(seeds, vec![42, 43, 44, 45]);
    assert!(seen.iter().all(|(p, _, g)| p.starts_with(LORA_TRIGGER) && *g == 6.0));
}

#[test]
fn any_failing_frame_fails_the_request() {
    let (a, b) = faces();
    let model = Recording {
        fail_at: Some(43),
        ..Recording::new(false)
    };
    let err = generate_ai_frames(&model, &a, &b, 4, Resolution::square(64)).unwrap_err();
    assert!(err.is_fallback_trigger());
    assert!(err.to_string().contains("frame 2"));
    assert_eq!(model.seen.lock().unwrap().len(), 2);
}

#[test]
fn empty_model_output_is_generation_failure() {
    let (a, b) = faces();
    let model = Recording {
        out_size: (0, 0),
        ..Recording::new(false)
    };
    let err = generate_ai_frames(&model, &a, &b, 2, Resolution::square(64)).unwrap_err();
    assert!(matches!(err, KissError::GenerationFailure(_)));
}

#[test]
fn frame_count_above_cap_is_rejected_before_inference() {
    let (a, b) = faces();
    let model = Recording::new(false);
    let err = generate_ai_frames(&model, &a, &b, u32::MAX, Resolution::square(64)).unwrap_err();
    assert!(matches!(err, KissError::InvalidInput(_)));
    assert!(model.seen.lock().unwrap().is_empty());
}
