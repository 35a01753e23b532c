use std::sync::Mutex;

use super::*;
use crate::foundation::core::{Fps, Resolution};

struct FakeHost {
    result: Result<String, String>,
    calls: Mutex<Vec<(usize, String)>>,
}

impl FakeHost {
    fn ok(url: &str) -> Self {
        Self {
            result: Ok(url.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(msg: &str) -> Self {
        Self {
            result: Err(msg.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Uploader for std::sync::Arc<FakeHost> {
    fn upload(&self, bytes: &[u8], filename: &str) -> KissResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((bytes.len(), filename.to_string()));
        self.result.clone().map_err(KissError::upload)
    }
}

fn video() -> EncodedVideo {
    EncodedVideo::new(
        b"not really an mp4".to_vec(),
        2,
        Fps::whole(24).unwrap(),
        Resolution::square(512),
    )
}

#[test]
fn base64_is_idempotent_and_decodes_back() {
    let packager = Packager::inline_only();
    let v = video();
    let a = packager.package(&v, OutputFormat::Base64);
    let b = packager.package(&v, OutputFormat::Base64);
    assert_eq!(a, b);
    assert!(a.note.is_none());
    let VideoPayload::Inline { base64 } = a.payload else {
        panic!("expected inline payload");
    };
    assert_eq!(STANDARD.decode(base64).unwrap(), v.bytes());
}

#[test]
fn url_format_reports_hosted_metadata() {
    let host = std::sync::Arc::new(FakeHost::ok("https://files.example/abc"));
    let packager = Packager::with_uploader(Box::new(host.clone()), "1 day");
    let packaged = packager.package(&video(), OutputFormat::Url);

    let VideoPayload::Hosted {
        url,
        filename,
        file_size,
        expires_in,
    } = packaged.payload
    else {
        panic!("expected hosted payload");
    };
    assert_eq!(url, "https://files.example/abc");
    assert!(filename.starts_with("kiss_video_") && filename.ends_with(".mp4"));
    assert_eq!(file_size, video().byte_size());
    assert_eq!(expires_in, "1 day");
    assert_eq!(host.calls.lock().unwrap().len(), 1);
}

#[test]
fn upload_failure_degrades_to_inline_with_note() {
    let host = std::sync::Arc::new(FakeHost::failing("HTTP 503"));
    let packager = Packager::with_uploader(Box::new(host), DEFAULT_UPLOAD_TTL);
    let packaged = packager.package(&video(), OutputFormat::Url);
    assert!(packaged.is_inline());
    let note = packaged.note.unwrap();
    assert!(note.starts_with(UPLOAD_FALLBACK_NOTE));
    assert!(note.contains("HTTP 503"));
}

#[test]
fn url_without_uploader_degrades_too() {
    let packaged = Packager::inline_only().package(&video(), OutputFormat::Url);
    assert!(packaged.is_inline());
    assert!(packaged.note.is_some());
}

#[test]
fn filename_is_content_derived() {
    let v = video();
    let name = video_filename(&v, 1_700_000_000);
    assert_eq!(name, video_filename(&v, 1_700_000_000));
    assert!(name.starts_with("kiss_video_1700000000_"));
    assert_eq!(name.len(), "kiss_video_1700000000_".len() + 8 + ".mp4".len());
}

#[test]
fn output_format_parses_lowercase() {
    let f: OutputFormat = serde_json::from_str("\"url\"").unwrap();
    assert_eq!(f, OutputFormat::Url);
    assert_eq!(OutputFormat::default(), OutputFormat::Base64);
    assert!(serde_json::from_str::<OutputFormat>("\"gif\"").is_err());
}
