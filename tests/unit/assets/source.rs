use std::io::Cursor;

use super::*;

fn png_b64(w: u32, h: u32) -> String {
    let img = RgbImage::from_pixel(w, h, image::Rgb([200, 10, 10]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    STANDARD.encode(out.into_inner())
}

fn fetcher() -> ImageFetcher {
    ImageFetcher::new(Duration::from_secs(2), SizePolicy::default()).unwrap()
}

#[test]
fn parse_classifies_references() {
    assert_eq!(
        ImageSource::parse("data:image/png;base64,QUJD", true).unwrap(),
        ImageSource::DataUrl("QUJD".to_string())
    );
    assert_eq!(
        ImageSource::parse("https://example.com/a.jpg", false).unwrap(),
        ImageSource::Http("https://example.com/a.jpg".to_string())
    );
    assert_eq!(
        ImageSource::parse("HTTP://EXAMPLE.COM/A.JPG", false).unwrap(),
        ImageSource::Http("HTTP://EXAMPLE.COM/A.JPG".to_string())
    );
    assert_eq!(
        ImageSource::parse("  QUJD  ", true).unwrap(),
        ImageSource::Base64("QUJD".to_string())
    );
}

#[test]
fn url_fields_reject_raw_base64() {
    let err = ImageSource::parse("QUJD", false).unwrap_err();
    assert!(matches!(err, KissError::InvalidInput(_)));
}

#[test]
fn data_url_must_be_base64() {
    assert!(ImageSource::parse("data:image/png,rawbytes", true).is_err());
    assert!(ImageSource::parse("data:image/png;base64", true).is_err());
    assert!(ImageSource::parse("   ", true).is_err());
}

#[test]
fn load_accepts_raw_base64_and_data_url() {
    let b64 = png_b64(80, 64);
    let img = fetcher().load(&b64, true).unwrap();
    assert_eq!(img.dimensions(), (80, 64));

    let data_url = format!("data:image/png;base64,{b64}");
    let img = fetcher().load(&data_url, false).unwrap();
    assert_eq!(img.get_pixel(0, 0).0, [200, 10, 10]);
}

#[test]
fn malformed_base64_is_invalid_input() {
    let err = fetcher().load("%%%not-base64%%%", true).unwrap_err();
    assert!(matches!(err, KissError::InvalidInput(_)));
}

#[test]
fn base64_that_is_not_an_image_is_invalid_image() {
    let err = fetcher().load(&STANDARD.encode(b"hello"), true).unwrap_err();
    assert!(matches!(err, KissError::InvalidImage(_)));
}

#[test]
fn base64_with_line_breaks_decodes() {
    assert_eq!(decode_base64("QU\nJD\r\n").unwrap(), b"ABC");
}

#[test]
fn preview_truncates_on_char_boundaries() {
    assert_eq!(preview("abcdef", 3), "abc...");
    assert_eq!(preview("ab", 3), "ab");
    assert_eq!(preview("ééé", 2), "éé...");
}
