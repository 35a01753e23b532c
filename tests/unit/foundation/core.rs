use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
    assert_eq!(Fps::whole(24).unwrap(), Fps::default());
}

#[test]
fn fps_frames_to_secs_and_rate_string() {
    let fps = Fps::whole(24).unwrap();
    assert!((fps.frames_to_secs(48) - 2.0).abs() < 1e-12);
    assert_eq!(fps.to_ffmpeg_rate(), "24/1");

    let ntsc = Fps::new(30000, 1001).unwrap();
    assert_eq!(ntsc.to_ffmpeg_rate(), "30000/1001");
    assert!((ntsc.as_f64() - 29.97).abs() < 0.01);
}

#[test]
fn resolution_display_and_parse() {
    assert_eq!(Resolution::default().to_string(), "512x512");
    assert_eq!(
        "640x480".parse::<Resolution>().unwrap(),
        Resolution::new(640, 480)
    );
    assert_eq!(
        "1280*720".parse::<Resolution>().unwrap(),
        Resolution::new(1280, 720)
    );
    assert_eq!("256".parse::<Resolution>().unwrap(), Resolution::square(256));
    assert!("axb".parse::<Resolution>().is_err());
}

#[test]
fn resolution_rgb_len() {
    assert_eq!(Resolution::new(4, 2).rgb_len(), 24);
    assert!(Resolution::new(0, 2).is_empty());
}
