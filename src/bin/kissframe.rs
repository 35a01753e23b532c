use std::{
    fs::File,
    io::{BufReader, Read as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sha2::Digest as _;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kissframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one job payload and print the response JSON.
    Handle(HandleArgs),
    /// Render the deterministic morphing video between two image files.
    Morph(MorphArgs),
    /// Probe an MP4 and decode it back (requires `ffprobe` and `ffmpeg` on PATH).
    Inspect(InspectArgs),
    /// Print model and environment diagnostics.
    Health(HealthArgs),
}

/// Settings shared by `handle` and `health`; unset flags fall back to the environment.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Mounted model cache.
    #[arg(long, env = "MODEL_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Scratch directory for encoder output.
    #[arg(long, env = "TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Inference service URL.
    #[arg(long, env = "INFERENCE_URL")]
    inference_url: Option<String>,

    /// Upload endpoint for `output_format: "url"`.
    #[arg(long, env = "UPLOAD_URL")]
    upload_url: Option<String>,

    /// Square output side in pixels.
    #[arg(long, env = "TARGET_SIZE")]
    size: Option<u32>,
}

#[derive(Args, Debug)]
struct HandleArgs {
    /// Job JSON file; stdin when omitted.
    #[arg(long)]
    job: Option<PathBuf>,

    /// Pretty-print the response.
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct MorphArgs {
    /// Source face image.
    #[arg(long)]
    source: PathBuf,

    /// Target face image.
    #[arg(long)]
    target: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = kissframe::DEFAULT_FRAME_COUNT)]
    frames: u32,

    #[arg(long, default_value_t = kissframe::DEFAULT_FPS)]
    fps: u32,

    /// Output size: `512` for a square or `WxH`.
    #[arg(long, default_value = "512")]
    size: kissframe::Resolution,

    /// Blend curve.
    #[arg(long, value_enum, default_value_t = EaseChoice::HalfCosine)]
    ease: EaseChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EaseChoice {
    Linear,
    HalfCosine,
    CosineLoop,
}

impl From<EaseChoice> for kissframe::Ease {
    fn from(c: EaseChoice) -> Self {
        match c {
            EaseChoice::Linear => Self::Linear,
            EaseChoice::HalfCosine => Self::HalfCosine,
            EaseChoice::CosineLoop => Self::CosineLoop,
        }
    }
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Video to inspect.
    path: PathBuf,
}

#[derive(Args, Debug)]
struct HealthArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Handle(args) => cmd_handle(args),
        Command::Morph(args) => cmd_morph(args),
        Command::Inspect(args) => cmd_inspect(args),
        Command::Health(args) => cmd_health(args),
    }
}

/// Logs go to stderr so stdout carries only the JSON result.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handler_config(args: ConfigArgs) -> kissframe::HandlerConfig {
    let mut config = kissframe::HandlerConfig::from_env();
    if let Some(dir) = args.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(dir) = args.temp_dir {
        config.temp_dir = dir;
    }
    if args.inference_url.is_some() {
        config.inference_url = args.inference_url;
    }
    if args.upload_url.is_some() {
        config.upload_url = args.upload_url;
    }
    if let Some(size) = args.size {
        config.target_size = size;
    }
    config
}

fn cmd_handle(args: HandleArgs) -> anyhow::Result<()> {
    let raw = match &args.job {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read job '{}'", path.display()))?,
        None => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("read job from stdin")?;
            s
        }
    };

    let handler = kissframe::Handler::new(handler_config(args.config))?;
    // Unparsable JSON still gets a response object from the job boundary.
    let payload = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
    let response = handler.handle_value(payload);

    print_json(&response, args.pretty)?;
    if response["status"] == "error" {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_morph(args: MorphArgs) -> anyhow::Result<()> {
    let source = read_image(&args.source)?;
    let target = read_image(&args.target)?;
    let fps = kissframe::Fps::whole(args.fps)?;
    let req = kissframe::AnimationRequest::new(source, target, args.frames, fps)?;

    let video = kissframe::render_morph(
        &req,
        args.size,
        args.ease.into(),
        &kissframe::EncoderOpts::default(),
    )?;

    kissframe::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, video.bytes())
        .with_context(|| format!("write video '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {:.2}s, {} bytes)",
        args.out.display(),
        video.frame_count(),
        video.duration_secs(),
        video.byte_size()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let info = kissframe::probe_video(&args.path)?;
    let frames = kissframe::decode_frames(&info)?;
    let sha = sha256_file(&args.path)?;

    let report = serde_json::json!({
        "path": info.path.display().to_string(),
        "codec": info.codec,
        "resolution": info.resolution.to_string(),
        "fps": info.fps.as_f64(),
        "nb_frames": info.nb_frames,
        "decoded_frames": frames.len(),
        "duration": info.fps.frames_to_secs(frames.len() as u64),
        "sha256": sha,
    });
    print_json(&report, true)
}

fn cmd_health(args: HealthArgs) -> anyhow::Result<()> {
    let handler = kissframe::Handler::new(handler_config(args.config))?;
    let report = handler.health();
    print_json(&serde_json::to_value(&report)?, true)
}

fn read_image(path: &Path) -> anyhow::Result<image::RgbImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let img = kissframe::decode_image(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img)
}

fn print_json(value: &serde_json::Value, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn sha256_file(path: &Path) -> anyhow::Result<String> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = sha2::Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    Ok(out)
}
