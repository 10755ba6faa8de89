use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "refrakt", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trace one ray and print the refraction path as JSON.
    Trace(TraceArgs),
    /// Encode shapes into the count/vertex buffers consumed by the GPU evaluator.
    Encode(EncodeArgs),
    /// Render a preview frame as a PNG.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct TracerArgs {
    /// Maximum number of bounce pairs (default: 10, or REFRAKT_MAX_BOUNCES).
    #[arg(long)]
    max_bounces: Option<usize>,

    /// Which hit normal bends each branch.
    #[arg(long, value_enum, default_value_t = NormalChoice::PerBranch)]
    normals: NormalChoice,
}

#[derive(Parser, Debug)]
struct TraceArgs {
    /// Input shape description JSON.
    #[arg(long)]
    shapes: PathBuf,

    /// Ray origin in shape space, as `x,y` (default: the preview emitter).
    #[arg(long, value_parser = parse_point_arg)]
    emitter: Option<refrakt::Point>,

    /// Point the ray aims at in shape space, as `x,y`.
    #[arg(long, value_parser = parse_point_arg)]
    pointer: refrakt::Point,

    #[command(flatten)]
    tracer: TracerArgs,
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Input shape description JSON.
    #[arg(long)]
    shapes: PathBuf,

    /// Flip y as `extent - y` for bottom-left-origin consumers.
    #[arg(long)]
    flip_y: Option<f32>,

    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input shape description JSON.
    #[arg(long)]
    shapes: PathBuf,

    /// Pointer position in output pixels, as `x,y`.
    #[arg(long, value_parser = parse_point_arg)]
    pointer: refrakt::Point,

    /// Preview settings JSON (missing fields use defaults).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    tracer: TracerArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NormalChoice {
    PerBranch,
    Shared,
}

#[derive(serde::Serialize)]
struct EncodedOutput<'a> {
    layout_version: u32,
    counts_texture: refrakt::TextureDesc,
    vertices_texture: refrakt::TextureDesc,
    #[serde(flatten)]
    buffer: &'a refrakt::FlattenedShapeBuffer,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Trace(args) => cmd_trace(args),
        Command::Encode(args) => cmd_encode(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn parse_point_arg(s: &str) -> Result<refrakt::Point, String> {
    refrakt::parse_point(s).map_err(|e| e.to_string())
}

fn read_shapes(path: &Path) -> anyhow::Result<refrakt::ShapeSet> {
    refrakt::ShapeSet::load(path).with_context(|| format!("load shapes '{}'", path.display()))
}

fn tracer_config(args: &TracerArgs) -> anyhow::Result<refrakt::TracerConfig> {
    let mut config = refrakt::TracerConfig::default().with_env_overrides();
    if let Some(n) = args.max_bounces {
        config.max_bounces = n;
    }
    config.normal_policy = match args.normals {
        NormalChoice::PerBranch => refrakt::NormalPolicy::PerBranch,
        NormalChoice::Shared => refrakt::NormalPolicy::SharedFirstBranch,
    };
    config.validate()?;
    Ok(config)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_trace(args: TraceArgs) -> anyhow::Result<()> {
    let shapes = read_shapes(&args.shapes)?;
    let config = tracer_config(&args.tracer)?;
    let emitter = args
        .emitter
        .unwrap_or(refrakt::PreviewSettings::default().emitter);
    let ray = refrakt::RayState::from_pointer(emitter, args.pointer)?;

    let path = refrakt::trace_refractions(ray, &shapes, &config);
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &path).context("write path JSON")?;
    println!();
    Ok(())
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let shapes = read_shapes(&args.shapes)?;
    let transform = match args.flip_y {
        Some(extent) => refrakt::VertexTransform::FlipY { extent },
        None => refrakt::VertexTransform::Identity,
    };

    let buffer = refrakt::encode_shapes(shapes.shapes(), transform)?;
    let textures = refrakt::ShapeTextures::from_buffer(&buffer)?;
    let output = EncodedOutput {
        layout_version: textures.version,
        counts_texture: textures.counts.desc,
        vertices_texture: textures.vertices.desc,
        buffer: &buffer,
    };

    ensure_parent(&args.out)?;
    let f = File::create(&args.out)
        .with_context(|| format!("create output '{}'", args.out.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), &output)
        .with_context(|| format!("write buffers '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} shapes, {} vertices)",
        args.out.display(),
        buffer.shape_count(),
        buffer.point_count()
    );
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let shapes = read_shapes(&args.shapes)?;
    let config = tracer_config(&args.tracer)?;
    let settings: refrakt::PreviewSettings = match &args.settings {
        Some(path) => {
            let f = File::open(path)
                .with_context(|| format!("open settings '{}'", path.display()))?;
            serde_json::from_reader(BufReader::new(f))
                .with_context(|| format!("parse settings '{}'", path.display()))?
        }
        None => refrakt::PreviewSettings::default(),
    };

    let mut session = refrakt::PreviewSession::new(shapes, config)?;
    let pointer = settings.pixel_to_world(args.pointer);
    let frame = session.frame(pointer, &settings)?;

    ensure_parent(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
