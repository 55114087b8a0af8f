use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "texcomp", version)]
struct Cli {
    /// Log pipeline builds and mipmap renders to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every pixel format with its plane layout.
    Formats(FormatsArgs),
    /// Show how a buffer format is split into sampled planes.
    Planes(PlanesArgs),
    /// Print the conversion shader snippet of a multi-texture format.
    Snippet(SnippetArgs),
    /// Paint a surface described by a scene file on the headless backend.
    Paint(PaintArgs),
}

#[derive(Parser, Debug)]
struct FormatsArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct PlanesArgs {
    /// DRM fourcc name (e.g. NV12) or pixel format name.
    #[arg(long)]
    format: String,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,
}

#[derive(Parser, Debug)]
struct SnippetArgs {
    /// Multi-texture format name (e.g. nv12).
    #[arg(long)]
    format: String,

    #[arg(long, default_value = "none")]
    coefficients: String,

    #[arg(long = "alpha", default_value = "none")]
    alpha_mode: String,
}

#[derive(Parser, Debug)]
struct PaintArgs {
    /// Scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Compositor settings JSON.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Formats(args) => cmd_formats(args),
        Command::Planes(args) => cmd_planes(args),
        Command::Snippet(args) => cmd_snippet(args),
        Command::Paint(args) => cmd_paint(args),
    }
}

#[derive(Serialize)]
struct FormatRow {
    name: &'static str,
    id: u32,
    planes: usize,
    bytes_per_pixel: Vec<usize>,
    has_alpha: bool,
    premultiplied: bool,
    yuv: bool,
}

fn cmd_formats(args: FormatsArgs) -> anyhow::Result<()> {
    let rows: Vec<FormatRow> = texcomp::PixelFormat::ALL
        .iter()
        .map(|&f| FormatRow {
            name: f.name(),
            id: f.as_u32(),
            planes: f.n_planes(),
            bytes_per_pixel: (0..f.n_planes()).map(|p| f.bytes_per_pixel(p)).collect(),
            has_alpha: f.has_alpha(),
            premultiplied: f.is_premultiplied(),
            yuv: f.is_yuv(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in rows {
        println!(
            "{:<16} {:>6}  planes={} bpp={:?}{}{}{}",
            row.name,
            row.id,
            row.planes,
            row.bytes_per_pixel,
            if row.has_alpha { " alpha" } else { "" },
            if row.premultiplied { " premult" } else { "" },
            if row.yuv { " yuv" } else { "" },
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct PlaneRow {
    plane: usize,
    texture_format: texcomp::PixelFormat,
    width: u32,
    height: u32,
}

#[derive(Serialize)]
struct PlanesReport {
    buffer_format: texcomp::PixelFormat,
    multi_texture_format: texcomp::MultiTextureFormat,
    memory: texcomp::format::pixel_format::PlaneLayout,
    sampled: Vec<PlaneRow>,
}

fn resolve_buffer_format(
    name: &str,
) -> anyhow::Result<(texcomp::PixelFormat, texcomp::MultiTextureFormat)> {
    if let Some(drm) = texcomp::DrmFormatInfo::lookup_name(name) {
        return Ok((drm.pixel_format, drm.multi_texture_format));
    }
    let format: texcomp::PixelFormat = name
        .parse()
        .with_context(|| format!("resolve format '{name}'"))?;
    Ok((
        format,
        texcomp::MultiTextureFormat::from_pixel_format(format),
    ))
}

fn cmd_planes(args: PlanesArgs) -> anyhow::Result<()> {
    let (buffer_format, mtf) = resolve_buffer_format(&args.format)?;
    let info = mtf.info();
    let sampled = (0..mtf.n_planes())
        .map(|i| PlaneRow {
            plane: i,
            texture_format: mtf.plane_format(i, buffer_format),
            width: args.width / u32::from(info.hsub[i]),
            height: args.height / u32::from(info.vsub[i]),
        })
        .collect();
    let report = PlanesReport {
        buffer_format,
        multi_texture_format: mtf,
        memory: buffer_format.plane_layout(args.width, args.height),
        sampled,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_snippet(args: SnippetArgs) -> anyhow::Result<()> {
    let format: texcomp::MultiTextureFormat = args.format.parse()?;
    let coefficients: texcomp::Coefficients = args.coefficients.parse()?;
    let alpha_mode: texcomp::AlphaMode = args.alpha_mode.parse()?;
    match texcomp::format::multi_texture_format::snippet(format, coefficients, alpha_mode) {
        Some(snippet) => println!("{}", snippet.to_source()),
        None => eprintln!("{format} needs no conversion"),
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scene {
    output: OutputDesc,
    surface: SurfaceDesc,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputDesc {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SurfaceDesc {
    /// DRM fourcc name of the client buffer.
    format: String,
    width: u32,
    height: u32,
    /// Every byte of the generated buffer.
    #[serde(default = "default_fill")]
    fill: u8,
    #[serde(default)]
    transform: texcomp::MonitorTransform,
    #[serde(default = "default_scale")]
    buffer_scale: i32,
    #[serde(default)]
    viewport_src: Option<[f64; 4]>,
    #[serde(default)]
    viewport_dst: Option<[i32; 2]>,
    #[serde(default)]
    opaque_region: Option<texcomp::Region>,
    #[serde(default)]
    clip_region: Option<texcomp::Region>,
    #[serde(default = "default_opacity")]
    opacity: u8,
    /// `[x0, y0, x1, y1]` in output pixels.
    #[serde(default)]
    allocation: Option<[f64; 4]>,
    #[serde(default)]
    coefficients: texcomp::Coefficients,
    #[serde(default)]
    alpha_mode: texcomp::AlphaMode,
    #[serde(default)]
    color_state: texcomp::ColorState,
}

fn default_fill() -> u8 {
    0xff
}

fn default_scale() -> i32 {
    1
}

fn default_opacity() -> u8 {
    255
}

#[derive(Serialize)]
struct PaintOutput {
    dst_size: (i32, i32),
    report: texcomp::PaintReport,
    commands: Vec<texcomp::gpu::headless::DrawCommand>,
}

fn read_scene(path: &Path) -> anyhow::Result<Scene> {
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let scene: Scene =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse scene JSON")?;
    Ok(scene)
}

fn cmd_paint(args: PaintArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.scene)?;
    let settings = match &args.settings {
        Some(path) => texcomp::CompositorSettings::from_path(path)?,
        None => texcomp::CompositorSettings::default(),
    };

    let desc = &scene.surface;
    let drm = texcomp::DrmFormatInfo::lookup_name(&desc.format)
        .with_context(|| format!("unknown DRM format '{}'", desc.format))?;
    anyhow::ensure!(desc.buffer_scale >= 1, "buffer_scale must be at least 1");

    let mut backend = texcomp::HeadlessBackend::new();
    let stride = desc.width as usize * drm.pixel_format.bytes_per_pixel(0);
    let layout = drm.pixel_format.plane_layout(desc.width, desc.height);
    let data = vec![desc.fill; layout.total_bytes.max(stride * desc.height as usize)];
    let texture = texcomp::MultiTexture::from_shm(
        &mut backend,
        drm,
        desc.width,
        desc.height,
        stride,
        &data,
    )
    .with_context(|| format!("upload {} buffer", drm.name))?;

    let mut surface = texcomp::ShapedTexture::with_settings(settings);
    surface.set_texture(Some(texture));
    surface.set_transform(desc.transform);
    surface.set_buffer_scale(desc.buffer_scale);
    surface.set_color_representation(desc.coefficients, desc.alpha_mode);
    surface.set_color_state(desc.color_state);
    if let Some([x0, y0, x1, y1]) = desc.viewport_src {
        surface.set_viewport_src_rect(kurbo::Rect::new(x0, y0, x1, y1))?;
    }
    if let Some([w, h]) = desc.viewport_dst {
        surface.set_viewport_dst_size(w, h)?;
    }
    surface.set_opaque_region(desc.opaque_region.clone());
    surface.set_clip_region(desc.clip_region.clone());

    let framebuffer = backend
        .onscreen_new(scene.output.width, scene.output.height)
        .with_context(|| "allocate output framebuffer")?;
    backend.take_commands();

    let mut ctx = texcomp::PaintContext::new(&mut backend, &framebuffer).with_opacity(desc.opacity);
    if let Some([x0, y0, x1, y1]) = desc.allocation {
        ctx = ctx.with_allocation(kurbo::Rect::new(x0, y0, x1, y1));
    }
    let report = surface.paint(&mut ctx);

    let output = PaintOutput {
        dst_size: surface.dst_size(),
        report,
        commands: backend.take_commands(),
    };
    let json = serde_json::to_string_pretty(&output)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("write report '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
