use clap::{Parser, Subcommand};
use mosaic_brush::imaging::{
    BackendError, ImageBackend, Multiplier, Point, Rect, RustBackend, SizePolicy,
    compute_block_size,
};
use mosaic_brush::session::{ReleaseOutcome, Session};
use mosaic_brush::{config, output, scan, workflow};
use std::path::{Path, PathBuf};

/// Size overrides shared by commands that pixelate or report sizes.
#[derive(clap::Args, Clone, Default)]
struct SizeArgs {
    /// Use a fixed cell size (1-100 px) instead of the configured mode
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    custom: Option<u32>,

    /// Multiply the cell size (1-4)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=4))]
    multiplier: Option<u32>,
}

impl SizeArgs {
    fn policy(&self, config: &config::MosaicConfig) -> SizePolicy {
        self.custom
            .map(SizePolicy::custom)
            .unwrap_or_else(|| config.policy())
    }

    fn multiplier(&self, config: &config::MosaicConfig) -> Multiplier {
        Multiplier::new(self.multiplier.unwrap_or(config.mosaic.multiplier))
    }
}

#[derive(Parser)]
#[command(name = "mosaic-brush")]
#[command(about = "Manual block-mosaic redaction for still images")]
#[command(long_about = "\
Manual block-mosaic redaction for still images

Cells follow the FANZA rule by default: once the longer image edge reaches
400 px a cell is 1/100 of it, never smaller than 4 px. Use --custom for a
fixed size and --multiplier to scale either.

Coordinates are image pixels, origin top-left:

  --click X,Y             pixelate the 4x4-cell square around the click
  --drag X1,Y1,X2,Y2      sweep the rectangle with overlapping clicks
  --mask X1,Y1,X2,Y2      confine every edit to this rectangle

Folder workflow (--complete, skip):

  shoot/
  ├── _Completed/photo_1.png   # result, numbered, never overwritten
  ├── _Original/photo.jpg      # source moved here
  └── next.jpg

Run 'mosaic-brush gen-config' to generate a documented mosaic.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing mosaic.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print image dimensions and the cell size that would be used
    Size {
        image: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Pixelate clicks and drags, then save
    Apply {
        image: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
        /// Restrict edits to X1,Y1,X2,Y2
        #[arg(long, value_parser = parse_rect)]
        mask: Option<Rect>,
        /// Click at X,Y (repeatable, applied in order before drags)
        #[arg(long, value_parser = parse_point)]
        click: Vec<Point>,
        /// Drag from X1,Y1 to X2,Y2 (repeatable, applied in order)
        #[arg(long, value_parser = parse_rect)]
        drag: Vec<Rect>,
        /// Output file; the extension picks the format [default: <stem>_<n>.png]
        #[arg(long, conflicts_with = "complete")]
        output: Option<PathBuf>,
        /// Save into the completed folder and move the source to the originals folder
        #[arg(long)]
        complete: bool,
    },
    /// Copy an image unedited into the completed folder and archive it
    Skip { image: PathBuf },
    /// List the images in the folder of IMAGE, in navigation order
    List { image: PathBuf },
    /// Show mosaic metadata embedded in an image
    Inspect { image: PathBuf },
    /// Print a stock mosaic.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Size { image, size } => {
            let config = config::load_config(&cli.config)?;
            let dims = RustBackend::new().identify(&image)?;
            let policy = size.policy(&config);
            let multiplier = size.multiplier(&config);
            let block = multiplier.apply(compute_block_size(policy, dims.height, dims.width));
            output::print_size_report(&image, dims, policy, multiplier, block);
        }
        Command::Apply {
            image,
            size,
            mask,
            click,
            drag,
            output: target,
            complete,
        } => {
            let config = config::load_config(&cli.config)?;
            run_apply(&config, &image, &size, mask, &click, &drag, target, complete)?;
        }
        Command::Skip { image } => {
            let config = config::load_config(&cli.config)?;
            let done = workflow::skip(&image, &config.save)?;
            let mut lines = vec![format!("{}: skipped", display_name(&image))];
            lines.extend(output::format_completed(&image, &done));
            output::print_lines(&lines);
        }
        Command::List { image } => {
            let cursor = scan::FolderCursor::open(&image)?;
            output::print_folder_listing(&cursor);
        }
        Command::Inspect { image } => match RustBackend::new().read_metadata(&image) {
            Ok(meta) => output::print_metadata(&image, meta.as_ref()),
            Err(BackendError::UnsupportedMetadataFormat(format)) => {
                log::warn!("{format:?} files never carry mosaic metadata");
                output::print_metadata(&image, None);
            }
            Err(e) => return Err(e.into()),
        },
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_apply(
    config: &config::MosaicConfig,
    image: &Path,
    size: &SizeArgs,
    mask: Option<Rect>,
    clicks: &[Point],
    drags: &[Rect],
    target: Option<PathBuf>,
    complete: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let loaded = backend.load(image)?;

    let mut settings = config.session_settings();
    settings.policy = size.policy(config);
    settings.multiplier = size.multiplier(config);
    let mut session = Session::new(loaded.buffer, settings)
        .with_reference_point(loaded.metadata.and_then(|m| m.reference_point));

    if let Some(mask) = mask {
        session.begin_mask_selection()?;
        session.press(Point::new(mask.x1, mask.y1))?;
        if let ReleaseOutcome::Unchanged = session.release(Point::new(mask.x2, mask.y2))? {
            log::warn!("mask {mask:?} lies outside the image, ignoring it");
        }
    }

    let mut edits = 0;
    for &p in clicks {
        if session.click(p)? == ReleaseOutcome::Edited {
            edits += 1;
        }
    }
    for r in drags {
        session.press(Point::new(r.x1, r.y1))?;
        if session.release(Point::new(r.x2, r.y2))? == ReleaseOutcome::Edited {
            edits += 1;
        }
    }

    let mut lines =
        output::format_apply_summary(image, edits, session.block_size(), session.mask());
    let metadata = workflow::session_metadata(&session, &config.save);

    if complete {
        let done = workflow::quick_save(&backend, image, session.image(), metadata, &config.save)?;
        lines.extend(output::format_completed(image, &done));
    } else {
        let out = match target {
            Some(path) => path,
            None => workflow::default_save_as_path(image)?,
        };
        let status =
            workflow::save_as(&backend, session.image(), &out, config.save.quality(), metadata)?;
        lines.extend(output::format_saved(image, &out, &status));
    }
    output::print_lines(&lines);
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Initialize `env_logger` from the `-v` count; `RUST_LOG` takes precedence.
fn init_logger(verbose: u8) {
    use std::io::Write;

    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{style}{}{style:#} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn parse_ints<const N: usize>(s: &str) -> Result<[i32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated integers, got {s:?}"));
    }
    let mut out = [0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid coordinate {part:?}: {e}"))?;
    }
    Ok(out)
}

fn parse_point(s: &str) -> Result<Point, String> {
    let [x, y] = parse_ints::<2>(s)?;
    Ok(Point::new(x, y))
}

/// Corners in any order; the rectangle is normalised.
fn parse_rect(s: &str) -> Result<Rect, String> {
    let [x1, y1, x2, y2] = parse_ints::<4>(s)?;
    Ok(Rect::from_corners(Point::new(x1, y1), Point::new(x2, y2)))
}
