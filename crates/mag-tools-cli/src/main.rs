use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use mag_assemble::AssembleOptions;
use mag_async_runtime::{ExportUpdate, Issue, IssueExport};
use mag_render::images::parse_data_uri;
use mag_render::{
    PageDescriptor, PdfSettings, PreviewPipeline, RatioType, RenderConfig, RenderOptions,
    compute_dimensions, page_size_mm,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

mod logger;

#[derive(Parser)]
#[command(name = "magt", about = "Magazine page rendering and PDF export", version)]
struct Cli {
    /// Render configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the pixel size a page setting renders at
    Dims {
        /// Page ratio preset
        #[arg(long, default_value = "a4-portrait", value_enum)]
        ratio: RatioArg,

        /// Margin in mm
        #[arg(long, default_value = "0")]
        margin: f64,

        /// Width in mm (custom ratio only)
        #[arg(long)]
        width_mm: Option<f64>,

        /// Height in mm (custom ratio only)
        #[arg(long)]
        height_mm: Option<f64>,
    },

    /// Render one page descriptor to PNG
    Render {
        /// Page descriptor file (JSON: pageType, pageData, pdfSettings)
        #[arg(short, long)]
        page: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Page number shown in the footer
        #[arg(long, default_value = "1")]
        page_number: u32,

        /// Total page count shown in the footer
        #[arg(long)]
        total_pages: Option<u32>,

        /// Leave the footer off
        #[arg(long)]
        no_footer: bool,
    },

    /// Render a whole issue and assemble it into one PDF
    Export {
        /// Issue file (JSON: title, siteUrl, pages)
        #[arg(short, long)]
        issue: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Document title (defaults to the issue title)
        #[arg(long)]
        title: Option<String>,

        /// JPEG quality of embedded pages (1-100)
        #[arg(long, default_value_t = mag_assemble::DEFAULT_JPEG_QUALITY)]
        quality: u8,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RatioArg {
    Letter,
    A4Portrait,
    A4Landscape,
    #[value(name = "16x9")]
    Widescreen,
    #[value(name = "4x3")]
    Standard,
    Square,
    Custom,
}

impl From<RatioArg> for RatioType {
    fn from(arg: RatioArg) -> Self {
        match arg {
            RatioArg::Letter => Self::Letter,
            RatioArg::A4Portrait => Self::A4Portrait,
            RatioArg::A4Landscape => Self::A4Landscape,
            RatioArg::Widescreen => Self::Widescreen,
            RatioArg::Standard => Self::Standard,
            RatioArg::Square => Self::Square,
            RatioArg::Custom => Self::Custom,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::CliLogger::new(cli.verbose)
        .init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))?;

    match cli.command {
        Commands::Dims {
            ratio,
            margin,
            width_mm,
            height_mm,
        } => {
            let settings = PdfSettings {
                ratio_type: ratio.into(),
                custom_width_mm: width_mm,
                custom_height_mm: height_mm,
                margin_mm: margin,
                ..Default::default()
            };
            let dims = compute_dimensions(&settings)?;
            let (width, height) = page_size_mm(&settings)?;
            println!("Page: {:.1} x {:.1} mm ({})", width, height, settings.ratio_type.as_str());
            println!("  Render size: {} x {} px", dims.render_width, dims.render_height);
            println!("  Margin: {} px", dims.margin_px);
            println!(
                "  Content box: {} x {} px",
                dims.content_width(),
                dims.content_height()
            );
        }

        Commands::Render {
            page,
            output,
            page_number,
            total_pages,
            no_footer,
        } => {
            let pipeline = PreviewPipeline::new(load_config(cli.config.as_deref()).await?)?;
            let descriptor: PageDescriptor = read_json(&page).await?;
            let options = RenderOptions {
                page_number,
                total_pages,
                show_footer: !no_footer,
                ..Default::default()
            };

            let preview = pipeline
                .render_page(&descriptor, &options, &mut |progress: mag_render::RenderProgress| {
                    log::info!("{}", progress.label());
                })
                .await?;

            let (_, png) = parse_data_uri(&preview.encoded_image)
                .ok_or_else(|| anyhow!("Renderer returned a malformed data URI"))?;
            tokio::fs::write(&output, png).await?;

            println!(
                "Rendered {} ({} x {} px) → {}",
                descriptor.page_type,
                preview.width,
                preview.height,
                output.display()
            );
            for link in &preview.links {
                let r = link.source_region;
                println!(
                    "  Link → page {} at ({:.0}, {:.0}) {:.0} x {:.0}",
                    link.destination_page, r.x, r.y, r.width, r.height
                );
            }
        }

        Commands::Export {
            issue,
            output,
            title,
            quality,
        } => {
            let pipeline = PreviewPipeline::new(load_config(cli.config.as_deref()).await?)?;
            let issue = Issue::load(&issue)
                .await
                .with_context(|| format!("Failed to load issue {}", issue.display()))?;
            let options = AssembleOptions {
                title,
                jpeg_quality: quality,
                ..Default::default()
            };

            let (update_tx, mut update_rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(async move {
                while let Some(update) = update_rx.recv().await {
                    match update {
                        ExportUpdate::Progress {
                            operation,
                            current,
                            total,
                        } if total > 0 => println!("[{current}/{total}] {operation}"),
                        ExportUpdate::Progress { operation, .. } => println!("{operation}"),
                        ExportUpdate::PageFailed {
                            page_number,
                            message,
                        } => eprintln!("Page {page_number} failed: {message}"),
                        _ => {}
                    }
                }
            });

            let mut export = IssueExport::new(pipeline, issue);
            let failed = export.render_all(&update_tx).await.len();
            let document = export.assemble(options, &update_tx).await?;
            drop(update_tx);
            printer.await?;

            mag_assemble::save_pdf(&document.bytes, &output).await?;
            println!(
                "Exported {} page(s), {} link(s) → {}",
                document.page_count,
                document.link_count,
                output.display()
            );
            for warning in &document.warnings {
                println!("  Warning: {}", warning);
            }
            if failed > 0 {
                println!("  {} page(s) failed to render", failed);
            }
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(path) => RenderConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RenderConfig::default()),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}
