use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pharmaview",
    version,
    about = "Render pharmaceutical category sheets as HTML tables with image links"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan an image tree and write the image-to-URL table.
    Scan(ScanArgs),
    /// Render category sheets as HTML.
    Render(RenderArgs),
    /// Report which workbooks and URL tables are available.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[arg(long)]
    pub image_root: PathBuf,

    /// Directory that hosted paths are relative to; defaults to the parent of the image root.
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Prefix prepended to every relative path, e.g. a raw file host URL.
    #[arg(long)]
    pub base_url: String,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, required_unless_present = "all_categories")]
    pub category: Option<String>,

    #[arg(long, conflicts_with = "all_sheets")]
    pub sheet: Option<String>,

    #[arg(long, default_value_t = false)]
    pub all_sheets: bool,

    /// Render every sheet of every configured category.
    #[arg(long, default_value_t = false, conflicts_with_all = ["category", "sheet"])]
    pub all_categories: bool,

    /// Output file for a single table, or directory when several are rendered.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Wrap output in a complete HTML document.
    #[arg(long, default_value_t = false)]
    pub standalone: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}
