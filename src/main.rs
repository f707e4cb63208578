use anyhow::Result;
use clap::Parser;
use plurkdl::{init_tracing_once, ExportFormat, StopReason, TimelineDownloader, DEFAULT_BASE_URL};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "plurkdl")]
#[command(about = "Download a Plurk user's public timeline to txt / csv / json")]
struct Args {
    /// Plurk username (the handle in https://www.plurk.com/<handle>)
    #[arg(short = 'u', long)]
    username: String,

    /// Output file name without extension (defaults to the username)
    #[arg(short = 'o', long)]
    filename: Option<PathBuf>,

    /// Output format; repeat for several
    #[arg(short = 'f', long = "file-format", required = true, value_parser = ["txt", "csv", "json"])]
    file_format: Vec<String>,

    /// Rewrite the txt output oldest-first with renumbered lines
    #[arg(short = 'r', long)]
    reverse: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Stop after this many pages even if the service keeps answering
    #[arg(long, default_value_t = 50_000)]
    max_pages: u64,

    /// Retries for failed page requests (network errors only)
    #[arg(long, default_value_t = 2)]
    retries: u32,

    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    base_url: String,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    init_tracing_once();
    let args = Args::parse();

    let formats = args
        .file_format
        .iter()
        .map(|s| s.parse::<ExportFormat>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(anyhow::Error::msg)?;
    let base = args.filename.clone().unwrap_or_else(|| PathBuf::from(&args.username));

    let summary = TimelineDownloader::new()
        .handle(&args.username)
        .output_base(&base)
        .formats(formats)
        .reverse(args.reverse)
        .base_url(&args.base_url)
        .request_timeout(Duration::from_secs(args.timeout))
        .max_pages(args.max_pages)
        .retries(args.retries, 500)
        .progress(!args.no_progress)
        .run()?;

    if summary.stop == StopReason::Denied {
        eprintln!("This is a private timeline.");
    }
    for f in &summary.files {
        println!("{}", f.display());
    }
    println!(
        "Done: {} posts from account {} in {} pages ({}){}",
        summary.posts,
        summary.account,
        summary.pages,
        summary.stop,
        if summary.reversed { ", txt reversed" } else { "" }
    );

    Ok(())
}
