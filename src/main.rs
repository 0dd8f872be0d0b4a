//! Binary entrypoint for the photo gallery.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use photo_lightbox::catalog::{Catalog, ScanOptions};
use photo_lightbox::config::Configuration;
use photo_lightbox::events::{DecodeRequest, Frame, LightboxInput, LoaderEvent};
use photo_lightbox::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "photo-lightbox",
    version,
    about = "Photo grid with a swipeable lightbox"
)]
struct Args {
    /// Path to YAML config
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,
    /// Gallery directory; overrides photo-library-path
    #[arg(long, value_name = "DIR")]
    photos: Option<PathBuf>,
    /// Scan subdirectories too
    #[arg(long)]
    recursive: bool,
    /// Print the catalog in navigation order without opening a window
    #[arg(long)]
    list: bool,
    /// Refuse navigation-stack markers, as a sandboxed host would
    #[arg(long = "no-history")]
    no_history: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "photo_lightbox=debug,info",
        _ => "photo_lightbox=trace,debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .compact()
        .init();
}

fn load_configuration(args: &Args) -> Result<Configuration> {
    let mut cfg = if args.config.exists() {
        Configuration::from_yaml_file(&args.config).with_context(|| {
            format!(
                "failed to load configuration from {}",
                args.config.display()
            )
        })?
    } else if args.photos.is_some() {
        tracing::debug!(
            "{} not found; using default configuration",
            args.config.display()
        );
        Configuration::default()
    } else {
        bail!(
            "configuration file {} not found (pass --photos to run without one)",
            args.config.display()
        );
    };
    if let Some(dir) = args.photos.clone() {
        cfg.photo_library_path = dir;
    }
    if args.no_history {
        cfg.history.enabled = false;
    }
    cfg.validated().context("invalid configuration values")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cfg = load_configuration(&args)?;
    tracing::debug!("configuration:\n{:#?}", cfg);

    let opts = ScanOptions {
        recursive: args.recursive,
        ..ScanOptions::default()
    };
    let catalog = Catalog::scan(&cfg.photo_library_path, &opts)
        .with_context(|| format!("failed to scan {}", cfg.photo_library_path.display()))?;
    let catalog = Catalog::install(catalog);
    tracing::info!(
        count = catalog.len(),
        dir = %cfg.photo_library_path.display(),
        "image catalog ready"
    );

    if args.list {
        if catalog.is_empty() {
            println!(
                "(no images under {})",
                cfg.photo_library_path.display()
            );
        }
        for image in catalog.iter() {
            println!("{:>4}: {}", image.ordinal(), image.path().display());
        }
        return Ok(());
    }

    // Channels (small/bounded)
    let (input_tx, input_rx) = mpsc::channel::<LightboxInput>(64); // Viewer -> Lightbox
    let (frame_tx, frame_rx) = mpsc::channel::<Frame>(16); // Lightbox -> Viewer
    let (decode_tx, decode_rx) = mpsc::channel::<DecodeRequest>(32); // Viewer -> Loader
    let (loaded_tx, loaded_rx) = mpsc::channel::<LoaderEvent>(8); // Loader -> Viewer

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // Lightbox
    tasks.spawn({
        let cancel = cancel.clone();
        let lightbox_cfg = cfg.lightbox.clone();
        let history_cfg = cfg.history.clone();
        let catalog_len = catalog.len();
        async move {
            tasks::lightbox::run(
                input_rx,
                frame_tx,
                cancel,
                catalog_len,
                lightbox_cfg,
                history_cfg,
            )
            .await
            .context("lightbox task failed")
        }
    });

    // Loader
    tasks.spawn({
        let cancel = cancel.clone();
        let max_in_flight = cfg.loader.max_concurrent_decodes;
        async move {
            tasks::loader::run(decode_rx, loaded_tx, cancel, max_in_flight)
                .await
                .context("loader task failed")
        }
    });

    // The window owns the main thread until it closes or cancellation fires
    if let Err(e) = tasks::viewer::run_windowed(
        frame_rx,
        loaded_rx,
        input_tx,
        decode_tx,
        cancel.clone(),
        cfg,
        catalog,
    )
    .context("viewer failed")
    {
        tracing::error!("{e:?}");
    }
    cancel.cancel();

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}
