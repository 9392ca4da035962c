use clap::{Parser, Subcommand};
use rfpages::{AppConfig, AppHandle, HistoryAction};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rfpages", version, about = "Headless page shell with DOM-to-image export")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the menu entries of the route table
    Routes,
    /// Render a path to HTML on stdout
    Render {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Export the capture target of a path to image.jpg
    Export {
        #[arg(default_value = "/about")]
        path: String,
        /// Download directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Upscaling factor
        #[arg(long)]
        scale: Option<f32>,
        /// Title typed into the photo screen
        #[arg(long)]
        title: Option<String>,
        /// Export without waiting for images to load
        #[arg(long)]
        no_wait: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Cmd::Routes => {
            for entry in rfpages::router::app_routes()?.menu() {
                println!("{}\t{}", entry.path, entry.display_label());
            }
        }
        Cmd::Render { path } => {
            let handle = AppHandle::new(config).await?;
            handle.navigate(&path, HistoryAction::Push).await?;
            println!("{}", handle.render_html().await?);
            handle.close().await?;
        }
        Cmd::Export { path, out, scale, title, no_wait } => {
            if let Some(scale) = scale {
                config.capture_scale = scale;
            }
            config.download_dir = Some(out);
            config.validate()?;

            let handle = AppHandle::new(config).await?;
            handle.navigate(&path, HistoryAction::Push).await?;
            if let Some(title) = title {
                handle.set_title(&title).await?;
            }
            let capture = if no_wait {
                handle.export_now().await?
            } else {
                handle.export().await?
            };
            log::info!("wrote {}x{} JPEG", capture.width, capture.height);
            handle.close().await?;
        }
    }
    Ok(())
}
