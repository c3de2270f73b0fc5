//! CLI entry point for headless-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "headless-blog")]
#[command(version)]
#[command(about = "A blog generator backed by a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// Generate, then serve the site with on-demand post rendering
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, route)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "headless_blog=debug,info"
    } else {
        "headless_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            headless_blog::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Generate => {
            let blog = headless_blog::Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");
            blog.generate().await?;
            println!("Generated successfully!");
        }

        Commands::Server { port, ip, open } => {
            let blog = headless_blog::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            headless_blog::server::start(&blog, &ip, port, open).await?;
        }

        Commands::Clean => {
            let blog = headless_blog::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let blog = headless_blog::Blog::new(&base_dir)?;
            headless_blog::commands::list::run(&blog, &r#type).await?;
        }

        Commands::Version => {
            println!("headless-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
