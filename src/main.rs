//! pan_share CLI - Save and manage Baidu Netdisk share links.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pan_share::{
    cancel_shared, list_shared, list_shared_paths, save_shared, share_files, PanClient, Session,
};

/// CLI tool for Baidu Netdisk share links.
#[derive(Parser)]
#[command(name = "pan_share")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// BDUSS cookie of the logged-in account.
    #[arg(long, env = "BAIDU_BDUSS", hide_env_values = true)]
    bduss: String,

    /// STOKEN cookie of the logged-in account.
    #[arg(long, env = "BAIDU_STOKEN", hide_env_values = true)]
    stoken: Option<String>,

    /// Netdisk API host.
    #[arg(long, env = "PAN_BASE_URL", hide = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Share files or folders of my netdisk.
    Share {
        /// Absolute paths to share.
        #[arg(required = true)]
        paths: Vec<String>,

        /// Extraction password (4 characters).
        #[arg(long, short = 'p')]
        password: String,

        /// Days the share stays valid, 0 for forever.
        #[arg(long, default_value_t = 0)]
        period: u32,
    },

    /// List my shares.
    Shared {
        /// Hide cancelled and expired shares.
        #[arg(long)]
        available: bool,
    },

    /// Cancel shares.
    Cancel {
        /// Share IDs as shown by `shared`.
        #[arg(required = true)]
        share_ids: Vec<u64>,
    },

    /// Save everything in a share link into my netdisk.
    Save {
        /// Share link.
        url: String,

        /// Absolute destination directory.
        remotedir: String,

        /// Extraction password.
        #[arg(long, short = 'p')]
        password: Option<String>,

        /// Fail instead of asking for a verification code.
        #[arg(long)]
        no_vcode: bool,
    },

    /// List every path in a share link.
    Ls {
        /// Share link.
        url: String,

        /// Extraction password.
        #[arg(long, short = 'p')]
        password: Option<String>,

        /// Fail instead of asking for a verification code.
        #[arg(long)]
        no_vcode: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let session = Session::new(&cli.bduss, cli.stoken.as_deref())
        .context("Failed to set up the netdisk session")?;

    let client = match cli.base_url.as_deref() {
        Some(base_url) => PanClient::with_base_url(base_url, session),
        None => PanClient::new(session),
    }
    .with_vcode_prompt(Box::new(prompt_vcode));

    match cli.command {
        Commands::Share {
            paths,
            password,
            period,
        } => {
            let link = share_files(&client, &paths, &password, period)
                .await
                .with_context(|| format!("Failed to share: {}", paths.join(", ")))?;

            println!("{}", link);
        }

        Commands::Shared { available } => {
            let links = list_shared(&client, !available)
                .await
                .context("Failed to list shares")?;

            if links.is_empty() {
                println!("No shares found.");
            } else {
                println!("{:<12} {:<40} {:<8} {:<12} {}", "ID", "URL", "PWD", "STATE", "PATHS");
                println!("{}", "-".repeat(100));
                for link in links {
                    println!("{}", link);
                }
            }
        }

        Commands::Cancel { share_ids } => {
            cancel_shared(&client, &share_ids)
                .await
                .context("Failed to cancel shares")?;

            println!("Cancelled {} share(s).", share_ids.len());
        }

        Commands::Save {
            url,
            remotedir,
            password,
            no_vcode,
        } => {
            let report = save_shared(&client, &url, &remotedir, password.as_deref(), !no_vcode)
                .await
                .with_context(|| format!("Failed to save {} to {}", url, remotedir))?;

            println!(
                "Done. {} saved, {} already present, {} expanded.",
                report.saved(),
                report.skipped(),
                report.events.len() - report.saved() - report.skipped()
            );
        }

        Commands::Ls {
            url,
            password,
            no_vcode,
        } => {
            let shared_paths = list_shared_paths(&client, &url, password.as_deref(), !no_vcode)
                .await
                .with_context(|| format!("Failed to list share: {}", url))?;

            if shared_paths.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<4} {:<20} {}", "TYPE", "FS_ID", "PATH");
                println!("{}", "-".repeat(100));
                for shared_path in shared_paths {
                    println!("{}", shared_path);
                }
            }
        }
    }

    Ok(())
}

/// Log to stderr so stdout only carries command output.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Ask for the verification code shown at `image_url`.
fn prompt_vcode(image_url: &str) -> Option<String> {
    eprintln!("Verification code required: {}", image_url);
    eprint!("Enter the code: ");
    io::stderr().flush().ok()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;

    let code = line.trim();
    (!code.is_empty()).then(|| code.to_string())
}
