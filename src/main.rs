// Entrypoint for the tikplay CLI.
// - Parses arguments, loads the rc file and builds the API client.
// - Dispatches to the submit / ui functions with stdout as output sink.
// - Recoverable network problems are printed by the gateway; only hard
//   failures reach `main`'s `anyhow::Result`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use tikplay::{api::ApiClient, config, identity, submit::SongSubmitter, ui};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// tikplay - play that funky music
#[derive(Parser)]
#[command(name = "tikplay", version, about)]
struct Cli {
    /// Be verbose for the gory details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.tikplayrc)
    #[arg(short, long, global = true, env = "TIKPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Service address as host:port, overrides the configuration file
    #[arg(long, global = true, env = "TIKPLAY_HOST")]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a song
    Play {
        /// Path to file or URL
        #[arg(value_name = "file/url", required = true)]
        files: Vec<OsString>,
    },
    /// Now playing
    Np,
    /// Playlist
    Playlist {
        /// Amount of entries to fetch
        #[arg(default_value_t = 10)]
        n: u32,
    },
    /// Skip song
    Skip,
    /// Clear playlist
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = config::log_filter(cli.verbose);
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let path = cli.config.unwrap_or_else(config::default_path);
    let mut cfg = config::load_or_init(&path, &mut out)?.with_verbose(cli.verbose);
    if let Some(host) = cli.host {
        cfg = cfg.with_host(host);
    }

    let api = ApiClient::new(&cfg.host).context("Failed to build HTTP client")?;

    match cli.command {
        Command::Play { files } => {
            let user = identity::detect().whoami();
            SongSubmitter::new(&api, &cfg, &user).submit(&files, &mut out)?;
        }
        Command::Np => ui::now_playing(&api, &mut out)?,
        Command::Playlist { n } => ui::playlist(&api, n, &mut out)?,
        Command::Skip => ui::skip(&api, &mut out)?,
        Command::Clear => ui::clear(&api, &mut out)?,
    }

    out.flush()?;
    Ok(())
}
