mod app;
mod config;
mod lyrics;
mod spotify;
mod theme;

use anyhow::Context;
use clap::{Parser, Subcommand};
use spotify::auth::{self, Credentials};
use spotify::{PlaybackSource, SpotifyClient};

#[derive(Debug, Parser)]
#[command(name = "chorus", version, about = "Synced Spotify lyrics in your terminal")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Track the playback session and stream synced lyrics (default).
    Run,
    /// Authorize with Spotify (paste the redirect URL back).
    Login,
    /// Print the current playback snapshot and exit.
    Status,
    /// Print the config file path.
    ConfigPath,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let client = make_client(&cfg)?;
            if !client.has_token().await {
                anyhow::bail!("not authenticated, run `chorus login` first");
            }
            app::run(cfg, client).await?;
        }
        Command::Login => {
            let client = make_client(&cfg)?;
            let creds = resolve_creds(&cfg)?;
            println!("Open this URL, authorize, then paste the redirect URL back:");
            println!("{}", auth::authorize_url(&creds.client_id));
            print!("> ");
            use std::io::Write;
            std::io::stdout().flush().ok();

            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .context("read redirect url")?;
            let code = auth::code_from_redirect(line.trim())
                .context("no code parameter in pasted URL")?;
            client.login_with_code(code).await.context("token exchange")?;
            println!("Authenticated.");
        }
        Command::Status => {
            let client = make_client(&cfg)?;
            match client.current_playback().await? {
                Some(state) => {
                    let marker = if state.is_playing { ">" } else { "||" };
                    println!(
                        "{marker} {} - {} [{}/{}]",
                        state.artist_name,
                        state.track_name,
                        format_time(state.progress_ms),
                        format_time(state.duration_ms),
                    );
                }
                None => println!("Nothing playing."),
            }
        }
        Command::ConfigPath => {
            let path = match cli.config {
                Some(p) => p,
                None => config::default_config_path()?,
            };
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn resolve_creds(cfg: &config::Config) -> anyhow::Result<Credentials> {
    Credentials::resolve(
        cfg.spotify.client_id.as_deref(),
        cfg.spotify.client_secret.as_deref(),
    )
}

fn make_client(cfg: &config::Config) -> anyhow::Result<SpotifyClient> {
    let creds = resolve_creds(cfg)?;
    let http = app::http_client()?;
    SpotifyClient::new(http, creds, cfg.token_path())
}

fn format_time(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}
