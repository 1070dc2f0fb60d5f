mod catalog;
mod dispatch;
mod mpv;
mod player;
mod session;
mod tidal;

use clap::Parser;
use dispatch::{Action, Dispatcher};
use player::MpvPlayer;
use std::io::Write;
use tidal_proto::config::Config;
use tidal_proto::context::ContextStore;
use tidal_proto::session::SessionStore;
use tracing::{debug, info, warn};

/// rofi script-mode front end for Tidal playback through mpv.
///
/// rofi runs this once per interaction: with no argument for the first
/// screen, then with the selected row's text.  Rows carrying data hand it
/// back through `ROFI_INFO`.  The argument is free text typed by the user,
/// so there are no flags to collide with it.
#[derive(Debug, Parser)]
#[command(name = "rofi-tidal", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Selected row text, "Back", or a search query.
    #[arg(allow_hyphen_values = true)]
    selection: Option<String>,
}

impl Cli {
    /// Never fails: anything clap rejects is taken verbatim as the selection.
    fn parse_lenient<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        Self::try_parse_from(&args).unwrap_or_else(|e| {
            debug!("cli: {:?}; using raw selection", e.kind());
            Self {
                selection: args.get(1).cloned(),
            }
        })
    }
}

/// stdout is the menu, so logs go to a file.  Any failure here just leaves
/// logging off.
fn init_logging() {
    let data_dir = tidal_proto::platform::data_dir();
    if std::fs::create_dir_all(&data_dir).is_err() {
        return;
    }
    let log_path = data_dir.join("rofi-tidal.log");
    let Ok(log_file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        return;
    };

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "info,rofi_tidal=debug,tidal_proto=debug,hyper_util=warn,reqwest=warn".to_string()
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse_lenient(std::env::args());
    let info = std::env::var("ROFI_INFO").ok();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("config: {} ({:?}); using defaults", e, Config::config_path());
        Config::default()
    });

    let action = Action::decide(cli.selection.as_deref(), info.as_deref());
    info!("rofi-tidal: selection={:?} action={:?}", cli.selection, action);

    let player = MpvPlayer::new(&config.player, config.paths.mpv_socket.clone());
    let contexts = ContextStore::new(config.paths.context_file.clone());

    // Only touch the session cache (and the network) when the action needs it.
    let catalog = if action.needs_catalog() {
        let store = SessionStore::new(config.paths.session_file.clone());
        session::open_catalog(&store, &config.catalog).await
    } else {
        None
    };

    let document = Dispatcher::new(&player, catalog.as_ref(), &contexts, config.catalog.search_limit)
        .run(action)
        .await;

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{}", document)?;
    stdout.flush()?;
    Ok(())
}
