/// Timeuh Machine - radio now-playing history and playlist export
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use timeuh_core::{
    classify::Classifier, schedule, LinkResolver, MissingLinks, PlaylistService, TrackStore,
};
use timeuh_providers::{
    DeezerClient, DeezerConfig, NowPlayingClient, SpotifyClient, SpotifyConfig, TuneefyClient,
    TuneefyConfig,
};
use timeuh_server::{
    api,
    config::ServerConfig,
    jobs::Poller,
    services::{ArchiveService, ExportService, IngestOutcome, IngestService, RepairService},
    state::AppState,
};
use timeuh_storage::SqliteTrackStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "timeuh-server")]
#[command(about = "Radio now-playing history, archives and playlist export", long_about = None)]
struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Fetch the now-playing feed once, or repair stored tracks
    FetchTracks {
        /// Resolve links again for valid tracks that never got any
        #[arg(long)]
        fix_missing: bool,
        /// Read Spotify links from the share page of tracks lacking one
        #[arg(long)]
        fix_spotify: bool,
        /// Read Deezer links from the share page of tracks lacking one
        #[arg(long)]
        fix_deezer: bool,
        /// Only repair tracks started after this date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<NaiveDate>,
    },
    /// Rebuild the archive highlights
    UpdateArchives {
        /// Rebuild every year since the starting year, not only the current one
        #[arg(long)]
        from_all_time: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "timeuh_server=info,timeuh_providers=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ServerConfig::load_from(cli.config)?;
    config.validate()?;

    match cli.command {
        Commands::Serve => {
            serve(config).await?;
        }
        Commands::FetchTracks {
            fix_missing,
            fix_spotify,
            fix_deezer,
            from_date,
        } => {
            let kind = if fix_missing {
                Some(MissingLinks::Tuneefy)
            } else if fix_spotify {
                Some(MissingLinks::Spotify)
            } else if fix_deezer {
                Some(MissingLinks::Deezer)
            } else {
                None
            };
            fetch_tracks(config, kind, from_date).await?;
        }
        Commands::UpdateArchives { from_all_time } => {
            update_archives(config, from_all_time).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn TrackStore>> {
    let pool = timeuh_storage::create_pool(&config.storage.database_url).await?;
    timeuh_storage::run_migrations(&pool).await?;
    tracing::info!("Database connected");

    Ok(Arc::new(SqliteTrackStore::new(
        pool,
        config.archives.highlights_per_period,
    )))
}

fn link_resolver(config: &ServerConfig) -> anyhow::Result<Arc<dyn LinkResolver>> {
    let client = TuneefyClient::new(TuneefyConfig {
        token: config.tuneefy.token.clone(),
        track_endpoint: config.tuneefy.track_endpoint.clone(),
        share_endpoint: config.tuneefy.share_endpoint.clone(),
        timeout: Duration::from_millis(config.tuneefy.timeout_ms),
    })?;
    Ok(Arc::new(client))
}

fn ingest_service(
    config: &ServerConfig,
    store: Arc<dyn TrackStore>,
) -> anyhow::Result<IngestService> {
    let source = NowPlayingClient::new(
        &config.feed.track_endpoint,
        Duration::from_millis(config.feed.timeout_ms),
    )?;
    let classifier = Classifier::new(&config.feed.station_name, config.exclude_rules()?);

    Ok(IngestService::new(
        Arc::new(source),
        link_resolver(config)?,
        store,
        classifier,
        config.timezone()?,
    ))
}

/// Playlist services of the providers with credentials
fn playlist_services(config: &ServerConfig) -> anyhow::Result<Vec<Arc<dyn PlaylistService>>> {
    let mut services: Vec<Arc<dyn PlaylistService>> = Vec::new();

    if config.spotify.is_configured() {
        let mut spotify = SpotifyConfig::new(
            config.spotify.client_id.clone(),
            config.spotify.client_secret.clone(),
        );
        spotify.accounts_url = config.spotify.accounts_url.clone();
        spotify.api_url = config.spotify.api_url.clone();
        services.push(Arc::new(SpotifyClient::new(spotify)?));
    } else {
        tracing::warn!("Spotify credentials missing, Spotify export disabled");
    }

    if config.deezer.is_configured() {
        let mut deezer =
            DeezerConfig::new(config.deezer.app_id.clone(), config.deezer.secret.clone());
        deezer.connect_url = config.deezer.connect_url.clone();
        deezer.api_url = config.deezer.api_url.clone();
        services.push(Arc::new(DeezerClient::new(deezer)?));
    } else {
        tracing::warn!("Deezer credentials missing, Deezer export disabled");
    }

    Ok(services)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Timeuh Machine");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let store = open_store(&config).await?;
    let timezone = config.timezone()?;

    let exports = Arc::new(ExportService::new(
        Arc::clone(&store),
        playlist_services(&config)?,
        config.public_url()?,
        config.site.playlist_prefix.clone(),
    ));

    if config.poller.enabled {
        let poller = Arc::new(Poller::new(
            Arc::new(ingest_service(&config, Arc::clone(&store))?),
            Arc::new(ArchiveService::new(
                Arc::clone(&store),
                config.archives.starting_year,
            )),
            timezone,
            Duration::from_secs(config.poller.poll_interval_secs),
            Duration::from_secs(config.poller.archives_interval_secs),
        ));
        poller.start();
    }

    // Build application state
    let app_state = AppState::new(store, exports, config.site.tracks_per_page, timezone);

    // Build router
    let app = api::create_router(app_state, config.server.web_dir.clone());

    // Create server address
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn fetch_tracks(
    config: ServerConfig,
    kind: Option<MissingLinks>,
    from_date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let store = open_store(&config).await?;

    let Some(kind) = kind else {
        let outcome = ingest_service(&config, store)?.ingest_current().await?;
        match outcome {
            IngestOutcome::Success { inserted, skipped } => {
                println!("Fetched tracks: {} new, {} already known", inserted, skipped);
            }
            IngestOutcome::Failure => println!("Could not reach the now-playing feed"),
            IngestOutcome::BadResponse => println!("The now-playing feed returned a bad response"),
        }
        return Ok(());
    };

    let from = from_date.and_then(|d| d.and_hms_opt(0, 0, 0));
    let report = RepairService::new(link_resolver(&config)?, store)
        .repair(kind, from)
        .await?;

    println!(
        "Repaired tracks: {} updated, {} still missing",
        report.updated, report.remaining
    );

    Ok(())
}

async fn update_archives(config: ServerConfig, from_all_time: bool) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let service = ArchiveService::new(store, config.archives.starting_year);
    let today = schedule::station_now(config.timezone()?).date();

    let slices = if from_all_time {
        service.update_all_time(today).await?
    } else {
        service.update_current(today).await?
    };

    println!("Archives updated: {} slices rebuilt", slices);

    Ok(())
}
