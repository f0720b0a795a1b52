/// Server configuration
use crate::error::{Result, ServerError};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use timeuh_core::classify::ExcludeRules;
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_feed")]
    pub feed: FeedSettings,

    #[serde(default = "default_tuneefy")]
    pub tuneefy: TuneefySettings,

    #[serde(default = "default_excludes")]
    pub excludes: ExcludeSettings,

    #[serde(default)]
    pub spotify: SpotifySettings,

    #[serde(default)]
    pub deezer: DeezerSettings,

    #[serde(default = "default_archives")]
    pub archives: ArchiveSettings,

    #[serde(default = "default_site")]
    pub site: SiteSettings,

    #[serde(default = "default_poller")]
    pub poller: PollerSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Absolute URL visitors reach the site at; OAuth redirects are built on it
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Static files served for every non-API path
    #[serde(default)]
    pub web_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedSettings {
    #[serde(default = "default_track_endpoint")]
    pub track_endpoint: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// IANA timezone of the station's clock
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Name that marks station self-promotion in titles and artists
    #[serde(default = "default_station_name")]
    pub station_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TuneefySettings {
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_tuneefy_track_endpoint")]
    pub track_endpoint: String,

    #[serde(default = "default_tuneefy_share_endpoint")]
    pub share_endpoint: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Exclude regexes, matched against the lower-cased field
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExcludeSettings {
    #[serde(default)]
    pub title: Vec<String>,

    #[serde(default)]
    pub album: Vec<String>,

    #[serde(default)]
    pub artist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifySettings {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "default_spotify_accounts_url")]
    pub accounts_url: String,

    #[serde(default = "default_spotify_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeezerSettings {
    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_deezer_connect_url")]
    pub connect_url: String,

    #[serde(default = "default_deezer_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveSettings {
    /// First year covered by a full archive rebuild
    #[serde(default = "default_starting_year")]
    pub starting_year: i32,

    #[serde(default = "default_highlights_per_period")]
    pub highlights_per_period: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteSettings {
    #[serde(default = "default_tracks_per_page")]
    pub tracks_per_page: u32,

    #[serde(default = "default_playlist_prefix")]
    pub playlist_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_archives_interval_secs")]
    pub archives_interval_secs: u64,
}

impl SpotifySettings {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl DeezerSettings {
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.secret.is_empty()
    }
}

impl ServerConfig {
    /// Load configuration, reading `path` (default `config.toml`) when it exists
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from config file if it exists
        let config_path = path.unwrap_or_else(|| PathBuf::from("config.toml"));
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        }

        // Override with environment variables (e.g. TIMEUH_SPOTIFY__CLIENT_ID)
        settings = settings.add_source(
            config::Environment::with_prefix("TIMEUH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.public_url()?;
        self.timezone()?;
        self.exclude_rules()?;

        if self.tuneefy.token.is_empty() {
            tracing::warn!(
                "No tuneefy token configured (TIMEUH_TUNEEFY__TOKEN), link resolution will fail"
            );
        }

        if self.site.tracks_per_page == 0 {
            return Err(ServerError::Config(
                "site.tracks_per_page must be at least 1".to_string(),
            ));
        }

        if self.archives.highlights_per_period == 0 {
            return Err(ServerError::Config(
                "archives.highlights_per_period must be at least 1".to_string(),
            ));
        }

        if self.poller.enabled
            && (self.poller.poll_interval_secs == 0 || self.poller.archives_interval_secs == 0)
        {
            return Err(ServerError::Config(
                "Poller intervals must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    pub fn public_url(&self) -> Result<Url> {
        Url::parse(&self.server.public_url).map_err(|e| {
            ServerError::Config(format!(
                "Invalid public URL '{}': {}",
                self.server.public_url, e
            ))
        })
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.feed
            .timezone
            .parse::<Tz>()
            .map_err(|e| ServerError::Config(format!("Invalid timezone: {}", e)))
    }

    /// Compile the exclude patterns
    pub fn exclude_rules(&self) -> Result<ExcludeRules> {
        Ok(ExcludeRules::compile(
            &self.excludes.title,
            &self.excludes.album,
            &self.excludes.artist,
        )?)
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
        public_url: default_public_url(),
        web_dir: None,
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/timeuh.db".to_string()
}

fn default_feed() -> FeedSettings {
    FeedSettings {
        track_endpoint: default_track_endpoint(),
        timeout_ms: default_timeout_ms(),
        timezone: default_timezone(),
        station_name: default_station_name(),
    }
}

fn default_track_endpoint() -> String {
    "https://www.radiomeuh.com/player/rtdata/tracks.json".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_timezone() -> String {
    "Europe/Paris".to_string()
}

fn default_station_name() -> String {
    "radiomeuh".to_string()
}

fn default_tuneefy() -> TuneefySettings {
    TuneefySettings {
        token: String::new(),
        track_endpoint: default_tuneefy_track_endpoint(),
        share_endpoint: default_tuneefy_share_endpoint(),
        timeout_ms: default_timeout_ms(),
    }
}

fn default_tuneefy_track_endpoint() -> String {
    "https://data.tuneefy.com/v2/search/track/?q=%s&limit=1&aggressive=true".to_string()
}

fn default_tuneefy_share_endpoint() -> String {
    "https://data.tuneefy.com/v2/share/%s".to_string()
}

fn default_excludes() -> ExcludeSettings {
    ExcludeSettings {
        title: vec![
            "moon tapes".to_string(),
            r"dominicale\s+n[0-9]+".to_string(),
            r"session.*#[0-9]+".to_string(),
        ],
        album: vec![r"free your mind n[0-9]+".to_string()],
        artist: vec![],
    }
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_deezer_connect_url() -> String {
    "https://connect.deezer.com/oauth".to_string()
}

fn default_deezer_api_url() -> String {
    "https://api.deezer.com".to_string()
}

fn default_archives() -> ArchiveSettings {
    ArchiveSettings {
        starting_year: default_starting_year(),
        highlights_per_period: default_highlights_per_period(),
    }
}

fn default_starting_year() -> i32 {
    2017
}

fn default_highlights_per_period() -> u32 {
    4
}

fn default_site() -> SiteSettings {
    SiteSettings {
        tracks_per_page: default_tracks_per_page(),
        playlist_prefix: default_playlist_prefix(),
    }
}

fn default_tracks_per_page() -> u32 {
    20
}

fn default_playlist_prefix() -> String {
    "RadioMeuh".to_string()
}

fn default_poller() -> PollerSettings {
    PollerSettings {
        enabled: false,
        poll_interval_secs: default_poll_interval_secs(),
        archives_interval_secs: default_archives_interval_secs(),
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_archives_interval_secs() -> u64 {
    3600
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            accounts_url: default_spotify_accounts_url(),
            api_url: default_spotify_api_url(),
        }
    }
}

impl Default for DeezerSettings {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            secret: String::new(),
            connect_url: default_deezer_connect_url(),
            api_url: default_deezer_api_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            feed: default_feed(),
            tuneefy: default_tuneefy(),
            excludes: default_excludes(),
            spotify: SpotifySettings::default(),
            deezer: DeezerSettings::default(),
            archives: default_archives(),
            site: default_site(),
            poller: default_poller(),
        }
    }
}
