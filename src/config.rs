//! Command-line and environment configuration for a map run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use crate::projection::Coordinate;
use crate::query::DEFAULT_ENDPOINT;
use crate::render::{MapSettings, TileLayer};

/// Wikidata id of Vincent van Gogh.
pub const DEFAULT_ARTIST: &str = "Q5582";
/// File written when no output path is given.
pub const DEFAULT_OUTPUT: &str = "vanGogh.html";

/// Where to fetch records from and how to ask for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySettings {
    artist_id: String,
    language: String,
    endpoint: Url,
    timeout: Option<Duration>,
    user_agent: String,
}

impl QuerySettings {
    /// Constructs query settings.
    pub fn new(
        artist_id: String,
        language: String,
        endpoint: Url,
        timeout: Option<Duration>,
        user_agent: String,
    ) -> Self {
        Self {
            artist_id,
            language,
            endpoint,
            timeout,
            user_agent,
        }
    }

    /// Wikidata id of the artist whose paintings are mapped.
    pub fn artist_id(&self) -> &str {
        &self.artist_id
    }

    /// Fallback label language after the endpoint's automatic choice.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// SPARQL endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whole-request timeout; `None` waits until the endpoint answers.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// User-Agent header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Where records come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordSource {
    /// Query the live endpoint.
    Remote,
    /// Replay a saved SPARQL JSON response.
    File(PathBuf),
}

/// Everything one run needs.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSettings {
    /// Query parameters.
    pub query: QuerySettings,
    /// Record origin.
    pub source: RecordSource,
    /// Map presentation.
    pub map: MapSettings,
    /// Output document path.
    pub output: PathBuf,
    /// Suppress progress lines on stderr.
    pub quiet: bool,
}

/// Command-line interface for the `artmap` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "artmap",
    version,
    about = "Map an artist's paintings by the institutions that hold them"
)]
pub struct Cli {
    /// Wikidata id of the artist
    #[arg(long, env = "ARTMAP_ARTIST", default_value = DEFAULT_ARTIST)]
    pub artist: String,

    /// SPARQL endpoint to query
    #[arg(long, env = "ARTMAP_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Fallback language for labels
    #[arg(long, env = "ARTMAP_LANGUAGE", default_value = "en")]
    pub language: String,

    /// Path of the HTML map to write
    #[arg(long, short, env = "ARTMAP_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Saved SPARQL JSON response to render instead of querying the endpoint
    #[arg(long, env = "ARTMAP_INPUT")]
    pub input: Option<PathBuf>,

    /// Seconds to wait for the query response (0 waits indefinitely)
    #[arg(long, env = "ARTMAP_TIMEOUT_SECS", default_value_t = 0)]
    pub timeout_secs: u64,

    /// User-Agent sent to the endpoint
    #[arg(long, env = "ARTMAP_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Initial zoom level
    #[arg(long, env = "ARTMAP_ZOOM_START", default_value_t = 3)]
    pub zoom_start: u8,

    /// Minimum zoom level
    #[arg(long, env = "ARTMAP_MIN_ZOOM", default_value_t = 3)]
    pub min_zoom: u8,

    /// Latitude of the initial map center
    #[arg(long, env = "ARTMAP_CENTER_LAT", default_value_t = 30.0, allow_hyphen_values = true)]
    pub center_lat: f64,

    /// Longitude of the initial map center
    #[arg(long, env = "ARTMAP_CENTER_LON", default_value_t = 0.0, allow_hyphen_values = true)]
    pub center_lon: f64,

    /// Popup width cap in pixels
    #[arg(long, env = "ARTMAP_POPUP_MAX_WIDTH", default_value_t = 500)]
    pub popup_max_width: u32,

    /// Popup height cap in pixels
    #[arg(long, env = "ARTMAP_POPUP_MAX_HEIGHT", default_value_t = 300)]
    pub popup_max_height: u32,

    /// Suppress progress output
    #[arg(long, short, default_value_t = false)]
    pub quiet: bool,
}

impl Cli {
    /// Converts the parsed CLI into validated run settings.
    pub fn build_settings(&self) -> Result<RunSettings> {
        anyhow::ensure!(!self.artist.trim().is_empty(), "artist id is required");
        anyhow::ensure!(
            (-90.0..=90.0).contains(&self.center_lat),
            "center latitude {} is out of range",
            self.center_lat
        );
        anyhow::ensure!(
            (-180.0..=180.0).contains(&self.center_lon),
            "center longitude {} is out of range",
            self.center_lon
        );
        anyhow::ensure!(
            self.min_zoom <= self.zoom_start,
            "minimum zoom {} exceeds starting zoom {}",
            self.min_zoom,
            self.zoom_start
        );
        let endpoint = Url::parse(&self.endpoint)
            .with_context(|| format!("invalid endpoint url {:?}", self.endpoint))?;

        let query = QuerySettings::new(
            self.artist.trim().to_string(),
            self.language.clone(),
            endpoint,
            (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            self.user_agent.clone().unwrap_or_else(default_user_agent),
        );
        let map = MapSettings {
            center: Coordinate {
                latitude: self.center_lat,
                longitude: self.center_lon,
            },
            zoom_start: self.zoom_start,
            min_zoom: self.min_zoom,
            tiles: TileLayer::openstreetmap(),
            popup_max_width: self.popup_max_width,
            popup_max_height: self.popup_max_height,
        };
        let source = match &self.input {
            Some(path) => RecordSource::File(path.clone()),
            None => RecordSource::Remote,
        };
        Ok(RunSettings {
            query,
            source,
            map,
            output: self.output.clone(),
            quiet: self.quiet,
        })
    }
}

fn default_user_agent() -> String {
    format!(
        "{}/{} (+{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        "https://www.wikidata.org/wiki/Wikidata:Data_access"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("artmap").chain(args.iter().copied()))
            .expect("parse cli")
    }

    #[test]
    fn defaults_reproduce_van_gogh_run() {
        let settings = parse(&[]).build_settings().expect("settings");
        assert_eq!(settings.query.artist_id(), "Q5582");
        assert_eq!(settings.query.language(), "en");
        assert_eq!(settings.query.endpoint().as_str(), DEFAULT_ENDPOINT);
        assert_eq!(settings.output, PathBuf::from("vanGogh.html"));
        assert_eq!(settings.source, RecordSource::Remote);
        assert_eq!(settings.map, MapSettings::default());
        assert!(!settings.quiet);
    }

    #[test]
    fn input_switches_to_file_source() {
        let settings = parse(&["--input", "saved.json", "--artist", "Q296"])
            .build_settings()
            .expect("settings");
        assert_eq!(settings.source, RecordSource::File("saved.json".into()));
        assert_eq!(settings.query.artist_id(), "Q296");
    }

    #[test]
    fn negative_center_is_accepted() {
        let settings = parse(&["--center-lat", "-33.9", "--center-lon", "-151.2"])
            .build_settings()
            .expect("settings");
        assert_eq!(settings.map.center.latitude, -33.9);
        assert_eq!(settings.map.center.longitude, -151.2);
    }

    #[test]
    fn timeout_is_off_unless_requested() {
        assert_eq!(parse(&[]).build_settings().expect("settings").query.timeout(), None);
        assert_eq!(
            parse(&["--timeout-secs", "0"])
                .build_settings()
                .expect("settings")
                .query
                .timeout(),
            None
        );
        assert_eq!(
            parse(&["--timeout-secs", "90"])
                .build_settings()
                .expect("settings")
                .query
                .timeout(),
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn rejects_bad_endpoint() {
        assert!(parse(&["--endpoint", "not a url"]).build_settings().is_err());
    }

    #[test]
    fn rejects_min_zoom_above_start() {
        assert!(parse(&["--min-zoom", "5", "--zoom-start", "3"])
            .build_settings()
            .is_err());
    }
}
