#![warn(missing_docs)]
//! Core library for artmap: Wikidata paintings grouped by the places that hold them,
//! rendered as a Leaflet map.

pub mod config;
pub mod grouping;
pub mod identifier;
pub mod pipeline;
pub mod projection;
pub mod query;
pub mod render;

pub use config::{Cli, QuerySettings, RecordSource, RunSettings};
pub use grouping::{group_records, GroupingError, ItemRecords, LocationGroup, LocationGroups};
pub use identifier::extract_id;
pub use pipeline::{run, RunSummary};
pub use projection::{
    parse_point, project, Coordinate, DisplayEntry, FirstWins, LocationDisplay, PointError,
    ProjectionError,
};
pub use query::{build_query, parse_response, QueryClient, QueryError, ResultRecord};
pub use render::{popup_html, MapDocument, MapSettings, RenderError, TileLayer};

/// Prints to stderr when the `debug_logs` feature is enabled.
#[cfg(feature = "debug_logs")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

/// Expands to nothing; build with `debug_logs` for per-record tracing.
#[cfg(not(feature = "debug_logs"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}
