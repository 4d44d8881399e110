//! Leaflet map document assembly.
//!
//! The rendered file is self-contained apart from the Leaflet assets and base tiles,
//! which the browser fetches when the page is opened.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::projection::{Coordinate, LocationDisplay};

const LEAFLET_VERSION: &str = "1.9.4";

/// Base tile layer drawn under the markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    /// URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    /// Attribution HTML shown in the corner of the map.
    pub attribution: String,
}

impl TileLayer {
    /// Standard OpenStreetMap tiles.
    pub fn openstreetmap() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution:
                "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
                    .to_string(),
        }
    }
}

/// Viewport and popup presentation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Initial map center.
    pub center: Coordinate,
    /// Initial zoom level.
    pub zoom_start: u8,
    /// Lowest zoom level the viewer may reach.
    pub min_zoom: u8,
    /// Base tiles.
    pub tiles: TileLayer,
    /// Popup width cap in pixels.
    pub popup_max_width: u32,
    /// Popup height cap in pixels; taller content scrolls.
    pub popup_max_height: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        // Most collections sit in the northern hemisphere.
        Self {
            center: Coordinate {
                latitude: 30.0,
                longitude: 0.0,
            },
            zoom_start: 3,
            min_zoom: 3,
            tiles: TileLayer::openstreetmap(),
            popup_max_width: 500,
            popup_max_height: 300,
        }
    }
}

/// Popup markup for one location: a linked header and its paintings.
///
/// Paintings are listed by `(item_name, image_link)` so ties on the name fall back
/// to the image URL.
pub fn popup_html(location: &LocationDisplay) -> String {
    let mut paired: Vec<(&str, &str)> = location
        .items
        .iter()
        .map(|entry| (entry.item_name.as_str(), entry.image_link.as_str()))
        .collect();
    paired.sort_unstable();

    let list = paired
        .iter()
        .map(|(name, link)| {
            format!(
                "<li><a href=\"{}\" target=\"_blank\">{}</a></li>",
                encode_double_quoted_attribute(link),
                encode_text(name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<h4 style=\"font-size:14px\" ><strong><a href=\"{}\" style = \"color:black\" target=\"_blank\">{}</a></strong></h4>\n<ul>{}</ul>",
        encode_double_quoted_attribute(&location.website),
        encode_text(&location.location_name),
        list
    )
}

#[derive(Debug, Clone, Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    popup: String,
}

/// A map under construction: settings plus one marker per location.
#[derive(Debug, Clone)]
pub struct MapDocument {
    settings: MapSettings,
    markers: Vec<Marker>,
}

impl MapDocument {
    /// Starts an empty map.
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            markers: Vec::new(),
        }
    }

    /// Builds a map with a marker for every location.
    pub fn from_locations(settings: MapSettings, locations: &[LocationDisplay]) -> Self {
        let mut map = Self::new(settings);
        for location in locations {
            map.add_location(location);
        }
        map
    }

    /// Adds a marker at the location's coordinate carrying its popup.
    pub fn add_location(&mut self, location: &LocationDisplay) {
        self.markers.push(Marker {
            lat: location.coordinate.latitude,
            lon: location.coordinate.longitude,
            popup: popup_html(location),
        });
    }

    /// Number of markers placed so far.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Renders the complete HTML document.
    pub fn to_html(&self) -> Result<String, RenderError> {
        let markers = script_safe_json(&self.markers)?;
        let tiles = script_safe_json(&self.settings.tiles.url_template)?;
        let attribution = script_safe_json(&self.settings.tiles.attribution)?;
        let center = script_safe_json(&[
            self.settings.center.latitude,
            self.settings.center.longitude,
        ])?;
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<link rel="stylesheet" href="https://unpkg.com/leaflet@{version}/dist/leaflet.css" />
<script src="https://unpkg.com/leaflet@{version}/dist/leaflet.js"></script>
<style>html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map", {{ center: {center}, zoom: {zoom}, minZoom: {min_zoom} }});
L.tileLayer({tiles}, {{ attribution: {attribution} }}).addTo(map);
var markers = {markers};
markers.forEach(function (m) {{
  L.marker([m.lat, m.lon]).addTo(map).bindPopup(m.popup, {{ maxWidth: {max_width}, maxHeight: {max_height} }});
}});
</script>
</body>
</html>
"#,
            version = LEAFLET_VERSION,
            center = center,
            zoom = self.settings.zoom_start,
            min_zoom = self.settings.min_zoom,
            tiles = tiles,
            attribution = attribution,
            markers = markers,
            max_width = self.settings.popup_max_width,
            max_height = self.settings.popup_max_height,
        ))
    }

    /// Renders and writes the document to `path`, creating parent directories.
    ///
    /// The document is staged in a temporary file beside `path` and renamed into place,
    /// so `path` either keeps its previous contents or holds the complete map.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let html = self.to_html()?;
        let io_err = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(io_err)?;
                parent
            }
            None => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(io_err)?;
        staged.write_all(html.as_bytes()).map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

// JSON is valid JavaScript, but a literal `</script>` inside a string would end the block.
fn script_safe_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    let json = serde_json::to_string(value).map_err(RenderError::Encode)?;
    Ok(json.replace("</", "<\\/"))
}

/// Failures while rendering or saving a map.
#[derive(Debug)]
pub enum RenderError {
    /// Marker data could not be encoded.
    Encode(serde_json::Error),
    /// Writing the document failed.
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO failure.
        source: io::Error,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode map data: {err}"),
            Self::Io { path, source } => write!(f, "failed to write map {:?}: {source}", path),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}
