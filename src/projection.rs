//! Reduces location groups to the fields the map needs.
//!
//! Conflicts are settled by [`FirstWins`]: location metadata comes from the first
//! record filed under the location, and each painting's name and image come from
//! its first record. Later values are dropped without comparison.

use std::error::Error;
use std::fmt;

use crate::grouping::{LocationGroup, LocationGroups};
use crate::query::ResultRecord;

/// Keeps the first value offered and ignores the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstWins<T> {
    value: Option<T>,
}

impl<T> FirstWins<T> {
    /// Creates an empty reducer.
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Offers a candidate; returns `true` when it became the kept value.
    pub fn offer(&mut self, candidate: T) -> bool {
        if self.value.is_some() {
            return false;
        }
        self.value = Some(candidate);
        true
    }

    /// The kept value, if anything was offered.
    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for FirstWins<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
}

/// Parses a WKT `Point(<lon> <lat>)` literal, reordering to latitude first.
///
/// Anything before the last `Point(` (such as a globe IRI) is ignored.
pub fn parse_point(literal: &str) -> Result<Coordinate, PointError> {
    let invalid = || PointError {
        literal: literal.to_string(),
    };
    let start = literal.rfind("Point(").ok_or_else(invalid)? + "Point(".len();
    let inner = &literal[start..];
    let inner = &inner[..inner.find(')').ok_or_else(invalid)?];
    let mut parts = inner.split_whitespace();
    let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let longitude: f64 = lon.parse().map_err(|_| invalid())?;
    let latitude: f64 = lat.parse().map_err(|_| invalid())?;
    Ok(Coordinate {
        latitude,
        longitude,
    })
}

/// A point literal that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointError {
    /// The offending literal.
    pub literal: String,
}

impl fmt::Display for PointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a WKT point: {:?}", self.literal)
    }
}

impl Error for PointError {}

/// Display fields for one painting at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    /// Painting identifier.
    pub id: String,
    /// Painting label.
    pub item_name: String,
    /// Image URL.
    pub image_link: String,
}

/// Display fields for one location and the paintings it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDisplay {
    /// Location identifier.
    pub id: String,
    /// Location label.
    pub location_name: String,
    /// Marker position.
    pub coordinate: Coordinate,
    /// Location website.
    pub website: String,
    /// Paintings in grouping order.
    pub items: Vec<DisplayEntry>,
}

impl LocationDisplay {
    /// Looks up a painting by identifier.
    pub fn item(&self, id: &str) -> Option<&DisplayEntry> {
        self.items.iter().find(|entry| entry.id == id)
    }
}

/// Projects every group, preserving grouping order.
pub fn project(groups: &LocationGroups) -> Result<Vec<LocationDisplay>, ProjectionError> {
    groups.iter().map(project_group).collect()
}

fn project_group(group: &LocationGroup) -> Result<LocationDisplay, ProjectionError> {
    let mut location: FirstWins<&ResultRecord> = FirstWins::new();
    let mut items = Vec::with_capacity(group.items().len());
    for item in group.items() {
        let mut chosen: FirstWins<&ResultRecord> = FirstWins::new();
        for record in item.records() {
            chosen.offer(record);
        }
        let record = chosen
            .into_inner()
            .ok_or_else(|| ProjectionError::EmptyGroup {
                location: group.id().to_string(),
            })?;
        location.offer(record);
        items.push(DisplayEntry {
            id: item.id().to_string(),
            item_name: record.item_label.clone(),
            image_link: record.image_link.clone(),
        });
    }

    let first = location
        .into_inner()
        .ok_or_else(|| ProjectionError::EmptyGroup {
            location: group.id().to_string(),
        })?;
    let coordinate =
        parse_point(&first.coordinate).map_err(|source| ProjectionError::Coordinate {
            location: group.id().to_string(),
            source,
        })?;
    Ok(LocationDisplay {
        id: group.id().to_string(),
        location_name: first.location_label.clone(),
        coordinate,
        website: first.website.clone(),
        items,
    })
}

/// Failures while projecting groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// A location carried no records.
    EmptyGroup {
        /// Location identifier.
        location: String,
    },
    /// The kept coordinate literal was malformed.
    Coordinate {
        /// Location identifier.
        location: String,
        /// Parse failure.
        source: PointError,
    },
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGroup { location } => write!(f, "location {location} has no records"),
            Self::Coordinate { location, source } => {
                write!(f, "location {location} has a bad coordinate: {source}")
            }
        }
    }
}

impl Error for ProjectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyGroup { .. } => None,
            Self::Coordinate { source, .. } => Some(source),
        }
    }
}
