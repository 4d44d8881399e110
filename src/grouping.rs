//! Folds flat query records into per-location, per-painting groups.
//!
//! Groups and their item sequences keep first-appearance order. Lookup goes through a
//! side index so iteration order never depends on hashing.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use crate::debug_log;
use crate::identifier::extract_id;
use crate::query::ResultRecord;

/// Every record observed for one painting at one location, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecords {
    id: String,
    records: Vec<ResultRecord>,
}

impl ItemRecords {
    fn new(id: String, first: ResultRecord) -> Self {
        Self {
            id,
            records: vec![first],
        }
    }

    /// Painting identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Records for this painting; never empty.
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// First record observed for this painting.
    pub fn first(&self) -> &ResultRecord {
        &self.records[0]
    }
}

/// All paintings held at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationGroup {
    id: String,
    items: Vec<ItemRecords>,
    index: HashMap<String, usize>,
}

impl LocationGroup {
    fn new(id: String) -> Self {
        Self {
            id,
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn insert(&mut self, item_id: &str, record: ResultRecord) {
        match self.index.get(item_id) {
            Some(&slot) => self.items[slot].records.push(record),
            None => {
                self.index.insert(item_id.to_string(), self.items.len());
                self.items.push(ItemRecords::new(item_id.to_string(), record));
            }
        }
    }

    /// Location identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Painting sequences in first-appearance order.
    pub fn items(&self) -> &[ItemRecords] {
        &self.items
    }

    /// Looks up the records for one painting.
    pub fn item(&self, item_id: &str) -> Option<&ItemRecords> {
        self.index.get(item_id).map(|&slot| &self.items[slot])
    }

    /// Number of records across every painting at this location.
    pub fn record_count(&self) -> usize {
        self.items.iter().map(|item| item.records.len()).sum()
    }
}

/// Location groups keyed by location identifier, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationGroups {
    groups: Vec<LocationGroup>,
    index: HashMap<String, usize>,
}

impl LocationGroups {
    /// Creates an empty grouping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `record` under its location and painting identifiers.
    pub fn insert(&mut self, record: ResultRecord) {
        let location_id = extract_id(&record.location_ref).to_string();
        let item_id = extract_id(&record.item_ref).to_string();
        debug_log!("grouping {item_id} under {location_id}");
        let slot = match self.index.get(&location_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.index.insert(location_id.clone(), slot);
                self.groups.push(LocationGroup::new(location_id));
                slot
            }
        };
        self.groups[slot].insert(&item_id, record);
    }

    /// Groups in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = &LocationGroup> {
        self.groups.iter()
    }

    /// Looks up one location.
    pub fn get(&self, location_id: &str) -> Option<&LocationGroup> {
        self.index.get(location_id).map(|&slot| &self.groups[slot])
    }

    /// Number of distinct locations.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no location was recorded.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total records across every location and painting.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(LocationGroup::record_count).sum()
    }

    /// Verifies that exactly `expected` records were filed.
    pub fn ensure_complete(&self, expected: usize) -> Result<(), GroupingError> {
        let grouped = self.record_count();
        if grouped != expected {
            return Err(GroupingError::CountMismatch { grouped, expected });
        }
        Ok(())
    }
}

/// Groups `records` by location and painting, then checks nothing was lost.
pub fn group_records(records: Vec<ResultRecord>) -> Result<LocationGroups, GroupingError> {
    let expected = records.len();
    let mut groups = LocationGroups::new();
    for record in records {
        groups.insert(record);
    }
    groups.ensure_complete(expected)?;
    Ok(groups)
}

/// Structural failures of the grouping fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupingError {
    /// Grouped record total differs from the input record count.
    CountMismatch {
        /// Records found across all groups.
        grouped: usize,
        /// Records handed to the fold.
        expected: usize,
    },
}

impl fmt::Display for GroupingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch { grouped, expected } => write!(
                f,
                "grouping lost records: {grouped} grouped but {expected} returned by the query"
            ),
        }
    }
}

impl Error for GroupingError {}
