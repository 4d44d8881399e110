//! Blocking SPARQL client for the Wikidata query service.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::debug_log;

/// Default public Wikidata SPARQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://query.wikidata.org/sparql";

const VAR_PAINTING: &str = "painting";
const VAR_PAINTING_LABEL: &str = "paintingLabel";
const VAR_COORD: &str = "coord";
const VAR_IMAGE: &str = "imagelink";
const VAR_LOCATION: &str = "location";
const VAR_LOCATION_LABEL: &str = "locationLabel";
const VAR_WEBSITE: &str = "officialwebsite";

/// One row of the painting/location query, flattened to plain strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    /// Entity URI of the painting.
    pub item_ref: String,
    /// Display label of the painting.
    pub item_label: String,
    /// WKT point literal of the holding location, longitude first.
    pub coordinate: String,
    /// Commons image URL of the painting.
    pub image_link: String,
    /// Entity URI of the holding location.
    pub location_ref: String,
    /// Display label of the holding location.
    pub location_label: String,
    /// Official website of the holding location.
    pub website: String,
}

/// Builds the query selecting paintings by `artist_id` along with where they hang.
///
/// `artist_id` is interpolated verbatim.
pub fn build_query(artist_id: &str, language: &str) -> String {
    format!(
        r#"
SELECT ?{VAR_PAINTING} ?{VAR_PAINTING_LABEL} ?{VAR_COORD} ?{VAR_IMAGE} ?{VAR_LOCATION} ?{VAR_LOCATION_LABEL} ?{VAR_WEBSITE}
WHERE
{{
  ?painting wdt:P31 wd:Q3305213.
  ?painting wdt:P170 wd:{artist_id}.
  ?painting wdt:P276 ?location.
  ?painting wdt:P18 ?imagelink.
  ?location wdt:P625 ?coord.
  ?location wdt:P856 ?officialwebsite.
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "[AUTO_LANGUAGE],{language}". }}
}}
"#
    )
}

/// Decodes a SPARQL JSON results document into records.
///
/// Every binding must carry all seven projection variables.
pub fn parse_response(body: &str) -> Result<Vec<ResultRecord>, QueryError> {
    let parsed: SparqlResponse = serde_json::from_str(body).map_err(QueryError::Decode)?;
    parsed
        .results
        .bindings
        .into_iter()
        .enumerate()
        .map(|(index, binding)| record_from_binding(index, binding))
        .collect()
}

fn record_from_binding(index: usize, mut binding: Binding) -> Result<ResultRecord, QueryError> {
    let mut take = |field: &'static str| {
        binding
            .remove(field)
            .map(|term| term.value)
            .ok_or(QueryError::MissingField { index, field })
    };
    Ok(ResultRecord {
        item_ref: take(VAR_PAINTING)?,
        item_label: take(VAR_PAINTING_LABEL)?,
        coordinate: take(VAR_COORD)?,
        image_link: take(VAR_IMAGE)?,
        location_ref: take(VAR_LOCATION)?,
        location_label: take(VAR_LOCATION_LABEL)?,
        website: take(VAR_WEBSITE)?,
    })
}

/// Blocking client that issues GET queries against a SPARQL endpoint.
#[derive(Clone)]
pub struct QueryClient {
    client: Client,
    endpoint: Url,
}

impl QueryClient {
    /// Builds a new client for `endpoint`. `None` waits for the response indefinitely.
    pub fn new(
        endpoint: Url,
        timeout: Option<Duration>,
        user_agent: &str,
    ) -> Result<Self, QueryError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/sparql-results+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|_| QueryError::InvalidUserAgent)?,
        );
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(QueryError::Http)?;
        Ok(Self { client, endpoint })
    }

    /// Full request URL for `query`, with `format` and `query` parameters appended.
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("query", query);
        url
    }

    /// Runs `query` and returns every binding as a record. Not retried on failure.
    pub fn fetch_records(&self, query: &str) -> Result<Vec<ResultRecord>, QueryError> {
        let url = self.request_url(query);
        debug_log!("GET {url}");
        let response = self.client.get(url).send().map_err(QueryError::Http)?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(QueryError::Status { status, body });
        }
        let body = response.text().map_err(QueryError::Http)?;
        parse_response(&body)
    }
}

/// Errors surfaced while querying or decoding results.
#[derive(Debug)]
pub enum QueryError {
    /// Sending the request or reading the body failed.
    Http(reqwest::Error),
    /// The endpoint answered with a non-success status.
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The body was not a SPARQL JSON results document.
    Decode(serde_json::Error),
    /// A binding lacked one of the projection variables.
    MissingField {
        /// Zero-based binding position.
        index: usize,
        /// Missing variable name.
        field: &'static str,
    },
    /// The configured user agent is not a valid header value.
    InvalidUserAgent,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "sparql request error: {err}"),
            Self::Status { status, body } => {
                write!(f, "sparql endpoint returned {status}: {body}")
            }
            Self::Decode(err) => write!(f, "invalid sparql results document: {err}"),
            Self::MissingField { index, field } => {
                write!(f, "binding {index} is missing variable '{field}'")
            }
            Self::InvalidUserAgent => write!(f, "user agent is not a valid header value"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Status { .. } | Self::MissingField { .. } | Self::InvalidUserAgent => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<Binding>,
}

type Binding = HashMap<String, BindingTerm>;

#[derive(Debug, Deserialize)]
struct BindingTerm {
    value: String,
}
