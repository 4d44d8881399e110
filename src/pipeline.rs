//! One end-to-end map run: fetch, group, project, render.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{QuerySettings, RecordSource, RunSettings};
use crate::grouping::group_records;
use crate::projection::project;
use crate::query::{build_query, parse_response, QueryClient, ResultRecord};
use crate::render::MapDocument;

/// Counts reported after a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Records returned by the query.
    pub records: usize,
    /// Distinct locations, one marker each.
    pub locations: usize,
    /// Distinct (location, painting) pairs listed in popups.
    pub items: usize,
    /// Where the map was written.
    pub output: PathBuf,
}

/// Runs the pipeline described by `settings` and writes the map.
///
/// Grouping is verified before anything is rendered, so a failed run leaves no output.
pub fn run(settings: &RunSettings) -> Result<RunSummary> {
    let progress = |message: String| {
        if !settings.quiet {
            eprintln!("{message}");
        }
    };

    let records = match &settings.source {
        RecordSource::Remote => {
            progress(format!(
                "querying {} for paintings by {}...",
                settings.query.endpoint(),
                settings.query.artist_id()
            ));
            fetch_remote(&settings.query)?
        }
        RecordSource::File(path) => {
            progress(format!("reading saved results from {:?}...", path));
            load_saved(path)?
        }
    };
    let record_count = records.len();
    progress(format!("received {record_count} records"));

    let groups = group_records(records).context("grouping consistency check failed")?;
    let locations = project(&groups).context("failed to project location groups")?;
    let items: usize = locations.iter().map(|location| location.items.len()).sum();
    progress(format!(
        "grouped into {} locations holding {items} paintings",
        locations.len()
    ));

    let map = MapDocument::from_locations(settings.map.clone(), &locations);
    map.save(&settings.output)
        .with_context(|| format!("failed to save map to {:?}", settings.output))?;
    progress(format!(
        "wrote {} markers to {:?}",
        map.marker_count(),
        settings.output
    ));

    Ok(RunSummary {
        records: record_count,
        locations: locations.len(),
        items,
        output: settings.output.clone(),
    })
}

fn fetch_remote(query: &QuerySettings) -> Result<Vec<ResultRecord>> {
    let client = QueryClient::new(
        query.endpoint().clone(),
        query.timeout(),
        query.user_agent(),
    )
    .context("failed to build SPARQL client")?;
    let text = build_query(query.artist_id(), query.language());
    client
        .fetch_records(&text)
        .with_context(|| format!("SPARQL query against {} failed", query.endpoint()))
}

fn load_saved(path: &Path) -> Result<Vec<ResultRecord>> {
    let body =
        fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    parse_response(&body).with_context(|| format!("invalid SPARQL results in {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use clap::Parser;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn settings_for(input: &Path, output: &Path) -> RunSettings {
        Cli::try_parse_from([
            "artmap",
            "--quiet",
            "--input",
            input.to_str().expect("utf-8 path"),
            "--output",
            output.to_str().expect("utf-8 path"),
        ])
        .expect("parse cli")
        .build_settings()
        .expect("settings")
    }

    #[test]
    fn empty_results_still_write_a_map() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("empty.json");
        let output = dir.path().join("map.html");
        fs::write(&input, r#"{"head":{"vars":[]},"results":{"bindings":[]}}"#).expect("write");

        let summary = run(&settings_for(&input, &output)).expect("run");
        assert_eq!(summary.records, 0);
        assert_eq!(summary.locations, 0);
        assert_eq!(summary.items, 0);
        let html = fs::read_to_string(&output).expect("map written");
        assert!(html.contains("var markers = [];"));
    }

    // Serves one request, answering with `body` after `delay`.
    fn slow_endpoint(delay: Duration, body: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf).expect("read request");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            thread::sleep(delay);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/sparql-results+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
        });
        (format!("http://{addr}/sparql"), handle)
    }

    #[test]
    fn zero_timeout_waits_for_slow_endpoint() {
        let (endpoint, server) = slow_endpoint(
            Duration::from_millis(1500),
            r#"{"head":{"vars":[]},"results":{"bindings":[]}}"#,
        );
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("map.html");
        let settings = Cli::try_parse_from([
            "artmap",
            "--quiet",
            "--endpoint",
            endpoint.as_str(),
            "--timeout-secs",
            "0",
            "--output",
            output.to_str().expect("utf-8 path"),
        ])
        .expect("parse cli")
        .build_settings()
        .expect("settings");
        assert_eq!(settings.query.timeout(), None);

        let summary = run(&settings).expect("slow endpoint answered");
        server.join().expect("server thread");
        assert_eq!(summary.records, 0);
        assert!(output.exists());
    }

    #[test]
    fn malformed_results_leave_no_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("broken.json");
        let output = dir.path().join("map.html");
        fs::write(&input, r#"{"results":{}}"#).expect("write");

        assert!(run(&settings_for(&input, &output)).is_err());
        assert!(!output.exists());
    }
}
