//! Extract posts from a saved feed snapshot.
//!
//! Reads HTML (any charset) from stdin, treats every candidate post as fully
//! visible, runs one extraction pass into an in-memory store and prints the
//! stored records as a JSON array on stdout.
//!
//! Environment:
//! - `FEED_CAPTURE_URL`: page location the snapshot was taken from
//! - `FEED_CAPTURE_CONFIG`: optional path to a JSON options file
//! - `RUST_LOG`: log filter (default `feed_capture=info`)

use std::io::{self, Read};

use feed_capture::{encoding, snapshot, Options};
use tracing_subscriber::EnvFilter;

fn load_options() -> Result<Options, String> {
    let Ok(path) = std::env::var("FEED_CAPTURE_CONFIG") else {
        return Ok(Options::default());
    };
    let raw = std::fs::read_to_string(&path).map_err(|e| format!("reading {path}: {e}"))?;
    Options::from_json(&raw).map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feed_capture=info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut bytes = Vec::new();
    if io::stdin().read_to_end(&mut bytes).is_err() {
        eprintln!("Failed to read from stdin");
        std::process::exit(1);
    }

    let options = match load_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let location =
        std::env::var("FEED_CAPTURE_URL").unwrap_or_else(|_| "about:blank".to_string());
    let doc = encoding::load_snapshot(&bytes);
    let captured = snapshot::capture(&doc, &location, options);

    let exported = captured.store.export_json();
    match exported {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize records: {e}");
            std::process::exit(1);
        }
    }
}
