//! CSV transport: get bytes onto disk, parse them into raw rows, and build
//! a [`Dataset`].
//!
//! Everything here is blocking I/O. Async callers go through [`load`],
//! which runs the work on tokio's blocking pool.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use lift_progression_core::dataset::Dataset;
use lift_progression_core::fuzzy::EditDistanceMatcher;
use lift_progression_core::models::RawRow;
use lift_progression_core::normalize::AliasTable;

use crate::config::Config;
use crate::progress::{LoadProgressEvent, LoadProgressReporter, ProgressMode};

/// Emit a parsing progress event every this many rows.
const PROGRESS_EVERY: u64 = 50_000;

/// A dataset snapshot plus where it came from.
#[derive(Debug)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    /// SHA-256 of the raw CSV bytes, hex encoded.
    pub fingerprint: String,
    /// Path (or URL) the rows were read from.
    pub source: String,
    /// CSV records skipped because the parser rejected them.
    pub skipped: u64,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedDataset {
    pub fn empty() -> Self {
        Self {
            dataset: Dataset::empty(),
            fingerprint: fingerprint(&[]),
            source: String::new(),
            skipped: 0,
            loaded_at: Utc::now(),
        }
    }

    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..self.fingerprint.len().min(12)]
    }
}

/// Load the configured source on the blocking pool.
pub async fn load(config: &Config, mode: ProgressMode) -> Result<LoadedDataset> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || load_dataset(&config, mode.reporter().as_ref()))
        .await
        .context("Dataset load task panicked")?
}

/// Download (if configured), read, parse and ingest the CSV.
pub fn load_dataset(config: &Config, progress: &dyn LoadProgressReporter) -> Result<LoadedDataset> {
    let (path, source) = match config.data.url() {
        Some(url) => {
            progress.report(LoadProgressEvent::Downloading {
                url: url.to_string(),
            });
            let bytes = download_csv(
                url,
                &config.data.download_path,
                Duration::from_secs(config.data.timeout_secs),
            )?;
            info!(url, bytes, path = %config.data.download_path.display(), "downloaded csv");
            (config.data.download_path.clone(), url.to_string())
        }
        None => (
            config.data.csv_path.clone(),
            config.data.csv_path.display().to_string(),
        ),
    };

    let bytes = fs::read(&path).with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
    let parsed = read_csv_rows(
        &bytes,
        config.data.delimiter_byte(),
        config.data.max_rows,
        &source,
        progress,
    )?;

    let matcher = EditDistanceMatcher::new(config.search.threshold);
    let dataset = Dataset::from_rows_with(&parsed.rows, &AliasTable::default(), &matcher);

    progress.report(LoadProgressEvent::Indexed {
        rows: dataset.len() as u64,
        names: dataset.names().len() as u64,
    });
    info!(
        source = %source,
        rows = dataset.len(),
        lifters = dataset.names().len(),
        skipped = parsed.skipped,
        "dataset loaded"
    );

    Ok(LoadedDataset {
        dataset,
        fingerprint: fingerprint(&bytes),
        source,
        skipped: parsed.skipped,
        loaded_at: Utc::now(),
    })
}

/// Stream `url` into `dest`, returning the number of bytes written.
///
/// The body goes to a `.part` file first and is renamed into place only
/// after the whole response has been written.
pub fn download_csv(url: &str, dest: &Path, timeout: Duration) -> Result<u64> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to build HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to download {}", url))?
        .error_for_status()
        .with_context(|| format!("Download failed: {}", url))?;

    let partial = part_path(dest);
    let mut file = fs::File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    let written = response
        .copy_to(&mut file)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    drop(file);

    fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;
    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Rows parsed from one CSV file.
#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub skipped: u64,
}

/// Parse CSV bytes into header-keyed rows.
///
/// Headers come from the first record and are trimmed. Short rows simply
/// lack the trailing keys, extra cells beyond the header are dropped, and
/// invalid UTF-8 is replaced rather than rejected. When a header repeats,
/// the first non-empty cell under that name is kept. `max_rows = 0` reads
/// everything.
pub fn read_csv_rows(
    bytes: &[u8],
    delimiter: u8,
    max_rows: usize,
    source: &str,
    progress: &dyn LoadProgressReporter,
) -> Result<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| {
            String::from_utf8_lossy(h)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_string()
        })
        .collect();

    let mut parsed = ParsedCsv {
        headers,
        ..ParsedCsv::default()
    };

    for (line, record) in reader.byte_records().enumerate() {
        if max_rows > 0 && parsed.rows.len() >= max_rows {
            break;
        }
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(source, line = line + 2, error = %e, "skipping unreadable CSV record");
                parsed.skipped += 1;
                continue;
            }
        };

        let mut row = RawRow::new();
        for (header, cell) in parsed.headers.iter().zip(record.iter()) {
            if header.is_empty() {
                continue;
            }
            let cell = String::from_utf8_lossy(cell).into_owned();
            match row.get_mut(header) {
                Some(existing) if existing.trim().is_empty() => *existing = cell,
                Some(_) => {}
                None => {
                    row.insert(header.clone(), cell);
                }
            }
        }
        parsed.rows.push(row);

        let n = parsed.rows.len() as u64;
        if n % PROGRESS_EVERY == 0 {
            progress.report(LoadProgressEvent::Parsing {
                source: source.to_string(),
                rows: n,
            });
        }
    }

    Ok(parsed)
}

/// SHA-256 of `bytes`, lowercase hex.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::sync::Mutex;

    fn parse(text: &str) -> ParsedCsv {
        read_csv_rows(text.as_bytes(), b',', 0, "test.csv", &NoProgress).unwrap()
    }

    #[test]
    fn test_headers_trimmed_and_rows_keyed() {
        let parsed = parse(" Name , SquatKg ,Date\nJane Doe,100,2020-01-05\n");
        assert_eq!(parsed.headers, vec!["Name", "SquatKg", "Date"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0]["Name"], "Jane Doe");
        assert_eq!(parsed.rows[0]["SquatKg"], "100");
    }

    #[test]
    fn test_ragged_rows() {
        let parsed = parse("Name,SquatKg,Date\nShort Row\nLong,1,2,extra,cells\n");
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].len(), 1);
        assert!(!parsed.rows[0].contains_key("SquatKg"));
        assert_eq!(parsed.rows[1].len(), 3);
    }

    #[test]
    fn test_quoted_cells_and_bom() {
        let parsed = parse("\u{feff}Name,MeetName\n\"Doe, Jane\",\"Spring \"\"Open\"\"\"\n");
        assert_eq!(parsed.headers[0], "Name");
        assert_eq!(parsed.rows[0]["Name"], "Doe, Jane");
        assert_eq!(parsed.rows[0]["MeetName"], "Spring \"Open\"");
    }

    #[test]
    fn test_duplicate_header_keeps_first_non_empty() {
        let parsed = parse("Name,Name\n,Jane\nJohn,Other\n");
        assert_eq!(parsed.rows[0]["Name"], "Jane");
        assert_eq!(parsed.rows[1]["Name"], "John");
    }

    #[test]
    fn test_max_rows_and_delimiter() {
        let text = "Name;TotalKg\nA;1\nB;2\nC;3\n";
        let parsed = read_csv_rows(text.as_bytes(), b';', 2, "t", &NoProgress).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1]["TotalKg"], "2");
    }

    #[test]
    fn test_header_only() {
        let parsed = parse("Name,SquatKg\n");
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.headers.len(), 2);
    }

    struct Recorder(Mutex<Vec<LoadProgressEvent>>);

    impl LoadProgressReporter for Recorder {
        fn report(&self, event: LoadProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_load_dataset_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let csv_path = tmp.path().join("lifts.csv");
        fs::write(
            &csv_path,
            "Name,Equipment,Best3SquatKg,Date\nJane Doe,Raw,100,2020-01-05\nJane Doe,Raw,105,2021-03-10\n",
        )
        .unwrap();

        let mut config = Config::minimal();
        config.data.csv_path = csv_path.clone();

        let recorder = Recorder(Mutex::new(Vec::new()));
        let loaded = load_dataset(&config, &recorder).unwrap();
        assert_eq!(loaded.dataset.len(), 2);
        assert_eq!(loaded.dataset.list_names(), ["Jane Doe"]);
        assert_eq!(loaded.fingerprint, fingerprint(&fs::read(&csv_path).unwrap()));
        assert_eq!(loaded.short_fingerprint().len(), 12);
        assert_eq!(
            recorder.0.lock().unwrap().last(),
            Some(&LoadProgressEvent::Indexed { rows: 2, names: 1 })
        );
    }

    #[test]
    fn test_load_dataset_survives_bad_date_cell() {
        let tmp = tempfile::TempDir::new().unwrap();
        let csv_path = tmp.path().join("lifts.csv");
        fs::write(
            &csv_path,
            "Name,TotalKg,Date\nGood Row,300,2020-01-05\nBad Row,310,2020é1\n",
        )
        .unwrap();

        let mut config = Config::minimal();
        config.data.csv_path = csv_path;

        let loaded = load_dataset(&config, &NoProgress).unwrap();
        assert_eq!(loaded.dataset.len(), 2);
        let bad = &loaded.dataset.records()[1];
        assert_eq!(bad.name, "Bad Row");
        assert_eq!(bad.meet_date, None);
        assert_eq!(bad.total.kg(), Some(310.0));
    }

    #[test]
    fn test_missing_file_is_error() {
        let mut config = Config::minimal();
        config.data.csv_path = PathBuf::from("/nonexistent/lifts.csv");
        let err = load_dataset(&config, &NoProgress).unwrap_err();
        assert!(err.to_string().contains("Failed to read CSV file"));
    }

    #[test]
    fn test_part_path() {
        assert_eq!(part_path(Path::new("data/raw.csv")), PathBuf::from("data/raw.csv.part"));
    }
}
