//! Reading place records from JSON-lines files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::warn;

use crate::error::{Result, SearchError};
use crate::models::{Place, PlaceRecord};

/// Places read from a file plus the number of lines that were rejected
#[derive(Debug, Default)]
pub struct LoadedPlaces {
    pub places: Vec<Place>,
    pub skipped: usize,
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Place>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let record: PlaceRecord = serde_json::from_str(line)?;
    if !(-90.0..=90.0).contains(&record.latitude) || !(-180.0..=180.0).contains(&record.longitude) {
        return Err(SearchError::Parse {
            reason: format!(
                "place {} has coordinates out of range ({}, {})",
                record.id, record.latitude, record.longitude
            ),
        });
    }

    Ok(Some(Place::from(record)))
}

/// Read every place from `reader`, skipping malformed lines
pub fn read_places<R: BufRead>(reader: R) -> Result<LoadedPlaces> {
    let mut loaded = LoadedPlaces::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Ok(Some(place)) => loaded.places.push(place),
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping line {}: {}", number + 1, e);
                loaded.skipped += 1;
            }
        }
    }

    Ok(loaded)
}

/// Read every place from a JSON-lines file
pub fn load_places<P: AsRef<Path>>(path: P) -> Result<LoadedPlaces> {
    let file = File::open(path.as_ref())?;
    read_places(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"# sample places
{"id": 1, "title": "Blue Bottle Coffee", "latitude": 37.7763, "longitude": -122.4232, "tags": ["coffee", "wifi"]}

{"id": 2, "title": "Dolores Park", "latitude": 37.7596, "longitude": -122.4269}
{"id": 3, "title": "Nowhere", "latitude": 123.0, "longitude": 0.0}
not json at all
"#;

    #[test]
    fn test_read_places_skips_bad_lines() {
        let loaded = read_places(SAMPLE.as_bytes()).unwrap();
        assert_eq!(loaded.places.len(), 2);
        assert_eq!(loaded.skipped, 2);
        assert_eq!(loaded.places[0].tags, vec!["coffee", "wifi"]);
        assert!(loaded.places[1].tags.is_empty());
    }

    #[test]
    fn test_parse_line_comment() {
        assert!(parse_line("   # nothing").unwrap().is_none());
        assert!(parse_line("").unwrap().is_none());
        assert!(matches!(parse_line("{"), Err(SearchError::Json(_))));
    }

    #[test]
    fn test_load_places_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let loaded = load_places(file.path()).unwrap();
        assert_eq!(loaded.places.len(), 2);
    }

    #[test]
    fn test_bundled_sample_data() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/places.jsonl");
        let loaded = load_places(path).unwrap();
        assert_eq!(loaded.places.len(), 12);
        assert_eq!(loaded.skipped, 0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_places("/definitely/not/here.jsonl").unwrap_err();
        assert!(matches!(err, SearchError::Io(_)));
    }
}
