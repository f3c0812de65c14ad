// CSV/TSV dataset loading

use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::IoError;

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // More columns breaks ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback for Excel exports).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file =
        std::fs::File::open(path).map_err(|e| IoError::Io(format!("{}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::debug!("{}: not UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

/// Parse delimited text with a header row into one object per record.
///
/// Values stay strings. Short records are padded with `""`; fields past the
/// last header are dropped.
pub fn load_csv_records(content: &str, delimiter: u8) -> Result<Vec<Map<String, Value>>, IoError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IoError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::Csv(e.to_string()))?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let object: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), Value::String(record.get(i).unwrap_or("").to_string())))
            .collect();
        records.push(object);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("id\tname\n1\tA\n"), b'\t');
        assert_eq!(sniff_delimiter("id;name;note\n1;A;x\n"), b';');
        assert_eq!(sniff_delimiter("id,name\n1,\"A, B\"\n"), b',');
        assert_eq!(sniff_delimiter("id|name\n1|A\n"), b'|');
        assert_eq!(sniff_delimiter(""), b',');
        assert_eq!(sniff_delimiter("single\ncolumn\n"), b',');
    }

    #[test]
    fn test_load_records_pads_short_rows() {
        let records = load_csv_records("\u{feff}id,name,note\n1,A\n2,B,x,extra\n\n", b',').unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "1");
        assert_eq!(records[0]["note"], "");
        assert_eq!(records[1]["note"], "x");
        assert_eq!(records[1].len(), 3);
    }

    #[test]
    fn test_load_records_keeps_quoted_fields() {
        let records = load_csv_records("id\tname\n7\t\"Smith\tJohn\"\n", b'\t').unwrap();
        assert_eq!(records[0]["name"], "Smith\tJohn");
    }

    #[test]
    fn test_read_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "café" with 0xE9 for é
        fs::write(&path, b"name\ncaf\xe9\n").unwrap();
        let content = read_file_as_utf8(&path).unwrap();
        assert_eq!(content, "name\ncafé\n");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_file_as_utf8(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }
}
