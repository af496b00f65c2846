use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{Candle, DataError};

/// Raw CSV row; every field is parsed by hand so that prices keep their
/// exact decimal representation.
#[derive(Debug, Deserialize)]
struct CsvCandle {
    time: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

/// Load candles from disk, picking the reader by file extension.
///
/// `.csv` files go through [`read_candle_csv`]; anything else is treated
/// as a whitespace separated market history file (see [`read_price_file`]).
/// The result is sorted ascending by time with duplicate timestamps removed.
pub fn load_candles<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>, DataError> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let candles = if is_csv {
        read_candle_csv(path)?
    } else {
        read_price_file(path)?
    };

    Ok(normalize_candles(candles))
}

/// Read an OHLCV CSV file with header `time,open,high,low,close,volume`.
///
/// `time` may be RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, or epoch
/// milliseconds.
pub fn read_candle_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = reader.headers()?.clone();

    let mut candles = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // Header occupies line 1
        let line = i + 2;
        let record = record?;
        let raw: CsvCandle = record.deserialize(Some(&headers))?;

        let time = parse_time(&raw.time).ok_or_else(|| DataError::Timestamp {
            line,
            value: raw.time.clone(),
        })?;

        candles.push(Candle::new(
            time,
            parse_decimal(&raw.open, "open", line)?,
            parse_decimal(&raw.high, "high", line)?,
            parse_decimal(&raw.low, "low", line)?,
            parse_decimal(&raw.close, "close", line)?,
            parse_decimal(&raw.volume, "volume", line)?,
        ));
    }

    if candles.is_empty() {
        return Err(DataError::Empty);
    }

    Ok(candles)
}

/// Read market data file with format `YYYYMMDD price [price ...]`.
///
/// With four or more price columns they are taken as open/high/low/close;
/// otherwise the last column is used for every price. Volume is zero.
pub fn read_price_file<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut candles = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line_no = line_num + 1;
        let line = line_result.map_err(|source| DataError::Read {
            line: line_no,
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line
            .split([' ', '\t', ','])
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() < 2 {
            return Err(DataError::Number {
                line: line_no,
                field: "close",
                value: line.clone(),
            });
        }

        let time = NaiveDate::parse_from_str(parts[0], "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
            .ok_or_else(|| DataError::Timestamp {
                line: line_no,
                value: parts[0].to_string(),
            })?;

        let prices = &parts[1..];
        let close = parse_decimal(prices[prices.len() - 1], "close", line_no)?;
        let (open, high, low) = if prices.len() >= 4 {
            (
                parse_decimal(prices[0], "open", line_no)?,
                parse_decimal(prices[1], "high", line_no)?,
                parse_decimal(prices[2], "low", line_no)?,
            )
        } else {
            (close, close, close)
        };

        candles.push(Candle::new(time, open, high, low, close, Decimal::ZERO));
    }

    if candles.is_empty() {
        return Err(DataError::Empty);
    }

    Ok(candles)
}

/// Sort candles by time and drop duplicate timestamps, keeping the first
/// occurrence in input order.
pub fn normalize_candles(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.time);
    candles.dedup_by_key(|c| c.time);
    candles
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

fn parse_decimal(value: &str, field: &'static str, line: usize) -> Result<Decimal, DataError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| DataError::Number {
            line,
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_read_candle_csv() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "time,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-01-02T00:00:00Z,101,103,100,102.5,12.25").unwrap();
        writeln!(file, "2024-01-01,100,102,99,101,10").unwrap();
        writeln!(file, "1704240000000,102.5,104,101,103,8").unwrap();
        writeln!(file, "2024-01-01 00:00:00,1,1,1,1,1").unwrap();

        let candles = load_candles(file.path()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close, Decimal::from(101));
        assert_eq!(candles[1].close, Decimal::from_str("102.5").unwrap());
        assert_eq!(candles[2].time.timestamp_millis(), 1_704_240_000_000);
        assert!(candles.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn test_read_candle_csv_bad_timestamp() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "time,open,high,low,close,volume").unwrap();
        writeln!(file, "yesterday,1,1,1,1,1").unwrap();

        match read_candle_csv(file.path()) {
            Err(DataError::Timestamp { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Timestamp error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_candle_csv_bad_number() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "time,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-01-01,1,1,1,abc,1").unwrap();

        assert!(matches!(
            read_candle_csv(file.path()),
            Err(DataError::Number { field: "close", .. })
        ));
    }

    #[test]
    fn test_read_price_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "20200101 100.0").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "20200102 101.5").unwrap();
        writeln!(file, "20200103 99 100 98 99.8").unwrap();

        let candles = read_price_file(file.path()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close, Decimal::from(100));
        assert_eq!(candles[2].open, Decimal::from(99));
        assert_eq!(candles[2].close, Decimal::from_str("99.8").unwrap());
    }

    #[test]
    fn test_read_price_file_bad_date() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "2020-01-01 100.0").unwrap();
        assert!(matches!(
            read_price_file(file.path()),
            Err(DataError::Timestamp { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_candles("does/not/exist.csv"),
            Err(DataError::Open { .. })
        ));
    }
}
