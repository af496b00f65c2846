use std::path::Path;

// Re-export from shared I/O modules
pub use replay::core::io::{Candle, PriceSeries, load_candles};

use crate::error::Result;

/// Load a market data file and keep its closing prices.
pub fn load_price_series<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let candles = load_candles(path)?;
    Ok(PriceSeries::from_candles(&candles)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_load_price_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "20200101 100.0").unwrap();
        writeln!(file, "20200102 101.5").unwrap();
        writeln!(file, "20200103 99.8").unwrap();

        let prices = load_price_series(file.path()).unwrap();
        assert_eq!(prices.len(), 3);
        assert!((prices.closes()[1] - 101.5).abs() < 1e-10);
    }

    #[test]
    fn test_load_csv_sorted_and_deduplicated() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "time,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-01-03,11,12,10,11.5,100").unwrap();
        writeln!(file, "2024-01-01,10,11,9,10.5,100").unwrap();
        writeln!(file, "2024-01-02,10.5,11,10,10.75,100").unwrap();
        writeln!(file, "2024-01-02,10.5,11,10,99,100").unwrap();

        let prices = load_price_series(file.path()).unwrap();
        assert_eq!(prices.closes(), &[10.5, 10.75, 11.5]);
    }

    #[test]
    fn test_empty_file_is_error() {
        let file = NamedTempFile::new().unwrap();
        let err = load_price_series(file.path()).unwrap_err();
        assert!(!err.is_config_error());
    }
}
