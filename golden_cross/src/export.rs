use std::path::Path;

use replay::core::io::create_output_file;

use crate::error::Result;
use crate::optimization::{OptimizationResult, OptimizationRow};

/// Write one CSV row per evaluated pair, in table order.
pub fn write_optimization_csv<P: AsRef<Path>>(result: &OptimizationResult, path: P) -> Result<()> {
    let file = create_output_file(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in &result.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a file written by [`write_optimization_csv`].
pub fn read_optimization_csv<P: AsRef<Path>>(path: P) -> Result<OptimizationResult> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<OptimizationRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(OptimizationResult { rows })
}
