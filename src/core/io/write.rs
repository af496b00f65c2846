use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;

/// Create (or truncate) an output file, creating missing parent
/// directories first.
pub fn create_output_file<P: AsRef<Path>>(path: P) -> io::Result<BufWriter<File>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}
