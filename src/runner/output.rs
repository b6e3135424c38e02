use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ConfigError;

/// Open the stream a reporter writes to.
///
/// An empty filename selects `default`, usually stdout.
///
/// # Errors
///
/// Returns [`ConfigError::OpenOutput`] if the file cannot be created.
pub fn open_output(filename: &str, default: Box<dyn Write>) -> Result<Box<dyn Write>, ConfigError> {
    if filename.is_empty() {
        return Ok(default);
    }
    let path = Path::new(filename);
    let file = File::create(path).map_err(|source| ConfigError::OpenOutput {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("writing report to {}", path.display());
    Ok(Box::new(BufWriter::new(file)))
}
