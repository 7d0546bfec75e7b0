use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Serializes simulation results into an external text format.
///
/// Implementors borrow whatever pool records they need and stream them to a
/// writer; the path-based variant wraps the file in a buffered writer.
pub trait DistributionWriter {
    /// The error type for write operations.
    type Error: Error + From<io::Error>;

    /// Writes the full document to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be serialized or the writer fails.
    fn write_to(&self, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Writes the full document to a file, replacing any existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
