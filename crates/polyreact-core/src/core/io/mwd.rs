use super::traits::DistributionWriter;
use crate::core::models::distribution::{Distribution, MwdBin};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MwdWriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// MWD histogram as CSV with the columns `lgmid,wt,avbr,avg,wmass`.
#[derive(Debug, Clone, Copy)]
pub struct MwdCsv<'a> {
    bins: &'a [MwdBin],
}

impl<'a> MwdCsv<'a> {
    pub fn new(bins: &'a [MwdBin]) -> Self {
        Self { bins }
    }

    pub fn from_distribution(dist: &'a Distribution) -> Self {
        Self::new(&dist.mwd)
    }
}

impl DistributionWriter for MwdCsv<'_> {
    type Error = MwdWriteError;

    fn write_to(&self, writer: &mut impl Write) -> Result<(), MwdWriteError> {
        let mut csv = csv::Writer::from_writer(writer);
        for bin in self.bins {
            csv.serialize(bin)?;
        }
        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn bins() -> Vec<MwdBin> {
        vec![
            MwdBin {
                lgmid: 3.5,
                wt: 0.25,
                avbr: 0.0,
                avg: 1.0,
                wmass: 100.0,
            },
            MwdBin {
                lgmid: 4.5,
                wt: 0.75,
                avbr: 1.5,
                avg: 0.8,
                wmass: 300.0,
            },
        ]
    }

    #[test]
    fn writes_header_and_one_row_per_bin() {
        let bins = bins();
        let mut out = Vec::new();
        MwdCsv::new(&bins).write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "lgmid,wt,avbr,avg,wmass");
        assert_eq!(lines[1], "3.5,0.25,0.0,1.0,100.0");
        assert_eq!(lines[2], "4.5,0.75,1.5,0.8,300.0");
    }

    #[test]
    fn distribution_bins_round_trip_through_a_file() {
        let dist = Distribution {
            mwd: bins(),
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();
        MwdCsv::from_distribution(&dist)
            .write_to_path(file.path())
            .unwrap();

        let mut reader = csv::Reader::from_path(file.path()).unwrap();
        let rows: Vec<Vec<f64>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|v| v.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![4.5, 0.75, 1.5, 0.8, 300.0]);
    }
}
