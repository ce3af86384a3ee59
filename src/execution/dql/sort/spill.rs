use crate::errors::DatabaseError;
use crate::execution::dql::sort::merge::KeyedTuple;
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn spill_error(err: bincode::Error) -> DatabaseError {
    match *err {
        bincode::ErrorKind::Io(err) => DatabaseError::SpillIO(err),
        err => DatabaseError::Bincode(Box::new(err)),
    }
}

/// A sorted run written to a temporary file. The file is removed when the
/// segment, or the reader made from it, is dropped.
pub(crate) struct SpillSegment {
    file: NamedTempFile,
    len: usize,
}

impl SpillSegment {
    pub(crate) fn write(rows: Vec<KeyedTuple>, dir: &Path) -> Result<Self, DatabaseError> {
        let file = tempfile::Builder::new()
            .prefix("ordersql-sort-")
            .tempfile_in(dir)
            .map_err(DatabaseError::SpillIO)?;
        let len = rows.len();
        {
            let mut writer = BufWriter::new(file.as_file());

            for row in rows.iter() {
                bincode::serialize_into(&mut writer, row).map_err(spill_error)?;
            }
            writer.flush().map_err(DatabaseError::SpillIO)?;
        }
        debug!("[Sort]: spilled {} rows to {}", len, file.path().display());

        Ok(SpillSegment { file, len })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn into_reader(self) -> Result<SegmentReader, DatabaseError> {
        let reader = BufReader::new(self.file.reopen().map_err(DatabaseError::SpillIO)?);

        Ok(SegmentReader {
            reader,
            remaining: self.len,
            _file: self.file,
        })
    }
}

pub(crate) struct SegmentReader {
    reader: BufReader<File>,
    remaining: usize,
    _file: NamedTempFile,
}

impl Iterator for SegmentReader {
    type Item = Result<KeyedTuple, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        match bincode::deserialize_from(&mut self.reader) {
            Ok(row) => Some(Ok(row)),
            Err(err) => {
                self.remaining = 0;
                Some(Err(spill_error(err)))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::errors::DatabaseError;
    use crate::execution::dql::sort::spill::SpillSegment;
    use crate::types::tuple::Tuple;
    use crate::types::value::DataValue;
    use itertools::Itertools;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_segment_removed_on_drop() -> Result<(), DatabaseError> {
        let temp_dir = TempDir::new().expect("unable to create temporary working directory");
        let rows = (0..10)
            .map(|i| {
                let value = Arc::new(DataValue::Int32(Some(i)));
                (
                    vec![value.clone()],
                    Tuple::new(Some(vec![i as u8]), vec![value, Arc::new(DataValue::Utf8(None))]),
                )
            })
            .collect_vec();

        let segment = SpillSegment::write(rows.clone(), temp_dir.path())?;
        assert_eq!(segment.len(), 10);
        assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 1);

        let mut reader = segment.into_reader()?;
        assert_eq!(reader.next().transpose()?, Some(rows[0].clone()));
        drop(reader);
        assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);

        let read = SpillSegment::write(rows.clone(), temp_dir.path())?
            .into_reader()?
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(read, rows);

        Ok(())
    }
}
