use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use dataops_core::Table;

/// Write a table as CSV: a header row in column order, then one record per row.
///
/// Nulls are written as empty cells. Returns the number of bytes written.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<u64, csv::Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(csv::Error::from)?;
    }
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(table.columns())?;
    for row_index in 0..table.len() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|column| table.value(row_index, column).to_csv())
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataops_core::{Row, Value};

    #[test]
    fn writes_header_and_empty_cells_for_nulls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("sample.csv");
        let mut table = Table::new(vec!["id".to_string(), "age".to_string()]);
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from("a"));
        row.insert("age".to_string(), Value::Null);
        table.push_row(row).expect("row");

        let bytes = write_table_csv(&path, &table).expect("write");
        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "id,age\na,\n");
        assert_eq!(bytes, contents.len() as u64);
    }
}
