// CSV data source and sink implementation
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::{DataError, DataFrame, DataSink, DataSource, Schema};

/// Convert a delimiter to the byte the csv crate expects
pub fn delimiter_byte(delimiter: char) -> Result<u8, DataError> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(DataError::InvalidDelimiter(delimiter))
}

/// CSV data source.
///
/// Every record becomes exactly one [`DataFrame::insert`]; a field that does not
/// parse as its column's type aborts the whole load.
pub struct CsvSource {
    path: PathBuf,
    name: String,
    has_header: bool,
    delimiter: char,
}

impl CsvSource {
    /// Create a new CSV data source
    pub fn new<P: AsRef<Path>>(path: P, has_header: bool, delimiter: char) -> Self {
        CsvSource {
            path: path.as_ref().to_path_buf(),
            name: path.as_ref().to_string_lossy().to_string(),
            has_header,
            delimiter,
        }
    }
}

impl DataSource for CsvSource {
    fn load(&self, schema: &Schema) -> Result<DataFrame, DataError> {
        let delimiter = delimiter_byte(self.delimiter)?;
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut frame = DataFrame::new(schema.clone());

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            if record.len() != schema.len() {
                debug!("line {} has {} fields, expected {}", line, record.len(), schema.len());
                return Err(DataError::ArityMismatch {
                    expected: schema.len(),
                    found: record.len(),
                });
            }

            let mut values = Vec::with_capacity(schema.len());
            for (field, text) in schema.fields().iter().zip(record.iter()) {
                let value = field
                    .data_type
                    .parse_value(text)
                    .ok_or_else(|| DataError::Conversion {
                        line,
                        column: field.name.clone(),
                        value: text.to_string(),
                        data_type: field.data_type,
                    })?;
                values.push(value);
            }

            frame.insert(values)?;
        }

        info!("loaded {} rows from {}", frame.size(), self.name);
        Ok(frame)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// CSV data sink
pub struct CsvSink {
    path: PathBuf,
    name: String,
    delimiter: char,
}

impl CsvSink {
    /// Create a new CSV data sink
    pub fn new<P: AsRef<Path>>(path: P, delimiter: char) -> Self {
        CsvSink {
            path: path.as_ref().to_path_buf(),
            name: path.as_ref().to_string_lossy().to_string(),
            delimiter,
        }
    }
}

impl DataSink for CsvSink {
    fn write(&self, frame: &DataFrame) -> Result<(), DataError> {
        let delimiter = delimiter_byte(self.delimiter)?;
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        csv_writer.write_record(frame.column_names())?;

        for row in frame.rows() {
            let record: Vec<String> = row.values.iter().map(ToString::to_string).collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        info!("wrote {} rows to {}", frame.size(), self.name);

        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
