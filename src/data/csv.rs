// CSV data source and sink implementation
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::{DataError, DataSink, DataSource, DataType, Field, Row, Schema, Table, Value};

/// Cell texts read as missing values, compared ignoring ASCII case
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "null"];

/// Where a [`CsvSource`] reads from
#[derive(Debug, Clone)]
enum CsvInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// CSV data source with a header row and per-column type inference
#[derive(Debug, Clone)]
pub struct CsvSource {
    input: CsvInput,
    name: String,
    delimiter: u8,
}

impl CsvSource {
    /// Create a CSV source reading from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        CsvSource {
            name: path.to_string_lossy().to_string(),
            input: CsvInput::Path(path),
            delimiter: b',',
        }
    }

    /// Create a CSV source over uploaded bytes
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Self {
        CsvSource {
            input: CsvInput::Bytes(bytes),
            name: name.to_string(),
            delimiter: b',',
        }
    }

    /// Use a delimiter other than `,`
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn parse<R: Read>(&self, reader: R) -> Result<Table, DataError> {
        let mut csv_reader = ::csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(map_csv_error)?
            .iter()
            .map(|s| s.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DataError::EmptyInput);
        }

        let mut cells: Vec<Vec<Option<String>>> = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(map_csv_error)?;
            if record.len() != headers.len() {
                return Err(DataError::ParseError(format!(
                    "line {}: expected {} fields, found {}",
                    record.position().map_or(0, |p| p.line()),
                    headers.len(),
                    record.len()
                )));
            }

            cells.push(
                record
                    .iter()
                    .map(|field| {
                        if NULL_MARKERS.iter().any(|m| m.eq_ignore_ascii_case(field)) {
                            None
                        } else {
                            Some(field.to_string())
                        }
                    })
                    .collect(),
            );
        }

        let types: Vec<DataType> = (0..headers.len())
            .map(|col| infer_type(cells.iter().map(|row| row[col].as_deref())))
            .collect();

        let fields: Vec<Field> = headers
            .iter()
            .zip(&types)
            .map(|(name, data_type)| Field::new(name.clone(), *data_type, true))
            .collect();

        let mut table = Table::new(Schema::new(fields));
        for row in cells {
            let values = row
                .into_iter()
                .zip(&types)
                .map(|(cell, data_type)| convert(cell, *data_type))
                .collect();
            table.add_row(Row::new(values))?;
        }

        table.metadata.add("source".to_string(), "csv".to_string());
        table.metadata.add("name".to_string(), self.name.clone());

        debug!(
            "Parsed '{}': {} rows, {} columns",
            self.name,
            table.len(),
            table.column_count()
        );

        Ok(table)
    }
}

impl DataSource for CsvSource {
    fn read(&self) -> Result<Table, DataError> {
        match &self.input {
            CsvInput::Path(path) => {
                let file = File::open(path)?;
                self.parse(BufReader::new(file))
            }
            CsvInput::Bytes(bytes) => self.parse(bytes.as_slice()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Integer if every present cell parses as `i64`, float if every present
/// cell parses as `f64`, string otherwise. A column with no present cells
/// is float, matching how an all-missing numeric column reads. Spellings of
/// infinity are not present cells; they load as nulls in numeric columns.
fn infer_type<'a, I>(cells: I) -> DataType
where
    I: Iterator<Item = Option<&'a str>>,
{
    let mut data_type = DataType::Float;
    let mut seen = false;

    for cell in cells.flatten().filter(|cell| !is_non_finite(cell)) {
        if !seen {
            data_type = DataType::Integer;
            seen = true;
        }

        if data_type == DataType::Integer && cell.parse::<i64>().is_err() {
            data_type = DataType::Float;
        }

        if data_type == DataType::Float && cell.parse::<f64>().is_err() {
            return DataType::String;
        }
    }

    data_type
}

fn is_non_finite(cell: &str) -> bool {
    cell.parse::<f64>().map_or(false, |v| !v.is_finite())
}

fn convert(cell: Option<String>, data_type: DataType) -> Value {
    let Some(text) = cell else {
        return Value::Null;
    };

    match data_type {
        DataType::Integer => text.parse().map(Value::Integer).unwrap_or(Value::Null),
        DataType::Float => text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map_or(Value::Null, Value::Float),
        DataType::String => Value::String(text),
    }
}

fn map_csv_error(err: ::csv::Error) -> DataError {
    match err.kind() {
        ::csv::ErrorKind::Utf8 { .. } => DataError::EncodingError(err.to_string()),
        _ => DataError::ParseError(err.to_string()),
    }
}

/// CSV data sink writing to a file
pub struct CsvSink {
    path: PathBuf,
    name: String,
    delimiter: u8,
}

impl CsvSink {
    /// Create a new CSV data sink
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        CsvSink {
            name: path.to_string_lossy().to_string(),
            path,
            delimiter: b',',
        }
    }

    /// Use a delimiter other than `,`
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl DataSink for CsvSink {
    fn write(&self, table: &Table) -> Result<(), DataError> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        write_csv(&mut writer, table, self.delimiter)?;
        writer.flush()?;

        info!("Wrote {} rows to '{}'", table.len(), self.name);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Write a header row followed by one record per row, no index column
pub fn write_csv<W: Write>(writer: W, table: &Table, delimiter: u8) -> Result<(), DataError> {
    let mut csv_writer = ::csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv_writer
        .write_record(table.column_names())
        .map_err(map_csv_error)?;

    for row in &table.data {
        let record: Vec<String> = row.values.iter().map(Value::to_csv_field).collect();
        csv_writer.write_record(&record).map_err(map_csv_error)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Parse uploaded CSV bytes into a table
pub fn load(bytes: &[u8]) -> Result<Table, DataError> {
    CsvSource::from_bytes("upload", bytes.to_vec()).read()
}

/// Render a table as comma-separated UTF-8 bytes
pub fn serialize_csv(table: &Table) -> Result<Vec<u8>, DataError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, table, b',')?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
MAKE,ENGINESIZE,CYLINDERS,CO2EMISSIONS
ACURA,2.0,4,196
FORD,3.5,6,
BMW,,8,300
";

    #[test]
    fn infers_column_types() {
        let table = load(SAMPLE.as_bytes()).unwrap();
        let types: Vec<DataType> = table.schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![
                DataType::String,
                DataType::Float,
                DataType::Integer,
                DataType::Integer
            ]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.data[1].values[3], Value::Null);
        assert_eq!(table.data[2].values[1], Value::Null);
    }

    #[test]
    fn mixed_integer_and_float_cells_become_float() {
        let table = load(b"X\n1\n2.5\n").unwrap();
        assert_eq!(table.schema.fields[0].data_type, DataType::Float);
        assert_eq!(table.data[0].values[0], Value::Float(1.0));
    }

    #[test]
    fn non_finite_cells_load_as_nulls() {
        let table = load(b"ENGINESIZE,CYLINDERS\n2.0,4\nNAN,inf\n3.0,6\n-Infinity,8\n").unwrap();
        assert_eq!(table.schema.fields[0].data_type, DataType::Float);
        assert_eq!(table.schema.fields[1].data_type, DataType::Integer);
        assert_eq!(table.data[1].values, vec![Value::Null, Value::Null]);
        assert_eq!(table.data[3].values[0], Value::Null);

        let reloaded = load(&serialize_csv(&table).unwrap()).unwrap();
        assert_eq!(reloaded.data, table.data);
    }

    #[test]
    fn infinity_in_text_column_stays_text() {
        let table = load(b"MODEL\nINF\nCAMRY\n").unwrap();
        assert_eq!(table.data[0].values[0], Value::String("INF".to_string()));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(load(b""), Err(DataError::EmptyInput)));
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let err = load(b"A,B\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, DataError::ParseError(_)));
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let err = load(b"A,B\n\xff\xfe,1\n").unwrap_err();
        assert!(matches!(err, DataError::EncodingError(_)));
    }

    #[test]
    fn header_only_input_has_no_rows() {
        let table = load(b"MAKE,ENGINESIZE\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn serialize_writes_header_and_rows_in_order() {
        let table = load(SAMPLE.as_bytes()).unwrap();
        let bytes = serialize_csv(&table).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), SAMPLE);
    }

    #[test]
    fn serialize_then_load_reproduces_table() {
        let table = load(SAMPLE.as_bytes()).unwrap();
        let reloaded = load(&serialize_csv(&table).unwrap()).unwrap();
        assert_eq!(reloaded.schema, table.schema);
        assert_eq!(reloaded.data, table.data);
    }

    #[test]
    fn sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = load(SAMPLE.as_bytes()).unwrap();

        CsvSink::new(&path).write(&table).unwrap();

        let reread = CsvSource::from_path(&path).read().unwrap();
        assert_eq!(reread.data, table.data);
    }

    #[test]
    fn semicolon_delimiter() {
        let source = CsvSource::from_bytes("semi", b"A;B\nx;1\n".to_vec()).with_delimiter(b';');
        let table = source.read().unwrap();
        assert_eq!(table.column_names(), vec!["A", "B"]);
        assert_eq!(table.data[0].values[1], Value::Integer(1));
    }
}
