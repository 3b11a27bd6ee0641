use std::io::{self, Write};

use clientela_core::Record;

/// Column names, written once before any record.
pub const HEADER: [&str; 11] = [
    "cedula",
    "nombre1",
    "nombre2",
    "apellido1",
    "apellido2",
    "sexo",
    "provincia",
    "canton",
    "parroquia",
    "edad",
    "correo",
];

/// Streams rows into `W`. Fields are quoted only when they contain a comma,
/// a double quote or a line break; rows end with `\n`.
pub struct RowWriter<W: Write> {
    writer: csv::Writer<CountingWriter<W>>,
}

impl<W: Write> RowWriter<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(CountingWriter::new(inner));
        Self { writer }
    }

    pub fn write_header(&mut self) -> Result<(), csv::Error> {
        self.writer.write_record(HEADER)
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), csv::Error> {
        let age = record.age.to_string();
        self.writer.write_record([
            record.cedula.as_str(),
            record.given_name1.as_str(),
            record.given_name2.as_str(),
            record.surname1.as_str(),
            record.surname2.as_str(),
            record.sex.label(),
            record.location.province(),
            record.location.canton(),
            record.location.parish(),
            age.as_str(),
            record.email.as_str(),
        ])
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Bytes handed to the underlying writer so far. Rows still buffered
    /// are not counted until the next flush.
    pub fn bytes_written(&self) -> u64 {
        self.writer.get_ref().bytes_written()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        let counting = self
            .writer
            .into_inner()
            .map_err(|err| err.into_error())?;
        Ok(counting.inner)
    }
}

/// Encode a single record as one newline-terminated row.
pub fn encode(record: &Record) -> Result<String, csv::Error> {
    let mut writer = RowWriter::new(Vec::new());
    writer.write_record(record)?;
    let bytes = writer.into_inner()?;
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
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
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
