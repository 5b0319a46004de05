use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use memchr::{memchr, memchr3};

use crate::error::{Error, Result};
use crate::reader::Terminator;

const DEFAULT_BUFFER_CAPACITY: usize = 8 * (1 << 10);

/// The quoting style to use when writing CSV data.
#[derive(Clone, Copy, Debug)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, delimiter or record
    /// terminator.
    ///
    /// This is the default.
    Necessary,
    /// This *never* writes quotes.
    ///
    /// If a field requires quotes, then the writer reports an error.
    Never,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// Builds a CSV writer with various configuration knobs.
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    delimiter: u8,
    quote: u8,
    terminator: Terminator,
    style: QuoteStyle,
    buffer_capacity: usize,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            delimiter: b',',
            quote: b'"',
            terminator: Terminator::Any(b'\n'),
            style: QuoteStyle::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring a CSV writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.quote = quote;
        self
    }

    /// The record terminator to use when writing CSV.
    ///
    /// The default is `Terminator::Any(b'\n')`. Use `Terminator::CRLF` to
    /// end records with `\r\n`.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.terminator = term;
        self
    }

    /// The quoting style to use when writing CSV.
    ///
    /// The default is `QuoteStyle::Necessary`, which only uses quotes when
    /// they are needed to preserve the integrity of the data.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.style = style;
        self
    }

    /// The capacity, in bytes, of the internal write buffer.
    pub fn buffer_capacity(&mut self, amount: usize) -> &mut WriterBuilder {
        self.buffer_capacity = amount;
        self
    }

    /// Build a CSV writer that writes to the `io::Write` given.
    ///
    /// Note that the CSV writer does its own buffering; there is no need to
    /// wrap `wtr` in a `BufWriter`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer {
            wtr: io::BufWriter::with_capacity(self.buffer_capacity, wtr),
            delimiter: self.delimiter,
            quote: self.quote,
            term: self.terminator,
            style: self.style,
        }
    }

    /// Build a CSV writer that writes to the file path given.
    ///
    /// The file is created if it does not exist and truncated otherwise.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        Ok(self.from_writer(File::create(path)?))
    }
}

/// A CSV writer.
///
/// The writer quotes and escapes fields so that the output re-parses to
/// exactly the records given: a field containing the delimiter, the quote
/// character or a line break is wrapped in quotes, and quote characters
/// inside it are doubled. Fields that need none of that are written
/// unchanged.
///
/// The writer keeps no state across records beyond its configuration and
/// the buffered sink, so it can be driven record by record while streaming.
///
/// # Example
///
/// ```
/// use tinycsv::Writer;
///
/// # fn run() -> tinycsv::Result<()> {
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_record(&["city", "country", "pop"])?;
/// wtr.write_record(&["Boston", "United States", "4628910"])?;
/// let data = wtr.into_inner()?;
/// assert_eq!(data, b"city,country,pop\nBoston,United States,4628910\n");
/// # Ok(()) }
/// # run().unwrap();
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: io::BufWriter<W>,
    delimiter: u8,
    quote: u8,
    term: Terminator,
    style: QuoteStyle,
}

impl<W: io::Write> Writer<W> {
    /// Create a new CSV writer with a default configuration that writes to
    /// `wtr`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }
}

impl Writer<File> {
    /// Create a new CSV writer with a default configuration that writes to
    /// the file path given.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    /// Write a single record.
    ///
    /// The record may be any iterator over string-like fields, including a
    /// [`StringRecord`](crate::StringRecord) produced by the reader, so a
    /// read-transform-write pipeline needs no conversions.
    ///
    /// A record must have at least one field. A record with a single empty
    /// field is written as `""` rather than a bare terminator, so consumers
    /// that skip blank lines still see it.
    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut count = 0;
        let mut last_len = 0;
        for field in record {
            if count > 0 {
                self.wtr.write_all(&[self.delimiter])?;
            }
            count += 1;
            let field = field.as_ref().as_bytes();
            last_len = field.len();
            self.write_field(field)?;
        }
        if count == 0 {
            return Err(Error::Write(
                "records must have at least one field".to_string(),
            ));
        }
        if count == 1 && last_len == 0 {
            if let QuoteStyle::Necessary = self.style {
                self.wtr.write_all(&[self.quote, self.quote])?;
            }
        }
        self.write_terminator()?;
        Ok(())
    }

    /// Write every record of an iterator.
    ///
    /// This is a convenience for calling [`write_record`] in a loop; if any
    /// record fails to write, writing stops and that error is returned.
    ///
    /// [`write_record`]: Writer::write_record
    pub fn write_rows<I, R, T>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for row in rows {
            self.write_record(row)?;
        }
        Ok(())
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.wtr.flush()
    }

    /// Flush the internal buffer and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.wtr.into_inner().map_err(|err| Error::Io(err.into_error()))
    }

    fn write_field(&mut self, field: &[u8]) -> Result<()> {
        if !self.should_quote(field)? {
            self.wtr.write_all(field)?;
            return Ok(());
        }
        self.wtr.write_all(&[self.quote])?;
        let mut rest = field;
        while let Some(i) = memchr(self.quote, rest) {
            self.wtr.write_all(&rest[..i])?;
            self.wtr.write_all(&[self.quote, self.quote])?;
            rest = &rest[i + 1..];
        }
        self.wtr.write_all(rest)?;
        self.wtr.write_all(&[self.quote])?;
        Ok(())
    }

    fn should_quote(&self, field: &[u8]) -> Result<bool> {
        match self.style {
            QuoteStyle::Always => Ok(true),
            QuoteStyle::Necessary => Ok(self.needs_quotes(field)),
            QuoteStyle::Never => {
                if !self.needs_quotes(field) {
                    Ok(false)
                } else {
                    Err(Error::Write(format!(
                        "field requires quotes, but quoting is disabled: \
                         {:?}",
                        String::from_utf8_lossy(field),
                    )))
                }
            }
        }
    }

    fn needs_quotes(&self, field: &[u8]) -> bool {
        // `\r` and `\n` are always quoted, whatever the configured
        // terminator: the reader treats both as record terminators by
        // default.
        if memchr3(self.delimiter, self.quote, b'\n', field).is_some()
            || memchr(b'\r', field).is_some()
        {
            return true;
        }
        match self.term {
            Terminator::CRLF => false,
            Terminator::Any(t) => memchr(t, field).is_some(),
        }
    }

    fn write_terminator(&mut self) -> Result<()> {
        match self.term {
            Terminator::CRLF => self.wtr.write_all(b"\r\n")?,
            Terminator::Any(t) => self.wtr.write_all(&[t])?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::reader::Terminator;

    use super::{QuoteStyle, Writer, WriterBuilder};

    fn written<F>(f: F) -> String
    where
        F: FnOnce(&mut Writer<Vec<u8>>) -> crate::Result<()>,
    {
        let mut wtr = Writer::from_writer(vec![]);
        f(&mut wtr).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn plain_fields_stay_unquoted() {
        let out = written(|w| w.write_record(&["a", "b", "c"]));
        assert_eq!(out, "a,b,c\n");
    }

    #[test]
    fn delimiter_forces_quotes() {
        let out = written(|w| w.write_record(&["hello,world", "42"]));
        assert_eq!(out, "\"hello,world\",42\n");
    }

    #[test]
    fn quotes_are_doubled() {
        let out = written(|w| w.write_record(&["He said \"ok\"", "5"]));
        assert_eq!(out, "\"He said \"\"ok\"\"\",5\n");
    }

    #[test]
    fn newline_forces_quotes() {
        let out = written(|w| w.write_record(&["line1\nline2", "x"]));
        assert_eq!(out, "\"line1\nline2\",x\n");
    }

    #[test]
    fn carriage_return_forces_quotes() {
        let out = written(|w| w.write_record(&["a\rb"]));
        assert_eq!(out, "\"a\rb\"\n");
    }

    #[test]
    fn empty_fields() {
        let out = written(|w| w.write_record(&["a", "", "c"]));
        assert_eq!(out, "a,,c\n");
    }

    #[test]
    fn lone_empty_field_is_quoted() {
        let out = written(|w| w.write_record(&[""]));
        assert_eq!(out, "\"\"\n");
    }

    #[test]
    fn zero_field_record_is_an_error() {
        let mut wtr = Writer::from_writer(vec![]);
        let fields: [&str; 0] = [];
        let err = wtr.write_record(&fields).unwrap_err();
        assert!(matches!(err, Error::Write(_)));
    }

    #[test]
    fn write_rows_writes_each_record() {
        let out = written(|w| {
            w.write_rows(vec![vec!["a", "b"], vec!["c", "d"]])
        });
        assert_eq!(out, "a,b\nc,d\n");
    }

    #[test]
    fn crlf_terminator() {
        let out = {
            let mut wtr = WriterBuilder::new()
                .terminator(Terminator::CRLF)
                .from_writer(vec![]);
            wtr.write_record(&["a", "b"]).unwrap();
            String::from_utf8(wtr.into_inner().unwrap()).unwrap()
        };
        assert_eq!(out, "a,b\r\n");
    }

    #[test]
    fn custom_terminator_forces_quotes() {
        let mut wtr = WriterBuilder::new()
            .terminator(Terminator::Any(b';'))
            .from_writer(vec![]);
        wtr.write_record(&["a;b", "c"]).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "\"a;b\",c;");
    }

    #[test]
    fn custom_delimiter_and_quote() {
        let mut wtr = WriterBuilder::new()
            .delimiter(b';')
            .quote(b'\'')
            .from_writer(vec![]);
        wtr.write_record(&["a;b", "it's"]).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "'a;b';'it''s'\n");
    }

    #[test]
    fn quote_style_always() {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(vec![]);
        wtr.write_record(&["a", ""]).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "\"a\",\"\"\n");
    }

    #[test]
    fn quote_style_never_passes_plain_fields() {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .from_writer(vec![]);
        wtr.write_record(&["a", "b"]).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "a,b\n");
    }

    #[test]
    fn quote_style_never_rejects_special_fields() {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .from_writer(vec![]);
        let err = wtr.write_record(&["a,b"]).unwrap_err();
        assert!(matches!(err, Error::Write(_)));
    }

    #[test]
    fn flush_makes_output_visible() {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_record(&["a"]).unwrap();
        wtr.flush().unwrap();
        assert_eq!(wtr.wtr.get_ref(), b"a\n");
    }
}
