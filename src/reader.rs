use std::cmp;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str;

use crate::error::{Error, Result, Utf8Error};
use crate::string_record::StringRecord;

const DEFAULT_BUFFER_CAPACITY: usize = 8 * (1 << 10);

/// A record terminator.
///
/// Use this to specify the record terminator while parsing CSV. The default
/// is CRLF, which treats `\r`, `\n` or `\r\n` as a single record terminator.
#[derive(Clone, Copy, Debug)]
pub enum Terminator {
    /// Parses `\r`, `\n` or `\r\n` as a single record terminator.
    CRLF,
    /// Parses the byte given as a record terminator.
    Any(u8),
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::CRLF
    }
}

/// The position of a record in CSV data.
///
/// Byte offsets start at `0` and count bytes consumed from the underlying
/// reader. Line and record numbers both start at `1`; the record number is
/// the number of the record currently being parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    byte: u64,
    line: u64,
    record: u64,
}

impl Position {
    fn new() -> Position {
        Position { byte: 0, line: 1, record: 1 }
    }

    /// The byte offset, starting at `0`.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The record number, starting at `1`.
    pub fn record(&self) -> u64 {
        self.record
    }
}

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, record terminator
/// and more.
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    delimiter: u8,
    quote: u8,
    terminator: Terminator,
    buffer_capacity: usize,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            delimiter: b',',
            quote: b'"',
            terminator: Terminator::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring a CSV reader.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// Since the reader is mostly encoding agnostic, the delimiter is a
    /// single ASCII byte. For example, to read tab-delimited data, use
    /// `b'\t'`.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.delimiter = delimiter;
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.quote = quote;
        self
    }

    /// The record terminator to use when parsing CSV.
    ///
    /// The default is `Terminator::CRLF`, which treats `\r`, `\n` or `\r\n`
    /// as a single record terminator. Use `Terminator::Any(b'\n')` to accept
    /// line feeds only, in which case a `\r` is an ordinary field byte.
    pub fn terminator(&mut self, term: Terminator) -> &mut ReaderBuilder {
        self.terminator = term;
        self
    }

    /// The capacity, in bytes, of the internal read buffer.
    pub fn buffer_capacity(&mut self, amount: usize) -> &mut ReaderBuilder {
        self.buffer_capacity = amount;
        self
    }

    /// Build a CSV reader from an arbitrary `io::Read`.
    ///
    /// Note that the CSV reader does its own buffering; there is no need to
    /// wrap `rdr` in a `BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<R> {
        Reader {
            rdr,
            buf: vec![0; cmp::max(1, self.buffer_capacity)],
            bufi: 0,
            buflen: 0,
            field: Vec::with_capacity(1024),
            state: State::Unquoted,
            eof: false,
            pos: Position::new(),
            delimiter: self.delimiter,
            quote: self.quote,
            term: self.terminator,
        }
    }

    /// Build a CSV reader that reads from the file path given.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        Ok(self.from_reader(File::open(path)?))
    }
}

/// A CSV reader.
///
/// The reader parses CSV data incrementally: records are produced one at a
/// time as the underlying reader is consumed, so memory use is bounded by
/// the largest record rather than the size of the input. A quoted field may
/// contain the delimiter, the record terminator and doubled quote
/// characters, all of which are resolved with a single byte of lookahead.
///
/// Records are read either with the pull method [`read_record`], which
/// reuses a caller-provided [`StringRecord`] allocation, or with the
/// [`records`]/[`into_records`] iterators.
///
/// [`read_record`]: Reader::read_record
/// [`records`]: Reader::records
/// [`into_records`]: Reader::into_records
///
/// # Example
///
/// ```
/// use tinycsv::Reader;
///
/// # fn run() -> tinycsv::Result<()> {
/// let data = "\
/// city,country,pop
/// Boston,United States,4628910
/// Concord,United States,42695
/// ";
/// let mut rdr = Reader::from_reader(data.as_bytes());
/// for result in rdr.records() {
///     let record = result?;
///     println!("{:?}", record);
/// }
/// # Ok(()) }
/// # run().unwrap();
/// ```
///
/// # Quirks of the grammar
///
/// A quote character only begins a quoted field at the start of a field.
/// Anywhere else in an unquoted field it is taken literally, as is any text
/// that follows a closing quote. Input that ends while a quoted field is
/// still open is an error, not a silently closed field.
#[derive(Debug)]
pub struct Reader<R> {
    /// The underlying byte source.
    rdr: R,
    /// The read buffer and the index/length of its unconsumed region.
    buf: Vec<u8>,
    bufi: usize,
    buflen: usize,
    /// Accumulates the bytes of the field currently being parsed.
    field: Vec<u8>,
    /// Whether the parser is inside a quoted field.
    state: State,
    /// Set once the underlying reader is exhausted.
    eof: bool,
    pos: Position,
    delimiter: u8,
    quote: u8,
    term: Terminator,
}

impl<R: io::Read> Reader<R> {
    /// Create a new CSV reader with a default configuration that reads from
    /// `rdr`.
    ///
    /// To configure the delimiter, quote character or record terminator, use
    /// [`ReaderBuilder`].
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }
}

impl Reader<File> {
    /// Create a new CSV reader with a default configuration that reads from
    /// the file path given.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: io::Read> Reader<R> {
    /// Read the next record into `record`.
    ///
    /// Returns `true` if a record was read and `false` once the input is
    /// exhausted. The given record is cleared first, so a single allocation
    /// can be reused across calls:
    ///
    /// ```
    /// use tinycsv::{Reader, StringRecord};
    ///
    /// # fn run() -> tinycsv::Result<()> {
    /// let mut rdr = Reader::from_reader("a,b\nc,d\n".as_bytes());
    /// let mut record = StringRecord::new();
    /// while rdr.read_record(&mut record)? {
    ///     println!("{:?}", record);
    /// }
    /// # Ok(()) }
    /// # run().unwrap();
    /// ```
    ///
    /// A record that is nothing but a terminator yields a single empty
    /// field; input without a trailing terminator yields the same final
    /// record as input with one.
    pub fn read_record(
        &mut self,
        record: &mut StringRecord,
    ) -> Result<bool> {
        record.clear();
        self.field.clear();
        self.state = State::Unquoted;
        if self.eof {
            return Ok(false);
        }
        loop {
            let b = match self.next_byte()? {
                Some(b) => b,
                None => {
                    self.eof = true;
                    if let State::Quoted = self.state {
                        // Surface the truncation; any fields parsed from
                        // the broken record are discarded with it.
                        record.clear();
                        return Err(Error::UnterminatedQuote {
                            pos: self.pos.clone(),
                        });
                    }
                    // A pending field or record flushes as a final record,
                    // so input need not end with a terminator.
                    if self.field.is_empty() && record.is_empty() {
                        return Ok(false);
                    }
                    self.flush_field(record)?;
                    self.pos.record += 1;
                    return Ok(true);
                }
            };
            match self.state {
                State::Unquoted => {
                    if b == self.quote && self.field.is_empty() {
                        // A quote begins a quoted field only at the start
                        // of a field; the quote itself is not data.
                        self.state = State::Quoted;
                    } else if b == self.delimiter {
                        self.flush_field(record)?;
                    } else if self.is_terminator(b)? {
                        self.flush_field(record)?;
                        self.pos.record += 1;
                        return Ok(true);
                    } else {
                        self.field.push(b);
                    }
                }
                State::Quoted => {
                    if b == self.quote {
                        if self.peek_byte()? == Some(self.quote) {
                            // A doubled quote is one literal quote.
                            self.next_byte()?;
                            self.field.push(self.quote);
                        } else {
                            self.state = State::Unquoted;
                        }
                    } else {
                        // Delimiters and terminators are ordinary bytes
                        // inside quotes.
                        self.field.push(b);
                    }
                }
            }
        }
    }

    /// Return a borrowed iterator over all records.
    ///
    /// Each item yielded is a `Result<StringRecord>`. The iterator stops
    /// after the input is exhausted or after the first error.
    pub fn records(&mut self) -> StringRecordsIter<'_, R> {
        StringRecordsIter { rdr: self, done: false }
    }

    /// Return an owned iterator over all records.
    pub fn into_records(self) -> StringRecordsIntoIter<R> {
        StringRecordsIntoIter { rdr: self, done: false }
    }

    /// Return the current position of the parser.
    ///
    /// The byte offset counts bytes consumed from the underlying reader,
    /// which is useful for error reporting and for measuring progress.
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Returns true once the underlying reader has been exhausted.
    pub fn is_done(&self) -> bool {
        self.eof
    }

    /// Flush the pending field buffer into `record` as a completed field.
    fn flush_field(&mut self, record: &mut StringRecord) -> Result<()> {
        match str::from_utf8(&self.field) {
            Ok(field) => record.push_field(field),
            Err(err) => {
                let err = Utf8Error::new(record.len(), err.valid_up_to());
                self.field.clear();
                record.clear();
                return Err(Error::Utf8 { pos: self.pos.clone(), err });
            }
        }
        self.field.clear();
        Ok(())
    }

    /// Whether `b` terminates a record, consuming the `\n` of a `\r\n` pair.
    fn is_terminator(&mut self, b: u8) -> Result<bool> {
        match self.term {
            Terminator::CRLF => {
                if b == b'\n' {
                    Ok(true)
                } else if b == b'\r' {
                    if self.peek_byte()? == Some(b'\n') {
                        self.next_byte()?;
                    }
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Terminator::Any(t) => Ok(b == t),
        }
    }

    /// Refill the buffer if it is exhausted. Returns false at end of input.
    fn fill_buf(&mut self) -> io::Result<bool> {
        if self.bufi < self.buflen {
            return Ok(true);
        }
        self.buflen = self.rdr.read(&mut self.buf)?;
        self.bufi = 0;
        Ok(self.buflen > 0)
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if !self.fill_buf()? {
            return Ok(None);
        }
        let b = self.buf[self.bufi];
        self.bufi += 1;
        self.pos.byte += 1;
        if b == b'\n' {
            self.pos.line += 1;
        }
        Ok(Some(b))
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        if !self.fill_buf()? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.bufi]))
    }
}

/// The parser's quoting state.
#[derive(Clone, Copy, Debug)]
enum State {
    /// Outside any quoted field.
    Unquoted,
    /// Inside a quoted field. The doubled-quote/closing-quote decision is
    /// made with one byte of lookahead while in this state.
    Quoted,
}

/// A borrowed iterator over records as strings.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// CSV reader.
pub struct StringRecordsIter<'r, R> {
    rdr: &'r mut Reader<R>,
    done: bool,
}

impl<'r, R: io::Read> Iterator for StringRecordsIter<'r, R> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Result<StringRecord>> {
        if self.done {
            return None;
        }
        let mut record = StringRecord::new();
        match self.rdr.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// An owned iterator over records as strings.
pub struct StringRecordsIntoIter<R> {
    rdr: Reader<R>,
    done: bool,
}

impl<R: io::Read> Iterator for StringRecordsIntoIter<R> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Result<StringRecord>> {
        if self.done {
            return None;
        }
        let mut record = StringRecord::new();
        match self.rdr.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
