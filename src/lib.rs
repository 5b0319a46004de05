/*!
The `tinycsv` crate provides a streaming CSV reader and writer.

The reader is a character-level state machine: it consumes its input one
buffered byte at a time and yields records lazily, so quoted fields may
contain delimiters, doubled quotes and even line breaks, and memory use is
bounded by the largest record rather than the size of the input. The writer
applies the complementary quoting rules, so that anything written can be
read back unchanged.

# Brief overview

The main types are [`Reader`] and [`Writer`], for reading and writing CSV
data. Both parse records as [`StringRecord`]s: ordered sequences of `String`
fields. [`ReaderBuilder`] and [`WriterBuilder`] configure the delimiter,
quote character, record terminator and quoting style.

Input and output are any [`std::io::Read`] and [`std::io::Write`]; both the
reader and the writer do their own buffering. Text is treated as UTF-8, with
ASCII-compatible delimiters.

# Example

This shows a simple round trip: write a few records, then read them back.

```
use tinycsv::{Reader, Writer};

# fn run() -> tinycsv::Result<()> {
let mut wtr = Writer::from_writer(vec![]);
wtr.write_record(&["name", "notes"])?;
wtr.write_record(&["tabby", "likes \"boxes\", naps"])?;
let data = wtr.into_inner()?;

let mut rdr = Reader::from_reader(&*data);
for result in rdr.records() {
    let record = result?;
    println!("{:?}", record);
}
# Ok(()) }
# run().unwrap();
```

# Error handling

All fallible operations return [`Result`]. I/O errors from the underlying
reader or writer are propagated unchanged; parse errors (input that ends
inside a quoted field, invalid UTF-8 in a field) carry the byte, line and
record position at which they occurred. There is no error recovery: a
malformed record fails the read pass rather than silently misaligning the
rows that follow.
*/

#![deny(missing_docs)]

pub use crate::error::{Error, Result, Utf8Error};
pub use crate::reader::{
    Position, Reader, ReaderBuilder, StringRecordsIntoIter,
    StringRecordsIter, Terminator,
};
pub use crate::string_record::{StringRecord, StringRecordIter};
pub use crate::writer::{QuoteStyle, Writer, WriterBuilder};

mod error;
mod reader;
mod string_record;
mod writer;
