//! Fixed-width little-endian layout of a store file: one metadata block
//! followed by zero or more record blocks, in store order.

use crate::amount::{Amount, Cents};
use crate::date::Date;
use crate::error::{InexError, Result};
use crate::record::{Record, RecordId, RecordKind, COMMENT_LEN, ENTITY_LEN};

use std::io::{self, Read, Write};

pub const HEADER_MAGIC: &str = "inex-file-header";
pub const FOOTER_MAGIC: &str = "inex-file-footer";

const MAGIC_LEN: usize = 32;
const FILE_NAME_LEN: usize = 32;

/// magic, name, next id, count, income, expense, magic
pub const METADATA_SIZE: usize = MAGIC_LEN + FILE_NAME_LEN + 4 + 4 + 8 + 8 + MAGIC_LEN;
/// id, kind, day, month, year, amount, entity, comment
pub const RECORD_SIZE: usize = 4 + 4 + 4 * 3 + 8 + ENTITY_LEN + COMMENT_LEN;

/// Bookkeeping block at the head of every store file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub file_name: String,
    pub next_id: RecordId,
    pub record_count: u32,
    pub total_income: Cents,
    pub total_expense: Cents,
}

impl Metadata {
    pub fn new(file_name: &str) -> Self {
        Metadata {
            file_name: file_name.to_string(),
            next_id: 1,
            record_count: 0,
            total_income: Cents::zero(),
            total_expense: Cents::zero(),
        }
    }
}

fn corrupt<S: Into<String>>(msg: S) -> InexError {
    InexError::CorruptFile(msg.into())
}

struct FieldWriter<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> FieldWriter<'b> {
    fn new(buf: &'b mut [u8]) -> Self {
        FieldWriter { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn put_u32(&mut self, val: u32) {
        self.put(&val.to_le_bytes());
    }

    fn put_i32(&mut self, val: i32) {
        self.put(&val.to_le_bytes());
    }

    fn put_i64(&mut self, val: i64) {
        self.put(&val.to_le_bytes());
    }

    /// NUL padded, the caller guarantees `s` is shorter than `width`.
    fn put_str(&mut self, s: &str, width: usize) {
        let field = &mut self.buf[self.pos..self.pos + width];
        field.fill(0);
        field[..s.len()].copy_from_slice(s.as_bytes());
        self.pos += width;
    }
}

struct FieldReader<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> FieldReader<'b> {
    fn new(buf: &'b [u8]) -> Self {
        FieldReader { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn get_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn get_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    fn get_i64(&mut self) -> i64 {
        i64::from_le_bytes(self.take())
    }

    fn get_str(&mut self, width: usize, field: &str) -> Result<String> {
        let raw = &self.buf[self.pos..self.pos + width];
        self.pos += width;
        let len = raw
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| corrupt(format!("{} is not NUL terminated", field)))?;
        String::from_utf8(raw[..len].to_vec())
            .map_err(|_| corrupt(format!("{} is not valid UTF-8", field)))
    }
}

pub fn encode_metadata(meta: &Metadata) -> [u8; METADATA_SIZE] {
    let mut buf = [0u8; METADATA_SIZE];
    let mut w = FieldWriter::new(&mut buf);
    w.put_str(HEADER_MAGIC, MAGIC_LEN);
    w.put_str(&meta.file_name, FILE_NAME_LEN);
    w.put_u32(meta.next_id);
    w.put_u32(meta.record_count);
    w.put_i64(meta.total_income.0);
    w.put_i64(meta.total_expense.0);
    w.put_str(FOOTER_MAGIC, MAGIC_LEN);
    buf
}

pub fn decode_metadata(buf: &[u8; METADATA_SIZE]) -> Result<Metadata> {
    let mut r = FieldReader::new(buf);
    if r.get_str(MAGIC_LEN, "header magic")? != HEADER_MAGIC {
        return Err(corrupt("header magic mismatch"));
    }
    let file_name = r.get_str(FILE_NAME_LEN, "file name")?;
    let next_id = r.get_u32();
    let record_count = r.get_u32();
    let total_income = Cents(r.get_i64());
    let total_expense = Cents(r.get_i64());
    if r.get_str(MAGIC_LEN, "footer magic")? != FOOTER_MAGIC {
        return Err(corrupt("footer magic mismatch"));
    }
    if next_id == 0 || total_income.is_negative() || total_expense.is_negative() {
        return Err(corrupt("metadata counters out of range"));
    }

    Ok(Metadata {
        file_name,
        next_id,
        record_count,
        total_income,
        total_expense,
    })
}

pub fn encode_record(record: &Record) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    let mut w = FieldWriter::new(&mut buf);
    w.put_u32(record.id);
    w.put_i32(record.kind.raw());
    w.put_i32(record.date.day() as i32);
    w.put_i32(record.date.month() as i32);
    w.put_i32(record.date.year());
    w.put_i64(record.amount.cents());
    w.put_str(&record.entity, ENTITY_LEN);
    w.put_str(&record.comment, COMMENT_LEN);
    buf
}

pub fn decode_record(buf: &[u8; RECORD_SIZE]) -> Result<Record> {
    let mut r = FieldReader::new(buf);
    let id = r.get_u32();
    let kind = RecordKind::from_raw(r.get_i32());
    let (day, month, year) = (r.get_i32(), r.get_i32(), r.get_i32());
    let cents = r.get_i64();

    let date = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(month, day)| Date::from_ymd(year, month, day))
        .ok_or_else(|| corrupt(format!("record {} has an invalid date", id)))?;
    let amount = Amount::from_cents(cents)
        .ok_or_else(|| corrupt(format!("record {} has an invalid amount", id)))?;

    Ok(Record {
        id,
        kind,
        date,
        amount,
        entity: r.get_str(ENTITY_LEN, "entity")?,
        comment: r.get_str(COMMENT_LEN, "comment")?,
    })
}

/// Fill `buf` from `r`, returning how many bytes arrived before end of file.
fn read_block<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub fn read_metadata<R: Read>(r: &mut R) -> Result<Metadata> {
    let mut buf = [0u8; METADATA_SIZE];
    let got = read_block(r, &mut buf)?;
    if got < METADATA_SIZE {
        return Err(corrupt(format!(
            "metadata block is {} bytes, expected {}",
            got, METADATA_SIZE
        )));
    }
    decode_metadata(&buf)
}

/// Streams record blocks until a clean end of file. A block cut short is a
/// [`InexError::ReadError`].
pub struct RecordReader<R> {
    inner: R,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        RecordReader { inner, done: false }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = [0u8; RECORD_SIZE];
        let item = match read_block(&mut self.inner, &mut buf) {
            Ok(0) => {
                self.done = true;
                return None;
            }
            Ok(RECORD_SIZE) => decode_record(&buf),
            Ok(got) => Err(InexError::ReadError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record block is {} bytes, expected {}", got, RECORD_SIZE),
            ))),
            Err(e) => Err(InexError::ReadError(e)),
        };
        self.done = item.is_err();
        Some(item)
    }
}

pub fn write_store<'r, W, I>(w: &mut W, meta: &Metadata, records: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'r Record>,
{
    w.write_all(&encode_metadata(meta))?;
    for record in records {
        w.write_all(&encode_record(record))?;
    }
    w.flush()
}
