use crate::{
    amount::{Cents, MAX_AMOUNT},
    codec::{self, Metadata, RecordReader},
    config::Config,
    date::Date,
    error::{InexError, Result},
    parser::{check_file_name, is_valid_file_name},
    query::{Aggregate, Filter, Selector, View},
    record::{NewRecord, Record, RecordId, RecordKind, RecordPatch},
};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const FILE_EXTENSION: &str = "bin";

/// What an [`edit`][Store::edit] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// The patch carried no field at all.
    NoChange,
    /// No record with that id.
    NotFound,
}

/// Summary of the whole store, straight from its running totals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Info {
    pub file_name: String,
    pub next_id: RecordId,
    pub record_count: u32,
    pub aggregate: Aggregate,
}

/// Records of one ledger file, most recent date first, plus the totals
/// kept in step with every change.
///
/// The store only touches the disk in [`create`][Store::create],
/// [`open`][Store::open], [`save`][Store::save], [`remove`][Store::remove] and
/// [`list`][Store::list]; everything else works in memory and marks the store
/// dirty until the next save.
#[derive(Debug)]
pub struct Store {
    meta: Metadata,
    records: IndexMap<RecordId, Record>,
    data_dir: PathBuf,
    dirty: bool,
}

fn store_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{}.{}", name, FILE_EXTENSION))
}

fn corrupt<S: Into<String>>(msg: S) -> InexError {
    InexError::CorruptFile(msg.into())
}

impl Store {
    /// Start an empty store for `name`. Nothing is written until
    /// [`save`][Store::save], but an existing file of that name is refused.
    pub fn create(config: &Config, name: &str) -> Result<Store> {
        check_file_name(name)?;
        let path = store_path(&config.data_dir, name);
        if path.exists() {
            return Err(InexError::AlreadyExists(path));
        }

        info!(file = %path.display(), "created store");
        Ok(Store {
            meta: Metadata::new(name),
            records: IndexMap::new(),
            data_dir: config.data_dir.clone(),
            dirty: false,
        })
    }

    /// Load `<name>.bin`. Records come back in file order, which the writer
    /// keeps sorted, so nothing is re-sorted here; a file that breaks that
    /// order or disagrees with its own metadata is refused.
    pub fn open(config: &Config, name: &str) -> Result<Store> {
        check_file_name(name)?;
        let path = store_path(&config.data_dir, name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(InexError::NotFound(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut meta = codec::read_metadata(&mut reader)?;
        let mut records: IndexMap<RecordId, Record> = IndexMap::new();
        let mut aggregate = Aggregate::default();
        let mut last_date: Option<Date> = None;

        for record in RecordReader::new(reader) {
            let record = record?;
            if record.id == 0 || record.id >= meta.next_id {
                return Err(corrupt(format!(
                    "record id {} outside 1..{}",
                    record.id, meta.next_id
                )));
            }
            if records.contains_key(&record.id) {
                return Err(corrupt(format!("record id {} appears twice", record.id)));
            }
            if last_date.map_or(false, |last| record.date > last) {
                return Err(corrupt(format!(
                    "record {} is out of date order",
                    record.id
                )));
            }
            last_date = Some(record.date);

            // file contents are untrusted, sums must not wrap
            let total = match record.kind {
                RecordKind::Income => &mut aggregate.income,
                RecordKind::Expense => &mut aggregate.expense,
            };
            *total = total
                .checked_add(record.amount)
                .ok_or_else(|| corrupt(format!("{} total overflows", record.kind)))?;
            aggregate.count += 1;

            records
                .try_reserve(1)
                .map_err(|_| InexError::AllocationFailure)?;
            records.insert(record.id, record);
        }

        if aggregate.count != meta.record_count as usize
            || aggregate.income != meta.total_income
            || aggregate.expense != meta.total_expense
        {
            warn!(file = %path.display(), "metadata disagrees with records");
            return Err(corrupt("metadata totals don't match the records"));
        }

        if meta.file_name != name {
            debug!(stored = %meta.file_name, name, "file was renamed, using new name");
            meta.file_name = name.to_string();
        }

        info!(file = %path.display(), records = records.len(), "opened store");
        Ok(Store {
            meta,
            records,
            data_dir: config.data_dir.clone(),
            dirty: false,
        })
    }

    /// Rewrite the whole backing file. The store stays dirty on failure. A
    /// file that can't be opened is left alone, a partially written one is
    /// removed.
    pub fn save(&mut self) -> Result<()> {
        check_file_name(&self.meta.file_name)?;
        let path = self.path();

        // a failed open leaves the last saved copy untouched
        let file = File::create(&path).map_err(|source| {
            warn!(file = %path.display(), error = %source, "save failed");
            InexError::WriteError {
                path: path.clone(),
                source,
            }
        })?;

        let mut writer = BufWriter::new(file);
        let written = codec::write_store(&mut writer, &self.meta, self.records.values())
            .and_then(|()| writer.get_ref().sync_all());
        drop(writer);

        if let Err(source) = written {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(file = %path.display(), error = %e, "can't remove partial file");
                }
            }
            warn!(file = %path.display(), error = %source, "save failed");
            return Err(InexError::WriteError { path, source });
        }

        self.dirty = false;
        info!(file = %path.display(), records = self.records.len(), "saved store");
        Ok(())
    }

    /// Drop the store. Unsaved changes are lost, callers wanting them kept
    /// must [`save`][Store::save] first.
    pub fn close(self) {
        if self.dirty {
            warn!(name = %self.meta.file_name, "closing store with unsaved changes");
        }
    }

    /// Delete `<name>.bin` from the data directory.
    pub fn remove(config: &Config, name: &str) -> Result<()> {
        check_file_name(name)?;
        let path = store_path(&config.data_dir, name);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(file = %path.display(), "removed store");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(InexError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Names of the store files in the data directory, sorted.
    pub fn list(config: &Config) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&config.data_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_file_name(stem) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn total(&self, kind: RecordKind) -> Cents {
        match kind {
            RecordKind::Income => self.meta.total_income,
            RecordKind::Expense => self.meta.total_expense,
        }
    }

    fn total_mut(&mut self, kind: RecordKind) -> &mut Cents {
        match kind {
            RecordKind::Income => &mut self.meta.total_income,
            RecordKind::Expense => &mut self.meta.total_expense,
        }
    }

    /// Place `record` ahead of the first record dated on or before it, so
    /// among equal dates the latest arrival comes first.
    fn insert_sorted(&mut self, record: Record) {
        let pos = self
            .records
            .values()
            .position(|r| r.date <= record.date)
            .unwrap_or(self.records.len());
        self.records.shift_insert(pos, record.id, record);
    }

    /// Store a new record and return the id it was given.
    pub fn add(&mut self, new: NewRecord) -> Result<RecordId> {
        new.validate()?;

        let id = self.meta.next_id;
        let next_id = id
            .checked_add(1)
            .ok_or(InexError::LimitReached("record ids exhausted"))?;
        let record_count = self
            .meta
            .record_count
            .checked_add(1)
            .ok_or(InexError::LimitReached("too many records"))?;
        if self.total(new.kind).headroom() <= MAX_AMOUNT {
            return Err(InexError::LimitReached("running total would overflow"));
        }
        self.records
            .try_reserve(1)
            .map_err(|_| InexError::AllocationFailure)?;

        *self.total_mut(new.kind) += new.amount;
        self.meta.next_id = next_id;
        self.meta.record_count = record_count;
        self.insert_sorted(Record::from_new(id, new));
        self.dirty = true;

        debug!(id, "added record");
        Ok(id)
    }

    /// Apply the fields present in `patch`. A new amount moves the running
    /// total of the record's kind, a new date moves the record to its sorted
    /// position. The kind itself never changes.
    pub fn edit(&mut self, patch: RecordPatch) -> Result<EditOutcome> {
        if patch.id >= self.meta.next_id {
            return Ok(EditOutcome::NotFound);
        }
        let Some(current) = self.records.get(&patch.id) else {
            return Ok(EditOutcome::NotFound);
        };
        if patch.is_empty() {
            return Ok(EditOutcome::NoChange);
        }
        patch.validate()?;

        let (kind, old_amount, old_date) = (current.kind, current.amount, current.date);
        let new_total = match patch.amount {
            Some(amount) => {
                // growing a total needs the same headroom `add` asks for
                if amount > old_amount && self.total(kind).headroom() <= MAX_AMOUNT {
                    return Err(InexError::LimitReached("running total would overflow"));
                }
                Some(
                    self.total(kind)
                        .checked_sub(old_amount)
                        .and_then(|total| total.checked_add(amount))
                        .ok_or(InexError::LimitReached("running total would overflow"))?,
                )
            }
            None => None,
        };
        let relocate = patch.date.map_or(false, |date| date != old_date);

        let RecordPatch {
            id,
            date,
            amount,
            entity,
            comment,
        } = patch;
        let apply = |record: &mut Record| {
            if let Some(date) = date {
                record.date = date;
            }
            if let Some(amount) = amount {
                record.amount = amount;
            }
            if let Some(entity) = entity {
                record.entity = entity;
            }
            if let Some(comment) = comment {
                record.comment = comment;
            }
        };

        if relocate {
            if let Some(mut record) = self.records.shift_remove(&id) {
                apply(&mut record);
                self.insert_sorted(record);
            }
        } else if let Some(record) = self.records.get_mut(&id) {
            apply(record);
        }
        if let Some(total) = new_total {
            *self.total_mut(kind) = total;
        }
        self.dirty = true;

        debug!(id, relocate, "edited record");
        Ok(EditOutcome::Edited)
    }

    /// Remove and return the record with `id`, `None` if there is none.
    pub fn delete(&mut self, id: RecordId) -> Option<Record> {
        if id >= self.meta.next_id {
            return None;
        }
        let record = self.records.shift_remove(&id)?;

        let total = self.total_mut(record.kind);
        *total = *total - Cents::from(record.amount);
        self.meta.record_count -= 1;
        self.dirty = true;

        debug!(id, "deleted record");
        Some(record)
    }

    /// Leading records in store order, with the aggregate over just those.
    pub fn view(&self, selector: Selector) -> View<'_> {
        let limit = match selector {
            Selector::Top(n) => n,
            Selector::All => usize::MAX,
        };
        View::collect(self.records.values().take(limit))
    }

    /// Every record matching `filter`, in store order.
    pub fn filter(&self, filter: &Filter) -> View<'_> {
        View::collect(self.records.values().filter(|r| filter.matches(r)))
    }

    pub fn info(&self) -> Info {
        Info {
            file_name: self.meta.file_name.clone(),
            next_id: self.meta.next_id,
            record_count: self.meta.record_count,
            aggregate: Aggregate {
                count: self.meta.record_count as usize,
                income: self.meta.total_income,
                expense: self.meta.total_expense,
            },
        }
    }

    pub fn file_name(&self) -> &str {
        &self.meta.file_name
    }

    pub fn path(&self) -> PathBuf {
        store_path(&self.data_dir, &self.meta.file_name)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
