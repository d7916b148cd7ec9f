use crate::amount::Amount;
use crate::date::Date;
use crate::error::{InexError, Result};

use std::fmt;

/// Width of the on-disk entity field, including its NUL terminator.
pub const ENTITY_LEN: usize = 32;
/// Width of the on-disk comment field, including its NUL terminator.
pub const COMMENT_LEN: usize = 128;

pub type RecordId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    /// Decode the on-disk kind word, odd values are income.
    pub fn from_raw(raw: i32) -> Self {
        if raw & 1 == 1 {
            RecordKind::Income
        } else {
            RecordKind::Expense
        }
    }

    pub fn raw(&self) -> i32 {
        match self {
            RecordKind::Income => 1,
            RecordKind::Expense => 0,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Income => write!(f, "income"),
            RecordKind::Expense => write!(f, "expense"),
        }
    }
}

/// One stored income or expense entry.
///
/// Records only come out of a [`Store`][crate::store::Store], which assigns
/// their ids; there is no public constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub(crate) id: RecordId,
    pub(crate) kind: RecordKind,
    pub(crate) date: Date,
    pub(crate) amount: Amount,
    pub(crate) entity: String,
    pub(crate) comment: String,
}

impl Record {
    pub(crate) fn from_new(id: RecordId, new: NewRecord) -> Record {
        Record {
            id,
            kind: new.kind,
            date: new.date,
            amount: new.amount,
            entity: new.entity,
            comment: new.comment,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_income(&self) -> bool {
        self.kind == RecordKind::Income
    }
}

/// A record waiting to be added; the store picks its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRecord {
    pub kind: RecordKind,
    pub date: Date,
    pub amount: Amount,
    pub entity: String,
    pub comment: String,
}

impl NewRecord {
    pub fn new(kind: RecordKind, date: Date, amount: Amount) -> Self {
        NewRecord {
            kind,
            date,
            amount,
            entity: String::new(),
            comment: String::new(),
        }
    }

    pub fn income(date: Date, amount: Amount) -> Self {
        Self::new(RecordKind::Income, date, amount)
    }

    pub fn expense(date: Date, amount: Amount) -> Self {
        Self::new(RecordKind::Expense, date, amount)
    }

    pub fn entity<S: Into<String>>(mut self, entity: S) -> Self {
        self.entity = entity.into();
        self
    }

    pub fn comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_entity(&self.entity)?;
        check_comment(&self.comment)
    }
}

/// Partial update of a stored record. Absent fields stay as they are, which
/// keeps "set the comment to empty" apart from "leave the comment alone".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub id: RecordId,
    pub date: Option<Date>,
    pub amount: Option<Amount>,
    pub entity: Option<String>,
    pub comment: Option<String>,
}

impl RecordPatch {
    pub fn new(id: RecordId) -> Self {
        RecordPatch {
            id,
            ..Default::default()
        }
    }

    pub fn date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn entity<S: Into<String>>(mut self, entity: S) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.entity.is_none()
            && self.comment.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(entity) = &self.entity {
            check_entity(entity)?;
        }
        if let Some(comment) = &self.comment {
            check_comment(comment)?;
        }
        Ok(())
    }
}

fn check_text(field: &str, value: &str, width: usize) -> Result<()> {
    if value.len() >= width {
        return Err(InexError::InvalidRecord(format!(
            "{} is {} bytes long, at most {} allowed",
            field,
            value.len(),
            width - 1
        )));
    }
    if value.contains('\0') {
        return Err(InexError::InvalidRecord(format!(
            "{} contains a NUL byte",
            field
        )));
    }
    Ok(())
}

/// Entity must fit its stored field, it is rejected rather than truncated.
pub fn check_entity(entity: &str) -> Result<()> {
    check_text("entity", entity, ENTITY_LEN)
}

/// Comment must fit its stored field, it is rejected rather than truncated.
pub fn check_comment(comment: &str) -> Result<()> {
    check_text("comment", comment, COMMENT_LEN)
}
