use crate::amount::{Amount, Cents};
use crate::date::Date;
use crate::error::{invalid, Result};
use crate::parser;
use crate::record::{Record, RecordKind};

use std::fmt;

/// How many records a bare `view` shows.
pub const DEFAULT_VIEW_LIMIT: usize = 15;

/// Which leading slice of the store a view returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    Top(usize),
    All,
}

impl Default for Selector {
    fn default() -> Self {
        Selector::Top(DEFAULT_VIEW_LIMIT)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    Date,
    Amount,
}

/// Inclusive range over one record field, either end may be open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Range {
    Date(Option<Date>, Option<Date>),
    Amount(Option<Amount>, Option<Amount>),
}

fn within<T: PartialOrd>(value: T, lower: &Option<T>, upper: &Option<T>) -> bool {
    lower.as_ref().map_or(true, |lo| value >= *lo) && upper.as_ref().map_or(true, |hi| value <= *hi)
}

impl Range {
    pub fn contains(&self, record: &Record) -> bool {
        match self {
            Range::Date(lo, hi) => within(record.date(), lo, hi),
            Range::Amount(lo, hi) => within(record.amount(), lo, hi),
        }
    }

    fn is_unbounded(&self) -> bool {
        match self {
            Range::Date(lo, hi) => lo.is_none() && hi.is_none(),
            Range::Amount(lo, hi) => lo.is_none() && hi.is_none(),
        }
    }
}

/// Range filter over the store, optionally narrowed to one record kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filter {
    range: Range,
    kind: Option<RecordKind>,
}

impl Filter {
    /// Build a filter from user text: a field name and two bounds where `.`
    /// leaves that end open. Leaving both ends open is rejected.
    pub fn new(field: &str, lower: &str, upper: &str) -> Result<Filter> {
        let range = match parser::parse_field(field)? {
            FilterField::Date => Range::Date(
                parser::parse_date_bound(lower)?,
                parser::parse_date_bound(upper)?,
            ),
            FilterField::Amount => Range::Amount(
                parser::parse_amount_bound(lower)?,
                parser::parse_amount_bound(upper)?,
            ),
        };
        Self::from_range(range)
    }

    pub fn from_range(range: Range) -> Result<Filter> {
        if range.is_unbounded() {
            return Err(invalid("both filter bounds can't be `.'"));
        }
        Ok(Filter { range, kind: None })
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.kind.map_or(true, |kind| record.kind() == kind) && self.range.contains(record)
    }
}

/// Count and per-kind sums over a set of records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub count: usize,
    pub income: Cents,
    pub expense: Cents,
}

impl Aggregate {
    pub fn push(&mut self, record: &Record) {
        self.count += 1;
        match record.kind() {
            RecordKind::Income => self.income += record.amount(),
            RecordKind::Expense => self.expense += record.amount(),
        }
    }

    pub fn balance(&self) -> Cents {
        self.income - self.expense
    }
}

impl<'r> FromIterator<&'r Record> for Aggregate {
    fn from_iter<I: IntoIterator<Item = &'r Record>>(iter: I) -> Self {
        let mut aggregate = Aggregate::default();
        for record in iter {
            aggregate.push(record);
        }
        aggregate
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No of records : {}", self.count)?;
        writeln!(f, "Total Income  : {}", self.income)?;
        writeln!(f, "Total Expense : {}", self.expense)?;
        write!(f, "Balance       : {}", self.balance())
    }
}

/// Records picked by a view or a filter, in store order, with the aggregate
/// over exactly those records.
#[derive(Debug)]
pub struct View<'s> {
    pub records: Vec<&'s Record>,
    pub aggregate: Aggregate,
}

impl<'s> View<'s> {
    pub(crate) fn collect<I: Iterator<Item = &'s Record>>(records: I) -> View<'s> {
        let records: Vec<&'s Record> = records.collect();
        let aggregate = records.iter().copied().collect();
        View { records, aggregate }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
