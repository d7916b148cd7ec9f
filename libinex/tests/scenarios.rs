use libinex::amount::Cents;
use libinex::parser::{parse_amount, parse_date};
use libinex::query::{Filter, Selector};
use libinex::record::{NewRecord, RecordKind, RecordPatch};
use libinex::store::{EditOutcome, Store};
use libinex::{Config, InexError};

use anyhow::Result;
use tempfile::TempDir;

fn t1(config: &Config) -> Result<Store> {
    let mut store = Store::create(config, "t1")?;
    store.add(
        NewRecord::income(parse_date("2024-05-01")?, parse_amount("150.00")?).entity("Acme"),
    )?;
    store.add(NewRecord::expense(parse_date("2024-05-02")?, parse_amount("40.00")?))?;
    Ok(store)
}

#[test]
fn two_record_ledger() -> Result<()> {
    let dir = TempDir::new()?;
    let config = Config::new().with_data_dir(dir.path());
    let mut store = t1(&config)?;

    let view = store.view(Selector::All);
    let dates: Vec<String> = view.records.iter().map(|r| r.date().to_string()).collect();
    assert_eq!(dates, vec!["2024-05-02", "2024-05-01"]);
    assert_eq!(view.aggregate.count, 2);
    assert_eq!(view.aggregate.income.to_string(), "150.00");
    assert_eq!(view.aggregate.expense.to_string(), "40.00");
    assert_eq!(view.aggregate.balance().to_string(), "110.00");
    assert_eq!(view.aggregate, store.info().aggregate);

    let upto_first = store.filter(&Filter::new("date", ".", "2024-05-01")?);
    assert_eq!(upto_first.records.len(), 1);
    assert_eq!(upto_first.records[0].kind(), RecordKind::Income);

    assert_eq!(store.edit(RecordPatch::new(1))?, EditOutcome::NoChange);
    let before = store.info();
    assert!(store.delete(99).is_none());
    assert_eq!(store.info(), before);

    store.save()?;
    let reopened = Store::open(&config, "t1")?;
    assert_eq!(reopened.info(), store.info());
    assert!(reopened.records().eq(store.records()));
    Ok(())
}

#[test]
fn edits_survive_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let config = Config::new().with_data_dir(dir.path());
    let mut store = t1(&config)?;

    let patch = RecordPatch::new(1)
        .date(parse_date("2024-05-03")?)
        .amount(parse_amount("10")?)
        .comment("refund");
    assert_eq!(store.edit(patch)?, EditOutcome::Edited);
    assert_eq!(store.records().next().map(|r| r.id()), Some(1));
    assert_eq!(store.info().aggregate.balance(), Cents(-3000));
    assert_eq!(store.info().aggregate.balance().to_string(), "-30.00");
    store.save()?;
    store.close();

    let store = Store::open(&config, "t1")?;
    let record = store.get(1).ok_or(anyhow::anyhow!("record 1 missing"))?;
    assert_eq!(record.comment(), "refund");
    assert_eq!(record.entity(), "Acme");
    assert_eq!(store.info().next_id, 3);
    Ok(())
}

#[test]
fn lifecycle_errors() -> Result<()> {
    let dir = TempDir::new()?;
    let config = Config::new().with_data_dir(dir.path());

    t1(&config)?.save()?;
    assert!(matches!(
        Store::create(&config, "t1"),
        Err(InexError::AlreadyExists(_))
    ));
    assert_eq!(Store::list(&config)?, vec!["t1"]);

    Store::remove(&config, "t1")?;
    assert!(matches!(
        Store::open(&config, "t1"),
        Err(InexError::NotFound(_))
    ));
    assert!(matches!(
        parse_amount("1000000000000.00"),
        Err(InexError::InvalidArgument(_))
    ));
    Ok(())
}
