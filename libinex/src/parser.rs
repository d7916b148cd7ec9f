use crate::amount::Amount;
use crate::date::Date;
use crate::error::{invalid, Result};
use crate::query::{FilterField, Selector};
use crate::record::{RecordId, RecordKind};

use pest::iterators::Pair;
use pest::Parser;

/// Longest accepted store name, the `.bin` suffix and padding take the rest
/// of the 32 byte name field.
pub const MAX_FILE_NAME_LEN: usize = 25;

/// Longest accepted amount text, e.g. `999999999999.99`.
pub const MAX_AMOUNT_TEXT_LEN: usize = 15;

#[derive(Parser)]
#[grammar = "inex.pest"]
pub struct InexParser;

/// Run `rule` over the whole of `input` and hand back the single value token
/// inside it.
fn parse_input<'i>(rule: Rule, input: &'i str, what: &str) -> Result<Pair<'i, Rule>> {
    let rejected = || invalid(format!("`{}' is not a valid {}", input, what));
    InexParser::parse(rule, input)
        .map_err(|_| rejected())?
        .next()
        .and_then(|token| token.into_inner().next())
        .ok_or_else(rejected)
}

fn next_number<'i, T: std::str::FromStr>(
    pairs: &mut pest::iterators::Pairs<'i, Rule>,
    input: &str,
) -> Result<T> {
    pairs
        .next()
        .and_then(|p| p.as_str().parse::<T>().ok())
        .ok_or_else(|| invalid(format!("`{}' is not a valid date", input)))
}

fn date_from_token(token: Pair<Rule>) -> Result<Date> {
    let input = token.as_str();
    let mut parts = token.into_inner();
    let year: i32 = next_number(&mut parts, input)?;
    let month: u32 = next_number(&mut parts, input)?;
    let day: u32 = next_number(&mut parts, input)?;

    Date::from_ymd(year, month, day)
        .ok_or_else(|| invalid(format!("`{}' is not a calendar date", input)))
}

fn amount_from_token(token: Pair<Rule>) -> Result<Amount> {
    let input = token.as_str();
    if input.len() > MAX_AMOUNT_TEXT_LEN {
        return Err(invalid(format!(
            "`{}' is longer than {} characters",
            input, MAX_AMOUNT_TEXT_LEN
        )));
    }

    let mut whole: i64 = 0;
    let mut cents: i64 = 0;
    for part in token.into_inner() {
        let value = part
            .as_str()
            .parse::<i64>()
            .map_err(|_| invalid(format!("`{}' is not a valid amount", input)))?;
        match part.as_rule() {
            Rule::whole => whole = value,
            Rule::cents => cents = value,
            _ => unreachable!(),
        }
    }

    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .and_then(Amount::from_cents)
        .ok_or_else(|| {
            invalid(format!(
                "`{}' is out of range, at most {} allowed",
                input,
                Amount::MAX
            ))
        })
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<Date> {
    date_from_token(parse_input(Rule::date_input, input, "date")?)
}

/// Parse a non-negative amount with an optional two digit fraction,
/// `150`, `150.00` and `0.07` are fine, `1.5`, `.50` and `1.2.3` are not.
pub fn parse_amount(input: &str) -> Result<Amount> {
    amount_from_token(parse_input(Rule::amount_input, input, "amount")?)
}

pub fn is_valid_file_name(input: &str) -> bool {
    input.len() <= MAX_FILE_NAME_LEN && InexParser::parse(Rule::file_name_input, input).is_ok()
}

pub fn check_file_name(input: &str) -> Result<()> {
    if is_valid_file_name(input) {
        Ok(())
    } else {
        Err(invalid(format!(
            "`{}' is not a valid file name, use up to {} of [A-Za-z0-9_-]",
            input, MAX_FILE_NAME_LEN
        )))
    }
}

pub fn parse_record_id(input: &str) -> Result<RecordId> {
    parse_input(Rule::record_id_input, input, "record id")?
        .as_str()
        .parse::<RecordId>()
        .map_err(|_| invalid(format!("`{}' is out of the record id range", input)))
}

/// `all` or a record count. The no-argument case is [`Selector::default`].
pub fn parse_selector(input: &str) -> Result<Selector> {
    let token = parse_input(Rule::selector_input, input, "view selector")?;
    match token.as_rule() {
        Rule::all => Ok(Selector::All),
        Rule::count => token
            .as_str()
            .parse::<usize>()
            .map(Selector::Top)
            .map_err(|_| invalid(format!("`{}' is too large a record count", input))),
        _ => unreachable!(),
    }
}

/// A date filter bound, `.` meaning "unbounded".
pub fn parse_date_bound(input: &str) -> Result<Option<Date>> {
    let token = parse_input(Rule::date_bound_input, input, "date bound")?;
    match token.as_rule() {
        Rule::ignore => Ok(None),
        _ => date_from_token(token).map(Some),
    }
}

/// An amount filter bound, `.` meaning "unbounded".
pub fn parse_amount_bound(input: &str) -> Result<Option<Amount>> {
    let token = parse_input(Rule::amount_bound_input, input, "amount bound")?;
    match token.as_rule() {
        Rule::ignore => Ok(None),
        _ => amount_from_token(token).map(Some),
    }
}

/// `in` or `ex`.
pub fn parse_kind(input: &str) -> Result<RecordKind> {
    match parse_input(Rule::kind_input, input, "record kind")?.as_rule() {
        Rule::income => Ok(RecordKind::Income),
        _ => Ok(RecordKind::Expense),
    }
}

/// `date` or `amount`.
pub fn parse_field(input: &str) -> Result<FilterField> {
    match parse_input(Rule::field_input, input, "filter field")?.as_rule() {
        Rule::date_field => Ok(FilterField::Date),
        _ => Ok(FilterField::Amount),
    }
}

#[cfg(test)]
mod tests {
    use crate::amount::{Amount, MAX_AMOUNT};
    use crate::date::Date;
    use crate::error::InexError;
    use crate::parser::{
        is_valid_file_name, parse_amount, parse_amount_bound, parse_date, parse_date_bound,
        parse_field, parse_kind, parse_record_id, parse_selector, InexParser, Rule,
    };
    use crate::query::{FilterField, Selector};
    use crate::record::RecordKind;
    use pest::Parser;

    use anyhow::{anyhow, Result};

    #[test]
    fn parse_date_token() -> Result<()> {
        let mut tokens = InexParser::parse(Rule::date, "2024-05-01")?;
        let date = tokens.next().ok_or(anyhow!("empty ast"))?;
        let parts: Vec<&str> = date.into_inner().map(|p| p.as_str()).collect();
        assert_eq!(parts, vec!["2024", "05", "01"]);
        Ok(())
    }

    #[test]
    fn parse_valid_dates() -> Result<()> {
        assert_eq!(
            parse_date("2024-02-29")?,
            Date::from_ymd(2024, 2, 29).ok_or(anyhow!("invalid date"))?
        );
        assert_eq!(
            parse_date("0001-01-01")?,
            Date::from_ymd(1, 1, 1).ok_or(anyhow!("invalid date"))?
        );
        Ok(())
    }

    #[test]
    fn reject_malformed_dates() {
        for input in [
            "2023-02-29",
            "2024-13-01",
            "2024-00-10",
            "0000-01-01",
            "2024-5-1",
            "24-05-01",
            "2024/05/01",
            "2024-05-01 ",
            "",
        ] {
            assert!(
                matches!(parse_date(input), Err(InexError::InvalidArgument(_))),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn parse_valid_amounts() -> Result<()> {
        assert_eq!(parse_amount("150")?.cents(), 15000);
        assert_eq!(parse_amount("150.00")?.cents(), 15000);
        assert_eq!(parse_amount("0.07")?.cents(), 7);
        assert_eq!(parse_amount("999999999999.99")?, Amount::MAX);
        assert_eq!(parse_amount("999999999999.99")?.cents(), MAX_AMOUNT);
        Ok(())
    }

    #[test]
    fn reject_malformed_amounts() {
        for input in [
            "1.5", ".50", "1.234", "1.2.3", "-1", "12a", "1,00", "", "1.",
            // one cent above the maximum
            "1000000000000.00",
            // sixteen characters
            "0000000000001.00",
            "1000000000000",
        ] {
            assert!(
                matches!(parse_amount(input), Err(InexError::InvalidArgument(_))),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn file_names() {
        assert!(is_valid_file_name("t1"));
        assert!(is_valid_file_name("my-ledger_2024"));
        assert!(is_valid_file_name(&"a".repeat(25)));
        assert!(!is_valid_file_name(&"a".repeat(26)));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name("ledger.bin"));
        assert!(!is_valid_file_name("../ledger"));
        assert!(!is_valid_file_name("my ledger"));
    }

    #[test]
    fn selectors() -> Result<()> {
        assert_eq!(parse_selector("all")?, Selector::All);
        assert_eq!(parse_selector("0")?, Selector::Top(0));
        assert_eq!(parse_selector("42")?, Selector::Top(42));
        assert_eq!(Selector::default(), Selector::Top(15));
        assert!(parse_selector("-3").is_err());
        assert!(parse_selector("ALL").is_err());
        assert!(parse_selector("some").is_err());
        assert!(parse_selector("99999999999999999999999999").is_err());
        Ok(())
    }

    #[test]
    fn bounds() -> Result<()> {
        assert_eq!(parse_date_bound(".")?, None);
        assert_eq!(parse_date_bound("2024-05-01")?, Date::from_ymd(2024, 5, 1));
        assert_eq!(parse_amount_bound(".")?, None);
        assert_eq!(parse_amount_bound("40.00")?, Amount::from_cents(4000));
        assert!(parse_date_bound("..").is_err());
        assert!(parse_amount_bound("40.0").is_err());
        Ok(())
    }

    #[test]
    fn kinds_fields_and_ids() -> Result<()> {
        assert_eq!(parse_kind("in")?, RecordKind::Income);
        assert_eq!(parse_kind("ex")?, RecordKind::Expense);
        assert!(parse_kind("income").is_err());
        assert_eq!(parse_field("date")?, FilterField::Date);
        assert_eq!(parse_field("amount")?, FilterField::Amount);
        assert!(parse_field("entity").is_err());
        assert_eq!(parse_record_id("17")?, 17);
        assert!(parse_record_id("-1").is_err());
        assert!(parse_record_id("4294967296").is_err());
        Ok(())
    }
}
