use anyhow::{anyhow, bail, Result};
use pest::Parser;

use libinex::config::Config;
use libinex::parser::{check_file_name, parse_kind, parse_record_id, parse_selector};
use libinex::query::{Filter, Selector};
use libinex::record::{RecordId, RecordKind};

/// Most words a single command line may carry.
pub const MAX_WORDS: usize = 10;

#[derive(Parser)]
#[grammar = "command.pest"]
pub struct CommandParser;

/// Split a shell line into words. Quote characters are dropped once the
/// blanks inside them have been kept.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let line = CommandParser::parse(Rule::line, line)
        .map_err(|_| anyhow!("missing close quote"))?
        .next()
        .ok_or(anyhow!("empty command line"))?;

    let words: Vec<String> = line
        .into_inner()
        .filter(|p| p.as_rule() == Rule::word)
        .map(|p| p.as_str().replace('\'', ""))
        .collect();

    if words.len() > MAX_WORDS {
        bail!("too many arguments, at most {} words allowed", MAX_WORDS);
    }
    Ok(words)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    About,
    Create(String),
    Open(String),
    Remove(String),
    List,
    Add(RecordKind),
    Edit(RecordId),
    Delete(RecordId),
    View(Selector),
    Filter(Filter),
    Info,
    Save,
    Close,
}

fn arg<'w>(words: &'w [String], idx: usize) -> Result<&'w str> {
    words
        .get(idx)
        .map(|w| w.as_str())
        .ok_or(anyhow!("missing arguments!"))
}

fn file_name(words: &[String]) -> Result<String> {
    let name = arg(words, 1)?;
    check_file_name(name)?;
    Ok(name.to_string())
}

impl Command {
    /// Turn tokenized words into a command, `None` for a blank line.
    /// Words past the ones a command takes are ignored.
    pub fn parse(words: &[String], config: &Config) -> Result<Option<Command>> {
        let Some(name) = words.first() else {
            return Ok(None);
        };

        let command = match name.as_str() {
            "quit" => Command::Quit,
            "help" => Command::Help,
            "about" => Command::About,
            "create" => Command::Create(file_name(words)?),
            "open" => Command::Open(file_name(words)?),
            "remove" => Command::Remove(file_name(words)?),
            "list" => Command::List,
            "add" => Command::Add(parse_kind(arg(words, 1)?)?),
            "edit" => Command::Edit(parse_record_id(arg(words, 1)?)?),
            "delete" => Command::Delete(parse_record_id(arg(words, 1)?)?),
            "view" => Command::View(match words.get(1) {
                Some(selector) => parse_selector(selector)?,
                None => Selector::Top(config.view_limit),
            }),
            "filter" => {
                let mut filter = Filter::new(arg(words, 1)?, arg(words, 2)?, arg(words, 3)?)?;
                if let Some(kind) = words.get(4) {
                    filter = filter.with_kind(parse_kind(kind)?);
                }
                Command::Filter(filter)
            }
            "info" => Command::Info,
            "save" => Command::Save,
            "close" => Command::Close,
            other => bail!("unsupported command `{}'", other),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use crate::command::{tokenize, Command};
    use libinex::config::Config;
    use libinex::query::{Filter, Selector};
    use libinex::record::RecordKind;

    use anyhow::{anyhow, Result};

    fn parse(line: &str) -> Result<Option<Command>> {
        Command::parse(&tokenize(line)?, &Config::new())
    }

    #[test]
    fn split_on_blanks() -> Result<()> {
        assert_eq!(tokenize("  view\t all  ")?, vec!["view", "all"]);
        assert!(tokenize("")?.is_empty());
        assert!(tokenize(" \t ")?.is_empty());
        Ok(())
    }

    #[test]
    fn quotes_group_blanks() -> Result<()> {
        assert_eq!(tokenize("open 'my file'")?, vec!["open", "my file"]);
        assert_eq!(tokenize("a'b c'd e")?, vec!["ab cd", "e"]);
        assert_eq!(tokenize("''")?, vec![""]);
        assert!(tokenize("open 'my file").is_err());
        Ok(())
    }

    #[test]
    fn word_limit() -> Result<()> {
        assert_eq!(tokenize("a b c d e f g h i j")?.len(), 10);
        assert!(tokenize("a b c d e f g h i j k").is_err());
        Ok(())
    }

    #[test]
    fn parse_commands() -> Result<()> {
        assert_eq!(parse("")?, None);
        assert_eq!(parse("quit")?, Some(Command::Quit));
        assert_eq!(parse("create t1")?, Some(Command::Create("t1".to_string())));
        assert_eq!(parse("add in")?, Some(Command::Add(RecordKind::Income)));
        assert_eq!(parse("delete 7")?, Some(Command::Delete(7)));
        assert_eq!(parse("view")?, Some(Command::View(Selector::Top(15))));
        assert_eq!(parse("view all")?, Some(Command::View(Selector::All)));
        assert_eq!(parse("view 3")?, Some(Command::View(Selector::Top(3))));

        let filter = Filter::new("amount", "10", ".")?.with_kind(RecordKind::Expense);
        assert_eq!(parse("filter amount 10 . ex")?, Some(Command::Filter(filter)));
        Ok(())
    }

    #[test]
    fn view_uses_configured_limit() -> Result<()> {
        let mut config = Config::new();
        config.set_option("view_limit", "4")?;
        let command = Command::parse(&tokenize("view")?, &config)?;
        assert_eq!(command.ok_or(anyhow!("no command"))?, Command::View(Selector::Top(4)));
        Ok(())
    }

    #[test]
    fn reject_bad_commands() {
        for line in [
            "frobnicate",
            "create",
            "create bad/name",
            "add both",
            "edit x",
            "view some",
            "filter date . .",
            "filter date 2024-05-01",
            "filter amount 1 2 neither",
        ] {
            assert!(parse(line).is_err(), "{} should be rejected", line);
        }
    }
}
