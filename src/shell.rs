use anyhow::{anyhow, bail, Result};
use tracing::{debug, warn};

use libinex::config::Config;
use libinex::parser::{parse_amount, parse_date};
use libinex::record::{NewRecord, RecordId, RecordKind, RecordPatch};
use libinex::store::{EditOutcome, Store};

use std::io::{self, BufRead, Write};

use crate::command::{tokenize, Command};
use crate::render;

const PROMPT: &str = ">> ";
const SAVE_QUESTION: &str = "\n\tdo you want to save before close? [y/n/c] ";

fn is_end_of_input(e: &anyhow::Error) -> bool {
    e.downcast_ref::<io::Error>()
        .map_or(false, |e| e.kind() == io::ErrorKind::UnexpectedEof)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive front end over one open store at a time.
pub struct Shell<R, W> {
    config: Config,
    store: Option<Store>,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(config: Config, input: R, out: W) -> Self {
        Shell {
            config,
            store: None,
            input,
            out,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            self.prompt()?;
            let Some(line) = self.read_line()? else {
                return self.end_of_input();
            };
            match self.execute(&line) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                // input ran out halfway through a record prompt
                Err(e) if is_end_of_input(&e) => return self.end_of_input(),
                Err(e) => return Err(e),
            }
        }
    }

    fn end_of_input(&mut self) -> Result<()> {
        writeln!(self.out)?;
        if let Some(store) = self.store.take() {
            store.close();
        }
        Ok(())
    }

    /// Run one command line. Problems with the command or the store are
    /// reported to the user, only terminal failures come back as errors.
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let command = tokenize(line).and_then(|words| Command::parse(&words, &self.config));
        let result = match command {
            Ok(Some(command)) => self.dispatch(command),
            Ok(None) => Ok(Flow::Continue),
            Err(e) => Err(e),
        };

        match result {
            Err(e) if e.downcast_ref::<io::Error>().is_none() => {
                debug!(error = %e, "command rejected");
                self.message(e)?;
                Ok(Flow::Continue)
            }
            other => other,
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => {
                if self.store.is_some() && !self.close()? {
                    return Ok(Flow::Continue);
                }
                return Ok(Flow::Quit);
            }
            Command::Help => writeln!(self.out, "{}", render::HELP)?,
            Command::About => writeln!(self.out, "{}", render::ABOUT)?,
            Command::Create(name) => {
                self.ensure_closed()?;
                self.store = Some(Store::create(&self.config, &name)?);
            }
            Command::Open(name) => {
                self.ensure_closed()?;
                self.store = Some(Store::open(&self.config, &name)?);
            }
            Command::Remove(name) => {
                self.ensure_closed()?;
                Store::remove(&self.config, &name)?;
                self.message(format!("removed `{}'", name))?;
            }
            Command::List => self.list()?,
            Command::Add(kind) => self.add(kind)?,
            Command::Edit(id) => self.edit(id)?,
            Command::Delete(id) => {
                let deleted = self.store_mut()?.delete(id);
                match deleted {
                    Some(record) => self.message(format!("deleted record {}", record.id()))?,
                    None => self.message(format!("record {} not found", id))?,
                }
            }
            Command::View(selector) => {
                let store = self.store.as_ref().ok_or(anyhow!("no file opened!"))?;
                render::view(&mut self.out, &store.view(selector))?;
            }
            Command::Filter(filter) => {
                let store = self.store.as_ref().ok_or(anyhow!("no file opened!"))?;
                render::view(&mut self.out, &store.filter(&filter))?;
            }
            Command::Info => {
                let store = self.store.as_ref().ok_or(anyhow!("no file opened!"))?;
                render::info(&mut self.out, &store.info())?;
            }
            Command::Save => self.save()?,
            Command::Close => {
                if self.store.is_none() {
                    bail!("no file opened!");
                }
                self.close()?;
            }
        }
        Ok(Flow::Continue)
    }

    fn prompt(&mut self) -> io::Result<()> {
        if let Some(store) = &self.store {
            let dirty = if store.is_dirty() { "*" } else { "" };
            write!(self.out, "{}{}{} ", PROMPT, dirty, store.file_name())?;
        }
        write!(self.out, "{}", PROMPT)?;
        self.out.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Ask one record field, an empty answer comes back as `None`.
    fn ask(&mut self, label: &str, mandatory: bool) -> Result<Option<String>> {
        let mark = if mandatory { '*' } else { ' ' };
        write!(self.out, "   {}{:<18}: ", mark, label)?;
        self.out.flush()?;
        let answer = self.read_line()?.ok_or(io::Error::from(io::ErrorKind::UnexpectedEof))?;
        Ok(Some(answer).filter(|a| !a.is_empty()))
    }

    fn message<D: std::fmt::Display>(&mut self, msg: D) -> io::Result<()> {
        writeln!(self.out, "\tMESSAGE: {}", msg)
    }

    fn store_mut(&mut self) -> Result<&mut Store> {
        self.store.as_mut().ok_or(anyhow!("no file opened!"))
    }

    fn ensure_closed(&self) -> Result<()> {
        if self.store.is_some() {
            bail!("close the file first!");
        }
        Ok(())
    }

    fn list(&mut self) -> Result<()> {
        let names = Store::list(&self.config)?;
        if names.is_empty() {
            self.message("no inex files found")?;
        }
        for name in names {
            writeln!(self.out, "\t{}", name)?;
        }
        Ok(())
    }

    fn add(&mut self, kind: RecordKind) -> Result<()> {
        self.store_mut()?;

        let amount = self.ask("Amount", true)?.ok_or(anyhow!("amount is mandatory"))?;
        let amount = parse_amount(&amount)?;
        let date = self
            .ask("Date [yyyy-mm-dd]", true)?
            .ok_or(anyhow!("date is mandatory"))?;
        let date = parse_date(&date)?;
        let entity = self.ask("Entity", false)?.unwrap_or_default();
        let comment = self.ask("Comment", false)?.unwrap_or_default();

        let new = NewRecord::new(kind, date, amount).entity(entity).comment(comment);
        let id = self.store_mut()?.add(new)?;
        self.message(format!("added record {}", id))?;
        Ok(())
    }

    fn edit(&mut self, id: RecordId) -> Result<()> {
        let store = self.store.as_ref().ok_or(anyhow!("no file opened!"))?;
        let Some(current) = store.get(id) else {
            self.message(format!("record {} not found", id))?;
            return Ok(());
        };
        render::record(&mut self.out, current)?;

        let mut patch = RecordPatch::new(id);
        if let Some(amount) = self.ask("Amount", false)? {
            patch = patch.amount(parse_amount(&amount)?);
        }
        if let Some(date) = self.ask("Date [yyyy-mm-dd]", false)? {
            patch = patch.date(parse_date(&date)?);
        }
        if let Some(entity) = self.ask("Entity", false)? {
            patch = patch.entity(entity);
        }
        if let Some(comment) = self.ask("Comment", false)? {
            patch = patch.comment(comment);
        }

        match self.store_mut()?.edit(patch)? {
            EditOutcome::Edited => self.message(format!("edited record {}", id))?,
            EditOutcome::NoChange => self.message("nothing to change")?,
            EditOutcome::NotFound => self.message(format!("record {} not found", id))?,
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let store = self.store_mut()?;
        if !store.is_dirty() && store.path().exists() {
            self.message("already saved!")?;
            return Ok(());
        }
        store.save()?;
        Ok(())
    }

    /// Close the open store, asking first when it has unsaved changes.
    /// Returns `false` when the user cancels or the save fails.
    fn close(&mut self) -> Result<bool> {
        let dirty = self.store.as_ref().map_or(false, |s| s.is_dirty());
        if dirty {
            loop {
                write!(self.out, "{}", SAVE_QUESTION)?;
                self.out.flush()?;
                let Some(answer) = self.read_line()? else {
                    return Ok(false);
                };
                match answer.trim().chars().next() {
                    Some('y' | 'Y') => {
                        if let Err(e) = self.store_mut()?.save() {
                            warn!(error = %e, "keeping store open after failed save");
                            self.message(e)?;
                            return Ok(false);
                        }
                        break;
                    }
                    Some('n' | 'N') => break,
                    Some('c' | 'C') => return Ok(false),
                    _ => continue,
                }
            }
        }

        if let Some(store) = self.store.take() {
            store.close();
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::shell::{Flow, Shell};
    use libinex::config::Config;
    use libinex::store::Store;

    use anyhow::Result;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run(config: &Config, script: &str) -> Result<String> {
        let mut out = Vec::new();
        Shell::new(config.clone(), Cursor::new(script.as_bytes()), &mut out).run()?;
        Ok(String::from_utf8(out)?)
    }

    fn setup() -> Result<(TempDir, Config)> {
        let dir = TempDir::new()?;
        let config = Config::new().with_data_dir(dir.path());
        Ok((dir, config))
    }

    #[test]
    fn add_view_and_save() -> Result<()> {
        let (_dir, config) = setup()?;
        let script = "create t1\n\
            add in\n150\n2024-05-01\nAcme\n\n\
            add ex\n40.00\n2024-05-02\n\nlunch\n\
            view all\n\
            quit\n\
            y\n";
        let out = run(&config, script)?;

        assert!(out.contains(">> *t1 >> "));
        assert!(out.contains("added record 2"));
        assert!(out.contains("\tBalance       : 110.00"));
        let may_second = out.find("2024-05-02").unwrap();
        let may_first = out.find("2024-05-01").unwrap();
        assert!(may_second < may_first);

        let store = Store::open(&config, "t1")?;
        assert_eq!(store.len(), 2);
        Ok(())
    }

    #[test]
    fn edit_keeps_skipped_fields() -> Result<()> {
        let (_dir, config) = setup()?;
        let script = "create t1\n\
            add in\n150\n2024-05-01\nAcme\nsalary\n\
            edit 1\n200\n\n\n\n\
            save\n\
            quit\n";
        run(&config, script)?;

        let store = Store::open(&config, "t1")?;
        let record = store.get(1).unwrap();
        assert_eq!(record.amount().cents(), 20000);
        assert_eq!(record.entity(), "Acme");
        assert_eq!(record.comment(), "salary");
        Ok(())
    }

    #[test]
    fn close_can_be_cancelled_or_discarded() -> Result<()> {
        let (_dir, config) = setup()?;
        let script = "create t1\n\
            add ex\n1\n2024-05-01\n\n\n\
            close\nmaybe\nc\n\
            close\nn\n\
            quit\n";
        let out = run(&config, script)?;

        assert_eq!(out.matches("[y/n/c]").count(), 3);
        assert!(!config.data_dir.join("t1.bin").exists());
        Ok(())
    }

    #[test]
    fn bad_input_is_reported() -> Result<()> {
        let (_dir, config) = setup()?;
        let mut out = Vec::new();
        let mut shell = Shell::new(config.clone(), Cursor::new(&b"1.5\n"[..]), &mut out);

        assert_eq!(shell.execute("frobnicate")?, Flow::Continue);
        assert_eq!(shell.execute("view")?, Flow::Continue);
        assert_eq!(shell.execute("open 'not there")?, Flow::Continue);
        assert_eq!(shell.execute("create t1")?, Flow::Continue);
        assert_eq!(shell.execute("create t2")?, Flow::Continue);
        assert_eq!(shell.execute("add in")?, Flow::Continue);
        assert_eq!(shell.execute("delete 9")?, Flow::Continue);
        assert_eq!(shell.execute("quit")?, Flow::Quit);
        drop(shell);

        let out = String::from_utf8(out)?;
        assert!(out.contains("MESSAGE: unsupported command `frobnicate'"));
        assert!(out.contains("MESSAGE: no file opened!"));
        assert!(out.contains("MESSAGE: missing close quote"));
        assert!(out.contains("MESSAGE: close the file first!"));
        assert!(out.contains("is not a valid amount"));
        assert!(out.contains("MESSAGE: record 9 not found"));
        Ok(())
    }

    #[test]
    fn input_ending_mid_prompt_closes_quietly() -> Result<()> {
        let (_dir, config) = setup()?;
        let script = "create t1\n\
            add ex\n1\n2024-05-01\n\n\n\
            add in\n150\n";
        let out = run(&config, script)?;

        assert!(out.contains("added record 1"));
        assert!(!out.contains("added record 2"));
        assert!(out.ends_with('\n'));
        assert!(!config.data_dir.join("t1.bin").exists());
        Ok(())
    }

    #[test]
    fn list_and_remove() -> Result<()> {
        let (_dir, config) = setup()?;
        let out = run(&config, "create a1\nsave\nclose\nlist\nremove a1\nlist\nquit\n")?;
        assert!(out.contains("\ta1\n"));
        assert!(out.contains("removed `a1'"));
        assert!(out.contains("no inex files found"));
        Ok(())
    }
}
