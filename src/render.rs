use libinex::query::{Aggregate, View};
use libinex::record::Record;
use libinex::store::Info;

use std::io::{self, Write};

const LIST_HEADER: &str = "\n\t<------LIST OF RECORDS------>\n";
const LIST_FOOTER: &str = "\n\t<--------END OF LIST-------->\n";
const COLUMNS: &str = " ??? |          AMOUNT |       DATE | ENTITY ";
const SEPARATOR: &str = "-----|-----------------|------------|---------------------------------|";

/// Comment characters per line before wrapping.
const COMMENT_WIDTH: usize = 54;
const COMMENT_INDENT: &str = "               ";

pub const BANNER: &str = "Welcome to InEx, an income and expense tracker\n\
Enter 'help' or 'about' command to know more\n";

pub const ABOUT: &str = "
\tInEx - CLI based Income and Expense tracking application
\tversion: 0.1.0
\tLicense: GNU GENERAL PUBLIC LICENSE, version 3 or later";

pub const HELP: &str = "
<----START OF HELP MENU---->

quit
\t- to quit or exit the application
\t- FORMAT: quit

help
\t- to know about available commands
\t- FORMAT: help

about
\t- about the application
\t- FORMAT: about

create
\t- to create a new inex file
\t- FORMAT: create <file_name>
\t- <file_name> contains alphanumerics, hyphen(-) and underscore(_)
\t- <file_name> maximum of 25 characters, without extension

open
\t- to open an existing inex file
\t- FORMAT: open <file_name>

remove
\t- to remove an existing inex file
\t- FORMAT: remove <file_name>

list
\t- to list all the inex files in the data directory
\t- FORMAT: list

add
\t- to add an income or an expense record
\t- FORMAT: add <in/ex>
\tflag: in, to add income
\tflag: ex, to add expense

edit
\t- to edit a record using its id, empty answers keep the field
\t- FORMAT: edit <id>

delete
\t- to delete a record using its id
\t- FORMAT: delete <id>

view
\t- to view all or given number of records
\t- FORMAT: view <all>/<count>
\t- without an argument, the top 15 records

filter
\t- to view records within the given range values
\t- FORMAT: filter <date/amount> <min_value> <max_value> <in/ex>
\t- dot(.) ignores either <min_value> or <max_value>, not both
\t- <in/ex> is optional, all records are considered without it

info
\t- to show the meta data of the current inex file
\t- FORMAT: info

save
\t- to save the current inex file
\t- FORMAT: save

close
\t- to close the current inex file
\t- FORMAT: close

<----END OF HELP MENU---->
";

pub fn record<W: Write>(out: &mut W, record: &Record) -> io::Result<()> {
    let marker = if record.is_income() { "+IN" } else { " x " };
    writeln!(
        out,
        " {:>3} | {:>15} | {} | {}\n",
        marker,
        record.amount().to_string(),
        record.date(),
        record.entity()
    )?;
    writeln!(out, "     ID      : {}", record.id())?;
    write!(out, "     COMMENT : ")?;
    for (idx, ch) in record.comment().chars().enumerate() {
        if idx != 0 && idx % COMMENT_WIDTH == 0 {
            write!(out, "\n{}", COMMENT_INDENT)?;
        }
        write!(out, "{}", ch)?;
    }
    writeln!(out, "\n\n{}", SEPARATOR)
}

pub fn aggregate<W: Write>(out: &mut W, aggregate: &Aggregate) -> io::Result<()> {
    for line in aggregate.to_string().lines() {
        writeln!(out, "\t{}", line)?;
    }
    Ok(())
}

pub fn view<W: Write>(out: &mut W, view: &View) -> io::Result<()> {
    writeln!(out, "{}", LIST_HEADER)?;
    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "{}", COLUMNS)?;
    writeln!(out, "{}", SEPARATOR)?;
    for r in &view.records {
        record(out, r)?;
    }
    writeln!(out, "{}", LIST_FOOTER)?;
    aggregate(out, &view.aggregate)
}

pub fn info<W: Write>(out: &mut W, info: &Info) -> io::Result<()> {
    writeln!(out, "\tFile name     : {}", info.file_name)?;
    writeln!(out, "\tNext id       : {}", info.next_id)?;
    aggregate(out, &info.aggregate)
}

#[cfg(test)]
mod tests {
    use crate::render;
    use libinex::amount::Cents;
    use libinex::query::Aggregate;

    use anyhow::Result;

    #[test]
    fn aggregate_lines_are_indented() -> Result<()> {
        let aggregate = Aggregate {
            count: 1,
            income: Cents::zero(),
            expense: Cents(50),
        };
        let mut out = Vec::new();
        render::aggregate(&mut out, &aggregate)?;
        let text = String::from_utf8(out)?;
        assert_eq!(
            text,
            "\tNo of records : 1\n\tTotal Income  : 0.00\n\tTotal Expense : 0.50\n\tBalance       : -0.50\n"
        );
        Ok(())
    }
}
