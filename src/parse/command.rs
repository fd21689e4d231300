use crate::exec::add::AddArgs;
use crate::exec::edit::EditPatch;
use crate::model::{ListKind, Recurrence};
use crate::parse::date::{DateError, parse_date};

/// Error type for the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    EmptyCommand,
    #[error("unknown command: {0}")]
    InvalidCommandType(String),
    #[error("invalid row number: {0}")]
    BadRow(String),
    #[error("invalid row range: {0}-{1}")]
    InvalidRange(usize, usize),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("unknown field: /{0}")]
    UnknownField(String),
    #[error("unknown recurrence: {0} (use day, week, month, or year)")]
    BadRecurrence(String),
    #[error("invalid occurrence count: {0}")]
    BadCount(String),
    #[error("unknown list: {0} (use pending, completed, or trash)")]
    UnknownList(String),
    #[error(transparent)]
    Date(#[from] DateError),
}

/// A command kind plus its typed arguments, ready for the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Add(AddArgs),
    Edit { row: usize, patch: EditPatch },
    Remove(Vec<usize>),
    Complete(Vec<usize>),
    Incomplete(Vec<usize>),
    Recover(Vec<usize>),
    Mark(Vec<usize>),
    Unmark(Vec<usize>),
    Clear,
    Search(String),
    Show(Option<ListKind>),
    Settings(Option<(String, String)>),
    Sync,
    Help,
    Exit,
    Undo,
    Redo,
}

/// Tokenize one input line.
pub fn parse(line: &str) -> Result<ParsedCommand, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = tokens.split_first() else {
        return Err(ParseError::EmptyCommand);
    };

    match head.to_ascii_lowercase().as_str() {
        "add" | "a" => parse_add(rest),
        "edit" | "e" => parse_edit(rest),
        "remove" | "rm" => Ok(ParsedCommand::Remove(parse_rows("remove", rest)?)),
        "complete" | "done" => Ok(ParsedCommand::Complete(parse_rows("complete", rest)?)),
        "incomplete" | "undone" => Ok(ParsedCommand::Incomplete(parse_rows("incomplete", rest)?)),
        "recover" => Ok(ParsedCommand::Recover(parse_rows("recover", rest)?)),
        "mark" => Ok(ParsedCommand::Mark(parse_rows("mark", rest)?)),
        "unmark" => Ok(ParsedCommand::Unmark(parse_rows("unmark", rest)?)),
        "clear" => Ok(ParsedCommand::Clear),
        "search" | "find" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("search"));
            }
            Ok(ParsedCommand::Search(rest.join(" ")))
        }
        "show" | "list" | "ls" => match rest.first() {
            None => Ok(ParsedCommand::Show(None)),
            Some(&name) => Ok(ParsedCommand::Show(Some(parse_list(name)?))),
        },
        "settings" | "set" => match rest {
            [] => Ok(ParsedCommand::Settings(None)),
            [key, value @ ..] if !value.is_empty() => Ok(ParsedCommand::Settings(Some((
                key.to_string(),
                value.join(" "),
            )))),
            _ => Err(ParseError::MissingArgument("settings")),
        },
        "sync" => Ok(ParsedCommand::Sync),
        "help" | "?" => Ok(ParsedCommand::Help),
        "exit" | "quit" | "q" => Ok(ParsedCommand::Exit),
        "undo" | "u" => Ok(ParsedCommand::Undo),
        "redo" => Ok(ParsedCommand::Redo),
        other => Err(ParseError::InvalidCommandType(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Row lists
// ---------------------------------------------------------------------------

/// Parse row tokens: each is a number or an `a-b` range (inclusive).
/// Duplicates are passed through — rejecting them is the command's job.
fn parse_rows(op: &'static str, tokens: &[&str]) -> Result<Vec<usize>, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::MissingArgument(op));
    }
    let mut rows = Vec::new();
    for token in tokens {
        if let Some((lo, hi)) = token.split_once('-') {
            let lo: usize = lo
                .parse()
                .map_err(|_| ParseError::BadRow(token.to_string()))?;
            let hi: usize = hi
                .parse()
                .map_err(|_| ParseError::BadRow(token.to_string()))?;
            if hi < lo {
                return Err(ParseError::InvalidRange(lo, hi));
            }
            rows.extend(lo..=hi);
        } else {
            rows.push(
                token
                    .parse()
                    .map_err(|_| ParseError::BadRow(token.to_string()))?,
            );
        }
    }
    Ok(rows)
}

fn parse_list(name: &str) -> Result<ListKind, ParseError> {
    match name.to_ascii_lowercase().as_str() {
        "pending" | "todo" => Ok(ListKind::Pending),
        "completed" | "complete" | "done" => Ok(ListKind::Completed),
        "trash" => Ok(ListKind::Trash),
        other => Err(ParseError::UnknownList(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Field clauses
// ---------------------------------------------------------------------------

/// Free text followed by `/field args...` clauses. Clause arguments run to
/// the next `/field` token, so dates may contain spaces.
struct Clauses {
    text: String,
    fields: Vec<(String, String)>,
}

fn split_clauses(tokens: &[&str]) -> Clauses {
    let mut text_tokens = Vec::new();
    let mut fields: Vec<(String, String)> = Vec::new();
    for &token in tokens {
        if let Some(name) = token.strip_prefix('/') {
            fields.push((name.to_ascii_lowercase(), String::new()));
        } else if let Some((_, args)) = fields.last_mut() {
            if !args.is_empty() {
                args.push(' ');
            }
            args.push_str(token);
        } else {
            text_tokens.push(token);
        }
    }
    Clauses {
        text: text_tokens.join(" "),
        fields,
    }
}

fn parse_recurrence(args: &str) -> Result<(Recurrence, Option<u32>), ParseError> {
    let mut words = args.split_whitespace();
    let period = match words.next() {
        None => return Err(ParseError::MissingArgument("/every")),
        Some(word) => match word.to_ascii_lowercase().as_str() {
            "day" | "daily" => Recurrence::Daily,
            "week" | "weekly" => Recurrence::Weekly,
            "month" | "monthly" => Recurrence::Monthly,
            "year" | "yearly" => Recurrence::Yearly,
            other => return Err(ParseError::BadRecurrence(other.to_string())),
        },
    };
    let occurrences = match words.next() {
        None => None,
        Some(word) => {
            let digits = word.strip_prefix(['x', 'X']).unwrap_or(word);
            Some(
                digits
                    .parse::<u32>()
                    .map_err(|_| ParseError::BadCount(word.to_string()))?,
            )
        }
    };
    Ok((period, occurrences))
}

fn parse_add(tokens: &[&str]) -> Result<ParsedCommand, ParseError> {
    let clauses = split_clauses(tokens);
    if clauses.text.is_empty() {
        return Err(ParseError::MissingArgument("add"));
    }

    let mut args = AddArgs {
        text: clauses.text,
        ..AddArgs::default()
    };
    for (field, value) in &clauses.fields {
        match field.as_str() {
            "from" => args.start = Some(parse_date(value)?),
            "to" | "by" => args.end = Some(parse_date(value)?),
            "tag" => args.tag = Some(value.clone()),
            "every" => {
                let (recurrence, occurrences) = parse_recurrence(value)?;
                args.recurrence = recurrence;
                args.occurrences = occurrences;
            }
            "important" | "i" => args.important = true,
            other => return Err(ParseError::UnknownField(other.to_string())),
        }
    }
    Ok(ParsedCommand::Add(args))
}

fn parse_edit(tokens: &[&str]) -> Result<ParsedCommand, ParseError> {
    let Some((&row_token, rest)) = tokens.split_first() else {
        return Err(ParseError::MissingArgument("edit"));
    };
    let row: usize = row_token
        .parse()
        .map_err(|_| ParseError::BadRow(row_token.to_string()))?;

    let clauses = split_clauses(rest);
    let mut patch = EditPatch::default();
    if !clauses.text.is_empty() {
        patch.text = Some(clauses.text);
    }
    for (field, value) in &clauses.fields {
        match field.as_str() {
            "from" => patch.start = Some(parse_date(value)?),
            "to" | "by" => patch.end = Some(parse_date(value)?),
            "tag" => patch.tag = Some(value.clone()),
            "every" => {
                let (recurrence, occurrences) = parse_recurrence(value)?;
                patch.recurrence = Some(recurrence);
                if occurrences.is_some() {
                    patch.occurrences = occurrences;
                }
            }
            "important" | "i" => patch.important = Some(true),
            "plain" => patch.important = Some(false),
            other => return Err(ParseError::UnknownField(other.to_string())),
        }
    }
    Ok(ParsedCommand::Edit { row, patch })
}
