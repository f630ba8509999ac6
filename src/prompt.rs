//! Line-based interactive prompts on stdin/stderr.
//!
//! Options are shown numbered from 1; the selections returned are 0-based
//! indices into the list that was displayed.

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::error::TfmvError;
use crate::moves::SelectOption;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("'{0}' is not a number or range")]
    InvalidToken(String),
    #[error("{index} is out of range (1-{len})")]
    OutOfRange { index: usize, len: usize },
}

/// Parses `1,3`, `2-4`, `all`, or an empty answer (nothing selected).
pub fn parse_selection(input: &str, len: usize) -> Result<BTreeSet<usize>, SelectionError> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok((0..len).collect());
    }

    let mut selected = BTreeSet::new();
    for token in input
        .split([',', ' '])
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_index(start, token)?, parse_index(end, token)?),
            None => {
                let index = parse_index(token, token)?;
                (index, index)
            }
        };

        for index in [start, end] {
            if index == 0 || index > len {
                return Err(SelectionError::OutOfRange { index, len });
            }
        }
        if start > end {
            return Err(SelectionError::InvalidToken(token.to_string()));
        }

        selected.extend((start - 1)..end);
    }

    Ok(selected)
}

fn parse_index(value: &str, token: &str) -> Result<usize, SelectionError> {
    value
        .trim()
        .parse()
        .map_err(|_| SelectionError::InvalidToken(token.to_string()))
}

fn read_answer<R: BufRead>(reader: &mut R) -> Result<String, TfmvError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(TfmvError::Cancelled);
    }
    Ok(line)
}

/// Asks until the answer parses. End of input cancels.
pub fn select_moves<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    options: &[SelectOption],
) -> Result<BTreeSet<usize>, TfmvError> {
    for option in options {
        writeln!(writer, "[{}] {}", option.index + 1, option.label)?;
    }

    loop {
        write!(writer, "Select moves to apply (e.g. 1,3 or 2-4, 'all', empty for none): ")?;
        writer.flush()?;

        match parse_selection(&read_answer(reader)?, options.len()) {
            Ok(selected) => return Ok(selected),
            Err(e) => writeln!(writer, "{e}")?,
        }
    }
}

/// Single choice among `items`; asks until a valid number is given.
pub fn choose_one<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    message: &str,
    items: &[String],
) -> Result<usize, TfmvError> {
    for (i, item) in items.iter().enumerate() {
        writeln!(writer, "[{}] {item}", i + 1)?;
    }

    loop {
        write!(writer, "{message} [1-{}]: ", items.len())?;
        writer.flush()?;

        let answer = read_answer(reader)?;
        match answer.trim().parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
            _ => writeln!(writer, "please enter a number between 1 and {}", items.len())?,
        }
    }
}

pub fn select_moves_interactive(options: &[SelectOption]) -> Result<BTreeSet<usize>, TfmvError> {
    select_moves(&mut io::stdin().lock(), &mut io::stderr(), options)
}

pub fn choose_one_interactive(message: &str, items: &[String]) -> Result<usize, TfmvError> {
    choose_one(&mut io::stdin().lock(), &mut io::stderr(), message, items)
}
