/*
 * Copyright 2025 The MITRE Corporation

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
 */

use std::path::PathBuf;

use nom::error::{VerboseError, VerboseErrorKind};
use thiserror::Error;

/// Everything that can stop a validation run.
#[derive(Error, Debug)]
pub enum AcctError {
    #[error("Could not read accounting file {}. Error: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AcctError {
    /// The validation failure behind this error, if it wasn't an I/O problem.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            AcctError::Validation(e) => Some(e),
            AcctError::Io { .. } => None,
        }
    }
}

/// A violated expectation about the contents of an accounting file, or a configuration that can't
/// express one.
///
/// `record` is always the 1-based line number of the offending record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected {expected} accounting records, found {actual}")]
    RecordCount { expected: usize, actual: usize },

    #[error("record {record}: malformed record: {reason}")]
    MalformedRecord { record: usize, reason: String },

    #[error("record {record}: {field} mismatch: expected {expected:?}, found {actual:?}")]
    CommonFieldMismatch {
        record: usize,
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("record {record}: record type mismatch: expected {expected:?}, found {actual:?}")]
    TypeMismatch {
        record: usize,
        expected: String,
        actual: String,
    },

    #[error(
        "record {record}: argument {position} mismatch: expected {}, found {}",
        describe_argument(.expected),
        describe_argument(.actual)
    )]
    ArgumentMismatch {
        record: usize,
        position: usize,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("record {record}: could not parse timestamp {text:?}\n{reason}")]
    TimestampParse {
        record: usize,
        text: String,
        reason: String,
    },

    #[error("record {record}: timestamp window violation: {reason}")]
    TimestampWindow { record: usize, reason: String },

    #[error("invalid validator configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Category of a [`ValidationError`], without the diagnostic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    RecordCount,
    MalformedRecord,
    CommonFieldMismatch,
    TypeMismatch,
    ArgumentMismatch,
    TimestampParse,
    TimestampWindow,
    InvalidConfig,
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        use ValidationError::*;
        match self {
            RecordCount { .. } => ValidationErrorKind::RecordCount,
            MalformedRecord { .. } => ValidationErrorKind::MalformedRecord,
            CommonFieldMismatch { .. } => ValidationErrorKind::CommonFieldMismatch,
            TypeMismatch { .. } => ValidationErrorKind::TypeMismatch,
            ArgumentMismatch { .. } => ValidationErrorKind::ArgumentMismatch,
            TimestampParse { .. } => ValidationErrorKind::TimestampParse,
            TimestampWindow { .. } => ValidationErrorKind::TimestampWindow,
            InvalidConfig { .. } => ValidationErrorKind::InvalidConfig,
        }
    }

    /// Line number of the record that failed, if the failure belongs to one record.
    pub fn record(&self) -> Option<usize> {
        use ValidationError::*;
        match self {
            RecordCount { .. } | InvalidConfig { .. } => None,
            MalformedRecord { record, .. }
            | CommonFieldMismatch { record, .. }
            | TypeMismatch { record, .. }
            | ArgumentMismatch { record, .. }
            | TimestampParse { record, .. }
            | TimestampWindow { record, .. } => Some(*record),
        }
    }
}

fn describe_argument(argument: &Option<String>) -> String {
    match argument {
        Some(a) => format!("{:?}", a),
        None => "nothing".to_string(),
    }
}

/// Byte offset of `substring` within `input`, falling back to a search when
/// `substring` isn't a subslice.
fn offset_in(input: &str, substring: &str) -> usize {
    let fst = input.as_ptr() as usize;
    let snd = substring.as_ptr() as usize;
    match snd.checked_sub(fst) {
        Some(offset) if offset <= input.len() => offset,
        _ => input.find(substring).unwrap_or(input.len()),
    }
}

/// Renders a `VerboseError` from one of the single-field parsers as a trace with a caret under
///  the position where parsing stopped. Fields are short so the whole input is always printed.
pub fn pretty_print_error(input: &str, e: VerboseError<&str>) -> String {
    use std::fmt::Write;

    let mut result = String::new();

    for (i, (substring, kind)) in e.errors.iter().enumerate() {
        let offset = offset_in(input, substring);
        // 1-indexed column, counted in characters so the caret lines up
        let column = input[..offset].chars().count() + 1;

        let what = match kind {
            VerboseErrorKind::Char(c) => match substring.chars().next() {
                Some(actual) => format!("expected '{}', found {}", c, actual),
                None => format!("expected '{}', got end of input", c),
            },
            VerboseErrorKind::Context(s) => format!("in {}", s),
            VerboseErrorKind::Nom(e) => format!("in {:?}", e),
        };

        // Because `write!` to a `String` is infallible, this `unwrap` is fine.
        write!(
            &mut result,
            "{i}: at pos {column}, {what}:\n{input}\n{caret:>column$}\n\n",
            i = i,
            column = column,
            what = what,
            input = input,
            caret = '^',
        )
        .unwrap();
    }

    result
}
