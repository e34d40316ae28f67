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

use nom::branch::alt;
use nom::bytes::complete::take_till1;
use nom::character::complete::char;
use nom::combinator::rest;
use nom::error::context;
use nom::sequence::tuple;
use serde::{Deserialize, Serialize};

use crate::errors::pretty_print_error;
use crate::timestamp::Res;

/// Delimiter between name and value of an argument the server must honor
const MANDATORY_DELIMITER: char = '=';
/// Delimiter between name and value of an argument the server may ignore
const OPTIONAL_DELIMITER: char = '*';

/// A TACACS+ attribute-value pair as logged by the accounting daemon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: String,
    pub required: bool,
}

impl Argument {
    pub fn new(name: &str, value: &str, required: bool) -> Self {
        Argument {
            name: name.to_string(),
            value: value.to_string(),
            required,
        }
    }

    fn delimiter(&self) -> char {
        if self.required {
            MANDATORY_DELIMITER
        } else {
            OPTIONAL_DELIMITER
        }
    }
}

impl std::fmt::Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.name, self.delimiter(), self.value)
    }
}

/// Parse an argument name. Names end at the first delimiter and can't be empty.
fn argument_name(input: &str) -> Res<&str, &str> {
    take_till1(|c: char| c == MANDATORY_DELIMITER || c == OPTIONAL_DELIMITER)(input)
}

/// Parse `name=value` or `name*value`. Everything after the delimiter is the value,
///  including further delimiter characters.
fn argument(input: &str) -> Res<&str, Argument> {
    let (remaining, (name, delimiter, value)) = tuple((
        context("argument name", argument_name),
        context(
            "argument delimiter",
            alt((char(MANDATORY_DELIMITER), char(OPTIONAL_DELIMITER))),
        ),
        rest,
    ))(input)?;
    Ok((remaining, Argument::new(name, value, delimiter == MANDATORY_DELIMITER)))
}

/// Parse a single encoded argument field.
///  If it isn't a valid argument, returns a nicely-formatted error message
pub fn parse_argument(input: &str) -> Result<Argument, String> {
    match context("argument", argument)(input) {
        Ok((_, argument)) => Ok(argument),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(pretty_print_error(input, e)),
        Err(e) => Err(e.to_string()),
    }
}
