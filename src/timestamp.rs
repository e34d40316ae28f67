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

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{char, space1};
use nom::combinator::{all_consuming, map_res};
use nom::error::{context, VerboseError, VerboseErrorKind};
use nom::sequence::tuple;
use nom::IResult;

use crate::errors::pretty_print_error;

/// This type helps us use custom verbose errors
pub(crate) type Res<T, U> = IResult<T, U, VerboseError<T>>;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Hour, minute, second
type Clock = (u32, u32, u32);

/// Parse a three letter English month name into its 1-based number
fn month(input: &str) -> Res<&str, u32> {
    let (rest, name) = take_while_m_n(3, 3, |c: char| c.is_ascii_alphabetic())(input)?;
    match MONTHS.iter().position(|m| m.eq_ignore_ascii_case(name)) {
        Some(index) => Ok((rest, index as u32 + 1)),
        None => Err(nom::Err::Error(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context("unknown month name"))],
        })),
    }
}

/// Generates a parser for a decimal number between `min` and `max` digits long
fn digits<'a>(min: usize, max: usize) -> impl FnMut(&'a str) -> Res<&'a str, u32> {
    map_res(
        take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
        str::parse::<u32>,
    )
}

/// Parse `HH:MM:SS`
fn clock(input: &str) -> Res<&str, Clock> {
    let (rest, (hour, _, minute, _, second)) = tuple((
        context("hour", digits(2, 2)),
        char(':'),
        context("minute", digits(2, 2)),
        char(':'),
        context("second", digits(2, 2)),
    ))(input)?;
    Ok((rest, (hour, minute, second)))
}

/// Parse the syslog-style `Mon DD HH:MM:SS` stamp the daemon writes at the start of each line.
///  The day may be padded with an extra space instead of a zero.
fn syslog_stamp(input: &str) -> Res<&str, (u32, u32, Clock)> {
    let (rest, (month, _, day, _, clock)) = all_consuming(tuple((
        context("month", month),
        space1,
        context("day", digits(1, 2)),
        space1,
        context("time", clock),
    )))(input)?;
    Ok((rest, (month, day, clock)))
}

/// Parse a `Mon DD HH:MM:SS` timestamp as UTC in the given year.
///  The stamp carries no year of its own, so the caller has to supply one.
pub fn parse_timestamp(text: &str, year: i32) -> Result<DateTime<Utc>, String> {
    let (month, day, (hour, minute, second)) = match syslog_stamp(text) {
        Ok((_, stamp)) => stamp,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(pretty_print_error(text, e))
        }
        Err(e) => return Err(e.to_string()),
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| format!("{:?} is not a valid date and time in {}", text, year))?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Convert seconds since the UNIX epoch to a UTC instant.
pub fn epoch_to_instant(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

/// Parse an integer count of epoch seconds, as carried by `start_time`/`stop_time` arguments.
pub(crate) fn parse_epoch_seconds(text: &str) -> Result<i64, String> {
    let res: Res<&str, i64> = context(
        "epoch seconds",
        all_consuming(nom::character::complete::i64),
    )(text);
    match res {
        Ok((_, seconds)) => Ok(seconds),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(pretty_print_error(text, e)),
        Err(e) => Err(e.to_string()),
    }
}
