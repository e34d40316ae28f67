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

use std::path::Path;

use chrono::{DateTime, Datelike, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::arguments::parse_argument;
use crate::errors::{AcctError, ValidationError};
use crate::quirks::Quirks;
use crate::record::{read_records, CommonFields, Record, RecordType};
use crate::timestamp::{epoch_to_instant, parse_epoch_seconds};

/// A start, a watchdog update and a stop
pub const EXPECTED_RECORDS: usize = 3;

/// Knobs for a validation run.
///
/// The accounting timestamps carry no year, so `year` has to be known up front. `Default` takes it
/// from the system clock; tests should use [`ValidatorConfig::for_year`] so they stay deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Year the line timestamps are interpreted in
    pub year: i32,
    /// How far the `start_time` argument may drift from the start line timestamp.
    ///  The daemon stamps lines on packet arrival, the client stamps the argument when it builds the packet.
    pub start_leeway_secs: i64,
    /// The stop record has to land strictly within this many seconds after `start_time`
    pub stop_window_secs: i64,
    pub quirks: Quirks,
}

impl ValidatorConfig {
    pub fn for_year(year: i32) -> Self {
        ValidatorConfig {
            year,
            start_leeway_secs: 1,
            stop_window_secs: 3,
            quirks: Quirks::default(),
        }
    }

    /// Reject windows that no session could satisfy.
    pub fn check(&self) -> Result<(), ValidationError> {
        for (name, secs) in [
            ("start_leeway_secs", self.start_leeway_secs),
            ("stop_window_secs", self.stop_window_secs),
        ] {
            if secs < 0 {
                return Err(ValidationError::InvalidConfig {
                    reason: format!("{} must not be negative, got {}", name, secs),
                });
            }
        }
        Ok(())
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::for_year(Utc::now().year())
    }
}

/// What a successful run found out about the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub common: CommonFields,
    /// `start_time` argument of the start record, in epoch seconds
    pub start_time: i64,
    /// Line timestamp of the stop record, in epoch seconds
    pub stop_time: i64,
}

impl std::fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {} for {}@{} ({} -> {}): started {}, stopped {}",
            self.common.task_id,
            self.common.user,
            self.common.ip,
            self.common.port,
            self.common.remote_address,
            self.start_time,
            self.stop_time
        )
    }
}

pub fn validate_record_count(records: &[Record]) -> Result<(), ValidationError> {
    if records.len() != EXPECTED_RECORDS {
        return Err(ValidationError::RecordCount {
            expected: EXPECTED_RECORDS,
            actual: records.len(),
        });
    }
    Ok(())
}

/// Check one record against the session's common fields, a record type and an exact argument list.
///  Arguments are compared in order; a reordered list is a mismatch.
pub fn validate_record<S: AsRef<str>>(
    record: &Record,
    expected_common: &CommonFields,
    expected_type: RecordType,
    expected_args: &[S],
) -> Result<(), ValidationError> {
    let common = record.common_fields()?;
    if let Some((field, expected, actual)) = expected_common.first_mismatch(&common) {
        return Err(ValidationError::CommonFieldMismatch {
            record: record.line_number,
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }

    let record_type = record.record_type_text()?;
    if record_type.parse::<RecordType>().ok() != Some(expected_type) {
        return Err(ValidationError::TypeMismatch {
            record: record.line_number,
            expected: expected_type.to_string(),
            actual: record_type.to_string(),
        });
    }

    let actual_args = record.arguments();
    for position in 0..expected_args.len().max(actual_args.len()) {
        let expected: Option<&str> = expected_args.get(position).map(|a| a.as_ref());
        let actual: Option<&str> = actual_args.get(position).map(String::as_str);
        if expected != actual {
            return Err(ValidationError::ArgumentMismatch {
                record: record.line_number,
                position: position + 1,
                expected: expected.map(str::to_string),
                actual: actual.map(str::to_string),
            });
        }
    }

    debug!("record {} is a valid {} record", record.line_number, expected_type);
    Ok(())
}

/// Pull the `start_time` argument out of the start record, as its raw value and as an instant.
fn start_time_argument(record: &Record) -> Result<(String, DateTime<Utc>), ValidationError> {
    let malformed = |reason: String| ValidationError::MalformedRecord {
        record: record.line_number,
        reason,
    };

    let encoded = record
        .arguments()
        .first()
        .ok_or_else(|| malformed("start record has no start_time argument".to_string()))?;
    let argument = parse_argument(encoded)
        .map_err(|e| malformed(format!("bad start_time argument:\n{}", e)))?;
    if argument.name != "start_time" {
        return Err(malformed(format!(
            "first argument should be start_time, found {:?}",
            argument.name
        )));
    }

    let seconds = parse_epoch_seconds(&argument.value)
        .map_err(|e| malformed(format!("start_time is not epoch seconds:\n{}", e)))?;
    let instant = epoch_to_instant(seconds)
        .ok_or_else(|| malformed(format!("start_time {} is out of range", seconds)))?;

    Ok((argument.value, instant))
}

/// Validate a parsed start/update/stop triple. Stops at the first failed check.
pub fn validate_records(
    records: &[Record],
    config: &ValidatorConfig,
) -> Result<ValidationSummary, ValidationError> {
    config.check()?;
    validate_record_count(records)?;
    let (start, update, stop) = (&records[0], &records[1], &records[2]);

    // first record: start
    let common = start.common_fields()?;
    let start_stamp = start.timestamp(config.year)?;
    let (start_time_value, start_time) = start_time_argument(start)?;

    let skew = (start_time - start_stamp).num_seconds().abs();
    if skew > config.start_leeway_secs {
        return Err(ValidationError::TimestampWindow {
            record: start.line_number,
            reason: format!(
                "start_time {} is {}s away from the line timestamp {}, more than the {}s allowed",
                start_time, skew, start_stamp, config.start_leeway_secs
            ),
        });
    }

    validate_record(
        start,
        &common,
        RecordType::Start,
        &[
            format!("start_time={}", start_time_value),
            "custom=something".to_string(),
        ],
    )?;

    // second record: watchdog update
    validate_record(
        update,
        &common,
        config.quirks.update_record_type(),
        &["elapsed_time=1", "custom2*"],
    )?;

    // final record: stop
    let stop_stamp = stop.timestamp(config.year)?;
    // both ends are valid instants, so the difference can't overflow
    let elapsed = (stop_stamp - start_time).num_seconds();
    if elapsed <= 0 || elapsed >= config.stop_window_secs {
        return Err(ValidationError::TimestampWindow {
            record: stop.line_number,
            reason: format!(
                "stop timestamp {} is {}s after start_time {}, expected strictly between 0 and {}s",
                stop_stamp, elapsed, start_time, config.stop_window_secs
            ),
        });
    }

    validate_record(
        stop,
        &common,
        RecordType::Stop,
        &[format!("stop_time={}", stop_stamp.timestamp())],
    )?;

    let summary = ValidationSummary {
        common,
        start_time: start_time.timestamp(),
        stop_time: stop_stamp.timestamp(),
    };
    info!("accounting records valid: {}", summary);
    Ok(summary)
}

/// Read an accounting file and validate it.
pub fn validate(path: &Path, config: &ValidatorConfig) -> Result<ValidationSummary, AcctError> {
    let records = read_records(path, &config.quirks)?;
    Ok(validate_records(&records, config)?)
}
