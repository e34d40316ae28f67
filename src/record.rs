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

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{AcctError, ValidationError};
use crate::quirks::{normalize_line, Quirks};
use crate::timestamp::parse_timestamp;

// Positions of the fixed fields in a record (shrubbery daemon):
// timestamp <tab> IP <tab> user <tab> port <tab> remote_addr <tab> (start | stop | update) <tab> arguments*
const TIMESTAMP_INDEX: usize = 0;
const IP_INDEX: usize = 1;
const USER_INDEX: usize = 2;
const PORT_INDEX: usize = 3;
const REMOTE_ADDR_INDEX: usize = 4;
const RECORD_TYPE_INDEX: usize = 5;
// always the first argument
const TASK_ID_INDEX: usize = 6;
// other arguments go after the task id
const OTHER_ARGUMENTS_START: usize = 7;

/// Type of an accounting record, as written in the record type field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Start,
    Stop,
    Update,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Start => "start",
            RecordType::Stop => "stop",
            RecordType::Update => "update",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(RecordType::Start),
            "stop" => Ok(RecordType::Stop),
            "update" => Ok(RecordType::Update),
            other => Err(format!("unknown record type {:?}", other)),
        }
    }
}

/// The fields that describe the session itself, and so must match across all of its records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonFields {
    pub ip: String,
    pub user: String,
    pub port: String,
    pub remote_address: String,
    pub task_id: String,
}

impl CommonFields {
    /// The first field that differs from `other`, as (name, ours, theirs)
    pub fn first_mismatch<'a>(
        &'a self,
        other: &'a CommonFields,
    ) -> Option<(&'static str, &'a str, &'a str)> {
        [
            ("ip address", &self.ip, &other.ip),
            ("user", &self.user, &other.user),
            ("port", &self.port, &other.port),
            ("remote address", &self.remote_address, &other.remote_address),
            ("task id", &self.task_id, &other.task_id),
        ]
        .into_iter()
        .find(|(_, ours, theirs)| ours != theirs)
        .map(|(name, ours, theirs)| (name, ours.as_str(), theirs.as_str()))
    }
}

/// One line of an accounting file, split into its tab-delimited fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based line number within the file
    pub line_number: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(line_number: usize, fields: Vec<String>) -> Self {
        Record {
            line_number,
            fields,
        }
    }

    fn malformed(&self, reason: String) -> ValidationError {
        ValidationError::MalformedRecord {
            record: self.line_number,
            reason,
        }
    }

    fn field(&self, index: usize, name: &str) -> Result<&str, ValidationError> {
        self.fields.get(index).map(String::as_str).ok_or_else(|| {
            self.malformed(format!(
                "missing {} field (index {}); record has {} fields",
                name,
                index,
                self.fields.len()
            ))
        })
    }

    pub fn timestamp_text(&self) -> Result<&str, ValidationError> {
        self.field(TIMESTAMP_INDEX, "timestamp")
    }

    pub fn record_type_text(&self) -> Result<&str, ValidationError> {
        self.field(RECORD_TYPE_INDEX, "record type")
    }

    /// Arguments following the task id. Empty when there are none.
    pub fn arguments(&self) -> &[String] {
        self.fields.get(OTHER_ARGUMENTS_START..).unwrap_or(&[])
    }

    /// Project the record onto its session-identifying fields.
    pub fn common_fields(&self) -> Result<CommonFields, ValidationError> {
        Ok(CommonFields {
            ip: self.field(IP_INDEX, "ip address")?.to_string(),
            user: self.field(USER_INDEX, "user")?.to_string(),
            port: self.field(PORT_INDEX, "port")?.to_string(),
            remote_address: self.field(REMOTE_ADDR_INDEX, "remote address")?.to_string(),
            task_id: self.field(TASK_ID_INDEX, "task id")?.to_string(),
        })
    }

    /// Parse the line timestamp, which is UTC but has no year of its own.
    pub fn timestamp(&self, year: i32) -> Result<DateTime<Utc>, ValidationError> {
        let text = self.timestamp_text()?;
        parse_timestamp(text, year).map_err(|reason| ValidationError::TimestampParse {
            record: self.line_number,
            text: text.to_string(),
            reason,
        })
    }
}

/// Parse a single line of an accounting file. Quirks are compensated before the line is split.
///  Every line splits into at least one field; missing fields surface later as `MalformedRecord`.
pub fn parse_line(line: &str, line_number: usize, quirks: &Quirks) -> Record {
    let normalized = normalize_line(line, quirks);
    Record::new(
        line_number,
        normalized.split('\t').map(|f| f.trim().to_string()).collect(),
    )
}

/// Parse the contents of an accounting file into records, one per line, in file order.
pub fn parse_records(input: &str, quirks: &Quirks) -> Vec<Record> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let record = parse_line(line, i + 1, quirks);
            debug!("record {}: {:?}", record.line_number, record.fields);
            record
        })
        .collect()
}

/// Read and parse an accounting file.
pub fn read_records(path: &Path, quirks: &Quirks) -> Result<Vec<Record>, AcctError> {
    let contents = fs::read_to_string(path).map_err(|source| AcctError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_records(&contents, quirks))
}
