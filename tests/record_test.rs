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

use std::{borrow::Cow, fs, path::Path};

use tacacs_acct_lib::{
    epoch_to_instant, normalize_line, parse_argument, parse_line, parse_records, parse_timestamp,
    read_records, Argument, Quirks, Record, RecordType, ValidationErrorKind,
};

fn compare_fields(line: &str, quirks: &Quirks, fields: Vec<&str>) {
    let record = parse_line(line, 1, quirks);
    assert_eq!(record.fields, fields, "fields of {:?}", line);
}

#[test]
fn tab_separated_fields() {
    compare_fields(
        "Jan 05 10:00:00\t10.0.0.1\talice\ttty0\t10.0.0.2\tstart\tTID1\tstart_time=1700000000\tcustom=something",
        &Quirks::default(),
        vec![
            "Jan 05 10:00:00",
            "10.0.0.1",
            "alice",
            "tty0",
            "10.0.0.2",
            "start",
            "TID1",
            "start_time=1700000000",
            "custom=something",
        ],
    );
}

#[test]
fn fields_are_trimmed() {
    compare_fields(
        " Jan 05 10:00:00 \t 10.0.0.1\talice  \t\tstop",
        &Quirks::default(),
        vec!["Jan 05 10:00:00", "10.0.0.1", "alice", "", "stop"],
    );
}

#[test]
fn escaped_tab_between_arguments() {
    let line = "Jan 05 10:00:01\t10.0.0.1\talice\ttty0\t10.0.0.2\tstart\tTID1\telapsed_time=1\\011custom2*";
    let record = parse_line(line, 2, &Quirks::default());
    assert_eq!(record.line_number, 2);
    assert_eq!(record.arguments(), ["elapsed_time=1", "custom2*"]);

    let quirks = Quirks {
        escaped_tabs: false,
        ..Quirks::default()
    };
    let record = parse_line(line, 2, &quirks);
    assert_eq!(record.arguments(), [r"elapsed_time=1\011custom2*"]);
}

#[test]
fn degenerate_lines_still_split() {
    compare_fields("", &Quirks::default(), vec![""]);
    compare_fields("\t\t", &Quirks::default(), vec!["", "", ""]);
    compare_fields("   ", &Quirks::default(), vec![""]);
    compare_fields(r"\011", &Quirks::default(), vec!["", ""]);

    let records = parse_records("\n\t\nno tabs here", &Quirks::default());
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].fields, ["no tabs here"]);
    let err = records[0].common_fields().unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::MalformedRecord);
    assert_eq!(err.record(), Some(1));
}

#[test]
fn normalize_borrows_clean_lines() {
    let quirks = Quirks::default();
    assert!(matches!(normalize_line("a\tb", &quirks), Cow::Borrowed("a\tb")));
    assert_eq!(normalize_line(r"a\011b\011c", &quirks), "a\tb\tc");
    assert_eq!(normalize_line(r"a\011b", &Quirks::none()), r"a\011b");
}

#[test]
fn empty_input_has_no_records() {
    assert!(parse_records("", &Quirks::default()).is_empty());
}

#[test]
fn parsing_is_repeatable() {
    let contents = fs::read_to_string("./tests/test_acct/valid_escaped_tabs.acct").unwrap();
    let first = parse_records(&contents, &Quirks::default());
    let second = parse_records(&contents, &Quirks::default());
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|r| r.line_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn read_fixture() {
    let records = read_records(Path::new("./tests/test_acct/valid.acct"), &Quirks::default())
        .expect("fixture should be readable");
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].record_type_text().unwrap(), "stop");
    assert_eq!(records[2].arguments(), ["stop_time=1700000002"]);
}

#[test]
fn short_record_is_malformed() {
    let record = Record::new(4, vec!["Jan 05 10:00:00".into(), "10.0.0.1".into()]);
    let err = record.common_fields().unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::MalformedRecord);
    assert_eq!(err.record(), Some(4));
    assert!(record.arguments().is_empty());
}

#[test]
fn timestamps() {
    let stamp = parse_timestamp("Nov 14 22:13:20", 2023).unwrap();
    assert_eq!(stamp.timestamp(), 1700000000);
    assert_eq!(epoch_to_instant(1700000000), Some(stamp));

    let leap = parse_timestamp("Feb 29 00:00:00", 2024).unwrap();
    assert_eq!(leap.timestamp(), 1709164800);
}

#[test]
fn bad_timestamps() {
    for text in [
        "",
        "Nov 14",
        "Nov 14 22:13",
        "Foo 14 22:13:20",
        "Nov 14 22-13-20",
        "Nov 14 22:13:20 2023",
        "1700000000",
    ] {
        assert!(
            parse_timestamp(text, 2023).is_err(),
            "{:?} should not parse",
            text
        );
    }

    let err = parse_timestamp("Feb 30 00:00:00", 2023).unwrap_err();
    assert!(err.contains("not a valid date"), "{}", err);
    assert!(parse_timestamp("Feb 29 00:00:00", 2023).is_err());
    assert!(parse_timestamp("Nov 14 24:00:00", 2023).is_err());
}

#[test]
fn timestamp_error_points_at_problem() {
    let err = parse_timestamp("Nov 14 22-13-20", 2023).unwrap_err();
    // caret under the first '-'
    assert!(err.contains("Nov 14 22-13-20\n         ^"), "{}", err);
}

#[test]
fn record_timestamp_error() {
    let record = Record::new(
        1,
        vec!["yesterday".into(), "10.0.0.1".into()],
    );
    let err = record.timestamp(2023).unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::TimestampParse);
}

#[test]
fn arguments() {
    assert_eq!(
        parse_argument("start_time=1700000000"),
        Ok(Argument::new("start_time", "1700000000", true))
    );
    assert_eq!(
        parse_argument("custom2*"),
        Ok(Argument::new("custom2", "", false))
    );
    // first delimiter wins
    assert_eq!(
        parse_argument("cmd=a*b=c"),
        Ok(Argument::new("cmd", "a*b=c", true))
    );
    assert!(parse_argument("=value").is_err());
    assert!(parse_argument("noflag").is_err());
    assert!(parse_argument("").is_err());
}

#[test]
fn argument_display() {
    for encoded in ["custom=something", "custom2*", "elapsed_time=1", "cmd*a=b"] {
        assert_eq!(parse_argument(encoded).unwrap().to_string(), encoded);
    }
}

#[test]
fn record_types() {
    assert_eq!("start".parse::<RecordType>(), Ok(RecordType::Start));
    assert_eq!("stop".parse::<RecordType>(), Ok(RecordType::Stop));
    assert_eq!("update".parse::<RecordType>(), Ok(RecordType::Update));
    assert!("START".parse::<RecordType>().is_err());
    assert_eq!(RecordType::Update.to_string(), "update");
    assert_eq!(Quirks::default().update_record_type(), RecordType::Start);
    assert_eq!(Quirks::none().update_record_type(), RecordType::Update);
}
