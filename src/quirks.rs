use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::record::RecordType;

/// The escaped form of a tab that the daemon writes between trailing arguments.
const ESCAPED_TAB: &str = "\\011";

/// Defects of the shrubbery TACACS+ daemon that are compensated for before records are matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quirks {
    /// Arguments after the task id are sometimes separated by a literal `\011` instead of a tab.
    pub escaped_tabs: bool,
    /// The daemon reads accounting flags the draft way, so watchdog updates are logged as `start`.
    pub update_typed_as_start: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            escaped_tabs: true,
            update_typed_as_start: true,
        }
    }
}

impl Quirks {
    /// No compensation at all; the log has to be RFC 8907 clean.
    pub fn none() -> Self {
        Quirks {
            escaped_tabs: false,
            update_typed_as_start: false,
        }
    }

    /// Record type the watchdog update line is expected to carry.
    pub fn update_record_type(&self) -> RecordType {
        if self.update_typed_as_start {
            RecordType::Start
        } else {
            RecordType::Update
        }
    }
}

/// Undo the daemon's line-level defects. Borrows when there is nothing to fix.
pub fn normalize_line<'a>(line: &'a str, quirks: &Quirks) -> Cow<'a, str> {
    if quirks.escaped_tabs && line.contains(ESCAPED_TAB) {
        Cow::Owned(line.replace(ESCAPED_TAB, "\t"))
    } else {
        Cow::Borrowed(line)
    }
}
