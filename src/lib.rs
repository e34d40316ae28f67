mod arguments;
mod errors;
mod quirks;
mod record;
mod timestamp;
mod validator;

pub use arguments::{parse_argument, Argument};
pub use errors::{pretty_print_error, AcctError, ValidationError, ValidationErrorKind};
pub use quirks::{normalize_line, Quirks};
pub use record::{parse_line, parse_records, read_records, CommonFields, Record, RecordType};
pub use timestamp::{epoch_to_instant, parse_timestamp};
pub use validator::{
    validate, validate_record, validate_record_count, validate_records, ValidationSummary,
    ValidatorConfig, EXPECTED_RECORDS,
};
