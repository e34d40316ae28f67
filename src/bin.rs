use anyhow::{bail, Result};
use log::error;
use std::path::PathBuf;
use structopt::StructOpt;
use tacacs_acct_lib::{validate, ValidatorConfig};

/// Checks that a TACACS+ accounting log holds exactly one start/update/stop session
#[derive(StructOpt, Debug)]
struct AcctChecker {
    /// Accounting log written by the TACACS+ daemon
    #[structopt(parse(from_os_str))]
    accounting_file: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let AcctChecker { accounting_file } = AcctChecker::from_args();
    match validate(&accounting_file, &ValidatorConfig::default()) {
        Ok(summary) => {
            println!("Validated {}: {}", accounting_file.display(), summary);
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            bail!("{} failed validation", accounting_file.display())
        }
    }
}
