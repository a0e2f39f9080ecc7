// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use quarantine_cli::{OutputWriter, QuarantineApp};
use quarantine_tracker::exit_codes::QuarantineExitCode;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    let opts = match QuarantineApp::try_parse() {
        Ok(opts) => opts,
        Err(err) => {
            // --help and --version are printed to stdout and aren't failures.
            let code = if err.use_stderr() {
                QuarantineExitCode::SETUP_ERROR
            } else {
                QuarantineExitCode::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    let output = opts.init_output();

    match opts.exec(&mut OutputWriter::default()) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code())
        }
    }
}
