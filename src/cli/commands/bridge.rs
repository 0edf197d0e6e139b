//! `lilerp bridge` command - JSON requests over stdin/stdout
//!
//! ```bash
//! echo '{"channel":"raw-materials:generateTestNumber"}' | lilerp bridge
//! ```

use miette::{IntoDiagnostic, Result};
use std::io;
use tracing::info;

use crate::bridge;
use crate::cli::helpers::{load_config, open_store};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct BridgeArgs {}

pub fn run(_args: BridgeArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let mut store = open_store(&config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let handled = bridge::serve(&mut store, stdin.lock(), stdout.lock()).into_diagnostic()?;

    info!(handled, "bridge input closed");
    Ok(())
}
