//! # lxc-restart
//! Restarts a container from the state file written when it was
//! checkpointed. The container configuration is taken from the file given
//! with `--rcfile`, or from `<lxcpath>/<name>/config` when it exists.
mod commands;
mod observability;

use anyhow::{Context, Result};
use clap::Parser;

use liblxc_cli::{GlobalOpts, Restart};

// High-level commandline option definition
// The options shared by the lxc tools are followed by the restart specific ones.
#[derive(Parser, Debug)]
#[clap(name = "lxc-restart", version, author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(flatten)]
    restart: Restart,
}

/// This is the entry point of lxc-restart. Logging stays active until the
/// guard is dropped at the end of main.
fn main() -> Result<()> {
    let opts = Opts::parse();

    let _guard = observability::init(&opts).context("failed to initialize logging")?;

    tracing::debug!(
        "started by user {} with {:?}",
        nix::unistd::geteuid(),
        std::env::args_os()
    );

    commands::restart::restart(opts.restart, opts.global.lxcpath)
}
