use crate::cli::{CompletionsArgs, KubeLaunch};
use anyhow::Result;
use clap::CommandFactory;
use std::io::{self, Write};

pub(crate) fn handle_completions(args: CompletionsArgs) -> Result<()> {
    let mut cmd = KubeLaunch::command();
    let mut buf = Vec::<u8>::new();
    clap_complete::generate::<clap_complete::Shell, _>(
        args.shell.into(),
        &mut cmd,
        env!("CARGO_PKG_NAME"),
        &mut buf,
    );

    match io::stdout().write_all(&buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e.into()),
    }
}
