use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let output = cli.output;
    match cli.cmd {
        Command::Fingerprint(args) => super::fingerprint::run(args, output).await,
        Command::Resolve(args) => super::resolve::run(args, output),
        Command::Ci(args) => super::ci::run(args, output),
        Command::ContainerLogs(args) => super::container_logs::run(args, output),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
