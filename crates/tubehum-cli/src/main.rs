use tubehum_lib::cli::{ResolvedCommand, parse_args, resolve_command, run_download, run_probe};
use tubehum_lib::error::TubeHumError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), TubeHumError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Download(params) => {
            run_download(params).await?;
        }
        ResolvedCommand::Probe(params) => {
            run_probe(params).await?;
        }
    }

    Ok(())
}
