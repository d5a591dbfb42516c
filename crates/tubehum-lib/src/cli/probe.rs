use crate::cli::ProbeParams;
use crate::cli::download::build_extractor;
use crate::error::TubeHumError;
use crate::resolver::{ResolvedSource, resolve_source};

/// Resolves the URL and prints the result to stdout as JSON.
pub async fn run_probe(params: ProbeParams) -> Result<ResolvedSource, TubeHumError> {
    let extractor = build_extractor(&params.app_config)?;
    let resolved = resolve_source(&extractor, &params.url).await?;

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(resolved)
}
