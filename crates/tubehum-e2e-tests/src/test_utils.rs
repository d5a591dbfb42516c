use eyre::Result;
use std::path::Path;
use std::sync::OnceLock;
use tempfile::TempDir;
use tubehum_lib::config::Config;

pub const FAKE_SINGLE_URL: &str = "https://media.test/watch?v=solo";
/// Three members, the second of which always fails as unavailable.
pub const FAKE_COLLECTION_URL: &str = "https://media.test/playlist?list=roadtrip";
pub const FAKE_EMPTY_COLLECTION_URL: &str = "https://media.test/playlist?list=empty";

/// Stands in for yt-dlp. Probes answer from a fixed catalogue; fetches write
/// the media file plus the thumbnail and partial leftovers a real run leaves
/// behind, then print the after-move JSON line.
const FAKE_YT_DLP: &str = r#"#!/bin/sh
url=""
out=""
probe=0
while [ $# -gt 0 ]; do
    case "$1" in
        --dump-single-json) probe=1 ;;
        -o) shift; out="$1" ;;
        --) shift; url="$1" ;;
    esac
    shift
done

if [ "$probe" = 1 ]; then
    case "$url" in
        *empty*)
            echo '{"_type":"playlist","title":"Nothing Here","entries":[]}' ;;
        *playlist*)
            echo '{"_type":"playlist","title":"Road Trip","entries":[{"url":"https://media.test/watch?v=one"},{"url":"https://media.test/watch?v=fail"},null,{"webpage_url":"https://media.test/watch?v=three","url":"three"},{"url":"https://media.test/watch?v=one"}]}' ;;
        *)
            echo '{"title":"Solo","duration":61.5,"filesize_approx":4096}' ;;
    esac
    exit 0
fi

case "$url" in
    *fail*)
        echo "ERROR: [generic] fail: Video unavailable" >&2
        exit 1 ;;
esac

dir=$(dirname "$out")
id=${url##*=}
printf 'audio' > "$dir/$id.mp3"
printf 'image' > "$dir/$id.webp"
printf 'partial' > "$dir/$id.mp3.part"
printf '{"title":"Track %s","filepath":"%s","filesize":null,"duration":12.5}\n' "$id" "$dir/$id.mp3"
"#;

static FAKE_YT_DLP_DIR: OnceLock<TempDir> = OnceLock::new();

/// Path to the scripted yt-dlp. It is written once per test binary, before
/// any test can spawn it, so no child inherits an open write handle.
pub fn fake_yt_dlp() -> &'static Path {
    FAKE_YT_DLP_DIR
        .get_or_init(|| {
            use std::os::unix::fs::PermissionsExt;

            let dir = tempfile::tempdir().expect("Failed to create fake tool dir");
            let script = dir.path().join("yt-dlp");
            std::fs::write(&script, FAKE_YT_DLP).expect("Failed to write fake yt-dlp");
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
                .expect("Failed to make fake yt-dlp executable");
            dir
        })
        .path()
}

pub fn create_test_config(base_dir: &Path) -> Config {
    let mut config = Config::default();
    config.output.base_dir = base_dir.join("downloads");
    config.tools.yt_dlp = Some(fake_yt_dlp().join("yt-dlp"));
    config.download.workers = 2;
    config.download.item_timeout_secs = 30;
    config
}

/// Creates a temp dir holding `config.json` for the fake toolchain.
pub fn setup_test_environment() -> Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;

    let config = create_test_config(temp_dir.path());
    let config_path = temp_dir.path().join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    Ok(temp_dir)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .with_test_writer()
        .try_init();
}
