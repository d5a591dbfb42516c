use tubehum_lib::config::{ENV_PREFIX, USER_AGENT_SEPARATOR, load_config};

// Kept alone in its own test binary: it mutates the process environment.
#[test]
fn test_environment_overrides_file_values() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        "download:\n  workers: 3\n  retries: 2\noutput:\n  dir_prefix: from-file\n",
    )
    .expect("Failed to write config");

    unsafe {
        std::env::set_var(format!("{ENV_PREFIX}__DOWNLOAD__WORKERS"), "11");
        std::env::set_var(
            format!("{ENV_PREFIX}__CREDENTIALS__COOKIES_FROM_BROWSER"),
            "firefox",
        );
        std::env::set_var(
            format!("{ENV_PREFIX}__USER_AGENTS"),
            [
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6)",
            ]
            .join(USER_AGENT_SEPARATOR),
        );
    }

    let config = load_config(Some(config_path.to_str().unwrap())).expect("Config should load");

    assert_eq!(config.download.workers, 11);
    assert_eq!(config.download.retries, 2);
    assert_eq!(config.output.dir_prefix, "from-file");
    assert_eq!(
        config.credentials.cookies_from_browser.as_deref(),
        Some("firefox")
    );
    assert_eq!(
        config.user_agents,
        vec![
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6)".to_string(),
        ]
    );
}
