use anyhow::Result;
use hijri_sync::config::{FetchConfig, FetchMode};
use hijri_sync::fetch::{BrowserFetcher, HttpFetcher, PageFetcher, build_fetcher};
use hijri_sync::parser::extract_from_document;

#[test]
fn file_mode_without_path_is_rejected() {
    let config = FetchConfig {
        mode: FetchMode::File,
        ..FetchConfig::default()
    };
    assert!(build_fetcher(&config).is_err());
}

#[test]
fn http_connection_error_is_reported() -> Result<()> {
    let config = FetchConfig {
        timeout_secs: 2,
        ..FetchConfig::default()
    };
    let fetcher = HttpFetcher::new(&config)?;
    assert!(fetcher.fetch("http://127.0.0.1:9/").is_err());
    Ok(())
}

#[test]
fn invalid_header_name_fails_client_setup() {
    let mut config = FetchConfig::default();
    config
        .headers
        .insert("bad header".to_string(), "x".to_string());
    assert!(HttpFetcher::new(&config).is_err());
}

#[cfg(unix)]
#[test]
fn browser_output_is_captured_as_markup() -> Result<()> {
    // `sh -c` ignores the trailing browser flags, which land in $0.. $n.
    let config = FetchConfig {
        mode: FetchMode::Browser,
        browser_binary: "sh".to_string(),
        browser_args: vec![
            "-c".to_string(),
            "printf '<html><body><span>الأحد ١٥ رجب ١٤٤٧</span></body></html>'".to_string(),
        ],
        timeout_secs: 10,
        ..FetchConfig::default()
    };

    let doc = BrowserFetcher::new(&config).fetch("https://www.spa.gov.sa/")?;
    let found = extract_from_document(&doc).expect("date in rendered dom");
    assert_eq!((found.day, found.month, found.year), (15, 7, 1447));
    Ok(())
}

#[cfg(unix)]
#[test]
fn browser_is_killed_after_timeout() {
    let config = FetchConfig {
        mode: FetchMode::Browser,
        browser_binary: "sh".to_string(),
        browser_args: vec!["-c".to_string(), "sleep 30".to_string()],
        timeout_secs: 1,
        ..FetchConfig::default()
    };

    let started = std::time::Instant::now();
    let err = BrowserFetcher::new(&config)
        .fetch("https://www.spa.gov.sa/")
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[cfg(unix)]
#[test]
fn browser_failure_exit_is_an_error() {
    let config = FetchConfig {
        mode: FetchMode::Browser,
        browser_binary: "sh".to_string(),
        browser_args: vec!["-c".to_string(), "exit 3".to_string()],
        timeout_secs: 5,
        ..FetchConfig::default()
    };
    assert!(BrowserFetcher::new(&config).fetch("https://www.spa.gov.sa/").is_err());
}
