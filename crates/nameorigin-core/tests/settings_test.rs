use std::io::Write;

use nameorigin_core::{PopularityScope, Settings};
use tempfile::TempDir;

// Environment-variable handling is process-global, so everything that sets
// variables lives in this single test.
#[test]
fn environment_overrides_file_and_defaults() {
    let dir = TempDir::new().unwrap();

    // with no file and a clean environment, defaults apply
    let defaults = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(defaults.cache_ttl, 86_400);
    assert!(!defaults.count_cache_hits);

    let config_path = dir.path().join("nameorigin.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        r#"
nationalize_base_url = "http://file.example/nationalize/"
cache_ttl = 120
popularity_scope = "all_candidates"
"#
    )
    .unwrap();

    std::env::set_var("NATIONALIZE_BASE_URL", "http://env.example/nationalize/");
    std::env::set_var("CACHE_TTL", "7200");
    std::env::set_var("REQUEST_TIMEOUT", "3");

    let settings = Settings::load(Some(&config_path)).unwrap();

    std::env::remove_var("NATIONALIZE_BASE_URL");
    std::env::remove_var("CACHE_TTL");
    std::env::remove_var("REQUEST_TIMEOUT");

    // environment wins over the file
    assert_eq!(settings.nationalize_base_url, "http://env.example/nationalize/");
    assert_eq!(settings.cache_ttl, 7200);
    assert_eq!(settings.request_timeout, 3);
    // file wins over defaults
    assert_eq!(settings.popularity_scope, PopularityScope::AllCandidates);
    // untouched fields keep their defaults
    assert_eq!(settings.country_base_url, "https://restcountries.com/v3.1/");
    assert_eq!(settings.popular_limit, 5);
}
