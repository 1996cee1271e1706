use faculty_common::BrowserKind;
use faculty_config::FacultyConfigLoader;
use faculty_sink::OutputFormat;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
directory_url: "https://faculty.example.edu/"
browser:
  kind: firefox
  webdriver_url: "http://localhost:4444"
timeouts:
  page_load_ms: 15000
listing:
  next_page: ".btn-next"
age:
  reference_year: 2023
output:
  dir: "${FACULTY_TEST_OUT}/tables"
  format: jsonl
"#;

#[test]
#[serial]
fn file_values_merge_over_defaults() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "faculty.yaml", FILE_YAML);

    let config = temp_env::with_var("FACULTY_TEST_OUT", Some("/data"), || {
        FacultyConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load crawler config")
    });

    assert_eq!(config.directory_url, "https://faculty.example.edu/");
    assert_eq!(config.browser.kind, BrowserKind::Firefox);
    assert!(config.browser.headless);
    assert_eq!(config.timeouts.page_load_ms, 15000);
    assert_eq!(config.timeouts.poll_ms, 200);
    assert_eq!(config.listing.next_page.as_deref(), Some(".btn-next"));
    assert_eq!(config.listing.row, ".el-table__row");
    assert_eq!(config.age.reference_year, Some(2023));
    assert_eq!(config.output.format, OutputFormat::Jsonl);
    assert_eq!(config.output.dir, PathBuf::from("/data/tables"));
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "faculty.yaml", FILE_YAML);

    let config = temp_env::with_vars(
        [
            ("FACULTY__TIMEOUTS__PAGE_LOAD_MS", Some("30000")),
            ("FACULTY__BROWSER__HEADLESS", Some("false")),
            ("FACULTY__MAX_PAGES", Some("3")),
        ],
        || FacultyConfigLoader::new().with_file(&p).load().unwrap(),
    );

    assert_eq!(config.timeouts.page_load_ms, 30000);
    assert!(!config.browser.headless);
    assert_eq!(config.max_pages, 3);
    assert_eq!(config.browser.kind, BrowserKind::Firefox);
}

#[test]
#[serial]
fn missing_optional_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let config = FacultyConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .unwrap();
    assert_eq!(config.max_pages, 50);

    assert!(
        FacultyConfigLoader::new()
            .with_file(tmp.path().join("absent.yaml"))
            .load()
            .is_err()
    );
}
