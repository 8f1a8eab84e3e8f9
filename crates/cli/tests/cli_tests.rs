//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mdscraper");
    // keep a user's own settings file out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent-mdscraper-config");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

#[test]
fn test_cli_html_to_stdout() {
    cmd()
        .args(["--html", &get_fixture_path("docs_page.html"), "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Getting Started"))
        .stdout(predicate::str::contains("## Installation"))
        .stdout(predicate::str::contains("trackPage").not());
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("class_content.html")).unwrap();
    cmd()
        .args(["--html", "-", "-o", "-"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("## Version 2.0"));
}

#[test]
fn test_cli_writes_title_named_file() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["--html", &get_fixture_path("docs_page.html")])
        .args(["--outdir", tmp.path().to_str().unwrap()])
        .assert()
        .success();

    let output = tmp.path().join("getting-started-example-docs.md");
    assert!(output.exists());
    let markdown = std::fs::read_to_string(output).unwrap();
    assert!(markdown.starts_with("# Getting Started"));
}

#[test]
fn test_cli_fixed_output_name() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["--html", &get_fixture_path("class_content.html"), "--output", "notes.md"])
        .args(["--outdir", tmp.path().to_str().unwrap()])
        .assert()
        .success();

    assert!(tmp.path().join("notes.md").exists());
}

#[test]
fn test_cli_url_naming_with_source_url() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["--html", &get_fixture_path("docs_page.html")])
        .args(["--source-url", "https://example.com/docs/getting-started.html"])
        .args(["--output", "%URL", "--prepend-source-link"])
        .args(["--outdir", tmp.path().to_str().unwrap()])
        .assert()
        .success();

    let markdown = std::fs::read_to_string(tmp.path().join("getting-started.md")).unwrap();
    assert!(markdown.starts_with("Source: https://example.com/docs/getting-started.html\n\n# Getting Started"));
    assert!(markdown.contains("(https://example.com/docs/guide/install.html#linux)"));
}

#[test]
fn test_cli_root_url_rewrites_links() {
    cmd()
        .args(["--html", &get_fixture_path("docs_page.html"), "-o", "-"])
        .args(["--source-url", "https://example.com/docs/getting-started.html"])
        .args(["--root-url", "https://example.com/docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[installation notes](guide/install.md#linux)"));
}

#[test]
fn test_cli_no_images_no_links() {
    cmd()
        .args(["--html", &get_fixture_path("docs_page.html"), "-o", "-", "--no-images", "--no-links"])
        .assert()
        .success()
        .stdout(predicate::str::contains("![").not())
        .stdout(predicate::str::contains("installation notes"));
}

#[test]
fn test_cli_exclude_selectors() {
    cmd()
        .args(["--html", &get_fixture_path("docs_page.html"), "-o", "-"])
        .args(["--exclude-selectors", ".ad"])
        .assert()
        .success()
        .stdout(predicate::str::contains("premium").not());
}

#[test]
fn test_cli_content_hint_and_type() {
    cmd()
        .args(["--html", &get_fixture_path("table_page.html"), "-o", "-"])
        .args(["--content", "rates", "--content-type", "table"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("| Currency | Rate |"));
}

#[test]
fn test_cli_extra_heading_space() {
    cmd()
        .args(["--html", &get_fixture_path("docs_page.html"), "-o", "-"])
        .args(["--extra-heading-space", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n\n\n## Installation"));
}

#[test]
fn test_cli_settings_file() {
    let tmp = TempDir::new().unwrap();
    let settings = tmp.path().join("settings.yaml");
    std::fs::write(&settings, "no_images: true\nexclude_selectors: ['.ad']\noutput: '-'\n").unwrap();

    cmd()
        .args(["--html", &get_fixture_path("docs_page.html")])
        .args(["--settings", settings.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("![").not())
        .stdout(predicate::str::contains("premium").not());
}

#[test]
fn test_cli_save_settings() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["--site", "https://example.com/docs/", "--exclude-pages", "terms*", "privacy*"])
        .args(["--outdir", tmp.path().to_str().unwrap(), "--save-settings"])
        .assert()
        .success();

    let saved: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("mdscraper_") && saved[0].ends_with(".yaml"));

    let content = std::fs::read_to_string(tmp.path().join(&saved[0])).unwrap();
    assert!(content.contains("site: https://example.com/docs/"));
    assert!(content.contains("terms*"));
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", "--html", &get_fixture_path("docs_page.html"), "-o", "-"])
        .assert()
        .success()
        .stderr(predicate::str::contains("mdscraper"));
}

#[test]
fn test_cli_verbose_preview() {
    cmd()
        .args(["-vv", "--html", &get_fixture_path("class_content.html"), "-o", "-"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Version 2.0 brings"));
}

#[test]
fn test_cli_missing_file() {
    cmd().args(["--html", "nonexistent.html", "-o", "-"]).assert().failure();
}

#[test]
fn test_cli_empty_content() {
    cmd()
        .args(["--html", &get_fixture_path("empty_content.html"), "-o", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No main content"));
}

#[test]
fn test_cli_not_html() {
    cmd()
        .args(["--html", &get_fixture_path("plain_text.txt"), "-o", "-"])
        .assert()
        .failure();
}

#[test]
fn test_cli_no_input() {
    cmd().assert().failure().stderr(predicate::str::contains("No input given"));
}

#[test]
fn test_cli_conflicting_inputs() {
    cmd()
        .args(["--url", "https://example.com", "--site", "https://example.com"])
        .assert()
        .failure();
}

#[test]
fn test_cli_url_list_with_invalid_lines() {
    cmd()
        .args(["--file", &get_fixture_path("bad_urls.txt"), "-o", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 of 2 pages failed"));
}

#[test]
fn test_cli_invalid_root_url() {
    cmd()
        .args(["--html", &get_fixture_path("docs_page.html"), "-o", "-", "--root-url", "not a url"])
        .assert()
        .failure();
}

#[test]
fn test_completions_match_accepted_flags() {
    let completions = std::path::Path::new(env!("OUT_DIR")).join("completions/mdscraper.bash");
    let bash = std::fs::read_to_string(completions).unwrap();
    let help = cmd().arg("--help").output().unwrap();
    let help = String::from_utf8_lossy(&help.stdout);

    for flag in [
        "--source-url",
        "--root-url",
        "--content-type",
        "--no-images",
        "--no-links",
        "--prepend-source-link",
        "--title-heading",
        "--exclude-pages",
        "--exclude-selectors",
        "--extra-heading-space",
        "--user-agent",
        "--save-settings",
    ] {
        assert!(bash.contains(flag), "completions lack {}", flag);
        assert!(help.contains(flag), "binary does not accept {}", flag);
    }
    assert!(!bash.contains("--source_url"));
    assert!(!bash.contains("--no_images"));
}

#[test]
fn test_cli_save_settings_keeps_user_agent() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["--url", "https://example.com/docs/", "--user-agent", "docs-mirror/1.0"])
        .args(["--outdir", tmp.path().to_str().unwrap(), "--save-settings"])
        .assert()
        .success();

    let saved = std::fs::read_dir(tmp.path()).unwrap().next().unwrap().unwrap().path();
    let content = std::fs::read_to_string(saved).unwrap();
    assert!(content.contains("user_agent: docs-mirror/1.0"));
}

#[test]
fn test_cli_decodes_meta_declared_charset() {
    cmd()
        .args(["--html", &get_fixture_path("latin1_page.html"), "-o", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Caf\u{e9} notes"))
        .stdout(predicate::str::contains("Cr\u{e8}me br\u{fb}l\u{e9}e costs \u{20ac}10 at the \u{201c}corner\u{201d}"));
}
