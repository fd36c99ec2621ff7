//! End-to-end tests of the `simple-carousel` binary against the fixture scripts.
//!
//! Run with: `cargo test --test cli`

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Run the binary from an empty directory so no stray config.toml is picked up.
fn run(args: &[&str]) -> (Output, TempDir) {
    let cwd = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_simple-carousel"))
        .args(args)
        .current_dir(cwd.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run simple-carousel");
    (output, cwd)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// gen-config
// ---------------------------------------------------------------------------

#[test]
fn gen_config_prints_documented_defaults() {
    let (output, _cwd) = run(&["gen-config"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("[carousel]"));
    assert!(text.contains("rotate_interval_ms = 5000"));
    assert!(text.contains("[lightbox]"));
    assert!(text.contains("[loader]"));
}

#[test]
fn generated_config_is_accepted() {
    let (generated, cwd) = run(&["gen-config"]);
    let config_path = cwd.path().join("config.toml");
    std::fs::write(&config_path, &generated.stdout).unwrap();

    let (output, _cwd) = run(&[
        "--config",
        config_path.to_str().unwrap(),
        "check",
        fixture("shop.toml").to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_summarizes_a_valid_script() {
    let (output, _cwd) = run(&["check", fixture("shop.toml").to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Page: Shop (1280x800)"));
    assert!(text.contains("001 products (4 slides, dots)"));
    assert!(text.contains("    data-rotate-interval: 3000"));
    assert!(text.contains("001 team (3 images)"));
    assert!(text.contains("001 hero.jpg (lazy)"));
    assert!(text.contains("Events: 13 over 6050ms"));
    assert!(text.contains("==> Script is valid"));
}

#[test]
fn check_rejects_dangling_references() {
    let (output, _cwd) = run(&["check", fixture("broken.toml").to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no gallery #3"));
}

#[test]
fn check_rejects_invalid_config() {
    let cwd = TempDir::new().unwrap();
    let config_path = cwd.path().join("config.toml");
    std::fs::write(&config_path, "[carousel]\nrotate_interval_ms = 0\n").unwrap();

    let (output, _cwd) = run(&[
        "--config",
        config_path.to_str().unwrap(),
        "check",
        fixture("shop.toml").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("rotate_interval_ms must be greater than 0"));
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

#[test]
fn replay_prints_every_step_and_final_state() {
    let (output, _cwd) = run(&["replay", fixture("shop.toml").to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);

    assert!(text.contains("@      0ms click carousel-next #0"));
    assert!(text.contains("    products: slide 2/4, moving, autoplay running"));
    // Keydown listeners are global: the arrow pages the lightbox and the carousel.
    assert!(text.contains("    products: slide 4/4, moving, autoplay running\n    lightbox: open team 3/3"));

    assert!(text.contains("State at 6050ms"));
    assert!(text.contains("001 products: slide 1/4, moving, autoplay running (3000ms)"));
    assert!(text.contains("    dots: ● ○ ○ ○"));
    assert!(text.contains("Lightbox: closed"));
    assert!(text.contains("001 hero.jpg: loaded"));
    assert!(text.contains("Listeners: 1, pending timers: 2"));
}

#[test]
fn replay_reads_json_scripts() {
    let (output, _cwd) = run(&[
        "replay",
        fixture("team.json").to_str().unwrap(),
        "--until",
        "2000",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("lightbox: opening team 1/2"));
    assert!(text.contains("lightbox: open team 2/2"));
    assert!(text.contains("State at 2000ms"));
    assert!(text.contains("Lightbox: closed"));
    assert!(text.contains("Listeners: 0, pending timers: 0"));
}

#[test]
fn replay_until_skips_later_events() {
    let (output, _cwd) = run(&[
        "replay",
        fixture("shop.toml").to_str().unwrap(),
        "--until",
        "900",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(!text.contains("key-down"));
    assert!(text.contains("State at 900ms"));
    assert!(text.contains("001 products: slide 2/4, idle, autoplay running (3000ms)"));
}

#[test]
fn replay_of_missing_script_fails() {
    let (output, _cwd) = run(&["replay", "does-not-exist.toml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("NotFound"));
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

#[test]
fn render_writes_snapshot_with_open_lightbox() {
    let out = TempDir::new().unwrap();
    let html_path = out.path().join("snapshots/shop.html");
    let (output, _cwd) = run(&[
        "render",
        fixture("shop.toml").to_str().unwrap(),
        "--until",
        "4300",
        "--output",
        html_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Shop at 4300ms"));

    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"role="dialog""#));
    assert!(html.contains("opacity: 1;"));
    assert!(html.contains(r#"src="ben.jpg""#));
    assert!(html.contains(r#"aria-expanded="true""#));
    assert!(html.contains(r#"class="carousel-card active""#));
}

#[test]
fn render_without_output_prints_html() {
    let (output, _cwd) = run(&["render", fixture("team.json").to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let html = stdout(&output);
    assert!(html.starts_with("<!DOCTYPE html>"));
    // Replay stops at the last event: the backdrop click has started the fade.
    assert!(html.contains(r#"class="lightbox""#));
    assert!(html.contains("opacity: 0;"));
    assert!(html.contains(r#"aria-expanded="false""#));
}
