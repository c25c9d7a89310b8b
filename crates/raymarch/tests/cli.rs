use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const TORUS: &str = include_str!("../../renderer/shaders/torus.wgsl");
const BLOB_TRAIL: &str = include_str!("../../renderer/shaders/blob_trail.wgsl");

fn raymarch(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_raymarch"))
        .args(args)
        .env("RAYMARCH_CONFIG_DIR", config_dir)
        .env_remove("RAYMARCH_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("run raymarch")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn list_prints_bundled_presets() {
    let home = TempDir::new().unwrap();
    let output = raymarch(home.path(), &["list"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    for name in ["blob-trail", "twisted-box", "torus"] {
        assert!(text.contains(name), "missing {name} in:\n{text}");
    }
    assert!(!text.contains("configured demos"));
}

#[test]
fn list_includes_configured_demos() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("raymarch.toml"),
        r#"
version = 1

[defaults]
demo = "slow-trail"

[demos.slow-trail]
preset = "blob-trail"
blend = 0.9
"#,
    )
    .unwrap();

    let output = raymarch(home.path(), &["list"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("configured demos:"));
    assert!(text.contains("slow-trail"));
    assert!(text.contains("preset blob-trail (default)"));
}

#[test]
fn explicit_config_path_comes_from_env() {
    let home = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let config = elsewhere.path().join("demos.toml");
    fs::write(
        &config,
        r#"
version = 1

[demos.mine]
shader = "mine.wgsl"
"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_raymarch"))
        .arg("list")
        .env("RAYMARCH_CONFIG_DIR", home.path())
        .env("RAYMARCH_CONFIG", &config)
        .output()
        .expect("run raymarch");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("mine"));
    assert!(text.contains("mine.wgsl"));
}

#[test]
fn invalid_config_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    fs::write(&config, "version = 7").unwrap();

    let output = raymarch(
        home.path(),
        &["--config", config.to_str().unwrap(), "list"],
    );

    assert!(!output.status.success());
    let text = stderr(&output);
    assert!(text.contains("renderer error"), "stderr: {text}");
    assert_eq!(
        text.matches("unsupported config version 7").count(),
        1,
        "reported once: {text}"
    );
}

#[test]
fn check_accepts_bundled_shaders() {
    let home = TempDir::new().unwrap();
    let torus = home.path().join("torus.wgsl");
    let trail = home.path().join("trail.wgsl");
    fs::write(&torus, TORUS).unwrap();
    fs::write(&trail, BLOB_TRAIL).unwrap();

    let output = raymarch(home.path(), &["check", torus.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("single-pass"));

    let output = raymarch(
        home.path(),
        &["check", trail.to_str().unwrap(), "--feedback"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("feedback"));
    assert!(text.contains("BLEND_WEIGHT"));
}

#[test]
fn check_rejects_feedback_shader_as_single_pass() {
    let home = TempDir::new().unwrap();
    let trail = home.path().join("trail.wgsl");
    fs::write(&trail, BLOB_TRAIL).unwrap();

    let output = raymarch(home.path(), &["check", trail.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("@binding(2)"));
}

#[test]
fn check_reports_parse_errors() {
    let home = TempDir::new().unwrap();
    let broken = home.path().join("broken.wgsl");
    fs::write(&broken, "fn fragmentMain( -> {").unwrap();

    let output = raymarch(home.path(), &["check", broken.to_str().unwrap()]);

    assert!(!output.status.success());
    let text = stderr(&output);
    assert!(text.contains("renderer error"), "stderr: {text}");
    assert!(text.contains("failed to parse WGSL"), "stderr: {text}");
}

#[test]
fn unknown_demo_fails_before_opening_a_window() {
    let home = TempDir::new().unwrap();
    let output = raymarch(home.path(), &["no-such-demo", "--frames", "1"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown demo 'no-such-demo'"));
}
