use std::process::Command;

fn deep_woods() -> Command {
    Command::new(env!("CARGO_BIN_EXE_deep-woods"))
}

#[test]
fn headless_run_finishes_and_prints_the_banner() {
    let output = deep_woods()
        .args(["--headless", "--fast", "--frames", "600", "--seed", "7"])
        .args(["--log-level", "warn"])
        .output()
        .expect("failed to launch the deep-woods binary");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deep In Woods"), "{stdout}");
}

#[test]
fn missing_settings_file_is_reported() {
    let output = deep_woods()
        .args(["--headless", "--fast", "--frames", "1"])
        .args(["--config", "does/not/exist.toml"])
        .output()
        .expect("failed to launch the deep-woods binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does/not/exist.toml"), "{stderr}");
}
