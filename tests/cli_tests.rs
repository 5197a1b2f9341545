// CLI integration tests
// These test the actual command-line interface using the compiled binary

use std::process::Command;

const CLI_BINARY: &str = env!("CARGO_BIN_EXE_tuya-switch");

fn command_without_env() -> Command {
    let mut command = Command::new(CLI_BINARY);
    for name in [
        "TUYA_CLIENT_ID",
        "TUYA_CLIENT_SECRET",
        "TUYA_DEVICE_ID",
        "TUYA_REGION",
        "TUYA_DP_CODE",
        "PORT",
    ] {
        command.env_remove(name);
    }
    command
}

#[tokio::test]
async fn test_cli_status_command_no_credentials() {
    // Fails before touching the network and names every missing setting
    let output = command_without_env()
        .arg("status")
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing configuration"));
    assert!(stderr.contains("TUYA_CLIENT_ID"));
    assert!(stderr.contains("TUYA_CLIENT_SECRET"));
    assert!(stderr.contains("TUYA_DEVICE_ID"));
}

#[tokio::test]
async fn test_cli_on_command_partial_credentials() {
    let output = command_without_env()
        .arg("on")
        .env("TUYA_CLIENT_SECRET", "secret456")
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TUYA_CLIENT_ID"));
    assert!(stderr.contains("TUYA_DEVICE_ID"));
    assert!(!stderr.contains("TUYA_CLIENT_SECRET"));
}

#[tokio::test]
async fn test_cli_flags_take_the_place_of_env() {
    let output = command_without_env()
        .args(["off", "--client-id", "cid123", "--device-id", "vdevo123"])
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TUYA_CLIENT_SECRET"));
    assert!(!stderr.contains("TUYA_CLIENT_ID"));
}

#[tokio::test]
async fn test_cli_help_command() {
    let output = Command::new(CLI_BINARY)
        .arg("--help")
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Toggle and query a Tuya smart switch"));
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("status"));
    assert!(stdout.contains("on"));
    assert!(stdout.contains("off"));
}

#[tokio::test]
async fn test_cli_help_hides_secret() {
    let output = Command::new(CLI_BINARY)
        .arg("--help")
        .env("TUYA_CLIENT_SECRET", "very-secret-value")
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--client-secret"));
    assert!(!stdout.contains("very-secret-value"));
}

#[tokio::test]
async fn test_cli_serve_help() {
    let output = Command::new(CLI_BINARY)
        .args(["serve", "--help"])
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--port"));
    assert!(stdout.contains("--host"));
    assert!(stdout.contains("10000"));
}

#[tokio::test]
async fn test_cli_version_command() {
    let output = Command::new(CLI_BINARY)
        .arg("--version")
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tuya-switch"));
}

#[tokio::test]
async fn test_cli_invalid_command() {
    let output = Command::new(CLI_BINARY)
        .arg("invalid-command")
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:") || stderr.contains("unrecognized"));
}
