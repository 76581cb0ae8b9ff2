use assert_cmd::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn help_lists_subcommands() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("gatehouse")?
        .arg("-h")
        .assert()
        .success();

    let result = std::str::from_utf8(&output.get_output().stdout)?;

    assert!(result.contains("init"));
    assert!(result.contains("stress"));

    Ok(())
}

#[test]
fn init_writes_the_default_config() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;

    Command::cargo_bin("gatehouse")?
        .arg("--home")
        .arg(home.path())
        .arg("init")
        .assert()
        .success();

    let config = std::fs::read_to_string(home.path().join("config.toml"))?;

    assert!(config.contains("[auth]"));
    assert!(config.contains("lock-shards = 2048"));
    assert!(config.contains("login-greeting = \"Hello Gatehouse\""));
    assert!(config.contains("[store]"));
    assert!(config.contains("enforce-unique-usernames = false"));

    Ok(())
}

#[test]
fn init_refuses_to_overwrite() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let path = home.path().join("config.toml");
    std::fs::write(&path, "[auth]\nlock-shards = 8\n")?;

    Command::cargo_bin("gatehouse")?
        .env("GATEHOUSE_HOME", home.path())
        .arg("init")
        .assert()
        .failure();

    assert_eq!(std::fs::read_to_string(&path)?, "[auth]\nlock-shards = 8\n");

    Ok(())
}

#[test]
fn stress_resolves_every_username_once() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;

    let output = Command::cargo_bin("gatehouse")?
        .arg("--home")
        .arg(home.path())
        .args(["stress", "--users", "20", "--contenders", "6", "--logins", "2"])
        .assert()
        .success();

    let result = std::str::from_utf8(&output.get_output().stdout)?;

    assert!(result.contains("registrations: 20 ok, 100 already existing"));
    assert!(result.contains("logins: 20 accepted, 20 rejected"));
    assert!(result.contains("gatehouse_auth_register_total"));

    Ok(())
}

#[test]
fn stress_reads_the_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    std::fs::write(
        home.path().join("config.toml"),
        "[auth]\nlock-shards = 4\n\n[store]\nenforce-unique-usernames = true\n",
    )?;

    Command::cargo_bin("gatehouse")?
        .arg("--home")
        .arg(home.path())
        .args(["stress", "--users", "5", "--contenders", "4"])
        .assert()
        .success();

    Ok(())
}

#[test]
fn stress_rejects_an_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    std::fs::write(home.path().join("config.toml"), "[auth]\nlock-shards = \"many\"\n")?;

    Command::cargo_bin("gatehouse")?
        .arg("--home")
        .arg(home.path())
        .args(["stress", "--users", "1", "--contenders", "1"])
        .assert()
        .failure();

    Ok(())
}
