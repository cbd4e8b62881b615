use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn ls_shows_root_entries_and_mounts() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("root");
    let data = tmp.path().join("data");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(&data).unwrap();
    fs::write(root.join("main.lua"), "print(1)").unwrap();
    fs::write(data.join("x.txt"), "x").unwrap();

    let cfg = tmp.path().join("config.toml");
    fs::write(
        &cfg,
        format!(
            "version = 1\n[profiles.default]\nroot = \"{}\"\n[profiles.default.mounts.data]\npath = \"{}\"\n",
            root.display(),
            data.display()
        ),
    )
    .unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("luabox"));
    cmd.arg("--config").arg(&cfg).arg("ls");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("main.lua"))
        .stdout(predicate::str::contains("data/"))
        .stdout(predicate::str::contains("Total: 2 entries"));

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("luabox"));
    cmd.arg("--config").arg(&cfg).args(["ls", "data/"]);
    cmd.assert().success().stdout(predicate::str::contains("x.txt"));
}

#[test]
fn ls_fails_when_root_missing() {
    let tmp = tempdir().unwrap();
    let cfg = tmp.path().join("config.toml");
    fs::write(
        &cfg,
        format!(
            "version = 1\n[profiles.default]\nroot = \"{}\"\n",
            tmp.path().join("absent").display()
        ),
    )
    .unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("luabox"));
    cmd.arg("--config").arg(&cfg).arg("ls");
    cmd.assert().failure().stderr(predicate::str::contains("sandbox root does not exist"));
}
