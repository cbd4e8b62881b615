use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn write_file(path: &PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let cfg = dir.join("config.toml");
    let content = format!(
        r#"
version = 1
[profiles.default]
root = "{}"
ignore_env = true
{extra}
"#,
        dir.join("root").display()
    );
    write_file(&cfg, &content);
    cfg
}

fn luabox(cfg: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("luabox"));
    cmd.env_remove("RUST_LOG");
    cmd.arg("--config").arg(cfg);
    cmd
}

#[test]
fn run_prints_script_output_and_args() {
    let tmp = tempdir().unwrap();
    write_file(&tmp.path().join("root/main.lua"), "print('hello', ...)\n");
    let cfg = write_config(tmp.path(), "");

    luabox(&cfg)
        .args(["run", "main.lua", "a", "--b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello\ta\t--b"));
}

#[test]
fn run_fails_on_script_error() {
    let tmp = tempdir().unwrap();
    write_file(&tmp.path().join("root/main.lua"), "error('boom')\n");
    let cfg = write_config(tmp.path(), "");

    luabox(&cfg)
        .args(["run", "main.lua"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn run_fails_on_missing_script() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("root")).unwrap();
    let cfg = write_config(tmp.path(), "");

    luabox(&cfg).args(["run", "absent.lua"]).assert().failure();
}

#[test]
fn run_requires_modules_from_search_path_and_lib_dir() {
    let tmp = tempdir().unwrap();
    write_file(&tmp.path().join("root/mods/greet.lua"), "return { hi = 'from path' }\n");
    write_file(&tmp.path().join("lib/util/str.lua"), "return { up = string.upper }\n");
    write_file(
        &tmp.path().join("root/main.lua"),
        "local s = require('util.str')\nprint(s.up(require('greet').hi))\n",
    );
    let extra = format!(
        "search_path = \"mods/?.lua\"\nlib_dir = \"{}\"",
        tmp.path().join("lib").display()
    );
    let cfg = write_config(tmp.path(), &extra);

    luabox(&cfg)
        .args(["run", "main.lua"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FROM PATH"));
}

#[test]
fn run_executes_init_scripts_first() {
    let tmp = tempdir().unwrap();
    write_file(&tmp.path().join("init/10-greeting.lua"), "greeting = 'hi'\n");
    write_file(&tmp.path().join("init/20-suffix.lua"), "greeting = greeting .. '!'\n");
    write_file(&tmp.path().join("root/main.lua"), "print(greeting)\n");
    let extra = format!("init_dir = \"{}\"", tmp.path().join("init").display());
    let cfg = write_config(tmp.path(), &extra);

    luabox(&cfg)
        .args(["run", "main.lua"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hi!"));
}

#[test]
fn run_reads_from_mounts() {
    let tmp = tempdir().unwrap();
    write_file(&tmp.path().join("data/cfg.lua"), "return 42\n");
    write_file(&tmp.path().join("root/main.lua"), "print(dofile('data/cfg.lua'))\n");
    let extra = format!(
        "[profiles.default.mounts.data]\npath = \"{}\"\nread_only = true",
        tmp.path().join("data").display()
    );
    let cfg = write_config(tmp.path(), &extra);

    luabox(&cfg)
        .args(["run", "main.lua"])
        .assert()
        .success()
        .stdout(predicate::str::contains("42"));
}

#[test]
fn run_script_logs_reach_stderr() {
    let tmp = tempdir().unwrap();
    write_file(&tmp.path().join("root/main.lua"), "luabox.log(3, 'careful now')\n");
    let cfg = write_config(tmp.path(), "");

    luabox(&cfg)
        .args(["run", "main.lua"])
        .assert()
        .success()
        .stderr(predicate::str::contains("careful now"));
}
