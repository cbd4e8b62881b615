use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use luabox_core::config::{LoggingConfig, ResolvedConfig, ResolvedMount};
use luabox_core::fs::{Filesystem, LocalFs, MemoryFs, ReadOnlyFs, Vfs};
use luabox_core::localenv::local_environment;
use luabox_core::marshal::{HostValue, pull_value, push};
use luabox_core::scripting::{CaptureBuffer, Environment, LuaSandbox};
use tempfile::tempdir;

fn read(fs: &dyn Filesystem, path: &str) -> String {
    let mut s = String::new();
    fs.get_reader(path).unwrap().read_to_string(&mut s).unwrap();
    s
}

#[test]
fn push_then_pull_map_with_array() {
    let lua = mlua::Lua::new();
    let mut m = BTreeMap::new();
    m.insert("a".to_string(), HostValue::Int(1));
    m.insert("b".to_string(), HostValue::from(vec![2i64, 3]));
    let original = HostValue::Map(m);

    let pushed = push(&lua, &original).unwrap();
    let table = pushed.as_table().unwrap();
    let second: i64 = table.get::<mlua::Table>("b").unwrap().get(2).unwrap();
    assert_eq!(second, 3);

    assert_eq!(pull_value(&pushed).unwrap(), original);
}

#[test]
fn read_only_backend_refuses_writer() {
    let inner = MemoryFs::new().with_file("keep.txt", "original").unwrap();
    let ro = ReadOnlyFs::new(inner.clone());

    let err = ro.get_writer("keep.txt").err().unwrap();
    assert_eq!(err.to_string(), "readonly filesystem");
    assert!(ro.delete("keep.txt").unwrap_err().is_read_only());
    assert_eq!(inner.contents("keep.txt").unwrap(), b"original");
}

#[test]
fn vfs_routes_by_first_segment_only() {
    let base = MemoryFs::new()
        .with_file("top.txt", "base top")
        .unwrap()
        .with_file("other/x.txt", "base other")
        .unwrap();
    let mount = MemoryFs::new().with_file("x.txt", "mounted").unwrap();
    let vfs = Vfs::new(base.clone()).with_mount("m", mount.clone());

    assert_eq!(read(&vfs, "m/x.txt"), read(&mount, "x.txt"));
    assert_eq!(read(&vfs, "top.txt"), read(&base, "top.txt"));
    assert_eq!(read(&vfs, "other/x.txt"), "base other");
    assert!(vfs.get_reader("deep/m/x.txt").is_err());
}

#[test]
fn vfs_root_listing_has_one_entry_per_mount() {
    let base = MemoryFs::new()
        .with_file("data/shadowed.txt", "hidden")
        .unwrap()
        .with_file("main.lua", "")
        .unwrap();
    let vfs = Vfs::new(base)
        .with_mount("data", MemoryFs::new())
        .with_mount("lib", MemoryFs::new());

    let entries = vfs.list("/").unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names.iter().filter(|n| **n == "data").count(), 1);
    assert!(names.contains(&"main.lua"));
    assert!(names.contains(&"lib"));

    let lib = entries.iter().find(|e| e.name == "lib").unwrap();
    assert!(lib.is_dir);
    assert_eq!(lib.size, 0);
    assert_eq!(lib.last_modified.timestamp(), 0);
    assert_eq!(vfs.list("").unwrap(), entries);
}

#[test]
fn scripts_print_to_bound_output() {
    let out = CaptureBuffer::new();
    let env = Environment::new(Arc::new(MemoryFs::new())).with_output(out.clone());
    let sb = LuaSandbox::new(env).unwrap();
    sb.exec("=t", r#"print("x", 1.5, {} ~= nil)"#).unwrap();
    assert_eq!(out.contents(), "x\t1.5\ttrue\n");
}

#[test]
fn loadfile_without_name_reads_input() {
    let env = Environment::new(Arc::new(MemoryFs::new()))
        .with_input(Cursor::new(b"#!/usr/bin/env luabox\nreturn 6 * 7".to_vec()));
    let sb = LuaSandbox::new(env).unwrap();
    assert_eq!(sb.eval_string("return loadfile()()").unwrap(), "42");
}

#[test]
fn scripts_can_write_through_the_vfs_only_where_allowed() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("out.txt"), "0000").unwrap();
    let local = LocalFs::new(dir.path());
    let vfs = Vfs::new(MemoryFs::new()).with_mount("ro", ReadOnlyFs::new(LocalFs::new(dir.path())));

    let mut w = local.get_writer("out.txt").unwrap();
    w.write_all(b"11").unwrap();
    drop(w);
    assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap(), "1100");
    assert!(vfs.get_writer("ro/out.txt").err().unwrap().is_read_only());
}

#[test]
fn local_environment_end_to_end() {
    let root = tempdir().unwrap();
    let data = tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("init")).unwrap();
    std::fs::create_dir_all(root.path().join("lib/text")).unwrap();
    std::fs::write(root.path().join("init/00-bad.lua"), "error('broken init')").unwrap();
    std::fs::write(root.path().join("init/10-good.lua"), "booted = true").unwrap();
    std::fs::write(root.path().join("lib/text/upper.lua"), "return string.upper").unwrap();
    std::fs::write(data.path().join("value.lua"), "return 'from mount'").unwrap();

    let cfg = ResolvedConfig {
        active_profile: "default".into(),
        root: root.path().to_path_buf(),
        init_dir: Some(root.path().join("init")),
        lib_dir: Some(root.path().join("lib")),
        search_path: Some("data/?.lua".into()),
        ignore_env: true,
        mounts: vec![ResolvedMount {
            prefix: "data".into(),
            path: data.path().to_path_buf(),
            read_only: true,
        }],
        logging: LoggingConfig::default(),
    };

    let env = local_environment(&cfg, vec!["one".into()]).unwrap();
    let sb = LuaSandbox::new(env).unwrap();

    assert_eq!(sb.preinit_failures().len(), 1);
    assert_eq!(sb.preinit_failures()[0].script, "00-bad.lua");
    assert_eq!(sb.eval_string("return booted").unwrap(), "true");
    assert_eq!(sb.eval_string(r#"return require("text.upper")("abc")"#).unwrap(), "ABC");
    assert_eq!(sb.eval_string(r#"return require("value")"#).unwrap(), "from mount");
    assert_eq!(sb.eval_string("return luabox.getArgs()[1]").unwrap(), "one");
}
