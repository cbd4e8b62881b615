//! `package.path` handling: where it comes from and how it is walked.

use crate::fs::Filesystem;

/// Template used when no search path is configured.
pub const DEFAULT_PATH: &str = "?.lua";

/// Process environment variable consulted for the search path.
pub const PATH_VAR: &str = "LUA_PATH";

const TEMPLATE_SEPARATOR: char = ';';

/// Settings for the path-template searcher.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    /// Environment variable holding the search path.
    pub path_var: String,
    /// Ignore `path_var` and fall back to [`DEFAULT_PATH`].
    pub ignore_env: bool,
    /// Explicit search path; wins over the environment when set.
    pub path: Option<String>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self { path_var: PATH_VAR.to_string(), ignore_env: false, path: None }
    }
}

impl PackageConfig {
    /// Compute the initial value of `package.path`.
    pub fn search_path(&self) -> String {
        if let Some(path) = &self.path {
            return expand_search_path(Some(path), false);
        }
        let from_env = std::env::var(&self.path_var).ok();
        expand_search_path(from_env.as_deref(), self.ignore_env)
    }
}

/// Resolve a raw search path value.
///
/// An unset or empty value, or `ignore_env`, yields [`DEFAULT_PATH`].
/// Otherwise every `;;` is replaced by `;?.lua;` so a custom path can pull
/// the default in.
pub fn expand_search_path(raw: Option<&str>, ignore_env: bool) -> String {
    match raw {
        Some(path) if !path.is_empty() && !ignore_env => {
            path.replace(";;", &format!(";{DEFAULT_PATH};"))
        }
        _ => DEFAULT_PATH.to_string(),
    }
}

/// Find the first template of `path` that opens through `fs`.
///
/// Every occurrence of `sep` in `name` is replaced by `dir_sep` before the
/// name is substituted for `?`. On failure the error carries one
/// `no file '<candidate>'` line per template tried, in order.
pub fn search_path(
    fs: &dyn Filesystem,
    name: &str,
    path: &str,
    sep: &str,
    dir_sep: &str,
) -> Result<String, String> {
    let name = if sep.is_empty() { name.to_string() } else { name.replace(sep, dir_sep) };

    let mut msg = String::new();
    for template in path.split(TEMPLATE_SEPARATOR).filter(|t| !t.is_empty()) {
        let candidate = template.replace('?', &name);
        match fs.get_reader(&candidate) {
            Ok(reader) => {
                drop(reader);
                return Ok(candidate);
            }
            Err(_) => msg.push_str(&format!("\n\tno file '{candidate}'")),
        }
    }
    Err(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{LocalFs, MemoryFs, Vfs};
    use rstest::rstest;

    #[rstest]
    #[case(None, false, "?.lua")]
    #[case(Some(""), false, "?.lua")]
    #[case(Some("lib/?.lua"), true, "?.lua")]
    #[case(Some("lib/?.lua"), false, "lib/?.lua")]
    #[case(Some("lib/?.lua;;x/?.lua"), false, "lib/?.lua;?.lua;x/?.lua")]
    fn test_expand_search_path(
        #[case] raw: Option<&str>,
        #[case] ignore_env: bool,
        #[case] expected: &str,
    ) {
        assert_eq!(expand_search_path(raw, ignore_env), expected);
    }

    #[test]
    fn test_explicit_path_wins() {
        let cfg = PackageConfig { path: Some("mods/?.lua".into()), ..Default::default() };
        assert_eq!(cfg.search_path(), "mods/?.lua");
    }

    #[test]
    fn test_templates_tried_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("lib/foo")).unwrap();
        std::fs::write(dir.path().join("lib/foo/bar.lua"), "return 1").unwrap();
        let fs = LocalFs::new(dir.path());

        let found = search_path(&fs, "foo.bar", "./?.lua;/lib/?.lua", ".", "/").unwrap();
        assert_eq!(found, "/lib/foo/bar.lua");

        std::fs::create_dir_all(dir.path().join("foo")).unwrap();
        std::fs::write(dir.path().join("foo/bar.lua"), "return 2").unwrap();
        let found = search_path(&fs, "foo.bar", "./?.lua;/lib/?.lua", ".", "/").unwrap();
        assert_eq!(found, "./foo/bar.lua");
    }

    #[test]
    fn test_failure_lists_every_candidate() {
        let vfs = Vfs::new(MemoryFs::new());
        let err = search_path(&vfs, "a.b", "?.lua;lib/?/init.lua", ".", "/").unwrap_err();
        assert_eq!(err, "\n\tno file 'a/b.lua'\n\tno file 'lib/a/b/init.lua'");
    }

    #[test]
    fn test_empty_separator_keeps_name() {
        let fs = MemoryFs::new().with_file("a.b.lua", "").unwrap();
        assert_eq!(search_path(&fs, "a.b", "?.lua", "", "/").unwrap(), "a.b.lua");
    }
}
