use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Mutex;

use optbridge_config::{discover_config_path, load_for_project, CONFIG_ENV_VAR};
use tempfile::tempdir;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn no_file_gives_resolved_defaults() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _env = EnvVarGuard::unset(CONFIG_ENV_VAR);
    let dir = tempdir().unwrap();

    assert_eq!(discover_config_path(dir.path()), None);
    let (config, path) = load_for_project(dir.path()).unwrap();
    assert_eq!(path, None);
    assert_eq!(config.paths.classes, dir.path().join("target/classes"));
}

#[test]
fn project_file_is_found() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _env = EnvVarGuard::unset(CONFIG_ENV_VAR);
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("optbridge.toml"),
        "[paths]\nclasses = \"out\"\n",
    )
    .unwrap();

    let (config, path) = load_for_project(dir.path()).unwrap();
    assert_eq!(path, Some(dir.path().join("optbridge.toml")));
    assert_eq!(config.paths.classes, dir.path().join("out"));
}

#[test]
fn env_var_wins_over_project_file() {
    let _lock = ENV_LOCK.lock().unwrap();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("optbridge.toml"), "").unwrap();
    let other = dir.path().join("other.toml");
    std::fs::write(&other, "[logging]\nlevel = \"trace\"\n").unwrap();
    let _env = EnvVarGuard::set(CONFIG_ENV_VAR, &other);

    assert_eq!(discover_config_path(dir.path()), Some(other.clone()));
    let (config, _) = load_for_project(dir.path()).unwrap();
    assert_eq!(config.logging.level, "trace");
}

#[test]
fn relative_env_path_is_taken_from_the_root() {
    let _lock = ENV_LOCK.lock().unwrap();
    let dir = tempdir().unwrap();
    let _env = EnvVarGuard::set(CONFIG_ENV_VAR, &PathBuf::from("conf/optbridge.toml"));

    assert_eq!(
        discover_config_path(dir.path()),
        Some(dir.path().join("conf/optbridge.toml"))
    );
}
