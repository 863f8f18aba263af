use std::path::{Path, PathBuf};
use std::time::Duration;

use optbridge_config::{ConfigError, OptbridgeConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn empty_file_means_defaults() {
    let config = OptbridgeConfig::load_from_str("").unwrap();
    assert_eq!(config, OptbridgeConfig::default());
    assert_eq!(config.paths.classes, PathBuf::from("target/classes"));
    assert_eq!(config.library.package, "me/dkleszyk/java/option");
    assert_eq!(config.krakatau.timeout(), Some(Duration::from_secs(60)));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn sections_override_their_fields_only() {
    let config = OptbridgeConfig::load_from_str(
        r#"
[paths]
classes = "build/classes/java/main"
scratch = "build/asm"

[library]
package = "org/example/opt"
empty_class = "Empty"

[krakatau]
disassemble = ["krak2", "dis", "--out", "{scratch}", "{class_file}"]
timeout_ms = 0

[logging]
level = "debug"
json = true
"#,
    )
    .unwrap();

    assert_eq!(config.paths.classes, PathBuf::from("build/classes/java/main"));
    assert_eq!(config.paths.sources, PathBuf::from("src/main/java"));
    assert_eq!(config.paths.scratch, Some(PathBuf::from("build/asm")));
    assert_eq!(config.library.empty_class_name(), "org/example/opt/Empty");
    assert_eq!(config.library.base_interface, "Option");
    assert_eq!(config.krakatau.disassemble[0], "krak2");
    assert_eq!(
        config.krakatau.assemble,
        OptbridgeConfig::default().krakatau.assemble
    );
    assert_eq!(config.krakatau.timeout(), None);
    assert!(config.logging.json);
    assert!(config.logging.stderr);
}

#[test]
fn type_errors_are_reported() {
    let err = OptbridgeConfig::load_from_str("[logging]\njson = \"yes\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(err.to_string().starts_with("failed to parse toml config: "));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    let err = OptbridgeConfig::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn relative_paths_resolve_against_the_root() {
    let config = OptbridgeConfig::load_from_str("[paths]\nsources = \"/abs/src\"\nscratch = \"asm\"\n")
        .unwrap()
        .resolve_paths(Path::new("/project"));
    assert_eq!(config.paths.classes, PathBuf::from("/project/target/classes"));
    assert_eq!(config.paths.sources, PathBuf::from("/abs/src"));
    assert_eq!(config.paths.scratch, Some(PathBuf::from("/project/asm")));
}
