#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub const EMAIL: &str = "asha@example.edu";

const JPEG_HEADER: [u8; 12] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01,
];

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let command = command_for_home(temp_home.path());
    (command, temp_home)
}

pub fn command_for_home(home: &Path) -> Command {
    let binary = assert_cmd::cargo::cargo_bin!("treetally");
    let mut command = Command::new(binary);
    command.env("HOME", home);
    command.env("XDG_CONFIG_HOME", home.join(".config"));
    command.env_remove("TREETALLY_LOG");
    command
}

pub fn write_valid_config(home: &Path) {
    let config_dir = home.join(".config").join("treetally");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::create_dir_all(home.join("photos")).expect("create gallery");

    let config = format!(
        r#"
version = 1

[identity]
email = "{EMAIL}"

[storage]
outbox_dir = "{}"

[media]
gallery_dir = "{}"
"#,
        home.join("outbox").display(),
        home.join("photos").display()
    );
    fs::write(config_dir.join("config.toml"), config).expect("write config");
}

pub fn write_photo(home: &Path, name: &str) -> PathBuf {
    let path = home.join("photos").join(name);
    fs::create_dir_all(path.parent().expect("photo dir")).expect("create photo dir");
    fs::write(&path, JPEG_HEADER).expect("write photo");
    path
}

pub fn outbox_entries(home: &Path) -> Vec<PathBuf> {
    let outbox = home.join("outbox");
    if !outbox.exists() {
        return Vec::new();
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(outbox)
        .expect("read outbox")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    entries.sort();
    entries
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .expect("diagnostics filename .log suffix");
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
