use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::command_runner::find_executable;
use crate::config::{TreetallyConfig, load_config, resolve_config_path};
use crate::media::DirectoryLibrary;
use crate::services::{KeyValueStore, MediaLibrary};
use crate::store::FileKeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.state == CheckState::Fail)
    }

    pub fn summary(&self) -> String {
        let passed = self
            .checks
            .iter()
            .filter(|check| check.state == CheckState::Pass)
            .count();
        let failed = self.checks.len().saturating_sub(passed);
        format!("{passed} passed, {failed} failed")
    }
}

const CONFIG_DEPENDENT_CHECKS: [&str; 5] = [
    "config parses and validates",
    "gallery directory readable",
    "outbox directory writable",
    "student store readable",
    "camera program available",
];

pub fn run_doctor() -> DoctorReport {
    match resolve_config_path() {
        Ok(config_path) => run_doctor_at(&config_path),
        Err(error) => {
            let mut checks = vec![
                check_os(),
                fail_check("config path resolves", error.to_string()),
            ];
            push_skipped_checks(&mut checks, &["config file exists"], "config path could not be resolved");
            push_skipped_checks(
                &mut checks,
                &CONFIG_DEPENDENT_CHECKS,
                "config path could not be resolved",
            );
            DoctorReport { checks }
        }
    }
}

pub fn run_doctor_at(config_path: &Path) -> DoctorReport {
    let mut checks = vec![check_os()];

    if !config_path.exists() {
        checks.push(fail_check(
            "config file exists",
            format!("expected at {}", config_path.display()),
        ));
        push_skipped_checks(&mut checks, &CONFIG_DEPENDENT_CHECKS, "config file is missing");
        return DoctorReport { checks };
    }

    checks.push(pass_check(
        "config file exists",
        format!("found at {}", config_path.display()),
    ));

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(error) => {
            checks.push(fail_check("config parses and validates", error.to_string()));
            push_skipped_checks(&mut checks, &CONFIG_DEPENDENT_CHECKS[1..], "config is invalid");
            return DoctorReport { checks };
        }
    };

    checks.push(pass_check(
        "config parses and validates",
        format!("signed in as {}", config.identity.email.trim()),
    ));
    checks.push(check_gallery(&config));
    checks.push(check_outbox(&config));
    checks.push(check_store(&config, config_path));
    checks.push(check_camera(&config));

    DoctorReport { checks }
}

fn check_os() -> DoctorCheck {
    match env::consts::OS {
        "macos" => pass_check("os is supported", "detected macOS"),
        "linux" => pass_check("os is supported", "detected Linux"),
        detected => fail_check(
            "os is supported",
            format!("detected {detected}, expected macOS or Linux"),
        ),
    }
}

fn check_gallery(config: &TreetallyConfig) -> DoctorCheck {
    let name = "gallery directory readable";
    match DirectoryLibrary::new(&config.media.gallery_dir).list_images() {
        Ok(images) => pass_check(
            name,
            format!(
                "{} photo(s) in {}",
                images.len(),
                config.media.gallery_dir.display()
            ),
        ),
        Err(error) => fail_check(name, format!("{error:#}")),
    }
}

fn check_outbox(config: &TreetallyConfig) -> DoctorCheck {
    let name = "outbox directory writable";
    let outbox = &config.storage.outbox_dir;
    if let Err(error) = fs::create_dir_all(outbox) {
        return fail_check(name, format!("failed to create {}: {error}", outbox.display()));
    }

    let probe = outbox.join(".treetally-doctor-probe");
    match fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            pass_check(name, format!("{} is writable", outbox.display()))
        }
        Err(error) => fail_check(name, format!("cannot write to {}: {error}", outbox.display())),
    }
}

fn check_store(config: &TreetallyConfig, config_path: &Path) -> DoctorCheck {
    let name = "student store readable";
    let store = FileKeyValueStore::new(config.store_path(config_path));
    match store.get("doctor") {
        Ok(_) => pass_check(name, format!("using {}", store.path().display())),
        Err(error) => fail_check(name, format!("{error:#}")),
    }
}

fn check_camera(config: &TreetallyConfig) -> DoctorCheck {
    let name = "camera program available";
    let Some(camera) = &config.camera else {
        return pass_check(name, "no camera configured; camera capture will be refused");
    };

    match find_executable(&camera.program) {
        Some(path) => pass_check(name, format!("found {}", path.display())),
        None => fail_check(
            name,
            format!("camera program '{}' not found in PATH", camera.program),
        ),
    }
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}

fn skipped_check(name: &str, reason: &str) -> DoctorCheck {
    fail_check(name, format!("skipped because {reason}"))
}

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .copied()
            .map(|name| skipped_check(name, reason)),
    );
}
