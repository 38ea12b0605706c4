#[allow(dead_code)]
mod support;

use treetally_app::App;
use treetally_core::record::student_details_key;
use treetally_core::validation::StudentDetailsError;

use support::{ENV_LOCK, EMAIL, Fakes, MemoryStore, RecordingPersistence, student, write_valid_config};

#[test]
fn student_details_are_stored_as_camel_case_json_under_email_key() {
    let fakes = Fakes::new(RecordingPersistence::default(), MemoryStore::default());
    let services = fakes.services();
    let app = App::new(&services);

    let saved = app
        .save_student_details(EMAIL, " Asha ", "42", "B")
        .expect("save details");

    assert_eq!(saved, student());
    let raw = fakes
        .store
        .raw(&student_details_key(EMAIL))
        .expect("stored value");
    assert_eq!(
        raw,
        r#"{"studentName":"Asha","studentRollNo":"42","studentGroup":"B"}"#
    );
    assert_eq!(
        app.student_details(EMAIL).expect("load details"),
        Some(student())
    );
}

#[test]
fn incomplete_student_details_are_rejected_without_writing() {
    let fakes = Fakes::new(RecordingPersistence::default(), MemoryStore::default());
    let services = fakes.services();
    let app = App::new(&services);

    let error = app
        .save_student_details(EMAIL, "Asha", "", "B")
        .expect_err("missing roll number");

    assert_eq!(
        error.downcast_ref::<StudentDetailsError>(),
        Some(&StudentDetailsError::AllFieldsRequired)
    );
    assert!(fakes.store.raw(&student_details_key(EMAIL)).is_none());
}

#[test]
fn applying_details_fills_the_active_draft() {
    let fakes = Fakes::new(RecordingPersistence::default(), MemoryStore::default());
    let services = fakes.services();
    let app = App::new(&services);
    let mut session = app.begin_record(Some(EMAIL)).expect("session");
    assert!(session.draft.record().student_details().is_none());

    app.apply_student_details(&mut session, &student());

    assert_eq!(session.draft.record().student_details(), Some(student()));
}

#[test]
fn resolve_identity_reports_signed_in_email() {
    let fakes = Fakes::new(RecordingPersistence::default(), MemoryStore::default());
    let services = fakes.services();
    let app = App::new(&services);

    assert_eq!(
        app.resolve_identity().expect("identity"),
        Some(EMAIL.to_string())
    );
}

#[test]
fn ensure_config_ready_reports_missing_and_valid_config() {
    let _guard = ENV_LOCK.lock().expect("env lock");

    let temp = tempfile::tempdir().expect("temp dir");
    unsafe {
        std::env::set_var("HOME", temp.path());
    }

    let error = App::ensure_config_ready().expect_err("missing config");
    assert!(error.to_string().contains("missing config at"));

    write_valid_config(temp.path());
    let ready = App::ensure_config_ready().expect("valid config");
    assert_eq!(ready.config.identity.email, EMAIL);
    assert_eq!(
        ready.config.store_path(&ready.path),
        temp.path()
            .join(".config")
            .join("treetally")
            .join("store.toml")
    );

    let services = ready.services();
    let app = App::new(&services);
    app.save_student_details(EMAIL, "Asha", "42", "B")
        .expect("persist through file store");
    assert!(
        temp.path()
            .join(".config/treetally/store.toml")
            .is_file()
    );
}
