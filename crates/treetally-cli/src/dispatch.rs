use anyhow::{Result, bail};
use comfy_table::{Cell, ContentArrangement, Table};
use treetally_app::App;
use treetally_core::doctor::{CheckState, DoctorReport};
use treetally_core::media::sniff_file;
use treetally_core::record::{ImageRef, StudentDetails};
use treetally_core::submission::SaveError;
use treetally_core::validation::StemEntryInput;

use crate::cli::{Cli, Command, DetailsCommand, SubmitArgs};

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Doctor) => run_doctor_command(),
        Some(Command::Submit(args)) => with_app(|app| run_submit_command(app, args)),
        Some(Command::Details(command)) => with_app(|app| run_details_command(app, command)),
        None => with_app(run_root_command),
    }
}

/// Builds the services from a validated config; every command except doctor needs one.
fn with_app<F>(command: F) -> Result<()>
where
    F: FnOnce(&App<'_>) -> Result<()>,
{
    let ready = App::ensure_config_ready()?;
    let services = ready.services();
    let app = App::new(&services);
    command(&app)
}

fn run_root_command(app: &App<'_>) -> Result<()> {
    let _ = treetally_tui::run_root(app)?;
    Ok(())
}

fn run_doctor_command() -> Result<()> {
    let report = App::doctor()?;
    print_doctor_report(&report);
    Ok(())
}

fn run_submit_command(app: &App<'_>, args: SubmitArgs) -> Result<()> {
    let email = app.resolve_identity()?;
    let mut session = app.begin_record(email.as_deref())?;

    app.submit_tree_identity(&mut session, &args.tree_id, &args.stems)?;

    let expected = app.stem_entries_for(&session);
    let entries = stem_entries(&args.stem, expected)?;
    app.submit_stems(&mut session, &entries)?;

    if sniff_file(&args.image).is_none() {
        bail!(
            "{} is not a readable JPEG, PNG, GIF, WebP or HEIC photo",
            args.image.display()
        );
    }
    app.choose_image(&mut session, Some(ImageRef::new(&args.image)));

    let record = session.draft.read();
    app.save(&mut session, email.as_deref())?;
    tracing::info!(tree_id = %record.tree_id, "submitted from the command line");

    println!(
        "Saved tree {} with {} stem(s).",
        record.tree_id, record.num_branches
    );
    Ok(())
}

/// Fills the expected stem slots from `HEIGHT:DIAMETER` values. Missing
/// values stay blank so validation reports the first incomplete stem.
fn stem_entries(values: &[String], mut expected: Vec<StemEntryInput>) -> Result<Vec<StemEntryInput>> {
    if values.len() > expected.len() {
        bail!(
            "expected {} --stem value(s), got {}",
            expected.len(),
            values.len()
        );
    }

    for (slot, value) in expected.iter_mut().zip(values) {
        let Some((height, diameter)) = value.split_once(':') else {
            bail!("invalid --stem value '{value}': expected HEIGHT:DIAMETER");
        };
        *slot = StemEntryInput::new(height.trim(), diameter.trim());
    }

    Ok(expected)
}

fn run_details_command(app: &App<'_>, command: DetailsCommand) -> Result<()> {
    let Some(email) = app.resolve_identity()? else {
        return Err(SaveError::NotSignedIn.into());
    };

    match command {
        DetailsCommand::Show => match app.student_details(&email)? {
            Some(details) => print_student_details(&email, &details),
            None => println!("No student details stored for {email}."),
        },
        DetailsCommand::Set {
            name,
            roll_no,
            group,
        } => {
            let details = app.save_student_details(&email, &name, &roll_no, &group)?;
            print_student_details(&email, &details);
        }
    }
    Ok(())
}

fn print_student_details(email: &str, details: &StudentDetails) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Email"), Cell::new(email)]);
    table.add_row(vec![Cell::new("Name"), Cell::new(details.name.as_str())]);
    table.add_row(vec![Cell::new("Roll number"), Cell::new(details.roll_no.as_str())]);
    table.add_row(vec![Cell::new("Group"), Cell::new(details.group.as_str())]);
    println!("{table}");
}

fn print_doctor_report(report: &DoctorReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        let status = match check.state {
            CheckState::Pass => "PASS",
            CheckState::Fail => "FAIL",
        };

        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(status),
            Cell::new(check.details.as_str()),
        ]);
    }

    println!("{table}");
    println!("{}", report.summary());
}
