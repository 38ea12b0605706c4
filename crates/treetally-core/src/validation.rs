//! Field rules applied at each step transition.

use thiserror::Error;

use crate::draft::StemMeasurement;
use crate::record::StudentDetails;

/// Largest branch count Step 1 accepts; Step 2 shows one entry group per branch.
pub const MAX_BRANCHES: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeIdentityError {
    #[error("All fields are required.")]
    AllFieldsRequired,
    #[error("Invalid branch count: enter a whole number of at least 1.")]
    InvalidBranchCount,
    #[error("Too many branches: enter at most {max}.")]
    TooManyBranches { max: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudentDetailsError {
    #[error("All student details are required.")]
    AllFieldsRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemField {
    Height,
    Diameter,
}

impl StemField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::Diameter => "diameter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemErrorKind {
    Missing(StemField),
    NotPositive(StemField),
}

/// `index` is 1-based, matching what the user sees on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StemError {
    #[error("Stem {index}: {} is required.", .field.label())]
    Missing { index: usize, field: StemField },
    #[error("Stem {index}: {} must be a number greater than 0.", .field.label())]
    NotPositive { index: usize, field: StemField },
}

impl StemError {
    pub fn index(&self) -> usize {
        match self {
            Self::Missing { index, .. } | Self::NotPositive { index, .. } => *index,
        }
    }

    pub fn kind(&self) -> StemErrorKind {
        match self {
            Self::Missing { field, .. } => StemErrorKind::Missing(*field),
            Self::NotPositive { field, .. } => StemErrorKind::NotPositive(*field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeIdentity {
    pub tree_id: String,
    pub num_branches: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StemEntryInput {
    pub height: String,
    pub diameter: String,
}

impl StemEntryInput {
    pub fn new(height: impl Into<String>, diameter: impl Into<String>) -> Self {
        Self {
            height: height.into(),
            diameter: diameter.into(),
        }
    }
}

/// Keeps only ASCII digits, as the branch-count field does while typing.
pub fn filter_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Keeps digits and the first decimal point, as the measurement fields do while typing.
pub fn filter_decimal(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut seen_point = false;

    for character in raw.chars() {
        if character.is_ascii_digit() {
            output.push(character);
        } else if character == '.' && !seen_point {
            seen_point = true;
            output.push(character);
        }
    }

    output
}

pub fn validate_tree_identity(
    tree_id: &str,
    branch_count: &str,
) -> Result<TreeIdentity, TreeIdentityError> {
    let tree_id = tree_id.trim();
    let branch_count = branch_count.trim();

    if tree_id.is_empty() || branch_count.is_empty() {
        return Err(TreeIdentityError::AllFieldsRequired);
    }

    let all_digits = branch_count.chars().all(|character| character.is_ascii_digit());
    let num_branches = match branch_count.parse::<u32>() {
        Ok(0) => return Err(TreeIdentityError::InvalidBranchCount),
        Ok(value) => value,
        // Whole numbers too long for u32 are over the limit as well.
        Err(_) if all_digits && !branch_count.trim_start_matches('0').is_empty() => {
            return Err(TreeIdentityError::TooManyBranches { max: MAX_BRANCHES });
        }
        Err(_) => return Err(TreeIdentityError::InvalidBranchCount),
    };
    if num_branches > MAX_BRANCHES {
        return Err(TreeIdentityError::TooManyBranches { max: MAX_BRANCHES });
    }

    Ok(TreeIdentity {
        tree_id: tree_id.to_string(),
        num_branches,
    })
}

pub fn validate_student_details(
    name: &str,
    roll_no: &str,
    group: &str,
) -> Result<StudentDetails, StudentDetailsError> {
    let details = StudentDetails {
        name: name.trim().to_string(),
        roll_no: roll_no.trim().to_string(),
        group: group.trim().to_string(),
    };

    if details.is_complete() {
        Ok(details)
    } else {
        Err(StudentDetailsError::AllFieldsRequired)
    }
}

/// Validates every entry before returning anything; the first failing entry wins.
pub fn validate_stem_entries(
    entries: &[StemEntryInput],
) -> Result<Vec<StemMeasurement>, StemError> {
    let mut measurements = Vec::with_capacity(entries.len());

    for (offset, entry) in entries.iter().enumerate() {
        let index = offset + 1;

        if entry.height.trim().is_empty() {
            return Err(StemError::Missing {
                index,
                field: StemField::Height,
            });
        }
        if entry.diameter.trim().is_empty() {
            return Err(StemError::Missing {
                index,
                field: StemField::Diameter,
            });
        }

        let height = parse_positive(&entry.height).ok_or(StemError::NotPositive {
            index,
            field: StemField::Height,
        })?;
        let diameter = parse_positive(&entry.diameter).ok_or(StemError::NotPositive {
            index,
            field: StemField::Diameter,
        })?;

        measurements.push(StemMeasurement { height, diameter });
    }

    Ok(measurements)
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
