//! Field validators for the three operator wizard steps.
//!
//! All validators are pure: they read a draft section plus the current year
//! and return a [`FieldErrors`] map keyed by field name. An empty map means
//! the step is valid.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;

use super::model::{DependentsSection, EmploymentSection, IdentitySection, Son};

/// Minimum practical length for person names.
const MIN_NAME_LEN: usize = 2;
/// Minimum length of an employee code.
const MIN_CODE_LEN: usize = 3;
/// Operators must be at least this old.
pub const ADULT_AGE: i32 = 18;

/// North-American 10-digit number with optional country code and separators.
pub const DEFAULT_PHONE_PATTERN: &str = r"^(\+?1[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zip regex"));

/// Field name → first failing message.
pub type FieldErrors = BTreeMap<String, String>;

/// Validation knobs that differ between deployments and screen variants.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    /// Regional phone format.
    pub phone_format: Regex,
    /// Step 3 requires an employee code of at least three characters.
    pub require_code: bool,
    /// Step 3 requires a profile photo.
    pub require_photo: bool,
}

impl ValidationRules {
    /// Rules with a custom phone pattern.
    pub fn with_phone_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            phone_format: Regex::new(pattern)?,
            ..Self::default()
        })
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            phone_format: Regex::new(DEFAULT_PHONE_PATTERN).expect("valid default phone regex"),
            require_code: true,
            require_photo: false,
        }
    }
}

/// Age in whole years using only the year component.
///
/// Month and day are ignored, so someone born in December counts a full
/// year older from January 1st. Both the adult check and the minor
/// check use this same rule.
pub fn age_in_years(birth_date: &str, current_year: i32) -> Option<i32> {
    let date = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d").ok()?;
    Some(current_year - date.year())
}

/// Validate step 1 (identity).
pub fn validate_identity(
    section: &IdentitySection,
    rules: &ValidationRules,
    current_year: i32,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    check_name(&mut errors, "first_name", "First name", &section.first_name);
    check_name(&mut errors, "last_name", "Last name", &section.last_name);

    if section.birth_date.trim().is_empty() {
        errors.insert("birth_date".into(), "Birth date is required".into());
    } else {
        match age_in_years(&section.birth_date, current_year) {
            None => {
                errors.insert("birth_date".into(), "Birth date must be YYYY-MM-DD".into());
            }
            Some(age) if age < ADULT_AGE => {
                errors.insert(
                    "birth_date".into(),
                    format!("Operator must be at least {ADULT_AGE} years old"),
                );
            }
            Some(_) => {}
        }
    }

    check_required(&mut errors, "type_id", "ID type", &section.type_id);
    check_required(&mut errors, "id_number", "ID number", &section.id_number);
    check_required(&mut errors, "address", "Address", &section.address);

    let phone = section.phone.trim();
    if phone.is_empty() {
        errors.insert("phone".into(), "Phone is required".into());
    } else if !rules.phone_format.is_match(phone) {
        errors.insert("phone".into(), "Phone number format is invalid".into());
    }

    if let Some(email) = section.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !EMAIL_RE.is_match(email) {
            errors.insert("email".into(), "Email address is invalid".into());
        }
    }

    errors
}

/// Validate step 2 (licence and dependents).
pub fn validate_dependents(section: &DependentsSection, current_year: i32) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(zip) = section.zipcode.as_deref().map(str::trim).filter(|z| !z.is_empty()) {
        if !ZIP_RE.is_match(zip) {
            errors.insert("zipcode".into(), "ZIP code must be 12345 or 12345-6789".into());
        }
    }

    if section.has_minors {
        if section.sons.is_empty() {
            errors.insert("sons".into(), "Add at least one child".into());
        }
        for (i, son) in section.sons.iter().enumerate() {
            validate_son(&mut errors, i, son, current_year);
        }
    }

    errors
}

fn validate_son(errors: &mut FieldErrors, index: usize, son: &Son, current_year: i32) {
    let key = |field: &str| format!("sons[{index}].{field}");

    let name = son.name.trim();
    if name.is_empty() {
        errors.insert(key("name"), "Child name is required".into());
    } else if name.chars().count() < MIN_NAME_LEN {
        errors.insert(
            key("name"),
            format!("Child name must be at least {MIN_NAME_LEN} characters"),
        );
    }

    if son.birth_date.trim().is_empty() {
        errors.insert(key("birth_date"), "Child birth date is required".into());
    } else {
        match age_in_years(&son.birth_date, current_year) {
            None => {
                errors.insert(key("birth_date"), "Birth date must be YYYY-MM-DD".into());
            }
            Some(age) if age >= ADULT_AGE => {
                errors.insert(
                    key("birth_date"),
                    format!("Child must be under {ADULT_AGE} years old"),
                );
            }
            Some(_) => {}
        }
    }

    if son.gender.is_none() {
        errors.insert(key("gender"), "Child gender is required".into());
    }
}

/// Validate step 3 (employment).
pub fn validate_employment(section: &EmploymentSection, rules: &ValidationRules) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if rules.require_code {
        let code = section.code.trim();
        if code.is_empty() {
            errors.insert("code".into(), "Code is required".into());
        } else if code.chars().count() < MIN_CODE_LEN {
            errors.insert(
                "code".into(),
                format!("Code must be at least {MIN_CODE_LEN} characters"),
            );
        }
    }

    let salary = section.salary.trim();
    if salary.is_empty() {
        errors.insert("salary".into(), "Salary is required".into());
    } else {
        match Decimal::from_str(salary) {
            Ok(v) if v > Decimal::ZERO => {}
            Ok(_) => {
                errors.insert("salary".into(), "Salary must be greater than zero".into());
            }
            Err(_) => {
                errors.insert("salary".into(), "Salary must be a number".into());
            }
        }
    }

    if section.size_t_shift.is_none() {
        errors.insert("size_t_shift".into(), "T-shirt size is required".into());
    }
    check_required(&mut errors, "name_t_shift", "T-shirt name", &section.name_t_shift);

    if rules.require_photo && section.photo.is_none() {
        errors.insert("photo".into(), "Photo is required".into());
    }

    errors
}

fn check_required(errors: &mut FieldErrors, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.into(), format!("{label} is required"));
    }
}

fn check_name(errors: &mut FieldErrors, field: &str, label: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.insert(field.into(), format!("{label} is required"));
    } else if value.chars().count() < MIN_NAME_LEN {
        errors.insert(
            field.into(),
            format!("{label} must be at least {MIN_NAME_LEN} characters"),
        );
    }
}
