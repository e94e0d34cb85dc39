//! The visitor check-in form.
//!
//! Holds raw field input, validates it on submit, and produces a normalized
//! [`NewEntry`] for the store. Validation reports every failing field at once.

use std::fmt;

use thiserror::Error;

use crate::entry::{EmplId, NewEntry, Purpose, Role};

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    /// Name or `NetID`.
    NameOrNetId,
    /// EMPLID.
    Emplid,
    /// Policy acknowledgement checkbox.
    AcceptPolicy,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameOrNetId => write!(f, "name or NetID"),
            Self::Emplid => write!(f, "EMPLID"),
            Self::AcceptPolicy => write!(f, "policy acknowledgement"),
        }
    }
}

/// One field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The offending field.
    pub field: FormField,
    /// Message shown next to the field.
    pub message: &'static str,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: FormField, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All validation failures of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.0))]
pub struct FormErrors(Vec<FieldError>);

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormErrors {
    /// The individual field errors, in form order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// The message for a field, if it failed.
    #[must_use]
    pub fn message_for(&self, field: FormField) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }
}

impl From<Vec<FieldError>> for FormErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

/// Raw check-in form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInForm {
    /// Name or `NetID` as typed.
    pub name_or_net_id: String,
    /// EMPLID as typed; blank means "N/A".
    pub emplid: String,
    /// Selected role.
    pub role: Role,
    /// Selected purpose.
    pub purpose: Purpose,
    /// Optional details as typed.
    pub details: String,
    /// Whether the visitor ticked the policy acknowledgement.
    pub accept_policy: bool,
}

impl CheckInForm {
    /// A blank form with default role and purpose.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize without touching the form.
    ///
    /// # Errors
    ///
    /// Returns every failing field when the form is not submittable.
    pub fn validate(&self) -> Result<NewEntry, FormErrors> {
        let mut errors = Vec::new();

        let name = self.name_or_net_id.trim();
        if name.is_empty() {
            errors.push(FieldError::new(FormField::NameOrNetId, "Required"));
        }

        let emplid = EmplId::parse(&self.emplid);
        if emplid.is_none() {
            errors.push(FieldError::new(
                FormField::Emplid,
                "Must be 8 digits or 'N/A'",
            ));
        }

        if !self.accept_policy {
            errors.push(FieldError::new(
                FormField::AcceptPolicy,
                "Please acknowledge",
            ));
        }

        match emplid {
            Some(emplid) if errors.is_empty() => {
                let details = self.details.trim();
                Ok(NewEntry {
                    name_or_net_id: name.to_string(),
                    emplid,
                    role: self.role,
                    purpose: self.purpose,
                    details: (!details.is_empty()).then(|| details.to_string()),
                })
            }
            _ => Err(FormErrors(errors)),
        }
    }

    /// Validate, and on success reset the form to its defaults.
    ///
    /// # Errors
    ///
    /// Returns every failing field; the form keeps its input in that case.
    pub fn submit(&mut self) -> Result<NewEntry, FormErrors> {
        let payload = self.validate()?;
        self.clear();
        Ok(payload)
    }

    /// Reset every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
