use std::fmt::{self, Display};

use cse_types::{ResourceType, Rsc};
use serde_json::{Map, Value};
use snafu::Snafu;

/// Declares, for one resource type, which attributes are mandatory on
/// CREATE, which may be touched on UPDATE, and which are read-only/internal.
/// Mirrors the mandatory/optional distinction `FromFragment` draws for
/// config fragments, applied here to raw request bodies instead.
pub struct AttributePolicy {
    pub ty: ResourceType,
    pub mandatory_on_create: &'static [&'static str],
    pub allowed_on_update: &'static [&'static str],
    pub read_only: &'static [&'static str],
    pub internal: &'static [&'static str],
}

/// Tracks the dotted path to the field under validation, the same way
/// `Validator` in the teacher's fragment module threads a path through
/// nested validation calls.
pub struct Validator<'a> {
    ident: Option<&'a str>,
    parent: Option<&'a Validator<'a>>,
}

impl<'a> Validator<'a> {
    pub fn root() -> Self {
        Validator {
            ident: None,
            parent: None,
        }
    }

    pub fn field<'b>(&'b self, ident: &'b str) -> Validator<'b> {
        Validator {
            ident: Some(ident),
            parent: Some(self),
        }
    }

    fn path(&self) -> FieldPath {
        let mut idents = Vec::new();
        let mut curr = Some(self);
        while let Some(c) = curr {
            if let Some(ident) = c.ident {
                idents.push(ident.to_string());
            }
            curr = c.parent;
        }
        idents.reverse();
        FieldPath { idents }
    }

    pub fn error_missing(&self) -> ValidationError {
        ValidationError::MissingMandatory { path: self.path() }
    }

    pub fn error_unknown(&self) -> ValidationError {
        ValidationError::UnknownAttribute { path: self.path() }
    }

    pub fn error_read_only(&self) -> ValidationError {
        ValidationError::ReadOnlyAttribute { path: self.path() }
    }

    pub fn error_contents(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::ContentsUnacceptable {
            path: self.path(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FieldPath {
    idents: Vec<String>,
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.idents.join("."))
    }
}

#[derive(Debug, Snafu)]
pub enum ValidationError {
    #[snafu(display("missing mandatory attribute: {path}"))]
    MissingMandatory { path: FieldPath },
    #[snafu(display("unknown attribute: {path}"))]
    UnknownAttribute { path: FieldPath },
    #[snafu(display("attribute is read-only: {path}"))]
    ReadOnlyAttribute { path: FieldPath },
    #[snafu(display("contents unacceptable at {path}: {reason}"))]
    ContentsUnacceptable { path: FieldPath, reason: String },
}

impl ValidationError {
    /// The oneM2M response status code this validation failure maps onto.
    pub fn rsc(&self) -> Rsc {
        match self {
            ValidationError::MissingMandatory { .. } => Rsc::InsufficientArguments,
            ValidationError::UnknownAttribute { .. } => Rsc::BadRequest,
            ValidationError::ReadOnlyAttribute { .. } => Rsc::BadRequest,
            ValidationError::ContentsUnacceptable { .. } => Rsc::ContentsUnacceptable,
        }
    }
}

/// Checks a raw request body against a policy's CREATE rules: every
/// mandatory attribute must be present, and no internal attribute may be
/// supplied by the client.
pub fn validate_on_create(policy: &AttributePolicy, body: &Map<String, Value>) -> Result<(), ValidationError> {
    let validator = Validator::root();
    for attr in policy.mandatory_on_create {
        if !body.contains_key(*attr) {
            return Err(validator.field(attr).error_missing());
        }
    }
    for attr in policy.internal {
        if body.contains_key(*attr) {
            return Err(validator.field(attr).error_unknown());
        }
    }
    Ok(())
}

/// Checks a raw patch body against a policy's UPDATE rules: only attributes
/// listed as allowed-on-update may be present, and read-only/internal
/// attributes are rejected outright.
pub fn validate_on_update(policy: &AttributePolicy, patch: &Map<String, Value>) -> Result<(), ValidationError> {
    let validator = Validator::root();
    for key in patch.keys() {
        let key_str = key.as_str();
        if policy.read_only.contains(&key_str) || policy.internal.contains(&key_str) {
            return Err(validator.field(key).error_read_only());
        }
        if !policy.allowed_on_update.contains(&key_str) {
            return Err(validator.field(key).error_unknown());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const AE_POLICY: AttributePolicy = AttributePolicy {
        ty: ResourceType::Ae,
        mandatory_on_create: &["api"],
        allowed_on_update: &["lbl", "rr"],
        read_only: &["aei"],
        internal: &["cr", "ri"],
    };

    #[test]
    fn missing_mandatory_is_insufficient_arguments() {
        let body = json!({}).as_object().unwrap().clone();
        let err = validate_on_create(&AE_POLICY, &body).unwrap_err();
        assert_eq!(err.rsc(), Rsc::InsufficientArguments);
    }

    #[test]
    fn client_supplied_cr_is_rejected() {
        let body = json!({"api": "N.demo", "cr": "Cfoo"}).as_object().unwrap().clone();
        let err = validate_on_create(&AE_POLICY, &body).unwrap_err();
        assert_eq!(err.rsc(), Rsc::BadRequest);
    }

    #[test]
    fn update_rejects_read_only() {
        let patch = json!({"aei": "Cnew"}).as_object().unwrap().clone();
        let err = validate_on_update(&AE_POLICY, &patch).unwrap_err();
        assert_eq!(err.rsc(), Rsc::BadRequest);
    }

    #[test]
    fn update_allows_listed_fields() {
        let patch = json!({"lbl": ["x"]}).as_object().unwrap().clone();
        assert!(validate_on_update(&AE_POLICY, &patch).is_ok());
    }
}
