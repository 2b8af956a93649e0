use cse_types::Rsc;
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum DispatchError {
    #[snafu(display("resource not found: {target}"))]
    NotFound { target: String },
    #[snafu(display("originator has no privilege for this operation"))]
    NoPrivilege,
    #[snafu(display("request validation failed: {source}"))]
    Validation { source: cse_resource::ValidationError },
    #[snafu(display("operation not allowed: {reason}"))]
    NotAllowed { reason: String },
    #[snafu(display("request expired before it could be processed"))]
    RequestTimeout,
    #[snafu(display("release version {rvi} is not supported"))]
    ReleaseVersionNotSupported { rvi: String },
    #[snafu(display("target CSE is not reachable"))]
    TargetNotReachable,
    #[snafu(display("storage error: {source}"))]
    Storage { source: cse_storage::StoreError },
    #[snafu(display("an ACPI update request must contain only acpi"))]
    AcpiUpdateMustBeExclusive,
    #[snafu(display("sibling {rn} already exists under this parent"))]
    AlreadyExists { rn: String },
    #[snafu(display("registration failed: {source}"))]
    Registration { source: cse_registration::RegistrationError },
}

impl From<cse_resource::ValidationError> for DispatchError {
    fn from(source: cse_resource::ValidationError) -> Self {
        DispatchError::Validation { source }
    }
}

impl From<cse_storage::StoreError> for DispatchError {
    fn from(source: cse_storage::StoreError) -> Self {
        match source {
            cse_storage::StoreError::NotFound { ri } => DispatchError::NotFound { target: ri },
            other => DispatchError::Storage { source: other },
        }
    }
}

impl From<cse_registration::RegistrationError> for DispatchError {
    fn from(source: cse_registration::RegistrationError) -> Self {
        DispatchError::Registration { source }
    }
}

impl DispatchError {
    /// Maps a dispatch failure onto the stable oneM2M response status code
    /// the gateway sends as `X-M2M-RSC`.
    pub fn rsc(&self) -> Rsc {
        match self {
            DispatchError::NotFound { .. } => Rsc::NotFound,
            DispatchError::NoPrivilege => Rsc::OriginatorHasNoPrivilege,
            DispatchError::Validation { source } => source.rsc(),
            DispatchError::NotAllowed { .. } => Rsc::OperationNotAllowed,
            DispatchError::RequestTimeout => Rsc::RequestTimeout,
            DispatchError::ReleaseVersionNotSupported { .. } => Rsc::ReleaseVersionNotSupported,
            DispatchError::TargetNotReachable => Rsc::TargetNotReachable,
            DispatchError::Storage { .. } => Rsc::InternalServerError,
            DispatchError::AcpiUpdateMustBeExclusive => Rsc::BadRequest,
            DispatchError::AlreadyExists { .. } => Rsc::AlreadyExists,
            DispatchError::Registration { .. } => Rsc::OriginatorHasNoPrivilege,
        }
    }
}
