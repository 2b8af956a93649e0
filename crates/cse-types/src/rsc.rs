use serde::{Deserialize, Serialize};
use strum::Display;

/// oneM2M response status codes relevant to this core. Variant names match
/// the short names used throughout the specification text; `code()` returns
/// the numeric wire value sent as `X-M2M-RSC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Rsc {
    Ok,
    Created,
    Deleted,
    Updated,
    BadRequest,
    ReleaseVersionNotSupported,
    RequestTimeout,
    NotFound,
    OperationNotAllowed,
    ContentsUnacceptable,
    Conflict,
    OriginatorHasNoPrivilege,
    GroupMemberTypeInconsistent,
    InternalServerError,
    NotImplemented,
    TargetNotReachable,
    AlreadyExists,
    InsufficientArguments,
    NotAcceptable,
}

impl Rsc {
    pub fn code(self) -> u16 {
        match self {
            Rsc::Ok => 2000,
            Rsc::Created => 2001,
            Rsc::Deleted => 2002,
            Rsc::Updated => 2004,
            Rsc::BadRequest => 4000,
            Rsc::RequestTimeout => 4008,
            Rsc::NotFound => 4004,
            Rsc::OperationNotAllowed => 4005,
            Rsc::ContentsUnacceptable => 4102,
            Rsc::OriginatorHasNoPrivilege => 4103,
            Rsc::Conflict | Rsc::AlreadyExists => 4105,
            Rsc::GroupMemberTypeInconsistent => 4110,
            Rsc::ReleaseVersionNotSupported => 4127,
            Rsc::InternalServerError => 5000,
            Rsc::NotImplemented => 5001,
            Rsc::TargetNotReachable => 5103,
            Rsc::InsufficientArguments => 4000,
            Rsc::NotAcceptable => 4102,
        }
    }

    /// Whether this code represents a successful outcome.
    pub fn is_success(self) -> bool {
        matches!(self, Rsc::Ok | Rsc::Created | Rsc::Deleted | Rsc::Updated)
    }

    /// The HTTP status line this code maps onto at the gateway.
    pub fn http_status(self) -> u16 {
        match self {
            Rsc::Ok => 200,
            Rsc::Created => 201,
            Rsc::Deleted | Rsc::Updated => 200,
            Rsc::BadRequest
            | Rsc::ReleaseVersionNotSupported
            | Rsc::ContentsUnacceptable
            | Rsc::InsufficientArguments
            | Rsc::NotAcceptable
            | Rsc::GroupMemberTypeInconsistent => 400,
            Rsc::OriginatorHasNoPrivilege => 403,
            Rsc::NotFound => 404,
            Rsc::OperationNotAllowed => 405,
            Rsc::Conflict | Rsc::AlreadyExists => 409,
            Rsc::RequestTimeout => 408,
            Rsc::InternalServerError => 500,
            Rsc::NotImplemented => 501,
            Rsc::TargetNotReachable => 502,
        }
    }
}
