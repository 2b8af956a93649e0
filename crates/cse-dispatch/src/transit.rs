use cse_resource::Resource;
use cse_types::{Request, Response, Rsc};

use crate::error::DispatchError;

/// Forwards a request to a peer CSE reachable through `csr`, substituting
/// the first point-of-access URL. The peer's HTTP binding is expected to
/// speak the same canonical-envelope-over-HTTP mapping our own gateway
/// does.
pub async fn forward(client: &reqwest::Client, csr: &Resource, remainder: &str, request: &Request) -> Result<Response, DispatchError> {
    let csr_body = csr.body.as_remote_cse().ok_or(DispatchError::TargetNotReachable)?;
    let poa = csr_body.poa.first().ok_or(DispatchError::TargetNotReachable)?;
    let url = format!("{}/{}", poa.trim_end_matches('/'), remainder.trim_start_matches('/'));

    let method = match request.op {
        cse_types::Operation::Retrieve => reqwest::Method::GET,
        cse_types::Operation::Create => reqwest::Method::POST,
        cse_types::Operation::Update => reqwest::Method::PUT,
        cse_types::Operation::Delete => reqwest::Method::DELETE,
        cse_types::Operation::Notify => reqwest::Method::POST,
    };

    let resp = client
        .request(method, &url)
        .header("X-M2M-Origin", &request.originator)
        .header("X-M2M-RI", &request.rqi)
        .header("X-M2M-RVI", &request.rvi)
        .json(&request.body)
        .send()
        .await
        .map_err(|_| DispatchError::TargetNotReachable)?;

    let rsc = resp
        .headers()
        .get("X-M2M-RSC")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u16>().ok())
        .map(code_to_rsc)
        .unwrap_or(Rsc::InternalServerError);
    let body = resp.json().await.ok();

    Ok(Response {
        rsc,
        rqi: request.rqi.clone(),
        rvi: request.rvi.clone(),
        body,
        dbg: None,
    })
}

fn code_to_rsc(code: u16) -> Rsc {
    match code {
        2000 => Rsc::Ok,
        2001 => Rsc::Created,
        2002 => Rsc::Deleted,
        2004 => Rsc::Updated,
        4004 => Rsc::NotFound,
        4005 => Rsc::OperationNotAllowed,
        4008 => Rsc::RequestTimeout,
        4102 => Rsc::ContentsUnacceptable,
        4103 => Rsc::OriginatorHasNoPrivilege,
        4105 => Rsc::Conflict,
        4110 => Rsc::GroupMemberTypeInconsistent,
        4127 => Rsc::ReleaseVersionNotSupported,
        5001 => Rsc::NotImplemented,
        5103 => Rsc::TargetNotReachable,
        _ => Rsc::BadRequest,
    }
}
