//! Translation between HTTP requests/responses and the canonical
//! transport-agnostic envelope `cse_dispatch` operates on.
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use cse_types::{Filters, Operation, Request, ResourceType, Response, Rsc};
use snafu::{ResultExt as _, Snafu};

use crate::constants::{
    HEADER_EVENT_CATEGORY, HEADER_ORIGIN, HEADER_RELEASE_VERSION, HEADER_REQUEST_EXPIRATION,
    HEADER_REQUEST_ID, HEADER_VENDOR_INFO, QUERY_RESOURCE_TYPE,
};

#[derive(Debug, Snafu)]
pub enum GatewayError {
    #[snafu(display("missing required header {header}"))]
    MissingHeader { header: &'static str },
    #[snafu(display("header {header} is not valid UTF-8"))]
    InvalidHeader { header: &'static str },
    #[snafu(display("request body is not valid JSON: {source}"))]
    InvalidJson { source: serde_json::Error },
    #[snafu(display("unknown resource type {ty}"))]
    UnknownResourceType { ty: u16 },
    #[snafu(display("the ty query parameter is not a valid resource type number"))]
    MalformedResourceType,
    #[snafu(display("CREATE requests require a ty query parameter"))]
    MissingResourceType,
    #[snafu(display("method {method} has no oneM2M operation mapping"))]
    UnsupportedMethod { method: Method },
    #[snafu(display("malformed request expiration timestamp"))]
    InvalidExpiration,
}

impl GatewayError {
    pub fn rsc(&self) -> Rsc {
        match self {
            GatewayError::UnsupportedMethod { .. } => Rsc::OperationNotAllowed,
            _ => Rsc::BadRequest,
        }
    }
}

/// The numeric `ty` values this core accepts, mirroring
/// [`ResourceType::numeric`] in reverse. `Mgmt`/`Announced` are left
/// unreachable here: the dispatcher's closed `ResourceBody` sum type has no
/// representation for either, so a client-supplied `ty` selecting one of
/// them is rejected the same way an out-of-range `ty` would be.
fn resource_type_from_numeric(ty: u16) -> Option<ResourceType> {
    match ty {
        1 => Some(ResourceType::AccessControlPolicy),
        2 => Some(ResourceType::Ae),
        3 => Some(ResourceType::Container),
        4 => Some(ResourceType::ContentInstance),
        5 => Some(ResourceType::CseBase),
        9 => Some(ResourceType::Group),
        16 => Some(ResourceType::RemoteCse),
        23 => Some(ResourceType::Subscription),
        28 => Some(ResourceType::FlexContainer),
        29 => Some(ResourceType::FlexContainerInstance),
        _ => None,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, GatewayError> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| GatewayError::InvalidHeader { header: name }),
        None => Ok(None),
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, GatewayError> {
    header_str(headers, name)?.ok_or(GatewayError::MissingHeader { header: name })
}

fn operation_for(method: &Method) -> Result<Operation, GatewayError> {
    if *method == Method::GET {
        Ok(Operation::Retrieve)
    } else if *method == Method::POST {
        Ok(Operation::Create)
    } else if *method == Method::PUT {
        Ok(Operation::Update)
    } else if *method == Method::DELETE {
        Ok(Operation::Delete)
    } else {
        Err(GatewayError::UnsupportedMethod {
            method: method.clone(),
        })
    }
}

fn query_param<'a>(uri: &'a Uri, key: &str) -> Option<&'a str> {
    uri.query()?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

/// Builds a canonical [`Request`] out of an incoming HTTP request's parts.
/// `to` is the path with the leading `/` stripped, matching the forms
/// `resolve_path` accepts.
pub fn build_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Request, GatewayError> {
    let op = operation_for(method)?;

    let originator = header_str(headers, HEADER_ORIGIN)?.unwrap_or("").to_string();
    let rqi = required_header(headers, HEADER_REQUEST_ID)?.to_string();
    let rvi = required_header(headers, HEADER_RELEASE_VERSION)?.to_string();
    let ec = header_str(headers, HEADER_EVENT_CATEGORY)?.map(str::to_string);
    let vsi = header_str(headers, HEADER_VENDOR_INFO)?.map(str::to_string);

    let ret = header_str(headers, HEADER_REQUEST_EXPIRATION)?
        .map(|raw| raw.parse().map_err(|_| GatewayError::InvalidExpiration))
        .transpose()?;

    let ty = if op == Operation::Create {
        let raw = query_param(uri, QUERY_RESOURCE_TYPE).ok_or(GatewayError::MissingResourceType)?;
        let numeric: u16 = raw.parse().map_err(|_| GatewayError::MalformedResourceType)?;
        Some(
            resource_type_from_numeric(numeric)
                .ok_or(GatewayError::UnknownResourceType { ty: numeric })?,
        )
    } else {
        None
    };

    let body = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(body).context(InvalidJsonSnafu)?
    };

    let to = uri.path().trim_start_matches('/').to_string();

    Ok(Request {
        op,
        to,
        originator,
        rqi,
        rvi,
        ty,
        body,
        filters: Filters::default(),
        ec,
        ret,
        vsi,
        accept: header_str(headers, "Accept")?.map(str::to_string),
    })
}

/// Renders a canonical [`Response`] as an HTTP response, setting
/// `X-M2M-RSC` and the JSON body (if any) and mapping `rsc` onto the HTTP
/// status line per SPEC_FULL §6.2.
pub fn render_response(response: Response) -> axum::response::Response {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    let status =
        StatusCode::from_u16(response.rsc.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let rsc_header = response.rsc.code().to_string();

    let body = response.body.unwrap_or(serde_json::json!({ "dbg": response.dbg }));

    let mut http_response = (status, axum::Json(body)).into_response();
    if let Ok(value) = rsc_header.parse() {
        http_response
            .headers_mut()
            .insert(HEADER_RESPONSE_STATUS_CODE_NAME, value);
    }
    http_response.headers_mut().insert(
        crate::constants::HEADER_REQUEST_ID,
        response.rqi.parse().unwrap_or_default(),
    );
    http_response.headers_mut().insert(
        crate::constants::HEADER_RELEASE_VERSION,
        response.rvi.parse().unwrap_or_default(),
    );
    http_response
}

const HEADER_RESPONSE_STATUS_CODE_NAME: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-m2m-rsc");
