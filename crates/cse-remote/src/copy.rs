use cse_resource::body::{CseBaseBody, RemoteCseBody};
use serde_json::{Value, json};

/// Copies the subset of attributes oneM2M shares between a CSE and its CSR
/// representation elsewhere: `{csi, cst, csz, poa, srt->srv, dcse}`. The
/// resulting CSR's `cb` stems from the source CSE; `dcse` is the current
/// descendant list handed in by the caller (the source CSE's own `dcse` is
/// not necessarily current at copy time).
pub fn copy_cse_to_csr(source: &CseBaseBody, source_ri: &str, dcse: Vec<String>) -> RemoteCseBody {
    RemoteCseBody {
        csi: source.csi.clone(),
        cst: source.cst,
        csz: source.csz.clone(),
        poa: source.poa.clone(),
        cb: source_ri.to_string(),
        rr: false,
        srv: source.srt.clone(),
        dcse,
        created_internally_acps: vec![],
    }
}

/// Builds the body sent to PATCH/PUT an existing peer's CSR representation.
/// `{ri, rn, ct, ty, acpi}` are identity/policy fields that belong to the
/// *receiving* CSE's own tree, never the pushed copy, so only the
/// type-specific body is serialized here — the receiving dispatcher assigns
/// its own meta for an existing resource.
pub fn strip_for_update(csr: &RemoteCseBody) -> Value {
    json!({
        "csi": csr.csi,
        "cst": csr.cst,
        "csz": csr.csz,
        "poa": csr.poa,
        "cb": csr.cb,
        "rr": csr.rr,
        "srv": csr.srv,
        "dcse": csr.dcse,
    })
}
