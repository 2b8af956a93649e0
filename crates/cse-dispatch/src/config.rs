/// The dispatcher's view of this CSE's own identity, handed in by the
/// binary crate after reading `CseConfig`.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub cse_csi: String,
    pub cse_ri: String,
    pub cse_rn: String,
    pub cse_originator: String,
    pub rvi: String,
    pub discovery_default_limit: usize,
}
