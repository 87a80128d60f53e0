//! Kernel slot names shared by registration and the pipeline.

// Elements
pub const DISU_LO_EXT: &str = "disu_lo_ext";
pub const DISU_LO_INT: &str = "disu_lo_int";
pub const DISU_HO_EXT: &str = "disu_ho_ext";
pub const DISU_HO_INT: &str = "disu_ho_int";
pub const LIMITINTERP_EXT: &str = "limitinterp_ext";
pub const LIMITINTERP_INT: &str = "limitinterp_int";
pub const DIVF_LO: &str = "divf_lo";
pub const DIVF_CENTERED: &str = "divf_centered";
pub const TDIVTCONF_LO: &str = "tdivtconf_lo";
pub const TDIVTCONF_CENTERED: &str = "tdivtconf_centered";
pub const TDIVTCONF_RD: &str = "tdivtconf_rd";
pub const RIEMANN_DIFFERENCE: &str = "riemanndifference";
pub const RESIDUAL: &str = "residual";
pub const NORMALIZE_RESIDUAL: &str = "normalizeresidual";
pub const COPY_SOLN: &str = "copy_soln";
pub const COPY_SOLN_AT_FPTS: &str = "copy_soln_at_fpts";
pub const BLEND_INT_FLUX: &str = "blendintflux";
pub const BLEND_DIVF: &str = "blenddivf";
pub const NEGDIVCONF: &str = "negdivconf";
pub const NEGDIVCONF_LO: &str = "negdivconf_lo";
pub const NEGDIVCONF_CENTERED: &str = "negdivconf_centered";
pub const NEGDIVCONF_RD: &str = "negdivconf_rd";
pub const SOURCE: &str = "source";
pub const TDIVF_QPTS: &str = "tdivf_qpts";

// Interfaces
pub const COMM_FLUX: &str = "comm_flux";
pub const COMM_FLUX_CENTERED: &str = "comm_flux_centered";

// Partition interfaces
pub const SCAL_FPTS_PACK: &str = "scal_fpts_pack";
pub const SCAL_FPTS_SEND: &str = "scal_fpts_send";
pub const SCAL_FPTS_RECV: &str = "scal_fpts_recv";
pub const SCAL_FPTS_UNPACK: &str = "scal_fpts_unpack";
