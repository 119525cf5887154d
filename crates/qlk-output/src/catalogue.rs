// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Output Catalogue
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The solver's output file catalogue.
//!
//! Which files a run produces depends on `phys_meth` and
//! `separateflux`; the loader tries every catalogued name and skips
//! the absent ones. The grouping granularity mirrors the solver's own
//! bookkeeping and is kept for compatibility with existing runs.

/// Transport fluxes, always written.
pub const OUTPUT_METH_0_SEP_0: [&str; 9] = [
    "pfe_GB", "pfi_GB", "gam_GB", "ome_GB", "efe_GB", "efi_GB", "efi_cm", "vfi_GB", "vri_GB",
];

/// Per-instability-branch diffusion and convection terms.
pub const OUTPUT_METH_0_SEP_1: [&str; 12] = [
    "dfeITG_GB",
    "dfeTEM_GB",
    "dfiITG_GB",
    "dfiTEM_GB",
    "vteITG_GB",
    "vteTEM_GB",
    "vtiITG_GB",
    "vtiTEM_GB",
    "vciITG_GB",
    "vceITG_GB",
    "vceTEM_GB",
    "vciTEM_GB",
];

/// Flux decompositions from the first extra output method.
pub const OUTPUT_METH_1_SEP_0: [&str; 8] = [
    "cke", "cki", "dfe_GB", "dfi_GB", "vte_GB", "vti_GB", "vce_GB", "vci_GB",
];

/// Per-branch heat and momentum fluxes.
pub const OUTPUT_METH_1_SEP_1: [&str; 9] = [
    "efeETG_GB",
    "efeITG_GB",
    "efeTEM_GB",
    "efiITG_GB",
    "efiTEM_GB",
    "vfiITG_GB",
    "vfiTEM_GB",
    "vriITG_GB",
    "vriTEM_GB",
];

/// SI-unit transport coefficients from the second extra output method.
pub const OUTPUT_METH_2_SEP_0: [&str; 10] = [
    "ceke", "ceki", "chiee_SI", "chiei_SI", "vece_SI", "veci_SI", "vene_SI", "veni_SI",
    "vere_SI", "veri_SI",
];

/// Dispersion-relation primitives, base method.
pub const PRIMI_METH_0: [&str; 24] = [
    "Lcirce",
    "Lcirci",
    "Lecirce",
    "Lecirci",
    "Lepiege",
    "Lpiege",
    "Lpiegi",
    "Lvcirce",
    "Lvcirci",
    "Lvpiege",
    "Lvpiegi",
    "ifdsol",
    "ijonsolflu",
    "imodeshift",
    "imodewidth",
    "isol",
    "isolflu",
    "ntor",
    "rfdsol",
    "rjonsolflu",
    "rmodeshift",
    "rmodewidth",
    "rsol",
    "rsolflu",
];

/// Primitives of the first extra output method.
pub const PRIMI_METH_1: [&str; 16] = [
    "Lcircgne",
    "Lcircgni",
    "Lcircgte",
    "Lcircgti",
    "Lcircgue",
    "Lcircgui",
    "Lcircce",
    "Lcircci",
    "Lpiegce",
    "Lpiegci",
    "Lpieggte",
    "Lpieggti",
    "Lpieggue",
    "Lpieggui",
    "Lpieggne",
    "Lpieggni",
];

/// Primitives of the second extra output method.
pub const PRIMI_METH_2: [&str; 17] = [
    "Lecircce",
    "Lecircci",
    "Lecircgne",
    "Lecircgni",
    "Lecircgte",
    "Lecircgti",
    "Lecircgue",
    "Lecircgui",
    "Lepiegce",
    "Lepiegci",
    "Lepieggne",
    "Lepieggni",
    "Lepieggue",
    "Lepieggui",
    "Lepiegi",
    "Lepieggte",
    "Lepieggti",
];

/// Echoed inputs varying per scan point, one value each.
pub const DEBUG_ELECLIKE: [&str; 17] = [
    "Ane", "Ate", "Aupar", "Autor", "Machpar", "Machtor", "x", "Zeff", "Bo", "gammaE", "ne",
    "Nustar", "q", "Ro", "Rmin", "smag", "Te",
];

/// Echoed inputs varying per scan point and ion.
pub const DEBUG_IONLIKE: [&str; 7] = ["Ai", "Ani", "Ati", "Zi", "ion_type", "normni", "Ti"];

/// Run-wide scalars echoed back by the solver.
pub const DEBUG_SINGLE: [&str; 15] = [
    "dimn",
    "dimx",
    "nions",
    "numsols",
    "coll_flag",
    "maxpts",
    "maxruns",
    "R0",
    "relacc1",
    "relacc2",
    "collmult",
    "ETGmult",
    "rot_flag",
    "separateflux",
    "timeout",
];

/// The echoed spectral grid.
pub const DEBUG_SPECIAL: [&str; 1] = ["kthetarhos"];

/// Primitives stored as (numsols, dimx, dimn) despite not carrying a
/// species suffix.
pub const PRIMI_RESHAPES: [&str; 4] = ["rfdsol", "ifdsol", "isol", "rsol"];

/// Extension of every solver output file.
pub const SUFFIX: &str = ".dat";

/// All flux/coefficient output names, catalogue order.
pub fn output_names() -> impl Iterator<Item = &'static str> {
    OUTPUT_METH_0_SEP_0
        .iter()
        .chain(&OUTPUT_METH_0_SEP_1)
        .chain(&OUTPUT_METH_1_SEP_0)
        .chain(&OUTPUT_METH_1_SEP_1)
        .chain(&OUTPUT_METH_2_SEP_0)
        .copied()
}

/// All primitive names, catalogue order.
pub fn primitive_names() -> impl Iterator<Item = &'static str> {
    PRIMI_METH_0
        .iter()
        .chain(&PRIMI_METH_1)
        .chain(&PRIMI_METH_2)
        .copied()
}

/// All debug names, catalogue order.
pub fn debug_names() -> impl Iterator<Item = &'static str> {
    DEBUG_ELECLIKE
        .iter()
        .chain(&DEBUG_IONLIKE)
        .chain(&DEBUG_SINGLE)
        .chain(&DEBUG_SPECIAL)
        .copied()
}
