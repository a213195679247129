//! Evaluation of signature policy rules relative to a signature: mandated attributes, certificate references and
//! embedded certificates, trust points, algorithm constraints, external data, PDF signature dictionary entries and
//! signature policy extensions

pub mod algorithm_constraint;
pub mod attributes;
pub mod cert_info_req;
pub mod cert_ref_req;
pub mod external_data;
pub mod item_validator;
pub mod pdf_entry;
pub mod sign_pol_extension;
pub mod signature_info;
pub mod signer_rules;
pub mod trust_point;

pub use crate::{
    policy::algorithm_constraint::*, policy::attributes::*, policy::cert_info_req::*,
    policy::cert_ref_req::*, policy::external_data::*, policy::item_validator::*,
    policy::pdf_entry::*, policy::sign_pol_extension::*, policy::signature_info::*,
    policy::signer_rules::*, policy::trust_point::*,
};
