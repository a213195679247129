//! Certification path constraint evaluation: certificate policies, name constraints, basic constraints and
//! QC transaction limits

pub mod basic_constraints;
pub mod cert_node;
pub mod cert_path;
pub mod constraint_result;
pub mod constraint_settings;
pub mod name_constraints_set;
pub mod pdv_extension;
pub mod policy_tree;
pub mod qc_limit_value;
mod policy_utilities;

pub use crate::{
    validator::basic_constraints::*, validator::cert_node::*, validator::cert_path::*,
    validator::constraint_result::*, validator::constraint_settings::*,
    validator::name_constraints_set::*, validator::pdv_extension::*, validator::policy_tree::*,
    validator::qc_limit_value::*,
};
