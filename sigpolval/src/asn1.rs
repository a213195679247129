//! Sources of ASN.1 encoders and decoders not included in a RustCrypto formats repo

pub mod ess_signing_certificate;
pub mod qc_statements;
pub mod signature_policy;

pub use crate::asn1::ess_signing_certificate::*;
pub use crate::asn1::qc_statements::*;
pub use crate::asn1::signature_policy::*;
