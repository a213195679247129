//! Revocation requirement determination and evaluation of pre-fetched revocation data
//!
//! The revocation module does not fetch or verify CRLs or OCSP responses. Instead, it consumes revocation tokens
//! that have already been retrieved and verified, as exposed by an implementation of the
//! [`RevocationTokenSource`](revocation_token/trait.RevocationTokenSource.html) trait, and answers two questions:
//!
//! - Does a given certificate need revocation data at all? See [`is_revocation_required`](revocation_requirement/fn.is_revocation_required.html).
//! - Does the available revocation data satisfy a signature policy's RevReq for that certificate? See
//!   [`check_revocation`](check_revocation/fn.check_revocation.html).
//!
//! ```
//! use sigpolval::*;
//!
//! let ca = CertificateNodeBuilder::new("ca").subject_dn("CN=CA").build();
//! let mut tokens = RevocationTokens::new();
//! tokens.add_token(&ca, RevocationToken::new(RevocationTokenType::Ocsp, true, Some(true), 1_000));
//!
//! let mut settings = ConstraintSettings::new();
//! settings.set_validation_time(2_000);
//!
//! let validator = RevReqValidator::new(&settings, &tokens);
//! assert!(validator.validate(EnuRevReq::EitherCheck, &ca));
//! ```
//!
//! Revocation processing is influenced by values included in the [`ConstraintSettings`](../validator/constraint_settings/struct.ConstraintSettings.html) object, including:
//!
//! - [`PS_VALIDATION_TIME`](../validator/constraint_settings/static.PS_VALIDATION_TIME.html)
//! - [`PS_REVOCATION_SKIP_EXTENSIONS`](../validator/constraint_settings/static.PS_REVOCATION_SKIP_EXTENSIONS.html)
//! - [`PS_REVOCATION_SKIP_POLICIES`](../validator/constraint_settings/static.PS_REVOCATION_SKIP_POLICIES.html)
//! - [`PS_REVOCATION_FRESHNESS`](../validator/constraint_settings/static.PS_REVOCATION_FRESHNESS.html)
//!
pub mod check_revocation;
pub mod revocation_requirement;
pub mod revocation_token;

pub use crate::revocation::check_revocation::*;
pub use crate::revocation::revocation_requirement::*;
pub use crate::revocation::revocation_token::*;
