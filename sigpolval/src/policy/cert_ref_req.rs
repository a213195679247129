//! Checks the signing certificate references in a signature against a mandatedCertificateRef rule

use alloc::string::{String, ToString};

use log::debug;

use crate::util::error::*;
use crate::{CertRefReq, CertificateNode, CertificateReference, ItemValidator};

/// Name used when reporting the outcome of a mandated certificate reference check
pub const MANDATED_CERTIFICATE_REF_CONSTRAINT: &str = "signerRules.mandatedCertificateRef";

/// `CertRefReqValidator` compares the ESSCertID and ESSCertIDv2 references in a signature with the signing
/// certificate and, for `fullPath`, with every certificate in the signer's certification path.
///
/// For `signerOnly`, the signing certificate must be referenced and no other certificate may be. For
/// `fullPath`, the signing certificate and every certificate in `chain` must be referenced.
pub struct CertRefReqValidator<'a> {
    cert_ref_req: CertRefReq,
    references: &'a [CertificateReference],
    signer: Option<&'a CertificateNode>,
    chain: &'a [CertificateNode],
}

impl<'a> CertRefReqValidator<'a> {
    /// Creates a validator. An absent requirement is treated as `signerOnly`.
    pub fn new(
        cert_ref_req: Option<CertRefReq>,
        references: &'a [CertificateReference],
        signer: Option<&'a CertificateNode>,
        chain: &'a [CertificateNode],
    ) -> Self {
        CertRefReqValidator {
            cert_ref_req: cert_ref_req.unwrap_or(CertRefReq::SignerOnly),
            references,
            signer,
            chain,
        }
    }

    fn references_cert(&self, cert: &CertificateNode) -> bool {
        self.references
            .iter()
            .any(|r| r.matches(cert).unwrap_or(false))
    }

    /// Returns true if the signing certificate is referenced
    pub fn contains_signer_cert_ref(&self) -> bool {
        match self.signer {
            Some(signer) => self.references_cert(signer),
            None => false,
        }
    }

    /// Returns true if any reference identifies a certificate other than the signing certificate
    pub fn contains_additional_cert_ref(&self) -> bool {
        self.references.iter().any(|r| match self.signer {
            Some(signer) => !r.matches(signer).unwrap_or(false),
            None => true,
        })
    }

    /// Returns true if every certificate in the chain is referenced
    pub fn contains_full_path_refs(&self) -> bool {
        !self.chain.is_empty() && self.chain.iter().all(|c| self.references_cert(c))
    }
}

impl ItemValidator for CertRefReqValidator<'_> {
    fn name(&self) -> &str {
        MANDATED_CERTIFICATE_REF_CONSTRAINT
    }

    fn check(&self) -> Result<()> {
        let ok = match self.cert_ref_req {
            CertRefReq::SignerOnly => {
                self.contains_signer_cert_ref() && !self.contains_additional_cert_ref()
            }
            CertRefReq::FullPath => self.contains_signer_cert_ref() && self.contains_full_path_refs(),
        };
        if ok {
            Ok(())
        } else {
            debug!(
                "Certificate references do not satisfy {:?} among {} references",
                self.cert_ref_req,
                self.references.len()
            );
            Err(Error::PolicyValidation(
                PolicyValidationStatus::CertificateReferenceMismatch,
            ))
        }
    }

    fn error_detail(&self) -> Option<String> {
        if self.validate() {
            return None;
        }
        let detail = match self.cert_ref_req {
            CertRefReq::SignerOnly if self.contains_additional_cert_ref() => {
                "Found more certificate references than expected"
            }
            CertRefReq::SignerOnly => "No signing certificate reference found",
            CertRefReq::FullPath if !self.contains_signer_cert_ref() => {
                "No signing certificate reference found"
            }
            CertRefReq::FullPath => "Found less references than expected",
        };
        Some(detail.to_string())
    }
}
