//! Checks the certificates embedded in a signature against a mandatedCertificateInfo rule

use alloc::string::{String, ToString};

use crate::util::error::*;
use crate::{node_ids, CertInfoReq, CertificateNode, ItemValidator};

/// Name used when reporting the outcome of a mandated certificate info check
pub const MANDATED_CERTIFICATE_INFO_CONSTRAINT: &str = "signerRules.mandatedCertificateInfo";

/// `CertInfoReqValidator` compares the certificates embedded in a signature with a mandatedCertificateInfo rule:
/// - `none`: no certificates may be embedded,
/// - `signerOnly`: exactly the signing certificate must be embedded,
/// - `fullPath`: the signer's certification path must contain more than one certificate and must be a strict
///   subset of the embedded certificates, i.e., every certificate in the path is embedded along with at least one
///   certificate from outside the path.
///
/// An absent requirement is treated as `none`.
pub struct CertInfoReqValidator<'a> {
    cert_info_req: CertInfoReq,
    embedded: &'a [CertificateNode],
    signer: Option<&'a CertificateNode>,
    chain: &'a [CertificateNode],
}

impl<'a> CertInfoReqValidator<'a> {
    /// Creates a validator
    pub fn new(
        cert_info_req: Option<CertInfoReq>,
        embedded: &'a [CertificateNode],
        signer: Option<&'a CertificateNode>,
        chain: &'a [CertificateNode],
    ) -> Self {
        CertInfoReqValidator {
            cert_info_req: cert_info_req.unwrap_or(CertInfoReq::None),
            embedded,
            signer,
            chain,
        }
    }
}

impl ItemValidator for CertInfoReqValidator<'_> {
    fn name(&self) -> &str {
        MANDATED_CERTIFICATE_INFO_CONSTRAINT
    }

    fn check(&self) -> Result<()> {
        let embedded = node_ids(self.embedded);
        let ok = match self.cert_info_req {
            CertInfoReq::None => embedded.is_empty(),
            CertInfoReq::SignerOnly => match self.signer {
                Some(signer) => embedded.len() == 1 && embedded.contains(&signer.id),
                None => false,
            },
            CertInfoReq::FullPath => {
                let chain = node_ids(self.chain);
                chain.len() > 1 && embedded.len() > chain.len() && chain.is_subset(&embedded)
            }
        };
        if ok {
            Ok(())
        } else {
            Err(Error::PolicyValidation(
                PolicyValidationStatus::CertificateInfoMismatch,
            ))
        }
    }

    fn error_detail(&self) -> Option<String> {
        if self.validate() {
            return None;
        }
        let detail = match self.cert_info_req {
            CertInfoReq::None => "Should not have any certificates in the signature",
            CertInfoReq::SignerOnly => "Should have only the signer certificate in the signature",
            CertInfoReq::FullPath => "Should have the signer certificate full path in the signature",
        };
        Some(detail.to_string())
    }
}

#[test]
fn cert_info_req_test() {
    use crate::CertificateNodeBuilder;

    let ee = CertificateNodeBuilder::new("ee").build();
    let ca = CertificateNodeBuilder::new("ca").build();
    let root = CertificateNodeBuilder::new("root").build();
    let chain = [ee.clone(), ca.clone(), root.clone()];

    assert!(CertInfoReqValidator::new(None, &[], Some(&ee), &chain).validate());
    let v = CertInfoReqValidator::new(None, &chain[..1], Some(&ee), &chain);
    assert!(!v.validate());
    assert_eq!(
        Some("Should not have any certificates in the signature".to_string()),
        v.error_detail()
    );

    let embedded = [ee.clone()];
    assert!(
        CertInfoReqValidator::new(Some(CertInfoReq::SignerOnly), &embedded, Some(&ee), &chain)
            .validate()
    );
    assert!(
        !CertInfoReqValidator::new(Some(CertInfoReq::SignerOnly), &chain, Some(&ee), &chain)
            .validate()
    );
    assert!(
        !CertInfoReqValidator::new(Some(CertInfoReq::SignerOnly), &embedded, None, &chain)
            .validate()
    );

    let with_tsa = [
        ee.clone(),
        ca.clone(),
        root.clone(),
        CertificateNodeBuilder::new("tsa").build(),
    ];
    assert!(
        CertInfoReqValidator::new(Some(CertInfoReq::FullPath), &with_tsa, Some(&ee), &chain)
            .validate()
    );
    // the path alone is not a strict subset of the embedded certificates
    assert!(
        !CertInfoReqValidator::new(Some(CertInfoReq::FullPath), &chain, Some(&ee), &chain)
            .validate()
    );
    // a single certificate chain never satisfies fullPath
    assert!(
        !CertInfoReqValidator::new(Some(CertInfoReq::FullPath), &embedded, Some(&ee), &embedded)
            .validate()
    );
    let partial = [ee, ca];
    let v = CertInfoReqValidator::new(Some(CertInfoReq::FullPath), &partial, partial.first(), &chain);
    assert_eq!(
        Some(PolicyValidationStatus::CertificateInfoMismatch),
        v.evaluate().error
    );
}
