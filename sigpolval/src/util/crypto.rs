//! Digest calculation and public key size extraction using libraries from the
//! [Rust Crypto](https://github.com/RustCrypto) project.

use alloc::{format, vec::Vec};

use const_oid::db::rfc5912::{
    ID_EC_PUBLIC_KEY, ID_SHA_1, ID_SHA_224, ID_SHA_256, ID_SHA_384, ID_SHA_512, RSA_ENCRYPTION,
    SECP_224_R_1, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1,
};
use const_oid::db::rfc8410::{ID_ED_25519, ID_ED_448};
use der::asn1::{ObjectIdentifier, Uint};
use der::{Decode, Sequence};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use spki::SubjectPublicKeyInfoOwned;

use crate::util::error::{Error, Result};
use crate::{log_message, PeLogLevels};

/// RSAPublicKey structure as defined in [RFC 8017 Appendix A.1.1], used only to determine modulus size.
///
/// [RFC 8017 Appendix A.1.1]: https://datatracker.ietf.org/doc/html/rfc8017#appendix-A.1.1
#[derive(Sequence)]
struct RsaPublicKey {
    modulus: Uint,
    #[allow(dead_code)]
    public_exponent: Uint,
}

/// `calculate_hash` computes a digest of `buffer_to_hash` using the algorithm identified by `hash_alg`.
///
/// It supports SHA-1, SHA-224, SHA-256, SHA-384 and SHA-512. Other algorithms yield [`Error::Unrecognized`].
pub fn calculate_hash(hash_alg: &ObjectIdentifier, buffer_to_hash: &[u8]) -> Result<Vec<u8>> {
    match *hash_alg {
        ID_SHA_1 => Ok(Sha1::digest(buffer_to_hash).to_vec()),
        ID_SHA_224 => Ok(Sha224::digest(buffer_to_hash).to_vec()),
        ID_SHA_256 => Ok(Sha256::digest(buffer_to_hash).to_vec()),
        ID_SHA_384 => Ok(Sha384::digest(buffer_to_hash).to_vec()),
        ID_SHA_512 => Ok(Sha512::digest(buffer_to_hash).to_vec()),
        _ => {
            log_message(
                &PeLogLevels::PeError,
                format!("Unrecognized or unsupported hash algorithm: {}", hash_alg).as_str(),
            );
            Err(Error::Unrecognized)
        }
    }
}

/// Returns the number of significant bits in a big-endian unsigned integer.
fn bit_length(bytes: &[u8]) -> u32 {
    match bytes.iter().position(|b| *b != 0) {
        Some(first) => {
            let rest = (bytes.len() - first - 1) as u32;
            rest * 8 + (8 - bytes[first].leading_zeros())
        }
        None => 0,
    }
}

/// `public_key_size` returns the size in bits of the public key conveyed in a SubjectPublicKeyInfo.
///
/// RSA keys report the modulus length. EC keys report the field size of the named curve. EdDSA keys report
/// the size of the curve. Other key types yield [`Error::Unrecognized`].
pub fn public_key_size(spki: &SubjectPublicKeyInfoOwned) -> Result<u32> {
    match spki.algorithm.oid {
        RSA_ENCRYPTION => {
            let rsa = RsaPublicKey::from_der(spki.subject_public_key.raw_bytes())?;
            Ok(bit_length(rsa.modulus.as_bytes()))
        }
        ID_EC_PUBLIC_KEY => {
            let named_curve: ObjectIdentifier = match &spki.algorithm.parameters {
                Some(params) => params.decode_as()?,
                None => return Err(Error::ParseError),
            };
            match named_curve {
                SECP_224_R_1 => Ok(224),
                SECP_256_R_1 => Ok(256),
                SECP_384_R_1 => Ok(384),
                SECP_521_R_1 => Ok(521),
                _ => {
                    log_message(
                        &PeLogLevels::PeError,
                        format!("Unrecognized or unsupported named curve: {}", named_curve).as_str(),
                    );
                    Err(Error::Unrecognized)
                }
            }
        }
        ID_ED_25519 => Ok(256),
        ID_ED_448 => Ok(456),
        _ => Err(Error::Unrecognized),
    }
}

#[test]
fn test_calculate_hash() {
    use hex_literal::hex;

    let result = calculate_hash(&ID_SHA_256, "abc".as_bytes()).unwrap();
    assert_eq!(
        result,
        hex!("BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD")
    );
    let result = calculate_hash(&ID_SHA_1, "abc".as_bytes()).unwrap();
    assert_eq!(result, hex!("A9993E364706816ABA3E25717850C26C9CD0D89D"));
    assert_eq!(
        Err(Error::Unrecognized),
        calculate_hash(&RSA_ENCRYPTION, "abc".as_bytes())
    );
}

#[test]
fn test_bit_length() {
    assert_eq!(0, bit_length(&[]));
    assert_eq!(0, bit_length(&[0, 0]));
    assert_eq!(1, bit_length(&[1]));
    assert_eq!(9, bit_length(&[0, 1, 0xFF]));
    assert_eq!(2048, bit_length(&[0x80; 256]));
}
