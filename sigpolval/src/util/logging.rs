//! Logging support

use log::{debug, error, info, warn};

use crate::CertificateNode;

/// Enum that describes level associated with a log message
#[derive(Debug, Eq, PartialEq)]
pub enum PeLogLevels {
    /// Common error logging level
    PeError,
    /// Common info logging level
    PeInfo,
    /// Common warn logging level
    PeWarn,
    /// Common debug logging level
    PeDebug,
}

/// `log_message` emits a message via the `log` facade at the indicated level.
pub fn log_message(level: &PeLogLevels, message: &str) {
    match level {
        PeLogLevels::PeError => error!("{}", message),
        PeLogLevels::PeWarn => warn!("{}", message),
        PeLogLevels::PeInfo => info!("{}", message),
        PeLogLevels::PeDebug => debug!("{}", message),
    }
}

/// log a message with subject name of the certificate appended
pub fn log_error_for_cert(cert: &CertificateNode, msg: &str) {
    error!(
        "Encountered error while processing certificate with subject {}: {}",
        cert.subject_dn, msg
    );
}

/// log a warning with subject name of the certificate appended
pub(crate) fn log_warning_for_cert(cert: &CertificateNode, msg: &str) {
    warn!("{} (certificate subject: {})", msg, cert.subject_dn);
}
