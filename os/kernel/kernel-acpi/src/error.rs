//! Error kinds and the signed status-code convention used at the boot boundary.

/// Status returned by successful entry points.
pub const ACPI_SUCCESS: i32 = 0;

/// High bit marking a failure status.
pub const ACPI_FAILURE: i32 = i32::MIN;

/// Failures raised while walking the firmware tables.
///
/// Every variant is detected at the point of validation, before any step that
/// depends on it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcpiError {
    /// A null physical address or a region the physical map cannot supply.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The byte sum over a table was not zero.
    #[error("checksum mismatch")]
    MismatchChecksum,
    /// A table carried an unexpected signature.
    #[error("signature mismatch")]
    MismatchSignature,
    /// A table carried an unexpected revision.
    #[error("revision mismatch")]
    MismatchRevision,
    /// The root table declares no sub-table entries.
    #[error("root table declares no entries")]
    MismatchCrosstable,
    /// The root pointer carries an unknown ACPI revision.
    #[error("unsupported ACPI version")]
    UnsupportedVersion,
    /// A length field is inconsistent with the table it describes.
    #[error("malformed table")]
    MalformedTable,
}

impl AcpiError {
    /// The signed 32-bit status for this error: [`ACPI_FAILURE`] with the
    /// error kind in the low bits.
    #[must_use]
    pub const fn code(self) -> i32 {
        ACPI_FAILURE
            | match self {
                Self::InvalidParameter => 1,
                Self::MismatchChecksum => 2,
                Self::MismatchSignature => 3,
                Self::MismatchRevision => 4,
                Self::MismatchCrosstable => 5,
                Self::UnsupportedVersion => 6,
                Self::MalformedTable => 7,
            }
    }
}

/// Folds a result into the status-code convention.
pub const fn status_code<T>(result: &Result<T, AcpiError>) -> i32 {
    match result {
        Ok(_) => ACPI_SUCCESS,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_carry_failure_bit() {
        assert_eq!(AcpiError::InvalidParameter.code().cast_unsigned(), 0x8000_0001);
        assert_eq!(AcpiError::MismatchChecksum.code().cast_unsigned(), 0x8000_0002);
        assert_eq!(AcpiError::MismatchSignature.code().cast_unsigned(), 0x8000_0003);
        assert_eq!(AcpiError::MismatchRevision.code().cast_unsigned(), 0x8000_0004);
        assert_eq!(AcpiError::MismatchCrosstable.code().cast_unsigned(), 0x8000_0005);
        assert_eq!(AcpiError::UnsupportedVersion.code().cast_unsigned(), 0x8000_0006);
        assert_eq!(AcpiError::MalformedTable.code().cast_unsigned(), 0x8000_0007);
        assert!(AcpiError::MalformedTable.code() < 0);
    }

    #[test]
    fn status_of_results() {
        assert_eq!(status_code::<()>(&Ok(())), ACPI_SUCCESS);
        assert_eq!(
            status_code::<()>(&Err(AcpiError::UnsupportedVersion)),
            AcpiError::UnsupportedVersion.code()
        );
    }
}
