/*++

Licensed under the Apache-2.0 license.

File Name:

    nv.rs

Abstract:

    File contains the NVRAM layout used by the rollback-index machinery:
    space indices, sizes, the kernel space identifier tag and the NV
    permission bits.

--*/

/// NV index holding the firmware combined version.
pub const FIRMWARE_VERSIONS_NV_INDEX: u32 = 0x1001;

/// NV index holding the kernel combined version followed by the UID tag.
pub const KERNEL_VERSIONS_NV_INDEX: u32 = 0x1002;

/// NV index holding the backup copy of the kernel combined version.
pub const KERNEL_VERSIONS_BACKUP_NV_INDEX: u32 = 0x1003;

/// NV index holding the must-use-backup flag for the next boot.
pub const KERNEL_MUST_USE_BACKUP_NV_INDEX: u32 = 0x1004;

/// NV index holding the last observed developer-mode flag.
pub const DEVELOPER_MODE_NV_INDEX: u32 = 0x1005;

/// NV index whose existence marks a completed provisioning ritual. Its
/// content is never written; it is defined last so that a power cut during
/// provisioning leaves it undefined and provisioning reruns on the next boot.
pub const TPM_IS_INITIALIZED_NV_INDEX: u32 = 0x1006;

/// Identifier tag stored after the combined version in the kernel space.
/// A space without this tag was redefined by someone else and is not ours.
pub const KERNEL_SPACE_UID: [u8; KERNEL_SPACE_UID_SIZE] = *b"GRWL";

pub const KERNEL_SPACE_UID_SIZE: usize = 4;

/// Total size of the kernel versions space: combined version + UID tag.
pub const KERNEL_SPACE_SIZE: usize = core::mem::size_of::<u32>() + KERNEL_SPACE_UID_SIZE;

bitflags::bitflags! {
    /// TPM NV space permission bits (TPM 1.2 `TPM_NV_ATTRIBUTES` subset).
    pub struct TpmNvPermissions : u32 {
        /// Writes require an asserted physical presence.
        const PP_WRITE = 0x0000_0001;
        /// Writes are blocked once the per-boot global lock is set.
        const GLOBAL_LOCK = 0x0000_8000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_space_layout() {
        assert_eq!(KERNEL_SPACE_SIZE, 8);
        assert_eq!(&KERNEL_SPACE_UID, b"GRWL");
    }

    #[test]
    fn test_permission_bits_are_disjoint() {
        assert_eq!(
            TpmNvPermissions::PP_WRITE.bits() & TpmNvPermissions::GLOBAL_LOCK.bits(),
            0
        );
    }
}
