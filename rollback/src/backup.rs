/*++

Licensed under the Apache-2.0 license.

File Name:

    backup.rs

Abstract:

    File contains the kernel-version backup/recovery protocol: validating
    the primary kernel space, restoring it from backup when the previous
    boot left it untrustworthy, and ratcheting the backup forward.

--*/

use crate::safe_write::safe_write;
use crate::version::{read_u32, KernelSpaceData};
use vboot_error::{VbootError, VbootResult};
use vboot_tpm::{
    Tpm, TpmNvPermissions, KERNEL_MUST_USE_BACKUP_NV_INDEX, KERNEL_SPACE_SIZE, KERNEL_SPACE_UID,
    KERNEL_VERSIONS_BACKUP_NV_INDEX, KERNEL_VERSIONS_NV_INDEX,
};
use zerocopy::{AsBytes, FromBytes};

/// Checks whether the kernel versions space has been mucked with and, if the
/// previous boot flagged it untrustworthy, reconstructs it from the backup.
///
/// The TPM owner can remove and redefine a physical-presence-protected space
/// at any time (though not write to it), so the space's permission bits and
/// identifier tag are both validated; a mismatch on either means the space
/// is not ours anymore and only a recovery image can fix things.
pub fn recover_kernel_space<T: Tpm>(tpm: &mut T) -> VbootResult<()> {
    // Non-zero if the preceding boot entered recovery mode.
    let must_use_backup = read_u32(tpm, KERNEL_MUST_USE_BACKUP_NV_INDEX)?;

    let mut buffer = [0u8; KERNEL_SPACE_SIZE];
    tpm.read(KERNEL_VERSIONS_NV_INDEX, &mut buffer)?;
    let perms = tpm.get_permissions(KERNEL_VERSIONS_NV_INDEX)?;
    let space = KernelSpaceData::read_from(buffer.as_slice())
        .ok_or(VbootError::ROLLBACK_CORRUPTED_STATE)?;
    if perms != TpmNvPermissions::PP_WRITE || space.uid != KERNEL_SPACE_UID {
        return Err(VbootError::ROLLBACK_CORRUPTED_STATE);
    }

    if must_use_backup != 0 {
        // The primary space was left unlocked by the preceding boot cycle
        // and cannot be trusted; the backup value replaces it.
        let backup_combined_versions = read_u32(tpm, KERNEL_VERSIONS_BACKUP_NV_INDEX)?;
        safe_write(
            tpm,
            KERNEL_VERSIONS_NV_INDEX,
            backup_combined_versions.as_bytes(),
        )?;
        // Zero-length write: the command succeeds but stores nothing, so the
        // flag value itself survives here. The flag is actually lowered by
        // the distrust update later in the setup sequence on the next
        // non-recovery boot. Kept bit-for-bit; fixing it would change the
        // NVRAM write pattern devices in the field already exhibit.
        safe_write(tpm, KERNEL_MUST_USE_BACKUP_NV_INDEX, &[])?;
    }
    Ok(())
}

/// Advances the backup copy of the kernel combined version.
///
/// The backup only ever ratchets upward. A primary below the backup cannot
/// happen through any legitimate sequence of operations.
pub fn backup_kernel_space<T: Tpm>(tpm: &mut T) -> VbootResult<()> {
    let kernel_versions = read_u32(tpm, KERNEL_VERSIONS_NV_INDEX)?;
    let backup_versions = read_u32(tpm, KERNEL_VERSIONS_BACKUP_NV_INDEX)?;
    if kernel_versions == backup_versions {
        return Ok(());
    } else if kernel_versions < backup_versions {
        return Err(VbootError::ROLLBACK_INTERNAL_INCONSISTENCY);
    }
    safe_write(
        tpm,
        KERNEL_VERSIONS_BACKUP_NV_INDEX,
        kernel_versions.as_bytes(),
    )
}

/// Records whether the next boot must distrust the primary kernel space.
///
/// Skips the NV write when the stored flag already matches, to spare the
/// TPM flash.
pub(crate) fn set_distrust_kernel_space_at_next_boot<T: Tpm>(
    tpm: &mut T,
    distrust: bool,
) -> VbootResult<()> {
    let distrust = distrust as u32;
    let must_use_backup = read_u32(tpm, KERNEL_MUST_USE_BACKUP_NV_INDEX)?;
    if must_use_backup != distrust {
        safe_write(tpm, KERNEL_MUST_USE_BACKUP_NV_INDEX, distrust.as_bytes())?;
    }
    Ok(())
}
