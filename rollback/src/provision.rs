/*++

Licensed under the Apache-2.0 license.

File Name:

    provision.rs

Abstract:

    File contains the one-time NVRAM space provisioning ritual and the
    check for whether it ever completed.

--*/

use crate::safe_write::safe_write;
use crate::version::KernelSpaceData;
use vboot_error::{VbootError, VbootResult};
use vboot_tpm::{
    Tpm, TpmNvPermissions, DEVELOPER_MODE_NV_INDEX, FIRMWARE_VERSIONS_NV_INDEX,
    KERNEL_MUST_USE_BACKUP_NV_INDEX, KERNEL_VERSIONS_BACKUP_NV_INDEX, KERNEL_VERSIONS_NV_INDEX,
    TPM_IS_INITIALIZED_NV_INDEX,
};
use zerocopy::AsBytes;

fn initialize_kernel_versions_space<T: Tpm>(tpm: &mut T) -> VbootResult<()> {
    let init_data = KernelSpaceData::initial();
    tpm.define_space(
        KERNEL_VERSIONS_NV_INDEX,
        TpmNvPermissions::PP_WRITE,
        init_data.as_bytes().len(),
    )?;
    safe_write(tpm, KERNEL_VERSIONS_NV_INDEX, init_data.as_bytes())?;
    Ok(())
}

/// Creates the NVRAM spaces and sets their initial values as needed.
///
/// Runs once per device lifetime (or after a full TPM clear wiped the
/// spaces). Safe against power loss at any step: the is-initialized marker
/// is defined last, and while it is absent a later boot simply runs the
/// whole ritual again.
pub(crate) fn initialize_spaces<T: Tpm>(tpm: &mut T) -> VbootResult<()> {
    let zero = 0u32;
    let firmware_perm = TpmNvPermissions::GLOBAL_LOCK | TpmNvPermissions::PP_WRITE;

    vboot_tpm::cprintln!("[rollback] initializing TPM spaces");

    tpm.set_nv_locked()?;

    tpm.define_space(
        FIRMWARE_VERSIONS_NV_INDEX,
        firmware_perm,
        core::mem::size_of::<u32>(),
    )?;
    safe_write(tpm, FIRMWARE_VERSIONS_NV_INDEX, zero.as_bytes())?;

    initialize_kernel_versions_space(tpm)?;

    // The backup space protects the kernel versions; the must-use-backup
    // space records whether only the backup value may be trusted.
    tpm.define_space(
        KERNEL_VERSIONS_BACKUP_NV_INDEX,
        firmware_perm,
        core::mem::size_of::<u32>(),
    )?;
    safe_write(tpm, KERNEL_VERSIONS_BACKUP_NV_INDEX, zero.as_bytes())?;
    tpm.define_space(
        KERNEL_MUST_USE_BACKUP_NV_INDEX,
        firmware_perm,
        core::mem::size_of::<u32>(),
    )?;
    safe_write(tpm, KERNEL_MUST_USE_BACKUP_NV_INDEX, zero.as_bytes())?;
    tpm.define_space(
        DEVELOPER_MODE_NV_INDEX,
        firmware_perm,
        core::mem::size_of::<u32>(),
    )?;
    safe_write(tpm, DEVELOPER_MODE_NV_INDEX, zero.as_bytes())?;

    // The marker space signals that initialization completed. Without it we
    // could not tell whether the last space created was also written (power
    // could have been lost right after its creation). Its content stays
    // unwritten; existence is the signal.
    tpm.define_space(
        TPM_IS_INITIALIZED_NV_INDEX,
        firmware_perm,
        core::mem::size_of::<u32>(),
    )?;
    Ok(())
}

/// Reports whether the provisioning ritual ever completed.
///
/// A missing marker space is not an error, it just means "not yet"; any
/// other transport failure propagates.
pub(crate) fn spaces_initialized<T: Tpm>(tpm: &mut T) -> VbootResult<bool> {
    let mut space_holder = [0u8; core::mem::size_of::<u32>()];
    match tpm.read(TPM_IS_INITIALIZED_NV_INDEX, &mut space_holder) {
        Ok(()) => Ok(true),
        Err(err) if err == VbootError::TPM_BAD_INDEX => Ok(false),
        Err(err) => Err(err),
    }
}
