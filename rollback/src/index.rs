/*++

Licensed under the Apache-2.0 license.

File Name:

    index.rs

Abstract:

    File contains the public rollback-index API consumed by the boot flow:
    setup, read, write and lock for the firmware and kernel counters.

--*/

use crate::safe_write::safe_write;
use crate::setup::setup_tpm;
use crate::version::{combine_versions, read_u32, split_versions};
use vboot_error::VbootResult;
use vboot_tpm::{Tpm, FIRMWARE_VERSIONS_NV_INDEX, KERNEL_VERSIONS_NV_INDEX};
use zerocopy::AsBytes;

/// Boot-scoped rollback-index context.
///
/// Owns the TPM transport for the duration of the boot and carries the
/// per-boot recovery state. Once a recovery boot is established, every
/// kernel counter operation short-circuits: the recovery kernel must not
/// read or mutate trust state meant for verified-mode kernels.
pub struct RollbackIndex<T: Tpm> {
    tpm: T,
    recovery_mode: bool,
}

impl<T: Tpm> RollbackIndex<T> {
    /// Create a new rollback-index context over a TPM transport.
    pub fn new(tpm: T) -> Self {
        Self {
            tpm,
            recovery_mode: false,
        }
    }

    /// Get a mutable reference to the underlying transport.
    ///
    /// This allows issuing commands outside the rollback-index protocol,
    /// such as platform-specific provisioning, when the closed API is not
    /// sufficient.
    pub fn tpm_mut(&mut self) -> &mut T {
        &mut self.tpm
    }

    /// Consume the context and return the transport.
    pub fn into_tpm(self) -> T {
        self.tpm
    }

    fn setup_tpm(&mut self, recovery_mode: bool, developer_mode: bool) -> VbootResult<()> {
        setup_tpm(&mut self.tpm, recovery_mode, developer_mode)?;
        if recovery_mode {
            self.recovery_mode = true;
        }
        Ok(())
    }

    /// Run the boot-time TPM setup for a verified (non-recovery) boot.
    ///
    /// # Arguments
    ///
    /// * `developer_mode` - whether the platform is booting in developer mode
    pub fn firmware_setup(&mut self, developer_mode: bool) -> VbootResult<()> {
        self.setup_tpm(false, developer_mode)
    }

    /// Read the firmware rollback counter as (key_version, version).
    pub fn firmware_read(&mut self) -> VbootResult<(u16, u16)> {
        let firmware_versions = read_u32(&mut self.tpm, FIRMWARE_VERSIONS_NV_INDEX)?;
        Ok(split_versions(firmware_versions))
    }

    /// Write the firmware rollback counter.
    pub fn firmware_write(&mut self, key_version: u16, version: u16) -> VbootResult<()> {
        let combined_version = combine_versions(key_version, version);
        safe_write(
            &mut self.tpm,
            FIRMWARE_VERSIONS_NV_INDEX,
            combined_version.as_bytes(),
        )
    }

    /// Set the per-boot global lock, blocking further writes to the
    /// lock-protected spaces until the next boot.
    pub fn firmware_lock(&mut self) -> VbootResult<()> {
        self.tpm.set_global_lock()
    }

    /// Run the boot-time TPM setup for a recovery boot.
    ///
    /// Setup failures are deliberately ignored here: a recovery boot exists
    /// to repair the device, and a knowingly insecure TPM beats a bricked
    /// one. With the developer switch off the global lock is applied; with
    /// it on the TPM is left unlocked so the recovery image can fix it
    /// (and lock it as soon as possible). Physical presence stays asserted
    /// either way.
    pub fn kernel_recovery(&mut self, developer_mode: bool) -> VbootResult<()> {
        let _ = self.setup_tpm(true, developer_mode);
        if !developer_mode {
            self.tpm.set_global_lock()?;
        }
        Ok(())
    }

    /// Read the kernel rollback counter as (key_version, version).
    ///
    /// In a recovery boot this returns (0, 0) without touching NVRAM.
    pub fn kernel_read(&mut self) -> VbootResult<(u16, u16)> {
        if self.recovery_mode {
            return Ok((0, 0));
        }
        let kernel_versions = read_u32(&mut self.tpm, KERNEL_VERSIONS_NV_INDEX)?;
        Ok(split_versions(kernel_versions))
    }

    /// Write the kernel rollback counter. Only the combined version is
    /// rewritten; the identifier tag written at provisioning time stays in
    /// place. In a recovery boot this is a no-op success.
    pub fn kernel_write(&mut self, key_version: u16, version: u16) -> VbootResult<()> {
        if self.recovery_mode {
            return Ok(());
        }
        let combined_version = combine_versions(key_version, version);
        safe_write(
            &mut self.tpm,
            KERNEL_VERSIONS_NV_INDEX,
            combined_version.as_bytes(),
        )
    }

    /// Turn off physical presence, ending writes to the kernel versions
    /// space for this boot. In a recovery boot this is a no-op success.
    pub fn kernel_lock(&mut self) -> VbootResult<()> {
        if self.recovery_mode {
            return Ok(());
        }
        self.tpm.lock_physical_presence()
    }
}
