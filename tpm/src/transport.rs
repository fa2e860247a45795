/*++

Licensed under the Apache-2.0 license.

File Name:

    transport.rs

Abstract:

    File contains the TPM command transport capability. The rollback-index
    state machine is generic over this trait; hardware backends issue real
    TPM 1.2 commands while tests use the emulated model.

--*/

use crate::TpmNvPermissions;
use vboot_error::VbootResult;

/// Permanent flags relevant to the boot-time setup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TpmFlags {
    pub disable: bool,
    pub deactivated: bool,
}

/// TPM command transport.
///
/// Each method is one blocking command round-trip. A method returns `Ok` on
/// the transport's success status and the corresponding `VbootError` for
/// every other status word. Two statuses carry meaning for callers beyond
/// pass/fail: `TPM_BAD_INDEX` from [`Tpm::read`] (the space is not defined)
/// and `TPM_MAX_NV_WRITES_EXCEEDED` from [`Tpm::write`] (the per-boot write
/// budget of an unowned TPM is spent).
pub trait Tpm {
    /// One-time transport library setup. Infallible by contract; backends
    /// that can fail here must surface it on the first command instead.
    fn lib_init(&mut self);

    /// TPM_Startup.
    fn startup(&mut self) -> VbootResult<()>;

    /// Kick off (or resume) the TPM self test without waiting for it.
    fn continue_self_test(&mut self) -> VbootResult<()>;

    /// Assert physical presence for the remainder of this boot, until
    /// [`Tpm::lock_physical_presence`] is called.
    fn assert_physical_presence(&mut self) -> VbootResult<()>;

    /// Turn off the physical-presence assertion until the next boot.
    fn lock_physical_presence(&mut self) -> VbootResult<()>;

    /// Read the disable/deactivated permanent flags.
    fn get_flags(&mut self) -> VbootResult<TpmFlags>;

    /// Enable the TPM (clear the disable flag).
    fn set_enable(&mut self) -> VbootResult<()>;

    /// Set or clear the deactivated flag. Takes effect per TPM 1.2 semantics;
    /// the emulated model applies it immediately.
    fn set_deactivated(&mut self, deactivated: bool) -> VbootResult<()>;

    /// Clear the TPM: discard the owner and all owner-bound secrets. Only
    /// meaningful under physical presence.
    fn force_clear(&mut self) -> VbootResult<()>;

    /// Define an NV space with the given permission bits and size.
    fn define_space(&mut self, index: u32, perms: TpmNvPermissions, size: usize)
        -> VbootResult<()>;

    /// Read `data.len()` bytes from an NV space. Fails with `TPM_BAD_INDEX`
    /// if the space is not defined.
    fn read(&mut self, index: u32, data: &mut [u8]) -> VbootResult<()>;

    /// Write `data` to an NV space. A zero-length write is a valid command
    /// that modifies nothing. Fails with `TPM_MAX_NV_WRITES_EXCEEDED` when
    /// the unowned-TPM write budget for this boot is spent.
    fn write(&mut self, index: u32, data: &[u8]) -> VbootResult<()>;

    /// Read back the permission bits a space was defined with.
    fn get_permissions(&mut self, index: u32) -> VbootResult<TpmNvPermissions>;

    /// Block further space definitions for this boot cycle.
    fn set_nv_locked(&mut self) -> VbootResult<()>;

    /// Set the per-boot global lock: no more writes to GLOBAL_LOCK-protected
    /// spaces until the next boot.
    fn set_global_lock(&mut self) -> VbootResult<()>;
}
