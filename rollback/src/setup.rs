/*++

Licensed under the Apache-2.0 license.

File Name:

    setup.rs

Abstract:

    File contains the boot-time TPM setup sequence that establishes the
    root of trust for the anti-rollback mechanism.

--*/

use crate::backup::{
    backup_kernel_space, recover_kernel_space, set_distrust_kernel_space_at_next_boot,
};
use crate::dev_mode::check_developer_mode_transition;
use crate::provision::{initialize_spaces, spaces_initialized};
use vboot_error::{VbootError, VbootResult};
use vboot_tpm::Tpm;

/// Starts the TPM and establishes the anti-rollback root of trust.
///
/// A failure here can mean a bug, a hardware fault or an unexpected TPM
/// state left by an attack, and the three are not distinguishable from
/// where we stand. The caller's strategy is to reboot into recovery in
/// every case; the recovery path runs this same sequence again and ignores
/// its result, choosing a knowingly insecure device over a bricked one.
///
/// STCLEAR-style permissions are deliberately not used for the index
/// spaces. They would force an NV write on every reboot and wake-up, which
/// the durability of the TPM flash does not support.
pub(crate) fn setup_tpm<T: Tpm>(
    tpm: &mut T,
    recovery_mode: bool,
    developer_mode: bool,
) -> VbootResult<()> {
    tpm.lib_init();
    tpm.startup()?;
    tpm.continue_self_test()?;
    tpm.assert_physical_presence()?;

    // The TPM must be enabled and activated before anything else; if it is
    // not, correct it and ask for a fresh boot rather than resuming with a
    // TPM whose flags changed under us.
    let flags = tpm.get_flags()?;
    if flags.disable || flags.deactivated {
        tpm.set_enable()?;
        tpm.set_deactivated(false)?;
        return Err(VbootError::ROLLBACK_MUST_REBOOT);
    }

    // Expected to fail the first time a device boots, because the spaces
    // have not been provisioned yet.
    if recover_kernel_space(tpm).is_err() {
        if spaces_initialized(tpm)? {
            // The spaces exist but recovery still failed: nothing left to
            // provision, nothing left to retry.
            return Err(VbootError::ROLLBACK_ALREADY_INITIALIZED);
        }
        initialize_spaces(tpm)?;
        recover_kernel_space(tpm)?;
    }
    backup_kernel_space(tpm)?;

    // If this is a recovery boot, the kernel space lock may be bypassed
    // before the next boot; record that the next boot must fall back to
    // the backup value.
    set_distrust_kernel_space_at_next_boot(tpm, recovery_mode)?;
    check_developer_mode_transition(tpm, developer_mode)?;
    Ok(())
}
