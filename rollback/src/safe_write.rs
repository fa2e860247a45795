/*++

Licensed under the Apache-2.0 license.

File Name:

    safe_write.rs

Abstract:

    File contains the write wrapper that survives the TPM's per-boot
    NV write budget, and the clear-and-reenable sequence it relies on.

--*/

use vboot_error::{VbootError, VbootResult};
use vboot_tpm::Tpm;

/// Clears the TPM and brings it back to enabled and activated.
///
/// Discards the owner and every owner-bound secret, so callers only invoke
/// this when that is the intended effect (trust-mode change) or when the
/// TPM is known to be unowned.
pub(crate) fn clear_and_reenable<T: Tpm>(tpm: &mut T) -> VbootResult<()> {
    tpm.force_clear()?;
    tpm.set_enable()?;
    tpm.set_deactivated(false)?;
    Ok(())
}

/// Like [`Tpm::write`], but recovers from the unowned-TPM write budget.
///
/// The budget can only be hit while the TPM is unowned (pre-provisioning or
/// under attack), and clearing an unowned TPM loses nothing, so a clear is
/// the one way forward. The retry happens exactly once; its failure, and
/// every other failure, propagates verbatim.
pub(crate) fn safe_write<T: Tpm>(tpm: &mut T, index: u32, data: &[u8]) -> VbootResult<()> {
    match tpm.write(index, data) {
        Err(err) if err == VbootError::TPM_MAX_NV_WRITES_EXCEEDED => {
            clear_and_reenable(tpm)?;
            tpm.write(index, data)
        }
        result => result,
    }
}
