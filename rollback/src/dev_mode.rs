/*++

Licensed under the Apache-2.0 license.

File Name:

    dev_mode.rs

Abstract:

    File contains the developer-mode transition guard.

--*/

use crate::safe_write::{clear_and_reenable, safe_write};
use crate::version::read_u32;
use vboot_error::VbootResult;
use vboot_tpm::{Tpm, DEVELOPER_MODE_NV_INDEX};
use zerocopy::AsBytes;

/// Detects a switch between verified and developer mode and, on a switch,
/// clears the TPM so that secrets bound under the previous trust mode do
/// not survive into the new one. The new mode is then persisted.
pub fn check_developer_mode_transition<T: Tpm>(
    tpm: &mut T,
    current_developer: bool,
) -> VbootResult<()> {
    let current_developer = current_developer as u32;
    let past_developer = read_u32(tpm, DEVELOPER_MODE_NV_INDEX)?;
    if past_developer != current_developer {
        clear_and_reenable(tpm)?;
        safe_write(tpm, DEVELOPER_MODE_NV_INDEX, current_developer.as_bytes())?;
    }
    Ok(())
}
