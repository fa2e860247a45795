/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the TPM model interface used by tests: an emulated TPM
    with permissioned NVRAM slots stands in for the hardware transport.

--*/

use std::error::Error;

mod model_emulated;

pub use model_emulated::ModelEmulated;

/// Initial state of a modeled TPM.
pub struct InitParams {
    /// Per-boot NV write budget of an unowned TPM.
    pub write_limit: u32,
    /// Initial value of the disable permanent flag.
    pub disable: bool,
    /// Initial value of the deactivated permanent flag.
    pub deactivated: bool,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            write_limit: 64,
            disable: false,
            deactivated: false,
        }
    }
}

// Represents an emulation of the TPM hardware, to be called from tests.
pub trait TpmModel: vboot_tpm::Tpm {
    fn init(params: InitParams) -> Result<Self, Box<dyn Error>>
    where
        Self: Sized;

    /// Power-cycle the TPM: per-boot state (write budget, global lock,
    /// physical presence) resets, NVRAM survives.
    fn reset_boot(&mut self);
}
