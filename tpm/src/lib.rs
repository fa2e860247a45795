/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the TPM transport library.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod nv;
pub mod printer;
mod transport;

pub use nv::{
    TpmNvPermissions, DEVELOPER_MODE_NV_INDEX, FIRMWARE_VERSIONS_NV_INDEX,
    KERNEL_MUST_USE_BACKUP_NV_INDEX, KERNEL_SPACE_SIZE, KERNEL_SPACE_UID, KERNEL_SPACE_UID_SIZE,
    KERNEL_VERSIONS_BACKUP_NV_INDEX, KERNEL_VERSIONS_NV_INDEX, TPM_IS_INITIALIZED_NV_INDEX,
};
pub use transport::{Tpm, TpmFlags};
