/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the rollback-index library. The library
    maintains monotonic firmware and kernel version counters in TPM NVRAM
    so that an image older than one previously accepted can never boot
    again, across power loss, TPM clears and trust-mode changes.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod backup;
mod dev_mode;
mod index;
mod provision;
mod safe_write;
mod setup;
mod version;

pub use backup::{backup_kernel_space, recover_kernel_space};
pub use dev_mode::check_developer_mode_transition;
pub use index::RollbackIndex;
