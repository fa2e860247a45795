/*++

Licensed under the Apache-2.0 license.

File Name:

    model_emulated.rs

Abstract:

    File contains an in-memory emulation of a TPM 1.2-style part: NVRAM as
    addressable, permissioned, fixed-size slots with a per-boot write
    budget, plus the enable/activate, locking and physical-presence state
    the boot-time setup sequence depends on.

--*/

use std::collections::HashMap;
use std::error::Error;

use vboot_error::{VbootError, VbootResult};
use vboot_tpm::{Tpm, TpmFlags, TpmNvPermissions};

use crate::{InitParams, TpmModel};

struct NvSpace {
    perms: TpmNvPermissions,
    data: Vec<u8>,
}

pub struct ModelEmulated {
    spaces: HashMap<u32, NvSpace>,
    disable: bool,
    deactivated: bool,
    physical_presence: bool,
    pp_locked: bool,
    nv_locked: bool,
    global_lock: bool,
    write_limit: u32,
    writes_used: u32,
}

impl ModelEmulated {
    /// True if the space is currently defined.
    pub fn space_defined(&self, index: u32) -> bool {
        self.spaces.contains_key(&index)
    }

    /// Raw NVRAM content of a space, bypassing all permission checks.
    pub fn raw_read(&self, index: u32) -> Option<&[u8]> {
        self.spaces.get(&index).map(|space| space.data.as_slice())
    }

    /// Mutable raw NVRAM content of a space, bypassing all permission
    /// checks. For simulating tampering in tests.
    pub fn raw_space_mut(&mut self, index: u32) -> Option<&mut Vec<u8>> {
        self.spaces.get_mut(&index).map(|space| &mut space.data)
    }

    /// Overwrite the first four bytes of a space, bypassing all checks.
    pub fn raw_write_u32(&mut self, index: u32, value: u32) -> bool {
        match self.spaces.get_mut(&index) {
            Some(space) if space.data.len() >= 4 => {
                space.data[..4].copy_from_slice(&value.to_ne_bytes());
                true
            }
            _ => false,
        }
    }

    /// First four bytes of a space as a u32, bypassing all checks.
    pub fn raw_read_u32(&self, index: u32) -> Option<u32> {
        let space = self.spaces.get(&index)?;
        let bytes: [u8; 4] = space.data.get(..4)?.try_into().ok()?;
        Some(u32::from_ne_bytes(bytes))
    }

    /// Remove a space the way a TPM owner could, regardless of locks.
    pub fn undefine(&mut self, index: u32) {
        self.spaces.remove(&index);
    }

    /// Redefine a space with attacker-chosen permissions, regardless of
    /// locks. Content is zero-filled like any fresh definition.
    pub fn redefine(&mut self, index: u32, perms: TpmNvPermissions, size: usize) {
        self.spaces.insert(
            index,
            NvSpace {
                perms,
                data: vec![0; size],
            },
        );
    }

    /// Force the permanent flags to a given state.
    pub fn set_permanent_flags(&mut self, disable: bool, deactivated: bool) {
        self.disable = disable;
        self.deactivated = deactivated;
    }

    /// Current permanent flags, without going through the command path.
    pub fn permanent_flags(&self) -> TpmFlags {
        TpmFlags {
            disable: self.disable,
            deactivated: self.deactivated,
        }
    }

    /// NV writes consumed from this boot's budget.
    pub fn writes_used(&self) -> u32 {
        self.writes_used
    }

    /// Spend the remaining write budget so the next write fails.
    pub fn exhaust_write_budget(&mut self) {
        self.writes_used = self.write_limit;
    }

    pub fn physical_presence(&self) -> bool {
        self.physical_presence
    }

    pub fn global_lock_set(&self) -> bool {
        self.global_lock
    }
}

impl TpmModel for ModelEmulated {
    fn init(params: InitParams) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            spaces: HashMap::new(),
            disable: params.disable,
            deactivated: params.deactivated,
            physical_presence: false,
            pp_locked: false,
            nv_locked: false,
            global_lock: false,
            write_limit: params.write_limit,
            writes_used: 0,
        })
    }

    fn reset_boot(&mut self) {
        // NVRAM and the nvLocked flag persist; everything ST_CLEAR resets.
        self.writes_used = 0;
        self.global_lock = false;
        self.physical_presence = false;
        self.pp_locked = false;
    }
}

impl Tpm for ModelEmulated {
    fn lib_init(&mut self) {}

    fn startup(&mut self) -> VbootResult<()> {
        Ok(())
    }

    fn continue_self_test(&mut self) -> VbootResult<()> {
        Ok(())
    }

    fn assert_physical_presence(&mut self) -> VbootResult<()> {
        if self.pp_locked {
            return Err(VbootError::TPM_IOERROR);
        }
        self.physical_presence = true;
        Ok(())
    }

    fn lock_physical_presence(&mut self) -> VbootResult<()> {
        self.physical_presence = false;
        self.pp_locked = true;
        Ok(())
    }

    fn get_flags(&mut self) -> VbootResult<TpmFlags> {
        Ok(TpmFlags {
            disable: self.disable,
            deactivated: self.deactivated,
        })
    }

    fn set_enable(&mut self) -> VbootResult<()> {
        self.disable = false;
        Ok(())
    }

    fn set_deactivated(&mut self, deactivated: bool) -> VbootResult<()> {
        self.deactivated = deactivated;
        Ok(())
    }

    fn force_clear(&mut self) -> VbootResult<()> {
        if !self.physical_presence {
            return Err(VbootError::TPM_IOERROR);
        }
        // Clearing discards the owner; the part comes back disabled and
        // deactivated, and the unowned write budget starts over.
        self.disable = true;
        self.deactivated = true;
        self.writes_used = 0;
        Ok(())
    }

    fn define_space(
        &mut self,
        index: u32,
        perms: TpmNvPermissions,
        size: usize,
    ) -> VbootResult<()> {
        // Definition is an owner-or-physical-presence operation; the boot
        // flow always runs it under physical presence, an owner can do it
        // any time (which is exactly the attack the kernel-space checks
        // defend against, modeled through `redefine`).
        if !self.physical_presence {
            return Err(VbootError::TPM_IOERROR);
        }
        self.spaces.insert(
            index,
            NvSpace {
                perms,
                data: vec![0; size],
            },
        );
        Ok(())
    }

    fn read(&mut self, index: u32, data: &mut [u8]) -> VbootResult<()> {
        let space = self
            .spaces
            .get(&index)
            .ok_or(VbootError::TPM_BAD_INDEX)?;
        if data.len() > space.data.len() {
            return Err(VbootError::TPM_BAD_LENGTH);
        }
        data.copy_from_slice(&space.data[..data.len()]);
        Ok(())
    }

    fn write(&mut self, index: u32, data: &[u8]) -> VbootResult<()> {
        let global_lock = self.global_lock;
        let physical_presence = self.physical_presence;
        let space = self
            .spaces
            .get_mut(&index)
            .ok_or(VbootError::TPM_BAD_INDEX)?;
        if data.len() > space.data.len() {
            return Err(VbootError::TPM_BAD_LENGTH);
        }
        if global_lock && space.perms.contains(TpmNvPermissions::GLOBAL_LOCK) {
            return Err(VbootError::TPM_AREA_LOCKED);
        }
        if space.perms.contains(TpmNvPermissions::PP_WRITE) && !physical_presence {
            return Err(VbootError::TPM_AREA_LOCKED);
        }
        if self.writes_used >= self.write_limit {
            return Err(VbootError::TPM_MAX_NV_WRITES_EXCEEDED);
        }
        self.writes_used += 1;
        // A short buffer rewrites only the leading bytes; a zero-length
        // write is accepted and stores nothing.
        space.data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn get_permissions(&mut self, index: u32) -> VbootResult<TpmNvPermissions> {
        self.spaces
            .get(&index)
            .map(|space| space.perms)
            .ok_or(VbootError::TPM_BAD_INDEX)
    }

    fn set_nv_locked(&mut self) -> VbootResult<()> {
        self.nv_locked = true;
        Ok(())
    }

    fn set_global_lock(&mut self) -> VbootResult<()> {
        self.global_lock = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: u32 = 0x1001;

    fn model() -> ModelEmulated {
        let mut m = ModelEmulated::init(InitParams::default()).unwrap();
        m.assert_physical_presence().unwrap();
        m
    }

    #[test]
    fn test_undefined_space() {
        let mut m = model();
        let mut buf = [0u8; 4];
        assert_eq!(m.read(INDEX, &mut buf), Err(VbootError::TPM_BAD_INDEX));
        assert_eq!(m.write(INDEX, &buf), Err(VbootError::TPM_BAD_INDEX));
        assert_eq!(m.get_permissions(INDEX), Err(VbootError::TPM_BAD_INDEX));
    }

    #[test]
    fn test_define_zero_fills() {
        let mut m = model();
        m.define_space(INDEX, TpmNvPermissions::PP_WRITE, 4).unwrap();
        let mut buf = [0xffu8; 4];
        m.read(INDEX, &mut buf).unwrap();
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn test_zero_length_write_stores_nothing() {
        let mut m = model();
        m.define_space(INDEX, TpmNvPermissions::PP_WRITE, 4).unwrap();
        m.write(INDEX, &[1, 2, 3, 4]).unwrap();
        m.write(INDEX, &[]).unwrap();
        assert_eq!(m.raw_read(INDEX).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_write_budget() {
        let mut m = ModelEmulated::init(InitParams {
            write_limit: 2,
            ..InitParams::default()
        })
        .unwrap();
        m.assert_physical_presence().unwrap();
        m.define_space(INDEX, TpmNvPermissions::PP_WRITE, 4).unwrap();
        m.write(INDEX, &[1; 4]).unwrap();
        m.write(INDEX, &[2; 4]).unwrap();
        assert_eq!(
            m.write(INDEX, &[3; 4]),
            Err(VbootError::TPM_MAX_NV_WRITES_EXCEEDED)
        );
        // A clear starts the budget over.
        m.force_clear().unwrap();
        m.write(INDEX, &[3; 4]).unwrap();
        assert_eq!(m.raw_read(INDEX).unwrap(), &[3; 4]);
    }

    #[test]
    fn test_global_lock_blocks_protected_spaces_only() {
        let mut m = model();
        m.define_space(
            INDEX,
            TpmNvPermissions::GLOBAL_LOCK | TpmNvPermissions::PP_WRITE,
            4,
        )
        .unwrap();
        m.define_space(INDEX + 1, TpmNvPermissions::PP_WRITE, 4).unwrap();
        m.set_global_lock().unwrap();
        assert_eq!(m.write(INDEX, &[1; 4]), Err(VbootError::TPM_AREA_LOCKED));
        m.write(INDEX + 1, &[1; 4]).unwrap();
    }

    #[test]
    fn test_pp_write_requires_physical_presence() {
        let mut m = model();
        m.define_space(INDEX, TpmNvPermissions::PP_WRITE, 4).unwrap();
        m.lock_physical_presence().unwrap();
        assert_eq!(m.write(INDEX, &[1; 4]), Err(VbootError::TPM_AREA_LOCKED));
        // Physical presence stays locked for the rest of the boot.
        assert_eq!(
            m.assert_physical_presence(),
            Err(VbootError::TPM_IOERROR)
        );
        m.reset_boot();
        m.assert_physical_presence().unwrap();
        m.write(INDEX, &[1; 4]).unwrap();
    }

    #[test]
    fn test_reset_boot_preserves_nvram() {
        let mut m = model();
        m.define_space(INDEX, TpmNvPermissions::PP_WRITE, 4).unwrap();
        m.write(INDEX, &[9; 4]).unwrap();
        m.set_global_lock().unwrap();
        m.reset_boot();
        assert!(m.space_defined(INDEX));
        assert_eq!(m.raw_read(INDEX).unwrap(), &[9; 4]);
        assert!(!m.global_lock_set());
        assert_eq!(m.writes_used(), 0);
    }
}
