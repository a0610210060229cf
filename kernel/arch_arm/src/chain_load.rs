//! Handing the machine over to another loaded image.

use kernel_config::memory::{PAGE_SIZE, SECTION_SIZE};
use log::debug;
use memory_arm::ArchMmu;
use memory_structs::{PhysicalAddress, VirtualAddress};
use crate::{
    cache::{disable_caches, Caches},
    core_mode::{quiesce_core, set_fpu_enabled},
    Arch,
};

/// Two sections, so a loader near the end of its section is still covered.
const LOADER_MAPPING_PAGES: usize = 2 * SECTION_SIZE / PAGE_SIZE;

impl<'a> Arch<'a> {
    /// Jumps to the physical address of `entry` with `args` in `r0..r3`,
    /// with IRQs, caches and (by way of the handoff routine) the MMU off.
    ///
    /// Every other core must already be parked.
    /// Panics if either address cannot be translated or the handoff routine cannot be mapped.
    pub fn chain_load(&self, entry: VirtualAddress, args: [usize; 4]) -> ! {
        let port = self.port;
        debug!("chain_load(): entry {}, args {:#x} {:#x} {:#x} {:#x}", entry, args[0], args[1], args[2], args[3]);

        port.disable_interrupts();

        self.platform.target_quiesce();
        self.platform.platform_quiesce();

        let loader = port.handoff_routine();
        let (entry_pa, loader_pa) = match self.mmu() {
            Some(mmu) => {
                let entry_pa = match self.translate(entry) {
                    Ok(pa) => pa,
                    Err(_) => panic!("error translating entry physical address"),
                };
                debug!("entry pa {}", entry_pa);

                let loader_pa = match self.translate(loader) {
                    Ok(pa) => pa,
                    Err(_) => panic!("error translating loader physical address"),
                };
                let loader_section = loader_pa.align_down_to_section();
                debug!("loader address {}, phys {}, surrounding large page {}", loader, loader_pa, loader_section);

                if let Err(e) = identity_map_loader(mmu, loader_pa, loader_section) {
                    panic!("error identity mapping the loader: {}", e);
                }
                (entry_pa, loader_pa)
            }
            None => (
                PhysicalAddress::new_canonical(entry.value()),
                PhysicalAddress::new_canonical(loader.value()),
            ),
        };

        debug!("disabling instruction/data cache");
        disable_caches(port, self.config.mode, Caches::UNIFIED);
        if let Some(l2) = self.l2_cache() {
            l2.set_enable(false);
        }

        quiesce_core(port, &self.config);

        // the next image may assume the FPU is already on
        set_fpu_enabled(port, true);

        debug!("branching to physical address of loader");
        port.branch_to_physical(loader_pa, entry_pa, args)
    }
}

/// Maps the sections around the loader 1:1 so it keeps running once it turns the MMU off.
///
/// The kernel's address space is used if it can hold the identity mapping;
/// otherwise a new address space is made and switched to, and is never freed.
fn identity_map_loader(
    mmu: &dyn ArchMmu,
    loader_pa: PhysicalAddress,
    loader_section: PhysicalAddress,
) -> Result<(), &'static str> {
    let kernel_aspace = mmu.kernel_aspace();
    let section_va = VirtualAddress::new_canonical(loader_section.value());

    let (aspace, needs_switch) = if mmu.is_valid_vaddr(kernel_aspace, VirtualAddress::new_canonical(loader_pa.value())) {
        (kernel_aspace, false)
    } else {
        (mmu.init_aspace(section_va, SECTION_SIZE)?, true)
    };

    mmu.map(aspace, section_va, loader_section, LOADER_MAPPING_PAGES)?;
    if needs_switch {
        mmu.context_switch(aspace);
    }
    Ok(())
}
