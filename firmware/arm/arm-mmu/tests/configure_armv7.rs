mod common;

use arm_mmu::hardware::armv7::Armv7Regime;
use arm_mmu::{
    MemoryRegionDescriptor, MmuError, PhysicalAddress, RegionAttribute, UnsupportedError, VirtualAddress, configure,
};
use common::{Event, RecordingCpu, TestMemory};

const TABLES: u64 = 0x0010_0000;
const PERIPHERALS: u64 = 0x3F00_0000;

fn rpi2_map() -> [MemoryRegionDescriptor; 4] {
    [
        MemoryRegionDescriptor::identity(0, 0x3B40_0000, RegionAttribute::WriteBack),
        MemoryRegionDescriptor::identity(0x3B40_0000, 0x04C0_0000 - 0x0100_0000, RegionAttribute::Uncached),
        MemoryRegionDescriptor::identity(PERIPHERALS, 0x0100_0000, RegionAttribute::Device),
        MemoryRegionDescriptor::SENTINEL,
    ]
}

#[test]
fn programs_short_descriptor_registers() {
    let memory = TestMemory::new(TABLES, 16);
    let mut alloc = memory.allocator();
    let mut regime = Armv7Regime::new(RecordingCpu::armv7(false));

    let mmu = configure(&mut regime, &mut alloc, &memory, &rpi2_map()).unwrap();
    assert_eq!(mmu.root(), PhysicalAddress::new(TABLES));
    assert_eq!(mmu.root_size_bytes(), 16 << 10);
    // Every region is 1 MiB aligned: sections only.
    assert_eq!(mmu.tables().len(), 1);

    let root = TABLES as u32;
    let cpu = regime.into_inner();
    assert_eq!(
        cpu.events,
        vec![
            Event::DisableMmu,
            Event::DisableDataCache,
            Event::DisableInstructionCache,
            Event::CleanInvalidateDataCache,
            Event::InvalidateInstructionCache,
            Event::Ttbcr(0),
            Event::Ttbr0(root),
            Event::Ttbr0(root | (1 << 3) | 0b10 | 0b1),
            Event::Dacr(0b01),
            Event::TexRemap(false),
            Event::InvalidateTlbs,
            Event::DisableAlignmentCheck,
            Event::EnableInstructionCache,
            Event::EnableDataCache,
            Event::EnableMmu,
        ]
    );
}

#[test]
fn sections_are_committed_with_the_region_encodings() {
    let memory = TestMemory::new(TABLES, 16);
    let mut alloc = memory.allocator();
    let mut regime = Armv7Regime::new(RecordingCpu::armv7(true));
    let mmu = configure(&mut regime, &mut alloc, &memory, &rpi2_map()).unwrap();
    let root = mmu.root();

    // Write-back: TEX 001, C, B, S, AP 0b11.
    let ram = memory.read_u32(root);
    assert_eq!(ram, 0b10 | (1 << 2) | (1 << 3) | (0b11 << 10) | (1 << 12) | (1 << 16));

    // Uncached: TEX 001 only.
    let uncached = memory.read_u32(root + (0x3B4 * 4));
    assert_eq!(uncached, 0x3B40_0000 | 0b10 | (0b11 << 10) | (1 << 12));

    // Device: B and XN.
    let device = memory.read_u32(root + (0x3F0 * 4));
    assert_eq!(device, PERIPHERALS as u32 | 0b10 | (1 << 2) | (1 << 4) | (0b11 << 10));

    // Nothing above the peripherals.
    assert_eq!(memory.read_u32(root + (0x400 * 4)), 0);

    let walk = regime.into_inner().events[7];
    assert_eq!(walk, Event::Ttbr0(TABLES as u32 | (1 << 3) | (1 << 6) | 0b10));
}

#[test]
fn small_pages_inherit_non_secure_from_the_page_table() {
    let memory = TestMemory::new(TABLES, 16);
    let mut alloc = memory.allocator();
    let mut regime = Armv7Regime::new(RecordingCpu::armv7(false));
    let map = [
        MemoryRegionDescriptor::identity(0, 0x0100_0000, RegionAttribute::WriteThrough),
        MemoryRegionDescriptor::identity(0x3F20_0000, 0x2000, RegionAttribute::NonSecureDevice),
    ];

    let mmu = configure(&mut regime, &mut alloc, &memory, &map).unwrap();
    let tables = mmu.tables();
    assert_eq!(tables.len(), 2);

    let t = tables.translate(VirtualAddress::new(0x3F20_1000)).unwrap();
    assert_eq!(t.level, 2);
    assert!(t.inherited.non_secure);
    assert_eq!(
        tables.region_attribute_at(VirtualAddress::new(0x3F20_1000)),
        Ok(RegionAttribute::NonSecureDevice)
    );
    assert!(tables.translate(VirtualAddress::new(0x3F20_2000)).is_none());

    let level1 = memory.read_u32(mmu.root() + (0x3F2 * 4));
    assert_eq!(level1 & 0b11, 0b01);
    assert_ne!(level1 & (1 << 3), 0);
}

fn security_state_conflict(first: RegionAttribute, second: RegionAttribute) {
    let memory = TestMemory::new(TABLES, 16);
    let mut alloc = memory.allocator();
    let mut regime = Armv7Regime::new(RecordingCpu::armv7(false));
    let map = [
        MemoryRegionDescriptor::identity(0, 0x0100_0000, RegionAttribute::WriteThrough),
        MemoryRegionDescriptor::identity(PERIPHERALS, 0x1000, first),
        MemoryRegionDescriptor::identity(PERIPHERALS + 0x1000, 0x1000, second),
    ];

    let err = configure(&mut regime, &mut alloc, &memory, &map).unwrap_err();
    assert_eq!(
        err,
        MmuError::Unsupported(UnsupportedError::SecurityState {
            address: VirtualAddress::new(PERIPHERALS + 0x1000),
            requested: second,
        })
    );
    assert_eq!(alloc.outstanding_pages(), 0);
    assert!(!regime.into_inner().mmu_enabled());
}

#[test]
fn non_secure_pages_in_a_secure_page_table_are_rejected() {
    security_state_conflict(RegionAttribute::WriteBack, RegionAttribute::NonSecureDevice);
}

#[test]
fn secure_pages_in_a_non_secure_page_table_are_rejected() {
    security_state_conflict(RegionAttribute::NonSecureWriteBack, RegionAttribute::Device);
}

#[test]
fn secure_pages_carved_from_a_non_secure_section_are_rejected() {
    let memory = TestMemory::new(TABLES, 16);
    let mut alloc = memory.allocator();
    let mut regime = Armv7Regime::new(RecordingCpu::armv7(false));
    let map = [
        MemoryRegionDescriptor::identity(0, 0x0100_0000, RegionAttribute::WriteThrough),
        MemoryRegionDescriptor::identity(PERIPHERALS, 0x10_0000, RegionAttribute::NonSecureDevice),
        MemoryRegionDescriptor::identity(PERIPHERALS + 0x8000, 0x1000, RegionAttribute::Device),
    ];

    let err = configure(&mut regime, &mut alloc, &memory, &map).unwrap_err();
    assert!(matches!(
        err,
        MmuError::Unsupported(UnsupportedError::SecurityState { .. })
    ));
    assert_eq!(alloc.outstanding_pages(), 0);
}

#[test]
fn pages_matching_the_page_table_security_state_share_it() {
    let memory = TestMemory::new(TABLES, 16);
    let mut alloc = memory.allocator();
    let mut regime = Armv7Regime::new(RecordingCpu::armv7(false));
    let map = [
        MemoryRegionDescriptor::identity(0, 0x0100_0000, RegionAttribute::WriteThrough),
        MemoryRegionDescriptor::identity(PERIPHERALS, 0x1000, RegionAttribute::NonSecureWriteBack),
        MemoryRegionDescriptor::identity(PERIPHERALS + 0x1000, 0x1000, RegionAttribute::NonSecureDevice),
    ];

    let mmu = configure(&mut regime, &mut alloc, &memory, &map).unwrap();
    let tables = mmu.tables();
    assert_eq!(tables.len(), 2);
    assert_eq!(
        tables.region_attribute_at(VirtualAddress::new(PERIPHERALS)),
        Ok(RegionAttribute::NonSecureWriteBack)
    );
    assert_eq!(
        tables.region_attribute_at(VirtualAddress::new(PERIPHERALS + 0x1000)),
        Ok(RegionAttribute::NonSecureDevice)
    );
}

#[test]
fn addresses_beyond_4_gib_are_unsupported() {
    let memory = TestMemory::new(TABLES, 16);
    let mut alloc = memory.allocator();
    let mut regime = Armv7Regime::new(RecordingCpu::armv7(false));
    let map = [
        MemoryRegionDescriptor::identity(0, 0x0100_0000, RegionAttribute::WriteBack),
        MemoryRegionDescriptor::identity(0xFFFF_F000, 0x2000, RegionAttribute::Device),
    ];

    let err = configure(&mut regime, &mut alloc, &memory, &map).unwrap_err();
    assert_eq!(
        err,
        MmuError::Unsupported(UnsupportedError::AddressRange {
            max_address: 0x1_0000_0FFF
        })
    );
    assert_eq!(alloc.outstanding_pages(), 0);
    assert!(regime.into_inner().events.is_empty());
}
