use arm_mmu::{
    Aarch64, AddressSpaceConfig, BumpPageAllocator, MemoryRegionDescriptor, MmuError, ParameterError,
    PhysicalAddress, RegionAttribute, TranslationTables, VirtualAddress,
};

fn allocator() -> BumpPageAllocator {
    BumpPageAllocator::new(PhysicalAddress::new(0x4000_0000), PhysicalAddress::new(0x4010_0000))
}

fn tables(alloc: &mut BumpPageAllocator, max: u64) -> TranslationTables<Aarch64> {
    TranslationTables::new(alloc, AddressSpaceConfig::for_max_address(max)).unwrap()
}

#[test]
fn splitting_a_block_keeps_the_rest_of_it() {
    let mut alloc = allocator();
    let mut tables = tables(&mut alloc, 0xFFFF_FFFF);

    tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0, 0x20_0000, RegionAttribute::WriteBack))
        .unwrap();
    assert_eq!(tables.translate(VirtualAddress::new(0)).unwrap().level, 2);

    tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0x1_0000, 0x1_0000, RegionAttribute::Device))
        .unwrap();

    for page in 0..512u64 {
        let va = VirtualAddress::new(page * 0x1000);
        let t = tables.translate(va).unwrap();
        assert_eq!(t.level, 3);
        assert_eq!(t.physical, PhysicalAddress::new(page * 0x1000));
        let expected = if (16..32).contains(&page) {
            RegionAttribute::Device
        } else {
            RegionAttribute::WriteBack
        };
        assert_eq!(tables.region_attribute_at(va), Ok(expected), "page {page}");
    }
}

#[test]
fn secure_region_carved_from_a_non_secure_block_stays_secure() {
    let mut alloc = allocator();
    let mut tables = tables(&mut alloc, 0xFFFF_FFFF);

    tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0, 0x20_0000, RegionAttribute::NonSecureWriteBack))
        .unwrap();
    tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0x1_0000, 0x1_0000, RegionAttribute::Device))
        .unwrap();

    let t = tables.translate(VirtualAddress::new(0x1_0000)).unwrap();
    assert!(!t.inherited.non_secure);
    assert_eq!(
        tables.region_attribute_at(VirtualAddress::new(0x1_0000)),
        Ok(RegionAttribute::Device)
    );
    for va in [0, 0xF000, 0x2_0000, 0x1F_F000] {
        assert_eq!(
            tables.region_attribute_at(VirtualAddress::new(va)),
            Ok(RegionAttribute::NonSecureWriteBack),
            "{va:#x}"
        );
    }
}

#[test]
fn split_keeps_a_non_identity_output_address() {
    let mut alloc = allocator();
    let mut tables = tables(&mut alloc, 0xFFFF_FFFF);

    let region = MemoryRegionDescriptor::new(
        PhysicalAddress::new(0x8000_0000),
        VirtualAddress::new(0x4000_0000),
        0x4000_0000,
        RegionAttribute::NonSecureWriteBack,
    );
    tables.fill(&mut alloc, &region).unwrap();
    tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0x4020_0000, 0x1000, RegionAttribute::Uncached))
        .unwrap();

    let t = tables.translate(VirtualAddress::new(0x4020_1000)).unwrap();
    assert_eq!((t.level, t.physical), (3, PhysicalAddress::new(0x8020_1000)));
    assert_eq!(
        tables.region_attribute_at(VirtualAddress::new(0x4020_1000)),
        Ok(RegionAttribute::NonSecureWriteBack)
    );
    let t = tables.translate(VirtualAddress::new(0x7FE0_0000)).unwrap();
    assert_eq!((t.level, t.physical), (2, PhysicalAddress::new(0xBFE0_0000)));
    assert_eq!(
        tables.translate(VirtualAddress::new(0x4020_0000)).unwrap().physical,
        PhysicalAddress::new(0x4020_0000)
    );
}

#[test]
fn filling_twice_changes_nothing() {
    let mut alloc = allocator();
    let mut tables = tables(&mut alloc, 0xFFFF_FFFF);
    let map = [
        MemoryRegionDescriptor::identity(0x0800_0000, 0x2_0000, RegionAttribute::Device),
        MemoryRegionDescriptor::identity(0x4000_0000, 0x4000_0000, RegionAttribute::WriteBack),
        MemoryRegionDescriptor::identity(0x4000_3000, 0x5000, RegionAttribute::WriteThrough),
    ];
    for region in &map {
        tables.fill(&mut alloc, region).unwrap();
    }
    let first: Vec<Vec<u64>> = tables.iter().map(|t| t.entries().to_vec()).collect();
    let pages = alloc.outstanding_pages();

    for region in &map {
        tables.fill(&mut alloc, region).unwrap();
    }
    let second: Vec<Vec<u64>> = tables.iter().map(|t| t.entries().to_vec()).collect();
    assert_eq!(first, second);
    assert_eq!(alloc.outstanding_pages(), pages);
}

#[test]
fn region_ending_at_the_root_boundary_is_mapped() {
    let mut alloc = allocator();
    // 4 GiB space: root level 1 with four entries.
    let mut tables = tables(&mut alloc, 0xFFFF_FFFF);
    tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0xFFFF_F000, 0x1000, RegionAttribute::Uncached))
        .unwrap();
    let t = tables.translate(VirtualAddress::new(0xFFFF_F000)).unwrap();
    assert_eq!(t.physical, PhysicalAddress::new(0xFFFF_F000));

    let err = tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0x1_0000_0000, 0x1000, RegionAttribute::Uncached))
        .unwrap_err();
    assert!(matches!(
        err,
        MmuError::InvalidParameter(ParameterError::OutsideRootTable { entries: 4, .. })
    ));
}

#[test]
fn smallest_address_space_uses_level_2_root() {
    let mut alloc = allocator();
    let mut tables = tables(&mut alloc, 0x1F_FFFF);
    assert_eq!(tables.config().root_level, 2);
    assert_eq!(tables.config().root_entry_count, 16);

    tables
        .fill(&mut alloc, &MemoryRegionDescriptor::identity(0, 0x20_0000, RegionAttribute::WriteBack))
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables.translate(VirtualAddress::new(0x1F_F000)).unwrap().level, 2);
}

#[test]
fn malformed_regions_are_rejected_before_any_change() {
    let mut alloc = allocator();
    let mut tables = tables(&mut alloc, 0xFFFF_FFFF);
    for region in [
        MemoryRegionDescriptor::identity(0x1000, 0, RegionAttribute::WriteBack),
        MemoryRegionDescriptor::identity(0x1000, 0x1800, RegionAttribute::WriteBack),
        MemoryRegionDescriptor::identity(0x1800, 0x1000, RegionAttribute::WriteBack),
        MemoryRegionDescriptor::identity(u64::MAX & !0xFFF, 0x2000, RegionAttribute::WriteBack),
    ] {
        assert!(matches!(
            tables.fill(&mut alloc, &region),
            Err(MmuError::InvalidParameter(_))
        ));
    }
    assert_eq!(tables.len(), 1);
    assert!(tables.iter().all(|t| t.valid_entries() == 0));
}
