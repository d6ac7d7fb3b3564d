use crate::sim::{RegisterWrite, SimulatedCpu, SimulatedRam};
use arm_mmu::arm_registers::aarch64::ExceptionLevel;
use arm_mmu::hardware::aarch64::Aarch64Regime;
use arm_mmu::hardware::armv7::Armv7Regime;
use arm_mmu::{
    Architecture, MmuError, PhysicalAddress, RegionAttribute, TranslationRegime, VirtualAddress, active_regions,
    configure,
};
use fw_platform::{Platform, Profile};
use std::fmt;

/// One table of the finished arena.
#[derive(Debug, Clone)]
pub struct TableSummary {
    pub base: PhysicalAddress,
    pub level: u8,
    pub valid_entries: usize,
    pub entries: usize,
}

/// Where the first byte of a region ended up.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub virtual_base: VirtualAddress,
    pub physical: PhysicalAddress,
    pub level: u8,
    pub block_size: u64,
    pub attribute: Result<RegionAttribute, MmuError>,
}

/// Everything a configuration run produced.
#[derive(Debug, Clone)]
pub struct Report {
    pub platform: &'static str,
    pub architecture: &'static str,
    pub root: PhysicalAddress,
    pub root_level: u8,
    pub root_entries: usize,
    pub tables: Vec<TableSummary>,
    pub pages: usize,
    pub mappings: Vec<Mapping>,
    pub registers: Vec<RegisterWrite>,
    pub mmu_enabled: bool,
}

/// Configures `platform` against a simulated CPU at `el`.
///
/// `el` only matters for AArch64 platforms.
///
/// # Errors
/// Whatever [`configure`] rejects.
pub fn run(platform: &'static Platform, el: ExceptionLevel) -> Result<Report, MmuError> {
    let cpu = SimulatedCpu::new(el);
    match platform.profile {
        Profile::Aarch64 => plan(&mut Aarch64Regime::new(cpu), platform),
        Profile::Armv7 => plan(&mut Armv7Regime::new(cpu), platform),
    }
}

fn plan<R>(regime: &mut R, platform: &'static Platform) -> Result<Report, MmuError>
where
    R: TranslationRegime<Cpu = SimulatedCpu>,
{
    let ram = SimulatedRam::new(platform.table_pool_start, platform.table_pool_end);
    let mut alloc = platform.table_allocator();
    let mmu = configure(regime, &mut alloc, &ram, platform.memory_map)?;
    let tables = mmu.tables();
    let config = tables.config();

    let summaries = tables
        .iter()
        .map(|t| TableSummary {
            base: t.base(),
            level: t.level(),
            valid_entries: t.valid_entries(),
            entries: t.entries().len(),
        })
        .collect();

    let mappings = active_regions(platform.memory_map)
        .filter_map(|region| {
            let t = tables.translate(region.virtual_base)?;
            Some(Mapping {
                virtual_base: region.virtual_base,
                physical: t.physical,
                level: t.level,
                block_size: t.block_size,
                attribute: tables.region_attribute_at(region.virtual_base),
            })
        })
        .collect();

    let cpu = regime.cpu();
    Ok(Report {
        platform: platform.name,
        architecture: <R::Arch as Architecture>::NAME,
        root: mmu.root(),
        root_level: config.root_level,
        root_entries: config.root_entry_count,
        tables: summaries,
        pages: tables.pages(),
        mappings,
        registers: cpu.writes().to_vec(),
        mmu_enabled: cpu.mmu_enabled(),
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "platform  {} ({})", self.platform, self.architecture)?;
        writeln!(
            f,
            "root      {} level {} with {} entries",
            self.root, self.root_level, self.root_entries
        )?;
        writeln!(f, "tables    {} in {} pages", self.tables.len(), self.pages)?;
        for t in &self.tables {
            writeln!(
                f,
                "  {}  level {}  {:>4}/{:<4} valid",
                t.base, t.level, t.valid_entries, t.entries
            )?;
        }

        writeln!(f, "mappings")?;
        for m in &self.mappings {
            let attribute = match &m.attribute {
                Ok(a) => format!("{a:?}"),
                Err(e) => e.to_string(),
            };
            writeln!(
                f,
                "  {} -> {}  level {}  {:#x}  {attribute}",
                m.virtual_base, m.physical, m.level, m.block_size
            )?;
        }

        writeln!(f, "registers")?;
        for r in &self.registers {
            writeln!(f, "  {:<10} = {:#018x}", r.name, r.value)?;
        }
        writeln!(f, "mmu       {}", if self.mmu_enabled { "on" } else { "off" })
    }
}
