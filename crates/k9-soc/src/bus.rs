//! Address space and resource registrar.
//!
//! Tracks the memory regions on the system bus, the CSR pages, the interrupt
//! lines and the extra bus masters. Every namespace is unique, regions never
//! overlap, and the order of registration is kept so that the generated map
//! is stable from one build to the next.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ElaborationError, Result};

/// Default origins of the well-known regions.
pub const MEM_MAP: &[(&str, u64)] = &[
    ("rom", 0x0000_0000),
    ("sram", 0x1000_0000),
    ("spiflash", 0x2000_0000),
    ("main_ram", 0x4000_0000),
    ("ethmac", 0x8000_0000),
    ("csr", 0xf000_0000),
];

/// Bytes per CSR page.
pub const CSR_PAGING: u64 = 0x800;
/// Size of the CSR region.
pub const CSR_REGION_SIZE: u64 = 0x1_0000;
/// Interrupt lines of the CPU.
pub const MAX_IRQS: u32 = 32;
/// Size of the 32-bit system bus address space.
pub const ADDRESS_SPACE: u64 = 1 << 32;

/// Default origin of a well-known region.
pub fn mem_map_origin(name: &str) -> Option<u64> {
    MEM_MAP.iter().find(|(n, _)| *n == name).map(|(_, o)| *o)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Cached memory.
    Cached,
    /// Uncached IO space.
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: String,
    pub origin: u64,
    pub size: u64,
    pub kind: RegionKind,
    pub read_only: bool,
}

impl Region {
    /// One past the last byte of the region.
    pub fn end(&self) -> u64 {
        self.origin.saturating_add(self.size)
    }

    /// Last byte of the region, or the origin for an empty one.
    pub fn last(&self) -> u64 {
        self.end().saturating_sub(1).max(self.origin)
    }

    fn overlaps(&self, other: &Region) -> bool {
        self.origin < other.end() && other.origin < self.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrPage {
    pub name: String,
    pub index: u32,
    pub address: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Irq {
    pub name: String,
    pub number: u32,
}

/// A bus master other than the CPU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusMaster {
    pub name: String,
    pub detail: String,
}

/// The SoC's shared address space and resource map.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BusMap {
    regions: Vec<Region>,
    csrs: Vec<CsrPage>,
    irqs: Vec<Irq>,
    masters: Vec<BusMaster>,
}

impl BusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region. Its origin must be aligned to its size rounded up to a
    /// power of two.
    pub fn add_region(
        &mut self,
        name: &str,
        origin: u64,
        size: u64,
        kind: RegionKind,
        read_only: bool,
    ) -> Result<&Region> {
        if self.region(name).is_some() {
            return Err(ElaborationError::DuplicateName {
                kind: "region",
                name: name.to_string(),
            });
        }
        match origin.checked_add(size) {
            Some(end) if end <= ADDRESS_SPACE => {}
            _ => {
                return Err(ElaborationError::Exhausted {
                    kind: "address space",
                    name: name.to_string(),
                })
            }
        }
        let alignment = size.max(1).checked_next_power_of_two();
        if alignment.map_or(true, |a| origin % a != 0) {
            return Err(ElaborationError::RegionAlignment {
                name: name.to_string(),
                origin,
                size,
            });
        }
        let region = Region {
            name: name.to_string(),
            origin,
            size,
            kind,
            read_only,
        };
        if let Some(other) = self.regions.iter().find(|r| r.overlaps(&region)) {
            return Err(ElaborationError::RegionOverlap {
                name: name.to_string(),
                other: other.name.clone(),
            });
        }
        debug!("region {name}: {origin:#010x} + {size:#x}");
        self.regions.push(region);
        Ok(&self.regions[self.regions.len() - 1])
    }

    /// Add a well-known region at its default origin.
    pub fn add_default_region(
        &mut self,
        name: &str,
        size: u64,
        kind: RegionKind,
        read_only: bool,
    ) -> Result<&Region> {
        let origin = mem_map_origin(name).ok_or_else(|| ElaborationError::Exhausted {
            kind: "default origin",
            name: name.to_string(),
        })?;
        self.add_region(name, origin, size, kind, read_only)
    }

    /// Allocate the next CSR page. Requires the `csr` region.
    pub fn add_csr(&mut self, name: &str) -> Result<u64> {
        if self.csr(name).is_some() {
            return Err(ElaborationError::DuplicateName {
                kind: "CSR",
                name: name.to_string(),
            });
        }
        let csr_region = self.region("csr").ok_or_else(|| ElaborationError::Exhausted {
            kind: "CSR region",
            name: name.to_string(),
        })?;
        let index = self.csrs.len() as u32;
        let offset = index as u64 * CSR_PAGING;
        if offset + CSR_PAGING > csr_region.size {
            return Err(ElaborationError::Exhausted {
                kind: "CSR page",
                name: name.to_string(),
            });
        }
        let address = csr_region.origin + offset;
        debug!("csr {name}: page {index} at {address:#010x}");
        self.csrs.push(CsrPage {
            name: name.to_string(),
            index,
            address,
        });
        Ok(address)
    }

    /// Allocate the next interrupt line.
    pub fn add_irq(&mut self, name: &str) -> Result<u32> {
        if self.irq(name).is_some() {
            return Err(ElaborationError::DuplicateName {
                kind: "IRQ",
                name: name.to_string(),
            });
        }
        let number = self.irqs.len() as u32;
        if number >= MAX_IRQS {
            return Err(ElaborationError::Exhausted {
                kind: "IRQ",
                name: name.to_string(),
            });
        }
        self.irqs.push(Irq {
            name: name.to_string(),
            number,
        });
        Ok(number)
    }

    pub fn add_master(&mut self, name: &str, detail: impl Into<String>) -> Result<()> {
        if self.masters.iter().any(|m| m.name == name) {
            return Err(ElaborationError::DuplicateName {
                kind: "bus master",
                name: name.to_string(),
            });
        }
        self.masters.push(BusMaster {
            name: name.to_string(),
            detail: detail.into(),
        });
        Ok(())
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn csr(&self, name: &str) -> Option<&CsrPage> {
        self.csrs.iter().find(|c| c.name == name)
    }

    pub fn irq(&self, name: &str) -> Option<&Irq> {
        self.irqs.iter().find(|i| i.name == name)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn csrs(&self) -> &[CsrPage] {
        &self.csrs
    }

    pub fn irqs(&self) -> &[Irq] {
        &self.irqs
    }

    pub fn masters(&self) -> &[BusMaster] {
        &self.masters
    }

    /// The CSR map in the layout consumed by software tooling: `csr_bases`,
    /// `memories` and `constants`.
    pub fn csr_json(&self, constants: &BTreeMap<String, Value>) -> Value {
        let csr_bases: BTreeMap<&str, u64> = self
            .csrs
            .iter()
            .map(|c| (c.name.as_str(), c.address))
            .collect();
        let memories: BTreeMap<&str, Value> = self
            .regions
            .iter()
            .map(|r| {
                (
                    r.name.as_str(),
                    json!({
                        "base": r.origin,
                        "size": r.size,
                        "type": match r.kind {
                            RegionKind::Cached => "cached",
                            RegionKind::Io => "io",
                        },
                    }),
                )
            })
            .collect();
        let mut all_constants = constants.clone();
        for irq in &self.irqs {
            all_constants.insert(format!("{}_interrupt", irq.name), json!(irq.number));
        }
        json!({
            "csr_bases": csr_bases,
            "memories": memories,
            "constants": all_constants,
        })
    }
}

impl fmt::Display for BusMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Bus Regions ---")?;
        for r in &self.regions {
            writeln!(
                f,
                "  {:<10} {:#010x} - {:#010x} {:?}{}",
                r.name,
                r.origin,
                r.last(),
                r.kind,
                if r.read_only { " (ro)" } else { "" }
            )?;
        }
        writeln!(f, "--- CSRs ({}) ---", self.csrs.len())?;
        for c in &self.csrs {
            writeln!(f, "  {:>2} {:<24} {:#010x}", c.index, c.name, c.address)?;
        }
        if !self.irqs.is_empty() {
            writeln!(f, "--- IRQs ---")?;
            for i in &self.irqs {
                writeln!(f, "  {:>2} {}", i.number, i.name)?;
            }
        }
        if !self.masters.is_empty() {
            writeln!(f, "--- Bus Masters ---")?;
            for m in &self.masters {
                writeln!(f, "  {} ({})", m.name, m.detail)?;
            }
        }
        Ok(())
    }
}
