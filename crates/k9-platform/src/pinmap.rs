//! Validated, immutable pin map.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};
use crate::io::PinBinding;

/// The table of all pin bindings of a board.
///
/// Built once with [`PinMap::new`], which enforces:
/// - no `(name, index)` pair is declared twice among active bindings
/// - no active binding is empty
/// - no physical pad belongs to two active bindings, unless both declare the
///   same alternate group
///
/// Disabled bindings stay in the table for documentation but are never
/// returned by lookups and do not take part in the pad check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PinBinding>", into = "Vec<PinBinding>")]
pub struct PinMap {
    bindings: Vec<PinBinding>,
}

impl PinMap {
    /// Validate and build the pin map.
    pub fn new(bindings: Vec<PinBinding>) -> Result<Self> {
        let mut keys: HashSet<(&str, u32)> = HashSet::new();
        let mut owners: HashMap<&str, &PinBinding> = HashMap::new();

        for b in bindings.iter().filter(|b| b.is_active()) {
            if !keys.insert((b.name.as_str(), b.index)) {
                return Err(PlatformError::DuplicateBinding {
                    name: b.name.clone(),
                    index: b.index,
                });
            }

            let pads = b.pads();
            if pads.is_empty() {
                return Err(PlatformError::EmptyBinding {
                    name: b.name.clone(),
                    index: b.index,
                });
            }

            for (i, pad) in pads.iter().enumerate() {
                if pads[..i].contains(pad) {
                    return Err(PlatformError::PadConflict {
                        pad: pad.to_string(),
                        first: b.label(),
                        second: b.label(),
                    });
                }
                if let Some(owner) = owners.get(pad) {
                    let shared_group = match (&owner.alternate_group, &b.alternate_group) {
                        (Some(a), Some(c)) => a == c,
                        _ => false,
                    };
                    if !shared_group {
                        return Err(PlatformError::PadConflict {
                            pad: pad.to_string(),
                            first: owner.label(),
                            second: b.label(),
                        });
                    }
                } else {
                    owners.insert(*pad, b);
                }
            }
        }

        Ok(Self { bindings })
    }

    /// All declared bindings, including disabled ones, in declaration order.
    pub fn bindings(&self) -> &[PinBinding] {
        &self.bindings
    }

    /// Active bindings in declaration order.
    pub fn active(&self) -> impl Iterator<Item = &PinBinding> {
        self.bindings.iter().filter(|b| b.is_active())
    }

    /// Look up an active binding by name and index.
    pub fn lookup(&self, name: &str, index: u32) -> Result<&PinBinding> {
        if let Some(b) = self
            .active()
            .find(|b| b.name == name && b.index == index)
        {
            return Ok(b);
        }
        match self
            .bindings
            .iter()
            .find(|b| b.name == name && b.index == index)
        {
            Some(disabled) => Err(PlatformError::BindingDisabled {
                name: name.to_string(),
                index,
                reason: disabled.disabled.clone().unwrap_or_default(),
            }),
            None => Err(PlatformError::BindingNotFound {
                name: name.to_string(),
                index,
            }),
        }
    }

    /// Every active binding with the given name, ordered by index.
    pub fn lookup_all(&self, name: &str) -> Vec<&PinBinding> {
        let mut found: Vec<&PinBinding> = self.active().filter(|b| b.name == name).collect();
        found.sort_by_key(|b| b.index);
        found
    }

    /// Whether any active binding carries this name.
    pub fn contains(&self, name: &str) -> bool {
        self.active().any(|b| b.name == name)
    }

    /// Active bindings that use the given pad.
    pub fn owners_of(&self, pad: &str) -> Vec<&PinBinding> {
        self.active().filter(|b| b.pads().contains(&pad)).collect()
    }

    /// Pad utilization: every pad used by an active binding, with its owners.
    pub fn pads(&self) -> BTreeMap<&str, Vec<&PinBinding>> {
        let mut map: BTreeMap<&str, Vec<&PinBinding>> = BTreeMap::new();
        for b in self.active() {
            for pad in b.pads() {
                map.entry(pad).or_default().push(b);
            }
        }
        map
    }
}

impl TryFrom<Vec<PinBinding>> for PinMap {
    type Error = PlatformError;

    fn try_from(bindings: Vec<PinBinding>) -> Result<Self> {
        PinMap::new(bindings)
    }
}

impl From<PinMap> for Vec<PinBinding> {
    fn from(map: PinMap) -> Self {
        map.bindings
    }
}
