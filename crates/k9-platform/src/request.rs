//! Pin request tracking for a single elaboration.

use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::io::PinBinding;
use crate::pinmap::PinMap;

/// Records which bindings have been handed out to peripherals.
///
/// A binding can be requested once. Members of an alternate group exclude
/// each other, so the requested set never shares a physical pad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinRequests {
    requested: Vec<PinBinding>,
}

impl PinRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one binding.
    pub fn request(&mut self, map: &PinMap, name: &str, index: u32) -> Result<PinBinding> {
        let binding = map.lookup(name, index)?;

        if self.is_requested(name, index) {
            return Err(PlatformError::AlreadyRequested {
                name: name.to_string(),
                index,
            });
        }

        if let Some(group) = &binding.alternate_group {
            if let Some(other) = self
                .requested
                .iter()
                .find(|r| r.alternate_group.as_ref() == Some(group))
            {
                return Err(PlatformError::AlternateConflict {
                    name: name.to_string(),
                    index,
                    group: group.clone(),
                    other: other.label(),
                });
            }
        }

        debug!("requested {} ({} pads)", binding.label(), binding.width());
        self.requested.push(binding.clone());
        Ok(binding.clone())
    }

    /// Request every active binding with the given name.
    pub fn request_all(&mut self, map: &PinMap, name: &str) -> Result<Vec<PinBinding>> {
        let indices: Vec<u32> = map.lookup_all(name).iter().map(|b| b.index).collect();
        if indices.is_empty() {
            return Err(PlatformError::BindingNotFound {
                name: name.to_string(),
                index: 0,
            });
        }
        indices
            .into_iter()
            .map(|index| self.request(map, name, index))
            .collect()
    }

    /// A previously requested binding. With `loose`, absence is not an error.
    pub fn lookup_request(&self, name: &str, index: u32, loose: bool) -> Result<Option<&PinBinding>> {
        match self
            .requested
            .iter()
            .find(|r| r.name == name && r.index == index)
        {
            Some(r) => Ok(Some(r)),
            None if loose => Ok(None),
            None => Err(PlatformError::BindingNotFound {
                name: name.to_string(),
                index,
            }),
        }
    }

    pub fn is_requested(&self, name: &str, index: u32) -> bool {
        self.requested
            .iter()
            .any(|r| r.name == name && r.index == index)
    }

    /// Requested bindings in request order.
    pub fn requested(&self) -> &[PinBinding] {
        &self.requested
    }

    /// The first pad shared by two requested bindings, if any.
    pub fn shared_pad(&self) -> Option<(String, String, String)> {
        let mut seen: Vec<(&str, String)> = Vec::new();
        for r in &self.requested {
            for pad in r.pads() {
                if let Some((_, owner)) = seen.iter().find(|(p, _)| *p == pad) {
                    return Some((pad.to_string(), owner.clone(), r.label()));
                }
                seen.push((pad, r.label()));
            }
        }
        None
    }
}
