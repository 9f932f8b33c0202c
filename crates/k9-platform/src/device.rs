//! FPGA device model.
//!
//! A device is identified by its full Xilinx part string, e.g.
//! `xc7a50tfgg484-1`: family prefix (`xc7a`), logic size (`50t`), package
//! (`fgg484`) and speed grade (`-1`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// 7-series device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    Artix7,
    Kintex7,
    Spartan7,
    Zynq7,
}

impl Family {
    fn from_prefix(part: &str) -> Option<(Self, &'static str)> {
        [
            (Family::Artix7, "xc7a"),
            (Family::Kintex7, "xc7k"),
            (Family::Spartan7, "xc7s"),
            (Family::Zynq7, "xc7z"),
        ]
        .into_iter()
        .find(|(_, prefix)| part.starts_with(prefix))
    }

    /// Database directory name used by the open-source flow.
    pub fn db_name(self) -> &'static str {
        match self {
            Family::Artix7 => "artix7",
            Family::Kintex7 => "kintex7",
            Family::Spartan7 => "spartan7",
            Family::Zynq7 => "zynq7",
        }
    }
}

/// A concrete FPGA part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Device {
    part: String,
    family: Family,
    package: String,
    speedgrade: i8,
}

impl Device {
    /// The full part string as passed to vendor tools.
    pub fn part(&self) -> &str {
        &self.part
    }

    /// The part string without the speed grade (e.g., `xc7a50tfgg484`).
    pub fn part_without_speedgrade(&self) -> &str {
        self.part
            .rsplit_once('-')
            .map(|(base, _)| base)
            .unwrap_or(&self.part)
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Speed grade as a negative number (-1, -2, -3).
    pub fn speedgrade(&self) -> i8 {
        self.speedgrade
    }
}

impl FromStr for Device {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let part = s.trim().to_ascii_lowercase();
        let unknown = |detail: &str| PlatformError::UnknownDevice {
            part: part.clone(),
            detail: detail.to_string(),
        };

        let (family, prefix) =
            Family::from_prefix(&part).ok_or_else(|| unknown("not a 7-series part"))?;

        let (base, grade) = part
            .rsplit_once('-')
            .ok_or_else(|| unknown("missing speed grade"))?;
        let grade_digit = grade
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| unknown("speed grade is not numeric"))?;
        if !(1..=3).contains(&grade_digit) {
            return Err(unknown("speed grade must be 1, 2 or 3"));
        }

        // Skip the logic size (digits plus an optional 't') to reach the package.
        let rest = &base[prefix.len()..];
        let size_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if size_len == 0 {
            return Err(unknown("missing device size"));
        }
        let package = rest[size_len..].trim_start_matches('t').to_string();
        if package.is_empty() {
            return Err(unknown("missing package"));
        }

        Ok(Self {
            part: part.clone(),
            family,
            package,
            speedgrade: -(grade_digit as i8),
        })
    }
}

impl TryFrom<String> for Device {
    type Error = PlatformError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Device> for String {
    fn from(d: Device) -> Self {
        d.part
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_k9plus_part() {
        let d: Device = "xc7a50tfgg484-1".parse().unwrap();
        assert_eq!(d.family(), Family::Artix7);
        assert_eq!(d.package(), "fgg484");
        assert_eq!(d.speedgrade(), -1);
        assert_eq!(d.part_without_speedgrade(), "xc7a50tfgg484");
    }

    #[test]
    fn parse_other_families() {
        let d: Device = "XC7K325TFFG900-2".parse().unwrap();
        assert_eq!(d.family(), Family::Kintex7);
        assert_eq!(d.speedgrade(), -2);
        assert_eq!(d.part(), "xc7k325tffg900-2");

        let d: Device = "xc7s50csga324-1".parse().unwrap();
        assert_eq!(d.family(), Family::Spartan7);
    }

    #[test]
    fn reject_unknown_parts() {
        assert!("lfe5u-45f-6bg381c".parse::<Device>().is_err());
        assert!("xc7a50tfgg484".parse::<Device>().is_err());
        assert!("xc7a50tfgg484-9".parse::<Device>().is_err());
        assert!("xc7afgg484-1".parse::<Device>().is_err());
    }
}
