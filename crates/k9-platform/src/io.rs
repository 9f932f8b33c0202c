//! Pin binding model.
//!
//! A [`PinBinding`] ties a logical signal name and instance index to one or more
//! physical pads, either as a flat pad list (`clk25`) or as a group of named
//! [`Subsignal`]s (`eth` with `rx_data`, `tx_ctl`, ...). Electrical attributes
//! (IO standard, pull resistors, slew rate) may be set on the binding or on an
//! individual subsignal; subsignal attributes take precedence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Electrical IO standard of a pad (e.g., "LVCMOS33").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IoStandard(pub String);

impl IoStandard {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 3.3 V LVCMOS, used by every bank on the K9+.
    pub fn lvcmos33() -> Self {
        Self::new("LVCMOS33")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IoStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output slew rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slew {
    Fast,
    Slow,
}

/// A miscellaneous pad attribute.
///
/// Board files write these in the vendor string form (`"PULLUP True"`,
/// `"SLEW=FAST"`); the typed variants are recognized, anything else is kept
/// verbatim as [`Misc::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Misc {
    Pullup(bool),
    Pulldown(bool),
    Slew(Slew),
    Other { key: String, value: String },
}

impl Misc {
    /// Parse the vendor string form. `KEY=VALUE` and `KEY VALUE` are both accepted.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let (key, value) = match s.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => match s.split_once(char::is_whitespace) {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (s, ""),
            },
        };
        let upper_value = value.to_ascii_uppercase();
        match (key.to_ascii_uppercase().as_str(), upper_value.as_str()) {
            ("PULLUP", "TRUE") => Misc::Pullup(true),
            ("PULLUP", "FALSE") => Misc::Pullup(false),
            ("PULLDOWN", "TRUE") => Misc::Pulldown(true),
            ("PULLDOWN", "FALSE") => Misc::Pulldown(false),
            ("SLEW", "FAST") => Misc::Slew(Slew::Fast),
            ("SLEW", "SLOW") => Misc::Slew(Slew::Slow),
            _ => Misc::Other {
                key: key.to_string(),
                value: value.to_string(),
            },
        }
    }

    /// The `(property, value)` pair written into Xilinx constraints.
    pub fn xdc_property(&self) -> (String, String) {
        let flag = |b: bool| if b { "TRUE" } else { "FALSE" }.to_string();
        match self {
            Misc::Pullup(b) => ("PULLUP".into(), flag(*b)),
            Misc::Pulldown(b) => ("PULLDOWN".into(), flag(*b)),
            Misc::Slew(Slew::Fast) => ("SLEW".into(), "FAST".into()),
            Misc::Slew(Slew::Slow) => ("SLEW".into(), "SLOW".into()),
            Misc::Other { key, value } => (key.clone(), value.clone()),
        }
    }

    /// Property key as written in the board file.
    pub fn key(&self) -> String {
        self.xdc_property().0
    }
}

impl From<String> for Misc {
    fn from(s: String) -> Self {
        Misc::parse(&s)
    }
}

impl From<Misc> for String {
    fn from(m: Misc) -> Self {
        m.to_string()
    }
}

impl fmt::Display for Misc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (key, value) = self.xdc_property();
        if value.is_empty() {
            f.write_str(&key)
        } else {
            write!(f, "{key}={value}")
        }
    }
}

/// An ordered list of physical pads (package ball names).
///
/// Serialized as a single whitespace-separated string: `"P6 P5 T5 T4"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Pins(Vec<String>);

impl Pins {
    pub fn new(pads: &str) -> Self {
        Self(pads.split_whitespace().map(str::to_string).collect())
    }

    pub fn from_vec(pads: Vec<String>) -> Self {
        Self(pads)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<String> for Pins {
    fn from(s: String) -> Self {
        Pins::new(&s)
    }
}

impl From<Pins> for String {
    fn from(p: Pins) -> Self {
        p.0.join(" ")
    }
}

/// A named group of pads inside a binding (e.g., `rx_data` of `eth`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Subsignal {
    pub name: String,
    pub pins: Pins,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iostandard: Option<IoStandard>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub misc: Vec<Misc>,
}

impl Subsignal {
    pub fn new(name: impl Into<String>, pads: &str) -> Self {
        Self {
            name: name.into(),
            pins: Pins::new(pads),
            iostandard: None,
            misc: Vec::new(),
        }
    }

    pub fn with_misc(mut self, misc: &str) -> Self {
        self.misc.push(Misc::parse(misc));
        self
    }
}

/// A logical signal bound to physical pads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PinBinding {
    /// Logical signal name (e.g., "clk25", "sdram").
    pub name: String,
    /// Instance index (e.g., Ethernet port 0 or 1).
    pub index: u32,
    /// Flat pad list, for single-signal bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pins: Option<Pins>,
    /// Named subsignals, for grouped bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsignals: Vec<Subsignal>,
    /// Electrical standard applied to every pad unless overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iostandard: Option<IoStandard>,
    /// Attributes applied to every pad.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub misc: Vec<Misc>,
    /// Bindings in the same group are alternative views of the same wires;
    /// they may share pads but are never requested together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_group: Option<String>,
    /// Present when the binding is declared but deliberately unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,
}

impl PinBinding {
    /// A single-signal binding with a flat pad list.
    pub fn pins(name: impl Into<String>, index: u32, pads: &str) -> Self {
        Self {
            name: name.into(),
            index,
            pins: Some(Pins::new(pads)),
            subsignals: Vec::new(),
            iostandard: None,
            misc: Vec::new(),
            alternate_group: None,
            disabled: None,
        }
    }

    /// A grouped binding made of subsignals.
    pub fn subsignals(name: impl Into<String>, index: u32, subsignals: Vec<Subsignal>) -> Self {
        Self {
            name: name.into(),
            index,
            pins: None,
            subsignals,
            iostandard: None,
            misc: Vec::new(),
            alternate_group: None,
            disabled: None,
        }
    }

    pub fn with_iostandard(mut self, iostandard: IoStandard) -> Self {
        self.iostandard = Some(iostandard);
        self
    }

    pub fn with_misc(mut self, misc: &str) -> Self {
        self.misc.push(Misc::parse(misc));
        self
    }

    pub fn with_alternate_group(mut self, group: impl Into<String>) -> Self {
        self.alternate_group = Some(group.into());
        self
    }

    pub fn disabled_because(mut self, reason: impl Into<String>) -> Self {
        self.disabled = Some(reason.into());
        self
    }

    /// `name:index`, used in diagnostics.
    pub fn label(&self) -> String {
        format!("{}:{}", self.name, self.index)
    }

    pub fn is_active(&self) -> bool {
        self.disabled.is_none()
    }

    /// Every physical pad of the binding, subsignals in declaration order.
    pub fn pads(&self) -> Vec<&str> {
        let mut pads: Vec<&str> = self.pins.iter().flat_map(|p| p.iter()).collect();
        for sub in &self.subsignals {
            pads.extend(sub.pins.iter());
        }
        pads
    }

    pub fn subsignal(&self, name: &str) -> Option<&Subsignal> {
        self.subsignals.iter().find(|s| s.name == name)
    }

    /// Width in pads of a subsignal (0 if absent).
    pub fn subsignal_width(&self, name: &str) -> usize {
        self.subsignal(name).map(|s| s.pins.len()).unwrap_or(0)
    }

    /// Total number of pads.
    pub fn width(&self) -> usize {
        self.pads().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misc_parses_vendor_forms() {
        assert_eq!(Misc::parse("PULLUP True"), Misc::Pullup(true));
        assert_eq!(Misc::parse("PULLUP=TRUE"), Misc::Pullup(true));
        assert_eq!(Misc::parse("SLEW=FAST"), Misc::Slew(Slew::Fast));
        assert_eq!(
            Misc::parse("SLEWRATE=FAST"),
            Misc::Other {
                key: "SLEWRATE".into(),
                value: "FAST".into()
            }
        );
        assert_eq!(
            Misc::parse("DIFF_TERM"),
            Misc::Other {
                key: "DIFF_TERM".into(),
                value: String::new()
            }
        );
    }

    #[test]
    fn misc_display_round_trips() {
        for s in ["PULLUP True", "SLEW=SLOW", "IOB=TRUE", "DIFF_TERM"] {
            let m = Misc::parse(s);
            assert_eq!(Misc::parse(&m.to_string()), m);
        }
    }

    #[test]
    fn pins_split_on_whitespace() {
        let p = Pins::new("F14 D14 E14\n  E17 ");
        assert_eq!(p.len(), 4);
        assert_eq!(String::from(p), "F14 D14 E14 E17");
    }

    #[test]
    fn binding_pads_cover_subsignals() {
        let b = PinBinding::subsignals(
            "serial",
            0,
            vec![Subsignal::new("tx", "V17"), Subsignal::new("rx", "R16")],
        );
        assert_eq!(b.pads(), vec!["V17", "R16"]);
        assert_eq!(b.width(), 2);
        assert_eq!(b.subsignal_width("tx"), 1);
        assert_eq!(b.subsignal_width("cts"), 0);
        assert_eq!(b.label(), "serial:0");
    }

    #[test]
    fn disabled_binding_is_inactive() {
        let b = PinBinding::pins("user_led", 3, "V22").disabled_because("pad conflict");
        assert!(!b.is_active());
    }
}
