//! Xilinx design constraints (XDC) emission.
//!
//! Produces the pad placement, electrical and timing constraints for the
//! bindings requested during elaboration. Top-level ports are named after the
//! binding: `name` for index 0, `name{index}` otherwise, with `_{subsignal}`
//! appended for grouped bindings and `[bit]` for buses.

use std::fmt::Write;

use crate::io::{IoStandard, Misc, PinBinding, Pins};
use crate::timing::TimingConstraints;

/// Top-level port name of a binding.
pub fn port_name(binding: &PinBinding) -> String {
    if binding.index == 0 {
        binding.name.clone()
    } else {
        format!("{}{}", binding.name, binding.index)
    }
}

/// Top-level port name of one subsignal of a binding.
pub fn subsignal_port_name(binding: &PinBinding, subsignal: &str) -> String {
    format!("{}_{subsignal}", port_name(binding))
}

fn emit_port(
    out: &mut String,
    port: &str,
    pins: &Pins,
    iostandard: Option<&IoStandard>,
    misc: &[&Misc],
) {
    let bus = pins.len() > 1;
    for (bit, pad) in pins.iter().enumerate() {
        let target = if bus {
            format!("{{{port}[{bit}]}}")
        } else {
            port.to_string()
        };
        let _ = writeln!(out, "set_property LOC {pad} [get_ports {target}]");
        if let Some(std) = iostandard {
            let _ = writeln!(out, "set_property IOSTANDARD {std} [get_ports {target}]");
        }
        for m in misc {
            let (key, value) = m.xdc_property();
            if value.is_empty() {
                let _ = writeln!(out, "set_property {key} TRUE [get_ports {target}]");
            } else {
                let _ = writeln!(out, "set_property {key} {value} [get_ports {target}]");
            }
        }
    }
}

/// Emit an XDC file for the requested bindings and registered timing constraints.
pub fn emit_xdc(requested: &[PinBinding], timing: &TimingConstraints) -> String {
    let mut out = String::new();

    out.push_str("################################################################################\n");
    out.push_str("# IO constraints\n");
    out.push_str("################################################################################\n");

    for binding in requested {
        let _ = writeln!(out, "\n## {}", binding.label());
        let binding_misc: Vec<&Misc> = binding.misc.iter().collect();
        if let Some(pins) = &binding.pins {
            emit_port(
                &mut out,
                &port_name(binding),
                pins,
                binding.iostandard.as_ref(),
                &binding_misc,
            );
        }
        for sub in &binding.subsignals {
            let iostandard = sub.iostandard.as_ref().or(binding.iostandard.as_ref());
            // Subsignal attributes override binding attributes with the same key.
            let mut misc: Vec<&Misc> = binding_misc
                .iter()
                .copied()
                .filter(|m| sub.misc.iter().all(|s| s.key() != m.key()))
                .collect();
            misc.extend(sub.misc.iter());
            emit_port(
                &mut out,
                &subsignal_port_name(binding, &sub.name),
                &sub.pins,
                iostandard,
                &misc,
            );
        }
    }

    out.push_str("\n################################################################################\n");
    out.push_str("# Design constraints\n");
    out.push_str("################################################################################\n\n");

    for period in &timing.periods {
        let kind = if period.is_port { "get_ports" } else { "get_nets" };
        let _ = writeln!(
            out,
            "create_clock -name {} -period {:.3} [{kind} {}]",
            period.clock, period.period_ns, period.target
        );
    }

    for fp in &timing.false_paths {
        let _ = writeln!(
            out,
            "set_clock_groups -group [get_clocks -include_generated_clocks -of [get_nets {}]] \
             -group [get_clocks -include_generated_clocks -of [get_nets {}]] -asynchronous",
            fp.from, fp.to
        );
    }

    out.push_str("\n################################################################################\n");
    out.push_str("# False path constraints\n");
    out.push_str("################################################################################\n\n");
    out.push_str(
        "set_false_path -quiet -through [get_nets -hierarchical -filter {mr_ff == TRUE}]\n",
    );
    out.push_str(
        "set_false_path -quiet -to [get_pins -filter {REF_PIN_NAME == PRE} \
         -of_objects [get_cells -hierarchical -filter {ars_ff1 == TRUE || ars_ff2 == TRUE}]]\n",
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Subsignal;
    use crate::timing::PeriodConstraint;

    fn lvcmos(b: PinBinding) -> PinBinding {
        b.with_iostandard(IoStandard::lvcmos33())
    }

    #[test]
    fn single_pad_binding() {
        let xdc = emit_xdc(
            &[lvcmos(PinBinding::pins("clk25", 0, "W19"))],
            &TimingConstraints::default(),
        );
        assert!(xdc.contains("set_property LOC W19 [get_ports clk25]"));
        assert!(xdc.contains("set_property IOSTANDARD LVCMOS33 [get_ports clk25]"));
    }

    #[test]
    fn bus_bits_and_index_suffix() {
        let eth = lvcmos(PinBinding::subsignals(
            "eth",
            1,
            vec![Subsignal::new("rx_data", "AB1 AB2 Y3 AB3")],
        ));
        let xdc = emit_xdc(&[eth], &TimingConstraints::default());
        assert!(xdc.contains("set_property LOC AB1 [get_ports {eth1_rx_data[0]}]"));
        assert!(xdc.contains("set_property LOC AB3 [get_ports {eth1_rx_data[3]}]"));
    }

    #[test]
    fn misc_attributes_and_override() {
        let sdcard = lvcmos(PinBinding::subsignals(
            "sdcard",
            0,
            vec![
                Subsignal::new("cmd", "R4").with_misc("PULLUP True"),
                Subsignal::new("clk", "N5").with_misc("SLEW=SLOW"),
            ],
        ))
        .with_misc("SLEW=FAST");
        let xdc = emit_xdc(&[sdcard], &TimingConstraints::default());
        assert!(xdc.contains("set_property PULLUP TRUE [get_ports sdcard_cmd]"));
        assert!(xdc.contains("set_property SLEW FAST [get_ports sdcard_cmd]"));
        assert!(xdc.contains("set_property SLEW SLOW [get_ports sdcard_clk]"));
        assert!(!xdc.contains("set_property SLEW FAST [get_ports sdcard_clk]"));
    }

    #[test]
    fn timing_section() {
        let mut timing = TimingConstraints::default();
        timing.add_period(PeriodConstraint {
            clock: "clk25".into(),
            target: "clk25".into(),
            is_port: true,
            period_ns: 40.0,
        });
        timing.add_period(PeriodConstraint {
            clock: "eth_rx_clk".into(),
            target: "eth_rx_clk".into(),
            is_port: false,
            period_ns: 8.0,
        });
        timing.add_false_path("sys_clk", "clk25");
        let xdc = emit_xdc(&[], &timing);
        assert!(xdc.contains("create_clock -name clk25 -period 40.000 [get_ports clk25]"));
        assert!(xdc.contains("create_clock -name eth_rx_clk -period 8.000 [get_nets eth_rx_clk]"));
        assert!(xdc.contains("[get_nets sys_clk]] -group"));
        assert!(xdc.contains("-of [get_nets clk25]] -asynchronous"));
        assert!(xdc.contains("set_false_path -quiet"));
    }
}
