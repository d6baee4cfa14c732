//! 配置检查命令

use anyhow::Result;
use clap::Args;
use odrive_driver::{OdriveSystem, SystemConfig};

/// 配置检查参数
#[derive(Args, Debug, Default)]
pub struct CheckCommand {}

impl CheckCommand {
    pub fn execute(&self, config: SystemConfig) -> Result<()> {
        let system = OdriveSystem::on_init(config)?;
        print!("{}", summary(&system));
        Ok(())
    }
}

fn summary(system: &OdriveSystem) -> String {
    let config = system.config();
    let mut out = format!(
        "Config OK: interface '{}', {} axes\n",
        config.can,
        config.axes.len()
    );
    for axis in &config.axes {
        out.push_str(&format!(
            "  {:<16} node {:>2}  gear {:>8.3}  reversed {}\n",
            axis.name, axis.node_id, axis.gear_ratio, axis.reversed
        ));
    }
    out.push_str("Interfaces:\n");
    for interface in system.export_command_interfaces() {
        out.push_str(&format!("  {}\n", interface));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use odrive_driver::AxisConfig;

    #[test]
    fn test_summary_lists_axes_and_interfaces() {
        let system = OdriveSystem::on_init(SystemConfig {
            can: "can0".to_string(),
            axes: vec![AxisConfig::new("wheel", 3).with_gear_ratio(2.0)],
        })
        .unwrap();

        let text = summary(&system);
        assert!(text.contains("interface 'can0', 1 axes"));
        assert!(text.contains("wheel"));
        assert!(text.contains("wheel/effort"));
        assert!(text.contains("wheel/position"));
    }
}
