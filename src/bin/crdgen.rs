//! Print the CustomResourceDefinitions served by this controller as YAML.

use kube::CustomResourceExt;
use os_config_controller::crd::{Infrastructure, OperatingSystemConfig};

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&OperatingSystemConfig::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&Infrastructure::crd())?);
    Ok(())
}
