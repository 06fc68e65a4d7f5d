//! # Assembly
//!
//! Builds the resolved [`ProvisioningModel`] from the spec's files and units.

use super::content::resolve_file_content;
use crate::cloudinit::{self, ProvisioningModel};
use crate::constants::DEFAULT_FILE_PERMISSIONS;
use crate::crd::{File, Unit, UnitCommand};
use crate::error::{Error, Result};
use crate::store::SecretStore;

/// Resolve files and units into the intermediate model, preserving order
///
/// Stops at the first file whose content cannot be resolved. Unit content and
/// drop-ins are literal and carried through unchanged.
///
/// # Errors
///
/// [`Error::FileContent`] wrapping the resolution error of the failing file.
pub async fn assemble(
    store: &dyn SecretStore,
    namespace: &str,
    files: &[File],
    units: &[Unit],
) -> Result<ProvisioningModel> {
    let mut resolved = Vec::with_capacity(files.len());
    for file in files {
        let content = resolve_file_content(store, namespace, &file.content)
            .await
            .map_err(|source| Error::FileContent {
                path: file.path.clone(),
                source: Box::new(source),
            })?;

        resolved.push(cloudinit::File {
            path: file.path.clone(),
            content,
            permissions: file.permissions.unwrap_or(DEFAULT_FILE_PERMISSIONS),
        });
    }

    Ok(ProvisioningModel {
        files: resolved,
        units: units.iter().map(unit_model).collect(),
    })
}

fn unit_model(unit: &Unit) -> cloudinit::Unit {
    cloudinit::Unit {
        name: unit.name.clone(),
        content: unit.content.as_ref().map(|c| c.as_bytes().to_vec()),
        drop_ins: unit
            .drop_ins
            .iter()
            .map(|d| cloudinit::DropIn {
                name: d.name.clone(),
                content: d.content.as_bytes().to_vec(),
            })
            .collect(),
        enable: unit.enable.unwrap_or(true),
        command: unit
            .command
            .unwrap_or(UnitCommand::Restart)
            .as_str()
            .to_string(),
    }
}
