//! # Cloud-Init Generator
//!
//! Renders a [`ProvisioningModel`] into a `#cloud-config` document.
//!
//! Every file, unit file and drop-in becomes one `write_files` entry holding
//! base64 content, emitted in model order. Units are then activated through
//! `runcmd`. The generator never reorders or merges entries; resolving
//! duplicates is left to cloud-init on the machine.

use super::{encoding, ProvisioningModel, Unit};
use crate::error::{Error, Result};
use serde::Serialize;
use std::str::FromStr;

const HEADER: &str = "#cloud-config\n";

/// Highest permission value accepted (setuid/setgid/sticky + rwx for all)
const MAX_PERMISSIONS: u32 = 0o7777;

/// Permissions for unit files and drop-ins
const UNIT_FILE_PERMISSIONS: u32 = 0o644;

/// How a unit without main content but with drop-ins is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingUnitContent {
    /// Leave the unit file untouched, still write drop-ins and issue systemctl commands
    #[default]
    KeepUnit,
    /// Leave the unit out of the document entirely
    OmitUnit,
}

impl FromStr for MissingUnitContent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" | "keepunit" => Ok(MissingUnitContent::KeepUnit),
            "omit" | "omitunit" => Ok(MissingUnitContent::OmitUnit),
            other => Err(format!("unknown missing unit content policy {other:?}")),
        }
    }
}

#[derive(Debug, Serialize)]
struct Document {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    write_files: Vec<WriteFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    runcmd: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WriteFile {
    path: String,
    permissions: String,
    encoding: &'static str,
    content: String,
}

impl WriteFile {
    fn new(path: String, permissions: u32, content: &[u8]) -> Result<Self> {
        Ok(Self {
            permissions: format_permissions(&path, permissions)?,
            path,
            encoding: encoding::B64,
            content: encoding::encode(content),
        })
    }
}

/// Generator for cloud-init documents with units placed under a fixed path
#[derive(Debug, Clone)]
pub struct CloudInitGenerator {
    units_path: String,
    missing_unit_content: MissingUnitContent,
}

impl CloudInitGenerator {
    #[must_use]
    pub fn new(units_path: impl Into<String>) -> Self {
        Self {
            units_path: units_path.into(),
            missing_unit_content: MissingUnitContent::default(),
        }
    }

    #[must_use]
    pub fn with_missing_unit_content(mut self, policy: MissingUnitContent) -> Self {
        self.missing_unit_content = policy;
        self
    }

    #[must_use]
    pub fn units_path(&self) -> &str {
        &self.units_path
    }

    /// Units of `model` that end up in the document, in model order
    fn rendered_units<'a>(&self, model: &'a ProvisioningModel) -> Vec<&'a Unit> {
        model
            .units
            .iter()
            .filter(|unit| {
                unit.content.is_some()
                    || self.missing_unit_content == MissingUnitContent::KeepUnit
            })
            .collect()
    }

    /// Names of the units [`generate`](Self::generate) renders for `model`
    #[must_use]
    pub fn unit_names(&self, model: &ProvisioningModel) -> Vec<String> {
        self.rendered_units(model)
            .into_iter()
            .map(|unit| unit.name.clone())
            .collect()
    }

    /// Render the model into a cloud-init document
    ///
    /// Output is byte-identical for equal models and generator settings.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPermissions`] when a file's permissions exceed `0o7777`,
    /// [`Error::InvalidUnitName`] for unit or drop-in names that are not a
    /// single path component or cannot be quoted in `runcmd`,
    /// [`Error::Render`] if YAML serialization fails.
    pub fn generate(&self, model: &ProvisioningModel) -> Result<Vec<u8>> {
        let mut write_files = Vec::with_capacity(model.files.len());
        for file in &model.files {
            write_files.push(WriteFile::new(
                file.path.clone(),
                file.permissions,
                &file.content,
            )?);
        }

        let units = self.rendered_units(model);
        for unit in &units {
            validate_unit_name(&unit.name)?;
            for drop_in in &unit.drop_ins {
                validate_unit_name(&drop_in.name)?;
            }
        }

        let base = self.units_path.trim_end_matches('/');
        for unit in &units {
            if let Some(content) = &unit.content {
                write_files.push(WriteFile::new(
                    format!("{base}/{}", unit.name),
                    UNIT_FILE_PERMISSIONS,
                    content,
                )?);
            }
            for drop_in in &unit.drop_ins {
                write_files.push(WriteFile::new(
                    format!("{base}/{}.d/{}", unit.name, drop_in.name),
                    UNIT_FILE_PERMISSIONS,
                    &drop_in.content,
                )?);
            }
        }

        let mut runcmd = Vec::new();
        if !units.is_empty() {
            runcmd.push("systemctl daemon-reload".to_string());
        }
        for unit in &units {
            if unit.enable {
                runcmd.push(format!("systemctl enable '{}'", unit.name));
            }
            runcmd.push(format!("systemctl {} '{}'", unit.command, unit.name));
        }

        let body = serde_yaml::to_string(&Document {
            write_files,
            runcmd,
        })?;

        let mut document = String::with_capacity(HEADER.len() + body.len());
        document.push_str(HEADER);
        document.push_str(&body);
        Ok(document.into_bytes())
    }
}

/// Names become a path component under the units path and a single-quoted
/// shell word in `runcmd`
fn validate_unit_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() || name == "." || name == ".." {
        Some("must be a file name")
    } else if name.contains('/') {
        Some("must not contain '/'")
    } else if name.contains('\'') {
        Some("must not contain a single quote")
    } else if name.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidUnitName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn format_permissions(path: &str, permissions: u32) -> Result<String> {
    if permissions > MAX_PERMISSIONS {
        return Err(Error::InvalidPermissions {
            path: path.to_string(),
            permissions,
        });
    }
    Ok(format!("{permissions:04o}"))
}
