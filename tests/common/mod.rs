//! Common test utilities
//!
//! In-memory implementations of the object store seams and fixture builders
//! for OperatingSystemConfig resources.

#![allow(dead_code)]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::ResourceExt;
use os_config_controller::crd::{
    DropIn, File, FileContent, FileContentInline, FileContentSecretRef, OperatingSystemConfig,
    OperatingSystemConfigSpec, Unit,
};
use os_config_controller::store::{SecretStore, StatusStore};
use os_config_controller::{Error, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

pub const NAMESPACE: &str = "shoot--core--dev";

/// Secret store with optimistic concurrency on `resourceVersion`
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<BTreeMap<(String, String), Secret>>,
    revision: AtomicU64,
    /// Next writes that lose against a simulated concurrent writer
    conflicts: AtomicU32,
    fail_writes: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a secret holding `data`, as if written by someone else
    pub fn insert(&self, namespace: &str, name: &str, data: &[(&str, &[u8])]) {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            data: Some(
                data.iter()
                    .map(|(k, v)| ((*k).to_string(), ByteString(v.to_vec())))
                    .collect(),
            ),
            ..Secret::default()
        };
        self.put(secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn data(&self, namespace: &str, name: &str, key: &str) -> Option<Vec<u8>> {
        self.secret(namespace, name)?
            .data?
            .get(key)
            .map(|b| b.0.clone())
    }

    /// Let the next `n` writes hit a conflict after a concurrent writer
    /// added a key of its own
    pub fn inject_conflicts(&self, n: u32) {
        self.conflicts.store(n, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of create and replace calls
    pub fn writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !c.starts_with("get "))
            .count()
    }

    fn put(&self, mut secret: Secret) -> Secret {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        secret.metadata.resource_version = Some(revision.to_string());
        let key = (secret.namespace().unwrap_or_default(), secret.name_any());
        self.secrets.lock().unwrap().insert(key, secret.clone());
        secret
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_write(&self, secret: &Secret) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("injected write failure".into()));
        }
        let pending = self.conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.conflicts.store(pending - 1, Ordering::SeqCst);
            let namespace = secret.namespace().unwrap_or_default();
            let name = secret.name_any();
            let mut concurrent = self.secret(&namespace, &name).unwrap_or_else(|| Secret {
                metadata: ObjectMeta {
                    name: Some(name.clone()),
                    namespace: Some(namespace.clone()),
                    ..ObjectMeta::default()
                },
                ..Secret::default()
            });
            concurrent.data.get_or_insert_with(BTreeMap::new).insert(
                format!("concurrent-{pending}"),
                ByteString(b"other writer".to_vec()),
            );
            self.put(concurrent);
            return Err(Error::Conflict(format!("{namespace}/{name}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        self.record(format!("get {namespace}/{name}"));
        Ok(self.secret(namespace, name))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret> {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        self.record(format!("create {namespace}/{name}"));
        self.check_write(secret)?;
        if self.secret(&namespace, &name).is_some() {
            return Err(Error::Conflict(format!("{namespace}/{name}")));
        }
        Ok(self.put(secret.clone()))
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret> {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        self.record(format!("replace {namespace}/{name}"));
        self.check_write(secret)?;
        let stored = self
            .secret(&namespace, &name)
            .ok_or_else(|| Error::Persistence(format!("{namespace}/{name} not found").into()))?;
        if stored.metadata.resource_version != secret.metadata.resource_version {
            return Err(Error::Conflict(format!("{namespace}/{name}")));
        }
        Ok(self.put(secret.clone()))
    }
}

/// Status store recording every written snapshot
pub struct MemoryStatusStore<K> {
    updates: Mutex<Vec<K>>,
    fail: AtomicBool,
}

impl<K> Default for MemoryStatusStore<K> {
    fn default() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

impl<K: Clone> MemoryStatusStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn updates(&self) -> Vec<K> {
        self.updates.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<K> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl<K: Clone + Send + Sync> StatusStore<K> for MemoryStatusStore<K> {
    async fn update_status(&self, resource: &K) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Persistence("injected status failure".into()));
        }
        self.updates.lock().unwrap().push(resource.clone());
        Ok(())
    }
}

pub fn operating_system_config(name: &str, files: Vec<File>, units: Vec<Unit>) -> OperatingSystemConfig {
    let mut config = OperatingSystemConfig::new(
        name,
        OperatingSystemConfigSpec {
            os_type: "coreos-alibaba".to_string(),
            files,
            units,
        },
    );
    config.metadata.namespace = Some(NAMESPACE.to_string());
    config.metadata.uid = Some(format!("uid-{name}"));
    config.metadata.generation = Some(1);
    config
}

pub fn inline_file(path: &str, encoding: &str, data: &str) -> File {
    File {
        path: path.to_string(),
        permissions: Some(0o644),
        content: FileContent {
            inline: Some(FileContentInline {
                encoding: encoding.to_string(),
                data: data.to_string(),
            }),
            secret_ref: None,
        },
    }
}

pub fn secret_file(path: &str, name: &str, data_key: &str) -> File {
    File {
        path: path.to_string(),
        permissions: Some(0o600),
        content: FileContent {
            inline: None,
            secret_ref: Some(FileContentSecretRef {
                name: name.to_string(),
                data_key: data_key.to_string(),
            }),
        },
    }
}

pub fn unit(name: &str, content: Option<&str>, drop_ins: &[(&str, &str)]) -> Unit {
    Unit {
        name: name.to_string(),
        content: content.map(str::to_string),
        enable: None,
        command: None,
        drop_ins: drop_ins
            .iter()
            .map(|(n, c)| DropIn {
                name: (*n).to_string(),
                content: (*c).to_string(),
            })
            .collect(),
    }
}

/// Parse a generated cloud config, checking its header
pub fn parse_cloud_config(document: &[u8]) -> serde_yaml::Value {
    let text = std::str::from_utf8(document).unwrap();
    assert!(text.starts_with("#cloud-config\n"));
    serde_yaml::from_str(text).unwrap()
}

/// `(path, permissions, decoded content)` of every `write_files` entry
pub fn written_files(document: &[u8]) -> Vec<(String, String, Vec<u8>)> {
    parse_cloud_config(document)["write_files"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|f| {
            (
                f["path"].as_str().unwrap().to_string(),
                f["permissions"].as_str().unwrap().to_string(),
                os_config_controller::cloudinit::encoding::decode(
                    f["encoding"].as_str().unwrap(),
                    f["content"].as_str().unwrap().as_bytes(),
                )
                .unwrap(),
            )
        })
        .collect()
}
