//! VirtualMachineClusterInstancetype CRD
//!
//! Cluster-scoped compute classes. The console only lists them; the
//! well-known labels carry the sizing used for ordering.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Kind referenced from `VirtualMachineSpec::instancetype`
pub const CLUSTER_INSTANCETYPE_KIND: &str = "VirtualMachineClusterInstancetype";

/// Kind referenced from `VirtualMachineSpec::preference`
pub const CLUSTER_PREFERENCE_KIND: &str = "VirtualMachineClusterPreference";

/// Label holding the guest CPU count, e.g. "2"
pub const INSTANCETYPE_CPU_LABEL: &str = "instancetype.kubevirt.io/cpu";

/// Label holding the guest memory, e.g. "4Gi"
pub const INSTANCETYPE_MEMORY_LABEL: &str = "instancetype.kubevirt.io/memory";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, Default)]
#[kube(
    group = "instancetype.kubevirt.io",
    version = "v1beta1",
    kind = "VirtualMachineClusterInstancetype",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineClusterInstancetypeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuInstancetype>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryInstancetype>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CpuInstancetype {
    pub guest: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInstancetype {
    /// Quantity string, e.g. "4Gi"
    pub guest: String,
}

impl VirtualMachineClusterInstancetype {
    fn label(&self, key: &str) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(key))
            .map(String::as_str)
    }

    /// Guest CPU count from the well-known label.
    pub fn cpu_label(&self) -> Option<u32> {
        self.label(INSTANCETYPE_CPU_LABEL)?.trim().parse().ok()
    }

    /// Guest memory in GiB from the well-known label ("4Gi" reads as 4).
    pub fn memory_gib_label(&self) -> Option<u32> {
        let value = self.label(INSTANCETYPE_MEMORY_LABEL)?.trim();
        value.strip_suffix("Gi").unwrap_or(value).parse().ok()
    }
}
