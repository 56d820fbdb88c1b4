//! VirtualMachine CRD
//!
//! `kubevirt.io/v1` VirtualMachine, limited to what the console builds and shows.

use k8s_openapi::api::core::v1::PersistentVolumeClaimSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{IPV4_ADDRESS_ANNOTATION, LEGACY_IPV4_ADDRESS_ANNOTATION};

/// Status shown when the cluster has not reported one yet
pub const PENDING_STATUS: &str = "Pending";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, Default)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachine",
    namespaced,
    status = "VirtualMachineStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    /// Desired running state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,

    /// Compute class reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instancetype: Option<InstancetypeMatcher>,

    /// Boot preference reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<PreferenceMatcher>,

    /// Template for the VirtualMachineInstance
    #[serde(default)]
    pub template: VirtualMachineInstanceTemplateSpec,

    /// Data volumes created alongside the VM
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_volume_templates: Vec<DataVolumeTemplateSpec>,

    /// Fields not modelled here, kept so reads round-trip
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstancetypeMatcher {
    /// Empty when the class is inferred from a volume
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Volume whose labels name the class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infer_from_volume: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceMatcher {
    /// Empty when the preference is inferred from a volume
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Volume whose labels name the preference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infer_from_volume: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceTemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,

    #[serde(default)]
    pub spec: VirtualMachineInstanceSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceSpec {
    #[serde(default)]
    pub domain: DomainSpec,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DomainSpec {
    #[serde(default)]
    pub devices: Devices,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Devices {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Guest network interface; exactly one binding method is set
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<InterfaceBridge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<InterfaceMasquerade>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Serializes as `{}`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct InterfaceBridge {}

/// Serializes as `{}`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct InterfaceMasquerade {}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multus: Option<MultusNetwork>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultusNetwork {
    /// NetworkAttachmentDefinition name, optionally `<namespace>/<name>`
    pub network_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_volume: Option<DataVolumeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_init_no_cloud: Option<CloudInitNoCloudSource>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Volume backed by a DataVolume of the given name
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSource {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudInitNoCloudSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeTemplateSpec {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: DataVolumeSpec,
}

/// CDI DataVolume spec
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc: Option<PersistentVolumeClaimSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DataVolumeCloneSource>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Where CDI populates the data volume from
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeCloneSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc: Option<DataVolumeSourcePvc>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSourcePvc {
    pub name: String,

    /// Empty for a clone from the DataVolume's own namespace
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// Observed state, written by KubeVirt only
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineStatus {
    /// Human readable state, e.g. "Provisioning", "Running", "Terminating"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printable_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<VirtualMachineCondition>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineCondition {
    #[serde(rename = "type")]
    pub type_: String,

    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl VirtualMachine {
    /// Printable status reported by KubeVirt, or "Pending" before it reports one.
    pub fn printable_status(&self) -> &str {
        self.status
            .as_ref()
            .and_then(|s| s.printable_status.as_deref())
            .unwrap_or(PENDING_STATUS)
    }

    /// Bare IPv4 address recorded when the machine was provisioned.
    ///
    /// Machines provisioned before the annotation was renamed carry it under
    /// the prefixed key.
    pub fn ipv4_address(&self) -> Option<&str> {
        let annotations = self.metadata.annotations.as_ref()?;
        annotations
            .get(IPV4_ADDRESS_ANNOTATION)
            .or_else(|| annotations.get(LEGACY_IPV4_ADDRESS_ANNOTATION))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_defaults_to_pending() {
        let vm = VirtualMachine::new("vm1", VirtualMachineSpec::default());
        assert_eq!(vm.printable_status(), "Pending");
        assert_eq!(vm.ipv4_address(), None);
    }

    #[test]
    fn test_reads_cluster_response() {
        let vm: VirtualMachine = serde_json::from_value(json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachine",
            "metadata": {
                "name": "vm1",
                "namespace": "ns",
                "annotations": {"ipv4Address": "10.0.0.5"},
                "creationTimestamp": "2024-03-01T12:00:00Z"
            },
            "spec": {
                "running": true,
                "template": {
                    "spec": {
                        "domain": {"devices": {}, "resources": {}, "machine": {"type": "q35"}},
                        "volumes": [{"name": "root", "dataVolume": {"name": "vm1"}}]
                    }
                }
            },
            "status": {"printableStatus": "Running", "ready": true}
        }))
        .unwrap();

        assert_eq!(vm.printable_status(), "Running");
        assert_eq!(vm.ipv4_address(), Some("10.0.0.5"));
        assert_eq!(vm.spec.template.spec.volumes[0].data_volume.as_ref().unwrap().name, "vm1");
    }

    #[test]
    fn test_empty_binding_serializes_as_empty_object() {
        let iface = Interface {
            name: "default".to_string(),
            bridge: Some(InterfaceBridge {}),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&iface).unwrap(),
            json!({"name": "default", "bridge": {}})
        );
    }

    #[test]
    fn test_status_parses_from_yaml() {
        let status: VirtualMachineStatus = serde_yaml::from_str(
            "printableStatus: Provisioning\nconditions:\n  - type: Ready\n    status: \"False\"\n",
        )
        .unwrap();
        assert_eq!(status.printable_status.as_deref(), Some("Provisioning"));
        assert_eq!(status.conditions[0].type_, "Ready");
    }

    #[test]
    fn test_reads_legacy_address_annotation() {
        let mut vm = VirtualMachine::new("vm1", VirtualMachineSpec::default());
        vm.metadata.annotations = Some(
            [(LEGACY_IPV4_ADDRESS_ANNOTATION.to_string(), "10.0.0.9".to_string())].into(),
        );
        assert_eq!(vm.ipv4_address(), Some("10.0.0.9"));

        vm.metadata
            .annotations
            .as_mut()
            .unwrap()
            .insert(IPV4_ADDRESS_ANNOTATION.to_string(), "10.0.0.5".to_string());
        assert_eq!(vm.ipv4_address(), Some("10.0.0.5"));
    }

    #[test]
    fn test_reads_machines_not_built_by_console() {
        let vms: Vec<VirtualMachine> = serde_json::from_value(json!([
            {
                "apiVersion": "kubevirt.io/v1",
                "kind": "VirtualMachine",
                "metadata": {"name": "ours"},
                "spec": {
                    "instancetype": {"name": "u1.small", "kind": "VirtualMachineClusterInstancetype"},
                    "template": {"spec": {}},
                    "dataVolumeTemplates": [{
                        "metadata": {"name": "ours"},
                        "spec": {"source": {"pvc": {"name": "img", "namespace": "images"}}}
                    }]
                }
            },
            {
                "apiVersion": "kubevirt.io/v1",
                "kind": "VirtualMachine",
                "metadata": {"name": "inferred"},
                "spec": {
                    "instancetype": {"inferFromVolume": "root"},
                    "preference": {"inferFromVolume": "root", "inferFromVolumeFailurePolicy": "Ignore"},
                    "template": {"spec": {}},
                    "dataVolumeTemplates": [{
                        "metadata": {"name": "inferred"},
                        "spec": {"source": {"pvc": {"name": "img"}}}
                    }]
                }
            }
        ]))
        .unwrap();

        assert_eq!(vms[0].spec.instancetype.as_ref().unwrap().name, "u1.small");

        let inferred = &vms[1].spec;
        let instancetype = inferred.instancetype.as_ref().unwrap();
        assert_eq!(instancetype.name, "");
        assert_eq!(instancetype.infer_from_volume.as_deref(), Some("root"));
        assert_eq!(
            inferred.preference.as_ref().unwrap().extra["inferFromVolumeFailurePolicy"],
            json!("Ignore")
        );
        let source = inferred.data_volume_templates[0].spec.source.as_ref().unwrap();
        assert_eq!(source.pvc.as_ref().unwrap().namespace, "");
    }

    #[test]
    fn test_unmodelled_fields_survive_round_trip() {
        let raw = json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachine",
            "metadata": {"name": "vm1", "namespace": "ns"},
            "spec": {
                "runStrategy": "Always",
                "template": {
                    "spec": {
                        "domain": {
                            "cpu": {"cores": 2},
                            "machine": {"type": "q35"},
                            "resources": {"requests": {"memory": "2Gi"}},
                            "devices": {
                                "disks": [{"name": "root", "disk": {"bus": "virtio"}}],
                                "interfaces": [{"name": "default", "bridge": {}, "macAddress": "02:00:00:00:00:01"}]
                            }
                        },
                        "networks": [{"name": "default", "pod": {}}],
                        "volumes": [{"name": "scratch", "emptyDisk": {"capacity": "1Gi"}}]
                    }
                },
                "dataVolumeTemplates": [{
                    "metadata": {"name": "vm1"},
                    "spec": {
                        "storage": {"resources": {"requests": {"storage": "20Gi"}}},
                        "source": {"http": {"url": "https://images.example.com/disk.img"}}
                    }
                }]
            },
            "status": {
                "printableStatus": "Running",
                "ready": true,
                "conditions": [{"type": "Ready", "status": "True", "lastProbeTime": null}],
                "volumeSnapshotStatuses": [{"name": "root", "enabled": false}]
            }
        });

        let vm: VirtualMachine = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(vm.spec.extra["runStrategy"], json!("Always"));
        assert_eq!(serde_json::to_value(&vm).unwrap(), raw);
    }
}
