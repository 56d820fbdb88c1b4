//! VirtualMachine manifest builder
//!
//! Pure and deterministic: the same parameters always produce the same
//! manifest. Maps are `BTreeMap`s and nothing reads the clock or a RNG.

use crds::{
    CloudInitNoCloudSource, DataVolumeCloneSource, DataVolumeSource, DataVolumeSourcePvc,
    DataVolumeSpec, DataVolumeTemplateSpec, Devices, DomainSpec, InstancetypeMatcher, Interface,
    InterfaceBridge, MultusNetwork, Network, PreferenceMatcher, VirtualMachine,
    VirtualMachineInstanceSpec, VirtualMachineInstanceTemplateSpec, VirtualMachineSpec, Volume,
    CLUSTER_INSTANCETYPE_KIND, CLUSTER_PREFERENCE_KIND, IPV4_ADDRESS_ANNOTATION, VM_LABEL,
};
use k8s_openapi::api::core::v1::{PersistentVolumeClaimSpec, VolumeResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Namespace holding the source images
pub const DEFAULT_IMAGE_NAMESPACE: &str = "vm-images";

/// Multus network every machine is bridged onto
pub const EXTERNAL_NETWORK: &str = "bridge-external";

/// Cluster preference applied to every machine
pub const DEFAULT_PREFERENCE: &str = "ubuntu";

/// Guest NIC name as the image's udev rules name it
pub const GUEST_INTERFACE: &str = "enp1s0";

pub const NAMESERVERS: [&str; 2] = ["1.1.1.1", "1.0.0.1"];

/// Inputs to `build_machine`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineParams {
    pub name: String,
    /// Cluster instancetype name
    pub compute_class: String,
    pub root_disk_size_gb: u32,
    /// PVC cloned into the root disk
    pub source_volume_name: String,
    /// Namespace of `source_volume_name`
    pub source_namespace: String,
    /// Address in CIDR form, e.g. "10.0.0.5/24"
    pub ipv4_address: String,
    /// Bare gateway address, e.g. "10.0.0.1"
    pub ipv4_gateway: String,
    pub ssh_public_key: String,
}

/// Text before the first `/`, i.e. the address without its prefix length
pub fn bare_address(cidr: &str) -> &str {
    cidr.split_once('/').map_or(cidr, |(address, _)| address)
}

/// Quote a value as a YAML double-quoted scalar
fn yaml_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// cloud-init network config (v2): one static interface, default route via
/// the gateway, public resolvers.
pub fn network_data(ipv4_address: &str, ipv4_gateway: &str) -> String {
    let nameservers: String = NAMESERVERS
        .iter()
        .map(|ns| format!("\n        - {}", ns))
        .collect();

    format!(
        "version: 2\n\
         ethernets:\n  \
           {iface}:\n    \
             addresses:\n      \
               - {address}\n    \
             routes:\n      \
               - to: default\n        \
                 via: {gateway}\n    \
             nameservers:\n      \
               addresses:{nameservers}",
        iface = GUEST_INTERFACE,
        address = yaml_quoted(ipv4_address),
        gateway = yaml_quoted(ipv4_gateway),
        nameservers = nameservers,
    )
}

/// cloud-config authorizing exactly one SSH key
pub fn user_data(ssh_public_key: &str) -> String {
    format!(
        "#cloud-config\nssh_authorized_keys:\n  - {}",
        yaml_quoted(ssh_public_key.trim())
    )
}

/// Build the VirtualMachine manifest for a machine.
pub fn build_machine(params: &MachineParams) -> VirtualMachine {
    let labels = BTreeMap::from([(VM_LABEL.to_string(), params.name.clone())]);
    let annotations = BTreeMap::from([(
        IPV4_ADDRESS_ANNOTATION.to_string(),
        bare_address(&params.ipv4_address).to_string(),
    )]);

    let template = VirtualMachineInstanceTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels.clone()),
            ..Default::default()
        }),
        spec: VirtualMachineInstanceSpec {
            domain: DomainSpec {
                devices: Devices {
                    interfaces: vec![Interface {
                        name: "default".to_string(),
                        bridge: Some(InterfaceBridge {}),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                ..Default::default()
            },
            networks: vec![Network {
                name: "default".to_string(),
                multus: Some(MultusNetwork {
                    network_name: EXTERNAL_NETWORK.to_string(),
                }),
                ..Default::default()
            }],
            volumes: vec![
                Volume {
                    name: "root".to_string(),
                    data_volume: Some(DataVolumeSource {
                        name: params.name.clone(),
                    }),
                    ..Default::default()
                },
                Volume {
                    name: "cloudinit".to_string(),
                    cloud_init_no_cloud: Some(CloudInitNoCloudSource {
                        network_data: Some(network_data(&params.ipv4_address, &params.ipv4_gateway)),
                        user_data: Some(user_data(&params.ssh_public_key)),
                    }),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
    };

    let root_disk = DataVolumeTemplateSpec {
        metadata: ObjectMeta {
            name: Some(params.name.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: DataVolumeSpec {
            pvc: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(BTreeMap::from([(
                        "storage".to_string(),
                        Quantity(format!("{}Gi", params.root_disk_size_gb)),
                    )])),
                    ..Default::default()
                }),
                volume_mode: Some("Block".to_string()),
                ..Default::default()
            }),
            source: Some(DataVolumeCloneSource {
                pvc: Some(DataVolumeSourcePvc {
                    name: params.source_volume_name.clone(),
                    namespace: params.source_namespace.clone(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
    };

    let spec = VirtualMachineSpec {
        running: Some(true),
        instancetype: Some(InstancetypeMatcher {
            name: params.compute_class.clone(),
            kind: Some(CLUSTER_INSTANCETYPE_KIND.to_string()),
            ..Default::default()
        }),
        preference: Some(PreferenceMatcher {
            name: DEFAULT_PREFERENCE.to_string(),
            kind: Some(CLUSTER_PREFERENCE_KIND.to_string()),
            ..Default::default()
        }),
        template,
        data_volume_templates: vec![root_disk],
        ..Default::default()
    };

    let mut vm = VirtualMachine::new(&params.name, spec);
    vm.metadata.annotations = Some(annotations);
    vm
}
