//! Machine creation workflow
//!
//! find prefix -> check gateway -> reserve address -> build manifest -> create VM
//!
//! Nothing is rolled back. An address reserved for a VM the cluster then
//! refuses stays allocated in NetBox and is reported as orphaned.

use crate::error::ProvisionError;
use crate::form::MachineRequest;
use crate::machine::{build_machine, MachineParams, DEFAULT_IMAGE_NAMESPACE};
use crate::reservation::{IpReserver, ReservedAddress};
use cluster_client::ClusterClientTrait;
use crds::VirtualMachine;
use netbox_client::NetBoxClientTrait;
use std::sync::Arc;
use tracing::{error, info};

/// Hooks for outcome counting. All methods default to no-ops.
pub trait ProvisionObserver: Send + Sync {
    fn address_reserved(&self, _address: &ReservedAddress) {}
    fn reservation_failed(&self, _error: &ProvisionError) {}
    fn address_orphaned(&self, _address: &ReservedAddress) {}
    fn machine_created(&self, _namespace: &str, _name: &str) {}
}

/// Creates machines on behalf of callers
pub struct Provisioner<C: NetBoxClientTrait> {
    reserver: IpReserver<C>,
    image_namespace: String,
    observer: Option<Arc<dyn ProvisionObserver>>,
}

impl<C: NetBoxClientTrait> std::fmt::Debug for Provisioner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("pool", self.reserver.pool())
            .field("image_namespace", &self.image_namespace)
            .finish_non_exhaustive()
    }
}

impl<C: NetBoxClientTrait> Provisioner<C> {
    pub fn new(reserver: IpReserver<C>) -> Self {
        Self {
            reserver,
            image_namespace: DEFAULT_IMAGE_NAMESPACE.to_string(),
            observer: None,
        }
    }

    /// Namespace the source images are cloned from
    #[must_use]
    pub fn with_image_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.image_namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProvisionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn reserver(&self) -> &IpReserver<C> {
        &self.reserver
    }

    pub fn image_namespace(&self) -> &str {
        &self.image_namespace
    }

    fn observe(&self, f: impl FnOnce(&dyn ProvisionObserver)) {
        if let Some(observer) = &self.observer {
            f(observer.as_ref());
        }
    }

    /// Reserve an address and create the machine in `namespace` as the
    /// caller behind `cluster`.
    ///
    /// Cluster errors come back unchanged inside `ProvisionError::Cluster`.
    pub async fn create_machine(
        &self,
        cluster: &dyn ClusterClientTrait,
        namespace: &str,
        request: &MachineRequest,
    ) -> Result<VirtualMachine, ProvisionError> {
        let description = format!("{}/{}", namespace, request.name);
        info!("Provisioning machine {}", description);

        let prefix = self.reserver.find_prefix().await?;
        let gateway = self.reserver.prefix_gateway(&prefix)?;
        let reserved = self
            .reserver
            .reserve_ip_address(prefix.id, &description)
            .await
            .inspect_err(|e| self.observe(|o| o.reservation_failed(e)))?;
        self.observe(|o| o.address_reserved(&reserved));

        let vm = build_machine(&MachineParams {
            name: request.name.clone(),
            compute_class: request.compute_class.clone(),
            root_disk_size_gb: request.root_disk_size_gb,
            source_volume_name: request.source_pvc_name.clone(),
            source_namespace: self.image_namespace.clone(),
            ipv4_address: reserved.cidr.clone(),
            ipv4_gateway: gateway,
            ssh_public_key: request.ssh_key.clone(),
        });

        match cluster.create_virtual_machine(namespace, &vm).await {
            Ok(created) => {
                info!("Created machine {} with address {}", description, reserved.bare());
                self.observe(|o| o.machine_created(namespace, &request.name));
                Ok(created)
            }
            Err(e) => {
                error!(
                    orphaned_address = %reserved.cidr,
                    netbox_ip_id = reserved.id,
                    machine = %description,
                    "Machine creation failed after reserving an address; the address stays allocated in NetBox: {}",
                    e
                );
                self.observe(|o| o.address_orphaned(&reserved));
                Err(e.into())
            }
        }
    }
}
