//! Prometheus counters for provisioning outcomes

use crate::error::ConsoleError;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use provisioner::{ProvisionError, ProvisionObserver, ReservedAddress};

/// Console metrics, registered in a registry the console owns
pub struct Metrics {
    /// Machines the cluster accepted
    pub machines_created_total: IntCounter,
    /// Reservation attempts by outcome (`reserved`, `failed`)
    pub address_reservations_total: IntCounterVec,
    /// Addresses left allocated after the cluster refused the machine
    pub orphaned_addresses_total: IntCounter,
    registry: Registry,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("machines_created_total", &self.machines_created_total.get())
            .field("orphaned_addresses_total", &self.orphaned_addresses_total.get())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Result<Self, ConsoleError> {
        let registry = Registry::new();

        let machines_created_total = IntCounter::new(
            "console_machines_created_total",
            "Virtual machines created through the console",
        )?;
        let address_reservations_total = IntCounterVec::new(
            Opts::new(
                "console_address_reservations_total",
                "NetBox address reservations by outcome",
            ),
            &["outcome"],
        )?;
        let orphaned_addresses_total = IntCounter::new(
            "console_orphaned_addresses_total",
            "Reserved addresses whose machine could not be created",
        )?;

        registry.register(Box::new(machines_created_total.clone()))?;
        registry.register(Box::new(address_reservations_total.clone()))?;
        registry.register(Box::new(orphaned_addresses_total.clone()))?;

        Ok(Self {
            machines_created_total,
            address_reservations_total,
            orphaned_addresses_total,
            registry,
        })
    }

    /// All metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, ConsoleError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ConsoleError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}

impl ProvisionObserver for Metrics {
    fn address_reserved(&self, _address: &ReservedAddress) {
        self.address_reservations_total.with_label_values(&["reserved"]).inc();
    }

    fn reservation_failed(&self, _error: &ProvisionError) {
        self.address_reservations_total.with_label_values(&["failed"]).inc();
    }

    fn address_orphaned(&self, _address: &ReservedAddress) {
        self.orphaned_addresses_total.inc();
    }

    fn machine_created(&self, _namespace: &str, _name: &str) {
        self.machines_created_total.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_counts() {
        let metrics = Metrics::new().unwrap();
        let address = ReservedAddress { id: 1, cidr: "10.0.0.5/24".to_string() };

        metrics.address_reserved(&address);
        metrics.address_orphaned(&address);
        metrics.reservation_failed(&ProvisionError::ExhaustedPool { prefix_id: 7 });
        metrics.machine_created("team-a", "vm1");

        assert_eq!(metrics.address_reservations_total.with_label_values(&["reserved"]).get(), 1);
        assert_eq!(metrics.address_reservations_total.with_label_values(&["failed"]).get(), 1);
        assert_eq!(metrics.orphaned_addresses_total.get(), 1);
        assert_eq!(metrics.machines_created_total.get(), 1);
    }

    #[test]
    fn test_gather_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.machines_created_total.inc();

        let text = metrics.gather().unwrap();
        assert!(text.contains("# TYPE console_machines_created_total counter"));
        assert!(text.contains("console_machines_created_total 1"));
    }
}
