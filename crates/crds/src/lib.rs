//! KubeVirt resource types
//!
//! Typed views of the KubeVirt resources the console reads and creates.
//! The CRDs themselves are owned by KubeVirt, so no schema is generated here;
//! only the fields the console touches are modelled. Everything else is
//! carried through untouched in `extra` maps.

pub mod instancetype;
pub mod virtual_machine;

pub use instancetype::*;
pub use virtual_machine::*;

/// Label tying a VM's template and data volumes back to the VM.
pub const VM_LABEL: &str = "kubevirt.io/vm";

/// Annotation carrying the VM's bare IPv4 address for display.
pub const IPV4_ADDRESS_ANNOTATION: &str = "ipv4Address";

/// Prefixed annotation key written by earlier console releases.
pub const LEGACY_IPV4_ADDRESS_ANNOTATION: &str = "monsoon.ianunruh.com/ipv4Address";
