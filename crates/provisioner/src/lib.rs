//! Machine provisioning
//!
//! Turns a validated machine request into a reserved NetBox address and a
//! KubeVirt VirtualMachine created on behalf of the caller.
//!
//! - `form` - Form validation into a `MachineRequest`
//! - `reservation` - Prefix selection and address reservation in NetBox
//! - `machine` - Pure VirtualMachine manifest building
//! - `workflow` - The end-to-end create flow

pub mod error;
pub mod form;
pub mod machine;
pub mod reservation;
pub mod workflow;


pub use error::ProvisionError;
pub use form::{MachineForm, MachineRequest};
pub use machine::{build_machine, MachineParams};
pub use reservation::{IpReserver, PoolSelector, ReservedAddress};
pub use workflow::{ProvisionObserver, Provisioner};
