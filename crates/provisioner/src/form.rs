//! New machine form
//!
//! Fields arrive as submitted strings, from JSON or a urlencoded body, and
//! are checked here before anything touches NetBox or the cluster.

use crate::error::ProvisionError;
use serde::{Deserialize, Deserializer, Serialize};

/// Longest name a DNS label (and so a VM name) may have
pub const MAX_NAME_LEN: usize = 63;

/// Machine form as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineForm {
    #[serde(default)]
    pub name: String,
    /// Image PVC to clone
    #[serde(default, rename = "sourcePVCName", alias = "sourceVolumeName")]
    pub source_pvc_name: String,
    /// Root disk size in GiB
    #[serde(default, deserialize_with = "string_or_number")]
    pub root_disk_size: String,
    /// Compute class name
    #[serde(default, alias = "computeClass")]
    pub size: String,
    #[serde(default)]
    pub ssh_key: String,
}

/// A validated machine request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineRequest {
    pub name: String,
    pub source_pvc_name: String,
    pub root_disk_size_gb: u32,
    pub compute_class: String,
    pub ssh_key: String,
}

impl MachineForm {
    /// Check the form and turn it into a request.
    pub fn validate(&self) -> Result<MachineRequest, ProvisionError> {
        let name = required("name", &self.name)?;
        let source_pvc_name = required("sourcePVCName", &self.source_pvc_name)?;
        let root_disk_size = required("rootDiskSize", &self.root_disk_size)?;
        let compute_class = required("size", &self.size)?;
        let ssh_key = required("sshKey", &self.ssh_key)?;

        validate_name(name)?;

        let root_disk_size_gb = root_disk_size
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                ProvisionError::Validation(format!(
                    "rootDiskSize must be a positive whole number of GiB, got {:?}",
                    root_disk_size
                ))
            })?;

        if ssh_key.contains(['\n', '\r']) {
            return Err(ProvisionError::Validation("sshKey must be a single line".to_string()));
        }

        Ok(MachineRequest {
            name: name.to_string(),
            source_pvc_name: source_pvc_name.to_string(),
            root_disk_size_gb,
            compute_class: compute_class.to_string(),
            ssh_key: ssh_key.to_string(),
        })
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ProvisionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProvisionError::Validation(format!("{} is required", field)));
    }
    Ok(value)
}

/// RFC 1123 label: lowercase alphanumerics and '-', alphanumeric at both ends.
fn validate_name(name: &str) -> Result<(), ProvisionError> {
    if name.len() > MAX_NAME_LEN {
        return Err(invalid_name(name, "must be at most 63 characters"));
    }
    if !name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
        return Err(invalid_name(name, "may only contain lowercase letters, digits and '-'"));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid_name(name, "must start and end with a letter or digit"));
    }
    Ok(())
}

fn invalid_name(name: &str, reason: &str) -> ProvisionError {
    ProvisionError::Validation(format!("name {:?} {}", name, reason))
}

/// JSON clients may send the disk size as a number
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> MachineForm {
        MachineForm {
            name: "minecraft".to_string(),
            source_pvc_name: "ubuntu-22.04".to_string(),
            root_disk_size: "20".to_string(),
            size: "u1.small".to_string(),
            ssh_key: "ssh-ed25519 AAAAC3Nza user@host".to_string(),
        }
    }

    fn validation_message(form: &MachineForm) -> String {
        match form.validate() {
            Err(ProvisionError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_form() {
        let request = form().validate().unwrap();
        assert_eq!(request.name, "minecraft");
        assert_eq!(request.root_disk_size_gb, 20);
        assert_eq!(request.compute_class, "u1.small");
    }

    #[test]
    fn test_values_are_trimmed() {
        let mut f = form();
        f.name = "  minecraft ".to_string();
        f.ssh_key = "ssh-ed25519 AAAA\n".to_string();
        let request = f.validate().unwrap();
        assert_eq!(request.name, "minecraft");
        assert_eq!(request.ssh_key, "ssh-ed25519 AAAA");
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut f = form();
        f.size = "   ".to_string();
        assert_eq!(validation_message(&f), "size is required");

        let mut f = form();
        f.source_pvc_name = String::new();
        assert_eq!(validation_message(&f), "sourcePVCName is required");
    }

    #[test]
    fn test_disk_size_must_be_positive_integer() {
        for bad in ["0", "-5", "ten", "1.5"] {
            let mut f = form();
            f.root_disk_size = bad.to_string();
            assert!(validation_message(&f).starts_with("rootDiskSize"), "{} accepted", bad);
        }
    }

    #[test]
    fn test_name_must_be_dns_label() {
        let long = "a".repeat(64);
        for bad in ["Minecraft", "mine_craft", "-mc", "mc-", "a.b", long.as_str()] {
            let mut f = form();
            f.name = bad.to_string();
            assert!(validation_message(&f).starts_with("name"), "{} accepted", bad);
        }

        let mut f = form();
        f.name = "a".repeat(63);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn test_multiline_key_rejected() {
        let mut f = form();
        f.ssh_key = "ssh-ed25519 AAAA\nssh-rsa BBBB".to_string();
        assert_eq!(validation_message(&f), "sshKey must be a single line");
    }

    #[test]
    fn test_deserializes_submitted_names() {
        let f: MachineForm = serde_json::from_str(
            r#"{"name":"vm1","sourcePVCName":"img","rootDiskSize":"10","size":"u1.small","sshKey":"k"}"#,
        )
        .unwrap();
        assert_eq!(f.source_pvc_name, "img");
        assert_eq!(f.root_disk_size, "10");
        assert_eq!(f.ssh_key, "k");

        let f: MachineForm = serde_json::from_str(r#"{"name":"vm1","rootDiskSize":10}"#).unwrap();
        assert_eq!(f.root_disk_size, "10");
        assert_eq!(validation_message(&f), "sourcePVCName is required");
    }

    #[test]
    fn test_accepts_descriptive_field_names() {
        let f: MachineForm = serde_json::from_str(
            r#"{"name":"vm1","sourceVolumeName":"img","rootDiskSize":10,"computeClass":"u1.small","sshKey":"k"}"#,
        )
        .unwrap();
        let request = f.validate().unwrap();
        assert_eq!(request.source_pvc_name, "img");
        assert_eq!(request.compute_class, "u1.small");
    }
}
