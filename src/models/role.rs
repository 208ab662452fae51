//! Principal roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of an authenticated principal, fixed at login time.
///
/// The wire forms are exactly the two strings the backend issues; any
/// other role string fails deserialization rather than silently gaining
/// access to neither surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "manager")]
    Manager,
    #[serde(rename = "lab technician")]
    LabTechnician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::LabTechnician => "lab technician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manager" => Ok(Role::Manager),
            "lab technician" | "lab-technician" | "technician" => Ok(Role::LabTechnician),
            other => Err(format!("unknown role: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_forms() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        assert_eq!(
            serde_json::to_string(&Role::LabTechnician).unwrap(),
            "\"lab technician\""
        );

        let role: Role = serde_json::from_str("\"lab technician\"").unwrap();
        assert_eq!(role, Role::LabTechnician);
    }

    #[test]
    fn test_unknown_role_fails() {
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }

    #[test]
    fn test_cli_spellings() {
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("lab-technician".parse::<Role>().unwrap(), Role::LabTechnician);
        assert_eq!("technician".parse::<Role>().unwrap(), Role::LabTechnician);
    }
}
