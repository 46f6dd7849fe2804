use serde::{Deserialize, Serialize};

/// Lab roles, in decreasing order of inventory privilege.
///
/// Capability matrix:
///
/// | role           | inward | outward | adjust |
/// |----------------|--------|---------|--------|
/// | Admin          | yes    | yes     | yes    |
/// | Lab Technician | yes    | yes     | no     |
/// | Engineer       | no     | yes     | no     |
/// | Researcher     | no     | no      | no     |
///
/// Adjust stays Admin-only because it is the one operation that can set a
/// quantity disconnected from current stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[serde(rename = "Lab Technician")]
    LabTechnician,
    Engineer,
    Researcher,
}

impl Role {
    pub fn can_inward(self) -> bool {
        matches!(self, Role::Admin | Role::LabTechnician)
    }

    pub fn can_outward(self) -> bool {
        matches!(self, Role::Admin | Role::LabTechnician | Role::Engineer)
    }

    pub fn can_adjust(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::LabTechnician => "Lab Technician",
            Role::Engineer => "Engineer",
            Role::Researcher => "Researcher",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
