//! Operator draft and stored-record models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gender of a dependent child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "M"),
            Self::Female => write!(f, "F"),
        }
    }
}

/// Company T-shirt size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShirtSize {
    S,
    M,
    L,
    Xl,
}

impl std::fmt::Display for ShirtSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
        };
        write!(f, "{s}")
    }
}

/// Employment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorStatus {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// Reference to an image, either already uploaded or on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            mime_type: None,
        }
    }

    /// The server already holds this asset.
    pub fn is_remote(&self) -> bool {
        self.uri.starts_with("http")
    }
}

/// A dependent child declared in step 2.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Son {
    pub name: String,
    pub birth_date: String,
    pub gender: Option<Gender>,
}

/// Step 1: identity and contact data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentitySection {
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub type_id: String,
    pub id_number: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Step 2: licence and dependents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependentsSection {
    pub number_licence: String,
    pub zipcode: Option<String>,
    pub has_minors: bool,
    pub n_children: u32,
    pub sons: Vec<Son>,
    pub license_front: Option<ImageRef>,
    pub license_back: Option<ImageRef>,
}

/// Step 3: employment data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmploymentSection {
    pub code: String,
    /// Kept as typed text until validated.
    pub salary: String,
    pub size_t_shift: Option<ShirtSize>,
    pub name_t_shift: String,
    pub photo: Option<ImageRef>,
    pub status: Option<OperatorStatus>,
}

/// In-progress operator built across the three wizard steps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorDraft {
    /// Present and non-zero only when editing an existing operator.
    pub id_operator: Option<i64>,
    pub identity: IdentitySection,
    pub dependents: DependentsSection,
    pub employment: EmploymentSection,
}

impl OperatorDraft {
    /// Existing operator id, treating zero as "not set".
    pub fn editing_id(&self) -> Option<i64> {
        self.id_operator.filter(|id| *id != 0)
    }

    /// Seed an edit session from a stored operator.
    pub fn from_operator(op: &Operator) -> Self {
        Self {
            id_operator: Some(op.id_operator),
            identity: IdentitySection {
                first_name: op.first_name.clone(),
                last_name: op.last_name.clone(),
                birth_date: op.birth_date.clone(),
                type_id: op.type_id.clone(),
                id_number: op.id_number.clone(),
                address: op.address.clone(),
                phone: op.phone.clone(),
                email: op.email.clone(),
            },
            dependents: DependentsSection {
                number_licence: op.number_licence.clone(),
                zipcode: op.zipcode.clone(),
                has_minors: op.has_minors,
                n_children: op.n_children,
                sons: op.sons.clone(),
                license_front: op.license_front.as_deref().map(ImageRef::new),
                license_back: op.license_back.as_deref().map(ImageRef::new),
            },
            employment: EmploymentSection {
                code: op.code.clone(),
                salary: op.salary.map(|s| s.to_string()).unwrap_or_default(),
                size_t_shift: op.size_t_shift,
                name_t_shift: op.name_t_shift.clone(),
                photo: op.photo.as_deref().map(ImageRef::new),
                status: Some(op.status),
            },
        }
    }
}

/// Canonical operator as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id_operator: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub type_id: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub number_licence: String,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub has_minors: bool,
    #[serde(default)]
    pub n_children: u32,
    #[serde(default)]
    pub sons: Vec<Son>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub size_t_shift: Option<ShirtSize>,
    #[serde(default)]
    pub name_t_shift: String,
    #[serde(default)]
    pub status: OperatorStatus,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub license_front: Option<String>,
    #[serde(default)]
    pub license_back: Option<String>,
}

/// Partial update applied by a step screen, the `updateFormData` payload.
///
/// Every `Some` field overwrites the draft; `None` leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OperatorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub type_id: Option<String>,
    pub id_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub number_licence: Option<String>,
    pub zipcode: Option<String>,
    pub has_minors: Option<bool>,
    pub sons: Option<Vec<Son>>,
    pub license_front: Option<ImageRef>,
    pub license_back: Option<ImageRef>,
    pub code: Option<String>,
    pub salary: Option<String>,
    pub size_t_shift: Option<ShirtSize>,
    pub name_t_shift: Option<String>,
    pub photo: Option<ImageRef>,
    pub status: Option<OperatorStatus>,
}

impl OperatorPatch {
    /// Apply this patch onto a draft.
    pub fn apply(self, draft: &mut OperatorDraft) {
        let id = &mut draft.identity;
        set(&mut id.first_name, self.first_name);
        set(&mut id.last_name, self.last_name);
        set(&mut id.birth_date, self.birth_date);
        set(&mut id.type_id, self.type_id);
        set(&mut id.id_number, self.id_number);
        set(&mut id.address, self.address);
        set(&mut id.phone, self.phone);
        if let Some(email) = self.email {
            id.email = non_empty(email);
        }

        let dep = &mut draft.dependents;
        set(&mut dep.number_licence, self.number_licence);
        if let Some(zip) = self.zipcode {
            dep.zipcode = non_empty(zip);
        }
        set(&mut dep.has_minors, self.has_minors);
        set(&mut dep.sons, self.sons);
        if self.license_front.is_some() {
            dep.license_front = self.license_front;
        }
        if self.license_back.is_some() {
            dep.license_back = self.license_back;
        }

        let emp = &mut draft.employment;
        set(&mut emp.code, self.code);
        set(&mut emp.salary, self.salary);
        if self.size_t_shift.is_some() {
            emp.size_t_shift = self.size_t_shift;
        }
        set(&mut emp.name_t_shift, self.name_t_shift);
        if self.photo.is_some() {
            emp.photo = self.photo;
        }
        if self.status.is_some() {
            emp.status = self.status;
        }
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_remote_detection() {
        assert!(ImageRef::new("https://cdn/x.jpg").is_remote());
        assert!(ImageRef::new("http://cdn/x.jpg").is_remote());
        assert!(!ImageRef::new("file:///tmp/x.jpg").is_remote());
        assert!(!ImageRef::new("/data/user/0/x.jpg").is_remote());
    }

    #[test]
    fn editing_id_ignores_zero() {
        let mut draft = OperatorDraft::default();
        assert_eq!(draft.editing_id(), None);
        draft.id_operator = Some(0);
        assert_eq!(draft.editing_id(), None);
        draft.id_operator = Some(42);
        assert_eq!(draft.editing_id(), Some(42));
    }

    #[test]
    fn enum_wire_names() {
        assert_eq!(serde_json::to_string(&ShirtSize::Xl).unwrap(), "\"XL\"");
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"F\"");
        assert_eq!(
            serde_json::to_string(&OperatorStatus::Inactive).unwrap(),
            "\"inactive\""
        );
        assert_eq!(ShirtSize::Xl.to_string(), "XL");
        assert_eq!(OperatorStatus::default(), OperatorStatus::Active);
    }

    #[test]
    fn patch_overwrites_only_given_fields() {
        let mut draft = OperatorDraft::default();
        draft.identity.last_name = "Perez".into();

        let patch: OperatorPatch = serde_json::from_value(serde_json::json!({
            "first_name": "Ana",
            "email": "",
            "size_t_shift": "L"
        }))
        .unwrap();
        patch.apply(&mut draft);

        assert_eq!(draft.identity.first_name, "Ana");
        assert_eq!(draft.identity.last_name, "Perez");
        assert_eq!(draft.identity.email, None, "blank email counts as not provided");
        assert_eq!(draft.employment.size_t_shift, Some(ShirtSize::L));
    }

    #[test]
    fn from_operator_marks_images_remote() {
        let op: Operator = serde_json::from_value(serde_json::json!({
            "id_operator": 42,
            "first_name": "Luis",
            "last_name": "Gomez",
            "salary": "1500.50",
            "status": "inactive",
            "photo": "https://cdn/p.jpg",
            "license_front": "https://cdn/f.jpg"
        }))
        .unwrap();

        let draft = OperatorDraft::from_operator(&op);
        assert_eq!(draft.editing_id(), Some(42));
        assert_eq!(draft.employment.salary, "1500.50");
        assert_eq!(draft.employment.status, Some(OperatorStatus::Inactive));
        assert!(draft.employment.photo.as_ref().unwrap().is_remote());
        assert!(draft.dependents.license_front.as_ref().unwrap().is_remote());
        assert!(draft.dependents.license_back.is_none());
    }
}
