//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "post_status", rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

/// What a lead is reserving. The wire codes are the ones used by the
/// reservation form (`teclado`, `kit`, `pilot`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "purchase_type")]
pub enum PurchaseType {
    #[serde(rename = "teclado")]
    #[sqlx(rename = "teclado")]
    SoloDevice,
    #[default]
    #[serde(rename = "kit")]
    #[sqlx(rename = "kit")]
    BundleKit,
    #[serde(rename = "pilot")]
    #[sqlx(rename = "pilot")]
    PilotProgram,
}

impl PurchaseType {
    pub const ALL: [PurchaseType; 3] = [
        PurchaseType::SoloDevice,
        PurchaseType::BundleKit,
        PurchaseType::PilotProgram,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PurchaseType::SoloDevice => "teclado",
            PurchaseType::BundleKit => "kit",
            PurchaseType::PilotProgram => "pilot",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PurchaseType::SoloDevice => "TeclaFácil (solo)",
            PurchaseType::BundleKit => "TeclaFácil + mouse + audífonos (Kit Profesional)",
            PurchaseType::PilotProgram => "Programa Piloto (Empresa)",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "teclado" => Some(PurchaseType::SoloDevice),
            "kit" => Some(PurchaseType::BundleKit),
            "pilot" => Some(PurchaseType::PilotProgram),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "contact_subject", rename_all = "snake_case")]
pub enum ContactSubject {
    Support,
    Project,
    Quote,
    Other,
}

impl ContactSubject {
    pub const ALL: [ContactSubject; 4] = [
        ContactSubject::Support,
        ContactSubject::Project,
        ContactSubject::Quote,
        ContactSubject::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactSubject::Support => "support",
            ContactSubject::Project => "project",
            ContactSubject::Quote => "quote",
            ContactSubject::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContactSubject::Support => "Soporte técnico",
            ContactSubject::Project => "Nuevo proyecto",
            ContactSubject::Quote => "Cotización",
            ContactSubject::Other => "Otro",
        }
    }
}

impl TryFrom<&str> for ContactSubject {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ContactSubject::ALL
            .into_iter()
            .find(|subject| subject.as_str() == value.trim())
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "product_type", rename_all = "snake_case")]
pub enum ProductType {
    Physical,
    Course,
    Digital,
}

impl ProductType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Physical => "PHYSICAL",
            ProductType::Course => "COURSE",
            ProductType::Digital => "DIGITAL",
        }
    }
}

impl TryFrom<&str> for ProductType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "PHYSICAL" => Ok(ProductType::Physical),
            "COURSE" => Ok(ProductType::Course),
            "DIGITAL" => Ok(ProductType::Digital),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_type_codes_round_trip() {
        for kind in PurchaseType::ALL {
            assert_eq!(PurchaseType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(PurchaseType::from_code("mouse"), None);
    }

    #[test]
    fn purchase_type_serializes_as_form_code() {
        let json = serde_json::to_string(&PurchaseType::PilotProgram).expect("json");
        assert_eq!(json, "\"pilot\"");
    }

    #[test]
    fn product_type_parses_query_values() {
        assert_eq!(ProductType::try_from("COURSE"), Ok(ProductType::Course));
        assert!(ProductType::try_from("course").is_err());
    }
}
