//! Data exchanged with the user and opportunity services.

use serde::{Deserialize, Serialize};

/// Gender choices offered in the registration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_choice(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::Male),
            "2" => Some(Self::Female),
            "3" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Age brackets offered in the registration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-30")]
    From25To30,
    #[serde(rename = "31-35")]
    From31To35,
}

impl AgeGroup {
    pub fn from_choice(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::From18To24),
            "2" => Some(Self::From25To30),
            "3" => Some(Self::From31To35),
            _ => None,
        }
    }
}

/// Districts offered in the registration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum District {
    Kampala,
    Wakiso,
    Mukono,
    Other,
}

impl District {
    pub fn from_choice(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::Kampala),
            "2" => Some(Self::Wakiso),
            "3" => Some(Self::Mukono),
            "4" => Some(Self::Other),
            _ => None,
        }
    }
}

/// How far along the applicant's business is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessStage {
    Idea,
    EarlyStage,
    Growth,
    Established,
    Scaling,
}

impl BusinessStage {
    pub fn from_choice(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::Idea),
            "2" => Some(Self::EarlyStage),
            "3" => Some(Self::Growth),
            "4" => Some(Self::Established),
            "5" => Some(Self::Scaling),
            _ => None,
        }
    }
}

/// Opportunity categories browsable from the registered menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityKind {
    Grant,
    Training,
    Job,
}

impl OpportunityKind {
    pub fn from_choice(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::Grant),
            "2" => Some(Self::Training),
            "3" => Some(Self::Job),
            _ => None,
        }
    }

    /// Plural heading used in menu text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Grant => "Grants",
            Self::Training => "Training",
            Self::Job => "Jobs",
        }
    }

    /// Value of the `type` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Grant => "GRANT",
            Self::Training => "TRAINING",
            Self::Job => "JOB",
        }
    }
}

/// Fully assembled registration, submitted once at the end of the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub district: District,
    pub business_stage: BusinessStage,
    /// Channel the registration came through.
    pub source: String,
}

/// One opportunity as rendered in the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityDigest {
    pub title: String,
    #[serde(rename = "type", alias = "opportunityType")]
    pub kind: OpportunityKind,
}

/// The opportunity service returns either a bare list or a page wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OpportunityListing {
    Page { content: Vec<OpportunityDigest> },
    List(Vec<OpportunityDigest>),
}

impl OpportunityListing {
    pub(crate) fn into_vec(self) -> Vec<OpportunityDigest> {
        match self {
            Self::Page { content } => content,
            Self::List(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_map_to_values() {
        assert_eq!(Gender::from_choice("2"), Some(Gender::Female));
        assert_eq!(Gender::from_choice("4"), None);
        assert_eq!(AgeGroup::from_choice("3"), Some(AgeGroup::From31To35));
        assert_eq!(District::from_choice("4"), Some(District::Other));
        assert_eq!(District::from_choice("5"), None);
        assert_eq!(BusinessStage::from_choice("5"), Some(BusinessStage::Scaling));
        assert_eq!(BusinessStage::from_choice("0"), None);
        assert_eq!(OpportunityKind::from_choice("3"), Some(OpportunityKind::Job));
        assert_eq!(OpportunityKind::from_choice("4"), None);
    }

    #[test]
    fn registration_request_wire_format() {
        let request = RegistrationRequest {
            phone_number: "256701234567".into(),
            first_name: "Jane".into(),
            last_name: "Akello".into(),
            gender: Gender::Female,
            age_group: AgeGroup::From25To30,
            district: District::Wakiso,
            business_stage: BusinessStage::EarlyStage,
            source: "USSD".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["phoneNumber"], "256701234567");
        assert_eq!(json["gender"], "FEMALE");
        assert_eq!(json["ageGroup"], "25-30");
        assert_eq!(json["district"], "WAKISO");
        assert_eq!(json["businessStage"], "EARLY_STAGE");
    }

    #[test]
    fn listing_accepts_list_or_page() {
        let list: OpportunityListing =
            serde_json::from_str(r#"[{"title":"Seed Fund","type":"GRANT"}]"#).unwrap();
        assert_eq!(list.into_vec().len(), 1);

        let page: OpportunityListing = serde_json::from_str(
            r#"{"content":[{"title":"Bakery Skills","opportunityType":"TRAINING"}],"totalElements":1}"#,
        )
        .unwrap();
        let items = page.into_vec();
        assert_eq!(items[0].kind, OpportunityKind::Training);
        assert_eq!(items[0].title, "Bakery Skills");
    }
}
