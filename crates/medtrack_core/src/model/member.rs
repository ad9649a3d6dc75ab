//! Household member model.
//!
//! # Invariants
//! - `name` is non-empty after trimming.
//! - `avatar` is carried through untouched; nothing reads it.

use crate::model::new_id;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};

pub type MemberId = String;

pub const DEFAULT_MEMBER_NAME: &str = "Me";
pub const DEFAULT_MEMBER_RELATIONSHIP: &str = "Self";

/// A person whose medicines are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(default)]
    pub relationship: String,
    /// Free-form; older records store it as a number.
    #[serde(default, deserialize_with = "deserialize_age")]
    pub age: Option<String>,
    #[serde(default)]
    pub avatar: String,
}

impl Member {
    /// Creates a validated member with a fresh id.
    pub fn new(
        name: impl Into<String>,
        relationship: impl Into<String>,
        age: Option<String>,
    ) -> Result<Self, ValidationError> {
        let member = Self {
            id: new_id("u_"),
            name: name.into().trim().to_string(),
            relationship: relationship.into().trim().to_string(),
            age: age
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            avatar: String::new(),
        };
        member.validate()?;
        Ok(member)
    }

    /// The member auto-created when the household is empty.
    pub fn default_self() -> Self {
        Self {
            id: new_id("u_"),
            name: DEFAULT_MEMBER_NAME.to_string(),
            relationship: DEFAULT_MEMBER_RELATIONSHIP.to_string(),
            age: None,
            avatar: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyMemberName);
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AgeRepr {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_age<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let age = match Option::<AgeRepr>::deserialize(deserializer)? {
        Some(AgeRepr::Text(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Some(AgeRepr::Number(number)) => Some(number.to_string()),
        None => None,
    };
    Ok(age)
}
