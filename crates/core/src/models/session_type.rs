use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

pub type SessionTypeId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionType {
    pub id: SessionTypeId,
    pub name: String,
    pub category: String,
    pub length_minutes: u32,
    pub order: i32,
    pub min_rating: i32,
    /// Non-bookable types stay referenced by historical sessions but are
    /// never offered.
    pub bookable: bool,
}

/// Staff-editable fields of a session type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTypeDraft {
    pub name: String,
    pub category: String,
    pub length_minutes: u32,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_min_rating")]
    pub min_rating: i32,
    #[serde(default = "default_bookable")]
    pub bookable: bool,
}

fn default_min_rating() -> i32 {
    2
}

fn default_bookable() -> bool {
    true
}

impl SessionTypeDraft {
    pub fn validate(&self) -> BookingResult<()> {
        if self.name.trim().is_empty() {
            return Err(BookingError::Validation("name must not be empty".to_string()));
        }
        if self.category.trim().is_empty() {
            return Err(BookingError::Validation("category must not be empty".to_string()));
        }
        if self.length_minutes == 0 {
            return Err(BookingError::Validation(
                "length must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_session_type(self, id: SessionTypeId) -> SessionType {
        SessionType {
            id,
            name: self.name,
            category: self.category,
            length_minutes: self.length_minutes,
            order: self.order,
            min_rating: self.min_rating,
            bookable: self.bookable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCategory {
    pub category: String,
    pub items: Vec<SessionType>,
}

/// Groups bookable types into consecutive categories after sorting by `order`.
///
/// A category split by another category's types appears twice, once per run.
pub fn categorize(types: &[SessionType]) -> Vec<SessionCategory> {
    let mut sorted: Vec<&SessionType> = types.iter().filter(|t| t.bookable).collect();
    sorted.sort_by_key(|t| t.order);

    let mut categories: Vec<SessionCategory> = Vec::new();
    for session_type in sorted {
        match categories.last_mut() {
            Some(last) if last.category == session_type.category => {
                last.items.push(session_type.clone());
            }
            _ => categories.push(SessionCategory {
                category: session_type.category.clone(),
                items: vec![session_type.clone()],
            }),
        }
    }
    categories
}
