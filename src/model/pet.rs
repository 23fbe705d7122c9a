use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub species: String,

    /// Foreign key into the user collection. Not checked on write.
    pub user_id: i32,
}

impl Pet {
    pub fn new(id: i32, species: impl Into<String>, user_id: i32) -> Self {
        Self {
            id,
            name: None,
            species: species.into(),
            user_id,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }
}
