// src/models/student.rs

use serde::{Deserialize, Serialize};

/// A student enrolled in a class, as returned by the class roster endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
}
