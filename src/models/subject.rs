// src/models/subject.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub num_practicals: u32,
    #[serde(default)]
    pub num_group_projects: u32,
}
