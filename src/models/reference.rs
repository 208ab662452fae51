//! Flat reference entities: production lines and sample types.
//!
//! No lifecycle beyond create and delete. The backend refuses to delete
//! one that existing samples still reference; that refusal comes back as
//! a normal API error and must reach the operator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLine {
    pub production_id: i64,
    pub line_code: String,
    pub line_name: String,
    #[serde(default)]
    pub line_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProductionLine {
    pub line_code: String,
    pub line_name: String,
    pub line_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleType {
    pub sample_type_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSampleType {
    pub name: String,
    pub description: Option<String>,
}
