use serde::{Deserialize, Serialize};

/// An employee record. Encodes as protobuf on the RPC wire and as JSON over HTTP.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Employee {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub title: String,
    /// Ids of direct reports.
    #[prost(int64, repeated, tag = "4")]
    pub reports: Vec<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EmployeeId {
    #[prost(int64, tag = "1")]
    pub id: i64,
}

impl EmployeeId {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// An employee with their reports resolved recursively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeHierarchy {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub reports: Vec<EmployeeHierarchy>,
}
