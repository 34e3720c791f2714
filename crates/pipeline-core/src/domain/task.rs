use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task the pipeline generates artifacts for. Owned and mutated outside
/// the pipeline core; the core only ever reads it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub input_spec: String,
}
