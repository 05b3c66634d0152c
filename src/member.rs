use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MemberId;

/// borrower identity record
///
/// Created through admin actions outside the engine; the ledger only reads
/// it to link payments to the loan's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    /// unique national identity number
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Member {
    pub fn new(full_name: impl Into<String>, national_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            national_id: national_id.into(),
            phone: None,
            email: None,
        }
    }
}
