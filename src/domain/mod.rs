pub mod deposit;
pub mod gateway;
pub mod ledger;
pub mod money;
pub mod order;
pub mod ports;
pub mod submission;
pub mod task;

use crate::domain::task::UserId;
use serde::{Deserialize, Serialize};

/// The authenticated caller, resolved by the out-of-scope auth layer and
/// threaded explicitly through every operation that acts on its behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub email: String,
}
