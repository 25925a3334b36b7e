//! Credit and account parameter types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::client::CreditPackage;

/// Parameters for changing the low-credit alert threshold
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetCreditAlertParams {
    #[schemars(description = "Alert when the credit balance drops to or below this value")]
    pub threshold: u64,
}

/// Parameters for buying a credit package
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PurchaseCreditsParams {
    #[schemars(description = "Credit package: 'starter', 'growth' or 'scale'")]
    pub package: CreditPackage,
}
