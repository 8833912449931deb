// =============================================================================
// Shared types used across the options analyzer
// =============================================================================

use serde::{Deserialize, Serialize};

/// One side of an option contract pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    Call,
    Put,
}

impl Leg {
    /// Both legs in processing order (call first).
    pub const ALL: [Leg; 2] = [Leg::Call, Leg::Put];

    /// Upper-case label used for report file names and sheet names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Put => "PUT",
        }
    }
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "Call"),
            Self::Put => write!(f, "Put"),
        }
    }
}

/// The upstream security a company name resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIdentity {
    pub display_name: String,
    pub search_id: String,
    pub exchange_scrip_code: String,
}

/// The at-the-money call/put pair picked from an option chain.
///
/// `reference_strike` is the raw upstream strike (scaled by 100);
/// `reference_price` is the underlying's last traded price at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractPair {
    pub call_contract_id: Option<String>,
    pub put_contract_id: Option<String>,
    pub reference_strike: f64,
    pub reference_price: f64,
}

impl ContractPair {
    /// Contract id for the given leg, if the chain carried one.
    pub fn contract_id(&self, leg: Leg) -> Option<&str> {
        match leg {
            Leg::Call => self.call_contract_id.as_deref(),
            Leg::Put => self.put_contract_id.as_deref(),
        }
    }

    /// Strike in price units (upstream strikes are stored x100).
    pub fn strike(&self) -> f64 {
        self.reference_strike / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_id_per_leg() {
        let pair = ContractPair {
            call_contract_id: Some("C1".into()),
            put_contract_id: None,
            reference_strike: 10_000.0,
            reference_price: 101.0,
        };
        assert_eq!(pair.contract_id(Leg::Call), Some("C1"));
        assert_eq!(pair.contract_id(Leg::Put), None);
        assert!((pair.strike() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn leg_labels() {
        assert_eq!(Leg::Call.label(), "CALL");
        assert_eq!(Leg::Put.to_string(), "Put");
    }
}
