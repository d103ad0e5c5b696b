use crate::errors::AppError;
use serde::Serialize;
use std::str::FromStr;

/// Outcome of a single supplier bid for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemAwardStatus {
    Awarded,
    NotAwarded,
}

impl ItemAwardStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Awarded => "Adjudicada",
            Self::NotAwarded => "No Adjudicada",
        }
    }
}

impl FromStr for ItemAwardStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Adjudicada" => Ok(Self::Awarded),
            "No Adjudicada" => Ok(Self::NotAwarded),
            other => Err(AppError::ValueFormat(format!(
                "Unknown item award status: {other}"
            ))),
        }
    }
}

/// A supplier's bid on one awarded item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierBid {
    pub rut: String,
    pub name: String,
    pub item_description: String,
    pub total_price: i64,
    pub awarded_quantity: String,
    pub total_awarded_amount: i64,
    pub result: ItemAwardStatus,
}

/// One item of the award act with every bid it received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAward {
    pub index: u32,
    pub onu_code: String,
    pub name: String,
    pub description: String,
    pub quantity: String,
    pub total_awarded_amount: i64,
    pub suppliers: Vec<SupplierBid>,
}

/// Award act results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwardResult {
    pub items: Vec<ItemAward>,
    pub total_awarded_amount: i64,
}

impl AwardResult {
    /// Bids that won their item.
    pub fn winning_bids(&self) -> impl Iterator<Item = (&ItemAward, &SupplierBid)> {
        self.items.iter().flat_map(|item| {
            item.suppliers
                .iter()
                .filter(|bid| bid.result == ItemAwardStatus::Awarded)
                .map(move |bid| (item, bid))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_award_status_parse() {
        assert_eq!(
            "No Adjudicada".parse::<ItemAwardStatus>().unwrap(),
            ItemAwardStatus::NotAwarded
        );
        assert_eq!(
            " Adjudicada ".parse::<ItemAwardStatus>().unwrap(),
            ItemAwardStatus::Awarded
        );
        assert!("Pendiente".parse::<ItemAwardStatus>().is_err());
    }
}
