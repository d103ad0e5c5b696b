use crate::errors::AppError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Status shown in `lblStatusPOValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PurchaseOrderStatus {
    Accepted,
    ReceivedConforming,
    SentToSupplier,
    InProcess,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub const ALL: [PurchaseOrderStatus; 5] = [
        PurchaseOrderStatus::Accepted,
        PurchaseOrderStatus::ReceivedConforming,
        PurchaseOrderStatus::SentToSupplier,
        PurchaseOrderStatus::InProcess,
        PurchaseOrderStatus::Cancelled,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Accepted => "Aceptada",
            Self::ReceivedConforming => "Recepción Conforme",
            Self::SentToSupplier => "Enviada a proveedor",
            Self::InProcess => "En proceso",
            Self::Cancelled => "Cancelada",
        }
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.display_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                AppError::ValueFormat(format!("Unknown purchase order status: {trimmed}"))
            })
    }
}
