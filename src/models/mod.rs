//! Typed vocabularies and records shared by parsers, services and entities.
//!
//! Every portal vocabulary (OCDS status strings, status icon file names, CSV
//! labels, region names) is mapped into one canonical enum here so the rest of the
//! crate never compares raw strings.

mod attachment;
mod award;
mod country;
mod ocds;
mod purchase_order;
mod tender;

pub use attachment::{AttachmentInfo, FileType};
pub use award::{AwardResult, ItemAward, ItemAwardStatus, SupplierBid};
pub use country::Country;
pub use ocds::{Address, CompiledRelease, OcdsTender, OpenContract, Party, Record, TenderPeriod};
pub use purchase_order::PurchaseOrderStatus;
pub use tender::{Answer, Item, Question, Region, Status, Tier};
