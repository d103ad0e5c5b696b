// Mercado Publico hosts
pub const MERCADO_PUBLICO_URL: &str = "https://www.mercadopublico.cl";
pub const OCDS_API_URL: &str = "https://apis.mercadopublico.cl";
pub const LISTING_API_URL: &str = "https://api.mercadopublico.cl";
pub const BULK_CSV_URL: &str = "https://transparenciachc.blob.core.windows.net";

// Mercado Publico paths
pub const TENDER_DETAILS_PATH: &str = "/Procurement/Modules/RFB/DetailsAcquisition.aspx";
pub const ATTACHMENT_VIEW_PATH: &str = "/Procurement/Modules/Attachment/ViewAttachment.aspx";
pub const PURCHASE_ORDER_LIST_PATH: &str = "/Procurement/Modules/RFB/PopUpListOC.aspx";
pub const PURCHASE_ORDER_DETAILS_PATH: &str = "/PurchaseOrder/Modules/PO/DetailsPurchaseOrder.aspx";
pub const QUESTIONS_VIEW_PATH: &str = "/Foros/Modules/FNormal/PopUps/PublicView.aspx";
pub const QUESTIONS_SERVICE_PATH: &str = "/Foros/Modules/FNormal/servicesPub.aspx";
pub const AWARD_PREVIEW_PATH: &str = "/Procurement/Modules/RFB/StepsProcessAward/PreviewAwardAct.aspx";
pub const OCDS_RECORD_PATH: &str = "/OCDS/data/record";
pub const OCDS_LISTING_PATH: &str = "/APISOCDS/OCDS/listaOCDSAgnoMes";

// TED hosts
pub const TED_URL: &str = "https://ted.europa.eu";
pub const TED_API_URL: &str = "https://api.ted.europa.eu";

/// Page size of the monthly OCDS listing.
pub const LISTING_PAGE_SIZE: usize = 1000;
/// Page size of the TED search API.
pub const TED_PAGE_SIZE: usize = 250;
/// First year with TED bulk packages.
pub const TED_FIRST_BULK_YEAR: i32 = 2015;

/// Workers used when filtering collections by a lazily fetched field.
pub const DEFAULT_FILTER_CONCURRENCY: usize = 8;

/// Upper bound on buffers pre-sized from a remote size claim.
pub const MAX_BUFFER_HINT: usize = 64 * 1024 * 1024;

/// Internal QA tenders published by Mercado Publico itself.
pub const QA_TENDER_PREFIX: &str = "500977-";

/// Attachment type marking the signed tender base.
pub const SIGNED_BASE_TYPE: &str = "Anexo Resolucion Electronica (Firmada)";

// Bulk CSV columns
pub const CSV_CODE_COLUMN: &str = "CodigoExterno";
pub const CSV_PUBLICATION_DATE_COLUMN: &str = "FechaPublicacion";
pub const CSV_REGION_COLUMN: &str = "RegionUnidad";
pub const CSV_STATUS_COLUMN: &str = "Estado";
