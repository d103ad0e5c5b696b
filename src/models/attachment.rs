use serde::Serialize;
use std::io::Cursor;

/// File format of a downloaded attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileType {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Zip,
    Rar,
    Jpg,
    Png,
    Other,
}

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const RAR_MAGIC: &[u8] = b"Rar!\x1a\x07";
const JPG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

impl FileType {
    /// Lowercase extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Zip => "zip",
            Self::Rar => "rar",
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Other => "bin",
        }
    }

    /// Guesses the type from the file name extension.
    pub fn from_file_name(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Self::Pdf,
            "doc" => Self::Doc,
            "docx" => Self::Docx,
            "xls" => Self::Xls,
            "xlsx" => Self::Xlsx,
            "zip" => Self::Zip,
            "rar" => Self::Rar,
            "jpg" | "jpeg" => Self::Jpg,
            "png" => Self::Png,
            _ => Self::Other,
        }
    }

    /// Detects the type from the file signature.
    ///
    /// Office Open XML files are ZIP containers, so the archive entries decide
    /// between DOCX, XLSX and plain ZIP. Legacy OLE documents carry no reliable
    /// marker in the header and fall back to `file_name`.
    pub fn detect(content: &[u8], file_name: &str) -> Self {
        if content.starts_with(PDF_MAGIC) {
            Self::Pdf
        } else if content.starts_with(ZIP_MAGIC) {
            Self::from_zip_entries(content)
        } else if content.starts_with(OLE_MAGIC) {
            match Self::from_file_name(file_name) {
                Self::Xls => Self::Xls,
                _ => Self::Doc,
            }
        } else if content.starts_with(RAR_MAGIC) {
            Self::Rar
        } else if content.starts_with(JPG_MAGIC) {
            Self::Jpg
        } else if content.starts_with(PNG_MAGIC) {
            Self::Png
        } else {
            Self::from_file_name(file_name)
        }
    }

    fn from_zip_entries(content: &[u8]) -> Self {
        let Ok(archive) = zip::ZipArchive::new(Cursor::new(content)) else {
            return Self::Zip;
        };

        if archive.file_names().any(|name| name.starts_with("word/")) {
            Self::Docx
        } else if archive.file_names().any(|name| name.starts_with("xl/")) {
            Self::Xlsx
        } else {
            Self::Zip
        }
    }
}

/// One row of the tender attachment table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentInfo {
    /// Numeric suffix of the row's download button (`ctl{id}`)
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub attachment_type: String,
    pub description: String,
    /// Size in bytes
    pub size: u64,
    pub upload_date: String,
}

impl AsRef<AttachmentInfo> for AttachmentInfo {
    fn as_ref(&self) -> &AttachmentInfo {
        self
    }
}
