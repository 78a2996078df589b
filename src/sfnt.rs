use crate::error::ContextError;

const COLLECTION_TAG: &[u8; 4] = b"ttcf";
const TABLE_RECORD_LENGTH: usize = 16;
const OFFSET_TABLE_LENGTH: usize = 12;

/// The outline format of a font program, which decides how it is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontProgramKind {
    /// `glyf` outlines, embedded as `FontFile2` under a `CIDFontType2`.
    TrueType,
    /// `CFF ` outlines, embedded as `FontFile3` of subtype `OpenType` under a `CIDFontType0`.
    OpenTypeCff,
}

impl FontProgramKind {
    /// Detects the outline format from the table directory of a single font.
    pub fn detect(sfnt: &[u8]) -> Result<Self, ContextError> {
        let tags = table_records(sfnt, 0)?
            .into_iter()
            .map(|record| record.tag)
            .collect::<Vec<_>>();
        if tags.iter().any(|tag| tag == b"glyf") {
            Ok(FontProgramKind::TrueType)
        } else if tags.iter().any(|tag| tag == b"CFF " || tag == b"CFF2") {
            Ok(FontProgramKind::OpenTypeCff)
        } else {
            Err(ContextError::with_context(
                "The font has neither TrueType nor CFF outlines",
            ))
        }
    }

    pub fn font_file_key(&self) -> &'static str {
        match self {
            FontProgramKind::TrueType => "FontFile2",
            FontProgramKind::OpenTypeCff => "FontFile3",
        }
    }

    pub fn cid_font_subtype(&self) -> &'static str {
        match self {
            FontProgramKind::TrueType => "CIDFontType2",
            FontProgramKind::OpenTypeCff => "CIDFontType0",
        }
    }

    /// The `Subtype` of the font file stream, if any.
    pub fn font_file_subtype(&self) -> Option<&'static str> {
        match self {
            FontProgramKind::TrueType => None,
            FontProgramKind::OpenTypeCff => Some("OpenType"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TableRecord {
    tag: [u8; 4],
    checksum: u32,
    offset: usize,
    length: usize,
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, ContextError> {
    data.get(offset..offset + 2)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
        .ok_or_else(|| ContextError::with_context("The font data is truncated"))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, ContextError> {
    data.get(offset..offset + 4)
        .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .ok_or_else(|| ContextError::with_context("The font data is truncated"))
}

/// The table records of the offset table starting at `directory_offset`.
fn table_records(data: &[u8], directory_offset: usize) -> Result<Vec<TableRecord>, ContextError> {
    let table_count = read_u16(data, directory_offset + 4)? as usize;
    (0..table_count)
        .map(|table_index| {
            let record_offset = directory_offset + OFFSET_TABLE_LENGTH + table_index * TABLE_RECORD_LENGTH;
            let tag = data
                .get(record_offset..record_offset + 4)
                .and_then(|tag| <[u8; 4]>::try_from(tag).ok())
                .ok_or_else(|| ContextError::with_context("The font data is truncated"))?;
            Ok(TableRecord {
                tag,
                checksum: read_u32(data, record_offset + 4)?,
                offset: read_u32(data, record_offset + 8)? as usize,
                length: read_u32(data, record_offset + 12)? as usize,
            })
        })
        .collect()
}

pub fn is_collection(data: &[u8]) -> bool {
    data.starts_with(COLLECTION_TAG)
}

/// Returns a standalone font holding the face at `face_index` of a collection, or the data
/// unchanged when it is already a single font.
///
/// Table offsets inside a collection are relative to the whole file, so the tables of the face
/// are copied behind a fresh offset table, each padded to four bytes.
pub fn extract_face(data: &[u8], face_index: u32) -> Result<Vec<u8>, ContextError> {
    if !is_collection(data) {
        return Ok(data.to_vec());
    }

    let face_count = read_u32(data, 8)?;
    if face_index >= face_count {
        return Err(ContextError::with_context(format!(
            "The font collection holds {} faces, face {} was requested",
            face_count, face_index
        )));
    }
    let directory_offset = read_u32(data, 12 + face_index as usize * 4)? as usize;
    let records = table_records(data, directory_offset)?;

    let directory_length = OFFSET_TABLE_LENGTH + records.len() * TABLE_RECORD_LENGTH;
    let mut sfnt = data
        .get(directory_offset..directory_offset + OFFSET_TABLE_LENGTH)
        .ok_or_else(|| ContextError::with_context("The font data is truncated"))?
        .to_vec();
    let mut table_data = Vec::new();
    for record in records.iter() {
        let table = data
            .get(record.offset..record.offset + record.length)
            .ok_or_else(|| {
                ContextError::with_context(format!(
                    "The table {:?} lies outside of the font collection",
                    String::from_utf8_lossy(&record.tag)
                ))
            })?;
        let new_offset = directory_length + table_data.len();
        sfnt.extend_from_slice(&record.tag);
        sfnt.extend_from_slice(&record.checksum.to_be_bytes());
        sfnt.extend_from_slice(&(new_offset as u32).to_be_bytes());
        sfnt.extend_from_slice(&(record.length as u32).to_be_bytes());

        table_data.extend_from_slice(table);
        table_data.resize(table_data.len().next_multiple_of(4), 0);
    }
    sfnt.extend_from_slice(&table_data);

    Ok(sfnt)
}
