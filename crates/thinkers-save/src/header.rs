//! Save-file header: magic, version, metadata.

use thinkers_core::{ArchiveReader, ArchiveWriter};

use crate::error::SaveError;
use crate::{FORMAT_VERSION, MAGIC};

/// Descriptive fields stored ahead of the thinker payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveMetadata {
    /// Version string of the engine that wrote the file.
    pub engine_version: String,
    /// Name of the saved level.
    pub level_name: String,
    /// Frames run on the saved level, for display in load menus.
    pub maptime: u64,
}

impl SaveMetadata {
    /// Metadata stamped with this crate's version.
    pub fn new(level_name: impl Into<String>, maptime: u64) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            level_name: level_name.into(),
            maptime,
        }
    }
}

/// Write magic, version, and metadata.
pub fn encode_header(w: &mut dyn ArchiveWriter, meta: &SaveMetadata) -> Result<(), SaveError> {
    for b in MAGIC {
        w.write_u8(b)?;
    }
    w.write_u8(FORMAT_VERSION)?;
    w.write_str(&meta.engine_version)?;
    w.write_str(&meta.level_name)?;
    w.write_u64(meta.maptime)?;
    Ok(())
}

/// Read and validate the header.
pub fn decode_header(r: &mut dyn ArchiveReader) -> Result<SaveMetadata, SaveError> {
    let mut magic = [0u8; 4];
    for b in &mut magic {
        *b = r.read_u8()?;
    }
    if magic != MAGIC {
        return Err(SaveError::InvalidMagic);
    }

    let version = r.read_u8()?;
    if version != FORMAT_VERSION {
        return Err(SaveError::UnsupportedVersion { found: version });
    }

    Ok(SaveMetadata {
        engine_version: r.read_string()?,
        level_name: r.read_string()?,
        maptime: r.read_u64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BinaryReader, BinaryWriter};

    fn encoded(meta: &SaveMetadata) -> Vec<u8> {
        let mut w = BinaryWriter::new(Vec::new());
        encode_header(&mut w, meta).unwrap();
        w.into_inner()
    }

    #[test]
    fn header_round_trips() {
        let meta = SaveMetadata::new("MAP07", 350);
        let bytes = encoded(&meta);
        assert_eq!(&bytes[..4], b"THNK");
        let decoded = decode_header(&mut BinaryReader::new(bytes.as_slice())).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut bytes = encoded(&SaveMetadata::new("E1M1", 0));
        bytes[0] = b'X';
        let err = decode_header(&mut BinaryReader::new(bytes.as_slice())).unwrap_err();
        assert!(matches!(err, SaveError::InvalidMagic));
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = encoded(&SaveMetadata::new("E1M1", 0));
        bytes[4] = FORMAT_VERSION + 1;
        let err = decode_header(&mut BinaryReader::new(bytes.as_slice())).unwrap_err();
        assert!(matches!(
            err,
            SaveError::UnsupportedVersion { found } if found == FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn truncated_header_is_io_error() {
        let bytes = encoded(&SaveMetadata::new("E1M1", 0));
        let err = decode_header(&mut BinaryReader::new(&bytes[..7])).unwrap_err();
        assert!(matches!(err, SaveError::Io(_)));
    }
}
