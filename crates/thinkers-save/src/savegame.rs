//! Whole-level save and restore.

use std::io::{Read, Write};

use log::{info, warn};
use thinkers_engine::Level;

use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::SaveError;
use crate::header::{decode_header, encode_header, SaveMetadata};

/// Write `level` to `w` as a complete save file.
///
/// With `keep_players`, players are left out; the loading side is
/// expected to carry its own. Returns the number of bytes written.
pub fn save_level<W: Write>(level: &Level, w: W, keep_players: bool) -> Result<u64, SaveError> {
    let mut out = BinaryWriter::new(w);
    let meta = SaveMetadata::new(level.name(), level.maptime());
    encode_header(&mut out, &meta)?;
    level.save(&mut out, keep_players)?;
    out.flush()?;
    info!(
        "saved level {} ({} thinkers, {} bytes)",
        level.name(),
        level.table().len(),
        out.bytes_written()
    );
    Ok(out.bytes_written())
}

/// Restore `level` from a save file written by [`save_level`].
///
/// The header is validated before the level is touched. A failure
/// after that leaves the level as the engine's load left it: emptied,
/// or holding only its players when `keep_players` is set.
pub fn load_level<R: Read>(
    level: &mut Level,
    r: R,
    keep_players: bool,
) -> Result<SaveMetadata, SaveError> {
    let mut inp = BinaryReader::new(r);
    let meta = decode_header(&mut inp)?;
    if meta.level_name != level.name() {
        warn!(
            "loading save of {} into level {}",
            meta.level_name,
            level.name()
        );
    }
    let loaded = level.load(&mut inp, keep_players)?;
    info!(
        "loaded level {} ({loaded} thinkers, engine {})",
        meta.level_name, meta.engine_version
    );
    Ok(meta)
}
