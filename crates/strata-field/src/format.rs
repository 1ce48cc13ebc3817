//! File format selection for field import and export.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::FieldError;

/// Formats a field can be loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImportFormat {
    /// ROFF binary tag stream.
    Roff,
    /// Binary restart keyword file; the keyword may cover the full volume
    /// or only the active cells.
    EclKw,
    /// GRDECL include file.
    Grdecl,
}

impl ImportFormat {
    /// Infer the format of an existing file.
    ///
    /// A `roff-bin` header means ROFF; a big-endian Fortran record framing
    /// a 16-byte keyword header means a restart keyword file; anything else
    /// is read as GRDECL text.
    pub fn guess(path: &Path) -> Result<Self, FieldError> {
        let mut head = [0u8; 20];
        let mut file = File::open(path).map_err(|_| FieldError::NotFound {
            path: path.to_path_buf(),
        })?;
        let mut filled = 0;
        while filled < head.len() {
            let n = file.read(&mut head[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(Self::sniff(&head[..filled]))
    }

    /// Classify the first bytes of a file.
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(crate::roff::BINARY_MAGIC) {
            return Self::Roff;
        }
        if head.len() >= 12 {
            let mut marker = [0u8; 4];
            marker.copy_from_slice(&head[..4]);
            let name = &head[4..12];
            if i32::from_be_bytes(marker) == crate::ecl_kw::HEADER_LEN as i32
                && name.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
            {
                return Self::EclKw;
            }
        }
        Self::Grdecl
    }
}

/// Formats a field can be exported to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Restart keyword holding only the active cells.
    EclKwActiveCells,
    /// Restart keyword over the full volume, inactive cells zero-filled.
    EclKwAllCells,
    /// GRDECL include file, inactive cells zero-filled.
    Grdecl,
    /// ROFF binary, inactive cells filled with the ROFF sentinel.
    Roff,
    /// Active cells appended to a restart stream the caller already opened.
    RestartStream,
}

impl ExportFormat {
    /// Default export format for an output file name: `.roff` and `.grdecl`
    /// extensions select those formats, anything else a full-volume restart
    /// keyword.
    pub fn from_file_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("roff") => Self::Roff,
            Some("grdecl") => Self::Grdecl,
            _ => Self::EclKwAllCells,
        }
    }

    /// Whether the format writes through a caller-supplied stream.
    pub fn needs_stream(self) -> bool {
        matches!(self, Self::RestartStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_format_from_extension() {
        assert_eq!(ExportFormat::from_file_name("poro.roff"), ExportFormat::Roff);
        assert_eq!(ExportFormat::from_file_name("PORO.GRDECL"), ExportFormat::Grdecl);
        assert_eq!(
            ExportFormat::from_file_name("PERMX.INC"),
            ExportFormat::EclKwAllCells
        );
        assert_eq!(
            ExportFormat::from_file_name("no_extension"),
            ExportFormat::EclKwAllCells
        );
    }

    #[test]
    fn sniff_recognizes_headers() {
        assert_eq!(ImportFormat::sniff(b"roff-bin\0#ROFF#"), ImportFormat::Roff);

        let mut ecl = 16i32.to_be_bytes().to_vec();
        ecl.extend_from_slice(b"PORO    ");
        ecl.extend_from_slice(&4i32.to_be_bytes());
        assert_eq!(ImportFormat::sniff(&ecl), ImportFormat::EclKw);

        assert_eq!(ImportFormat::sniff(b"PORO\n 0.1 0.2 /\n"), ImportFormat::Grdecl);
        assert_eq!(ImportFormat::sniff(b""), ImportFormat::Grdecl);
    }

    #[test]
    fn guess_reports_missing_file() {
        let err = ImportFormat::guess(Path::new("/definitely/not/here.grdecl")).unwrap_err();
        assert!(matches!(err, FieldError::NotFound { .. }));
    }
}
