//! Byte order selection.

use std::fmt;

/// Byte order of a file.
///
/// Nintendo containers declare their byte order with a two byte mark
/// (`FE FF` for big endian, `FF FE` for little endian). Wii U files are
/// big endian in practice, but the mark is honoured either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Most significant byte first.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

impl Endian {
    /// Display labels, ordered by byte-order mark value.
    pub const LABELS: [(Endian, &'static str); 2] =
        [(Endian::Big, "Big Endian"), (Endian::Little, "Little Endian")];

    /// The static label table, suitable for populating a selection list.
    #[inline]
    pub const fn labels() -> &'static [(Endian, &'static str); 2] {
        &Self::LABELS
    }

    /// Human readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Endian::Big => Self::LABELS[0].1,
            Endian::Little => Self::LABELS[1].1,
        }
    }

    /// Position of this byte order within [`Endian::LABELS`].
    pub const fn index(self) -> usize {
        match self {
            Endian::Big => 0,
            Endian::Little => 1,
        }
    }

    /// Look up a byte order by its label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .find(|(_, l)| l.eq_ignore_ascii_case(label.trim()))
            .map(|(e, _)| *e)
    }

    /// Interpret the two raw bytes of a byte-order mark.
    pub const fn from_bom(bytes: [u8; 2]) -> Option<Self> {
        match bytes {
            [0xFE, 0xFF] => Some(Endian::Big),
            [0xFF, 0xFE] => Some(Endian::Little),
            _ => None,
        }
    }

    /// The byte-order mark as it appears on disk for this byte order.
    pub const fn bom(self) -> [u8; 2] {
        match self {
            Endian::Big => [0xFE, 0xFF],
            Endian::Little => [0xFF, 0xFE],
        }
    }

    /// The byte order of the running machine.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
