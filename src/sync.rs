//! Stream framing: recognize the sync word and derive version, byte
//! order, and compression flags from it.

use crate::error::RasterError;

/// The four-byte magic a reader or writer exchanges at the start of a
/// stream. Each of the six legal values carries three orthogonal flags:
/// header revision, byte order, and whether pixel data is packbits
/// compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncWord {
    /// `"RaSt"` — original revision, native order, uncompressed.
    Sync,
    /// `"tSaR"` — original revision, byte-swapped, uncompressed.
    RevSync,
    /// `"RaS1"` — V1, native order, uncompressed.
    SyncV1,
    /// `"1SaR"` — V1, byte-swapped, uncompressed.
    RevSyncV1,
    /// `"RaS2"` — V2, native order, packbits compressed.
    SyncV2,
    /// `"2SaR"` — V2, byte-swapped, packbits compressed.
    RevSyncV2,
}

/// Header revision carried by a sync word. V0 and V1 share the same
/// (smaller) header size; only V2 reads/writes the full extended header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Original and V1 revisions: the V1-sized header.
    V1,
    /// V2 revision: the full V2-sized header.
    V2,
}

impl SyncWord {
    const SYNC: [u8; 4] = *b"RaSt";
    const REVSYNC: [u8; 4] = *b"tSaR";
    const SYNC_V1: [u8; 4] = *b"RaS1";
    const REVSYNC_V1: [u8; 4] = *b"1SaR";
    const SYNC_V2: [u8; 4] = *b"RaS2";
    const REVSYNC_V2: [u8; 4] = *b"2SaR";

    /// Recognize the four-byte magic, or fail if it matches none of the
    /// six legal values.
    pub fn decode(bytes: [u8; 4]) -> Result<Self, RasterError> {
        match bytes {
            Self::SYNC => Ok(Self::Sync),
            Self::REVSYNC => Ok(Self::RevSync),
            Self::SYNC_V1 => Ok(Self::SyncV1),
            Self::REVSYNC_V1 => Ok(Self::RevSyncV1),
            Self::SYNC_V2 => Ok(Self::SyncV2),
            Self::REVSYNC_V2 => Ok(Self::RevSyncV2),
            _ => Err(RasterError::BadSync),
        }
    }

    /// The four bytes a writer emits for this sync word.
    pub fn to_bytes(self) -> [u8; 4] {
        match self {
            Self::Sync => Self::SYNC,
            Self::RevSync => Self::REVSYNC,
            Self::SyncV1 => Self::SYNC_V1,
            Self::RevSyncV1 => Self::REVSYNC_V1,
            Self::SyncV2 => Self::SYNC_V2,
            Self::RevSyncV2 => Self::REVSYNC_V2,
        }
    }

    /// The header revision to read/write for this sync word.
    pub fn version(self) -> Version {
        match self {
            Self::Sync | Self::RevSync | Self::SyncV1 | Self::RevSyncV1 => Version::V1,
            Self::SyncV2 | Self::RevSyncV2 => Version::V2,
        }
    }

    /// Whether pixel data on this stream is packbits compressed.
    pub fn compressed(self) -> bool {
        matches!(self, Self::SyncV2 | Self::RevSyncV2)
    }

    /// Whether header scalar fields and multi-byte pixel elements need a
    /// byte swap to reach native order.
    pub fn swapped(self) -> bool {
        matches!(self, Self::RevSync | Self::RevSyncV1 | Self::RevSyncV2)
    }

    /// The sync word a writer emits: native V1, uncompressed, unswapped.
    /// The encoder in this codec never compresses and never byte-swaps
    /// its own output.
    pub fn writer_default() -> Self {
        Self::Sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_all_six_sync_words() {
        assert_eq!(SyncWord::decode(*b"RaSt").unwrap(), SyncWord::Sync);
        assert_eq!(SyncWord::decode(*b"tSaR").unwrap(), SyncWord::RevSync);
        assert_eq!(SyncWord::decode(*b"RaS1").unwrap(), SyncWord::SyncV1);
        assert_eq!(SyncWord::decode(*b"1SaR").unwrap(), SyncWord::RevSyncV1);
        assert_eq!(SyncWord::decode(*b"RaS2").unwrap(), SyncWord::SyncV2);
        assert_eq!(SyncWord::decode(*b"2SaR").unwrap(), SyncWord::RevSyncV2);
    }

    #[test]
    fn rejects_unrecognized_magic() {
        assert!(matches!(
            SyncWord::decode(*b"xxxx"),
            Err(RasterError::BadSync)
        ));
    }

    #[test]
    fn v2_reverse_is_compressed_and_swapped() {
        let sync = SyncWord::decode(*b"2SaR").unwrap();
        assert!(sync.compressed());
        assert!(sync.swapped());
        assert_eq!(sync.version(), Version::V2);
    }

    #[test]
    fn v1_native_is_neither_compressed_nor_swapped() {
        let sync = SyncWord::decode(*b"RaS1").unwrap();
        assert!(!sync.compressed());
        assert!(!sync.swapped());
        assert_eq!(sync.version(), Version::V1);
    }

    #[test]
    fn writer_default_is_native_v1_uncompressed() {
        let sync = SyncWord::writer_default();
        assert_eq!(sync.to_bytes(), *b"RaSt");
        assert!(!sync.compressed());
        assert!(!sync.swapped());
    }
}
