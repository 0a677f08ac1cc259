//! Decompression Operations

use crate::Compression;
#[cfg(feature = "zstd")]
use crate::error::ErrorKind;
use crate::error::Result;
use bzip2::read::MultiBzDecoder;
#[cfg(feature = "zstd")]
use exn::ResultExt;
use flate2::read::MultiGzDecoder;
use std::io::Read;
#[cfg(feature = "xz")]
use xz2::read::XzDecoder;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

impl Compression {
    /// Wrap a reader with the appropriate decompression layer.
    ///
    /// Gzip and Bzip2 use the multi-member decoders: `tar czf` output is a
    /// single member, but concatenated archives are valid and decode fully.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::{Cursor, Read};
    /// use sluice_compress::Compression;
    ///
    /// let mut reader = Compression::None.wrap_reader(Cursor::new(b"plain")).unwrap();
    /// let mut out = String::new();
    /// reader.read_to_string(&mut out).unwrap();
    /// assert_eq!(out, "plain");
    /// ```
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => Box::new(reader),
            Compression::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            #[cfg(feature = "xz")]
            Compression::Xz => Box::new(XzDecoder::new_multi_decoder(reader)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Box::new(ZstdDecoder::new(reader).or_raise(|| ErrorKind::Decoder)?),
        })
    }
}
