//! Body augmentation strategies.
//!
//! # Responsibilities
//! - Append the envelope trailer to a proxied response body
//! - Handle identity, buffered-decode and streaming-recompress modes
//! - Keep transport framing coherent (Content-Length / Content-Encoding)
//!
//! # Design Decisions
//! - `Content-Length` is always dropped once the body changes; the server
//!   reframes with chunked transfer
//! - Encodings a strategy does not understand pass through unmodified with
//!   a warning, never corrupted
//! - Corrupt compressed input surfaces as an error for the caller to map
//!   to a 500-class response

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use hyper::http::header::{CONTENT_ENCODING, CONTENT_LENGTH};
use hyper::http::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the trailer is merged into a possibly-encoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AugmentMode {
    /// Append raw trailer bytes; only touches identity-encoded bodies.
    #[default]
    Append,

    /// Fully decompress, append plaintext, serve unencoded.
    Decode,

    /// Stream-decompress and re-compress in the original scheme, trailer
    /// written before the encoder finalizes.
    Transform,
}

#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("failed to decode {encoding} response body: {source}")]
    Decode {
        encoding: String,
        source: std::io::Error,
    },

    #[error("failed to re-encode {encoding} response body: {source}")]
    Encode {
        encoding: String,
        source: std::io::Error,
    },

    #[error("decoded response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Append `trailer` to `body` under the given strategy, adjusting framing
/// headers in place. `max_decoded` bounds decompression output.
pub fn augment_body(
    mode: AugmentMode,
    headers: &mut HeaderMap,
    body: Bytes,
    trailer: &[u8],
    max_decoded: usize,
) -> Result<Bytes, AugmentError> {
    let encoding = match content_encoding(headers) {
        None => {
            return Ok(append_identity(headers, &body, trailer));
        }
        Some(encoding) => encoding,
    };

    match mode {
        AugmentMode::Append => {
            tracing::warn!(
                encoding = %encoding,
                "Append strategy cannot embed trailer into encoded body; passing through unmodified"
            );
            Ok(body)
        }
        AugmentMode::Decode => match encoding.as_str() {
            "gzip" => {
                let mut decoder = GzDecoder::new(body.as_ref());
                decode_plain(&mut decoder, headers, trailer, &encoding, max_decoded)
            }
            "deflate" => {
                let mut decoder = ZlibDecoder::new(body.as_ref());
                decode_plain(&mut decoder, headers, trailer, &encoding, max_decoded)
            }
            _ => {
                tracing::warn!(
                    encoding = %encoding,
                    "Decode strategy does not understand encoding; passing through unmodified"
                );
                Ok(body)
            }
        },
        AugmentMode::Transform => match encoding.as_str() {
            "gzip" => {
                let mut decoder = GzDecoder::new(body.as_ref());
                let encoder = GzEncoder::new(
                    Vec::with_capacity(body.len() + trailer.len()),
                    Compression::default(),
                );
                recompress(&mut decoder, encoder, headers, trailer, &encoding, max_decoded)
            }
            "deflate" => {
                let mut decoder = ZlibDecoder::new(body.as_ref());
                let encoder = ZlibEncoder::new(
                    Vec::with_capacity(body.len() + trailer.len()),
                    Compression::default(),
                );
                recompress(&mut decoder, encoder, headers, trailer, &encoding, max_decoded)
            }
            _ => {
                tracing::warn!(
                    encoding = %encoding,
                    "Transform strategy does not understand encoding; passing through unmodified"
                );
                Ok(body)
            }
        },
    }
}

/// Normalized Content-Encoding, `None` when identity.
fn content_encoding(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_ENCODING)?.to_str().ok()?;
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() || normalized == "identity" {
        return None;
    }
    Some(normalized)
}

fn append_identity(headers: &mut HeaderMap, body: &[u8], trailer: &[u8]) -> Bytes {
    let mut merged = Vec::with_capacity(body.len() + trailer.len());
    merged.extend_from_slice(body);
    merged.extend_from_slice(trailer);
    // The declared length no longer matches the content.
    headers.remove(CONTENT_LENGTH);
    Bytes::from(merged)
}

/// Decompress fully, append the plaintext trailer, serve unencoded.
fn decode_plain<R: Read>(
    decoder: &mut R,
    headers: &mut HeaderMap,
    trailer: &[u8],
    encoding: &str,
    max_decoded: usize,
) -> Result<Bytes, AugmentError> {
    let mut plain = Vec::new();
    pump(decoder, &mut plain, encoding, max_decoded)?;
    plain.extend_from_slice(trailer);
    headers.remove(CONTENT_ENCODING);
    headers.remove(CONTENT_LENGTH);
    Ok(Bytes::from(plain))
}

/// Decoder → encoder pipeline; the trailer goes in before the encoder is
/// finalized so it lands inside the compressed stream.
fn recompress<R, W>(
    decoder: &mut R,
    mut encoder: W,
    headers: &mut HeaderMap,
    trailer: &[u8],
    encoding: &str,
    max_decoded: usize,
) -> Result<Bytes, AugmentError>
where
    R: Read,
    W: Write + FinishEncoder,
{
    pump(decoder, &mut encoder, encoding, max_decoded)?;
    encoder.write_all(trailer).map_err(|source| AugmentError::Encode {
        encoding: encoding.to_string(),
        source,
    })?;
    let recompressed = encoder.finish_vec().map_err(|source| AugmentError::Encode {
        encoding: encoding.to_string(),
        source,
    })?;
    // Encoding is preserved; only the length is unknowable up front.
    headers.remove(CONTENT_LENGTH);
    Ok(Bytes::from(recompressed))
}

/// Move decoded bytes from `reader` into `writer` in fixed-size chunks,
/// bounding the total decoded size.
fn pump<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    encoding: &str,
    max_decoded: usize,
) -> Result<usize, AugmentError> {
    let mut chunk = [0u8; 8 * 1024];
    let mut copied = 0usize;
    loop {
        let read = reader.read(&mut chunk).map_err(|source| AugmentError::Decode {
            encoding: encoding.to_string(),
            source,
        })?;
        if read == 0 {
            return Ok(copied);
        }
        copied = copied.saturating_add(read);
        if copied > max_decoded {
            return Err(AugmentError::TooLarge { limit: max_decoded });
        }
        writer.write_all(&chunk[..read]).map_err(|source| AugmentError::Encode {
            encoding: encoding.to_string(),
            source,
        })?;
    }
}

/// Finalize a flate2 write-encoder into its inner buffer.
trait FinishEncoder {
    fn finish_vec(self) -> std::io::Result<Vec<u8>>;
}

impl FinishEncoder for GzEncoder<Vec<u8>> {
    fn finish_vec(self) -> std::io::Result<Vec<u8>> {
        self.finish()
    }
}

impl FinishEncoder for ZlibEncoder<Vec<u8>> {
    fn finish_vec(self) -> std::io::Result<Vec<u8>> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::http::header::HeaderValue;

    const MAX: usize = 1024 * 1024;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut decoder = GzDecoder::new(data);
        let mut plain = Vec::new();
        decoder.read_to_end(&mut plain).unwrap();
        plain
    }

    fn encoded_headers(encoding: &str, len: usize) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_str(encoding).unwrap());
        headers.insert(CONTENT_LENGTH, HeaderValue::from_str(&len.to_string()).unwrap());
        headers
    }

    #[test]
    fn test_append_identity_concatenates_and_drops_length() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5"));

        let out = augment_body(
            AugmentMode::Append,
            &mut headers,
            Bytes::from_static(b"hello"),
            b"{\"statusCode\":200}",
            MAX,
        )
        .unwrap();

        assert_eq!(&out[..], b"hello{\"statusCode\":200}");
        assert!(headers.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_append_passes_unknown_encoding_through() {
        let body = Bytes::from_static(b"\x00\x01\x02");
        let mut headers = encoded_headers("br", body.len());

        let out = augment_body(AugmentMode::Append, &mut headers, body.clone(), b"{}", MAX).unwrap();

        assert_eq!(out, body);
        assert!(headers.get(CONTENT_ENCODING).is_some());
        assert!(headers.get(CONTENT_LENGTH).is_some());
    }

    #[test]
    fn test_decode_gzip_appends_plaintext_trailer() {
        let original = b"compressed payload";
        let trailer = b"{\"statusCode\":418}";
        let compressed = gzip(original);
        let mut headers = encoded_headers("gzip", compressed.len());

        let out = augment_body(
            AugmentMode::Decode,
            &mut headers,
            Bytes::from(compressed),
            trailer,
            MAX,
        )
        .unwrap();

        let mut expected = original.to_vec();
        expected.extend_from_slice(trailer);
        assert_eq!(&out[..], &expected[..]);
        assert!(headers.get(CONTENT_ENCODING).is_none());
        assert!(headers.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_transform_gzip_keeps_encoding_and_embeds_trailer() {
        let original = b"streaming payload that should survive recompression";
        let trailer = b"{\"statusCode\":200,\"statusMessage\":\"OK\"}";
        let compressed = gzip(original);
        let mut headers = encoded_headers("gzip", compressed.len());

        let out = augment_body(
            AugmentMode::Transform,
            &mut headers,
            Bytes::from(compressed),
            trailer,
            MAX,
        )
        .unwrap();

        assert_eq!(headers.get(CONTENT_ENCODING).unwrap(), "gzip");
        assert!(headers.get(CONTENT_LENGTH).is_none());

        let mut expected = original.to_vec();
        expected.extend_from_slice(trailer);
        assert_eq!(gunzip(&out), expected);
    }

    #[test]
    fn test_transform_deflate_round_trips() {
        let original = b"deflate body";
        let trailer = b"{}";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();
        let mut headers = encoded_headers("deflate", compressed.len());

        let out = augment_body(
            AugmentMode::Transform,
            &mut headers,
            Bytes::from(compressed),
            trailer,
            MAX,
        )
        .unwrap();

        let mut decoder = ZlibDecoder::new(&out[..]);
        let mut plain = Vec::new();
        decoder.read_to_end(&mut plain).unwrap();

        let mut expected = original.to_vec();
        expected.extend_from_slice(trailer);
        assert_eq!(plain, expected);
    }

    #[test]
    fn test_decode_corrupt_gzip_is_an_error() {
        let mut headers = encoded_headers("gzip", 9);

        let result = augment_body(
            AugmentMode::Decode,
            &mut headers,
            Bytes::from_static(b"not gzip!"),
            b"{}",
            MAX,
        );

        assert!(matches!(result, Err(AugmentError::Decode { .. })));
    }

    #[test]
    fn test_decode_enforces_size_bound() {
        let original = vec![0u8; 64 * 1024];
        let compressed = gzip(&original);
        let mut headers = encoded_headers("gzip", compressed.len());

        let result = augment_body(
            AugmentMode::Decode,
            &mut headers,
            Bytes::from(compressed),
            b"{}",
            1024,
        );

        assert!(matches!(result, Err(AugmentError::TooLarge { .. })));
    }
}
