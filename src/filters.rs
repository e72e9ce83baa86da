use std::io::Read;

use crate::value::Value;
use crate::Error;

/// Applies one named stream filter with its `/DecodeParms` entry.
pub(crate) fn apply(name: &str, data: Vec<u8>, parms: &Value<'_>) -> Result<Vec<u8>, Error> {
    match name {
        "FlateDecode" => flate_decode(&data, parms),
        "ASCII85Decode" => {
            if !parms.is_null() {
                return Err(Error::Unsupported(format!(
                    "DecodeParms for ASCII85Decode: {}",
                    parms
                )));
            }
            ascii85_decode(&data)
        }
        _ => Err(Error::Unsupported(format!("stream filter {}", name))),
    }
}

fn flate_decode(data: &[u8], parms: &Value<'_>) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    decoder
        .read_to_end(&mut out)
        .map_err(|err| Error::Malformed(format!("zlib: {}", err)))?;

    let predictor = parms.key("Predictor");
    if predictor.is_null() {
        return Ok(out);
    }
    match predictor.int64() {
        12 => {
            let columns = parms.key("Columns").int64();
            png_up(&out, columns.max(0) as usize)
        }
        other => Err(Error::Unsupported(format!("predictor {}", other))),
    }
}

/// PNG-Up predictor: each row of `columns` bytes is the byte-wise wrapping
/// sum of the encoded row and the decoded row above it. The leading tag
/// byte of every row must be 2 ("Up").
fn png_up(data: &[u8], columns: usize) -> Result<Vec<u8>, Error> {
    if columns == 0 {
        return Err(Error::Malformed("PNG predictor without Columns".to_string()));
    }
    if data.len() % (columns + 1) != 0 {
        return Err(Error::Malformed("truncated PNG-Up row".to_string()));
    }
    let mut hist = vec![0u8; columns];
    let mut out = Vec::with_capacity(data.len() / (columns + 1) * columns);
    for row in data.chunks_exact(columns + 1) {
        if row[0] != 2 {
            return Err(Error::Malformed("malformed PNG-Up encoding".to_string()));
        }
        for (h, &b) in hist.iter_mut().zip(&row[1..]) {
            *h = h.wrapping_add(b);
        }
        out.extend_from_slice(&hist);
    }
    Ok(out)
}

/// ASCII85: bytes outside the alphabet are stripped, `z` stands for four
/// zero bytes, `~` ends the data, and a partial final group of n digits
/// yields n-1 bytes.
fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut group = [0u8; 5];
    let mut len = 0usize;

    for &byte in data {
        if byte == b'~' {
            break;
        }
        if byte == b'z' {
            if len != 0 {
                return Err(Error::Malformed("ascii85: z inside group".to_string()));
            }
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(33..=117).contains(&byte) {
            continue;
        }
        group[len] = byte - 33;
        len += 1;
        if len == 5 {
            push_group(&mut out, &group, 5)?;
            len = 0;
        }
    }

    if len == 1 {
        return Err(Error::Malformed("ascii85: lone trailing digit".to_string()));
    }
    if len > 1 {
        for slot in group.iter_mut().skip(len) {
            *slot = 84;
        }
        push_group(&mut out, &group, len)?;
    }
    Ok(out)
}

fn push_group(out: &mut Vec<u8>, group: &[u8; 5], len: usize) -> Result<(), Error> {
    let mut value: u64 = 0;
    for &digit in group {
        value = value * 85 + u64::from(digit);
    }
    if value > u64::from(u32::MAX) {
        return Err(Error::Malformed("ascii85: group overflow".to_string()));
    }
    let bytes = (value as u32).to_be_bytes();
    out.extend_from_slice(&bytes[..len - 1]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).expect("compress");
        enc.finish().expect("finish")
    }

    #[test]
    fn png_up_accumulates_down_rows() {
        // Rows add column-wise mod 256 onto the running history.
        let raw = [2, 1, 2, 3, 2, 10, 20, 30, 2, 100, 200, 255];
        let decoded = png_up(&raw, 3).expect("png-up");
        assert_eq!(
            decoded,
            vec![
                1, 2, 3, //
                11, 22, 33, //
                111, 222, 32,
            ]
        );
    }

    #[test]
    fn png_up_rejects_wrong_tag() {
        assert!(png_up(&[1, 0, 0], 2).is_err());
    }

    #[test]
    fn flate_with_png_up_parms_round_trip() {
        let raw = [2u8, 5, 6, 2, 5, 6];
        let compressed = zlib(&raw);
        let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
        let mut plain = Vec::new();
        decoder.read_to_end(&mut plain).expect("inflate");
        assert_eq!(plain, raw);
        assert_eq!(png_up(&plain, 2).expect("png-up"), vec![5, 6, 10, 12]);
    }

    #[test]
    fn ascii85_round_trip_with_tail() {
        // "Man " encodes to 9jqo^; partial groups shorten.
        assert_eq!(ascii85_decode(b"9jqo^~>").expect("a85"), b"Man ");
        assert_eq!(ascii85_decode(b"87cURDZ~>").expect("a85"), b"Hello");
    }

    #[test]
    fn ascii85_strips_whitespace_and_z() {
        assert_eq!(
            ascii85_decode(b"z 9jqo ^~>").expect("a85"),
            [&[0u8, 0, 0, 0][..], b"Man "].concat()
        );
    }
}
