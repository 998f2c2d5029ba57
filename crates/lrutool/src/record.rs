//! Binary operation records
//!
//! A record is `op: u8`, `value: i32` big-endian, then the key as the
//! remaining bytes (lossy UTF-8). Op codes: 1 set, 2 get, 3 delete, 4 clear.
//! Record files hold a sequence of records, each prefixed by its length as
//! a big-endian `u16`.

use bytes::Buf;

/// Shortest valid record: op, value and at least one key byte
pub const MIN_RECORD_LEN: usize = 6;

/// One decoded cache operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Op 1
    Set { key: String, value: i32 },
    /// Op 2
    Get { key: String },
    /// Op 3
    Delete { key: String },
    /// Op 4
    Clear,
}

impl Record {
    /// Decode a single unframed record
    pub fn decode(mut data: &[u8]) -> Result<Record, String> {
        if data.len() < MIN_RECORD_LEN {
            return Err(format!(
                "record too short: {} bytes (min {})",
                data.len(),
                MIN_RECORD_LEN
            ));
        }

        let op = data.get_u8();
        let value = data.get_i32();
        let key = String::from_utf8_lossy(data).into_owned();

        match op {
            1 => Ok(Record::Set { key, value }),
            2 => Ok(Record::Get { key }),
            3 => Ok(Record::Delete { key }),
            4 => Ok(Record::Clear),
            other => Err(format!("unknown op code {}", other)),
        }
    }
}

/// Split a buffer of length-prefixed records and decode each one
pub fn parse_framed(mut buf: &[u8]) -> Result<Vec<Record>, String> {
    let mut records = Vec::new();

    while buf.has_remaining() {
        if buf.remaining() < 2 {
            return Err(format!("record {}: truncated length prefix", records.len()));
        }

        let len = buf.get_u16() as usize;
        if buf.remaining() < len {
            return Err(format!(
                "record {}: need {} bytes, {} left",
                records.len(),
                len,
                buf.remaining()
            ));
        }

        let record =
            Record::decode(&buf[..len]).map_err(|e| format!("record {}: {}", records.len(), e))?;
        buf.advance(len);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(op: u8, value: i32, key: &str) -> Vec<u8> {
        let mut data = vec![op];
        data.extend_from_slice(&value.to_be_bytes());
        data.extend_from_slice(key.as_bytes());
        data
    }

    fn framed(records: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = Vec::new();
        for record in records {
            buf.extend_from_slice(&(record.len() as u16).to_be_bytes());
            buf.extend_from_slice(record);
        }
        buf
    }

    #[test]
    fn test_decode_set() {
        let record = Record::decode(&raw(1, 0x01020304, "key1")).unwrap();
        assert_eq!(
            record,
            Record::Set {
                key: "key1".to_string(),
                value: 16909060
            }
        );
    }

    #[test]
    fn test_decode_negative_value() {
        let record = Record::decode(&raw(1, -5, "k")).unwrap();
        assert_eq!(
            record,
            Record::Set {
                key: "k".to_string(),
                value: -5
            }
        );
    }

    #[test]
    fn test_decode_other_ops() {
        assert_eq!(
            Record::decode(&raw(2, 0, "a")).unwrap(),
            Record::Get { key: "a".to_string() }
        );
        assert_eq!(
            Record::decode(&raw(3, 0, "a")).unwrap(),
            Record::Delete { key: "a".to_string() }
        );
        assert_eq!(Record::decode(&raw(4, 0, "a")).unwrap(), Record::Clear);
    }

    #[test]
    fn test_decode_rejects_short_and_unknown() {
        assert!(Record::decode(&[1, 0, 0, 0, 1]).is_err());
        assert!(Record::decode(&raw(9, 0, "a")).unwrap_err().contains("unknown op"));
    }

    #[test]
    fn test_decode_lossy_key() {
        let mut data = raw(2, 0, "");
        data.extend_from_slice(&[0xff, b'x']);
        assert_eq!(
            Record::decode(&data).unwrap(),
            Record::Get {
                key: "\u{fffd}x".to_string()
            }
        );
    }

    #[test]
    fn test_parse_framed() {
        let buf = framed(&[raw(1, 7, "a"), raw(2, 0, "a"), raw(4, 0, "-")]);
        let records = parse_framed(&buf).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[2], Record::Clear);
    }

    #[test]
    fn test_parse_framed_truncated() {
        let mut buf = framed(&[raw(1, 7, "a")]);
        buf.pop();
        assert!(parse_framed(&buf).unwrap_err().contains("record 0"));

        assert!(parse_framed(&[0]).is_err());
        assert_eq!(parse_framed(&[]).unwrap(), vec![]);
    }
}
