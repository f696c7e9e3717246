// Canonical binary encoding shared by hashing and the wire protocol

use std::io::{self, Read};

/// Upper bound on any length-prefixed field read from untrusted input
pub const MAX_VAR_BYTES: usize = 4 * 1024 * 1024;

/// Trait for types with a deterministic binary encoding
pub trait Serializable: Sized {
    /// Append the encoding of `self` to `buf`
    fn write_to(&self, buf: &mut Vec<u8>);

    /// Decode one value from the reader
    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, String>;

    fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    /// Decode a value that must span the whole input
    fn deserialize(data: &[u8]) -> Result<Self, String> {
        let mut cursor = io::Cursor::new(data);
        let value = Self::read_from(&mut cursor)?;
        if cursor.position() as usize != data.len() {
            return Err(format!(
                "Trailing bytes after value: {}",
                data.len() - cursor.position() as usize
            ));
        }
        Ok(value)
    }
}

/// Write a variable-length integer (VarInt)
pub fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x10000..=0xffffffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Read a variable-length integer (VarInt)
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> io::Result<u64> {
    let mut first_byte = [0u8; 1];
    reader.read_exact(&mut first_byte)?;

    match first_byte[0] {
        0..=0xfc => Ok(first_byte[0] as u64),
        0xfd => {
            let mut bytes = [0u8; 2];
            reader.read_exact(&mut bytes)?;
            Ok(u16::from_le_bytes(bytes) as u64)
        }
        0xfe => {
            let mut bytes = [0u8; 4];
            reader.read_exact(&mut bytes)?;
            Ok(u32::from_le_bytes(bytes) as u64)
        }
        0xff => {
            let mut bytes = [0u8; 8];
            reader.read_exact(&mut bytes)?;
            Ok(u64::from_le_bytes(bytes))
        }
    }
}

/// Write bytes with length prefix (VarInt length + data)
pub fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_varint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

/// Read bytes with length prefix
pub fn read_var_bytes<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>, String> {
    let len = read_varint(reader).map_err(|e| e.to_string())? as usize;
    if len > MAX_VAR_BYTES {
        return Err(format!("Field too long: {} bytes", len));
    }
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).map_err(|e| e.to_string())?;
    Ok(data)
}

pub fn write_string(buf: &mut Vec<u8>, value: &str) {
    write_var_bytes(buf, value.as_bytes());
}

pub fn read_string<R: Read + ?Sized>(reader: &mut R) -> Result<String, String> {
    let bytes = read_var_bytes(reader)?;
    String::from_utf8(bytes).map_err(|e| format!("Invalid UTF-8 string: {}", e))
}

/// Read a fixed-size byte array
pub fn read_array<const N: usize, R: Read + ?Sized>(reader: &mut R) -> Result<[u8; N], String> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes).map_err(|e| e.to_string())?;
    Ok(bytes)
}

/// Read a length prefix for a sequence, bounded like any other field
pub fn read_count<R: Read + ?Sized>(reader: &mut R) -> Result<usize, String> {
    let count = read_varint(reader).map_err(|e| e.to_string())? as usize;
    if count > MAX_VAR_BYTES {
        return Err(format!("Sequence too long: {} items", count));
    }
    Ok(count)
}
