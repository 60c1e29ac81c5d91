//! Schema-driven wire-format decoding.
//!
//! Decodes a binary payload against a [`SchemaModel`] by walking the wire
//! format explicitly with prost's encoding primitives: no generated types,
//! no runtime reflection. Field values are converted to normalized
//! [`Value`]s as they are read, so the output of a decode is directly the
//! material record builders work with.
//!
//! Wire semantics follow proto3: last occurrence wins for singular fields,
//! repeated occurrences accumulate, numeric repeated fields may arrive
//! packed, unknown tags are skipped or rejected per configuration.

use crate::schema::{FieldDescriptor, FieldKind, SchemaModel};
use crate::{ConvertError, ConvertResult, Value};
use bytes::Buf;
use prost::encoding::{decode_key, decode_varint, skip_field, DecodeContext, WireType};

/// Decode a payload against a schema model
///
/// Returns the fields in schema declaration order. Unset non-repeated
/// scalar and enum fields resolve to their wire defaults; only fields with
/// no default (messages, well-known types) and unset repeated fields are
/// omitted from the output.
pub(crate) fn decode(
    model: &SchemaModel,
    payload: &[u8],
    allow_unknown_fields: bool,
) -> ConvertResult<Vec<(String, Value)>> {
    let mut slots: Vec<Option<Slot>> = vec![None; model.len()];
    let mut buf = payload;

    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)
            .map_err(|e| ConvertError::decoding_with_source("invalid field key", e))?;

        let Some(slot_idx) = model.position_by_number(tag) else {
            if !allow_unknown_fields {
                return Err(ConvertError::UnknownField(format!(
                    "wire tag {} not declared in schema '{}'",
                    tag,
                    model.name()
                )));
            }
            skip_field(wire_type, tag, &mut buf, DecodeContext::default())
                .map_err(|e| ConvertError::decoding_with_source("cannot skip unknown field", e))?;
            continue;
        };

        let field = &model.fields()[slot_idx];
        let mut slot = slots[slot_idx].take();
        decode_field(field, wire_type, &mut buf, allow_unknown_fields, &mut slot)?;
        slots[slot_idx] = slot;
    }

    let mut out = Vec::new();
    for (field, slot) in model.fields().iter().zip(slots) {
        match slot {
            Some(Slot::One(v)) => out.push((field.name.clone(), v)),
            Some(Slot::Many(vs)) => out.push((field.name.clone(), Value::Array(vs))),
            // Unset singular scalars/enums carry their wire default, so
            // flatten and path resolution agree on every declared field
            None if !field.repeated => {
                if let Some(default) = field.kind.default_value() {
                    out.push((field.name.clone(), default));
                }
            }
            None => {}
        }
    }
    Ok(out)
}

/// Accumulator for one field across wire occurrences
#[derive(Debug, Clone)]
enum Slot {
    One(Value),
    Many(Vec<Value>),
}

fn decode_field(
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut &[u8],
    allow_unknown_fields: bool,
    slot: &mut Option<Slot>,
) -> ConvertResult<()> {
    // Packed numeric repeated fields arrive as one length-delimited chunk
    let expected = field.kind.single_wire_type();
    if field.repeated && wire_type == WireType::LengthDelimited && expected != WireType::LengthDelimited
    {
        let mut chunk = read_chunk(buf, &field.name)?;
        while chunk.has_remaining() {
            let value = decode_single(field, expected, &mut chunk, allow_unknown_fields)?;
            push(slot, field, value);
        }
        return Ok(());
    }

    let value = decode_single(field, wire_type, buf, allow_unknown_fields)?;
    push(slot, field, value);
    Ok(())
}

fn push(slot: &mut Option<Slot>, field: &FieldDescriptor, value: Value) {
    if field.repeated {
        match slot {
            Some(Slot::Many(vs)) => vs.push(value),
            _ => *slot = Some(Slot::Many(vec![value])),
        }
    } else {
        // proto3: last occurrence wins
        *slot = Some(Slot::One(value));
    }
}

fn decode_single(
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut &[u8],
    allow_unknown_fields: bool,
) -> ConvertResult<Value> {
    let name = field.name.as_str();
    match &field.kind {
        FieldKind::Integer | FieldKind::Long => {
            expect_wire(name, wire_type, WireType::Varint)?;
            Ok(Value::Integer(read_varint(buf, name)? as i64))
        }
        FieldKind::Boolean => {
            expect_wire(name, wire_type, WireType::Varint)?;
            Ok(Value::Bool(read_varint(buf, name)? != 0))
        }
        FieldKind::Enum(symbols) => {
            expect_wire(name, wire_type, WireType::Varint)?;
            let number = read_varint(buf, name)? as i64 as i32;
            Ok(Value::String(
                symbols
                    .iter()
                    .find(|s| s.number == number)
                    .map(|s| s.name.clone())
                    // unknown enum numbers are carried through numerically
                    .unwrap_or_else(|| number.to_string()),
            ))
        }
        FieldKind::Float => {
            expect_wire(name, wire_type, WireType::ThirtyTwoBit)?;
            if buf.remaining() < 4 {
                return Err(truncated(name));
            }
            Ok(Value::Float(buf.get_f32_le() as f64))
        }
        FieldKind::Double => {
            expect_wire(name, wire_type, WireType::SixtyFourBit)?;
            if buf.remaining() < 8 {
                return Err(truncated(name));
            }
            Ok(Value::Float(buf.get_f64_le()))
        }
        FieldKind::String => {
            expect_wire(name, wire_type, WireType::LengthDelimited)?;
            let chunk = read_chunk(buf, name)?;
            let s = std::str::from_utf8(chunk)
                .map_err(|e| ConvertError::decoding_with_source(format!("field '{name}' is not valid UTF-8"), e))?;
            Ok(Value::String(s.to_string()))
        }
        FieldKind::Bytes => {
            expect_wire(name, wire_type, WireType::LengthDelimited)?;
            Ok(Value::Bytes(read_chunk(buf, name)?.to_vec()))
        }
        FieldKind::Message(nested) => {
            expect_wire(name, wire_type, WireType::LengthDelimited)?;
            let chunk = read_chunk(buf, name)?;
            Ok(Value::Record(decode(nested, chunk, allow_unknown_fields)?))
        }
        FieldKind::Map(entry) => {
            expect_wire(name, wire_type, WireType::LengthDelimited)?;
            let chunk = read_chunk(buf, name)?;
            // Wire-omitted zero keys/values come back as entry defaults
            Ok(Value::Record(decode(entry, chunk, allow_unknown_fields)?))
        }
        FieldKind::Timestamp => {
            expect_wire(name, wire_type, WireType::LengthDelimited)?;
            let chunk = read_chunk(buf, name)?;
            let (seconds, nanos) = decode_seconds_nanos(chunk, name)?;
            Value::timestamp(seconds, nanos)
        }
        FieldKind::Duration => {
            expect_wire(name, wire_type, WireType::LengthDelimited)?;
            let chunk = read_chunk(buf, name)?;
            let (seconds, nanos) = decode_seconds_nanos(chunk, name)?;
            Ok(Value::Duration { seconds, nanos })
        }
        FieldKind::Struct => {
            expect_wire(name, wire_type, WireType::LengthDelimited)?;
            let chunk = read_chunk(buf, name)?;
            let json = decode_struct(chunk, name)?;
            // Canonical JSON form; NaN/Infinity already rejected above
            Ok(Value::String(serde_json::Value::Object(json).to_string()))
        }
    }
}

impl FieldKind {
    /// The wire type a single (non-packed) value of this kind uses
    fn single_wire_type(&self) -> WireType {
        match self {
            FieldKind::Integer | FieldKind::Long | FieldKind::Boolean | FieldKind::Enum(_) => {
                WireType::Varint
            }
            FieldKind::Float => WireType::ThirtyTwoBit,
            FieldKind::Double => WireType::SixtyFourBit,
            _ => WireType::LengthDelimited,
        }
    }
}

fn expect_wire(field: &str, got: WireType, want: WireType) -> ConvertResult<()> {
    if got == want {
        Ok(())
    } else {
        Err(ConvertError::decoding(format!(
            "field '{field}': expected wire type {want:?}, got {got:?}"
        )))
    }
}

fn truncated(field: &str) -> ConvertError {
    ConvertError::decoding(format!("truncated buffer while reading field '{field}'"))
}

fn read_varint(buf: &mut &[u8], field: &str) -> ConvertResult<u64> {
    decode_varint(buf).map_err(|e| {
        ConvertError::decoding_with_source(format!("invalid varint in field '{field}'"), e)
    })
}

fn read_chunk<'a>(buf: &mut &'a [u8], field: &str) -> ConvertResult<&'a [u8]> {
    let len = read_varint(buf, field)? as usize;
    if buf.remaining() < len {
        return Err(truncated(field));
    }
    let chunk = &buf[..len];
    buf.advance(len);
    Ok(chunk)
}

/// Decode the shared Timestamp/Duration wire shape: seconds at tag 1,
/// nanos at tag 2, both varints
fn decode_seconds_nanos(mut buf: &[u8], field: &str) -> ConvertResult<(i64, i32)> {
    let mut seconds = 0i64;
    let mut nanos = 0i32;
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)
            .map_err(|e| ConvertError::decoding_with_source(format!("field '{field}'"), e))?;
        match (tag, wire_type) {
            (1, WireType::Varint) => seconds = read_varint(&mut buf, field)? as i64,
            (2, WireType::Varint) => nanos = read_varint(&mut buf, field)? as i64 as i32,
            _ => skip_field(wire_type, tag, &mut buf, DecodeContext::default())
                .map_err(|e| ConvertError::decoding_with_source(format!("field '{field}'"), e))?,
        }
    }
    Ok((seconds, nanos))
}

/// Decode a well-known Struct: repeated map entries at tag 1, each with a
/// string key at tag 1 and a Value at tag 2
fn decode_struct(
    mut buf: &[u8],
    field: &str,
) -> ConvertResult<serde_json::Map<String, serde_json::Value>> {
    let mut map = serde_json::Map::new();
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)
            .map_err(|e| ConvertError::decoding_with_source(format!("field '{field}'"), e))?;
        if tag != 1 || wire_type != WireType::LengthDelimited {
            skip_field(wire_type, tag, &mut buf, DecodeContext::default())
                .map_err(|e| ConvertError::decoding_with_source(format!("field '{field}'"), e))?;
            continue;
        }
        let mut entry = read_chunk(&mut buf, field)?;
        let mut key = String::new();
        let mut value = serde_json::Value::Null;
        while entry.has_remaining() {
            let (etag, ewt) = decode_key(&mut entry)
                .map_err(|e| ConvertError::decoding_with_source(format!("field '{field}'"), e))?;
            match (etag, ewt) {
                (1, WireType::LengthDelimited) => {
                    let chunk = read_chunk(&mut entry, field)?;
                    key = std::str::from_utf8(chunk)
                        .map_err(|e| {
                            ConvertError::decoding_with_source(
                                format!("struct key in field '{field}' is not valid UTF-8"),
                                e,
                            )
                        })?
                        .to_string();
                }
                (2, WireType::LengthDelimited) => {
                    let chunk = read_chunk(&mut entry, field)?;
                    value = decode_struct_value(chunk, field)?;
                }
                _ => skip_field(ewt, etag, &mut entry, DecodeContext::default()).map_err(|e| {
                    ConvertError::decoding_with_source(format!("field '{field}'"), e)
                })?,
            }
        }
        map.insert(key, value);
    }
    Ok(map)
}

/// Decode a well-known Value oneof: null(1), number(2), string(3), bool(4),
/// struct(5), list(6)
fn decode_struct_value(mut buf: &[u8], field: &str) -> ConvertResult<serde_json::Value> {
    let mut out = serde_json::Value::Null;
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)
            .map_err(|e| ConvertError::decoding_with_source(format!("field '{field}'"), e))?;
        out = match (tag, wire_type) {
            (1, WireType::Varint) => {
                let _ = read_varint(&mut buf, field)?;
                serde_json::Value::Null
            }
            (2, WireType::SixtyFourBit) => {
                if buf.remaining() < 8 {
                    return Err(truncated(field));
                }
                let n = buf.get_f64_le();
                serde_json::Value::Number(serde_json::Number::from_f64(n).ok_or_else(|| {
                    ConvertError::Conversion(format!(
                        "struct in field '{field}' contains {n}, which has no JSON representation"
                    ))
                })?)
            }
            (3, WireType::LengthDelimited) => {
                let chunk = read_chunk(&mut buf, field)?;
                serde_json::Value::String(
                    std::str::from_utf8(chunk)
                        .map_err(|e| {
                            ConvertError::decoding_with_source(
                                format!("struct string in field '{field}' is not valid UTF-8"),
                                e,
                            )
                        })?
                        .to_string(),
                )
            }
            (4, WireType::Varint) => serde_json::Value::Bool(read_varint(&mut buf, field)? != 0),
            (5, WireType::LengthDelimited) => {
                let chunk = read_chunk(&mut buf, field)?;
                serde_json::Value::Object(decode_struct(chunk, field)?)
            }
            (6, WireType::LengthDelimited) => {
                let mut chunk = read_chunk(&mut buf, field)?;
                let mut items = Vec::new();
                while chunk.has_remaining() {
                    let (ltag, lwt) = decode_key(&mut chunk).map_err(|e| {
                        ConvertError::decoding_with_source(format!("field '{field}'"), e)
                    })?;
                    if ltag == 1 && lwt == WireType::LengthDelimited {
                        let item = read_chunk(&mut chunk, field)?;
                        items.push(decode_struct_value(item, field)?);
                    } else {
                        skip_field(lwt, ltag, &mut chunk, DecodeContext::default()).map_err(
                            |e| ConvertError::decoding_with_source(format!("field '{field}'"), e),
                        )?;
                    }
                }
                serde_json::Value::Array(items)
            }
            _ => {
                skip_field(wire_type, tag, &mut buf, DecodeContext::default()).map_err(|e| {
                    ConvertError::decoding_with_source(format!("field '{field}'"), e)
                })?;
                continue;
            }
        };
    }
    Ok(out)
}
