//! The marshalling kernel shared by the dynamic writer and reader.
//!
//! Both directions walk a parsed [`Ty`] descriptor against a [`Value`]
//! tree, applying the alignment, endianness and length-prefix rules of the
//! wire format. The typed [`Frame`]/[`Write`]/[`Read`] path and this one
//! produce identical bytes; this one is driven by signatures which are only
//! known at run time, such as the SIGNATURE header field of an incoming
//! message.
//!
//! [`Frame`]: crate::Frame
//! [`Write`]: crate::Write
//! [`Read`]: crate::Read

#[cfg(test)]
mod tests;

use crate::buf::{ArrayWriter, OwnedBuf, ReadBuf, MAX_ARRAY_LENGTH};
use crate::error::{ErrorKind, Result};
use crate::protocol::Type;
use crate::signature::{parse_many, parse_one};
use crate::ty::Ty;
use crate::value::{Value, Variant};
use crate::write::Write;
use crate::Signature;

/// Write a single value under the given signature.
pub(crate) fn write_one(buf: &mut OwnedBuf, signature: &Signature, value: &Value) -> Result<()> {
    let ty = parse_one(signature.as_str())?;
    write_value(buf, &ty, value)
}

/// Write a sequence of values under the given signature.
///
/// The number of values must match the number of types in the signature.
pub(crate) fn write_many(
    buf: &mut OwnedBuf,
    signature: &Signature,
    values: &[Value],
) -> Result<()> {
    let types = parse_many(signature.as_str())?;

    if types.len() != values.len() {
        return Err(ErrorKind::ValueArity {
            expected: types.len(),
            got: values.len(),
        }
        .into());
    }

    for (ty, value) in types.iter().zip(values) {
        write_value(buf, ty, value)?;
    }

    Ok(())
}

/// Read a single value under the given signature.
pub(crate) fn read_one(buf: &mut ReadBuf<'_>, signature: &Signature) -> Result<Value> {
    let ty = parse_one(signature.as_str())?;
    read_value(buf, &ty)
}

/// Read a sequence of values under the given signature.
pub(crate) fn read_many(buf: &mut ReadBuf<'_>, signature: &Signature) -> Result<Vec<Value>> {
    let types = parse_many(signature.as_str())?;
    let mut values = Vec::with_capacity(types.len());

    for ty in &types {
        values.push(read_value(buf, ty)?);
    }

    Ok(values)
}

/// Write one value of the given type.
pub(crate) fn write_value(buf: &mut OwnedBuf, ty: &Ty, value: &Value) -> Result<()> {
    match ty {
        Ty::Primitive(primitive) => write_primitive(buf, *primitive, value),
        Ty::Variant => {
            let Value::Variant(variant) = value else {
                return Err(mismatch(ty, value));
            };

            let inner = parse_one(variant.signature.as_str())?;
            variant.signature.write_to(buf);
            write_value(buf, &inner, &variant.value)
        }
        Ty::Array(element) => match (&**element, value) {
            (Ty::DictEntry(key_ty, value_ty), Value::Dict(pairs)) => {
                let mut array = ArrayWriter::new(buf, 8);

                for (key, value) in pairs {
                    let buf = array.buf();
                    buf.align_for(8);
                    write_value(buf, key_ty, key)?;
                    write_value(buf, value_ty, value)?;
                }

                array.finish();
                Ok(())
            }
            (Ty::DictEntry(..), _) => Err(ErrorKind::ValueMismatch {
                expected: "dict",
                found: value.kind(),
            }
            .into()),
            (element, Value::Array(items)) => {
                let mut array = ArrayWriter::new(buf, element.alignment());

                for item in items {
                    write_value(array.buf(), element, item)?;
                }

                array.finish();
                Ok(())
            }
            _ => Err(mismatch(ty, value)),
        },
        Ty::Struct(fields) => {
            let Value::Struct(values) = value else {
                return Err(mismatch(ty, value));
            };

            if fields.len() != values.len() {
                return Err(ErrorKind::StructArity {
                    expected: fields.len(),
                    got: values.len(),
                }
                .into());
            }

            buf.align_for(8);

            for (field, value) in fields.iter().zip(values) {
                write_value(buf, field, value)?;
            }

            Ok(())
        }
        // The parser only produces dict entries inside of arrays.
        Ty::DictEntry(..) => Err(mismatch(ty, value)),
    }
}

/// Read one value of the given type.
pub(crate) fn read_value(buf: &mut ReadBuf<'_>, ty: &Ty) -> Result<Value> {
    match ty {
        Ty::Primitive(primitive) => read_primitive(buf, *primitive),
        Ty::Variant => {
            let signature = buf.read::<Signature>()?;
            let inner = parse_one(signature.as_str())?;
            let value = read_value(buf, &inner)?;

            Ok(Value::Variant(Box::new(Variant {
                signature: signature.to_owned(),
                value,
            })))
        }
        Ty::Array(element) => {
            let length = buf.load::<u32>()?;

            if length > MAX_ARRAY_LENGTH {
                return Err(ErrorKind::ArrayTooLong(length).into());
            }

            buf.align(element.alignment())?;
            let end = buf.pos() + length as usize;

            match &**element {
                Ty::DictEntry(key_ty, value_ty) => {
                    let mut pairs = Vec::new();

                    while buf.pos() < end {
                        buf.align(8)?;
                        let key = read_value(buf, key_ty)?;
                        let value = read_value(buf, value_ty)?;

                        if buf.pos() > end {
                            return Err(ErrorKind::ArrayOverrun { length }.into());
                        }

                        if pairs.iter().any(|(existing, _)| *existing == key) {
                            return Err(ErrorKind::DuplicateDictKey.into());
                        }

                        pairs.push((key, value));
                    }

                    Ok(Value::Dict(pairs))
                }
                element => {
                    let mut items = Vec::new();

                    while buf.pos() < end {
                        items.push(read_value(buf, element)?);

                        if buf.pos() > end {
                            return Err(ErrorKind::ArrayOverrun { length }.into());
                        }
                    }

                    Ok(Value::Array(items))
                }
            }
        }
        Ty::Struct(fields) => {
            buf.align(8)?;
            let mut values = Vec::with_capacity(fields.len());

            for field in fields {
                values.push(read_value(buf, field)?);
            }

            Ok(Value::Struct(values))
        }
        Ty::DictEntry(..) => Err(ErrorKind::ValueMismatch {
            expected: "array of dict entries",
            found: "bare dict entry",
        }
        .into()),
    }
}

fn write_primitive(buf: &mut OwnedBuf, ty: Type, value: &Value) -> Result<()> {
    match ty {
        Type::BYTE => {
            let v = int_in_range(value, ty, 0, u8::MAX as i128)?;
            buf.store(v as u8);
        }
        Type::BOOLEAN => {
            let Value::Bool(v) = value else {
                return Err(primitive_mismatch(ty, value));
            };

            buf.store(u32::from(*v));
        }
        Type::INT16 => {
            let v = int_in_range(value, ty, i16::MIN as i128, i16::MAX as i128)?;
            buf.store(v as i16);
        }
        Type::UINT16 => {
            let v = int_in_range(value, ty, 0, u16::MAX as i128)?;
            buf.store(v as u16);
        }
        Type::INT32 => {
            let v = int_in_range(value, ty, i32::MIN as i128, i32::MAX as i128)?;
            buf.store(v as i32);
        }
        Type::UINT32 => {
            let v = int_in_range(value, ty, 0, u32::MAX as i128)?;
            buf.store(v as u32);
        }
        Type::INT64 => {
            let v = int_in_range(value, ty, i64::MIN as i128, i64::MAX as i128)?;
            buf.store(v as i64);
        }
        Type::UINT64 => {
            let v = int_in_range(value, ty, 0, u64::MAX as i128)?;
            buf.store(v as u64);
        }
        Type::DOUBLE => {
            let Value::Double(v) = value else {
                return Err(primitive_mismatch(ty, value));
            };

            buf.store(*v);
        }
        Type::UNIX_FD => {
            let v = int_in_range(value, ty, 0, u32::MAX as i128)?;
            buf.store(v as u32);
        }
        Type::STRING => {
            let Value::String(v) = value else {
                return Err(primitive_mismatch(ty, value));
            };

            v.as_str().write_to(buf);
        }
        // Object path syntax is not enforced on the dynamic path; anything
        // UTF-8 round-trips.
        Type::OBJECT_PATH => {
            let (Value::ObjectPath(v) | Value::String(v)) = value else {
                return Err(primitive_mismatch(ty, value));
            };

            v.as_str().write_to(buf);
        }
        Type::SIGNATURE => {
            let Value::Signature(v) = value else {
                return Err(primitive_mismatch(ty, value));
            };

            v.write_to(buf);
        }
        _ => return Err(primitive_mismatch(ty, value)),
    }

    Ok(())
}

fn read_primitive(buf: &mut ReadBuf<'_>, ty: Type) -> Result<Value> {
    let value = match ty {
        Type::BYTE => Value::Byte(buf.load()?),
        Type::BOOLEAN => Value::Bool(buf.load_bool()?),
        Type::INT16 => Value::Int16(buf.load()?),
        Type::UINT16 => Value::Uint16(buf.load()?),
        Type::INT32 => Value::Int32(buf.load()?),
        Type::UINT32 => Value::Uint32(buf.load()?),
        Type::INT64 => Value::Int64(buf.load()?),
        Type::UINT64 => Value::Uint64(buf.load()?),
        Type::DOUBLE => Value::Double(buf.load()?),
        Type::UNIX_FD => Value::UnixFd(buf.load()?),
        Type::STRING => Value::String(buf.read::<str>()?.to_owned()),
        Type::OBJECT_PATH => Value::ObjectPath(buf.read::<str>()?.to_owned()),
        Type::SIGNATURE => Value::Signature(buf.read::<Signature>()?.to_owned()),
        _ => {
            return Err(ErrorKind::ValueMismatch {
                expected: "primitive",
                found: "container type code",
            }
            .into());
        }
    };

    Ok(value)
}

fn int_in_range(value: &Value, ty: Type, min: i128, max: i128) -> Result<i128> {
    let Some(v) = value.as_int() else {
        return Err(primitive_mismatch(ty, value));
    };

    if v < min || v > max {
        return Err(ErrorKind::OutOfRange {
            value: v,
            min,
            max,
            ty,
        }
        .into());
    }

    Ok(v)
}

fn mismatch(ty: &Ty, value: &Value) -> crate::Error {
    ErrorKind::ValueMismatch {
        expected: ty.describe(),
        found: value.kind(),
    }
    .into()
}

fn primitive_mismatch(ty: Type, value: &Value) -> crate::Error {
    mismatch(&Ty::Primitive(ty), value)
}
