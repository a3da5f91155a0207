use crate::buf::OwnedBuf;
use crate::error::ErrorKind;
use crate::protocol::Endianness;
use crate::value::{Value, Variant};
use crate::{ObjectPath, OwnedSignature, Signature};

use super::{read_many, read_one, write_many, write_one};

fn round_trip(signature: &str, values: Vec<Value>) {
    let signature = Signature::new(signature).unwrap();

    for endianness in [Endianness::LITTLE, Endianness::BIG] {
        let mut buf = OwnedBuf::with_endianness(endianness);
        write_many(&mut buf, signature, &values).unwrap();

        let mut read = buf.read();
        let decoded = read_many(&mut read, signature).unwrap();

        assert!(read.is_empty(), "{signature:?} left bytes behind");
        assert_eq!(decoded, values, "{signature:?} did not round-trip");
    }
}

#[test]
fn fixed_primitives() {
    round_trip(
        "ybnqiuxtdh",
        vec![
            Value::Byte(0xff),
            Value::Bool(true),
            Value::Int16(-2),
            Value::Uint16(0xffee),
            Value::Int32(-3),
            Value::Uint32(0xdeadbeef),
            Value::Int64(i64::MIN),
            Value::Uint64(u64::MAX),
            Value::Double(3.5),
            Value::UnixFd(4),
        ],
    );
}

#[test]
fn string_like() {
    round_trip(
        "sog",
        vec![
            Value::String("Hello World!".into()),
            Value::object_path(ObjectPath::new_const("/org/freedesktop/DBus")),
            Value::Signature(OwnedSignature::new("a{sv}").unwrap()),
        ],
    );
}

#[test]
fn arrays() {
    round_trip(
        "ayas",
        vec![
            Value::Array(vec![Value::Byte(1), Value::Byte(2), Value::Byte(3)]),
            Value::Array(vec![Value::String("a".into()), Value::String("bc".into())]),
        ],
    );

    round_trip("as", vec![Value::Array(vec![])]);
    round_trip("aau", vec![Value::Array(vec![
        Value::Array(vec![Value::Uint32(1)]),
        Value::Array(vec![]),
    ])]);
}

#[test]
fn deeply_nested_array() {
    let mut value = Value::Byte(7);

    for _ in 0..6 {
        value = Value::Array(vec![value]);
    }

    round_trip("aaaaaay", vec![value]);
}

#[test]
fn array_of_struct() {
    round_trip(
        "a(ybnqiuxt)",
        vec![Value::Array(vec![
            Value::Struct(vec![
                Value::Byte(1),
                Value::Bool(false),
                Value::Int16(2),
                Value::Uint16(3),
                Value::Int32(4),
                Value::Uint32(5),
                Value::Int64(6),
                Value::Uint64(7),
            ]),
            Value::Struct(vec![
                Value::Byte(8),
                Value::Bool(true),
                Value::Int16(9),
                Value::Uint16(10),
                Value::Int32(11),
                Value::Uint32(12),
                Value::Int64(13),
                Value::Uint64(14),
            ]),
        ])],
    );
}

#[test]
fn nested_struct() {
    round_trip(
        "(y(b(ss)b)y)",
        vec![Value::Struct(vec![
            Value::Byte(1),
            Value::Struct(vec![
                Value::Bool(true),
                Value::Struct(vec![
                    Value::String("inner".into()),
                    Value::String("most".into()),
                ]),
                Value::Bool(false),
            ]),
            Value::Byte(2),
        ])],
    );
}

#[test]
fn dicts() {
    round_trip(
        "a{sv}",
        vec![Value::Dict(vec![
            (
                Value::String("b".into()),
                Value::variant(Signature::UINT32, Value::Uint32(1)),
            ),
            (
                Value::String("a".into()),
                Value::variant(Signature::STRING, Value::String("x".into())),
            ),
        ])],
    );

    round_trip("a{yy}", vec![Value::Dict(vec![
        (Value::Byte(1), Value::Byte(2)),
        (Value::Byte(3), Value::Byte(4)),
    ])]);

    round_trip("a{sv}", vec![Value::Dict(vec![])]);
}

#[test]
fn dict_order_is_preserved() {
    let signature = Signature::new("a{ss}").unwrap();
    let pairs = vec![
        (Value::String("z".into()), Value::String("1".into())),
        (Value::String("a".into()), Value::String("2".into())),
    ];

    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_one(&mut buf, signature, &Value::Dict(pairs.clone())).unwrap();

    let decoded = read_one(&mut buf.read(), signature).unwrap();
    assert_eq!(decoded, Value::Dict(pairs));
}

#[test]
fn variant_embedding() {
    let signature = Signature::new("v").unwrap();
    let value = Value::variant(Signature::UINT32, Value::Uint32(42));

    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_one(&mut buf, signature, &value).unwrap();

    // Embedded signature, padding to 4, then the value.
    assert_eq!(buf.get(), &[0x01, b'u', 0x00, 0x00, 0x2a, 0x00, 0x00, 0x00]);

    let decoded = read_one(&mut buf.read(), signature).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn variant_with_container_inside() {
    round_trip(
        "v",
        vec![Value::Variant(Box::new(Variant {
            signature: OwnedSignature::new("a{sv}").unwrap(),
            value: Value::Dict(vec![(
                Value::String("k".into()),
                Value::variant(Signature::BYTE, Value::Byte(1)),
            )]),
        }))],
    );
}

#[test]
fn empty_array_padding() {
    let signature = Signature::new("ay").unwrap();
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_one(&mut buf, signature, &Value::Array(vec![])).unwrap();
    assert_eq!(buf.get(), &[0, 0, 0, 0]);

    // Struct elements align to 8, and the padding is emitted even for an
    // empty array, without being counted in the length.
    let signature = Signature::new("a(y)").unwrap();
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_one(&mut buf, signature, &Value::Array(vec![])).unwrap();
    assert_eq!(buf.get(), &[0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn integer_out_of_range() {
    let signature = Signature::new("y").unwrap();
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);

    let error = write_one(&mut buf, signature, &Value::Uint32(256)).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Value 256 out of range 0..255 for type 'y'"
    );

    let error = write_one(&mut buf, signature, &Value::Int32(-1)).unwrap_err();
    assert_eq!(error.to_string(), "Value -1 out of range 0..255 for type 'y'");

    let signature = Signature::new("n").unwrap();
    let error = write_one(&mut buf, signature, &Value::Uint32(0x8000)).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Value 32768 out of range -32768..32767 for type 'n'"
    );
}

#[test]
fn integer_coercion_in_range() {
    let signature = Signature::new("y").unwrap();
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_one(&mut buf, signature, &Value::Uint64(255)).unwrap();
    assert_eq!(buf.get(), &[255]);
}

#[test]
fn value_mismatch() {
    let signature = Signature::new("s").unwrap();
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);

    let error = write_one(&mut buf, signature, &Value::Uint32(1)).unwrap_err();
    assert_eq!(error.to_string(), "Expected string value, found integer");

    let signature = Signature::new("b").unwrap();
    let error = write_one(&mut buf, signature, &Value::Uint32(1)).unwrap_err();
    assert_eq!(error.to_string(), "Expected boolean value, found integer");
}

#[test]
fn many_arity() {
    let signature = Signature::new("su").unwrap();
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);

    let error = write_many(&mut buf, signature, &[Value::String("x".into())]).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Signature describes 2 values, but 1 were supplied"
    );
}

#[test]
fn struct_arity() {
    let signature = Signature::new("(uu)").unwrap();
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);

    let error = write_one(
        &mut buf,
        signature,
        &Value::Struct(vec![Value::Uint32(1)]),
    )
    .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Struct has 2 fields, but 1 values were supplied"
    );
}

#[test]
fn booleans_on_the_wire() {
    let signature = Signature::new("b").unwrap();

    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_one(&mut buf, signature, &Value::Bool(true)).unwrap();
    assert_eq!(buf.get(), &[1, 0, 0, 0]);

    let mut read = crate::ReadBuf::new(&[2, 0, 0, 0], Endianness::LITTLE);
    let error = read_one(&mut read, signature).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidBoolean(2)));
}

#[test]
fn duplicate_dict_keys_detected_on_read() {
    let signature = Signature::new("a{yy}").unwrap();

    // Writing does not check for duplicates.
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_one(
        &mut buf,
        signature,
        &Value::Dict(vec![
            (Value::Byte(1), Value::Byte(2)),
            (Value::Byte(1), Value::Byte(3)),
        ]),
    )
    .unwrap();

    let error = read_one(&mut buf.read(), signature).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::DuplicateDictKey));
}

#[test]
fn array_overrun() {
    // A 3-byte array body cannot hold a u32 element.
    let bytes = [3u8, 0, 0, 0, 9, 9, 9, 9];
    let signature = Signature::new("au").unwrap();

    let mut read = crate::ReadBuf::new(&bytes, Endianness::LITTLE);
    let error = read_one(&mut read, signature).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::ArrayOverrun { length: 3 }
    ));
}

#[test]
fn object_path_values_accept_any_utf8() {
    // Path syntax validation is not applied on the dynamic path.
    round_trip("o", vec![Value::ObjectPath("not a path".into())]);
}
