use crate::protocol::{Endianness, Field, Flags, MessageType};
use crate::Signature;

use super::{padding_to, ArrayWriter, OwnedBuf};

#[rustfmt::skip]
const LE_BLOB: [u8; 36] = [
    // fixed yyyyuu header
    b'l',
    // reply (which is the simplest message)
    b'\x02',
    // no auto-starting
    b'\x02',
    // D-Bus version = 1
    b'\x01',
    // bytes in body = 4
    b'\x04', b'\0', b'\0', b'\0',
    // serial number = 0x12345678
    b'\x78', b'\x56', b'\x34', b'\x12',
    // byte 12: a(yv) header fields, 15 bytes of elements
    b'\x0f', b'\0', b'\0', b'\0',
    // byte 16: in reply to:
    b'\x05',
    // variant signature = u
    b'\x01', b'u', b'\0',
    // 0xabcdef12, already aligned to 4
    b'\x12', b'\xef', b'\xcd', b'\xab',
    // byte 24: signature:
    b'\x08',
    // variant signature = g
    b'\x01', b'g', b'\0',
    // 1 byte, u, NUL
    b'\x01', b'u', b'\0',
    // pad to 8-byte boundary for the body
    b'\0',
    // byte 32: body, 0xdeadbeef
    b'\xef', b'\xbe', b'\xad', b'\xde',
];

#[rustfmt::skip]
const BE_BLOB: [u8; 36] = [
    b'B',
    b'\x02',
    b'\x02',
    b'\x01',
    b'\0', b'\0', b'\0', b'\x04',
    b'\x12', b'\x34', b'\x56', b'\x78',
    b'\0', b'\0', b'\0', b'\x0f',
    b'\x05',
    b'\x01', b'u', b'\0',
    b'\xab', b'\xcd', b'\xef', b'\x12',
    b'\x08',
    b'\x01', b'g', b'\0',
    b'\x01', b'u', b'\0',
    b'\0',
    b'\xde', b'\xad', b'\xbe', b'\xef',
];

#[test]
fn write_blobs() {
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    write_blob(&mut buf);
    assert_eq!(buf.get(), &LE_BLOB[..]);

    let mut buf = OwnedBuf::with_endianness(Endianness::BIG);
    write_blob(&mut buf);
    assert_eq!(buf.get(), &BE_BLOB[..]);
}

fn write_blob(buf: &mut OwnedBuf) {
    let endianness = buf.endianness();
    buf.store(endianness);
    buf.store(MessageType::METHOD_RETURN);
    buf.store(Flags::EMPTY | Flags::NO_AUTO_START);
    buf.store(1u8);
    buf.store(4u32);
    buf.store(0x12345678u32);

    let mut array = ArrayWriter::new(buf, 8);

    let mut st = array.write_struct();
    st.store(Field::REPLY_SERIAL);
    st.write(Signature::UINT32);
    st.store(0xabcdef12u32);

    let mut st = array.write_struct();
    st.store(Field::SIGNATURE);
    st.write(Signature::SIGNATURE);
    st.write(Signature::UINT32);

    array.finish();

    buf.align_for(8);
    buf.store(0xdeadbeefu32);
}

#[test]
fn read_blob_back() {
    let mut read = crate::ReadBuf::new(&LE_BLOB, Endianness::LITTLE);

    assert_eq!(read.load::<u8>().unwrap(), b'l');
    assert_eq!(read.load::<u8>().unwrap(), 2);
    assert_eq!(read.load::<u8>().unwrap(), 2);
    assert_eq!(read.load::<u8>().unwrap(), 1);
    assert_eq!(read.load::<u32>().unwrap(), 4);
    assert_eq!(read.load::<u32>().unwrap(), 0x12345678);

    let fields_length = read.load::<u32>().unwrap();
    let mut fields = read.read_until(fields_length as usize).unwrap();

    fields.align(8).unwrap();
    assert_eq!(fields.load::<u8>().unwrap(), 5);
    assert_eq!(fields.read::<Signature>().unwrap(), "u");
    assert_eq!(fields.load::<u32>().unwrap(), 0xabcdef12);

    fields.align(8).unwrap();
    assert_eq!(fields.load::<u8>().unwrap(), 8);
    assert_eq!(fields.read::<Signature>().unwrap(), "g");
    assert_eq!(fields.read::<Signature>().unwrap(), "u");
    assert!(fields.is_empty());

    read.align(8).unwrap();
    assert_eq!(read.load::<u32>().unwrap(), 0xdeadbeef);
    assert!(read.is_empty());
}

#[test]
fn padding() {
    assert_eq!(padding_to(0, 8), 0);
    assert_eq!(padding_to(1, 8), 7);
    assert_eq!(padding_to(8, 8), 0);
    assert_eq!(padding_to(9, 4), 3);
    assert_eq!(padding_to(3, 1), 0);
}

#[test]
fn aligned_stores_are_zero_padded() {
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    buf.store(1u8);
    buf.store(2u64);

    assert_eq!(buf.get(), &[1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn array_length_excludes_leading_padding() {
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    // One byte up front forces padding between the length prefix and the
    // 8-aligned first element.
    buf.store(1u8);

    let mut array = ArrayWriter::new(&mut buf, 8);
    let mut st = array.write_struct();
    st.store(1u8);
    array.finish();

    // len prefix at 4..8, element at 8, so the length is 1, not 1 + padding.
    assert_eq!(buf.get(), &[1, 0, 0, 0, 1, 0, 0, 0, 1]);
}

#[test]
fn empty_array_alignment() {
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    let array = ArrayWriter::new(&mut buf, 4);
    array.finish();
    assert_eq!(buf.get(), &[0, 0, 0, 0]);

    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    let array = ArrayWriter::new(&mut buf, 8);
    array.finish();
    // The element padding is emitted even when no element follows.
    assert_eq!(buf.get(), &[0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn store_at_backfills() {
    let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
    let slot = buf.alloc::<u32>();
    buf.store(7u8);
    buf.store_at(slot, 42u32);

    assert_eq!(buf.get(), &[42, 0, 0, 0, 7]);
}
