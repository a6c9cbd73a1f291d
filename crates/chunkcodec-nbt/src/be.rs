//! Big-endian NBT variant (Java Edition region files).

use bytes::{Buf, BufMut};

use crate::io::NbtVariant;

pub(crate) struct BeVariant;

impl NbtVariant for BeVariant {
    fn write_short(buf: &mut impl BufMut, value: i16) {
        buf.put_i16(value);
    }

    fn read_short(buf: &mut impl Buf) -> i16 {
        buf.get_i16()
    }

    fn write_int(buf: &mut impl BufMut, value: i32) {
        buf.put_i32(value);
    }

    fn read_int(buf: &mut impl Buf) -> i32 {
        buf.get_i32()
    }

    fn write_long(buf: &mut impl BufMut, value: i64) {
        buf.put_i64(value);
    }

    fn read_long(buf: &mut impl Buf) -> i64 {
        buf.get_i64()
    }

    fn write_float(buf: &mut impl BufMut, value: f32) {
        buf.put_f32(value);
    }

    fn read_float(buf: &mut impl Buf) -> f32 {
        buf.get_f32()
    }

    fn write_double(buf: &mut impl BufMut, value: f64) {
        buf.put_f64(value);
    }

    fn read_double(buf: &mut impl Buf) -> f64 {
        buf.get_f64()
    }

    fn write_string_len(buf: &mut impl BufMut, len: u16) {
        buf.put_u16(len);
    }

    fn read_string_len(buf: &mut impl Buf) -> u16 {
        buf.get_u16()
    }
}
