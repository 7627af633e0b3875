use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::{FloatWidth, IntWidth, TypeSystemError, ValueType};

/// A host-side value ready to cross (or just having crossed) the FFI
/// boundary. This is the Rust-side counterpart of the foreign byte buffer;
/// [`marshal`] writes one into the ABI layout [`crate::StructType::layout`]
/// describes, [`demarshal`] reads one back out.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
	Bool(bool),
	Int8(i8),
	Int16(i16),
	Int32(i32),
	Int64(i64),
	Float32(f32),
	Float64(f64),
	Struct(Vec<HostValue>),
}

/// Serialize `v` into a byte buffer laid out exactly as `t`'s C ABI
/// representation (see [`crate::StructType::layout`]). Struct fields recurse
/// in declaration order at their aligned offsets.
pub fn marshal(v: &HostValue, t: &ValueType) -> Result<Vec<u8>, TypeSystemError> {
	let mut buf = vec![0u8; t.abi_size() as usize];
	write_into(v, t, &mut buf, 0)?;
	Ok(buf)
}

fn write_into(
	v: &HostValue,
	t: &ValueType,
	buf: &mut [u8],
	offset: usize,
) -> Result<(), TypeSystemError> {
	let mismatch = || TypeSystemError::ValueTypeMismatch {
		expected: t.to_string().into(),
	};

	match (v, t) {
		(HostValue::Bool(b), ValueType::Bool) => {
			buf[offset] = u8::from(*b);
		}
		(HostValue::Int8(n), ValueType::Int(IntWidth::W8)) => {
			buf[offset] = *n as u8;
		}
		(HostValue::Int16(n), ValueType::Int(IntWidth::W16)) => {
			(&mut buf[offset..]).write_i16::<NativeEndian>(*n).unwrap();
		}
		(HostValue::Int32(n), ValueType::Int(IntWidth::W32)) => {
			(&mut buf[offset..]).write_i32::<NativeEndian>(*n).unwrap();
		}
		(HostValue::Int64(n), ValueType::Int(IntWidth::W64)) => {
			(&mut buf[offset..]).write_i64::<NativeEndian>(*n).unwrap();
		}
		(HostValue::Float32(n), ValueType::Float(FloatWidth::F32)) => {
			(&mut buf[offset..]).write_f32::<NativeEndian>(*n).unwrap();
		}
		(HostValue::Float64(n), ValueType::Float(FloatWidth::F64)) => {
			(&mut buf[offset..]).write_f64::<NativeEndian>(*n).unwrap();
		}
		(HostValue::Struct(values), ValueType::Struct(s)) => {
			if values.len() != s.fields.len() {
				return Err(mismatch());
			}
			for ((_, field_type), (value, field_offset)) in s
				.fields
				.iter()
				.zip(values.iter().zip(s.field_offsets()))
			{
				write_into(value, field_type, buf, offset + field_offset as usize)?;
			}
		}
		_ => return Err(mismatch()),
	}

	Ok(())
}

/// Parse `raw` as a [`HostValue`] of type `t`, reading from the ABI layout
/// [`crate::StructType::layout`] describes.
pub fn demarshal(raw: &[u8], t: &ValueType) -> Result<HostValue, TypeSystemError> {
	let need = t.abi_size();
	if raw.len() < need as usize {
		return Err(TypeSystemError::BufferTooShort {
			expected: t.to_string().into(),
			need,
			got: raw.len(),
		});
	}
	read_from(t, raw, 0)
}

fn read_from(t: &ValueType, buf: &[u8], offset: usize) -> Result<HostValue, TypeSystemError> {
	Ok(match t {
		ValueType::Bool => HostValue::Bool(buf[offset] != 0),
		ValueType::Int(IntWidth::W8) => HostValue::Int8(buf[offset] as i8),
		ValueType::Int(IntWidth::W16) => {
			HostValue::Int16((&buf[offset..]).read_i16::<NativeEndian>().unwrap())
		}
		ValueType::Int(IntWidth::W32) => {
			HostValue::Int32((&buf[offset..]).read_i32::<NativeEndian>().unwrap())
		}
		ValueType::Int(IntWidth::W64) => {
			HostValue::Int64((&buf[offset..]).read_i64::<NativeEndian>().unwrap())
		}
		ValueType::Float(FloatWidth::F32) => {
			HostValue::Float32((&buf[offset..]).read_f32::<NativeEndian>().unwrap())
		}
		ValueType::Float(FloatWidth::F64) => {
			HostValue::Float64((&buf[offset..]).read_f64::<NativeEndian>().unwrap())
		}
		ValueType::Struct(s) => {
			let mut fields = Vec::with_capacity(s.fields.len());
			for ((_, field_type), field_offset) in s.fields.iter().zip(s.field_offsets()) {
				fields.push(read_from(field_type, buf, offset + field_offset as usize)?);
			}
			HostValue::Struct(fields)
		}
	})
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use xgrid_util::RString;

	use super::*;
	use crate::StructType;

	#[test]
	fn scalar_round_trips() {
		for (v, t) in [
			(HostValue::Bool(true), ValueType::Bool),
			(HostValue::Int32(-17), ValueType::Int(IntWidth::W32)),
			(HostValue::Float64(3.5), ValueType::Float(FloatWidth::F64)),
		] {
			let raw = marshal(&v, &t).unwrap();
			assert_eq!(demarshal(&raw, &t).unwrap(), v);
		}
	}

	#[test]
	fn struct_round_trips_with_padding() {
		let s = Arc::new(StructType {
			name: RString::new("Particle"),
			fields: vec![
				(RString::new("flag"), ValueType::Bool),
				(RString::new("mass"), ValueType::Float(FloatWidth::F64)),
			],
		});
		let t = ValueType::Struct(s);
		let v = HostValue::Struct(vec![HostValue::Bool(true), HostValue::Float64(2.0)]);

		let raw = marshal(&v, &t).unwrap();
		assert_eq!(raw.len(), 16); // bool at 0, 7 bytes padding, f64 at 8
		assert_eq!(demarshal(&raw, &t).unwrap(), v);
	}

	#[test]
	fn demarshal_rejects_short_buffer() {
		let t = ValueType::Float(FloatWidth::F64);
		assert!(matches!(
			demarshal(&[0u8; 4], &t),
			Err(TypeSystemError::BufferTooShort { .. })
		));
	}

	#[test]
	fn marshal_rejects_shape_mismatch() {
		let t = ValueType::Int(IntWidth::W32);
		assert!(matches!(
			marshal(&HostValue::Bool(true), &t),
			Err(TypeSystemError::ValueTypeMismatch { .. })
		));
	}
}
