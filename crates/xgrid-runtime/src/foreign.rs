//! [`ForeignGrid`]: the pieces of [`crate::Grid::marshal`]'s output, and the
//! exact byte layout the C struct C4's `emit_grid_type` emits for this
//! grid's `(element, dimension)` expects: `{ int32_t time_depth; int32_t
//! shape[D]; T** data; int32_t* boundary_mask }`.

/// Raw pointers into a [`crate::Grid`]'s own buffers. Borrows the grid's
/// memory for the duration of one kernel call — the grid must outlive every
/// use of a `ForeignGrid` built from it, and must not be mutated through any
/// other handle while one is alive (the single-threaded host rule the
/// calling facade is responsible for upholding).
#[derive(Debug)]
pub struct ForeignGrid {
	pub time_depth: i32,
	pub shape: Vec<i32>,
	/// One pointer per history buffer, in logical order (`data[0]` = "now").
	pub data: Vec<*mut u8>,
	pub boundary_mask: *mut i32,
}

impl ForeignGrid {
	pub(crate) fn new(time_depth: i32, shape: Vec<i32>, data: Vec<*mut u8>, boundary_mask: *mut i32) -> Self {
		Self {
			time_depth,
			shape,
			data,
			boundary_mask,
		}
	}

	#[must_use]
	pub fn dimension(&self) -> usize {
		self.shape.len()
	}

	/// Pack this record into the exact byte layout of C4's emitted Grid
	/// struct for this dimension: `time_depth`, then `shape[D]`, then the
	/// `data` pointer, then the `boundary_mask` pointer, each field aligned
	/// the way a C compiler would place it. `data` here points at nothing
	/// outside this returned buffer — the caller must additionally keep
	/// `self.data`'s backing table alive (see [`Self::data_table_ptr`]) and
	/// write its address into the offset [`Self::data_field_offset`] gives.
	#[must_use]
	pub fn record_bytes(&self, data_table_ptr: *const u8) -> Vec<u8> {
		let ptr_size = std::mem::size_of::<*mut u8>();
		let ptr_align = std::mem::align_of::<*mut u8>();

		let shape_offset = std::mem::size_of::<i32>();
		let after_shape = shape_offset + self.shape.len() * std::mem::size_of::<i32>();
		let data_offset = align_up(after_shape, ptr_align);
		let mask_offset = data_offset + ptr_size;
		let size = align_up(mask_offset + ptr_size, ptr_align);

		let mut buf = vec![0u8; size];
		buf[0..shape_offset].copy_from_slice(&self.time_depth.to_ne_bytes());
		for (i, dim) in self.shape.iter().enumerate() {
			let at = shape_offset + i * std::mem::size_of::<i32>();
			buf[at..at + std::mem::size_of::<i32>()].copy_from_slice(&dim.to_ne_bytes());
		}
		buf[data_offset..data_offset + ptr_size].copy_from_slice(&(data_table_ptr as usize).to_ne_bytes());
		buf[mask_offset..mask_offset + ptr_size].copy_from_slice(&(self.boundary_mask as usize).to_ne_bytes());
		buf
	}

	/// A pointer to `self.data`'s own backing storage — the table
	/// `record_bytes`'s `data` field must point at. Valid only as long as
	/// `self.data` is not reallocated (it never is, after construction).
	#[must_use]
	pub fn data_table_ptr(&self) -> *const u8 {
		self.data.as_ptr().cast()
	}
}

fn align_up(offset: usize, align: usize) -> usize {
	debug_assert!(align.is_power_of_two());
	(offset + align - 1) & !(align - 1)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn record_bytes_places_shape_inline_and_pointers_pointer_aligned() {
		let mut mask = [0i32; 4];
		let mut data_bufs: [u8; 1] = [0];
		let data = vec![data_bufs.as_mut_ptr()];
		let foreign = ForeignGrid::new(1, vec![2, 2], data, mask.as_mut_ptr());

		let table_ptr = foreign.data_table_ptr();
		let bytes = foreign.record_bytes(table_ptr);

		let ptr_size = std::mem::size_of::<*mut u8>();
		// time_depth(4) + shape[2](8) = 12, then pointer-aligned.
		let expected_data_offset = align_up(12, std::mem::align_of::<*mut u8>());
		assert_eq!(bytes.len(), expected_data_offset + 2 * ptr_size);
		assert_eq!(i32::from_ne_bytes(bytes[0..4].try_into().unwrap()), 1);
		assert_eq!(i32::from_ne_bytes(bytes[4..8].try_into().unwrap()), 2);
		assert_eq!(i32::from_ne_bytes(bytes[8..12].try_into().unwrap()), 2);
	}
}
