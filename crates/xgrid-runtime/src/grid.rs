//! [`Grid`]: shape, element type, a ring-buffered time history, and a
//! parallel boundary mask, per `xgrid/__init__.py`'s `Grid` class (there
//! left as a `# TODO: implement grid data layout and serialization` stub)
//! and SPEC_FULL.md's §4.5 Grid runtime contract.

use xgrid_types::{demarshal, marshal, HostValue, ValueType};
use xgrid_util::{RString, Shape};

use crate::error::ShapeError;
use crate::foreign::ForeignGrid;

/// A grid's time history, stored as a fixed-size ring of buffers rather
/// than a plain `Vec` that grows/shrinks from one end — logical index `k`
/// ("k steps ago") is remapped to a physical slot by [`Self::rotate`]
/// instead of having its bytes moved, per the original's `_time_idx`
/// design.
#[derive(Debug)]
pub struct Grid {
	name: RString,
	shape: Shape,
	element: ValueType,
	/// Physical buffers, each `shape.volume() * element.abi_size()` bytes.
	buffers: Vec<Vec<u8>>,
	/// Physical slot currently addressed as logical index 0 ("now").
	base: usize,
	boundary_mask: Vec<i32>,
}

impl Grid {
	/// Construct a grid with history depth 1 (a single zeroed "now" buffer)
	/// and a zeroed boundary mask.
	#[must_use]
	pub fn new(name: impl Into<RString>, shape: Shape, element: ValueType) -> Self {
		let volume = shape.volume();
		let cell_size = element.abi_size() as usize;
		Self {
			name: name.into(),
			shape,
			element,
			buffers: vec![vec![0u8; volume * cell_size]],
			base: 0,
			boundary_mask: vec![0i32; volume],
		}
	}

	#[must_use]
	pub fn name(&self) -> &RString {
		&self.name
	}

	#[must_use]
	pub fn shape(&self) -> &Shape {
		&self.shape
	}

	#[must_use]
	pub fn element(&self) -> &ValueType {
		&self.element
	}

	#[must_use]
	pub fn dimension(&self) -> usize {
		self.shape.dimension()
	}

	#[must_use]
	pub fn history_depth(&self) -> usize {
		self.buffers.len()
	}

	fn physical(&self, k: usize) -> usize {
		(self.base + k) % self.buffers.len()
	}

	/// Overwrite the buffer `|time|` steps ago with `values`, one
	/// [`HostValue`] per cell in row-major order, extending history first if
	/// `time` is deeper than the current depth.
	pub fn fill(&mut self, values: &[HostValue], time: i64) -> Result<(), ShapeError> {
		let volume = self.shape.volume();
		if values.len() != volume {
			return Err(ShapeError::FillLengthMismatch {
				name: self.name.clone(),
				expected: volume,
				got: values.len(),
			}
			.log());
		}

		let depth = time.unsigned_abs() as usize + 1;
		if depth > self.history_depth() {
			self.prepare_for(depth);
		}

		let cell_size = self.element.abi_size() as usize;
		let physical = self.physical(time.unsigned_abs() as usize);
		let buf = &mut self.buffers[physical];
		for (cell, value) in values.iter().enumerate() {
			let bytes = marshal(value, &self.element).map_err(|source| {
				ShapeError::ElementTypeMismatch {
					name: self.name.clone(),
					cell,
					source,
				}
				.log()
			})?;
			buf[cell * cell_size..(cell + 1) * cell_size].copy_from_slice(&bytes);
		}
		Ok(())
	}

	/// Read back the buffer `|time|` steps ago, one [`HostValue`] per cell in
	/// row-major order — the counterpart to [`Self::fill`], for a host that
	/// wants to inspect a kernel's output.
	pub fn read(&self, time: i64) -> Result<Vec<HostValue>, ShapeError> {
		let depth = time.unsigned_abs() as usize + 1;
		if depth > self.history_depth() {
			return Err(ShapeError::TimeIndexOutOfRange {
				name: self.name.clone(),
				time,
				depth: self.history_depth(),
			}
			.log());
		}

		let cell_size = self.element.abi_size() as usize;
		let physical = self.physical(time.unsigned_abs() as usize);
		let buf = &self.buffers[physical];
		(0..self.shape.volume())
			.map(|cell| {
				demarshal(&buf[cell * cell_size..(cell + 1) * cell_size], &self.element).map_err(|source| {
					ShapeError::ElementTypeMismatch {
						name: self.name.clone(),
						cell,
						source,
					}
					.log()
				})
			})
			.collect()
	}

	/// Set the boundary mask at `index` (one coordinate per dimension).
	pub fn set_boundary(&mut self, index: &[i64], mask: i32) -> Result<(), ShapeError> {
		let linear = self.checked_linear_index(index)?;
		self.boundary_mask[linear] = mask;
		Ok(())
	}

	#[must_use]
	pub fn boundary_at(&self, index: &[i64]) -> Option<i32> {
		let linear = self.checked_linear_index(index).ok()?;
		Some(self.boundary_mask[linear])
	}

	fn checked_linear_index(&self, index: &[i64]) -> Result<usize, ShapeError> {
		if index.len() != self.shape.dimension()
			|| index
				.iter()
				.zip(self.shape.dims())
				.any(|(&i, &d)| i < 0 || i >= i64::from(d))
		{
			return Err(ShapeError::IndexOutOfRange {
				name: self.name.clone(),
				index: index.to_vec(),
				shape: self.shape.dims().to_vec(),
			}
			.log());
		}
		Ok(self.shape.linear_index(index) as usize)
	}

	/// Extend (or shrink) history to exactly `depth` buffers. New buffers
	/// are appended as the deepest (oldest) history and zero-initialized;
	/// buffers beyond `depth` are the ones dropped when shrinking, since
	/// they're the ones furthest from "now".
	pub fn prepare_for(&mut self, depth: usize) {
		let depth = depth.max(1);
		if depth == self.history_depth() {
			return;
		}

		// Materialize into logical order (index 0 = "now") so the ring's
		// `base` can be reset to 0 once the buffer count changes.
		let old_depth = self.history_depth();
		let mut ordered: Vec<Vec<u8>> = (0..old_depth)
			.map(|k| {
				let idx = self.physical(k);
				std::mem::take(&mut self.buffers[idx])
			})
			.collect();

		let volume = self.shape.volume();
		let cell_size = self.element.abi_size() as usize;
		ordered.resize_with(depth, || vec![0u8; volume * cell_size]);
		ordered.truncate(depth);

		self.buffers = ordered;
		self.base = 0;
	}

	/// Circularly shift history so logical index 0 becomes 1, 1 becomes 2,
	/// etc. — an O(1) index rotation, no buffer is moved or dropped.
	pub fn rotate(&mut self) {
		let depth = self.buffers.len();
		self.base = (self.base + depth - 1) % depth;
	}

	/// Produce the record the generated C accessor expects: `time_depth`,
	/// `shape`, a table of raw pointers (one per history buffer, in logical
	/// order) and the boundary mask pointer.
	#[must_use]
	pub fn marshal(&mut self) -> ForeignGrid {
		let depth = self.buffers.len();
		let pointers: Vec<*mut u8> = (0..depth)
			.map(|k| {
				let idx = self.physical(k);
				self.buffers[idx].as_mut_ptr()
			})
			.collect();
		ForeignGrid::new(depth as i32, self.shape.dims().to_vec(), pointers, self.boundary_mask.as_mut_ptr())
	}
}
