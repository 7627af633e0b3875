use smallvec::SmallVec;

/// The extent of a grid along each of its dimensions.
///
/// Most stencil grids are 1D-3D, so the inline capacity of 4 avoids a heap
/// allocation for the overwhelming majority of shapes while still allowing
/// arbitrary dimension counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(SmallVec<[i32; 4]>);

impl Shape {
	#[must_use]
	pub fn new(dims: impl IntoIterator<Item = i32>) -> Self {
		Self(dims.into_iter().collect())
	}

	#[must_use]
	pub fn dimension(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn dims(&self) -> &[i32] {
		&self.0
	}

	/// Total element count, i.e. `prod(shape)`.
	#[must_use]
	pub fn volume(&self) -> usize {
		self.0.iter().map(|&d| d as usize).product()
	}

	/// Row-major linear index of `indices`, axis 0 varying slowest.
	#[must_use]
	pub fn linear_index(&self, indices: &[i64]) -> i64 {
		debug_assert_eq!(indices.len(), self.0.len());

		let mut idx = 0i64;
		for (dim, &i) in self.0.iter().zip(indices.iter()) {
			idx = idx * (*dim as i64) + i;
		}
		idx
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn volume_is_product_of_dims() {
		let shape = Shape::new([41, 41]);
		assert_eq!(shape.volume(), 1681);
	}

	#[test]
	fn linear_index_is_row_major_axis0_slowest() {
		let shape = Shape::new([3, 4]);
		assert_eq!(shape.linear_index(&[0, 0]), 0);
		assert_eq!(shape.linear_index(&[0, 1]), 1);
		assert_eq!(shape.linear_index(&[1, 0]), 4);
		assert_eq!(shape.linear_index(&[2, 3]), 11);
	}
}
