//! Helper traits for allocator trait bounds.
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Scalar, U1};

/// An allocator for a single dimension.
///
/// Covers points, vectors and square matrices of the given dimension, as needed by element
/// geometry and the finite element evaluators. Buffers are `Send + Sync` so that evaluators
/// can live in per-thread workspaces.
pub trait DimAllocator<T: Scalar, D: DimName>:
    Allocator<T, D, Buffer: Send + Sync>
    + Allocator<T, D, D, Buffer: Send + Sync>
    + Allocator<T, U1, D, Buffer: Send + Sync>
    // Used for decompositions (determinants and inverses of Jacobians)
    + Allocator<usize, D>
    + Allocator<(usize, usize), D>
{
}

impl<T, D> DimAllocator<T, D> for DefaultAllocator
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D, Buffer: Send + Sync>
        + Allocator<T, D, D, Buffer: Send + Sync>
        + Allocator<T, U1, D, Buffer: Send + Sync>
        + Allocator<usize, D>
        + Allocator<(usize, usize), D>,
{
}
