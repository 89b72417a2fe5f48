use burn::prelude::Backend;
use burn::tensor::{Bool, Element, Int, Tensor, TensorData};
use ndarray::{Array, Dimension};
use num_traits::{ToPrimitive, Zero};

use crate::error::{Result, TaskError};

/// Moves a host array of any rank onto the device as a float tensor.
///
/// The array is read in logical (row-major) order, so sliced or transposed
/// views are laid out correctly.
pub fn ndarray2tensor<B, T, Dm, const D: usize>(arr: &Array<T, Dm>, device: &B::Device) -> Tensor<B, D>
where
    B: Backend,
    T: Element + Zero + ToPrimitive,
    Dm: Dimension,
{
    let shape = arr.shape().to_vec();
    debug_assert_eq!(shape.len(), D, "array rank does not match tensor rank");
    let vec = arr.iter().cloned().collect::<Vec<T>>();
    Tensor::<B, D>::from_data(TensorData::new(vec, shape), device)
}

pub fn vec2tensor1<B: Backend, T: Element + Zero + ToPrimitive>(
    arr: Vec<T>,
    device: &B::Device,
) -> Tensor<B, 1> {
    let shape = [arr.len()];
    Tensor::<B, 1>::from_data(TensorData::new(arr, shape), device)
}

pub fn vec2inttensor1<B: Backend>(arr: Vec<i64>, device: &B::Device) -> Tensor<B, 1, Int> {
    let shape = [arr.len()];
    Tensor::<B, 1, Int>::from_data(TensorData::new(arr, shape), device)
}

pub fn vec2booltensor1<B: Backend>(arr: Vec<bool>, device: &B::Device) -> Tensor<B, 1, Bool> {
    let shape = [arr.len()];
    Tensor::<B, 1, Bool>::from_data(TensorData::new(arr, shape), device)
}

/// Index tensor used with `select` to pick joints or bodies.
pub fn index_tensor<B: Backend>(ids: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    vec2inttensor1(ids.iter().map(|&i| i as i64).collect(), device)
}

pub fn tensor2vec1<B: Backend>(tensor: Tensor<B, 1>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TaskError::Data(format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use ndarray::{array, s};

    type TestBackend = NdArray;

    #[test]
    fn test_ndarray2tensor_keeps_logical_order() {
        let device = Default::default();
        let arr = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let column = arr.slice(s![.., 1..2]).to_owned().reversed_axes();
        let tensor: Tensor<TestBackend, 2> = ndarray2tensor(&column, &device);
        assert_eq!(tensor.dims(), [1, 2]);
        assert_eq!(tensor2vec1(tensor.flatten(0, 1)).unwrap(), vec![2.0, 5.0]);
    }

    #[test]
    fn test_index_tensor() {
        let device = Default::default();
        let ids = index_tensor::<TestBackend>(&[2, 0], &device);
        let values = vec2tensor1::<TestBackend, f32>(vec![10.0, 20.0, 30.0], &device);
        assert_eq!(tensor2vec1(values.select(0, ids)).unwrap(), vec![30.0, 10.0]);
    }
}
