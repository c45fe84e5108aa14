use crate::domain::model::Value;
use crate::utils::error::{PropError, Result};
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Row-major n-dimensional array of `f64`. A 0-d array holds a single scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl NdArray {
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let size: usize = shape.iter().product();
        if size != data.len() {
            return Err(PropError::shape(format!(
                "shape {:?} needs {} elements, found {}",
                shape,
                size,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn full(shape: &[usize], value: f64) -> Self {
        let size: usize = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![value; size],
        }
    }

    /// `num` evenly spaced values over `[start, stop]`, both ends included.
    pub fn linspace(start: f64, stop: f64, num: usize) -> Self {
        let data = match num {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (num - 1) as f64;
                (0..num)
                    .map(|i| if i == num - 1 { stop } else { start + step * i as f64 })
                    .collect()
            }
        };
        Self::from_vec(data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn as_scalar(&self) -> Option<f64> {
        (self.data.len() == 1).then(|| self.data[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }

    /// Repeats the array along broadcast axes, numpy style.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        if self.shape == shape {
            return Ok(self.clone());
        }
        let offset = shape.len().checked_sub(self.ndim()).ok_or_else(|| {
            PropError::shape(format!(
                "cannot broadcast shape {:?} to {:?}",
                self.shape, shape
            ))
        })?;

        let mut strides = vec![0usize; shape.len()];
        let mut acc = 1usize;
        for axis in (0..self.ndim()).rev() {
            let dim = self.shape[axis];
            let target = shape[axis + offset];
            if dim != target && dim != 1 {
                return Err(PropError::shape(format!(
                    "cannot broadcast shape {:?} to {:?}",
                    self.shape, shape
                )));
            }
            strides[axis + offset] = if dim == 1 { 0 } else { acc };
            acc *= dim;
        }

        let size: usize = shape.iter().product();
        let mut data = Vec::with_capacity(size);
        let mut index = vec![0usize; shape.len()];
        for _ in 0..size {
            let flat: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
            data.push(self.data[flat]);
            for axis in (0..shape.len()).rev() {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }

        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    pub fn zip_with(&self, other: &NdArray, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        let shape = broadcast_shapes(&self.shape, &other.shape)?;
        let lhs = self.broadcast_to(&shape)?;
        let rhs = other.broadcast_to(&shape)?;
        let data = lhs
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self { shape, data })
    }

    /// Element-wise `where(condition, a, b)`.
    pub fn select(condition: &NdArray, a: &NdArray, b: &NdArray) -> Result<Self> {
        let shape = broadcast_shapes(&broadcast_shapes(&condition.shape, &a.shape)?, &b.shape)?;
        let condition = condition.broadcast_to(&shape)?;
        let a = a.broadcast_to(&shape)?;
        let b = b.broadcast_to(&shape)?;
        let data = condition
            .data
            .iter()
            .zip(a.data.iter().zip(&b.data))
            .map(|(&c, (&x, &y))| if c != 0.0 { x } else { y })
            .collect();
        Ok(Self { shape, data })
    }

    pub fn reverse_axis(&self, axis: usize) -> Self {
        let outer: usize = self.shape[..axis].iter().product();
        let len = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product();
        let mut data = Vec::with_capacity(self.data.len());
        for o in 0..outer {
            for i in (0..len).rev() {
                let start = (o * len + i) * inner;
                data.extend_from_slice(&self.data[start..start + inner]);
            }
        }
        Self {
            shape: self.shape.clone(),
            data,
        }
    }

    /// Builds an array from a number or (nested) sequence. Sibling sequences
    /// must share a shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut data = Vec::new();
        let shape = collect(value, &mut data)?;
        Ok(Self { shape, data })
    }

    pub fn to_value(&self) -> Value {
        nest(&self.shape, &self.data)
    }
}

fn collect(value: &Value, data: &mut Vec<f64>) -> Result<Vec<usize>> {
    match value {
        Value::Seq(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = collect(item, data)?;
                match &inner {
                    None => inner = Some(shape),
                    Some(expected) if *expected != shape => {
                        return Err(PropError::shape(format!(
                            "ragged nested sequence: {:?} and {:?}",
                            expected, shape
                        )));
                    }
                    Some(_) => {}
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        Value::Array(array) => {
            data.extend_from_slice(&array.data);
            Ok(array.shape.clone())
        }
        other => {
            let number = other.as_f64().ok_or_else(|| {
                PropError::shape(format!("expected a number, found {}", other.type_name()))
            })?;
            data.push(number);
            Ok(Vec::new())
        }
    }
}

fn nest(shape: &[usize], data: &[f64]) -> Value {
    match shape.split_first() {
        None => Value::Float(data[0]),
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            Value::Seq(
                (0..len)
                    .map(|i| nest(rest, &data[i * stride..(i + 1) * stride]))
                    .collect(),
            )
        }
    }
}

pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let dim = |shape: &[usize], i: usize| {
        let pad = ndim - shape.len();
        if i < pad {
            1
        } else {
            shape[i - pad]
        }
    };

    (0..ndim)
        .map(|i| match (dim(a, i), dim(b, i)) {
            (x, y) if x == y => Ok(x),
            (1, y) => Ok(y),
            (x, 1) => Ok(x),
            _ => Err(PropError::shape(format!(
                "operands could not be broadcast together with shapes {:?} {:?}",
                a, b
            ))),
        })
        .collect()
}

impl From<f64> for NdArray {
    fn from(value: f64) -> Self {
        NdArray::scalar(value)
    }
}

impl From<Vec<f64>> for NdArray {
    fn from(data: Vec<f64>) -> Self {
        NdArray::from_vec(data)
    }
}

struct Nested<'a> {
    shape: &'a [usize],
    data: &'a [f64],
}

impl Serialize for Nested<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.shape.split_first() {
            None => serializer.serialize_f64(self.data.first().copied().unwrap_or(f64::NAN)),
            Some((&len, rest)) => {
                let stride: usize = rest.iter().product();
                let mut seq = serializer.serialize_seq(Some(len))?;
                for i in 0..len {
                    seq.serialize_element(&Nested {
                        shape: rest,
                        data: &self.data[i * stride..(i + 1) * stride],
                    })?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for NdArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Nested {
            shape: &self.shape,
            data: &self.data,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: Vec<Value>) -> Value {
        Value::Seq(items)
    }

    #[test]
    fn test_nested_sequence_shape() {
        let value = seq(vec![
            seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            seq(vec![Value::Float(4.0), Value::Float(5.0), Value::Float(6.0)]),
        ]);
        let array = NdArray::from_value(&value).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ragged_sequence_is_rejected() {
        let value = seq(vec![
            seq(vec![Value::Int(1), Value::Int(2)]),
            seq(vec![Value::Int(3)]),
        ]);
        assert!(matches!(
            NdArray::from_value(&value),
            Err(PropError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_non_numeric_element_is_rejected() {
        let value = seq(vec![Value::Str("steel".to_string())]);
        assert!(NdArray::from_value(&value).is_err());
    }

    #[test]
    fn test_scalar_and_to_value() {
        let array = NdArray::from_value(&Value::Float(2.5)).unwrap();
        assert_eq!(array.ndim(), 0);
        assert_eq!(array.as_scalar(), Some(2.5));
        assert!(matches!(array.to_value(), Value::Float(v) if v == 2.5));
    }

    #[test]
    fn test_broadcast_column_against_row() {
        let column = NdArray::from_shape_vec(vec![3, 1], vec![1.0, 2.0, 3.0]).unwrap();
        let row = NdArray::from_vec(vec![10.0, 20.0]);
        let sum = column.zip_with(&row, |a, b| a + b).unwrap();
        assert_eq!(sum.shape(), &[3, 2]);
        assert_eq!(sum.as_slice(), &[11.0, 21.0, 12.0, 22.0, 13.0, 23.0]);
    }

    #[test]
    fn test_incompatible_broadcast() {
        let a = NdArray::from_vec(vec![1.0, 2.0, 3.0]);
        let b = NdArray::from_vec(vec![1.0, 2.0]);
        assert!(a.zip_with(&b, |x, y| x * y).is_err());
    }

    #[test]
    fn test_select() {
        let cond = NdArray::from_vec(vec![1.0, 0.0, 1.0]);
        let out = NdArray::select(&cond, &NdArray::scalar(5.0), &NdArray::from_vec(vec![7.0, 8.0, 9.0]))
            .unwrap();
        assert_eq!(out.as_slice(), &[5.0, 8.0, 5.0]);
    }

    #[test]
    fn test_linspace_hits_both_ends() {
        let xs = NdArray::linspace(0.0, 1.0, 5);
        assert_eq!(xs.as_slice(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_reverse_axis() {
        let array = NdArray::from_shape_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(array.reverse_axis(0).as_slice(), &[3.0, 4.0, 1.0, 2.0]);
        assert_eq!(array.reverse_axis(1).as_slice(), &[2.0, 1.0, 4.0, 3.0]);
    }

    #[test]
    fn test_serialize_as_nested_json() {
        let array = NdArray::from_shape_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let json = serde_json::to_string(&array).unwrap();
        assert_eq!(json, "[[1.0,2.0],[3.0,4.0]]");
        assert_eq!(serde_json::to_string(&NdArray::scalar(1.5)).unwrap(), "1.5");
    }
}
