//! ONNX Runtime backend.

use ort::session::Session as OrtSession;
use ort::value::{DynValue, Tensor};

use super::{InferenceSession, NamedTensor, SessionFactory, TensorData};
use crate::{Error, Result};

/// Creates ONNX Runtime sessions from in-memory model bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtSessionFactory;

impl SessionFactory for OrtSessionFactory {
    fn create(&self, model: &[u8]) -> Result<Box<dyn InferenceSession>> {
        let session = OrtSession::builder()?.commit_from_memory(model)?;
        Ok(Box::new(OrtInference { session }))
    }
}

struct OrtInference {
    session: OrtSession,
}

impl InferenceSession for OrtInference {
    fn run(&mut self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        let mut values: Vec<(String, DynValue)> = Vec::with_capacity(inputs.len());
        for NamedTensor { name, shape, data } in inputs {
            let value = match data {
                TensorData::F32(data) => Tensor::from_array((shape, data))?.into_dyn(),
                TensorData::I64(data) => Tensor::from_array((shape, data))?.into_dyn(),
                TensorData::Bool(data) => Tensor::from_array((shape, data))?.into_dyn(),
            };
            values.push((name, value));
        }

        let outputs = self.session.run(values)?;
        let mut tensors = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            let (shape, data) = if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
                (shape.to_vec(), TensorData::F32(data.to_vec()))
            } else if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
                (shape.to_vec(), TensorData::I64(data.to_vec()))
            } else if let Ok((shape, data)) = value.try_extract_tensor::<bool>() {
                (shape.to_vec(), TensorData::Bool(data.to_vec()))
            } else {
                return Err(Error::Inference(format!(
                    "output {name} has an unsupported element type"
                )));
            };
            let shape = shape.into_iter().map(|d| d.max(0) as usize).collect();
            tensors.push(NamedTensor::new(name, shape, data)?);
        }
        Ok(tensors)
    }
}
