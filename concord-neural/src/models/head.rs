// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use candle_core::{Module, Result, Tensor};
use candle_nn::{Linear, VarBuilder, linear};

/// Dense classification head placed on top of a frozen or trainable backbone
///
/// Each hidden layer is a ReLU-activated dense layer. The output layer is
/// linear and returns one logit per class.
#[derive(Debug, Clone)]
pub struct ClassifierHead {
    hidden: Vec<Linear>,
    output: Linear,
}

impl ClassifierHead {
    /// Build the head
    ///
    /// # Arguments
    ///
    /// * `vb` - Variable builder for the head's parameters
    /// * `input_dim` - Embedding dimension produced by the backbone
    /// * `hidden_layers` - Width of each hidden layer, in order
    /// * `classes` - Number of output classes
    pub fn new(
        vb: VarBuilder,
        input_dim: usize,
        hidden_layers: &[usize],
        classes: usize,
    ) -> Result<Self> {
        let mut hidden = Vec::with_capacity(hidden_layers.len());
        let mut in_dim = input_dim;

        for (i, &width) in hidden_layers.iter().enumerate() {
            hidden.push(linear(in_dim, width, vb.pp(format!("hidden.{}", i)))?);
            in_dim = width;
        }

        let output = linear(in_dim, classes, vb.pp("output"))?;

        Ok(Self { hidden, output })
    }
}

impl Module for ClassifierHead {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();

        for layer in self.hidden.iter() {
            xs = layer.forward(&xs)?.relu()?;
        }

        self.output.forward(&xs)
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_head_shapes_and_names() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let head = ClassifierHead::new(vb.pp("head"), 16, &[8, 4], 3).unwrap();

        let xs = Tensor::ones((5, 16), DType::F32, &Device::Cpu).unwrap();
        assert_eq!(head.forward(&xs).unwrap().dims(), &[5, 3]);

        let data = varmap.data().lock().unwrap();
        assert!(data.contains_key("head.hidden.0.weight"));
        assert!(data.contains_key("head.hidden.1.bias"));
        assert!(data.contains_key("head.output.weight"));
    }

    #[test]
    fn test_head_without_hidden_layers() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let head = ClassifierHead::new(vb, 16, &[], 2).unwrap();

        let xs = Tensor::ones((1, 16), DType::F32, &Device::Cpu).unwrap();
        assert_eq!(head.forward(&xs).unwrap().dims(), &[1, 2]);
    }
}
