// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use candle_core::{D, IndexOp, Module, Result, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, LayerNorm, Linear, VarBuilder, layer_norm};

const LAYER_NORM_EPS: f64 = 1e-5;

fn linear(vb: VarBuilder, in_dim: usize, out_dim: usize, bias: bool) -> Result<Linear> {
    if bias {
        candle_nn::linear(in_dim, out_dim, vb)
    } else {
        candle_nn::linear_no_bias(in_dim, out_dim, vb)
    }
}

#[derive(Debug, Clone)]
struct Attention {
    qkv: Linear,
    proj: Linear,
    num_heads: usize,
    scale: f64,
}

impl Attention {
    fn new(vb: VarBuilder, dim: usize, num_heads: usize) -> Result<Self> {
        let qkv = linear(vb.pp("qkv"), dim, dim * 3, true)?;
        let proj = linear(vb.pp("proj"), dim, dim, true)?;
        let scale = 1. / ((dim / num_heads) as f64).sqrt();

        Ok(Self {
            qkv,
            proj,
            num_heads,
            scale,
        })
    }
}

impl Module for Attention {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (b, n, c) = xs.dims3()?;

        // (b, n, 3 * c) -> (3, b, heads, n, c / heads)
        let qkv = self
            .qkv
            .forward(xs)?
            .reshape((b, n, 3, self.num_heads, c / self.num_heads))?
            .transpose(1, 2)?
            .transpose(0, 1)?
            .transpose(2, 3)?;

        let q = (qkv.i(0)? * self.scale)?;
        let k = qkv.i(1)?.contiguous()?;
        let v = qkv.i(2)?.contiguous()?;

        let attn = candle_nn::ops::softmax(&q.matmul(&k.t()?)?, D::Minus1)?;
        let attn = attn.matmul(&v)?.transpose(1, 2)?.reshape((b, n, c))?;

        self.proj.forward(&attn)
    }
}

#[derive(Debug, Clone)]
struct LayerScale {
    gamma: Tensor,
}

impl LayerScale {
    fn new(vb: VarBuilder, dim: usize) -> Result<Self> {
        let gamma = vb.get(dim, "gamma")?;
        Ok(Self { gamma })
    }
}

impl Module for LayerScale {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        xs.broadcast_mul(&self.gamma)
    }
}

#[derive(Debug, Clone)]
struct Mlp {
    fc1: Linear,
    fc2: Linear,
}

impl Mlp {
    fn new(vb: VarBuilder, in_features: usize, hidden_features: usize) -> Result<Self> {
        let fc1 = linear(vb.pp("fc1"), in_features, hidden_features, true)?;
        let fc2 = linear(vb.pp("fc2"), hidden_features, in_features, true)?;

        Ok(Self { fc1, fc2 })
    }
}

impl Module for Mlp {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.fc2.forward(&self.fc1.forward(xs)?.gelu()?)
    }
}

#[derive(Debug, Clone)]
struct Block {
    norm1: LayerNorm,
    attn: Attention,
    ls1: LayerScale,
    norm2: LayerNorm,
    mlp: Mlp,
    ls2: LayerScale,
}

impl Block {
    fn new(vb: VarBuilder, dim: usize, num_heads: usize) -> Result<Self> {
        let norm1 = layer_norm(dim, LAYER_NORM_EPS, vb.pp("norm1"))?;
        let attn = Attention::new(vb.pp("attn"), dim, num_heads)?;
        let ls1 = LayerScale::new(vb.pp("ls1"), dim)?;
        let norm2 = layer_norm(dim, LAYER_NORM_EPS, vb.pp("norm2"))?;
        let mlp = Mlp::new(vb.pp("mlp"), dim, dim * 4)?;
        let ls2 = LayerScale::new(vb.pp("ls2"), dim)?;

        Ok(Self {
            norm1,
            attn,
            ls1,
            norm2,
            mlp,
            ls2,
        })
    }
}

impl Module for Block {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let residual = xs;
        let xs = self
            .ls1
            .forward(&self.attn.forward(&self.norm1.forward(xs)?)?)?;
        let xs = (xs + residual)?;

        let residual = &xs;
        let xs = self
            .ls2
            .forward(&self.mlp.forward(&self.norm2.forward(&xs)?)?)?;

        xs + residual
    }
}

#[derive(Debug, Clone)]
struct PatchEmbed {
    proj: Conv2d,
    patch_size: usize,
}

impl PatchEmbed {
    fn new(vb: VarBuilder, patch_size: usize, in_chans: usize, embed_dim: usize) -> Result<Self> {
        let config = Conv2dConfig {
            stride: patch_size,
            ..Default::default()
        };

        let proj = candle_nn::conv2d(in_chans, embed_dim, patch_size, config, vb.pp("proj"))?;

        Ok(Self { proj, patch_size })
    }
}

impl Module for PatchEmbed {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (_b, _c, h, w) = xs.dims4()?;

        if h % self.patch_size != 0 || w % self.patch_size != 0 {
            candle_core::bail!(
                "Input size ({h}, {w}) must be a multiple of the patch size {}.",
                self.patch_size
            );
        }

        let xs = self.proj.forward(xs)?;
        let (b, c, h, w) = xs.dims4()?;

        // (b, c, h, w) -> (b, h * w, c)
        xs.reshape((b, c, h * w))?.transpose(1, 2)
    }
}

/// A DINOv2 vision transformer returning the normalized class token
///
/// Positional embeddings are stored for `img_size` inputs and resampled to
/// the patch grid of each input.
#[derive(Debug, Clone)]
pub struct DinoVisionTransformer {
    patch_embed: PatchEmbed,
    cls_token: Tensor,
    pos_embed: Tensor,
    blocks: Vec<Block>,
    norm: LayerNorm,
    embed_dim: usize,
}

impl DinoVisionTransformer {
    /// Build the transformer from pretrained weights
    ///
    /// # Arguments
    ///
    /// * `vb` - Variables named as in the pretrained checkpoint
    /// * `depth` - Number of transformer blocks
    /// * `embed_dim` - Token embedding dimension
    /// * `num_heads` - Attention heads per block
    /// * `patch_size` - Edge length of a square patch
    /// * `img_size` - Input size the positional embeddings were trained for
    pub fn new(
        vb: VarBuilder,
        depth: usize,
        embed_dim: usize,
        num_heads: usize,
        patch_size: usize,
        img_size: usize,
    ) -> Result<Self> {
        let patch_embed = PatchEmbed::new(vb.pp("patch_embed"), patch_size, 3, embed_dim)?;
        let cls_token = vb.get((1, 1, embed_dim), "cls_token")?;

        let num_patches = (img_size / patch_size) * (img_size / patch_size);
        let pos_embed = vb.get((1, 1 + num_patches, embed_dim), "pos_embed")?;

        let vb_b = vb.pp("blocks");
        let blocks = (0..depth)
            .map(|i| Block::new(vb_b.pp(i.to_string()), embed_dim, num_heads))
            .collect::<Result<Vec<_>>>()?;

        let norm = layer_norm(embed_dim, LAYER_NORM_EPS, vb.pp("norm"))?;

        Ok(Self {
            patch_embed,
            cls_token,
            pos_embed,
            blocks,
            norm,
            embed_dim,
        })
    }

    /// Dimension of the returned embedding
    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    fn interpolate_pos_encoding(&self, xs: &Tensor, w: usize, h: usize) -> Result<Tensor> {
        let npatch = xs.dim(1)? - 1;
        let n = self.pos_embed.dim(1)? - 1;
        let sqrt_n = (n as f64).sqrt() as usize;

        if npatch == n && w == h {
            return Ok(self.pos_embed.clone());
        }

        let patch_size = self.patch_embed.patch_size;
        let class_pos_embed = self.pos_embed.i((.., ..1))?;
        let patch_pos_embed = self.pos_embed.i((.., 1..))?;
        let dim = xs.dim(D::Minus1)?;

        let (w0, h0) = (w / patch_size, h / patch_size);

        // Nearest-neighbour resampling of the stored (sqrt_n, sqrt_n) grid
        let patch_pos_embed = patch_pos_embed
            .reshape((1, sqrt_n, sqrt_n, dim))?
            .transpose(2, 3)?
            .transpose(1, 2)?
            .upsample_nearest2d(h0, w0)?;

        let el_count = patch_pos_embed.shape().elem_count();
        let patch_pos_embed =
            patch_pos_embed
                .transpose(1, 2)?
                .transpose(2, 3)?
                .reshape((1, el_count / dim, dim))?;

        Tensor::cat(&[&class_pos_embed, &patch_pos_embed], 1)
    }

    fn prepare_tokens(&self, xs: &Tensor) -> Result<Tensor> {
        let (b, _nc, h, w) = xs.dims4()?;

        let xs = self.patch_embed.forward(xs)?;
        let cls_token = self.cls_token.broadcast_as((b, 1, self.embed_dim))?;
        let xs = Tensor::cat(&[&cls_token.contiguous()?, &xs], 1)?;

        xs.broadcast_add(&self.interpolate_pos_encoding(&xs, w, h)?)
    }
}

impl Module for DinoVisionTransformer {
    /// Embed a `(batch, 3, height, width)` tensor into `(batch, embed_dim)`
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = self.prepare_tokens(xs)?;

        for block in self.blocks.iter() {
            xs = block.forward(&xs)?;
        }

        self.norm.forward(&xs)?.i((.., 0))
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn tiny_vit(img_size: usize) -> (VarMap, DinoVisionTransformer) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = DinoVisionTransformer::new(vb, 2, 8, 2, 14, img_size).unwrap();

        (varmap, model)
    }

    #[test]
    fn test_forward_shape() {
        let (_, model) = tiny_vit(28);
        let xs = Tensor::zeros((3, 3, 28, 28), DType::F32, &Device::Cpu).unwrap();

        assert_eq!(model.forward(&xs).unwrap().dims(), &[3, 8]);
    }

    #[test]
    fn test_forward_interpolates_positions() {
        let (_, model) = tiny_vit(56);
        let xs = Tensor::zeros((1, 3, 28, 28), DType::F32, &Device::Cpu).unwrap();

        assert_eq!(model.forward(&xs).unwrap().dims(), &[1, 8]);
    }

    #[test]
    fn test_variable_names() {
        let (varmap, _) = tiny_vit(28);
        let data = varmap.data().lock().unwrap();

        for name in [
            "cls_token",
            "pos_embed",
            "patch_embed.proj.weight",
            "blocks.0.attn.qkv.weight",
            "blocks.1.ls2.gamma",
            "blocks.1.mlp.fc2.bias",
            "norm.weight",
        ] {
            assert!(data.contains_key(name), "missing {}", name);
        }
    }

    #[test]
    fn test_rejects_unaligned_input() {
        let (_, model) = tiny_vit(28);
        let xs = Tensor::zeros((1, 3, 30, 28), DType::F32, &Device::Cpu).unwrap();

        assert!(model.forward(&xs).is_err());
    }
}
