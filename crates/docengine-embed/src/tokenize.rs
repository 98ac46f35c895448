use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use docengine_core::error::Result;

use crate::provider_err;

/// XLM-RoBERTa `<pad>` token id.
pub const PAD_ID: u32 = 1;

/// Tokenize `texts` into `[B, max_len]` id and attention-mask tensors,
/// truncating long inputs and right-padding short ones.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let mut ids = Vec::with_capacity(texts.len() * max_len);
    let mut mask = Vec::with_capacity(texts.len() * max_len);
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| provider_err(format!("Tokenization failed: {}", e)))?;
        let n = enc.get_ids().len().min(max_len);
        ids.extend_from_slice(&enc.get_ids()[..n]);
        mask.extend_from_slice(&enc.get_attention_mask()[..n]);
        ids.extend(std::iter::repeat(PAD_ID).take(max_len - n));
        mask.extend(std::iter::repeat(0u32).take(max_len - n));
    }
    let input_ids = Tensor::from_vec(ids, (texts.len(), max_len), device).map_err(provider_err)?;
    let attention_mask = Tensor::from_vec(mask, (texts.len(), max_len), device).map_err(provider_err)?;
    Ok((input_ids, attention_mask))
}
