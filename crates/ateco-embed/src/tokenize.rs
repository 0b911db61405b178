use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-RoBERTa pad token id.
const PAD_ID: u32 = 1;

/// Tokenize a batch of texts into `[B, max_len]` id and attention-mask
/// tensors, truncating and right-padding every row to `max_len`.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let batch = texts.len();
    let mut all_ids = Vec::with_capacity(batch * max_len);
    let mut all_mask = Vec::with_capacity(batch * max_len);
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        if ids.len() > max_len {
            ids.truncate(max_len);
            mask.truncate(max_len);
        }
        if ids.len() < max_len {
            let pad = max_len - ids.len();
            ids.extend(std::iter::repeat(PAD_ID).take(pad));
            mask.extend(std::iter::repeat(0).take(pad));
        }
        all_ids.extend(ids);
        all_mask.extend(mask);
    }
    let input_ids = Tensor::from_iter(all_ids, device)?.reshape((batch, max_len))?;
    let attention_mask = Tensor::from_iter(all_mask, device)?.reshape((batch, max_len))?;
    Ok((input_ids, attention_mask))
}
