use rig::embeddings::Embedding;

/// Conversion from `rig` embeddings to the `f32` vectors the store keeps
pub trait EmbeddingConversion {
    fn to_vec(&self) -> Vec<f32>;
}

impl EmbeddingConversion for Embedding {
    fn to_vec(&self) -> Vec<f32> {
        self.vec.iter().map(|f| *f as f32).collect()
    }
}

/// Encode a vector as little-endian `f32` bytes, the layout of an `F32_BLOB`
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}
