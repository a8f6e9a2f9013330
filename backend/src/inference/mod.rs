pub mod classifier;
pub mod decoder;
pub mod envelope;
pub mod normalizer;
pub mod pipeline;

#[cfg(test)]
pub mod testing;
