pub mod distance;
pub mod flat;
pub mod pairwise;

pub use flat::FlatIndex;
pub use pairwise::{most_similar_pair, similarity_matrix, PairScore};
