pub mod emit;
pub mod mapping;
pub mod median;
pub mod normalize;
pub mod pipeline;
pub mod rebin;
