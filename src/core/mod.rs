//! Core filter building blocks: parameter validation, rebinning, the normalization
//! pre-pass, the sliding histogram median engine and the frame emitter, tied
//! together by the processing pipeline. These are internal primitives consumed
//! by the high-level `api` module.
pub mod params;
pub mod processing;
