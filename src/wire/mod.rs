//! Wire-level encoding: scalar codecs, alignment, protocol strings.

pub mod primitives;
pub mod string;

pub use primitives::{align4, is_aligned, HEADER_SIZE, WORD_SIZE};
pub use string::WlString;
