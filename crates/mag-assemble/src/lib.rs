mod assemble;
mod embed;
mod options;
mod types;

pub use assemble::{assemble, assemble_async, save_pdf};
pub use options::*;
pub use types::*;
