//! # similar-images CLI
//!
//! Command-line interface for the similar image checker.
//!
//! ## Usage
//! ```bash
//! similar-images compare ~/Photos --model mobilenet.onnx --threshold 0.95
//! similar-images score a.jpg b.jpg --model mobilenet.onnx
//! ```

mod cli;

use similar_image_checker::Result;

fn main() -> Result<()> {
    cli::run()
}
