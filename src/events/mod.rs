//! # Events Module
//!
//! Event-driven progress reporting for the similarity pipeline.
//!
//! ## Design
//! The core library emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe and display progress.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! // In a separate thread, listen for events
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Extract(ExtractEvent::Progress(p)) => {
//!                 println!("Embedded {}/{}", p.completed, p.total)
//!             }
//!             Event::Compare(CompareEvent::Progress(p)) => {
//!                 println!("Compared {} pairs", p.comparisons_completed)
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! // Run the checker with the sender
//! checker.find_similar_images_with_events(&images, threshold, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
