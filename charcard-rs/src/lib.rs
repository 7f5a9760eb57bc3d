#![doc = include_str!("../README.md")]

pub mod card;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod image_loading;
pub mod interaction;
pub mod model;
pub mod retry;
pub mod sampler;
pub mod transform;
pub mod upload;

#[macro_use]
extern crate lazy_static;

pub use card::{Card, CharacterInfo};
pub use charcard_canvas2d;
pub use config::CardConfig;
pub use error::{CardError, CardResult};
pub use model::{BackgroundChoice, Element, PortraitSource, TransformState};
