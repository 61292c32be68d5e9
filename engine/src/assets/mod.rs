//! Asset loading
//!
//! The [`ResourceCache`] owns every shader program, texture and shared
//! geometry buffer set by identifier. Image files are decoded through the
//! [`ImageDecoder`] collaborator.

pub mod cache;
pub mod image;

pub use cache::{GeometryBuffers, ResourceCache};
pub use self::image::{DecodedImage, ImageDecoder, ImageFileDecoder};
