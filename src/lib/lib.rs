//!
//! pixl  -- Pixels on demand
//!

             extern crate glob;
             extern crate image;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
#[macro_use] extern crate maplit;
             extern crate mime;
             extern crate reqwest;
             extern crate rusttype;
             extern crate serde;
#[macro_use] extern crate serde_derive;
             extern crate serde_json;
             extern crate tempfile;
             extern crate thiserror;
             extern crate url;
             extern crate uuid;
             extern crate which;


#[cfg(test)]              extern crate serde_qs;
#[cfg(test)] #[macro_use] extern crate spectral;


pub mod blob;
mod context;
mod error;
pub mod meme;
mod model;
mod processor;
mod resources;
pub mod transform;


pub use crate::context::Context;
pub use crate::error::{Error, ErrorKind, Stage};
pub use crate::model::*;
pub use crate::processor::{Builder as ProcessorBuilder,
                           BuildError as ProcessorBuildError,
                           Processor};
pub use crate::resources::*;
