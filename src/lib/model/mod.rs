//! Module defining the data model of image operations.

mod caption;
pub mod constants;
mod operation;

#[cfg(test)]
mod tests;

pub use self::caption::{Caption, VAlign};
pub use self::operation::{ArgsSource, Call, Operation, UnknownOperation,
                          ArgumentError,
                          BlurArgs, ConvertArgs, MemeArgs, ResizeArgs, RotateArgs};
