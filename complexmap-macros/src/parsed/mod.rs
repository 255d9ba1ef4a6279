#[allow(unused_imports)]
use super::*;

mod classify;
mod field;
mod shape;

pub(crate) use shape::ParsedShape;
