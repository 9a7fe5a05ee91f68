#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod classification;
pub mod clustering;
pub mod concepts;
pub mod config;
pub mod evaluation;
pub mod normalize;
pub mod observability;
pub mod schema;
pub mod sentiment;
pub mod util;
