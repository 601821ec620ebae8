#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod centering;
pub mod config;
pub mod debias;
pub mod fista;
pub mod fit;
pub mod lipschitz;
pub mod path;
pub mod prox;

// Tabular input and the serialized model artifact live outside the numeric core.
#[path = "../model/mod.rs"]
pub mod model;
