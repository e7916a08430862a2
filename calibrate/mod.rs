#![deny(dead_code)]
#![deny(unused_imports)]

pub mod model;
pub mod survival;
// No global constants here; every coefficient set is carried by a `ModelConstants` value.
