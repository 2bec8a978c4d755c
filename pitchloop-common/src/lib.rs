#[macro_use]
extern crate log;

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod gui_channel;
pub mod midi;
pub mod music;

pub fn clamp<T: PartialOrd + Copy>(v: T, min: T, max: T) -> T {
    assert!(min <= max);
    let mut x = v;
    if x < min {
        x = min;
    }
    if x > max {
        x = max;
    }
    x
}
