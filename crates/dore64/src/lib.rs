//! Commodore 64 emulator.
//!
//! A cycle-synchronized cooperative simulation of the 6510 CPU, two 6526
//! CIAs and the 6569 VIC-II over a 64 KiB banked address space. The CPU
//! advances a monotonic cycle counter one instruction at a time; the CIAs
//! count down against the accrued delta and the VIC renders a scanline
//! whenever the counter passes its deadline. One frame is 312 lines at 63
//! cycles (23 on bad lines), ~50 Hz PAL.
//!
//! The SID is not emulated: its register page reads and writes as plain
//! RAM.

mod bus;
mod c64;
pub mod capture;
mod cia;
mod config;
pub mod input;
mod keyboard;
pub mod keyboard_map;
pub mod loader;
mod memory;
mod palette;
pub mod vic;

pub use bus::C64Bus;
pub use c64::{Callback, C64, RunError};
pub use cia::Cia;
pub use config::{find_roms_dir, C64Config};
pub use input::{C64Key, InputQueue};
pub use keyboard::KeyboardMatrix;
pub use loader::Loader;
pub use memory::{BankKind, Memory};
pub use palette::PALETTE;
pub use vic::{GraphicMode, Vic};
