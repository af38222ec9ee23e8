//! Program loaders: PRG binaries and plain-text BASIC listings.
//!
//! Both wait for the KERNAL to finish booting before touching the
//! machine: the loader runs as the machine's per-iteration callback and
//! watches for the BASIC idle loop. A PRG is then written straight into
//! RAM (with the BASIC program pointers patched and `RUN` typed when it
//! loads at the BASIC start); a listing is typed through the keyboard
//! queue character by character.

use std::fs;
use std::io;
use std::path::Path;

use crate::c64::C64;

/// PC value of the BASIC idle loop: once the CPU reaches it, the KERNAL
/// has booted and keyboard input is being serviced.
const BASIC_READY_PC: u16 = 0xA65C;

/// Load address of a tokenized BASIC program.
const BASIC_PRG_START: u16 = 0x0801;

/// BASIC zero-page pointers: start of program text, and the three
/// end-of-text/variable pointers that must agree after a load.
const BASIC_TXT_TAB: u16 = 0x002B;
const BASIC_VAR_TAB: u16 = 0x002D;
const BASIC_ARY_TAB: u16 = 0x002F;
const BASIC_STR_END: u16 = 0x0031;

/// Write a PRG image (2-byte little-endian load address + payload) into
/// RAM, bypassing I/O. Returns the load address.
///
/// A program loading at the BASIC start gets its pointers patched and
/// `RUN` typed; anything else jumps the CPU to the load address.
///
/// # Errors
///
/// Fails when the image is too short to contain a load address and at
/// least one byte of payload.
pub fn load_prg(c64: &mut C64, data: &[u8]) -> Result<u16, String> {
    if data.len() < 3 {
        return Err("PRG image too short (need load address + payload)".to_string());
    }

    let load_addr = u16::from(data[0]) | (u16::from(data[1]) << 8);
    let payload = &data[2..];
    c64.bus_mut().memory.load_ram_bytes(load_addr, payload);
    let end = load_addr.wrapping_add(payload.len() as u16);

    if load_addr == BASIC_PRG_START {
        let memory = &mut c64.bus_mut().memory;
        memory.write_word_no_io(BASIC_TXT_TAB, BASIC_PRG_START);
        memory.write_word_no_io(BASIC_VAR_TAB, end);
        memory.write_word_no_io(BASIC_ARY_TAB, end);
        memory.write_word_no_io(BASIC_STR_END, end);
        c64.type_text("RUN\n");
    } else {
        c64.cpu_mut().regs.pc = load_addr;
    }

    Ok(load_addr)
}

/// Program format, decided by the constructor used.
enum Format {
    Basic,
    Prg,
}

/// Deferred program loader, driven by the machine callback.
pub struct Loader {
    format: Format,
    data: Vec<u8>,
    booted: bool,
}

impl Loader {
    /// Loader for a plain-text BASIC listing.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read.
    pub fn bas(path: &Path) -> io::Result<Self> {
        Ok(Self {
            format: Format::Basic,
            data: fs::read(path)?,
            booted: false,
        })
    }

    /// Loader for a PRG binary.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read.
    pub fn prg(path: &Path) -> io::Result<Self> {
        Ok(Self {
            format: Format::Prg,
            data: fs::read(path)?,
            booted: false,
        })
    }

    /// Per-iteration callback body. Returns false once the program has
    /// been injected, which removes the callback.
    pub fn poll(&mut self, c64: &mut C64) -> bool {
        if !self.booted {
            if c64.cpu().regs.pc == BASIC_READY_PC {
                self.booted = true;
            }
            return true;
        }

        match self.format {
            Format::Basic => {
                for &byte in &self.data {
                    c64.type_character(char::from(byte));
                }
            }
            Format::Prg => {
                if let Err(e) = load_prg(c64, &self.data) {
                    eprintln!("PRG load failed: {e}");
                }
            }
        }
        false
    }
}
