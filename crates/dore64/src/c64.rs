//! Top-level C64 machine.
//!
//! The CPU is the clock: it advances its cycle counter by each
//! instruction's nominal cost, and every other chip works off that
//! counter. One `step()` is one orchestrator iteration, in fixed order:
//!
//! 1. CIA1 timers (delta since the previous iteration) -> IRQ
//! 2. CIA2 timers -> NMI
//! 3. CPU: one instruction
//! 4. VIC: render any scanline whose deadline has passed -> IRQ
//! 5. Timed keyboard injection
//! 6. Optional callback (the program loader hooks in here)
//!
//! The CIAs observe the cycle count from before the CPU ran, so a timer
//! underflow is serviced at the next instruction boundary, never
//! mid-instruction.

use std::error::Error;
use std::fmt;

use mos_6510::{Bus, IllegalOpcode, Mos6510};

use crate::bus::C64Bus;
use crate::config::C64Config;
use crate::input::{C64Key, InputQueue};
use crate::loader;
use crate::memory::{Memory, BASE_ADDR_BASIC, BASE_ADDR_CHARS, BASE_ADDR_KERNAL};
use crate::vic::UnsupportedMode;

/// Terminal emulation failure: the run loop stops on the first of these.
#[derive(Debug)]
pub enum RunError {
    /// The CPU fetched an opcode outside the documented set.
    IllegalOpcode(IllegalOpcode),
    /// A visible scanline needed a graphic mode the VIC does not render.
    UnsupportedMode(UnsupportedMode),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalOpcode(e) => e.fmt(f),
            Self::UnsupportedMode(e) => e.fmt(f),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IllegalOpcode(e) => Some(e),
            Self::UnsupportedMode(e) => Some(e),
        }
    }
}

impl From<IllegalOpcode> for RunError {
    fn from(e: IllegalOpcode) -> Self {
        Self::IllegalOpcode(e)
    }
}

impl From<UnsupportedMode> for RunError {
    fn from(e: UnsupportedMode) -> Self {
        Self::UnsupportedMode(e)
    }
}

/// Per-iteration callback: return false to be removed.
pub type Callback = Box<dyn FnMut(&mut C64) -> bool>;

/// The C64 machine.
pub struct C64 {
    cpu: Mos6510,
    bus: C64Bus,
    input_queue: InputQueue,
    callback: Option<Callback>,
}

impl C64 {
    /// Build a machine, loading the three ROM images named by the config.
    /// A missing ROM is non-fatal: the overlay plane stays zero-filled
    /// and a warning goes to stderr.
    #[must_use]
    pub fn new(config: &C64Config) -> Self {
        let mut memory = Memory::new();
        let images = [
            (&config.basic_rom, BASE_ADDR_BASIC, "BASIC"),
            (&config.char_rom, BASE_ADDR_CHARS, "character"),
            (&config.kernal_rom, BASE_ADDR_KERNAL, "Kernal"),
        ];
        for (path, base, name) in images {
            if let Err(e) = memory.load_rom(path, base) {
                eprintln!("warning: {name} ROM {} not loaded: {e}", path.display());
            }
        }
        Self::with_memory(memory)
    }

    /// Build a machine around prepared memory (ROM images already in the
    /// overlay plane). Used by tests with fabricated ROMs.
    #[must_use]
    pub fn with_memory(memory: Memory) -> Self {
        let mut bus = C64Bus::new(memory);
        let mut cpu = Mos6510::new();
        cpu.reset(&mut bus);
        Self {
            cpu,
            bus,
            input_queue: InputQueue::new(),
            callback: None,
        }
    }

    /// Run one orchestrator iteration.
    ///
    /// # Errors
    ///
    /// Terminal: an illegal opcode or an unrenderable graphic mode.
    pub fn step(&mut self) -> Result<(), RunError> {
        // CIAs consume the cycle delta accrued by the previous iteration
        let cycles = self.cpu.cycles();
        if self.bus.cia1.tick(cycles) {
            self.cpu.irq(&mut self.bus);
        }
        if self.bus.cia2.tick(cycles) {
            self.cpu.nmi(&mut self.bus);
        }

        self.cpu.step(&mut self.bus)?;

        let vic_base = self.bus.cia2.vic_base_address();
        let raise_irq = self
            .bus
            .vic
            .tick(&self.bus.memory, vic_base, self.cpu.cycles())?;
        if raise_irq {
            self.cpu.irq(&mut self.bus);
        }

        self.input_queue
            .process(self.cpu.cycles(), &mut self.bus.keyboard);

        if let Some(mut cb) = self.callback.take() {
            if cb(self) {
                self.callback = Some(cb);
            }
        }

        Ok(())
    }

    /// Step until the VIC completes a frame. Returns the CPU cycles the
    /// frame consumed.
    ///
    /// # Errors
    ///
    /// Propagates the terminal errors of [`C64::step`].
    pub fn run_frame(&mut self) -> Result<u64, RunError> {
        let start = self.cpu.cycles();
        loop {
            self.step()?;
            if self.bus.vic.take_frame_complete() {
                break;
            }
        }
        Ok(self.cpu.cycles() - start)
    }

    /// Install the per-iteration callback (replacing any previous one).
    pub fn set_callback(&mut self, callback: Callback) {
        self.callback = Some(callback);
    }

    /// Attach a program loader as the machine callback.
    pub fn attach_loader(&mut self, mut loader: loader::Loader) {
        self.set_callback(Box::new(move |c64| loader.poll(c64)));
    }

    // Keyboard ----------------------------------------------------------

    /// Press a key now (host keyboard path).
    pub fn press_key(&mut self, key: C64Key) {
        let (row, col) = key.matrix();
        self.bus.keyboard.set_key(row, col, true);
    }

    /// Release a key.
    pub fn release_key(&mut self, key: C64Key) {
        let (row, col) = key.matrix();
        self.bus.keyboard.set_key(row, col, false);
    }

    /// Release every key.
    pub fn release_all_keys(&mut self) {
        self.bus.keyboard.release_all();
    }

    /// Queue one character through the timed injection queue.
    pub fn type_character(&mut self, ch: char) {
        self.input_queue.type_character(ch);
    }

    /// Queue a string through the timed injection queue.
    pub fn type_text(&mut self, text: &str) {
        self.input_queue.type_text(text);
    }

    // Observation ---------------------------------------------------------

    #[must_use]
    pub fn cpu(&self) -> &Mos6510 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6510 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &C64Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut C64Bus {
        &mut self.bus
    }

    #[must_use]
    pub fn input_queue(&self) -> &InputQueue {
        &self.input_queue
    }

    /// CPU cycle counter.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Completed frames.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.bus.vic.frames()
    }

    /// The VIC framebuffer (ARGB32).
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.vic.framebuffer()
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        self.bus.vic.framebuffer_width()
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        self.bus.vic.framebuffer_height()
    }

    /// Read memory as the CPU currently sees it.
    pub fn peek(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::memory::{BASE_ADDR_KERNAL, MEM_SIZE};

    /// Machine with fabricated ROMs.
    ///
    /// Kernal layout ($E000-$FFFF):
    ///   $E000    main loop: JMP $E000
    ///   $F000    IRQ handler: INC $0340; ASL $D019 (ack); RTI
    pub(crate) fn make_c64() -> C64 {
        let mut kernal = vec![0xEA; 8192];
        kernal[0] = 0x4C; // JMP $E000
        kernal[1] = 0x00;
        kernal[2] = 0xE0;
        // IRQ handler at $F000 (offset $1000)
        let handler: &[u8] = &[
            0xEE, 0x40, 0x03, // INC $0340
            0x0E, 0x19, 0xD0, // ASL $D019 (first write acknowledges)
            0x40, // RTI
        ];
        kernal[0x1000..0x1000 + handler.len()].copy_from_slice(handler);
        // Vectors (offsets $1FFA-$1FFF): NMI -> $F000, reset -> $E000,
        // IRQ -> $F000
        kernal[0x1FFA] = 0x00;
        kernal[0x1FFB] = 0xF0;
        kernal[0x1FFC] = 0x00;
        kernal[0x1FFD] = 0xE0;
        kernal[0x1FFE] = 0x00;
        kernal[0x1FFF] = 0xF0;

        let mut memory = Memory::new();
        memory.load_rom_bytes(BASE_ADDR_KERNAL, &kernal);
        memory.load_rom_bytes(crate::memory::BASE_ADDR_BASIC, &[0x94; 8192]);
        memory.load_rom_bytes(crate::memory::BASE_ADDR_CHARS, &[0xCC; 4096]);
        C64::with_memory(memory)
    }

    #[test]
    fn reset_vectors_into_the_kernal() {
        let c64 = make_c64();
        assert_eq!(c64.cpu().regs.pc, 0xE000);
        assert_eq!(c64.cycles(), 6);
    }

    #[test]
    fn memory_size_is_sixty_four_k() {
        assert_eq!(MEM_SIZE, 0x10000);
    }

    #[test]
    fn step_advances_cycles_monotonically() {
        let mut c64 = make_c64();
        let mut prev = c64.cycles();
        for _ in 0..100 {
            c64.step().unwrap();
            assert!(c64.cycles() > prev);
            prev = c64.cycles();
        }
    }

    #[test]
    fn frame_cycle_budget_is_bounded() {
        let mut c64 = make_c64();
        let cycles = c64.run_frame().unwrap();
        // 312 lines of 63 cycles, minus what bad lines save, plus at most
        // one instruction of overshoot per line.
        let max = 312 * 63 + 312 * 7;
        let min = 312 * 23;
        assert!(
            (min..=max).contains(&cycles),
            "frame took {cycles} cycles"
        );
    }

    #[test]
    fn callback_runs_until_it_returns_false() {
        let mut c64 = make_c64();
        use std::cell::Cell;
        use std::rc::Rc;
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        c64.set_callback(Box::new(move |_| {
            seen.set(seen.get() + 1);
            seen.get() < 3
        }));
        for _ in 0..10 {
            c64.step().unwrap();
        }
        assert_eq!(count.get(), 3);
    }
}
