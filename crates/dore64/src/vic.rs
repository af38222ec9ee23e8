//! VIC-II 6569 (PAL) raster engine.
//!
//! The VIC runs off the CPU cycle counter: it holds an absolute cycle
//! deadline (`next_raster_at`) and does nothing until the CPU passes it.
//! When the deadline arrives it renders one complete scanline into the
//! framebuffer, advances the deadline by 63 cycles (23 on a bad line —
//! the DMA stall is approximated by the shortened budget rather than by
//! stealing CPU cycles), and steps the 9-bit raster counter. Line 312
//! wraps the counter, completes the frame and bumps the frame counter.
//!
//! Character, multicolour character, bitmap and multicolour bitmap modes
//! are rendered; extended-background and the illegal combinations are a
//! terminal error when a visible line would need them. Raster interrupts
//! are level-triggered: an unacknowledged interrupt re-raises on every
//! tick until a write to $D019 clears its status bit.

use std::error::Error;
use std::fmt;

use crate::memory::{self, Memory};
use crate::palette::PALETTE;

/// Total raster lines per PAL frame.
pub const SCREEN_LINES: u16 = 312;

/// Visible area rendered into the framebuffer, borders included.
pub const VISIBLE_SCREEN_WIDTH: usize = 403;
pub const VISIBLE_SCREEN_HEIGHT: usize = 284;

/// First and last (exclusive) raster lines that reach the framebuffer.
const FIRST_VISIBLE_LINE: u16 = 14;
const LAST_VISIBLE_LINE: u16 = 298;

/// CPU cycles per raster line, and the shortened bad-line budget.
const LINE_CYCLES: u64 = 63;
const BAD_LINE_CYCLES: u64 = 23;

/// Graphics window: 320x200 pixels, 40 columns of 8.
const G_RES_X: i32 = 320;
const G_RES_Y: i32 = 200;
const G_COLS: i32 = 40;
const G_FIRST_LINE: u16 = 56;
const G_LAST_LINE: u16 = 256;
const G_FIRST_COL: i32 = 42;

/// Sprites: 24x21 pixels, 64-byte blocks, pointer table at the end of the
/// screen matrix.
const SPRITE_PTRS_OFFSET: u16 = 0x3F8;
const SPRITE_HEIGHT: i32 = 21;
const SPRITE_SIZE: u16 = 64;
const SPRITES_FIRST_LINE: i32 = 6;
const SPRITES_FIRST_COL: i32 = 18;

/// Graphic mode, decoded from ECM (CR1.6), BMM (CR1.5) and MCM (CR2.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicMode {
    Char,
    MulticolorChar,
    Bitmap,
    MulticolorBitmap,
    ExtendedBackground,
    Illegal,
}

/// Terminal error: a visible scanline needed a mode the engine does not
/// render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedMode(pub GraphicMode);

impl fmt::Display for UnsupportedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported graphic mode: {:?}", self.0)
    }
}

impl Error for UnsupportedMode {}

/// VIC-II 6569 PAL chip.
pub struct Vic {
    // Sprites
    mx: [u8; 8],
    my: [u8; 8],
    msbx: u8,
    sprite_enabled: u8,
    sprite_priority: u8,
    sprite_multicolor: u8,
    sprite_double_width: u8,
    sprite_double_height: u8,
    sprite_shared_colors: [u8; 2],
    sprite_colors: [u8; 8],

    // Border and background colours
    border_color: u8,
    bg_color: [u8; 4],

    // Control registers
    cr1: u8,
    cr2: u8,

    // Raster counter (low byte; bit 8 lives in CR1 bit 7) and IRQ compare
    raster_c: u8,
    raster_irq: u16,

    // Interrupt status ($D019) and enable ($D01A)
    irq_status: u8,
    irq_enabled: u8,

    // Addresses derived from the memory-pointers register
    screen_mem: u16,
    char_mem: u16,
    bitmap_mem: u16,
    mem_pointers: u8,

    graphic_mode: GraphicMode,

    /// Absolute CPU cycle at which the next scanline is due.
    next_raster_at: u64,

    frame_count: u64,
    frame_complete: bool,

    /// ARGB32 framebuffer, `VISIBLE_SCREEN_WIDTH` x `VISIBLE_SCREEN_HEIGHT`.
    frame: Vec<u32>,
}

impl Vic {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mx: [0; 8],
            my: [0; 8],
            msbx: 0,
            sprite_enabled: 0,
            sprite_priority: 0,
            sprite_multicolor: 0,
            sprite_double_width: 0,
            sprite_double_height: 0,
            sprite_shared_colors: [0; 2],
            sprite_colors: [0; 8],
            border_color: 0,
            bg_color: [0; 4],
            cr1: 0,
            cr2: 0,
            raster_c: 0,
            raster_irq: 0,
            irq_status: 0,
            irq_enabled: 0,
            screen_mem: memory::BASE_ADDR_SCREEN,
            char_mem: memory::BASE_ADDR_CHARS,
            bitmap_mem: memory::BASE_ADDR_BITMAP,
            mem_pointers: 1, // bit 0 is unconnected, reads as 1
            graphic_mode: GraphicMode::Char,
            next_raster_at: LINE_CYCLES,
            frame_count: 0,
            frame_complete: false,
            frame: vec![PALETTE[0]; VISIBLE_SCREEN_WIDTH * VISIBLE_SCREEN_HEIGHT],
        }
    }

    /// Advance the raster engine to the given CPU cycle count.
    ///
    /// Returns true when the CPU IRQ line should be raised: either a new
    /// raster interrupt or a still-unacknowledged one (level-triggered).
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedMode`] when a visible scanline falls in a mode
    /// the engine does not render; the machine treats this as terminal.
    pub fn tick(
        &mut self,
        mem: &Memory,
        vic_base: u16,
        cycles: u64,
    ) -> Result<bool, UnsupportedMode> {
        // Unacknowledged interrupts keep the line asserted.
        let mut raise_irq = self.irq_status & 0x0F != 0;

        if cycles >= self.next_raster_at {
            let mut rstr = self.raster_counter();

            if self.raster_irq_enabled() && rstr == self.raster_irq {
                self.irq_status |= 1 << 0; // raster interrupt origin
                raise_irq = true;
            }

            if (FIRST_VISIBLE_LINE..LAST_VISIBLE_LINE).contains(&rstr) {
                let y = i32::from(rstr - FIRST_VISIBLE_LINE);
                self.draw_rect(0, y, VISIBLE_SCREEN_WIDTH as i32, self.border_color);
                match self.graphic_mode {
                    GraphicMode::Char | GraphicMode::MulticolorChar => {
                        self.draw_raster_char_mode(mem, vic_base);
                    }
                    GraphicMode::Bitmap | GraphicMode::MulticolorBitmap => {
                        self.draw_raster_bitmap_mode(mem, vic_base);
                    }
                    mode => return Err(UnsupportedMode(mode)),
                }
                self.draw_raster_sprites(mem, vic_base);
            }

            self.next_raster_at += if self.is_bad_line() {
                BAD_LINE_CYCLES
            } else {
                LINE_CYCLES
            };

            rstr += 1;
            self.set_raster_counter(rstr);
            if rstr >= SCREEN_LINES {
                self.frame_complete = true;
                self.frame_count += 1;
                self.set_raster_counter(0);
            }
        }

        Ok(raise_irq)
    }

    // Register file ----------------------------------------------------

    /// Read a VIC register (offsets mirror through $D000-$D3FF).
    #[must_use]
    pub fn read_register(&self, r: u8) -> u8 {
        match r {
            // Sprite X coordinates (even offsets)
            0x00 | 0x02 | 0x04 | 0x06 | 0x08 | 0x0A | 0x0C | 0x0E => self.mx[usize::from(r >> 1)],
            // Sprite Y coordinates (odd offsets)
            0x01 | 0x03 | 0x05 | 0x07 | 0x09 | 0x0B | 0x0D | 0x0F => self.my[usize::from(r >> 1)],
            // X coordinate MSBs
            0x10 => self.msbx,
            // Control register 1 (bit 7 mirrors raster counter bit 8)
            0x11 => self.cr1,
            // Raster counter low byte
            0x12 => self.raster_c,
            0x15 => self.sprite_enabled,
            0x16 => self.cr2,
            0x17 => self.sprite_double_height,
            0x18 => self.mem_pointers,
            // Interrupt status: IRQ | - | - | - | ILP | IMMC | IMBC | IRST
            0x19 => {
                let mut v = self.irq_status & 0x0F;
                if v != 0 {
                    v |= 0x80;
                }
                v | 0x70 // unconnected bits read as set
            }
            // Interrupt enable: - | - | - | - | ELP | EMMC | EMBC | ERST
            0x1A => 0xF0 | self.irq_enabled,
            0x1B => self.sprite_priority,
            0x1C => self.sprite_multicolor,
            0x1D => self.sprite_double_width,
            0x20 => self.border_color,
            0x21..=0x24 => self.bg_color[usize::from(r - 0x21)],
            0x25 | 0x26 => self.sprite_shared_colors[usize::from(r - 0x25)],
            0x27..=0x2E => self.sprite_colors[usize::from(r - 0x27)],
            // Light pen, collisions and everything above $2E are unmapped
            _ => 0xFF,
        }
    }

    /// Write a VIC register.
    pub fn write_register(&mut self, r: u8, v: u8) {
        match r {
            0x00 | 0x02 | 0x04 | 0x06 | 0x08 | 0x0A | 0x0C | 0x0E => {
                self.mx[usize::from(r >> 1)] = v;
            }
            0x01 | 0x03 | 0x05 | 0x07 | 0x09 | 0x0B | 0x0D | 0x0F => {
                self.my[usize::from(r >> 1)] = v;
            }
            0x10 => self.msbx = v,
            // Control register 1: bit 7 is the raster compare MSB
            0x11 => {
                self.cr1 = v & 0x7F;
                self.raster_irq &= 0xFF;
                self.raster_irq |= u16::from(v & 0x80) << 1;
                self.set_graphic_mode();
            }
            // Raster compare low byte
            0x12 => {
                self.raster_irq = u16::from(v) | (self.raster_irq & 0x100);
            }
            0x15 => self.sprite_enabled = v,
            0x16 => {
                self.cr2 = v;
                self.set_graphic_mode();
            }
            0x17 => self.sprite_double_height = v,
            // Memory pointers: screen matrix from bits 4-7, character
            // generator from bits 1-3, bitmap from bit 3.
            0x18 => {
                self.char_mem = u16::from(v & 0x0E) << 10;
                self.screen_mem = u16::from(v & 0xF0) << 6;
                self.bitmap_mem = u16::from(v & 0x08) << 10;
                self.mem_pointers = v | 1;
            }
            // Acknowledge interrupts by mask
            0x19 => self.irq_status &= !(v & 0x0F),
            0x1A => self.irq_enabled = v,
            0x1B => self.sprite_priority = v,
            0x1C => self.sprite_multicolor = v,
            0x1D => self.sprite_double_width = v,
            0x20 => self.border_color = v,
            0x21..=0x24 => self.bg_color[usize::from(r - 0x21)] = v,
            0x25 | 0x26 => self.sprite_shared_colors[usize::from(r - 0x25)] = v,
            0x27..=0x2E => self.sprite_colors[usize::from(r - 0x27)] = v,
            // Unmapped registers ignore writes
            _ => {}
        }
    }

    fn set_graphic_mode(&mut self) {
        let ecm = self.cr1 & (1 << 6) != 0;
        let bmm = self.cr1 & (1 << 5) != 0;
        let mcm = self.cr2 & (1 << 4) != 0;

        self.graphic_mode = match (ecm, bmm, mcm) {
            (false, false, false) => GraphicMode::Char,
            (false, false, true) => GraphicMode::MulticolorChar,
            (false, true, false) => GraphicMode::Bitmap,
            (false, true, true) => GraphicMode::MulticolorBitmap,
            (true, false, false) => GraphicMode::ExtendedBackground,
            _ => GraphicMode::Illegal,
        };
    }

    // Raster state -----------------------------------------------------

    /// Full 9-bit raster counter: low byte plus CR1 bit 7.
    #[must_use]
    pub fn raster_counter(&self) -> u16 {
        u16::from(self.raster_c) | (u16::from(self.cr1 & 0x80) << 1)
    }

    fn set_raster_counter(&mut self, v: u16) {
        self.raster_c = (v & 0xFF) as u8;
        self.cr1 &= 0x7F;
        self.cr1 |= ((v >> 1) & 0x80) as u8;
    }

    /// Bad line: raster in [$30,$F7] with its low bits matching YSCROLL.
    fn is_bad_line(&self) -> bool {
        let rstr = self.raster_counter();
        (0x30..=0xF7).contains(&rstr) && (rstr & 0x7) == u16::from(self.vertical_scroll() & 0x7)
    }

    fn raster_irq_enabled(&self) -> bool {
        self.irq_enabled & 0x01 != 0
    }

    /// Screen blanked: CR1 bit 4 clear covers everything with border.
    fn is_screen_off(&self) -> bool {
        self.cr1 & (1 << 4) == 0
    }

    fn vertical_scroll(&self) -> u8 {
        self.cr1 & 0x7
    }

    fn horizontal_scroll(&self) -> i32 {
        i32::from(self.cr2 & 0x7)
    }

    // Sprite attribute helpers -----------------------------------------

    fn is_sprite_enabled(&self, n: usize) -> bool {
        self.sprite_enabled & (1 << n) != 0
    }

    fn is_double_width_sprite(&self, n: usize) -> bool {
        self.sprite_double_width & (1 << n) != 0
    }

    fn is_double_height_sprite(&self, n: usize) -> bool {
        self.sprite_double_height & (1 << n) != 0
    }

    fn is_multicolor_sprite(&self, n: usize) -> bool {
        self.sprite_multicolor & (1 << n) != 0
    }

    /// 9-bit sprite X coordinate.
    fn sprite_x(&self, n: usize) -> i32 {
        let mut x = i32::from(self.mx[n]);
        if self.msbx & (1 << n) != 0 {
            x |= 1 << 8;
        }
        x
    }

    // DMA fetch helpers ------------------------------------------------

    fn get_screen_char(&self, mem: &Memory, vic_base: u16, column: i32, row: i32) -> u8 {
        let addr = self
            .screen_mem
            .wrapping_add((row * G_COLS + column) as u16);
        mem.vic_read(vic_base, addr)
    }

    /// Colour RAM nibble for a screen cell. Colour RAM is plain RAM at
    /// $D800, read directly (no I/O routing).
    fn get_char_color(&self, mem: &Memory, column: i32, row: i32) -> u8 {
        let addr = memory::ADDR_COLOR_RAM.wrapping_add((row * G_COLS + column) as u16);
        mem.read_byte_no_io(addr) & 0x0F
    }

    fn get_char_data(&self, mem: &Memory, vic_base: u16, chr: u8, line: i32) -> u8 {
        let addr = self
            .char_mem
            .wrapping_add(u16::from(chr) * 8)
            .wrapping_add(line as u16);
        mem.vic_read(vic_base, addr)
    }

    fn get_bitmap_data(&self, mem: &Memory, vic_base: u16, column: i32, row: i32, line: i32) -> u8 {
        let addr = self
            .bitmap_mem
            .wrapping_add(((row * G_COLS + column) * 8 + line) as u16);
        mem.vic_read(vic_base, addr)
    }

    /// Sprite data base address: pointer table entry times 64.
    fn get_sprite_ptr(&self, mem: &Memory, vic_base: u16, n: usize) -> u16 {
        let ptr_addr = self.screen_mem + SPRITE_PTRS_OFFSET + n as u16;
        SPRITE_SIZE * u16::from(mem.vic_read(vic_base, ptr_addr))
    }

    // Framebuffer ------------------------------------------------------

    /// Plot one pixel by palette index. Out-of-range coordinates (sprites
    /// can overhang the visible area) are clipped.
    fn update_pixel(&mut self, x: i32, y: i32, color: u8) {
        if (0..VISIBLE_SCREEN_WIDTH as i32).contains(&x)
            && (0..VISIBLE_SCREEN_HEIGHT as i32).contains(&y)
        {
            self.frame[y as usize * VISIBLE_SCREEN_WIDTH + x as usize] =
                PALETTE[usize::from(color & 0x0F)];
        }
    }

    /// Fill `n` pixels of row `y` starting at `x`.
    fn draw_rect(&mut self, x: i32, y: i32, n: i32, color: u8) {
        for i in 0..n {
            self.update_pixel(x + i, y, color);
        }
    }

    // Scanline rendering -----------------------------------------------

    fn draw_raster_char_mode(&mut self, mem: &Memory, vic_base: u16) {
        let rstr = self.raster_counter();
        let y = i32::from(rstr) - i32::from(FIRST_VISIBLE_LINE);
        if !(G_FIRST_LINE..G_LAST_LINE).contains(&rstr) || self.is_screen_off() {
            return;
        }

        self.draw_rect(G_FIRST_COL, y, G_RES_X, self.bg_color[0]);
        for column in 0..G_COLS {
            // 38-column mode blanks the outermost cells
            if self.cr2 & (1 << 3) == 0 && (column == 0 || column == G_COLS - 1) {
                continue;
            }
            let x = G_FIRST_COL + column * 8;
            let line = i32::from(rstr - G_FIRST_LINE);
            let row = line / 8;
            let char_row = line % 8;
            let c = self.get_screen_char(mem, vic_base, column, row);
            let data = self.get_char_data(mem, vic_base, c, char_row);
            let color = self.get_char_color(mem, column, row);
            if self.graphic_mode == GraphicMode::MulticolorChar && color & (1 << 3) != 0 {
                self.draw_mcchar(x, y, data, color & 0x7);
            } else {
                self.draw_char(x, y, data, color);
            }
        }
    }

    fn draw_raster_bitmap_mode(&mut self, mem: &Memory, vic_base: u16) {
        let rstr = self.raster_counter();
        let y = i32::from(rstr) - i32::from(FIRST_VISIBLE_LINE);
        if !(G_FIRST_LINE..G_LAST_LINE).contains(&rstr) || self.is_screen_off() {
            return;
        }

        self.draw_rect(G_FIRST_COL, y, G_RES_X, self.bg_color[0]);
        for column in 0..G_COLS {
            let x = G_FIRST_COL + column * 8;
            let line = i32::from(rstr - G_FIRST_LINE);
            let row = line / 8;
            let bitmap_row = line % 8;
            let data = self.get_bitmap_data(mem, vic_base, column, row, bitmap_row);
            let scolor = self.get_screen_char(mem, vic_base, column, row);
            let rcolor = self.get_char_color(mem, column, row);
            if self.graphic_mode == GraphicMode::Bitmap {
                self.draw_bitmap(x, y, data, scolor);
            } else {
                self.draw_mcbitmap(x, y, data, scolor, rcolor);
            }
        }
    }

    /// One character row: set bits paint the colour-RAM colour, clear bits
    /// keep the background painted underneath.
    fn draw_char(&mut self, x: i32, y: i32, data: u8, color: u8) {
        for i in 0..8 {
            let xoffs = x + 8 - i + self.horizontal_scroll();
            // Horizontal scroll must not spill past the graphics area
            if xoffs > G_FIRST_COL + G_RES_X {
                continue;
            }
            if data & (1 << i) != 0 {
                self.update_pixel(xoffs, y, color);
            }
        }
    }

    /// Multicolour character row: four double-wide pixel pairs decoding
    /// to background 0-2 or the cell colour.
    fn draw_mcchar(&mut self, x: i32, y: i32, data: u8, color: u8) {
        for i in 0..4 {
            let cs = (data >> (i * 2)) & 0x3;
            let c = match cs {
                0 => self.bg_color[0],
                1 => self.bg_color[1],
                2 => self.bg_color[2],
                _ => color,
            };
            let xoffs = x + 8 - i * 2 + self.horizontal_scroll();
            self.update_pixel(xoffs, y, c);
            self.update_pixel(xoffs + 1, y, c);
        }
    }

    /// Hires bitmap row: screen byte high nibble = set pixels, low nibble
    /// = clear pixels.
    fn draw_bitmap(&mut self, x: i32, y: i32, data: u8, color: u8) {
        let forec = (color >> 4) & 0xF;
        let bgc = color & 0xF;
        for i in 0..8 {
            let xoffs = x + 8 - i + self.horizontal_scroll();
            if xoffs > G_FIRST_COL + G_RES_X {
                continue;
            }
            if data & (1 << i) != 0 {
                self.update_pixel(xoffs, y, forec);
            } else {
                self.update_pixel(xoffs, y, bgc);
            }
        }
    }

    /// Multicolour bitmap row: pairs decode to background 0, screen byte
    /// nibbles, or the colour-RAM nibble.
    fn draw_mcbitmap(&mut self, x: i32, y: i32, data: u8, scolor: u8, rcolor: u8) {
        for i in 0..4 {
            let cs = (data >> (i * 2)) & 0x3;
            let c = match cs {
                0 => self.bg_color[0],
                1 => (scolor >> 4) & 0xF,
                2 => scolor & 0xF,
                _ => rcolor,
            };
            let xoffs = x + 8 - i * 2 + self.horizontal_scroll();
            self.update_pixel(xoffs, y, c);
            self.update_pixel(xoffs + 1, y, c);
        }
    }

    /// Sprites for the current scanline, lowest priority (7) first so
    /// sprite 0 ends up on top.
    fn draw_raster_sprites(&mut self, mem: &Memory, vic_base: u16) {
        if self.sprite_enabled == 0 {
            return;
        }
        let rstr = self.raster_counter();
        let y = i32::from(rstr) - i32::from(FIRST_VISIBLE_LINE);
        let sp_y = i32::from(rstr) - SPRITES_FIRST_LINE;

        for n in (0..8).rev() {
            let height = if self.is_double_height_sprite(n) {
                SPRITE_HEIGHT * 2
            } else {
                SPRITE_HEIGHT
            };
            let my = i32::from(self.my[n]);
            if self.is_sprite_enabled(n) && sp_y >= my && sp_y < my + height {
                let mut row = sp_y - my;
                if self.is_double_height_sprite(n) {
                    row /= 2;
                }
                let x = SPRITES_FIRST_COL + self.sprite_x(n);
                if self.is_multicolor_sprite(n) {
                    self.draw_mcsprite(mem, vic_base, x, y, n, row);
                } else {
                    self.draw_sprite(mem, vic_base, x, y, n, row);
                }
            }
        }
    }

    /// Hires sprite row: three data bytes, doubled horizontally when the
    /// sprite is X-expanded. Pixels that land in the border inset are
    /// overlaid with the border colour.
    fn draw_sprite(&mut self, mem: &Memory, vic_base: u16, x: i32, y: i32, n: usize, row: i32) {
        let swid = if self.is_double_width_sprite(n) { 2 } else { 1 };
        let addr = self.get_sprite_ptr(mem, vic_base, n);
        for w in 0..swid {
            for i in 0..3i32 {
                let data = mem.vic_read(vic_base, addr.wrapping_add((row * 3 + i) as u16));
                for j in 0..8i32 {
                    if data & (1 << j) == 0 {
                        continue;
                    }
                    let new_x = x + w + i * 8 * swid + 8 * swid - j * swid;
                    let mut color = self.sprite_colors[n];
                    // 38-column and 24-line modes widen the border inset
                    let side = if self.cr2 & (1 << 3) == 0 { 8 } else { 0 };
                    let (top, bottom) = if self.cr1 & (1 << 3) == 0 {
                        (2, 4)
                    } else {
                        (0, 0)
                    };
                    if new_x <= G_FIRST_COL + side
                        || y < G_FIRST_COL + top
                        || new_x > G_RES_X + G_FIRST_COL - side
                        || y >= G_RES_Y + G_FIRST_COL - bottom
                    {
                        color = self.border_color;
                    }
                    self.update_pixel(new_x, y, color);
                }
            }
        }
    }

    /// Multicolour sprite row: twelve double-wide pixel pairs decoding to
    /// transparent, shared colour 0, the sprite colour, or shared colour 1.
    fn draw_mcsprite(&mut self, mem: &Memory, vic_base: u16, x: i32, y: i32, n: usize, row: i32) {
        let addr = self.get_sprite_ptr(mem, vic_base, n);
        for i in 0..3i32 {
            let data = mem.vic_read(vic_base, addr.wrapping_add((row * 3 + i) as u16));
            for j in 0..4i32 {
                let cs = (data >> (j * 2)) & 0x3;
                let c = match cs {
                    0 => continue, // transparent
                    1 => self.sprite_shared_colors[0],
                    2 => self.sprite_colors[n],
                    _ => self.sprite_shared_colors[1],
                };
                let px = x + i * 8 + 8 - j * 2;
                self.update_pixel(px, y, c);
                self.update_pixel(px + 1, y, c);
            }
        }
    }

    // Frame interface --------------------------------------------------

    /// The rendered frame (ARGB32).
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.frame
    }

    /// Framebuffer width in pixels.
    #[must_use]
    pub const fn framebuffer_width(&self) -> u32 {
        VISIBLE_SCREEN_WIDTH as u32
    }

    /// Framebuffer height in pixels.
    #[must_use]
    pub const fn framebuffer_height(&self) -> u32 {
        VISIBLE_SCREEN_HEIGHT as u32
    }

    /// Check and clear the frame-complete flag.
    pub fn take_frame_complete(&mut self) -> bool {
        let complete = self.frame_complete;
        self.frame_complete = false;
        complete
    }

    /// Completed frames.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frame_count
    }

    /// Current graphic mode.
    #[must_use]
    pub fn graphic_mode(&self) -> GraphicMode {
        self.graphic_mode
    }
}

impl Default for Vic {
    fn default() -> Self {
        Self::new()
    }
}
