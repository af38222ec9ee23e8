//! C64 colour palette.
//!
//! 16 colours as ARGB32. Index 0 is black, 1 white, 2 red, 6 blue; the
//! KERNAL boot screen is light blue text (14) on blue (6).

/// C64 palette: colour indices 0-15 as ARGB32.
pub const PALETTE: [u32; 16] = [
    0xFF00_0000, // 0: Black
    0xFFFF_FFFF, // 1: White
    0xFFAB_3126, // 2: Red
    0xFF66_DAFF, // 3: Cyan
    0xFFBB_3FB8, // 4: Purple
    0xFF55_CE58, // 5: Green
    0xFF1D_0E97, // 6: Blue
    0xFFEA_F57C, // 7: Yellow
    0xFFB9_7418, // 8: Orange
    0xFF78_5300, // 9: Brown
    0xFFDD_9387, // 10: Light Red
    0xFF5B_5B5B, // 11: Dark Grey
    0xFF8B_8B8B, // 12: Medium Grey
    0xFFB0_F4AC, // 13: Light Green
    0xFFAA_9DEF, // 14: Light Blue
    0xFFB8_B8B8, // 15: Light Grey
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_colours() {
        assert_eq!(PALETTE[0], 0xFF00_0000);
        assert_eq!(PALETTE[1], 0xFFFF_FFFF);
        assert_eq!(PALETTE[2], 0xFFAB_3126);
        assert_eq!(PALETTE[6], 0xFF1D_0E97);
    }

    #[test]
    fn all_opaque() {
        for &colour in &PALETTE {
            assert_eq!(colour >> 24, 0xFF);
        }
    }
}
