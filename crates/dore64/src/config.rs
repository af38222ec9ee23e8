//! Machine configuration: where the ROM images live.

use std::path::{Path, PathBuf};

/// ROM image locations for a C64.
///
/// Expected sizes: Kernal 8192, BASIC 8192, character generator 4096
/// bytes. Short images load truncated; missing files leave the ROM plane
/// zero-filled.
pub struct C64Config {
    pub kernal_rom: PathBuf,
    pub basic_rom: PathBuf,
    pub char_rom: PathBuf,
}

impl C64Config {
    /// Conventional file names inside a `roms/` directory.
    #[must_use]
    pub fn from_roms_dir(dir: &Path) -> Self {
        Self {
            kernal_rom: dir.join("kernal.rom"),
            basic_rom: dir.join("basic.rom"),
            char_rom: dir.join("chargen.rom"),
        }
    }
}

/// Find the `roms/` directory: next to the executable (walking up out of
/// `target/`), else relative to the working directory.
#[must_use]
pub fn find_roms_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let mut dir = exe.parent().map(Path::to_path_buf);
        for _ in 0..5 {
            if let Some(ref d) = dir {
                let roms = d.join("roms");
                if roms.is_dir() {
                    return roms;
                }
                dir = d.parent().map(Path::to_path_buf);
            }
        }
    }
    PathBuf::from("roms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_names() {
        let config = C64Config::from_roms_dir(Path::new("roms"));
        assert_eq!(config.kernal_rom, Path::new("roms/kernal.rom"));
        assert_eq!(config.basic_rom, Path::new("roms/basic.rom"));
        assert_eq!(config.char_rom, Path::new("roms/chargen.rom"));
    }
}
