use bitflags::bitflags;

pub const LCDC: u16 = 0xFF40;
pub const STAT: u16 = 0xFF41;
pub const SCY: u16 = 0xFF42;
pub const SCX: u16 = 0xFF43;
pub const LY: u16 = 0xFF44;
pub const LYC: u16 = 0xFF45;
pub const DMA: u16 = 0xFF46;
pub const BGP: u16 = 0xFF47;
pub const OBP0: u16 = 0xFF48;
pub const OBP1: u16 = 0xFF49;
pub const WY: u16 = 0xFF4A;
pub const WX: u16 = 0xFF4B;
pub const BCPS: u16 = 0xFF68;
pub const BCPD: u16 = 0xFF69;
pub const OCPS: u16 = 0xFF6A;
pub const OCPD: u16 = 0xFF6B;
pub const OPRI: u16 = 0xFF6C;

const PALETTE_AUTO_INC: u8 = 0x80;

/// Shades used for the monochrome palettes, lightest first.
pub const DMG_SHADES: [u32; 4] = [0xFFFFFFFF, 0xFFAAAAAA, 0xFF555555, 0xFF000000];

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Lcdc: u8 {
        const BGW_ENABLE = 1 << 0;
        const OBJ_ENABLE = 1 << 1;
        const OBJ_TALL = 1 << 2;
        const BG_MAP_HIGH = 1 << 3;
        const TILE_DATA_UNSIGNED = 1 << 4;
        const WIN_ENABLE = 1 << 5;
        const WIN_MAP_HIGH = 1 << 6;
        const LCD_ENABLE = 1 << 7;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Stat: u8 {
        const COINCIDENCE = 1 << 2;
        const HBLANK_INT = 1 << 3;
        const VBLANK_INT = 1 << 4;
        const OAM_INT = 1 << 5;
        const LYC_INT = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Transfer = 3,
}

impl Mode {
    /// The STAT source that may fire on entry to this mode.
    pub fn stat_source(&self) -> Stat {
        match *self {
            Mode::HBlank => Stat::HBLANK_INT,
            Mode::VBlank => Stat::VBLANK_INT,
            Mode::OamScan => Stat::OAM_INT,
            Mode::Transfer => Stat::empty(),
        }
    }
}

fn rgb555_to_argb(rgb555: u16) -> u32 {
    let scale = |c: u16| ((c & 0x1F) as u32 * 255 / 31);
    let r = scale(rgb555);
    let g = scale(rgb555 >> 5);
    let b = scale(rgb555 >> 10);
    0xFF000000 | (r << 16) | (g << 8) | b
}

fn dmg_palette(val: u8) -> [u32; 4] {
    let mut colours = [0; 4];
    for (i, colour) in colours.iter_mut().enumerate() {
        *colour = DMG_SHADES[((val >> (i * 2)) & 0b11) as usize];
    }
    colours
}

/// Colour palette RAM behind one of the CGB index/data register pairs.
#[derive(Debug)]
pub struct CgbPalettes {
    index: u8,
    data: [u8; 64],
    colours: [[u32; 4]; 8],
}

impl CgbPalettes {
    fn new() -> CgbPalettes {
        CgbPalettes {
            index: 0,
            data: [0xFF; 64],
            colours: [[0xFFFFFFFF; 4]; 8],
        }
    }

    pub fn colour(&self, palette: usize, index: u8) -> u32 {
        self.colours[palette & 0x07][index as usize & 0x03]
    }

    fn read_index(&self) -> u8 {
        self.index | 0x40
    }

    fn read_data(&self) -> u8 {
        self.data[(self.index & 0x3F) as usize]
    }

    fn write_data(&mut self, val: u8) {
        let offset = (self.index & 0x3F) as usize;
        self.data[offset] = val;

        let entry = offset & !1;
        let rgb555 = self.data[entry] as u16 | (self.data[entry + 1] as u16) << 8;
        self.colours[entry / 8][(entry % 8) / 2] = rgb555_to_argb(rgb555);

        if self.index & PALETTE_AUTO_INC != 0 {
            self.index = PALETTE_AUTO_INC | ((self.index + 1) & 0x3F);
        }
    }
}

/// The LCD controller's register file.
#[derive(Debug)]
pub struct Lcd {
    pub control: Lcdc,
    pub stat: Stat,
    pub mode: Mode,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
    pub dma: u8,
    pub wy: u8,
    pub wx: u8,
    bgp: u8,
    obp: [u8; 2],
    pub bg_colours: [u32; 4],
    pub obj_colours: [[u32; 4]; 2],
    pub bg_cgb: CgbPalettes,
    pub obj_cgb: CgbPalettes,
    opri: u8,
    cgb: bool,
}

impl Lcd {
    pub fn new(cgb: bool) -> Lcd {
        let mut lcd = Lcd {
            control: Lcdc::from_bits_retain(0x91),
            stat: Stat::empty(),
            mode: Mode::OamScan,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0xFF,
            wy: 0,
            wx: 0,
            bgp: 0,
            obp: [0; 2],
            bg_colours: DMG_SHADES,
            obj_colours: [DMG_SHADES; 2],
            bg_cgb: CgbPalettes::new(),
            obj_cgb: CgbPalettes::new(),
            opri: if cgb { 0xFE } else { 0xFF },
            cgb: cgb,
        };
        lcd.write(BGP, 0xFC);
        lcd.write(OBP0, 0xFF);
        lcd.write(OBP1, 0xFF);
        lcd
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            LCDC => self.control.bits(),
            STAT => 0x80 | self.stat.bits() | self.mode as u8,
            SCY => self.scy,
            SCX => self.scx,
            LY => self.ly,
            LYC => self.lyc,
            DMA => self.dma,
            BGP => self.bgp,
            OBP0 => self.obp[0],
            OBP1 => self.obp[1],
            WY => self.wy,
            WX => self.wx,
            BCPS => self.bg_cgb.read_index(),
            BCPD => self.bg_cgb.read_data(),
            OCPS => self.obj_cgb.read_index(),
            OCPD => self.obj_cgb.read_data(),
            OPRI => self.opri,
            _ => panic!("LCD can't read 0x{:04x}", addr),
        }
    }

    /// Plain register writes. Side effects on the rest of the PPU (LCD
    /// power, coincidence) are applied by the caller.
    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            LCDC => self.control = Lcdc::from_bits_retain(val),
            STAT => {
                let writable = Stat::HBLANK_INT | Stat::VBLANK_INT | Stat::OAM_INT | Stat::LYC_INT;
                self.stat = (self.stat & Stat::COINCIDENCE) |
                            (Stat::from_bits_retain(val) & writable);
            }
            SCY => self.scy = val,
            SCX => self.scx = val,
            LY => {}
            LYC => self.lyc = val,
            DMA => self.dma = val,
            BGP => {
                self.bgp = val;
                self.bg_colours = dmg_palette(val);
            }
            OBP0 | OBP1 => {
                let n = (addr - OBP0) as usize;
                self.obp[n] = val;
                // Colour 0 is transparent for objects.
                self.obj_colours[n] = dmg_palette(val & 0xFC);
            }
            WY => self.wy = val,
            WX => self.wx = val,
            BCPS => self.bg_cgb.index = val,
            OCPS => self.obj_cgb.index = val,
            BCPD => {
                if self.cgb {
                    self.bg_cgb.write_data(val);
                }
            }
            OCPD => {
                if self.cgb {
                    self.obj_cgb.write_data(val);
                }
            }
            OPRI => self.opri = val | 0xFE,
            _ => panic!("LCD can't write to 0x{:04x}", addr),
        }
    }

    /// Refreshes the coincidence flag. Returns true if the LYC STAT source
    /// fires.
    pub fn compare_ly(&mut self) -> bool {
        let equal = self.ly == self.lyc;
        self.stat.set(Stat::COINCIDENCE, equal);
        equal && self.stat.contains(Stat::LYC_INT)
    }

    pub fn bg_map(&self) -> u16 {
        if self.control.contains(Lcdc::BG_MAP_HIGH) { 0x9C00 } else { 0x9800 }
    }

    pub fn win_map(&self) -> u16 {
        if self.control.contains(Lcdc::WIN_MAP_HIGH) { 0x9C00 } else { 0x9800 }
    }

    pub fn obj_height(&self) -> u8 {
        if self.control.contains(Lcdc::OBJ_TALL) { 16 } else { 8 }
    }

    /// Address of the first byte of a background/window tile.
    pub fn tile_addr(&self, tile: u8) -> u16 {
        if self.control.contains(Lcdc::TILE_DATA_UNSIGNED) {
            0x8000 + tile as u16 * 16
        } else {
            0x8800 + tile.wrapping_add(128) as u16 * 16
        }
    }
}
