use bitflags::bitflags;

pub const MAX_LINE_SPRITES: usize = 10;
const OAM_ENTRIES: usize = 40;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjAttrs: u8 {
        const BANK = 1 << 3;
        const DMG_PALETTE = 1 << 4;
        const X_FLIP = 1 << 5;
        const Y_FLIP = 1 << 6;
        const BG_PRIORITY = 1 << 7;
    }
}

impl ObjAttrs {
    pub fn cgb_palette(&self) -> usize {
        (self.bits() & 0x07) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OamEntry {
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    pub attrs: ObjAttrs,
}

impl OamEntry {
    fn from_bytes(bytes: &[u8]) -> OamEntry {
        OamEntry {
            y: bytes[0],
            x: bytes[1],
            tile: bytes[2],
            attrs: ObjAttrs::from_bits_retain(bytes[3]),
        }
    }

    fn on_line(&self, ly: u8, height: u8) -> bool {
        let line = ly as u16 + 16;
        let top = self.y as u16;
        top <= line && top + height as u16 > line
    }
}

/// Sprites selected for the current scanline, in priority order.
#[derive(Debug)]
pub struct ScanlineSprites {
    entries: [OamEntry; MAX_LINE_SPRITES],
    len: usize,
}

impl ScanlineSprites {
    pub fn new() -> ScanlineSprites {
        ScanlineSprites {
            entries: [OamEntry::default(); MAX_LINE_SPRITES],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &OamEntry> {
        self.entries[..self.len].iter()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Rebuilds the list for line `ly`. At most ten sprites are taken in OAM
    /// order. Monochrome hardware then ranks them by X, earlier OAM entries
    /// winning ties; colour hardware keeps OAM order.
    pub fn scan(&mut self, oam: &[u8], ly: u8, height: u8, sort_by_x: bool) {
        self.len = 0;
        let mut found = 0;

        for bytes in oam.chunks_exact(4).take(OAM_ENTRIES) {
            if found == MAX_LINE_SPRITES {
                break;
            }
            let entry = OamEntry::from_bytes(bytes);
            if !entry.on_line(ly, height) {
                continue;
            }
            // Hidden sprites still use up one of the line's slots.
            found += 1;
            if entry.x == 0 {
                continue;
            }
            if sort_by_x {
                self.insert_by_x(entry);
            } else {
                self.entries[self.len] = entry;
                self.len += 1;
            }
        }
    }

    fn insert_by_x(&mut self, entry: OamEntry) {
        let pos = self.entries[..self.len]
            .iter()
            .position(|e| e.x > entry.x)
            .unwrap_or(self.len);
        self.entries.copy_within(pos..self.len, pos + 1);
        self.entries[pos] = entry;
        self.len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oam_with(sprites: &[(u8, u8)]) -> Vec<u8> {
        let mut oam = vec![0; OAM_ENTRIES * 4];
        for (i, &(y, x)) in sprites.iter().enumerate() {
            oam[i * 4] = y;
            oam[i * 4 + 1] = x;
            oam[i * 4 + 2] = i as u8;
        }
        oam
    }

    #[test]
    fn at_most_ten_per_line() {
        let sprites: Vec<(u8, u8)> = (0..15).map(|i| (16, 8 + i)).collect();
        let mut line = ScanlineSprites::new();
        line.scan(&oam_with(&sprites), 0, 8, true);
        assert_eq!(line.len(), MAX_LINE_SPRITES);
        assert_eq!(line.iter().last().map(|e| e.tile), Some(9));
    }

    #[test]
    fn dmg_orders_by_x_then_oam_index() {
        let oam = oam_with(&[(16, 50), (16, 20), (16, 50), (16, 10)]);
        let mut line = ScanlineSprites::new();
        line.scan(&oam, 0, 8, true);
        let tiles: Vec<u8> = line.iter().map(|e| e.tile).collect();
        assert_eq!(tiles, vec![3, 1, 0, 2]);
    }

    #[test]
    fn cgb_keeps_oam_order() {
        let oam = oam_with(&[(16, 50), (16, 20), (16, 50), (16, 10)]);
        let mut line = ScanlineSprites::new();
        line.scan(&oam, 0, 8, false);
        let tiles: Vec<u8> = line.iter().map(|e| e.tile).collect();
        assert_eq!(tiles, vec![0, 1, 2, 3]);
    }

    #[test]
    fn vertical_range_follows_height() {
        let oam = oam_with(&[(20, 8)]);
        let mut line = ScanlineSprites::new();
        line.scan(&oam, 3, 8, true);
        assert!(line.is_empty());
        line.scan(&oam, 4, 8, true);
        assert_eq!(line.len(), 1);
        line.scan(&oam, 11, 8, true);
        assert_eq!(line.len(), 1);
        line.scan(&oam, 12, 8, true);
        assert!(line.is_empty());
        line.scan(&oam, 19, 16, true);
        assert_eq!(line.len(), 1);
    }

    #[test]
    fn offscreen_x_counts_against_limit() {
        let mut sprites = vec![(16, 0)];
        sprites.extend((0..10).map(|i| (16, 20 + i)));
        let mut line = ScanlineSprites::new();
        line.scan(&oam_with(&sprites), 0, 8, true);
        assert_eq!(line.len(), 9);
        assert!(line.iter().all(|e| e.x != 0));
    }
}
