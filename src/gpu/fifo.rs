pub const FIFO_CAPACITY: usize = 16;

/// Ring buffer of resolved ARGB pixels waiting to be shifted out.
#[derive(Debug)]
pub struct PixelFifo {
    pixels: [u32; FIFO_CAPACITY],
    head: usize,
    len: usize,
}

impl PixelFifo {
    pub fn new() -> PixelFifo {
        PixelFifo {
            pixels: [0; FIFO_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, pixel: u32) {
        if self.len == FIFO_CAPACITY {
            panic!("Pixel FIFO overflow");
        }
        self.pixels[(self.head + self.len) % FIFO_CAPACITY] = pixel;
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let pixel = self.pixels[self.head];
        self.head = (self.head + 1) % FIFO_CAPACITY;
        self.len -= 1;
        Some(pixel)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
