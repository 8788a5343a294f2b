/// Counts dots (4.19 MHz ticks) since power on.
#[derive(Debug, Default)]
pub struct Clock {
    ticks: u64,
}

impl Clock {
    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
