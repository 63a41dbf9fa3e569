use crate::cpu::Mem;

pub const RAM_SIZE: usize = 256;

pub struct Bus<'call> {
    ram: [u8; RAM_SIZE],
    output_callback: Box<dyn FnMut(u8) + 'call>,
}

impl<'a> Bus<'a> {
    pub fn new<'call, F>(output_callback: F) -> Bus<'call>
    where
        F: FnMut(u8) + 'call,
    {
        Bus {
            ram: [0; RAM_SIZE],
            output_callback: Box::from(output_callback),
        }
    }

    /// Bus that prints each value on its own line to stdout.
    pub fn stdout() -> Bus<'static> {
        Bus::new(|value| println!("{}", value))
    }

    pub fn print(&mut self, value: u8) {
        (self.output_callback)(value);
    }
}

impl Mem for Bus<'_> {
    fn mem_read(&mut self, addr: u8) -> u8 {
        self.ram[addr as usize]
    }

    fn mem_write(&mut self, addr: u8, data: u8) {
        self.ram[addr as usize] = data;
    }
}
