use bitflags::bitflags;
use std::cmp::Ordering;

// FL register, laid out 00000LGE
bitflags! {
  pub struct CpuFlags: u8 {
    const EQUAL = 0b0000_0001;
    const GREATER = 0b0000_0010;
    const LESS = 0b0000_0100;
  }
}

impl CpuFlags {
    /// Nothing compared yet; reads as "not equal".
    pub fn new() -> Self {
        CpuFlags::from_bits_truncate(0b0000_0000)
    }

    pub fn is_equal(&self) -> bool {
        self.contains(CpuFlags::EQUAL)
    }

    pub fn update(&mut self, ordering: Ordering) {
        *self = match ordering {
            Ordering::Less => CpuFlags::LESS,
            Ordering::Greater => CpuFlags::GREATER,
            Ordering::Equal => CpuFlags::EQUAL,
        };
    }
}
