use crate::{bus::Bus, cartridge::Cartridge, cpu::Cpu, tracer::Tracer};

/// Machine cycles per emulated frame (154 lines of 456 cycles, as counted
/// by the frame loop).
pub const CYCLES_PER_FRAME: u32 = 70_221;

/// The whole machine: CPU plus the bus that owns every other component.
///
/// The CPU borrows the bus for the duration of each step; nothing holds a
/// back-reference.
pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: Bus,
    pub tracer: Tracer,
}

impl GameBoy {
    pub fn new(cart: Cartridge) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(cart),
            tracer: Tracer::new(),
        }
    }

    /// Run one frame: interleave CPU, timer, PPU, and OAM DMA at the cycle
    /// granularity of each executed instruction, then refresh the joypad
    /// snapshot.
    ///
    /// Returns false when the CPU has flagged a fault; the caller is
    /// expected to dump the tracer and shut down.
    pub fn run_frame(&mut self) -> bool {
        let mut cycles = 0u32;
        while cycles < CYCLES_PER_FRAME {
            if self.cpu.is_panic {
                return false;
            }
            cycles += self.step();
        }
        self.bus.joypad.refresh();
        true
    }

    /// Execute a single instruction and feed the consumed cycles to the
    /// clocked components.
    pub fn step(&mut self) -> u32 {
        let c = self.cpu.step(&mut self.bus);
        self.tracer.record(&self.cpu, &self.bus);
        self.bus.timer.step(c, self.cpu.stopped);
        self.bus.ppu.step(c);
        self.bus.dma_step(c);
        c
    }
}
