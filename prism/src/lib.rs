//! Core of the prism PlayStation emulator.
//!
//! All mutable state lives in a single [`PSX`] value; the [`Emulator`] drives it with a
//! deterministic quantum loop: the CPU runs until the next scheduler deadline (at most one
//! quantum), the timers catch up, and due events are dispatched to their peripherals. Replaying
//! the same inputs yields bit-identical state.

mod bus;
mod util;

pub mod cdrom;
pub mod cpu;
pub mod dma;
pub mod exe;
pub mod gpu;
pub mod gte;
pub mod interrupts;
pub mod kernel;
pub mod mem;
pub mod scheduler;
pub mod sio0;
pub mod spu;
pub mod timers;

pub use bus::{BusWriteErr, MisalignedAddressErr};
pub use cdrom::Disc;
pub use exe::Executable;

pub use binrw;

use scheduler::{Event, Scheduler};
use thiserror::Error;

/// Host callbacks the core needs. Both are invoked once per frame, at the start of the vertical
/// blank; the VRAM borrow must not be retained.
pub trait Host {
    /// Presents the framebuffer: 1024x512 BGR555 halfwords, row major.
    fn present(&mut self, vram: &[u16]);

    /// Polls the pad: an inverted button bitmap, a zero bit meaning pressed.
    fn poll_input(&mut self) -> u16 {
        0xFFFF
    }
}

/// A host that displays nothing and holds no buttons.
pub struct NullHost;

impl Host for NullHost {
    fn present(&mut self, _vram: &[u16]) {}
}

/// The state of the PSX. The [`Emulator`] and its interpreters operate on this struct.
pub struct PSX {
    /// The event scheduler.
    pub scheduler: Scheduler,

    pub memory: mem::Memory,
    pub cpu: cpu::Cpu,
    pub cop0: cpu::cop0::Cop0,
    pub gte: gte::Gte,
    pub interrupts: interrupts::Controller,
    pub dma: dma::State,
    pub timers: timers::Timers,
    pub gpu: gpu::Gpu,
    pub cdrom: cdrom::Controller,
    pub sio0: sio0::Controller,
    pub spu: spu::Spu,
}

/// Emulator configuration.
pub struct Config {
    /// The BIOS ROM image; must be exactly 512 KiB.
    pub bios: Vec<u8>,
    /// The backing disc image, if any.
    pub disc: Option<Box<dyn Disc>>,
    /// An executable to side load once the BIOS shell is reached, if any.
    pub sideload: Option<Executable>,
}

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("BIOS image is {len} bytes, expected exactly 512 KiB")]
    BiosSize { len: usize },
}

/// The prism emulator.
pub struct Emulator {
    psx: PSX,
    cpu: cpu::interpreter::Interpreter,
    host: Box<dyn Host>,
}

impl Emulator {
    /// Creates a new [`Emulator`].
    pub fn new(config: Config, host: impl Host + 'static) -> Result<Self, EmulatorError> {
        let mut memory =
            mem::Memory::with_bios(config.bios).map_err(|bios| EmulatorError::BiosSize {
                len: bios.len(),
            })?;
        memory.sideload = config.sideload;

        let mut scheduler = Scheduler::new();
        scheduler.schedule(Event::Scanline, gpu::CYCLES_PER_SCANLINE);
        scheduler.schedule(Event::SpuSample, spu::SAMPLE_INTERVAL);
        scheduler.merge();

        Ok(Self {
            psx: PSX {
                scheduler,
                memory,
                cpu: cpu::Cpu::default(),
                cop0: cpu::cop0::Cop0::default(),
                gte: gte::Gte::default(),
                interrupts: interrupts::Controller::default(),
                dma: dma::State::default(),
                timers: timers::Timers::default(),
                gpu: gpu::Gpu::default(),
                cdrom: cdrom::Controller::new(config.disc),
                sio0: sio0::Controller::default(),
                spu: spu::Spu::default(),
            },
            cpu: cpu::interpreter::Interpreter::default(),
            host: Box::new(host),
        })
    }

    /// Returns a reference to the state of the system.
    #[inline(always)]
    pub fn psx(&self) -> &PSX {
        &self.psx
    }

    /// Returns a mutable reference to the state of the system.
    #[inline(always)]
    pub fn psx_mut(&mut self) -> &mut PSX {
        &mut self.psx
    }

    /// Runs a single quantum: the CPU up to the next deadline, then the timers, then the due
    /// events. Returns how many cycles were consumed.
    pub fn cycle(&mut self) -> i64 {
        let cycles = self.psx.scheduler.run_cycles();

        self.cpu
            .step(&mut self.psx, cycles / cpu::interpreter::CYCLES_PER_INSTRUCTION);

        let PSX {
            timers, interrupts, ..
        } = &mut self.psx;
        timers.step(cycles, interrupts);

        self.psx.scheduler.advance(cycles);
        while let Some((event, overshoot)) = self.psx.scheduler.pop_due() {
            match event {
                Event::Scanline => self.scanline(overshoot),
                Event::CdromIrq(level) => {
                    let PSX {
                        cdrom,
                        scheduler,
                        interrupts,
                        ..
                    } = &mut self.psx;
                    cdrom.irq_event(scheduler, interrupts, level);
                }
                Event::SioAck(payload) => {
                    let PSX {
                        sio0, interrupts, ..
                    } = &mut self.psx;
                    sio0.ack_event(interrupts, payload);
                }
                Event::SpuSample => {
                    self.psx.spu.sample_event();
                    self.psx
                        .scheduler
                        .schedule(Event::SpuSample, spu::SAMPLE_INTERVAL + overshoot);
                }
                Event::DmaEnd(channel) => dma::executor::transfer_end(&mut self.psx, channel),
            }
        }
        self.psx.scheduler.merge();

        cycles
    }

    /// Runs quanta until at least `cycles` CPU cycles have elapsed.
    pub fn cycle_for(&mut self, cycles: i64) {
        let mut remaining = cycles;
        while remaining > 0 {
            remaining -= self.cycle();
        }
    }

    /// Advances the GPU by one scanline, pacing HBLANK/VBLANK timing.
    fn scanline(&mut self, overshoot: i64) {
        self.psx.gpu.line += 1;

        let PSX {
            gpu,
            timers,
            interrupts,
            sio0,
            scheduler,
            ..
        } = &mut self.psx;

        timers.tick_hblank(interrupts);

        // GPUSTAT bit 31 alternates so status polls observe progress
        gpu.status.set_interlace_odd(!gpu.status.interlace_odd());

        if gpu.line == gpu::SCANLINES_PER_VDRAW {
            interrupts.request(interrupts::Interrupt::VBlank);
            timers.gate_vblank_start();
            gpu.frame += 1;

            self.host.present(&gpu.vram[..]);
            sio0.set_input(self.host.poll_input());
        } else if gpu.line >= gpu::SCANLINES_PER_FRAME {
            gpu.line = 0;
            timers.gate_vblank_end();
        }

        scheduler.schedule(Event::Scanline, gpu::CYCLES_PER_SCANLINE + overshoot);
    }
}
