//! Hardware TRNG wrapper satisfying `quillkey_core::config::Board::Rng`.
//!
//! The nRF52840's on-board RNG peripheral has a bias-corrected output mode; we always enable it,
//! since every use of this RNG in `quillkey-core` is for key material, not for the non-crypto
//! mouse-jiggle PRNG (which seeds itself from a single byte of this source once at boot).

use nrf52840_hal::pac::RNG;
use rand_core::{CryptoRng, Error, RngCore};

pub struct HwRng {
    rng: RNG,
}

impl HwRng {
    pub fn new(rng: RNG) -> Self {
        rng.config.write(|w| w.dercen().enabled());
        HwRng { rng }
    }

    fn next_byte(&mut self) -> u8 {
        self.rng.tasks_start.write(|w| unsafe { w.bits(1) });
        while self.rng.events_valrdy.read().bits() == 0 {}
        self.rng.events_valrdy.reset();
        let byte = self.rng.value.read().value().bits();
        self.rng.tasks_stop.write(|w| unsafe { w.bits(1) });
        byte
    }
}

impl RngCore for HwRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.next_byte();
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for HwRng {}
