use rand::RngCore;

/// One round of the PCG-RXS-M-XS 32-bit hash.
///
/// The shading kernel carries the same function; keep the constants in sync.
#[inline]
pub const fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Per-pixel random stream.
///
/// Seeded from `(frame seed, pixel index)` so a pixel's draws do not depend on
/// which worker shades it, or on whether it runs on the host or the device.
#[derive(Debug, Clone)]
pub struct PixelRng {
    state: u32,
}

impl PixelRng {
    pub fn new(frame_seed: u32, pixel: u32) -> Self {
        Self {
            state: pcg_hash(pixel ^ pcg_hash(frame_seed)),
        }
    }
}

impl RngCore for PixelRng {
    fn next_u32(&mut self) -> u32 {
        self.state = pcg_hash(self.state);
        self.state
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Uniform draw in `[-0.5, 0.5)` built from the top 24 bits of one `u32`.
#[inline]
pub fn unit_jitter<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
    const INV_2_24: f32 = 1.0 / 16_777_216.0;
    (rng.next_u32() >> 8) as f32 * INV_2_24 - 0.5
}
