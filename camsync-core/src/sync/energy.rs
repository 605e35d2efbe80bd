//! Audio energy and clap/spike detection.
//!
//! The energy of an audio frame (one sample per channel) is the sum over
//! channels of the squared sample. The spike is the first frame whose energy
//! exceeds `mean + 2 * stddev` of the whole track, using the sample standard
//! deviation (n - 1 denominator).

/// Bytes per f32 sample.
const SAMPLE_BYTES: usize = 4;

/// Accumulates interleaved little-endian f32 PCM into per-frame energies.
/// Chunks may split samples and frames at any byte offset.
#[derive(Debug)]
pub struct EnergyAccumulator {
    channels: usize,
    pending: Vec<u8>,
    energy: Vec<f64>,
}

impl EnergyAccumulator {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: channels.max(1),
            pending: Vec::new(),
            energy: Vec::new(),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        let frame_bytes = self.channels * SAMPLE_BYTES;
        let complete = self.pending.len() / frame_bytes * frame_bytes;

        for frame in self.pending[..complete].chunks_exact(frame_bytes) {
            let energy: f64 = frame
                .chunks_exact(SAMPLE_BYTES)
                .map(|b| {
                    let sample = f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
                    sample * sample
                })
                .sum();
            self.energy.push(energy);
        }
        self.pending.drain(..complete);
    }

    /// Returns the energies; a trailing partial frame is dropped.
    pub fn finish(self) -> Vec<f64> {
        if !self.pending.is_empty() {
            log::debug!("Dropping {} trailing byte(s) of a partial audio frame", self.pending.len());
        }
        self.energy
    }
}

/// Energies of interleaved samples.
pub fn frame_energies(samples: &[f32], channels: usize) -> Vec<f64> {
    samples
        .chunks_exact(channels.max(1))
        .map(|frame| frame.iter().map(|s| f64::from(*s) * f64::from(*s)).sum())
        .collect()
}

/// `mean + 2 * stddev` of the energies, or None with fewer than two frames.
pub fn spike_threshold(energy: &[f64]) -> Option<f64> {
    if energy.len() < 2 {
        return None;
    }
    let n = energy.len() as f64;
    let mean = energy.iter().sum::<f64>() / n;
    let variance = energy.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(mean + 2.0 * variance.sqrt())
}

/// Index of the first frame strictly above the threshold.
pub fn find_spike_frame(energy: &[f64]) -> Option<usize> {
    let threshold = spike_threshold(energy)?;
    energy.iter().position(|e| *e > threshold)
}

/// Instant of audio frame `frame` in seconds.
pub fn spike_time_secs(frame: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frame as f64 / f64::from(sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_energy_sums_channels() {
        let energy = frame_energies(&[0.5, 0.5, 1.0, 0.0], 2);
        assert_eq!(energy, vec![0.5, 1.0]);
    }

    #[test]
    fn test_threshold_uses_sample_stddev() {
        // mean 2.5, sample variance 5/3
        let threshold = spike_threshold(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let expected = 2.5 + 2.0 * (5.0f64 / 3.0).sqrt();
        assert!((threshold - expected).abs() < 1e-12);
    }

    #[test]
    fn test_find_first_spike() {
        let mut energy = vec![0.01; 100];
        energy[40] = 5.0;
        energy[70] = 9.0;
        assert_eq!(find_spike_frame(&energy), Some(40));
        assert!((spike_time_secs(40, 10) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_signal_has_no_spike() {
        let energy = vec![0.2; 50];
        assert_eq!(find_spike_frame(&energy), None);
        assert_eq!(spike_threshold(&[1.0]), None);
    }

    #[test]
    fn test_spike_on_first_frame_is_found() {
        let mut energy = vec![0.0; 30];
        energy[0] = 4.0;
        assert_eq!(find_spike_frame(&energy), Some(0));
        assert_eq!(spike_time_secs(0, 48_000), 0.0);
    }

    #[test]
    fn test_accumulator_handles_split_chunks() {
        let samples = [0.5f32, -0.5, 1.0, 0.0, 0.25, 0.25];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let mut acc = EnergyAccumulator::new(2);
        acc.push_bytes(&bytes[..5]);
        acc.push_bytes(&bytes[5..13]);
        acc.push_bytes(&bytes[13..]);
        let energy = acc.finish();

        assert_eq!(energy, frame_energies(&samples, 2));
    }
}
